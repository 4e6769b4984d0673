use std::collections::BTreeSet;

/// Strictly linear unlock order: module 1 is always open, every other
/// module requires its predecessor in the completed set.
pub fn is_locked(module_id: u32, completed: &BTreeSet<u32>) -> bool {
    if module_id <= 1 {
        return false;
    }
    !completed.contains(&(module_id - 1))
}
