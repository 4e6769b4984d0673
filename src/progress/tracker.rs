use std::collections::BTreeSet;

use bevy_ecs::prelude::*;

use crate::rules::unlock::is_locked;

/// Outcome of merging the local completion set with the remote list.
/// `to_upload` holds every module present on only one side; duplicate-key
/// tolerance on the remote insert absorbs the already-recorded half.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    pub to_upload: Vec<u32>,
}

/// The set of completed lesson modules for the current device/user.
#[derive(Resource, Debug, Clone, Default)]
pub struct ModuleProgress {
    completed: BTreeSet<u32>,
}

impl ModuleProgress {
    pub fn from_modules(modules: impl IntoIterator<Item = u32>) -> Self {
        Self {
            completed: modules.into_iter().filter(|id| *id >= 1).collect(),
        }
    }

    pub fn contains(&self, module_id: u32) -> bool {
        self.completed.contains(&module_id)
    }

    /// Test-and-set: returns true only on first insertion.
    pub fn insert(&mut self, module_id: u32) -> bool {
        self.completed.insert(module_id)
    }

    pub fn clear(&mut self) {
        self.completed.clear();
    }

    pub fn len(&self) -> usize {
        self.completed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.completed.is_empty()
    }

    pub fn is_locked(&self, module_id: u32) -> bool {
        is_locked(module_id, &self.completed)
    }

    pub fn sorted(&self) -> Vec<u32> {
        self.completed.iter().copied().collect()
    }

    /// Union the remote completion list into the local set. Returns the
    /// symmetric difference for reconciliation pushes to the remote.
    pub fn merge_remote(&mut self, remote: &[u32]) -> MergeOutcome {
        let remote_set: BTreeSet<u32> = remote.iter().copied().filter(|id| *id >= 1).collect();
        let to_upload = self
            .completed
            .symmetric_difference(&remote_set)
            .copied()
            .collect();
        self.completed.extend(remote_set);
        MergeOutcome { to_upload }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_is_idempotent() {
        let mut progress = ModuleProgress::default();
        assert!(progress.insert(5));
        assert!(!progress.insert(5));
        assert_eq!(progress.sorted(), vec![5]);
    }

    #[test]
    fn merge_is_a_union_and_uploads_both_asymmetries() {
        let mut progress = ModuleProgress::from_modules([1, 2, 5]);
        let outcome = progress.merge_remote(&[1, 2, 3]);
        assert_eq!(progress.sorted(), vec![1, 2, 3, 5]);
        assert_eq!(outcome.to_upload, vec![3, 5]);
    }

    #[test]
    fn merge_with_identical_sets_uploads_nothing() {
        let mut progress = ModuleProgress::from_modules([1, 2]);
        let outcome = progress.merge_remote(&[1, 2]);
        assert!(outcome.to_upload.is_empty());
        assert_eq!(progress.sorted(), vec![1, 2]);
    }

    #[test]
    fn zero_module_ids_are_dropped() {
        let mut progress = ModuleProgress::from_modules([0, 1]);
        assert_eq!(progress.sorted(), vec![1]);
        let outcome = progress.merge_remote(&[0, 2]);
        assert_eq!(progress.sorted(), vec![1, 2]);
        assert_eq!(outcome.to_upload, vec![1, 2]);
    }
}
