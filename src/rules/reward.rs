/// XP awarded for completing a standard module.
pub const BASE_MODULE_XP: u32 = 50;

/// XP awarded for completing an advanced module.
pub const ADVANCED_MODULE_XP: u32 = 100;

/// Modules with an identifier above this threshold count as advanced.
pub const ADVANCED_MODULE_THRESHOLD: u32 = 20;

pub fn xp_reward_for_module(module_id: u32) -> u32 {
    if module_id > ADVANCED_MODULE_THRESHOLD {
        ADVANCED_MODULE_XP
    } else {
        BASE_MODULE_XP
    }
}
