pub mod level;
pub mod reward;
pub mod unlock;

pub use level::{level_for_xp, xp_threshold_for_level};
pub use reward::{xp_reward_for_module, ADVANCED_MODULE_THRESHOLD};
pub use unlock::is_locked;
