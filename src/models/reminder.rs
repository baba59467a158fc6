use serde::{Deserialize, Serialize};

/// Daily measurement reminder for one owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderSetting {
    pub hour: u32,
    pub minute: u32,
    pub enabled: bool,
}
