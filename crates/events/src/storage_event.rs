use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single key changed in the store.
///
/// `old_value`/`new_value` are the raw stored strings; `None` means the key was
/// absent before (insert) or after (removal).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageEvent {
    pub key: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

impl StorageEvent {
    pub fn new(key: impl Into<String>, old_value: Option<String>, new_value: Option<String>) -> Self {
        Self {
            key: key.into(),
            old_value,
            new_value,
            occurred_at: Utc::now(),
        }
    }

    /// `true` when the key no longer exists after this change.
    pub fn is_removal(&self) -> bool {
        self.new_value.is_none()
    }
}

/// Messages that concern exactly one storage key.
///
/// Workers use this to ignore notifications for keys they do not own.
pub trait KeyScoped {
    fn key(&self) -> &str;
}

impl KeyScoped for StorageEvent {
    fn key(&self) -> &str {
        &self.key
    }
}
