//! Store notification payloads

use serde_json::Value;

/// Delivered to every subscriber of a path when `set` writes it
#[derive(Debug, Clone)]
pub struct StoreEvent {
    /// The dotted path that changed
    pub path: String,
    /// Previous value at the path, if any
    pub old_value: Option<Value>,
    /// Value just written
    pub new_value: Value,
}

impl StoreEvent {
    /// Did the write actually change the value?
    pub fn changed(&self) -> bool {
        self.old_value.as_ref() != Some(&self.new_value)
    }
}
