use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Capabilities the matching core needs from a recorded interaction.
///
/// Ingestion layers can wrap their own record types in this trait; the
/// engine only ever asks for `identifier` and `timestamp`.
pub trait EventSource: Send + Sync {
    fn identifier(&self) -> &str;
    fn timestamp(&self) -> i64;
    fn value(&self, _key: &str) -> Option<&str> {
        None
    }
    fn is_important(&self) -> bool {
        true
    }
    fn is_start_candidate(&self) -> bool {
        true
    }
    fn is_stop_candidate(&self) -> bool {
        true
    }
}

/// One interaction occurrence as written by the device logger.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Event {
    pub timestamp: i64,
    pub event_type: String,
    #[serde(default)]
    pub component_type: String,
    #[serde(default)]
    pub component_description: String,
    #[serde(default)]
    pub component_info: String,
    #[serde(default)]
    pub module_name: String,
    #[serde(default)]
    pub module_description: String,
    #[serde(default)]
    pub device_id: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub values: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub repetitions: u32,
    #[serde(skip)]
    identifier: OnceCell<String>,
}

fn is_zero(n: &u32) -> bool {
    *n == 0
}

impl Event {
    pub fn new(timestamp: i64, event_type: &str, component_type: &str, module_name: &str) -> Self {
        Self {
            timestamp,
            event_type: event_type.to_string(),
            component_type: component_type.to_string(),
            module_name: module_name.to_string(),
            ..Default::default()
        }
    }

    pub fn with_user(mut self, user_id: &str) -> Self {
        self.user_id = user_id.to_string();
        self
    }

    pub fn with_value(mut self, key: &str, value: &str) -> Self {
        self.values.insert(key.to_string(), value.to_string());
        self
    }

    /// Short human-readable label, e.g. `click Button (settings)`.
    pub fn display_title(&self) -> String {
        let mut s = self.event_type.clone();
        if !self.component_type.is_empty() {
            s.push(' ');
            s.push_str(&self.component_type);
        }
        if !self.module_name.is_empty() {
            s.push_str(&format!(" ({})", self.module_name));
        }
        s
    }
}

impl EventSource for Event {
    fn identifier(&self) -> &str {
        self.identifier.get_or_init(|| {
            format!("{}${}${}", self.event_type, self.component_type, self.module_name)
        })
    }

    fn timestamp(&self) -> i64 {
        self.timestamp
    }

    fn value(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|s| s.as_str())
    }
}
