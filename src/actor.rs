// Actor module - Host-facing description and action dispatch contract

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Action id that takes one sample immediately
pub const LOG_NOW_ACTION: i32 = 0;

/// Acknowledgement returned for a handled action
pub const ACTION_ACK: &str = r#"{"success":true}"#;

/// What the host shows for a registered actor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Description {
    pub id: u32,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    /// Action id to label
    pub actions: BTreeMap<i32, String>,
}

impl Description {
    pub fn action_quantity(&self) -> usize {
        self.actions.len()
    }
}

/// A component the host can describe, configure and send actions to
pub trait Actor {
    /// Current description, including the action table
    fn description(&self) -> Description;

    /// Current settings in their serialized form
    fn get_config(&self) -> Result<String>;

    /// Replace the settings, optionally persisting them
    fn set_config(&mut self, config: &str, persist: bool) -> Result<()>;

    /// Dispatch an action and return its JSON response
    fn receive_action(&mut self, action: i32, payload: &str) -> Result<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_description_serializes_type_field() {
        let mut actions = BTreeMap::new();
        actions.insert(LOG_NOW_ACTION, "Log Now".to_string());

        let description = Description {
            id: 1,
            name: "Local Data Logger".to_string(),
            kind: "datalogger".to_string(),
            actions,
        };

        let json = serde_json::to_value(&description).unwrap();
        assert_eq!(json["type"], "datalogger");
        assert_eq!(json["actions"]["0"], "Log Now");
        assert_eq!(description.action_quantity(), 1);
    }
}
