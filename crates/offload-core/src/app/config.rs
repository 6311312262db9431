//! ContextConfig - execution context の設定

use serde::{Deserialize, Serialize};

/// Settings for the threads behind a supervisor.
///
/// Every field has a default, so a partial JSON document is enough:
/// ```json
/// { "context_thread_name": "worker-ctx" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// Name of the OS thread hosting the execution context.
    pub context_thread_name: String,

    /// Name of the OS thread delivering reports to task handles.
    pub router_thread_name: String,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            context_thread_name: "offload-context".to_string(),
            router_thread_name: "offload-router".to_string(),
        }
    }
}

impl ContextConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = ContextConfig::from_json_str(r#"{ "context_thread_name": "ctx" }"#).unwrap();
        assert_eq!(config.context_thread_name, "ctx");
        assert_eq!(config.router_thread_name, "offload-router");
    }

    #[test]
    fn empty_object_is_default() {
        assert_eq!(ContextConfig::from_json_str("{}").unwrap(), ContextConfig::default());
    }

    #[test]
    fn wrong_types_are_rejected() {
        assert!(ContextConfig::from_json_str(r#"{ "router_thread_name": 3 }"#).is_err());
    }
}
