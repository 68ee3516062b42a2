use serde_json::Value;

use crate::error::{JimboError, Result};

pub(crate) fn validate_plugin_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(JimboError::invalid_argument("Plugin name cannot be empty"));
    }
    Ok(())
}

/// Shallow-merges a plugin's own options over the run-wide options.
pub(crate) fn merge_options(global: &Value, own: Option<&Value>) -> Value {
    match (global, own) {
        (_, None) => global.clone(),
        (Value::Object(base), Some(Value::Object(overrides))) => {
            let mut merged = base.clone();
            for (key, value) in overrides {
                merged.insert(key.clone(), value.clone());
            }
            Value::Object(merged)
        }
        (_, Some(own)) => own.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn plugin_keys_win_over_global_keys() {
        let merged = merge_options(
            &json!({ "prefix": "/api", "debug": false }),
            Some(&json!({ "debug": true })),
        );
        assert_eq!(merged, json!({ "prefix": "/api", "debug": true }));
    }

    #[test]
    fn missing_plugin_options_fall_back_to_global() {
        assert_eq!(merge_options(&json!({ "a": 1 }), None), json!({ "a": 1 }));
    }

    #[test]
    fn non_object_plugin_options_replace_global() {
        assert_eq!(merge_options(&json!({ "a": 1 }), Some(&json!(7))), json!(7));
    }

    #[test]
    fn blank_plugin_name_is_rejected() {
        assert!(validate_plugin_name("  ").is_err());
        assert!(validate_plugin_name("auth").is_ok());
    }
}
