//! Environment variable expansion for configuration strings.

use std::borrow::Cow;

use crate::ConfigError;

/// Expand `${VAR}` and `${VAR:-default}` references in `value`.
///
/// `field` names the config key in error messages.
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    shellexpand::env(value)
        .map(Cow::into_owned)
        .map_err(|e| ConfigError::EnvVar {
            field: field.to_owned(),
            message: format!("${{{}}} not set", e.var_name),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_unchanged() {
        assert_eq!(expand_env("images", "output.dir").unwrap(), "images");
    }

    #[test]
    fn test_default_used_when_unset() {
        let value = expand_env("${MERMSHOT_EXPAND_TEST_UNSET:-fallback}", "output.dir").unwrap();
        assert_eq!(value, "fallback");
    }

    #[test]
    fn test_set_variable_expands() {
        // SAFETY: the variable name is unique to this test.
        unsafe {
            std::env::set_var("MERMSHOT_EXPAND_TEST_SET", "/opt/mermaid.js");
        }

        let value = expand_env("${MERMSHOT_EXPAND_TEST_SET}", "mermaid.script_url").unwrap();
        assert_eq!(value, "/opt/mermaid.js");

        unsafe {
            std::env::remove_var("MERMSHOT_EXPAND_TEST_SET");
        }
    }

    #[test]
    fn test_missing_variable_errors() {
        let err = expand_env("${MERMSHOT_EXPAND_TEST_MISSING}", "mermaid.script_url").unwrap_err();

        assert!(matches!(err, ConfigError::EnvVar { .. }));
        let msg = err.to_string();
        assert!(msg.contains("mermaid.script_url"));
        assert!(msg.contains("MERMSHOT_EXPAND_TEST_MISSING"));
    }
}
