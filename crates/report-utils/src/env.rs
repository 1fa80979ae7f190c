//! Typed environment-variable readers used by configuration loaders

use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// A variable was set but could not be parsed
#[derive(Debug, Error)]
#[error("Invalid value for {key}: '{value}' ({detail})")]
pub struct EnvError {
    pub key: String,
    pub value: String,
    pub detail: String,
}

/// Read a non-empty string variable
pub fn env_string(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse a variable; unset yields `Ok(None)`
pub fn env_parse<T>(key: &str) -> Result<Option<T>, EnvError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env_string(key) {
        None => Ok(None),
        Some(value) => value.parse::<T>().map(Some).map_err(|e| EnvError {
            key: key.to_string(),
            detail: e.to_string(),
            value,
        }),
    }
}

/// Parse a duration given in whole seconds
pub fn env_secs(key: &str) -> Result<Option<Duration>, EnvError> {
    Ok(env_parse::<u64>(key)?.map(Duration::from_secs))
}

/// Parse a boolean flag (`1/0`, `true/false`, `yes/no`, `on/off`)
pub fn env_bool(key: &str) -> Result<Option<bool>, EnvError> {
    match env_string(key) {
        None => Ok(None),
        Some(value) => match value.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(Some(true)),
            "0" | "false" | "no" | "off" => Ok(Some(false)),
            _ => Err(EnvError {
                key: key.to_string(),
                value,
                detail: "expected a boolean".to_string(),
            }),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Each test uses its own variable names so they can run in parallel.

    #[test]
    fn test_unset_is_none() {
        assert_eq!(env_string("REPORT_UTILS_TEST_UNSET"), None);
        assert!(env_parse::<u32>("REPORT_UTILS_TEST_UNSET").unwrap().is_none());
    }

    #[test]
    fn test_parse_and_secs() {
        // SAFETY: variable names are unique to this test
        unsafe {
            std::env::set_var("REPORT_UTILS_TEST_SECS", " 90 ");
            std::env::set_var("REPORT_UTILS_TEST_BAD", "ninety");
        }
        assert_eq!(
            env_secs("REPORT_UTILS_TEST_SECS").unwrap(),
            Some(Duration::from_secs(90))
        );
        let err = env_parse::<u64>("REPORT_UTILS_TEST_BAD").unwrap_err();
        assert_eq!(err.key, "REPORT_UTILS_TEST_BAD");
    }

    #[test]
    fn test_bool_forms() {
        // SAFETY: variable names are unique to this test
        unsafe {
            std::env::set_var("REPORT_UTILS_TEST_ON", "Yes");
            std::env::set_var("REPORT_UTILS_TEST_OFF", "0");
            std::env::set_var("REPORT_UTILS_TEST_MAYBE", "maybe");
        }
        assert_eq!(env_bool("REPORT_UTILS_TEST_ON").unwrap(), Some(true));
        assert_eq!(env_bool("REPORT_UTILS_TEST_OFF").unwrap(), Some(false));
        assert!(env_bool("REPORT_UTILS_TEST_MAYBE").is_err());
    }
}
