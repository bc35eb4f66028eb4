//! Configuration error types.

use std::fmt::Display;

/// A configuration source or value that was rejected.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Configuration Error: {} at line {} in {}", message, line, file)]
pub struct ConfigError {
    /// What went wrong
    pub message: String,
    /// Dotted path of the offending setting, when a single setting is to blame
    pub setting: Option<String>,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl ConfigError {
    /// Create a new ConfigError with the given message at the current location.
    ///
    /// # Examples
    ///
    /// ```
    /// use peroot_error::ConfigError;
    ///
    /// let err = ConfigError::new("Duplicate backend id in fallback order: deepseek-chat");
    /// assert!(err.message.contains("Duplicate"));
    /// assert!(err.setting.is_none());
    /// ```
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            message: message.into(),
            setting: None,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Reject the value of one setting.
    ///
    /// ```
    /// use peroot_error::ConfigError;
    ///
    /// let err = ConfigError::invalid("rate_limit.window_secs", "must be at least 1");
    /// assert_eq!(err.setting.as_deref(), Some("rate_limit.window_secs"));
    /// assert!(err.to_string().contains("rate_limit.window_secs: must be at least 1"));
    /// ```
    #[track_caller]
    pub fn invalid(setting: impl Into<String>, reason: impl Display) -> Self {
        let setting = setting.into();
        let mut err = Self::new(format!("{}: {}", setting, reason));
        err.setting = Some(setting);
        err
    }
}
