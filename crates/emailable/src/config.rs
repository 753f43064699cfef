//! Configuration surface for email sub-resources.

use serde::{Deserialize, Serialize};

/// Configuration consumed by DTO construction and boundary validation.
///
/// Passed explicitly wherever defaults or type restrictions apply; the
/// crate keeps no global state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    /// Classification used when input omits `type`.
    pub default_type: String,
    /// When true, any `type` string (up to 50 chars) is accepted.
    pub allow_custom_types: bool,
    /// Allowed classifications, consulted only when `allow_custom_types`
    /// is false.
    pub allowed_types: Vec<String>,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            default_type: "personal".to_string(),
            allow_custom_types: true,
            allowed_types: vec![
                "personal".to_string(),
                "work".to_string(),
                "billing".to_string(),
                "other".to_string(),
            ],
        }
    }
}

impl EmailConfig {
    /// Config that restricts `type` to the given allow-list.
    #[must_use]
    pub fn restricted(allowed_types: Vec<String>) -> Self {
        Self {
            allow_custom_types: false,
            allowed_types,
            ..Self::default()
        }
    }
}
