//! Engine Settings
//!
//! [`EngineSettings`] collects every tunable of the core. All fields have
//! defaults, so a settings file only needs to name what it changes.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use strata::settings::EngineSettings;
//!
//! let settings = EngineSettings::from_json_str(r#"{ "max_devices": 2 }"#)?;
//! assert_eq!(settings.pass_order.len(), 4);
//!
//! let settings = EngineSettings {
//!     parallel_view_rendering: false,
//!     ..Default::default()
//! };
//! ```

use serde::{Deserialize, Serialize};

use crate::errors::{Result, StrataError};
use crate::render::pass::{self, PassOrder};

/// Upper bound for `max_devices`; device indices are dense array offsets.
pub const DEVICE_LIMIT: usize = 64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Pass names in render order.
    pub pass_order: Vec<String>,

    /// Maximum number of simultaneously attached devices.
    pub max_devices: usize,

    /// Render views on scoped worker threads when more than one is registered.
    pub parallel_view_rendering: bool,

    /// Mark nodes visible in every registered view when they are attached,
    /// instead of waiting for the first visibility pass.
    pub initial_visibility: bool,

    /// Initial capacity of the update traversal's matrix stack.
    pub matrix_stack_capacity: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            pass_order: [pass::OPAQUE, pass::TRANSPARENT, pass::LINE, pass::POST_PROCESS]
                .into_iter()
                .map(String::from)
                .collect(),
            max_devices: 8,
            parallel_view_rendering: true,
            initial_visibility: false,
            matrix_stack_capacity: 32,
        }
    }
}

impl EngineSettings {
    /// Parses and validates settings from JSON.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.pass_order.is_empty() {
            return Err(StrataError::InvalidSettings("pass_order must not be empty".into()));
        }
        for (i, name) in self.pass_order.iter().enumerate() {
            if name.trim().is_empty() {
                return Err(StrataError::InvalidSettings(format!("pass_order[{i}] is empty")));
            }
            if self.pass_order[..i].contains(name) {
                return Err(StrataError::InvalidSettings(format!("pass '{name}' listed twice")));
            }
        }
        if self.max_devices == 0 || self.max_devices > DEVICE_LIMIT {
            return Err(StrataError::InvalidSettings(format!(
                "max_devices must be in 1..={DEVICE_LIMIT}, got {}",
                self.max_devices
            )));
        }
        Ok(())
    }

    #[must_use]
    pub fn pass_order(&self) -> PassOrder {
        PassOrder::from_names(self.pass_order.iter().map(String::as_str))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(EngineSettings::default().validate().is_ok());
        assert_eq!(EngineSettings::default().pass_order(), PassOrder::default());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let settings = EngineSettings::from_json_str(r#"{ "max_devices": 2 }"#).unwrap();
        assert_eq!(settings.max_devices, 2);
        assert_eq!(settings.pass_order.len(), 4);
        assert!(settings.parallel_view_rendering);
    }

    #[test]
    fn rejects_duplicate_pass() {
        let err = EngineSettings::from_json_str(r#"{ "pass_order": ["opaque", "opaque"] }"#).unwrap_err();
        assert!(matches!(err, StrataError::InvalidSettings(_)));
    }

    #[test]
    fn rejects_malformed_json() {
        let err = EngineSettings::from_json_str("{ max_devices: }").unwrap_err();
        assert!(matches!(err, StrataError::JsonError(_)));
    }
}
