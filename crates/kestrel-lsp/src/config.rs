//! Runtime settings sent by the client
//!
//! Settings arrive in `initializationOptions` and with every
//! `workspace/didChangeConfiguration`, either wrapped in a `kestrel` section
//! or bare:
//!
//! ```json
//! { "kestrel": { "signatureHelp": { "enabled": true } } }
//! ```

use kestrel_lsp_core::Preferences;
use parking_lot::RwLock;
use serde::Deserialize;
use serde_json::Value;

/// Settings section name
pub const SECTION: &str = "kestrel";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub signature_help: SignatureHelpSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SignatureHelpSettings {
    pub enabled: bool,
}

impl Default for SignatureHelpSettings {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Settings {
    /// Read settings from a client payload, falling back to defaults for
    /// anything missing or malformed.
    pub fn from_value(value: &Value) -> Self {
        let section = value.get(SECTION).unwrap_or(value);
        if section.is_null() {
            return Self::default();
        }
        match serde_json::from_value(section.clone()) {
            Ok(settings) => settings,
            Err(err) => {
                log::warn!("Ignoring invalid {} settings: {}", SECTION, err);
                Self::default()
            }
        }
    }
}

/// Settings shared between the server and request handlers
#[derive(Debug, Default)]
pub struct SharedSettings {
    settings: RwLock<Settings>,
}

impl SharedSettings {
    pub fn update(&self, settings: Settings) {
        *self.settings.write() = settings;
    }
}

impl Preferences for SharedSettings {
    fn signature_help_enabled(&self) -> bool {
        self.settings.read().signature_help.enabled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults_enable_signature_help() {
        assert!(Settings::default().signature_help.enabled);
        assert_eq!(Settings::from_value(&Value::Null), Settings::default());
        assert_eq!(Settings::from_value(&json!({})), Settings::default());
    }

    #[test]
    fn test_wrapped_section() {
        let settings = Settings::from_value(&json!({
            "kestrel": { "signatureHelp": { "enabled": false } }
        }));
        assert!(!settings.signature_help.enabled);
    }

    #[test]
    fn test_bare_section() {
        let settings = Settings::from_value(&json!({ "signatureHelp": { "enabled": false } }));
        assert!(!settings.signature_help.enabled);
    }

    #[test]
    fn test_malformed_settings_fall_back() {
        let settings = Settings::from_value(&json!({ "signatureHelp": { "enabled": "yes" } }));
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_shared_settings_update() {
        let shared = SharedSettings::default();
        assert!(shared.signature_help_enabled());
        shared.update(Settings::from_value(&json!({ "signatureHelp": { "enabled": false } })));
        assert!(!shared.signature_help_enabled());
    }
}
