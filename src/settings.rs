//! Runtime settings: security policy, directories, and contact-form copy.
//!
//! The security policy (rotation interval, session timeout, development
//! mode) and SMTP coordinates come from the CLI/environment. The optional
//! `settings.json` in the data dir only carries the contact-form wording so
//! it can be edited without redeploying; a missing file falls back to the
//! defaults below, a malformed one aborts startup.

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const DEFAULT_ROTATION_INTERVAL_MINUTES: u64 = 30;
const DEFAULT_SESSION_TIMEOUT_HOURS: u64 = 2;
const DEFAULT_MAX_MESSAGE_LENGTH: usize = 5000;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ContactSettings {
    pub success_message: String,
    pub error_message: String,
    pub max_message_length: usize,
    pub required_fields: Vec<String>,
}

impl Default for ContactSettings {
    fn default() -> Self {
        Self {
            success_message: "Thank you for your message!".to_string(),
            error_message: "Error sending message.".to_string(),
            max_message_length: DEFAULT_MAX_MESSAGE_LENGTH,
            required_fields: vec![
                "name".to_string(),
                "email".to_string(),
                "message".to_string(),
            ],
        }
    }
}

/// On-disk shape of `settings.json`. Only known sections are read.
#[derive(Debug, Deserialize)]
struct SettingsFile {
    contact_form: Option<ContactSettings>,
}

#[derive(Clone, Debug)]
pub struct Settings {
    rotation_interval_minutes: u64,
    session_timeout_hours: u64,
    development_mode: bool,
    admin_email: String,
    data_dir: PathBuf,
    assets_dir: PathBuf,
    contact: ContactSettings,
}

impl Settings {
    #[must_use]
    pub fn new(data_dir: PathBuf, assets_dir: PathBuf) -> Self {
        Self {
            rotation_interval_minutes: DEFAULT_ROTATION_INTERVAL_MINUTES,
            session_timeout_hours: DEFAULT_SESSION_TIMEOUT_HOURS,
            development_mode: false,
            admin_email: String::new(),
            data_dir,
            assets_dir,
            contact: ContactSettings::default(),
        }
    }

    #[must_use]
    pub fn with_rotation_interval_minutes(mut self, minutes: u64) -> Self {
        self.rotation_interval_minutes = minutes;
        self
    }

    #[must_use]
    pub fn with_session_timeout_hours(mut self, hours: u64) -> Self {
        self.session_timeout_hours = hours;
        self
    }

    #[must_use]
    pub fn with_development_mode(mut self, enabled: bool) -> Self {
        self.development_mode = enabled;
        self
    }

    #[must_use]
    pub fn with_admin_email(mut self, email: String) -> Self {
        self.admin_email = email;
        self
    }

    #[must_use]
    pub fn with_contact(mut self, contact: ContactSettings) -> Self {
        self.contact = contact;
        self
    }

    /// Read the optional `settings.json` from the data dir.
    ///
    /// # Errors
    /// Returns `Error::Config` when the file exists but cannot be parsed.
    pub fn load_contact_settings(path: &Path) -> Result<ContactSettings, Error> {
        let file = path.join("settings.json");
        if !file.exists() {
            return Ok(ContactSettings::default());
        }

        let raw = std::fs::read_to_string(&file)
            .map_err(|e| Error::config(format!("cannot read {}: {e}", file.display())))?;
        let parsed: SettingsFile = serde_json::from_str(&raw)
            .map_err(|e| Error::config(format!("invalid {}: {e}", file.display())))?;

        Ok(parsed.contact_form.unwrap_or_default())
    }

    /// Check the policy values before the server becomes reachable.
    ///
    /// # Errors
    /// Returns `Error::Config` on a zero interval/timeout or a missing or
    /// malformed admin email outside development mode.
    pub fn validate(&self) -> Result<(), Error> {
        if self.rotation_interval_minutes == 0 {
            return Err(Error::config("rotation interval must be at least 1 minute"));
        }

        if self.session_timeout_hours == 0 {
            return Err(Error::config("session timeout must be at least 1 hour"));
        }

        if !self.development_mode && !crate::api::handlers::valid_email(&self.admin_email) {
            return Err(Error::config(
                "a valid admin email is required outside development mode",
            ));
        }

        Ok(())
    }

    #[must_use]
    pub fn rotation_interval_minutes(&self) -> u64 {
        self.rotation_interval_minutes
    }

    #[must_use]
    pub fn session_timeout_hours(&self) -> u64 {
        self.session_timeout_hours
    }

    #[must_use]
    pub fn development_mode(&self) -> bool {
        self.development_mode
    }

    #[must_use]
    pub fn admin_email(&self) -> &str {
        &self.admin_email
    }

    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    #[must_use]
    pub fn assets_dir(&self) -> &Path {
        &self.assets_dir
    }

    #[must_use]
    pub fn contact(&self) -> &ContactSettings {
        &self.contact
    }
}
