//! Site configuration module.
//!
//! Handles loading, validating, and merging the `config.toml` that sits in the
//! site root. Stock defaults describe the production site, so a missing file
//! is valid and a present file only needs the keys it wants to change.
//!
//! ## Config File Location
//!
//! ```text
//! site/
//! ├── config.toml              # Optional, overrides stock defaults
//! └── content/
//!     └── news/
//!         ├── tourist-visa-tips-dc.mdx
//!         └── zh/
//!             └── tourist-visa-tips-dc.mdx
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [content]
//! dir = "content/news"      # Article directory, relative to the site root
//! extension = "mdx"         # Article file extension (no dot)
//!
//! [locales]
//! default = "en"            # Locale whose files live at the directory root
//! available = ["en", "zh"]  # Every published locale, default included
//!
//! [site]
//! base_url = "https://jingtongvisa.com"
//! name = "Jing Tong Visa Services"
//!
//! [contact]
//! recipient = "info@jingtongvisa.com"
//! sender = "Jing Tong Visa Website <noreply@jingtongvisa.com>"
//! smtp_host = "smtp.resend.com"
//! smtp_port = 465
//! smtp_username = "resend"
//! api_key_env = "RESEND_API_KEY"   # Name of the env var holding the credential
//! ```
//!
//! The mail credential itself never lives in this file. When the variable
//! named by `contact.api_key_env` is unset, contact submissions are logged
//! instead of mailed.
//!
//! Unknown keys are rejected to catch typos early.

use crate::locale::Locales;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CONFIG_FILE: &str = "config.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Site configuration loaded from `config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Where articles live and how they are named.
    pub content: ContentConfig,
    /// Published locales.
    pub locales: LocalesConfig,
    /// Public site identity (sitemap URLs).
    pub site: SiteInfo,
    /// Contact form delivery.
    pub contact: ContactConfig,
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.content.dir.trim().is_empty() {
            return Err(ConfigError::Validation(
                "content.dir must not be empty".into(),
            ));
        }
        let ext = &self.content.extension;
        if ext.is_empty() || ext.contains('.') || ext.contains('/') {
            return Err(ConfigError::Validation(
                "content.extension must be a bare extension like \"mdx\"".into(),
            ));
        }
        for locale in self
            .locales
            .available
            .iter()
            .chain(std::iter::once(&self.locales.default))
        {
            if !is_locale_code(locale) {
                return Err(ConfigError::Validation(format!(
                    "locale {locale:?} must be a two-letter lowercase code"
                )));
            }
        }
        if !self.locales.available.contains(&self.locales.default) {
            return Err(ConfigError::Validation(
                "locales.default must be listed in locales.available".into(),
            ));
        }
        let base_url = &self.site.base_url;
        if !(base_url.starts_with("https://") || base_url.starts_with("http://")) {
            return Err(ConfigError::Validation(
                "site.base_url must start with http:// or https://".into(),
            ));
        }
        self.contact.validate()
    }

    /// Absolute (or root-relative) path of the article directory.
    pub fn content_path(&self, root: &Path) -> PathBuf {
        root.join(&self.content.dir)
    }

    /// The configured locale set.
    pub fn locale_set(&self) -> Locales {
        Locales::new(
            self.locales.default.clone(),
            self.locales.available.iter().cloned(),
        )
    }
}

fn is_locale_code(code: &str) -> bool {
    code.len() == 2 && code.bytes().all(|b| b.is_ascii_lowercase())
}

/// Article storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContentConfig {
    /// Article directory relative to the site root.
    pub dir: String,
    /// File extension of article files, without the dot.
    pub extension: String,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            dir: "content/news".to_string(),
            extension: "mdx".to_string(),
        }
    }
}

/// Published locales.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LocalesConfig {
    pub default: String,
    pub available: Vec<String>,
}

impl Default for LocalesConfig {
    fn default() -> Self {
        Self {
            default: "en".to_string(),
            available: vec!["en".to_string(), "zh".to_string()],
        }
    }
}

/// Public identity of the site.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteInfo {
    /// Canonical origin, e.g. `https://jingtongvisa.com`.
    pub base_url: String,
    pub name: String,
}

impl SiteInfo {
    /// Base URL without a trailing slash.
    pub fn origin(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}

impl Default for SiteInfo {
    fn default() -> Self {
        Self {
            base_url: "https://jingtongvisa.com".to_string(),
            name: "Jing Tong Visa Services".to_string(),
        }
    }
}

/// Contact form delivery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContactConfig {
    /// Operator address that receives every submission.
    pub recipient: String,
    /// `From:` mailbox, display name allowed.
    pub sender: String,
    pub smtp_host: String,
    /// 465 uses implicit TLS; any other port upgrades with STARTTLS.
    pub smtp_port: u16,
    pub smtp_username: String,
    /// Environment variable that holds the SMTP password / API key.
    pub api_key_env: String,
}

impl ContactConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        self.recipient
            .parse::<lettre::Address>()
            .map_err(|e| ConfigError::Validation(format!("contact.recipient: {e}")))?;
        self.sender
            .parse::<lettre::message::Mailbox>()
            .map_err(|e| ConfigError::Validation(format!("contact.sender: {e}")))?;
        if self.smtp_host.trim().is_empty() {
            return Err(ConfigError::Validation(
                "contact.smtp_host must not be empty".into(),
            ));
        }
        if self.smtp_port == 0 {
            return Err(ConfigError::Validation(
                "contact.smtp_port must be non-zero".into(),
            ));
        }
        if self.api_key_env.trim().is_empty() {
            return Err(ConfigError::Validation(
                "contact.api_key_env must name an environment variable".into(),
            ));
        }
        Ok(())
    }
}

impl Default for ContactConfig {
    fn default() -> Self {
        Self {
            recipient: "info@jingtongvisa.com".to_string(),
            sender: "Jing Tong Visa Website <noreply@jingtongvisa.com>".to_string(),
            smtp_host: "smtp.resend.com".to_string(),
            smtp_port: 465,
            smtp_username: "resend".to_string(),
            api_key_env: "RESEND_API_KEY".to_string(),
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(SiteConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if no `config.toml` exists in the directory.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = path.join(CONFIG_FILE);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<SiteConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` in the site root.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result.
pub fn load_config(root: &Path) -> Result<SiteConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(root)?;
    let config = resolve_config(base, overlay)?;
    tracing::debug!(root = %root.display(), content_dir = %config.content.dir, "config loaded");
    Ok(config)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Jing Tong Site Configuration
# ============================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Article storage
# ---------------------------------------------------------------------------
[content]
# Directory holding one file per article, relative to the site root.
# Translations live in a subdirectory named after the locale (e.g. zh/).
dir = "content/news"

# Extension of article files, without the dot.
extension = "mdx"

# ---------------------------------------------------------------------------
# Locales
# ---------------------------------------------------------------------------
[locales]
# Locale whose files live directly in the content directory.
default = "en"

# Every published locale. Requests for any other locale get the default.
available = ["en", "zh"]

# ---------------------------------------------------------------------------
# Site identity
# ---------------------------------------------------------------------------
[site]
# Canonical origin used to build sitemap URLs.
base_url = "https://jingtongvisa.com"
name = "Jing Tong Visa Services"

# ---------------------------------------------------------------------------
# Contact form delivery
# ---------------------------------------------------------------------------
[contact]
# Operator address that receives every submission.
recipient = "info@jingtongvisa.com"
sender = "Jing Tong Visa Website <noreply@jingtongvisa.com>"

# SMTP relay. Port 465 uses implicit TLS, other ports use STARTTLS.
smtp_host = "smtp.resend.com"
smtp_port = 465
smtp_username = "resend"

# Environment variable holding the SMTP password / API key.
# When it is unset, submissions are written to the log instead of mailed.
api_key_env = "RESEND_API_KEY"
"##
}
