//! Generator configuration.
//!
//! Settings are layered, later layers winning:
//!
//! 1. Stock defaults (the production endpoints and the standard site layout)
//! 2. `participa.toml` in the site root, if present
//! 3. Environment overrides for the three deployment-specific URLs
//!
//! ## Config File
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [sources]
//! catalog_url = "https://proyectos.aldeapucela.org/exports/participa/campaigns.json"
//! stats_base_url = "https://proyectos.aldeapucela.org/exports/participa/stats/"
//! uploads_base_url = "https://proyectos.aldeapucela.org/"
//! webhook_url = "https://tasks.nukeador.com/webhook/aldea-participa"
//!
//! [site]
//! title = "Participación vecinal"
//! base_url = "https://participa.aldeapucela.org"
//! home_url = "https://aldeapucela.org/"
//! default_social_image = "https://participa.aldeapucela.org/img/social-preview.png"
//!
//! [templates]
//! dir = "templates"
//! campaign = "campaign.html"
//! barrio_options = "partials/barrio-options.html"
//!
//! [assets]
//! css = "css/style.css"
//! js = "js/campaign.js"
//!
//! [reconcile]
//! ignore = [".git", ".github", "node_modules", "scripts", "templates", "css", "js", "img"]
//! ```
//!
//! Config files are sparse: override just the values you need. Unknown keys
//! are rejected to catch typos early, except under `[assets]`, which is an
//! open map of logical asset names.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::fetch::require_https;

/// Name of the optional config file in the site root.
pub const CONFIG_FILENAME: &str = "participa.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Full generator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Remote endpoints.
    pub sources: SourcesConfig,
    /// Site identity used by the index page and social previews.
    pub site: SiteMeta,
    /// Campaign template locations, relative to the site root.
    pub templates: TemplatesConfig,
    /// Logical asset name → path relative to the site root.
    pub assets: BTreeMap<String, String>,
    /// Output directory housekeeping.
    pub reconcile: ReconcileConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            sources: SourcesConfig::default(),
            site: SiteMeta::default(),
            templates: TemplatesConfig::default(),
            assets: default_assets(),
            reconcile: ReconcileConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Validate values the pipeline relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, url) in [
            ("sources.catalog_url", &self.sources.catalog_url),
            ("sources.stats_base_url", &self.sources.stats_base_url),
        ] {
            require_https(url)
                .map_err(|e| ConfigError::Validation(format!("{key}: {e}")))?;
        }
        if self.templates.campaign.trim().is_empty() {
            return Err(ConfigError::Validation(
                "templates.campaign must not be empty".into(),
            ));
        }
        if self.templates.barrio_options.trim().is_empty() {
            return Err(ConfigError::Validation(
                "templates.barrio_options must not be empty".into(),
            ));
        }
        if self.assets.is_empty() {
            return Err(ConfigError::Validation(
                "assets must list at least one file".into(),
            ));
        }
        Ok(())
    }

    /// Apply environment-style overrides on top of the loaded values.
    pub fn apply_overrides(&mut self, overrides: &SourceOverrides) {
        if let Some(url) = &overrides.catalog_url {
            self.sources.catalog_url = url.clone();
        }
        if let Some(url) = &overrides.stats_base_url {
            self.sources.stats_base_url = url.clone();
        }
        if let Some(url) = &overrides.webhook_url {
            self.sources.webhook_url = url.clone();
        }
    }
}

/// The deployment-specific URLs that may be set from the environment.
#[derive(Debug, Clone, Default)]
pub struct SourceOverrides {
    pub catalog_url: Option<String>,
    pub stats_base_url: Option<String>,
    pub webhook_url: Option<String>,
}

/// Remote endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourcesConfig {
    /// JSON array of campaign records.
    pub catalog_url: String,
    /// Per-campaign stats live at `<stats_base_url><slug>.json`.
    pub stats_base_url: String,
    /// Base for uploaded preview-image paths.
    pub uploads_base_url: String,
    /// Participation webhook; only the browser form calls it.
    pub webhook_url: String,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            catalog_url: "https://proyectos.aldeapucela.org/exports/participa/campaigns.json"
                .to_string(),
            stats_base_url: "https://proyectos.aldeapucela.org/exports/participa/stats/"
                .to_string(),
            uploads_base_url: "https://proyectos.aldeapucela.org/".to_string(),
            webhook_url: "https://tasks.nukeador.com/webhook/aldea-participa".to_string(),
        }
    }
}

impl SourcesConfig {
    pub fn stats_url(&self, slug: &str) -> String {
        format!("{}{}.json", self.stats_base_url, slug)
    }
}

/// Site identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteMeta {
    /// Index page title.
    pub title: String,
    /// Public origin of the generated site, without trailing slash.
    pub base_url: String,
    /// "Back" link shown above the index.
    pub home_url: String,
    /// Social preview used when a campaign has no uploaded image.
    pub default_social_image: String,
}

impl Default for SiteMeta {
    fn default() -> Self {
        Self {
            title: "Participación vecinal".to_string(),
            base_url: "https://participa.aldeapucela.org".to_string(),
            home_url: "https://aldeapucela.org/".to_string(),
            default_social_image: "https://participa.aldeapucela.org/img/social-preview.png"
                .to_string(),
        }
    }
}

/// Campaign template locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TemplatesConfig {
    /// Template directory, relative to the site root.
    pub dir: String,
    /// Campaign page template, relative to `dir`.
    pub campaign: String,
    /// Neighbourhood `<option>` partial, relative to `dir`.
    pub barrio_options: String,
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        Self {
            dir: "templates".to_string(),
            campaign: "campaign.html".to_string(),
            barrio_options: "partials/barrio-options.html".to_string(),
        }
    }
}

/// Output directory housekeeping.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReconcileConfig {
    /// Top-level directories that are never campaign output.
    /// Dot-prefixed directories are always ignored as well.
    pub ignore: Vec<String>,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            ignore: [
                ".git",
                ".github",
                "node_modules",
                "scripts",
                "templates",
                "css",
                "js",
                "img",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

/// Stock assets: the stylesheet and the campaign page script.
fn default_assets() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("css".to_string(), "css/style.css".to_string()),
        ("js".to_string(), "js/campaign.js".to_string()),
    ])
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
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

/// Load `participa.toml` from the site root as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(root: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = root.join(CONFIG_FILENAME);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<SiteConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    Ok(merged.try_into()?)
}

/// Load the effective config for a site root.
///
/// Merges the file (if any) over stock defaults, applies `overrides`, and
/// validates the result.
pub fn load_config(root: &Path, overrides: &SourceOverrides) -> Result<SiteConfig, ConfigError> {
    let mut config = resolve_config(stock_defaults_value(), load_raw_config(root)?)?;
    config.apply_overrides(overrides);
    config.validate()?;
    Ok(config)
}

/// Returns a fully-commented stock `participa.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# participa-site configuration
# ============================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# The three URLs under [sources] that differ per deployment can also be set
# from the environment, which wins over this file:
#   CAMPAIGNS_JSON_URL         -> sources.catalog_url
#   STATS_BASE_URL             -> sources.stats_base_url
#   PARTICIPATION_WEBHOOK_URL  -> sources.webhook_url
#
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Remote endpoints
# ---------------------------------------------------------------------------
[sources]
# JSON array of campaign records. Must be https.
catalog_url = "https://proyectos.aldeapucela.org/exports/participa/campaigns.json"

# Per-campaign stats are fetched from <stats_base_url><slug>.json. Must be https.
stats_base_url = "https://proyectos.aldeapucela.org/exports/participa/stats/"

# Uploaded social-preview image paths are resolved against this base.
uploads_base_url = "https://proyectos.aldeapucela.org/"

# Where the campaign page form registers participation (browser only).
webhook_url = "https://tasks.nukeador.com/webhook/aldea-participa"

# ---------------------------------------------------------------------------
# Site identity
# ---------------------------------------------------------------------------
[site]
title = "Participación vecinal"
base_url = "https://participa.aldeapucela.org"
home_url = "https://aldeapucela.org/"
default_social_image = "https://participa.aldeapucela.org/img/social-preview.png"

# ---------------------------------------------------------------------------
# Campaign page templates (relative to the site root)
# ---------------------------------------------------------------------------
[templates]
dir = "templates"
campaign = "campaign.html"
barrio_options = "partials/barrio-options.html"

# ---------------------------------------------------------------------------
# Versioned assets: logical name = path relative to the site root.
# Pages link them as <path>?v=<content hash>.
# ---------------------------------------------------------------------------
[assets]
css = "css/style.css"
js = "js/campaign.js"

# ---------------------------------------------------------------------------
# Housekeeping
# ---------------------------------------------------------------------------
[reconcile]
# Top-level directories that are never removed. Dot-prefixed directories
# are always kept. Any other directory that is not an active campaign is
# removed if it holds generated output, and flagged for review otherwise.
ignore = [".git", ".github", "node_modules", "scripts", "templates", "css", "js", "img"]
"##
}
