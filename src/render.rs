//! HTML rendering for the index and campaign pages.
//!
//! ## Two Page Kinds
//!
//! - **Index** (`/index.html`): every active campaign in catalog order.
//!   Internal campaigns link to `/<slug>/`; external ones link off-site in a
//!   new tab. The markup is compiled in with [maud](https://maud.lambda.xyz/):
//!   its structure is part of the generator, not something editors change.
//! - **Campaign** (`/<slug>/index.html`): rendered from an on-disk
//!   [Tera](https://keats.github.io/tera/) template so campaign copy and
//!   layout can change without a new binary. External campaigns have no
//!   campaign page.
//!
//! ## Template Contract
//!
//! The campaign template sees one context per page:
//!
//! | Variable | Content |
//! |----------|---------|
//! | `campaign` | the campaign record, unknown fields included; absent optionals are `null` |
//! | `social_preview_url` | absolute preview-image URL |
//! | `page_url` | absolute URL of the page |
//! | `stats` | the stats object, or `null` |
//! | `asset_versions` | logical asset name → version tag |
//! | `asset_urls` | logical asset name → `/path?v=tag` |
//! | `webhook_url` | participation webhook for the browser form |
//! | `site` | site title, base URL, home URL, default social image |
//! | `generator` | build identifier |
//!
//! The neighbourhood options partial is registered as
//! `partials/barrio-options.html` whatever its file name on disk, so
//! templates always `{% include "partials/barrio-options.html" %}`.
//!
//! The `json` filter turns any value into a JavaScript literal for inline
//! scripts (`const STATS = {{ stats | json }};`). It is marked safe, never
//! fails, renders `null` for null, and escapes `</` so the literal cannot
//! close the surrounding `<script>`.
//!
//! Templates, partial, and filter are bound once when the renderer is
//! built; rendering a page never mutates the renderer.

use maud::{DOCTYPE, Markup, PreEscaped, html};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use tera::{Context, Tera, Value};
use thiserror::Error;

use crate::assets::AssetVersions;
use crate::catalog::CatalogEntry;
use crate::config::{SiteConfig, SiteMeta};
use crate::types::{Campaign, Stats};

/// Registered name of the campaign page template.
pub const CAMPAIGN_TEMPLATE: &str = "campaign.html";
/// Registered name of the neighbourhood options partial.
pub const BARRIO_OPTIONS_PARTIAL: &str = "partials/barrio-options.html";

const LUCIDE_SRC: &str = "https://unpkg.com/lucide@0.482.0/dist/umd/lucide.min.js";

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("cannot read template {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("template error: {0}")]
    Template(#[from] tera::Error),
    #[error("campaign '{0}' links off-site and has no page")]
    External(String),
}

/// Renders every page of a run. Built once, then shared read-only.
pub struct PageRenderer {
    tera: Tera,
    site: SiteMeta,
    assets: BTreeMap<String, String>,
    webhook_url: String,
    generator: String,
}

impl PageRenderer {
    /// Read the campaign template and partial from the site root.
    pub fn load(root: &Path, config: &SiteConfig) -> Result<Self, RenderError> {
        let dir = root.join(&config.templates.dir);
        let campaign = read_template(&dir.join(&config.templates.campaign))?;
        let barrio_options = read_template(&dir.join(&config.templates.barrio_options))?;
        Self::from_sources(&campaign, &barrio_options, config)
    }

    /// Build a renderer from template sources already in memory.
    pub fn from_sources(
        campaign: &str,
        barrio_options: &str,
        config: &SiteConfig,
    ) -> Result<Self, RenderError> {
        let mut tera = Tera::default();
        tera.set_escape_fn(escape_html);
        tera.register_filter("json", JsonLiteral);
        tera.add_raw_templates(vec![
            (BARRIO_OPTIONS_PARTIAL, barrio_options),
            (CAMPAIGN_TEMPLATE, campaign),
        ])?;

        Ok(Self {
            tera,
            site: config.site.clone(),
            assets: config.assets.clone(),
            webhook_url: config.sources.webhook_url.clone(),
            generator: format!("participa-site {}", crate::BUILD_ID),
        })
    }

    /// Replace the build identifier stamped into every page.
    pub fn with_generator(mut self, generator: impl Into<String>) -> Self {
        self.generator = generator.into();
        self
    }

    /// `/<path>?v=<tag>` for every configured asset.
    fn asset_urls(&self, versions: &AssetVersions) -> BTreeMap<&str, String> {
        self.assets
            .iter()
            .map(|(name, path)| {
                let url = versions.url(name, &format!("/{}", path.trim_start_matches('/')));
                (name.as_str(), url)
            })
            .collect()
    }

    /// Render the landing page listing `entries` in the given order.
    pub fn render_index(&self, entries: &[CatalogEntry], versions: &AssetVersions) -> String {
        let asset_urls = self.asset_urls(versions);
        render_index_page(
            &self.site,
            entries,
            asset_urls.get("css").map(String::as_str),
            &self.generator,
        )
        .into_string()
    }

    /// Render the page of an internal campaign.
    pub fn render_campaign(
        &self,
        entry: &CatalogEntry,
        versions: &AssetVersions,
    ) -> Result<String, RenderError> {
        if entry.is_external() {
            return Err(RenderError::External(entry.campaign.slug.clone()));
        }

        let page = CampaignPage {
            campaign: &entry.campaign,
            social_preview_url: &entry.social_preview_url,
            page_url: format!(
                "{}/{}/",
                self.site.base_url.trim_end_matches('/'),
                entry.campaign.slug
            ),
            stats: entry.stats(),
            asset_versions: versions,
            asset_urls: self.asset_urls(versions),
            webhook_url: &self.webhook_url,
            site: &self.site,
            generator: &self.generator,
        };
        let context = Context::from_serialize(&page)?;
        Ok(self.tera.render(CAMPAIGN_TEMPLATE, &context)?)
    }
}

fn read_template(path: &Path) -> Result<String, RenderError> {
    fs::read_to_string(path).map_err(|source| RenderError::Read {
        path: path.to_path_buf(),
        source,
    })
}

#[derive(Serialize)]
struct CampaignPage<'a> {
    campaign: &'a Campaign,
    social_preview_url: &'a str,
    page_url: String,
    stats: Option<&'a Stats>,
    asset_versions: &'a AssetVersions,
    asset_urls: BTreeMap<&'a str, String>,
    webhook_url: &'a str,
    site: &'a SiteMeta,
    generator: &'a str,
}

/// Autoescape for template output. Leaves `/` alone so URLs in attributes
/// stay readable.
fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

// ============================================================================
// JSON embedding filter
// ============================================================================

struct JsonLiteral;

impl tera::Filter for JsonLiteral {
    fn filter(&self, value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
        Ok(Value::String(json_literal(value)))
    }

    fn is_safe(&self) -> bool {
        true
    }
}

/// Serialize `value` for inline `<script>` use.
pub fn json_literal(value: &Value) -> String {
    let json = serde_json::to_string(value).unwrap_or_else(|_| "null".to_string());
    json.replace("</", "<\\/").replace("<!--", "\\u003c!--")
}

// ============================================================================
// Index page
// ============================================================================

fn render_index_page(
    site: &SiteMeta,
    entries: &[CatalogEntry],
    css_url: Option<&str>,
    generator: &str,
) -> Markup {
    html! {
        (DOCTYPE)
        html lang="es" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                meta name="generator" content=(generator);
                title { (site.title) }
                meta property="og:title" content=(site.title);
                meta property="og:type" content="website";
                meta property="og:url" content={ (site.base_url.trim_end_matches('/')) "/" };
                meta property="og:image" content=(site.default_social_image);
                @if let Some(href) = css_url {
                    link rel="stylesheet" href=(href);
                }
                script src=(LUCIDE_SRC) {}
            }
            body.index-page {
                main.campaigns {
                    a.back-link href=(site.home_url) {
                        i data-lucide="arrow-left" {}
                        (site.home_url.trim_start_matches("https://").trim_end_matches('/'))
                    }
                    header.campaigns-header {
                        i data-lucide="users" {}
                        h1 { (site.title) }
                    }
                    ul.campaign-list {
                        @for entry in entries {
                            li { (campaign_card(&entry.campaign)) }
                        }
                    }
                }
                script { (PreEscaped("lucide.createIcons();")) }
            }
        }
    }
}

/// One index entry: a local link, or an off-site link opening a new tab.
fn campaign_card(campaign: &Campaign) -> Markup {
    let body = html! {
        i.campaign-icon data-lucide=(campaign.icon) {}
        div.campaign-text {
            h2 { (campaign.title) }
            p { (campaign.description) }
        }
    };

    match campaign.external_link() {
        Some(url) => html! {
            a.campaign-card.external href=(url) target="_blank" rel="noopener noreferrer" {
                (body)
                i.external-mark data-lucide="external-link" {}
            }
        },
        None => html! {
            a.campaign-card href={ "/" (campaign.slug) "/" } { (body) }
        },
    }
}

// ============================================================================
// Tests
// ============================================================================
