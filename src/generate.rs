//! The generation run: fetch, enrich, render, write, reconcile.
//!
//! ## Run Sequence
//!
//! ```text
//! START
//!   → VERSION_ASSETS      (unreadable asset: timestamp tag + warning)
//!   → LOAD_TEMPLATES      (fatal)
//!   → FETCH_CATALOG       (fatal, nothing on disk has been touched)
//!   → ENRICH + SORT       (per-campaign stats failures: zeroed stats + warning)
//!   → RENDER_INDEX
//!   → RENDER_CAMPAIGNS    (externals skipped; fatal on template error)
//!   → WRITE_ALL           (fatal on filesystem error)
//!   → RECONCILE           (fatal on filesystem error)
//!   → DONE
//! ```
//!
//! Every page is rendered into memory before the first write, and
//! reconciliation runs only after every write succeeded. A failure before
//! `WRITE_ALL` therefore leaves the output root exactly as it was, and a
//! stale directory is never removed while its replacement is uncommitted.
//!
//! The run is strictly sequential: one campaign at a time, in catalog order.

use serde_json::Value;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use crate::assets::AssetVersions;
use crate::catalog::{self, CatalogEntry};
use crate::config::SiteConfig;
use crate::fetch::{FetchError, JsonFetcher};
use crate::reconcile::{OutputRoot, PageTarget, ReconcileError, ReconcileReport};
use crate::render::{PageRenderer, RenderError};
use crate::types::Warning;

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("campaign catalog unavailable: {0}")]
    Catalog(#[from] FetchError),
    #[error("campaign catalog at {url} is not a list of campaigns: {source}")]
    CatalogShape {
        url: String,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Reconcile(#[from] ReconcileError),
}

/// A page written during the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRecord {
    /// `None` for the index page.
    pub slug: Option<String>,
    pub title: String,
    /// Path relative to the output root.
    pub path: PathBuf,
    /// The page was rendered with zeroed stats.
    pub stats_defaulted: bool,
}

/// An index entry pointing off-site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalLink {
    pub slug: String,
    pub title: String,
    pub url: String,
}

/// Everything a successful run did.
#[derive(Debug, Clone, Default)]
pub struct GenerateReport {
    /// Index first, then campaign pages in presentation order.
    pub pages: Vec<PageRecord>,
    pub external: Vec<ExternalLink>,
    pub asset_versions: AssetVersions,
    pub reconcile: ReconcileReport,
    pub warnings: Vec<Warning>,
}

impl GenerateReport {
    pub fn campaign_pages(&self) -> impl Iterator<Item = &PageRecord> {
        self.pages.iter().filter(|p| p.slug.is_some())
    }
}

/// Run one generation against the site at `root`.
pub fn generate(
    config: &SiteConfig,
    root: &Path,
    fetcher: &dyn JsonFetcher,
) -> Result<GenerateReport, GenerateError> {
    let (asset_versions, mut warnings) = AssetVersions::compute(root, &config.assets);
    let renderer = PageRenderer::load(root, config)?;

    let catalog_url = &config.sources.catalog_url;
    info!(url = %catalog_url, "fetching campaign catalog");
    let rows = fetch_catalog(catalog_url, fetcher)?;
    info!(count = rows.len(), "catalog fetched");
    let (raw, record_warnings) = catalog::decode_records(rows);
    warnings.extend(record_warnings);

    let catalog = catalog::build(raw, &config.sources, &config.site, fetcher);
    warnings.extend(catalog.warnings.iter().cloned());
    let entries = &catalog.entries;

    // Render everything before touching the filesystem.
    let mut rendered = Vec::with_capacity(entries.len() + 1);
    rendered.push((
        PageTarget::Index,
        renderer.render_index(entries, &asset_versions),
    ));
    let mut external = Vec::new();
    for entry in entries {
        let campaign = &entry.campaign;
        if let Some(url) = campaign.external_link() {
            external.push(ExternalLink {
                slug: campaign.slug.clone(),
                title: campaign.title.clone(),
                url: url.to_string(),
            });
            continue;
        }
        let markup = renderer.render_campaign(entry, &asset_versions)?;
        rendered.push((PageTarget::Campaign(&campaign.slug), markup));
    }

    let output = OutputRoot::new(root, config.reconcile.ignore.iter().cloned());
    let mut pages = Vec::with_capacity(rendered.len());
    for (target, markup) in &rendered {
        output.write(*target, markup)?;
        pages.push(page_record(*target, entries, config));
    }
    info!(pages = pages.len(), "pages written");

    let reconcile = output.reconcile(&catalog.internal_slugs())?;
    for name in &reconcile.flagged {
        warnings.push(Warning::DirectoryFlagged { name: name.clone() });
    }

    if !warnings.is_empty() {
        warn!(count = warnings.len(), "run completed with warnings");
    }

    Ok(GenerateReport {
        pages,
        external,
        asset_versions,
        reconcile,
        warnings,
    })
}

/// The catalog must be a JSON array; its rows are decoded individually.
fn fetch_catalog(url: &str, fetcher: &dyn JsonFetcher) -> Result<Vec<Value>, GenerateError> {
    let value = fetcher.fetch_json(url)?;
    serde_json::from_value(value).map_err(|source| GenerateError::CatalogShape {
        url: url.to_string(),
        source,
    })
}

fn page_record(
    target: PageTarget<'_>,
    entries: &[CatalogEntry],
    config: &SiteConfig,
) -> PageRecord {
    let path = OutputRoot::relative_path(target);
    match target {
        PageTarget::Index => PageRecord {
            slug: None,
            title: config.site.title.clone(),
            path,
            stats_defaulted: false,
        },
        PageTarget::Campaign(slug) => {
            let entry = entries.iter().find(|e| e.campaign.slug == slug);
            PageRecord {
                slug: Some(slug.to_string()),
                title: entry.map(|e| e.campaign.title.clone()).unwrap_or_default(),
                path,
                stats_defaulted: entry
                    .and_then(|e| e.stats.as_ref())
                    .is_some_and(|s| s.is_defaulted()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{FakeFetcher, setup_fixtures};
    use serde_json::json;
    use std::fs;

    const CATALOG: &str = "https://data.test/campaigns.json";

    fn config() -> SiteConfig {
        let mut config = SiteConfig::default();
        config.sources.catalog_url = CATALOG.into();
        config.sources.stats_base_url = "https://data.test/stats/".into();
        config.sources.uploads_base_url = "https://uploads.test/".into();
        config
    }

    fn stats_url(slug: &str) -> String {
        format!("https://data.test/stats/{slug}.json")
    }

    #[test]
    fn writes_index_and_internal_pages() {
        let site = setup_fixtures();
        let fetcher = FakeFetcher::new()
            .with_json(
                CATALOG,
                json!([
                    {"slug": "ruido", "title": "Ruido", "active": true, "order": 2},
                    {"slug": "parques", "title": "Parques", "active": true, "order": 1},
                ]),
            )
            .with_json(&stats_url("ruido"), json!({"totales": {"total_reclamaciones": 3}}))
            .with_json(&stats_url("parques"), json!({}));

        let report = generate(&config(), site.path(), &fetcher).unwrap();

        assert!(site.path().join("index.html").is_file());
        assert!(site.path().join("ruido/index.html").is_file());
        assert!(site.path().join("parques/index.html").is_file());
        let slugs: Vec<_> = report.campaign_pages().filter_map(|p| p.slug.as_deref()).collect();
        assert_eq!(slugs, vec!["parques", "ruido"]);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn catalog_fetch_failure_touches_nothing() {
        let site = setup_fixtures();
        fs::create_dir_all(site.path().join("old")).unwrap();
        fs::write(site.path().join("old/index.html"), "stale").unwrap();
        let fetcher = FakeFetcher::new().with_failure(CATALOG);

        let result = generate(&config(), site.path(), &fetcher);

        assert!(matches!(result, Err(GenerateError::Catalog(_))));
        assert!(!site.path().join("index.html").exists());
        assert!(site.path().join("old/index.html").exists());
    }

    #[test]
    fn catalog_with_wrong_shape_is_fatal() {
        let site = setup_fixtures();
        let fetcher = FakeFetcher::new().with_json(CATALOG, json!({"campaigns": []}));

        let result = generate(&config(), site.path(), &fetcher);

        assert!(matches!(result, Err(GenerateError::CatalogShape { .. })));
        assert!(!site.path().join("index.html").exists());
    }

    #[test]
    fn unreadable_rows_are_skipped_not_fatal() {
        let site = setup_fixtures();
        let fetcher = FakeFetcher::new()
            .with_json(
                CATALOG,
                json!([
                    {"slug": "ruido", "active": true, "order": 1},
                    {"slug": null, "active": false},
                    {"slug": "plazas", "active": true, "order": 0.5}
                ]),
            )
            .with_json(&stats_url("ruido"), json!({}))
            .with_json(&stats_url("plazas"), json!({}));

        let report = generate(&config(), site.path(), &fetcher).unwrap();

        let slugs: Vec<_> = report.campaign_pages().filter_map(|p| p.slug.as_deref()).collect();
        assert_eq!(slugs, vec!["plazas", "ruido"]);
        assert!(matches!(
            report.warnings.as_slice(),
            [Warning::InvalidRecord { index: 1, .. }]
        ));
    }

    #[test]
    fn missing_template_aborts_before_fetch() {
        let site = setup_fixtures();
        fs::remove_file(site.path().join("templates/campaign.html")).unwrap();
        let fetcher = FakeFetcher::new().with_json(CATALOG, json!([]));

        let result = generate(&config(), site.path(), &fetcher);

        assert!(matches!(result, Err(GenerateError::Render(RenderError::Read { .. }))));
        assert!(fetcher.calls().is_empty());
    }

    #[test]
    fn external_campaigns_are_reported_not_written() {
        let site = setup_fixtures();
        let fetcher = FakeFetcher::new().with_json(
            CATALOG,
            json!([{"slug": "fuera", "title": "Fuera", "active": true,
                    "external_url": "https://other.test/"}]),
        );

        let report = generate(&config(), site.path(), &fetcher).unwrap();

        assert_eq!(
            report.external,
            vec![ExternalLink {
                slug: "fuera".into(),
                title: "Fuera".into(),
                url: "https://other.test/".into(),
            }]
        );
        assert_eq!(report.campaign_pages().count(), 0);
        assert!(!site.path().join("fuera").exists());
    }

    #[test]
    fn defaulted_stats_are_recorded() {
        let site = setup_fixtures();
        let fetcher = FakeFetcher::new()
            .with_json(CATALOG, json!([{"slug": "x", "active": true}]))
            .with_body(&stats_url("x"), "{not json");

        let report = generate(&config(), site.path(), &fetcher).unwrap();

        let page = report.campaign_pages().next().unwrap();
        assert!(page.stats_defaulted);
        assert!(matches!(
            report.warnings.as_slice(),
            [Warning::StatsDefaulted { slug, .. }] if slug == "x"
        ));
    }

    #[test]
    fn flagged_directories_become_warnings() {
        let site = setup_fixtures();
        fs::create_dir_all(site.path().join("drafts")).unwrap();
        let fetcher = FakeFetcher::new().with_json(CATALOG, json!([]));

        let report = generate(&config(), site.path(), &fetcher).unwrap();

        assert_eq!(report.reconcile.flagged, vec!["drafts"]);
        assert!(report
            .warnings
            .contains(&Warning::DirectoryFlagged { name: "drafts".into() }));
        assert!(site.path().join("drafts").exists());
    }

    #[test]
    fn asset_versions_are_reported() {
        let site = setup_fixtures();
        let fetcher = FakeFetcher::new().with_json(CATALOG, json!([]));

        let report = generate(&config(), site.path(), &fetcher).unwrap();

        let expected = crate::assets::version_of(&site.path().join("css/style.css")).unwrap();
        assert_eq!(report.asset_versions.get("css"), Some(expected.as_str()));
        let index = fs::read_to_string(site.path().join("index.html")).unwrap();
        assert!(index.contains(&format!("/css/style.css?v={expected}")));
    }

    #[test]
    fn second_run_is_identical() {
        let site = setup_fixtures();
        let fetcher = FakeFetcher::new()
            .with_json(CATALOG, json!([{"slug": "ruido", "active": true}]))
            .with_json(&stats_url("ruido"), json!({}));

        generate(&config(), site.path(), &fetcher).unwrap();
        let first = fs::read_to_string(site.path().join("ruido/index.html")).unwrap();
        let report = generate(&config(), site.path(), &fetcher).unwrap();
        let second = fs::read_to_string(site.path().join("ruido/index.html")).unwrap();

        assert_eq!(first, second);
        assert_eq!(report.reconcile, ReconcileReport::default());
    }
}
