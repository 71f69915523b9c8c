//! Campaign catalog: filter, enrich, and order the raw campaign list.
//!
//! ```text
//! raw campaigns ──filter(active)──► enrich (preview URL, stats) ──stable sort(order)──► entries
//! ```
//!
//! Inactive campaigns are dropped first and are invisible to every later
//! stage, reconciliation included.
//!
//! Enrichment runs one campaign at a time in catalog order. Each entry gets
//! an absolute social-preview URL, and each internal campaign gets its stats
//! resource. Stats failures are absorbed here: the entry carries
//! [`StatsOutcome::Defaulted`] with zeroed stats and the cause, and the run
//! goes on. External campaigns never trigger a stats request.
//!
//! The final order is ascending `order`, ties keeping input order. It is the
//! presentation order of the index page and nothing else.

use serde_json::Value;
use std::collections::BTreeSet;
use tracing::{debug, warn};

use crate::config::{SiteMeta, SourcesConfig};
use crate::fetch::JsonFetcher;
use crate::naming::is_safe_slug;
use crate::types::{Campaign, PreviewImage, Stats, Warning};

/// Result of the per-campaign stats lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum StatsOutcome {
    Fetched(Stats),
    /// The lookup failed; zeroed stats stand in.
    Defaulted { stats: Stats, cause: String },
}

impl StatsOutcome {
    fn defaulted(cause: impl ToString) -> Self {
        StatsOutcome::Defaulted {
            stats: Stats::default(),
            cause: cause.to_string(),
        }
    }

    pub fn stats(&self) -> &Stats {
        match self {
            StatsOutcome::Fetched(stats) | StatsOutcome::Defaulted { stats, .. } => stats,
        }
    }

    pub fn is_defaulted(&self) -> bool {
        matches!(self, StatsOutcome::Defaulted { .. })
    }
}

/// An active campaign ready for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    pub campaign: Campaign,
    /// Absolute URL of the social-preview image.
    pub social_preview_url: String,
    /// `None` for external campaigns, which are never looked up.
    pub stats: Option<StatsOutcome>,
}

impl CatalogEntry {
    pub fn is_external(&self) -> bool {
        self.campaign.is_external()
    }

    pub fn stats(&self) -> Option<&Stats> {
        self.stats.as_ref().map(StatsOutcome::stats)
    }
}

/// Ordered, enriched campaigns plus the warnings raised while building them.
#[derive(Debug, Default)]
pub struct Catalog {
    pub entries: Vec<CatalogEntry>,
    pub warnings: Vec<Warning>,
}

impl Catalog {
    /// Slugs of active internal campaigns: exactly the directories the
    /// reconciler may keep.
    pub fn internal_slugs(&self) -> BTreeSet<String> {
        self.entries
            .iter()
            .filter(|e| !e.is_external())
            .map(|e| e.campaign.slug.clone())
            .collect()
    }

    pub fn internal(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.iter().filter(|e| !e.is_external())
    }
}

/// Decode catalog rows one at a time.
///
/// A row that cannot be read as a campaign (a draft with a `null` slug, a
/// non-numeric `order`, …) is skipped with a warning instead of failing the
/// whole catalog. `index` in the warning is the row's position in the export.
pub fn decode_records(rows: Vec<Value>) -> (Vec<Campaign>, Vec<Warning>) {
    let mut campaigns = Vec::with_capacity(rows.len());
    let mut warnings = Vec::new();

    for (index, row) in rows.into_iter().enumerate() {
        match serde_json::from_value::<Campaign>(row) {
            Ok(campaign) => campaigns.push(campaign),
            Err(e) => {
                warn!(index, error = %e, "skipping unreadable catalog record");
                warnings.push(Warning::InvalidRecord {
                    index,
                    cause: e.to_string(),
                });
            }
        }
    }

    (campaigns, warnings)
}

/// Filter, enrich, and sort `raw`.
///
/// Never fails: every per-campaign problem degrades into a warning. Active
/// internal campaigns whose slug cannot serve as a directory name are
/// skipped, as are later duplicates of an already claimed slug.
pub fn build(
    raw: Vec<Campaign>,
    sources: &SourcesConfig,
    site: &SiteMeta,
    fetcher: &dyn JsonFetcher,
) -> Catalog {
    let mut catalog = Catalog::default();
    let mut claimed = BTreeSet::new();

    for campaign in raw.into_iter().filter(|c| c.active) {
        if !campaign.is_external() {
            if !is_safe_slug(&campaign.slug) {
                warn!(slug = %campaign.slug, "skipping campaign with unsafe slug");
                catalog.warnings.push(Warning::UnsafeSlug {
                    slug: campaign.slug,
                });
                continue;
            }
            if !claimed.insert(campaign.slug.clone()) {
                warn!(slug = %campaign.slug, "skipping duplicate campaign slug");
                catalog.warnings.push(Warning::DuplicateSlug {
                    slug: campaign.slug,
                });
                continue;
            }
        }

        let social_preview_url = social_preview_url(
            campaign.social_preview_img.as_deref(),
            &sources.uploads_base_url,
            &site.default_social_image,
        );

        let stats = if campaign.is_external() {
            None
        } else {
            let outcome = lookup_stats(&campaign.slug, sources, fetcher);
            if let StatsOutcome::Defaulted { cause, .. } = &outcome {
                warn!(slug = %campaign.slug, %cause, "stats unavailable, using zeroed stats");
                catalog.warnings.push(Warning::StatsDefaulted {
                    slug: campaign.slug.clone(),
                    cause: cause.clone(),
                });
            }
            Some(outcome)
        };

        catalog.entries.push(CatalogEntry {
            campaign,
            social_preview_url,
            stats,
        });
    }

    // Vec::sort_by is stable: equal `order` keeps catalog order.
    catalog
        .entries
        .sort_by(|a, b| a.campaign.order.total_cmp(&b.campaign.order));
    catalog
}

/// Fetch and parse one campaign's stats, degrading to zeroed stats.
pub fn lookup_stats(slug: &str, sources: &SourcesConfig, fetcher: &dyn JsonFetcher) -> StatsOutcome {
    let url = sources.stats_url(slug);
    let value = match fetcher.fetch_json(&url) {
        Ok(value) => value,
        Err(e) => return StatsOutcome::defaulted(e),
    };
    match serde_json::from_value::<Stats>(value) {
        Ok(stats) => {
            debug!(slug, total = stats.totales.total_reclamaciones, "stats fetched");
            StatsOutcome::Fetched(stats)
        }
        Err(e) => StatsOutcome::defaulted(format!("unexpected stats shape at {url}: {e}")),
    }
}

/// First uploaded preview image as an absolute URL, or the site default.
pub fn social_preview_url(
    images: Option<&[PreviewImage]>,
    uploads_base_url: &str,
    default_url: &str,
) -> String {
    let path = images
        .and_then(|imgs| imgs.first())
        .and_then(|img| img.path.as_deref())
        .map(str::trim)
        .filter(|p| !p.is_empty());

    match path {
        Some(p) if p.starts_with("https://") || p.starts_with("http://") => p.to_string(),
        Some(p) => format!(
            "{}/{}",
            uploads_base_url.trim_end_matches('/'),
            p.trim_start_matches('/')
        ),
        None => default_url.to_string(),
    }
}
