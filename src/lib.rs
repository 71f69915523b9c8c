//! # Participa Site
//!
//! A build-time static site generator for civic-participation campaigns.
//! A remote JSON export is the data source: every active campaign becomes a
//! landing page, and a single index lists them all.
//!
//! # Architecture: One Sequential Pipeline
//!
//! ```text
//! catalog URL ──fetch──▶ Vec<Campaign>
//!                           │ filter active, enrich (preview URL, stats), sort
//!                           ▼
//!                        Catalog ──render──▶ pages in memory
//!                                                │ write all
//!                                                ▼
//!                                          <root>/index.html
//!                                          <root>/<slug>/index.html
//!                                                │ reconcile
//!                                                ▼
//!                                  stale campaign directories removed
//! ```
//!
//! The site root is both input and output: it holds the templates and static
//! assets, and generated campaign directories are written next to them.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`fetch`] | One HTTPS GET + JSON parse per call, behind the [`fetch::JsonFetcher`] seam |
//! | [`assets`] | Content-hash cache-busting tags for the stylesheet and script |
//! | [`catalog`] | Filters, enriches, and orders the raw campaign list |
//! | [`render`] | Index page (maud) and campaign pages (tera template + partial) |
//! | [`reconcile`] | Idempotent page writes and stale-directory removal |
//! | [`generate`] | Sequences the run and collects its report |
//! | [`config`] | `participa.toml` loading, environment overrides, validation |
//! | [`types`] | Campaign and stats records, run warnings |
//! | [`naming`] | Which names may be used as output directories |
//! | [`output`] | CLI summary formatting |
//!
//! # Design Decisions
//!
//! ## Failures Are Either Fatal Or Values
//!
//! A missing catalog, an unreadable template or a failed write aborts the run.
//! A missing stats resource or an unreadable asset does not: the catalog and
//! the asset versioner substitute a documented default and record a
//! [`types::Warning`]. Nothing between those two categories exists, so no
//! error is ever logged and then silently dropped.
//!
//! ## Render Everything, Then Write, Then Delete
//!
//! Pages are rendered into memory before the first file is written, and
//! stale directories are removed only after every write succeeded. A failed
//! run never leaves a campaign without its page.
//!
//! ## Two Rendering Styles
//!
//! The index layout is fixed and compiled in with maud. Campaign pages carry
//! editorial copy, so they come from an on-disk tera template that can change
//! without a rebuild. The tera instance is built once per run with its
//! partial and filters already registered.

pub mod assets;
pub mod catalog;
pub mod config;
pub mod fetch;
pub mod generate;
pub mod naming;
pub mod output;
pub mod reconcile;
pub mod render;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;

/// Identifies the build: the crate version on a release tag, `dev@<hash>`
/// otherwise.
pub const BUILD_ID: &str = env!("PARTICIPA_BUILD_ID");
