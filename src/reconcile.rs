//! Writing generated pages and removing stale campaign directories.
//!
//! The output root is the site root itself: hand-maintained files (assets,
//! templates, repository metadata) live next to the generated campaign
//! directories. Pages land at:
//!
//! ```text
//! <root>/index.html            ← index
//! <root>/<slug>/index.html     ← one per active internal campaign
//! ```
//!
//! ## Reconciliation
//!
//! After all pages are written, every top-level directory that is not the
//! slug of an active internal campaign is considered stale:
//!
//! - dot-prefixed names and names on the ignore list are never touched;
//! - symlinks are never followed or removed;
//! - a stale directory holding an `index.html` looks like a page from an
//!   earlier run and is deleted recursively;
//! - any other stale directory is kept and reported as flagged, so a
//!   hand-made directory missing from the ignore list is not lost.
//!
//! Regular files at the top level are left alone.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::naming::is_hidden;

/// File name of every generated page.
pub const PAGE_FILE: &str = "index.html";

#[derive(Error, Debug)]
pub enum ReconcileError {
    #[error("cannot write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot remove {}: {source}", path.display())]
    Remove {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot list output root: {0}")]
    List(#[from] walkdir::Error),
}

/// Where a rendered page goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageTarget<'a> {
    Index,
    Campaign(&'a str),
}

/// Directory names removed and kept-for-review by one reconciliation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub deleted: Vec<String>,
    pub flagged: Vec<String>,
}

/// The directory generated pages are written into.
#[derive(Debug, Clone)]
pub struct OutputRoot {
    root: PathBuf,
    ignored: BTreeSet<String>,
}

impl OutputRoot {
    pub fn new(root: impl Into<PathBuf>, ignored: impl IntoIterator<Item = String>) -> Self {
        Self {
            root: root.into(),
            ignored: ignored.into_iter().collect(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Output path of `target`, relative to the root.
    pub fn relative_path(target: PageTarget<'_>) -> PathBuf {
        match target {
            PageTarget::Index => PathBuf::from(PAGE_FILE),
            PageTarget::Campaign(slug) => Path::new(slug).join(PAGE_FILE),
        }
    }

    /// Write `markup` to the page file of `target`, replacing any previous
    /// content. Returns the path written.
    pub fn write(&self, target: PageTarget<'_>, markup: &str) -> Result<PathBuf, ReconcileError> {
        let path = self.root.join(Self::relative_path(target));
        let write_err = |source| ReconcileError::Write {
            path: path.clone(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        fs::write(&path, markup).map_err(write_err)?;
        debug!(path = %path.display(), bytes = markup.len(), "wrote page");
        Ok(path)
    }

    /// Remove stale campaign directories, keeping everything in `active`.
    pub fn reconcile(&self, active: &BTreeSet<String>) -> Result<ReconcileReport, ReconcileError> {
        let mut report = ReconcileReport::default();

        for entry in WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry?;
            if !entry.file_type().is_dir() {
                continue;
            }
            let Some(name) = entry.file_name().to_str() else {
                continue;
            };
            if is_hidden(name) || self.ignored.contains(name) || active.contains(name) {
                continue;
            }

            let path = entry.path();
            if path.join(PAGE_FILE).is_file() {
                fs::remove_dir_all(path).map_err(|source| ReconcileError::Remove {
                    path: path.to_path_buf(),
                    source,
                })?;
                info!(dir = %name, "removed stale campaign directory");
                report.deleted.push(name.to_string());
            } else {
                warn!(dir = %name, "unrecognized directory left in place");
                report.flagged.push(name.to_string());
            }
        }

        Ok(report)
    }
}
