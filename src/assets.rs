//! Cache-busting version tags for static assets.
//!
//! Pages reference their stylesheet and script as `css/style.css?v=<tag>`.
//! The tag is the first [`TAG_LEN`] hex digits of the SHA-256 of the file's
//! current bytes: content-based rather than mtime-based, so it survives a
//! fresh `git checkout` and only changes when the asset does.
//!
//! An unreadable asset never fails the build. It gets a tag derived from the
//! current time instead, which still busts caches on every run, just more
//! often than necessary.
//!
//! Tags are computed once at the start of a run and frozen in an
//! [`AssetVersions`] value that every page of that run shares.

use sha2::{Digest, Sha256};
use serde::Serialize;
use std::collections::BTreeMap;
use std::io;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

use crate::types::Warning;

/// Number of hex digits in a version tag.
pub const TAG_LEN: usize = 8;

/// Content-derived tag for a file.
pub fn version_of(path: &Path) -> io::Result<String> {
    let bytes = std::fs::read(path)?;
    let digest = format!("{:x}", Sha256::digest(&bytes));
    Ok(digest[..TAG_LEN].to_string())
}

/// Timestamp-derived tag: seconds since the epoch as fixed-width hex.
pub fn fallback_tag(now: SystemTime) -> String {
    let secs = now.duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0);
    format!("{:0width$x}", secs & 0xffff_ffff, width = TAG_LEN)
}

/// Immutable logical-name → tag mapping for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AssetVersions(BTreeMap<String, String>);

impl AssetVersions {
    /// Version every asset in `assets` (logical name → path under `root`).
    ///
    /// Returns the frozen mapping plus a warning for each asset that fell back
    /// to a timestamp tag. All fallbacks in one run share the same timestamp.
    pub fn compute(root: &Path, assets: &BTreeMap<String, String>) -> (Self, Vec<Warning>) {
        let now = SystemTime::now();
        let mut tags = BTreeMap::new();
        let mut warnings = Vec::new();

        for (name, rel_path) in assets {
            let path = root.join(rel_path);
            let tag = match version_of(&path) {
                Ok(tag) => {
                    debug!(asset = %name, path = %path.display(), %tag, "versioned asset");
                    tag
                }
                Err(e) => {
                    warn!(asset = %name, path = %path.display(), error = %e, "asset unreadable");
                    warnings.push(Warning::AssetUnversioned {
                        asset: name.clone(),
                        cause: e.to_string(),
                    });
                    fallback_tag(now)
                }
            };
            tags.insert(name.clone(), tag);
        }

        (Self(tags), warnings)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// `path?v=<tag>`, or the bare path when `name` has no tag.
    pub fn url(&self, name: &str, path: &str) -> String {
        match self.get(name) {
            Some(tag) => format!("{path}?v={tag}"),
            None => path.to_string(),
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for AssetVersions {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}
