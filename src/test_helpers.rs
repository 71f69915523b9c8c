//! Shared test utilities for the participa-site unit tests.
//!
//! Provides a canned-response [`FakeFetcher`], quick campaign constructors,
//! and a fixture site copied into a temp directory.
//!
//! # Usage
//!
//! ```rust,ignore
//! use crate::test_helpers::*;
//!
//! let fetcher = FakeFetcher::new()
//!     .with_json("https://data.test/stats/ruido.json", json!({"totales": {}}));
//! let site = setup_fixtures();
//! ```

use serde_json::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::Path;
use tempfile::TempDir;

use crate::fetch::{FetchError, JsonFetcher, parse_body};
use crate::types::Campaign;

// =========================================================================
// Fake fetcher
// =========================================================================

enum Canned {
    Body(String),
    Unreachable,
}

/// Serves canned bodies keyed by URL and records every request.
///
/// Unknown URLs answer like a static file server would: with an HTML 404
/// page, which fails JSON parsing.
#[derive(Default)]
pub struct FakeFetcher {
    responses: HashMap<String, Canned>,
    calls: RefCell<Vec<String>>,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_json(self, url: &str, value: Value) -> Self {
        self.with_body(url, &value.to_string())
    }

    pub fn with_body(mut self, url: &str, body: &str) -> Self {
        self.responses
            .insert(url.to_string(), Canned::Body(body.to_string()));
        self
    }

    /// Make `url` fail at the transport level.
    pub fn with_failure(mut self, url: &str) -> Self {
        self.responses.insert(url.to_string(), Canned::Unreachable);
        self
    }

    /// URLs requested so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

impl JsonFetcher for FakeFetcher {
    fn fetch_json(&self, url: &str) -> Result<Value, FetchError> {
        self.calls.borrow_mut().push(url.to_string());
        match self.responses.get(url) {
            Some(Canned::Body(body)) => parse_body(url, body),
            Some(Canned::Unreachable) => Err(FetchError::Transport {
                url: url.to_string(),
                source: Box::new(std::io::Error::new(
                    std::io::ErrorKind::ConnectionRefused,
                    "connection refused",
                )),
            }),
            None => parse_body(url, "<html><body>404 Not Found</body></html>"),
        }
    }
}

// =========================================================================
// Campaign constructors
// =========================================================================

/// An active internal campaign with the given slug and sort key.
pub fn campaign(slug: &str, order: i64) -> Campaign {
    Campaign {
        slug: slug.to_string(),
        title: format!("Campaign {slug}"),
        description: format!("About {slug}"),
        icon: "megaphone".to_string(),
        order: order as f64,
        active: true,
        external_url: None,
        social_preview_img: None,
        extra: Default::default(),
    }
}

/// Deserialize a JSON array literal into campaigns. Panics on bad input.
pub fn campaigns(value: Value) -> Vec<Campaign> {
    serde_json::from_value(value).expect("test campaigns must deserialize")
}

// =========================================================================
// Fixture setup
// =========================================================================

/// Copy `fixtures/site/` to a temp directory and return it.
///
/// Tests get an isolated site root (templates, partial, assets) they can
/// write pages into without touching the source fixtures.
pub fn setup_fixtures() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/site");
    copy_dir_recursive(&fixtures, tmp.path()).unwrap();
    tmp
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            std::fs::create_dir_all(&dst_path)?;
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            std::fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}
