use participa_site::config::SiteConfig;
use participa_site::fetch::{FetchError, JsonFetcher, parse_body};
use serde_json::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const CATALOG_URL: &str = "https://data.test/campaigns.json";
pub const STATS_BASE: &str = "https://data.test/stats/";

pub fn stats_url(slug: &str) -> String {
    format!("{STATS_BASE}{slug}.json")
}

/// Serves canned JSON bodies by URL; anything else is unreachable.
#[derive(Default)]
pub struct CannedFetcher {
    bodies: HashMap<String, String>,
    calls: RefCell<Vec<String>>,
}

impl CannedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn json(self, url: &str, value: Value) -> Self {
        self.body(url, &value.to_string())
    }

    pub fn body(mut self, url: &str, body: &str) -> Self {
        self.bodies.insert(url.to_string(), body.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

impl JsonFetcher for CannedFetcher {
    fn fetch_json(&self, url: &str) -> Result<Value, FetchError> {
        self.calls.borrow_mut().push(url.to_string());
        match self.bodies.get(url) {
            Some(body) => parse_body(url, body),
            None => Err(FetchError::Transport {
                url: url.to_string(),
                source: Box::new(std::io::Error::new(
                    std::io::ErrorKind::TimedOut,
                    "operation timed out",
                )),
            }),
        }
    }
}

/// A throwaway site root seeded from `fixtures/site`.
pub struct TestSite {
    _tmp: TempDir,
    pub root: PathBuf,
}

impl TestSite {
    pub fn new() -> Self {
        let tmp = TempDir::new().expect("create temp dir");
        let root = tmp.path().join("site");
        let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/site");
        copy_dir(&fixtures, &root).expect("copy fixture site");
        Self { _tmp: tmp, root }
    }

    pub fn config(&self) -> SiteConfig {
        let mut config = SiteConfig::default();
        config.sources.catalog_url = CATALOG_URL.to_string();
        config.sources.stats_base_url = STATS_BASE.to_string();
        config.sources.uploads_base_url = "https://uploads.test/".to_string();
        config.sources.webhook_url = "https://hooks.test/participa".to_string();
        config
    }

    /// Leave a page behind as an earlier run would have.
    pub fn seed_page(&self, slug: &str) {
        let dir = self.root.join(slug);
        fs::create_dir_all(&dir).expect("create seeded dir");
        fs::write(dir.join("index.html"), "<p>previous run</p>").expect("write seeded page");
    }

    pub fn read(&self, rel: &str) -> String {
        fs::read_to_string(self.root.join(rel)).unwrap_or_else(|e| panic!("read {rel}: {e}"))
    }

    pub fn exists(&self, rel: &str) -> bool {
        self.root.join(rel).exists()
    }

    /// Every path under the root, relative, sorted.
    pub fn snapshot(&self) -> Vec<String> {
        let mut paths: Vec<String> = walkdir::WalkDir::new(&self.root)
            .min_depth(1)
            .into_iter()
            .filter_map(Result::ok)
            .map(|e| {
                e.path()
                    .strip_prefix(&self.root)
                    .expect("under root")
                    .to_string_lossy()
                    .into_owned()
            })
            .collect();
        paths.sort();
        paths
    }
}

fn copy_dir(src: &Path, dst: &Path) -> std::io::Result<()> {
    fs::create_dir_all(dst)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let target = dst.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}
