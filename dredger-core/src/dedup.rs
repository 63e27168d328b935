//! Persistent memory of which URLs have been dealt with.
//!
//! State is stored as two JSON arrays of URLs: `imported.json` and
//! `rejects.json`. Both are best effort: a missing or unreadable file
//! starts that set empty instead of failing the run.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const IMPORTED_FILE: &str = "imported.json";
pub const REJECTED_FILE: &str = "rejects.json";

pub struct DedupStore {
    imported: HashSet<String>,
    rejected: HashSet<String>,
    known_remote: HashSet<String>,
    /// Set once a remote baseline has been loaded.
    consult_remote: bool,
    imported_path: PathBuf,
    rejected_path: PathBuf,
}

impl DedupStore {
    /// Empty store persisting into `data_dir`. Nothing is read yet.
    pub fn new(data_dir: &Path) -> Self {
        Self {
            imported: HashSet::new(),
            rejected: HashSet::new(),
            known_remote: HashSet::new(),
            consult_remote: false,
            imported_path: data_dir.join(IMPORTED_FILE),
            rejected_path: data_dir.join(REJECTED_FILE),
        }
    }

    /// Open the store in `data_dir` and load whatever state is there.
    pub fn open(data_dir: &Path) -> Self {
        let mut store = Self::new(data_dir);
        store.load();
        store
    }

    pub fn load(&mut self) {
        self.imported = load_url_set(&self.imported_path);
        self.rejected = load_url_set(&self.rejected_path);
        // Older files may list a URL in both; importing wins.
        self.rejected.retain(|url| !self.imported.contains(url));
    }

    pub fn flush(&self) -> io::Result<()> {
        save_url_set(&self.imported_path, &self.imported)?;
        save_url_set(&self.rejected_path, &self.rejected)
    }

    pub fn should_skip(&self, url: &str) -> bool {
        self.imported.contains(url)
            || self.rejected.contains(url)
            || (self.consult_remote && self.known_remote.contains(url))
    }

    /// Returns true if the URL was not already recorded as imported.
    pub fn record_imported(&mut self, url: &str) -> bool {
        self.rejected.remove(url);
        self.imported.insert(url.to_string())
    }

    /// Returns true if the URL was newly rejected. Imported URLs are never
    /// moved to the rejected set.
    pub fn record_rejected(&mut self, url: &str) -> bool {
        if self.imported.contains(url) {
            return false;
        }
        self.rejected.insert(url.to_string())
    }

    /// Seed the backend's own view of what it already holds. From here on
    /// `should_skip` also honours it.
    pub fn bulk_load_remote<I>(&mut self, urls: I)
    where
        I: IntoIterator<Item = String>,
    {
        self.known_remote.extend(urls);
        self.consult_remote = true;
    }

    pub fn is_imported(&self, url: &str) -> bool {
        self.imported.contains(url)
    }

    pub fn is_rejected(&self, url: &str) -> bool {
        self.rejected.contains(url)
    }

    pub fn imported_count(&self) -> usize {
        self.imported.len()
    }

    pub fn rejected_count(&self) -> usize {
        self.rejected.len()
    }

    pub fn known_remote_count(&self) -> usize {
        self.known_remote.len()
    }
}

fn load_url_set(path: &Path) -> HashSet<String> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return HashSet::new(),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "could not read dedup file, starting empty");
            return HashSet::new();
        }
    };

    match serde_json::from_str::<Vec<String>>(&content) {
        Ok(urls) => urls.into_iter().collect(),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "corrupt dedup file, starting empty");
            HashSet::new()
        }
    }
}

/// Sorted for stable diffs; written via a temp file so a crash mid-write
/// leaves the previous file intact.
fn save_url_set(path: &Path, urls: &HashSet<String>) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut sorted: Vec<&String> = urls.iter().collect();
    sorted.sort();
    let json = serde_json::to_string_pretty(&sorted)?;

    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json)?;
    fs::rename(&tmp, path)
}
