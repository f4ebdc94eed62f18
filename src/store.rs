use crate::error::StoreError;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

#[derive(Debug, Default, Serialize, Deserialize)]
struct LedgerFile {
    /// `null` reads the same as a missing key
    #[serde(default)]
    pushed_ids: Option<Vec<String>>,
}

/// Ids of listings already delivered, persisted as `{"pushed_ids": [...]}`
#[derive(Debug)]
pub struct DedupStore {
    path: PathBuf,
    known: IndexSet<String>,
}

impl DedupStore {
    /// Load the ledger. A missing file is a first run, not an error.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let known = match std::fs::read_to_string(&path) {
            Ok(raw) if raw.trim().is_empty() => IndexSet::new(),
            Ok(raw) => {
                let file: LedgerFile = serde_json::from_str(&raw)?;
                file.pushed_ids.unwrap_or_default().into_iter().collect()
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No ledger at {}, starting fresh", path.display());
                IndexSet::new()
            }
            Err(e) => return Err(e.into()),
        };

        debug!("Loaded {} known ids from {}", known.len(), path.display());
        Ok(Self { path, known })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.known.len()
    }

    pub fn is_empty(&self) -> bool {
        self.known.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.known.contains(id)
    }

    /// Ids from this run that were never delivered before, in run order
    pub fn new_ids<'a, I>(&self, run_ids: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut seen = IndexSet::new();
        for id in run_ids {
            if !self.known.contains(id) {
                seen.insert(id.to_string());
            }
        }
        seen.into_iter().collect()
    }

    /// Add delivered ids and rewrite the ledger file atomically
    pub fn record<I, S>(&mut self, ids: I) -> Result<usize, StoreError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let before = self.known.len();
        self.known.extend(ids.into_iter().map(Into::into));
        let added = self.known.len() - before;

        self.save()?;
        info!("Recorded {} new ids ({} total) in {}", added, self.known.len(), self.path.display());
        Ok(added)
    }

    fn save(&self) -> Result<(), StoreError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)?;

        let file = LedgerFile {
            pushed_ids: Some(self.known.iter().cloned().collect()),
        };
        let json = serde_json::to_string_pretty(&file)?;

        let mut tmp = NamedTempFile::new_in(&dir)?;
        tmp.write_all(json.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path)?;
        Ok(())
    }
}
