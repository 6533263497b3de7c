use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use anyhow::Context;
use async_trait::async_trait;

/// Persistent Japanese→English entity translations.
#[async_trait]
pub trait EntityStore: Send + Sync {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> anyhow::Result<()>;
    /// Case-insensitive substring search over keys and values.
    async fn search(&self, term: &str, limit: usize) -> anyhow::Result<BTreeMap<String, String>>;
    async fn count(&self) -> usize;
    fn is_ready(&self) -> bool;
}

/// JSON-object file with a full in-memory mirror. Reads come from the
/// mirror; every write rewrites the file.
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<HashMap<String, String>>,
}

impl FileStore {
    pub fn open(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let path = path.into();
        let entries: HashMap<String, String> = if path.exists() {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("read entity store {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("parse entity store {}", path.display()))?
        } else {
            HashMap::new()
        };
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn persist(&self, entries: &HashMap<String, String>) -> anyhow::Result<()> {
        // Sorted output keeps the file stable across rewrites.
        let ordered: BTreeMap<&String, &String> = entries.iter().collect();
        let raw = serde_json::to_string_pretty(&ordered).context("serialize entity store")?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("create store dir {}", parent.display()))?;
            }
        }
        std::fs::write(&self.path, raw)
            .with_context(|| format!("write entity store {}", self.path.display()))
    }
}

#[async_trait]
impl EntityStore for FileStore {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.entries().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let entries = {
            let mut guard = self.entries();
            guard.insert(key.to_string(), value.to_string());
            guard.clone()
        };
        self.persist(&entries)
    }

    async fn search(&self, term: &str, limit: usize) -> anyhow::Result<BTreeMap<String, String>> {
        let needle = term.to_lowercase();
        let mut pairs: Vec<(String, String)> = self
            .entries()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        pairs.sort_by(|a, b| a.0.cmp(&b.0));

        let mut out = BTreeMap::new();
        for (key, value) in pairs {
            if out.len() >= limit {
                break;
            }
            if key.to_lowercase().contains(&needle) || value.to_lowercase().contains(&needle) {
                out.insert(key, value);
            }
        }
        Ok(out)
    }

    async fn count(&self) -> usize {
        self.entries().len()
    }

    fn is_ready(&self) -> bool {
        true
    }
}
