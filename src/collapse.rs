use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use tracing::warn;

/// Client-local per-group collapse state, keyed by group storage key.
pub trait CollapseStore: Send {
    fn snapshot(&self) -> HashMap<String, bool>;
    fn set_collapsed(&mut self, key: &str, collapsed: bool);

    fn is_collapsed(&self, key: &str) -> bool {
        self.snapshot().get(key).copied().unwrap_or(false)
    }
}

#[derive(Debug, Default)]
pub struct MemoryCollapseStore {
    map: HashMap<String, bool>,
}

impl MemoryCollapseStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CollapseStore for MemoryCollapseStore {
    fn snapshot(&self) -> HashMap<String, bool> {
        self.map.clone()
    }

    fn set_collapsed(&mut self, key: &str, collapsed: bool) {
        self.map.insert(key.to_string(), collapsed);
    }
}

/// JSON map on disk, rewritten on every change.
#[derive(Debug)]
pub struct FileCollapseStore {
    path: PathBuf,
    map: HashMap<String, bool>,
}

impl FileCollapseStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let map = match fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|err| {
                warn!(path = %path.display(), error = %err, "ignoring unreadable collapse state");
                HashMap::new()
            }),
            Err(_) => HashMap::new(),
        };
        Self { path, map }
    }

    fn persist(&self) {
        if let Some(parent) = self.path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        let result = serde_json::to_vec(&self.map)
            .map_err(anyhow::Error::from)
            .and_then(|json| fs::write(&self.path, json).map_err(anyhow::Error::from));
        if let Err(err) = result {
            warn!(path = %self.path.display(), error = %err, "failed to write collapse state");
        }
    }
}

impl CollapseStore for FileCollapseStore {
    fn snapshot(&self) -> HashMap<String, bool> {
        self.map.clone()
    }

    fn set_collapsed(&mut self, key: &str, collapsed: bool) {
        self.map.insert(key.to_string(), collapsed);
        self.persist();
    }
}
