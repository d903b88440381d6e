use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::{debug, warn};

use crate::async_config::AsyncConfigSaver;
use crate::debounce::Notice;
use crate::model::{GroupRecord, PinSet, Profile};
use crate::organizer::SortMode;

pub const PLUGIN_KEY: &str = "ssh-sidebar";
pub const CONFIG_ENV_VAR: &str = "SSH_SIDEBAR_CONFIG";
const RECENT_PROFILES_LIMIT: usize = 20;

/// Persisted host configuration. Field names follow the host's camelCase
/// JSON layout.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostConfig {
    #[serde(default)]
    pub groups: Vec<GroupRecord>,
    #[serde(default)]
    pub profiles: Vec<Profile>,
    #[serde(default)]
    pub profile_blacklist: Vec<String>,
    #[serde(default)]
    pub recent_profiles: Vec<String>,
    #[serde(default)]
    pub plugin_config: BTreeMap<String, serde_json::Value>,
    /// Host keys this crate does not model, written back untouched.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// The sidebar's slice of the plugin-scoped settings bag.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SidebarSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sidebar_visible: Option<bool>,
    #[serde(default)]
    pub sidebar_collapsed: bool,
    #[serde(default)]
    pub pinned_profiles: PinSet,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_in_toolbar: Option<bool>,
    #[serde(default)]
    pub sort_by: SortMode,
}

impl HostConfig {
    pub fn sidebar_settings(&self) -> SidebarSettings {
        let Some(raw) = self.plugin_config.get(PLUGIN_KEY) else {
            return SidebarSettings::default();
        };
        serde_json::from_value(raw.clone()).unwrap_or_else(|err| {
            warn!(error = %err, "plugin settings unreadable, using defaults");
            SidebarSettings::default()
        })
    }

    /// Writes `settings` into the plugin bag, keeping keys this crate does
    /// not know about.
    pub fn set_sidebar_settings(&mut self, settings: &SidebarSettings) {
        let Ok(serde_json::Value::Object(fields)) = serde_json::to_value(settings) else {
            return;
        };
        let entry = self
            .plugin_config
            .entry(PLUGIN_KEY.to_string())
            .or_insert_with(|| serde_json::Value::Object(Default::default()));
        if !entry.is_object() {
            *entry = serde_json::Value::Object(Default::default());
        }
        if let serde_json::Value::Object(existing) = entry {
            for key in ["sidebarVisible", "showInToolbar"] {
                if !fields.contains_key(key) {
                    existing.remove(key);
                }
            }
            existing.extend(fields);
        }
    }

    pub fn update_sidebar_settings(&mut self, f: impl FnOnce(&mut SidebarSettings)) {
        let mut settings = self.sidebar_settings();
        f(&mut settings);
        self.set_sidebar_settings(&settings);
    }

    pub fn is_blacklisted(&self, id: &str) -> bool {
        self.profile_blacklist.iter().any(|b| b == id)
    }

    pub fn find_profile_index(&self, id: &str) -> Option<usize> {
        self.profiles.iter().position(|p| p.has_id(id))
    }

    pub fn record_recent(&mut self, id: &str) {
        self.recent_profiles.retain(|r| r != id);
        self.recent_profiles.insert(0, id.to_string());
        self.recent_profiles.truncate(RECENT_PROFILES_LIMIT);
    }
}

fn config_dir() -> Option<PathBuf> {
    // %APPDATA% on Windows, XDG elsewhere.
    std::env::var_os("APPDATA")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from))
        .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))
        .map(|p| p.join(PLUGIN_KEY))
}

pub fn config_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_ENV_VAR) {
        return PathBuf::from(path);
    }
    if let Some(dir) = config_dir() {
        return dir.join("config.json");
    }
    PathBuf::from("config.json")
}

pub fn try_load(path: &Path) -> Result<HostConfig> {
    Ok(read(path)?.0)
}

/// Parses the file, dropping profiles that do not deserialize instead of
/// failing the whole document. Returns how many were dropped.
fn read(path: &Path) -> Result<(HostConfig, usize)> {
    let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let mut doc: serde_json::Value =
        serde_json::from_slice(&bytes).with_context(|| format!("parsing {}", path.display()))?;
    let mut skipped = 0;
    if let Some(serde_json::Value::Array(entries)) = doc.get_mut("profiles") {
        let before = entries.len();
        entries.retain(|entry| match Profile::deserialize(entry) {
            Ok(_) => true,
            Err(err) => {
                warn!(error = %err, "skipping unreadable profile");
                false
            }
        });
        skipped = before - entries.len();
    }
    let cfg = serde_json::from_value(doc).with_context(|| format!("parsing {}", path.display()))?;
    Ok((cfg, skipped))
}

pub fn backup_path(path: &Path) -> PathBuf {
    path.with_extension("json.bak")
}

/// Copies the file aside before anything it holds can be overwritten.
fn preserve_unreadable(path: &Path) {
    let backup = backup_path(path);
    match fs::copy(path, &backup) {
        Ok(_) => warn!(backup = %backup.display(), "unreadable config preserved"),
        Err(err) => warn!(error = %err, backup = %backup.display(), "could not preserve config"),
    }
}

/// Best-effort load: a missing file is a fresh install. Anything that had
/// to be dropped while reading is kept in a `.bak` copy next to the file.
pub fn load(path: &Path) -> HostConfig {
    if !path.exists() {
        return HostConfig::default();
    }
    match read(path) {
        Ok((cfg, 0)) => cfg,
        Ok((cfg, _)) => {
            preserve_unreadable(path);
            cfg
        }
        Err(err) => {
            warn!(error = %format!("{err:#}"), "config unreadable, using defaults");
            preserve_unreadable(path);
            HostConfig::default()
        }
    }
}

pub fn save(path: &Path, cfg: &HostConfig) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    let json = serde_json::to_vec_pretty(cfg)?;

    // Best-effort atomic write.
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).with_context(|| format!("writing {}", tmp.display()))?;
    if fs::rename(&tmp, path).is_err() {
        // Rename can fail across devices; copy instead.
        let bytes = fs::read(&tmp)?;
        fs::write(path, bytes).with_context(|| format!("writing {}", path.display()))?;
        let _ = fs::remove_file(&tmp);
    }
    debug!(path = %path.display(), "config saved");
    Ok(())
}

/// Host configuration service as seen by the sidebar.
///
/// `update` mutates the in-memory copy and notifies subscribers; `save` is
/// fire-and-forget.
pub trait ConfigStore: Send + Sync {
    fn snapshot(&self) -> HostConfig;
    fn update(&self, f: &mut dyn FnMut(&mut HostConfig));
    fn save(&self);
    fn subscribe(&self) -> UnboundedReceiver<Notice>;

    fn sidebar_settings(&self) -> SidebarSettings {
        self.snapshot().sidebar_settings()
    }

    fn update_sidebar_settings(&self, f: &mut dyn FnMut(&mut SidebarSettings)) {
        self.update(&mut |cfg| cfg.update_sidebar_settings(|s| f(s)));
    }
}

#[derive(Default)]
struct Shared {
    config: HostConfig,
    subscribers: Vec<UnboundedSender<Notice>>,
}

impl Shared {
    fn apply(&mut self, f: &mut dyn FnMut(&mut HostConfig)) {
        f(&mut self.config);
        self.subscribers
            .retain(|tx| tx.send(Notice::ConfigChanged).is_ok());
    }

    fn subscribe(&mut self) -> UnboundedReceiver<Notice> {
        let (tx, rx) = unbounded_channel();
        self.subscribers.push(tx);
        rx
    }
}

fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Config file on disk, written in the background by [`AsyncConfigSaver`].
pub struct FileConfigStore {
    shared: Mutex<Shared>,
    saver: AsyncConfigSaver,
    path: PathBuf,
}

impl FileConfigStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let config = load(&path);
        Self {
            shared: Mutex::new(Shared {
                config,
                subscribers: Vec::new(),
            }),
            saver: AsyncConfigSaver::new(path.clone()),
            path,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn flush(&self, timeout: std::time::Duration) {
        self.saver.flush(timeout);
    }
}

impl ConfigStore for FileConfigStore {
    fn snapshot(&self) -> HostConfig {
        lock(&self.shared).config.clone()
    }

    fn update(&self, f: &mut dyn FnMut(&mut HostConfig)) {
        lock(&self.shared).apply(f);
    }

    fn save(&self) {
        self.saver.request_save(self.snapshot());
    }

    fn subscribe(&self) -> UnboundedReceiver<Notice> {
        lock(&self.shared).subscribe()
    }
}

/// In-memory config for embedding hosts that persist on their own.
#[derive(Default)]
pub struct MemoryConfigStore {
    shared: Mutex<Shared>,
    saves: Mutex<usize>,
}

impl MemoryConfigStore {
    pub fn new(config: HostConfig) -> Arc<Self> {
        Arc::new(Self {
            shared: Mutex::new(Shared {
                config,
                subscribers: Vec::new(),
            }),
            saves: Mutex::new(0),
        })
    }

    pub fn save_count(&self) -> usize {
        *self.saves.lock().unwrap_or_else(|p| p.into_inner())
    }
}

impl ConfigStore for MemoryConfigStore {
    fn snapshot(&self) -> HostConfig {
        lock(&self.shared).config.clone()
    }

    fn update(&self, f: &mut dyn FnMut(&mut HostConfig)) {
        lock(&self.shared).apply(f);
    }

    fn save(&self) {
        *self.saves.lock().unwrap_or_else(|p| p.into_inner()) += 1;
    }

    fn subscribe(&self) -> UnboundedReceiver<Notice> {
        lock(&self.shared).subscribe()
    }
}
