//! Contracts for the host services the sidebar consumes, plus the concrete
//! adapters used by the standalone binary.

use std::collections::HashSet;
use std::process::Command;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Context, Result};
use arboard::Clipboard as SystemClipboard;
use async_trait::async_trait;
use rfd::{AsyncMessageDialog, MessageButtons, MessageDialogResult, MessageLevel};
use tracing::info;

use crate::config::ConfigStore;
use crate::model::{Profile, DEFAULT_SSH_PORT, DEFAULT_USER, UNKNOWN_HOST};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProviderInfo {
    pub id: String,
    pub name: String,
}

impl ProviderInfo {
    fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
        }
    }
}

pub const LOCAL_TERMINAL_PROVIDER: &str = "Local terminal";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BadgeTone {
    Primary,
    Secondary,
    Success,
    Info,
    Warning,
}

pub fn badge_tone(provider: Option<&ProviderInfo>) -> BadgeTone {
    match provider.map(|p| p.id.as_str()) {
        Some("ssh") => BadgeTone::Secondary,
        Some("serial") => BadgeTone::Success,
        Some("telnet") => BadgeTone::Info,
        Some("split-layout") => BadgeTone::Primary,
        _ => BadgeTone::Warning,
    }
}

/// The host's profile service.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn list_profiles(&self) -> Result<Vec<Profile>>;

    /// Most recently used first.
    async fn list_recent_profiles(&self) -> Result<Vec<Profile>>;

    /// Host override for the built-in `user@host[:port]` description.
    fn describe_profile(&self, _profile: &Profile) -> Option<String> {
        None
    }

    async fn launch_profile(&self, profile: &Profile) -> Result<()>;

    fn provider_for_profile(&self, profile: &Profile) -> Option<ProviderInfo>;
}

/// Which profiles currently have an open session in the host's tab manager.
pub trait SessionTracker: Send + Sync {
    fn active_profile_ids(&self) -> HashSet<String>;
}

#[derive(Debug, Default)]
pub struct SessionSet {
    ids: Mutex<HashSet<String>>,
}

impl SessionSet {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn open(&self, id: &str) {
        self.ids
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .insert(id.to_string());
    }

    pub fn close(&self, id: &str) {
        self.ids.lock().unwrap_or_else(|p| p.into_inner()).remove(id);
    }
}

impl SessionTracker for SessionSet {
    fn active_profile_ids(&self) -> HashSet<String> {
        self.ids.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }
}

pub trait Clipboard {
    fn set_text(&mut self, text: &str) -> Result<()>;
}

/// System clipboard, opened on first use.
#[derive(Default)]
pub struct ArboardClipboard {
    inner: Option<SystemClipboard>,
}

impl ArboardClipboard {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Clipboard for ArboardClipboard {
    fn set_text(&mut self, text: &str) -> Result<()> {
        if self.inner.is_none() {
            self.inner = Some(SystemClipboard::new().context("opening system clipboard")?);
        }
        let Some(clipboard) = self.inner.as_mut() else {
            return Err(anyhow!("clipboard unavailable"));
        };
        clipboard
            .set_text(text.to_string())
            .context("writing to clipboard")
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfirmRequest {
    pub message: String,
    pub confirm_label: String,
    pub cancel_label: String,
}

#[async_trait(?Send)]
pub trait ConfirmDialog {
    /// True when the user picked the confirm button.
    async fn confirm(&self, request: &ConfirmRequest) -> Result<bool>;
}

/// Native warning dialog.
#[derive(Debug, Default)]
pub struct RfdConfirmDialog;

#[async_trait(?Send)]
impl ConfirmDialog for RfdConfirmDialog {
    async fn confirm(&self, request: &ConfirmRequest) -> Result<bool> {
        let result = AsyncMessageDialog::new()
            .set_level(MessageLevel::Warning)
            .set_title("SSH Connections")
            .set_description(request.message.as_str())
            .set_buttons(MessageButtons::OkCancelCustom(
                request.confirm_label.clone(),
                request.cancel_label.clone(),
            ))
            .show()
            .await;
        Ok(match result {
            MessageDialogResult::Ok | MessageDialogResult::Yes => true,
            MessageDialogResult::Custom(label) => label == request.confirm_label,
            _ => false,
        })
    }
}

/// Opens the host's profile editor directly for one profile.
pub trait ProfileEditor {
    fn open_profile_editor(&self, profile_id: &str) -> Result<()>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PickerOption {
    pub name: String,
    pub description: String,
    pub profile: Profile,
}

/// The host's selector overlay.
#[async_trait(?Send)]
pub trait ConnectionPicker {
    /// Index of the chosen option, or `None` when dismissed.
    async fn pick(&self, title: &str, options: &[PickerOption]) -> Result<Option<usize>>;
}

pub type Launcher = Box<dyn Fn(&Profile) -> Result<()> + Send + Sync>;

/// Spawns the system `ssh` client for the profile's endpoint.
pub fn spawn_ssh(profile: &Profile) -> Result<()> {
    let args = ssh_args(profile);
    Command::new("ssh")
        .args(&args)
        .spawn()
        .with_context(|| format!("spawning ssh {}", args.join(" ")))?;
    Ok(())
}

pub fn ssh_args(profile: &Profile) -> Vec<String> {
    let user = profile
        .options
        .user
        .as_deref()
        .filter(|u| !u.trim().is_empty())
        .unwrap_or(DEFAULT_USER);
    let host = profile
        .options
        .host
        .as_deref()
        .filter(|h| !h.trim().is_empty())
        .unwrap_or(UNKNOWN_HOST);
    let mut args = Vec::new();
    if let Some(port) = profile.options.port.filter(|p| *p != 0 && *p != DEFAULT_SSH_PORT) {
        args.push("-p".to_string());
        args.push(port.to_string());
    }
    args.push(format!("{user}@{host}"));
    args
}

/// Profile service backed by the host config: user-defined profiles come
/// from `profiles`, recency from `recentProfiles`.
pub struct ConfigProfileStore {
    config: Arc<dyn ConfigStore>,
    launcher: Launcher,
}

impl ConfigProfileStore {
    pub fn new(config: Arc<dyn ConfigStore>) -> Self {
        Self {
            config,
            launcher: Box::new(spawn_ssh),
        }
    }

    pub fn with_launcher(mut self, launcher: Launcher) -> Self {
        self.launcher = launcher;
        self
    }
}

#[async_trait]
impl ProfileStore for ConfigProfileStore {
    async fn list_profiles(&self) -> Result<Vec<Profile>> {
        Ok(self.config.snapshot().profiles)
    }

    async fn list_recent_profiles(&self) -> Result<Vec<Profile>> {
        let cfg = self.config.snapshot();
        Ok(cfg
            .recent_profiles
            .iter()
            .filter_map(|id| cfg.profiles.iter().find(|p| p.has_id(id)).cloned())
            .collect())
    }

    async fn launch_profile(&self, profile: &Profile) -> Result<()> {
        (self.launcher)(profile)?;
        if let Some(id) = profile.id.as_deref() {
            self.config.update(&mut |cfg| cfg.record_recent(id));
            self.config.save();
        }
        info!(profile = %profile.name, "launched profile");
        Ok(())
    }

    fn provider_for_profile(&self, profile: &Profile) -> Option<ProviderInfo> {
        match profile.kind.as_str() {
            "ssh" => Some(ProviderInfo::new("ssh", "SSH connection")),
            "serial" => Some(ProviderInfo::new("serial", "Serial")),
            "telnet" => Some(ProviderInfo::new("telnet", "Telnet")),
            "local" => Some(ProviderInfo::new("local", LOCAL_TERMINAL_PROVIDER)),
            "split-layout" => Some(ProviderInfo::new("split-layout", "Split layout")),
            _ => None,
        }
    }
}
