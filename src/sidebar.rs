//! The sidebar's controller: owns the sort/filter/pin state, rebuilds the
//! view model on refresh and carries out context-menu actions.

use std::sync::Arc;

use anyhow::{anyhow, Result};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::collapse::{CollapseStore, MemoryCollapseStore};
use crate::config::ConfigStore;
use crate::debounce::{self, Batch, Notice, REFRESH_DEBOUNCE};
use crate::host::{
    self, ArboardClipboard, BadgeTone, Clipboard, ConfirmDialog, ConfirmRequest, ProfileEditor,
    ProfileStore, RfdConfirmDialog, SessionTracker, LOCAL_TERMINAL_PROVIDER,
};
use crate::model::{GroupId, PinSet, Profile};
use crate::organizer::{self, OrganizeInput, Recency, SortMode, ViewModel};
use crate::panel::PanelControl;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContextAction {
    Launch,
    Edit,
    Duplicate,
    CopyCommand,
    HideFromSelector,
    ShowInSelector,
    Pin,
    Unpin,
    Delete,
}

impl ContextAction {
    pub fn label(self) -> &'static str {
        match self {
            Self::Launch => "Launch",
            Self::Edit => "Edit",
            Self::Duplicate => "Duplicate",
            Self::CopyCommand => "Copy SSH command",
            Self::HideFromSelector => "Hide from selector",
            Self::ShowInSelector => "Show in selector",
            Self::Pin => "Pin to favorites",
            Self::Unpin => "Unpin",
            Self::Delete => "Delete",
        }
    }
}

pub struct Sidebar {
    store: Arc<dyn ProfileStore>,
    config: Arc<dyn ConfigStore>,
    sessions: Arc<dyn SessionTracker>,
    collapse: Box<dyn CollapseStore>,
    clipboard: Box<dyn Clipboard>,
    dialog: Box<dyn ConfirmDialog>,
    editor: Option<Box<dyn ProfileEditor>>,

    profiles: Vec<Profile>,
    recency: Recency,
    sort: SortMode,
    filter: String,
    pins: PinSet,
    collapsed: bool,
    view: ViewModel,
}

impl Sidebar {
    pub fn new(
        store: Arc<dyn ProfileStore>,
        config: Arc<dyn ConfigStore>,
        sessions: Arc<dyn SessionTracker>,
    ) -> Self {
        let settings = config.sidebar_settings();
        Self {
            store,
            config,
            sessions,
            collapse: Box::new(MemoryCollapseStore::new()),
            clipboard: Box::new(ArboardClipboard::new()),
            dialog: Box::new(RfdConfirmDialog),
            editor: None,
            profiles: Vec::new(),
            recency: Recency::default(),
            sort: settings.sort_by,
            filter: String::new(),
            pins: settings.pinned_profiles,
            collapsed: settings.sidebar_collapsed,
            view: ViewModel::default(),
        }
    }

    pub fn with_collapse_store(mut self, collapse: Box<dyn CollapseStore>) -> Self {
        self.collapse = collapse;
        self
    }

    pub fn with_clipboard(mut self, clipboard: Box<dyn Clipboard>) -> Self {
        self.clipboard = clipboard;
        self
    }

    pub fn with_dialog(mut self, dialog: Box<dyn ConfirmDialog>) -> Self {
        self.dialog = dialog;
        self
    }

    pub fn with_editor(mut self, editor: Box<dyn ProfileEditor>) -> Self {
        self.editor = Some(editor);
        self
    }

    pub fn view(&self) -> &ViewModel {
        &self.view
    }

    pub fn profiles(&self) -> &[Profile] {
        &self.profiles
    }

    pub fn sort_mode(&self) -> SortMode {
        self.sort
    }

    pub fn is_collapsed(&self) -> bool {
        self.collapsed
    }

    pub async fn init(&mut self) -> Result<()> {
        self.refresh_profiles().await
    }

    pub async fn refresh_profiles(&mut self) -> Result<()> {
        let all = self.store.list_profiles().await?;
        let total = all.len();
        self.profiles = organizer::ingest(all);
        debug!(total, eligible = self.profiles.len(), "profiles refreshed");
        self.refresh_groups().await
    }

    /// Re-reads recency and active sessions, then rebuilds the view.
    pub async fn refresh_groups(&mut self) -> Result<()> {
        let recent_ids = if self.sort == SortMode::Recent {
            self.store
                .list_recent_profiles()
                .await?
                .into_iter()
                .filter_map(|p| p.id)
                .collect()
        } else {
            Vec::new()
        };
        self.recency = Recency::new(recent_ids, self.sessions.active_profile_ids());
        self.rebuild_view();
        Ok(())
    }

    fn rebuild_view(&mut self) {
        let cfg = self.config.snapshot();
        let collapsed = self.collapse.snapshot();
        let store = &self.store;
        let describe = |p: &Profile| store.describe_profile(p).unwrap_or_else(|| p.description());
        let view = organizer::organize(
            &OrganizeInput {
                profiles: &self.profiles,
                sort: self.sort,
                filter: &self.filter,
                pins: &self.pins,
                collapsed: &collapsed,
                group_names: &cfg.groups,
                recency: &self.recency,
            },
            &describe,
        );
        self.view = view;
    }

    /// Tab changes only move active markers; the order stays put.
    pub fn refresh_active(&mut self) {
        self.recency.set_active_ids(self.sessions.active_profile_ids());
        self.view.mark_active(&self.recency);
    }

    pub async fn set_sort_order(&mut self, mode: SortMode) -> Result<()> {
        self.sort = mode;
        self.config.update_sidebar_settings(&mut |s| s.sort_by = mode);
        self.config.save();
        self.refresh_groups().await
    }

    pub fn set_filter(&mut self, filter: &str) {
        self.filter = filter.to_string();
        self.rebuild_view();
    }

    pub fn toggle_group_collapse(&mut self, id: &GroupId) {
        let Some(group) = self.view.groups.iter_mut().find(|g| &g.id == id) else {
            return;
        };
        if group.entries.is_empty() {
            return;
        }
        group.collapsed = !group.collapsed;
        self.collapse
            .set_collapsed(&group.id.storage_key(), group.collapsed);
    }

    pub fn connection_count_text(&self) -> String {
        let active = self
            .profiles
            .iter()
            .filter(|p| self.recency.is_active(p))
            .count();
        organizer::connection_count_text(self.profiles.len(), active)
    }

    pub fn type_label(&self, profile: &Profile) -> String {
        match self.store.provider_for_profile(profile) {
            Some(p) if p.name == LOCAL_TERMINAL_PROVIDER => String::new(),
            Some(p) => p.name,
            None => "Unknown".to_string(),
        }
    }

    pub fn badge_tone(&self, profile: &Profile) -> BadgeTone {
        host::badge_tone(self.store.provider_for_profile(profile).as_ref())
    }

    pub fn is_pinned(&self, profile: &Profile) -> bool {
        self.pins.is_pinned(profile)
    }

    pub fn is_blacklisted(&self, profile: &Profile) -> bool {
        let Some(id) = profile.id.as_deref() else {
            return false;
        };
        self.config.snapshot().is_blacklisted(id)
    }

    /// The sidebar's close button: hides the whole panel when one is
    /// attached, otherwise collapses in place.
    pub fn collapse_requested(&mut self, panel: Option<&mut dyn PanelControl>) {
        if let Some(panel) = panel {
            panel.hide();
            return;
        }
        self.collapsed = !self.collapsed;
        let collapsed = self.collapsed;
        self.config
            .update_sidebar_settings(&mut |s| s.sidebar_collapsed = collapsed);
        self.config.save();
    }

    pub fn context_actions(&self, profile: &Profile) -> Vec<ContextAction> {
        let mut actions = vec![
            ContextAction::Launch,
            ContextAction::Edit,
            ContextAction::Duplicate,
            ContextAction::CopyCommand,
        ];
        actions.push(if self.is_blacklisted(profile) {
            ContextAction::ShowInSelector
        } else {
            ContextAction::HideFromSelector
        });
        actions.push(if self.is_pinned(profile) {
            ContextAction::Unpin
        } else {
            ContextAction::Pin
        });
        if !profile.is_builtin {
            actions.push(ContextAction::Delete);
        }
        actions
    }

    pub async fn run_context_action(&mut self, action: ContextAction, profile: &Profile) -> Result<()> {
        match action {
            ContextAction::Launch => self.store.launch_profile(profile).await,
            ContextAction::Edit => self.edit(profile),
            ContextAction::Duplicate => self.duplicate(profile).await,
            ContextAction::CopyCommand => self.clipboard.set_text(&profile.ssh_command()),
            ContextAction::HideFromSelector => {
                self.set_blacklisted(profile, true);
                Ok(())
            }
            ContextAction::ShowInSelector => {
                self.set_blacklisted(profile, false);
                Ok(())
            }
            ContextAction::Pin => self.set_pinned(profile, true).await,
            ContextAction::Unpin => self.set_pinned(profile, false).await,
            ContextAction::Delete => self.delete(profile).await,
        }
    }

    fn edit(&self, profile: &Profile) -> Result<()> {
        let Some(id) = profile.id.as_deref() else {
            return Ok(());
        };
        let Some(editor) = self.editor.as_ref() else {
            return Err(anyhow!("no profile editor available"));
        };
        editor.open_profile_editor(id)
    }

    async fn duplicate(&mut self, profile: &Profile) -> Result<()> {
        let mut copy = profile.clone();
        copy.id = Some(format!("ssh:custom:{}", Uuid::new_v4()));
        copy.name = format!("{} copy", profile.name);
        copy.is_builtin = false;
        copy.is_template = false;
        self.config.update(&mut |cfg| cfg.profiles.push(copy.clone()));
        self.config.save();
        info!(profile = %profile.name, "profile duplicated");
        self.refresh_profiles().await
    }

    fn set_blacklisted(&mut self, profile: &Profile, blacklisted: bool) {
        let Some(id) = profile.id.as_deref() else {
            return;
        };
        self.config.update(&mut |cfg| {
            cfg.profile_blacklist.retain(|b| b != id);
            if blacklisted {
                cfg.profile_blacklist.push(id.to_string());
            }
        });
        self.config.save();
    }

    async fn set_pinned(&mut self, profile: &Profile, pinned: bool) -> Result<()> {
        let Some(id) = profile.id.as_deref() else {
            return Ok(());
        };
        let changed = if pinned {
            self.pins.insert(id)
        } else {
            self.pins.remove(id)
        };
        if !changed {
            return Ok(());
        }
        let pins = self.pins.clone();
        self.config
            .update_sidebar_settings(&mut |s| s.pinned_profiles = pins.clone());
        self.config.save();
        self.refresh_groups().await
    }

    async fn delete(&mut self, profile: &Profile) -> Result<()> {
        let Some(id) = profile.id.clone() else {
            return Ok(());
        };
        if profile.is_builtin {
            return Ok(());
        }
        let request = ConfirmRequest {
            message: format!("Delete \"{}\"?", profile.name),
            confirm_label: "Delete".to_string(),
            cancel_label: "Cancel".to_string(),
        };
        if !self.dialog.confirm(&request).await? {
            return Ok(());
        }
        self.config
            .update(&mut |cfg| cfg.profiles.retain(|p| !p.has_id(&id)));
        self.config.save();
        info!(profile = %profile.name, "profile deleted");
        self.refresh_profiles().await
    }

    pub async fn handle_batch(&mut self, batch: &Batch) -> Result<()> {
        if batch.needs_full_refresh() {
            self.pins = self.config.sidebar_settings().pinned_profiles;
            self.refresh_profiles().await
        } else {
            self.refresh_active();
            Ok(())
        }
    }

    /// Processes debounced change notifications until the channel closes.
    /// A failed refresh is logged and the next batch supersedes it.
    pub async fn run(&mut self, mut rx: UnboundedReceiver<Notice>) {
        while let Some(batch) = debounce::next_batch(&mut rx, REFRESH_DEBOUNCE).await {
            debug!(notices = batch.len(), "refresh batch");
            if let Err(err) = self.handle_batch(&batch).await {
                warn!(error = %format!("{err:#}"), "sidebar refresh failed");
            }
        }
    }
}
