//! Toolbar button and the quick-connect picker.

use anyhow::Result;
use tracing::{debug, info};

use crate::config::SidebarSettings;
use crate::host::{ConnectionPicker, PickerOption, ProfileStore};
use crate::model::Profile;
use crate::organizer::caseless_cmp;

pub const BUTTON_WEIGHT: i32 = 15;
pub const BUTTON_TITLE: &str = "Toggle SSH Connections Sidebar";
pub const QUICK_CONNECT_TITLE: &str = "Quick Connect";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToolbarAction {
    TogglePanel,
    QuickConnect,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MenuItem {
    pub label: String,
    pub action: ToolbarAction,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolbarButton {
    pub title: String,
    pub weight: i32,
    pub click: ToolbarAction,
    pub submenu: Vec<MenuItem>,
}

/// Buttons to contribute; empty when the user turned the button off.
pub fn toolbar_buttons(settings: &SidebarSettings, panel_visible: bool) -> Vec<ToolbarButton> {
    if settings.show_in_toolbar == Some(false) {
        return Vec::new();
    }
    let toggle = if panel_visible {
        "Hide Sidebar"
    } else {
        "Show Sidebar"
    };
    vec![ToolbarButton {
        title: BUTTON_TITLE.to_string(),
        weight: BUTTON_WEIGHT,
        click: ToolbarAction::TogglePanel,
        submenu: vec![
            MenuItem {
                label: toggle.to_string(),
                action: ToolbarAction::TogglePanel,
            },
            MenuItem {
                label: "Quick Connect...".to_string(),
                action: ToolbarAction::QuickConnect,
            },
        ],
    }]
}

pub fn quick_connect_options(profiles: &[Profile]) -> Vec<PickerOption> {
    let mut ssh: Vec<&Profile> = profiles.iter().filter(|p| p.is_ssh()).collect();
    ssh.sort_by(|a, b| caseless_cmp(&a.name, &b.name));
    ssh.into_iter()
        .map(|p| PickerOption {
            name: p.name.clone(),
            description: p.full_address(),
            profile: p.clone(),
        })
        .collect()
}

/// Lets the user pick an SSH profile and launches it. Returns the launched
/// profile, if any.
pub async fn quick_connect(
    store: &dyn ProfileStore,
    picker: &dyn ConnectionPicker,
) -> Result<Option<Profile>> {
    let options = quick_connect_options(&store.list_profiles().await?);
    if options.is_empty() {
        info!("no SSH profiles to connect to");
        return Ok(None);
    }
    let Some(index) = picker.pick(QUICK_CONNECT_TITLE, &options).await? else {
        debug!("quick connect dismissed");
        return Ok(None);
    };
    let Some(option) = options.into_iter().nth(index) else {
        return Ok(None);
    };
    store.launch_profile(&option.profile).await?;
    Ok(Some(option.profile))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hidden_when_toolbar_disabled() {
        let settings = SidebarSettings {
            show_in_toolbar: Some(false),
            ..Default::default()
        };
        assert!(toolbar_buttons(&settings, true).is_empty());
    }

    #[test]
    fn submenu_tracks_panel_state() {
        let settings = SidebarSettings::default();
        let shown = toolbar_buttons(&settings, true);
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].weight, 15);
        assert_eq!(shown[0].submenu[0].label, "Hide Sidebar");
        assert_eq!(shown[0].submenu[1].action, ToolbarAction::QuickConnect);
        let hidden = toolbar_buttons(&settings, false);
        assert_eq!(hidden[0].submenu[0].label, "Show Sidebar");
    }

    #[test]
    fn options_are_ssh_only_sorted_by_name() {
        let mut serial = Profile::ssh("s", "aaa serial", "h");
        serial.kind = "serial".to_string();
        let profiles = vec![
            Profile::ssh("b", "beta", "b.example").with_user("ops"),
            serial,
            Profile::ssh("a", "alpha", "a.example"),
        ];
        let options = quick_connect_options(&profiles);
        let names: Vec<&str> = options.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, ["alpha", "beta"]);
        assert_eq!(options[0].description, "root@a.example:22");
        assert_eq!(options[1].description, "ops@b.example:22");
    }

    #[test]
    fn options_ignore_case_when_sorting() {
        let profiles = vec![
            Profile::ssh("b", "Beta", "b.example"),
            Profile::ssh("a", "alpha", "a.example"),
            Profile::ssh("c", "Charlie", "c.example"),
        ];
        let names: Vec<String> = quick_connect_options(&profiles)
            .into_iter()
            .map(|o| o.name)
            .collect();
        assert_eq!(names, ["alpha", "Beta", "Charlie"]);
    }
}
