use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};

pub const SSH_PROFILE_TYPE: &str = "ssh";
pub const DEFAULT_SSH_PORT: u16 = 22;
pub const DEFAULT_USER: &str = "root";
pub const UNKNOWN_HOST: &str = "unknown";

pub const UNGROUPED_KEY: &str = "ungrouped";
/// Synthesized group keys start with this; real ids that do are escaped.
pub const RESERVED_KEY_PREFIX: char = '@';
pub const FAVORITES_KEY: &str = "@favorites";
pub const UNGROUPED_LABEL: &str = "Ungrouped";
pub const FAVORITES_LABEL: &str = "Favorites";

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

/// A stored connection definition as handed out by the profile store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(default)]
    pub options: ConnectionOptions,
    #[serde(default)]
    pub is_builtin: bool,
    #[serde(default)]
    pub is_template: bool,
}

impl Profile {
    pub fn ssh(id: &str, name: &str, host: &str) -> Self {
        Self {
            id: Some(id.to_string()),
            name: name.to_string(),
            kind: SSH_PROFILE_TYPE.to_string(),
            group: None,
            options: ConnectionOptions {
                host: Some(host.to_string()),
                user: None,
                port: None,
            },
            is_builtin: false,
            is_template: false,
        }
    }

    pub fn with_group(mut self, group: &str) -> Self {
        self.group = Some(group.to_string());
        self
    }

    pub fn with_user(mut self, user: &str) -> Self {
        self.options.user = Some(user.to_string());
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.options.port = Some(port);
        self
    }

    pub fn is_ssh(&self) -> bool {
        self.kind == SSH_PROFILE_TYPE
    }

    pub fn has_id(&self, id: &str) -> bool {
        self.id.as_deref() == Some(id)
    }

    /// Host as used for sorting: missing sorts as the empty string.
    pub fn host_or_empty(&self) -> &str {
        self.options.host.as_deref().unwrap_or("")
    }

    fn endpoint(&self) -> (&str, &str, u16) {
        let user = non_empty(self.options.user.as_deref()).unwrap_or(DEFAULT_USER);
        let host = non_empty(self.options.host.as_deref()).unwrap_or(UNKNOWN_HOST);
        let port = match self.options.port {
            Some(0) | None => DEFAULT_SSH_PORT,
            Some(p) => p,
        };
        (user, host, port)
    }

    /// `user@host[:port]`, the port suffix omitted for the protocol default.
    pub fn description(&self) -> String {
        let (user, host, port) = self.endpoint();
        if port == DEFAULT_SSH_PORT {
            format!("{user}@{host}")
        } else {
            format!("{user}@{host}:{port}")
        }
    }

    /// `user@host:port`, port always shown. Used by the quick connect picker.
    pub fn full_address(&self) -> String {
        let (user, host, port) = self.endpoint();
        format!("{user}@{host}:{port}")
    }

    pub fn ssh_command(&self) -> String {
        let (user, host, port) = self.endpoint();
        let mut command = format!("ssh {user}@{host}");
        if port != DEFAULT_SSH_PORT {
            command.push_str(&format!(" -p {port}"));
        }
        command
    }

    pub fn group_id(&self) -> GroupId {
        GroupId::from_profile_group(self.group.as_deref())
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GroupId {
    /// Synthesized bucket for pinned profiles; never a real group id.
    Favorites,
    Ungrouped,
    Named(String),
}

impl GroupId {
    pub fn from_profile_group(group: Option<&str>) -> Self {
        match non_empty(group) {
            None => Self::Ungrouped,
            Some(UNGROUPED_KEY) => Self::Ungrouped,
            Some(id) => Self::Named(id.to_string()),
        }
    }

    /// Key used by the collapse store. Never shared by two distinct ids.
    pub fn storage_key(&self) -> Cow<'_, str> {
        match self {
            Self::Favorites => Cow::Borrowed(FAVORITES_KEY),
            Self::Ungrouped => Cow::Borrowed(UNGROUPED_KEY),
            Self::Named(id) if id.starts_with(RESERVED_KEY_PREFIX) => {
                Cow::Owned(format!("{RESERVED_KEY_PREFIX}{id}"))
            }
            Self::Named(id) => Cow::Borrowed(id),
        }
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.storage_key())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRecord {
    pub id: String,
    pub name: String,
}

/// Pinned profile ids in the order they were pinned.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PinSet(Vec<String>);

impl PinSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.0.iter().any(|p| p == id)
    }

    pub fn is_pinned(&self, profile: &Profile) -> bool {
        profile.id.as_deref().map(|id| self.contains(id)).unwrap_or(false)
    }

    /// Returns false when the id was already pinned.
    pub fn insert(&mut self, id: &str) -> bool {
        if self.contains(id) {
            return false;
        }
        self.0.push(id.to_string());
        true
    }

    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.0.len();
        self.0.retain(|p| p != id);
        self.0.len() != before
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn ids(&self) -> &[String] {
        &self.0
    }
}

impl<S: Into<String>> FromIterator<S> for PinSet {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        let mut set = Self::new();
        for id in iter {
            let id = id.into();
            set.insert(&id);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn description_omits_default_port() {
        let p = Profile::ssh("a", "a", "h").with_user("root").with_port(22);
        assert_eq!(p.description(), "root@h");

        let p = Profile::ssh("b", "b", "h").with_user("u").with_port(2222);
        assert_eq!(p.description(), "u@h:2222");
    }

    #[test]
    fn description_falls_back_for_missing_fields() {
        let mut p = Profile::ssh("a", "a", "");
        p.options.host = None;
        assert_eq!(p.description(), "root@unknown");
        assert_eq!(p.full_address(), "root@unknown:22");
    }

    #[test]
    fn ssh_command_adds_port_flag() {
        let p = Profile::ssh("a", "a", "10.0.0.5").with_user("deploy");
        assert_eq!(p.ssh_command(), "ssh deploy@10.0.0.5");
        let p = p.with_port(2200);
        assert_eq!(p.ssh_command(), "ssh deploy@10.0.0.5 -p 2200");
    }

    #[test]
    fn group_id_defaults_to_ungrouped() {
        assert_eq!(GroupId::from_profile_group(None), GroupId::Ungrouped);
        assert_eq!(GroupId::from_profile_group(Some("")), GroupId::Ungrouped);
        assert_eq!(GroupId::from_profile_group(Some("ungrouped")), GroupId::Ungrouped);
        assert_eq!(
            GroupId::from_profile_group(Some("g1")),
            GroupId::Named("g1".to_string())
        );
    }

    #[test]
    fn storage_keys_never_collide_with_real_groups() {
        let named = |id: &str| GroupId::Named(id.to_string());
        let keys = [
            GroupId::Favorites.storage_key().into_owned(),
            GroupId::Ungrouped.storage_key().into_owned(),
            named("favorites").storage_key().into_owned(),
            named("@favorites").storage_key().into_owned(),
            named("prod").storage_key().into_owned(),
        ];
        assert_eq!(keys, ["@favorites", "ungrouped", "favorites", "@@favorites", "prod"]);
    }

    #[test]
    fn pin_set_keeps_order_and_rejects_duplicates() {
        let mut pins = PinSet::new();
        assert!(pins.insert("b"));
        assert!(pins.insert("a"));
        assert!(!pins.insert("b"));
        assert_eq!(pins.ids(), ["b".to_string(), "a".to_string()]);
        assert!(pins.remove("b"));
        assert!(!pins.remove("b"));
        assert_eq!(pins.len(), 1);
    }

    #[test]
    fn profile_round_trips_camel_case_json() {
        let json = r#"{"id":"p1","name":"web","type":"ssh","options":{"host":"h","port":2222},"isBuiltin":true}"#;
        let p: Profile = serde_json::from_str(json).unwrap();
        assert!(p.is_builtin);
        assert!(!p.is_template);
        assert_eq!(p.options.port, Some(2222));
        assert_eq!(p.kind, "ssh");
    }
}
