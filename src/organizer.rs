//! Turns the flat profile list into the grouped, ordered and
//! visibility-annotated view the sidebar renders.
//!
//! Every step is a pure function over owned data so a refresh can rebuild
//! the whole view from scratch.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::model::{GroupId, GroupRecord, PinSet, Profile, FAVORITES_LABEL, UNGROUPED_LABEL};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    #[default]
    Name,
    Host,
    Recent,
}

impl SortMode {
    pub fn label(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Host => "host",
            Self::Recent => "recent",
        }
    }
}

impl fmt::Display for SortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SortMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "name" => Ok(Self::Name),
            "host" => Ok(Self::Host),
            "recent" => Ok(Self::Recent),
            other => Err(anyhow::anyhow!(
                "unknown sort mode {other:?} (expected name, host or recent)"
            )),
        }
    }
}

/// Recency inputs for [`SortMode::Recent`]: the store's recently used order
/// and the ids of profiles that currently have an open session.
#[derive(Clone, Debug, Default)]
pub struct Recency {
    recent_ids: Vec<String>,
    active_ids: HashSet<String>,
}

impl Recency {
    pub fn new(recent_ids: Vec<String>, active_ids: HashSet<String>) -> Self {
        Self {
            recent_ids,
            active_ids,
        }
    }

    pub fn is_active(&self, profile: &Profile) -> bool {
        profile
            .id
            .as_deref()
            .map(|id| self.active_ids.contains(id))
            .unwrap_or(false)
    }

    fn rank(&self, profile: &Profile) -> Option<usize> {
        let id = profile.id.as_deref()?;
        self.recent_ids.iter().position(|r| r == id)
    }

    pub fn active_ids(&self) -> &HashSet<String> {
        &self.active_ids
    }

    pub fn set_active_ids(&mut self, active_ids: HashSet<String>) {
        self.active_ids = active_ids;
    }
}

/// Only SSH profiles that are not templates and carry a host make it into
/// the sidebar.
pub fn is_eligible(profile: &Profile) -> bool {
    profile.is_ssh()
        && !profile.is_template
        && profile
            .options
            .host
            .as_deref()
            .map(|h| !h.is_empty())
            .unwrap_or(false)
}

pub fn ingest(profiles: impl IntoIterator<Item = Profile>) -> Vec<Profile> {
    profiles.into_iter().filter(is_eligible).collect()
}

/// Case-insensitive order, falling back to raw order so it stays total.
pub fn caseless_cmp(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

fn name_cmp(a: &Profile, b: &Profile) -> Ordering {
    caseless_cmp(&a.name, &b.name)
}

fn recent_cmp(a: &Profile, b: &Profile, recency: &Recency) -> Ordering {
    let active = recency.is_active(b).cmp(&recency.is_active(a));
    if active != Ordering::Equal {
        return active;
    }
    match (recency.rank(a), recency.rank(b)) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| name_cmp(a, b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => name_cmp(a, b),
    }
}

/// Stable sort. Profiles only compare equal when their names are equal.
pub fn sort_profiles(profiles: &mut [Profile], mode: SortMode, recency: &Recency) {
    match mode {
        SortMode::Name => profiles.sort_by(name_cmp),
        SortMode::Host => profiles.sort_by(|a, b| {
            caseless_cmp(a.host_or_empty(), b.host_or_empty()).then_with(|| name_cmp(a, b))
        }),
        SortMode::Recent => profiles.sort_by(|a, b| recent_cmp(a, b, recency)),
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProfileGroup {
    pub id: GroupId,
    pub name: String,
    pub profiles: Vec<Profile>,
    pub collapsed: bool,
}

impl ProfileGroup {
    fn new(id: GroupId, name: String) -> Self {
        Self {
            id,
            name,
            profiles: Vec::new(),
            collapsed: false,
        }
    }
}

pub fn resolve_group_name(id: &GroupId, names: &[GroupRecord]) -> String {
    match id {
        GroupId::Favorites => FAVORITES_LABEL.to_string(),
        GroupId::Ungrouped => UNGROUPED_LABEL.to_string(),
        GroupId::Named(raw) => names
            .iter()
            .find(|g| &g.id == raw)
            .map(|g| g.name.clone())
            .unwrap_or_else(|| raw.clone()),
    }
}

/// Partitions by group id. Groups come out in order of first appearance and
/// each keeps the incoming profile order.
pub fn group_profiles(sorted: Vec<Profile>, names: &[GroupRecord]) -> Vec<ProfileGroup> {
    let mut groups: Vec<ProfileGroup> = Vec::new();
    let mut index: HashMap<GroupId, usize> = HashMap::new();
    for profile in sorted {
        let id = profile.group_id();
        let slot = match index.get(&id) {
            Some(&i) => i,
            None => {
                let name = resolve_group_name(&id, names);
                groups.push(ProfileGroup::new(id.clone(), name));
                index.insert(id, groups.len() - 1);
                groups.len() - 1
            }
        };
        groups[slot].profiles.push(profile);
    }
    groups
}

/// Moves every pinned profile into a synthesized favorites group placed
/// first. Nothing is duplicated or dropped.
pub fn apply_pinning(mut groups: Vec<ProfileGroup>, pins: &PinSet) -> Vec<ProfileGroup> {
    if pins.is_empty() {
        return groups;
    }
    let mut favorites = ProfileGroup::new(
        GroupId::Favorites,
        resolve_group_name(&GroupId::Favorites, &[]),
    );
    for group in &mut groups {
        let (pinned, rest): (Vec<Profile>, Vec<Profile>) =
            group.profiles.drain(..).partition(|p| pins.is_pinned(p));
        group.profiles = rest;
        favorites.profiles.extend(pinned);
    }
    if !favorites.profiles.is_empty() {
        groups.insert(0, favorites);
    }
    groups
}

pub fn prune_empty(groups: Vec<ProfileGroup>) -> Vec<ProfileGroup> {
    groups
        .into_iter()
        .filter(|g| !g.profiles.is_empty())
        .collect()
}

fn group_rank(id: &GroupId) -> u8 {
    match id {
        GroupId::Favorites => 0,
        GroupId::Ungrouped => 1,
        GroupId::Named(_) => 2,
    }
}

/// Favorites, then ungrouped, then the rest by name.
pub fn order_groups(groups: &mut [ProfileGroup]) {
    groups.sort_by(|a, b| {
        group_rank(&a.id)
            .cmp(&group_rank(&b.id))
            .then_with(|| caseless_cmp(&a.name, &b.name))
            .then_with(|| a.id.storage_key().cmp(&b.id.storage_key()))
    });
}

pub fn apply_collapse(groups: &mut [ProfileGroup], collapsed: &HashMap<String, bool>) {
    for group in groups {
        group.collapsed = collapsed
            .get(group.id.storage_key().as_ref())
            .copied()
            .unwrap_or(false);
    }
}

/// Case-insensitive match of `filter` against `name$description`.
pub fn matches_filter(name: &str, description: &str, filter: &str) -> bool {
    if filter.is_empty() {
        return true;
    }
    let haystack = format!("{name}${description}").to_lowercase();
    haystack.contains(&filter.to_lowercase())
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProfileEntry {
    pub profile: Profile,
    pub description: String,
    pub pinned: bool,
    pub active: bool,
    pub visible: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GroupView {
    pub id: GroupId,
    pub name: String,
    pub collapsed: bool,
    pub visible: bool,
    pub entries: Vec<ProfileEntry>,
}

impl GroupView {
    pub fn visible_entries(&self) -> impl Iterator<Item = &ProfileEntry> {
        self.entries.iter().filter(|e| e.visible)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ViewModel {
    pub groups: Vec<GroupView>,
}

impl ViewModel {
    pub fn has_visible_profiles(&self) -> bool {
        self.groups.iter().any(|g| g.visible)
    }

    pub fn visible_groups(&self) -> impl Iterator<Item = &GroupView> {
        self.groups.iter().filter(|g| g.visible)
    }

    pub fn entries(&self) -> impl Iterator<Item = &ProfileEntry> {
        self.groups.iter().flat_map(|g| g.entries.iter())
    }

    pub fn find(&self, id: &str) -> Option<&ProfileEntry> {
        self.entries().find(|e| e.profile.has_id(id))
    }

    /// Re-evaluates active markers in place. Order is left untouched.
    pub fn mark_active(&mut self, recency: &Recency) {
        for group in &mut self.groups {
            for entry in &mut group.entries {
                entry.active = recency.is_active(&entry.profile);
            }
        }
    }
}

/// Annotates groups and profiles with visibility for `filter`. Entries are
/// never removed; a group is visible when any of its members is.
pub fn filter_groups(
    groups: Vec<ProfileGroup>,
    filter: &str,
    pins: &PinSet,
    recency: &Recency,
    describe: &dyn Fn(&Profile) -> String,
) -> ViewModel {
    let groups = groups
        .into_iter()
        .map(|group| {
            let entries: Vec<ProfileEntry> = group
                .profiles
                .into_iter()
                .map(|profile| {
                    let description = describe(&profile);
                    ProfileEntry {
                        visible: matches_filter(&profile.name, &description, filter),
                        pinned: pins.is_pinned(&profile),
                        active: recency.is_active(&profile),
                        description,
                        profile,
                    }
                })
                .collect();
            GroupView {
                visible: filter.is_empty() || entries.iter().any(|e| e.visible),
                id: group.id,
                name: group.name,
                collapsed: group.collapsed,
                entries,
            }
        })
        .collect();
    ViewModel { groups }
}

pub struct OrganizeInput<'a> {
    pub profiles: &'a [Profile],
    pub sort: SortMode,
    pub filter: &'a str,
    pub pins: &'a PinSet,
    pub collapsed: &'a HashMap<String, bool>,
    pub group_names: &'a [GroupRecord],
    pub recency: &'a Recency,
}

/// Full pipeline: sort, group, pin, prune, order, collapse, filter.
pub fn organize(input: &OrganizeInput<'_>, describe: &dyn Fn(&Profile) -> String) -> ViewModel {
    let mut sorted = input.profiles.to_vec();
    sort_profiles(&mut sorted, input.sort, input.recency);

    let groups = group_profiles(sorted, input.group_names);
    let mut groups = apply_pinning(groups, input.pins);
    // Favorites are collected group by group; restore the global sort order.
    if let Some(favorites) = groups.iter_mut().find(|g| g.id == GroupId::Favorites) {
        sort_profiles(&mut favorites.profiles, input.sort, input.recency);
    }
    let mut groups = prune_empty(groups);
    order_groups(&mut groups);
    apply_collapse(&mut groups, input.collapsed);

    filter_groups(groups, input.filter, input.pins, input.recency, describe)
}

pub fn connection_count_text(total: usize, active: usize) -> String {
    let plural = if total == 1 { "" } else { "s" };
    if active == 0 {
        format!("{total} connection{plural}")
    } else {
        format!("{total} connection{plural} ({active} active)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FAVORITES_KEY;

    fn names(profiles: &[Profile]) -> Vec<&str> {
        profiles.iter().map(|p| p.name.as_str()).collect()
    }

    fn two_profiles() -> Vec<Profile> {
        vec![
            Profile::ssh("p-bob", "bob", "10.0.0.1"),
            Profile::ssh("p-alice", "alice", "10.0.0.2"),
        ]
    }

    fn describe(p: &Profile) -> String {
        p.description()
    }

    #[test]
    fn ingest_keeps_only_eligible_profiles() {
        let mut template = Profile::ssh("t", "template", "h");
        template.is_template = true;
        let mut local = Profile::ssh("l", "local", "h");
        local.kind = "local".to_string();
        let no_host = Profile::ssh("n", "nohost", "");
        let mut missing_host = Profile::ssh("m", "missing", "h");
        missing_host.options.host = None;
        let ok = Profile::ssh("ok", "ok", "h");

        let kept = ingest(vec![template, local, no_host, missing_host, ok]);
        assert_eq!(names(&kept), ["ok"]);
        assert!(kept.iter().all(is_eligible));
    }

    #[test]
    fn name_sort_orders_case_insensitively_and_is_idempotent() {
        let mut profiles = two_profiles();
        profiles.push(Profile::ssh("p-c", "Carol", "10.0.0.3"));
        sort_profiles(&mut profiles, SortMode::Name, &Recency::default());
        assert_eq!(names(&profiles), ["alice", "bob", "Carol"]);

        let once = profiles.clone();
        sort_profiles(&mut profiles, SortMode::Name, &Recency::default());
        assert_eq!(profiles, once);
    }

    #[test]
    fn host_sort_treats_missing_host_as_empty() {
        let mut missing = Profile::ssh("z", "zed", "x");
        missing.options.host = None;
        let mut profiles = vec![
            Profile::ssh("a", "a", "B.example"),
            missing,
            Profile::ssh("b", "b", "a.example"),
        ];
        sort_profiles(&mut profiles, SortMode::Host, &Recency::default());
        assert_eq!(names(&profiles), ["zed", "b", "a"]);
    }

    #[test]
    fn recent_sort_puts_active_first_then_recency_then_name() {
        let mut profiles = vec![
            Profile::ssh("a", "a", "h"),
            Profile::ssh("b", "b", "h"),
            Profile::ssh("c", "c", "h"),
            Profile::ssh("d", "d", "h"),
            Profile::ssh("e", "e", "h"),
        ];
        let recency = Recency::new(
            vec!["d".to_string(), "b".to_string(), "e".to_string()],
            HashSet::from(["e".to_string(), "c".to_string()]),
        );
        sort_profiles(&mut profiles, SortMode::Recent, &recency);
        // active tier: e (recent #3) before c (not recent); then d, b; then a.
        assert_eq!(names(&profiles), ["e", "c", "d", "b", "a"]);
    }

    #[test]
    fn grouping_resolves_names_and_keeps_sort_order() {
        let profiles = vec![
            Profile::ssh("1", "a", "h").with_group("g1"),
            Profile::ssh("2", "b", "h"),
            Profile::ssh("3", "c", "h").with_group("g2"),
            Profile::ssh("4", "d", "h").with_group("g1"),
        ];
        let names_map = vec![GroupRecord {
            id: "g1".to_string(),
            name: "Production".to_string(),
        }];
        let groups = group_profiles(profiles, &names_map);
        assert_eq!(groups.len(), 3);
        assert_eq!(groups[0].name, "Production");
        assert_eq!(names(&groups[0].profiles), ["a", "d"]);
        assert_eq!(groups[1].id, GroupId::Ungrouped);
        assert_eq!(groups[1].name, "Ungrouped");
        assert_eq!(groups[2].name, "g2");
    }

    #[test]
    fn pinning_moves_profiles_into_favorites() {
        let groups = group_profiles(
            vec![
                Profile::ssh("p1", "one", "h").with_group("g1"),
                Profile::ssh("p2", "two", "h").with_group("g1"),
            ],
            &[],
        );
        let pins: PinSet = ["p1"].into_iter().collect();
        let before: usize = groups.iter().map(|g| g.profiles.len()).sum();

        let groups = apply_pinning(groups, &pins);
        let after: usize = groups.iter().map(|g| g.profiles.len()).sum();
        assert_eq!(before, after);

        assert_eq!(groups[0].id, GroupId::Favorites);
        assert_eq!(names(&groups[0].profiles), ["one"]);
        assert_eq!(groups[1].id, GroupId::Named("g1".to_string()));
        assert_eq!(names(&groups[1].profiles), ["two"]);
    }

    #[test]
    fn sort_is_total_and_stable_in_every_mode() {
        let recency = Recency::default();
        for mode in [SortMode::Name, SortMode::Host, SortMode::Recent] {
            // Names equal up to case still get a fixed order.
            let mut profiles = vec![
                Profile::ssh("lower", "web", "h"),
                Profile::ssh("upper", "Web", "h"),
            ];
            sort_profiles(&mut profiles, mode, &recency);
            assert_eq!(names(&profiles), ["Web", "web"], "{mode}");
            profiles.reverse();
            sort_profiles(&mut profiles, mode, &recency);
            assert_eq!(names(&profiles), ["Web", "web"], "{mode}");

            // Identical names keep their input order.
            let mut dups = vec![
                Profile::ssh("d2", "dup", "h"),
                Profile::ssh("d1", "dup", "h"),
                Profile::ssh("d3", "dup", "h"),
            ];
            sort_profiles(&mut dups, mode, &recency);
            let ids: Vec<&str> = dups.iter().filter_map(|p| p.id.as_deref()).collect();
            assert_eq!(ids, ["d2", "d1", "d3"], "{mode}");
        }
    }

    #[test]
    fn host_sort_breaks_ties_by_name() {
        let mut profiles = vec![
            Profile::ssh("c", "charlie", "same.example"),
            Profile::ssh("a", "Alpha", "same.example"),
            Profile::ssh("b", "bravo", "other.example"),
        ];
        sort_profiles(&mut profiles, SortMode::Host, &Recency::default());
        assert_eq!(names(&profiles), ["bravo", "Alpha", "charlie"]);
    }

    #[test]
    fn recent_sort_breaks_ties_by_name_within_a_tier() {
        let mut profiles = vec![
            Profile::ssh("b", "bravo", "h"),
            Profile::ssh("a", "alpha", "h"),
            Profile::ssh("d", "delta", "h"),
            Profile::ssh("c", "charlie", "h"),
        ];
        let recency = Recency::new(
            Vec::new(),
            HashSet::from(["d".to_string(), "b".to_string()]),
        );
        sort_profiles(&mut profiles, SortMode::Recent, &recency);
        assert_eq!(names(&profiles), ["bravo", "delta", "alpha", "charlie"]);
    }

    #[test]
    fn pinning_across_groups_preserves_every_profile() {
        let groups = group_profiles(
            vec![
                Profile::ssh("p1", "one", "h").with_group("g1"),
                Profile::ssh("p2", "two", "h").with_group("g1"),
                Profile::ssh("p3", "three", "h").with_group("g2"),
                Profile::ssh("p4", "four", "h").with_group("g2"),
                Profile::ssh("p5", "five", "h"),
            ],
            &[],
        );
        let pins: PinSet = ["p5", "p3", "p2"].into_iter().collect();
        let before: usize = groups.iter().map(|g| g.profiles.len()).sum();

        let groups = apply_pinning(groups, &pins);
        let after: usize = groups.iter().map(|g| g.profiles.len()).sum();
        assert_eq!(before, after);

        let ids: HashSet<&str> = groups
            .iter()
            .flat_map(|g| g.profiles.iter())
            .filter_map(|p| p.id.as_deref())
            .collect();
        assert_eq!(ids.len(), 5);

        assert_eq!(groups[0].id, GroupId::Favorites);
        assert_eq!(names(&groups[0].profiles), ["two", "three", "five"]);
        let rest: Vec<Vec<&str>> = groups[1..].iter().map(|g| names(&g.profiles)).collect();
        assert_eq!(rest, [vec!["one"], vec!["four"], vec![]]);
    }

    #[test]
    fn favorites_collapse_is_independent_of_a_real_favorites_group() {
        let profiles = vec![
            Profile::ssh("p1", "pinned", "h"),
            Profile::ssh("p2", "member", "h").with_group("favorites"),
        ];
        let pins: PinSet = ["p1"].into_iter().collect();
        let recency = Recency::default();
        let collapsed_of = |collapsed: HashMap<String, bool>| {
            let view = organize(
                &OrganizeInput {
                    profiles: &profiles,
                    sort: SortMode::Name,
                    filter: "",
                    pins: &pins,
                    collapsed: &collapsed,
                    group_names: &[],
                    recency: &recency,
                },
                &describe,
            );
            view.groups
                .iter()
                .map(|g| (g.id.clone(), g.collapsed))
                .collect::<Vec<_>>()
        };
        let real = GroupId::Named("favorites".to_string());

        let groups = collapsed_of(HashMap::from([(FAVORITES_KEY.to_string(), true)]));
        assert_eq!(groups, [(GroupId::Favorites, true), (real.clone(), false)]);

        let key = real.storage_key().into_owned();
        let groups = collapsed_of(HashMap::from([(key, true)]));
        assert_eq!(groups, [(GroupId::Favorites, false), (real, true)]);
    }

    #[test]
    fn pinning_unknown_ids_adds_no_favorites() {
        let groups = group_profiles(vec![Profile::ssh("p1", "one", "h")], &[]);
        let pins: PinSet = ["gone"].into_iter().collect();
        let groups = apply_pinning(groups, &pins);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].id, GroupId::Ungrouped);
    }

    #[test]
    fn pruning_drops_groups_emptied_by_pinning() {
        let groups = group_profiles(vec![Profile::ssh("p1", "one", "h").with_group("g")], &[]);
        let pins: PinSet = ["p1"].into_iter().collect();
        let groups = prune_empty(apply_pinning(groups, &pins));
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].id, GroupId::Favorites);
    }

    #[test]
    fn group_order_is_favorites_ungrouped_then_by_name() {
        let mut groups = vec![
            ProfileGroup::new(GroupId::Named("z".into()), "zeta".into()),
            ProfileGroup::new(GroupId::Ungrouped, "Ungrouped".into()),
            ProfileGroup::new(GroupId::Named("a".into()), "Alpha".into()),
            ProfileGroup::new(GroupId::Favorites, "Favorites".into()),
            ProfileGroup::new(GroupId::Named("b".into()), "beta".into()),
        ];
        order_groups(&mut groups);
        let order: Vec<&str> = groups.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(order, ["Favorites", "Ungrouped", "Alpha", "beta", "zeta"]);

        groups.remove(0);
        order_groups(&mut groups);
        assert_eq!(groups[0].id, GroupId::Ungrouped);
    }

    #[test]
    fn filter_by_host_hides_non_matching_groups() {
        let profiles = vec![
            Profile::ssh("p-bob", "bob", "10.0.0.1").with_group("g-bob"),
            Profile::ssh("p-alice", "alice", "10.0.0.2").with_group("g-alice"),
        ];
        let pins = PinSet::new();
        let collapsed = HashMap::new();
        let recency = Recency::default();
        let view = organize(
            &OrganizeInput {
                profiles: &profiles,
                sort: SortMode::Name,
                filter: "10.0.0.2",
                pins: &pins,
                collapsed: &collapsed,
                group_names: &[],
                recency: &recency,
            },
            &describe,
        );
        let visible: Vec<&str> = view
            .entries()
            .filter(|e| e.visible)
            .map(|e| e.profile.name.as_str())
            .collect();
        assert_eq!(visible, ["alice"]);
        let bob_group = view
            .groups
            .iter()
            .find(|g| g.id == GroupId::Named("g-bob".into()))
            .unwrap();
        assert!(!bob_group.visible);
        // Hidden, not removed.
        assert_eq!(bob_group.entries.len(), 1);
    }

    #[test]
    fn filter_matches_name_case_insensitively() {
        assert!(matches_filter("Web-01", "root@h", "web"));
        assert!(matches_filter("db", "ROOT@H", "root@h"));
        assert!(!matches_filter("db", "root@h", "web"));
        assert!(matches_filter("db", "root@h", ""));
    }

    #[test]
    fn organize_sorts_favorites_in_global_order_and_applies_collapse() {
        let profiles = vec![
            Profile::ssh("z", "zulu", "h").with_group("a"),
            Profile::ssh("y", "yankee", "h").with_group("b"),
            Profile::ssh("x", "xray", "h").with_group("a"),
        ];
        let pins: PinSet = ["z", "y", "x"].into_iter().collect();
        let collapsed = HashMap::from([(FAVORITES_KEY.to_string(), true)]);
        let recency = Recency::default();
        let view = organize(
            &OrganizeInput {
                profiles: &profiles,
                sort: SortMode::Name,
                filter: "",
                pins: &pins,
                collapsed: &collapsed,
                group_names: &[],
                recency: &recency,
            },
            &describe,
        );
        assert_eq!(view.groups.len(), 1);
        let fav = &view.groups[0];
        assert!(fav.collapsed);
        let order: Vec<&str> = fav.entries.iter().map(|e| e.profile.name.as_str()).collect();
        assert_eq!(order, ["xray", "yankee", "zulu"]);
        assert!(fav.entries.iter().all(|e| e.pinned));
    }

    #[test]
    fn mark_active_keeps_order() {
        let profiles = two_profiles();
        let pins = PinSet::new();
        let collapsed = HashMap::new();
        let mut recency = Recency::default();
        let mut view = organize(
            &OrganizeInput {
                profiles: &profiles,
                sort: SortMode::Recent,
                filter: "",
                pins: &pins,
                collapsed: &collapsed,
                group_names: &[],
                recency: &recency,
            },
            &describe,
        );
        recency.set_active_ids(HashSet::from(["p-bob".to_string()]));
        view.mark_active(&recency);
        let order: Vec<(&str, bool)> = view
            .entries()
            .map(|e| (e.profile.name.as_str(), e.active))
            .collect();
        assert_eq!(order, [("alice", false), ("bob", true)]);
    }

    #[test]
    fn connection_count_text_pluralizes() {
        assert_eq!(connection_count_text(1, 0), "1 connection");
        assert_eq!(connection_count_text(3, 0), "3 connections");
        assert_eq!(connection_count_text(3, 2), "3 connections (2 active)");
    }

    #[test]
    fn sort_mode_parses_labels() {
        assert_eq!("Recent".parse::<SortMode>().unwrap(), SortMode::Recent);
        assert!("size".parse::<SortMode>().is_err());
        assert_eq!(SortMode::Host.to_string(), "host");
    }
}
