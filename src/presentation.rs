//! User-controlled expand/collapse state that outlives any single
//! snapshot.
//!
//! Snapshots are replaced wholesale on every poll, so this state lives in
//! its own structure keyed by stable identifiers (group name, derived
//! connection identity) rather than in the rendered view. Groups default
//! to expanded the first time they appear; row detail panels default to
//! collapsed. Entries for groups and rows that vanish from the latest
//! snapshot are pruned so the sets cannot grow without bound.

use crate::snapshot::{ConnectionId, Snapshot};
use std::collections::HashSet;

#[derive(Debug, Default, Clone)]
pub struct PresentationState {
    // Inverted for groups: membership means the user collapsed it. A
    // never-seen group has no entry and therefore renders expanded,
    // which is the documented default.
    collapsed_groups: HashSet<String>,
    expanded_rows: HashSet<ConnectionId>,
}

impl PresentationState {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_group_expanded(&self, name: &str) -> bool {
        !self.collapsed_groups.contains(name)
    }

    #[must_use]
    pub fn is_row_expanded(&self, id: &ConnectionId) -> bool {
        self.expanded_rows.contains(id)
    }

    pub fn toggle_group(&mut self, name: &str) {
        if !self.collapsed_groups.remove(name) {
            self.collapsed_groups.insert(name.to_string());
        }
    }

    pub fn toggle_row(&mut self, id: &ConnectionId) {
        if !self.expanded_rows.remove(id) {
            self.expanded_rows.insert(id.clone());
        }
    }

    /// Drops state for groups and rows that are not present in
    /// `snapshot`. A group that disappears and later reappears under the
    /// same name starts over from the default (expanded) state.
    pub fn prune(&mut self, snapshot: &Snapshot) {
        self.collapsed_groups
            .retain(|name| snapshot.contains_group(name));

        if self.expanded_rows.is_empty() {
            return;
        }
        let live: HashSet<ConnectionId> = snapshot
            .groups
            .iter()
            .flat_map(|g| g.connections.iter().map(|c| c.identity()))
            .collect();
        self.expanded_rows.retain(|id| live.contains(id));
    }

    #[must_use]
    pub fn tracked_entries(&self) -> usize {
        self.collapsed_groups.len() + self.expanded_rows.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::Snapshot;

    fn snapshot_with(groups: &[(&str, &[u32])]) -> Snapshot {
        let mut parts = Vec::new();
        for (name, pids) in groups {
            let records: Vec<String> = pids
                .iter()
                .map(|pid| format!(r#"{{"PID": {pid}, "Direction": "Outgoing"}}"#))
                .collect();
            parts.push(format!(r#""{}": [{}]"#, name, records.join(",")));
        }
        Snapshot::from_json_str(&format!("{{{}}}", parts.join(","))).unwrap()
    }

    #[test]
    fn test_groups_default_expanded() {
        let state = PresentationState::new();
        assert!(state.is_group_expanded("never-seen-before"));
    }

    #[test]
    fn test_rows_default_collapsed() {
        let state = PresentationState::new();
        let snapshot = snapshot_with(&[("svc", &[1])]);
        let id = snapshot.groups[0].connections[0].identity();
        assert!(!state.is_row_expanded(&id));
    }

    #[test]
    fn test_toggle_round_trips() {
        let mut state = PresentationState::new();
        state.toggle_group("svc");
        assert!(!state.is_group_expanded("svc"));
        state.toggle_group("svc");
        assert!(state.is_group_expanded("svc"));

        let snapshot = snapshot_with(&[("svc", &[1])]);
        let id = snapshot.groups[0].connections[0].identity();
        state.toggle_row(&id);
        assert!(state.is_row_expanded(&id));
        state.toggle_row(&id);
        assert!(!state.is_row_expanded(&id));
    }

    #[test]
    fn test_prune_drops_absent_groups() {
        let mut state = PresentationState::new();
        state.toggle_group("gone");
        state.toggle_group("stays");

        let snapshot = snapshot_with(&[("stays", &[1])]);
        state.prune(&snapshot);

        // The surviving group keeps its user-set state
        assert!(!state.is_group_expanded("stays"));
        // The absent group is forgotten; reappearing starts expanded
        assert!(state.is_group_expanded("gone"));
        assert_eq!(state.tracked_entries(), 1);
    }

    #[test]
    fn test_prune_drops_absent_rows() {
        let mut state = PresentationState::new();
        let s1 = snapshot_with(&[("svc", &[1, 2])]);
        let id1 = s1.groups[0].connections[0].identity();
        let id2 = s1.groups[0].connections[1].identity();
        state.toggle_row(&id1);
        state.toggle_row(&id2);

        let s2 = snapshot_with(&[("svc", &[2])]);
        state.prune(&s2);

        assert!(!state.is_row_expanded(&id1));
        assert!(state.is_row_expanded(&id2));
    }

    #[test]
    fn test_prune_is_lazy_no_op_when_nothing_tracked() {
        let mut state = PresentationState::new();
        let snapshot = snapshot_with(&[("svc", &[1])]);
        state.prune(&snapshot);
        assert_eq!(state.tracked_entries(), 0);
    }
}
