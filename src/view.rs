//! Deterministic projection of (snapshot, presentation state) into the
//! flat list of lines the dashboard draws.
//!
//! The build is a pure function: same snapshot and same presentation
//! state always produce the same lines, which is what keeps re-renders
//! idempotent and makes the reconciliation behavior testable without a
//! terminal. Toggling a group or row only changes presentation state and
//! rebuilds from the already-held snapshot; no refetch is involved.

use crate::presentation::PresentationState;
use crate::snapshot::{ConnectionId, ConnectionRecord, Snapshot};

/// One visible line of the dashboard body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewLine {
    GroupHeader {
        name: String,
        expanded: bool,
        count: usize,
    },
    Row {
        id: ConnectionId,
        pid: String,
        expanded: bool,
        label: String,
        country: String,
        process: String,
        destination_ip: String,
        arrow: &'static str,
    },
    Detail {
        name: &'static str,
        value: String,
    },
}

impl ViewLine {
    /// Headers and rows take the cursor; detail lines are read-only.
    #[must_use]
    pub fn is_selectable(&self) -> bool {
        !matches!(self, ViewLine::Detail { .. })
    }
}

pub fn build_lines(snapshot: &Snapshot, state: &PresentationState) -> Vec<ViewLine> {
    let mut lines = Vec::new();

    for group in &snapshot.groups {
        let expanded = state.is_group_expanded(&group.name);
        lines.push(ViewLine::GroupHeader {
            name: group.name.clone(),
            expanded,
            count: group.connections.len(),
        });

        if !expanded {
            continue;
        }

        for record in &group.connections {
            let id = record.identity();
            let row_expanded = state.is_row_expanded(&id);
            lines.push(ViewLine::Row {
                id,
                pid: record.pid.clone(),
                expanded: row_expanded,
                label: record.destination_label().to_string(),
                country: record.country_code(),
                process: record.process.clone(),
                destination_ip: record.destination_ip.clone(),
                arrow: record.direction_arrow(),
            });

            if row_expanded {
                push_detail_lines(&mut lines, record);
            }
        }
    }

    lines
}

fn push_detail_lines(lines: &mut Vec<ViewLine>, record: &ConnectionRecord) {
    let detail = |name: &'static str, value: String| ViewLine::Detail { name, value };

    lines.push(detail("Source IP", record.source_ip.clone()));
    lines.push(detail("Destination IP", record.destination_ip.clone()));
    lines.push(detail("Protocol", record.protocol.clone()));
    lines.push(detail("Country", record.destination_country.clone()));
    lines.push(detail("Process", record.process.clone()));
    lines.push(detail("PID", record.pid.clone()));
    lines.push(detail("ASN", record.asn.clone()));
    lines.push(detail("Org", record.org.clone()));
    lines.push(detail("Domain", record.domain.clone()));
    lines.push(detail("Start Time", record.start_time.clone()));
    lines.push(detail("End Time", record.end_time.clone()));
    lines.push(detail("Local Address", record.local_address.clone()));
    lines.push(detail("Remote Address", record.remote_address.clone()));
    lines.push(detail(
        "Direction",
        record.direction.detail_label().to_string(),
    ));
    lines.push(detail("Encrypted", record.encrypted.clone()));
    lines.push(detail("Tunnel", record.tunnel.clone()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::Snapshot;

    const SCENARIO_A: &str = r#"{
        "chrome.exe": [{
            "PID": 1,
            "Process": "chrome.exe",
            "Direction": "Outgoing",
            "Domain": "example.com",
            "DestinationCountry": "us",
            "DestinationIP": "93.184.216.34"
        }]
    }"#;

    const SCENARIO_B: &str = r#"{
        "svc": [{
            "PID": 2,
            "Process": "svc",
            "Direction": "Incoming",
            "DestinationCountry": "",
            "DestinationIP": "192.168.1.5"
        }]
    }"#;

    #[test]
    fn test_scenario_a_outgoing_row() {
        let snapshot = Snapshot::from_json_str(SCENARIO_A).unwrap();
        let lines = build_lines(&snapshot, &PresentationState::new());

        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[0],
            ViewLine::GroupHeader {
                name: "chrome.exe".to_string(),
                expanded: true,
                count: 1,
            }
        );
        match &lines[1] {
            ViewLine::Row {
                label,
                country,
                arrow,
                destination_ip,
                ..
            } => {
                assert_eq!(label, "example.com");
                assert_eq!(country, "US");
                assert_eq!(*arrow, "→");
                assert_eq!(destination_ip, "93.184.216.34");
            }
            other => panic!("expected a row, got {other:?}"),
        }
    }

    #[test]
    fn test_scenario_b_incoming_row() {
        let snapshot = Snapshot::from_json_str(SCENARIO_B).unwrap();
        let lines = build_lines(&snapshot, &PresentationState::new());

        match &lines[1] {
            ViewLine::Row {
                label,
                country,
                arrow,
                ..
            } => {
                assert_eq!(label, "Peer-to-Peer");
                assert_eq!(country, "LAN");
                assert_eq!(*arrow, "←");
            }
            other => panic!("expected a row, got {other:?}"),
        }
    }

    #[test]
    fn test_build_is_idempotent() {
        let snapshot = Snapshot::from_json_str(SCENARIO_A).unwrap();
        let state = PresentationState::new();
        let first = build_lines(&snapshot, &state);
        let second = build_lines(&snapshot, &state);
        assert_eq!(first, second);
    }

    #[test]
    fn test_collapsed_group_hides_rows() {
        let snapshot = Snapshot::from_json_str(SCENARIO_A).unwrap();
        let mut state = PresentationState::new();
        state.toggle_group("chrome.exe");

        let lines = build_lines(&snapshot, &state);
        assert_eq!(lines.len(), 1);
        assert!(matches!(
            lines[0],
            ViewLine::GroupHeader { expanded: false, .. }
        ));
    }

    #[test]
    fn test_expanded_row_shows_detail_panel() {
        let snapshot = Snapshot::from_json_str(SCENARIO_A).unwrap();
        let mut state = PresentationState::new();
        let id = snapshot.groups[0].connections[0].identity();
        state.toggle_row(&id);

        let lines = build_lines(&snapshot, &state);
        let detail_count = lines
            .iter()
            .filter(|l| matches!(l, ViewLine::Detail { .. }))
            .count();
        assert_eq!(detail_count, 16);
        assert!(lines.contains(&ViewLine::Detail {
            name: "Domain",
            value: "example.com".to_string(),
        }));
        assert!(lines.contains(&ViewLine::Detail {
            name: "Direction",
            value: "↑ Outgoing".to_string(),
        }));
    }

    #[test]
    fn test_group_toggle_survives_snapshot_refresh() {
        // The same group arrives in two consecutive snapshots; the user's
        // collapse applied after the first render must still hold after
        // the second (prune keeps live entries).
        let s1 = Snapshot::from_json_str(SCENARIO_A).unwrap();
        let mut state = PresentationState::new();
        state.toggle_group("chrome.exe");
        let _ = build_lines(&s1, &state);

        let s2 = Snapshot::from_json_str(SCENARIO_A).unwrap();
        state.prune(&s2);
        let lines = build_lines(&s2, &state);
        assert!(matches!(
            lines[0],
            ViewLine::GroupHeader { expanded: false, .. }
        ));
    }

    #[test]
    fn test_removed_group_restarts_from_default() {
        let s1 = Snapshot::from_json_str(SCENARIO_A).unwrap();
        let mut state = PresentationState::new();
        state.toggle_group("chrome.exe");
        let _ = build_lines(&s1, &state);

        // Group disappears for a cycle, then comes back
        let s2 = Snapshot::from_json_str(SCENARIO_B).unwrap();
        state.prune(&s2);
        let _ = build_lines(&s2, &state);

        let s3 = Snapshot::from_json_str(SCENARIO_A).unwrap();
        state.prune(&s3);
        let lines = build_lines(&s3, &state);
        assert!(matches!(
            lines[0],
            ViewLine::GroupHeader { expanded: true, .. }
        ));
    }

    #[test]
    fn test_placeholder_fields_render_without_aborting() {
        let body = r#"{"svc": [
            {"PID": 1, "Direction": "Outgoing", "Domain": "good.example"},
            {"PID": {"bad": true}},
            {"PID": 3, "Direction": "Incoming"}
        ]}"#;
        let snapshot = Snapshot::from_json_str(body).unwrap();
        let lines = build_lines(&snapshot, &PresentationState::new());

        // Header plus all three rows: the malformed record renders with
        // empty fields instead of blanking the batch.
        assert_eq!(lines.len(), 4);
        match &lines[2] {
            ViewLine::Row { pid, label, .. } => {
                assert_eq!(pid, "");
                assert_eq!(label, "Peer-to-Peer");
            }
            other => panic!("expected a row, got {other:?}"),
        }
    }
}
