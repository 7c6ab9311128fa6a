//! Wire data model for the `/connections` endpoint.
//!
//! A snapshot is a JSON object mapping group names (usually process names)
//! to ordered arrays of connection records. Group membership and ordering
//! are decided by the backend; this module preserves both and never
//! reorders. Decoding is deliberately lenient at the record level: a
//! missing or oddly-typed field becomes an empty string so that one bad
//! record cannot take down the rest of the snapshot.

use crate::error::{ConnwatchError, Result};
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Outgoing,
    Incoming,
}

impl Direction {
    /// The backend emits the literal "Outgoing" for internet-bound
    /// connections; every other value is treated as incoming/LAN.
    pub fn from_wire(s: &str) -> Self {
        if s == "Outgoing" {
            Direction::Outgoing
        } else {
            Direction::Incoming
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Outgoing => "Outgoing",
            Direction::Incoming => "Incoming",
        }
    }

    /// Label used in the expanded detail panel.
    pub fn detail_label(&self) -> &'static str {
        match self {
            Direction::Outgoing => "↑ Outgoing",
            Direction::Incoming => "↓ Incoming",
        }
    }

    pub fn color(&self) -> ratatui::style::Color {
        use ratatui::style::Color;
        match self {
            Direction::Outgoing => Color::Cyan,
            Direction::Incoming => Color::Magenta,
        }
    }
}

/// One observed connection, as reported by the backend. All fields are
/// plain strings in textual wire form; absent fields decode to empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionRecord {
    pub pid: String,
    pub process: String,
    pub direction: Direction,
    pub source_ip: String,
    pub destination_ip: String,
    pub local_address: String,
    pub remote_address: String,
    pub protocol: String,
    pub destination_country: String,
    pub asn: String,
    pub org: String,
    pub domain: String,
    pub start_time: String,
    pub end_time: String,
    pub encrypted: String,
    pub tunnel: String,
}

impl Default for ConnectionRecord {
    fn default() -> Self {
        Self {
            pid: String::new(),
            process: String::new(),
            direction: Direction::Incoming,
            source_ip: String::new(),
            destination_ip: String::new(),
            local_address: String::new(),
            remote_address: String::new(),
            protocol: String::new(),
            destination_country: String::new(),
            asn: String::new(),
            org: String::new(),
            domain: String::new(),
            start_time: String::new(),
            end_time: String::new(),
            encrypted: String::new(),
            tunnel: String::new(),
        }
    }
}

/// Stable identity of a connection across snapshots. Snapshots are
/// replaced wholesale every cycle, so row-level presentation state has to
/// key on fields that survive the replacement: process id, both address
/// endpoints, and the start time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConnectionId(String);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl ConnectionRecord {
    /// Reads one record out of a JSON value. Anything that is not an
    /// object, and any field that is missing or not a scalar, degrades to
    /// the empty-field default instead of failing the whole snapshot.
    pub fn from_value(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            return Self::default();
        };

        let field = |name: &str| scalar_string(obj.get(name));

        Self {
            pid: field("PID"),
            process: field("Process"),
            direction: Direction::from_wire(&field("Direction")),
            source_ip: field("SourceIP"),
            destination_ip: field("DestinationIP"),
            local_address: field("LocalAddress"),
            remote_address: field("RemoteAddress"),
            protocol: field("Protocol"),
            destination_country: field("DestinationCountry"),
            asn: field("ASN"),
            org: field("Org"),
            domain: field("Domain"),
            start_time: field("StartTime"),
            end_time: field("EndTime"),
            encrypted: field("Encrypted"),
            tunnel: field("Tunnel"),
        }
    }

    pub fn identity(&self) -> ConnectionId {
        ConnectionId(format!(
            "{}|{}|{}|{}",
            self.pid, self.source_ip, self.destination_ip, self.start_time
        ))
    }

    /// Outgoing connections show the resolved domain; incoming ones are
    /// peer traffic with no meaningful destination name.
    pub fn destination_label(&self) -> &str {
        match self.direction {
            Direction::Outgoing => &self.domain,
            Direction::Incoming => "Peer-to-Peer",
        }
    }

    /// Two-letter upper-case country code for outgoing connections, the
    /// literal "LAN" for incoming ones.
    ///
    /// Edge cases: an empty `destination_country` yields an empty string
    /// (the backend reports no country for some peers), and a code
    /// shorter than two characters passes through upper-cased as-is.
    pub fn country_code(&self) -> String {
        match self.direction {
            Direction::Outgoing => self
                .destination_country
                .chars()
                .take(2)
                .collect::<String>()
                .to_uppercase(),
            Direction::Incoming => "LAN".to_string(),
        }
    }

    pub fn direction_arrow(&self) -> &'static str {
        match self.direction {
            Direction::Outgoing => "→",
            Direction::Incoming => "←",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub name: String,
    pub connections: Vec<ConnectionRecord>,
}

/// One complete point-in-time result from the polling endpoint. Each
/// successful poll fully supersedes the previous snapshot; there is no
/// merging.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub groups: Vec<Group>,
}

impl Snapshot {
    /// Decodes a snapshot from the response body. The top level must be
    /// a JSON object of arrays; anything else is a decode error. Group
    /// order follows the backend exactly. Groups with empty connection
    /// lists are dropped, so every rendered group is non-empty.
    pub fn from_json_str(body: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(body)
            .map_err(|e| ConnwatchError::Decode(format!("invalid JSON: {e}")))?;

        let Some(map) = value.as_object() else {
            return Err(ConnwatchError::Decode(
                "expected a JSON object of connection groups".to_string(),
            ));
        };

        let mut groups = Vec::with_capacity(map.len());
        for (name, members) in map {
            let Some(items) = members.as_array() else {
                return Err(ConnwatchError::Decode(format!(
                    "group '{name}' is not an array"
                )));
            };
            if items.is_empty() {
                continue;
            }
            groups.push(Group {
                name: name.clone(),
                connections: items.iter().map(ConnectionRecord::from_value).collect(),
            });
        }

        Ok(Self { groups })
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn connection_count(&self) -> usize {
        self.groups.iter().map(|g| g.connections.len()).sum()
    }

    pub fn contains_group(&self, name: &str) -> bool {
        self.groups.iter().any(|g| g.name == name)
    }
}

fn scalar_string(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}
