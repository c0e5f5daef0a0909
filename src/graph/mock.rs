//! Deterministic stand-in results for when the graph backend is unavailable.
//!
//! A query is classified by textual fingerprints checked in a fixed order;
//! the first matching [`Fingerprint`] selects a hand-authored template.
//! Matching is plain substring containment, so two different queries that
//! share a token receive the same template.

use super::value::{Record, RecordSet, Value};

/// Query shapes that have a dedicated mock template.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Fingerprint {
    /// Team-to-team coordination edges.
    TeamCoordination,
    /// Users with the teams they lead or belong to and zones they supervise.
    UserNetwork,
    /// Resource centers supplying zones.
    ResourceFlow,
    /// High-severity zones lacking teams.
    CriticalZones,
    /// Shortest path between two named entities.
    ShortestPath,
}

impl Fingerprint {
    /// Default precedence, highest first.
    pub const DEFAULT_ORDER: [Fingerprint; 5] = [
        Fingerprint::TeamCoordination,
        Fingerprint::UserNetwork,
        Fingerprint::ResourceFlow,
        Fingerprint::CriticalZones,
        Fingerprint::ShortestPath,
    ];

    /// Tokens whose presence in the query text selects this fingerprint.
    pub fn tokens(self) -> &'static [&'static str] {
        match self {
            Fingerprint::TeamCoordination => &["COORDINATES_WITH"],
            Fingerprint::UserNetwork => &["user-network", "LEADS"],
            Fingerprint::ResourceFlow => &["resource-flow"],
            Fingerprint::CriticalZones => &["critical-zones"],
            Fingerprint::ShortestPath => &["shortestPath"],
        }
    }

    /// Whether `query` contains any of this fingerprint's tokens.
    pub fn matches(self, query: &str) -> bool {
        self.tokens().iter().any(|token| query.contains(token))
    }

    /// Template records for this fingerprint.
    pub fn records(self) -> Vec<Record> {
        match self {
            Fingerprint::TeamCoordination => vec![
                team_link("Alpha Response", "Bravo Medical", "Medical Support"),
                team_link("Charlie Logistics", "Alpha Response", "Equipment Supply"),
            ],
            Fingerprint::UserNetwork => vec![
                Record::from_pairs([
                    ("name", Value::from("Admin User")),
                    ("role", Value::from("admin")),
                    ("teamsLed", Value::from(vec!["Alpha"])),
                    ("teamMemberships", Value::List(Vec::new())),
                    ("zonesSupervised", Value::from(vec!["Wayanad"])),
                ]),
                Record::from_pairs([
                    ("name", Value::from("Rahul Nair")),
                    ("role", Value::from("responder")),
                    ("teamsLed", Value::List(Vec::new())),
                    ("teamMemberships", Value::from(vec!["Alpha"])),
                    ("zonesSupervised", Value::List(Vec::new())),
                ]),
            ],
            Fingerprint::ResourceFlow => vec![
                Record::from_pairs([
                    ("centerName", Value::from("Kochi Hub")),
                    ("zoneName", Value::from("Wayanad Landslide")),
                    ("severity", Value::Int(5)),
                    ("resources", Value::from(vec!["Food", "Water"])),
                ]),
                Record::from_pairs([
                    ("centerName", Value::from("Trivandrum Depot")),
                    ("zoneName", Value::from("Idukki Flood")),
                    ("severity", Value::Int(4)),
                    ("resources", Value::from(vec!["Boats"])),
                ]),
            ],
            // A single team assigned, which is what makes the zone critical.
            Fingerprint::CriticalZones => vec![Record::from_pairs([
                ("zone", Value::from("Wayanad Landslide")),
                ("type", Value::from("landslide")),
                ("teamCount", Value::Int(1)),
            ])],
            Fingerprint::ShortestPath => vec![Record::from_pairs([
                ("pathNodes", Value::from(vec!["Alpha", "Zone 1"])),
                ("pathRelations", Value::from(vec!["ASSIGNED_TO"])),
                ("pathLength", Value::Int(1)),
            ])],
        }
    }
}

fn team_link(team1: &str, team2: &str, reason: &str) -> Record {
    Record::from_pairs([("team1", team1), ("team2", team2), ("reason", reason)])
}

/// Record returned when no fingerprint matches.
pub fn generic_record() -> Record {
    Record::from_pairs([("name", Value::from("Mock Node")), ("value", Value::Int(123))])
}

/// Pure mock result generator.
#[derive(Clone, Debug)]
pub struct MockGenerator {
    order: Vec<Fingerprint>,
}

impl Default for MockGenerator {
    fn default() -> Self {
        Self::with_order(Fingerprint::DEFAULT_ORDER)
    }
}

impl MockGenerator {
    /// Generator using an explicit precedence list.
    pub fn with_order(order: impl IntoIterator<Item = Fingerprint>) -> Self {
        Self {
            order: order.into_iter().collect(),
        }
    }

    /// Precedence list, highest first.
    pub fn order(&self) -> &[Fingerprint] {
        &self.order
    }

    /// First fingerprint matching `query`, if any.
    pub fn classify(&self, query: &str) -> Option<Fingerprint> {
        self.order.iter().copied().find(|fp| fp.matches(query))
    }

    /// Records shaped like a real result for `query`.
    pub fn generate(&self, query: &str) -> RecordSet {
        match self.classify(query) {
            Some(fingerprint) => RecordSet::new(fingerprint.records()),
            None => RecordSet::new(vec![generic_record()]),
        }
    }
}
