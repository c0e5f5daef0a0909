//! Canned graph analytics over the disaster-response graph.
//!
//! Every query opens with a `//` comment naming its route context so that
//! mock fingerprints can recognize it. Rows are decoded from normalized
//! [`Record`]s, which makes them identical whether the live backend or the
//! mock generator answered.

use serde::Serialize;

use super::client::GraphClient;
use super::value::{Params, Record, Value};
use super::AccessMode;
use crate::error::Result;

/// Default start node for [`shortest_path`].
pub const DEFAULT_PATH_FROM: &str = "Alpha Team";
/// Default end node for [`shortest_path`].
pub const DEFAULT_PATH_TO: &str = "Kerala Landslide Area";

pub(crate) const TEAM_COLLABORATION: &str = "// team-collaboration
MATCH (t1:Team)-[r:COORDINATES_WITH]->(t2:Team)
RETURN t1.name AS team1, t2.name AS team2, r.reason AS reason";

pub(crate) const USER_NETWORK: &str = "// user-network
MATCH (u:User)
OPTIONAL MATCH (u)-[:LEADS]->(teamLed:Team)
OPTIONAL MATCH (u)-[:MEMBER_OF]->(teamMember:Team)
OPTIONAL MATCH (u)-[:SUPERVISES]->(zone:Zone)
RETURN u.name AS name, u.role AS role,
       COLLECT(DISTINCT teamLed.name) AS teamsLed,
       COLLECT(DISTINCT teamMember.name) AS teamMemberships,
       COLLECT(DISTINCT zone.name) AS zonesSupervised";

pub(crate) const RESOURCE_FLOW: &str = "// resource-flow
MATCH (rc:ResourceCenter)-[sup:SUPPLIES]->(z:Zone)
RETURN rc.name AS centerName, z.name AS zoneName,
       z.severity AS severity, sup.resources AS resources
ORDER BY z.severity DESC";

pub(crate) const ZONE_OVERVIEW: &str = "// zone-overview
MATCH (z:Zone)
OPTIONAL MATCH (t:Team)-[:ASSIGNED_TO]->(z)
OPTIONAL MATCH (s:Shelter)-[:LOCATED_IN]->(z)
OPTIONAL MATCH (rc:ResourceCenter)-[:SUPPLIES]->(z)
OPTIONAL MATCH (u:User)-[:SUPERVISES]->(z)
RETURN z.name AS zone, z.severity AS severity, z.status AS status,
       COLLECT(DISTINCT t.name) AS assignedTeams,
       COLLECT(DISTINCT s.name) AS shelters,
       COLLECT(DISTINCT rc.name) AS suppliers,
       COLLECT(DISTINCT u.name) AS supervisors";

pub(crate) const CRITICAL_ZONES: &str = "// critical-zones
MATCH (z:Zone {severity: 5})
OPTIONAL MATCH (t:Team)-[:ASSIGNED_TO]->(z)
WITH z, COUNT(t) AS teamCount
WHERE teamCount < 2
RETURN z.name AS zone, z.disasterType AS type, teamCount";

pub(crate) const SHORTEST_PATH: &str = "// shortest-path
MATCH (start {name: $from}), (end {name: $to})
MATCH path = shortestPath((start)-[*..5]-(end))
RETURN [n IN nodes(path) | n.name] AS pathNodes,
       [r IN relationships(path) | type(r)] AS pathRelations,
       length(path) AS pathLength";

pub(crate) const MOST_CONNECTED: &str = "// most-connected
MATCH (n)
WHERE n:User OR n:Team OR n:Zone
OPTIONAL MATCH (n)-[r]-()
WITH n, COUNT(r) AS connections, labels(n)[0] AS nodeType
ORDER BY connections DESC
LIMIT 10
RETURN nodeType, n.name AS name, connections";

pub(crate) const CLEAR_GRAPH: &str = "MATCH (n) DETACH DELETE n";

const SCHEMA_STATEMENTS: [&str; 5] = [
    "CREATE CONSTRAINT user_name IF NOT EXISTS FOR (u:User) REQUIRE u.name IS UNIQUE",
    "CREATE CONSTRAINT team_name IF NOT EXISTS FOR (t:Team) REQUIRE t.name IS UNIQUE",
    "CREATE CONSTRAINT zone_name IF NOT EXISTS FOR (z:Zone) REQUIRE z.name IS UNIQUE",
    "CREATE CONSTRAINT shelter_name IF NOT EXISTS FOR (s:Shelter) REQUIRE s.name IS UNIQUE",
    "CREATE CONSTRAINT center_name IF NOT EXISTS FOR (c:ResourceCenter) REQUIRE c.name IS UNIQUE",
];

/// Coordination edge between two teams.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamLink {
    /// Coordinating team.
    pub team1: Option<String>,
    /// Team being coordinated with.
    pub team2: Option<String>,
    /// Why the teams coordinate.
    pub reason: Option<String>,
}

impl From<&Record> for TeamLink {
    fn from(record: &Record) -> Self {
        Self {
            team1: record.get_string("team1"),
            team2: record.get_string("team2"),
            reason: record.get_string("reason"),
        }
    }
}

/// A user's leadership, membership and supervision edges.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserLinks {
    /// User name.
    pub name: Option<String>,
    /// User role.
    pub role: Option<String>,
    /// Teams the user leads.
    pub teams_led: Vec<String>,
    /// Teams the user belongs to.
    pub team_memberships: Vec<String>,
    /// Zones the user supervises.
    pub zones_supervised: Vec<String>,
}

impl From<&Record> for UserLinks {
    fn from(record: &Record) -> Self {
        Self {
            name: record.get_string("name"),
            role: record.get_string("role"),
            teams_led: record.get_strings("teamsLed"),
            team_memberships: record.get_strings("teamMemberships"),
            zones_supervised: record.get_strings("zonesSupervised"),
        }
    }
}

/// Supplies flowing from a resource center into a zone.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceFlow {
    /// Supplying resource center.
    pub center_name: Option<String>,
    /// Supplied zone.
    pub zone_name: Option<String>,
    /// Zone severity.
    pub severity: Option<i64>,
    /// Resources supplied.
    pub resources: Vec<String>,
}

impl From<&Record> for ResourceFlow {
    fn from(record: &Record) -> Self {
        Self {
            center_name: record.get_string("centerName"),
            zone_name: record.get_string("zoneName"),
            severity: record.get_i64("severity"),
            resources: record.get_strings("resources"),
        }
    }
}

/// A zone with everything attached to it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneOverview {
    /// Zone name.
    pub zone: Option<String>,
    /// Zone severity.
    pub severity: Option<i64>,
    /// Zone status.
    pub status: Option<String>,
    /// Teams assigned to the zone.
    pub assigned_teams: Vec<String>,
    /// Shelters located in the zone.
    pub shelters: Vec<String>,
    /// Resource centers supplying the zone.
    pub suppliers: Vec<String>,
    /// Users supervising the zone.
    pub supervisors: Vec<String>,
}

impl From<&Record> for ZoneOverview {
    fn from(record: &Record) -> Self {
        Self {
            zone: record.get_string("zone"),
            severity: record.get_i64("severity"),
            status: record.get_string("status"),
            assigned_teams: record.get_strings("assignedTeams"),
            shelters: record.get_strings("shelters"),
            suppliers: record.get_strings("suppliers"),
            supervisors: record.get_strings("supervisors"),
        }
    }
}

/// Severe zone with fewer than two teams assigned.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CriticalZone {
    /// Zone name.
    pub zone: Option<String>,
    /// Disaster type.
    #[serde(rename = "type")]
    pub disaster_type: Option<String>,
    /// Teams currently assigned.
    pub team_count: Option<i64>,
}

impl From<&Record> for CriticalZone {
    fn from(record: &Record) -> Self {
        Self {
            zone: record.get_string("zone"),
            disaster_type: record.get_string("type"),
            team_count: record.get_i64("teamCount"),
        }
    }
}

/// Node names and relationship types along a path.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathSummary {
    /// Names of the nodes along the path, in order.
    pub nodes: Vec<String>,
    /// Relationship types along the path.
    pub relations: Vec<String>,
    /// Hop count.
    pub length: Option<i64>,
}

impl From<&Record> for PathSummary {
    fn from(record: &Record) -> Self {
        Self {
            nodes: record.get_strings("pathNodes"),
            relations: record.get_strings("pathRelations"),
            length: record.get_i64("pathLength"),
        }
    }
}

/// Degree of a user, team or zone.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HubNode {
    /// First label of the node.
    #[serde(rename = "type")]
    pub node_type: Option<String>,
    /// Node name.
    pub name: Option<String>,
    /// Relationship count.
    pub connections: Option<i64>,
}

impl From<&Record> for HubNode {
    fn from(record: &Record) -> Self {
        Self {
            node_type: record.get_string("nodeType"),
            name: record.get_string("name"),
            connections: record.get_i64("connections"),
        }
    }
}

async fn rows<T>(client: &GraphClient, query: &str, params: &Params) -> Result<Vec<T>>
where
    T: for<'r> From<&'r Record>,
{
    let records = client
        .execute_with_mode(query, params, AccessMode::Read)
        .await?;
    Ok(records.iter().map(T::from).collect())
}

/// Team coordination network.
pub async fn team_collaboration(client: &GraphClient) -> Result<Vec<TeamLink>> {
    rows(client, TEAM_COLLABORATION, &Params::new()).await
}

/// Per-user relationship summary.
pub async fn user_network(client: &GraphClient) -> Result<Vec<UserLinks>> {
    rows(client, USER_NETWORK, &Params::new()).await
}

/// Resource distribution from centers to zones, most severe first.
pub async fn resource_flow(client: &GraphClient) -> Result<Vec<ResourceFlow>> {
    rows(client, RESOURCE_FLOW, &Params::new()).await
}

/// Every zone with its teams, shelters, suppliers and supervisors.
pub async fn zone_overview(client: &GraphClient) -> Result<Vec<ZoneOverview>> {
    rows(client, ZONE_OVERVIEW, &Params::new()).await
}

/// Severity-5 zones with fewer than two assigned teams.
pub async fn critical_zones(client: &GraphClient) -> Result<Vec<CriticalZone>> {
    rows(client, CRITICAL_ZONES, &Params::new()).await
}

/// Shortest path of at most five hops between two named nodes.
pub async fn shortest_path(
    client: &GraphClient,
    from: &str,
    to: &str,
) -> Result<Option<PathSummary>> {
    let mut params = Params::new();
    params.insert("from".into(), Value::from(from));
    params.insert("to".into(), Value::from(to));
    let mut paths: Vec<PathSummary> = rows(client, SHORTEST_PATH, &params).await?;
    Ok(if paths.is_empty() {
        None
    } else {
        Some(paths.swap_remove(0))
    })
}

/// Ten most connected users, teams and zones.
pub async fn most_connected(client: &GraphClient) -> Result<Vec<HubNode>> {
    rows(client, MOST_CONNECTED, &Params::new()).await
}

/// Creates name uniqueness constraints. Returns the statement count.
pub async fn initialize_schema(client: &GraphClient) -> Result<usize> {
    for statement in SCHEMA_STATEMENTS {
        client.execute(statement, &Params::new()).await?;
    }
    Ok(SCHEMA_STATEMENTS.len())
}

/// Deletes every node and relationship.
pub async fn clear_graph(client: &GraphClient) -> Result<()> {
    client.execute(CLEAR_GRAPH, &Params::new()).await?;
    Ok(())
}
