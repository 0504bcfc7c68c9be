//! Response types exposed to the transport layer.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::catalog::SnapshotCounts;
use super::writer::{ColumnTarget, Writer, WriterKind};

/// Result of a successful catalog refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshOutcome {
    /// The new active generation.
    pub generation: u64,
    pub refreshed_at: DateTime<Utc>,
    pub counts: SnapshotCounts,
}

/// One table that carries a requested column.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "camelCase")]
pub struct TableMatch {
    pub schema: String,
    pub table: String,
    pub is_base_table: bool,
}

impl TableMatch {
    pub fn qualified(&self) -> String {
        format!("{}.{}", self.schema, self.table)
    }
}

/// Node category in a topology graph.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Table,
    Procedure,
    Trigger,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Table => "table",
            Self::Procedure => "procedure",
            Self::Trigger => "trigger",
        }
    }
}

/// Edge category in a topology graph.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum EdgeRelation {
    /// Routine or trigger writes into a table.
    Writes,
    /// Upstream table feeds a routine's source query.
    Feeds,
}

impl EdgeRelation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Writes => "writes",
            Self::Feeds => "feeds",
        }
    }
}

/// A node in the lineage topology.
///
/// Ids are content-addressed hashes of `(kind, qualified name)`, so the same
/// lineage state always yields the same id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TopologyNode {
    pub id: String,
    pub kind: NodeKind,
    /// Short display name.
    pub label: String,
    pub qualified_name: String,
    /// Set when upstream traversal revisited this node and truncated the
    /// branch there.
    pub is_cycle: bool,
}

/// An edge in the lineage topology.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TopologyEdge {
    pub id: String,
    pub from: String,
    pub to: String,
    pub relation: EdgeRelation,
    /// Statement kind of the writer this edge represents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statement_kind: Option<WriterKind>,
    /// Column being populated along this edge.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    pub label: String,
}

/// A rendered lineage graph.
///
/// Nodes and edges are sorted after traversal, so identical lineage state
/// serializes byte-identically regardless of traversal order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TopologyGraph {
    pub nodes: Vec<TopologyNode>,
    pub edges: Vec<TopologyEdge>,
    /// Upstream expansion stopped at the depth cap before exhausting
    /// sources.
    pub depth_capped: bool,
}

/// Advisory conditions surfaced on a result, never as errors.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "camelCase")]
pub enum ResultFlag {
    /// A DYNAMIC writer was produced; its expression is unresolved.
    DynamicSqlSuspected,
    /// No dependency metadata matched; a fallback full scan was used.
    DependencyFallbackScan,
    /// The fallback scan hit its routine cap; the result is partial.
    ScanCapped,
    /// Upstream traversal hit the depth cap; the graph is partial.
    UpstreamDepthCapped,
}

/// Full answer to "where does this column get populated?".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PopulationResult {
    /// The chosen (table, column).
    pub target: ColumnTarget,

    /// Snapshot generation every fact in this result came from.
    pub generation: u64,

    pub writers: Vec<Writer>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub computed_column: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_constraint: Option<String>,

    pub topology: TopologyGraph,

    /// Other candidate tables, in ranked order. Non-empty whenever the
    /// column matched more than one table.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alternatives: Vec<TableMatch>,

    /// True when the top candidates tied on every ranking criterion and the
    /// chosen table fell back to the deterministic name order.
    pub ambiguous: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flags: Vec<ResultFlag>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,

    pub effective_max_depth: usize,
}
