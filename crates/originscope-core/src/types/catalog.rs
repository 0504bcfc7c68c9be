//! Catalog entities pulled from the data source during a refresh.
//!
//! These are the raw facts a [`crate::snapshot::CatalogSource`] returns. The
//! snapshot builder turns them into lookup indexes; after that they are
//! immutable for the lifetime of the generation.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A schema-qualified object name.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "camelCase")]
pub struct ObjectRef {
    pub schema: String,
    pub name: String,
}

impl ObjectRef {
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
        }
    }

    /// Dotted `schema.name` form.
    pub fn qualified(&self) -> String {
        format!("{}.{}", self.schema, self.name)
    }

    /// Lowercase lookup key.
    pub fn key(&self) -> (String, String) {
        (self.schema.to_lowercase(), self.name.to_lowercase())
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.name)
    }
}

/// A table known to the catalog.
///
/// Identity is `(schema, name)`; `row_count_estimate` is a hint from the
/// source's statistics, not an exact count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    pub schema: String,
    pub name: String,
    pub is_base_table: bool,
    #[serde(default)]
    pub row_count_estimate: u64,
}

impl Table {
    pub fn qualified(&self) -> String {
        format!("{}.{}", self.schema, self.name)
    }

    /// Lowercase lookup key.
    pub fn key(&self) -> (String, String) {
        (self.schema.to_lowercase(), self.name.to_lowercase())
    }
}

/// A column of a catalog table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub table_schema: String,
    pub table_name: String,
    pub name: String,
    pub data_type: String,
    pub is_nullable: bool,

    /// Default-constraint text, when one exists.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_constraint: Option<String>,

    /// Computed-column expression, when the column is computed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub computed_expression: Option<String>,
}

/// The kind of a stored routine.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum RoutineKind {
    Procedure,
    View,
    Function,
    Trigger,
}

impl RoutineKind {
    /// Whether routines of this kind can contain DML that writes tables.
    pub fn can_write(&self) -> bool {
        matches!(self, Self::Procedure | Self::Function | Self::Trigger)
    }
}

/// A stored routine with its full source text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutineDefinition {
    pub schema: String,
    pub name: String,
    pub kind: RoutineKind,
    pub definition: String,

    /// The owning table, for triggers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_table: Option<ObjectRef>,
}

impl RoutineDefinition {
    pub fn qualified(&self) -> String {
        format!("{}.{}", self.schema, self.name)
    }

    /// Lowercase lookup key.
    pub fn key(&self) -> (String, String) {
        (self.schema.to_lowercase(), self.name.to_lowercase())
    }
}

/// An alias object pointing at a base table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Synonym {
    pub schema: String,
    pub name: String,
    pub base_schema: String,
    pub base_name: String,
}

impl Synonym {
    pub fn qualified(&self) -> String {
        format!("{}.{}", self.schema, self.name)
    }

    /// Lowercase key of the synonym itself.
    pub fn key(&self) -> (String, String) {
        (self.schema.to_lowercase(), self.name.to_lowercase())
    }

    /// Lowercase key of the base object the synonym points at.
    pub fn base_key(&self) -> (String, String) {
        (self.base_schema.to_lowercase(), self.base_name.to_lowercase())
    }
}

/// A dependency edge: a routine referencing another object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyEdge {
    /// The routine that holds the reference.
    pub referencing: ObjectRef,
    /// The object being referenced (usually a table or synonym).
    pub referenced: ObjectRef,
}

/// Point-in-time facts about a scheduled job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobInfo {
    pub name: String,
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_run: Option<DateTime<Utc>>,
}

/// Everything a [`crate::snapshot::CatalogSource`] hands over in one pull.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogData {
    pub tables: Vec<Table>,
    pub columns: Vec<Column>,
    pub routines: Vec<RoutineDefinition>,
    pub dependency_edges: Vec<DependencyEdge>,
    pub synonyms: Vec<Synonym>,
    pub jobs: Vec<JobInfo>,
}

/// Entity counts for a built snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotCounts {
    pub tables: usize,
    pub columns: usize,
    pub routines: usize,
    pub triggers: usize,
    pub dependency_edges: usize,
    pub synonyms: usize,
    pub jobs: usize,
}
