//! Writer facts: who sets a column's value, and how.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::catalog::RoutineKind;

/// The statement or constraint shape that sets a column.
///
/// Variant order doubles as the deterministic sort order within an index
/// entry.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WriterKind {
    Update,
    InsertSelect,
    InsertValues,
    MergeUpdate,
    MergeInsert,
    Trigger,
    Computed,
    Default,
    Dynamic,
}

impl WriterKind {
    /// Wire name, also used in edge labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Update => "UPDATE",
            Self::InsertSelect => "INSERT_SELECT",
            Self::InsertValues => "INSERT_VALUES",
            Self::MergeUpdate => "MERGE_UPDATE",
            Self::MergeInsert => "MERGE_INSERT",
            Self::Trigger => "TRIGGER",
            Self::Computed => "COMPUTED",
            Self::Default => "DEFAULT",
            Self::Dynamic => "DYNAMIC",
        }
    }

    /// Base confidence for writers of this kind.
    ///
    /// Declarative catalog facts score highest; statically matched DML scores
    /// high; the dynamic-SQL heuristic scores low. Only the ordering matters
    /// downstream.
    pub fn base_confidence(&self) -> f64 {
        match self {
            Self::Computed | Self::Default => 1.0,
            Self::Update | Self::MergeUpdate => 0.9,
            Self::InsertSelect | Self::InsertValues | Self::MergeInsert => 0.85,
            Self::Trigger => 0.8,
            Self::Dynamic => 0.25,
        }
    }
}

impl std::fmt::Display for WriterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reference to the routine a writer was found in.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "camelCase")]
pub struct RoutineRef {
    pub schema: String,
    pub name: String,
    pub kind: RoutineKind,
}

impl RoutineRef {
    pub fn qualified(&self) -> String {
        format!("{}.{}", self.schema, self.name)
    }
}

/// The (table, column) a writer targets.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "camelCase")]
pub struct ColumnTarget {
    pub schema: String,
    pub table: String,
    pub column: String,
}

impl ColumnTarget {
    pub fn qualified_table(&self) -> String {
        format!("{}.{}", self.schema, self.table)
    }
}

/// A detected statement or constraint that sets a column's value.
///
/// Writers are immutable once produced and belong to exactly one snapshot
/// generation (via the index entry that owns them).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Writer {
    pub target: ColumnTarget,
    pub kind: WriterKind,

    /// Source routine; absent for COMPUTED and DEFAULT writers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routine: Option<RoutineRef>,

    /// Assignment expression text; null for DYNAMIC writers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,

    /// Short multi-line excerpt around the match, for human review.
    pub excerpt: String,

    /// Confidence score in `[0, 1]`.
    pub confidence: f64,

    /// Convenience flag mirroring `kind == DYNAMIC`.
    pub is_dynamic: bool,

    /// Review note, e.g. for dynamic-SQL suspicions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,

    /// Tables referenced by the source query, for INSERT_SELECT / MERGE
    /// writers. Drives upstream expansion in the topology.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub source_tables: Vec<String>,
}

impl Writer {
    /// A writer backed by a computed-column expression.
    pub fn computed(target: ColumnTarget, expression: impl Into<String>) -> Self {
        let expression = expression.into();
        Self {
            target,
            kind: WriterKind::Computed,
            routine: None,
            expression: Some(expression.clone()),
            excerpt: expression,
            confidence: WriterKind::Computed.base_confidence(),
            is_dynamic: false,
            note: None,
            source_tables: Vec::new(),
        }
    }

    /// A writer backed by a default-constraint definition.
    pub fn default_constraint(target: ColumnTarget, definition: impl Into<String>) -> Self {
        let definition = definition.into();
        Self {
            target,
            kind: WriterKind::Default,
            routine: None,
            expression: Some(definition.clone()),
            excerpt: definition,
            confidence: WriterKind::Default.base_confidence(),
            is_dynamic: false,
            note: None,
            source_tables: Vec::new(),
        }
    }

    /// Sort key giving a deterministic writer order within an entry:
    /// catalog-fact writers (no routine) first, then by routine name, kind,
    /// and expression.
    pub(crate) fn sort_key(&self) -> (String, WriterKind, String) {
        (
            self.routine
                .as_ref()
                .map(|r| r.qualified().to_lowercase())
                .unwrap_or_default(),
            self.kind,
            self.expression.clone().unwrap_or_default(),
        )
    }
}

/// All writers known for one (table, column) under one snapshot generation.
///
/// Entries are built lazily, cached by key, and discarded (never mutated)
/// when a newer generation appears.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DependencyIndexEntry {
    pub schema: String,
    pub table: String,
    pub column: String,
    pub generation: u64,
    pub writers: Vec<Writer>,

    /// The fallback full scan hit its routine cap before finishing.
    pub scan_capped: bool,

    /// Dependency metadata produced no routine writers and a fallback full
    /// scan was used.
    pub fallback_scan: bool,
}

impl DependencyIndexEntry {
    /// Number of writers backed by a routine or trigger.
    pub fn routine_writer_count(&self) -> usize {
        self.writers.iter().filter(|w| w.routine.is_some()).count()
    }

    pub fn has_trigger_writer(&self) -> bool {
        self.writers.iter().any(|w| w.kind == WriterKind::Trigger)
    }

    pub fn has_dynamic_writer(&self) -> bool {
        self.writers.iter().any(|w| w.kind == WriterKind::Dynamic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target() -> ColumnTarget {
        ColumnTarget {
            schema: "dbo".into(),
            table: "Employees".into(),
            column: "Salary".into(),
        }
    }

    #[test]
    fn test_confidence_ordering_is_monotonic() {
        assert!(WriterKind::Computed.base_confidence() >= WriterKind::Update.base_confidence());
        assert!(WriterKind::Update.base_confidence() > WriterKind::Trigger.base_confidence());
        assert!(WriterKind::Trigger.base_confidence() > WriterKind::Dynamic.base_confidence());
    }

    #[test]
    fn test_computed_writer_shape() {
        let w = Writer::computed(target(), "[Base] + [Bonus]");
        assert_eq!(w.kind, WriterKind::Computed);
        assert!(w.routine.is_none());
        assert_eq!(w.expression.as_deref(), Some("[Base] + [Bonus]"));
        assert!(!w.is_dynamic);
    }

    #[test]
    fn test_catalog_fact_writers_sort_first() {
        let computed = Writer::computed(target(), "expr");
        let mut routine_backed = Writer::computed(target(), "expr");
        routine_backed.routine = Some(RoutineRef {
            schema: "dbo".into(),
            name: "usp_Load".into(),
            kind: RoutineKind::Procedure,
        });
        assert!(computed.sort_key() < routine_backed.sort_key());
    }
}
