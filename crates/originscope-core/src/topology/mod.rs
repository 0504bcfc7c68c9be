//! Topology builder: turns a resolved lineage into a node/edge graph.
//!
//! Node and edge ids are content-addressed hashes of `(kind, qualified
//! name)`, and both collections are sorted after traversal, so the same
//! lineage state always serializes to a byte-identical graph regardless of
//! traversal order. Upstream expansion follows `Writer.source_tables` for
//! INSERT_SELECT / MERGE writers, recursing on the same column name with a
//! per-path visited set: revisiting a table truncates that branch and marks
//! the repeated node as a cycle.

use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

use crate::index::DependencyIndex;
use crate::snapshot::CatalogSnapshot;
use crate::types::{
    Column, DependencyIndexEntry, EdgeRelation, EngineConfig, NodeKind, Table, TopologyEdge,
    TopologyGraph, TopologyNode, WriterKind,
};

/// Generate a deterministic node id from kind and qualified name.
fn node_id(kind: NodeKind, qualified_name: &str) -> String {
    let mut hasher = DefaultHasher::new();
    kind.as_str().hash(&mut hasher);
    qualified_name.hash(&mut hasher);
    format!("{}_{:016x}", kind.as_str(), hasher.finish())
}

/// Generate a deterministic edge id.
fn edge_id(from: &str, to: &str, relation: EdgeRelation, label: &str) -> String {
    let mut hasher = DefaultHasher::new();
    from.hash(&mut hasher);
    to.hash(&mut hasher);
    relation.as_str().hash(&mut hasher);
    label.hash(&mut hasher);
    format!("edge_{:016x}", hasher.finish())
}

#[derive(Default)]
struct GraphAccum {
    nodes: BTreeMap<String, TopologyNode>,
    edges: BTreeMap<String, TopologyEdge>,
    depth_capped: bool,
}

impl GraphAccum {
    fn add_node(&mut self, kind: NodeKind, label: &str, qualified_name: &str) -> String {
        let id = node_id(kind, qualified_name);
        self.nodes.entry(id.clone()).or_insert_with(|| TopologyNode {
            id: id.clone(),
            kind,
            label: label.to_string(),
            qualified_name: qualified_name.to_string(),
            is_cycle: false,
        });
        id
    }

    fn mark_cycle(&mut self, id: &str) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.is_cycle = true;
        }
    }

    fn add_edge(
        &mut self,
        from: &str,
        to: &str,
        relation: EdgeRelation,
        statement_kind: Option<WriterKind>,
        column: Option<String>,
    ) {
        let label = match (&statement_kind, &column) {
            (Some(kind), Some(column)) => format!("{} {}", kind.as_str(), column),
            _ => relation.as_str().to_string(),
        };
        let id = edge_id(from, to, relation, &label);
        self.edges.entry(id.clone()).or_insert_with(|| TopologyEdge {
            id,
            from: from.to_string(),
            to: to.to_string(),
            relation,
            statement_kind,
            column,
            label,
        });
    }
}

/// Build the lineage graph for a resolved (table, column) and its index
/// entry. `max_depth` bounds upstream expansion; level 1 is the direct
/// writers only.
pub fn build_topology(
    snapshot: &CatalogSnapshot,
    index: &DependencyIndex,
    config: &EngineConfig,
    table: &Table,
    column: &Column,
    entry: &DependencyIndexEntry,
    max_depth: usize,
) -> TopologyGraph {
    let mut acc = GraphAccum::default();
    let mut path = vec![table.key()];
    expand(
        &mut acc, snapshot, index, config, table, column, entry, max_depth, &mut path,
    );

    let mut nodes: Vec<TopologyNode> = acc.nodes.into_values().collect();
    nodes.sort_by(|a, b| {
        (a.kind, &a.qualified_name)
            .cmp(&(b.kind, &b.qualified_name))
    });
    let mut edges: Vec<TopologyEdge> = acc.edges.into_values().collect();
    edges.sort_by(|a, b| {
        (&a.from, &a.to, a.relation, &a.label).cmp(&(&b.from, &b.to, b.relation, &b.label))
    });

    TopologyGraph {
        nodes,
        edges,
        depth_capped: acc.depth_capped,
    }
}

#[allow(clippy::too_many_arguments)]
fn expand(
    acc: &mut GraphAccum,
    snapshot: &CatalogSnapshot,
    index: &DependencyIndex,
    config: &EngineConfig,
    table: &Table,
    column: &Column,
    entry: &DependencyIndexEntry,
    depth_remaining: usize,
    path: &mut Vec<(String, String)>,
) {
    let table_id = acc.add_node(NodeKind::Table, &table.name, &table.qualified());

    for writer in &entry.writers {
        let Some(routine) = &writer.routine else {
            continue;
        };
        let routine_kind = if writer.kind == WriterKind::Trigger {
            NodeKind::Trigger
        } else {
            NodeKind::Procedure
        };
        let routine_id = acc.add_node(routine_kind, &routine.name, &routine.qualified());
        acc.add_edge(
            &routine_id,
            &table_id,
            EdgeRelation::Writes,
            Some(writer.kind),
            Some(column.name.clone()),
        );

        if writer.source_tables.is_empty()
            || !matches!(
                writer.kind,
                WriterKind::InsertSelect | WriterKind::MergeUpdate | WriterKind::MergeInsert
            )
        {
            continue;
        }
        if depth_remaining <= 1 {
            acc.depth_capped = true;
            continue;
        }

        for source_name in &writer.source_tables {
            let Some(source_table) = snapshot.lookup_table(source_name) else {
                continue;
            };
            let source_key = source_table.key();
            let source_id =
                acc.add_node(NodeKind::Table, &source_table.name, &source_table.qualified());
            acc.add_edge(
                &source_id,
                &routine_id,
                EdgeRelation::Feeds,
                Some(writer.kind),
                Some(column.name.clone()),
            );
            if path.contains(&source_key) {
                acc.mark_cycle(&source_id);
                continue;
            }
            let Some(source_column) = snapshot.lookup_column(source_table, &column.name) else {
                continue;
            };
            let sub_entry = index.entry(snapshot, source_table, source_column, config);
            path.push(source_key);
            expand(
                acc,
                snapshot,
                index,
                config,
                source_table,
                source_column,
                &sub_entry,
                depth_remaining - 1,
                path,
            );
            path.pop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CatalogData, DependencyEdge, ObjectRef, RoutineDefinition, RoutineKind};
    use chrono::Utc;

    fn table(schema: &str, name: &str) -> Table {
        Table {
            schema: schema.into(),
            name: name.into(),
            is_base_table: true,
            row_count_estimate: 0,
        }
    }

    fn column(schema: &str, table: &str, name: &str) -> Column {
        Column {
            table_schema: schema.into(),
            table_name: table.into(),
            name: name.into(),
            data_type: "money".into(),
            is_nullable: true,
            default_constraint: None,
            computed_expression: None,
        }
    }

    fn procedure(schema: &str, name: &str, definition: &str) -> RoutineDefinition {
        RoutineDefinition {
            schema: schema.into(),
            name: name.into(),
            kind: RoutineKind::Procedure,
            definition: definition.into(),
            parent_table: None,
        }
    }

    fn edge(proc_schema: &str, proc_name: &str, table_schema: &str, table_name: &str) -> DependencyEdge {
        DependencyEdge {
            referencing: ObjectRef::new(proc_schema, proc_name),
            referenced: ObjectRef::new(table_schema, table_name),
        }
    }

    fn build(data: CatalogData, max_depth: usize) -> TopologyGraph {
        let snapshot = CatalogSnapshot::build(data, 1, Utc::now());
        let index = DependencyIndex::new();
        let config = EngineConfig::default();
        let t = snapshot.lookup_table("dbo.Employees").unwrap();
        let c = snapshot.lookup_column(t, "Salary").unwrap();
        let entry = index.entry(&snapshot, t, c, &config);
        build_topology(&snapshot, &index, &config, t, c, &entry, max_depth)
    }

    fn single_writer_data() -> CatalogData {
        CatalogData {
            tables: vec![table("dbo", "Employees")],
            columns: vec![column("dbo", "Employees", "Salary")],
            routines: vec![procedure(
                "dbo",
                "usp_Adjust",
                "UPDATE dbo.Employees SET Salary = Salary * 1.1",
            )],
            dependency_edges: vec![edge("dbo", "usp_Adjust", "dbo", "Employees")],
            synonyms: vec![],
            jobs: vec![],
        }
    }

    fn cyclic_data() -> CatalogData {
        CatalogData {
            tables: vec![table("dbo", "Employees"), table("staging", "Pay")],
            columns: vec![
                column("dbo", "Employees", "Salary"),
                column("dbo", "Employees", "Id"),
                column("staging", "Pay", "Salary"),
                column("staging", "Pay", "Id"),
            ],
            routines: vec![
                procedure(
                    "dbo",
                    "usp_LoadEmployees",
                    "INSERT INTO dbo.Employees (Id, Salary) SELECT Id, Salary FROM staging.Pay",
                ),
                procedure(
                    "staging",
                    "usp_LoadPay",
                    "INSERT INTO staging.Pay (Id, Salary) SELECT Id, Salary FROM dbo.Employees",
                ),
            ],
            dependency_edges: vec![
                edge("dbo", "usp_LoadEmployees", "dbo", "Employees"),
                edge("staging", "usp_LoadPay", "staging", "Pay"),
            ],
            synonyms: vec![],
            jobs: vec![],
        }
    }

    #[test]
    fn test_single_writer_has_two_nodes_one_edge() {
        let graph = build(single_writer_data(), 5);
        assert_eq!(graph.nodes.len(), 2);
        assert_eq!(graph.edges.len(), 1);
        let edge = &graph.edges[0];
        assert_eq!(edge.relation, EdgeRelation::Writes);
        assert_eq!(edge.statement_kind, Some(WriterKind::Update));
        assert_eq!(edge.column.as_deref(), Some("Salary"));
        assert_eq!(edge.label, "UPDATE Salary");
    }

    #[test]
    fn test_graph_is_byte_identical_across_builds() {
        let first = build(single_writer_data(), 5);
        let second = build(single_writer_data(), 5);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_upstream_expansion_adds_source_table() {
        let graph = build(cyclic_data(), 2);
        let names: Vec<&str> = graph
            .nodes
            .iter()
            .map(|n| n.qualified_name.as_str())
            .collect();
        assert!(names.contains(&"staging.Pay"));
        assert!(graph
            .edges
            .iter()
            .any(|e| e.relation == EdgeRelation::Feeds));
    }

    #[test]
    fn test_cycle_is_marked_and_terminates() {
        let graph = build(cyclic_data(), 8);
        let employees = graph
            .nodes
            .iter()
            .find(|n| n.qualified_name == "dbo.Employees")
            .unwrap();
        assert!(employees.is_cycle);
        assert!(!graph.depth_capped);
    }

    #[test]
    fn test_depth_cap_truncates_and_flags() {
        let graph = build(cyclic_data(), 1);
        assert!(graph.depth_capped);
        let names: Vec<&str> = graph
            .nodes
            .iter()
            .map(|n| n.qualified_name.as_str())
            .collect();
        assert!(!names.contains(&"staging.Pay"));
    }

    #[test]
    fn test_node_ids_are_stable_hashes() {
        let a = node_id(NodeKind::Table, "dbo.Employees");
        let b = node_id(NodeKind::Table, "dbo.Employees");
        let c = node_id(NodeKind::Procedure, "dbo.Employees");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.starts_with("table_"));
    }
}
