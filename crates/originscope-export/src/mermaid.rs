use originscope_core::{NodeKind, TopologyGraph};

/// Render a topology graph as a Mermaid flowchart.
///
/// Tables are rectangles, procedures are stadiums, triggers are hexagons.
/// Nodes flagged as cycles get a `(cycle)` suffix. Output is deterministic
/// because the graph's nodes and edges are already sorted.
pub fn export_mermaid(graph: &TopologyGraph) -> String {
    let mut lines = vec!["flowchart LR".to_string()];

    for node in &graph.nodes {
        let id = sanitize_id(&node.id);
        let mut label = escape_label(&node.qualified_name);
        if node.is_cycle {
            label.push_str(" (cycle)");
        }
        let shape = match node.kind {
            NodeKind::Table => format!("    {id}[\"{label}\"]"),
            NodeKind::Procedure => format!("    {id}([\"{label}\"])"),
            NodeKind::Trigger => format!("    {id}{{{{\"{label}\"}}}}"),
        };
        lines.push(shape);
    }

    for edge in &graph.edges {
        let from = sanitize_id(&edge.from);
        let to = sanitize_id(&edge.to);
        let label = escape_label(&edge.label);
        lines.push(format!("    {from} -- \"{label}\" --> {to}"));
    }

    lines.join("\n")
}

fn sanitize_id(id: &str) -> String {
    id.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

fn escape_label(label: &str) -> String {
    label.replace('"', "\\\"").replace('\n', " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::sample_result;

    #[test]
    fn test_mermaid_renders_nodes_and_edges() {
        let result = sample_result();
        let diagram = export_mermaid(&result.topology);

        assert!(diagram.starts_with("flowchart LR"));
        assert!(diagram.contains("dbo.Employees"));
        assert!(diagram.contains("dbo.usp_AdjustSalaries"));
        assert!(diagram.contains("-- \"UPDATE Salary\" -->"));
        // table is a rectangle, procedure a stadium
        assert!(diagram.contains("[\"dbo.Employees\"]"));
        assert!(diagram.contains("([\"dbo.usp_AdjustSalaries\"])"));
    }

    #[test]
    fn test_mermaid_is_deterministic() {
        let a = export_mermaid(&sample_result().topology);
        let b = export_mermaid(&sample_result().topology);
        assert_eq!(a, b);
    }

    #[test]
    fn test_label_escaping() {
        assert_eq!(escape_label("a\"b\nc"), "a\\\"b c");
        assert_eq!(sanitize_id("table_0123abcd"), "table_0123abcd");
        assert_eq!(sanitize_id("a-b.c"), "a_b_c");
    }
}
