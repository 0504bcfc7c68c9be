//! Renderers for OriginScope lineage results.
//!
//! Turns a [`PopulationResult`] into consumable formats: JSON (every field
//! preserved verbatim for transport layers), a Mermaid flowchart of the
//! topology graph, and a flat CSV of writer facts.

mod csv_export;
mod error;
mod json;
mod mermaid;

pub use csv_export::export_writers_csv;
pub use error::ExportError;
pub use json::export_json;
pub use mermaid::export_mermaid;

use originscope_core::PopulationResult;

/// Supported render formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    JsonCompact,
    Mermaid,
    Csv,
}

/// Render a population result in the requested format.
pub fn export(result: &PopulationResult, format: Format) -> Result<String, ExportError> {
    match format {
        Format::Json => export_json(result, false),
        Format::JsonCompact => export_json(result, true),
        Format::Mermaid => Ok(export_mermaid(&result.topology)),
        Format::Csv => export_writers_csv(result),
    }
}

// Shared fixtures for the renderer tests (must be at end of file)
#[cfg(test)]
pub(crate) mod test_fixtures {
    use originscope_core::{
        CatalogData, Column, DependencyEdge, LineageEngine, MemoryCatalogSource, ObjectRef,
        PopulationResult, ResolveOptions, RoutineDefinition, RoutineKind, Table,
    };

    /// A population result produced by a real engine run over a small
    /// in-memory catalog: one table, one column, one UPDATE writer.
    pub fn sample_result() -> PopulationResult {
        let data = CatalogData {
            tables: vec![Table {
                schema: "dbo".into(),
                name: "Employees".into(),
                is_base_table: true,
                row_count_estimate: 100,
            }],
            columns: vec![Column {
                table_schema: "dbo".into(),
                table_name: "Employees".into(),
                name: "Salary".into(),
                data_type: "money".into(),
                is_nullable: false,
                default_constraint: None,
                computed_expression: None,
            }],
            routines: vec![RoutineDefinition {
                schema: "dbo".into(),
                name: "usp_AdjustSalaries".into(),
                kind: RoutineKind::Procedure,
                definition: "UPDATE dbo.Employees SET Salary = Salary * 1.05".into(),
                parent_table: None,
            }],
            dependency_edges: vec![DependencyEdge {
                referencing: ObjectRef::new("dbo", "usp_AdjustSalaries"),
                referenced: ObjectRef::new("dbo", "Employees"),
            }],
            synonyms: vec![],
            jobs: vec![],
        };
        let engine = LineageEngine::new(Box::new(MemoryCatalogSource::new(data)));
        engine.refresh().expect("fixture refresh");
        engine
            .resolve_population("Salary", &ResolveOptions::default())
            .expect("fixture resolve")
    }
}
