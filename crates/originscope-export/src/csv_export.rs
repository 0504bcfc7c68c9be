use csv::WriterBuilder;
use originscope_core::PopulationResult;

use crate::ExportError;

/// Flatten a result's writers into CSV, one row per writer.
pub fn export_writers_csv(result: &PopulationResult) -> Result<String, ExportError> {
    let mut writer = WriterBuilder::new()
        .has_headers(true)
        .from_writer(Vec::new());

    writer
        .write_record([
            "Schema",
            "Table",
            "Column",
            "Kind",
            "Routine",
            "Expression",
            "Confidence",
            "Dynamic",
            "Source Tables",
        ])
        .map_err(|err| ExportError::Csv(err.to_string()))?;

    for entry in &result.writers {
        writer
            .write_record([
                entry.target.schema.clone(),
                entry.target.table.clone(),
                entry.target.column.clone(),
                entry.kind.as_str().to_string(),
                entry
                    .routine
                    .as_ref()
                    .map(|r| r.qualified())
                    .unwrap_or_default(),
                entry.expression.clone().unwrap_or_default(),
                format!("{:.2}", entry.confidence),
                entry.is_dynamic.to_string(),
                entry.source_tables.join(", "),
            ])
            .map_err(|err| ExportError::Csv(err.to_string()))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|err| ExportError::Csv(err.to_string()))?;
    String::from_utf8(bytes).map_err(|err| ExportError::Csv(err.to_string()))
}
