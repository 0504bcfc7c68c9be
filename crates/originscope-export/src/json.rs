use originscope_core::PopulationResult;

use crate::ExportError;

/// Serialize a result to JSON, preserving every field verbatim.
pub fn export_json(result: &PopulationResult, compact: bool) -> Result<String, ExportError> {
    if compact {
        serde_json::to_string(result).map_err(|err| ExportError::Serialization(err.to_string()))
    } else {
        serde_json::to_string_pretty(result)
            .map_err(|err| ExportError::Serialization(err.to_string()))
    }
}
