//! Engine configuration and per-request options.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Hard ceiling on upstream traversal depth, enforced regardless of
/// configuration.
pub const MAX_LINEAGE_DEPTH: usize = 10;

/// Engine-wide configuration.
///
/// Every unbounded-looking operation is capped by one of these knobs so no
/// single request can run indefinitely.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Schema preferred during disambiguation.
    pub default_schema: String,

    /// Maximum number of routines the fallback full scan will read.
    pub max_routine_scan: usize,

    /// Default upstream traversal depth when a request does not specify one.
    pub default_max_depth: usize,

    /// Context radius, in bytes, for writer excerpts.
    pub excerpt_context: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_schema: "dbo".to_string(),
            max_routine_scan: 3000,
            default_max_depth: 5,
            excerpt_context: 160,
        }
    }
}

impl EngineConfig {
    /// Resolve a requested depth against the default and the hard ceiling.
    ///
    /// Requests above [`MAX_LINEAGE_DEPTH`] are clamped, not rejected.
    pub fn effective_depth(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.default_max_depth)
            .clamp(1, MAX_LINEAGE_DEPTH)
    }
}

/// Options for a population resolution request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ResolveOptions {
    /// Explicit table (bare, qualified, or synonym name). Skips
    /// disambiguation entirely.
    pub table: Option<String>,

    /// Free text used for token-overlap scoring when several tables match.
    pub hint: Option<String>,

    /// Upstream traversal depth for this request.
    pub max_depth: Option<usize>,
}
