//! Column population lineage and discovery engine.
//!
//! Given a column, OriginScope discovers which stored routines, triggers,
//! computed-column expressions, and default constraints populate it, and
//! renders the result as a deterministic node/edge topology. Detection is
//! static: routine text is scanned lexically, never executed, and the target
//! database is never mutated.
//!
//! The engine works against an immutable, versioned [`CatalogSnapshot`]
//! pulled from a [`CatalogSource`]. Refresh swaps the active snapshot
//! atomically; every fact in a single response comes from one generation.

pub mod detector;
pub mod engine;
pub mod error;
pub mod index;
pub mod locate;
pub mod snapshot;
pub mod topology;
pub mod types;
mod upstream;

// Re-export main entry points
pub use detector::{detect_writers, DetectTarget, Detection};
pub use engine::LineageEngine;
pub use error::{EngineError, SourceError};
pub use index::DependencyIndex;
pub use snapshot::{CatalogSnapshot, CatalogSource, MemoryCatalogSource};
pub use topology::build_topology;

// Re-export types explicitly
pub use types::{
    CatalogData,
    Column,
    ColumnTarget,
    DependencyEdge,
    DependencyIndexEntry,
    EdgeRelation,
    EngineConfig,
    JobInfo,
    NodeKind,
    ObjectRef,
    PopulationResult,
    RefreshOutcome,
    ResolveOptions,
    ResultFlag,
    RoutineDefinition,
    RoutineKind,
    RoutineRef,
    SnapshotCounts,
    Synonym,
    Table,
    TableMatch,
    TopologyEdge,
    TopologyGraph,
    TopologyNode,
    Writer,
    WriterKind,
    MAX_LINEAGE_DEPTH,
};
