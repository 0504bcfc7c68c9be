//! Types for the column population lineage API.
//!
//! This module defines the catalog entities pulled from the data source, the
//! writer facts produced by detection, and the request/response types exposed
//! to the transport layer. The transport layer is expected to preserve every
//! field of the response types verbatim.

mod catalog;
mod request;
mod response;
mod writer;

// Re-export all public types
pub use catalog::{
    CatalogData, Column, DependencyEdge, JobInfo, ObjectRef, RoutineDefinition, RoutineKind,
    SnapshotCounts, Synonym, Table,
};
pub use request::{EngineConfig, ResolveOptions, MAX_LINEAGE_DEPTH};
pub use response::{
    EdgeRelation, NodeKind, PopulationResult, RefreshOutcome, ResultFlag, TableMatch,
    TopologyEdge, TopologyGraph, TopologyNode,
};
pub use writer::{ColumnTarget, DependencyIndexEntry, RoutineRef, Writer, WriterKind};
