//! The lineage engine facade.
//!
//! Holds the catalog source, the active snapshot, and the dependency-index
//! cache, and exposes the four operations the transport layer dispatches to:
//! `refresh`, `find_tables_with_column`, `resolve_population`, and
//! `get_dependency_entry`. Every fact in a single response comes from one
//! snapshot generation.

use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::EngineError;
use crate::index::DependencyIndex;
use crate::locate;
use crate::snapshot::{CatalogSnapshot, CatalogSource, SnapshotStore};
use crate::topology::build_topology;
use crate::types::{
    ColumnTarget, DependencyIndexEntry, EngineConfig, PopulationResult, RefreshOutcome,
    ResolveOptions, ResultFlag, TableMatch,
};

pub struct LineageEngine {
    config: EngineConfig,
    source: Box<dyn CatalogSource>,
    store: SnapshotStore,
    index: DependencyIndex,
}

impl LineageEngine {
    /// Engine with default configuration. Starts on an empty generation-zero
    /// snapshot; call [`refresh`](Self::refresh) to load the catalog.
    pub fn new(source: Box<dyn CatalogSource>) -> Self {
        Self::with_config(source, EngineConfig::default())
    }

    pub fn with_config(source: Box<dyn CatalogSource>, config: EngineConfig) -> Self {
        Self {
            config,
            source,
            store: SnapshotStore::new(),
            index: DependencyIndex::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The currently active snapshot. The returned `Arc` stays valid across
    /// concurrent refreshes.
    pub fn snapshot(&self) -> Arc<CatalogSnapshot> {
        self.store.current()
    }

    /// Pull a full catalog from the source and atomically publish it as a
    /// new generation. On failure the previous snapshot stays active and the
    /// generation counter does not advance.
    pub fn refresh(&self) -> Result<RefreshOutcome, EngineError> {
        let data = self.source.load()?;
        let refreshed_at = Utc::now();
        let snapshot = self.store.swap_in(data, refreshed_at);
        self.index.evict_older_than(snapshot.generation());
        info!(
            generation = snapshot.generation(),
            tables = snapshot.counts().tables,
            routines = snapshot.counts().routines,
            triggers = snapshot.counts().triggers,
            "catalog snapshot refreshed"
        );
        Ok(RefreshOutcome {
            generation: snapshot.generation(),
            refreshed_at,
            counts: snapshot.counts().clone(),
        })
    }

    /// Exact case-insensitive column search across the active snapshot.
    pub fn find_tables_with_column(&self, column: &str, base_tables_only: bool) -> Vec<TableMatch> {
        let snapshot = self.snapshot();
        locate::find_tables_with_column(&snapshot, column, base_tables_only)
    }

    /// Raw index entry for an explicit (table, column).
    pub fn get_dependency_entry(
        &self,
        table: &str,
        column: &str,
    ) -> Result<Arc<DependencyIndexEntry>, EngineError> {
        let snapshot = self.snapshot();
        let resolved = snapshot
            .lookup_table(table)
            .ok_or_else(|| EngineError::TableNotFound(table.to_string()))?;
        let resolved_column = snapshot.lookup_column(resolved, column).ok_or_else(|| {
            EngineError::ColumnNotFound {
                table: resolved.qualified(),
                column: column.to_string(),
            }
        })?;
        Ok(self
            .index
            .entry(&snapshot, resolved, resolved_column, &self.config))
    }

    /// Resolve which table a column belongs to, gather its writers, and
    /// build the lineage topology.
    pub fn resolve_population(
        &self,
        column: &str,
        options: &ResolveOptions,
    ) -> Result<PopulationResult, EngineError> {
        let column = column.trim();
        if column.is_empty() {
            return Err(EngineError::InvalidRequest(
                "column name must not be empty".to_string(),
            ));
        }

        let snapshot = self.snapshot();
        let hint = options.hint.as_deref();

        let mut alternatives: Vec<TableMatch> = Vec::new();
        let mut ambiguous = false;

        let chosen = if let Some(name) = &options.table {
            snapshot
                .lookup_table(name)
                .ok_or_else(|| EngineError::TableNotFound(name.clone()))?
        } else {
            let candidates = snapshot.tables_with_column(column, true);
            match candidates.len() {
                0 => return Err(EngineError::NoTableWithColumn(column.to_string())),
                1 => candidates[0],
                _ => {
                    let mut ranked = Vec::with_capacity(candidates.len());
                    for table in &candidates {
                        let col = snapshot
                            .lookup_column(table, column)
                            .expect("candidate tables carry the column");
                        let entry = self.index.entry(&snapshot, table, col, &self.config);
                        ranked.push(locate::RankedCandidate {
                            table: TableMatch {
                                schema: table.schema.clone(),
                                table: table.name.clone(),
                                is_base_table: table.is_base_table,
                            },
                            score: locate::score_candidate(
                                &entry,
                                table.row_count_estimate,
                                &table.qualified(),
                                hint,
                            ),
                        });
                    }
                    let ranking = locate::rank_candidates(ranked, &self.config.default_schema);
                    ambiguous = ranking.ambiguous;
                    alternatives = ranking
                        .ordered
                        .iter()
                        .skip(1)
                        .map(|c| c.table.clone())
                        .collect();
                    let winner = &ranking.ordered[0].table;
                    debug!(
                        column,
                        chosen = %winner.qualified(),
                        alternatives = alternatives.len(),
                        ambiguous,
                        "disambiguated column across candidate tables"
                    );
                    snapshot
                        .lookup_table(&winner.qualified())
                        .expect("ranked winner exists in snapshot")
                }
            }
        };

        let resolved_column = snapshot.lookup_column(chosen, column).ok_or_else(|| {
            EngineError::ColumnNotFound {
                table: chosen.qualified(),
                column: column.to_string(),
            }
        })?;

        let entry = self
            .index
            .entry(&snapshot, chosen, resolved_column, &self.config);
        let effective_max_depth = self.config.effective_depth(options.max_depth);
        let topology = build_topology(
            &snapshot,
            &self.index,
            &self.config,
            chosen,
            resolved_column,
            &entry,
            effective_max_depth,
        );

        let mut flags = Vec::new();
        let mut notes = Vec::new();
        if entry.has_dynamic_writer() {
            flags.push(ResultFlag::DynamicSqlSuspected);
            notes.push(
                "a writer uses dynamic SQL; its expression could not be statically resolved and needs manual review"
                    .to_string(),
            );
        }
        if entry.fallback_scan {
            flags.push(ResultFlag::DependencyFallbackScan);
            notes.push(
                "dependency metadata produced no writers; routine definitions were scanned directly"
                    .to_string(),
            );
        }
        if entry.scan_capped {
            flags.push(ResultFlag::ScanCapped);
            notes.push(format!(
                "routine scan stopped at the configured cap of {}; the writer list may be incomplete",
                self.config.max_routine_scan
            ));
        }
        if topology.depth_capped {
            flags.push(ResultFlag::UpstreamDepthCapped);
            notes.push(format!(
                "upstream expansion stopped at depth {effective_max_depth}; the graph may be incomplete"
            ));
        }

        Ok(PopulationResult {
            target: ColumnTarget {
                schema: chosen.schema.clone(),
                table: chosen.name.clone(),
                column: resolved_column.name.clone(),
            },
            generation: snapshot.generation(),
            writers: entry.writers.clone(),
            computed_column: resolved_column.computed_expression.clone(),
            default_constraint: resolved_column.default_constraint.clone(),
            topology,
            alternatives,
            ambiguous,
            flags,
            notes,
            effective_max_depth,
        })
    }
}
