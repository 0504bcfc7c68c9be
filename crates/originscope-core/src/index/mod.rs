//! Reverse dependency index: all writers for a (table, column), built
//! lazily and cached per snapshot generation.
//!
//! Candidate routines come from the snapshot's dependency edges for the
//! table and its synonyms. When those candidates produce no routine writers,
//! the index falls back to scanning all routine definitions, capped at
//! [`crate::types::EngineConfig::max_routine_scan`]; hitting the cap marks
//! the entry partial rather than silently omitting anything.
//!
//! Cache entries are keyed by `(schema, table, column, generation)` and
//! inserted independently per key, so building one entry never blocks
//! lookups of unrelated keys. A new generation invalidates by key; entries
//! are never mutated in place.

use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::detector::{detect_writers, DetectTarget};
use crate::snapshot::CatalogSnapshot;
use crate::types::{
    Column, ColumnTarget, DependencyIndexEntry, EngineConfig, RoutineDefinition, RoutineRef,
    Table, Writer, WriterKind,
};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct IndexKey {
    schema: String,
    table: String,
    column: String,
    generation: u64,
}

/// Per-(table, column, generation) writer cache.
#[derive(Default)]
pub struct DependencyIndex {
    cache: DashMap<IndexKey, Arc<DependencyIndexEntry>>,
}

impl DependencyIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or build the entry for `(table, column)` under the snapshot's
    /// generation.
    pub fn entry(
        &self,
        snapshot: &CatalogSnapshot,
        table: &Table,
        column: &Column,
        config: &EngineConfig,
    ) -> Arc<DependencyIndexEntry> {
        let key = IndexKey {
            schema: table.schema.to_lowercase(),
            table: table.name.to_lowercase(),
            column: column.name.to_lowercase(),
            generation: snapshot.generation(),
        };
        if let Some(entry) = self.cache.get(&key) {
            return entry.clone();
        }
        let built = Arc::new(build_entry(snapshot, table, column, config));
        self.cache.entry(key).or_insert(built).clone()
    }

    /// Drop entries from generations older than `generation`.
    pub fn evict_older_than(&self, generation: u64) {
        self.cache.retain(|key, _| key.generation >= generation);
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

fn build_entry(
    snapshot: &CatalogSnapshot,
    table: &Table,
    column: &Column,
    config: &EngineConfig,
) -> DependencyIndexEntry {
    let target = ColumnTarget {
        schema: table.schema.clone(),
        table: table.name.clone(),
        column: column.name.clone(),
    };

    let synonym_names: Vec<String> = snapshot
        .synonyms_for(table)
        .iter()
        .flat_map(|s| [s.name.clone(), s.qualified()])
        .collect();
    let detect_target = DetectTarget::for_column(&column.name)
        .with_table(&table.schema, &table.name)
        .with_aliases(synonym_names.clone());

    // substring needles for the cheap prefilter
    let column_needle = column.name.to_lowercase();
    let mut table_needles = vec![table.name.to_lowercase(), table.qualified().to_lowercase()];
    table_needles.extend(synonym_names.iter().map(|n| n.to_lowercase()));

    let mut writers = Vec::new();
    if let Some(expression) = &column.computed_expression {
        writers.push(Writer::computed(target.clone(), expression.clone()));
    }
    if let Some(definition) = &column.default_constraint {
        writers.push(Writer::default_constraint(target.clone(), definition.clone()));
    }

    let mut scanned: HashSet<(String, String)> = HashSet::new();
    let mut routine_writers = Vec::new();

    let candidates: Vec<Arc<RoutineDefinition>> = snapshot
        .routines_referencing(table)
        .into_iter()
        .filter(|r| r.kind.can_write())
        .collect();
    for routine in &candidates {
        scanned.insert(routine.key());
        routine_writers.extend(scan_routine(
            routine,
            &target,
            &detect_target,
            &column_needle,
            &table_needles,
            config,
        ));
    }

    let mut fallback_scan = false;
    let mut scan_capped = false;
    if routine_writers.is_empty() {
        fallback_scan = true;
        let remaining: Vec<&Arc<RoutineDefinition>> = snapshot
            .all_routines()
            .filter(|r| r.kind.can_write() && !scanned.contains(&r.key()))
            .collect();
        debug!(
            table = %table.qualified(),
            column = %column.name,
            candidates = remaining.len(),
            "no writers from dependency edges, falling back to full routine scan"
        );
        if remaining.len() > config.max_routine_scan {
            scan_capped = true;
            warn!(
                table = %table.qualified(),
                column = %column.name,
                cap = config.max_routine_scan,
                total = remaining.len(),
                "fallback routine scan capped"
            );
        }
        for routine in remaining.into_iter().take(config.max_routine_scan) {
            routine_writers.extend(scan_routine(
                routine,
                &target,
                &detect_target,
                &column_needle,
                &table_needles,
                config,
            ));
        }
    }
    writers.append(&mut routine_writers);

    // triggers bound to the table: the binding itself is the writer fact
    for trigger in snapshot.triggers_for(table) {
        for detection in detect_writers(&trigger.definition, &detect_target, config.excerpt_context)
        {
            writers.push(Writer {
                target: target.clone(),
                kind: WriterKind::Trigger,
                routine: Some(RoutineRef {
                    schema: trigger.schema.clone(),
                    name: trigger.name.clone(),
                    kind: trigger.kind,
                }),
                expression: detection.expression,
                excerpt: detection.excerpt,
                confidence: WriterKind::Trigger.base_confidence(),
                is_dynamic: false,
                note: detection.note,
                source_tables: detection.source_tables,
            });
        }
    }

    writers.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));

    debug!(
        table = %table.qualified(),
        column = %column.name,
        generation = snapshot.generation(),
        writers = writers.len(),
        fallback_scan,
        scan_capped,
        "dependency index entry built"
    );

    DependencyIndexEntry {
        schema: table.schema.clone(),
        table: table.name.clone(),
        column: column.name.clone(),
        generation: snapshot.generation(),
        writers,
        scan_capped,
        fallback_scan,
    }
}

fn scan_routine(
    routine: &RoutineDefinition,
    target: &ColumnTarget,
    detect_target: &DetectTarget,
    column_needle: &str,
    table_needles: &[String],
    config: &EngineConfig,
) -> Vec<Writer> {
    if routine.definition.is_empty() {
        return Vec::new();
    }
    let lower = routine.definition.to_lowercase();
    if !lower.contains(column_needle) || !table_needles.iter().any(|n| lower.contains(n)) {
        return Vec::new();
    }

    detect_writers(&routine.definition, detect_target, config.excerpt_context)
        .into_iter()
        .map(|detection| Writer {
            target: target.clone(),
            kind: detection.kind,
            routine: Some(RoutineRef {
                schema: routine.schema.clone(),
                name: routine.name.clone(),
                kind: routine.kind,
            }),
            expression: detection.expression,
            excerpt: detection.excerpt,
            confidence: detection.kind.base_confidence(),
            is_dynamic: detection.kind == WriterKind::Dynamic,
            note: detection.note,
            source_tables: detection.source_tables,
        })
        .collect()
}
