//! Immutable, versioned catalog snapshots.
//!
//! # Architecture
//!
//! A [`CatalogSnapshot`] is the single source of truth for catalog facts
//! during a request. It is built once from a [`CatalogData`] pull, indexed
//! for lookups, and never mutated afterwards. Refresh builds a complete new
//! snapshot and publishes it with a single pointer swap: concurrent readers
//! see either the fully-old or fully-new snapshot, never a mixture, and a
//! reader holding an `Arc` keeps its generation alive for as long as it
//! needs it.
//!
//! A failed pull never reaches the swap, so the previous snapshot stays
//! fully serviceable.
//!
//! # Name Resolution
//!
//! Table lookups accept bare names (`Employees`), qualified names
//! (`dbo.Employees`), and synonyms (bare or qualified), resolved in that
//! order against lowercase keys. Bare-name collisions resolve to the first
//! match in sorted key order, deterministically.

mod memory;

pub use memory::MemoryCatalogSource;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::error::SourceError;
use crate::types::{
    CatalogData, Column, JobInfo, RoutineDefinition, SnapshotCounts, Synonym, Table,
};

/// Lowercase `(schema, name)` lookup key.
pub(crate) type ObjectKey = (String, String);

/// The seam to the data-source layer.
///
/// `load` performs one point-in-time pull of the complete catalog. A live
/// implementation may use a reduced-consistency read mode to avoid blocking
/// concurrent writers on the source database; the lineage facts it returns
/// may then be marginally stale, which is an accepted tradeoff of this
/// interface, not a correctness defect. Implementations must never mutate
/// target data.
pub trait CatalogSource: Send + Sync {
    fn load(&self) -> Result<CatalogData, SourceError>;
}

impl<S: CatalogSource + ?Sized> CatalogSource for Arc<S> {
    fn load(&self) -> Result<CatalogData, SourceError> {
        (**self).load()
    }
}

/// Immutable point-in-time copy of schema, routine, and dependency facts.
pub struct CatalogSnapshot {
    generation: u64,
    refreshed_at: DateTime<Utc>,
    tables: BTreeMap<ObjectKey, Table>,
    tables_by_bare: HashMap<String, Vec<ObjectKey>>,
    columns: HashMap<ObjectKey, BTreeMap<String, Column>>,
    column_index: HashMap<String, Vec<ObjectKey>>,
    routines: BTreeMap<ObjectKey, Arc<RoutineDefinition>>,
    routines_by_bare: HashMap<String, Vec<ObjectKey>>,
    triggers_by_table: HashMap<ObjectKey, Vec<Arc<RoutineDefinition>>>,
    reverse_deps: HashMap<ObjectKey, BTreeSet<ObjectKey>>,
    synonyms: HashMap<ObjectKey, Synonym>,
    synonyms_by_base: HashMap<ObjectKey, Vec<Synonym>>,
    jobs: BTreeMap<String, JobInfo>,
    counts: SnapshotCounts,
}

impl CatalogSnapshot {
    /// The empty generation-zero snapshot an engine starts with.
    pub(crate) fn empty() -> Self {
        Self::build(CatalogData::default(), 0, Utc::now())
    }

    /// Index a catalog pull into a snapshot.
    pub(crate) fn build(data: CatalogData, generation: u64, refreshed_at: DateTime<Utc>) -> Self {
        let mut tables = BTreeMap::new();
        let mut tables_by_bare: HashMap<String, Vec<ObjectKey>> = HashMap::new();
        for table in data.tables {
            let key = table.key();
            tables_by_bare
                .entry(key.1.clone())
                .or_default()
                .push(key.clone());
            tables.insert(key, table);
        }
        for keys in tables_by_bare.values_mut() {
            keys.sort();
        }

        let mut columns: HashMap<ObjectKey, BTreeMap<String, Column>> = HashMap::new();
        let mut column_index: HashMap<String, Vec<ObjectKey>> = HashMap::new();
        let mut column_count = 0usize;
        for column in data.columns {
            let table_key = (
                column.table_schema.to_lowercase(),
                column.table_name.to_lowercase(),
            );
            column_index
                .entry(column.name.to_lowercase())
                .or_default()
                .push(table_key.clone());
            columns
                .entry(table_key)
                .or_default()
                .insert(column.name.to_lowercase(), column);
            column_count += 1;
        }
        for keys in column_index.values_mut() {
            keys.sort();
            keys.dedup();
        }

        let mut routines = BTreeMap::new();
        let mut routines_by_bare: HashMap<String, Vec<ObjectKey>> = HashMap::new();
        let mut triggers_by_table: HashMap<ObjectKey, Vec<Arc<RoutineDefinition>>> = HashMap::new();
        let mut trigger_count = 0usize;
        for routine in data.routines {
            let routine = Arc::new(routine);
            let key = routine.key();
            if let Some(parent) = &routine.parent_table {
                triggers_by_table
                    .entry(parent.key())
                    .or_default()
                    .push(routine.clone());
                trigger_count += 1;
                continue;
            }
            routines_by_bare
                .entry(key.1.clone())
                .or_default()
                .push(key.clone());
            routines.insert(key, routine);
        }
        for keys in routines_by_bare.values_mut() {
            keys.sort();
        }
        for triggers in triggers_by_table.values_mut() {
            triggers.sort_by_key(|t| t.key());
        }

        let mut reverse_deps: HashMap<ObjectKey, BTreeSet<ObjectKey>> = HashMap::new();
        let dependency_edge_count = data.dependency_edges.len();
        for edge in data.dependency_edges {
            reverse_deps
                .entry(edge.referenced.key())
                .or_default()
                .insert(edge.referencing.key());
        }

        let mut synonyms = HashMap::new();
        let mut synonyms_by_base: HashMap<ObjectKey, Vec<Synonym>> = HashMap::new();
        for synonym in data.synonyms {
            synonyms_by_base
                .entry(synonym.base_key())
                .or_default()
                .push(synonym.clone());
            synonyms.insert(synonym.key(), synonym);
        }
        for entries in synonyms_by_base.values_mut() {
            entries.sort_by_key(Synonym::key);
        }

        let mut jobs = BTreeMap::new();
        for job in data.jobs {
            jobs.insert(job.name.to_lowercase(), job);
        }

        let counts = SnapshotCounts {
            tables: tables.len(),
            columns: column_count,
            routines: routines.len(),
            triggers: trigger_count,
            dependency_edges: dependency_edge_count,
            synonyms: synonyms.len(),
            jobs: jobs.len(),
        };

        Self {
            generation,
            refreshed_at,
            tables,
            tables_by_bare,
            columns,
            column_index,
            routines,
            routines_by_bare,
            triggers_by_table,
            reverse_deps,
            synonyms,
            synonyms_by_base,
            jobs,
            counts,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn refreshed_at(&self) -> DateTime<Utc> {
        self.refreshed_at
    }

    pub fn counts(&self) -> &SnapshotCounts {
        &self.counts
    }

    /// Resolve a table by bare name, qualified name, or synonym.
    pub fn lookup_table(&self, name: &str) -> Option<&Table> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return None;
        }

        if let Some((schema, bare)) = trimmed.split_once('.') {
            let key = (schema.to_lowercase(), bare.to_lowercase());
            if let Some(table) = self.tables.get(&key) {
                return Some(table);
            }
            if let Some(synonym) = self.synonyms.get(&key) {
                return self.tables.get(&synonym.base_key());
            }
        }

        let bare = trimmed.to_lowercase();
        if let Some(keys) = self.tables_by_bare.get(&bare) {
            if let Some(key) = keys.first() {
                return self.tables.get(key);
            }
        }

        // bare synonym: first match in sorted key order
        let mut synonym_keys: Vec<&ObjectKey> = self
            .synonyms
            .keys()
            .filter(|(_, n)| *n == bare)
            .collect();
        synonym_keys.sort();
        if let Some(key) = synonym_keys.first() {
            let synonym = &self.synonyms[*key];
            return self.tables.get(&synonym.base_key());
        }

        None
    }

    /// Case-insensitive column lookup within a table.
    pub fn lookup_column(&self, table: &Table, column: &str) -> Option<&Column> {
        self.columns
            .get(&table.key())
            .and_then(|cols| cols.get(&column.to_lowercase()))
    }

    /// All tables carrying a column with this exact (case-insensitive) name,
    /// sorted by schema then name.
    pub fn tables_with_column(&self, column: &str, base_tables_only: bool) -> Vec<&Table> {
        let Some(keys) = self.column_index.get(&column.to_lowercase()) else {
            return Vec::new();
        };
        keys.iter()
            .filter_map(|key| self.tables.get(key))
            .filter(|table| !base_tables_only || table.is_base_table)
            .collect()
    }

    /// Routines with a known dependency edge on this table or one of its
    /// synonyms, in sorted name order.
    pub fn routines_referencing(&self, table: &Table) -> Vec<Arc<RoutineDefinition>> {
        let mut keys: BTreeSet<ObjectKey> = BTreeSet::new();
        let mut referenced = vec![table.key()];
        for synonym in self.synonyms_for(table) {
            referenced.push(synonym.key());
        }
        for reference in referenced {
            if let Some(referencing) = self.reverse_deps.get(&reference) {
                keys.extend(referencing.iter().cloned());
            }
        }
        keys.iter()
            .filter_map(|key| self.routines.get(key).cloned())
            .collect()
    }

    /// Triggers bound to this table, in sorted name order.
    pub fn triggers_for(&self, table: &Table) -> &[Arc<RoutineDefinition>] {
        self.triggers_by_table
            .get(&table.key())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Synonyms pointing at this table.
    pub fn synonyms_for(&self, table: &Table) -> &[Synonym] {
        self.synonyms_by_base
            .get(&table.key())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// All non-trigger routines in deterministic (sorted key) order.
    pub fn all_routines(&self) -> impl Iterator<Item = &Arc<RoutineDefinition>> {
        self.routines.values()
    }

    /// Resolve a routine by qualified or bare name.
    pub fn routine_definition(&self, name: &str) -> Option<&Arc<RoutineDefinition>> {
        let trimmed = name.trim();
        if let Some((schema, bare)) = trimmed.split_once('.') {
            let key = (schema.to_lowercase(), bare.to_lowercase());
            if let Some(routine) = self.routines.get(&key) {
                return Some(routine);
            }
        }
        let bare = trimmed.to_lowercase();
        self.routines_by_bare
            .get(&bare)
            .and_then(|keys| keys.first())
            .and_then(|key| self.routines.get(key))
    }

    /// Point-in-time job facts by name.
    pub fn lookup_job(&self, name: &str) -> Option<&JobInfo> {
        self.jobs.get(&name.trim().to_lowercase())
    }

    /// All jobs in name order.
    pub fn jobs(&self) -> impl Iterator<Item = &JobInfo> {
        self.jobs.values()
    }
}

/// Holder for the active snapshot: readers clone the `Arc`, refresh swaps
/// the pointer. The write lock is held only for the swap itself.
pub(crate) struct SnapshotStore {
    active: RwLock<Arc<CatalogSnapshot>>,
    generation: AtomicU64,
}

impl SnapshotStore {
    pub(crate) fn new() -> Self {
        Self {
            active: RwLock::new(Arc::new(CatalogSnapshot::empty())),
            generation: AtomicU64::new(0),
        }
    }

    pub(crate) fn current(&self) -> Arc<CatalogSnapshot> {
        self.active.read().clone()
    }

    /// Build and publish a new snapshot. The generation counter only
    /// advances here, after a successful pull.
    pub(crate) fn swap_in(
        &self,
        data: CatalogData,
        refreshed_at: DateTime<Utc>,
    ) -> Arc<CatalogSnapshot> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let snapshot = Arc::new(CatalogSnapshot::build(data, generation, refreshed_at));
        *self.active.write() = snapshot.clone();
        snapshot
    }
}
