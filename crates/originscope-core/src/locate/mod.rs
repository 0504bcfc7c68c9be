//! Column location and table disambiguation.
//!
//! Locating is an exact, case-insensitive name match — no fuzzy or partial
//! matching. Disambiguation is a pure function of the candidate set, their
//! index entries, the configured default schema, and an optional hint, so
//! identical inputs against one snapshot generation always produce the same
//! winner and the same alternatives ordering.
//!
//! Ranking criteria, in strict priority order: writer count (descending),
//! presence of a trigger writer, schema preference (default schema first,
//! otherwise alphabetical), hint token overlap (descending), row-count
//! estimate (descending). Candidates still tied after all five are reported
//! as tied alternatives; the winner among them falls back to qualified-name
//! order purely for determinism.

use regex::Regex;
use std::cmp::Reverse;
use std::collections::HashSet;
use std::sync::OnceLock;

use crate::snapshot::CatalogSnapshot;
use crate::types::{DependencyIndexEntry, TableMatch};

/// Ranking signals for one candidate table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateScore {
    pub writer_count: usize,
    pub has_trigger: bool,
    pub hint_overlap: usize,
    pub row_count_estimate: u64,
}

#[derive(Debug, Clone)]
pub struct RankedCandidate {
    pub table: TableMatch,
    pub score: CandidateScore,
}

/// Outcome of ranking a candidate set.
#[derive(Debug, Clone)]
pub struct Ranking {
    /// Candidates in winning order; the first is the chosen table.
    pub ordered: Vec<RankedCandidate>,
    /// The top candidates tied on every criterion.
    pub ambiguous: bool,
}

/// Exact case-insensitive column match against the snapshot.
pub fn find_tables_with_column(
    snapshot: &CatalogSnapshot,
    column: &str,
    base_tables_only: bool,
) -> Vec<TableMatch> {
    snapshot
        .tables_with_column(column, base_tables_only)
        .into_iter()
        .map(|table| TableMatch {
            schema: table.schema.clone(),
            table: table.name.clone(),
            is_base_table: table.is_base_table,
        })
        .collect()
}

/// Signals for one candidate, derived from its index entry.
pub fn score_candidate(
    entry: &DependencyIndexEntry,
    row_count_estimate: u64,
    qualified_name: &str,
    hint: Option<&str>,
) -> CandidateScore {
    CandidateScore {
        writer_count: entry.writers.len(),
        has_trigger: entry.has_trigger_writer(),
        hint_overlap: hint
            .map(|h| hint_overlap(qualified_name, h))
            .unwrap_or(0),
        row_count_estimate,
    }
}

/// The five ranking criteria. Exact equality here means a tie.
type TieKey = (
    Reverse<usize>,
    Reverse<bool>,
    (bool, String),
    Reverse<usize>,
    Reverse<u64>,
);

fn tie_key(candidate: &RankedCandidate, default_schema: &str) -> TieKey {
    let schema_lower = candidate.table.schema.to_lowercase();
    (
        Reverse(candidate.score.writer_count),
        Reverse(candidate.score.has_trigger),
        (
            !schema_lower.eq_ignore_ascii_case(default_schema),
            schema_lower,
        ),
        Reverse(candidate.score.hint_overlap),
        Reverse(candidate.score.row_count_estimate),
    )
}

/// Rank candidates deterministically. Input order is irrelevant.
pub fn rank_candidates(mut candidates: Vec<RankedCandidate>, default_schema: &str) -> Ranking {
    candidates.sort_by(|a, b| {
        tie_key(a, default_schema)
            .cmp(&tie_key(b, default_schema))
            .then_with(|| {
                a.table
                    .qualified()
                    .to_lowercase()
                    .cmp(&b.table.qualified().to_lowercase())
            })
    });
    let ambiguous = candidates.len() > 1
        && tie_key(&candidates[0], default_schema) == tie_key(&candidates[1], default_schema);
    Ranking {
        ordered: candidates,
        ambiguous,
    }
}

/// Count distinct name tokens of `qualified_name` that occur in the hint.
pub fn hint_overlap(qualified_name: &str, hint: &str) -> usize {
    static TOKEN_REGEX: OnceLock<Regex> = OnceLock::new();
    let re = TOKEN_REGEX.get_or_init(|| Regex::new(r"[A-Za-z0-9]+").expect("Invalid regex pattern"));

    let hint_tokens: HashSet<String> = re
        .find_iter(hint)
        .map(|m| m.as_str().to_lowercase())
        .collect();
    let name_tokens: HashSet<String> = re
        .find_iter(qualified_name)
        .map(|m| m.as_str().to_lowercase())
        .collect();
    name_tokens
        .iter()
        .filter(|token| hint_tokens.contains(*token))
        .count()
}
