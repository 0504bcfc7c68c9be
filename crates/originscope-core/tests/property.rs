use originscope_core::detector::{detect_writers, tokenize, DetectTarget};
use originscope_core::locate::{rank_candidates, CandidateScore, RankedCandidate, Ranking};
use originscope_core::TableMatch;
use proptest::prelude::*;

fn candidate_strategy() -> impl Strategy<Value = RankedCandidate> {
    (
        "[a-c]{1,3}",
        "[A-Z][a-z]{1,6}",
        0usize..4,
        any::<bool>(),
        0usize..3,
        0u64..1000,
    )
        .prop_map(
            |(schema, table, writer_count, has_trigger, hint_overlap, rows)| RankedCandidate {
                table: TableMatch {
                    schema,
                    table,
                    is_base_table: true,
                },
                score: CandidateScore {
                    writer_count,
                    has_trigger,
                    hint_overlap,
                    row_count_estimate: rows,
                },
            },
        )
}

fn ordering(ranking: &Ranking) -> Vec<String> {
    ranking
        .ordered
        .iter()
        .map(|c| c.table.qualified())
        .collect()
}

proptest! {
    #[test]
    fn tokenizer_never_panics_and_spans_are_well_formed(input in "\\PC*") {
        let tokens = tokenize(&input);
        let mut previous_end = 0usize;
        for token in &tokens {
            prop_assert!(token.span.start <= token.span.end);
            prop_assert!(token.span.end <= input.len());
            prop_assert!(token.span.start >= previous_end);
            // spans must slice cleanly at char boundaries
            let _ = &input[token.span.start..token.span.end];
            previous_end = token.span.end;
        }
    }

    #[test]
    fn tokenizer_handles_sql_shaped_input(input in "(UPDATE|SELECT|'[a-z ]*'|--[a-z ]*\n|\\[[a-z]*\\]|[(),;=.]| |[A-Za-z0-9_@#]+){0,40}") {
        let tokens = tokenize(&input);
        for token in &tokens {
            let _ = &input[token.span.start..token.span.end];
        }
    }

    #[test]
    fn detector_never_panics(input in "\\PC*") {
        let target = DetectTarget::for_column("Salary").with_table("dbo", "T");
        let _ = detect_writers(&input, &target, 40);
    }

    #[test]
    fn detector_is_deterministic(input in "(UPDATE|INSERT INTO|MERGE|SET|VALUES|SELECT|Salary|T|=|,|\\(|\\)|;| |@x){0,60}") {
        let target = DetectTarget::for_column("Salary").with_table("dbo", "T");
        let first = detect_writers(&input, &target, 40);
        let second = detect_writers(&input, &target, 40);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn ranking_is_permutation_invariant(mut candidates in prop::collection::vec(candidate_strategy(), 2..6)) {
        let forward = rank_candidates(candidates.clone(), "dbo");
        candidates.reverse();
        let backward = rank_candidates(candidates, "dbo");
        prop_assert_eq!(ordering(&forward), ordering(&backward));
        prop_assert_eq!(forward.ambiguous, backward.ambiguous);
    }

    #[test]
    fn ranking_is_idempotent(candidates in prop::collection::vec(candidate_strategy(), 2..5)) {
        let once = rank_candidates(candidates.clone(), "dbo");
        let twice = rank_candidates(candidates, "dbo");
        prop_assert_eq!(ordering(&once), ordering(&twice));
    }
}
