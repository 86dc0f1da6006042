//! Property-based tests for the caller combination report

use proptest::prelude::*;
use std::collections::HashSet;
use vcf_combine::merge::report::{combination_report, multi_caller_combinations, write_report, RowKind};

/// Synthetic per-caller key sets drawn from a small shared key space
fn arb_key_sets(callers: usize) -> impl Strategy<Value = Vec<HashSet<u16>>> {
    proptest::collection::vec(proptest::collection::hash_set(0u16..64, 0..40), callers)
}

const NAMES: [&str; 5] = ["freebayes", "gatk", "mutect2", "strelka", "vardict"];

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Three callers give 3 individual rows, 4 union rows and 4 intersection rows
    #[test]
    fn prop_three_caller_row_layout(sets in arb_key_sets(3)) {
        let rows = combination_report(&NAMES[..3], &sets);
        let kinds: Vec<RowKind> = rows.iter().map(|r| r.kind).collect();

        prop_assert_eq!(kinds.iter().filter(|k| **k == RowKind::Individual).count(), 3);
        prop_assert_eq!(kinds.iter().filter(|k| **k == RowKind::Union).count(), 4);
        prop_assert_eq!(kinds.iter().filter(|k| **k == RowKind::Intersection).count(), 4);
        prop_assert_eq!(
            rows.iter().map(|r| r.label.as_str()).collect::<Vec<_>>(),
            vec![
                "freebayes", "gatk", "mutect2",
                "freebayes+gatk", "freebayes+mutect2", "gatk+mutect2", "freebayes+gatk+mutect2",
                "freebayes-gatk", "freebayes-mutect2", "gatk-mutect2", "freebayes-gatk-mutect2",
            ]
        );
    }

    /// Counts agree with set algebra for any number of callers
    #[test]
    fn prop_counts_match_set_algebra(n in 1usize..=5, seed_sets in arb_key_sets(5)) {
        let sets = &seed_sets[..n];
        let rows = combination_report(&NAMES[..n], sets);
        let combos = multi_caller_combinations(n);
        prop_assert_eq!(rows.len(), n + 2 * combos.len());

        for (i, set) in sets.iter().enumerate() {
            prop_assert_eq!(rows[i].count, set.len());
        }
        for (j, combo) in combos.iter().enumerate() {
            let union: HashSet<u16> = combo.iter().flat_map(|&i| sets[i].iter().copied()).collect();
            let intersection: HashSet<u16> = sets[combo[0]]
                .iter()
                .copied()
                .filter(|k| combo.iter().all(|&i| sets[i].contains(k)))
                .collect();
            prop_assert_eq!(rows[n + j].count, union.len());
            prop_assert_eq!(rows[n + combos.len() + j].count, intersection.len());
        }
    }

    /// Pairwise rows satisfy inclusion-exclusion
    #[test]
    fn prop_pairwise_inclusion_exclusion(sets in arb_key_sets(2)) {
        let rows = combination_report(&NAMES[..2], &sets);
        prop_assert_eq!(rows[2].count + rows[3].count, rows[0].count + rows[1].count);
    }
}

#[test]
fn test_report_tsv_layout() {
    let a: HashSet<u16> = [1, 2, 3].into_iter().collect();
    let b: HashSet<u16> = [3, 4].into_iter().collect();
    let c: HashSet<u16> = [3, 5].into_iter().collect();
    let rows = combination_report(&["a", "b", "c"], &[a, b, c]);

    let mut out = Vec::new();
    write_report(&mut out, &rows).unwrap();
    let expected = "Caller\tCount\n\
                    a\t3\nb\t2\nc\t2\n\
                    a+b\t4\na+c\t4\nb+c\t3\na+b+c\t5\n\
                    a-b\t1\na-c\t1\nb-c\t1\na-b-c\t1\n";
    assert_eq!(String::from_utf8(out).unwrap(), expected);
}
