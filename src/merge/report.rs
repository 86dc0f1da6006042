//! Combination-count report
//!
//! For N callers the report lists each caller's variant count, then for
//! every combination of two or more callers the size of the union of
//! their key sets (`a+b`), then the size of the intersection (`a-b`).
//! Counts are over raw per-caller key sets, not exact membership.

use std::collections::HashSet;
use std::hash::Hash;
use std::io::{self, Write};

/// Report header line
pub const REPORT_HEADER: &str = "Caller\tCount";

/// Kind of a report row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    Individual,
    Union,
    Intersection,
}

/// One `label\tcount` line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    pub kind: RowKind,
    pub label: String,
    pub count: usize,
}

/// All `k`-element index combinations of `0..n`, in lexicographic order
pub fn combinations(n: usize, k: usize) -> Vec<Vec<usize>> {
    let mut result = Vec::new();
    if k == 0 || k > n {
        return result;
    }
    let mut current: Vec<usize> = (0..k).collect();
    loop {
        result.push(current.clone());

        // Rightmost position that can still advance
        let Some(i) = (0..k).rev().find(|&i| current[i] < n - k + i) else {
            break;
        };
        current[i] += 1;
        for j in i + 1..k {
            current[j] = current[j - 1] + 1;
        }
    }
    result
}

/// Every combination of size 2..=n, ordered by size then index
pub fn multi_caller_combinations(n: usize) -> Vec<Vec<usize>> {
    (2..=n).flat_map(|k| combinations(n, k)).collect()
}

/// Build the report rows from per-caller key sets (same order as `callers`)
pub fn combination_report<K: Eq + Hash>(callers: &[&str], key_sets: &[HashSet<K>]) -> Vec<ReportRow> {
    let mut rows: Vec<ReportRow> = callers
        .iter()
        .zip(key_sets)
        .map(|(caller, keys)| ReportRow {
            kind: RowKind::Individual,
            label: caller.to_string(),
            count: keys.len(),
        })
        .collect();

    let combos = multi_caller_combinations(callers.len().min(key_sets.len()));
    let label = |combo: &[usize], sep: &str| {
        combo.iter().map(|&i| callers[i]).collect::<Vec<_>>().join(sep)
    };

    for combo in &combos {
        let union: HashSet<&K> = combo.iter().flat_map(|&i| key_sets[i].iter()).collect();
        rows.push(ReportRow {
            kind: RowKind::Union,
            label: label(combo, "+"),
            count: union.len(),
        });
    }

    for combo in &combos {
        let Some((first, rest)) = combo.split_first() else {
            continue;
        };
        let count = key_sets[*first]
            .iter()
            .filter(|key| rest.iter().all(|&i| key_sets[i].contains(*key)))
            .count();
        rows.push(ReportRow {
            kind: RowKind::Intersection,
            label: label(combo, "-"),
            count,
        });
    }

    rows
}

/// Write the report as TSV
pub fn write_report<W: Write>(writer: &mut W, rows: &[ReportRow]) -> io::Result<()> {
    writeln!(writer, "{}", REPORT_HEADER)?;
    for row in rows {
        writeln!(writer, "{}\t{}", row.label, row.count)?;
    }
    Ok(())
}
