//! Caller ordering
//!
//! The order decides which caller's record supplies the structural
//! columns of a merged variant, the order of names in `Identified`, and
//! which value wins when callers report the same INFO key.

use crate::core::caller::CallerKind;
use crate::core::ConfigError;
use crate::formats::source::SourceFile;
use std::collections::{HashMap, HashSet};

/// Sort sources by a user priority list, or case-insensitively by caller name
///
/// The priority list must name exactly the callers found in the files.
/// The default sort is stable, so files with equal names keep input order.
pub fn order_sources(
    mut sources: Vec<SourceFile>,
    priority: Option<&[String]>,
) -> Result<Vec<SourceFile>, ConfigError> {
    match priority {
        Some(priority) => {
            let wanted: HashSet<&str> = priority.iter().map(String::as_str).collect();
            let found: HashSet<&str> = sources.iter().map(|s| s.caller.as_str()).collect();
            if wanted != found {
                return Err(ConfigError::PriorityMismatch {
                    priority: priority.join(" "),
                    callers: sources.iter().map(|s| s.caller.as_str()).collect::<Vec<_>>().join(" "),
                });
            }
            let rank: HashMap<&str, usize> = priority
                .iter()
                .enumerate()
                .map(|(i, caller)| (caller.as_str(), i))
                .collect();
            sources.sort_by_key(|s| rank.get(s.caller.as_str()).copied().unwrap_or(usize::MAX));
        }
        None => sources.sort_by_key(|s| s.caller.to_lowercase()),
    }
    Ok(sources)
}

/// Pick the contributor whose record is the structural base of a merged variant
///
/// `contributors` are indices into the ordered caller list. The first one
/// wins, except that in paired mode a strelka record is always preferred.
pub fn base_contributor(contributors: &[usize], callers: &[&str], paired: bool) -> Option<usize> {
    if paired {
        let strelka = contributors
            .iter()
            .copied()
            .find(|&i| callers.get(i).is_some_and(|c| CallerKind::of(c) == CallerKind::Strelka));
        if strelka.is_some() {
            return strelka;
        }
    }
    contributors.first().copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::SampleLayout;

    fn source(caller: &str) -> SourceFile {
        let text = format!(
            "##source={}\n#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tS\n",
            caller
        );
        SourceFile::from_reader(caller, text.as_bytes(), &["DP"], &SampleLayout::Single).unwrap()
    }

    fn callers(sources: &[SourceFile]) -> Vec<&str> {
        sources.iter().map(|s| s.caller.as_str()).collect()
    }

    #[test]
    fn test_default_order_is_case_insensitive() {
        let ordered = order_sources(vec![source("vardict"), source("Mutect2"), source("gatk")], None).unwrap();
        assert_eq!(callers(&ordered), vec!["gatk", "Mutect2", "vardict"]);
    }

    #[test]
    fn test_priority_order() {
        let priority = vec!["vardict".to_string(), "strelka".to_string()];
        let ordered = order_sources(vec![source("strelka"), source("vardict")], Some(priority.as_slice())).unwrap();
        assert_eq!(callers(&ordered), vec!["vardict", "strelka"]);
    }

    #[test]
    fn test_priority_must_match_callers() {
        let priority = vec!["vardict".to_string(), "gatk".to_string()];
        let err = order_sources(vec![source("strelka"), source("vardict")], Some(priority.as_slice())).unwrap_err();
        assert!(matches!(err, ConfigError::PriorityMismatch { .. }));
    }

    #[test]
    fn test_base_contributor() {
        let names = ["vardict", "strelka"];
        assert_eq!(base_contributor(&[0, 1], &names, false), Some(0));
        assert_eq!(base_contributor(&[0, 1], &names, true), Some(1));
        assert_eq!(base_contributor(&[0], &names, true), Some(0));
        assert_eq!(base_contributor(&[], &names, true), None);
    }
}
