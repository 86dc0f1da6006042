//! Property-based tests for INFO/FORMAT descriptor handling
//!
//! Covers parsing, caller attribution and schema selection.

use proptest::prelude::*;
use vcf_combine::core::HeaderParseError;
use vcf_combine::formats::header::{paired_stats_header, single_stats_header, HeaderField, Section};
use vcf_combine::formats::selector::{select_paired, select_single, HeaderMap};

/// Generate a descriptor identifier
fn arb_id() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("DP".to_string()),
        Just("AD".to_string()),
        Just("MQ".to_string()),
        "[A-Z][A-Z0-9_]{0,8}",
    ]
}

/// Generate a Number value
fn arb_number() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("1".to_string()),
        Just("A".to_string()),
        Just("R".to_string()),
        Just("G".to_string()),
        Just(".".to_string()),
        (2u8..10).prop_map(|n| n.to_string()),
    ]
}

/// Generate a Type value
fn arb_type() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("Integer".to_string()),
        Just("Float".to_string()),
        Just("String".to_string()),
        Just("Flag".to_string()),
    ]
}

/// Generate a free-text description, including commas and `=` signs
fn arb_description() -> impl Strategy<Value = String> {
    "[A-Za-z0-9 ,=()/.-]{1,40}"
}

fn arb_section() -> impl Strategy<Value = Section> {
    prop_oneof![Just(Section::Info), Just(Section::Format)]
}

fn arb_caller() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("gatk".to_string()),
        Just("strelka".to_string()),
        Just("vardict".to_string()),
        "[a-z][a-z0-9]{1,8}",
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Rendering then parsing gives back the same descriptor
    #[test]
    fn prop_render_parse_stable(
        section in arb_section(),
        id in arb_id(),
        number in arb_number(),
        field_type in arb_type(),
        description in arb_description(),
    ) {
        let field = HeaderField::new(section, id, number, field_type, description);
        let line = field.render();
        let parsed = HeaderField::parse(&line).unwrap();
        prop_assert_eq!(&parsed, &field);
        prop_assert_eq!(parsed.render(), line);
    }

    /// Attribution suffixes every identifier except AC/AN and moves it to INFO
    #[test]
    fn prop_promote_to_per_record(
        section in arb_section(),
        id in arb_id(),
        description in arb_description(),
        caller in arb_caller(),
    ) {
        let field = HeaderField::new(section, id.clone(), "1", "Integer", description.clone());
        let promoted = field.promote_to_per_record(&caller);

        prop_assert_eq!(promoted.section, Section::Info);
        if id == "AC" || id == "AN" {
            prop_assert_eq!(&promoted.id, &id);
            prop_assert_eq!(&promoted.description, &description);
        } else {
            prop_assert_eq!(promoted.id, format!("{}_{}", id, caller));
            prop_assert!(promoted.description.contains(caller.as_str()));
        }
    }

    /// Selected INFO identifiers are unique after attribution
    #[test]
    fn prop_selection_ids_unique(
        columns in proptest::collection::vec(arb_id(), 1..8),
        caller in arb_caller(),
        paired in any::<bool>(),
    ) {
        let mut info = HeaderMap::new();
        let mut format = HeaderMap::new();
        for id in ["DP", "MQ", "XY"] {
            info.insert(id.to_string(), HeaderField::new(Section::Info, id, "1", "Integer", id));
        }
        for id in ["GT", "AD", "DP", "ZZ"] {
            format.insert(id.to_string(), HeaderField::new(Section::Format, id, "1", "Integer", id));
        }

        let selection = if paired {
            select_paired(&info, &format, &columns)
        } else {
            select_single(&info, &format, &columns)
        }
        .attribute_to(&caller);

        let ids: Vec<&str> = selection.info.values().map(|f| f.id.as_str()).collect();
        let mut unique = ids.clone();
        unique.sort_unstable();
        unique.dedup();
        prop_assert_eq!(ids.len(), unique.len());
        prop_assert!(selection.info.values().all(|f| f.section == Section::Info));
        if paired {
            prop_assert!(selection.format.contains_key("GT"));
        }
    }
}

#[test]
fn test_parse_splits_on_commas_without_space() {
    let line = "##INFO=<ID=DP,Number=1,Type=Integer,Description=\"Depth, filtered, at this site\">";
    let field = HeaderField::parse(line).unwrap();
    assert_eq!(field.id, "DP");
    assert_eq!(field.number.as_deref(), Some("1"));
    assert_eq!(field.field_type.as_deref(), Some("Integer"));
    assert_eq!(field.description, "Depth, filtered, at this site");
    assert_eq!(field.section, Section::Info);
}

#[test]
fn test_missing_description_names_line() {
    let line = "##FORMAT=<ID=GT,Number=1,Type=String>";
    assert_eq!(
        HeaderField::parse(line),
        Err(HeaderParseError::MissingDescription { line: line.to_string() })
    );
}

#[test]
fn test_unsupported_section() {
    let line = "##FILTER=<ID=q10,Description=\"Quality below 10\">";
    assert!(matches!(
        HeaderField::parse(line),
        Err(HeaderParseError::UnsupportedSection { .. })
    ));
}

#[test]
fn test_stats_header_blocks() {
    let single: Vec<String> = single_stats_header().iter().map(|f| f.id.clone()).collect();
    assert_eq!(single, vec!["Identified", "AD_mean", "AD_sd", "DP_mean", "DP_sd", "AD", "DP"]);

    let paired: Vec<String> = paired_stats_header().iter().map(|f| f.id.clone()).collect();
    assert_eq!(paired.len(), 11);
    assert!(paired.contains(&"DP_mean_tumor".to_string()));
    assert!(paired.contains(&"AD_sd_normal".to_string()));

    for field in single_stats_header().iter().chain(paired_stats_header().iter()) {
        assert_eq!(HeaderField::parse(&field.render()).as_ref(), Ok(field));
    }
}
