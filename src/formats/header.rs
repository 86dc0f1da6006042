//! VCF metadata descriptors
//!
//! Parses `##INFO=<...>` / `##FORMAT=<...>` lines into [`HeaderField`]
//! values and renders them back in canonical form. Keys other than
//! `ID`, `Number`, `Type` and `Description` are not retained.

use crate::core::{HeaderParseError, HeaderResult};
use std::fmt;

/// Identifiers that stay caller-agnostic when promoted (allele-count aggregates)
pub const RESERVED_IDS: [&str; 2] = ["AC", "AN"];

/// Genotype field identifier
pub const GENOTYPE: &str = "GT";

/// Descriptor injected for paired files whose header has no genotype field
pub const GENOTYPE_LINE: &str = "##FORMAT=<ID=GT,Number=1,Type=String,Description=\"Genotype\">";

/// Descriptor injected for callers that never declare allele frequency
pub const ALLELE_FREQUENCY_LINE: &str = "##INFO=<ID=AF,Number=A,Type=Float,Description=\"Allele Frequency, for each ALT allele, in the same order as listed\">";

/// Per-sample allele depths derived from tiered read counts
pub const DERIVED_ALLELE_DEPTH_LINE: &str = "##FORMAT=<ID=AD,Number=.,Type=Integer,Description=\"Allelic depths for the ref and alt alleles, derived from tier 1 read counts\">";

/// Per-sample allele frequency derived from tiered read counts
pub const DERIVED_ALLELE_FREQUENCY_LINE: &str = "##FORMAT=<ID=AF,Number=A,Type=Float,Description=\"Allele Frequency, for each ALT allele, in the same order as listed\">";

/// Metadata namespace of a descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    /// Per-record fields (INFO column)
    Info,
    /// Per-sample fields (FORMAT column)
    Format,
}

impl Section {
    pub fn as_str(self) -> &'static str {
        match self {
            Section::Info => "INFO",
            Section::Format => "FORMAT",
        }
    }

    fn parse(token: &str) -> Option<Self> {
        match token {
            "INFO" => Some(Section::Info),
            "FORMAT" => Some(Section::Format),
            _ => None,
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One INFO/FORMAT descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderField {
    pub id: String,
    pub number: Option<String>,
    pub field_type: Option<String>,
    pub description: String,
    pub section: Section,
}

impl HeaderField {
    pub fn new(
        section: Section,
        id: impl Into<String>,
        number: impl Into<String>,
        field_type: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            number: Some(number.into()),
            field_type: Some(field_type.into()),
            description: description.into(),
            section,
        }
    }

    /// Parse one metadata line of the form `##SECTION=<ID=..,Number=..,Type=..,Description="..">`
    pub fn parse(line: &str) -> HeaderResult<Self> {
        let line = line.trim_end_matches(&['\n', '\r'][..]);
        let malformed = |message: &str| HeaderParseError::Malformed {
            line: line.to_string(),
            message: message.to_string(),
        };

        let rest = line.strip_prefix("##").ok_or_else(|| malformed("missing '##' prefix"))?;
        let open = rest.find("=<").ok_or_else(|| malformed("missing '=<'"))?;
        let section_token = &rest[..open];
        let section = Section::parse(section_token).ok_or_else(|| HeaderParseError::UnsupportedSection {
            section: section_token.to_string(),
            line: line.to_string(),
        })?;
        let body = &rest[open + 2..];

        // Everything before the first quote is the key=value list; the
        // quoted tail is the description.
        let quote = body.find('"').ok_or_else(|| HeaderParseError::MissingDescription {
            line: line.to_string(),
        })?;
        let close = body[quote + 1..]
            .find('"')
            .ok_or_else(|| HeaderParseError::MissingDescription { line: line.to_string() })?;
        let description = &body[quote + 1..quote + 1 + close];

        let mut id = None;
        let mut number = None;
        let mut field_type = None;
        for entry in split_entries(&body[..quote]) {
            let Some((key, value)) = entry.split_once('=') else {
                continue;
            };
            match key.trim() {
                "ID" => id = Some(value.to_string()),
                "Number" => number = Some(value.to_string()),
                "Type" => field_type = Some(value.to_string()),
                _ => {}
            }
        }

        let id = id.filter(|s| !s.is_empty()).ok_or_else(|| malformed("missing ID"))?;

        Ok(Self {
            id,
            number,
            field_type,
            description: description.to_string(),
            section,
        })
    }

    /// Rename to `{id}_{caller}` and note the caller in the description,
    /// moving the descriptor into the per-record namespace
    ///
    /// `AC` and `AN` keep their identifier and description.
    pub fn promote_to_per_record(mut self, caller: &str) -> Self {
        self.section = Section::Info;
        if !RESERVED_IDS.contains(&self.id.as_str()) {
            self.id = format!("{}_{}", self.id, caller);
            self.description = format!("{} ({})", self.description, caller);
        }
        self
    }

    /// Copy with a different namespace
    pub fn with_section(mut self, section: Section) -> Self {
        self.section = section;
        self
    }

    /// Copy with `suffix` appended to the identifier
    pub fn with_suffix(&self, suffix: &str) -> Self {
        let mut field = self.clone();
        field.id = format!("{}_{}", field.id, suffix);
        field
    }

    /// Canonical one-line form (no trailing newline)
    pub fn render(&self) -> String {
        format!(
            "##{}=<ID={},Number={},Type={},Description=\"{}\">",
            self.section,
            self.id,
            self.number.as_deref().unwrap_or("."),
            self.field_type.as_deref().unwrap_or("."),
            self.description
        )
    }
}

impl fmt::Display for HeaderField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Split on commas not followed by whitespace
fn split_entries(list: &str) -> Vec<&str> {
    let bytes = list.as_bytes();
    let mut entries = Vec::new();
    let mut start = 0;
    for (i, &b) in bytes.iter().enumerate() {
        if b == b',' && !bytes.get(i + 1).is_some_and(|n| n.is_ascii_whitespace()) {
            entries.push(&list[start..i]);
            start = i + 1;
        }
    }
    entries.push(&list[start..]);
    entries.into_iter().filter(|e| !e.is_empty()).collect()
}

/// True for lines carrying an INFO or FORMAT descriptor
pub fn is_descriptor_line(line: &str) -> bool {
    line.starts_with("##INFO=") || line.starts_with("##FORMAT=")
}

/// Statistics descriptors appended to merged single-sample files
pub fn single_stats_header() -> Vec<HeaderField> {
    let mut fields = vec![identified_field()];
    for (col, what) in [("AD", "allelic depths"), ("DP", "read depths")] {
        fields.push(HeaderField::new(
            Section::Info,
            format!("{}_mean", col),
            "1",
            "Float",
            format!("Mean of {} in source vcfs", what),
        ));
        fields.push(HeaderField::new(
            Section::Info,
            format!("{}_sd", col),
            "1",
            "Float",
            format!("Standard deviation of {} in source vcfs", what),
        ));
    }
    fields.extend(sample_mean_fields());
    fields
}

/// Statistics descriptors appended to merged paired-sample files
pub fn paired_stats_header() -> Vec<HeaderField> {
    let mut fields = vec![identified_field()];
    for (col, what) in [("AD", "allelic depths"), ("DP", "read depths")] {
        for sample in ["normal", "tumor"] {
            fields.push(HeaderField::new(
                Section::Info,
                format!("{}_mean_{}", col, sample),
                "1",
                "Float",
                format!("Mean of {} in source vcfs ({})", what, sample),
            ));
            fields.push(HeaderField::new(
                Section::Info,
                format!("{}_sd_{}", col, sample),
                "1",
                "Float",
                format!("Standard deviation of {} in source vcfs ({})", what, sample),
            ));
        }
    }
    fields.extend(sample_mean_fields());
    fields
}

fn identified_field() -> HeaderField {
    HeaderField::new(
        Section::Info,
        "Identified",
        "1",
        "String",
        "Source VCF for the merged record",
    )
}

fn sample_mean_fields() -> [HeaderField; 2] {
    [
        HeaderField::new(Section::Format, "AD", "1", "Float", "Mean of allelic depths in source vcfs"),
        HeaderField::new(Section::Format, "DP", "1", "Float", "Mean of read depths in source vcfs"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    const DP_LINE: &str = "##INFO=<ID=DP,Number=1,Type=Integer,Description=\"Approximate read depth; some reads may have been filtered\">";

    #[test]
    fn test_parse_info_line() {
        let field = HeaderField::parse(DP_LINE).unwrap();
        assert_eq!(field.section, Section::Info);
        assert_eq!(field.id, "DP");
        assert_eq!(field.number.as_deref(), Some("1"));
        assert_eq!(field.field_type.as_deref(), Some("Integer"));
        assert_eq!(field.description, "Approximate read depth; some reads may have been filtered");
    }

    #[test]
    fn test_render_round_trips_canonical_line() {
        assert_eq!(HeaderField::parse(DP_LINE).unwrap().render(), DP_LINE);
        assert_eq!(HeaderField::parse(GENOTYPE_LINE).unwrap().render(), GENOTYPE_LINE);
    }

    #[test]
    fn test_description_with_commas() {
        let field = HeaderField::parse(ALLELE_FREQUENCY_LINE).unwrap();
        assert_eq!(field.id, "AF");
        assert_eq!(field.number.as_deref(), Some("A"));
        assert_eq!(field.description, "Allele Frequency, for each ALT allele, in the same order as listed");
    }

    #[test]
    fn test_extra_keys_dropped() {
        let line = "##INFO=<ID=SOMATIC,Number=0,Type=Flag,Description=\"Somatic\",Source=\"x\",Version=\"1\">";
        let field = HeaderField::parse(line).unwrap();
        assert_eq!(field.render(), "##INFO=<ID=SOMATIC,Number=0,Type=Flag,Description=\"Somatic\">");
    }

    #[test]
    fn test_missing_description_is_error() {
        let line = "##FORMAT=<ID=GQ,Number=1,Type=Integer>";
        assert_eq!(
            HeaderField::parse(line),
            Err(HeaderParseError::MissingDescription { line: line.to_string() })
        );
    }

    #[test]
    fn test_unsupported_section() {
        let line = "##FILTER=<ID=PASS,Description=\"All filters passed\">";
        assert!(matches!(
            HeaderField::parse(line),
            Err(HeaderParseError::UnsupportedSection { .. })
        ));
    }

    #[test]
    fn test_promote_to_per_record() {
        let field = HeaderField::parse("##FORMAT=<ID=AD,Number=R,Type=Integer,Description=\"Allelic depths\">")
            .unwrap()
            .promote_to_per_record("gatk");
        assert_eq!(
            field.render(),
            "##INFO=<ID=AD_gatk,Number=R,Type=Integer,Description=\"Allelic depths (gatk)\">"
        );
    }

    #[test]
    fn test_promote_keeps_reserved_ids() {
        for id in RESERVED_IDS {
            let field = HeaderField::new(Section::Info, id, "A", "Integer", "Allele count");
            let promoted = field.clone().promote_to_per_record("vardict");
            assert_eq!(promoted, field);
        }
    }

    #[test]
    fn test_split_entries() {
        assert_eq!(split_entries("ID=X,Number=1,Type=String,Description="), vec![
            "ID=X",
            "Number=1",
            "Type=String",
            "Description="
        ]);
        assert_eq!(split_entries("ID=X, y,Type=A"), vec!["ID=X, y", "Type=A"]);
    }

    #[test]
    fn test_stats_headers() {
        let single: Vec<String> = single_stats_header().iter().map(HeaderField::render).collect();
        assert_eq!(single.len(), 7);
        assert_eq!(single[0], "##INFO=<ID=Identified,Number=1,Type=String,Description=\"Source VCF for the merged record\">");
        assert!(single.iter().any(|l| l.contains("ID=DP_sd,")));

        let paired = paired_stats_header();
        assert_eq!(paired.len(), 11);
        assert!(paired.iter().any(|f| f.id == "AD_mean_tumor"));
        assert_eq!(paired.last().map(|f| f.section), Some(Section::Format));
    }
}
