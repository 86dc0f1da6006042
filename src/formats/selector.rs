//! Reduced-schema selection
//!
//! Decides, per requested column, whether it lands in the per-record
//! (INFO) or per-sample (FORMAT) namespace of the reduced schema.
//! Per-sample fields other than `GT` are promoted to per-record so that
//! depth statistics can be surfaced on the merged record. Requested
//! columns unknown to the header are dropped.

use super::header::{HeaderField, Section, GENOTYPE, GENOTYPE_LINE};
use indexmap::{IndexMap, IndexSet};
use log::debug;

/// Descriptor map keyed by identifier, in header order
pub type HeaderMap = IndexMap<String, HeaderField>;

/// Sample suffixes used when per-sample fields are promoted in paired mode
pub const NORMAL: &str = "normal";
pub const TUMOR: &str = "tumor";

/// Reduced schema for one file
///
/// Keys are the names used to look values up in a record (`AD`,
/// `AD_normal`, ...); descriptors carry the identifiers written out.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldSelection {
    pub info: IndexMap<String, HeaderField>,
    pub format: IndexMap<String, HeaderField>,
}

impl FieldSelection {
    /// Tag every per-record descriptor with the caller name
    pub fn attribute_to(mut self, caller: &str) -> Self {
        for field in self.info.values_mut() {
            *field = field.clone().promote_to_per_record(caller);
        }
        self
    }

    /// Rendered descriptor lines: per-record first, then per-sample
    pub fn rendered_lines(&self) -> Vec<String> {
        self.info
            .values()
            .chain(self.format.values())
            .map(HeaderField::render)
            .collect()
    }
}

/// Collapse duplicate column names, keeping first-occurrence order
pub fn unique_columns<S: AsRef<str>>(columns: &[S]) -> Vec<&str> {
    let set: IndexSet<&str> = columns
        .iter()
        .map(|c| c.as_ref())
        .filter(|c| !c.is_empty())
        .collect();
    set.into_iter().collect()
}

/// Select columns for a single-sample file
pub fn select_single<S: AsRef<str>>(info: &HeaderMap, format: &HeaderMap, columns: &[S]) -> FieldSelection {
    let mut selection = FieldSelection::default();

    for col in unique_columns(columns) {
        let in_info = info.get(col);
        let in_format = format.get(col);

        if let Some(field) = in_info {
            selection.info.insert(col.to_string(), field.clone());
        }
        match in_format {
            Some(field) if field.id == GENOTYPE => {
                selection.format.insert(col.to_string(), field.clone());
            }
            // Per-sample descriptor replaces a same-named per-record one
            Some(field) => {
                selection
                    .info
                    .insert(col.to_string(), field.clone().with_section(Section::Info));
            }
            None if in_info.is_none() => debug!("Requested column '{}' not declared in header, ignored", col),
            None => {}
        }
    }

    selection
}

/// Select columns for a paired (normal/tumor) file
///
/// Promoted per-sample fields are duplicated into `{col}_normal` and
/// `{col}_tumor`. `GT` is always kept per-sample, synthesised when the
/// header does not declare it.
pub fn select_paired<S: AsRef<str>>(info: &HeaderMap, format: &HeaderMap, columns: &[S]) -> FieldSelection {
    let mut selection = FieldSelection::default();

    for col in unique_columns(columns) {
        let in_info = info.get(col);
        let in_format = format.get(col);

        if let Some(field) = in_info {
            selection.info.insert(col.to_string(), field.clone());
        }
        match in_format {
            Some(field) if field.id == GENOTYPE => {
                selection.format.insert(col.to_string(), field.clone());
            }
            Some(field) => {
                let promoted = field.clone().with_section(Section::Info);
                selection
                    .info
                    .insert(format!("{}_{}", col, NORMAL), promoted.with_suffix(NORMAL));
                selection
                    .info
                    .insert(format!("{}_{}", col, TUMOR), promoted.with_suffix(TUMOR));
            }
            None if in_info.is_none() => debug!("Requested column '{}' not declared in header, ignored", col),
            None => {}
        }
    }

    if !selection.format.contains_key(GENOTYPE) {
        let genotype = format.get(GENOTYPE).cloned().or_else(|| HeaderField::parse(GENOTYPE_LINE).ok());
        if let Some(field) = genotype {
            selection.format.insert(GENOTYPE.to_string(), field);
        }
    }

    selection
}

#[cfg(test)]
mod tests {
    use super::*;

    fn maps() -> (HeaderMap, HeaderMap) {
        let mut info = HeaderMap::new();
        let mut format = HeaderMap::new();
        for line in [
            "##INFO=<ID=AC,Number=A,Type=Integer,Description=\"Allele count\">",
            "##INFO=<ID=MQ,Number=1,Type=Float,Description=\"Mapping quality\">",
            "##INFO=<ID=AD,Number=R,Type=Integer,Description=\"Info allelic depths\">",
        ] {
            let f = HeaderField::parse(line).unwrap();
            info.insert(f.id.clone(), f);
        }
        for line in [
            "##FORMAT=<ID=GT,Number=1,Type=String,Description=\"Genotype\">",
            "##FORMAT=<ID=AD,Number=R,Type=Integer,Description=\"Allelic depths\">",
            "##FORMAT=<ID=DP,Number=1,Type=Integer,Description=\"Read depth\">",
        ] {
            let f = HeaderField::parse(line).unwrap();
            format.insert(f.id.clone(), f);
        }
        (info, format)
    }

    #[test]
    fn test_unique_columns_preserves_order() {
        assert_eq!(unique_columns(&["DP", "AD", "DP", "", "GT"]), vec!["DP", "AD", "GT"]);
    }

    #[test]
    fn test_single_promotes_format_fields() {
        let (info, format) = maps();
        let sel = select_single(&info, &format, &["MQ", "DP", "GT", "AD", "XX"]);

        let info_keys: Vec<&str> = sel.info.keys().map(String::as_str).collect();
        assert_eq!(info_keys, vec!["MQ", "DP", "AD"]);
        assert_eq!(sel.info["DP"].section, Section::Info);
        // FORMAT descriptor wins over the INFO one
        assert_eq!(sel.info["AD"].description, "Allelic depths");
        assert_eq!(sel.format.keys().collect::<Vec<_>>(), vec!["GT"]);
    }

    #[test]
    fn test_single_unknown_columns_dropped() {
        let (info, format) = maps();
        let sel = select_single(&info, &format, &["NOPE"]);
        assert!(sel.info.is_empty());
        assert!(sel.format.is_empty());
    }

    #[test]
    fn test_paired_duplicates_promoted_fields() {
        let (info, format) = maps();
        let sel = select_paired(&info, &format, &["DP", "AC"]);

        let info_keys: Vec<&str> = sel.info.keys().map(String::as_str).collect();
        assert_eq!(info_keys, vec!["DP_normal", "DP_tumor", "AC"]);
        assert_eq!(sel.info["DP_normal"].id, "DP_normal");
        assert_eq!(sel.info["DP_tumor"].id, "DP_tumor");
        assert_eq!(sel.info["DP_tumor"].section, Section::Info);
        // GT forced even though not requested
        assert!(sel.format.contains_key("GT"));
    }

    #[test]
    fn test_paired_synthesises_genotype() {
        let (info, mut format) = maps();
        format.shift_remove("GT");
        let sel = select_paired(&info, &format, &["GT", "DP"]);
        assert_eq!(sel.format["GT"].render(), GENOTYPE_LINE);
    }

    #[test]
    fn test_attribute_to_caller() {
        let (info, format) = maps();
        let sel = select_single(&info, &format, &["AC", "DP", "GT"]).attribute_to("gatk");
        let lines = sel.rendered_lines();
        assert_eq!(lines[0], "##INFO=<ID=AC,Number=A,Type=Integer,Description=\"Allele count\">");
        assert_eq!(lines[1], "##INFO=<ID=DP_gatk,Number=1,Type=Integer,Description=\"Read depth (gatk)\">");
        assert_eq!(lines[2], "##FORMAT=<ID=GT,Number=1,Type=String,Description=\"Genotype\">");
        // lookup keys are not renamed
        assert!(sel.info.contains_key("DP"));
    }
}
