//! VCF data records
//!
//! Parses tab-delimited data lines into [`VariantRecord`]s, normalises
//! genotype encoding, recomputes allele frequency, projects records onto
//! a reduced schema and serialises them back.
//!
//! INFO entries without `=` (flags such as `SOMATIC`) are dropped when
//! parsing; they are never carried into the reduced schema.

use super::header::GENOTYPE;
use super::selector::{FieldSelection, NORMAL, TUMOR};
use crate::core::caller::CallerKind;
use crate::core::stats::{column_summary, format_decimal, parse_components};
use crate::core::{RecordParseError, RecordResult};
use indexmap::IndexMap;
use memchr::memchr_iter;
use std::fmt;

/// Ordered field name -> value map
pub type FieldMap = IndexMap<String, String>;

/// Columns before the FORMAT column
pub const MANDATORY_COLUMNS: usize = 8;

/// First sample column in single-sample files
pub const FIRST_SAMPLE_COLUMN: usize = 9;

/// Depth-related columns that get cross-caller statistics
pub const STAT_COLUMNS: [&str; 2] = ["AD", "DP"];

/// Genomic identity of a variant
///
/// Distinct multi-allelic representations of the same site are
/// different keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VariantKey {
    pub chrom: String,
    /// POS as written; `0100` and `100` are different keys
    pub pos: String,
    pub ref_allele: String,
    pub alt: String,
}

impl fmt::Display for VariantKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}\t{}\t{}", self.chrom, self.pos, self.ref_allele, self.alt)
    }
}

/// Per-sample payload of a record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SampleData {
    Single(FieldMap),
    Paired { normal: FieldMap, tumor: FieldMap },
}

impl SampleData {
    pub fn is_paired(&self) -> bool {
        matches!(self, SampleData::Paired { .. })
    }
}

/// One variant line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantRecord {
    pub chrom: String,
    pub pos: String,
    pub id: String,
    pub ref_allele: String,
    pub alt: String,
    pub qual: String,
    pub filter: String,
    pub info: FieldMap,
    pub samples: SampleData,
}

/// Split a line on tabs
fn split_columns(line: &str) -> Vec<&str> {
    let mut columns = Vec::with_capacity(12);
    let mut start = 0;
    for tab in memchr_iter(b'\t', line.as_bytes()) {
        columns.push(&line[start..tab]);
        start = tab + 1;
    }
    columns.push(&line[start..]);
    columns
}

/// Parse `key=value;key=value`, dropping entries without `=`
pub fn parse_info(column: &str) -> FieldMap {
    column
        .split(';')
        .filter_map(|entry| entry.split_once('='))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Pair FORMAT names with one sample's values, positionally
fn parse_sample(names: &str, values: &str) -> FieldMap {
    names
        .split(':')
        .zip(values.split(':'))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Canonicalise a genotype string
///
/// Missing alleles become `0`, phased separators become `/`, and only
/// the literal forms `1/0`, `0/1/0` and `0/0/1` are rewritten to `0/1`.
/// Other orderings and ploidies pass through unchanged.
pub fn normalize_genotype(gt: &str) -> String {
    let gt = gt.replace('.', "0").replace('|', "/");
    match gt.as_str() {
        "1/0" | "0/1/0" | "0/0/1" => "0/1".to_string(),
        _ => gt,
    }
}

fn normalize_genotype_in(map: &mut FieldMap) {
    if let Some(gt) = map.get_mut(GENOTYPE) {
        *gt = normalize_genotype(gt);
    }
}

/// `round(AD[1] / DP, 2)`, or `0` when either input is missing or unusable
pub fn allele_frequency(allele_depth: Option<&str>, depth: Option<&str>) -> String {
    let alt_depth = allele_depth
        .and_then(parse_components)
        .and_then(|ad| ad.get(1).copied());
    let depth = depth.and_then(|dp| dp.trim().parse::<f64>().ok());
    match (alt_depth, depth) {
        (Some(ad), Some(dp)) if dp != 0.0 && dp.is_finite() => format_decimal(ad / dp),
        _ => "0".to_string(),
    }
}

/// First component of a tiered count such as `AU=12,14`
fn tier1_count(sample: &FieldMap, name: &str) -> Option<u64> {
    sample.get(name)?.split(',').next()?.trim().parse().ok()
}

/// Fill `AD` and `AF` from tiered read counts
///
/// SNVs read `{REF}U`/`{ALT}U`, other records `TAR`/`TIR`. AF is
/// `alt / (ref + alt)`, `0.00` when both are zero. Multi-allelic
/// records and records missing the counts are left as they are.
fn derive_tiered_allele_depth(ref_allele: &str, alt: &str, sample: &mut FieldMap) {
    if ref_allele.contains(',') || alt.contains(',') {
        return;
    }
    let counts = if ref_allele.len() == 1 && alt.len() == 1 {
        (
            tier1_count(sample, &format!("{}U", ref_allele.to_ascii_uppercase())),
            tier1_count(sample, &format!("{}U", alt.to_ascii_uppercase())),
        )
    } else {
        (tier1_count(sample, "TAR"), tier1_count(sample, "TIR"))
    };
    let (Some(ref_count), Some(alt_count)) = counts else {
        return;
    };

    let total = ref_count + alt_count;
    let af = if total == 0 {
        "0.00".to_string()
    } else {
        format_decimal(alt_count as f64 / total as f64)
    };
    sample.insert("AD".to_string(), format!("{},{}", ref_count, alt_count));
    sample.insert("AF".to_string(), af);
}

fn or_missing(value: Option<&String>) -> String {
    value
        .filter(|v| !v.is_empty())
        .cloned()
        .unwrap_or_else(|| ".".to_string())
}

impl VariantRecord {
    /// Parse the mandatory columns and INFO, leaving samples empty
    fn parse_fixed(columns: &[&str], required: usize) -> RecordResult<Self> {
        if columns.len() == 1 && columns[0].is_empty() {
            return Err(RecordParseError::EmptyLine);
        }
        if columns.len() < required {
            return Err(RecordParseError::TooFewFields {
                expected: required,
                found: columns.len(),
            });
        }
        Ok(Self {
            chrom: columns[0].to_string(),
            pos: columns[1].to_string(),
            id: columns[2].to_string(),
            ref_allele: columns[3].to_string(),
            alt: columns[4].to_string(),
            qual: columns[5].to_string(),
            filter: columns[6].to_string(),
            info: parse_info(columns[7]),
            samples: SampleData::Single(FieldMap::new()),
        })
    }

    /// Parse a single-sample line, normalising GT and recomputing AF
    ///
    /// Per-sample `AD`/`DP` replace same-named INFO values. For callers
    /// that report indel depth separately, `DPI` stands in for `DP` on
    /// records whose REF and ALT lengths differ or that carry no `DP`.
    pub fn parse_single(line: &str, caller: CallerKind) -> RecordResult<Self> {
        let columns = split_columns(line);
        let mut record = Self::parse_fixed(&columns, FIRST_SAMPLE_COLUMN + 1)?;
        let mut sample = parse_sample(columns[8], columns[FIRST_SAMPLE_COLUMN]);

        normalize_genotype_in(&mut sample);

        if caller.reports_indel_depth_separately() && (record.is_indel() || !sample.contains_key("DP")) {
            if let Some(dpi) = sample.get("DPI").cloned() {
                sample.insert("DP".to_string(), dpi);
            }
        }

        let af = allele_frequency(
            sample.get("AD").map(String::as_str),
            sample.get("DP").map(String::as_str),
        );
        record.info.insert("AF".to_string(), af);

        for col in STAT_COLUMNS {
            if let Some(value) = sample.get(col).filter(|v| !v.is_empty()) {
                record.info.insert(col.to_string(), value.clone());
            }
        }

        record.samples = SampleData::Single(sample);
        Ok(record)
    }

    /// Parse a paired line, reading normal and tumor from the given columns
    ///
    /// Callers without paired `AD` get `AD`/`AF` derived per sample from
    /// their tiered read counts.
    pub fn parse_paired(
        line: &str,
        caller: CallerKind,
        normal_index: usize,
        tumor_index: usize,
    ) -> RecordResult<Self> {
        let columns = split_columns(line);
        let required = normal_index.max(tumor_index).max(MANDATORY_COLUMNS) + 1;
        let mut record = Self::parse_fixed(&columns, required)?;

        let mut normal = parse_sample(columns[8], columns[normal_index]);
        let mut tumor = parse_sample(columns[8], columns[tumor_index]);
        if !caller.lacks_paired_genotype() {
            normalize_genotype_in(&mut normal);
            normalize_genotype_in(&mut tumor);
        }
        if caller.derives_paired_allele_depth() {
            derive_tiered_allele_depth(&record.ref_allele, &record.alt, &mut normal);
            derive_tiered_allele_depth(&record.ref_allele, &record.alt, &mut tumor);
        }

        record.samples = SampleData::Paired { normal, tumor };
        Ok(record)
    }

    /// Parse a line as-is, without normalisation
    ///
    /// `paired_columns` gives the (normal, tumor) column indices; `None`
    /// reads the first sample column.
    pub fn read(line: &str, paired_columns: Option<(usize, usize)>) -> RecordResult<Self> {
        let columns = split_columns(line);
        match paired_columns {
            None => {
                let mut record = Self::parse_fixed(&columns, FIRST_SAMPLE_COLUMN + 1)?;
                record.samples = SampleData::Single(parse_sample(columns[8], columns[FIRST_SAMPLE_COLUMN]));
                Ok(record)
            }
            Some((normal_index, tumor_index)) => {
                let required = normal_index.max(tumor_index).max(MANDATORY_COLUMNS) + 1;
                let mut record = Self::parse_fixed(&columns, required)?;
                record.samples = SampleData::Paired {
                    normal: parse_sample(columns[8], columns[normal_index]),
                    tumor: parse_sample(columns[8], columns[tumor_index]),
                };
                Ok(record)
            }
        }
    }

    pub fn key(&self) -> VariantKey {
        VariantKey {
            chrom: self.chrom.clone(),
            pos: self.pos.clone(),
            ref_allele: self.ref_allele.clone(),
            alt: self.alt.clone(),
        }
    }

    /// REF and ALT lengths differ
    pub fn is_indel(&self) -> bool {
        self.ref_allele.len() != self.alt.len()
    }

    /// Multi-allelic, spanning-deletion or symbolic ALT
    pub fn has_complex_alt(&self) -> bool {
        self.alt.contains(',') || self.alt.contains('*') || self.alt.starts_with('<')
    }

    /// Project onto a reduced schema
    ///
    /// Single-sample: INFO value first, falling back to the sample value.
    /// Paired: a direct INFO match, else the `_normal`/`_tumor` column of
    /// the matching sample. Missing values become `.`; a `GT` missing
    /// from either sample is `.` on both.
    pub fn select_info(&mut self, selection: &FieldSelection) {
        let mut info = FieldMap::with_capacity(selection.info.len());

        match &mut self.samples {
            SampleData::Single(sample) => {
                for (key, field) in &selection.info {
                    let value = self
                        .info
                        .get(key)
                        .filter(|v| !v.is_empty())
                        .or_else(|| sample.get(key));
                    info.insert(field.id.clone(), or_missing(value));
                }

                let mut reduced = FieldMap::with_capacity(selection.format.len());
                for (key, field) in &selection.format {
                    reduced.insert(field.id.clone(), or_missing(sample.get(key)));
                }
                *sample = reduced;
            }
            SampleData::Paired { normal, tumor } => {
                for (key, field) in &selection.info {
                    let value = if let Some(v) = self.info.get(key) {
                        Some(v)
                    } else if let Some(base) = key.strip_suffix(&format!("_{}", NORMAL)) {
                        normal.get(base)
                    } else if let Some(base) = key.strip_suffix(&format!("_{}", TUMOR)) {
                        tumor.get(base)
                    } else {
                        None
                    };
                    info.insert(field.id.clone(), or_missing(value));
                }

                let mut reduced_normal = FieldMap::new();
                let mut reduced_tumor = FieldMap::new();
                for (key, field) in &selection.format {
                    let (n, t) = match (normal.get(key), tumor.get(key)) {
                        (Some(n), Some(t)) => (or_missing(Some(n)), or_missing(Some(t))),
                        _ if key == GENOTYPE => (".".to_string(), ".".to_string()),
                        (n, t) => (or_missing(n), or_missing(t)),
                    };
                    reduced_normal.insert(field.id.clone(), n);
                    reduced_tumor.insert(field.id.clone(), t);
                }
                *normal = reduced_normal;
                *tumor = reduced_tumor;
            }
        }

        self.info = info;
    }

    /// Replace INFO with the merged map and add cross-caller statistics
    ///
    /// Adds `Identified` (contributing callers joined by `-`) and, for
    /// each requested depth column, `<col>_mean`/`<col>_sd` computed over
    /// the contributors' `<col>_<caller>` values. The mean is also written
    /// into the sample column under the plain column name. Paired records
    /// get `<col>_mean_normal`, `<col>_sd_normal`, `<col>_mean_tumor` and
    /// `<col>_sd_tumor` from `<col>_<sample>_<caller>`.
    pub fn combine_info<S: AsRef<str>>(&mut self, columns: &[S], callers: &[&str], merged: FieldMap) {
        self.info = merged;
        self.info.insert("Identified".to_string(), callers.join("-"));

        for col in STAT_COLUMNS {
            if !columns.iter().any(|c| c.as_ref() == col) {
                continue;
            }
            match &mut self.samples {
                SampleData::Single(sample) => {
                    let values: Vec<&str> = callers
                        .iter()
                        .filter_map(|caller| self.info.get(&format!("{}_{}", col, caller)))
                        .map(String::as_str)
                        .collect();
                    let (mean, sd) = column_summary(&values);
                    self.info.insert(format!("{}_mean", col), mean.clone());
                    self.info.insert(format!("{}_sd", col), sd);
                    sample.insert(col.to_string(), mean);
                }
                SampleData::Paired { normal, tumor } => {
                    for (name, sample) in [(NORMAL, normal), (TUMOR, tumor)] {
                        let values: Vec<&str> = callers
                            .iter()
                            .filter_map(|caller| self.info.get(&format!("{}_{}_{}", col, name, caller)))
                            .map(String::as_str)
                            .collect();
                        let (mean, sd) = column_summary(&values);
                        self.info.insert(format!("{}_mean_{}", col, name), mean.clone());
                        self.info.insert(format!("{}_sd_{}", col, name), sd);
                        sample.insert(col.to_string(), mean);
                    }
                }
            }
        }
    }

    /// Serialise as one newline-terminated line
    pub fn write(&self) -> String {
        let mut output = String::with_capacity(256);

        for column in [&self.chrom, &self.pos, &self.id, &self.ref_allele, &self.alt, &self.qual, &self.filter] {
            output.push_str(column);
            output.push('\t');
        }

        if self.info.is_empty() {
            output.push('.');
        } else {
            let info: Vec<String> = self.info.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
            output.push_str(&info.join(";"));
        }
        output.push('\t');

        match &self.samples {
            SampleData::Single(sample) => {
                push_sample_columns(&mut output, sample.keys(), &[sample]);
            }
            SampleData::Paired { normal, tumor } => {
                push_sample_columns(&mut output, normal.keys(), &[normal, tumor]);
            }
        }

        output.push('\n');
        output
    }
}

/// FORMAT column followed by one column per sample, aligned to `names`
fn push_sample_columns<'a>(
    output: &mut String,
    names: impl Iterator<Item = &'a String>,
    samples: &[&FieldMap],
) {
    let names: Vec<&String> = names.collect();
    if names.is_empty() {
        output.push('.');
        for _ in samples {
            output.push_str("\t.");
        }
        return;
    }

    output.push_str(&names.iter().map(|n| n.as_str()).collect::<Vec<_>>().join(":"));
    for sample in samples {
        let values: Vec<&str> = names
            .iter()
            .map(|n| sample.get(*n).map(String::as_str).unwrap_or("."))
            .collect();
        output.push('\t');
        output.push_str(&values.join(":"));
    }
}
