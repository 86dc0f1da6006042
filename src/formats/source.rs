//! Per-file ingestion
//!
//! A [`SourceFile`] reads one caller's VCF completely into memory:
//! metadata up to the `#CHROM` line, the caller identity, the reduced
//! schema, and every record keyed by [`VariantKey`].

use super::header::{
    is_descriptor_line, HeaderField, Section, ALLELE_FREQUENCY_LINE, DERIVED_ALLELE_DEPTH_LINE,
    DERIVED_ALLELE_FREQUENCY_LINE,
};
use super::record::{VariantKey, VariantRecord};
use super::selector::{select_paired, select_single, FieldSelection, HeaderMap};
use crate::core::caller::{parse_source_line, CallerKind};
use crate::core::config::SampleLayout;
use crate::core::io::{open_input, LineIterator};
use crate::core::{SourceError, SourceResult};
use indexmap::IndexMap;
use log::{debug, info, warn};
use std::io::BufRead;
use std::path::Path;

/// INFO `STATUS` value of germline calls mixed into somatic output
const GERMLINE_STATUS: &str = "Germline";

/// One input VCF, normalised to the reduced schema
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// File identity used in messages
    pub name: String,
    /// Caller name from the `##source=` line
    pub caller: String,
    /// Retained metadata lines followed by the rendered reduced schema
    pub meta_lines: Vec<String>,
    /// The literal `#CHROM` line
    pub column_header: String,
    pub selection: FieldSelection,
    /// Records by key; a later duplicate replaces the earlier record
    pub records: IndexMap<VariantKey, VariantRecord>,
    /// Records dropped by caller-specific exclusion rules
    pub excluded: usize,
}

/// Caller-declared descriptors that are dropped because the values are recomputed
fn is_recomputed(field: &HeaderField, layout: &SampleLayout) -> bool {
    match (layout.is_paired(), field.section, field.id.as_str()) {
        (_, Section::Info, "DP") => true,
        (false, Section::Format, "AF") => true,
        (true, Section::Info, "AF") => true,
        _ => false,
    }
}

impl SourceFile {
    /// Load and normalise a VCF file (plain, gzip or bzip2)
    pub fn load<P: AsRef<Path>, S: AsRef<str>>(
        path: P,
        columns: &[S],
        layout: &SampleLayout,
    ) -> SourceResult<Self> {
        let path = path.as_ref();
        let reader = open_input(path)?;
        Self::from_reader(&path.display().to_string(), reader, columns, layout)
    }

    /// Build from any line source; `name` identifies the file in errors
    pub fn from_reader<R: BufRead, S: AsRef<str>>(
        name: &str,
        reader: R,
        columns: &[S],
        layout: &SampleLayout,
    ) -> SourceResult<Self> {
        let mut lines = LineIterator::new(reader);
        let mut line_number = 0usize;

        let mut info_fields = HeaderMap::new();
        let mut format_fields = HeaderMap::new();
        let mut meta_lines = Vec::new();
        let mut caller: Option<String> = None;
        let mut column_header: Option<String> = None;

        while let Some(line) = lines.next_line() {
            let line = line?;
            line_number += 1;

            if !line.starts_with("##") {
                if line.starts_with('#') {
                    column_header = Some(line.to_string());
                    break;
                }
                if line.trim().is_empty() {
                    continue;
                }
                // Data before the column header
                break;
            }

            if is_descriptor_line(line) {
                let field = HeaderField::parse(line).map_err(|source| SourceError::Header {
                    path: name.to_string(),
                    source,
                })?;
                if is_recomputed(&field, layout) {
                    continue;
                }
                match field.section {
                    Section::Info => info_fields.insert(field.id.clone(), field),
                    Section::Format => format_fields.insert(field.id.clone(), field),
                };
            } else {
                if let Some(source) = parse_source_line(line) {
                    caller = Some(source.to_string());
                }
                meta_lines.push(line.to_string());
            }
        }

        let caller = caller
            .filter(|c| !c.is_empty())
            .ok_or_else(|| SourceError::MissingCaller { path: name.to_string() })?;
        let column_header = column_header.ok_or_else(|| SourceError::MissingColumnHeader {
            path: name.to_string(),
        })?;
        let kind = CallerKind::of(&caller);

        if !layout.is_paired() && kind.lacks_allele_frequency() {
            if let Ok(field) = HeaderField::parse(ALLELE_FREQUENCY_LINE) {
                info_fields.insert(field.id.clone(), field);
            }
        }
        if layout.is_paired() && kind.derives_paired_allele_depth() {
            for line in [DERIVED_ALLELE_DEPTH_LINE, DERIVED_ALLELE_FREQUENCY_LINE] {
                if let Ok(field) = HeaderField::parse(line) {
                    format_fields.entry(field.id.clone()).or_insert(field);
                }
            }
        }

        let selection = match layout {
            SampleLayout::Single => select_single(&info_fields, &format_fields, columns),
            SampleLayout::Paired { .. } => select_paired(&info_fields, &format_fields, columns),
        }
        .attribute_to(&caller);
        meta_lines.extend(selection.rendered_lines());

        let sample_columns = match layout {
            SampleLayout::Single => None,
            SampleLayout::Paired { normal_id, tumor_id } => Some(resolve_sample_columns(
                name,
                &column_header,
                kind,
                normal_id,
                tumor_id,
            )?),
        };

        let mut records = IndexMap::new();
        let mut excluded = 0usize;
        let mut complex = 0usize;

        while let Some(line) = lines.next_line() {
            let line = line?;
            line_number += 1;
            if line.trim().is_empty() {
                continue;
            }

            let parsed = match sample_columns {
                None => VariantRecord::parse_single(line, kind),
                Some((normal, tumor)) => VariantRecord::parse_paired(line, kind, normal, tumor),
            };
            let mut record = parsed.map_err(|source| SourceError::Record {
                path: name.to_string(),
                line: line_number,
                source,
            })?;

            if sample_columns.is_some()
                && kind.reports_germline_status()
                && record.info.get("STATUS").map(String::as_str) == Some(GERMLINE_STATUS)
            {
                debug!("{}: skipping germline call {}", name, record.key());
                excluded += 1;
                continue;
            }

            if record.has_complex_alt() {
                warn!("{}: multi-allelic or symbolic ALT accepted as-is at {}", name, record.key());
                complex += 1;
            }

            record.select_info(&selection);
            records.insert(record.key(), record);
        }

        info!(
            "Loaded {} variants from {} (caller: {}, excluded: {}, complex ALT: {})",
            records.len(),
            name,
            caller,
            excluded,
            complex
        );

        Ok(Self {
            name: name.to_string(),
            caller,
            meta_lines,
            column_header,
            selection,
            records,
            excluded,
        })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Locate the (normal, tumor) sample columns of a paired file
///
/// Callers with fixed labels are matched by label; otherwise the two
/// trailing columns must carry the expected sample ids, in either order.
pub fn resolve_sample_columns(
    name: &str,
    column_header: &str,
    kind: CallerKind,
    normal_id: &str,
    tumor_id: &str,
) -> SourceResult<(usize, usize)> {
    let columns: Vec<&str> = column_header.split('\t').map(str::trim).collect();

    if let Some((normal_label, tumor_label)) = kind.fixed_sample_labels() {
        let find = |label: &str| {
            columns
                .iter()
                .position(|c| *c == label)
                .ok_or_else(|| SourceError::MissingSampleColumn {
                    path: name.to_string(),
                    label: label.to_string(),
                })
        };
        return Ok((find(normal_label)?, find(tumor_label)?));
    }

    let n = columns.len();
    let mismatch = || SourceError::SampleMismatch {
        path: name.to_string(),
        normal: normal_id.to_string(),
        tumor: tumor_id.to_string(),
        found_first: columns.get(n.wrapping_sub(2)).copied().unwrap_or("").to_string(),
        found_second: columns.get(n.wrapping_sub(1)).copied().unwrap_or("").to_string(),
    };
    if n < 11 {
        return Err(mismatch());
    }

    let (first, second) = (n - 2, n - 1);
    if columns[first] == normal_id && columns[second] == tumor_id {
        Ok((first, second))
    } else if columns[first] == tumor_id && columns[second] == normal_id {
        Ok((second, first))
    } else {
        Err(mismatch())
    }
}
