//! Read-support annotation from pileup text
//!
//! Parses `samtools mpileup` output into a table keyed by
//! `(chromosome, position)`, derives strand-aware reference and
//! alternate read counts for each variant, and writes them as nine
//! `PMC*` FORMAT fields.

use super::header::{HeaderField, Section};
use super::record::{FieldMap, SampleData, VariantRecord};
use crate::core::config::{AnnotateConfig, PileupInputs, SampleLayout};
use crate::core::io::{create_output, open_input, LineIterator};
use crate::core::stats::{format_decimal, round2};
use crate::core::{RecordParseError, Result, SourceError, SourceResult};
use log::info;
use std::collections::HashMap;
use std::io::{BufRead, Write};
use std::path::Path;

/// FORMAT identifiers written by [`VariantRecord::add_read_support`], in order
pub const READ_SUPPORT_FIELDS: [&str; 9] = [
    "PMCDP", "PMCRD", "PMCAD", "PMCFREQ", "PMCRDF", "PMCRDR", "PMCADF", "PMCADR", "PMCBDIR",
];

/// Pileup columns: chrom, pos, ref base, depth, read bases, qualities
const DEPTH_COLUMN: usize = 3;
const BASES_COLUMN: usize = 4;

/// Depth and read-base string at one position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PileupEntry {
    pub depth: u64,
    pub bases: String,
}

/// Remove read-start (`^` plus mapping quality) and read-end (`$`) markers
pub fn strip_read_markers(bases: &str) -> String {
    let mut cleaned = String::with_capacity(bases.len());
    let mut chars = bases.chars();
    while let Some(c) = chars.next() {
        match c {
            '^' => {
                chars.next();
            }
            '$' => {}
            _ => cleaned.push(c),
        }
    }
    cleaned
}

/// Remove `+N<seq>` / `-N<seq>` indel notation
pub fn strip_indels(bases: &str) -> String {
    let bytes = bases.as_bytes();
    let mut cleaned = String::with_capacity(bases.len());
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if b == b'+' || b == b'-' {
            let digits = bytes[i + 1..].iter().take_while(|d| d.is_ascii_digit()).count();
            if digits > 0 {
                let length: usize = bases[i + 1..i + 1 + digits].parse().unwrap_or(0);
                i = (i + 1 + digits + length).min(bytes.len());
                continue;
            }
        }
        cleaned.push(b as char);
        i += 1;
    }
    cleaned
}

/// Non-overlapping occurrences of `needle`
fn count(haystack: &str, needle: &str) -> usize {
    if needle.is_empty() {
        0
    } else {
        haystack.matches(needle).count()
    }
}

/// Pileup entries by `(chromosome, position)`
#[derive(Debug, Clone, Default)]
pub struct PileupTable {
    entries: HashMap<(String, u64), PileupEntry>,
}

impl PileupTable {
    pub fn load<P: AsRef<Path>>(path: P) -> SourceResult<Self> {
        let path = path.as_ref();
        Self::from_reader(&path.display().to_string(), open_input(path)?)
    }

    /// Parse pileup text; a later line for the same position replaces the earlier one
    pub fn from_reader<R: BufRead>(name: &str, reader: R) -> SourceResult<Self> {
        let mut entries = HashMap::new();
        let mut lines = LineIterator::new(reader);
        let mut line_number = 0usize;

        while let Some(line) = lines.next_line() {
            let line = line?;
            line_number += 1;
            if line.trim().is_empty() {
                continue;
            }

            let error = |source| SourceError::Record {
                path: name.to_string(),
                line: line_number,
                source,
            };
            let columns: Vec<&str> = line.split('\t').collect();
            if columns.len() <= DEPTH_COLUMN {
                return Err(error(RecordParseError::TooFewFields {
                    expected: DEPTH_COLUMN + 1,
                    found: columns.len(),
                }));
            }
            let pos = columns[1]
                .parse::<u64>()
                .map_err(|_| error(RecordParseError::InvalidNumber("POS", columns[1].to_string())))?;
            let depth = columns[DEPTH_COLUMN].trim().parse::<u64>().map_err(|_| {
                error(RecordParseError::InvalidNumber("depth", columns[DEPTH_COLUMN].to_string()))
            })?;
            let bases = columns.get(BASES_COLUMN).map(|b| strip_read_markers(b)).unwrap_or_default();

            entries.insert((columns[0].to_string(), pos), PileupEntry { depth, bases });
        }

        info!("Loaded {} pileup positions from {}", entries.len(), name);
        Ok(Self { entries })
    }

    pub fn get(&self, chrom: &str, pos: u64) -> Option<&PileupEntry> {
        self.entries.get(&(chrom.to_string(), pos))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Read counts supporting one variant in one sample
#[derive(Debug, Clone, PartialEq)]
pub struct ReadSupport {
    pub depth: u64,
    pub ref_forward: usize,
    pub ref_reverse: usize,
    pub alt_forward: usize,
    pub alt_reverse: usize,
    /// `alt / depth` rounded to 2 decimals; `None` without alternate reads
    pub frequency: Option<f64>,
}

impl ReadSupport {
    /// Derive counts for `ref_allele > alt` from a pileup entry
    ///
    /// Same-length alleles count the ALT bases after removing indel
    /// notation. Insertions (1-base REF) and deletions (1-base ALT) count
    /// `+N<seq>`/`-N<seq>` and take those reads off the reference counts.
    /// Any other shape has no alternate support.
    pub fn derive(ref_allele: &str, alt: &str, entry: Option<&PileupEntry>) -> Self {
        let Some(entry) = entry else {
            return Self::absent();
        };

        let bases = entry.bases.as_str();
        let mut ref_forward = count(bases, ".");
        let mut ref_reverse = count(bases, ",");

        let (alt_forward, alt_reverse) = if ref_allele.len() == alt.len() {
            let cleaned = strip_indels(bases);
            (count(&cleaned, alt), count(&cleaned, &alt.to_lowercase()))
        } else if ref_allele.len() == 1 && alt.len() > 1 {
            let inserted = &alt[1..];
            let pattern = format!("+{}{}", inserted.len(), inserted);
            (count(bases, &pattern), count(bases, &pattern.to_lowercase()))
        } else if ref_allele.len() > 1 && alt.len() == 1 {
            let deleted = &ref_allele[1..];
            let pattern = format!("-{}{}", deleted.len(), deleted);
            (count(bases, &pattern), count(bases, &pattern.to_lowercase()))
        } else {
            (0, 0)
        };

        // Indel reads also show the reference match before the indel
        if ref_allele.len() != alt.len() {
            ref_forward = ref_forward.saturating_sub(alt_forward);
            ref_reverse = ref_reverse.saturating_sub(alt_reverse);
        }

        let alt_reads = alt_forward + alt_reverse;
        let frequency = (alt_reads > 0 && entry.depth > 0).then(|| round2(alt_reads as f64 / entry.depth as f64));

        Self {
            depth: entry.depth,
            ref_forward,
            ref_reverse,
            alt_forward,
            alt_reverse,
            frequency,
        }
    }

    /// Defaults for a position without pileup data
    pub fn absent() -> Self {
        Self {
            depth: 0,
            ref_forward: 0,
            ref_reverse: 0,
            alt_forward: 0,
            alt_reverse: 0,
            frequency: None,
        }
    }

    pub fn ref_reads(&self) -> usize {
        self.ref_forward + self.ref_reverse
    }

    pub fn alt_reads(&self) -> usize {
        self.alt_forward + self.alt_reverse
    }

    /// `T` when both strands carry the alternate, `F` for one strand, `N/A` for none
    pub fn bidirectional(&self) -> &'static str {
        match (self.alt_forward, self.alt_reverse) {
            (0, 0) => "N/A",
            (f, r) if f > 0 && r > 0 => "T",
            _ => "F",
        }
    }

    /// Values in [`READ_SUPPORT_FIELDS`] order
    pub fn values(&self) -> [String; 9] {
        let frequency = match self.frequency {
            Some(f) if self.alt_reads() > 0 => format_decimal(f),
            _ => ".".to_string(),
        };
        [
            self.depth.to_string(),
            self.ref_reads().to_string(),
            self.alt_reads().to_string(),
            frequency,
            self.ref_forward.to_string(),
            self.ref_reverse.to_string(),
            self.alt_forward.to_string(),
            self.alt_reverse.to_string(),
            self.bidirectional().to_string(),
        ]
    }
}

impl VariantRecord {
    /// Append the `PMC*` fields to each sample (normal then tumor when paired)
    pub fn add_read_support(&mut self, support: &[ReadSupport]) {
        let apply = |sample: &mut FieldMap, support: &ReadSupport| {
            for (name, value) in READ_SUPPORT_FIELDS.iter().zip(support.values()) {
                sample.insert(name.to_string(), value);
            }
        };
        match &mut self.samples {
            SampleData::Single(sample) => {
                if let Some(s) = support.first() {
                    apply(sample, s);
                }
            }
            SampleData::Paired { normal, tumor } => {
                if let Some(s) = support.first() {
                    apply(normal, s);
                }
                if let Some(s) = support.get(1) {
                    apply(tumor, s);
                }
            }
        }
    }
}

/// FORMAT descriptors of the read-support fields
pub fn read_support_header() -> Vec<HeaderField> {
    const SUFFIX: &str = " - Calculated from pileup";
    let specs: [(&str, &str, &str, &str); 9] = [
        ("PMCDP", "1", "Integer", "Total read depth (includes bases supporting other alleles)"),
        ("PMCRD", "1", "Integer", "Depth of reference-supporting bases"),
        ("PMCAD", "A", "Integer", "Depth of alternate-supporting bases"),
        ("PMCFREQ", "A", "Float", "Variant allele frequency"),
        ("PMCRDF", "1", "String", "Depth of reference-supporting bases on forward strand"),
        ("PMCRDR", "1", "String", "Depth of reference-supporting bases on reverse strand"),
        ("PMCADF", "A", "String", "Depth of alternate-supporting bases on forward strand"),
        ("PMCADR", "A", "String", "Depth of alternate-supporting bases on reverse strand"),
        ("PMCBDIR", "A", "String", "T/F indicating if variant is bidirectional (N/A if no alt reads)"),
    ];
    specs
        .iter()
        .map(|(id, number, ty, description)| {
            HeaderField::new(Section::Format, *id, *number, *ty, format!("{}{}", description, SUFFIX))
        })
        .collect()
}

/// Pileup tables for the samples of one annotation run
#[derive(Debug, Clone)]
pub enum PileupTables {
    Single(PileupTable),
    Paired { normal: PileupTable, tumor: PileupTable },
}

impl PileupTables {
    pub fn load(inputs: &PileupInputs) -> SourceResult<Self> {
        Ok(match inputs {
            PileupInputs::Single(path) => PileupTables::Single(PileupTable::load(path)?),
            PileupInputs::Paired { normal, tumor } => PileupTables::Paired {
                normal: PileupTable::load(normal)?,
                tumor: PileupTable::load(tumor)?,
            },
        })
    }

    fn support_for(&self, record: &VariantRecord) -> Vec<ReadSupport> {
        let pos = record.pos.parse::<u64>().ok();
        let derive = |table: &PileupTable| {
            let entry = pos.and_then(|pos| table.get(&record.chrom, pos));
            ReadSupport::derive(&record.ref_allele, &record.alt, entry)
        };
        match self {
            PileupTables::Single(table) => vec![derive(table)],
            PileupTables::Paired { normal, tumor } => vec![derive(normal), derive(tumor)],
        }
    }
}

/// Counts from one annotation run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnnotateSummary {
    pub records: usize,
    /// Records with pileup data for at least one sample
    pub covered: usize,
}

/// Stream a VCF, adding read-support fields to every record
///
/// Metadata passes through and the `PMC*` descriptors go just before the
/// column header. In paired mode the sample columns are found by id and
/// the header's last two columns become the normal and tumor ids.
pub fn annotate<R: BufRead, W: Write>(
    name: &str,
    reader: R,
    writer: &mut W,
    layout: &SampleLayout,
    tables: &PileupTables,
) -> Result<AnnotateSummary> {
    let mut lines = LineIterator::new(reader);
    let mut line_number = 0usize;
    let mut sample_columns: Option<(usize, usize)> = None;
    let mut seen_header = false;
    let mut summary = AnnotateSummary::default();

    while let Some(line) = lines.next_line() {
        let line = line?;
        line_number += 1;

        if line.starts_with("##") {
            writeln!(writer, "{}", line)?;
            continue;
        }

        if line.starts_with('#') {
            for field in read_support_header() {
                writeln!(writer, "{}", field.render())?;
            }
            let mut columns: Vec<&str> = line.split('\t').collect();
            if let SampleLayout::Paired { normal_id, tumor_id } = layout {
                let find = |id: &str| {
                    columns.iter().position(|c| c.trim() == id).ok_or_else(|| SourceError::MissingSampleColumn {
                        path: name.to_string(),
                        label: id.to_string(),
                    })
                };
                sample_columns = Some((find(normal_id)?, find(tumor_id)?));
                let keep = columns.len().saturating_sub(2);
                columns.truncate(keep);
                columns.push(normal_id);
                columns.push(tumor_id);
            }
            writeln!(writer, "{}", columns.join("\t"))?;
            seen_header = true;
            continue;
        }

        if line.trim().is_empty() {
            continue;
        }
        if !seen_header {
            return Err(SourceError::MissingColumnHeader { path: name.to_string() }.into());
        }

        let mut record = VariantRecord::read(line, sample_columns).map_err(|source| SourceError::Record {
            path: name.to_string(),
            line: line_number,
            source,
        })?;
        let support = tables.support_for(&record);
        if support.iter().any(|s| s.depth > 0) {
            summary.covered += 1;
        }
        record.add_read_support(&support);
        writer.write_all(record.write().as_bytes())?;
        summary.records += 1;
    }

    Ok(summary)
}

/// Run the annotator over files
pub fn run_annotate(config: &AnnotateConfig) -> Result<AnnotateSummary> {
    config.validate()?;
    let tables = PileupTables::load(&config.pileups)?;

    let name = config.input.display().to_string();
    let reader = open_input(&config.input)?;
    let mut output = create_output(&config.output)?;
    let summary = annotate(&name, reader, &mut output, &config.layout, &tables)?;
    output.flush()?;

    info!(
        "Annotated {} variants ({} with pileup data) into {}",
        summary.records,
        summary.covered,
        config.output.display()
    );
    Ok(summary)
}
