//! Multi-caller merge
//!
//! Unions the records of ordered [`SourceFile`]s by [`VariantKey`],
//! overlays the contributors' INFO fields, adds cross-caller statistics
//! and writes the merged VCF, the combination report and an optional
//! regions list.

pub mod ordering;
pub mod report;

pub use ordering::{base_contributor, order_sources};
pub use report::{combination_report, combinations, write_report, ReportRow, RowKind};

use crate::core::config::{CombineConfig, SampleLayout};
use crate::core::io::create_output;
use crate::core::Result;
use crate::formats::header::{paired_stats_header, single_stats_header};
use crate::formats::record::{FieldMap, VariantKey, VariantRecord};
use crate::formats::source::SourceFile;
use indexmap::{IndexMap, IndexSet};
use log::info;
use std::collections::HashSet;
use std::io::{self, Write};

/// Fixed leading columns of a paired output header
const PAIRED_COLUMN_PREFIX: &str = "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT";

/// Outcome of a merge run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeSummary {
    /// Callers in merge order
    pub callers: Vec<String>,
    /// Records per caller after exclusion and deduplication
    pub caller_counts: Vec<usize>,
    /// Records dropped by caller exclusion rules
    pub excluded: usize,
    /// Unique keys written
    pub merged: usize,
    /// Keys reported by more than one caller
    pub shared: usize,
}

/// Ordered sources plus the key union built from them
#[derive(Debug)]
pub struct MergeEngine {
    sources: Vec<SourceFile>,
    columns: Vec<String>,
    layout: SampleLayout,
    /// Key -> contributing source indices, in caller order
    union: IndexMap<VariantKey, Vec<usize>>,
}

impl MergeEngine {
    /// Build the key union; `sources` must already be in caller order
    pub fn new<S: AsRef<str>>(sources: Vec<SourceFile>, columns: &[S], layout: SampleLayout) -> Self {
        let mut union: IndexMap<VariantKey, Vec<usize>> = IndexMap::new();
        for (index, source) in sources.iter().enumerate() {
            for key in source.records.keys() {
                union.entry(key.clone()).or_default().push(index);
            }
        }

        Self {
            sources,
            columns: columns.iter().map(|c| c.as_ref().to_string()).collect(),
            layout,
            union,
        }
    }

    pub fn callers(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.caller.as_str()).collect()
    }

    /// Number of unique keys
    pub fn len(&self) -> usize {
        self.union.len()
    }

    pub fn is_empty(&self) -> bool {
        self.union.is_empty()
    }

    /// Contributing source indices of a key
    pub fn contributors(&self, key: &VariantKey) -> Option<&[usize]> {
        self.union.get(key).map(Vec::as_slice)
    }

    /// Deduplicated metadata (first occurrence wins) plus the statistics block
    pub fn header_lines(&self) -> Vec<String> {
        let mut lines: IndexSet<String> = self
            .sources
            .iter()
            .flat_map(|s| s.meta_lines.iter().cloned())
            .collect();

        let stats = if self.layout.is_paired() {
            paired_stats_header()
        } else {
            single_stats_header()
        };
        lines.extend(stats.iter().map(|field| field.render()));
        lines.into_iter().collect()
    }

    /// The `#CHROM` line of the merged file
    pub fn column_header(&self) -> String {
        match &self.layout {
            SampleLayout::Paired { normal_id, tumor_id } => {
                format!("{}\t{}\t{}", PAIRED_COLUMN_PREFIX, normal_id, tumor_id)
            }
            SampleLayout::Single => self
                .sources
                .first()
                .map(|s| s.column_header.clone())
                .unwrap_or_else(|| format!("{}\tSAMPLE", PAIRED_COLUMN_PREFIX)),
        }
    }

    /// Merge the records of one key
    ///
    /// Contributors' INFO maps are overlaid in caller order, so a later
    /// caller overwrites an earlier caller's same-named field.
    pub fn merged_record(&self, key: &VariantKey) -> Option<VariantRecord> {
        let contributors = self.contributors(key)?;
        let callers = self.callers();

        let mut merged = FieldMap::new();
        for &index in contributors {
            if let Some(record) = self.sources[index].records.get(key) {
                for (name, value) in &record.info {
                    merged.insert(name.clone(), value.clone());
                }
            }
        }

        let base = base_contributor(contributors, &callers, self.layout.is_paired())?;
        let mut record = self.sources[base].records.get(key)?.clone();
        let names: Vec<&str> = contributors.iter().map(|&i| callers[i]).collect();
        record.combine_info(&self.columns, &names, merged);
        Some(record)
    }

    /// Merged records in union order (caller order, then file order)
    pub fn merged_records(&self) -> impl Iterator<Item = VariantRecord> + '_ {
        self.union.keys().filter_map(move |key| self.merged_record(key))
    }

    /// Write the merged VCF; returns the number of records written
    pub fn write_vcf<W: Write>(&self, writer: &mut W) -> io::Result<usize> {
        for line in self.header_lines() {
            writeln!(writer, "{}", line)?;
        }
        writeln!(writer, "{}", self.column_header())?;

        let mut written = 0;
        for record in self.merged_records() {
            writer.write_all(record.write().as_bytes())?;
            written += 1;
        }
        Ok(written)
    }

    /// Combination counts over each caller's raw key set
    pub fn report(&self) -> Vec<ReportRow> {
        let key_sets: Vec<HashSet<&VariantKey>> = self
            .sources
            .iter()
            .map(|s| s.records.keys().collect())
            .collect();
        combination_report(&self.callers(), &key_sets)
    }

    /// `chrom\tpos` for every merged key, in merge order
    pub fn write_regions<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        for key in self.union.keys() {
            writeln!(writer, "{}\t{}", key.chrom, key.pos)?;
        }
        Ok(())
    }

    pub fn summary(&self) -> MergeSummary {
        MergeSummary {
            callers: self.sources.iter().map(|s| s.caller.clone()).collect(),
            caller_counts: self.sources.iter().map(SourceFile::len).collect(),
            excluded: self.sources.iter().map(|s| s.excluded).sum(),
            merged: self.union.len(),
            shared: self.union.values().filter(|c| c.len() > 1).count(),
        }
    }
}

/// Run a full merge
///
/// Every configuration and ingestion failure is raised before the first
/// output file is created.
pub fn run_combine(config: &CombineConfig) -> Result<MergeSummary> {
    config.validate()?;

    let mut sources = Vec::with_capacity(config.inputs.len());
    for path in &config.inputs {
        sources.push(SourceFile::load(path, &config.columns, &config.layout)?);
    }
    let sources = order_sources(sources, config.priority.as_deref())?;

    let engine = MergeEngine::new(sources, &config.columns, config.layout.clone());
    info!(
        "Merging {} unique variants from callers: {}",
        engine.len(),
        engine.callers().join(", ")
    );

    let mut output = create_output(&config.output)?;
    let written = engine.write_vcf(&mut output)?;
    output.flush()?;
    info!("Wrote {} merged variants to {}", written, config.output.display());

    let mut summary_file = create_output(&config.summary)?;
    write_report(&mut summary_file, &engine.report())?;
    summary_file.flush()?;
    info!("Wrote combination report to {}", config.summary.display());

    if let Some(regions) = &config.regions {
        let mut regions_file = create_output(regions)?;
        engine.write_regions(&mut regions_file)?;
        regions_file.flush()?;
        info!("Wrote variant positions to {}", regions.display());
    }

    Ok(engine.summary())
}
