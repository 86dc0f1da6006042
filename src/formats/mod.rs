//! VCF format adapters
//!
//! Metadata descriptors, schema selection, data records, per-file
//! ingestion and pileup-based read-support annotation.

pub mod header;
pub mod pileup;
pub mod record;
pub mod selector;
pub mod source;

pub use header::{paired_stats_header, single_stats_header, HeaderField, Section};
pub use pileup::{annotate, run_annotate, AnnotateSummary, PileupEntry, PileupTable, PileupTables, ReadSupport};
pub use record::{normalize_genotype, FieldMap, SampleData, VariantKey, VariantRecord};
pub use selector::{select_paired, select_single, FieldSelection};
pub use source::SourceFile;
