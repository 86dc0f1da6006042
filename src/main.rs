//! vcf-combine CLI entry point
//!
//! Merges VCFs from several callers and annotates VCFs with pileup read support.

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use vcf_combine::core::{AnnotateConfig, CombineConfig, SampleLayout, DEFAULT_SUMMARY_PATH};
use vcf_combine::{run_annotate, run_combine};
use std::path::PathBuf;
use std::time::Instant;

/// Sample layout of the input VCFs (CLI enum)
#[derive(Clone, Copy, Debug, ValueEnum)]
enum ModeArg {
    /// One sample column (germline or tumour-only)
    #[value(name = "germline", alias = "single")]
    Germline,
    /// Normal and tumor sample columns
    #[value(name = "somatic", alias = "paired")]
    Somatic,
}

impl ModeArg {
    fn layout(self, normal: Option<String>, tumor: Option<String>) -> anyhow::Result<SampleLayout> {
        SampleLayout::from_parts(matches!(self, ModeArg::Somatic), normal, tumor)
            .context("Invalid sample layout")
    }
}

#[derive(Parser)]
#[command(name = "vcf-combine")]
#[command(about = "Normalise and merge VCF files from multiple variant callers")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge VCFs from several callers into one file
    Combine {
        /// Input VCF (repeat for each caller)
        #[arg(short = 'i', long = "input", required = true)]
        inputs: Vec<PathBuf>,
        /// INFO/FORMAT identifiers to keep, comma separated
        #[arg(long, value_delimiter = ',', required = true)]
        columns: Vec<String>,
        /// Input type
        #[arg(long = "type", value_enum)]
        mode: ModeArg,
        /// Caller priority, comma separated (default: alphabetical)
        #[arg(long, value_delimiter = ',')]
        priority: Option<Vec<String>>,
        /// Normal sample id (somatic only)
        #[arg(long = "normal")]
        normal_id: Option<String>,
        /// Tumor sample id (somatic only)
        #[arg(long = "tumor")]
        tumor_id: Option<String>,
        /// Write `chrom<TAB>pos` of every merged variant here
        #[arg(long)]
        regions: Option<PathBuf>,
        /// Combination-count report
        #[arg(long, default_value = DEFAULT_SUMMARY_PATH)]
        summary: PathBuf,
        /// Output VCF
        #[arg(short = 'o', long)]
        output: PathBuf,
    },
    /// Add pileup read-support fields to a VCF
    Annotate {
        /// Input VCF
        #[arg(short = 'i', long = "input")]
        input: PathBuf,
        /// Input type
        #[arg(long = "type", value_enum)]
        mode: ModeArg,
        /// Pileup of the sample (germline only)
        #[arg(long)]
        mpileup: Option<PathBuf>,
        /// Pileup of the normal sample (somatic only)
        #[arg(long = "normal-mpileup")]
        normal_mpileup: Option<PathBuf>,
        /// Pileup of the tumor sample (somatic only)
        #[arg(long = "tumor-mpileup")]
        tumor_mpileup: Option<PathBuf>,
        /// Normal sample id (somatic only)
        #[arg(long = "normal")]
        normal_id: Option<String>,
        /// Tumor sample id (somatic only)
        #[arg(long = "tumor")]
        tumor_id: Option<String>,
        /// Output VCF
        #[arg(short = 'o', long)]
        output: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    let start = Instant::now();

    match cli.command {
        Commands::Combine {
            inputs,
            columns,
            mode,
            priority,
            normal_id,
            tumor_id,
            regions,
            summary,
            output,
        } => {
            let layout = mode.layout(normal_id, tumor_id)?;
            let columns: Vec<String> = columns
                .into_iter()
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
                .collect();

            let mut config = CombineConfig::new(inputs, columns, output, layout);
            config.priority = priority;
            config.regions = regions;
            config.summary = summary;

            let stats = run_combine(&config).context("Failed to combine VCF files")?;

            eprintln!("\n=== Merge Statistics ===");
            for (caller, count) in stats.callers.iter().zip(&stats.caller_counts) {
                eprintln!("{:<16} {}", caller, count);
            }
            eprintln!("Merged:          {}", stats.merged);
            eprintln!("Shared:          {}", stats.shared);
            eprintln!("Excluded:        {}", stats.excluded);
            eprintln!("Time elapsed:    {:.2}s", start.elapsed().as_secs_f64());
        }

        Commands::Annotate {
            input,
            mode,
            mpileup,
            normal_mpileup,
            tumor_mpileup,
            normal_id,
            tumor_id,
            output,
        } => {
            let layout = mode.layout(normal_id, tumor_id)?;
            let config = AnnotateConfig::new(input, output, layout, mpileup, normal_mpileup, tumor_mpileup)
                .context("Invalid annotate options")?;

            let stats = run_annotate(&config).context("Failed to annotate VCF file")?;

            eprintln!("\n=== Annotation Statistics ===");
            eprintln!("Total records:   {}", stats.records);
            eprintln!("With pileup:     {}", stats.covered);
            eprintln!("Time elapsed:    {:.2}s", start.elapsed().as_secs_f64());
        }
    }

    Ok(())
}
