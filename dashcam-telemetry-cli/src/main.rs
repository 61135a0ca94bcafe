//! Dashcam Telemetry CLI Application
//!
//! This is the command-line interface for the dashcam telemetry extractor.
//! It uses the dashcam-telemetry library and adds:
//! - Batch extraction of many recordings in parallel
//! - Output naming and format selection
//! - Track summaries (text or JSON)

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use dashcam_telemetry::{ExportFormat, ExtractConfig, TelemetryExtractor};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

mod config;
mod report;

use config::AppConfig;
use report::FileOutcome;

/// Dashcam Telemetry - Extract GPS tracks from dashcam MP4 files
#[derive(Parser, Debug)]
#[command(name = "dashcam-telemetry")]
#[command(about = "Extract GPS telemetry from dashcam MP4 files", long_about = None)]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Path to configuration file (TOML)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Verbosity level (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all log output except errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract tracks and write them in an export format
    Extract {
        /// Dashcam recordings to process
        #[arg(required = true, value_name = "FILE")]
        inputs: Vec<PathBuf>,

        /// Output file (single input only)
        #[arg(short, long, value_name = "FILE", conflicts_with = "output_dir")]
        output: Option<PathBuf>,

        /// Directory for output files (default: next to each input)
        #[arg(long, value_name = "DIR")]
        output_dir: Option<PathBuf>,

        /// Export format: gpx, geojson, kml or csv
        #[arg(short, long, value_name = "FORMAT")]
        format: Option<ExportFormat>,

        /// Drop points without a fix or with out-of-range coordinates
        #[arg(long)]
        skip_invalid: bool,

        /// Do not sweep media data for embedded telemetry
        #[arg(long)]
        no_deep_scan: bool,
    },

    /// Show what a recording contains
    Info {
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// List supported telemetry and export formats
    Formats,
}

fn main() -> Result<ExitCode> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    init_logging(args.verbose, args.quiet);

    log::info!("Dashcam Telemetry CLI v{}", env!("CARGO_PKG_VERSION"));
    log::debug!("Using telemetry library v{}", dashcam_telemetry::VERSION);

    let app_config = match &args.config {
        Some(path) => {
            log::info!("Loading configuration from: {:?}", path);
            config::load_config(path)?
        }
        None => AppConfig::default(),
    };

    let extractor = TelemetryExtractor::new();

    match args.command {
        Command::Extract {
            inputs,
            output,
            output_dir,
            format,
            skip_invalid,
            no_deep_scan,
        } => {
            let mut extract_config = app_config.extract.clone();
            if skip_invalid {
                extract_config.skip_invalid = true;
            }
            if no_deep_scan {
                extract_config.deep_scan = false;
            }

            let plan = OutputPlan::new(output, output_dir, format, &app_config);
            if plan.file.is_some() && inputs.len() > 1 {
                bail!("--output takes a single input, got {}; use --output-dir", inputs.len());
            }

            let outcomes: Vec<FileOutcome> = inputs
                .par_iter()
                .map(|input| process_file(&extractor, input, &plan, &extract_config))
                .collect();

            let failed = report::print_batch_summary(&outcomes);
            Ok(if failed > 0 { ExitCode::FAILURE } else { ExitCode::SUCCESS })
        }

        Command::Info { input, json } => {
            let extract_config = app_config.extract.clone();
            let format = extractor
                .detect(&input, &extract_config)
                .with_context(|| format!("Failed to detect telemetry in {:?}", input))?;
            let track = format
                .parse(&input, &extract_config)
                .with_context(|| format!("Failed to decode {:?}", input))?;

            if json {
                let info = report::info_json(&input, format.name(), &track);
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                report::print_info(&input, format.name(), &track);
            }
            Ok(ExitCode::SUCCESS)
        }

        Command::Formats => {
            report::print_formats(extractor.registry());
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Where and how extracted tracks are written
#[derive(Debug)]
struct OutputPlan {
    file: Option<PathBuf>,
    dir: Option<PathBuf>,
    format: ExportFormat,
}

impl OutputPlan {
    /// Command-line flags win over the config file; an explicit output file
    /// also implies its format when no format is given
    fn new(
        file: Option<PathBuf>,
        dir: Option<PathBuf>,
        format: Option<ExportFormat>,
        app_config: &AppConfig,
    ) -> Self {
        let format = format
            .or_else(|| file.as_deref().and_then(ExportFormat::from_path))
            .unwrap_or(app_config.output.format);
        let dir = dir.or_else(|| app_config.output.output_dir.clone());
        Self { file, dir, format }
    }

    fn output_for(&self, input: &Path) -> PathBuf {
        if let Some(file) = &self.file {
            return file.clone();
        }
        let stem = input.file_stem().unwrap_or_default();
        let name = PathBuf::from(stem).with_extension(self.format.extension());
        match &self.dir {
            Some(dir) => dir.join(name),
            None => input.with_file_name(name),
        }
    }
}

/// Extract and export one file; failures are reported, not propagated
fn process_file(
    extractor: &TelemetryExtractor,
    input: &Path,
    plan: &OutputPlan,
    config: &ExtractConfig,
) -> FileOutcome {
    let output = plan.output_for(input);
    let result = extractor
        .extract_file(input, config)
        .and_then(|track| track.export(&output, plan.format).map(|_| track.len()));

    match result {
        Ok(points) => FileOutcome::Exported {
            input: input.to_path_buf(),
            output,
            points,
        },
        Err(e) => {
            log::error!("Failed to process {:?}: {}", input, e);
            FileOutcome::Failed {
                input: input.to_path_buf(),
                error: e.to_string(),
            }
        }
    }
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;
    use std::io::Write;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_next_to_input() {
        let plan = OutputPlan::new(None, None, None, &AppConfig::default());
        assert_eq!(plan.output_for(Path::new("/videos/FILE0001.MP4")), PathBuf::from("/videos/FILE0001.gpx"));
    }

    #[test]
    fn test_output_dir_and_format() {
        let plan = OutputPlan::new(None, Some("tracks".into()), Some(ExportFormat::GeoJson), &AppConfig::default());
        assert_eq!(plan.output_for(Path::new("/videos/a.mp4")), PathBuf::from("tracks/a.json"));
    }

    #[test]
    fn test_output_file_implies_format() {
        let plan = OutputPlan::new(Some("out/route.kml".into()), None, None, &AppConfig::default());
        assert_eq!(plan.format, ExportFormat::Kml);
        assert_eq!(plan.output_for(Path::new("a.mp4")), PathBuf::from("out/route.kml"));
    }

    #[test]
    fn test_config_file_fills_gaps() {
        let config: AppConfig = toml::from_str("[output]\nformat = \"csv\"\noutput_dir = \"csv_out\"\n").unwrap();
        let plan = OutputPlan::new(None, None, None, &config);
        assert_eq!(plan.output_for(Path::new("b.mp4")), PathBuf::from("csv_out/b.csv"));

        let plan = OutputPlan::new(None, Some("cli".into()), Some(ExportFormat::Gpx), &config);
        assert_eq!(plan.output_for(Path::new("b.mp4")), PathBuf::from("cli/b.gpx"));
    }

    #[test]
    fn test_cli_parses() {
        use clap::CommandFactory;
        Args::command().debug_assert();

        let args = Args::try_parse_from(["dashcam-telemetry", "-vv", "extract", "a.mp4", "b.mp4", "-f", "kml"]).unwrap();
        assert_eq!(args.verbose, 2);
        match args.command {
            Command::Extract { inputs, format, .. } => {
                assert_eq!(inputs.len(), 2);
                assert_eq!(format, Some(ExportFormat::Kml));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
