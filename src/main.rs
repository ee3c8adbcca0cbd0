//! Command-line interface for the preprocessing workflow.
//!
//! Two self-contained subcommands: `enhance` runs the deterministic
//! enhancement pipeline over a directory, `submit` sends a directory's images
//! to a remote processing node and tracks the job. Stitching and detection
//! are library seams without bundled implementations, so they have no
//! subcommand here.

use clap::{Parser, Subcommand};
use orthoprep::core::{ContrastMethod, EnhancementConfig, PipelineError, SubmitOptions};
use orthoprep::orchestrator::{JobOrchestrator, JobOutcome};
use orthoprep::pipeline::EnhancementPipeline;
use orthoprep::remote::http::HttpNode;
use orthoprep::utils::{image_files, init_tracing};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "orthoprep", version, about = "Aerial image preprocessing and remote orthophoto jobs")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Enhance every image in a directory into <dir>_processed
    Enhance {
        /// Directory containing the images
        directory: PathBuf,
        /// Factor by which to scale down images (2 halves both dimensions)
        #[arg(long, default_value_t = 1.0)]
        scale_factor: f32,
        /// Contrast method: "hist_eq", "clahe", or "none"
        #[arg(long, default_value = "clahe")]
        contrast_method: ContrastMethod,
        /// Disable white-balance correction
        #[arg(long)]
        no_white_balance: bool,
        /// Clip limit for CLAHE
        #[arg(long, default_value_t = 3.0)]
        clip_limit: f32,
        /// CLAHE tile grid rows
        #[arg(long, default_value_t = 8)]
        tile_rows: u32,
        /// CLAHE tile grid columns
        #[arg(long, default_value_t = 8)]
        tile_cols: u32,
    },
    /// Submit a directory of images to a processing node and track the job
    Submit {
        /// Directory containing the images
        directory: PathBuf,
        /// Processing node address
        #[arg(long, default_value = "localhost")]
        node_address: String,
        /// Processing node port
        #[arg(long, default_value_t = 3000)]
        node_port: u16,
        /// Orthophoto ground sample distance in meters/pixel
        #[arg(long, default_value_t = 0.1)]
        orthophoto_resolution: f64,
        /// Destination directory for downloaded assets
        #[arg(long, default_value = "odm_media/results")]
        dest: PathBuf,
    },
}

fn run(command: Command) -> Result<ExitCode, PipelineError> {
    match command {
        Command::Enhance {
            directory,
            scale_factor,
            contrast_method,
            no_white_balance,
            clip_limit,
            tile_rows,
            tile_cols,
        } => {
            let config = EnhancementConfig {
                contrast_method,
                white_balance: !no_white_balance,
                clip_limit,
                tile_grid: (tile_rows, tile_cols),
            };
            let pipeline = EnhancementPipeline::new(config)?;
            let written = pipeline.enhance_directory(&directory, scale_factor)?;
            for path in &written {
                println!("{}", path.display());
            }
            println!("Done, {} images written", written.len());
            Ok(ExitCode::SUCCESS)
        }
        Command::Submit {
            directory,
            node_address,
            node_port,
            orthophoto_resolution,
            dest,
        } => {
            let files = image_files(&directory)?;
            if files.is_empty() {
                return Err(PipelineError::invalid_input(format!(
                    "no image files in {}",
                    directory.display()
                )));
            }

            let node = HttpNode::new(&node_address, node_port)?;
            let options = SubmitOptions::with_resolution(orthophoto_resolution);
            let orchestrator = JobOrchestrator::new(&node);

            let outcome = orchestrator.run(&files, &options, &dest, &mut |status, progress| {
                println!("{} {}%", status, progress);
            })?;

            match outcome {
                JobOutcome::Completed { assets } => {
                    println!("Task completed, assets saved:");
                    for path in assets {
                        println!("  {}", path.display());
                    }
                    Ok(ExitCode::SUCCESS)
                }
                JobOutcome::Failed { output } => {
                    eprintln!("Remote job failed, node output:");
                    for line in output {
                        eprintln!("{}", line);
                    }
                    Ok(ExitCode::FAILURE)
                }
                JobOutcome::ConnectionError { message } => {
                    eprintln!("Cannot connect: {}", message);
                    Ok(ExitCode::FAILURE)
                }
                JobOutcome::Cancelled => {
                    eprintln!("Job tracking cancelled");
                    Ok(ExitCode::FAILURE)
                }
            }
        }
    }
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli.command) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {}", err);
            if let Some(hint) = err.remediation() {
                eprintln!("Hint: {}", hint);
            }
            ExitCode::FAILURE
        }
    }
}
