//! Command-line arguments for ocr_app.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use ocr_core::PromptMode;

/// Send a document to the OCR service and print the recognised text.
#[derive(Parser, Debug, Clone)]
#[command(name = "ocr_app", version)]
#[command(about = "Upload a PDF or image to the OCR service and print the result", long_about = None)]
pub struct Cli {
    /// RON config file (defaults to ./ocr_client.ron when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the service base URL, e.g. http://localhost:8002
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Upload a document, follow the job, and print its result
    Run(RunArgs),
    /// Print service health and model readiness
    Status,
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// PDF, PNG or JPEG file to recognise
    #[arg(short, long)]
    pub file: PathBuf,

    /// Prompt mode: free, markdown, table, figure or custom
    #[arg(short, long, default_value = "free")]
    pub mode: PromptMode,

    /// Prompt text for --mode custom
    #[arg(short, long)]
    pub prompt: Option<String>,

    /// Print markdown results without terminal styling
    #[arg(long)]
    pub raw: bool,
}
