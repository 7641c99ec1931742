use clap::Parser;
use std::path::PathBuf;

use ytsum::pipeline::Mode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser)]
#[command(
    name = "ytsum",
    about = "YouTube transcript summarizer",
    version = env!("GIT_DESCRIBE"),
)]
pub struct Cli {
    /// YouTube video URL or video ID (reads from stdin if omitted)
    pub url: Option<String>,

    /// What to produce: summary (default), timestamps, transcript
    #[arg(short, long, value_enum)]
    pub mode: Option<Mode>,

    /// Preferred caption language, or "auto"
    #[arg(short, long)]
    pub lang: Option<String>,

    /// LLM model used for generation
    #[arg(long)]
    pub model: Option<String>,

    /// Clean up the transcript via LLM (transcript mode)
    #[arg(long)]
    pub enhance: bool,

    /// Don't turn timestamps into links
    #[arg(long)]
    pub no_links: bool,

    /// Output format: text (default), json
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Write output to file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Path to the yt-dlp executable
    #[arg(long)]
    pub ytdlp: Option<String>,

    /// Show transcript source and metadata
    #[arg(short, long)]
    pub verbose: bool,
}
