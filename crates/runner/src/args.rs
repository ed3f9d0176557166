//! Command-line arguments.

use clap::Parser;

/// Translate the subtitles of one or more videos.
///
/// Each input becomes one job; all jobs share the context hint.
#[derive(Parser, Debug)]
#[command(name = "subweaver", version)]
pub struct Args {
    /// Background about the videos passed to the translator
    #[arg(long, short, default_value = "")]
    pub context: String,

    /// Video locators to process
    #[arg(required = true)]
    pub inputs: Vec<String>,
}
