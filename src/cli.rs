// cli.rs - Command-line interface configuration
use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(name = "scroll-stage")]
#[command(about = "Scroll-driven 3D stage with a post-processing chain", long_about = None)]
pub struct Cli {
    /// Stage configuration (JSON); defaults are used when the file is missing
    #[arg(long, default_value = "stage.json")]
    pub config: PathBuf,

    /// Initial window width in logical pixels
    #[arg(long, default_value_t = 1280)]
    pub width: u32,

    /// Initial window height in logical pixels
    #[arg(long, default_value_t = 720)]
    pub height: u32,

    /// Run this many frames without a window and print the command summary
    #[arg(long, value_name = "FRAMES")]
    pub headless: Option<u32>,

    /// Start with the intro already finished
    #[arg(long = "skip-intro")]
    pub skip_intro: bool,

    /// Render the scene straight to the screen with no passes
    #[arg(long = "no-post")]
    pub no_post: bool,
}
