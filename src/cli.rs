use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::media::SubtitleMode;
use crate::workflow::Stage;

#[derive(Parser, Debug)]
#[command(author, version, about = "Extract, transcribe, translate and subtitle a video", long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Steps to run; they always execute in pipeline order
    #[arg(long, value_enum, num_args = 1.., default_values_t = Stage::ALL)]
    pub steps: Vec<Stage>,

    /// Subtitle mode, overrides `subtitles.mode` from the configuration
    #[arg(long, value_enum)]
    pub mode: Option<ModeArg>,

    /// Video file to process instead of scanning the video directory
    #[arg(long)]
    pub video: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Soft,
    Burned,
}

impl From<ModeArg> for SubtitleMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Soft => SubtitleMode::Soft,
            ModeArg::Burned => SubtitleMode::Burned,
        }
    }
}
