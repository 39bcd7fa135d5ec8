//! subpipe - Sequential video subtitling pipeline
//!
//! Extract audio, transcribe it, translate the transcript and embed the
//! translated subtitles back into the video, using ffmpeg, faster-whisper
//! and ollama.

pub mod accelerator;
pub mod cli;
pub mod config;
pub mod error;
pub mod language;
pub mod media;
pub mod subtitle;
pub mod transcribe;
pub mod transcript;
pub mod translate;
pub mod workflow;
