// faster-whisper command line engine
// Runs whisper-ctranslate2 into a scratch directory and reads back its JSON output

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use std::path::Path;
use std::sync::LazyLock;
use tokio::process::Command;
use tracing::{debug, info};

use crate::config::TranscriptionConfig;
use crate::error::{PipelineError, Result};
use crate::transcript::Segment;
use super::{RecognitionEngine, RecognitionOutput, TranscriptionOptions};

static DETECTED_LANGUAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Detected language '?([^'\n]+?)'? with probability ([0-9]*\.?[0-9]+)").unwrap()
});

/// JSON written by the CLI with `--output_format json`
#[derive(Debug, Clone, Deserialize)]
pub struct WhisperCliOutput {
    pub segments: Vec<WhisperCliSegment>,
    pub language: Option<String>,
    pub language_probability: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WhisperCliSegment {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

impl WhisperCliOutput {
    fn into_recognition_output(self, stdout: &str) -> RecognitionOutput {
        let language_probability = self
            .language_probability
            .or_else(|| parse_detected_probability(stdout));

        let segments = self
            .segments
            .into_iter()
            .map(|seg| Segment::new(seg.start, seg.end, seg.text))
            .collect();

        RecognitionOutput {
            segments,
            language: self.language.unwrap_or_default(),
            language_probability,
        }
    }
}

/// Pull the detection probability out of the CLI's console output
fn parse_detected_probability(stdout: &str) -> Option<f64> {
    DETECTED_LANGUAGE
        .captures(stdout)
        .and_then(|caps| caps.get(2))
        .and_then(|m| m.as_str().parse().ok())
}

fn flag(value: bool) -> &'static str {
    if value { "True" } else { "False" }
}

pub struct WhisperCliEngine {
    config: TranscriptionConfig,
}

impl WhisperCliEngine {
    pub fn new(config: TranscriptionConfig) -> Self {
        Self { config }
    }

    /// Command line for one recognition run
    pub fn build_args(&self, audio_path: &Path, output_dir: &Path, options: &TranscriptionOptions) -> Vec<String> {
        let mut args = vec![
            audio_path.to_string_lossy().to_string(),
            "--model".to_string(),
            options.model.clone(),
            "--device".to_string(),
            options.device.clone(),
            "--compute_type".to_string(),
            options.compute_type.clone(),
            "--beam_size".to_string(),
            options.beam_size.to_string(),
            "--vad_filter".to_string(),
            flag(options.vad_filter).to_string(),
            "--vad_min_silence_duration_ms".to_string(),
            options.min_silence_duration_ms.to_string(),
            "--word_timestamps".to_string(),
            flag(options.word_timestamps).to_string(),
            "--max_initial_timestamp".to_string(),
            options.max_initial_timestamp.to_string(),
            "--output_dir".to_string(),
            output_dir.to_string_lossy().to_string(),
            "--output_format".to_string(),
            "json".to_string(),
        ];

        if let Some(lang) = &options.source_lang_hint {
            args.push("--language".to_string());
            args.push(lang.clone());
        }

        args
    }
}

#[async_trait]
impl RecognitionEngine for WhisperCliEngine {
    async fn transcribe(&self, audio_path: &Path, options: &TranscriptionOptions) -> Result<RecognitionOutput> {
        debug!("Executing {} with model: {}", self.config.binary_path, options.model);

        let temp_dir = tempfile::tempdir()
            .map_err(|e| PipelineError::RecognitionEngine(format!("Failed to create temp directory: {}", e)))?;
        let output_dir = temp_dir.path();

        let output = Command::new(&self.config.binary_path)
            .args(self.build_args(audio_path, output_dir, options))
            .output()
            .await
            .map_err(|e| {
                PipelineError::RecognitionEngine(format!("Failed to execute {}: {}", self.config.binary_path, e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PipelineError::RecognitionEngine(format!(
                "Transcription failed: {}",
                stderr.trim()
            )));
        }

        let audio_stem = audio_path
            .file_stem()
            .ok_or_else(|| PipelineError::RecognitionEngine("Invalid audio filename".to_string()))?;
        let json_file = output_dir.join(format!("{}.json", audio_stem.to_string_lossy()));

        let json_content = tokio::fs::read_to_string(&json_file).await.map_err(|e| {
            PipelineError::RecognitionEngine(format!("Failed to read JSON output {}: {}", json_file.display(), e))
        })?;

        let parsed: WhisperCliOutput = serde_json::from_str(&json_content)
            .map_err(|e| PipelineError::RecognitionEngine(format!("Failed to parse recognition JSON: {}", e)))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let result = parsed.into_recognition_output(&stdout);

        info!("Recognition finished: {} segments", result.segments.len());
        Ok(result)
    }

    /// The model lives in the child process, which has already exited
    async fn release(&self) -> Result<()> {
        Ok(())
    }
}
