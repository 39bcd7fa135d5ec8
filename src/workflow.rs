use chrono::{DateTime, Local};
use clap::ValueEnum;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;
use walkdir::WalkDir;

use crate::config::Config;
use crate::error::{PipelineError, Result};
use crate::media::{self, BurnOptions, EncodingBackend, ExtractOptions, SubtitleMode};
use crate::transcribe::{self, RecognitionEngine};
use crate::translate::{self, TranslationEngine};

const VIDEO_EXTENSIONS: [&str; 7] = ["mp4", "avi", "mov", "mkv", "wmv", "flv", "webm"];

/// Pipeline steps, declared in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Extract,
    Transcribe,
    Translate,
    Subtitles,
}

impl Stage {
    pub const ALL: [Stage; 4] = [Stage::Extract, Stage::Transcribe, Stage::Translate, Stage::Subtitles];
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Extract => "extract",
            Stage::Transcribe => "transcribe",
            Stage::Translate => "translate",
            Stage::Subtitles => "subtitles",
        };
        write!(f, "{}", name)
    }
}

/// One executed stage
#[derive(Debug, Clone, Serialize)]
pub struct StageReport {
    pub stage: Stage,
    pub started_at: DateTime<Local>,
    pub elapsed: Duration,
    /// Files written by the stage
    pub artifacts: Vec<PathBuf>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub run_id: Uuid,
    pub video: Option<PathBuf>,
    pub mode: Option<SubtitleMode>,
    pub stages: Vec<StageReport>,
}

impl PipelineReport {
    pub fn executed(&self) -> Vec<Stage> {
        self.stages.iter().map(|s| s.stage).collect()
    }

    pub fn total_elapsed(&self) -> Duration {
        self.stages.iter().map(|s| s.elapsed).sum()
    }
}

/// Path relative to the working directory when possible, for log output
fn display_path(path: &Path) -> String {
    std::env::current_dir()
        .ok()
        .and_then(|cwd| pathdiff::diff_paths(path, cwd))
        .unwrap_or_else(|| path.to_path_buf())
        .display()
        .to_string()
}

/// First video file directly inside `video_dir`, sorted by path
pub fn select_video(video_dir: &Path) -> Result<PathBuf> {
    if !video_dir.is_dir() {
        return Err(PipelineError::SourceNotFound(format!(
            "Video directory not found: {}",
            video_dir.display()
        )));
    }

    let mut video_files: Vec<PathBuf> = WalkDir::new(video_dir)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            e.path()
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| VIDEO_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        })
        .map(|e| e.into_path())
        .collect();
    video_files.sort();

    match video_files.len() {
        0 => Err(PipelineError::SourceNotFound(format!(
            "No video files found in {}",
            video_dir.display()
        ))),
        1 => Ok(video_files.remove(0)),
        n => {
            warn!("Found {} video files in {}, using the first one", n, video_dir.display());
            Ok(video_files.remove(0))
        }
    }
}

pub struct Pipeline {
    config: Config,
    backend: Arc<dyn EncodingBackend>,
    recognition: Arc<dyn RecognitionEngine>,
    translation: Arc<dyn TranslationEngine>,
}

impl Pipeline {
    pub fn new(
        config: Config,
        backend: Arc<dyn EncodingBackend>,
        recognition: Arc<dyn RecognitionEngine>,
        translation: Arc<dyn TranslationEngine>,
    ) -> Self {
        Self {
            config,
            backend,
            recognition,
            translation,
        }
    }

    /// Run the requested steps in pipeline order, stopping at the first failure
    pub async fn run(
        &self,
        steps: &[Stage],
        mode_override: Option<SubtitleMode>,
        video_override: Option<&Path>,
    ) -> Result<PipelineReport> {
        let run_id = Uuid::new_v4();
        let span = info_span!("pipeline", run_id = %run_id);

        async {
            match self.execute(run_id, steps, mode_override, video_override).await {
                Ok(report) => {
                    if let Ok(json) = serde_json::to_string(&report) {
                        debug!("Run report: {}", json);
                    }
                    info!(
                        "Pipeline finished {} step(s) in {:.1}s",
                        report.stages.len(),
                        report.total_elapsed().as_secs_f64()
                    );
                    Ok(report)
                }
                Err(e) => {
                    error!("Pipeline failed: {}", e);
                    Err(e)
                }
            }
        }
        .instrument(span)
        .await
    }

    fn resolve_video(&self, video_override: Option<&Path>) -> Result<PathBuf> {
        match video_override {
            Some(path) if path.is_file() => Ok(path.to_path_buf()),
            Some(path) => Err(PipelineError::SourceNotFound(format!(
                "Video file not found: {}",
                path.display()
            ))),
            None => select_video(&self.config.paths.video_dir),
        }
    }

    async fn execute(
        &self,
        run_id: Uuid,
        steps: &[Stage],
        mode_override: Option<SubtitleMode>,
        video_override: Option<&Path>,
    ) -> Result<PipelineReport> {
        let mut requested = steps.to_vec();
        requested.sort();
        requested.dedup();

        let names: Vec<String> = requested.iter().map(|s| s.to_string()).collect();
        info!("Starting pipeline run {} with steps: {}", run_id, names.join(", "));

        let video = if requested.contains(&Stage::Extract) || requested.contains(&Stage::Subtitles) {
            let video = self.resolve_video(video_override)?;
            info!("Using video file: {}", display_path(&video));
            self.backend.check_availability().await?;
            Some(video)
        } else {
            None
        };

        let mode = if requested.contains(&Stage::Subtitles) {
            match mode_override {
                Some(mode) => Some(mode),
                None => Some(self.config.subtitles.mode.parse::<SubtitleMode>()?),
            }
        } else {
            None
        };

        let mut report = PipelineReport {
            run_id,
            video: video.clone(),
            mode,
            stages: Vec::with_capacity(requested.len()),
        };

        let paths = &self.config.paths;
        for (index, stage) in requested.iter().copied().enumerate() {
            info!("━━━ Step {}/{}: {} ━━━", index + 1, requested.len(), stage);
            let started_at = Local::now();
            let timer = Instant::now();

            let artifacts = match (stage, video.as_deref(), mode) {
                (Stage::Extract, Some(video), _) => {
                    let audio_path = paths.audio_path();
                    let options = ExtractOptions::from(&self.config.ffmpeg);
                    media::extract_audio(self.backend.as_ref(), video, &audio_path, &options).await?;
                    vec![audio_path]
                }
                (Stage::Transcribe, _, _) => {
                    transcribe::run_stage(self.recognition.as_ref(), &self.config).await?;
                    vec![paths.original_json_path(), paths.original_srt_path()]
                }
                (Stage::Translate, _, _) => {
                    translate::run_stage(self.translation.as_ref(), &self.config).await?;
                    vec![paths.translated_srt_path(), paths.translated_txt_path()]
                }
                (Stage::Subtitles, Some(video), Some(mode)) => {
                    let output_path = match mode {
                        SubtitleMode::Soft => paths.soft_output_path(),
                        SubtitleMode::Burned => paths.burned_output_path(),
                    };
                    media::embed_subtitles(
                        self.backend.as_ref(),
                        video,
                        &paths.translated_srt_path(),
                        &output_path,
                        mode,
                        &BurnOptions::from(&self.config.ffmpeg),
                    )
                    .await?;
                    vec![output_path]
                }
                (stage, _, _) => {
                    return Err(PipelineError::Config(format!("Step {} is missing its inputs", stage)));
                }
            };

            let elapsed = timer.elapsed();
            info!("✓ {} completed in {:.1}s", stage, elapsed.as_secs_f64());
            for artifact in &artifacts {
                info!("  → {}", display_path(artifact));
            }

            report.stages.push(StageReport {
                stage,
                started_at,
                elapsed,
                artifacts,
            });
        }

        Ok(report)
    }
}
