// Encoder-facing stages
//
// Audio extraction and subtitle embedding both go through the
// EncodingBackend trait:
// - Processor: ffmpeg implementation
// - Commands: argument list builders
// - Style: burned-subtitle styling

pub mod commands;
pub mod processor;
pub mod style;

use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::info;

pub use commands::*;
pub use processor::*;
pub use style::*;

use crate::config::FfmpegConfig;
use crate::error::{Result, PipelineError};
use crate::subtitle::ensure_parent_dir;

/// Narrow interface to the external encoder
#[async_trait]
pub trait EncodingBackend: Send + Sync {
    /// Demux/transcode the audio track of `video_path` into `audio_path`
    async fn extract_audio(
        &self,
        video_path: &Path,
        audio_path: &Path,
        options: &ExtractOptions,
    ) -> Result<()>;

    /// Copy video and audio, adding the subtitles as a timed-text stream
    async fn mux_soft_subtitles(
        &self,
        video_path: &Path,
        subtitle_path: &Path,
        output_path: &Path,
    ) -> Result<()>;

    /// Re-encode the video with the subtitles composited into every frame
    async fn burn_subtitles(
        &self,
        video_path: &Path,
        subtitle_path: &Path,
        output_path: &Path,
        options: &BurnOptions,
    ) -> Result<()>;

    /// Check if the encoder can be launched
    async fn check_availability(&self) -> Result<()> {
        Ok(())
    }
}

/// Factory for creating encoding backends
pub struct MediaProcessorFactory;

impl MediaProcessorFactory {
    /// Create the default backend (ffmpeg command line)
    pub fn create_backend(config: FfmpegConfig) -> Box<dyn EncodingBackend> {
        Box::new(processor::FfmpegBackend::new(config))
    }
}

/// Options for the audio extraction stage
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    pub audio_codec: String,
    /// Hardware acceleration mode, `None` when disabled
    pub hwaccel: Option<String>,
}

impl From<&FfmpegConfig> for ExtractOptions {
    fn from(config: &FfmpegConfig) -> Self {
        let hwaccel = match config.hwaccel.trim() {
            "" | "none" => None,
            mode => Some(mode.to_string()),
        };

        Self {
            audio_codec: config.audio_codec.clone(),
            hwaccel,
        }
    }
}

/// How subtitles end up in the output video
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SubtitleMode {
    /// Separate selectable stream, video copied bit-for-bit
    Soft,
    /// Composited into the frames during a re-encode
    Burned,
}

impl FromStr for SubtitleMode {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "soft" => Ok(Self::Soft),
            "burned" => Ok(Self::Burned),
            _ => Err(PipelineError::Config(format!(
                "Invalid subtitle mode '{}'. Valid modes: soft, burned",
                s
            ))),
        }
    }
}

impl fmt::Display for SubtitleMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Soft => write!(f, "soft"),
            Self::Burned => write!(f, "burned"),
        }
    }
}

fn require_file(path: &Path, what: &str) -> Result<()> {
    if !path.is_file() {
        return Err(PipelineError::SourceNotFound(format!("{} not found: {}", what, path.display())));
    }
    Ok(())
}

/// Audio extraction stage
pub async fn extract_audio(
    backend: &dyn EncodingBackend,
    video_path: &Path,
    output_audio_path: &Path,
    options: &ExtractOptions,
) -> Result<()> {
    require_file(video_path, "Video file")?;
    ensure_parent_dir(output_audio_path).await?;

    backend.extract_audio(video_path, output_audio_path, options).await?;
    info!("Successfully extracted audio file: {}", output_audio_path.display());
    Ok(())
}

/// Subtitle embedding stage
pub async fn embed_subtitles(
    backend: &dyn EncodingBackend,
    video_path: &Path,
    subtitle_path: &Path,
    output_path: &Path,
    mode: SubtitleMode,
    options: &BurnOptions,
) -> Result<()> {
    require_file(video_path, "Video file")?;
    require_file(subtitle_path, "SRT file")?;
    ensure_parent_dir(output_path).await?;

    match mode {
        SubtitleMode::Soft => {
            backend.mux_soft_subtitles(video_path, subtitle_path, output_path).await?;
            info!("Soft subtitled video saved: {}", output_path.display());
        }
        SubtitleMode::Burned => {
            backend.burn_subtitles(video_path, subtitle_path, output_path, options).await?;
            info!("Burned subtitled video saved: {}", output_path.display());
        }
    }
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::*;
    use super::testing::{EncoderCall, RecordingBackend};

    fn burn_options(position: &str) -> BurnOptions {
        let mut config = FfmpegConfig::default();
        config.subtitle_position = position.to_string();
        BurnOptions::from(&config)
    }

    #[test]
    fn test_subtitle_mode_parse() {
        assert_eq!("soft".parse::<SubtitleMode>().unwrap(), SubtitleMode::Soft);
        assert_eq!("Burned".parse::<SubtitleMode>().unwrap(), SubtitleMode::Burned);
        assert!(matches!("hard".parse::<SubtitleMode>(), Err(PipelineError::Config(_))));
    }

    #[test]
    fn test_extract_options_hwaccel() {
        let mut config = FfmpegConfig::default();
        assert_eq!(ExtractOptions::from(&config).hwaccel, None);
        config.hwaccel = "cuda".to_string();
        assert_eq!(ExtractOptions::from(&config).hwaccel.as_deref(), Some("cuda"));
    }

    #[tokio::test]
    async fn test_extract_missing_video_writes_nothing() {
        let temp = tempfile::tempdir().unwrap();
        let backend = RecordingBackend::default();
        let audio = temp.path().join("audio/out.mp3");

        let err = extract_audio(
            &backend,
            &temp.path().join("missing.mp4"),
            &audio,
            &ExtractOptions::from(&FfmpegConfig::default()),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, PipelineError::SourceNotFound(_)));
        assert!(!audio.exists());
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_extract_creates_output_directory() {
        let temp = tempfile::tempdir().unwrap();
        let video = temp.path().join("in.mp4");
        std::fs::write(&video, b"video").unwrap();
        let audio = temp.path().join("deep/audio/out.mp3");
        let backend = RecordingBackend::default();

        extract_audio(&backend, &video, &audio, &ExtractOptions::from(&FfmpegConfig::default()))
            .await
            .unwrap();

        assert!(audio.exists());
        assert_eq!(backend.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_extract_surfaces_encoder_failure() {
        let temp = tempfile::tempdir().unwrap();
        let video = temp.path().join("in.mp4");
        std::fs::write(&video, b"video").unwrap();
        let backend = RecordingBackend::failing("Invalid data found when processing input");

        let err = extract_audio(
            &backend,
            &video,
            &temp.path().join("out.mp3"),
            &ExtractOptions::from(&FfmpegConfig::default()),
        )
        .await
        .unwrap_err();

        match err {
            PipelineError::EncodingTool { stderr, .. } => assert!(stderr.contains("Invalid data")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_embed_modes_dispatch() {
        let temp = tempfile::tempdir().unwrap();
        let video = temp.path().join("in.mp4");
        let subs = temp.path().join("subs.srt");
        std::fs::write(&video, b"video").unwrap();
        std::fs::write(&subs, b"1\n").unwrap();
        let backend = RecordingBackend::default();

        let soft_out = temp.path().join("out/soft.mp4");
        let burned_out = temp.path().join("out/burned.mp4");
        embed_subtitles(&backend, &video, &subs, &soft_out, SubtitleMode::Soft, &burn_options("top"))
            .await
            .unwrap();
        embed_subtitles(&backend, &video, &subs, &burned_out, SubtitleMode::Burned, &burn_options("diagonal"))
            .await
            .unwrap();

        let calls = backend.calls();
        assert!(matches!(&calls[0], EncoderCall::MuxSoft { output, .. } if output == &soft_out));
        assert!(matches!(&calls[1], EncoderCall::Burn { alignment: 2, .. }));
        assert!(soft_out.exists() && burned_out.exists());
    }

    #[tokio::test]
    async fn test_embed_requires_subtitle_file() {
        let temp = tempfile::tempdir().unwrap();
        let video = temp.path().join("in.mp4");
        std::fs::write(&video, b"video").unwrap();
        let backend = RecordingBackend::default();

        let err = embed_subtitles(
            &backend,
            &video,
            &temp.path().join("missing.srt"),
            &temp.path().join("out.mp4"),
            SubtitleMode::Soft,
            &burn_options("bottom"),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, PipelineError::SourceNotFound(_)));
        assert!(backend.calls().is_empty());
    }
}
