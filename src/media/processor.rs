use async_trait::async_trait;
use std::path::Path;
use tokio::process::Command;
use tracing::{info, debug};

use crate::config::FfmpegConfig;
use crate::error::{Result, PipelineError};
use super::{BurnOptions, EncodingBackend, ExtractOptions, MediaCommandBuilder};

/// Encoding backend that shells out to ffmpeg
pub struct FfmpegBackend {
    config: FfmpegConfig,
    command_builder: MediaCommandBuilder,
}

impl FfmpegBackend {
    pub fn new(config: FfmpegConfig) -> Self {
        let command_builder = MediaCommandBuilder::new(&config.binary_path);

        Self {
            config,
            command_builder,
        }
    }
}

#[async_trait]
impl EncodingBackend for FfmpegBackend {
    async fn extract_audio(
        &self,
        video_path: &Path,
        audio_path: &Path,
        options: &ExtractOptions,
    ) -> Result<()> {
        info!("Extracting audio from {} to {}", video_path.display(), audio_path.display());

        let command = self.command_builder.extract_audio(video_path, audio_path, options);
        command.execute().await?;

        info!("Audio extraction completed");
        Ok(())
    }

    async fn mux_soft_subtitles(
        &self,
        video_path: &Path,
        subtitle_path: &Path,
        output_path: &Path,
    ) -> Result<()> {
        info!("Muxing subtitles from {} into {} -> {}",
              subtitle_path.display(), video_path.display(), output_path.display());

        let command = self.command_builder.mux_soft_subtitles(video_path, subtitle_path, output_path);
        command.execute().await?;

        info!("Soft subtitle muxing completed successfully");
        Ok(())
    }

    async fn burn_subtitles(
        &self,
        video_path: &Path,
        subtitle_path: &Path,
        output_path: &Path,
        options: &BurnOptions,
    ) -> Result<()> {
        info!("Burning subtitles from {} into {} -> {}",
              subtitle_path.display(), video_path.display(), output_path.display());

        let command = self.command_builder.burn_subtitles(video_path, subtitle_path, output_path, options);
        command.execute().await?;

        info!("Subtitle burning completed successfully");
        Ok(())
    }

    /// Check that ffmpeg can be launched and log its version line
    async fn check_availability(&self) -> Result<()> {
        let output = Command::new(&self.config.binary_path)
            .arg("-version")
            .output()
            .await
            .map_err(|e| PipelineError::EncodingTool {
                description: "Version check".to_string(),
                status: None,
                stderr: format!("media processor not found: {}", e),
            })?;

        if output.status.success() {
            let version_info = String::from_utf8_lossy(&output.stdout);
            let first_line = version_info.lines().next().unwrap_or("Unknown version");
            debug!("Media processor: {}", first_line);
            Ok(())
        } else {
            Err(PipelineError::EncodingTool {
                description: "Version check".to_string(),
                status: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }
}
