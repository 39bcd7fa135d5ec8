use std::path::Path;
use tokio::process::Command;
use tracing::debug;

use crate::error::{Result, PipelineError};
use super::{BurnOptions, ExtractOptions};

/// Abstract media processing command representation
#[derive(Debug, Clone)]
pub struct MediaCommand {
    pub binary_path: String,
    pub args: Vec<String>,
    pub description: String,
}

impl MediaCommand {
    /// Create a new media processing command
    pub fn new<S1: Into<String>, S2: Into<String>>(binary_path: S1, description: S2) -> Self {
        Self {
            binary_path: binary_path.into(),
            args: Vec::new(),
            description: description.into(),
        }
    }

    /// Add an argument
    pub fn arg<S: Into<String>>(mut self, arg: S) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add input file
    pub fn input<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg("-i").arg(path.as_ref().to_string_lossy().to_string())
    }

    /// Add output file
    pub fn output<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg(path.as_ref().to_string_lossy().to_string())
    }

    /// Force overwrite output
    pub fn overwrite(self) -> Self {
        self.arg("-y")
    }

    pub fn video_codec<S: Into<String>>(self, codec: S) -> Self {
        self.arg("-c:v").arg(codec)
    }

    pub fn audio_codec<S: Into<String>>(self, codec: S) -> Self {
        self.arg("-c:a").arg(codec)
    }

    pub fn subtitle_codec<S: Into<String>>(self, codec: S) -> Self {
        self.arg("-c:s").arg(codec)
    }

    pub fn copy_video(self) -> Self {
        self.video_codec("copy")
    }

    pub fn copy_audio(self) -> Self {
        self.audio_codec("copy")
    }

    /// Disable video
    pub fn no_video(self) -> Self {
        self.arg("-vn")
    }

    pub fn video_filter<S: Into<String>>(self, filter: S) -> Self {
        self.arg("-vf").arg(filter)
    }

    /// Request hardware-accelerated decoding unless disabled
    pub fn hwaccel(self, mode: Option<&str>) -> Self {
        match mode {
            Some(mode) => self.arg("-hwaccel").arg(mode),
            None => self,
        }
    }

    /// Run the command, failing with the captured stderr on a non-zero exit
    pub async fn execute(&self) -> Result<()> {
        debug!("Executing media processing command: {} {:?}", self.binary_path, self.args);
        debug!("Description: {}", self.description);

        let output = Command::new(&self.binary_path)
            .args(&self.args)
            .output()
            .await
            .map_err(|e| PipelineError::EncodingTool {
                description: self.description.clone(),
                status: None,
                stderr: format!("failed to launch {}: {}", self.binary_path, e),
            })?;

        if !output.status.success() {
            return Err(PipelineError::EncodingTool {
                description: self.description.clone(),
                status: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        debug!("{} stderr: {}", self.description, String::from_utf8_lossy(&output.stderr));
        Ok(())
    }
}

/// Builder for the encoder invocations the pipeline needs
pub struct MediaCommandBuilder {
    binary_path: String,
}

impl MediaCommandBuilder {
    pub fn new<S: Into<String>>(binary_path: S) -> Self {
        Self {
            binary_path: binary_path.into(),
        }
    }

    /// Build audio extraction command
    pub fn extract_audio<P: AsRef<Path>>(
        &self,
        video_path: P,
        audio_path: P,
        options: &ExtractOptions,
    ) -> MediaCommand {
        MediaCommand::new(&self.binary_path, "Audio extraction")
            .hwaccel(options.hwaccel.as_deref())
            .input(video_path)
            .no_video()
            .arg("-acodec")
            .arg(options.audio_codec.as_str())
            .overwrite()
            .output(audio_path)
    }

    /// Build a command that adds the subtitles as a separate timed-text stream
    pub fn mux_soft_subtitles<P: AsRef<Path>>(
        &self,
        video_path: P,
        subtitle_path: P,
        output_path: P,
    ) -> MediaCommand {
        MediaCommand::new(&self.binary_path, "Soft subtitle muxing")
            .input(video_path)
            .input(subtitle_path)
            .copy_video()
            .copy_audio()
            .subtitle_codec("mov_text")
            .overwrite()
            .output(output_path)
    }

    /// Build a command that re-encodes the video with the subtitles drawn into it
    pub fn burn_subtitles<P: AsRef<Path>>(
        &self,
        video_path: P,
        subtitle_path: P,
        output_path: P,
        options: &BurnOptions,
    ) -> MediaCommand {
        let filter = format!(
            "subtitles='{}':force_style='{}'",
            subtitle_path.as_ref().display(),
            options.style.force_style()
        );

        MediaCommand::new(&self.binary_path, "Subtitle burning")
            .input(video_path)
            .video_filter(filter)
            .copy_audio()
            .video_codec("libx264")
            .arg("-preset")
            .arg(options.preset.as_str())
            .arg("-crf")
            .arg(options.crf.to_string())
            .arg("-pix_fmt")
            .arg(options.pix_fmt.as_str())
            .overwrite()
            .output(output_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FfmpegConfig;
    use std::path::PathBuf;

    fn builder() -> MediaCommandBuilder {
        MediaCommandBuilder::new("ffmpeg")
    }

    #[test]
    fn test_extract_audio_args() {
        let options = ExtractOptions {
            audio_codec: "mp3".to_string(),
            hwaccel: None,
        };
        let cmd = builder().extract_audio(PathBuf::from("in.mp4"), PathBuf::from("out/audio.mp3"), &options);
        assert_eq!(cmd.args, vec!["-i", "in.mp4", "-vn", "-acodec", "mp3", "-y", "out/audio.mp3"]);
    }

    #[test]
    fn test_extract_audio_hwaccel_precedes_input() {
        let options = ExtractOptions {
            audio_codec: "mp3".to_string(),
            hwaccel: Some("cuda".to_string()),
        };
        let cmd = builder().extract_audio(PathBuf::from("in.mp4"), PathBuf::from("a.mp3"), &options);
        assert_eq!(&cmd.args[..4], &["-hwaccel", "cuda", "-i", "in.mp4"]);
    }

    #[test]
    fn test_soft_subtitle_args() {
        let cmd = builder().mux_soft_subtitles(
            PathBuf::from("in.mp4"),
            PathBuf::from("subs.srt"),
            PathBuf::from("out.mp4"),
        );
        assert_eq!(
            cmd.args,
            vec!["-i", "in.mp4", "-i", "subs.srt", "-c:v", "copy", "-c:a", "copy", "-c:s", "mov_text", "-y", "out.mp4"]
        );
    }

    #[test]
    fn test_burn_subtitle_args() {
        let options = BurnOptions::from(&FfmpegConfig::default());
        let cmd = builder().burn_subtitles(
            PathBuf::from("in.mp4"),
            PathBuf::from("subs.srt"),
            PathBuf::from("out.mp4"),
            &options,
        );

        assert_eq!(cmd.args[2], "-vf");
        assert!(cmd.args[3].starts_with("subtitles='subs.srt':force_style='FontName=Arial,"));
        assert!(cmd.args[3].ends_with("Alignment=2'"));
        assert_eq!(
            &cmd.args[4..],
            &["-c:a", "copy", "-c:v", "libx264", "-preset", "medium", "-crf", "23", "-pix_fmt", "yuv420p", "-y", "out.mp4"]
        );
    }

    #[tokio::test]
    async fn test_execute_missing_binary_is_encoding_tool_error() {
        let cmd = MediaCommand::new("/nonexistent/encoder-binary", "Audio extraction").arg("-version");
        let err = cmd.execute().await.unwrap_err();
        assert!(matches!(err, PipelineError::EncodingTool { status: None, .. }));
    }
}
