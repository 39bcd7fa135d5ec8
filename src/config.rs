use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use crate::error::{Result, PipelineError};
use crate::media::SubtitleMode;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub paths: PathsConfig,
    pub models: ModelsConfig,
    pub transcription: TranscriptionConfig,
    pub translation: TranslationConfig,
    pub subtitles: SubtitlesConfig,
    pub ffmpeg: FfmpegConfig,
    pub logging: LoggingConfig,
}

/// Directories and file names of every artifact the pipeline reads or writes
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub video_dir: PathBuf,
    pub audio_dir: PathBuf,
    pub audio_file: String,
    pub subs_original_dir: PathBuf,
    pub subs_original_file: String,
    pub subs_original_file_json: String,
    pub subs_translated_dir: PathBuf,
    pub subs_translated_file_srt: String,
    pub subs_translated_file_txt: String,
    pub video_with_subs_dir: PathBuf,
    pub output_soft: String,
    pub output_burned: String,
    pub logs_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    /// Recognition model identifier (e.g. "large-v3")
    pub whisper_model: String,
    /// Translation model served by ollama
    pub translation_model: String,
    /// Source language hint, "auto" lets the recognition engine detect it
    pub source_lang: String,
    /// Target language in the translation engine's code space
    pub target_lang: String,
    /// Detection confidence below which a warning is logged
    pub min_language_probability: f64,
    /// Recognition-engine code -> translation-engine code
    pub language_code_map: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionConfig {
    /// Path to the faster-whisper command line front end
    pub binary_path: String,
    /// Inference device: "auto", "cuda" or "cpu"
    pub device: String,
    pub compute_type: String,
    pub beam_size: u32,
    pub vad_filter: bool,
    pub word_timestamps: bool,
    pub min_silence_duration_ms: u32,
    pub max_initial_timestamp: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslationConfig {
    /// Ollama endpoint URL
    pub endpoint: String,
    /// Use the regex splitter instead of the linguistic tokenizer
    pub use_regex_splitter: bool,
    /// Upper bound on generated tokens per sentence
    pub max_length: u32,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SubtitlesConfig {
    pub max_line_length: usize,
    pub max_lines: usize,
    /// Default subtitle mode: "soft" or "burned"
    pub mode: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FfmpegConfig {
    /// Path to ffmpeg binary
    pub binary_path: String,
    /// Hardware acceleration passed as `-hwaccel`, "none" disables it
    pub hwaccel: String,
    pub audio_codec: String,
    /// Encoding speed (ultrafast, fast, medium, slow, veryslow)
    pub preset: String,
    /// Quality (0-51, lower = better quality)
    pub crf: u32,
    pub pix_fmt: String,
    pub font_name: String,
    pub font_size: u32,
    /// ASS colour, e.g. &H00FFFFFF
    pub primary_colour: String,
    pub outline_colour: String,
    pub border_style: u32,
    pub outline: u32,
    pub shadow: u32,
    /// "bottom", "top" or "center"
    pub subtitle_position: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
    pub rotation: LogRotation,
    /// Number of rotated log files to keep
    pub max_files: usize,
    pub file_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Full,
    Compact,
    Pretty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    Minutely,
    Hourly,
    Daily,
    Never,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            video_dir: PathBuf::from("data/video"),
            audio_dir: PathBuf::from("data/audio"),
            audio_file: "audio.mp3".to_string(),
            subs_original_dir: PathBuf::from("data/subs_original"),
            subs_original_file: "subs_original.srt".to_string(),
            subs_original_file_json: "subs_original.json".to_string(),
            subs_translated_dir: PathBuf::from("data/subs_translated"),
            subs_translated_file_srt: "subs_translated.srt".to_string(),
            subs_translated_file_txt: "subs_translated.txt".to_string(),
            video_with_subs_dir: PathBuf::from("data/video_with_subs"),
            output_soft: "output_soft.mp4".to_string(),
            output_burned: "output_burned.mp4".to_string(),
            logs_dir: PathBuf::from("logs"),
        }
    }
}

impl Default for ModelsConfig {
    fn default() -> Self {
        let language_code_map = [
            ("en", "eng_Latn"),
            ("tr", "tur_Latn"),
            ("de", "deu_Latn"),
            ("fr", "fra_Latn"),
            ("es", "spa_Latn"),
            ("it", "ita_Latn"),
            ("pt", "por_Latn"),
            ("nl", "nld_Latn"),
            ("ru", "rus_Cyrl"),
            ("uk", "ukr_Cyrl"),
            ("ar", "arb_Arab"),
            ("ja", "jpn_Jpan"),
            ("ko", "kor_Hang"),
            ("zh", "zho_Hans"),
        ]
        .into_iter()
        .map(|(from, to)| (from.to_string(), to.to_string()))
        .collect();

        Self {
            whisper_model: "large-v3".to_string(),
            translation_model: "llama3.2:3b".to_string(),
            source_lang: "auto".to_string(),
            target_lang: "tur_Latn".to_string(),
            min_language_probability: 0.5,
            language_code_map,
        }
    }
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            binary_path: "whisper-ctranslate2".to_string(),
            device: "auto".to_string(),
            compute_type: "int8_float16".to_string(),
            beam_size: 5,
            vad_filter: true,
            word_timestamps: false,
            min_silence_duration_ms: 500,
            max_initial_timestamp: 1.0,
        }
    }
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:11434".to_string(),
            use_regex_splitter: false,
            max_length: 512,
            timeout_secs: 300,
        }
    }
}

impl Default for SubtitlesConfig {
    fn default() -> Self {
        Self {
            max_line_length: 42,
            max_lines: 2,
            mode: "burned".to_string(),
        }
    }
}

impl Default for FfmpegConfig {
    fn default() -> Self {
        Self {
            binary_path: "ffmpeg".to_string(),
            hwaccel: "none".to_string(),
            audio_codec: "mp3".to_string(),
            preset: "medium".to_string(),
            crf: 23,
            pix_fmt: "yuv420p".to_string(),
            font_name: "Arial".to_string(),
            font_size: 24,
            primary_colour: "&H00FFFFFF".to_string(),
            outline_colour: "&H00000000".to_string(),
            border_style: 1,
            outline: 2,
            shadow: 0,
            subtitle_position: "bottom".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Full,
            rotation: LogRotation::Daily,
            max_files: 5,
            file_name: "pipeline.log".to_string(),
        }
    }
}

impl PathsConfig {
    pub fn audio_path(&self) -> PathBuf {
        self.audio_dir.join(&self.audio_file)
    }

    pub fn original_srt_path(&self) -> PathBuf {
        self.subs_original_dir.join(&self.subs_original_file)
    }

    pub fn original_json_path(&self) -> PathBuf {
        self.subs_original_dir.join(&self.subs_original_file_json)
    }

    pub fn translated_srt_path(&self) -> PathBuf {
        self.subs_translated_dir.join(&self.subs_translated_file_srt)
    }

    pub fn translated_txt_path(&self) -> PathBuf {
        self.subs_translated_dir.join(&self.subs_translated_file_txt)
    }

    pub fn soft_output_path(&self) -> PathBuf {
        self.video_with_subs_dir.join(&self.output_soft)
    }

    pub fn burned_output_path(&self) -> PathBuf {
        self.video_with_subs_dir.join(&self.output_burned)
    }
}

impl Config {
    /// Load configuration from a TOML file, or JSON when the extension is `.json`
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| PipelineError::Config(format!("Failed to read config file {}: {}", path.display(), e)))?;

        let config: Config = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&content)
                .map_err(|e| PipelineError::Config(format!("Failed to parse config file: {}", e)))?
        } else {
            toml::from_str(&content)
                .map_err(|e| PipelineError::Config(format!("Failed to parse config file: {}", e)))?
        };

        config.validate()?;
        Ok(config)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| PipelineError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| PipelineError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Reject values no stage could act on
    pub fn validate(&self) -> Result<()> {
        self.subtitles.mode.parse::<SubtitleMode>()?;
        if self.subtitles.max_lines == 0 {
            return Err(PipelineError::Config("subtitles.max_lines must be at least 1".to_string()));
        }
        if self.subtitles.max_line_length == 0 {
            return Err(PipelineError::Config("subtitles.max_line_length must be at least 1".to_string()));
        }
        if self.models.target_lang.trim().is_empty() {
            return Err(PipelineError::Config("models.target_lang is required".to_string()));
        }
        Ok(())
    }
}
