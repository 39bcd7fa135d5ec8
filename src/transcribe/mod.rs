// Speech recognition stage
//
// The stage talks to a RecognitionEngine:
// - WhisperCli: faster-whisper command line front end
//
// To add a new engine, implement RecognitionEngine and return it from
// RecognitionEngineFactory.

pub mod whisper_cli;

use async_trait::async_trait;
use std::path::Path;
use tracing::{info, warn};

pub use whisper_cli::WhisperCliEngine;

use crate::accelerator;
use crate::config::{Config, TranscriptionConfig};
use crate::error::{PipelineError, Result};
use crate::language::LanguageCodeMap;
use crate::subtitle;
use crate::transcript::{segment_progress, Segment, Transcript};

/// Raw engine output before trimming and code mapping
#[derive(Debug, Clone, Default)]
pub struct RecognitionOutput {
    pub segments: Vec<Segment>,
    /// Detected language in the engine's own code space
    pub language: String,
    pub language_probability: Option<f64>,
}

/// Decoding parameters passed to the engine
#[derive(Debug, Clone)]
pub struct TranscriptionOptions {
    pub model: String,
    pub device: String,
    pub compute_type: String,
    pub beam_size: u32,
    pub vad_filter: bool,
    pub word_timestamps: bool,
    pub min_silence_duration_ms: u32,
    pub max_initial_timestamp: f64,
    /// `None` lets the engine detect the language
    pub source_lang_hint: Option<String>,
    pub min_language_probability: f64,
}

impl From<&Config> for TranscriptionOptions {
    fn from(config: &Config) -> Self {
        let source_lang_hint = match config.models.source_lang.trim() {
            "" | "auto" => None,
            lang => Some(lang.to_string()),
        };

        Self {
            model: config.models.whisper_model.clone(),
            device: config.transcription.device.clone(),
            compute_type: config.transcription.compute_type.clone(),
            beam_size: config.transcription.beam_size,
            vad_filter: config.transcription.vad_filter,
            word_timestamps: config.transcription.word_timestamps,
            min_silence_duration_ms: config.transcription.min_silence_duration_ms,
            max_initial_timestamp: config.transcription.max_initial_timestamp,
            source_lang_hint,
            min_language_probability: config.models.min_language_probability,
        }
    }
}

/// Speech recognition engine
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecognitionEngine: Send + Sync {
    /// Recognize speech in `audio_path`, segments in emission order
    async fn transcribe(&self, audio_path: &Path, options: &TranscriptionOptions) -> Result<RecognitionOutput>;

    /// Free accelerator memory held by the engine
    async fn release(&self) -> Result<()>;
}

/// Factory for creating recognition engines
pub struct RecognitionEngineFactory;

impl RecognitionEngineFactory {
    pub fn create_engine(config: TranscriptionConfig) -> Box<dyn RecognitionEngine> {
        Box::new(WhisperCliEngine::new(config))
    }
}

/// Transcription stage: audio file to a transcript in the translation engine's code space
pub async fn transcribe(
    engine: &dyn RecognitionEngine,
    audio_path: &Path,
    options: &TranscriptionOptions,
    language_map: &LanguageCodeMap,
) -> Result<Transcript> {
    let work = async {
        if !audio_path.is_file() {
            return Err(PipelineError::SourceNotFound(format!(
                "Audio file not found: {}",
                audio_path.display()
            )));
        }

        info!("Starting transcription of: {}", audio_path.display());
        engine.transcribe(audio_path, options).await
    };

    let output = accelerator::scoped("transcription", work, engine.release()).await?;

    match output.language_probability {
        Some(probability) => {
            info!("Detected language '{}' with probability {:.2}", output.language, probability);
            if probability < options.min_language_probability {
                warn!(
                    "Low language detection confidence: {:.2} < {:.2}",
                    probability, options.min_language_probability
                );
            }
        }
        None => info!("Detected language '{}'", output.language),
    }

    let pb = segment_progress(output.segments.len(), "Collecting segments");
    let mut segments = Vec::with_capacity(output.segments.len());
    for segment in output.segments {
        segments.push(segment.with_text(segment.text.trim()));
        pb.inc(1);
    }
    pb.finish_and_clear();

    let language = language_map.map(&output.language);
    info!("Transcription produced {} segments (lang: {})", segments.len(), language);

    let transcript = Transcript::new(segments, language);
    if let Some(end) = transcript.duration() {
        info!("Transcript covers {:.1}s of audio", end);
    }
    if !transcript.is_ordered() {
        warn!("Engine emitted segments out of time order, keeping them as emitted");
    }
    Ok(transcript)
}

/// Run the transcription stage and persist the transcript JSON plus its SRT mirror
pub async fn run_stage(engine: &dyn RecognitionEngine, config: &Config) -> Result<Transcript> {
    let language_map = LanguageCodeMap::new(config.models.language_code_map.clone());
    let options = TranscriptionOptions::from(config);

    let transcript = transcribe(engine, &config.paths.audio_path(), &options, &language_map).await?;

    subtitle::write_transcript_json(&transcript, config.paths.original_json_path()).await?;
    subtitle::write_srt(&transcript.segments, config.paths.original_srt_path()).await?;

    Ok(transcript)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::always;

    fn options() -> TranscriptionOptions {
        TranscriptionOptions::from(&Config::default())
    }

    fn language_map() -> LanguageCodeMap {
        LanguageCodeMap::new(Config::default().models.language_code_map)
    }

    fn engine_returning(output: RecognitionOutput) -> MockRecognitionEngine {
        let mut engine = MockRecognitionEngine::new();
        engine
            .expect_transcribe()
            .with(always(), always())
            .times(1)
            .returning(move |_, _| Ok(output.clone()));
        engine.expect_release().times(1).returning(|| Ok(()));
        engine
    }

    #[test]
    fn test_options_from_config() {
        let mut config = Config::default();
        assert_eq!(TranscriptionOptions::from(&config).source_lang_hint, None);

        config.models.source_lang = "de".to_string();
        let options = TranscriptionOptions::from(&config);
        assert_eq!(options.source_lang_hint.as_deref(), Some("de"));
        assert_eq!(options.beam_size, 5);
        assert!(options.vad_filter);
    }

    #[tokio::test]
    async fn test_transcribe_trims_and_maps_language() {
        let temp = tempfile::tempdir().unwrap();
        let audio = temp.path().join("audio.mp3");
        std::fs::write(&audio, b"audio").unwrap();

        let engine = engine_returning(RecognitionOutput {
            segments: vec![
                Segment::new(0.0, 1.5, "  Hello there. "),
                Segment::new(1.5, 3.0, "\tGeneral Kenobi!\n"),
            ],
            language: "en".to_string(),
            language_probability: Some(0.97),
        });

        let transcript = transcribe(&engine, &audio, &options(), &language_map()).await.unwrap();

        assert_eq!(transcript.language, "eng_Latn");
        assert_eq!(transcript.segments[0].text, "Hello there.");
        assert_eq!(transcript.segments[1].text, "General Kenobi!");
        assert_eq!(transcript.segments[1].start, 1.5);
        assert!(transcript.is_ordered());
    }

    #[tokio::test]
    async fn test_transcribe_keeps_engine_order() {
        let temp = tempfile::tempdir().unwrap();
        let audio = temp.path().join("audio.mp3");
        std::fs::write(&audio, b"audio").unwrap();

        let engine = engine_returning(RecognitionOutput {
            segments: vec![Segment::new(5.0, 6.0, "second"), Segment::new(1.0, 2.0, "first")],
            language: "en".to_string(),
            language_probability: Some(0.9),
        });

        let transcript = transcribe(&engine, &audio, &options(), &language_map()).await.unwrap();
        let texts: Vec<&str> = transcript.segments.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["second", "first"]);
        assert!(!transcript.is_ordered());
    }

    #[tokio::test]
    async fn test_unmapped_language_passes_through() {
        let temp = tempfile::tempdir().unwrap();
        let audio = temp.path().join("audio.mp3");
        std::fs::write(&audio, b"audio").unwrap();

        let engine = engine_returning(RecognitionOutput {
            segments: vec![Segment::new(0.0, 1.0, "Habari")],
            language: "sw".to_string(),
            // Low confidence only warns
            language_probability: Some(0.2),
        });

        let transcript = transcribe(&engine, &audio, &options(), &language_map()).await.unwrap();
        assert_eq!(transcript.language, "sw");
        assert_eq!(transcript.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_audio_still_releases() {
        let temp = tempfile::tempdir().unwrap();
        let mut engine = MockRecognitionEngine::new();
        engine.expect_transcribe().never();
        engine.expect_release().times(1).returning(|| Ok(()));

        let err = transcribe(&engine, &temp.path().join("missing.mp3"), &options(), &language_map())
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::SourceNotFound(_)));
    }

    #[tokio::test]
    async fn test_engine_failure_is_surfaced_after_release() {
        let temp = tempfile::tempdir().unwrap();
        let audio = temp.path().join("audio.mp3");
        std::fs::write(&audio, b"audio").unwrap();

        let mut engine = MockRecognitionEngine::new();
        engine
            .expect_transcribe()
            .returning(|_, _| Err(PipelineError::RecognitionEngine("CUDA out of memory".to_string())));
        engine
            .expect_release()
            .times(1)
            .returning(|| Err(PipelineError::RecognitionEngine("release failed".to_string())));

        let err = transcribe(&engine, &audio, &options(), &language_map()).await.unwrap_err();
        match err {
            PipelineError::RecognitionEngine(msg) => assert!(msg.contains("out of memory")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_run_stage_writes_json_and_srt() {
        let temp = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.paths.audio_dir = temp.path().join("audio");
        config.paths.subs_original_dir = temp.path().join("subs_original");
        std::fs::create_dir_all(&config.paths.audio_dir).unwrap();
        std::fs::write(config.paths.audio_path(), b"audio").unwrap();

        let engine = engine_returning(RecognitionOutput {
            segments: vec![Segment::new(0.0, 2.0, "Merhaba dünya")],
            language: "tr".to_string(),
            language_probability: None,
        });

        run_stage(&engine, &config).await.unwrap();

        let saved = subtitle::read_transcript_json(config.paths.original_json_path()).await.unwrap();
        assert_eq!(saved.language, "tur_Latn");
        assert_eq!(saved.segments[0].text, "Merhaba dünya");

        let srt = std::fs::read_to_string(config.paths.original_srt_path()).unwrap();
        assert_eq!(srt, "1\n00:00:00,000 --> 00:00:02,000\nMerhaba dünya\n\n");
    }
}
