// Translation stage
//
// Segment text is split into sentences, capped to the subtitle layout and
// translated sentence by sentence through a TranslationEngine:
// - Ollama: local LLM server over HTTP
// - Splitter: sentence segmentation strategies

pub mod ollama;
pub mod splitter;

use async_trait::async_trait;
use tracing::{debug, info};

pub use ollama::OllamaEngine;
pub use splitter::SentenceSplitter;

use crate::accelerator;
use crate::config::{Config, SubtitlesConfig};
use crate::error::{PipelineError, Result};
use crate::language::LanguageCodeMap;
use crate::subtitle;
use crate::transcript::{segment_progress, Transcript};

/// Texts shorter than this (after trimming) are not translated
pub const MIN_TRANSLATABLE_CHARS: usize = 3;

/// Machine translation engine
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TranslationEngine: Send + Sync {
    /// Translate one sentence between two codes in the engine's code space
    async fn translate(&self, text: &str, source_lang: &str, target_lang: &str) -> Result<String>;

    /// Free accelerator memory held by the engine
    async fn release(&self) -> Result<()>;
}

/// Factory for creating translation engines
pub struct TranslationEngineFactory;

impl TranslationEngineFactory {
    pub fn create_engine(config: &Config) -> Result<Box<dyn TranslationEngine>> {
        let engine = OllamaEngine::new(config.translation.clone(), config.models.translation_model.clone())?;
        Ok(Box::new(engine))
    }
}

/// Subtitle layout caps applied before translation
#[derive(Debug, Clone, Copy)]
pub struct TranslationLimits {
    pub max_line_length: usize,
    pub max_lines: usize,
}

impl From<&SubtitlesConfig> for TranslationLimits {
    fn from(config: &SubtitlesConfig) -> Self {
        Self {
            max_line_length: config.max_line_length,
            max_lines: config.max_lines,
        }
    }
}

/// Sentences of `text` that will be sent to the engine.
///
/// When the whole text is longer than `max_line_length`, every sentence is
/// cut to `max_line_length` characters first; the list is then capped at
/// `max_lines` in both cases.
pub fn select_sentences(text: &str, splitter: SentenceSplitter, limits: TranslationLimits) -> Vec<String> {
    if text.trim().chars().count() < MIN_TRANSLATABLE_CHARS {
        return Vec::new();
    }

    let mut sentences = splitter.split(text);

    if text.chars().count() > limits.max_line_length {
        sentences = sentences
            .into_iter()
            .map(|s| s.chars().take(limits.max_line_length).collect())
            .collect();
    }

    sentences.truncate(limits.max_lines);
    sentences
}

fn engine_error(err: PipelineError) -> PipelineError {
    match err {
        PipelineError::TranslationEngine(_) => err,
        other => PipelineError::TranslationEngine(other.to_string()),
    }
}

/// Translate the text of one segment, `""` when it is too short to translate
pub async fn translate_segment(
    engine: &dyn TranslationEngine,
    splitter: SentenceSplitter,
    text: &str,
    source_lang: &str,
    target_lang: &str,
    limits: TranslationLimits,
) -> Result<String> {
    let sentences = select_sentences(text, splitter, limits);
    if sentences.is_empty() {
        debug!("Skipping short text: {:?}", text);
        return Ok(String::new());
    }

    let mut translated = Vec::with_capacity(sentences.len());
    for sentence in &sentences {
        let result = engine
            .translate(sentence, source_lang, target_lang)
            .await
            .map_err(engine_error)?;
        translated.push(result);
    }

    Ok(translated.join(" "))
}

/// Translation stage: same segment timing, translated text
pub async fn translate(
    engine: &dyn TranslationEngine,
    splitter: SentenceSplitter,
    transcript: &Transcript,
    source_lang: &str,
    target_lang: &str,
    limits: TranslationLimits,
) -> Result<Transcript> {
    info!(
        "Translating {} segments {} -> {} ({:?} splitter)",
        transcript.len(),
        source_lang,
        target_lang,
        splitter
    );

    let pb = segment_progress(transcript.len(), "Translating");
    let mut segments = Vec::with_capacity(transcript.len());

    for segment in &transcript.segments {
        let text = translate_segment(engine, splitter, &segment.text, source_lang, target_lang, limits).await?;
        segments.push(segment.with_text(text));
        pb.inc(1);
    }

    pb.finish_and_clear();
    Ok(Transcript::new(segments, target_lang))
}

/// Run the translation stage: original JSON in, translated SRT and TXT out
pub async fn run_stage(engine: &dyn TranslationEngine, config: &Config) -> Result<Transcript> {
    let work = async {
        let transcript = subtitle::read_transcript_json(config.paths.original_json_path()).await?;

        let language_map = LanguageCodeMap::new(config.models.language_code_map.clone());
        let source_lang = language_map.resolve_source(&transcript.language);

        let translated = translate(
            engine,
            SentenceSplitter::from_config(&config.translation),
            &transcript,
            &source_lang,
            &config.models.target_lang,
            TranslationLimits::from(&config.subtitles),
        )
        .await?;

        subtitle::write_srt(&translated.segments, config.paths.translated_srt_path()).await?;
        subtitle::write_txt(&translated.segments, config.paths.translated_txt_path()).await?;
        Ok(translated)
    };

    accelerator::scoped("translation", work, engine.release()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::Segment;

    const LIMITS: TranslationLimits = TranslationLimits {
        max_line_length: 40,
        max_lines: 2,
    };

    /// Engine that upper-cases its input
    fn shouting_engine() -> MockTranslationEngine {
        let mut engine = MockTranslationEngine::new();
        engine
            .expect_translate()
            .returning(|text, _, _| Ok(text.to_uppercase()));
        engine.expect_release().returning(|| Ok(()));
        engine
    }

    #[test]
    fn test_short_text_selects_nothing() {
        assert!(select_sentences("  ok ", SentenceSplitter::Linguistic, LIMITS).is_empty());
        assert!(select_sentences("", SentenceSplitter::Regex, LIMITS).is_empty());
        assert_eq!(select_sentences("Yes", SentenceSplitter::Linguistic, LIMITS), vec!["Yes"]);
    }

    #[test]
    fn test_long_text_truncates_then_caps() {
        let text = "This first sentence is definitely longer than forty characters. Second one. Third one.";
        let sentences = select_sentences(text, SentenceSplitter::Linguistic, LIMITS);

        assert_eq!(sentences.len(), 2);
        assert!(sentences.iter().all(|s| s.chars().count() <= 40));
        assert_eq!(sentences[0], "This first sentence is definitely longer");
        assert_eq!(sentences[1], "Second one.");
    }

    #[test]
    fn test_select_sentences_with_ideographic_space() {
        let sentences = select_sentences("東京\u{3000}Tokyo. Next one.", SentenceSplitter::Linguistic, LIMITS);
        assert_eq!(sentences, vec!["東京\u{3000}Tokyo.", "Next one."]);
    }

    #[test]
    fn test_short_text_only_caps() {
        let limits = TranslationLimits {
            max_line_length: 40,
            max_lines: 1,
        };
        let sentences = select_sentences("One. Two. Three.", SentenceSplitter::Linguistic, limits);
        assert_eq!(sentences, vec!["One."]);
    }

    #[tokio::test]
    async fn test_translate_segment_joins_with_space() {
        let engine = shouting_engine();
        let text = translate_segment(&engine, SentenceSplitter::Linguistic, "Hi there. Bye now.", "eng_Latn", "tur_Latn", LIMITS)
            .await
            .unwrap();
        assert_eq!(text, "HI THERE. BYE NOW.");
    }

    #[tokio::test]
    async fn test_short_segment_skips_engine() {
        let mut engine = MockTranslationEngine::new();
        engine.expect_translate().never();

        let text = translate_segment(&engine, SentenceSplitter::Regex, " a ", "eng_Latn", "tur_Latn", LIMITS)
            .await
            .unwrap();
        assert_eq!(text, "");
    }

    #[tokio::test]
    async fn test_translate_preserves_timing_and_order() {
        let engine = shouting_engine();
        let transcript = Transcript::new(
            vec![
                Segment::new(0.0, 1.0, "First line."),
                Segment::new(1.0, 2.5, "ok"),
                Segment::new(2.5, 4.0, "Third line."),
            ],
            "eng_Latn",
        );

        let translated = translate(&engine, SentenceSplitter::Linguistic, &transcript, "eng_Latn", "tur_Latn", LIMITS)
            .await
            .unwrap();

        assert_eq!(translated.language, "tur_Latn");
        let texts: Vec<_> = translated.segments.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["FIRST LINE.", "", "THIRD LINE."]);
        for (a, b) in translated.segments.iter().zip(transcript.segments.iter()) {
            assert_eq!((a.start, a.end), (b.start, b.end));
        }
    }

    #[tokio::test]
    async fn test_engine_error_is_translation_error() {
        let mut engine = MockTranslationEngine::new();
        engine
            .expect_translate()
            .returning(|_, _, _| Err(PipelineError::Config("connection refused".to_string())));

        let err = translate_segment(&engine, SentenceSplitter::Linguistic, "Hello world.", "eng_Latn", "tur_Latn", LIMITS)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::TranslationEngine(_)));
    }

    #[tokio::test]
    async fn test_run_stage_resolves_source_and_writes_outputs() {
        let temp = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.paths.subs_original_dir = temp.path().join("orig");
        config.paths.subs_translated_dir = temp.path().join("translated");

        // An empty language falls back to English
        let transcript = Transcript::new(vec![Segment::new(0.5, 2.0, "Good morning.")], "");
        subtitle::write_transcript_json(&transcript, config.paths.original_json_path())
            .await
            .unwrap();

        let mut engine = MockTranslationEngine::new();
        engine
            .expect_translate()
            .times(1)
            .returning(|text, source, target| {
                assert_eq!((text, source, target), ("Good morning.", "eng_Latn", "tur_Latn"));
                Ok("Günaydın.".to_string())
            });
        engine.expect_release().times(1).returning(|| Ok(()));

        run_stage(&engine, &config).await.unwrap();

        let srt = std::fs::read_to_string(config.paths.translated_srt_path()).unwrap();
        assert_eq!(srt, "1\n00:00:00,500 --> 00:00:02,000\nGünaydın.\n\n");
        let txt = std::fs::read_to_string(config.paths.translated_txt_path()).unwrap();
        assert_eq!(txt, "Günaydın.\n");
    }

    #[tokio::test]
    async fn test_run_stage_missing_json_releases_engine() {
        let temp = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.paths.subs_original_dir = temp.path().join("nothing-here");

        let mut engine = MockTranslationEngine::new();
        engine.expect_translate().never();
        engine.expect_release().times(1).returning(|| Ok(()));

        let err = run_stage(&engine, &config).await.unwrap_err();
        assert!(matches!(err, PipelineError::SourceNotFound(_)));
        assert!(!config.paths.translated_srt_path().exists());
    }
}
