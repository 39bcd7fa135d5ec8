use std::path::Path;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{debug, info};

use crate::error::{Result, PipelineError};
use crate::transcript::{Segment, Transcript};

/// On-disk JSON envelope: `{ "segments": [[start, end, text], ...], "lang": "<code>" }`
#[derive(Debug, Serialize, Deserialize)]
struct TranscriptEnvelope {
    segments: Vec<(f64, f64, String)>,
    lang: String,
}

/// Encode segments as SRT text
pub fn encode_srt(segments: &[Segment]) -> Result<String> {
    let mut srt_content = String::new();

    for (index, segment) in segments.iter().enumerate() {
        if segment.end < segment.start {
            return Err(PipelineError::Encoding(format!(
                "segment {} ends before it starts ({} < {})",
                index + 1,
                segment.end,
                segment.start
            )));
        }

        srt_content.push_str(&format!(
            "{}\n{} --> {}\n{}\n\n",
            index + 1,
            format_srt_time(segment.start),
            format_srt_time(segment.end),
            segment.text
        ));
    }

    Ok(srt_content)
}

/// Encode segments as plain text, one line per segment
pub fn encode_txt(segments: &[Segment]) -> String {
    let mut content = String::new();
    for segment in segments {
        content.push_str(&segment.text);
        content.push('\n');
    }
    content
}

pub fn encode_json(transcript: &Transcript) -> Result<Vec<u8>> {
    let envelope = TranscriptEnvelope {
        segments: transcript
            .segments
            .iter()
            .map(|seg| (seg.start, seg.end, seg.text.clone()))
            .collect(),
        lang: transcript.language.clone(),
    };

    Ok(serde_json::to_vec_pretty(&envelope)?)
}

pub fn decode_json(bytes: &[u8]) -> Result<Transcript> {
    let envelope: TranscriptEnvelope = serde_json::from_slice(bytes)
        .map_err(|e| PipelineError::MalformedInput(format!("invalid transcript JSON: {}", e)))?;

    let segments = envelope
        .segments
        .into_iter()
        .map(|(start, end, text)| Segment::new(start, end, text))
        .collect();

    Ok(Transcript::new(segments, envelope.lang))
}

/// Format time in seconds to SRT time format (HH:MM:SS,mmm).
///
/// Every component is truncated; milliseconds come from the fractional
/// remainder of the value scaled to milliseconds.
pub fn format_srt_time(seconds: f64) -> String {
    let seconds = seconds.max(0.0);
    let hours = (seconds / 3600.0).floor() as u64;
    let minutes = ((seconds % 3600.0) / 60.0).floor() as u64;
    let secs = (seconds % 60.0).floor() as u64;
    let millis = ((seconds * 1000.0) % 1000.0).floor() as u64;

    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, secs, millis)
}

/// Create the parent directory of `path` if it is missing
pub(crate) async fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }
    Ok(())
}

/// Write segments to an SRT file, creating the parent directory if needed
pub async fn write_srt<P: AsRef<Path>>(segments: &[Segment], output_path: P) -> Result<()> {
    let output_path = output_path.as_ref();
    info!("Generating SRT file: {}", output_path.display());

    let content = encode_srt(segments)?;
    ensure_parent_dir(output_path).await?;
    fs::write(output_path, content).await?;

    debug!("Wrote {} subtitle entries", segments.len());
    Ok(())
}

pub async fn write_txt<P: AsRef<Path>>(segments: &[Segment], output_path: P) -> Result<()> {
    let output_path = output_path.as_ref();
    info!("Generating text file: {}", output_path.display());

    ensure_parent_dir(output_path).await?;
    fs::write(output_path, encode_txt(segments)).await?;
    Ok(())
}

pub async fn write_transcript_json<P: AsRef<Path>>(transcript: &Transcript, output_path: P) -> Result<()> {
    let output_path = output_path.as_ref();
    info!("Saving transcript JSON: {}", output_path.display());

    let bytes = encode_json(transcript)?;
    ensure_parent_dir(output_path).await?;
    fs::write(output_path, bytes).await?;
    Ok(())
}

pub async fn read_transcript_json<P: AsRef<Path>>(input_path: P) -> Result<Transcript> {
    let input_path = input_path.as_ref();
    if !input_path.exists() {
        return Err(PipelineError::SourceNotFound(format!(
            "transcript JSON not found: {}",
            input_path.display()
        )));
    }

    let bytes = fs::read(input_path).await?;
    let transcript = decode_json(&bytes)?;
    debug!(
        "Loaded {} segments (lang: {}) from {}",
        transcript.len(),
        transcript.language,
        input_path.display()
    );
    Ok(transcript)
}
