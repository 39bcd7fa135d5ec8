use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Source not found: {0}")]
    SourceNotFound(String),

    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("Subtitle encoding error: {0}")]
    Encoding(String),

    #[error("{description} failed ({}): {stderr}", exit_label(.status))]
    EncodingTool {
        description: String,
        status: Option<i32>,
        stderr: String,
    },

    #[error("Recognition engine error: {0}")]
    RecognitionEngine(String),

    #[error("Translation engine error: {0}")]
    TranslationEngine(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;

fn exit_label(status: &Option<i32>) -> String {
    match status {
        Some(code) => format!("exit code {}", code),
        None => "terminated by signal".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoding_tool_message_carries_stderr() {
        let err = PipelineError::EncodingTool {
            description: "Audio extraction".to_string(),
            status: Some(1),
            stderr: "No such file".to_string(),
        };
        assert_eq!(err.to_string(), "Audio extraction failed (exit code 1): No such file");

        let err = PipelineError::EncodingTool {
            description: "Soft subtitle muxing".to_string(),
            status: None,
            stderr: String::new(),
        };
        assert!(err.to_string().contains("terminated by signal"));
    }
}
