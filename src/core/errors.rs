use thiserror::Error;

#[derive(Error, Debug)]
pub enum SpeechBubbleError {
    #[error("I/O error: {0}")]
    Io(Box<std::io::Error>),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Reqwest error: {0}")]
    Reqwest(Box<reqwest::Error>),

    #[error("HTTP error {status} from {url}")]
    Http { status: u16, url: String },

    #[error("Missing credential: {0}")]
    MissingCredential(&'static str),

    #[error("Sentence generation failed: {0}")]
    Generation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("SpeechBubbleError: {0}")]
    Custom(String),
}

impl From<std::io::Error> for SpeechBubbleError {
    fn from(error: std::io::Error) -> Self {
        SpeechBubbleError::Io(Box::new(error))
    }
}

impl From<reqwest::Error> for SpeechBubbleError {
    fn from(error: reqwest::Error) -> Self {
        SpeechBubbleError::Reqwest(Box::new(error))
    }
}
