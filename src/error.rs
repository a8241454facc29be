use thiserror::Error;

#[derive(Error, Debug)]
pub enum TilawaError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Unknown surah {surah} (catalog knows 1..={max})")]
    UnknownSurah { surah: u16, max: usize },

    #[error("Unknown reciter id: {0}")]
    UnknownReciter(String),

    #[error("Invalid verse identifier '{0}', expected six digits SSSTTT")]
    InvalidVerseId(String),

    #[error("No text for verse {key} in {source_name}")]
    MissingVerseText { key: String, source_name: String },

    #[error("No audio files found in {0}")]
    EmptyAudioFolder(String),

    #[error("Download of {url} failed: HTTP {status}")]
    Download { url: String, status: u16 },

    #[error("Media processing error: {0}")]
    Media(String),
}

pub type Result<T> = std::result::Result<T, TilawaError>;
