#[derive(Debug, thiserror::Error)]
pub enum CrecError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Full-text index error: {0}")]
    FullText(#[from] anyhow::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Provider not found: {id}")]
    UnknownProvider { id: String },

    #[error("No content transform registered under name {name}")]
    UnknownTransform { name: String },

    #[error("No recommender registered under name {name}")]
    UnknownRecommender { name: String },

    #[error("Transform failed: {0}")]
    Transform(String),

    #[error("Content too large: {size_mb}MB")]
    TooLarge { size_mb: usize },

    #[error("General error: {0}")]
    General(String),
}

pub type Result<T> = std::result::Result<T, CrecError>;
