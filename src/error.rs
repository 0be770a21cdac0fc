use thiserror::Error;

#[derive(Error, Debug)]
pub enum GearForgeError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV Parsing Error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON Parsing Error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unable to interpret: {0}")]
    Interpret(String),

    #[error("Malformed weight '{weight}' for keyword '{keyword}'")]
    MalformedWeight { weight: String, keyword: String },

    #[error("Unrecognized keyword: {0}")]
    UnrecognizedKeyword(String),

    #[error("Unknown or custom outfit: {0}")]
    UnknownOutfit(String),

    #[error("Unknown familiar: {0}")]
    UnknownFamiliar(String),

    #[error("No equipment matches: {0}")]
    UnknownItem(String),

    #[error("No configuration satisfies the requested constraints (best score {score:.2})")]
    Unsatisfiable { score: f64 },

    #[error("Configuration Error: {0}")]
    Config(String),

    #[error("Data Validation Error: {0}")]
    Validation(String),
}

impl GearForgeError {
    /// True for errors caused by the expression text rather than the data.
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            Self::Interpret(_)
                | Self::MalformedWeight { .. }
                | Self::UnrecognizedKeyword(_)
                | Self::UnknownOutfit(_)
                | Self::UnknownFamiliar(_)
                | Self::UnknownItem(_)
        )
    }
}

pub type GfResult<T> = Result<T, GearForgeError>;
