/// Errors produced by the analysis core.
///
/// Every error is scoped to one file or one sample/reference pair. Callers
/// processing a batch record the error for that item and move on.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AnalysisError {
    /// Malformed or empty signal, or file content that could not be parsed.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Configuration value outside its allowed range.
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// Sample and reference tables are structurally inconsistent.
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    /// A single encoded table cell could not be read as a number.
    #[error("cannot parse cell '{0}'")]
    CellParse(String),
}

impl AnalysisError {
    pub(crate) fn parameter(name: &'static str, reason: impl Into<String>) -> Self {
        AnalysisError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
