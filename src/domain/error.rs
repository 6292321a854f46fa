//! Domain error types.

/// Top-level error type for snrscan.
#[derive(Debug, thiserror::Error)]
pub enum SnrError {
    #[error("{identifier}: not found ({reason})")]
    NotFound { identifier: String, reason: String },

    #[error("{source_name}: not the expected format: {reason}")]
    FormatMismatch { source_name: String, reason: String },

    #[error("insufficient data for {identifier}: have {points} points, need {minimum}")]
    InsufficientData {
        identifier: String,
        points: usize,
        minimum: usize,
    },

    #[error("degenerate series: {reason}")]
    DegenerateSeries { reason: String },

    #[error("signal-to-noise ratio undefined: rmsd is zero")]
    DivisionUndefined,

    #[error("offline and no cached response for {path}")]
    Unavailable { path: String },

    #[error("request for {path} failed: {reason}")]
    TransportFailure { path: String, reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SnrError {
    pub fn not_found(identifier: impl Into<String>, reason: impl ToString) -> Self {
        Self::NotFound {
            identifier: identifier.into(),
            reason: reason.to_string(),
        }
    }

    pub fn format_mismatch(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::FormatMismatch {
            source_name: source_name.into(),
            reason: reason.into(),
        }
    }

    /// Only a missing instrument lets a batch continue.
    pub fn is_skippable(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<&SnrError> for std::process::ExitCode {
    fn from(err: &SnrError) -> Self {
        let code: u8 = match err {
            SnrError::Io(_) => 1,
            SnrError::ConfigParse { .. } | SnrError::ConfigInvalid { .. } => 2,
            SnrError::NotFound { .. } | SnrError::FormatMismatch { .. } => 3,
            SnrError::InsufficientData { .. }
            | SnrError::DegenerateSeries { .. }
            | SnrError::DivisionUndefined => 4,
            SnrError::Unavailable { .. } | SnrError::TransportFailure { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
