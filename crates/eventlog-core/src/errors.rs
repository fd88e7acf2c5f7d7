/// Errors raised while normalizing an event before it reaches the store.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    #[error("invalid timestamp: {input:?} is not ISO-8601 or YYYY-MM-DDTHH:MM:SS")]
    Parse { input: String },
}

impl CoreError {
    /// Short classification string for logging and error bodies.
    pub fn error_kind(&self) -> &'static str {
        match self {
            Self::Parse { .. } => "parse_error",
        }
    }
}
