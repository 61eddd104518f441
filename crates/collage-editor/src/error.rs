/// Errors surfaced to the user by editor commands.
///
/// None of these are fatal: the session stays usable and nothing partial is
/// committed when one is returned.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EditorError {
    #[error("select a template first")]
    NoTemplate,
    #[error("no template at index {0}")]
    UnknownTemplate(usize),
    #[error("this template needs {expected} images, got {actual}")]
    CountMismatch { expected: usize, actual: usize },
    #[error("image {index} could not be decoded: {reason}")]
    Decode { index: usize, reason: String },
}

impl EditorError {
    /// True for the selection family (no template, unknown template).
    pub fn is_selection(&self) -> bool {
        matches!(self, EditorError::NoTemplate | EditorError::UnknownTemplate(_))
    }
}
