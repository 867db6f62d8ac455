use thiserror::Error;

/// Failure to normalize a status document.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Neither the list shape nor the single-object shape decoded.
    ///
    /// Both decoder errors are kept since either one may be the useful one
    /// depending on what the upstream actually sent.
    #[error("status document matches neither source shape (as list: {as_list}; as object: {as_object})")]
    UnrecognizedShape {
        as_list: serde_json::Error,
        as_object: serde_json::Error,
    },
}

impl ParseError {
    /// Whether the body was not JSON at all, as opposed to JSON with an
    /// unexpected structure or a malformed timestamp.
    pub fn is_invalid_json(&self) -> bool {
        match self {
            Self::UnrecognizedShape { as_list, .. } => as_list.is_syntax() || as_list.is_eof(),
        }
    }
}
