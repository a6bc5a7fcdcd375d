use thiserror::Error;

/// Failure that aborts the construction of a single entity.
///
/// The message is the reason logged next to the page title; the batch keeps going.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("{0}")]
    Field(String),
    #[error("Boucle de redirections détectée")]
    RedirectLoop,
    #[error("{context} : {source}")]
    Nested {
        context: String,
        #[source]
        source: Box<ParseError>,
    },
}

impl ParseError {
    pub fn new(message: impl Into<String>) -> Self {
        Self::Field(message.into())
    }

    pub fn context(self, context: impl Into<String>) -> Self {
        Self::Nested {
            context: context.into(),
            source: Box::new(self),
        }
    }
}

pub type ParseResult<T> = std::result::Result<T, ParseError>;
