pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0}")]
    General(String),
    /// Shapes or settings that cannot describe a valid dataset layout.
    #[error("invalid dataset configuration: {0}")]
    Configuration(String),
    #[error("{method} is not supported by the {backend} backend")]
    UnsupportedCodec { backend: String, method: String },
    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),
    #[error(transparent)]
    Wrapped(Box<dyn std::error::Error>),
}

impl Error {
    pub fn general(message: impl Into<String>) -> Self {
        Self::General(message.into())
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn unsupported(backend: impl ToString, method: impl ToString) -> Self {
        Self::UnsupportedCodec {
            backend: backend.to_string(),
            method: method.to_string(),
        }
    }

    pub fn wrap(error: impl std::error::Error + 'static) -> Self {
        Self::Wrapped(Box::new(error))
    }
}
