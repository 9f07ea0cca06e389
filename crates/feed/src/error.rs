use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("unknown channel: {channel}")]
    ChannelNotFound { channel: String },

    #[error("notification source failed: {source}")]
    Source {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("{message}")]
    Message { message: String },

    #[error("{context}: {source}")]
    External {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl Error {
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn channel_not_found(channel: impl Into<String>) -> Self {
        Self::ChannelNotFound {
            channel: channel.into(),
        }
    }

    #[must_use]
    pub fn source_failed(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Source {
            source: Box::new(source),
        }
    }

    #[must_use]
    pub fn external(
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::External {
            context: context.into(),
            source: Box::new(source),
        }
    }

    /// Whether this error means the requested channel does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ChannelNotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
