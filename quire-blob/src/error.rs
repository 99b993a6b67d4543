use thiserror::Error;

pub type BlobResult<T> = Result<T, BlobError>;

#[derive(Error, Debug)]
pub enum BlobError {
    #[error("No blob stored at {key}")]
    NotFound { key: String },

    /// Bad key, URL or payload supplied by the caller.
    #[error("Invalid blob request: {message}")]
    Invalid { message: String },

    #[error("Blob of {size} bytes exceeds the {max} byte limit")]
    TooLarge { size: u64, max: u64 },

    #[error("Blob store failure: {source}")]
    Backend {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Blob I/O failure: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl BlobError {
    pub fn backend<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Backend {
            source: Box::new(error),
        }
    }

    pub fn invalid<S: Into<String>>(message: S) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }

    pub fn not_found<S: Into<String>>(key: S) -> Self {
        Self::NotFound { key: key.into() }
    }

    /// Whether the caller, not the store, is at fault.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            BlobError::NotFound { .. } | BlobError::Invalid { .. } | BlobError::TooLarge { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_failures_are_not_client_errors() {
        assert!(BlobError::not_found("t/a.png").is_client_error());
        assert!(BlobError::invalid("bad").is_client_error());
        assert!(!BlobError::backend(std::io::Error::other("down")).is_client_error());
        assert!(!BlobError::from(std::io::Error::other("disk")).is_client_error());
    }
}
