use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The remote store already holds a record with this address.
    /// Expected during repeated imports; callers classify it as a
    /// skip, not a failure.
    #[error("proxy already exists")]
    Duplicate,
    #[error("remote store error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("network error")]
    Network(#[from] reqwest::Error),
    #[error("invalid store URL")]
    BadUrl(#[from] url::ParseError),
    #[error("unable to decode response body")]
    Decode(#[from] serde_json::Error),
}

impl Error {
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Error::Duplicate)
    }
}
