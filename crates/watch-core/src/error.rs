use thiserror::Error;

#[derive(Error, Debug)]
pub enum WatchError {
    /// Upstream returned nothing usable (no price rows, empty feed).
    #[error("No data: {0}")]
    NoData(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Transient transport or upstream failure in a quote/news/model call.
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// The text-generation model credential is not configured.
    #[error("Claude API key not configured")]
    MissingApiKey,

    /// Upstream output did not conform to the expected format.
    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Database error: {0}")]
    Database(String),
}
