use thiserror::Error;

/// Fatal configuration mistakes. Unlike delivery failures, these are raised
/// to the caller immediately instead of being normalized into a result.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("platform \"{0}\" is not supported")]
    UnsupportedPlatform(String),
    #[error("domain whitelist must contain at least one domain")]
    EmptyDomainList,
}
