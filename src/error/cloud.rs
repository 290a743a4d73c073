use thiserror::Error;

/// Failures reported by a cloud capability. Messages are carried verbatim so
/// the caller sees what the control plane said.
#[derive(Error, Debug)]
pub enum CloudError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("{operation} returned {status}: {message}")]
    Api {
        operation: &'static str,
        status: u16,
        message: String,
    },
    #[error("No credential source succeeded: {0}")]
    CredentialUnavailable(String),
    #[error("No subscription is visible to the credential")]
    NoSubscription,
    #[error("Operation ended in state {state}: {message}")]
    OperationFailed { state: String, message: String },
}
