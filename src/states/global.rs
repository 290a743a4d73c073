use crate::services::Provisioner;
use tokio_util::sync::CancellationToken;

#[derive(Clone)]
pub struct GlobalState {
    pub provisioner: Provisioner,
    /// Cancelled on process shutdown; each request waits on a child token.
    pub shutdown: CancellationToken,
}

impl GlobalState {
    pub fn new(provisioner: Provisioner, shutdown: CancellationToken) -> Self {
        Self {
            provisioner,
            shutdown,
        }
    }
}
