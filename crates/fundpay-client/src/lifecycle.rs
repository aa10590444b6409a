use std::future::Future;

use tokio_util::sync::CancellationToken;

/// A component's mounted lifetime.
///
/// Every request a controller issues runs through [`Mount::guard`]; once the
/// component unmounts, in-flight responses are dropped instead of being
/// written into state nobody is rendering any more.
#[derive(Debug, Default)]
pub struct Mount {
    token: CancellationToken,
}

impl Mount {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_mounted(&self) -> bool {
        !self.token.is_cancelled()
    }

    pub fn unmount(&self) {
        self.token.cancel();
    }

    /// A token that fires on unmount, for work spawned outside the controller.
    pub fn token(&self) -> CancellationToken {
        self.token.child_token()
    }

    /// Runs `fut` unless the component unmounts first. `None` means the
    /// result must not be applied.
    pub async fn guard<F: Future>(&self, fut: F) -> Option<F::Output> {
        if self.token.is_cancelled() {
            return None;
        }
        tokio::select! {
            biased;
            _ = self.token.cancelled() => None,
            output = fut => self.is_mounted().then_some(output),
        }
    }
}

impl Drop for Mount {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
