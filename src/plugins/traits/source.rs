use async_trait::async_trait;

use crate::models::{Platform, RawCandidate};
use crate::utils::error::AdapterError;

/// Search capability for one marketplace.
///
/// Implementations own their retry, timeout and session handling; callers
/// only ever see the final candidates or an [`AdapterError`]. A call may
/// block for tens of seconds.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Name used in logs and reports.
    fn name(&self) -> &str;

    fn platform(&self) -> Platform;

    async fn search(&self, phrase: &str) -> Result<Vec<RawCandidate>, AdapterError>;

    /// Recreate any underlying session after it was lost.
    async fn reset(&self) -> Result<(), AdapterError> {
        Ok(())
    }
}

#[async_trait]
impl<S: SourceAdapter + ?Sized> SourceAdapter for Box<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn platform(&self) -> Platform {
        (**self).platform()
    }

    async fn search(&self, phrase: &str) -> Result<Vec<RawCandidate>, AdapterError> {
        (**self).search(phrase).await
    }

    async fn reset(&self) -> Result<(), AdapterError> {
        (**self).reset().await
    }
}
