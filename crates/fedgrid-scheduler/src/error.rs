//! Scheduler error types.

use thiserror::Error;

use fedgrid_adapter::AdapterError;
use fedgrid_core::ProviderTag;

/// Exceptional scheduling failures.
///
/// Finding no placement is not an error; it is `Ok(None)`.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("adapter {provider} failed: {source}")]
    Adapter {
        provider: ProviderTag,
        #[source]
        source: AdapterError,
    },
}

impl SchedulerError {
    pub(crate) fn adapter(provider: ProviderTag) -> impl FnOnce(AdapterError) -> Self {
        move |source| SchedulerError::Adapter { provider, source }
    }
}

pub type SchedulerResult<T> = Result<T, SchedulerError>;
