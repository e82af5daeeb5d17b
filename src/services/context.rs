use std::future::Future;
use std::time::Duration;
use tokio::time::{timeout_at, Instant};

use super::error::ServiceError;
use crate::database::StoreError;

/// Per-request deadline shared by every store call the request makes.
///
/// When the deadline passes the in-flight store future is dropped, which
/// cancels it, and the request fails with [`ServiceError::Timeout`].
#[derive(Debug, Clone, Copy)]
pub struct RequestContext {
    deadline: Instant,
}

impl RequestContext {
    pub fn new(timeout: Duration) -> Self {
        Self {
            deadline: Instant::now() + timeout,
        }
    }

    /// Runs a store call under the request deadline.
    pub async fn run<T, F>(&self, call: F) -> Result<T, ServiceError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        match timeout_at(self.deadline, call).await {
            Ok(result) => result.map_err(ServiceError::from),
            Err(_) => {
                tracing::warn!("Store call abandoned at request deadline");
                Err(ServiceError::Timeout)
            }
        }
    }

    /// Runs any fallible step under the request deadline.
    pub async fn guard<T, F>(&self, step: F) -> Result<T, ServiceError>
    where
        F: Future<Output = Result<T, ServiceError>>,
    {
        timeout_at(self.deadline, step)
            .await
            .unwrap_or(Err(ServiceError::Timeout))
    }
}
