//! Directory services.
//!
//! Services validate input, run the backend operations that make up one
//! directory action, and bound each action by the configured timeout.

pub mod password;
pub mod slug;
pub mod stores;
pub mod users;

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::error::{DirectoryError, Result};

pub use slug::SlugAssigner;
pub use stores::StoreService;
pub use users::UserService;

/// Run `fut`, giving up after `limit`.
async fn bounded<T, F>(limit: Duration, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::time::timeout(limit, fut).await.unwrap_or_else(|_| {
        warn!(?limit, "Operation timed out");
        Err(DirectoryError::Timeout(limit))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bounded_passes_result_through() {
        let value = bounded(Duration::from_secs(1), async { Ok(7) }).await;
        assert!(matches!(value, Ok(7)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_bounded_times_out() {
        let limit = Duration::from_millis(50);
        let result: Result<()> = bounded(limit, async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;

        assert!(matches!(result, Err(DirectoryError::Timeout(d)) if d == limit));
    }
}
