//! The one-automatic-retry policy spec §7 requires on the two transactional
//! writes (`create_hold` steps 5–6, `confirm_booking` steps 5–8): a
//! serialization failure is retried exactly once before it is surfaced as
//! `TransientStorage`.

use std::future::Future;

use crate::error::SrcError;

/// Runs `attempt` once; if it fails with [`SrcError::TransientStorage`],
/// runs it a second time and returns whatever that produces. Any other
/// error is surfaced immediately without a retry (spec §7: "all other
/// kinds are surfaced unchanged").
pub(crate) async fn with_one_retry<T, F, Fut>(mut attempt: F) -> Result<T, SrcError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, SrcError>>,
{
    match attempt().await {
        Err(SrcError::TransientStorage(msg)) => {
            tracing::debug!(reason = %msg, "retrying once after a transient storage failure");
            attempt().await
        }
        other => other,
    }
}

#[cfg(test)]
mod with_one_retry_test {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::with_one_retry;
    use crate::error::SrcError;

    #[tokio::test]
    async fn succeeds_without_retrying_on_the_first_success() {
        let calls = AtomicU32::new(0);
        let result = with_one_retry(|| async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, SrcError>(42)
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    #[tracing_test::traced_test]
    async fn retries_exactly_once_after_a_transient_failure() {
        let calls = AtomicU32::new(0);
        let result = with_one_retry(|| async {
            let attempt = calls.fetch_add(1, Ordering::SeqCst);
            if attempt == 0 {
                Err(SrcError::TransientStorage("serialization failure".into()))
            } else {
                Ok(99)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 99);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(logs_contain("retrying once after a transient storage failure"));
    }

    #[tokio::test]
    async fn does_not_retry_a_non_transient_error() {
        let calls = AtomicU32::new(0);
        let result = with_one_retry(|| async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err::<i32, _>(SrcError::InvalidQuantity("bad".into()))
        })
        .await;
        assert!(matches!(result, Err(SrcError::InvalidQuantity(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
