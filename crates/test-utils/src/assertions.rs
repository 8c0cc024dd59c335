//! Polling assertions for state changed by other tasks.

use std::time::Duration;

use tokio::time::sleep;

/// How often [`assert_eventually`] re-checks its condition.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Polls a condition until it returns true or the timeout expires.
///
/// Useful when a spawned task finishes at a non-deterministic moment, such
/// as a `next` call whose spin delay is cut short from another task.
///
/// # Returns
///
/// `true` if the condition became true before timeout, `false` otherwise.
///
/// # Example
///
/// ```no_run
/// use std::sync::{
///     Arc,
///     atomic::{AtomicBool, Ordering},
/// };
/// use std::time::Duration;
///
/// use hostprovider_test_utils::assert_eventually;
///
/// # async fn example() {
/// let flag = Arc::new(AtomicBool::new(false));
/// let flag_clone = flag.clone();
///
/// tokio::spawn(async move {
///     tokio::time::sleep(Duration::from_millis(50)).await;
///     flag_clone.store(true, Ordering::SeqCst);
/// });
///
/// let result =
///     assert_eventually(Duration::from_millis(200), || flag.load(Ordering::SeqCst)).await;
/// assert!(result, "flag should be set");
/// # }
/// ```
pub async fn assert_eventually<F>(timeout: Duration, condition: F) -> bool
where
    F: Fn() -> bool,
{
    let poll = async {
        while !condition() {
            sleep(POLL_INTERVAL).await;
        }
    };

    tokio::time::timeout(timeout, poll).await.is_ok() || condition()
}
