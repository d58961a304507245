use std::time::Duration;

use scaffold_exec::executor::concurrency::ConcurrencyLimits;

#[tokio::test]
async fn third_acquire_waits_for_a_release() {
    let limits = ConcurrencyLimits::new(2);
    assert_eq!(limits.available(), 2);

    let first = limits.acquire().await;
    let _second = limits.acquire().await;
    assert_eq!(limits.available(), 0);

    let blocked = tokio::time::timeout(Duration::from_millis(20), limits.acquire()).await;
    assert!(blocked.is_err());

    drop(first);
    let third = tokio::time::timeout(Duration::from_millis(200), limits.acquire()).await;
    assert!(third.is_ok());
}

#[tokio::test]
async fn zero_limit_still_allows_one() {
    let limits = ConcurrencyLimits::new(0);
    assert_eq!(limits.available(), 1);
    let _permit = limits.acquire().await;
    assert_eq!(limits.available(), 0);
}
