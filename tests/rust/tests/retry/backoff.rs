//! Tests for RetryExecutor around pooled connects

use pretty_assertions::assert_eq;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use plexiglass_core::{ConnectionFailure, Error, PerformanceSettings};
use plexiglass_services::{ClientError, ConnectionPool, ErrorClassifier, RetryExecutor, RetryPolicy};
use tests::fixtures::pool_with;
use tests::mocks::*;
use tokio_util::sync::CancellationToken;

fn executor(policy: RetryPolicy) -> (RetryExecutor, Arc<RecordingSleeper>) {
    let sleeper = Arc::new(RecordingSleeper::new());
    let executor =
        RetryExecutor::new(policy, Arc::new(ErrorClassifier::new())).with_sleeper(sleeper.clone());
    (executor, sleeper)
}

async fn connect_home(pool: &ConnectionPool, attempts: &AtomicUsize) -> Result<(), Error> {
    attempts.fetch_add(1, Ordering::SeqCst);
    pool.connect("Home").await.map(|_| ())
}

#[tokio::test]
async fn test_unauthorized_gets_one_attempt() {
    let factory = Arc::new(
        MockClientFactory::new().fail_times(ClientError::Unauthorized("401".to_string()), 5),
    );
    let pool = pool_with(&["Home"], factory.clone());
    let (executor, sleeper) = executor(RetryPolicy::new(3, Duration::from_millis(10)));
    let attempts = AtomicUsize::new(0);
    let (pool, counter) = (&pool, &attempts);

    let err = executor
        .execute_with_retry(move || connect_home(pool, counter), &CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(err.connection_failure(), Some(ConnectionFailure::Unauthorized));
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
    assert_eq!(factory.call_count(), 1);
    assert!(sleeper.delays().is_empty());
}

#[tokio::test]
async fn test_transient_failures_then_success() {
    let factory = Arc::new(
        MockClientFactory::new().fail_times(ClientError::Other("refused".to_string()), 2),
    );
    let pool = pool_with(&["Home"], factory.clone());
    let (executor, sleeper) = executor(
        RetryPolicy::new(3, Duration::from_millis(100)).with_exponential_backoff(true),
    );
    let attempts = AtomicUsize::new(0);
    let (pool_ref, counter) = (&pool, &attempts);

    executor
        .execute_with_retry(move || connect_home(pool_ref, counter), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(attempts.load(Ordering::SeqCst), 3);
    assert!(pool.is_connected("Home"));
    let delays = sleeper.delays();
    assert_eq!(
        delays,
        vec![Duration::from_millis(100), Duration::from_millis(200)]
    );
    assert!(delays[1] > delays[0]);
}

#[tokio::test]
async fn test_fixed_delay_without_exponential_backoff() {
    let factory = Arc::new(
        MockClientFactory::new().fail_times(ClientError::Timeout("slow".to_string()), 2),
    );
    let pool = pool_with(&["Home"], factory);
    let (executor, sleeper) = executor(RetryPolicy::new(3, Duration::from_millis(100)));
    let attempts = AtomicUsize::new(0);
    let (pool, counter) = (&pool, &attempts);

    executor
        .execute_with_retry(move || connect_home(pool, counter), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(
        sleeper.delays(),
        vec![Duration::from_millis(100), Duration::from_millis(100)]
    );
}

#[tokio::test]
async fn test_exhausted_attempts_return_last_error() {
    let factory = Arc::new(
        MockClientFactory::new()
            .fail_next(ClientError::Other("first".to_string()))
            .fail_next(ClientError::Other("second".to_string()))
            .fail_next(ClientError::Timeout("third".to_string())),
    );
    let pool = pool_with(&["Home"], factory.clone());
    let (executor, sleeper) = executor(RetryPolicy::new(3, Duration::from_millis(10)));
    let attempts = AtomicUsize::new(0);
    let (pool, counter) = (&pool, &attempts);

    let err = executor
        .execute_with_retry(move || connect_home(pool, counter), &CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(err.connection_failure(), Some(ConnectionFailure::Timeout));
    assert!(err.to_string().contains("third"));
    assert_eq!(factory.call_count(), 3);
    assert_eq!(sleeper.delays().len(), 2);
}

#[tokio::test]
async fn test_explicit_policy_overrides_default() {
    let factory = Arc::new(
        MockClientFactory::new().fail_times(ClientError::Other("refused".to_string()), 10),
    );
    let pool = pool_with(&["Home"], factory.clone());
    let settings = PerformanceSettings {
        max_retries: 2,
        ..Default::default()
    };
    let (executor, _) = executor(RetryPolicy::from_settings(&settings));
    let attempts = AtomicUsize::new(0);
    let (pool, counter) = (&pool, &attempts);

    let policy = RetryPolicy::new(5, Duration::from_millis(1));
    let result = executor
        .execute_with_policy(
            &policy,
            move || connect_home(pool, counter),
            &CancellationToken::new(),
        )
        .await;

    assert!(result.is_err());
    assert_eq!(attempts.load(Ordering::SeqCst), 5);
    assert_eq!(executor.policy().retry_count, 2);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_during_backoff_sleep() {
    let factory = Arc::new(
        MockClientFactory::new().fail_times(ClientError::Other("refused".to_string()), 10),
    );
    let pool = pool_with(&["Home"], factory.clone());
    let executor = RetryExecutor::new(
        RetryPolicy::new(5, Duration::from_secs(30)),
        Arc::new(ErrorClassifier::new()),
    );
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        trigger.cancel();
    });
    let attempts = AtomicUsize::new(0);
    let (pool, counter) = (&pool, &attempts);

    let started = tokio::time::Instant::now();
    let err = executor
        .execute_with_retry(move || connect_home(pool, counter), &cancel)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Cancelled));
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
    assert!(started.elapsed() < Duration::from_secs(30));
}
