use crate::gateway::{Identity, PointLookupGateway};
use crate::schema::ModelSchema;
use crate::settings::StorageSettings;
use crate::value::Value;
use crate::PassiveError;
use std::time::Duration;

/// Runs `op` up to `attempts` times, sleeping `delay` between failures that `retryable` accepts.
pub fn retry_with_delay<F, T, E, R>(attempts: usize, delay: Duration, retryable: R, mut op: F) -> Result<T, E>
where
    F: FnMut() -> Result<T, E>,
    R: Fn(&E) -> bool,
{
    assert!(attempts >= 1);
    let mut left = attempts;
    loop {
        match op() {
            Ok(v) => return Ok(v),
            Err(e) if left > 1 && retryable(&e) => {
                left -= 1;
                std::thread::sleep(delay);
            }
            Err(e) => return Err(e),
        }
    }
}

/// Gateway wrapper that retries transient storage failures. `NotFound` and
/// loader errors are returned immediately.
pub struct RetryingGateway<G> {
    inner: G,
    attempts: usize,
    delay: Duration,
}

impl<G: PointLookupGateway> RetryingGateway<G> {
    pub fn new(inner: G, attempts: usize, delay: Duration) -> Self {
        Self { inner, attempts: attempts.max(1), delay }
    }

    pub fn from_settings(inner: G, settings: &StorageSettings) -> Self {
        Self::new(inner, settings.lookup_attempts, settings.retry_delay)
    }

    pub fn inner(&self) -> &G {
        &self.inner
    }
}

impl<G: PointLookupGateway> PointLookupGateway for RetryingGateway<G> {
    fn fetch_column(&self, schema: &ModelSchema, identity: &Identity, column: &str) -> Result<Value, PassiveError> {
        retry_with_delay(self.attempts, self.delay, PassiveError::is_transient, || {
            self.inner.fetch_column(schema, identity, column).inspect_err(|e| {
                if e.is_transient() {
                    crate::warn!("Lookup of {}.{} for {} failed: {}", schema.table(), column, identity, e);
                }
            })
        })
    }
}
