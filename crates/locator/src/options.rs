use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Wall-clock budget for every retried attribute or tag-name read.
pub const DEFAULT_ATTRIBUTE_TIMEOUT: Duration = Duration::from_secs(5);

/// Cooperative cancellation flag shared between a caller and a running
/// resolution. Clones observe the same flag.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

#[derive(Clone, Debug)]
pub struct ResolveOptions {
    attribute_timeout: Duration,
    retry_interval: Option<Duration>,
    cancellation: Option<CancellationToken>,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            attribute_timeout: DEFAULT_ATTRIBUTE_TIMEOUT,
            retry_interval: None,
            cancellation: None,
        }
    }
}

impl ResolveOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_attribute_timeout(mut self, timeout: Duration) -> Self {
        self.attribute_timeout = timeout;
        self
    }

    pub fn attribute_timeout(&self) -> Duration {
        self.attribute_timeout
    }

    /// Pause between retry attempts. Without one the loop only yields.
    pub fn with_retry_interval(mut self, interval: Duration) -> Self {
        self.retry_interval = Some(interval);
        self
    }

    pub fn retry_interval(&self) -> Option<Duration> {
        self.retry_interval
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    pub fn cancellation(&self) -> Option<&CancellationToken> {
        self.cancellation.as_ref()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.as_ref().is_some_and(CancellationToken::is_cancelled)
    }
}
