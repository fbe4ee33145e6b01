//! Attribute access with a bounded retry budget.
//!
//! Reads race UI mutation on a live tree. Transient provider errors are
//! retried until [`ResolveOptions::attribute_timeout`] elapses; an exhausted
//! budget degrades to empty data instead of an error.

use crate::options::ResolveOptions;
use serde::Serialize;
use std::thread;
use std::time::Instant;
use tracing::{debug, trace, warn};
use uia_locator_core::provider::{AccessibilityTreeProvider, AttributeMap, ProviderError};
use uia_locator_core::types::Rect;
use uia_locator_core::ui::{ControlTypeId, attribute_names};

/// One property/value row of an element's formatted attributes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AttributeRow {
    pub property: String,
    pub value: String,
}

/// Runs `read` until it succeeds, the budget elapses, a non-transient error
/// occurs or the caller cancels. Always attempts at least once.
pub(crate) fn with_retry<T>(
    options: &ResolveOptions,
    operation: &'static str,
    mut read: impl FnMut() -> Result<T, ProviderError>,
) -> Option<T> {
    let timeout = options.attribute_timeout();
    let start = Instant::now();
    let mut attempts: u32 = 0;
    loop {
        attempts += 1;
        match read() {
            Ok(value) => return Some(value),
            Err(err) if err.is_transient() => {
                trace!(operation, attempts, error = %err, "transient provider error");
            }
            Err(err) => {
                debug!(operation, error = %err, "provider read failed");
                return None;
            }
        }

        let elapsed = start.elapsed();
        if elapsed >= timeout {
            warn!(
                operation,
                attempts,
                elapsed_ms = elapsed.as_millis() as u64,
                timeout_ms = timeout.as_millis() as u64,
                "attribute read budget exhausted",
            );
            return None;
        }
        if options.is_cancelled() {
            debug!(operation, attempts, "attribute read cancelled");
            return None;
        }
        match options.retry_interval() {
            Some(interval) if !interval.is_zero() => thread::sleep(interval.min(timeout - elapsed)),
            _ => thread::yield_now(),
        }
    }
}

/// Formatted attribute map of `node`; empty when the budget is exhausted.
pub fn read_attributes<P: AccessibilityTreeProvider>(
    provider: &P,
    node: &P::Node,
    options: &ResolveOptions,
) -> AttributeMap {
    with_retry(options, "attributes", || provider.attributes(node)).unwrap_or_default()
}

/// Control-type name of `node` used as its snapshot tag; empty when the
/// budget is exhausted. Unknown control types read as `Custom`.
pub fn read_tag_name<P: AccessibilityTreeProvider>(
    provider: &P,
    node: &P::Node,
    options: &ResolveOptions,
) -> String {
    with_retry(options, "control_type", || provider.control_type(node))
        .map(|id| id.name().or(ControlTypeId::CUSTOM.name()).unwrap_or_default().to_owned())
        .unwrap_or_default()
}

pub fn read_bounding_rect<P: AccessibilityTreeProvider>(
    provider: &P,
    node: &P::Node,
    options: &ResolveOptions,
) -> Option<Rect> {
    with_retry(options, "bounding_rect", || provider.bounding_rect(node))
}

/// Non-empty automation id of `node`, if any.
pub(crate) fn read_automation_id<P: AccessibilityTreeProvider>(
    provider: &P,
    node: &P::Node,
    options: &ResolveOptions,
) -> Option<String> {
    read_attributes(provider, node, options)
        .remove(attribute_names::AUTOMATION_ID)
        .filter(|id| !id.trim().is_empty())
}

/// Attribute rows of `node` ordered by property name.
pub fn element_attributes<P: AccessibilityTreeProvider>(
    provider: &P,
    node: &P::Node,
    options: &ResolveOptions,
) -> Vec<AttributeRow> {
    read_attributes(provider, node, options)
        .into_iter()
        .map(|(property, value)| AttributeRow { property, value })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::CancellationToken;
    use rstest::rstest;
    use std::cell::Cell;
    use std::time::Duration;
    use uia_locator_core::provider::ProviderErrorKind;

    fn transient() -> ProviderError {
        ProviderError::simple(ProviderErrorKind::CommunicationFailure)
    }

    #[rstest]
    fn retries_until_success() {
        let calls = Cell::new(0);
        let value = with_retry(&ResolveOptions::default(), "test", || {
            calls.set(calls.get() + 1);
            if calls.get() < 4 { Err(transient()) } else { Ok(calls.get()) }
        });
        assert_eq!(value, Some(4));
    }

    #[rstest]
    fn zero_budget_attempts_once() {
        let calls = Cell::new(0);
        let options = ResolveOptions::new().with_attribute_timeout(Duration::ZERO);
        let value: Option<()> = with_retry(&options, "test", || {
            calls.set(calls.get() + 1);
            Err(transient())
        });
        assert_eq!(value, None);
        assert_eq!(calls.get(), 1);
    }

    #[rstest]
    fn exhausted_budget_returns_none_after_timeout() {
        let options = ResolveOptions::new()
            .with_attribute_timeout(Duration::from_millis(30))
            .with_retry_interval(Duration::from_millis(5));
        let start = Instant::now();
        let value: Option<()> = with_retry(&options, "test", || Err(transient()));
        assert_eq!(value, None);
        assert!(start.elapsed() >= Duration::from_millis(30));
    }

    #[rstest]
    fn non_transient_errors_stop_immediately() {
        let calls = Cell::new(0);
        let value: Option<()> = with_retry(&ResolveOptions::default(), "test", || {
            calls.set(calls.get() + 1);
            Err(ProviderError::simple(ProviderErrorKind::UnsupportedOperation))
        });
        assert_eq!(value, None);
        assert_eq!(calls.get(), 1);
    }

    #[rstest]
    fn cancellation_interrupts_retries() {
        let token = CancellationToken::new();
        let options = ResolveOptions::new().with_cancellation(token.clone());
        let calls = Cell::new(0);
        let start = Instant::now();
        let value: Option<()> = with_retry(&options, "test", || {
            calls.set(calls.get() + 1);
            if calls.get() == 3 {
                token.cancel();
            }
            Err(transient())
        });
        assert_eq!(value, None);
        assert_eq!(calls.get(), 3);
        assert!(start.elapsed() < Duration::from_secs(1));
    }
}
