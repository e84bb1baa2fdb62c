//! Send-failure classification and bounded retry for the UDP path.
//!
//! A `send_to` failure is either resource pressure that a short pause can
//! clear (would-block, no buffer space, no memory) or a real transport
//! fault. The first class gets a capped exponential backoff and a fixed
//! attempt budget; everything else is fatal for the session.

use std::io;
use std::thread;
use std::time::Duration;

#[cfg(target_os = "linux")]
const ENOBUFS: i32 = 105;
#[cfg(not(target_os = "linux"))]
const ENOBUFS: i32 = 55;

/// How a send error should be treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Resource-exhaustion class: worth retrying after a short backoff.
    Transient,
    /// Anything else: stop sending this frame and require a re-PLAY.
    Fatal,
}

/// Classify an I/O error from a datagram send.
pub fn classify(err: &io::Error) -> ErrorClass {
    match err.kind() {
        io::ErrorKind::WouldBlock
        | io::ErrorKind::TimedOut
        | io::ErrorKind::Interrupted
        | io::ErrorKind::OutOfMemory => ErrorClass::Transient,
        _ => match err.raw_os_error() {
            Some(ENOBUFS) => ErrorClass::Transient,
            _ => ErrorClass::Fatal,
        },
    }
}

/// Retry budget and backoff schedule for transient send failures.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts per packet, first try included.
    pub max_attempts: u32,
    /// Backoff before the second attempt; doubles per retry.
    pub initial_backoff: Duration,
    /// Backoff ceiling.
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(50),
        }
    }
}

/// Result of pushing one packet through the retry policy.
#[derive(Debug)]
pub enum SendOutcome {
    /// Delivered (on some attempt within the budget).
    Sent,
    /// Transient failures exhausted the budget; the packet is gone but the
    /// stream continues.
    Dropped,
    /// Non-transient failure; the caller must stop sending this frame.
    Fatal(io::Error),
}

/// Drive one send closure through the policy.
///
/// The closure is the raw send attempt (e.g. `socket.send_to(..)`); taking
/// it as a parameter keeps the backoff loop independent of any socket so
/// the budget semantics stay testable.
pub fn send_with_retry<F>(policy: &RetryPolicy, mut send: F) -> SendOutcome
where
    F: FnMut() -> io::Result<usize>,
{
    let mut backoff = policy.initial_backoff;

    for attempt in 1..=policy.max_attempts.max(1) {
        match send() {
            Ok(_) => return SendOutcome::Sent,
            Err(err) => match classify(&err) {
                ErrorClass::Fatal => return SendOutcome::Fatal(err),
                ErrorClass::Transient if attempt < policy.max_attempts => {
                    tracing::trace!(attempt, backoff_ms = backoff.as_millis() as u64, "send backoff");
                    thread::sleep(backoff);
                    backoff = (backoff * 2).min(policy.max_backoff);
                }
                ErrorClass::Transient => {
                    tracing::warn!(attempts = policy.max_attempts, "packet dropped after retry budget");
                }
            },
        }
    }

    SendOutcome::Dropped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            initial_backoff: Duration::from_micros(10),
            max_backoff: Duration::from_micros(40),
        }
    }

    fn would_block() -> io::Error {
        io::Error::from(io::ErrorKind::WouldBlock)
    }

    #[test]
    fn classify_transient_kinds() {
        assert_eq!(classify(&would_block()), ErrorClass::Transient);
        assert_eq!(
            classify(&io::Error::from(io::ErrorKind::OutOfMemory)),
            ErrorClass::Transient
        );
        assert_eq!(
            classify(&io::Error::from_raw_os_error(ENOBUFS)),
            ErrorClass::Transient
        );
    }

    #[test]
    fn classify_fatal_kinds() {
        assert_eq!(
            classify(&io::Error::from(io::ErrorKind::ConnectionRefused)),
            ErrorClass::Fatal
        );
        assert_eq!(
            classify(&io::Error::from(io::ErrorKind::HostUnreachable)),
            ErrorClass::Fatal
        );
    }

    #[test]
    fn success_on_first_attempt() {
        let mut calls = 0;
        let outcome = send_with_retry(&fast_policy(), || {
            calls += 1;
            Ok(1)
        });
        assert!(matches!(outcome, SendOutcome::Sent));
        assert_eq!(calls, 1);
    }

    #[test]
    fn transient_then_success() {
        let mut calls = 0;
        let outcome = send_with_retry(&fast_policy(), || {
            calls += 1;
            if calls < 3 { Err(would_block()) } else { Ok(1) }
        });
        assert!(matches!(outcome, SendOutcome::Sent));
        assert_eq!(calls, 3);
    }

    #[test]
    fn dropped_after_exactly_the_attempt_budget() {
        let mut calls = 0;
        let outcome = send_with_retry(&fast_policy(), || {
            calls += 1;
            Err(would_block())
        });
        assert!(matches!(outcome, SendOutcome::Dropped));
        assert_eq!(calls, 3);
    }

    #[test]
    fn fatal_error_short_circuits() {
        let mut calls = 0;
        let outcome = send_with_retry(&fast_policy(), || {
            calls += 1;
            Err(io::Error::from(io::ErrorKind::ConnectionRefused))
        });
        assert!(matches!(outcome, SendOutcome::Fatal(_)));
        assert_eq!(calls, 1);
    }
}
