use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::StatusCode;
use std::time::{Duration, SystemTime};

/// Backoff limits for provider calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Upper bound for any single wait, server hints included.
    pub max_delay: Duration,
    pub max_retries: u32,
}

impl RetryPolicy {
    pub const fn new(base_delay: Duration, max_delay: Duration, max_retries: u32) -> Self {
        Self {
            base_delay,
            max_delay,
            max_retries,
        }
    }

    /// Never retries; used by tests and callers that do their own retrying.
    pub const fn none() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO, 0)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(Duration::from_secs(1), Duration::from_secs(30), 3)
    }
}

/// What went wrong with one attempt, as far as retrying is concerned.
#[derive(Debug, Clone, Copy)]
pub enum Failure {
    Http {
        status: StatusCode,
        retry_after: Option<Duration>,
    },
    Network,
    Fatal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    GiveUp,
    RetryAfter { delay: Duration, from_server: bool },
}

impl RetryDecision {
    pub fn should_retry(&self) -> bool {
        matches!(self, Self::RetryAfter { .. })
    }
}

/// `previous_attempts` counts retries already made for this call.
pub fn evaluate_retry(failure: Failure, policy: RetryPolicy, previous_attempts: u32) -> RetryDecision {
    if previous_attempts >= policy.max_retries {
        return RetryDecision::GiveUp;
    }

    match failure {
        Failure::Fatal => RetryDecision::GiveUp,
        Failure::Http { status, .. } if !is_retryable_status(status) => RetryDecision::GiveUp,
        Failure::Http {
            retry_after: Some(hint),
            ..
        } => RetryDecision::RetryAfter {
            delay: hint.min(policy.max_delay),
            from_server: true,
        },
        Failure::Http { .. } | Failure::Network => RetryDecision::RetryAfter {
            delay: backoff(policy, previous_attempts),
            from_server: false,
        },
    }
}

pub fn is_retryable_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
        || status.is_server_error()
}

fn backoff(policy: RetryPolicy, previous_attempts: u32) -> Duration {
    let multiplier = 1u32.checked_shl(previous_attempts).unwrap_or(u32::MAX);
    policy
        .base_delay
        .checked_mul(multiplier)
        .unwrap_or(policy.max_delay)
        .min(policy.max_delay)
}

/// `Retry-After` from a response, either delta-seconds or an HTTP date.
pub fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    let value = headers.get(RETRY_AFTER)?.to_str().ok()?;
    parse_retry_after(value, SystemTime::now())
}

pub fn parse_retry_after(value: &str, now: SystemTime) -> Option<Duration> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(seconds) = trimmed.parse::<u64>() {
        return Some(Duration::from_secs(seconds));
    }

    let instant = httpdate::parse_http_date(trimmed).ok()?;
    Some(instant.duration_since(now).unwrap_or(Duration::ZERO))
}

#[cfg(test)]
mod tests {
    use super::*;

    const POLICY: RetryPolicy = RetryPolicy::new(Duration::from_secs(1), Duration::from_secs(30), 5);

    fn throttled(retry_after: Option<Duration>) -> Failure {
        Failure::Http {
            status: StatusCode::TOO_MANY_REQUESTS,
            retry_after,
        }
    }

    #[test]
    fn server_hint_wins_but_is_capped() {
        assert_eq!(
            evaluate_retry(throttled(Some(Duration::from_secs(19))), POLICY, 0),
            RetryDecision::RetryAfter {
                delay: Duration::from_secs(19),
                from_server: true
            }
        );
        assert_eq!(
            evaluate_retry(throttled(Some(Duration::from_secs(300))), POLICY, 0),
            RetryDecision::RetryAfter {
                delay: Duration::from_secs(30),
                from_server: true
            }
        );
    }

    #[test]
    fn backoff_doubles_until_the_cap() {
        let delays: Vec<Duration> = (0..5)
            .map(|attempt| match evaluate_retry(Failure::Network, POLICY, attempt) {
                RetryDecision::RetryAfter { delay, .. } => delay,
                RetryDecision::GiveUp => panic!("attempt {attempt} should retry"),
            })
            .collect();
        assert_eq!(
            delays,
            [1, 2, 4, 8, 16].map(Duration::from_secs).to_vec()
        );

        let far = RetryPolicy::new(Duration::from_secs(4), Duration::from_secs(10), 50);
        assert_eq!(
            evaluate_retry(Failure::Network, far, 40),
            RetryDecision::RetryAfter {
                delay: Duration::from_secs(10),
                from_server: false
            }
        );
    }

    #[test]
    fn client_errors_and_exhausted_budgets_give_up() {
        let bad_request = Failure::Http {
            status: StatusCode::BAD_REQUEST,
            retry_after: None,
        };
        assert!(!evaluate_retry(bad_request, POLICY, 0).should_retry());
        assert!(!evaluate_retry(Failure::Fatal, POLICY, 0).should_retry());
        assert!(!evaluate_retry(throttled(None), POLICY, 5).should_retry());
        assert!(!evaluate_retry(Failure::Network, RetryPolicy::none(), 0).should_retry());
    }

    #[test]
    fn parses_both_retry_after_forms() {
        let now = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        assert_eq!(parse_retry_after("120", now), Some(Duration::from_secs(120)));

        let header = httpdate::fmt_http_date(now + Duration::from_secs(30));
        assert_eq!(parse_retry_after(&header, now).map(|d| d.as_secs()), Some(30));

        assert_eq!(parse_retry_after("soon", now), None);
    }
}
