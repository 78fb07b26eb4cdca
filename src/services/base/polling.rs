
use log::debug;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// Result of a single polling attempt.
#[derive(Debug)]
pub enum Attempt<T, E> {
    Done(T),
    NotYet,
    Fatal(E),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollError<E> {
    Timeout(Duration),
    Attempt(E),
}

impl<E> PollError<E> {
    pub fn is_timeout(&self) -> bool {
        matches!(self, PollError::Timeout(_))
    }
}

impl<E: Display> Display for PollError<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            PollError::Timeout(timeout) => write!(f, "timed out after {:?} waiting for the condition", timeout),
            PollError::Attempt(e) => write!(f, "{}", e),
        }
    }
}

impl<E: Debug + Display> Error for PollError<E> {}

/// Invokes `attempt` immediately and then every `interval` until it reports
/// `Done` or `Fatal`, or until `timeout` has elapsed.
///
/// The cadence is fixed. The caller is never blocked longer than `timeout + interval`,
/// even when a single attempt hangs.
pub async fn poll_until<T, E, F, Fut>(interval: Duration, timeout: Duration, mut attempt: F) -> Result<T, PollError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Attempt<T, E>>,
{
    let start_time = Instant::now();
    let polling = async {
        let mut attempts = 0u32;
        loop {
            attempts += 1;
            match attempt().await {
                Attempt::Done(value) => return Ok(value),
                Attempt::Fatal(e) => return Err(PollError::Attempt(e)),
                Attempt::NotYet => {
                    if start_time.elapsed() >= timeout {
                        debug!("Condition not met after {} attempts in {:?}", attempts, timeout);
                        return Err(PollError::Timeout(timeout));
                    }
                }
            }
            tokio::time::sleep(interval).await;
        }
    };

    let Some(deadline) = start_time.checked_add(timeout).and_then(|at| at.checked_add(interval)) else {
        debug!("Deadline of {:?} is out of range, polling without an outer bound", timeout);
        return polling.await;
    };
    match tokio::time::timeout_at(deadline, polling).await {
        Ok(result) => result,
        Err(_) => Err(PollError::Timeout(timeout)),
    }
}
