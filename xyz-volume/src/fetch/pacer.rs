use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Default minimum interval between two upstream calls.
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(500);

/// Decides how long to wait before the next upstream call given the time
/// elapsed since the previous one (`None` before the first call).
pub trait DelayStrategy {
    fn delay(&self, since_last: Option<Duration>) -> Duration;
}

/// Enforce a fixed minimum interval between consecutive calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MinInterval(pub Duration);

impl Default for MinInterval {
    fn default() -> Self {
        Self(DEFAULT_MIN_INTERVAL)
    }
}

impl DelayStrategy for MinInterval {
    fn delay(&self, since_last: Option<Duration>) -> Duration {
        match since_last {
            Some(elapsed) => self.0.saturating_sub(elapsed),
            None => Duration::ZERO,
        }
    }
}

/// Never wait.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoDelay;

impl DelayStrategy for NoDelay {
    fn delay(&self, _: Option<Duration>) -> Duration {
        Duration::ZERO
    }
}

impl<F> DelayStrategy for F
where
    F: Fn(Option<Duration>) -> Duration,
{
    fn delay(&self, since_last: Option<Duration>) -> Duration {
        self(since_last)
    }
}

/// Applies a [`DelayStrategy`] before every upstream call, retries included.
#[derive(Debug)]
pub struct Pacer<Strategy> {
    strategy: Strategy,
    last_call: Option<Instant>,
}

impl<Strategy> Pacer<Strategy>
where
    Strategy: DelayStrategy,
{
    pub fn new(strategy: Strategy) -> Self {
        Self {
            strategy,
            last_call: None,
        }
    }

    /// Sleep as long as the strategy demands, then mark the start of a new call.
    pub async fn wait(&mut self) {
        let since_last = self.last_call.map(|last| last.elapsed());
        let delay = self.strategy.delay(since_last);

        if !delay.is_zero() {
            debug!(?delay, "pacing upstream call");
            tokio::time::sleep(delay).await;
        }

        self.last_call = Some(Instant::now());
    }
}
