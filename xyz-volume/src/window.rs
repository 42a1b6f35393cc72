//! Partitioning of a date range into fixed length, half-open query windows.
//!
//! The upstream fill endpoint caps every response at a fixed number of records,
//! so a long history is assembled from one query per [`Window`]. Windows are
//! disjoint and contiguous: `window[i].end == window[i + 1].start` in
//! oldest-first order, which guarantees neither gaps nor double counting.

use crate::{clock::Clock, error::TrackerError};
use chrono::{DateTime, SubsecRound, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// Default window length used for historical queries.
pub const DEFAULT_WINDOW_DAYS: i64 = 7;

/// Half-open time interval `[start, end)` bounding one upstream query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
pub struct Window {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Window {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Inclusive lower bound in epoch milliseconds.
    pub fn start_ms(&self) -> i64 {
        self.start.timestamp_millis()
    }

    /// Exclusive upper bound in epoch milliseconds.
    pub fn end_ms(&self) -> i64 {
        self.end.timestamp_millis()
    }

    pub fn duration(&self) -> TimeDelta {
        self.end - self.start
    }

    pub fn contains(&self, time: &DateTime<Utc>) -> bool {
        self.start <= *time && *time < self.end
    }
}

impl std::fmt::Display for Window {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}, {})",
            self.start.format("%Y-%m-%d %H:%M"),
            self.end.format("%Y-%m-%d %H:%M")
        )
    }
}

/// Order in which planned windows are yielded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowOrder {
    /// Anchored at the range start; the newest window may be short.
    OldestFirst,
    /// Anchored at the range end; the oldest window may be short.
    #[default]
    NewestFirst,
}

/// Plans the windows covering `[start, end)`.
///
/// The planner only holds its inputs, so [`WindowPlanner::windows`] can be
/// called any number of times and always yields the same sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowPlanner {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    length: TimeDelta,
    order: WindowOrder,
}

impl WindowPlanner {
    /// Construct a planner over `[start, end)`.
    ///
    /// Bounds and length are truncated to whole milliseconds, the precision of
    /// upstream queries, so every boundary is a representable query bound.
    /// A `start` at or after `end` is valid and plans zero windows.
    pub fn new(
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        length: TimeDelta,
        order: WindowOrder,
    ) -> Result<Self, TrackerError> {
        let start = start.trunc_subsecs(3);
        let end = end.trunc_subsecs(3);
        let length = TimeDelta::milliseconds(length.num_milliseconds());

        if length <= TimeDelta::zero() {
            return Err(TrackerError::Config(format!(
                "window length must be positive, got {length}"
            )));
        }

        Ok(Self {
            start,
            end,
            length,
            order,
        })
    }

    /// Construct a planner ending at the clock's "now", never starting before `launch`.
    pub fn bounded<C>(
        requested_start: Option<DateTime<Utc>>,
        launch: DateTime<Utc>,
        clock: &C,
        length: TimeDelta,
        order: WindowOrder,
    ) -> Result<Self, TrackerError>
    where
        C: Clock + ?Sized,
    {
        let start = requested_start.map_or(launch, |start| start.max(launch));
        Self::new(start, clock.now(), length, order)
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn length(&self) -> TimeDelta {
        self.length
    }

    pub fn order(&self) -> WindowOrder {
        self.order
    }

    /// Number of windows the plan yields.
    pub fn len(&self) -> usize {
        self.windows().count()
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Fresh iterator over the planned windows.
    pub fn windows(&self) -> Windows {
        Windows {
            low: self.start,
            high: self.end,
            length: self.length,
            order: self.order,
        }
    }
}

impl IntoIterator for &WindowPlanner {
    type Item = Window;
    type IntoIter = Windows;

    fn into_iter(self) -> Self::IntoIter {
        self.windows()
    }
}

/// Lazy iterator over the windows of a [`WindowPlanner`].
///
/// `[low, high)` is the part of the range not yet yielded.
#[derive(Debug, Clone)]
pub struct Windows {
    low: DateTime<Utc>,
    high: DateTime<Utc>,
    length: TimeDelta,
    order: WindowOrder,
}

impl Iterator for Windows {
    type Item = Window;

    fn next(&mut self) -> Option<Self::Item> {
        if self.low >= self.high {
            return None;
        }

        let window = match self.order {
            WindowOrder::OldestFirst => {
                let end = self
                    .low
                    .checked_add_signed(self.length)
                    .map_or(self.high, |end| end.min(self.high));
                let window = Window::new(self.low, end);
                self.low = end;
                window
            }
            WindowOrder::NewestFirst => {
                let start = self
                    .high
                    .checked_sub_signed(self.length)
                    .map_or(self.low, |start| start.max(self.low));
                let window = Window::new(start, self.high);
                self.high = start;
                window
            }
        };

        Some(window)
    }
}

impl std::iter::FusedIterator for Windows {}
