//! Bounded Frame History
//!
//! A fixed-capacity ring of frame snapshots plus the temporal queries the
//! engine needs (held-for, windowed filters, continuous duration, velocity).
//!
//! Frames are stored behind `Arc` so a history can be cloned cheaply and
//! handed to readers (overlays, recorders) while the engine moves on to a
//! newer version. `with_frame` returns a new history and leaves `self`
//! untouched; `push` is the in-place variant used by the owning driver.

use super::types::{FrameSnapshot, Position, Velocity};
use crate::time::{Duration, Timestamp};
use std::collections::VecDeque;
use std::sync::Arc;

/// Default capacity: about 10 seconds at 30 fps
pub const DEFAULT_HISTORY_CAPACITY: usize = 300;

/// History counters for monitoring
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HistoryStats {
    /// Total frames pushed
    pub frames_pushed: u64,
    /// Frames dropped off the old end
    pub frames_evicted: u64,
}

/// Ring buffer of recent frames, oldest first
#[derive(Debug, Clone)]
pub struct FrameHistory {
    frames: VecDeque<Arc<FrameSnapshot>>,
    capacity: usize,
    stats: HistoryStats,
}

impl FrameHistory {
    /// Create a history with default capacity
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }

    /// Create a history holding at most `capacity` frames.
    /// A capacity of zero is treated as one.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            frames: VecDeque::with_capacity(capacity),
            capacity,
            stats: HistoryStats::default(),
        }
    }

    /// Return a new history with `frame` appended, evicting the oldest
    /// frames beyond capacity.
    pub fn with_frame(&self, frame: impl Into<Arc<FrameSnapshot>>) -> Self {
        let mut next = self.clone();
        next.push(frame);
        next
    }

    /// Append a frame in place, evicting the oldest beyond capacity
    pub fn push(&mut self, frame: impl Into<Arc<FrameSnapshot>>) {
        self.frames.push_back(frame.into());
        self.stats.frames_pushed += 1;
        while self.frames.len() > self.capacity {
            self.frames.pop_front();
            self.stats.frames_evicted += 1;
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn stats(&self) -> HistoryStats {
        self.stats
    }

    /// Iterate oldest to newest
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &FrameSnapshot> {
        self.frames.iter().map(|f| f.as_ref())
    }

    /// The newest frame
    pub fn latest(&self) -> Option<&FrameSnapshot> {
        self.frames.back().map(|f| f.as_ref())
    }

    /// The frame `n` steps before the newest (`0` is the newest)
    pub fn frame_ago(&self, n: usize) -> Option<&FrameSnapshot> {
        let len = self.frames.len();
        if n >= len {
            return None;
        }
        self.frames.get(len - 1 - n).map(|f| f.as_ref())
    }

    /// Frames whose timestamp lies in `[now - window, now]`, oldest first,
    /// where `now` is the newest frame's timestamp.
    pub fn frames_in_window(&self, window: Duration) -> Vec<&FrameSnapshot> {
        let Some(now) = self.latest().map(|f| f.timestamp) else {
            return Vec::new();
        };
        let start = now.saturating_sub(window);
        let mut frames: Vec<&FrameSnapshot> = self
            .iter()
            .rev()
            .take_while(|f| f.timestamp >= start)
            .filter(|f| f.timestamp <= now)
            .collect();
        frames.reverse();
        frames
    }

    /// True iff `predicate` held on every frame of a trailing run that spans
    /// at least `duration`. Scans backward from the newest frame and stops at
    /// the first failing frame.
    pub fn check_held_for<P>(&self, predicate: P, duration: Duration) -> bool
    where
        P: Fn(&FrameSnapshot) -> bool,
    {
        let Some(now) = self.latest().map(|f| f.timestamp) else {
            return false;
        };
        match self.run_start(&predicate) {
            Some(start) => now.duration_since(start) >= duration,
            None => false,
        }
    }

    /// True iff `predicate` holds on any frame within the trailing window
    pub fn check_any_in_window<P>(&self, predicate: P, window: Duration) -> bool
    where
        P: Fn(&FrameSnapshot) -> bool,
    {
        let Some(now) = self.latest().map(|f| f.timestamp) else {
            return false;
        };
        let start = now.saturating_sub(window);
        self.iter()
            .rev()
            .take_while(|f| f.timestamp >= start)
            .any(|f| predicate(f))
    }

    /// Time since the current contiguous run of predicate-true frames began.
    /// Zero when the newest frame fails the predicate.
    pub fn continuous_duration<P>(&self, predicate: P) -> Duration
    where
        P: Fn(&FrameSnapshot) -> bool,
    {
        let Some(now) = self.latest().map(|f| f.timestamp) else {
            return Duration::ZERO;
        };
        self.run_start(&predicate)
            .map(|start| now.duration_since(start))
            .unwrap_or(Duration::ZERO)
    }

    /// Velocity between the newest frame and the one before it
    pub fn latest_velocity<E>(&self, extract: E) -> Velocity
    where
        E: Fn(&FrameSnapshot) -> Option<Position>,
    {
        match (self.frame_ago(0), self.frame_ago(1)) {
            (Some(frame), Some(previous)) => calculate_velocity(frame, previous, extract),
            _ => Velocity::ZERO,
        }
    }

    /// Timestamp of the oldest frame in the trailing predicate-true run
    fn run_start<P>(&self, predicate: &P) -> Option<Timestamp>
    where
        P: Fn(&FrameSnapshot) -> bool,
    {
        let mut start = None;
        for frame in self.iter().rev() {
            if !predicate(frame) {
                break;
            }
            start = Some(frame.timestamp);
        }
        start
    }
}

impl Default for FrameHistory {
    fn default() -> Self {
        Self::new()
    }
}

/// Finite-difference velocity (normalized units per second) between two
/// frames. Returns zero if either position is unavailable or no time elapsed.
pub fn calculate_velocity<E>(frame: &FrameSnapshot, previous: &FrameSnapshot, extract: E) -> Velocity
where
    E: Fn(&FrameSnapshot) -> Option<Position>,
{
    let (Some(current), Some(prior)) = (extract(frame), extract(previous)) else {
        return Velocity::ZERO;
    };
    let dt = frame.timestamp.duration_since(previous.timestamp).as_secs_f64();
    if dt <= 0.0 {
        return Velocity::ZERO;
    }
    Velocity::new((current.x - prior.x) / dt, (current.y - prior.y) / dt)
}
