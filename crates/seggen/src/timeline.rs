//! Segment timing arithmetic shared by the DASH and Smooth Streaming resolvers.
//!
//! Both formats describe a track as a list of runs of equal-duration segments, but they derive
//! the start time of an implicit entry differently:
//!
//! * DASH advances the running time by the entry's duration *before* emitting it, and never
//!   expands the final `S` element of the timeline.
//! * Smooth Streaming emits the running time *before* advancing it.

use crate::error::{SegGenError, SegGenResult};

/// Upper bound on the segments a single timeline may expand to.
pub const MAX_TIMELINE_SEGMENTS: u64 = 1 << 20;

/// One run of one or more segments sharing a duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimelineEntry {
    pub duration: u64,
    /// `@t`
    pub start: Option<u64>,
    /// `@r`; the entry stands for `repeat + 1` segments when present.
    pub repeat: Option<u64>,
}

impl TimelineEntry {
    pub fn new(duration: u64) -> Self {
        Self {
            duration,
            start: None,
            repeat: None,
        }
    }

    pub fn with_start(mut self, start: u64) -> Self {
        self.start = Some(start);
        self
    }

    pub fn with_repeat(mut self, repeat: u64) -> Self {
        self.repeat = Some(repeat);
        self
    }
}

impl TryFrom<&dash_mpd::S> for TimelineEntry {
    type Error = SegGenError;

    fn try_from(s: &dash_mpd::S) -> SegGenResult<Self> {
        let repeat = match s.r {
            Some(r) if r < 0 => {
                return Err(SegGenError::InvalidTimingSchema(format!(
                    "open-ended repeat r={r} is only valid in live manifests"
                )))
            }
            Some(r) if r as u64 >= MAX_TIMELINE_SEGMENTS => {
                return Err(SegGenError::InvalidTimingSchema(format!(
                    "repeat r={r} exceeds {MAX_TIMELINE_SEGMENTS} segments"
                )))
            }
            Some(r) => Some(r as u64),
            None => None,
        };

        Ok(Self {
            duration: s.d,
            start: s.t,
            repeat,
        })
    }
}

fn advance(time: u64, duration: u64) -> SegGenResult<u64> {
    time.checked_add(duration).ok_or_else(|| {
        SegGenError::InvalidTimingSchema(format!("segment time {time} + {duration} overflows"))
    })
}

/// Media segment times of a DASH `SegmentTimeline`.
///
/// The last entry is skipped. An entry with `@t` contributes that time as is without moving the
/// running clock; repeated or implicit entries advance the clock first and then emit it.
///
/// Fails with [SegGenError::InvalidTimingSchema] when the clock overflows or the timeline expands
/// to more than [MAX_TIMELINE_SEGMENTS] segments.
pub fn dash_segment_times(entries: &[TimelineEntry]) -> SegGenResult<Vec<u64>> {
    let expanded = entries.len().saturating_sub(1);

    let mut total = 0u64;
    for entry in &entries[..expanded] {
        let count = u64::from(entry.start.is_some())
            + match entry.repeat {
                Some(repeat) => repeat.saturating_add(1),
                None => u64::from(entry.start.is_none()),
            };
        total = total.saturating_add(count);
    }
    if total > MAX_TIMELINE_SEGMENTS {
        return Err(SegGenError::InvalidTimingSchema(format!(
            "timeline expands to {total} segments, at most {MAX_TIMELINE_SEGMENTS} are allowed"
        )));
    }

    let mut times = Vec::with_capacity(total as usize);
    let mut current_time = 0u64;
    for entry in &entries[..expanded] {
        if let Some(start) = entry.start {
            times.push(start);
        }

        match entry.repeat {
            Some(repeat) => {
                for _ in 0..=repeat {
                    current_time = advance(current_time, entry.duration)?;
                    times.push(current_time);
                }
            }
            None if entry.start.is_none() => {
                current_time = advance(current_time, entry.duration)?;
                times.push(current_time);
            }
            None => {}
        }
    }

    Ok(times)
}

/// Fragment start times of a Smooth Streaming `StreamIndex`.
///
/// Every entry yields exactly one fragment. Implicit entries start at the sum of the durations of
/// all preceding entries.
pub fn smooth_segment_times(entries: &[TimelineEntry]) -> SegGenResult<Vec<u64>> {
    let mut times = Vec::with_capacity(entries.len());
    let mut elapsed = 0u64;
    for (index, entry) in entries.iter().enumerate() {
        times.push(entry.start.unwrap_or(elapsed));
        // the running total after the last fragment is never used
        if index + 1 < entries.len() {
            elapsed = advance(elapsed, entry.duration)?;
        }
    }
    Ok(times)
}
