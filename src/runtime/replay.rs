//! Deterministic trace replay
//!
//! Replays a time-ordered JSONL trace of [`EngineInput`] records on a
//! [`ManualClock`]. Between two records the driver fires every timer
//! deadline and watchdog tick that falls in the gap, in time order, so a
//! replay observes exactly what a live host would have.

use futures::StreamExt;
use serde::Serialize;
use std::collections::BTreeMap;
use tokio::io::AsyncRead;
use tokio_util::codec::{FramedRead, LinesCodec, LinesCodecError};
use tracing::{debug, info, warn};

use super::clock::{Clock, ManualClock};
use super::{apply_input, EngineInput};
use crate::engine::{EngineStats, PointerEngine};
use crate::error::{classify_error, EngineError, ErrorKind, Result};
use crate::interaction::{
    Confirmation, InteractionState, TargetStats, Transition, TransitionCause,
};
use crate::targets::TargetId;
use crate::watchdog::InactivityWatchdog;

/// Longest accepted trace line
const MAX_LINE_LENGTH: usize = 64 * 1024;

/// One observed state change
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransitionRecord {
    /// Time (ms)
    pub at_ms: u64,
    /// Previous state
    pub from: InteractionState,
    /// New state
    pub to: InteractionState,
    /// Trigger
    pub cause: TransitionCause,
}

/// Replay outcome
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReplayReport {
    /// Records applied
    pub inputs: usize,
    /// Records rejected (bad rect, bad sensitivity)
    pub rejected: usize,
    /// First to last replayed time (ms)
    pub duration_ms: u64,
    /// State changes in order
    pub transitions: Vec<TransitionRecord>,
    /// Confirmations in order
    pub confirmations: Vec<Confirmation>,
    /// State at the end of the replay
    pub final_state: InteractionState,
    /// Engine counters
    pub stats: EngineStats,
    /// Counters per target id
    pub targets: BTreeMap<TargetId, TargetStats>,
}

/// Decode one trace line (1-based `line` for error messages)
pub fn parse_trace_line(text: &str, line: usize) -> Result<EngineInput> {
    serde_json::from_str(text).map_err(|e| EngineError::TraceParse {
        line,
        message: e.to_string(),
    })
}

/// Replay driver
#[derive(Debug)]
pub struct ReplayDriver {
    engine: PointerEngine,
    clock: ManualClock,
    watchdog_tick_ms: u64,
    next_watchdog_ms: Option<u64>,
    start_ms: Option<u64>,
    report: ReplayReport,
}

impl ReplayDriver {
    /// Wrap an engine; time starts at the first timestamped record
    pub fn new(engine: PointerEngine) -> Self {
        let watchdog_tick_ms = engine.config().watchdog.tick_ms.max(1);
        Self {
            engine,
            clock: ManualClock::new(0),
            watchdog_tick_ms,
            next_watchdog_ms: None,
            start_ms: None,
            report: ReplayReport::default(),
        }
    }

    /// Engine under replay
    pub fn engine(&self) -> &PointerEngine {
        &self.engine
    }

    /// Current replay time (ms)
    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    /// Apply one record, first catching up to its timestamp
    ///
    /// Rejected inputs are counted and skipped; only runtime failures are
    /// returned.
    pub fn apply(&mut self, input: EngineInput) -> Result<()> {
        if let Some(at) = input.timestamp_ms() {
            self.advance_to(at);
        }

        let now = self.clock.now_ms();
        let kind = input.kind();
        match apply_input(&mut self.engine, input, now) {
            Ok(Some(transition)) => self.record(&transition, now),
            Ok(None) => {}
            Err(e) if classify_error(&e) != ErrorKind::Runtime => {
                warn!("Rejected {} at {}ms: {}", kind, now, e);
                self.report.rejected += 1;
            }
            Err(e) => return Err(e),
        }
        self.report.inputs += 1;
        Ok(())
    }

    /// Fire every timer deadline and watchdog tick up to `target_ms`
    ///
    /// Time never moves backwards; an out-of-order record is applied at the
    /// current time.
    pub fn advance_to(&mut self, target_ms: u64) {
        let Some(start) = self.start_ms else {
            self.start_ms = Some(target_ms);
            self.clock.set(target_ms);
            self.next_watchdog_ms = Some(target_ms + self.watchdog_tick_ms);
            return;
        };

        let now = self.clock.now_ms();
        if target_ms < now {
            debug!("Out-of-order record at {}ms (now {}ms)", target_ms, now);
            return;
        }

        loop {
            let timer = self.engine.next_deadline().filter(|d| *d <= target_ms);
            let watchdog = self.next_watchdog_ms.filter(|w| *w <= target_ms);

            match (timer, watchdog) {
                (Some(deadline), w) if w.map_or(true, |w| deadline <= w) => {
                    let at = deadline.max(self.clock.now_ms());
                    self.clock.set(at);
                    let transition = self.engine.poll_timers(at);
                    self.record(&transition, at);
                }
                (_, Some(tick)) => {
                    self.clock.set(tick);
                    let transition = InactivityWatchdog::check(&mut self.engine, tick);
                    self.record(&transition, tick);
                    self.next_watchdog_ms = Some(tick + self.watchdog_tick_ms);
                }
                _ => break,
            }
        }

        self.clock.set(target_ms);
        self.report.duration_ms = target_ms - start;
    }

    /// Replay an in-memory trace
    pub fn replay_str(&mut self, trace: &str) -> Result<()> {
        for (index, text) in trace.lines().enumerate() {
            if let Some(input) = Self::decode(text, index + 1)? {
                self.apply(input)?;
            }
        }
        Ok(())
    }

    /// Replay a trace stream line by line
    pub async fn replay_reader<R>(&mut self, reader: R) -> Result<()>
    where
        R: AsyncRead + Unpin,
    {
        let mut lines = FramedRead::new(reader, LinesCodec::new_with_max_length(MAX_LINE_LENGTH));
        let mut line = 0;

        while let Some(next) = lines.next().await {
            line += 1;
            let text = next.map_err(|e| match e {
                LinesCodecError::Io(io) => EngineError::Io(io),
                LinesCodecError::MaxLineLengthExceeded => EngineError::TraceParse {
                    line,
                    message: format!("line longer than {} bytes", MAX_LINE_LENGTH),
                },
            })?;
            if let Some(input) = Self::decode(&text, line)? {
                self.apply(input)?;
            }
        }
        Ok(())
    }

    /// Finish the replay and produce the report
    pub fn finish(mut self) -> ReplayReport {
        self.report.final_state = self.engine.state().clone();
        self.report.stats = self.engine.stats();
        self.report.targets = self.engine.target_stats().clone();
        info!(
            "Replay finished: {} inputs, {} confirmations, {} rejected over {}ms",
            self.report.inputs,
            self.report.confirmations.len(),
            self.report.rejected,
            self.report.duration_ms
        );
        self.report
    }

    /// Blank lines and `#` comments are skipped
    fn decode(text: &str, line: usize) -> Result<Option<EngineInput>> {
        let text = text.trim();
        if text.is_empty() || text.starts_with('#') {
            return Ok(None);
        }
        parse_trace_line(text, line).map(Some)
    }

    fn record(&mut self, transition: &Transition, at_ms: u64) {
        if transition.changed() {
            self.report.transitions.push(TransitionRecord {
                at_ms,
                from: transition.from.clone(),
                to: transition.to.clone(),
                cause: transition.cause,
            });
        }
        if let Some(confirmation) = &transition.confirmation {
            self.report.confirmations.push(confirmation.clone());
        }
    }
}
