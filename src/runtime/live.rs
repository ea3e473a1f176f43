//! Live event loop
//!
//! Single task that owns every engine mutation except the watchdog tick:
//! inputs from the channel, and timer deadlines via `sleep`. Confirmations
//! are handed to a [`ConfirmationSink`]; the consumer sends
//! `EngineInput::Reset` back once it has acted on one.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::clock::Clock;
use super::{apply_input, EngineInput};
use crate::engine::PointerEngine;
use crate::error::{classify_error, EngineError, ErrorKind, Result};
use crate::interaction::{Confirmation, Transition};
use crate::watchdog::InactivityWatchdog;

/// Receiver of confirmation events
#[cfg_attr(test, mockall::automock)]
pub trait ConfirmationSink {
    /// Deliver one confirmation
    fn deliver(&mut self, confirmation: &Confirmation) -> Result<()>;
}

impl ConfirmationSink for mpsc::UnboundedSender<Confirmation> {
    fn deliver(&mut self, confirmation: &Confirmation) -> Result<()> {
        self.send(confirmation.clone())
            .map_err(|_| EngineError::ChannelClosed("confirmations"))
    }
}

/// Live runtime
pub struct LiveRuntime {
    engine: Arc<Mutex<PointerEngine>>,
    clock: Arc<dyn Clock>,
    sink: Box<dyn ConfirmationSink + Send>,
    cancel: CancellationToken,
    watchdog_tick: Duration,
}

impl LiveRuntime {
    /// Wrap an engine
    pub fn new(
        engine: PointerEngine,
        clock: Arc<dyn Clock>,
        sink: Box<dyn ConfirmationSink + Send>,
    ) -> Self {
        let watchdog_tick = Duration::from_millis(engine.config().watchdog.tick_ms);
        Self {
            engine: Arc::new(Mutex::new(engine)),
            clock,
            sink,
            cancel: CancellationToken::new(),
            watchdog_tick,
        }
    }

    /// Shared engine handle (snapshots, subscriptions, registry)
    pub fn engine(&self) -> Arc<Mutex<PointerEngine>> {
        Arc::clone(&self.engine)
    }

    /// Token that stops the runtime when cancelled
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run until the input channel closes or the token is cancelled
    pub async fn run(mut self, mut inputs: mpsc::Receiver<EngineInput>) -> Result<()> {
        let watchdog_cancel = self.cancel.child_token();
        let watchdog = InactivityWatchdog::spawn(
            Arc::clone(&self.engine),
            Arc::clone(&self.clock),
            self.watchdog_tick,
            watchdog_cancel.clone(),
        );

        info!("Live runtime started");
        loop {
            let wait = self.engine.lock().next_deadline().map(|deadline| {
                Duration::from_millis(deadline.saturating_sub(self.clock.now_ms()))
            });

            tokio::select! {
                biased;

                _ = self.cancel.cancelled() => {
                    info!("Live runtime cancelled");
                    break;
                }

                input = inputs.recv() => match input {
                    Some(input) => self.handle_input(input)?,
                    None => {
                        info!("Input channel closed");
                        break;
                    }
                },

                _ = tokio::time::sleep(wait.unwrap_or_default()), if wait.is_some() => {
                    let now = self.clock.now_ms();
                    let transition = self.engine.lock().poll_timers(now);
                    self.deliver(&transition);
                }
            }
        }

        watchdog_cancel.cancel();
        if let Err(e) = watchdog.await {
            error!("Watchdog task failed: {}", e);
        }
        Ok(())
    }

    fn handle_input(&mut self, input: EngineInput) -> Result<()> {
        let now = self.clock.now_ms();
        let kind = input.kind();
        let result = apply_input(&mut self.engine.lock(), input, now);

        match result {
            Ok(Some(transition)) => self.deliver(&transition),
            Ok(None) => {}
            Err(e) => match classify_error(&e) {
                ErrorKind::Input | ErrorKind::Config => {
                    warn!("Dropped {} input: {}", kind, e);
                }
                ErrorKind::Runtime => return Err(e),
            },
        }
        Ok(())
    }

    fn deliver(&mut self, transition: &Transition) {
        let Some(confirmation) = &transition.confirmation else {
            return;
        };
        debug!("Delivering confirmation #{}", confirmation.sequence);
        if let Err(e) = self.sink.deliver(confirmation) {
            warn!("Confirmation for '{}' not delivered: {}", confirmation.target, e);
        }
    }
}
