//! Real-time session runner.
//!
//! A single tokio task owns the [`SessionController`]. It sleeps until the
//! controller's next timer deadline, maps wall-clock time onto the
//! controller's millisecond clock, and applies commands received from
//! [`SessionRunner`] handles. Every event is broadcast to subscribers.
//!
//! While a session is paused the controller has no pending timers, so the
//! task only waits for commands; the paused wall-clock time never reaches
//! the countdown.

use std::time::Duration;

use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, error, info, warn};

use crate::error::{CoreError, Result};
use crate::events::Event;
use crate::session::{Command, SessionController};

const COMMAND_BUFFER: usize = 32;
const EVENT_BUFFER: usize = 256;

enum Message {
    Control {
        command: Command,
        reply: oneshot::Sender<Result<Vec<Event>>>,
    },
    Snapshot {
        reply: oneshot::Sender<Event>,
    },
    Shutdown,
}

/// Handle to a running session task.
///
/// Dropping every handle stops the task and cancels its timers, as does
/// [`SessionRunner::shutdown`].
pub struct SessionRunner {
    commands: mpsc::Sender<Message>,
    events: broadcast::Sender<Event>,
    task: JoinHandle<SessionController>,
}

impl SessionRunner {
    /// Move `controller` into a new task on the current tokio runtime.
    pub fn spawn(controller: SessionController) -> Self {
        let (commands, rx) = mpsc::channel(COMMAND_BUFFER);
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        let task = tokio::spawn(run(controller, rx, events.clone()));
        Self {
            commands,
            events,
            task,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    /// Apply a command and return the events it produced. The same events
    /// are also broadcast.
    pub async fn send(&self, command: Command) -> Result<Vec<Event>> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(Message::Control { command, reply })
            .await
            .map_err(|_| stopped())?;
        rx.await.map_err(|_| stopped())?
    }

    pub async fn snapshot(&self) -> Result<Event> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(Message::Snapshot { reply })
            .await
            .map_err(|_| stopped())?;
        rx.await.map_err(|_| stopped())
    }

    /// Stop the task, cancel its timers and hand the controller back.
    pub async fn shutdown(self) -> Result<SessionController> {
        // A closed channel means the task already stopped on its own.
        let _ = self.commands.send(Message::Shutdown).await;
        self.task
            .await
            .map_err(|e| CoreError::Runner(format!("session task failed: {e}")))
    }
}

fn stopped() -> CoreError {
    CoreError::Runner("session runner has stopped".into())
}

async fn run(
    mut controller: SessionController,
    mut commands: mpsc::Receiver<Message>,
    events: broadcast::Sender<Event>,
) -> SessionController {
    let origin = Instant::now();
    let base_ms = controller.now_ms();
    let clock_ms = || base_ms + origin.elapsed().as_millis() as u64;
    debug!(base_ms, "session runner started");

    loop {
        let deadline = controller
            .next_deadline()
            .map(|ms| origin + Duration::from_millis(ms.saturating_sub(base_ms)));

        tokio::select! {
            message = commands.recv() => {
                let Some(message) = message else {
                    debug!("all runner handles dropped");
                    break;
                };
                // Timers that came due while we were waiting fire before
                // the command is applied.
                match controller.advance_to(clock_ms()) {
                    Ok(due) => publish(&events, &due),
                    Err(e) => {
                        error!("session clock failed: {e}");
                        break;
                    }
                }
                match message {
                    Message::Control { command, reply } => {
                        let result = controller.apply(command);
                        match &result {
                            Ok(produced) => publish(&events, produced),
                            Err(e) => warn!(?command, "command rejected: {e}"),
                        }
                        let _ = reply.send(result);
                    }
                    Message::Snapshot { reply } => {
                        let _ = reply.send(controller.snapshot());
                    }
                    Message::Shutdown => break,
                }
            }
            _ = sleep_until(deadline.unwrap_or(origin)), if deadline.is_some() => {
                match controller.advance_to(clock_ms()) {
                    Ok(due) => publish(&events, &due),
                    Err(e) => {
                        error!("session clock failed: {e}");
                        break;
                    }
                }
            }
        }
    }

    let cancelled = controller.teardown();
    info!(cancelled, "session runner stopped");
    controller
}

fn publish(tx: &broadcast::Sender<Event>, events: &[Event]) {
    for event in events {
        // No subscribers is fine.
        let _ = tx.send(event.clone());
    }
}
