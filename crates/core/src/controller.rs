mod builder;
mod state;

use tokio::sync::{mpsc, oneshot, watch};
use tracing::Instrument;

pub use builder::ControllerBuilder;
use state::{Command, ControllerState};
pub use state::ConversationState;

use crate::error::{ResetError, SubmitError};
use crate::transcript::DisplayMessage;

/// Handle to an exchange controller, which owns the conversation state
/// and runs every exchange with the backend.
///
/// The controller lives in its own task and handles requests one at a
/// time, so at most one exchange or reset is in flight. Requests sent
/// while it is busy are dropped rather than queued. Cloned handles drive
/// the same controller, which stops once every handle is dropped and the
/// last in-flight operation has finished.
#[derive(Clone)]
pub struct Controller {
    cmd_tx: mpsc::UnboundedSender<Command>,
    state_rx: watch::Receiver<ConversationState>,
}

impl Controller {
    /// Submits user input.
    ///
    /// Resolves as soon as the input is accepted, with the message that
    /// has been appended to the transcript for it. The reply arrives
    /// later through the transcript sink.
    pub async fn submit(
        &self,
        raw: &str,
    ) -> Result<DisplayMessage, SubmitError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Submit {
                raw: raw.to_owned(),
                reply: reply_tx,
            })
            .map_err(|_| SubmitError::Closed)?;
        reply_rx.await.map_err(|_| SubmitError::Closed)?
    }

    /// Clears the conversation on the backend and, once acknowledged, the
    /// transcript.
    ///
    /// Resolves after the backend has answered. Refused while an exchange
    /// is in flight.
    pub async fn reset(&self) -> Result<(), ResetError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Reset { reply: reply_tx })
            .map_err(|_| ResetError::Closed)?;
        reply_rx.await.map_err(|_| ResetError::Closed)?
    }

    /// Returns the current conversation state.
    #[inline]
    pub fn state(&self) -> ConversationState {
        *self.state_rx.borrow()
    }

    /// Returns a receiver that observes every state change.
    #[inline]
    pub fn subscribe_state(&self) -> watch::Receiver<ConversationState> {
        self.state_rx.clone()
    }

    /// Waits until no exchange or reset is in flight.
    pub async fn wait_idle(&self) {
        let mut state_rx = self.state_rx.clone();
        // The sender lives as long as the controller task, which cannot
        // end while an operation is in flight.
        state_rx
            .wait_for(|state| *state == ConversationState::Idle)
            .await
            .ok();
    }
}

impl Controller {
    fn spawn_from_builder(builder: ControllerBuilder) -> Self {
        let ControllerBuilder {
            backend,
            user_id,
            transcript,
            presentation,
            notifier,
            health_check,
        } = builder;

        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(ConversationState::Idle);
        let state = ControllerState {
            backend,
            user_id,
            transcript,
            presentation,
            notifier,
            state_tx,
            cmd_tx: cmd_tx.downgrade(),
        };

        if health_check {
            cmd_tx.send(Command::CheckHealth).ok();
        }
        tokio::spawn(
            run_controller(state, cmd_rx)
                .instrument(trace_span!("controller")),
        );

        Self { cmd_tx, state_rx }
    }
}

async fn run_controller(
    mut state: ControllerState,
    mut cmd_rx: mpsc::UnboundedReceiver<Command>,
) {
    debug!("started");
    while let Some(cmd) = cmd_rx.recv().await {
        trace!("received command: {cmd:?}");
        state.handle(cmd);
    }
    debug!("will terminate");
}
