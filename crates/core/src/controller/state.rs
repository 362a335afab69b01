use std::fmt::{self, Debug};

use concierge_backend::{HealthStatus, OutboundMessage};
use tokio::sync::{mpsc, oneshot, watch};

use crate::backend_client::BackendClient;
use crate::error::{ExchangeError, ResetError, SubmitError};
use crate::stream::finalize_reply;
use crate::surface::{
    Notification, NotificationKind, NotificationSurface, PresentationSurface,
    TranscriptSink,
};
use crate::transcript::DisplayMessage;

const APOLOGY: &str = "Sorry, I encountered an error processing your \
request. Please try again.";
const RESET_SUCCEEDED: &str = "Session reset successfully!";
const RESET_FAILED: &str = "Failed to reset session";
const RESET_WHILE_BUSY: &str = "Please wait for the current reply to finish";
const HEALTH_CHECK_FAILED: &str = "Warning: Could not connect to backend API";

/// Whether the controller is running an operation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ConversationState {
    /// Ready to accept input.
    #[default]
    Idle,
    /// An exchange or a reset is in flight.
    Busy,
}

type SubmitReply = oneshot::Sender<Result<DisplayMessage, SubmitError>>;
type ResetReply = oneshot::Sender<Result<(), ResetError>>;

#[derive(Debug)]
pub enum Command {
    Submit { raw: String, reply: SubmitReply },
    Reset { reply: ResetReply },
    CheckHealth,
    ExchangeFinished(Result<String, ExchangeError>),
    ResetFinished {
        result: Result<(), ExchangeError>,
        reply: ResetReply,
    },
    HealthChecked(Result<HealthStatus, ExchangeError>),
}

pub struct ControllerState {
    pub(super) backend: BackendClient,
    pub(super) user_id: String,
    pub(super) transcript: Option<Box<dyn TranscriptSink>>,
    pub(super) presentation: Option<Box<dyn PresentationSurface>>,
    pub(super) notifier: Option<Box<dyn NotificationSurface>>,
    pub(super) state_tx: watch::Sender<ConversationState>,
    // Weak, so that the controller stops once every handle is gone.
    pub(super) cmd_tx: mpsc::WeakUnboundedSender<Command>,
}

impl ControllerState {
    pub fn handle(&mut self, cmd: Command) {
        match cmd {
            Command::Submit { raw, reply } => {
                let result = self.submit(&raw);
                if let Err(err) = &result {
                    debug!("input ignored: {err}");
                }
                reply.send(result).ok();
            }
            Command::Reset { reply } => self.reset(reply),
            Command::CheckHealth => self.check_health(),
            Command::ExchangeFinished(result) => self.finish_exchange(result),
            Command::ResetFinished { result, reply } => {
                self.finish_reset(result, reply)
            }
            Command::HealthChecked(result) => self.finish_health_check(result),
        }
    }

    #[inline]
    fn current_state(&self) -> ConversationState {
        *self.state_tx.borrow()
    }

    fn submit(&mut self, raw: &str) -> Result<DisplayMessage, SubmitError> {
        let Some(msg) = OutboundMessage::new(raw, self.user_id.as_str()) else {
            return Err(SubmitError::EmptyInput);
        };
        if self.current_state() == ConversationState::Busy {
            return Err(SubmitError::Busy);
        }

        let Some(guard) = self.acquire(Command::ExchangeFinished) else {
            return Err(SubmitError::Closed);
        };

        let user_msg = DisplayMessage::user(msg.text());
        if let Some(transcript) = &mut self.transcript {
            transcript.append(user_msg.clone());
            // Shown before the request goes out.
            transcript.show_transient_indicator();
        }

        let backend = self.backend.clone();
        tokio::spawn(async move {
            let result = backend.send_message(msg).await;
            guard.complete(result);
        });

        Ok(user_msg)
    }

    fn finish_exchange(&mut self, result: Result<String, ExchangeError>) {
        let msg = match result {
            Ok(text) => DisplayMessage::bot(finalize_reply(&text)),
            Err(err) => {
                error!("exchange failed: {err}");
                DisplayMessage::error(APOLOGY)
            }
        };
        if let Some(transcript) = &mut self.transcript {
            transcript.remove_transient_indicator();
            transcript.append(msg);
        }
        self.release();
    }

    fn reset(&mut self, reply: ResetReply) {
        if self.current_state() == ConversationState::Busy {
            debug!("reset refused while busy");
            self.notify(RESET_WHILE_BUSY, NotificationKind::Info);
            reply.send(Err(ResetError::Busy)).ok();
            return;
        }

        // If the controller is closing, the reply is dropped along with
        // the closure and the caller sees `Closed`.
        let Some(guard) = self
            .acquire(move |result| Command::ResetFinished { result, reply })
        else {
            return;
        };

        let backend = self.backend.clone();
        let user_id = self.user_id.clone();
        tokio::spawn(async move {
            let result = backend.reset_session(&user_id).await;
            guard.complete(result);
        });
    }

    fn finish_reset(
        &mut self,
        result: Result<(), ExchangeError>,
        reply: ResetReply,
    ) {
        let result = match result {
            Ok(()) => {
                info!("session reset for {}", self.user_id);
                if let Some(transcript) = &mut self.transcript {
                    transcript.clear_to_initial();
                }
                self.notify(RESET_SUCCEEDED, NotificationKind::Success);
                Ok(())
            }
            Err(err) => {
                warn!("session reset failed: {err}");
                self.notify(RESET_FAILED, NotificationKind::Error);
                Err(ResetError::Rejected(err))
            }
        };
        self.release();
        reply.send(result).ok();
    }

    fn check_health(&mut self) {
        let Some(cmd_tx) = self.cmd_tx.upgrade() else {
            return;
        };
        let backend = self.backend.clone();
        tokio::spawn(async move {
            let result = backend.check_health().await;
            cmd_tx.send(Command::HealthChecked(result)).ok();
        });
    }

    fn finish_health_check(
        &mut self,
        result: Result<HealthStatus, ExchangeError>,
    ) {
        match result {
            Ok(health) => info!("backend health: {health:?}"),
            Err(err) => {
                error!("health check failed: {err}");
                self.notify(HEALTH_CHECK_FAILED, NotificationKind::Error);
            }
        }
    }

    /// Enters `Busy` and returns the guard that will bring the controller
    /// back to `Idle`.
    fn acquire<T, F>(&mut self, finish: F) -> Option<BusyGuard<T>>
    where
        F: FnOnce(Result<T, ExchangeError>) -> Command + Send + 'static,
    {
        let cmd_tx = self.cmd_tx.upgrade()?;
        self.state_tx.send_replace(ConversationState::Busy);
        if let Some(presentation) = &mut self.presentation {
            presentation.set_busy(true);
        }
        Some(BusyGuard {
            cmd_tx,
            finish: Some(Box::new(finish)),
        })
    }

    fn release(&mut self) {
        self.state_tx.send_replace(ConversationState::Idle);
        if let Some(presentation) = &mut self.presentation {
            presentation.set_busy(false);
        }
    }

    fn notify(&mut self, message: &str, kind: NotificationKind) {
        if let Some(notifier) = &mut self.notifier {
            notifier.notify(Notification::new(message, kind));
        }
    }
}

type FinishFn<T> =
    Box<dyn FnOnce(Result<T, ExchangeError>) -> Command + Send + 'static>;

/// Carries the outcome of a busy operation back to the controller.
///
/// Dropping the guard without calling [`complete`](Self::complete), e.g.
/// when the task panics, reports [`ExchangeError::Aborted`].
pub struct BusyGuard<T> {
    cmd_tx: mpsc::UnboundedSender<Command>,
    finish: Option<FinishFn<T>>,
}

impl<T> BusyGuard<T> {
    pub fn complete(mut self, result: Result<T, ExchangeError>) {
        self.report(result);
    }

    fn report(&mut self, result: Result<T, ExchangeError>) {
        if let Some(finish) = self.finish.take() {
            self.cmd_tx.send(finish(result)).ok();
        }
    }
}

impl<T> Drop for BusyGuard<T> {
    fn drop(&mut self) {
        if self.finish.is_some() {
            warn!("operation ended without an outcome");
            self.report(Err(ExchangeError::Aborted));
        }
    }
}

impl<T> Debug for BusyGuard<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BusyGuard")
            .field("pending", &self.finish.is_some())
            .finish_non_exhaustive()
    }
}
