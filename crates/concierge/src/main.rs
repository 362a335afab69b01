//! A simple program demonstrates how to chat with the concierge backend in
//! the terminal.

#[macro_use]
extern crate tracing;

use std::env;
use std::io::Write as _;
use std::time::Duration;

use concierge::core::surface::Notification;
use concierge::core::transcript::{
    DisplayMessage, Sender, Transcript, TranscriptEvent,
};
use concierge::core::{ControllerBuilder, SubmitError};
use concierge::http::{HttpBackend, HttpBackendConfigBuilder};
use concierge::terminal::{render_message, render_notification};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::io::{self, AsyncBufReadExt};
use tokio::select;
use tokio::sync::mpsc;
use tokio::time::sleep;

enum UiEvent {
    Transcript(TranscriptEvent),
    Busy(bool),
    Notification(Notification),
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut config = HttpBackendConfigBuilder::new();
    if let Ok(base_url) = env::var("CONCIERGE_BASE_URL") {
        config = config.with_base_url(base_url);
    }
    let backend = HttpBackend::new(config.build());

    let (event_tx, mut event_rx) = mpsc::unbounded_channel();

    let mut builder = ControllerBuilder::with_backend(backend)
        .with_transcript_sink({
            let event_tx = event_tx.clone();
            move |event: TranscriptEvent| {
                event_tx.send(UiEvent::Transcript(event)).ok();
            }
        })
        .with_presentation({
            let event_tx = event_tx.clone();
            move |busy: bool| {
                event_tx.send(UiEvent::Busy(busy)).ok();
            }
        })
        .with_notifier(move |notification: Notification| {
            event_tx.send(UiEvent::Notification(notification)).ok();
        })
        .with_health_check();
    if let Ok(user_id) = env::var("CONCIERGE_USER_ID") {
        builder = builder.with_user_id(user_id);
    }
    let controller = builder.build();

    let mut screen = Screen::default();
    screen.print_message(Transcript::default().greeting());

    let mut lines = spawn_line_reader();

    'outer: loop {
        prompt("> ");

        // Notifications may arrive while waiting for input.
        let line = loop {
            select! {
                line = lines.recv() => break line,
                event = event_rx.recv() => {
                    let Some(event) = event else {
                        break 'outer;
                    };
                    screen.handle(event);
                    prompt("> ");
                }
            }
        };
        let Some(line) = line else {
            break;
        };

        match line.trim() {
            "/quit" => break,
            "/reset" => {
                prompt("Reset the conversation? [y/N]: ");
                let Some(answer) = lines.recv().await else {
                    break;
                };
                if !answer.trim().eq_ignore_ascii_case("y") {
                    continue;
                }
                if let Err(err) = controller.reset().await {
                    debug!("reset failed: {err}");
                }
                // Everything the reset reported is queued by now.
                while let Ok(event) = event_rx.try_recv() {
                    screen.handle(event);
                }
            }
            input => match controller.submit(input).await {
                Ok(_) => {
                    if !screen.run_until_idle(&mut event_rx).await {
                        break;
                    }
                }
                Err(SubmitError::EmptyInput) => {}
                Err(err) => {
                    error!("cannot send message: {err}");
                    break;
                }
            },
        }
    }
}

struct Screen {
    progress_style: ProgressStyle,
    progress_bar: Option<ProgressBar>,
}

impl Default for Screen {
    fn default() -> Self {
        let progress_style = ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");
        Self {
            progress_style,
            progress_bar: None,
        }
    }
}

impl Screen {
    /// Handles events until the controller becomes idle. Returns `false` if
    /// the controller has gone away.
    async fn run_until_idle(
        &mut self,
        event_rx: &mut mpsc::UnboundedReceiver<UiEvent>,
    ) -> bool {
        loop {
            if let Some(progress_bar) = &self.progress_bar {
                progress_bar.inc(1);
            }

            let sleep = sleep(Duration::from_millis(100));
            let event = select! {
                event = event_rx.recv() => {
                    let Some(event) = event else {
                        return false;
                    };
                    event
                },
                _ = sleep => {
                    continue;
                }
            };

            if let UiEvent::Busy(false) = event {
                return true;
            }
            self.handle(event);
        }
    }

    fn handle(&mut self, event: UiEvent) {
        match event {
            UiEvent::Transcript(TranscriptEvent::ShowIndicator) => {
                let progress_bar = ProgressBar::new_spinner();
                progress_bar.set_style(self.progress_style.clone());
                progress_bar.set_message("🤔 Thinking...");
                self.progress_bar = Some(progress_bar);
            }
            UiEvent::Transcript(TranscriptEvent::RemoveIndicator) => {
                self.clear_progress();
            }
            UiEvent::Transcript(TranscriptEvent::Append(msg)) => {
                // The terminal already shows what the user typed.
                if msg.sender() == Sender::Bot {
                    self.print_message(&msg);
                }
            }
            UiEvent::Transcript(TranscriptEvent::ClearToInitial) => {
                println!();
                self.print_message(Transcript::default().greeting());
            }
            UiEvent::Notification(notification) => {
                self.clear_progress();
                println!("{}", render_notification(&notification));
            }
            UiEvent::Busy(busy) => {
                trace!("busy: {busy}");
            }
        }
    }

    fn print_message(&mut self, msg: &DisplayMessage) {
        // Finish the progress bar before printing anything else.
        self.clear_progress();
        println!("{}\n", render_message(msg));
    }

    fn clear_progress(&mut self) {
        if let Some(progress_bar) = self.progress_bar.take() {
            progress_bar.finish_and_clear();
        }
    }
}

fn prompt(text: &str) {
    print!("{text}");
    std::io::stdout().flush().ok();
}

/// Reads stdin on a separate task so that waiting for input can be
/// interrupted by controller events.
fn spawn_line_reader() -> mpsc::UnboundedReceiver<String> {
    let (line_tx, line_rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        let mut lines = io::BufReader::new(io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if line_tx.send(line).is_err() {
                        break;
                    }
                }
                Ok(None) => break,
                Err(err) => {
                    error!("error reading input: {}", err);
                    break;
                }
            }
        }
    });
    line_rx
}
