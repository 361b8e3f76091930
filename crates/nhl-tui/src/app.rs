//! App — terminal setup and the event loop around the [`Engine`].
//!
//! Architecture:
//! - A blocking reader forwards terminal events over a `tokio::mpsc` channel.
//! - The loop waits on input, queued actions and the shutdown signal.
//! - A frame is drawn only when the screen has a pending render request.

use std::io;

use ratatui::crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::engine::Engine;

pub struct App {
    engine: Engine,
}

impl App {
    pub fn new(engine: Engine) -> Self {
        Self { engine }
    }

    // ── Main run loop ─────────────────────────────────────────────────────────

    pub async fn run(mut self) -> anyhow::Result<()> {
        debug!("run(): enabling raw mode");
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        debug!("run(): terminal created, size={:?}", terminal.size());

        let result = self.event_loop(&mut terminal).await;

        // ── Teardown ──────────────────────────────────────────────────────────
        self.engine.shutdown();
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    async fn event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> anyhow::Result<()> {
        // ── Background task: terminal events ──────────────────────────────────
        let (event_tx, mut event_rx) = mpsc::channel::<Event>(256);
        tokio::task::spawn_blocking(move || loop {
            match event::read() {
                Ok(ev) => {
                    if event_tx.blocking_send(ev).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            }
        });

        let shutdown = shutdown_signal();
        tokio::pin!(shutdown);

        self.engine.start();

        loop {
            if self.engine.screen().take_pending() {
                let screen = self.engine.screen().clone();
                terminal.draw(|f| screen.draw(f))?;
            }

            if self.engine.should_quit() {
                break;
            }

            tokio::select! {
                Some(ev) = event_rx.recv() => {
                    match ev {
                        Event::Key(key) if key.kind == KeyEventKind::Press => {
                            self.engine.handle_key(key);
                        }
                        Event::Resize(width, height) => {
                            debug!("terminal resized to {}x{}", width, height);
                            self.engine.screen().render();
                        }
                        _ => {}
                    }
                }

                Some(action) = self.engine.next_action() => {
                    self.engine.dispatch(action);
                    self.engine.drain();
                }

                _ = &mut shutdown => {
                    info!("shutdown signal received");
                    self.engine.quit();
                }
            }
        }

        info!("event loop finished");
        Ok(())
    }
}

/// Resolves on Ctrl-C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("failed to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
