mod action;
mod app;
mod app_state;
mod engine;
mod keymap;
mod loader;
mod overlay;
mod router;
mod scheduler;
mod screen;
mod store;
mod theme;
mod view;
mod views;
mod widgets;

#[cfg(test)]
mod test_support;

use std::panic::PanicHookInfo;
use std::rc::Rc;

use chrono::Local;
use ratatui::crossterm::{execute, terminal};
use tokio::task::LocalSet;
use tracing_subscriber::EnvFilter;

use nhl_proto::api::{DataSource, NhlClient};
use nhl_proto::config::Config;
use nhl_proto::platform;

use crate::app::App;
use crate::engine::Engine;

type PanicHook = Box<dyn Fn(&PanicHookInfo<'_>) + Sync + Send + 'static>;

fn main() -> anyhow::Result<()> {
    // ── Load config ──────────────────────────────────────────────────────────
    // Failures are reported once logging is up.
    let (config, config_error) = match Config::load() {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(e)),
    };

    let data_dir = platform::data_dir();
    std::fs::create_dir_all(&data_dir)?;
    let log_path = platform::log_path();
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    // RUST_LOG wins over the configured filter.
    let log_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| config.log.filter.clone());
    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_env_filter(EnvFilter::new(log_filter))
        .with_ansi(false)
        .init();

    // Print log path to stderr so the operator can tail it immediately.
    eprintln!("nhl-viewer log: {}", log_path.display());
    tracing::info!("nhl-viewer starting…");
    if let Some(e) = config_error {
        tracing::warn!("config: {:#}, using defaults", e);
    }

    std::panic::set_hook(panic_hook(restore_terminal, std::panic::take_hook()));

    let client = NhlClient::new(&config.api)?;
    tracing::info!("api: {}", client.base_url());
    let source: Rc<dyn DataSource> = Rc::new(client);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let local = LocalSet::new();
    let result = local.block_on(&runtime, async move {
        let engine = Engine::new(source, &config, Local::now().date_naive());
        App::new(engine).run().await
    });

    // The blocking input reader may still be parked in a read.
    drop(local);
    runtime.shutdown_background();

    if let Err(e) = &result {
        tracing::error!("nhl-viewer exited with error: {:#}", e);
    }
    tracing::info!("nhl-viewer stopped");
    result
}

/// Panics the store catches stay inside the app and only get logged. Any
/// other panic is fatal: hand the terminal back, then defer to `next`.
fn panic_hook(restore: impl Fn() + Sync + Send + 'static, next: PanicHook) -> PanicHook {
    Box::new(move |info| {
        if store::in_subscriber() {
            tracing::error!("subscriber panic: {}", info);
            return;
        }
        tracing::error!("panic: {}", info);
        restore();
        next(info);
    })
}

fn restore_terminal() {
    let _ = terminal::disable_raw_mode();
    let _ = execute!(std::io::stdout(), terminal::LeaveAlternateScreen);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app_state::{AppState, PartialState};
    use crate::store::Store;
    use crate::test_support::today;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_subscriber_panic_keeps_terminal() {
        let restores = Arc::new(AtomicUsize::new(0));
        let forwarded = Arc::new(AtomicUsize::new(0));
        let (r, f) = (restores.clone(), forwarded.clone());
        let counts = || {
            (
                restores.load(Ordering::SeqCst),
                forwarded.load(Ordering::SeqCst),
            )
        };

        let previous = std::panic::take_hook();
        std::panic::set_hook(panic_hook(
            move || {
                r.fetch_add(1, Ordering::SeqCst);
            },
            Box::new(move |_| {
                f.fetch_add(1, Ordering::SeqCst);
            }),
        ));

        let store = Store::new(AppState::new(today()));
        let _bug = store.subscribe(|_| panic!("view bug"));
        store.set_state(PartialState::new().loading(true));
        let isolated = counts();

        let fatal = std::panic::catch_unwind(|| panic!("fatal"));
        let escaped = counts();
        std::panic::set_hook(previous);

        assert_eq!(isolated, (0, 0));
        assert!(fatal.is_err());
        assert_eq!(escaped, (1, 1));
        assert!(store.get_state().loading);
    }
}
