/*
 * Responsibility
 * - CLI parse -> Config -> tracing/panic hook -> AppState
 * - Start the session controller and run the requested command
 */
use std::{fs, panic, process};

use anyhow::Result;
use clap::Parser;
use serde_json::{Value, json};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use beautyroom_session::config::{AppEnv, Config};
use beautyroom_session::error::AppError;
use beautyroom_session::state::AppState;
use beautyroom_session::{ProfileUpdate, SessionSnapshot};

use crate::cli::{Args, Command};

fn init_tracing(app_env: AppEnv) {
    // Prefer RUST_LOG if set; otherwise use a default per environment.
    // Ex:
    // RUST_LOG=info,beautyroom_session=trace beautyroom-session status
    let default = if app_env.is_production() {
        "info"
    } else {
        "info,beautyroom_session=debug"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    // Keep the default hook as a fallback (prints to stderr with location/payload).
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        tracing::error!(?info, "panic");

        // In development, fail fast.
        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    let args = Args::parse();
    let config = Config::from_env()?;

    init_tracing(config.app_env);
    init_panic_hook(!config.app_env.is_production());

    tracing::debug!(
        "using backend {} and storage {}",
        config.api_base_url,
        config.storage_dir.display()
    );

    let state = AppState::new(config)?;
    state.session.start();

    let result = dispatch(&state, args.command).await;
    state.session.shutdown();
    result
}

async fn dispatch(state: &AppState, command: Command) -> Result<()> {
    let session = &state.session;

    match command {
        Command::Status => {
            print_snapshot(&session.ready().await);
        }
        Command::Login { payload } => {
            let payload = read_payload(&payload)?;
            session.set_auth_from_payload(payload);
            print_snapshot(&session.snapshot());
        }
        Command::Logout => {
            session.logout();
            print_snapshot(&session.snapshot());
        }
        Command::Update(args) => {
            let snapshot = session.ready().await;
            if !snapshot.is_authenticated() {
                return Err(AppError::NotLoggedIn.into());
            }
            let update = ProfileUpdate::from(args);
            if update.is_empty() {
                tracing::warn!("no fields to update");
            }
            if !session.update_user(update).await {
                return Err(AppError::UpdateRejected.into());
            }
            print_snapshot(&session.snapshot());
        }
        Command::Watch => {
            session.ready().await;
            let watcher = state.store.spawn_watcher(state.config.storage_poll_interval);
            let mut rx = session.subscribe();
            print_snapshot(&rx.borrow_and_update().clone());

            loop {
                tokio::select! {
                    changed = rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let snapshot = rx.borrow_and_update().clone();
                        print_snapshot(&snapshot);
                    }
                    _ = tokio::signal::ctrl_c() => break,
                }
            }
            watcher.abort();
        }
    }

    Ok(())
}

fn read_payload(arg: &str) -> Result<Value, AppError> {
    let text = match arg.strip_prefix('@') {
        Some(path) => fs::read_to_string(path)
            .map_err(|e| AppError::invalid_payload(format!("{}: {}", path, e)))?,
        None => arg.to_string(),
    };
    serde_json::from_str(&text).map_err(|e| AppError::invalid_payload(e.to_string()))
}

fn print_snapshot(snapshot: &SessionSnapshot) {
    let view = json!({
        "state": format!("{:?}", snapshot.state),
        "loading": snapshot.is_loading,
        "authenticated": snapshot.is_authenticated(),
        "has_token": snapshot.token().is_some(),
        "user": snapshot.user(),
    });
    match serde_json::to_string_pretty(&view) {
        Ok(text) => println!("{}", text),
        Err(e) => tracing::error!(error = %e, "could not render session"),
    }
}
