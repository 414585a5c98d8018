use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::mpsc::Sender;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tray_recorder::capture::CaptureBackend;
use tray_recorder::notify::{self, Urgency};
use tray_recorder::tray::{self, TrayUpdate};
use tray_recorder::{
    Action, Config, Notification, Outcome, RecordingSession, SessionOptions, SettingsStore,
    TrayController, X11Backend,
};

#[derive(Parser)]
#[command(name = "tray-recorder")]
#[command(about = "system tray screen recorder for x11 desktops")]
struct Cli {
    /// use this config file instead of the default one
    #[arg(long, value_name = "path")]
    config: Option<PathBuf>,

    /// log debug output
    #[arg(short, long)]
    verbose: bool,

    /// check that ffmpeg and the x display are usable
    #[arg(long)]
    check: bool,

    /// print config paths and effective values
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // initialize logging
    let default_filter = if cli.verbose {
        "tray_recorder=debug"
    } else {
        "tray_recorder=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    info!("starting tray-recorder v{}", env!("CARGO_PKG_VERSION"));

    let config = match &cli.config {
        Some(path) => Config::load_or_create_at(path)?,
        None => Config::load_or_create()?,
    };

    if cli.print_config {
        return print_config(&cli, &config);
    }

    let backend = X11Backend::new(config.capture.display.clone());

    if cli.check {
        check_system(&config, &backend).await;
        return Ok(());
    }

    run_tray(config, backend).await
}

async fn run_tray(config: Config, backend: X11Backend) -> Result<()> {
    let store = SettingsStore::open(Config::settings_path()?)?;
    let session = RecordingSession::new(backend, SessionOptions::from_config(&config)?);
    let mut controller = TrayController::new(store, session);

    let (action_tx, mut actions) = tokio::sync::mpsc::unbounded_channel();
    let (update_tx, update_rx) = std::sync::mpsc::channel();

    let tray_thread = tray::spawn(action_tx.clone(), update_rx, controller.view())?;

    let ctrlc_tx = action_tx.clone();
    ctrlc::set_handler(move || {
        let _ = ctrlc_tx.send(Action::Quit);
    })
    .context("failed to install Ctrl-C handler")?;

    let mut ticker = tokio::time::interval(Duration::from_secs(1));

    loop {
        let outcome = tokio::select! {
            action = actions.recv() => match action {
                Some(action) => controller.dispatch(action).await,
                None => {
                    controller.shutdown().await;
                    Outcome::Quit
                }
            },
            _ = ticker.tick() => controller.tick(),
        };

        if outcome == Outcome::Quit {
            break;
        }

        present(outcome, &update_tx);
        let _ = update_tx.send(TrayUpdate::Refresh(controller.view()));
    }

    info!("shutting down");
    let _ = update_tx.send(TrayUpdate::Quit);
    let _ = tray_thread.join();
    Ok(())
}

fn present(outcome: Outcome, updates: &Sender<TrayUpdate>) {
    match outcome {
        Outcome::Notify(notification) => notify::send(&notification, Urgency::Normal),
        Outcome::Failed(message) => notify::send(
            &Notification {
                title: "Recording Error".to_string(),
                body: message,
            },
            Urgency::Critical,
        ),
        Outcome::About(text) => {
            let _ = updates.send(TrayUpdate::About(text));
        }
        Outcome::Done | Outcome::Quit => {}
    }
}

fn print_config(cli: &Cli, config: &Config) -> Result<()> {
    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => Config::config_path()?,
    };

    println!("\ntray-recorder configuration");
    println!("========================================");
    println!("config: {:?}", config_path);
    println!("settings: {:?}", Config::settings_path()?);
    println!("output dir: {:?}", config.resolved_output_dir()?);
    println!("----------------------------------------");
    print!("{}", toml::to_string_pretty(config)?);
    println!("========================================\n");
    Ok(())
}

async fn check_system(config: &Config, backend: &X11Backend) {
    println!("\ntray-recorder system check");
    println!("========================================");

    let ffmpeg = tokio::process::Command::new(&config.capture.ffmpeg_path)
        .arg("-version")
        .output()
        .await;
    match ffmpeg {
        Ok(output) if output.status.success() => {
            let stdout = String::from_utf8_lossy(&output.stdout);
            println!("[ok] {}", stdout.lines().next().unwrap_or("ffmpeg"));
        }
        Ok(output) => println!("[x] {} exited with {}", config.capture.ffmpeg_path, output.status),
        Err(e) => println!("[x] cannot run {}: {}", config.capture.ffmpeg_path, e),
    }

    match backend.display_size().await {
        Ok((w, h)) => println!("[ok] display {} is {}x{}", config.capture.display, w, h),
        Err(e) => println!("[x] display {}: {}", config.capture.display, e),
    }

    match backend.active_window().await {
        Ok(window) => println!(
            "[ok] active window at {},{} size {}",
            window.x,
            window.y,
            window.dimensions()
        ),
        Err(e) => println!("[x] active window: {}", e),
    }

    match config.resolved_output_dir() {
        Ok(dir) => println!("[ok] recordings go to {:?}", dir),
        Err(e) => println!("[x] output dir: {:#}", e),
    }

    println!("========================================\n");
}
