use candyfall::config::GameConfig;
use candyfall::controller::GamepadBridge;
use candyfall::runtime::{GameLoop, SilentAudio, StaticDeviceSource, TracingFrameSink};
use color_eyre::{eyre::eyre, Result};
use std::sync::Arc;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// Surface reported when running without a window
const HEADLESS_SURFACE: (i32, i32) = (1280, 720);

#[tokio::main]
async fn main() -> Result<()> {
    setup()?;
    let config = setup_config().await?;
    setup_logging(config.tracing_level());
    info!("Candyfall starting with {:?}", config);

    let devices = StaticDeviceSource::default();
    let game_loop = GameLoop::create(
        config,
        Box::new(TracingFrameSink::new()),
        Box::new(SilentAudio::new()),
        Arc::new(devices.clone()),
    )
    .map_err(|e| eyre!("Failed to create game loop: {}", e))?
    .start()
    .map_err(|e| eyre!("Failed to start game loop: {}", e))?;

    let (width, height) = HEADLESS_SURFACE;
    game_loop.on_surface_ready(width, height).await?;

    let bridge = GamepadBridge::spawn(game_loop.command_sender(), devices, game_loop.child_token())
        .map_err(|e| eyre!("Failed to start gamepad bridge: {}", e))?;

    info!("Press A on a gamepad to start, Ctrl-C to quit");
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| eyre!("Failed to listen for Ctrl-C: {}", e))?;
    info!("Ctrl-C received, shutting down");

    let terminated = game_loop.shutdown().await?;
    info!("Final score: {}", terminated.last_frame().score_line());

    let stop = tokio::task::spawn_blocking(move || bridge.stop())
        .await
        .map_err(|e| eyre!("Failed to join gamepad bridge: {}", e))?;
    if let Err(e) = stop {
        warn!("Gamepad bridge did not stop cleanly: {}", e);
    }

    Ok(())
}

fn setup() -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info")
    }
    Ok(())
}

fn setup_logging(level: Level) {
    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .init();
}

async fn setup_config() -> Result<GameConfig> {
    let path = GameConfig::default_path()?;
    GameConfig::ensure_default_config(&path).await?;
    GameConfig::load(&path).await
}
