use candyfall::config::GameConfig;
use candyfall::controller::input_mapper::{KEYCODE_BACK, KEYCODE_BUTTON_A, AXIS_X};
use candyfall::controller::{AxisReadings, DeviceId, DeviceInfo, SourceFlags};
use candyfall::error::{AssetError, GameLoopError};
use candyfall::game::{FrameSnapshot, GameLogic, GameState};
use candyfall::runtime::{
    AudioSink, FrameSink, GameLoop, Running, StaticDeviceSource,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

#[derive(Clone, Default)]
struct Counters {
    frames: Arc<AtomicU64>,
    resizes: Arc<AtomicU64>,
    releases: Arc<AtomicU64>,
}

struct CountingFrames(Counters);

impl FrameSink for CountingFrames {
    fn draw(&mut self, _frame: &FrameSnapshot) {
        self.0.frames.fetch_add(1, Ordering::SeqCst);
    }

    fn display_changed(&mut self, _surface: candyfall::game::DisplayContext) {
        self.0.resizes.fetch_add(1, Ordering::SeqCst);
    }
}

/// Spends real time drawing, like a renderer on a slow device
struct SlowFrames {
    counters: Counters,
    cost: Duration,
}

impl FrameSink for SlowFrames {
    fn draw(&mut self, _frame: &FrameSnapshot) {
        std::thread::sleep(self.cost);
        self.counters.frames.fetch_add(1, Ordering::SeqCst);
    }
}

struct CountingAudio(Counters);

impl AudioSink for CountingAudio {
    fn load_cue(&mut self, name: &str) -> Result<(), AssetError> {
        Err(AssetError::NotFound(name.to_string()))
    }

    fn play_one_shot(&mut self, _name: &str) {}

    fn release(&mut self) {
        self.0.releases.fetch_add(1, Ordering::SeqCst);
    }
}

fn pad(device_id: DeviceId, descriptor: &str) -> DeviceInfo {
    DeviceInfo::new(device_id, descriptor, SourceFlags::GAMEPAD)
}

fn start_loop(devices: Vec<DeviceInfo>, counters: &Counters) -> GameLoop<Running> {
    let config = GameConfig::default();
    let logic = GameLogic::with_rng(config.clone(), StdRng::seed_from_u64(3));
    GameLoop::with_logic(
        config,
        logic,
        Box::new(CountingFrames(counters.clone())),
        Box::new(CountingAudio(counters.clone())),
        Arc::new(StaticDeviceSource::new(devices)),
    )
    .unwrap()
    .start()
    .unwrap()
}

async fn wait_for_state(
    frames: &mut watch::Receiver<FrameSnapshot>,
    state: GameState,
) -> FrameSnapshot {
    for _ in 0..50 {
        if frames.borrow_and_update().state == state {
            return frames.borrow().clone();
        }
        frames.changed().await.expect("simulation task stopped");
    }
    panic!("state {} never published", state);
}

#[tokio::test(start_paused = true)]
async fn loop_ticks_and_publishes_frames() {
    let counters = Counters::default();
    let game_loop = start_loop(Vec::new(), &counters);
    let mut frames = game_loop.subscribe_frames();

    frames.changed().await.unwrap();
    let first = frames.borrow_and_update().frame;
    frames.changed().await.unwrap();
    let second = frames.borrow_and_update().frame;

    assert!(second > first);
    assert!(counters.frames.load(Ordering::SeqCst) >= 2);

    game_loop.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn host_events_drive_the_state_machine() {
    let counters = Counters::default();
    let game_loop = start_loop(vec![pad(1, "p1")], &counters);
    let mut frames = game_loop.subscribe_frames();

    game_loop.on_surface_ready(800, 600).await.unwrap();
    assert_eq!(counters.resizes.load(Ordering::SeqCst), 1);

    assert!(game_loop.on_key_down(1, KEYCODE_BUTTON_A).await.unwrap());
    let playing = wait_for_state(&mut frames, GameState::Playing).await;
    assert_eq!(playing.players.len(), 1);
    assert_eq!(playing.candies.len(), 7);
    assert!(game_loop.on_key_up(1, KEYCODE_BUTTON_A).await.unwrap());

    assert!(game_loop.on_back_pressed().await.unwrap());
    wait_for_state(&mut frames, GameState::Paused).await;
    assert!(game_loop.on_back_pressed().await.unwrap());
    wait_for_state(&mut frames, GameState::Stopped).await;
    assert!(!game_loop.on_back_pressed().await.unwrap());

    game_loop.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn back_key_and_unknown_devices() {
    let counters = Counters::default();
    let game_loop = start_loop(vec![pad(1, "p1")], &counters);
    game_loop.on_surface_ready(800, 600).await.unwrap();

    assert!(!game_loop.on_key_down(1, KEYCODE_BACK).await.unwrap());
    assert!(!game_loop.on_key_up(1, KEYCODE_BACK).await.unwrap());

    let readings = AxisReadings::from_raw(&[(AXIS_X, 1.0)]);
    assert!(game_loop.on_motion_event(1, readings).await.unwrap());
    assert!(!game_loop.on_motion_event(99, readings).await.unwrap());
    assert!(game_loop.on_key_down(99, KEYCODE_BUTTON_A).await.unwrap());

    game_loop.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn device_removal_pauses_a_running_game() {
    let counters = Counters::default();
    let game_loop = start_loop(Vec::new(), &counters);
    let mut frames = game_loop.subscribe_frames();
    game_loop.on_surface_ready(800, 600).await.unwrap();

    game_loop.on_device_added(pad(4, "D1")).await.unwrap();
    game_loop.on_key_down(4, KEYCODE_BUTTON_A).await.unwrap();
    wait_for_state(&mut frames, GameState::Playing).await;
    game_loop.on_key_up(4, KEYCODE_BUTTON_A).await.unwrap();

    game_loop.on_device_removed(4).await.unwrap();
    let paused = wait_for_state(&mut frames, GameState::Paused).await;
    assert_eq!(paused.controller_count, 0);
    assert_eq!(paused.players.len(), 1);

    game_loop.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn shutdown_releases_audio_exactly_once() {
    let counters = Counters::default();
    let game_loop = start_loop(Vec::new(), &counters);
    let mut frames = game_loop.subscribe_frames();
    frames.changed().await.unwrap();

    let terminated = game_loop.shutdown().await.unwrap();
    assert_eq!(counters.releases.load(Ordering::SeqCst), 1);

    let drawn = counters.frames.load(Ordering::SeqCst);
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;
    assert_eq!(counters.frames.load(Ordering::SeqCst), drawn);
    assert_eq!(terminated.last_frame().state, GameState::Stopped);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn slow_ticks_keep_the_configured_rate() {
    let counters = Counters::default();
    let config = GameConfig::default();
    let period = config.frame_interval();
    let game_loop = GameLoop::create(
        config,
        Box::new(SlowFrames {
            counters: counters.clone(),
            cost: Duration::from_millis(20),
        }),
        Box::new(CountingAudio(counters.clone())),
        Arc::new(StaticDeviceSource::default()),
    )
    .unwrap()
    .start()
    .unwrap();

    tokio::time::sleep(Duration::from_secs(1)).await;
    game_loop.shutdown().await.unwrap();

    // One tick per period: about 31 in a second, not one per tick cost
    let ticks = counters.frames.load(Ordering::SeqCst);
    let expected = (1000 / period.as_millis()) as u64;
    assert!(
        ticks <= expected + 5,
        "{} ticks in 1s with a 20ms tick cost, period {:?}",
        ticks,
        period
    );
    assert!(ticks >= expected / 2, "only {} ticks in 1s", ticks);
}

#[tokio::test]
async fn invalid_config_is_rejected() {
    let config = GameConfig {
        candy_pool_size: 0,
        ..GameConfig::default()
    };
    let result = GameLoop::create(
        config,
        Box::new(CountingFrames(Counters::default())),
        Box::new(CountingAudio(Counters::default())),
        Arc::new(StaticDeviceSource::default()),
    );
    assert!(matches!(result, Err(GameLoopError::InitializationError(_))));
}
