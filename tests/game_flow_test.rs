use candyfall::config::{BindingDiscipline, GameConfig};
use candyfall::controller::input_mapper::{
    centered_axis_value, KEYCODE_BACK, KEYCODE_BUTTON_A, KEYCODE_BUTTON_B,
};
use candyfall::controller::{
    DeviceId, DeviceInfo, MotionInput, SourceFlags, TouchAction, TouchEvent,
};
use candyfall::game::objects::Player;
use candyfall::game::{DisplayContext, GameLogic, GameState};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn pad(device_id: DeviceId, descriptor: &str) -> DeviceInfo {
    DeviceInfo::new(device_id, descriptor, SourceFlags::GAMEPAD)
}

fn new_game(config: GameConfig) -> GameLogic {
    let mut logic = GameLogic::with_rng(config, StdRng::seed_from_u64(42));
    logic.set_display(800, 600);
    logic
}

/// Holds A for one tick from `device_id`
fn press_a(logic: &mut GameLogic, device_id: DeviceId) {
    logic.process_key_event(device_id, KEYCODE_BUTTON_A, true);
    logic.tick();
    logic.process_key_event(device_id, KEYCODE_BUTTON_A, false);
}

#[test]
fn dead_zone_filter_passes_values_outside_the_flat() {
    for flat in [0.0_f32, 0.05, 0.2, 0.5] {
        for value in [-1.0_f32, -0.3, -0.05, 0.0, 0.04, 0.2, 0.5, 0.9] {
            let centered = centered_axis_value(value, flat);
            if value.abs() <= flat {
                assert_eq!(centered, 0.0, "value {} flat {}", value, flat);
            } else {
                assert_eq!(centered, value, "value {} flat {}", value, flat);
            }
        }
    }
}

#[test]
fn rejected_move_keeps_position() {
    let mut player = Player::new(DisplayContext::new(800, 600), "pad", 0);
    assert!(player.set_position(50, 300));
    assert!(!player.move_by(-100, 0));
    assert_eq!(player.position(), (50, 300));
}

#[test]
fn a_from_stopped_starts_with_full_pools() {
    let mut logic = new_game(GameConfig::default());
    logic.add_controller(&pad(1, "p1"));
    logic.add_controller(&pad(2, "p2"));
    logic.add_controller(&DeviceInfo::new(3, "kbd", SourceFlags::KEYBOARD));

    press_a(&mut logic, 1);

    assert_eq!(logic.state(), GameState::Playing);
    assert_eq!(logic.candies().len(), 7);
    assert_eq!(logic.players().len(), 2);
}

#[test]
fn back_pauses_then_stops_then_is_not_consumed() {
    let mut logic = new_game(GameConfig::default());
    logic.add_controller(&pad(1, "p1"));
    press_a(&mut logic, 1);

    assert!(logic.process_back_pressed());
    assert_eq!(logic.state(), GameState::Paused);

    assert!(logic.process_back_pressed());
    assert_eq!(logic.state(), GameState::Stopped);

    assert!(!logic.process_back_pressed());
    assert_eq!(logic.state(), GameState::Stopped);
}

#[test]
fn back_key_is_left_to_the_host() {
    let mut logic = new_game(GameConfig::default());
    logic.add_controller(&pad(1, "p1"));
    assert!(!logic.on_key(1, KEYCODE_BACK, true));
    assert!(logic.on_key(1, KEYCODE_BUTTON_B, true));
}

#[test]
fn reconnect_keeps_the_player_and_its_score() {
    let mut logic = new_game(GameConfig::default());
    assert_eq!(logic.add_controller(&pad(5, "D1")), 1);
    press_a(&mut logic, 5);

    let (px, py) = logic.players()[0].position();
    logic.candies_mut()[0].set_velocity(0, 0);
    logic.candies_mut()[0].place(px, py);
    logic.tick();
    assert_eq!(logic.players()[0].score(), 1);

    assert_eq!(logic.remove_controller(5), 0);
    assert_eq!(logic.state(), GameState::Paused);

    assert_eq!(logic.add_controller(&pad(9, "D1")), 1);
    assert_eq!(logic.players().len(), 1);
    assert_eq!(logic.players()[0].controller_descriptor(), "D1");
    assert_eq!(logic.players()[0].score(), 1);

    // New device id drives the old player once the game resumes
    press_a(&mut logic, 9);
    assert_eq!(logic.state(), GameState::Playing);
    assert_eq!(logic.players()[0].score(), 1);
}

#[test]
fn removal_of_unknown_device_changes_nothing() {
    let mut logic = new_game(GameConfig::default());
    logic.add_controller(&pad(1, "p1"));
    press_a(&mut logic, 1);

    assert_eq!(logic.remove_controller(77), 1);
    assert_eq!(logic.state(), GameState::Playing);
}

#[test]
fn touchscreen_player_moves_towards_the_touched_half() {
    let mut logic = new_game(GameConfig::default());
    let touch = DeviceInfo::new(2, "touch", SourceFlags::TOUCHSCREEN);
    logic.add_controller(&touch);

    let down = |x: f32| {
        MotionInput::Touch(TouchEvent {
            action: TouchAction::Down,
            pointer_index: 0,
            x,
            y: 300.0,
        })
    };

    // Touching also presses A, which starts the game
    assert!(logic.process_motion_event(2, &down(700.0)));
    logic.tick();
    assert_eq!(logic.state(), GameState::Playing);

    let x_before = logic.players()[0].x();
    logic.tick();
    assert_eq!(logic.players()[0].x(), x_before + 10);

    logic.process_motion_event(2, &down(100.0));
    logic.tick();
    assert_eq!(logic.players()[0].x(), x_before);
}

#[test]
fn resize_and_surface_loss_pause_play() {
    let mut logic = new_game(GameConfig::default());
    logic.add_controller(&pad(1, "p1"));
    press_a(&mut logic, 1);

    logic.on_surface_resized(640, 480);
    assert_eq!(logic.state(), GameState::Paused);
    assert_eq!(logic.players()[0].size(), 80);
    assert_eq!(logic.candies()[0].size(), 21);
    assert_eq!(logic.players()[0].position(), (280, 440));

    press_a(&mut logic, 1);
    assert_eq!(logic.state(), GameState::Playing);
    logic.on_surface_lost();
    assert_eq!(logic.state(), GameState::Paused);
}

#[test]
fn single_discipline_keeps_one_controller() {
    let config = GameConfig {
        binding_discipline: BindingDiscipline::Single,
        ..GameConfig::default()
    };
    let mut logic = new_game(config);
    assert_eq!(logic.bind_device(&pad(1, "p1")), 1);
    assert_eq!(logic.bind_device(&pad(2, "p2")), 1);

    press_a(&mut logic, 2);
    assert_eq!(logic.players().len(), 1);
    assert_eq!(logic.players()[0].controller_descriptor(), "p2");
}

#[test]
fn candies_keep_falling_inside_their_range() {
    let mut logic = new_game(GameConfig::default());
    logic.add_controller(&pad(1, "p1"));
    press_a(&mut logic, 1);

    for _ in 0..500 {
        logic.tick();
        for candy in logic.candies() {
            let (x, y) = candy.position();
            assert!((0..800).contains(&x), "x {} out of range", x);
            assert!((-600..600).contains(&y), "y {} out of range", y);
        }
    }
}

#[test]
fn snapshot_reflects_the_game() {
    let mut logic = new_game(GameConfig::default());
    logic.add_controller(&pad(1, "p1"));
    press_a(&mut logic, 1);

    let snapshot = logic.snapshot();
    assert_eq!(snapshot.state, GameState::Playing);
    assert_eq!(snapshot.controller_count, 1);
    assert_eq!(snapshot.players.len(), 1);
    assert_eq!(snapshot.candies.len(), 7);
    assert_eq!(snapshot.score_line(), "Player1: 0");
}
