use std::cell::RefCell;
use wasm_bindgen::prelude::*;

use crate::components::{Config, GameMode, Position};
use crate::engine::Engine;

thread_local! {
    static GAME: RefCell<Option<Engine>> = RefCell::new(None);
}

fn with_game<R>(f: impl FnOnce(&mut Engine) -> R) -> R {
    GAME.with(|cell| {
        let mut borrow = cell.borrow_mut();
        let engine = borrow.as_mut().expect("Game not initialized. Call setup_game() first.");
        f(engine)
    })
}

fn mode_from_u8(mode: u8) -> GameMode {
    match mode {
        0 => GameMode::Test,
        1 => GameMode::Easy,
        3 => GameMode::Hard,
        _ => GameMode::Normal,
    }
}

/// Initializes the engine. `mode`: 0=test, 1=easy, 2=normal, 3=hard.
/// Returns `true` on success; `false` if the config was rejected.
#[wasm_bindgen]
pub fn setup_game(seed: f64, rows: u32, columns: u32, duration_seconds: i32, free_moves: bool, mode: u8) -> bool {
    let config = Config {
        rows: rows as usize,
        columns: columns as usize,
        tile_size: 64,
        free_moves,
        duration_seconds: duration_seconds as i64,
        mode: mode_from_u8(mode),
    };
    let mut engine = Engine::new();
    let ok = engine.setup(config, seed as u64).is_ok();
    if ok {
        GAME.with(|cell| *cell.borrow_mut() = Some(engine));
        log::info!("matchcore: game initialized with seed {}", seed as u64);
    } else {
        log::warn!("matchcore: rejected config for seed {}", seed as u64);
    }
    ok
}

#[wasm_bindgen]
pub fn reset_game() {
    with_game(|g| g.reset());
}

#[wasm_bindgen]
pub fn start_playing() {
    with_game(|g| g.start_playing());
}

#[wasm_bindgen]
pub fn stop_playing() {
    with_game(|g| g.stop_playing());
}

#[wasm_bindgen]
pub fn pause_game() {
    with_game(|g| g.pause());
}

#[wasm_bindgen]
pub fn resume_game() {
    with_game(|g| g.resume());
}

#[wasm_bindgen]
pub fn update_game(delta_ms: f64) {
    with_game(|g| g.update(delta_ms as i64));
}

#[wasm_bindgen]
pub fn action_move(from_row: u32, from_col: u32, to_row: u32, to_col: u32) -> bool {
    with_game(|g| {
        g.action_move(
            Position::new(from_row as usize, from_col as usize),
            Position::new(to_row as usize, to_col as usize),
        )
    })
}

#[wasm_bindgen]
pub fn action_tap(row: u32, col: u32) -> bool {
    with_game(|g| g.action_tap(Position::new(row as usize, col as usize)))
}

#[wasm_bindgen]
pub fn get_cell_type(row: u32, col: u32) -> u32 {
    with_game(|g| g.get_type_at(Position::new(row as usize, col as usize)) as u32)
}

#[wasm_bindgen]
pub fn get_score() -> i64 {
    with_game(|g| g.snapshot().map(|s| s.score).unwrap_or(0))
}

#[wasm_bindgen]
pub fn get_pops() -> u32 {
    with_game(|g| g.snapshot().map(|s| s.pops).unwrap_or(0))
}

#[wasm_bindgen]
pub fn get_specials_popped() -> u32 {
    with_game(|g| g.snapshot().map(|s| s.specials).unwrap_or(0))
}

#[wasm_bindgen]
pub fn get_grade() -> u8 {
    with_game(|g| g.snapshot().map(|s| s.grade).unwrap_or(0))
}

#[wasm_bindgen]
pub fn get_time_remaining_ms() -> f64 {
    with_game(|g| g.time_remaining_ms() as f64)
}

#[wasm_bindgen]
pub fn is_playing() -> bool {
    with_game(|g| g.is_playing())
}

#[wasm_bindgen]
pub fn is_finished() -> bool {
    with_game(|g| g.is_finished())
}
