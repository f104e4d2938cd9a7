use std::collections::VecDeque;

use crate::components::{PieceType, Position, SpecialKind};
use crate::events::{Event, EventSink};
use crate::presentation::Animator;
use crate::rng::Rng;
use crate::special;
use crate::systems::board::Board;
use crate::systems::stats::Stats;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProcessStep {
    RegisterMatch,
    RunSpecial(SpecialKind),
    PopRemaining,
    GravityAndRefill,
    Checkpoint,
}

/// Applies `Stats::register_pop` for every `Event::Pop` pushed at or after
/// `from`, so scoring stays driven by what actually got popped rather than
/// duplicating that bookkeeping at each call site.
pub(crate) fn register_pops_since(stats: &mut Stats, events: &EventSink, from: usize) {
    for event in events.tail(from) {
        if let Event::Pop { caused_by_special, is_special, .. } = event {
            stats.register_pop(*caused_by_special, *is_special);
        }
    }
}

fn round_steps() -> [ProcessStep; 7] {
    [
        ProcessStep::RegisterMatch,
        ProcessStep::RunSpecial(SpecialKind::Row),
        ProcessStep::RunSpecial(SpecialKind::Column),
        ProcessStep::RunSpecial(SpecialKind::Colour),
        ProcessStep::RunSpecial(SpecialKind::Area),
        ProcessStep::PopRemaining,
        ProcessStep::GravityAndRefill,
    ]
}

/// The cascade engine: a pausable FIFO of steps that resolves specials,
/// pops matches, applies gravity, refills, and loops until the grid is
/// stable. `update` drains as many zero-duration steps as are ready in one
/// call; a step that reports a nonzero animation duration stalls the queue
/// until enough `update(dt)` time has passed.
#[derive(Debug, Default)]
pub struct Process {
    queue: VecDeque<ProcessStep>,
    paused: bool,
    running: bool,
    round: u32,
    pending_ms: i64,
    current_matches: Vec<Vec<Position>>,
}

impl Process {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Idempotent: a second call while already running does nothing.
    pub fn start(&mut self, events: &mut EventSink) {
        if self.running {
            return;
        }
        self.running = true;
        self.enqueue_round();
        events.push(Event::ProcessStart);
    }

    fn enqueue_round(&mut self) {
        self.queue.extend(round_steps());
        self.queue.push_back(ProcessStep::Checkpoint);
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn reset(&mut self) {
        self.queue.clear();
        self.paused = false;
        self.running = false;
        self.round = 0;
        self.pending_ms = 0;
        self.current_matches.clear();
    }

    /// Advances the queue by `delta_ms`, running every step that becomes
    /// ready within this call. Returns `true` if `on_process_complete`
    /// fired during this call.
    #[allow(clippy::too_many_arguments)]
    pub fn update(
        &mut self,
        delta_ms: i64,
        board: &mut Board,
        stats: &mut Stats,
        events: &mut EventSink,
        animator: &mut dyn Animator,
        commons: &[PieceType],
        rng: &mut Rng,
    ) -> bool {
        if self.paused || !self.running {
            return false;
        }
        if self.pending_ms > 0 {
            self.pending_ms -= delta_ms;
        }
        let mut completed = false;
        while self.pending_ms <= 0 {
            let Some(step) = self.queue.pop_front() else {
                break;
            };
            self.pending_ms = self.run_step(step, board, stats, events, animator, commons, rng) as i64;
            if !self.running {
                completed = true;
                break;
            }
        }
        completed
    }

    #[allow(clippy::too_many_arguments)]
    fn run_step(
        &mut self,
        step: ProcessStep,
        board: &mut Board,
        stats: &mut Stats,
        events: &mut EventSink,
        animator: &mut dyn Animator,
        commons: &[PieceType],
        rng: &mut Rng,
    ) -> u32 {
        match step {
            ProcessStep::RegisterMatch => {
                self.round += 1;
                let matches = board.grid().get_matches(None, 3);
                stats.register_match(&matches, self.round);
                events.push(Event::Match {
                    matches: matches.clone(),
                    combo: self.round,
                });
                self.current_matches = matches;
                0
            }
            ProcessStep::RunSpecial(kind) => {
                let spawns = special::process(kind, &mut self.current_matches);
                let mut wait_ms = 0u32;
                for spawn in spawns {
                    let special_type = board.palette().special_type(spawn.kind);
                    let before = events.len();
                    board.pop_pieces(&spawn.positions, false, self.round, events);
                    register_pops_since(stats, events, before);
                    board.spawn_piece(spawn.spawn_at, special_type);
                    let pop_ms = animator.animate_pop(&spawn.positions);
                    let spawn_ms = animator.animate_spawn(&[spawn.spawn_at]);
                    wait_ms = wait_ms.max(pop_ms.max(spawn_ms));
                }
                wait_ms
            }
            ProcessStep::PopRemaining => {
                let mut positions: Vec<Position> = self.current_matches.iter().flatten().copied().collect();
                positions.sort_by_key(|p| (p.row, p.col));
                positions.dedup();
                if positions.is_empty() {
                    return 0;
                }
                let before = events.len();
                board.pop_pieces(&positions, false, self.round, events);
                register_pops_since(stats, events, before);
                animator.animate_pop(&positions)
            }
            ProcessStep::GravityAndRefill => {
                let falls = board.apply_gravity();
                let fall_ms = animator.animate_fall(&falls);
                let filled = board.fill_up(commons, rng);
                let spawn_ms = if filled.is_empty() {
                    0
                } else {
                    animator.animate_spawn(&filled)
                };
                fall_ms.max(spawn_ms)
            }
            ProcessStep::Checkpoint => {
                let still_matches = !board.grid().get_matches(None, 3).is_empty();
                let still_empty = !board.grid().get_empty_positions().is_empty();
                if still_matches || still_empty {
                    self.enqueue_round();
                } else {
                    self.running = false;
                    events.push(Event::ProcessComplete);
                }
                0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Config, GameMode};
    use crate::presentation::NullAnimator;

    fn new_board() -> Board {
        let config = Config {
            rows: 5,
            columns: 5,
            mode: GameMode::Test,
            ..Config::default()
        };
        Board::setup(&config, &mut Rng::new(1))
    }

    #[test]
    fn start_is_idempotent_while_running() {
        let mut process = Process::new();
        let mut events = EventSink::new();
        process.start(&mut events);
        process.start(&mut events);
        let drained = events.drain();
        assert_eq!(drained.iter().filter(|e| **e == Event::ProcessStart).count(), 1);
    }

    #[test]
    fn runs_to_completion_with_null_animator_in_one_update() {
        let mut board = new_board();
        let mut stats = Stats::new();
        let mut events = EventSink::new();
        let mut animator = NullAnimator;
        let mut rng = Rng::new(2);
        let commons = board.palette().common_types();

        // Force a match by overwriting a row.
        board.spawn_piece(Position::new(0, 0), 1);
        board.spawn_piece(Position::new(0, 1), 1);
        board.spawn_piece(Position::new(0, 2), 1);

        let mut process = Process::new();
        process.start(&mut events);
        let completed = process.update(16, &mut board, &mut stats, &mut events, &mut animator, &commons, &mut rng);
        assert!(completed);
        assert!(board.grid().get_matches(None, 3).is_empty());
        assert!(board.grid().get_empty_positions().is_empty());
        // 3 pieces popped from the forced match, each scoring 1 (not caused
        // by a special), plus whatever further cascades contributed.
        assert!(stats.snapshot(1000).pops >= 3);
    }

    #[test]
    fn pause_stalls_the_queue_between_steps() {
        let mut board = new_board();
        let mut stats = Stats::new();
        let mut events = EventSink::new();
        let mut animator = NullAnimator;
        let mut rng = Rng::new(2);
        let commons = board.palette().common_types();

        board.spawn_piece(Position::new(0, 0), 1);
        board.spawn_piece(Position::new(0, 1), 1);
        board.spawn_piece(Position::new(0, 2), 1);

        let mut process = Process::new();
        process.start(&mut events);
        process.pause();
        let completed = process.update(16, &mut board, &mut stats, &mut events, &mut animator, &commons, &mut rng);
        assert!(!completed);
        assert!(process.is_running());
    }
}
