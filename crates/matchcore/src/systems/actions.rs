use crate::components::Position;
use crate::events::{Event, EventSink};
use crate::presentation::Animator;
use crate::systems::board::Board;
use crate::systems::process::{register_pops_since, Process};
use crate::systems::stats::Stats;

/// Validates and executes a player-initiated swap. No-ops (no event, no
/// mutation) if the engine is not playing, either endpoint is empty, or
/// either endpoint is locked. Returns whether the move was accepted.
#[allow(clippy::too_many_arguments)]
pub fn action_move(
    from: Position,
    to: Position,
    is_playing: bool,
    free_moves: bool,
    board: &mut Board,
    process: &mut Process,
    stats: &mut Stats,
    events: &mut EventSink,
    animator: &mut dyn Animator,
) -> bool {
    if !is_playing {
        return false;
    }
    let (Some(from_piece), Some(to_piece)) = (board.get_piece_by_position(from), board.get_piece_by_position(to))
    else {
        return false;
    };
    if from_piece.locked || to_piece.locked {
        return false;
    }

    let either_special = board.is_special(from) || board.is_special(to);
    let valid = if either_special || free_moves {
        true
    } else {
        let mut clone = board.grid().clone();
        clone.swap(from, to);
        !clone.get_matches(Some(&[from, to]), 3).is_empty()
    };

    events.push(Event::Move { from, to, valid });

    board.lock(from);
    board.lock(to);
    if valid {
        board.swap(from, to);
        animator.animate_swap(from, to);
        board.unlock(from);
        board.unlock(to);

        // A special swapped in by rule 1 that isn't already part of a match
        // triggers itself immediately, before the cascade starts.
        for pos in [from, to] {
            if board.is_special(pos) && board.grid().get_matches(Some(&[pos]), 3).is_empty() {
                let before = events.len();
                board.pop_piece(pos, false, 0, events);
                register_pops_since(stats, events, before);
            }
        }
        process.start(events);
    } else {
        animator.animate_swap(to, from);
        board.unlock(from);
        board.unlock(to);
    }

    valid
}

/// Pops a special piece directly (taps never emit `onMove`) and starts the
/// cascade. No-op on a common piece, an empty cell, a locked piece, or
/// while not playing.
pub fn action_tap(
    position: Position,
    is_playing: bool,
    board: &mut Board,
    process: &mut Process,
    stats: &mut Stats,
    events: &mut EventSink,
) -> bool {
    if !is_playing {
        return false;
    }
    let Some(piece) = board.get_piece_by_position(position) else {
        return false;
    };
    if piece.locked || !board.is_special(position) {
        return false;
    }
    let before = events.len();
    board.pop_piece(position, false, 0, events);
    register_pops_since(stats, events, before);
    process.start(events);
    true
}
