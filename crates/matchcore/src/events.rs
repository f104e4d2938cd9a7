use crate::components::{PieceType, Position};

/// Everything the engine emits, synchronously, at the point the underlying
/// state change commits. A presentation layer consumes these; the core
/// never stores them across frames — they are drained from the engine's
/// buffer once per `update(dt)` call, mirroring the teacher's
/// collect-then-drain-per-tick `sound_events`/`score_popups` buffers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Move {
        from: Position,
        to: Position,
        valid: bool,
    },
    Match {
        matches: Vec<Vec<Position>>,
        combo: u32,
    },
    Pop {
        piece_type: PieceType,
        position: Position,
        combo: u32,
        is_special: bool,
        caused_by_special: bool,
    },
    ProcessStart,
    ProcessComplete,
    TimesUp,
}

/// Append-only buffer of events raised since the last drain.
#[derive(Debug, Default)]
pub struct EventSink {
    events: Vec<Event>,
}

impl EventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: Event) {
        self.events.push(event);
    }

    /// Take every buffered event, leaving the sink empty.
    pub fn drain(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Every event pushed since `from`, without draining — lets a caller
    /// that just pushed a batch inspect what it produced.
    pub fn tail(&self, from: usize) -> &[Event] {
        &self.events[from..]
    }
}
