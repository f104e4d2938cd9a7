use crate::components::{Config, GameMode, Palette, PieceKind, PieceType, Position, EMPTY};
use crate::events::{Event, EventSink};
use crate::grid::Grid;
use crate::rng::Rng;
use crate::special;

/// A live piece: stable identity plus the mutable state a presentation
/// layer needs to animate and gate input on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Piece {
    pub id: u32,
    pub position: Position,
    pub piece_type: PieceType,
    pub locked: bool,
    pub paused: bool,
}

/// Owns the authoritative grid and the live piece objects. Every non-empty
/// cell has exactly one corresponding entry in `pieces`, indexed the same
/// way as the grid.
#[derive(Debug)]
pub struct Board {
    grid: Grid,
    palette: Palette,
    pieces: Vec<Option<Piece>>,
    free_ids: Vec<u32>,
    next_id: u32,
}

impl Board {
    /// Allocates a grid via `Grid::create` and one piece per non-empty cell.
    pub fn setup(config: &Config, rng: &mut Rng) -> Self {
        let palette = Palette::for_mode(config.mode);
        let grid = Grid::create(config.rows, config.columns, &palette.common_types(), rng);
        let mut pieces = vec![None; config.rows * config.columns];
        let mut next_id = 0u32;
        for r in 0..config.rows {
            for c in 0..config.columns {
                let pos = Position::new(r, c);
                let t = grid.get(pos);
                if t != EMPTY {
                    let i = r * config.columns + c;
                    pieces[i] = Some(Piece {
                        id: next_id,
                        position: pos,
                        piece_type: t,
                        locked: false,
                        paused: false,
                    });
                    next_id += 1;
                }
            }
        }
        Board {
            grid,
            palette,
            pieces,
            free_ids: Vec::new(),
            next_id,
        }
    }

    /// Returns every piece to the pool and clears the grid, keeping
    /// dimensions and palette.
    pub fn reset(&mut self) {
        self.grid.clear();
        self.pieces.iter_mut().for_each(|p| *p = None);
        self.free_ids.clear();
        self.next_id = 0;
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    #[inline]
    fn idx(&self, pos: Position) -> usize {
        pos.row * self.grid.cols() + pos.col
    }

    pub fn get_piece_by_position(&self, pos: Position) -> Option<&Piece> {
        if !self.grid.in_bounds(pos) {
            return None;
        }
        self.pieces[self.idx(pos)].as_ref()
    }

    fn get_piece_mut(&mut self, pos: Position) -> Option<&mut Piece> {
        if !self.grid.in_bounds(pos) {
            return None;
        }
        let i = self.idx(pos);
        self.pieces[i].as_mut()
    }

    pub fn get_type_by_position(&self, pos: Position) -> PieceType {
        self.grid.get(pos)
    }

    pub fn is_special(&self, pos: Position) -> bool {
        matches!(self.palette.kind_of(self.grid.get(pos)), Some(PieceKind::Special(_)))
    }

    pub fn lock(&mut self, pos: Position) {
        if let Some(p) = self.get_piece_mut(pos) {
            p.locked = true;
        }
    }

    pub fn unlock(&mut self, pos: Position) {
        if let Some(p) = self.get_piece_mut(pos) {
            p.locked = false;
        }
    }

    /// Forwards to every live piece; consulted by a presentation layer to
    /// freeze tweens in step with the cascade queue.
    pub fn pause(&mut self) {
        self.pieces.iter_mut().flatten().for_each(|p| p.paused = true);
    }

    pub fn resume(&mut self) {
        self.pieces.iter_mut().flatten().for_each(|p| p.paused = false);
    }

    fn acquire_id(&mut self) -> u32 {
        self.free_ids.pop().unwrap_or_else(|| {
            let id = self.next_id;
            self.next_id += 1;
            id
        })
    }

    fn clear_cell(&mut self, pos: Position) {
        let i = self.idx(pos);
        if let Some(p) = self.pieces[i].take() {
            self.free_ids.push(p.id);
        }
        self.grid.set(pos, EMPTY);
    }

    /// Exchanges the pieces (and grid cells) at `a` and `b`, keeping piece
    /// coordinates in sync with the grid.
    pub fn swap(&mut self, a: Position, b: Position) {
        self.grid.swap(a, b);
        let ia = self.idx(a);
        let ib = self.idx(b);
        self.pieces.swap(ia, ib);
        if let Some(p) = self.pieces[ia].as_mut() {
            p.position = a;
        }
        if let Some(p) = self.pieces[ib].as_mut() {
            p.position = b;
        }
    }

    /// Overwrites the cell with `piece_type`, retiring any previous
    /// occupant, and returns the id of the newly created piece.
    pub fn spawn_piece(&mut self, pos: Position, piece_type: PieceType) -> u32 {
        self.clear_cell(pos);
        let id = self.acquire_id();
        let i = self.idx(pos);
        self.pieces[i] = Some(Piece {
            id,
            position: pos,
            piece_type,
            locked: false,
            paused: false,
        });
        self.grid.set(pos, piece_type);
        id
    }

    /// If the piece is special, recursively triggers its effect before the
    /// piece itself is cleared — so a trigger's own radius never bounces
    /// back onto the triggering cell. Pops already-empty cells are a no-op.
    pub fn pop_piece(&mut self, pos: Position, caused_by_special: bool, combo: u32, events: &mut EventSink) {
        if !self.grid.in_bounds(pos) {
            log::warn!("pop_piece: {pos:?} out of bounds");
            return;
        }
        let t = self.grid.get(pos);
        if t == EMPTY {
            return;
        }
        let kind = self.palette.kind_of(t);
        let is_special = matches!(kind, Some(PieceKind::Special(_)));
        let special_kind = match kind {
            Some(PieceKind::Special(sk)) => Some(sk),
            _ => None,
        };
        let targets = special_kind.map(|sk| special::trigger_positions(sk, pos, &self.grid, &self.palette));

        self.clear_cell(pos);
        events.push(Event::Pop {
            piece_type: t,
            position: pos,
            combo,
            is_special,
            caused_by_special,
        });

        if let Some(targets) = targets {
            for target in targets {
                if self.grid.get(target) != EMPTY {
                    self.pop_piece(target, true, combo, events);
                }
            }
        }
    }

    pub fn pop_pieces(&mut self, positions: &[Position], caused_by_special: bool, combo: u32, events: &mut EventSink) {
        for &pos in positions {
            if self.grid.get(pos) != EMPTY {
                self.pop_piece(pos, caused_by_special, combo, events);
            }
        }
    }

    /// Settles the grid and carries each moved piece's identity along with
    /// it, so `get_piece_by_position` stays correct after the fall.
    pub fn apply_gravity(&mut self) -> Vec<(Position, Position)> {
        let changes = self.grid.apply_gravity();
        for &(from, to) in &changes {
            let fi = self.idx(from);
            let ti = self.idx(to);
            if let Some(mut p) = self.pieces[fi].take() {
                p.position = to;
                self.pieces[ti] = Some(p);
            }
        }
        changes
    }

    /// Fills every empty cell and creates a piece for each, returning the
    /// filled positions in the same reverse row-major order `Grid::fill_up`
    /// does.
    pub fn fill_up(&mut self, commons: &[PieceType], rng: &mut Rng) -> Vec<Position> {
        let filled = self.grid.fill_up(commons, rng);
        for &pos in &filled {
            let t = self.grid.get(pos);
            let id = self.acquire_id();
            let i = self.idx(pos);
            self.pieces[i] = Some(Piece {
                id,
                position: pos,
                piece_type: t,
                locked: false,
                paused: false,
            });
        }
        filled
    }
}
