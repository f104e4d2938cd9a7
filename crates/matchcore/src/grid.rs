use crate::components::{Position, PieceType, EMPTY};
use crate::rng::Rng;

/// The board grid: a row-major matrix of piece types. `0` means empty.
/// Pure, side-effect-free operations over this type are the building blocks
/// everything else (board, actions, process) is composed from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    rows: usize,
    cols: usize,
    cells: Vec<PieceType>,
}

impl Grid {
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn in_bounds(&self, pos: Position) -> bool {
        pos.row < self.rows && pos.col < self.cols
    }

    #[inline]
    fn idx(&self, pos: Position) -> usize {
        pos.row * self.cols + pos.col
    }

    /// `EMPTY` for any out-of-bounds position, matching the engine-wide
    /// contract-error rule: a bad position is a silent no-op, never a panic.
    pub fn get(&self, pos: Position) -> PieceType {
        if !self.in_bounds(pos) {
            return EMPTY;
        }
        self.cells[self.idx(pos)]
    }

    pub fn set(&mut self, pos: Position, t: PieceType) {
        let i = self.idx(pos);
        self.cells[i] = t;
    }

    /// Exchange the types at two positions.
    pub fn swap(&mut self, a: Position, b: Position) {
        let ia = self.idx(a);
        let ib = self.idx(b);
        self.cells.swap(ia, ib);
    }

    /// Row-major fill with rejection sampling: a cell never completes a
    /// horizontal or vertical three-in-a-row with its two preceding
    /// neighbours. Terminates because `commons.len() >= 3`.
    pub fn create(rows: usize, cols: usize, commons: &[PieceType], rng: &mut Rng) -> Self {
        assert!(commons.len() >= 3, "need at least 3 common types to guarantee termination");
        let mut grid = Grid {
            rows,
            cols,
            cells: vec![EMPTY; rows * cols],
        };

        for r in 0..rows {
            for c in 0..cols {
                let mut forbidden: Vec<PieceType> = Vec::with_capacity(2);
                if c >= 2 && grid.get(Position::new(r, c - 1)) == grid.get(Position::new(r, c - 2)) {
                    forbidden.push(grid.get(Position::new(r, c - 1)));
                }
                if r >= 2 && grid.get(Position::new(r - 1, c)) == grid.get(Position::new(r - 2, c)) {
                    let t = grid.get(Position::new(r - 1, c));
                    if !forbidden.contains(&t) {
                        forbidden.push(t);
                    }
                }

                let choices: Vec<PieceType> = commons
                    .iter()
                    .copied()
                    .filter(|t| !forbidden.contains(t))
                    .collect();
                let pick = if choices.is_empty() {
                    // Unreachable given commons.len() >= 3 and at most 2 forbidden,
                    // but fall back to the full palette rather than panic.
                    commons[rng.next_int(commons.len() as u32) as usize]
                } else {
                    choices[rng.next_int(choices.len() as u32) as usize]
                };
                grid.set(Position::new(r, c), pick);
            }
        }

        grid
    }

    /// Enumerate maximal runs of `>= min_len` same-typed non-empty cells,
    /// horizontal sweep first then vertical, ascending within each
    /// orientation. If `filter` is given, only matches touching one of its
    /// positions are kept.
    pub fn get_matches(&self, filter: Option<&[Position]>, min_len: usize) -> Vec<Vec<Position>> {
        let mut matches = Vec::new();

        // Horizontal sweep: row by row.
        for r in 0..self.rows {
            let mut run_start = 0usize;
            let mut run_type = EMPTY;
            for c in 0..=self.cols {
                let t = if c < self.cols {
                    self.get(Position::new(r, c))
                } else {
                    EMPTY // sentinel to flush the final run
                };
                if c == 0 {
                    run_type = t;
                    run_start = 0;
                    continue;
                }
                if t != run_type {
                    let len = c - run_start;
                    if run_type != EMPTY && len >= min_len {
                        matches.push((run_start..c).map(|cc| Position::new(r, cc)).collect());
                    }
                    run_type = t;
                    run_start = c;
                }
            }
        }

        // Vertical sweep: column by column.
        for c in 0..self.cols {
            let mut run_start = 0usize;
            let mut run_type = EMPTY;
            for r in 0..=self.rows {
                let t = if r < self.rows {
                    self.get(Position::new(r, c))
                } else {
                    EMPTY
                };
                if r == 0 {
                    run_type = t;
                    run_start = 0;
                    continue;
                }
                if t != run_type {
                    let len = r - run_start;
                    if run_type != EMPTY && len >= min_len {
                        matches.push((run_start..r).map(|rr| Position::new(rr, c)).collect());
                    }
                    run_type = t;
                    run_start = r;
                }
            }
        }

        if let Some(filter) = filter {
            matches.retain(|m| m.iter().any(|p| filter.contains(p)));
        }

        matches
    }

    /// Rows settle bottom-up, columns left-to-right; each piece falls
    /// through every empty cell directly below it in one pass. Returns the
    /// `[from, to]` changes for animation.
    pub fn apply_gravity(&mut self) -> Vec<(Position, Position)> {
        let mut changes = Vec::new();
        for r in (0..self.rows).rev() {
            for c in 0..self.cols {
                let from = Position::new(r, c);
                if self.get(from) == EMPTY {
                    continue;
                }
                let mut rr = r;
                while rr + 1 < self.rows && self.get(Position::new(rr + 1, c)) == EMPTY {
                    self.swap(Position::new(rr, c), Position::new(rr + 1, c));
                    rr += 1;
                }
                if rr != r {
                    changes.push((from, Position::new(rr, c)));
                }
            }
        }
        changes
    }

    /// Resets every cell to empty, keeping dimensions.
    pub fn clear(&mut self) {
        self.cells.iter_mut().for_each(|c| *c = EMPTY);
    }

    /// All `0`-typed positions, row-major ascending.
    pub fn get_empty_positions(&self) -> Vec<Position> {
        let mut out = Vec::new();
        for r in 0..self.rows {
            for c in 0..self.cols {
                let p = Position::new(r, c);
                if self.get(p) == EMPTY {
                    out.push(p);
                }
            }
        }
        out
    }

    /// Builds a fresh temporary grid and copies its types into every empty
    /// cell of `self`. Returns the filled positions in reverse row-major
    /// order so a presentation layer can stack per-column fall animations.
    pub fn fill_up(&mut self, commons: &[PieceType], rng: &mut Rng) -> Vec<Position> {
        let empties = self.get_empty_positions();
        if empties.is_empty() {
            return Vec::new();
        }
        let temp = Grid::create(self.rows, self.cols, commons, rng);
        for &p in &empties {
            self.set(p, temp.get(p));
        }
        let mut filled = empties;
        filled.reverse();
        filled
    }
}
