use crate::components::{PieceKind, Palette, PieceType, Position, SpecialKind, EMPTY};
use crate::grid::Grid;

/// One cascade-step's worth of matched runs, still available for handlers
/// that run later in `SpecialKind::ALL` order to consume.
pub type Matches = Vec<Vec<Position>>;

/// The result of a handler claiming one or more matches: the union of cells
/// to pop and the position the new special should spawn at.
pub struct Spawn {
    pub positions: Vec<Position>,
    pub spawn_at: Position,
    pub kind: SpecialKind,
}

/// Scans `matches` for every spawn pattern belonging to `kind`, removing
/// each match it claims and repeating until none remain. A single cascade
/// step can contain more than one qualifying pattern for the same handler
/// (e.g. two disjoint four-in-a-rows from one multi-match swap) — every one
/// of them spawns its special, not just the first. Call once per handler,
/// in `SpecialKind::ALL` order, on the same `matches` buffer — later
/// handlers only see what earlier ones left behind.
pub fn process(kind: SpecialKind, matches: &mut Matches) -> Vec<Spawn> {
    let claim: fn(&mut Matches) -> Option<Spawn> = match kind {
        SpecialKind::Row => |m| claim_line(m, SpecialKind::Row, true),
        SpecialKind::Column => |m| claim_line(m, SpecialKind::Column, false),
        SpecialKind::Colour => claim_colour,
        SpecialKind::Area => claim_area,
    };
    let mut spawns = Vec::new();
    while let Some(spawn) = claim(matches) {
        spawns.push(spawn);
    }
    spawns
}

fn claim_line(matches: &mut Matches, kind: SpecialKind, horizontal: bool) -> Option<Spawn> {
    let idx = matches.iter().position(|m| {
        if m.len() != 4 {
            return false;
        }
        if horizontal {
            m.iter().all(|p| p.row == m[0].row)
        } else {
            m.iter().all(|p| p.col == m[0].col)
        }
    })?;
    let m = matches.remove(idx);
    let spawn_at = m[m.len() / 2];
    Some(Spawn {
        positions: m,
        spawn_at,
        kind,
    })
}

fn claim_colour(matches: &mut Matches) -> Option<Spawn> {
    let idx = matches.iter().position(|m| m.len() >= 5)?;
    let m = matches.remove(idx);
    let spawn_at = m[m.len() / 2];
    Some(Spawn {
        positions: m,
        spawn_at,
        kind: SpecialKind::Colour,
    })
}

/// A position shared between two or more distinct matches of the current
/// step — an L, T or + shape. Picks the first such position found scanning
/// matches in order, then claims every match touching it.
fn claim_area(matches: &mut Matches) -> Option<Spawn> {
    let mut shared: Option<Position> = None;
    'outer: for i in 0..matches.len() {
        for p in &matches[i] {
            for m in matches.iter().skip(i + 1) {
                if m.contains(p) {
                    shared = Some(*p);
                    break 'outer;
                }
            }
        }
    }
    let shared = shared?;
    let mut positions = Vec::new();
    let mut i = 0;
    while i < matches.len() {
        if matches[i].contains(&shared) {
            let m = matches.remove(i);
            for p in m {
                if !positions.contains(&p) {
                    positions.push(p);
                }
            }
        } else {
            i += 1;
        }
    }
    Some(Spawn {
        positions,
        spawn_at: shared,
        kind: SpecialKind::Area,
    })
}

/// Positions a special at `pos` would pop when triggered, excluding `pos`
/// itself and any cell already empty. Pure: does not mutate `grid`.
pub fn trigger_positions(kind: SpecialKind, pos: Position, grid: &Grid, palette: &Palette) -> Vec<Position> {
    match kind {
        SpecialKind::Row => (0..grid.cols())
            .map(|c| Position::new(pos.row, c))
            .filter(|&p| p != pos && grid.get(p) != EMPTY)
            .collect(),
        SpecialKind::Column => (0..grid.rows())
            .map(|r| Position::new(r, pos.col))
            .filter(|&p| p != pos && grid.get(p) != EMPTY)
            .collect(),
        SpecialKind::Area => {
            let mut out = Vec::new();
            let row = pos.row as isize;
            let col = pos.col as isize;
            for dr in -1..=1 {
                for dc in -1..=1 {
                    let r = row + dr;
                    let c = col + dc;
                    if r < 0 || c < 0 {
                        continue;
                    }
                    let p = Position::new(r as usize, c as usize);
                    if p != pos && grid.in_bounds(p) && grid.get(p) != EMPTY {
                        out.push(p);
                    }
                }
            }
            out
        }
        SpecialKind::Colour => most_common_type(grid, palette)
            .map(|t| {
                let mut out = Vec::new();
                for r in 0..grid.rows() {
                    for c in 0..grid.cols() {
                        let p = Position::new(r, c);
                        if p != pos && grid.get(p) == t {
                            out.push(p);
                        }
                    }
                }
                out
            })
            .unwrap_or_default(),
    }
}

/// The common type with the most cells on the grid; ties resolved by
/// last-seen in row-major traversal.
fn most_common_type(grid: &Grid, palette: &Palette) -> Option<PieceType> {
    // (count, last-seen row-major index), per type.
    let mut seen: Vec<(PieceType, u32, usize)> = Vec::new();
    let mut seq = 0usize;
    for r in 0..grid.rows() {
        for c in 0..grid.cols() {
            let t = grid.get(Position::new(r, c));
            seq += 1;
            if !matches!(palette.kind_of(t), Some(PieceKind::Common(_))) {
                continue;
            }
            match seen.iter().position(|(ty, _, _)| *ty == t) {
                Some(i) => {
                    seen[i].1 += 1;
                    seen[i].2 = seq;
                }
                None => seen.push((t, 1, seq)),
            }
        }
    }
    seen.into_iter()
        .max_by_key(|(_, count, last_seen)| (*count, *last_seen))
        .map(|(t, _, _)| t)
}
