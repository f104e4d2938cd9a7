use crate::error::ConfigError;

/// A cell coordinate, `(row, column)`. Rows grow downward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub const fn new(row: usize, col: usize) -> Self {
        Position { row, col }
    }
}

/// The identifier stored in every grid cell. `0` means empty.
pub type PieceType = u16;

pub const EMPTY: PieceType = 0;

/// The four special-piece strategies, always present in every mode and
/// processed in this fixed order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SpecialKind {
    Row = 0,
    Column = 1,
    Colour = 2,
    Area = 3,
}

impl SpecialKind {
    /// Registration order — also the order `Process` runs handlers in.
    pub const ALL: [SpecialKind; 4] = [
        SpecialKind::Row,
        SpecialKind::Column,
        SpecialKind::Colour,
        SpecialKind::Area,
    ];
}

/// What a non-empty piece type resolves to: a common colour, or one of the
/// four specials.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PieceKind {
    Common(u8),
    Special(SpecialKind),
}

/// Game mode selects the common-type palette size. All four specials are
/// always added after the commons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameMode {
    Test,
    Easy,
    Normal,
    Hard,
}

impl GameMode {
    pub const fn common_count(self) -> u8 {
        match self {
            GameMode::Test => 3,
            GameMode::Easy => 4,
            GameMode::Normal => 5,
            GameMode::Hard => 6,
        }
    }
}

impl Default for GameMode {
    fn default() -> Self {
        GameMode::Normal
    }
}

/// Maps piece types to their kind for the active mode. Commons are assigned
/// `1..=common_count`, specials follow immediately after in `SpecialKind::ALL`
/// order.
#[derive(Debug, Clone)]
pub struct Palette {
    common_count: u8,
    specials: [PieceType; 4],
}

impl Palette {
    pub fn for_mode(mode: GameMode) -> Self {
        let common_count = mode.common_count();
        let mut specials = [0; 4];
        for (i, s) in specials.iter_mut().enumerate() {
            *s = common_count as PieceType + 1 + i as PieceType;
        }
        Palette {
            common_count,
            specials,
        }
    }

    pub fn common_count(&self) -> u8 {
        self.common_count
    }

    /// Every common piece type (`1..=common_count`), for `Grid::create`/`fill_up`.
    pub fn common_types(&self) -> Vec<PieceType> {
        (1..=self.common_count as PieceType).collect()
    }

    pub fn special_type(&self, kind: SpecialKind) -> PieceType {
        self.specials[kind as usize]
    }

    pub fn kind_of(&self, t: PieceType) -> Option<PieceKind> {
        if t == EMPTY {
            return None;
        }
        if t <= self.common_count as PieceType {
            return Some(PieceKind::Common(t as u8));
        }
        SpecialKind::ALL
            .iter()
            .find(|k| self.specials[**k as usize] == t)
            .map(|k| PieceKind::Special(*k))
    }

    pub fn special_kind_of(&self, t: PieceType) -> Option<SpecialKind> {
        match self.kind_of(t) {
            Some(PieceKind::Special(k)) => Some(k),
            _ => None,
        }
    }
}

/// Session configuration. `mode` selects the common palette; specials are
/// always present.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Config {
    pub rows: usize,
    pub columns: usize,
    pub tile_size: u32,
    pub free_moves: bool,
    pub duration_seconds: i64,
    pub mode: GameMode,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            rows: 9,
            columns: 7,
            tile_size: 64,
            free_moves: false,
            duration_seconds: 60,
            mode: GameMode::Normal,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(4..=16).contains(&self.rows) {
            return Err(ConfigError::RowsOutOfRange(self.rows));
        }
        if !(4..=16).contains(&self.columns) {
            return Err(ConfigError::ColumnsOutOfRange(self.columns));
        }
        if self.duration_seconds <= 0 {
            return Err(ConfigError::DurationNotPositive(self.duration_seconds));
        }
        Ok(())
    }
}
