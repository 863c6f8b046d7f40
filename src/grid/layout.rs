//! Static grid layout: free cells, forbidden cells and goals

use std::{fmt, path::Path, str::FromStr};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Kind of a single grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellKind {
    Free,
    Forbidden,
    Goal,
}

impl CellKind {
    /// Decode an integer cell code: 0 free, negative forbidden, positive goal
    pub fn from_code(code: i32) -> CellKind {
        match code {
            0 => CellKind::Free,
            c if c < 0 => CellKind::Forbidden,
            _ => CellKind::Goal,
        }
    }

    pub fn code(self) -> i32 {
        match self {
            CellKind::Free => 0,
            CellKind::Forbidden => -1,
            CellKind::Goal => 1,
        }
    }

    pub fn to_char(self) -> char {
        match self {
            CellKind::Free => '.',
            CellKind::Forbidden => '#',
            CellKind::Goal => 'G',
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CellKind::Free => "free",
            CellKind::Forbidden => "forbidden",
            CellKind::Goal => "goal",
        }
    }
}

/// A (row, col) coordinate on the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridPos {
    pub row: usize,
    pub col: usize,
}

impl GridPos {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    pub fn manhattan(self, other: GridPos) -> usize {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col)
    }
}

impl fmt::Display for GridPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

impl FromStr for GridPos {
    type Err = Error;

    /// Parse `row,col`
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::config(format!("invalid position '{s}' (expected 'row,col')"));
        let (row, col) = s.split_once(',').ok_or_else(invalid)?;
        let row = row.trim().parse().map_err(|_| invalid())?;
        let col = col.trim().parse().map_err(|_| invalid())?;
        Ok(GridPos { row, col })
    }
}

/// Immutable R x C grid layout
///
/// The free cells are cached at construction since every episode samples its
/// start state from them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<i32>>", into = "Vec<Vec<i32>>")]
pub struct GridLayout {
    rows: usize,
    cols: usize,
    cells: Vec<CellKind>,
    free_cells: Vec<GridPos>,
}

impl GridLayout {
    /// Build a layout from rows of integer cell codes
    ///
    /// # Errors
    ///
    /// Fails when the grid is empty, not rectangular, or has no free cell.
    pub fn from_codes<R: AsRef<[i32]>>(rows: &[R]) -> Result<Self> {
        let first = rows.first().ok_or(Error::EmptyLayout)?;
        let cols = first.as_ref().len();
        if cols == 0 {
            return Err(Error::EmptyLayout);
        }

        let mut cells = Vec::with_capacity(rows.len() * cols);
        for (row, codes) in rows.iter().enumerate() {
            let codes = codes.as_ref();
            if codes.len() != cols {
                return Err(Error::RaggedLayout {
                    row,
                    expected: cols,
                    got: codes.len(),
                });
            }
            cells.extend(codes.iter().map(|&code| CellKind::from_code(code)));
        }

        Self::from_cells(rows.len(), cols, cells)
    }

    fn from_cells(rows: usize, cols: usize, cells: Vec<CellKind>) -> Result<Self> {
        let free_cells: Vec<GridPos> = cells
            .iter()
            .enumerate()
            .filter(|(_, kind)| **kind == CellKind::Free)
            .map(|(i, _)| GridPos::new(i / cols, i % cols))
            .collect();
        if free_cells.is_empty() {
            return Err(Error::NoFreeCells);
        }
        Ok(Self {
            rows,
            cols,
            cells,
            free_cells,
        })
    }

    /// Read a text layout file (see [`FromStr`] for the format)
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| Error::Io {
            operation: format!("read layout file {}", path.display()),
            source,
        })?;
        text.parse()
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn contains(&self, pos: GridPos) -> bool {
        pos.row < self.rows && pos.col < self.cols
    }

    /// Cell kind at `pos`, or `None` outside the grid
    pub fn cell(&self, pos: GridPos) -> Option<CellKind> {
        self.contains(pos)
            .then(|| self.cells[pos.row * self.cols + pos.col])
    }

    pub fn is_free(&self, pos: GridPos) -> bool {
        self.cell(pos) == Some(CellKind::Free)
    }

    /// Free cells in row-major order
    pub fn free_cells(&self) -> &[GridPos] {
        &self.free_cells
    }

    pub fn goal_cells(&self) -> Vec<GridPos> {
        self.positions()
            .filter(|&pos| self.cell(pos) == Some(CellKind::Goal))
            .collect()
    }

    pub fn count(&self, kind: CellKind) -> usize {
        self.cells.iter().filter(|&&k| k == kind).count()
    }

    /// All positions in row-major order
    pub fn positions(&self) -> impl Iterator<Item = GridPos> + '_ {
        (0..self.rows).flat_map(move |row| (0..self.cols).map(move |col| GridPos::new(row, col)))
    }

    pub fn to_codes(&self) -> Vec<Vec<i32>> {
        self.cells
            .chunks(self.cols)
            .map(|row| row.iter().map(|kind| kind.code()).collect())
            .collect()
    }
}

impl TryFrom<Vec<Vec<i32>>> for GridLayout {
    type Error = Error;

    fn try_from(rows: Vec<Vec<i32>>) -> Result<Self> {
        GridLayout::from_codes(&rows)
    }
}

impl From<GridLayout> for Vec<Vec<i32>> {
    fn from(layout: GridLayout) -> Self {
        layout.to_codes()
    }
}

impl FromStr for GridLayout {
    type Err = Error;

    /// One row per line of whitespace-separated integer codes.
    /// Blank lines and `#` comments are skipped.
    fn from_str(s: &str) -> Result<Self> {
        let mut rows = Vec::new();
        for (idx, line) in s.lines().enumerate() {
            let content = line.split('#').next().unwrap_or("").trim();
            if content.is_empty() {
                continue;
            }
            let row = content
                .split_whitespace()
                .map(|token| {
                    token.parse::<i32>().map_err(|_| Error::InvalidCellToken {
                        token: token.to_string(),
                        line: idx + 1,
                    })
                })
                .collect::<Result<Vec<i32>>>()?;
            rows.push(row);
        }
        GridLayout::from_codes(&rows)
    }
}

impl fmt::Display for GridLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, row) in self.cells.chunks(self.cols).enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            let line: Vec<String> = row.iter().map(|kind| kind.to_char().to_string()).collect();
            write!(f, "{}", line.join(" "))?;
        }
        Ok(())
    }
}

/// Layouts shipped with the crate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuiltinLayout {
    /// 10x10 maze with two vertical walls, goal in the bottom-right corner
    #[default]
    Walls,
    /// Open 3x3 grid, goal at (2, 2)
    #[value(name = "open3x3")]
    Open3x3,
    /// Single row of five cells, goal at the right end
    Corridor,
}

const WALLS: [[i32; 10]; 10] = [
    [0, 0, 0, 0, 0, 0, 0, 0, 0, 0],
    [0, 0, 0, -1, -1, -1, -1, 0, 0, 0],
    [0, 0, 0, -1, 0, 0, 0, 0, 0, 0],
    [0, 0, 0, -1, 0, 0, -1, -1, 0, 0],
    [0, 0, 0, -1, 0, 0, -1, 0, 0, 0],
    [0, 0, 0, -1, 0, 0, -1, 0, 0, 0],
    [0, 0, 0, -1, 0, 0, -1, 0, 0, 0],
    [0, 0, 0, -1, 0, 0, -1, 0, 0, 0],
    [0, 0, 0, -1, 0, 0, -1, 0, 0, 0],
    [0, 0, 0, 0, 0, 0, 0, 0, 0, 1],
];

const OPEN_3X3: [[i32; 3]; 3] = [[0, 0, 0], [0, 0, 0], [0, 0, 1]];

const CORRIDOR: [[i32; 5]; 1] = [[0, 0, 0, 0, 1]];

impl BuiltinLayout {
    pub fn name(self) -> &'static str {
        match self {
            BuiltinLayout::Walls => "walls",
            BuiltinLayout::Open3x3 => "open3x3",
            BuiltinLayout::Corridor => "corridor",
        }
    }

    pub fn layout(self) -> GridLayout {
        let built = match self {
            BuiltinLayout::Walls => GridLayout::from_codes(&WALLS),
            BuiltinLayout::Open3x3 => GridLayout::from_codes(&OPEN_3X3),
            BuiltinLayout::Corridor => GridLayout::from_codes(&CORRIDOR),
        };
        // The constant tables above are valid layouts.
        match built {
            Ok(layout) => layout,
            Err(err) => unreachable!("builtin layout {self:?} is invalid: {err}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_codes() {
        assert_eq!(CellKind::from_code(0), CellKind::Free);
        assert_eq!(CellKind::from_code(-1), CellKind::Forbidden);
        assert_eq!(CellKind::from_code(-7), CellKind::Forbidden);
        assert_eq!(CellKind::from_code(1), CellKind::Goal);
        assert_eq!(CellKind::from_code(3), CellKind::Goal);
    }

    #[test]
    fn test_from_codes_caches_free_cells() {
        let layout = GridLayout::from_codes(&[[0, -1], [0, 1]]).unwrap();
        assert_eq!(layout.rows(), 2);
        assert_eq!(layout.cols(), 2);
        assert_eq!(
            layout.free_cells(),
            &[GridPos::new(0, 0), GridPos::new(1, 0)]
        );
        assert_eq!(layout.goal_cells(), vec![GridPos::new(1, 1)]);
        assert_eq!(layout.cell(GridPos::new(0, 1)), Some(CellKind::Forbidden));
        assert_eq!(layout.cell(GridPos::new(2, 0)), None);
    }

    #[test]
    fn test_rejects_layout_without_free_cells() {
        let err = GridLayout::from_codes(&[[-1, 1]]).unwrap_err();
        assert!(matches!(err, Error::NoFreeCells));
    }

    #[test]
    fn test_rejects_ragged_and_empty_layouts() {
        let rows = vec![vec![0, 0, 0], vec![0, 1]];
        let err = GridLayout::from_codes(&rows).unwrap_err();
        assert!(matches!(
            err,
            Error::RaggedLayout {
                row: 1,
                expected: 3,
                got: 2
            }
        ));

        let empty: Vec<Vec<i32>> = Vec::new();
        assert!(matches!(
            GridLayout::from_codes(&empty),
            Err(Error::EmptyLayout)
        ));
    }

    #[test]
    fn test_parse_text_layout() {
        let text = "# corridor\n0 0 -1\n\n0 0 1  # goal\n";
        let layout: GridLayout = text.parse().unwrap();
        assert_eq!(layout.to_codes(), vec![vec![0, 0, -1], vec![0, 0, 1]]);
        assert_eq!(layout.to_string(), ". . #\n. . G");
    }

    #[test]
    fn test_parse_reports_bad_token_line() {
        let err = "0 0\n0 x\n".parse::<GridLayout>().unwrap_err();
        assert!(matches!(err, Error::InvalidCellToken { line: 2, .. }));
    }

    #[test]
    fn test_serde_round_trips_through_codes() {
        let layout = BuiltinLayout::Open3x3.layout();
        let json = serde_json::to_string(&layout).unwrap();
        assert_eq!(json, "[[0,0,0],[0,0,0],[0,0,1]]");
        let back: GridLayout = serde_json::from_str(&json).unwrap();
        assert_eq!(back, layout);

        assert!(serde_json::from_str::<GridLayout>("[[-1]]").is_err());
    }

    #[test]
    fn test_builtin_layouts() {
        let walls = BuiltinLayout::Walls.layout();
        assert_eq!((walls.rows(), walls.cols()), (10, 10));
        assert_eq!(walls.count(CellKind::Goal), 1);
        assert_eq!(walls.count(CellKind::Forbidden), 18);
        assert_eq!(walls.goal_cells(), vec![GridPos::new(9, 9)]);

        let corridor = BuiltinLayout::Corridor.layout();
        assert_eq!(corridor.free_cells().len(), 4);
    }

    #[test]
    fn test_parse_grid_pos() {
        assert_eq!("2, 3".parse::<GridPos>().unwrap(), GridPos::new(2, 3));
        assert!("2;3".parse::<GridPos>().is_err());
        assert!("a,3".parse::<GridPos>().is_err());
        assert_eq!(GridPos::new(0, 0).manhattan(GridPos::new(2, 2)), 4);
    }
}
