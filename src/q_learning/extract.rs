//! Greedy policy and state values derived from a trained Q-table
//!
//! Only free cells get an entry. Forbidden and goal cells are `None`; dense
//! exports render them as an empty label and a 0.0 value.

use std::fmt;

use serde::Serialize;

use super::q_table::QTable;
use crate::grid::{Action, CellKind, GridLayout, GridPos};

/// Greedy action per free cell
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicyMap {
    rows: usize,
    cols: usize,
    cells: Vec<Option<Action>>,
    #[serde(skip)]
    kinds: Vec<CellKind>,
}

/// Mean action value per free cell
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateValueMap {
    rows: usize,
    cols: usize,
    values: Vec<Option<f64>>,
    #[serde(skip)]
    kinds: Vec<CellKind>,
}

fn cell_kinds(layout: &GridLayout) -> Vec<CellKind> {
    layout
        .positions()
        .map(|pos| layout.cell(pos).unwrap_or(CellKind::Forbidden))
        .collect()
}

/// Greedy action for every free cell, using the table's first-max tie-break
pub fn extract_policy(table: &QTable, layout: &GridLayout) -> PolicyMap {
    let cells = layout
        .positions()
        .map(|pos| layout.is_free(pos).then(|| table.greedy_action(pos)))
        .collect();
    PolicyMap {
        rows: layout.rows(),
        cols: layout.cols(),
        cells,
        kinds: cell_kinds(layout),
    }
}

/// Arithmetic mean of the four action values for every free cell
///
/// This is an average-value diagnostic, not the optimal state value (which
/// would take the maximum).
pub fn extract_state_values(table: &QTable, layout: &GridLayout) -> StateValueMap {
    let values = layout
        .positions()
        .map(|pos| layout.is_free(pos).then(|| table.mean_q(pos)))
        .collect();
    StateValueMap {
        rows: layout.rows(),
        cols: layout.cols(),
        values,
        kinds: cell_kinds(layout),
    }
}

impl PolicyMap {
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Greedy action at `pos`, `None` for non-free or out-of-grid cells
    pub fn get(&self, pos: GridPos) -> Option<Action> {
        if pos.row >= self.rows || pos.col >= self.cols {
            return None;
        }
        self.cells[pos.row * self.cols + pos.col]
    }

    /// Row-major labels, empty for non-free cells
    pub fn labels(&self) -> Vec<Vec<&'static str>> {
        self.cells
            .chunks(self.cols)
            .map(|row| row.iter().map(|a| a.map_or("", Action::label)).collect())
            .collect()
    }
}

impl StateValueMap {
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Mean value at `pos`, `None` for non-free or out-of-grid cells
    pub fn get(&self, pos: GridPos) -> Option<f64> {
        if pos.row >= self.rows || pos.col >= self.cols {
            return None;
        }
        self.values[pos.row * self.cols + pos.col]
    }

    /// Row-major dense values with 0.0 for non-free cells
    pub fn to_dense(&self) -> Vec<Vec<f64>> {
        self.values
            .chunks(self.cols)
            .map(|row| row.iter().map(|v| v.unwrap_or(0.0)).collect())
            .collect()
    }

    /// (min, max) over free cells
    pub fn range(&self) -> Option<(f64, f64)> {
        self.values.iter().flatten().fold(None, |acc, &v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
    }
}

impl fmt::Display for PolicyMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (row, kinds)) in self
            .cells
            .chunks(self.cols)
            .zip(self.kinds.chunks(self.cols))
            .enumerate()
        {
            if i > 0 {
                writeln!(f)?;
            }
            let glyphs: Vec<String> = row
                .iter()
                .zip(kinds)
                .map(|(action, kind)| match action {
                    Some(action) => action.arrow().to_string(),
                    None => kind.to_char().to_string(),
                })
                .collect();
            write!(f, "{}", glyphs.join(" "))?;
        }
        Ok(())
    }
}

impl fmt::Display for StateValueMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (row, kinds)) in self
            .values
            .chunks(self.cols)
            .zip(self.kinds.chunks(self.cols))
            .enumerate()
        {
            if i > 0 {
                writeln!(f)?;
            }
            let cells: Vec<String> = row
                .iter()
                .zip(kinds)
                .map(|(value, kind)| match value {
                    Some(v) => format!("{v:>6.2}"),
                    None => format!("{:>6}", kind.to_char()),
                })
                .collect();
            write!(f, "{}", cells.join(" "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::BuiltinLayout;

    #[test]
    fn test_zero_table_gives_zero_values_and_up_policy() {
        let layout = GridLayout::from_codes(&[[0, -1, 0], [0, 0, 1]]).unwrap();
        let table = QTable::zeros(2, 3);

        let values = extract_state_values(&table, &layout);
        let policy = extract_policy(&table, &layout);

        for pos in layout.positions() {
            if layout.is_free(pos) {
                assert_eq!(values.get(pos), Some(0.0));
                assert_eq!(policy.get(pos), Some(Action::Up));
            } else {
                assert_eq!(values.get(pos), None);
                assert_eq!(policy.get(pos), None);
            }
        }
        assert_eq!(values.to_dense(), vec![vec![0.0; 3]; 2]);
        assert_eq!(policy.labels()[0], vec!["up", "", "up"]);
    }

    #[test]
    fn test_state_value_is_mean_not_max() {
        let layout = BuiltinLayout::Corridor.layout();
        let mut table = QTable::zeros(1, 5);
        let s = GridPos::new(0, 0);
        table.set(s, Action::Up, -1.0);
        table.set(s, Action::Down, -1.0);
        table.set(s, Action::Left, 0.0);
        table.set(s, Action::Right, 2.0);

        let values = extract_state_values(&table, &layout);
        assert_eq!(values.get(s), Some(0.0));
        assert_eq!(extract_policy(&table, &layout).get(s), Some(Action::Right));
    }

    #[test]
    fn test_display_marks_blocked_cells() {
        let layout = GridLayout::from_codes(&[[0, -1, 1]]).unwrap();
        let mut table = QTable::zeros(1, 3);
        table.set(GridPos::new(0, 0), Action::Down, 1.0);

        let policy = extract_policy(&table, &layout);
        assert_eq!(policy.to_string(), "↓ # G");

        let values = extract_state_values(&table, &layout);
        assert_eq!(values.to_string(), "  0.25      #      G");
        assert_eq!(values.range(), Some((0.25, 0.25)));
    }

    #[test]
    fn test_out_of_grid_lookup_is_none() {
        let layout = BuiltinLayout::Open3x3.layout();
        let table = QTable::zeros(3, 3);
        assert_eq!(extract_policy(&table, &layout).get(GridPos::new(3, 0)), None);
        assert_eq!(
            extract_state_values(&table, &layout).get(GridPos::new(0, 9)),
            None
        );
    }
}
