//! CSV export of the learned policy, state values and Q-values
//!
//! One row per grid cell, row-major. Non-free cells have an empty action and a
//! 0.0 value so plotting tools can read the file as a dense grid.

use std::{fs::File, io::Write, path::Path};

use serde::Serialize;

use crate::{
    Result,
    grid::{Action, GridLayout, GridPos},
    q_learning::{QTable, extract_policy, extract_state_values},
};

/// A single row in the grid CSV export
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridReportRecord {
    pub row: usize,
    pub col: usize,
    pub cell: &'static str,
    pub action: &'static str,
    pub value: f64,
    pub q_up: f64,
    pub q_down: f64,
    pub q_left: f64,
    pub q_right: f64,
}

/// Exporter for the per-cell grid report
pub struct GridReportExporter;

impl GridReportExporter {
    /// Build the records for every cell
    pub fn records(table: &QTable, layout: &GridLayout) -> Vec<GridReportRecord> {
        let policy = extract_policy(table, layout);
        let values = extract_state_values(table, layout);

        layout
            .positions()
            .map(|pos: GridPos| {
                let q = |action: Action| table.get(pos, action);
                GridReportRecord {
                    row: pos.row,
                    col: pos.col,
                    cell: layout.cell(pos).map_or("", |kind| kind.label()),
                    action: policy.get(pos).map_or("", Action::label),
                    value: values.get(pos).unwrap_or(0.0),
                    q_up: q(Action::Up),
                    q_down: q(Action::Down),
                    q_left: q(Action::Left),
                    q_right: q(Action::Right),
                }
            })
            .collect()
    }

    /// Write the report to any writer
    pub fn write<W: Write>(writer: W, table: &QTable, layout: &GridLayout) -> Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        for record in Self::records(table, layout) {
            csv_writer.serialize(record)?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    /// Write the report to a CSV file
    pub fn write_csv<P: AsRef<Path>>(path: P, table: &QTable, layout: &GridLayout) -> Result<()> {
        let file = File::create(path)?;
        Self::write(file, table, layout)
    }
}
