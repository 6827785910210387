use crate::data::RecordTable;
use crate::error::{Error, Result};
use crate::ir::{ChartRequest, FacetAxis, Grouping, ResolvedRequest};
use std::collections::HashSet;

/// Largest accepted histogram bin count per axis
pub const MAX_BINS: usize = 1000;
/// Largest accepted number of contour bands
pub const MAX_LEVELS: usize = 100;

/// Check a request against a table and work out facet levels
pub fn resolve_request(request: &ChartRequest, table: &RecordTable) -> Result<ResolvedRequest> {
    check_counts(request)?;

    // 1. Positional columns (required)
    let x_idx = table.column_index(&request.x)?;
    let y_idx = table.column_index(&request.y)?;

    // 2. Grouping axes
    let grouping = Grouping {
        row: resolve_axis(table, request.row.as_deref(), request.row_levels.as_deref())?,
        col: resolve_axis(table, request.col.as_deref(), request.col_levels.as_deref())?,
    };

    // 3. Color groups
    let color = resolve_axis(table, request.color.as_deref(), None)?;

    Ok(ResolvedRequest {
        request: request.clone(),
        x_idx,
        y_idx,
        color,
        grouping,
    })
}

fn check_counts(request: &ChartRequest) -> Result<()> {
    let checks = [("bins", request.bins, MAX_BINS), ("levels", request.levels, MAX_LEVELS)];
    for (name, value, max) in checks {
        if let Some(n) = value {
            if n == 0 || n > max {
                return Err(Error::InvalidRequest(format!(
                    "{name} must be between 1 and {max} (got {n})"
                )));
            }
        }
    }
    Ok(())
}

fn resolve_axis(
    table: &RecordTable,
    column: Option<&str>,
    declared: Option<&[String]>,
) -> Result<Option<FacetAxis>> {
    let Some(column) = column else {
        return Ok(None);
    };
    let index = table.column_index(column)?;

    let levels = match declared {
        Some(declared) => {
            let mut seen = HashSet::new();
            let levels: Vec<String> =
                declared.iter().filter(|l| seen.insert(l.as_str())).cloned().collect();
            if levels.is_empty() {
                return Err(Error::InvalidRequest(format!(
                    "empty level list for '{column}'"
                )));
            }
            levels
        }
        None => first_seen_levels(table, index),
    };

    Ok(Some(FacetAxis {
        column: table.headers()[index].clone(),
        index,
        levels,
    }))
}

/// Distinct non-missing values of a column, in order of first appearance
pub fn first_seen_levels(table: &RecordTable, index: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut levels = Vec::new();
    for row in 0..table.len() {
        if let Some(key) = table.value(row, index).category_key() {
            if seen.insert(key.clone()) {
                levels.push(key);
            }
        }
    }
    levels
}
