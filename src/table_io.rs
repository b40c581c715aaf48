use std::fs::File;
use std::path::Path;

use ndarray::prelude::*;

use super::RouteOptError;


/// Reads a headerless, comma-delimited table of numbers.  Rows are records and columns are
/// fields; every row must have the same number of fields.
pub fn read_numeric_table(path: &Path) -> Result<Array<f64, Ix2>, RouteOptError> {
    let table_err = |reason: String| RouteOptError::TableRead {
        path: path.display().to_string(),
        reason,
    };

    let file = File::open(path).map_err(|err| table_err(err.to_string()))?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .trim(csv::Trim::All)
        .from_reader(file);

    let mut values = vec![];
    let mut num_rows = 0;
    let mut num_cols = None;
    for result in reader.records() {
        let record = result.map_err(|err| table_err(err.to_string()))?;
        // tolerate trailing blank lines
        if record.len() == 1 && record[0].is_empty() {
            continue;
        }
        match num_cols {
            None => num_cols = Some(record.len()),
            Some(nc) if nc != record.len() => {
                return Err(RouteOptError::ShapeMismatch {
                    expected: (num_rows + 1, nc),
                    found: (num_rows + 1, record.len()),
                });
            }
            _ => (),
        }
        for field in record.iter() {
            let value: f64 = field.parse().map_err(|_| {
                table_err(format!("row {}: '{}' is not a number", num_rows, field))
            })?;
            values.push(value);
        }
        num_rows += 1;
    }

    let num_cols = num_cols.unwrap_or(0);
    Array::from_shape_vec((num_rows, num_cols), values)
        .map_err(|err| table_err(err.to_string()))
}


/// Reads the per-node probability table: one `(prob_in, prob_out)` row per node, row order
/// matching node ids.
pub fn read_node_probs(path: &Path) -> Result<Vec<(f64, f64)>, RouteOptError> {
    let table = read_numeric_table(path)?;
    if table.ncols() != 2 {
        return Err(RouteOptError::ShapeMismatch {
            expected: (table.nrows(), 2),
            found: table.dim(),
        });
    }
    Ok(table.outer_iter().map(|row| (row[0], row[1])).collect())
}
