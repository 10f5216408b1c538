use ndarray::{Array2, ArrayView2};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MatrixIoError {
    #[error("Failed to read or write matrix file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed tab-separated matrix: {0}")]
    Csv(#[from] csv::Error),
    #[error("Row {row}, column {col}: '{value}' is not a number")]
    Parse {
        row: usize,
        col: usize,
        value: String,
    },
    #[error("Row {row} has {found} columns, expected {expected}")]
    Ragged {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("Matrix file '{0}' contains no rows")]
    Empty(String),
    #[error("Could not assemble matrix: {0}")]
    Shape(#[from] ndarray::ShapeError),
}

/// Reads a header-less, tab-separated matrix of floats.
pub fn read_matrix(path: &Path) -> Result<Array2<f64>, MatrixIoError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .comment(Some(b'#'))
        .from_path(path)?;

    let mut values = Vec::new();
    let mut n_cols = None;
    let mut n_rows = 0;
    for (row, record) in reader.records().enumerate() {
        let record = record?;
        let expected = *n_cols.get_or_insert(record.len());
        if record.len() != expected {
            return Err(MatrixIoError::Ragged {
                row: row + 1,
                expected,
                found: record.len(),
            });
        }
        for (col, field) in record.iter().enumerate() {
            let value = field.trim().parse::<f64>().map_err(|_| MatrixIoError::Parse {
                row: row + 1,
                col: col + 1,
                value: field.to_string(),
            })?;
            values.push(value);
        }
        n_rows += 1;
    }

    let n_cols = n_cols.ok_or_else(|| MatrixIoError::Empty(path.display().to_string()))?;
    Ok(Array2::from_shape_vec((n_rows, n_cols), values)?)
}

/// Writes `matrix` as tab-separated rows using the shortest round-tripping
/// float representation.
pub fn write_matrix(path: &Path, matrix: ArrayView2<f64>) -> Result<(), MatrixIoError> {
    let mut out = BufWriter::new(File::create(path)?);
    let mut buffer = ryu::Buffer::new();
    for row in matrix.rows() {
        for (col, &value) in row.iter().enumerate() {
            if col > 0 {
                out.write_all(b"\t")?;
            }
            out.write_all(buffer.format(value).as_bytes())?;
        }
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn written_matrices_read_back_exactly() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.tsv");
        let matrix = array![[0.1, -2.5e-9, 3.0], [1.0 / 3.0, 0.0, -7.25]];
        write_matrix(&path, matrix.view()).unwrap();
        assert_eq!(read_matrix(&path).unwrap(), matrix);
    }

    #[test]
    fn ragged_rows_and_garbage_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let ragged = dir.path().join("ragged.tsv");
        std::fs::write(&ragged, "1\t2\n3\n").unwrap();
        assert!(matches!(
            read_matrix(&ragged),
            Err(MatrixIoError::Ragged { row: 2, expected: 2, found: 1 })
        ));

        let garbage = dir.path().join("garbage.tsv");
        std::fs::write(&garbage, "# comment\n1\tx\n").unwrap();
        assert!(matches!(
            read_matrix(&garbage),
            Err(MatrixIoError::Parse { row: 1, col: 2, .. })
        ));

        let empty = dir.path().join("empty.tsv");
        std::fs::write(&empty, "").unwrap();
        assert!(matches!(read_matrix(&empty), Err(MatrixIoError::Empty(_))));
    }
}
