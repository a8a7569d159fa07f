// Reading surveys from CSV files.

use std::io::Read;

use csv::{Reader, ReaderBuilder};

use crate::digest::*;

pub fn read_csv_matrix(path: &str) -> DigestResult<CellMatrix> {
    let rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .context(CsvOpenSnafu { path })?;
    let matrix = read_records(rdr)?;
    debug!(
        "read_csv_matrix: {:?}: {:?} rows",
        simplify_file_name(path),
        matrix.num_rows()
    );
    Ok(matrix)
}

/// Every record is a row of the sheet, the first one included. Empty fields are absent cells.
fn read_records<R: Read>(rdr: Reader<R>) -> DigestResult<CellMatrix> {
    let mut rows: Vec<Vec<Cell>> = Vec::new();
    for (idx, record) in rdr.into_records().enumerate() {
        let record = record.context(CsvLineParseSnafu { lineno: idx + 1 })?;
        let row: Vec<Cell> = record
            .iter()
            .map(|field| {
                if field.is_empty() {
                    Cell::Absent
                } else {
                    Cell::from(field)
                }
            })
            .collect();
        rows.push(row);
    }
    Ok(CellMatrix::new(rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str) -> CellMatrix {
        let rdr = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(content.as_bytes());
        read_records(rdr).unwrap()
    }

    #[test]
    fn header_row_is_data() {
        let m = parse(",U1,U2\nWhy?,because,\n");
        assert_eq!(m.num_rows(), 2);
        assert_eq!(m.get(0, 0), &Cell::Absent);
        assert_eq!(m.content(0, 1), Some("U1".to_string()));
        assert_eq!(m.get(1, 2), &Cell::Absent);
    }

    #[test]
    fn ragged_rows() {
        let m = parse("id,Q1,Q2,Q3\nalice,a\nbob,b,c,d\n");
        assert_eq!(m.rows()[1].len(), 2);
        assert_eq!(m.content(1, 3), None);
        assert_eq!(m.content(2, 3), Some("d".to_string()));
    }

    #[test]
    fn quoted_line_breaks() {
        let m = parse("id,Q1\nalice,\"two\nlines\"\n");
        let qs = normalize(&m, LayoutKind::RowsAreUsers).unwrap();
        assert_eq!(serialize(&qs), "--- Q1: Q1 ---\n[alice] two\nlines\n\n");
    }

    #[test]
    fn missing_file() {
        assert!(matches!(
            read_csv_matrix("/this/file/does/not/exist.csv"),
            Err(DigestError::CsvOpen { .. })
        ));
    }
}
