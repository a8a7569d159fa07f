// Reading surveys from Excel workbooks.

use calamine::{open_workbook, DataType, Range, Reader, Xlsx};

use crate::digest::*;

pub fn read_excel_matrix(path: &str, worksheet_name: Option<&str>) -> DigestResult<CellMatrix> {
    // The workbook is closed when the range is returned.
    let wrange = get_range(path, worksheet_name)?;
    debug!(
        "read_excel_matrix: {:?}: start {:?} end {:?}",
        simplify_file_name(path),
        wrange.start(),
        wrange.end()
    );
    Ok(range_to_matrix(&wrange))
}

fn get_range(path: &str, worksheet_name: Option<&str>) -> DigestResult<Range<DataType>> {
    debug!("get_range: path: {:?} worksheet: {:?}", path, worksheet_name);
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;

    match worksheet_name {
        Some(name) => workbook
            .worksheet_range(name)
            .context(MissingWorksheetSnafu { path, name })?
            .context(OpeningExcelSnafu { path }),
        // The first worksheet by default.
        None => workbook
            .worksheet_range_at(0)
            .context(EmptyExcelSnafu { path })?
            .context(OpeningExcelSnafu { path }),
    }
}

/// The cells of the range, placed at their position in the sheet.
///
/// A range that does not start at A1 is padded with absent cells, so that the
/// addresses of the matrix are those of the sheet.
pub fn range_to_matrix(range: &Range<DataType>) -> CellMatrix {
    let (row_start, col_start) = range.start().unwrap_or((0, 0));
    let mut rows: Vec<Vec<Cell>> = vec![Vec::new(); row_start as usize];
    for row in range.rows() {
        let mut cells: Vec<Cell> = vec![Cell::Absent; col_start as usize];
        cells.extend(row.iter().map(read_cell));
        rows.push(cells);
    }
    CellMatrix::new(rows)
}

fn read_cell(cell: &DataType) -> Cell {
    match cell {
        DataType::String(s) => Cell::Text(s.clone()),
        DataType::Float(f) => Cell::Number(*f),
        DataType::Int(i) => Cell::Number(*i as f64),
        // Dates are kept as their serial number.
        DataType::DateTime(f) => Cell::Number(*f),
        DataType::Bool(b) => Cell::Text(b.to_string()),
        DataType::Empty => Cell::Absent,
        DataType::Error(e) => {
            warn!("read_cell: cell with error {:?}, read as empty", e);
            Cell::Absent
        }
        #[allow(unreachable_patterns)]
        x => {
            warn!("read_cell: unsupported cell {:?}, read as empty", x);
            Cell::Absent
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sparse(cells: Vec<((u32, u32), DataType)>) -> Range<DataType> {
        Range::from_sparse(
            cells
                .into_iter()
                .map(|(pos, v)| calamine::Cell::new(pos, v))
                .collect(),
        )
    }

    #[test]
    fn cell_kinds() {
        assert_eq!(read_cell(&DataType::String("x".to_string())), Cell::from("x"));
        assert_eq!(read_cell(&DataType::Int(3)), Cell::Number(3.0));
        assert_eq!(read_cell(&DataType::Float(2.5)), Cell::Number(2.5));
        assert_eq!(read_cell(&DataType::Bool(true)), Cell::from("true"));
        assert_eq!(read_cell(&DataType::Empty), Cell::Absent);
        assert_eq!(
            read_cell(&DataType::Error(calamine::CellErrorType::NA)),
            Cell::Absent
        );
    }

    #[test]
    fn range_is_anchored_at_a1() {
        // B2:C3
        let range = sparse(vec![
            ((1, 2), DataType::String("U1".to_string())),
            ((2, 1), DataType::String("Why?".to_string())),
            ((2, 2), DataType::Int(42)),
        ]);
        let m = range_to_matrix(&range);
        assert_eq!(m.num_rows(), 3);
        assert_eq!(m.get(0, 0), &Cell::Absent);
        assert_eq!(m.content(1, 2), Some("U1".to_string()));
        assert_eq!(m.content(2, 1), Some("Why?".to_string()));
        assert_eq!(m.content(2, 2), Some("42".to_string()));
        assert_eq!(m.get(1, 1), &Cell::Absent);
    }

    #[test]
    fn range_to_question_set() {
        let range = sparse(vec![
            ((0, 1), DataType::String("U1".to_string())),
            ((0, 2), DataType::String("U2".to_string())),
            ((1, 0), DataType::String("Rating?".to_string())),
            ((1, 1), DataType::Float(4.0)),
            ((1, 2), DataType::String("good".to_string())),
        ]);
        let qs = normalize(&range_to_matrix(&range), LayoutKind::RowsAreQuestions).unwrap();
        assert_eq!(
            serialize(&qs),
            "--- Q1: Rating? ---\n[U1] 4\n[U2] good\n\n"
        );
    }

    #[test]
    fn missing_workbook() {
        assert!(matches!(
            read_excel_matrix("/this/file/does/not/exist.xlsx", None),
            Err(DigestError::OpeningExcel { .. })
        ));
    }
}
