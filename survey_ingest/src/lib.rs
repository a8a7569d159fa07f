mod config;
use log::{debug, info};
use snafu::ensure;

pub mod address;
pub mod analysis;
pub mod attempt;
pub mod builder;
pub mod manual;
pub mod request;
pub mod sanitize;
pub mod text;

pub use crate::analysis::*;
pub use crate::attempt::*;
pub use crate::config::*;
pub use crate::request::{build_request, AnalysisRequest, RequestError};
pub use crate::sanitize::{repair_diagram, sanitize, ResponseError};
pub use crate::text::serialize;

use crate::address::cell_address;
use crate::builder::QuestionSetBuilder;

/// Turns a sheet into its question set, following the declared layout.
///
/// Arguments:
/// * `matrix` the cells of the sheet. Row 0 is the header row.
/// * `layout` where the questions and the respondents are in the sheet.
///
/// Rows or columns that carry no question are skipped, as well as empty answers.
/// Only the structural defects abort the normalization:
/// * fewer than 2 rows: `EmptyInput`
/// * `RowsAreUsers` with a header of fewer than 2 columns: `MalformedHeader`
/// * no question at all: `NoQuestionsFound`
pub fn normalize(matrix: &CellMatrix, layout: LayoutKind) -> Result<QuestionSet, IngestionError> {
    info!(
        "Normalizing {:?} rows with layout {:?}",
        matrix.num_rows(),
        layout
    );
    ensure!(
        matrix.num_rows() >= 2,
        EmptyInputSnafu {
            rows: matrix.num_rows()
        }
    );

    let qs = match layout {
        LayoutKind::RowsAreQuestions => normalize_rows_are_questions(matrix),
        LayoutKind::RowsAreUsers => normalize_rows_are_users(matrix)?,
    };

    ensure!(!qs.is_empty(), NoQuestionsFoundSnafu { layout });
    info!(
        "normalize: {:?} questions, {:?} answers",
        qs.len(),
        qs.num_answers()
    );
    Ok(qs)
}

// Row 0: the user ids, starting at column B. Rows 1..N: one question per row.
fn normalize_rows_are_questions(matrix: &CellMatrix) -> QuestionSet {
    let mut builder = QuestionSetBuilder::new();
    for (row_idx, row) in matrix.rows().iter().enumerate().skip(1) {
        let ordinal = match matrix
            .content(row_idx, 0)
            .and_then(|question| builder.question(&question))
        {
            Some(ordinal) => ordinal,
            None => {
                debug!(
                    "normalize_rows_are_questions: row {:?}: no question, skipping",
                    row_idx
                );
                continue;
            }
        };
        for col_idx in 1..row.len() {
            if let Some(text) = matrix.content(row_idx, col_idx) {
                // Missing ids fall back to the address of the header cell itself.
                let user_id = matrix
                    .content(0, col_idx)
                    .unwrap_or_else(|| cell_address(0, col_idx));
                builder.answer(ordinal, &user_id, &text);
            }
        }
        debug!(
            "normalize_rows_are_questions: row {:?} -> Q{:?}",
            row_idx, ordinal
        );
    }
    builder.build()
}

// Row 0: the questions, starting at column B. Rows 1..N: one user per row, id in column A.
fn normalize_rows_are_users(matrix: &CellMatrix) -> Result<QuestionSet, IngestionError> {
    let header = &matrix.rows()[0];
    ensure!(
        header.len() >= 2,
        MalformedHeaderSnafu {
            columns: header.len()
        }
    );

    let mut builder = QuestionSetBuilder::new();
    // (column index, ordinal), in the left to right order of discovery.
    let mut question_columns: Vec<(usize, u32)> = Vec::new();
    for col_idx in 1..header.len() {
        if let Some(ordinal) = matrix
            .content(0, col_idx)
            .and_then(|question| builder.question(&question))
        {
            question_columns.push((col_idx, ordinal));
        }
    }
    debug!(
        "normalize_rows_are_users: question columns: {:?}",
        question_columns
    );

    for row_idx in 1..matrix.num_rows() {
        // Missing ids fall back to the address of the id cell of this row.
        let user_id = matrix
            .content(row_idx, 0)
            .unwrap_or_else(|| cell_address(row_idx, 0));
        let mut num_answers = 0;
        for (col_idx, ordinal) in question_columns.iter() {
            if let Some(text) = matrix.content(row_idx, *col_idx) {
                if builder.answer(*ordinal, &user_id, &text) {
                    num_answers += 1;
                }
            }
        }
        debug!(
            "normalize_rows_are_users: row {:?} user {:?}: {:?} answers",
            row_idx, user_id, num_answers
        );
    }
    Ok(builder.build())
}
