// ********* Input data structures ***********

use snafu::Snafu;

/// The content of one cell of a spreadsheet-like input.
///
/// Absence is distinct from an empty text: an absent cell was never filled,
/// while an empty text cell was filled with nothing. Both are skipped by the
/// normalizer, but readers should keep the distinction when they can.
#[derive(PartialEq, Debug, Clone)]
pub enum Cell {
    Text(String),
    Number(f64),
    Absent,
}

impl Cell {
    /// The display text of the cell, if it carries any content.
    ///
    /// Numbers are rendered the way a spreadsheet displays them (`3.0` becomes `3`).
    /// Text that is blank after trimming counts as no content, but non-blank text
    /// is returned verbatim.
    pub fn content(&self) -> Option<String> {
        match self {
            Cell::Text(s) if s.trim().is_empty() => None,
            Cell::Text(s) => Some(s.clone()),
            Cell::Number(n) if n.is_finite() => Some(format!("{}", n)),
            Cell::Number(_) => None,
            Cell::Absent => None,
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Cell {
        Cell::Text(s.to_string())
    }
}

impl From<f64> for Cell {
    fn from(n: f64) -> Cell {
        Cell::Number(n)
    }
}

static ABSENT: Cell = Cell::Absent;

/// The rows of a sheet, in order. Rows may have different lengths.
///
/// Row 0 is the header (or legend) row and is never read as an answer.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct CellMatrix {
    rows: Vec<Vec<Cell>>,
}

impl CellMatrix {
    pub fn new(rows: Vec<Vec<Cell>>) -> CellMatrix {
        CellMatrix { rows }
    }

    /// Builds a matrix of text cells. Empty strings become absent cells.
    pub fn from_text_rows(rows: &[&[&str]]) -> CellMatrix {
        CellMatrix {
            rows: rows
                .iter()
                .map(|row| {
                    row.iter()
                        .map(|s| if s.is_empty() { Cell::Absent } else { Cell::from(*s) })
                        .collect()
                })
                .collect(),
        }
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// The cell at the given position. Positions past the end of a jagged row are absent.
    pub fn get(&self, row: usize, col: usize) -> &Cell {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&ABSENT)
    }

    pub fn content(&self, row: usize, col: usize) -> Option<String> {
        self.get(row, col).content()
    }
}

/// How questions and respondents are laid out in the sheet.
///
/// The layout is always declared by the caller, it is never guessed from the content.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum LayoutKind {
    /// Row 0 holds the respondent identifiers (from column B), every following row is
    /// one question: column A has the question, the other columns the answers.
    RowsAreQuestions,
    /// Row 0 holds the questions (from column B), every following row is one
    /// respondent: column A has the identifier, the other columns the answers.
    RowsAreUsers,
}

// ******** Output data structures *********

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Answer {
    pub user_id: String,
    pub text: String,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct QuestionBlock {
    /// Starts at 1, in output order.
    pub ordinal: u32,
    pub question: String,
    pub answers: Vec<Answer>,
}

/// The canonical form of a survey: the questions in order, each with its answers.
///
/// Ordinals are contiguous and start at 1. A question with no answer is kept.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct QuestionSet {
    pub(crate) blocks: Vec<QuestionBlock>,
}

impl QuestionSet {
    pub fn blocks(&self) -> &[QuestionBlock] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn num_answers(&self) -> usize {
        self.blocks.iter().map(|b| b.answers.len()).sum()
    }
}

/// Structural defects of an input sheet. Retrying cannot fix them.
#[derive(Eq, PartialEq, Debug, Clone, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum IngestionError {
    #[snafu(display(
        "the sheet needs a header row and at least one data row, but it has {rows} row(s)"
    ))]
    EmptyInput { rows: usize },
    #[snafu(display("no question was found in the sheet (layout {layout:?})"))]
    NoQuestionsFound { layout: LayoutKind },
    #[snafu(display(
        "the first row must hold the questions starting from column B, but it has {columns} column(s)"
    ))]
    MalformedHeader { columns: usize },
}
