//! The canonical text of a survey.
//!
//! This is the interchange format with the analysis service, which is prompted to
//! expect exactly this shape:
//!
//! ```text
//! --- Q1: How satisfied are you? ---
//! [User 1] Very satisfied.
//! [B1] Not really.
//!
//! --- Q2: What should we add? ---
//! [User 1] Dark mode.
//!
//! ```
//!
//! Every question block opens with a header line `--- Q<ordinal>: <question> ---`,
//! has one `[<user id>] <answer>` line per answer, and ends with a blank line.
//! Cell text is written verbatim, line breaks included. A header is only recognized
//! at the start of a block, that is at the start of the text or after a blank line,
//! and it may span several lines up to the closing ` ---`.

use log::{debug, info};

use crate::config::*;

pub const HEADER_OPEN: &str = "--- Q";
pub const HEADER_CLOSE: &str = " ---";

/// Renders the question set in the canonical text format, blocks in ordinal order.
pub fn serialize(qs: &QuestionSet) -> String {
    let mut blocks: Vec<&QuestionBlock> = qs.blocks().iter().collect();
    blocks.sort_by_key(|b| b.ordinal);

    let mut res = String::new();
    for block in blocks {
        res.push_str(&question_header(block.ordinal, &block.question));
        res.push('\n');
        for answer in block.answers.iter() {
            res.push_str(&format!("[{}] {}\n", answer.user_id, answer.text));
        }
        res.push('\n');
        debug!(
            "serialize: Q{:?}: {:?} answers",
            block.ordinal,
            block.answers.len()
        );
    }
    info!("serialize: {:?} questions, {:?} bytes", qs.len(), res.len());
    res
}

/// The header of a question block, without the final line break.
pub fn question_header(ordinal: u32, question: &str) -> String {
    format!("{}{}: {}{}", HEADER_OPEN, ordinal, question, HEADER_CLOSE)
}

/// Finds the question blocks of a canonical text from its headers alone.
///
/// The text may have been edited by hand: lines that are not headers are ignored.
/// Only lines that start a block are read as headers.
pub fn question_headers(text: &str) -> Vec<(u32, String)> {
    let lines: Vec<&str> = text.lines().collect();
    let mut res: Vec<(u32, String)> = Vec::new();
    let mut idx = 0;
    let mut at_block_start = true;
    while idx < lines.len() {
        if lines[idx].trim().is_empty() {
            at_block_start = true;
            idx += 1;
            continue;
        }
        if at_block_start {
            if let Some((ordinal, question, num_lines)) = parse_header(&lines[idx..]) {
                res.push((ordinal, question));
                idx += num_lines;
                at_block_start = false;
                continue;
            }
        }
        at_block_start = false;
        idx += 1;
    }
    res
}

/// Reads a header from its first line up to the line that closes it.
///
/// Returns the ordinal, the question and the number of lines of the header.
fn parse_header(lines: &[&str]) -> Option<(u32, String, usize)> {
    let (num, _) = lines.first()?.strip_prefix(HEADER_OPEN)?.split_once(": ")?;
    let ordinal = num.parse::<u32>().ok()?;
    for (end, line) in lines.iter().enumerate() {
        if line.trim().is_empty() {
            return None;
        }
        if line.trim_end().ends_with(HEADER_CLOSE) {
            let header = lines[..=end].join("\n");
            let inner = header
                .trim_end()
                .strip_prefix(HEADER_OPEN)?
                .strip_suffix(HEADER_CLOSE)?;
            let (_, question) = inner.split_once(": ")?;
            return Some((ordinal, question.to_string(), end + 1));
        }
    }
    None
}

impl QuestionSet {
    /// The list of the questions, one `Q<ordinal>: <question>` line each.
    ///
    /// This is the form in which the question list is handed to the analysis request.
    pub fn question_list(&self) -> String {
        self.blocks()
            .iter()
            .map(|b| format!("Q{}: {}", b.ordinal, b.question))
            .collect::<Vec<String>>()
            .join("\n")
    }
}
