pub use crate::config::*;

/// A builder for question sets.
///
/// The builder hands out the ordinals: the first question added is 1, the next one 2, and so on.
/// Both sheet layouts go through it, and it can also be used to assemble a survey by hand.
///
/// ```
/// use survey_ingest::builder::QuestionSetBuilder;
///
/// let mut builder = QuestionSetBuilder::new();
/// let q1 = builder.question("How satisfied are you?").unwrap();
/// builder.answer(q1, "User 1", "Very much");
///
/// let qs = builder.build();
/// assert_eq!(qs.blocks()[0].ordinal, 1);
/// assert_eq!(qs.num_answers(), 1);
/// ```
#[derive(Debug, Default)]
pub struct QuestionSetBuilder {
    blocks: Vec<QuestionBlock>,
}

impl QuestionSetBuilder {
    pub fn new() -> QuestionSetBuilder {
        QuestionSetBuilder { blocks: Vec::new() }
    }

    /// Opens a new question and returns its ordinal.
    ///
    /// A blank question is not added and consumes no ordinal.
    pub fn question(&mut self, question: &str) -> Option<u32> {
        if question.trim().is_empty() {
            return None;
        }
        let ordinal = (self.blocks.len() + 1) as u32;
        self.blocks.push(QuestionBlock {
            ordinal,
            question: question.to_string(),
            answers: Vec::new(),
        });
        Some(ordinal)
    }

    /// Adds an answer to the question with the given ordinal.
    ///
    /// Returns false, and adds nothing, if the answer or the user id is blank or if
    /// no such question exists.
    pub fn answer(&mut self, ordinal: u32, user_id: &str, text: &str) -> bool {
        if text.trim().is_empty() || user_id.trim().is_empty() {
            return false;
        }
        let block = match (ordinal as usize)
            .checked_sub(1)
            .and_then(|idx| self.blocks.get_mut(idx))
        {
            Some(b) => b,
            None => return false,
        };
        block.answers.push(Answer {
            user_id: user_id.to_string(),
            text: text.to_string(),
        });
        true
    }

    pub fn build(self) -> QuestionSet {
        QuestionSet {
            blocks: self.blocks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordinals_are_contiguous() {
        let mut b = QuestionSetBuilder::new();
        assert_eq!(b.question("first"), Some(1));
        assert_eq!(b.question("  "), None);
        assert_eq!(b.question("second"), Some(2));
        let qs = b.build();
        let ordinals: Vec<u32> = qs.blocks().iter().map(|b| b.ordinal).collect();
        assert_eq!(ordinals, vec![1, 2]);
    }

    #[test]
    fn answers_need_a_question() {
        let mut b = QuestionSetBuilder::new();
        assert!(!b.answer(1, "u", "text"));
        assert!(!b.answer(0, "u", "text"));
        let q = b.question("q").unwrap();
        assert!(!b.answer(q, "u", ""));
        assert!(!b.answer(q, "", "text"));
        assert!(b.answer(q, "u", "text"));
        let qs = b.build();
        assert_eq!(qs.num_answers(), 1);
        assert_eq!(qs.blocks()[0].answers[0].user_id, "u");
    }

    #[test]
    fn questions_without_answers_are_kept() {
        let mut b = QuestionSetBuilder::new();
        b.question("nobody answered");
        let qs = b.build();
        assert_eq!(qs.len(), 1);
        assert!(qs.blocks()[0].answers.is_empty());
    }
}
