//! A small built-in survey, already in canonical text form.

pub const SAMPLE_QUESTIONS: &str = "Q1: What do you like most about the product?
Q2: What annoys you the most?
Q3: What would make you recommend it to a friend?";

pub const SAMPLE_DATA: &str = "--- Q1: What do you like most about the product? ---
[User 1] The interface is clean and I find what I need quickly.
[User 2] It syncs between my phone and my laptop without any effort.
[User 3] Honestly the price, it is cheaper than the alternatives.
[User 4] Clean design. The dark mode is great.
[User 5] The offline mode, I use it on the train every day.

--- Q2: What annoys you the most? ---
[User 1] Exporting to PDF takes forever.
[User 2] The notifications, there are way too many of them.
[User 3] It crashes when I import large files.
[User 4] Too many notifications, I turned them all off.
[User 5] Search does not find words inside attachments.

--- Q3: What would make you recommend it to a friend? ---
[User 1] Faster exports.
[User 2] A shared workspace for families.
[User 3] If it stopped crashing I would already recommend it.
[User 5] Better search.

";

#[cfg(test)]
mod tests {
    use super::*;
    use survey_ingest::text::question_headers;
    use survey_ingest::*;

    #[test]
    fn sample_is_canonical() {
        let headers = question_headers(SAMPLE_DATA);
        assert_eq!(headers.len(), 3);
        let listed: Vec<String> = headers
            .iter()
            .map(|(ordinal, question)| format!("Q{}: {}", ordinal, question))
            .collect();
        assert_eq!(listed.join("\n"), SAMPLE_QUESTIONS);
    }

    #[test]
    fn sample_builds_a_request() {
        let request = build_request(SAMPLE_DATA, Some(SAMPLE_QUESTIONS)).unwrap();
        assert!(request.prompt.contains(SAMPLE_DATA.trim_end()));
    }
}
