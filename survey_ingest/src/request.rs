use log::{info, warn};
use serde::Serialize;
use serde_json::Value as JSValue;
use snafu::{ensure, Snafu};

use crate::analysis::analysis_result_shape;
use crate::text::question_headers;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const RESPONSE_MIME_TYPE: &str = "application/json";

#[derive(Eq, PartialEq, Debug, Clone, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum RequestError {
    #[snafu(display("there are no survey responses to analyze"))]
    EmptyText {},
}

/// Everything sent to the analysis service for one analysis.
#[derive(PartialEq, Debug, Clone, Serialize)]
pub struct AnalysisRequest {
    pub model: String,
    pub prompt: String,
    #[serde(rename = "responseMimeType")]
    pub response_mime_type: String,
    /// The output schema. The service is constrained to emit data of this shape.
    #[serde(rename = "responseSchema")]
    pub response_schema: JSValue,
    /// SHA-256 of the model and the prompt.
    pub fingerprint: String,
}

impl AnalysisRequest {
    pub fn with_model(self, model: &str) -> AnalysisRequest {
        AnalysisRequest {
            fingerprint: fingerprint(model, &self.prompt),
            model: model.to_string(),
            ..self
        }
    }
}

/// Assembles the analysis request for a canonical text.
///
/// Arguments:
/// * `serialized_text` the canonical text of the survey, possibly edited by hand.
/// * `question_list` the list of the questions, if known. A blank list counts as none.
pub fn build_request(
    serialized_text: &str,
    question_list: Option<&str>,
) -> Result<AnalysisRequest, RequestError> {
    ensure!(!serialized_text.trim().is_empty(), EmptyTextSnafu {});

    let num_blocks = question_headers(serialized_text).len();
    if num_blocks == 0 {
        warn!("build_request: the text has no question header, the analysis will guess the questions");
    }
    let question_list = question_list.filter(|q| !q.trim().is_empty());

    let prompt = build_prompt(serialized_text, question_list);
    info!(
        "build_request: {:?} question blocks, question list: {:?}, prompt: {:?} bytes",
        num_blocks,
        question_list.is_some(),
        prompt.len()
    );
    Ok(AnalysisRequest {
        fingerprint: fingerprint(DEFAULT_MODEL, &prompt),
        model: DEFAULT_MODEL.to_string(),
        prompt,
        response_mime_type: RESPONSE_MIME_TYPE.to_string(),
        response_schema: analysis_result_shape().to_schema(),
    })
}

fn fingerprint(model: &str, prompt: &str) -> String {
    sha256::digest(format!("{}\n{}", model, prompt))
}

fn build_prompt(serialized_text: &str, question_list: Option<&str>) -> String {
    let mut prompt = String::new();
    prompt.push_str(
        "You are a senior data analyst. Perform an in-depth qualitative and quantitative \
         analysis of the following survey responses.\n\n",
    );

    if let Some(questions) = question_list {
        prompt.push_str("Context - the list of the survey questions:\n");
        prompt.push_str(questions.trim_end());
        prompt.push_str("\n\n");
    }

    prompt.push_str(
        "**Input data**:\n\
         The data contains several question blocks, each opened by a line of the form \
         \"--- Q<n>: <question> ---\".\n\
         Each answer line starts with the user identifier in brackets, for example \
         \"[User 1]\" or \"[A2]\".\n\n",
    );

    prompt.push_str(
        "**Tasks**:\n\n\
         1. **coreConclusions**:\n\
         * **overallConclusion**: one paragraph summarizing the main findings.\n\
         * **logicalModules**: group the findings into 3-4 logical modules, following the \
         logical relations between the questions (for example situation -> cause -> impact, \
         or need -> experience -> suggestion) rather than listing the questions. Each module \
         has a title and a content.\n\
         * **actionableInsights**: 4-6 concrete, actionable recommendations.\n\
         * **logicDiagramMermaid**: a Mermaid JS flowchart (graph TD or graph LR) showing the \
         paths of influence between the questions or findings. Do not use markdown code \
         fences. Node labels with non-ASCII or special characters must be double-quoted, for \
         example: A[\"User pain point\"] --> B[\"Churn reason\"]. Draw only 1-3 core paths.\n\n\
         2. **questionInsights**: for every question block, extract 3-5 core points with their \
         approximate percentage. For every core point, quote 1-3 of the most representative \
         answers, chosen for richness and precision among all the answers, not the first \
         ones. Quote the original words without rewriting them, and give the user identifier \
         as the source.\n\n\
         3. **userClusters**: group the users into 3-4 clusters, and list the user \
         identifiers of each cluster in 'userIds'.\n\n",
    );

    prompt.push_str("**Output format**:\nStrictly follow the JSON schema.\n\n");
    prompt.push_str("Survey data:\n\"\"\"\n");
    prompt.push_str(serialized_text);
    if !serialized_text.ends_with('\n') {
        prompt.push('\n');
    }
    prompt.push_str("\"\"\"\n");
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEXT: &str = "--- Q1: satisfaction? ---\n[U1] good\n[U2] bad\n\n";

    #[test]
    fn blank_text_is_rejected() {
        assert_eq!(build_request("", None), Err(RequestError::EmptyText {}));
        assert_eq!(
            build_request(" \n\t ", Some("Q1: x")),
            Err(RequestError::EmptyText {})
        );
    }

    #[test]
    fn prompt_embeds_the_data_and_the_questions() {
        let req = build_request(TEXT, Some("Q1: satisfaction?")).unwrap();
        assert!(req.prompt.contains("\"\"\"\n--- Q1: satisfaction? ---\n[U1] good\n[U2] bad\n"));
        assert!(req.prompt.contains("list of the survey questions:\nQ1: satisfaction?\n"));
        assert_eq!(req.model, DEFAULT_MODEL);
        assert_eq!(req.response_mime_type, "application/json");
    }

    #[test]
    fn blank_question_list_is_ignored() {
        let with_blank = build_request(TEXT, Some("   ")).unwrap();
        let without = build_request(TEXT, None).unwrap();
        assert_eq!(with_blank, without);
        assert!(!without.prompt.contains("list of the survey questions"));
    }

    #[test]
    fn schema_is_attached() {
        let req = build_request(TEXT, None).unwrap();
        assert_eq!(req.response_schema, analysis_result_shape().to_schema());
        assert_eq!(
            req.response_schema["properties"]["coreConclusions"]["properties"]
                ["logicDiagramMermaid"]["type"],
            "STRING"
        );
    }

    #[test]
    fn fingerprint_follows_prompt_and_model() {
        let a = build_request(TEXT, None).unwrap();
        let b = build_request(TEXT, None).unwrap();
        let c = build_request(TEXT, Some("Q1: satisfaction?")).unwrap();
        assert_eq!(a.fingerprint, b.fingerprint);
        assert_ne!(a.fingerprint, c.fingerprint);
        assert_eq!(a.fingerprint.len(), 64);
        let d = a.clone().with_model("other-model");
        assert_eq!(d.model, "other-model");
        assert_ne!(d.fingerprint, a.fingerprint);
        assert_eq!(d.prompt, a.prompt);
    }
}
