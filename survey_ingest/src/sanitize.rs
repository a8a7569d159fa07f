use log::{debug, info};
use serde_json::Value as JSValue;
use snafu::{ensure, ResultExt, Snafu};

use crate::analysis::*;

/// The keywords that open a flowchart definition.
const DIAGRAM_KEYWORDS: [&str; 2] = ["graph", "flowchart"];
/// The edge connectors whose presence marks a flowchart body.
const EDGE_CONNECTORS: [&str; 4] = ["-->", "---", "-.->", "==>"];
const DEFAULT_DIAGRAM_HEADER: &str = "graph TD";

/// Why a response from the analysis service could not be trusted.
///
/// The whole analysis may be attempted again, nothing is retried here.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ResponseError {
    #[snafu(display("the analysis service returned an empty response"))]
    Empty {},
    #[snafu(display("the analysis response is not valid JSON: {source}"))]
    NotJson { source: serde_json::Error },
    #[snafu(display("the analysis response has no {expected} at {path}"))]
    SchemaMismatch { path: String, expected: String },
}

/// Turns the raw text of a response into a trusted analysis result.
///
/// Code fences around the payload are removed, the payload is parsed and checked
/// field by field against the expected shape, and the diagram is repaired.
/// Only the shape is checked: the user ids quoted in the result are not compared
/// with the ones of the survey.
pub fn sanitize(raw_response: &str) -> Result<AnalysisResult, ResponseError> {
    let trimmed = raw_response.trim();
    ensure!(!trimmed.is_empty(), EmptySnafu {});

    let payload = strip_outer_fence(trimmed);
    debug!(
        "sanitize: {:?} bytes of payload out of {:?}",
        payload.len(),
        raw_response.len()
    );
    let js: JSValue = serde_json::from_str(payload).context(NotJsonSnafu {})?;

    check_shape(&js, &analysis_result_shape(), "$")?;
    let mut result: AnalysisResult =
        serde_json::from_value(js).map_err(|e| ResponseError::SchemaMismatch {
            path: "$".to_string(),
            expected: format!("decodable analysis result ({})", e),
        })?;

    let diagram = repair_diagram(&result.core_conclusions.logic_diagram_mermaid);
    if diagram != result.core_conclusions.logic_diagram_mermaid {
        debug!("sanitize: repaired diagram: {:?}", diagram);
    }
    result.core_conclusions.logic_diagram_mermaid = diagram;

    info!(
        "sanitize: {:?} question insights, {:?} user clusters",
        result.question_insights.len(),
        result.user_clusters.len()
    );
    Ok(result)
}

/// Removes one code fence around the text: an opening fence, with or without a
/// language tag, and a closing fence. The text between is trimmed.
pub fn strip_outer_fence(text: &str) -> &str {
    let mut res = text.trim();
    if let Some(rest) = res.strip_prefix("```") {
        let tag_len = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_'))
            .unwrap_or(rest.len());
        res = &rest[tag_len..];
    }
    if let Some(rest) = res.strip_suffix("```") {
        res = rest;
    }
    res.trim()
}

/// Checks the presence and the kind of every value the shape requires.
/// Values that the shape does not mention are ignored.
pub fn check_shape(value: &JSValue, shape: &Shape, path: &str) -> Result<(), ResponseError> {
    let matches = match (shape, value) {
        (Shape::String(_), JSValue::String(_)) => true,
        (Shape::Integer, JSValue::Number(n)) => n.as_i64().is_some(),
        (Shape::Array(items), JSValue::Array(elts)) => {
            for (idx, elt) in elts.iter().enumerate() {
                check_shape(elt, items, &format!("{}[{}]", path, idx))?;
            }
            true
        }
        (Shape::Object(fields), JSValue::Object(obj)) => {
            for (name, field_shape) in fields.iter() {
                let field_path = format!("{}.{}", path, name);
                match obj.get(*name) {
                    Some(v) => check_shape(v, field_shape, &field_path)?,
                    None => {
                        return SchemaMismatchSnafu {
                            path: field_path,
                            expected: field_shape.kind(),
                        }
                        .fail();
                    }
                }
            }
            true
        }
        _ => false,
    };
    ensure!(
        matches,
        SchemaMismatchSnafu {
            path,
            expected: shape.kind(),
        }
    );
    Ok(())
}

/// Cleans up the flowchart returned by the analysis service.
///
/// All code fences are removed, and a flowchart body that does not start with a
/// diagram keyword gets a default top-down header. Repairing twice gives the same
/// result as repairing once.
pub fn repair_diagram(diagram: &str) -> String {
    let unfenced = remove_fences(&remove_fences(diagram, "```mermaid"), "```");
    let body = unfenced.trim();

    let starts_with_keyword = body
        .split_whitespace()
        .next()
        .map(|first| DIAGRAM_KEYWORDS.contains(&first))
        .unwrap_or(false);
    let has_edges = EDGE_CONNECTORS.iter().any(|c| body.contains(c));

    if !starts_with_keyword && has_edges {
        format!("{}\n{}", DEFAULT_DIAGRAM_HEADER, body)
    } else {
        body.to_string()
    }
}

// Removes every occurrence of the fence, with the whitespace that follows it.
fn remove_fences(text: &str, fence: &str) -> String {
    let mut res = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(idx) = rest.find(fence) {
        res.push_str(&rest[..idx]);
        rest = rest[idx + fence.len()..].trim_start();
    }
    res.push_str(rest);
    res
}
