// ******** Analysis result *********
//
// The structured findings returned by the analysis service, and the shape they
// must have. The same shape is sent with the request (as the output schema) and
// checked against the response.

use serde::{Deserialize, Serialize};
use serde_json::json;
use serde_json::Map as JSMap;
use serde_json::Value as JSValue;

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct Quote {
    pub text: String,
    /// The user identifier, as written in the canonical text.
    pub source: String,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct CorePoint {
    pub label: String,
    pub description: String,
    pub percentage: i64,
    pub quotes: Vec<Quote>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct QuestionInsight {
    pub question: String,
    #[serde(rename = "corePoints")]
    pub core_points: Vec<CorePoint>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct UserCluster {
    pub name: String,
    pub description: String,
    pub percentage: i64,
    pub characteristics: Vec<String>,
    #[serde(rename = "userIds")]
    pub user_ids: Vec<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct LogicalModule {
    pub title: String,
    pub content: String,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct CoreConclusions {
    #[serde(rename = "overallConclusion")]
    pub overall_conclusion: String,
    #[serde(rename = "logicalModules")]
    pub logical_modules: Vec<LogicalModule>,
    #[serde(rename = "actionableInsights")]
    pub actionable_insights: Vec<String>,
    #[serde(rename = "logicDiagramMermaid")]
    pub logic_diagram_mermaid: String,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(rename = "coreConclusions")]
    pub core_conclusions: CoreConclusions,
    #[serde(rename = "questionInsights")]
    pub question_insights: Vec<QuestionInsight>,
    #[serde(rename = "userClusters")]
    pub user_clusters: Vec<UserCluster>,
}

/// The fundamental kind of a value, and for containers the kinds they hold.
///
/// Every field of an object is required.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum Shape {
    String(Option<&'static str>),
    Integer,
    Array(Box<Shape>),
    Object(Vec<(&'static str, Shape)>),
}

impl Shape {
    pub fn kind(&self) -> &'static str {
        match self {
            Shape::String(_) => "string",
            Shape::Integer => "integer",
            Shape::Array(_) => "array",
            Shape::Object(_) => "object",
        }
    }

    /// The output schema, in the notation of the analysis service.
    pub fn to_schema(&self) -> JSValue {
        match self {
            Shape::String(None) => json!({ "type": "STRING" }),
            Shape::String(Some(description)) => {
                json!({ "type": "STRING", "description": description })
            }
            Shape::Integer => json!({ "type": "INTEGER" }),
            Shape::Array(items) => json!({ "type": "ARRAY", "items": items.to_schema() }),
            Shape::Object(fields) => {
                let mut properties: JSMap<String, JSValue> = JSMap::new();
                for (name, shape) in fields.iter() {
                    properties.insert(name.to_string(), shape.to_schema());
                }
                let required: Vec<&str> = fields.iter().map(|(name, _)| *name).collect();
                json!({ "type": "OBJECT", "properties": properties, "required": required })
            }
        }
    }
}

fn string() -> Shape {
    Shape::String(None)
}

fn array(items: Shape) -> Shape {
    Shape::Array(Box::new(items))
}

/// The shape of `AnalysisResult`, field by field.
pub fn analysis_result_shape() -> Shape {
    let logical_module = Shape::Object(vec![("title", string()), ("content", string())]);
    let core_conclusions = Shape::Object(vec![
        ("overallConclusion", string()),
        ("logicalModules", array(logical_module)),
        ("actionableInsights", array(string())),
        (
            "logicDiagramMermaid",
            Shape::String(Some(
                "Mermaid.js flowchart syntax string. NO markdown blocks.",
            )),
        ),
    ]);
    let quote = Shape::Object(vec![
        ("text", string()),
        (
            "source",
            Shape::String(Some("User Identifier, e.g. '[User 1]'")),
        ),
    ]);
    let core_point = Shape::Object(vec![
        ("label", string()),
        ("description", string()),
        ("percentage", Shape::Integer),
        ("quotes", array(quote)),
    ]);
    let question_insight = Shape::Object(vec![
        ("question", string()),
        ("corePoints", array(core_point)),
    ]);
    let user_cluster = Shape::Object(vec![
        ("name", string()),
        ("description", string()),
        ("percentage", Shape::Integer),
        ("characteristics", array(string())),
        ("userIds", array(string())),
    ]);
    Shape::Object(vec![
        ("coreConclusions", core_conclusions),
        ("questionInsights", array(question_insight)),
        ("userClusters", array(user_cluster)),
    ])
}
