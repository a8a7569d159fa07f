// Configuration file of a digest run.

use crate::digest::*;
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum Provider {
    Xlsx,
    Csv,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct InputSource {
    /// `xlsx` or `csv`. Deduced from the extension of the file when missing.
    pub provider: Option<String>,
    #[serde(rename = "filePath")]
    pub file_path: String,
    pub layout: Option<String>,
    #[serde(rename = "excelWorksheetName")]
    pub excel_worksheet_name: Option<String>,
    #[serde(rename = "questionListPath")]
    pub question_list_path: Option<String>,
}

impl InputSource {
    pub fn layout(&self) -> DigestResult<LayoutKind> {
        match &self.layout {
            Some(s) => parse_layout(s),
            None => whatever!(
                "The layout of {:?} must be declared: rowsAreQuestions or rowsAreUsers",
                self.file_path
            ),
        }
    }

    pub fn provider(&self) -> DigestResult<Provider> {
        match &self.provider {
            Some(s) => parse_provider(s),
            None => provider_from_path(&self.file_path),
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisSettings {
    pub model: Option<String>,
    /// The environment variable that holds the API key.
    #[serde(rename = "apiKeyEnv")]
    pub api_key_env: Option<String>,
    pub endpoint: Option<String>,
    #[serde(rename = "timeoutSecs")]
    pub timeout_secs: Option<u64>,
}

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(rename = "textPath")]
    pub text_path: Option<String>,
    #[serde(rename = "requestPath")]
    pub request_path: Option<String>,
    #[serde(rename = "resultPath")]
    pub result_path: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct DigestConfig {
    pub input: Option<InputSource>,
    pub analysis: Option<AnalysisSettings>,
    pub output: Option<OutputSettings>,
}

impl DigestConfig {
    /// Makes the relative paths of the configuration relative to `root`.
    ///
    /// `stdout` is kept as is.
    pub fn resolve_paths(&mut self, root: &Path) {
        if let Some(input) = self.input.as_mut() {
            input.file_path = resolve_path(root, &input.file_path);
            input.question_list_path = input
                .question_list_path
                .as_ref()
                .map(|p| resolve_path(root, p));
        }
        if let Some(output) = self.output.as_mut() {
            for p in [
                &mut output.text_path,
                &mut output.request_path,
                &mut output.result_path,
            ] {
                *p = p.as_ref().map(|s| resolve_path(root, s));
            }
        }
    }
}

pub fn parse_layout(s: &str) -> DigestResult<LayoutKind> {
    match s {
        "rowsAreQuestions" | "rows-are-questions" | "rows_are_questions" => {
            Ok(LayoutKind::RowsAreQuestions)
        }
        "rowsAreUsers" | "rows-are-users" | "rows_are_users" => Ok(LayoutKind::RowsAreUsers),
        x => whatever!(
            "Unknown layout {:?}: expected rowsAreQuestions or rowsAreUsers",
            x
        ),
    }
}

pub fn parse_provider(s: &str) -> DigestResult<Provider> {
    match s {
        "xlsx" | "excel" => Ok(Provider::Xlsx),
        "csv" => Ok(Provider::Csv),
        x => whatever!("Unknown provider {:?}: expected xlsx or csv", x),
    }
}

pub fn provider_from_path(path: &str) -> DigestResult<Provider> {
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("xlsx") | Some("xlsm") => Ok(Provider::Xlsx),
        Some("csv") => Ok(Provider::Csv),
        _ => whatever!(
            "Cannot tell the type of {:?} from its extension, use --input-type",
            path
        ),
    }
}

pub fn read_config(path: &str) -> DigestResult<DigestConfig> {
    let contents = read_text_file(path)?;
    let mut config: DigestConfig =
        serde_json::from_str(&contents).context(ParsingJsonSnafu { path })?;
    if let Some(root) = Path::new(path).parent() {
        config.resolve_paths(root);
    }
    debug!("read_config: {:?}: {:?}", path, config);
    Ok(config)
}
