use log::{debug, info, warn};

use snafu::{prelude::*, Snafu};
use survey_ingest::*;

use text_diff::print_diff;

use crate::args::Args;
use crate::digest::config_reader::*;
use crate::digest::io_common::*;

pub mod config_reader;
pub mod gemini;
pub mod io_common;
pub mod io_csv;
pub mod io_excel;
pub mod sample;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum DigestError {
    #[snafu(display("Error opening workbook {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("The workbook {path} has no worksheet"))]
    EmptyExcel { path: String },
    #[snafu(display("The workbook {path} has no worksheet named {name:?}"))]
    MissingWorksheet { path: String, name: String },
    #[snafu(display("Error opening CSV file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error reading line {lineno} of the CSV file"))]
    CsvLineParse { source: csv::Error, lineno: usize },
    #[snafu(display("Error reading file {path}"))]
    OpeningFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error writing file {path}"))]
    WritingFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON file {path}"))]
    ParsingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Error producing JSON"))]
    SerializingJson { source: serde_json::Error },
    #[snafu(display("Cannot read the survey in {path}: {source}"))]
    Ingestion {
        source: IngestionError,
        path: String,
    },
    #[snafu(display("{source}"))]
    Request { source: RequestError },
    #[snafu(display("{source}"))]
    Response { source: ResponseError },
    #[snafu(display("The canonical text differs from the reference {path}"))]
    ReferenceMismatch { path: String },
    #[snafu(display("The API key must be set in the environment variable {var}"))]
    MissingApiKey { var: String },
    #[snafu(display("Error setting up the HTTP client"))]
    HttpClient { source: reqwest::Error },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type DigestResult<T> = Result<T, DigestError>;

/// The canonical text of a survey, with the list of its questions when known.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Survey {
    pub text: String,
    pub question_list: Option<String>,
}

/// Reads a sheet and turns it into its canonical text.
///
/// The sheet file is closed before the normalization starts.
pub fn read_survey(source: &InputSource) -> DigestResult<Survey> {
    let layout = source.layout()?;
    let matrix = match source.provider()? {
        Provider::Xlsx => io_excel::read_excel_matrix(
            &source.file_path,
            source.excel_worksheet_name.as_deref(),
        )?,
        Provider::Csv => io_csv::read_csv_matrix(&source.file_path)?,
    };
    info!(
        "read_survey: {:?}: {:?} rows",
        simplify_file_name(&source.file_path),
        matrix.num_rows()
    );
    let qs = normalize(&matrix, layout).context(IngestionSnafu {
        path: source.file_path.clone(),
    })?;
    Ok(Survey {
        text: serialize(&qs),
        question_list: Some(qs.question_list()),
    })
}

/// The sheet to read: the one of the command line, or else the one of the configuration.
///
/// The command line settings take precedence over the configuration ones.
fn input_source(args: &Args, config: &DigestConfig) -> DigestResult<InputSource> {
    match (&args.input, &config.input) {
        (Some(file_path), cfg) => Ok(InputSource {
            // Deduced from the extension of the file unless given.
            provider: args.input_type.clone(),
            file_path: file_path.clone(),
            layout: args
                .layout
                .clone()
                .or_else(|| cfg.as_ref().and_then(|c| c.layout.clone())),
            excel_worksheet_name: args
                .excel_worksheet_name
                .clone()
                .or_else(|| cfg.as_ref().and_then(|c| c.excel_worksheet_name.clone())),
            // The question list of the configuration goes with the configured file.
            question_list_path: None,
        }),
        (None, Some(cfg)) => {
            let mut source = cfg.clone();
            if args.layout.is_some() {
                source.layout = args.layout.clone();
            }
            if args.input_type.is_some() {
                source.provider = args.input_type.clone();
            }
            if args.excel_worksheet_name.is_some() {
                source.excel_worksheet_name = args.excel_worksheet_name.clone();
            }
            Ok(source)
        }
        (None, None) => {
            whatever!("No survey given: use --input, --text, --sample or a config file with an input")
        }
    }
}

fn load_survey(args: &Args, config: &DigestConfig) -> DigestResult<Survey> {
    let num_sources =
        [args.sample, args.text.is_some(), args.input.is_some()].iter().filter(|x| **x).count();
    if num_sources > 1 {
        whatever!("Only one of --sample, --text and --input can be used at a time")
    }

    if args.sample {
        info!("Using the sample survey");
        return Ok(Survey {
            text: sample::SAMPLE_DATA.to_string(),
            question_list: Some(sample::SAMPLE_QUESTIONS.to_string()),
        });
    }
    if let Some(text_path) = &args.text {
        info!("Reading canonical text from {:?}", text_path);
        return Ok(Survey {
            text: read_text_file(text_path)?,
            question_list: None,
        });
    }

    let source = input_source(args, config)?;
    debug!("load_survey: source: {:?}", source);
    let mut survey = read_survey(&source)?;
    if let Some(questions_path) = &source.question_list_path {
        survey.question_list = Some(read_text_file(questions_path)?);
    }
    Ok(survey)
}

/// Compares the canonical text with a reference, and prints the differences.
pub fn check_reference(text: &str, reference_path: &str) -> DigestResult<()> {
    let reference = read_text_file(reference_path)?;
    if reference != text {
        warn!("Found differences with the reference text {:?}", reference_path);
        print_diff(reference.as_str(), text, "\n");
        return ReferenceMismatchSnafu {
            path: reference_path,
        }
        .fail();
    }
    info!("The canonical text matches the reference {:?}", reference_path);
    Ok(())
}

fn write_result(result: &AnalysisResult, path: &str) -> DigestResult<()> {
    let pretty = serde_json::to_string_pretty(result).context(SerializingJsonSnafu {})?;
    write_output(path, &pretty)
}

pub fn run_digest(args: &Args) -> DigestResult<()> {
    let config = match &args.config {
        Some(config_path) => read_config(config_path)?,
        None => DigestConfig::default(),
    };
    debug!("run_digest: config: {:?}", config);
    let analysis = config.analysis.clone().unwrap_or_default();
    let output = config.output.clone().unwrap_or_default();

    let survey = load_survey(args, &config)?;
    let question_list = match &args.questions {
        Some(p) => Some(read_text_file(p)?),
        None => survey.question_list.clone(),
    };

    if args.analyze && args.response.is_some() {
        whatever!("--analyze and --response cannot be used together")
    }
    let wants_analysis = args.analyze || args.response.is_some();
    let wants_request = wants_analysis || args.request_out.is_some() || output.request_path.is_some();

    match args.out.as_ref().or(output.text_path.as_ref()) {
        Some(out) => write_output(out, &survey.text)?,
        // Nothing else to do: the text is the output.
        None if !wants_request => write_output(STDOUT, &survey.text)?,
        None => {}
    }

    if let Some(reference_path) = &args.reference {
        check_reference(&survey.text, reference_path)?;
    }

    if !wants_request {
        return Ok(());
    }

    let mut request =
        build_request(&survey.text, question_list.as_deref()).context(RequestSnafu {})?;
    if let Some(model) = args.model.as_ref().or(analysis.model.as_ref()) {
        request = request.with_model(model);
    }
    if let Some(request_path) = args.request_out.as_ref().or(output.request_path.as_ref()) {
        let pretty = serde_json::to_string_pretty(&request).context(SerializingJsonSnafu {})?;
        write_output(request_path, &pretty)?;
    }

    let result_path = output.result_path.as_deref().unwrap_or(STDOUT);
    if let Some(response_path) = &args.response {
        info!("Checking the saved response {:?}", response_path);
        let raw = read_text_file(response_path)?;
        let result = sanitize(&raw).context(ResponseSnafu {})?;
        write_result(&result, result_path)?;
    } else if args.analyze {
        let client = gemini::GeminiClient::new(&analysis)?;
        let mut session = AnalysisSession::new();
        let state = match session.run(&client, &request) {
            Ok(state) => state,
            Err(e) => whatever!("The analysis could not run: {}", e),
        };
        match state {
            AttemptState::Succeeded(result) => write_result(result, result_path)?,
            AttemptState::Failed(failure) => whatever!("The analysis failed: {}", failure),
            x => whatever!("The analysis did not complete: {:?}", x),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::{Path, PathBuf};

    fn scratch_dir(name: &str) -> PathBuf {
        let p: PathBuf = [
            std::env::temp_dir(),
            PathBuf::from(format!("survey-digest-{}-{}", std::process::id(), name)),
        ]
        .iter()
        .collect();
        fs::create_dir_all(&p).unwrap();
        p
    }

    fn path_str(p: &Path) -> String {
        p.display().to_string()
    }

    fn run_digest_on_config(config_path: &Path) -> DigestResult<()> {
        let args = Args {
            config: Some(path_str(config_path)),
            ..Args::default()
        };
        run_digest(&args)
    }

    const RESPONSE: &str = r#"```json
{
  "coreConclusions": {
    "overallConclusion": "Mixed feelings.",
    "logicalModules": [{"title": "Speed", "content": "Too slow."}],
    "actionableInsights": ["Make it faster"],
    "logicDiagramMermaid": "```mermaid\nA[\"Slow\"] --> B[\"Churn\"]\n```"
  },
  "questionInsights": [],
  "userClusters": []
}
```"#;

    #[test]
    fn csv_survey_to_text() {
        let dir = scratch_dir("csv_survey_to_text");
        let input = dir.join("survey.csv");
        fs::write(&input, "id,Speed?,Price?\nalice,slow,ok\n,fast,\n").unwrap();
        let out = dir.join("survey.txt");
        let args = Args {
            input: Some(path_str(&input)),
            layout: Some("rowsAreUsers".to_string()),
            out: Some(path_str(&out)),
            ..Args::default()
        };
        run_digest(&args).unwrap();
        let text = fs::read_to_string(&out).unwrap();
        assert_eq!(
            text,
            "--- Q1: Speed? ---\n[alice] slow\n[A3] fast\n\n--- Q2: Price? ---\n[alice] ok\n\n"
        );
    }

    #[test]
    fn layout_must_be_declared() {
        let dir = scratch_dir("layout_must_be_declared");
        let input = dir.join("survey.csv");
        fs::write(&input, ",U1\nQ,a\n").unwrap();
        let args = Args {
            input: Some(path_str(&input)),
            out: Some(path_str(&dir.join("out.txt"))),
            ..Args::default()
        };
        assert!(run_digest(&args).is_err());
    }

    #[test]
    fn single_row_sheet_is_rejected() {
        let dir = scratch_dir("single_row_sheet_is_rejected");
        let input = dir.join("survey.csv");
        fs::write(&input, ",U1,U2\n").unwrap();
        let source = InputSource {
            provider: None,
            file_path: path_str(&input),
            layout: Some("rowsAreQuestions".to_string()),
            excel_worksheet_name: None,
            question_list_path: None,
        };
        match read_survey(&source) {
            Err(DigestError::Ingestion { source, .. }) => {
                assert_eq!(source, IngestionError::EmptyInput { rows: 1 })
            }
            x => panic!("unexpected: {:?}", x),
        }
    }

    #[test]
    fn reference_mismatch_fails() {
        let dir = scratch_dir("reference_mismatch_fails");
        let reference = dir.join("reference.txt");
        fs::write(&reference, sample::SAMPLE_DATA).unwrap();
        assert!(check_reference(sample::SAMPLE_DATA, &path_str(&reference)).is_ok());
        assert!(matches!(
            check_reference("--- Q1: other ---\n\n", &path_str(&reference)),
            Err(DigestError::ReferenceMismatch { .. })
        ));
    }

    #[test]
    fn saved_response_is_checked() {
        let dir = scratch_dir("saved_response_is_checked");
        let response = dir.join("response.txt");
        fs::write(&response, RESPONSE).unwrap();
        let request_out = dir.join("request.json");
        let result_out = dir.join("result.json");
        let config = dir.join("config.json");
        fs::write(
            &config,
            r#"{"output": {"textPath": "text.txt", "requestPath": "request.json", "resultPath": "result.json"}}"#,
        )
        .unwrap();
        let args = Args {
            config: Some(path_str(&config)),
            sample: true,
            response: Some(path_str(&response)),
            ..Args::default()
        };
        run_digest(&args).unwrap();

        let result: AnalysisResult =
            serde_json::from_str(&fs::read_to_string(&result_out).unwrap()).unwrap();
        assert_eq!(
            result.core_conclusions.logic_diagram_mermaid,
            "graph TD\nA[\"Slow\"] --> B[\"Churn\"]"
        );
        let request: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&request_out).unwrap()).unwrap();
        assert!(request["prompt"]
            .as_str()
            .unwrap()
            .contains(sample::SAMPLE_QUESTIONS));
        assert_eq!(
            fs::read_to_string(dir.join("text.txt")).unwrap(),
            sample::SAMPLE_DATA
        );
    }

    #[test]
    fn invalid_saved_response_fails() {
        let dir = scratch_dir("invalid_saved_response_fails");
        let response = dir.join("response.txt");
        fs::write(&response, "{\"coreConclusions\": {}}").unwrap();
        let args = Args {
            sample: true,
            response: Some(path_str(&response)),
            out: Some(path_str(&dir.join("text.txt"))),
            ..Args::default()
        };
        match run_digest(&args) {
            Err(DigestError::Response {
                source: ResponseError::SchemaMismatch { path, .. },
            }) => assert_eq!(path, "$.coreConclusions.overallConclusion"),
            x => panic!("unexpected: {:?}", x),
        }
    }

    #[test]
    fn config_input_is_used() {
        let dir = scratch_dir("config_input_is_used");
        fs::write(dir.join("answers.csv"), ",U1,U2\nWhy?,because,no idea\n").unwrap();
        fs::write(dir.join("questions.txt"), "Q1: Why did you join?").unwrap();
        fs::write(
            dir.join("config.json"),
            r#"{
                "input": {"filePath": "answers.csv", "layout": "rowsAreQuestions",
                          "questionListPath": "questions.txt"},
                "output": {"textPath": "out.txt", "requestPath": "request.json"}
            }"#,
        )
        .unwrap();
        run_digest_on_config(&dir.join("config.json")).unwrap();
        assert_eq!(
            fs::read_to_string(dir.join("out.txt")).unwrap(),
            "--- Q1: Why? ---\n[U1] because\n[U2] no idea\n\n"
        );
        let request: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(dir.join("request.json")).unwrap()).unwrap();
        assert!(request["prompt"]
            .as_str()
            .unwrap()
            .contains("Q1: Why did you join?"));
    }

    #[test]
    fn command_line_input_drops_the_configured_file_settings() {
        let config = DigestConfig {
            input: Some(InputSource {
                provider: Some("csv".to_string()),
                file_path: "/data/configured.csv".to_string(),
                layout: Some("rowsAreUsers".to_string()),
                excel_worksheet_name: None,
                question_list_path: Some("/data/questions.txt".to_string()),
            }),
            ..DigestConfig::default()
        };
        let args = Args {
            input: Some("other.xlsx".to_string()),
            ..Args::default()
        };
        let source = input_source(&args, &config).unwrap();
        assert_eq!(source.file_path, "other.xlsx");
        assert_eq!(source.provider().unwrap(), Provider::Xlsx);
        assert_eq!(source.layout, Some("rowsAreUsers".to_string()));
        assert_eq!(source.question_list_path, None);

        let args = Args {
            layout: Some("rowsAreQuestions".to_string()),
            ..Args::default()
        };
        let source = input_source(&args, &config).unwrap();
        assert_eq!(source.file_path, "/data/configured.csv");
        assert_eq!(source.layout, Some("rowsAreQuestions".to_string()));
        assert_eq!(
            source.question_list_path,
            Some("/data/questions.txt".to_string())
        );
    }

    #[test]
    fn several_sources_are_rejected() {
        let args = Args {
            sample: true,
            text: Some("survey.txt".to_string()),
            ..Args::default()
        };
        assert!(run_digest(&args).is_err());
    }
}
