use clap::Parser;

/// Turns the open-ended answers of a survey into a canonical text, and checks the
/// qualitative analysis of that text.
#[derive(Parser, Debug, Clone, Default)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) A JSON configuration file with the input, analysis and output
    /// settings. Relative paths inside it are relative to the file itself.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (file path) The survey sheet, in xlsx or csv format. Overrides the input of the
    /// configuration file.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (xlsx or csv) The type of the input. By default, deduced from the file extension.
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    /// (rowsAreQuestions or rowsAreUsers) The layout of the sheet. It is never guessed.
    #[clap(short, long, value_parser)]
    pub layout: Option<String>,

    /// When using an Excel file, the name of the worksheet to use. By default the first one.
    #[clap(long, value_parser)]
    pub excel_worksheet_name: Option<String>,

    /// (file path) A canonical text, for example edited by hand, to use instead of a sheet.
    #[clap(short, long, value_parser)]
    pub text: Option<String>,

    /// Uses the built-in sample survey.
    #[clap(long, takes_value = false)]
    pub sample: bool,

    /// (file path) The list of the questions, one per line. By default, the questions
    /// found in the sheet.
    #[clap(short, long, value_parser)]
    pub questions: Option<String>,

    /// (file path or 'stdout') Where to write the canonical text.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path) A reference canonical text. The run fails if the text differs from it.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (file path or 'stdout') Where to write the analysis request, in JSON format.
    #[clap(long, value_parser)]
    pub request_out: Option<String>,

    /// (file path) A saved raw response of the analysis service, to check and clean up
    /// instead of calling the service.
    #[clap(long, value_parser)]
    pub response: Option<String>,

    /// Sends the analysis request to the service.
    #[clap(long, takes_value = false)]
    pub analyze: bool,

    /// The model of the analysis service. Overrides the configuration file.
    #[clap(long, value_parser)]
    pub model: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
