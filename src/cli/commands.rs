use crate::config::parse_provider;
use clap::{Parser, Subcommand, ValueEnum};
use genai::adapter::AdapterKind;
use std::path::PathBuf;

/// ESG risk analytics: company lookup, risk prediction and multi-agent synthesis
#[derive(Parser, Debug)]
#[command(
    name = "esgpulse",
    about = "ESG risk analytics with a multi-agent news and model synthesis pipeline",
    version,
    author,
    long_about = "esgpulse looks up company ESG metrics, predicts risk levels with a trained \
                  classifier, and runs a news analysis, model interpretation and synthesis \
                  pipeline that produces a narrative ESG report. It can run one-off analyses \
                  from the command line or serve them over HTTP."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(
        short = 'v',
        long,
        global = true,
        help = "Verbose output (debug logging)"
    )]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Quiet mode - suppress non-error output"
    )]
    pub quiet: bool,

    #[arg(
        long,
        global = true,
        value_name = "FILE",
        help = "Companies JSON file (overrides ESGPULSE_COMPANIES_PATH)"
    )]
    pub companies: Option<PathBuf>,

    #[arg(
        long,
        global = true,
        value_name = "FILE",
        help = "Risk model artifact (overrides ESGPULSE_MODEL_PATH)"
    )]
    pub model: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        about = "Run the ESG pipeline for one company",
        long_about = "Looks up the company, fetches recent news, and runs news analysis, \
                      model interpretation and synthesis.\n\n\
                      Examples:\n  \
                      esgpulse analyze AAPL\n  \
                      esgpulse analyze MSFT --days 7 --format json\n  \
                      esgpulse analyze XOM --no-news --provider openai --llm-model gpt-4o-mini"
    )]
    Analyze(AnalyzeArgs),

    #[command(
        about = "Run the ESG pipeline for several companies concurrently",
        long_about = "Examples:\n  \
                      esgpulse batch AAPL MSFT XOM\n  \
                      esgpulse batch AAPL MSFT --concurrency 2 --format yaml"
    )]
    Batch(BatchArgs),

    #[command(
        about = "Predict an ESG risk level from raw metrics",
        long_about = "Examples:\n  \
                      esgpulse predict --environment 12.5 --social 9 --governance 7 \
                      --controversy 2 --employees 150000"
    )]
    Predict(PredictArgs),

    #[command(about = "Fetch recent company news and its ESG mention counts")]
    News(NewsArgs),

    #[command(
        about = "Serve the HTTP API",
        long_about = "Examples:\n  \
                      esgpulse serve\n  \
                      esgpulse serve --addr 127.0.0.1:9000"
    )]
    Serve(ServeArgs),

    #[command(about = "Check data files, model, news and LLM configuration")]
    Health(HealthArgs),

    #[command(about = "Show the effective configuration")]
    Config(ConfigArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct LlmArgs {
    #[arg(
        long,
        value_parser = parse_adapter_kind,
        help = "LLM provider for synthesis (default: groq)"
    )]
    pub provider: Option<AdapterKind>,

    #[arg(long = "llm-model", value_name = "MODEL", help = "LLM model name")]
    pub llm_model: Option<String>,

    #[arg(long, help = "Use rule-based synthesis only")]
    pub no_llm: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct AnalyzeArgs {
    #[arg(value_name = "SYMBOL", help = "Ticker symbol, e.g. AAPL")]
    pub symbol: String,

    #[arg(long, value_name = "DAYS", help = "News window in days (1-365)")]
    pub days: Option<u32>,

    #[arg(long, help = "Skip the news fetch")]
    pub no_news: bool,

    #[arg(long, help = "Use the stored risk label instead of the model")]
    pub no_prediction: bool,

    #[command(flatten)]
    pub llm: LlmArgs,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,

    #[arg(
        short = 'o',
        long,
        value_name = "FILE",
        help = "Write output to file instead of stdout"
    )]
    pub output: Option<PathBuf>,
}

#[derive(Parser, Debug, Clone)]
pub struct BatchArgs {
    #[arg(value_name = "SYMBOL", required = true, num_args = 1.., help = "Ticker symbols")]
    pub symbols: Vec<String>,

    #[arg(long, value_name = "DAYS", help = "News window in days (1-365)")]
    pub days: Option<u32>,

    #[arg(long, value_name = "N", help = "Analyses in flight at once")]
    pub concurrency: Option<usize>,

    #[command(flatten)]
    pub llm: LlmArgs,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(Parser, Debug, Clone)]
pub struct PredictArgs {
    #[arg(long, value_name = "SCORE", help = "Environment risk score (0-100)")]
    pub environment: f64,

    #[arg(long, value_name = "SCORE", help = "Social risk score (0-100)")]
    pub social: f64,

    #[arg(long, value_name = "SCORE", help = "Governance risk score (0-100)")]
    pub governance: f64,

    #[arg(long, value_name = "SCORE", help = "Controversy score (0-100)")]
    pub controversy: f64,

    #[arg(long, value_name = "COUNT", help = "Full-time employees")]
    pub employees: f64,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(Parser, Debug, Clone)]
pub struct NewsArgs {
    #[arg(value_name = "SYMBOL")]
    pub symbol: String,

    #[arg(long, value_name = "DAYS", default_value = "30")]
    pub days: u32,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(Parser, Debug, Clone)]
pub struct ServeArgs {
    #[arg(long, value_name = "ADDR", help = "Bind address (default: 0.0.0.0:8000)")]
    pub addr: Option<String>,

    #[command(flatten)]
    pub llm: LlmArgs,
}

#[derive(Parser, Debug, Clone)]
pub struct HealthArgs {
    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(Parser, Debug, Clone)]
pub struct ConfigArgs {
    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormatArg {
    Json,
    Yaml,
    Human,
}

impl From<OutputFormatArg> for super::output::OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Json => super::output::OutputFormat::Json,
            OutputFormatArg::Yaml => super::output::OutputFormat::Yaml,
            OutputFormatArg::Human => super::output::OutputFormat::Human,
        }
    }
}

fn parse_adapter_kind(s: &str) -> Result<AdapterKind, String> {
    parse_provider(s).map_err(|_| {
        format!(
            "Invalid provider: {}. Valid options: groq, openai, anthropic, gemini, xai, ollama, deepseek, cohere",
            s
        )
    })
}
