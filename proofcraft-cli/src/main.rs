//! # proofcraft CLI
//!
//! Solve a problem statement with a solve / verify / correct loop.
//!
//! Usage:
//!   proofcraft [problem_file] [--log <file>] [--other-prompts a,b] [--max-runs n]
//!
//! Examples:
//!   GEMINI_API_KEY=... proofcraft problems/imo01.txt --log imo01.log
//!   proofcraft --backend vllm --model Qwen/Qwen3-1.7B -m 3 problem_statement.txt

mod telemetry;

use clap::{Parser, ValueEnum};
use proofcraft_agent::{read_problem_statement, Agent, AgentConfig, Driver, Prompts};
use proofcraft_gateway::{
    Backend, Console, Error, LlmProvider, ProviderConfig, ProviderGateway, Result,
};
use std::path::PathBuf;
use std::sync::Arc;

const VLLM_BASE_URL: &str = "http://localhost:8000/v1";
const VLLM_MODEL: &str = "Qwen/Qwen3-1.7B";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum BackendKind {
    /// Hosted Gemini API
    Gemini,
    /// OpenAI or any OpenAI-compatible server
    Openai,
    /// Local vLLM server
    Vllm,
}

impl BackendKind {
    /// Environment variable holding the key when `--api-key` is not given
    fn key_env(self) -> &'static str {
        match self {
            BackendKind::Gemini => "GEMINI_API_KEY",
            BackendKind::Openai | BackendKind::Vllm => "OPENAI_API_KEY",
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "proofcraft")]
#[command(author, version, about = "proofcraft - solve, verify and correct math proofs with an LLM")]
struct Cli {
    /// Path to the problem statement file
    #[arg(default_value = "problem_statement.txt")]
    problem_file: PathBuf,

    /// Mirror all output into this file (truncated at start)
    #[arg(short, long)]
    log: Option<PathBuf>,

    /// Comma-separated extra prompts sent after the problem statement
    #[arg(short, long = "other-prompts", alias = "other_prompts", value_delimiter = ',')]
    other_prompts: Vec<String>,

    /// Maximum number of independent runs
    #[arg(short, long = "max-runs", alias = "max_runs", default_value_t = 10)]
    max_runs: usize,

    /// Model backend
    #[arg(long, value_enum, env = "PROOFCRAFT_BACKEND", default_value = "gemini")]
    backend: BackendKind,

    /// Model name (defaults depend on the backend)
    #[arg(long, env = "PROOFCRAFT_MODEL")]
    model: Option<String>,

    /// Override the backend's base URL
    #[arg(long, env = "PROOFCRAFT_BASE_URL")]
    base_url: Option<String>,

    /// API key (falls back to GEMINI_API_KEY or OPENAI_API_KEY)
    #[arg(long, env = "PROOFCRAFT_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Sampling temperature
    #[arg(long)]
    temperature: Option<f32>,

    /// Maximum answer tokens per call
    #[arg(long)]
    max_tokens: Option<usize>,

    /// Thinking token budget (Gemini)
    #[arg(long)]
    thinking_budget: Option<u32>,

    /// Per-call HTTP timeout in seconds (unbounded when omitted)
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// JSON file overriding the built-in prompts
    #[arg(long)]
    prompts: Option<PathBuf>,

    /// Enable debug diagnostics on stderr
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode - skip call banners and verification details
    #[arg(short, long)]
    quiet: bool,
}

impl Cli {
    fn log_level(&self) -> tracing::Level {
        if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::WARN
        }
    }

    fn agent_config(&self) -> AgentConfig {
        AgentConfig {
            verbose: !self.quiet,
            ..AgentConfig::default()
        }
    }

    fn provider_config(&self) -> Result<ProviderConfig> {
        let api_key = self
            .api_key
            .clone()
            .or_else(|| std::env::var(self.backend.key_env()).ok())
            .filter(|key| !key.is_empty());

        let mut config = match self.backend {
            BackendKind::Gemini => ProviderConfig::gemini(api_key.unwrap_or_default()),
            BackendKind::Openai => ProviderConfig::openai(api_key.unwrap_or_default()),
            BackendKind::Vllm => {
                let config = ProviderConfig::local(VLLM_BASE_URL, VLLM_MODEL);
                match api_key {
                    Some(key) => config.with_api_key(key),
                    None => config,
                }
            }
        };

        if let Some(model) = &self.model {
            config = config.with_model(model.as_str());
        }
        if let Some(base_url) = &self.base_url {
            config = config.with_base_url(base_url.as_str());
        }
        if let Some(secs) = self.timeout_secs {
            config = config.with_timeout(secs);
        }

        let mut sampling = config.sampling.clone();
        if let Some(temperature) = self.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                return Err(Error::invalid_argument("temperature must be between 0 and 2")
                    .with_context("temperature", temperature.to_string()));
            }
            sampling = sampling.with_temperature(temperature);
        }
        if let Some(max_tokens) = self.max_tokens {
            sampling = sampling.with_max_tokens(max_tokens);
        }
        if let Some(budget) = self.thinking_budget {
            sampling = sampling.with_thinking_budget(budget);
        }

        Ok(config.with_sampling(sampling))
    }
}

async fn run(cli: Cli) -> Result<()> {
    let console = Arc::new(match &cli.log {
        Some(path) => Console::with_log_file(path)?,
        None => Console::stdout(),
    });
    if let Some(path) = &cli.log {
        console.line(format!("Logging to file: {}", path.display()))?;
    }
    console.block(">>>>>>> Other prompts:", format!("{:?}", cli.other_prompts))?;

    let problem = read_problem_statement(&cli.problem_file)?;
    let prompts = match &cli.prompts {
        Some(path) => Prompts::from_json_file(path)?,
        None => Prompts::default(),
    };

    let backend = Backend::from_config(cli.provider_config()?)?;
    tracing::info!(backend = backend.name(), model = backend.default_model(), "backend ready");

    let gateway = ProviderGateway::new(backend, console.clone());
    let agent = Agent::new(gateway, console.clone())
        .with_prompts(prompts)
        .with_config(cli.agent_config());
    let driver = Driver::new(agent, cli.max_runs);

    match driver.solve(&problem, &cli.other_prompts).await? {
        Some(solved) => {
            console.line(format!(
                "\n>>>>>>> Solved in run {} after {} iterations.",
                solved.run, solved.iterations
            ))?;
            console.block("### Final Solution ###", &solved.solution)?;
        }
        None => {
            console.line(format!(
                "\n>>>>>>> No verified solution found in {} runs.",
                cli.max_runs
            ))?;
        }
    }

    let usage = driver.agent().gateway().usage();
    tracing::info!(
        calls = usage.total_calls,
        tokens = usage.total_tokens(),
        "token usage"
    );

    console.close_log()
}

/// 0 once the runs finish, solved or not; 1 on a fatal error
fn exit_code(result: Result<()>) -> i32 {
    match result {
        Ok(()) => 0,
        Err(e) => {
            tracing::error!(error = ?e, "fatal");
            eprintln!("Error: {}", e);
            1
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    telemetry::init_tracing(cli.log_level());

    std::process::exit(exit_code(run(cli).await));
}
