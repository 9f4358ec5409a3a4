//! commitgen - CLI entry point.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use commitgen::collect_prompt_data;
use commitgen::config::{self, Overrides, Settings};
use commitgen::git::GitRepo;
use commitgen::hook::{current_exe, install_hook};
use commitgen::llm::build_provider;
use commitgen::prompt::{build_messages, dump_messages};
use commitgen::session::{GitCommitter, Outcome, SessionOptions, run_session};
use commitgen::ui::TerminalUi;

/// Draft commit messages for staged changes with an LLM.
#[derive(Parser, Debug)]
#[command(name = "commitgen")]
#[command(about = "Draft git commit messages for staged changes with an LLM")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Repository path (defaults to the current directory)
    #[arg(long, global = true)]
    repo: Option<PathBuf>,

    /// Backend: openai, ollama, anthropic or gemini
    #[arg(long, global = true)]
    provider: Option<String>,

    /// Base URL of the backend API
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// API key for OpenAI-compatible backends
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// Model name
    #[arg(long, global = true)]
    model: Option<String>,

    /// Anthropic API key
    #[arg(long, global = true)]
    anthropic_key: Option<String>,

    /// Gemini API key
    #[arg(long, global = true)]
    gemini_key: Option<String>,

    /// Number of recent commits to include
    #[arg(long, global = true)]
    recent: Option<usize>,

    /// Maximum number of staged files to include
    #[arg(long, global = true)]
    max_files: Option<usize>,

    /// Condense file attachments to their structure
    #[arg(long, global = true)]
    summarize: bool,

    /// Sampling temperature
    #[arg(long, global = true)]
    temperature: Option<f64>,

    /// File with custom instructions appended to the prompt
    #[arg(long, global = true)]
    instructions: Option<PathBuf>,

    /// System prompt template ({{.RepositoryName}} and {{.BranchName}} are substituted)
    #[arg(long, global = true)]
    prompt_template: Option<String>,

    /// Ask for Conventional Commits format
    #[arg(long, global = true)]
    conventional: bool,

    /// Extra glob pattern of files to leave out (repeatable)
    #[arg(long = "ignore", value_name = "PATTERN", global = true)]
    ignore: Vec<String>,

    /// Hook mode: write the accepted message to FILE instead of committing
    #[arg(long, value_name = "FILE", global = true)]
    hook: Option<PathBuf>,

    /// Config file (defaults to ~/.commitgen.json)
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug, Clone)]
enum Command {
    /// Generate a message and confirm it interactively (default)
    Suggest,

    /// Print the prompt messages as JSON instead of calling a backend
    DumpPrompt {
        /// Write the JSON to this file instead of stdout
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,
    },

    /// Install a prepare-commit-msg hook that runs commitgen
    InstallHook,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            provider: self.provider.clone(),
            base_url: self.base_url.clone(),
            api_key: self.api_key.clone(),
            model: self.model.clone(),
            anthropic_key: self.anthropic_key.clone(),
            gemini_key: self.gemini_key.clone(),
            recent: self.recent,
            max_files: self.max_files,
            summarize: self.summarize.then_some(true),
            temperature: self.temperature,
            conventional: self.conventional.then_some(true),
            prompt_template: self.prompt_template.clone(),
            ignore: self.ignore.clone(),
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

/// Set up logging/tracing on stderr so stdout stays clean for dumps.
fn setup_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::try_new("commitgen=debug,warn").unwrap_or_else(|_| EnvFilter::new("warn"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    if verbose {
        debug!("Debug logging enabled");
    }
}

async fn run(cli: Cli) -> Result<()> {
    // Step 1: Open git repository
    let repo = GitRepo::discover(cli.repo.as_deref())?;

    let dump_output = match cli.command.clone().unwrap_or(Command::Suggest) {
        Command::InstallHook => {
            let path = install_hook(&repo.hooks_dir(), &current_exe())?;
            println!("Hook installed to {}", path.display());
            return Ok(());
        }
        Command::DumpPrompt { output } => Some(output),
        Command::Suggest => None,
    };

    // Step 2: Resolve settings
    let file_config = config::load_file_config(cli.config.as_deref())?;
    let settings: Settings = config::resolve(&cli.overrides(), &file_config)?;
    let instructions = config::read_instructions(cli.instructions.as_deref())?;

    // Step 3: Collect staged changes and build the prompt
    let data = collect_prompt_data(&repo, &settings.collect_options(instructions))?;
    let messages = build_messages(&data);
    debug!(
        "Prompt: system {} bytes, user {} bytes",
        messages.system.text().len(),
        messages.user.text().len()
    );

    if let Some(output) = dump_output {
        dump_messages(&messages.to_vec(), output.as_deref())
            .context("Failed to write prompt dump")?;
        return Ok(());
    }

    // Step 4: Generate and confirm
    let provider = build_provider(settings.provider, &settings.provider_config())?;
    let options = SessionOptions {
        temperature: settings.temperature,
        conventional: settings.conventional,
        hook_file: cli.hook.clone(),
    };
    let mut ui = TerminalUi::new();
    let committer = GitCommitter::new(repo.root());

    match run_session(provider.as_ref(), &messages, &options, &mut ui, &committer).await? {
        Outcome::Committed => println!("✓ Committed"),
        Outcome::WroteHookFile(path) => debug!("Wrote message to {}", path.display()),
        Outcome::Cancelled => {}
    }

    Ok(())
}
