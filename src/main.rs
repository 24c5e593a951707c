use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

mod commands;

/// Related-code retrieval for pull request review.
#[derive(Parser, Debug)]
#[command(name = "sift", version, about)]
struct Cli {
    /// Config file (falls back to `SIFT_CONFIG`, then config/default.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Index every supported file of a repository
    Index {
        #[command(flatten)]
        source: SourceArgs,
    },
    /// Select related code for the given files
    Context {
        #[command(flatten)]
        source: SourceArgs,
        #[arg(long, value_enum, default_value_t = OutputFormat::Xml)]
        format: OutputFormat,
        /// Repository-relative paths of the files under review
        #[arg(required = true)]
        files: Vec<String>,
    },
    /// Select related code for the changed files of a pull request
    Review {
        /// GitHub repository as owner/repo
        #[arg(long)]
        repo: String,
        /// Pull request number
        #[arg(long)]
        pr: u64,
        /// Re-index the head versions of changed files before selecting context
        #[arg(long)]
        index_changed: bool,
        #[arg(long, value_enum, default_value_t = OutputFormat::Xml)]
        format: OutputFormat,
    },
}

#[derive(Args, Debug)]
struct SourceArgs {
    #[command(flatten)]
    location: Location,
    /// Branch, tag, or commit (GitHub only; defaults to the default branch)
    #[arg(long = "ref", requires = "repo")]
    git_ref: Option<String>,
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct Location {
    /// GitHub repository as owner/repo
    #[arg(long)]
    repo: Option<String>,
    /// Local checkout directory
    #[arg(long)]
    path: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Xml,
    Json,
}

fn init_subscriber() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_subscriber();

    let config = sift_core::bootstrap::load_config(cli.config.as_deref())?;
    match cli.command {
        Command::Index { source } => commands::index(&config, &source).await,
        Command::Context {
            source,
            format,
            files,
        } => commands::context(&config, &source, &files, format).await,
        Command::Review {
            repo,
            pr,
            index_changed,
            format,
        } => commands::review(&config, &repo, pr, index_changed, format).await,
    }
}
