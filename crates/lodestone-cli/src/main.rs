use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod render;

#[derive(Parser)]
#[command(name = "lodestone")]
#[command(about = "Lodestone CLI - store files and search them by meaning", long_about = None)]
struct Cli {
    /// Service base URL (overrides config.toml and LODESTONE_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Directory holding config.toml and session.toml
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    /// Print the application snapshot as JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and remember the session
    Login {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
    },
    /// Create an account and sign in
    Register {
        #[arg(long)]
        email: String,
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
    },
    /// Forget the stored session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Manage uploaded files
    Files {
        #[command(subcommand)]
        action: FilesAction,
    },
    /// Run a semantic query over uploaded files
    Search {
        query: String,
        #[arg(long)]
        collection: Option<String>,
        #[arg(long)]
        max_results: Option<i64>,
        #[arg(long)]
        score_threshold: Option<f64>,
    },
}

#[derive(Subcommand)]
enum FilesAction {
    /// List uploaded files
    List,
    /// Upload a local file
    Upload { path: PathBuf },
    /// Delete a file by id
    Delete { id: i64 },
    /// Download a file by id
    Download {
        id: i64,
        /// Name to save under (defaults to the server's name)
        #[arg(long)]
        name: Option<String>,
    },
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let ctx = commands::Context::connect(cli.api_url, cli.config_dir.as_deref(), cli.json).await?;

    match cli.command {
        Commands::Login { username, password } => commands::auth::login(&ctx, username, password).await?,
        Commands::Register {
            email,
            username,
            password,
        } => commands::auth::register(&ctx, email, username, password).await?,
        Commands::Logout => commands::auth::logout(&ctx).await?,
        Commands::Whoami => commands::auth::whoami(&ctx).await?,
        Commands::Files { action } => match action {
            FilesAction::List => commands::files::list(&ctx).await?,
            FilesAction::Upload { path } => commands::files::upload(&ctx, &path).await?,
            FilesAction::Delete { id } => commands::files::delete(&ctx, id).await?,
            FilesAction::Download { id, name } => commands::files::download(&ctx, id, name).await?,
        },
        Commands::Search {
            query,
            collection,
            max_results,
            score_threshold,
        } => commands::search::run(&ctx, query, collection, max_results, score_threshold).await?,
    }

    Ok(())
}
