use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod util;

use commands::ingredient::IngredientCommands;
use commands::profile::ProfileCommands;
use commands::recipe::RecipeCommands;

#[derive(Parser)]
#[command(name = "foodstats", version, about = "FoodStats CLI: track a meal's ingredients, browse recipes, analyze nutrition")]
struct Cli {
    /// API base URL
    #[arg(long, env = "FOODSTATS_API_URL", default_value = "http://localhost:8080")]
    api_url: String,

    /// Session id; defaults to one stored in the user config dir
    #[arg(long, env = "FOODSTATS_SESSION_ID")]
    session_id: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check API and catalog health
    Health,
    /// Work with the session's ingredient list
    Ingredient {
        #[command(subcommand)]
        command: IngredientCommands,
    },
    /// Autocomplete catalog ingredient names by prefix
    Suggest {
        query: String,
    },
    /// Browse and add recipes
    Recipe {
        #[command(subcommand)]
        command: RecipeCommands,
    },
    /// Health-score the session's list (or a JSON ingredient list)
    Analyze {
        /// Read the ingredient list from file instead (use '-' for stdin)
        #[arg(long, short = 'f')]
        file: Option<String>,
    },
    /// Smart recipe recommendations for the given names (default: the session's list)
    Recommend {
        names: Vec<String>,
    },
    /// Manage the session's profile
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("FOODSTATS_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let session_id = util::resolve_session_id(cli.session_id, &util::config_path())
        .unwrap_or_else(|e| util::exit_error(&e, Some("Pass --session-id or set FOODSTATS_SESSION_ID")));
    let api_url = cli.api_url.as_str();

    let code = match cli.command {
        Commands::Health => commands::health::run(api_url, &session_id).await,
        Commands::Ingredient { command } => commands::ingredient::run(api_url, &session_id, command).await,
        Commands::Suggest { query } => commands::ingredient::suggest(api_url, &session_id, &query).await,
        Commands::Recipe { command } => commands::recipe::run(api_url, &session_id, command).await,
        Commands::Analyze { file } => commands::analyze::run(api_url, &session_id, file.as_deref()).await,
        Commands::Recommend { names } => commands::recommend::run(api_url, &session_id, names).await,
        Commands::Profile { command } => commands::profile::run(api_url, &session_id, command).await,
    };

    std::process::exit(code);
}
