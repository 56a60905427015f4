use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;

use commands::AppContext;

#[derive(Parser)]
#[command(name = "habitual", version, about = "Habitual CLI")]
struct Cli {
    /// Keep everything in memory for this run instead of the database
    #[arg(long, global = true)]
    memory: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ideal habit management
    Habits {
        #[command(subcommand)]
        action: commands::habits::HabitsAction,
    },
    /// Suggestions: serve, generate, list
    Suggest {
        #[command(subcommand)]
        action: commands::suggest::SuggestAction,
    },
    /// Feedback on suggestions
    Feedback {
        #[command(subcommand)]
        action: commands::feedback::FeedbackAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// OpenAI API key management
    Auth {
        #[command(subcommand)]
        action: commands::auth::AuthAction,
    },
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("HABITUAL_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

async fn dispatch(cli: Cli) -> commands::CommandResult {
    match cli.command {
        Commands::Config { action } => commands::config::run(action),
        Commands::Auth { action } => commands::auth::run(action),
        Commands::Habits { action } => {
            let ctx = AppContext::open(cli.memory)?;
            commands::habits::run(action, &ctx).await
        }
        Commands::Suggest { action } => {
            let ctx = AppContext::open(cli.memory)?;
            commands::suggest::run(action, &ctx).await
        }
        Commands::Feedback { action } => {
            let ctx = AppContext::open(cli.memory)?;
            commands::feedback::run(action, &ctx).await
        }
    }
}

#[tokio::main]
async fn main() {
    init_logging();
    let cli = Cli::parse();

    if let Err(e) = dispatch(cli).await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
