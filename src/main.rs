use std::path::{Path, PathBuf};

use clap::Parser;
use pathgate::{
    AppState, build_app,
    config::{DatabaseConfig, PathgateConfig},
    db::{DbError, DbPool, DbResult, SeedFile},
    observability,
};

const DEFAULT_CONFIG_PATH: &str = "pathgate.toml";

#[derive(Parser, Debug)]
#[command(version, about = "Data-driven URL authorization service", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to config file (defaults to ./pathgate.toml if it exists,
    /// otherwise built-in defaults are used)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(clap::Subcommand, Debug)]
enum Command {
    /// Start the server (default)
    Serve,
    /// Evaluate one authorization decision and print it as JSON
    Check {
        /// Principal username. Omit to check as an anonymous caller.
        #[arg(short, long)]
        principal: Option<String>,
        /// Request path, optionally with a query string
        #[arg(long)]
        path: String,
    },
    /// Print the resource rule table in match order
    Rules,
    /// Run SQLite migrations and optionally import a seed file
    Migrate {
        /// Seed file to import after migrating (defaults to the configured one)
        #[arg(short, long)]
        seed: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    let config = load_config(args.config.as_deref());

    let _tracing_guard = match observability::init_tracing(&config.observability) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => run_server(config).await,
        Command::Check { principal, path } => run_check(config, principal, path).await,
        Command::Rules => run_rules(config).await,
        Command::Migrate { seed } => run_migrate(config, seed).await,
    }
}

fn load_config(explicit: Option<&Path>) -> PathgateConfig {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let default = PathBuf::from(DEFAULT_CONFIG_PATH);
            if !default.exists() {
                return PathgateConfig::default();
            }
            default
        }
    };

    match PathgateConfig::from_file(&path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config from {}: {}", path.display(), e);
            std::process::exit(1);
        }
    }
}

/// Connect the configured store, migrating and seeding SQLite as configured.
async fn open_store(config: &DatabaseConfig) -> DbResult<DbPool> {
    let db = DbPool::from_config(config).await?;

    #[cfg(feature = "database-sqlite")]
    if let DatabaseConfig::Sqlite(sqlite) = config {
        if sqlite.run_migrations {
            db.run_migrations().await?;
        }
        if let Some(path) = &sqlite.seed_file {
            tracing::info!(path = %path.display(), "Importing seed file");
            db.import_seed(&SeedFile::from_file(path)?).await?;
        }
    }

    Ok(db)
}

async fn open_state(config: PathgateConfig) -> AppState {
    match open_store(&config.database).await {
        Ok(db) => {
            tracing::info!(backend = db.backend(), "Store initialized");
            AppState::new(config, db)
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to initialize store");
            std::process::exit(1);
        }
    }
}

async fn run_server(config: PathgateConfig) {
    let addr = config.server.socket_addr();
    let state = open_state(config).await;

    if !state.authorizer.is_enabled() {
        tracing::warn!("Path authorization is disabled; every request will be permitted");
    } else if state.config.auth.authz.preload {
        match state.authorizer.registry().rules().await {
            Ok(rules) => tracing::info!(
                rules = rules.len(),
                collisions = rules.collisions().len(),
                "Resource rules preloaded"
            ),
            Err(e) => {
                tracing::error!(error = %e, "Failed to preload resource rules");
                std::process::exit(1);
            }
        }
    }

    let db = state.db.clone();
    let app = build_app(state);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(address = %addr, error = %e, "Failed to bind to address");
            std::process::exit(1);
        }
    };
    tracing::info!("Server listening on http://{}", addr);

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(error = %e, "Server error");
    }

    db.close().await;
}

async fn run_check(config: PathgateConfig, principal: Option<String>, path: String) {
    let state = open_state(config).await;

    match state.authorizer.evaluate(principal.as_deref(), &path).await {
        Ok(outcome) => {
            match serde_json::to_string_pretty(&outcome) {
                Ok(json) => println!("{json}"),
                Err(e) => eprintln!("Error: {e}"),
            }
            if !outcome.decision.is_permit() {
                std::process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(2);
        }
    }
}

async fn run_rules(config: PathgateConfig) {
    let state = open_state(config).await;

    let rules = match state.authorizer.registry().rules().await {
        Ok(rules) => rules,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let width = rules
        .rules()
        .iter()
        .map(|rule| rule.pattern().len())
        .max()
        .unwrap_or(0);
    for rule in rules.rules() {
        println!("{:width$}  {}", rule.pattern(), rule.required());
    }
    for collision in rules.collisions() {
        println!(
            "collision: {} bound to {}, overwritten by {}",
            collision.pattern, collision.overwritten, collision.winner
        );
    }
}

async fn run_migrate(config: PathgateConfig, seed: Option<PathBuf>) {
    #[cfg(feature = "database-sqlite")]
    let is_sqlite = matches!(config.database, DatabaseConfig::Sqlite(_));
    #[cfg(not(feature = "database-sqlite"))]
    let is_sqlite = false;

    if !is_sqlite {
        eprintln!("Error: migrate requires [database] type = \"sqlite\"");
        std::process::exit(1);
    }

    let result = async {
        let db = DbPool::from_config(&config.database).await?;
        db.run_migrations().await?;
        if let Some(path) = seed.as_ref().or(config.database.seed_file()) {
            tracing::info!(path = %path.display(), "Importing seed file");
            db.import_seed(&SeedFile::from_file(path)?).await?;
        }
        db.close().await;
        Ok::<(), DbError>(())
    }
    .await;

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
