use std::sync::Arc;

use bagroom::clock::{SharedClock, SystemClock};
use bagroom::config::Config;
use bagroom::lease::WriterLease;
use bagroom::storage::SqliteKv;
use bagroom::{build_app, cli, db, AppState};
use tokio::net::TcpListener;

const USAGE: &str = "usage:
  bagroom [serve]
  bagroom import <file.json> <account-id>
  bagroom create-club-account <email> <username> <password> <club-name>";

enum Command {
    Serve,
    Import { file: String, account_id: String },
    CreateClubAccount { email: String, username: String, password: String, club_name: String },
}

impl Command {
    fn parse(args: &[String]) -> Option<Self> {
        match args.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
            [] | ["serve"] => Some(Command::Serve),
            ["import", file, account_id] => Some(Command::Import {
                file: file.to_string(),
                account_id: account_id.to_string(),
            }),
            ["create-club-account", email, username, password, club_name] => Some(Command::CreateClubAccount {
                email: email.to_string(),
                username: username.to_string(),
                password: password.to_string(),
                club_name: club_name.to_string(),
            }),
            _ => None,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Command::Serve => "server",
            Command::Import { .. } => "import",
            Command::CreateClubAccount { .. } => "create-club-account",
        }
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
            (Ok(mut sigterm), Ok(mut sigint)) => {
                tokio::select! {
                    _ = sigterm.recv() => {}
                    _ = sigint.recv() => {}
                }
            }
            _ => {
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
    tracing::info!("shutting down");
}

async fn run(command: Command, state: AppState, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::Serve => {
            let app = build_app(state, config.secure_cookies).await?;
            let listener = TcpListener::bind(config.bind_addr).await?;

            tracing::info!("listening on {}", config.bind_addr);
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await?;
        }
        Command::Import { file, account_id } => {
            cli::import_bags(&state.stores, &file, &account_id).await?;
        }
        Command::CreateClubAccount { email, username, password, club_name } => {
            cli::create_club_account(&state.stores, &email, &username, &password, &club_name).await?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();
    let config = Config::from_env();
    let args: Vec<String> = std::env::args().skip(1).collect();

    let Some(command) = Command::parse(&args) else {
        eprintln!("{USAGE}");
        std::process::exit(2);
    };

    let pool = db::init_pool(&config.database_url).await?;
    let clock: SharedClock = Arc::new(SystemClock);

    // one writer per database: the stores hold their state in memory
    let holder = format!("{}-{}", command.name(), std::process::id());
    let lease = WriterLease::acquire(SqliteKv::new(pool.clone()), holder, clock.clone()).await?;
    let heartbeat = lease.spawn_heartbeat();

    let result = match AppState::load(pool, clock, config.login_delay).await {
        Ok(state) => {
            let result = run(command, state.clone(), &config).await;
            state.stores.persister.flush().await;
            result
        }
        Err(e) => Err(e.into()),
    };

    heartbeat.abort();
    lease.release().await?;
    result
}
