mod api;
mod commands;
mod config;
mod session;
#[cfg(test)]
mod testing;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use api::client::ApiClient;
use commands::{LinkKind, Startup};
use config::{Config, Overrides};
use session::Session;

#[derive(Parser, Debug)]
#[command(name = "foglio", version, about = "Command-line client for the Foglio file-sharing service")]
struct Args {
    /// Backend base URL (default: $FOGLIO_API_URL, then http://localhost:8080)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Base URL of public share pages (default: $FOGLIO_SHARE_URL, then the API URL)
    #[arg(long, global = true)]
    share_url: Option<String>,

    /// Credential store: keychain, file or memory (default: $FOGLIO_CREDENTIAL_STORE, then keychain)
    #[arg(long, global = true)]
    store: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create an account and log in with the issued API key
    Register { name: String },
    /// Log in with an existing API key
    Login { api_key: String },
    /// Forget the stored API key
    Logout,
    /// Show the logged-in user
    Whoami,
    /// List your files
    #[command(alias = "ls")]
    List,
    /// Upload a file
    Upload {
        path: PathBuf,
        /// Make the file publicly accessible
        #[arg(long)]
        public: bool,
    },
    /// Show metadata and links for one file
    Info { id: String },
    /// Print a preview link
    Preview {
        id: String,
        /// The file is public (link carries no API key)
        #[arg(long)]
        public: bool,
    },
    /// Print a download link
    Download {
        id: String,
        /// The file is public (link carries no API key)
        #[arg(long)]
        public: bool,
    },
    /// Print the share page link of a public file
    Share { id: String },
}

impl Command {
    /// `login` and `logout` overwrite the stored key, so skip verifying it.
    /// `register` keeps it until a new account actually exists.
    fn startup(&self) -> Startup {
        match self {
            Command::Login { .. } | Command::Logout => Startup::Replace,
            _ => Startup::Resume,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("foglio=info"))
        .init();

    let args = Args::parse();

    let config = match Config::load(Overrides {
        api_url: args.api_url,
        share_url: args.share_url,
        store: args.store,
    }) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    log::debug!("Using backend {} ({:?} credential store)", config.api_url, config.store);

    let store = match config.store.open() {
        Ok(store) => store,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let session = Session::new(Arc::new(ApiClient::new(&config.api_url, store)));

    commands::start_session(&session, args.command.startup()).await;

    let share_url = config.share_url.as_str();
    let result = match args.command {
        Command::Register { name } => commands::register(&session, &name).await,
        Command::Login { api_key } => commands::login(&session, &api_key).await,
        Command::Logout => commands::logout(&session).await,
        Command::Whoami => commands::whoami(&session).await,
        Command::List => commands::list_files(&session, share_url).await,
        Command::Upload { path, public } => {
            commands::upload(&session, &path, public, share_url).await
        }
        Command::Info { id } => commands::info(&session, &id, share_url).await,
        Command::Preview { id, public } => {
            commands::link(&session, &id, LinkKind::Preview, public).await
        }
        Command::Download { id, public } => {
            commands::link(&session, &id, LinkKind::Download, public).await
        }
        Command::Share { id } => commands::share(&session, &id, share_url).await,
    };

    match result {
        Ok(output) => {
            print!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
