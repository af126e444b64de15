pub mod client;
pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use client::ApiClient;

pub const DEFAULT_SERVER: &str = "http://localhost:3001";

#[derive(Parser)]
#[command(name = "nexus")]
#[command(about = "Nexus CLI - Command-line client for the School Nexus API")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, env = "NEXUS_SERVER", default_value = DEFAULT_SERVER, help = "API server base URL")]
    pub server: String,

    #[arg(long, global = true, env = "NEXUS_TOKEN", help = "Bearer token for protected endpoints")]
    pub token: Option<String>,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Check server health from the /api/health endpoint")]
    Health,

    #[command(about = "Log in and print a bearer token")]
    Login {
        #[arg(long, help = "Account email")]
        email: String,
        #[arg(long, help = "Account password")]
        password: String,
    },

    #[command(about = "GET an API path, e.g. /api/students")]
    Get {
        #[arg(help = "API path")]
        path: String,
    },

    #[command(about = "POST a JSON body to an API path")]
    Post {
        #[arg(help = "API path")]
        path: String,
        #[arg(long, help = "JSON request body")]
        data: String,
    },

    #[command(about = "PUT a JSON body to an API path")]
    Put {
        #[arg(help = "API path")]
        path: String,
        #[arg(long, help = "JSON request body")]
        data: String,
    },

    #[command(about = "DELETE an API path")]
    Delete {
        #[arg(help = "API path")]
        path: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);
    let client = ApiClient::new(&cli.server, cli.token.clone())?;

    match cli.command {
        Commands::Health => commands::health::handle(&client, output_format).await,
        Commands::Login { email, password } => commands::auth::login(&client, &email, &password, output_format).await,
        Commands::Get { path } => commands::api::get(&client, &path, output_format).await,
        Commands::Post { path, data } => commands::api::post(&client, &path, &data, output_format).await,
        Commands::Put { path, data } => commands::api::put(&client, &path, &data, output_format).await,
        Commands::Delete { path } => commands::api::delete(&client, &path, output_format).await,
    }
}
