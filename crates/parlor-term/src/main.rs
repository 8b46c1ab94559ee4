//! Parlor terminal entry point.
//!
//! # Usage
//!
//! ```bash
//! # Chat as user 1 with user 2 against a local backend
//! PARLOR_SESSION_TOKEN=... parlor --user-id 1 --nickname alice --partner 2
//!
//! # Drop messages typed before the socket opens instead of queueing them
//! parlor --user-id 1 --nickname alice --drop-while-connecting
//! ```

use clap::Parser;
use parlor_app::Runtime;
use parlor_client::{ClientConfig, DEFAULT_API_BASE, DEFAULT_SOCKET_URL, HttpDirectory};
use parlor_core::{Identity, SendPolicy, connection::DEFAULT_QUEUE_CAPACITY};
use parlor_term::TerminalDriver;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Parlor realtime chat client
#[derive(Parser, Debug)]
#[command(name = "parlor")]
#[command(about = "Terminal client for Parlor private chats")]
#[command(version)]
struct Args {
    /// REST base URL of the forum backend
    #[arg(long, default_value = DEFAULT_API_BASE)]
    api_url: String,

    /// Websocket URL of the forum backend
    #[arg(long, default_value = DEFAULT_SOCKET_URL)]
    socket_url: String,

    /// Id of the signed-in user
    #[arg(long)]
    user_id: u64,

    /// Nickname of the signed-in user
    #[arg(long)]
    nickname: String,

    /// Session credential, sent as the `session_token` cookie
    #[arg(long, env = "PARLOR_SESSION_TOKEN", hide_env_values = true)]
    session_token: Option<String>,

    /// Open the chat with this user on start
    #[arg(long)]
    partner: Option<u64>,

    /// Drop messages typed while the socket is opening instead of queueing
    #[arg(long)]
    drop_while_connecting: bool,

    /// Messages held while the socket is opening
    #[arg(long, default_value_t = DEFAULT_QUEUE_CAPACITY)]
    queue_capacity: usize,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

impl Args {
    fn client_config(&self) -> ClientConfig {
        let policy = if self.drop_while_connecting {
            SendPolicy::Drop
        } else {
            SendPolicy::Queue { capacity: self.queue_capacity }
        };

        let config = ClientConfig {
            api_base: self.api_url.trim_end_matches('/').to_string(),
            socket_url: self.socket_url.clone(),
            ..ClientConfig::default()
        }
        .with_send_policy(policy);

        match &self.session_token {
            Some(token) => config.with_session_token(token.clone()),
            None => config,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    // Stdout belongs to the chat transcript
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config = args.client_config();
    if config.session_token.is_none() {
        tracing::warn!("no session token given, the backend will reject requests");
    }

    let directory = HttpDirectory::new(&config)?;
    let driver = TerminalDriver::new(config.socket_url.clone(), config.session_token.clone());
    let identity = Identity::new(args.user_id, args.nickname.clone());

    tracing::info!(user_id = identity.id, api = %config.api_base, "parlor starting");

    let mut runtime = Runtime::new(driver, directory, identity, config.connection);

    if let Some(partner) = args.partner
        && runtime.activate(partner).await?
    {
        return Ok(());
    }

    runtime.run().await?;

    Ok(())
}
