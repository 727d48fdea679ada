mod calendar;
mod config;
mod error;
mod store;
mod v1;

use std::{
    net::SocketAddr,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use axum::{routing::get, Router};
use axum_server::tls_rustls::RustlsConfig;
use clap::Parser;
use todo_api::v1::{Settings, Theme};
use tokio::sync::{mpsc, Mutex};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::{
    calendar::{Calendar, CalendarClient, ChannelNotifier, Completion},
    config::{Args, Config},
    store::TodoStore,
};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("back=info")),
        )
        .init();

    let args = Args::parse();
    let config = Config::load(&args.config)?;

    let (state, notices) = AppState::new(&config)?;
    let state = Arc::new(state);
    calendar::spawn_worker(state.calendar.clone(), notices);

    let app = app(state).into_make_service();
    let addr = SocketAddr::new(args.bind, args.port);

    match args.tls() {
        Some((cert, key)) => {
            // reqwest and axum-server each enable a rustls backend
            let _ = rustls::crypto::ring::default_provider().install_default();

            let tls = RustlsConfig::from_pem_file(cert, key).await?;
            info!(%addr, "listening with tls");
            axum_server::bind_rustls(addr, tls).serve(app).await?;
        }
        None => {
            info!(%addr, "listening");
            axum_server::bind(addr).serve(app).await?;
        }
    }

    Ok(())
}

pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/api/v1", v1::router())
        .route("/health", get(v1::health))
        .with_state(state)
}

#[derive(Default, Debug)]
pub struct AppState {
    pub generation: AtomicU64,
    pub todos: Mutex<TodoStore>,
    pub theme: Mutex<Theme>,
    pub calendar: Arc<Calendar>,
}

impl AppState {
    pub fn new(config: &Config) -> eyre::Result<(Self, mpsc::UnboundedReceiver<Completion>)> {
        let client = config.calendar.clone().map(CalendarClient::new).transpose()?;
        let calendar = Arc::new(Calendar::new(client, config.calendar_enabled));

        let (sender, receiver) = mpsc::unbounded_channel();
        let notifier = ChannelNotifier::new(calendar.clone(), sender);

        let state = Self {
            generation: AtomicU64::new(0),
            todos: Mutex::new(TodoStore::with_notifier(notifier)),
            theme: Mutex::new(config.theme),
            calendar,
        };

        Ok((state, receiver))
    }

    pub fn increment_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::Relaxed)
    }

    pub async fn settings(&self) -> Settings {
        Settings {
            theme: *self.theme.lock().await,
            calendar_enabled: self.calendar.is_enabled(),
            calendar_connected: self.calendar.is_connected(),
        }
    }
}
