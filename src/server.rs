use anyhow::{Context, Result};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{info, warn, Event, Level, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::{ChronoLocal, FormatTime};
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::EnvFilter;

use crate::config::{Mode, RunConfiguration};
use crate::data::FileLister;
use crate::handlers;
use crate::prefix::with_prefix;
use crate::render::{Renderer, SOURCE_TEMPLATE_DIR};
use crate::search::IndexWorker;
use crate::state::{AppState, MetadataDirs};

const DEFAULT_LOG_FILTER: &str = "dragonfly=info,tower_http=warn";
const DEBUG_LOG_FILTER: &str = "dragonfly=debug,tower_http=info";
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Request log lines in the style of a development web server:
/// `127.0.0.1 - - [19/Oct/2026 10:00:00] INFO: message`.
struct AccessLogFormat {
    timer: ChronoLocal,
}

impl AccessLogFormat {
    fn new() -> Self {
        Self {
            timer: ChronoLocal::new("%d/%b/%Y %H:%M:%S".to_string()),
        }
    }
}

impl<S, N> FormatEvent<S, N> for AccessLogFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        write!(writer, "127.0.0.1 - - [")?;
        self.timer.format_time(&mut writer)?;
        write!(writer, "] {}: ", event.metadata().level())?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Install the global subscriber. `RUST_LOG` overrides the default filter.
pub fn init_logging(debug: bool) {
    let default_filter = if debug {
        DEBUG_LOG_FILTER
    } else {
        DEFAULT_LOG_FILTER
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .event_format(AccessLogFormat::new())
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_thread_ids(false)
            .with_thread_names(false)
            .with_file(true)
            .with_line_number(true)
            .with_level(true)
            .compact()
            .init();
    }
}

/// Build the shared state and kick off loading the search index.
///
/// Must run inside a tokio runtime; the index worker is spawned here.
pub fn prepare(config: RunConfiguration, dirs: MetadataDirs) -> Result<Arc<AppState>> {
    dirs.ensure()?;

    let files = FileLister::new(&config.data_dir, config.extension.clone());
    let renderer = Renderer::new(template_dir(config.debug).as_deref())
        .context("Failed to load templates")?;

    let search = IndexWorker::spawn(files.clone(), &dirs.local);
    search.load_index(true);

    Ok(Arc::new(AppState {
        config: Arc::new(config),
        files,
        dirs,
        renderer,
        search,
    }))
}

/// Debug runs render straight from the template sources when they are around.
fn template_dir(debug: bool) -> Option<PathBuf> {
    if !debug {
        return None;
    }
    let dir = PathBuf::from(SOURCE_TEMPLATE_DIR);
    if dir.is_dir() {
        info!("Reloading templates from {}", dir.display());
        Some(dir)
    } else {
        warn!("{} not found, templates will not reload", dir.display());
        None
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/save", post(handlers::save))
        .route("/hints", get(handlers::hints))
        .route("/marker", post(handlers::toggle_marker))
        .route(
            "/settings",
            get(handlers::get_settings).post(handlers::update_settings),
        )
        .route("/translation", post(handlers::add_translation))
        .route("/translation/delete", post(handlers::delete_translation))
        .route("/translations/{lang}", get(handlers::get_translations))
        .route(
            "/translations/export/{lang}",
            get(handlers::export_translations),
        )
        .route(
            "/translations/import/{lang}",
            post(handlers::import_translations),
        )
        .route("/search", post(handlers::search))
        .route("/search/build", post(handlers::build_index))
        .route("/search/status", get(handlers::index_status))
        .route("/stats", get(handlers::stats))
        .route("/tools", get(handlers::tools))
        .route("/{filename}", get(handlers::document))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}

/// The router, mounted below the configured prefix when there is one.
pub fn build_app(state: Arc<AppState>) -> Router {
    let prefix = state.config.prefix.clone();
    let router = build_router(state);
    match prefix {
        Some(prefix) => with_prefix(router, &prefix),
        None => router,
    }
}

pub async fn start_server(config: RunConfiguration) -> Result<()> {
    let dirs = MetadataDirs::resolve(&config.data_dir)?;

    let verb = match config.mode {
        Mode::Annotate => "Annotating",
        Mode::Adjudicate { .. } => "Adjudicating",
    };
    println!(" * {} {}", verb, config.data_dir.display());

    info!("Mode: {}", config.mode);
    info!("Data directory: {:?}", config.data_dir);
    info!("Output directory: {:?}", config.output_dir);
    info!("Metadata directories: {:?}, {:?}", dirs.global, dirs.local);
    if let Some(prefix) = &config.prefix {
        info!("Serving below {}", prefix);
    }

    let port = config.port;
    let state = prepare(config, dirs)?;
    let app = build_app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = signal::ctrl_c().await;
    };
    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        if let Ok(mut stream) = signal(SignalKind::terminate()) {
            let _ = stream.recv().await;
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
