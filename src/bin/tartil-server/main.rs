use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, Query, State};
use axum::http::{HeaderValue, StatusCode, header};
use axum::middleware::from_fn;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use clap::Parser;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::services::ServeDir;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnResponse, TraceLayer};
use tracing::{Level, error, info, warn};

mod metrics;

use tartil::corpus::SURAH_COUNT;
use tartil::fetch::CommandFetcher;
use tartil::transcribe::CommandTranscriber;
use tartil::transcript::parse_segments;
use tartil::{
    Engine, Error as AlignError, MATCH_THRESHOLD, Normalization, Opts, OutputType, Pipeline,
    ProcessRequest, ProcessResponse, load_corpus,
};

#[derive(Parser, Debug)]
#[command(name = "tartil-server")]
#[command(about = "HTTP server for aligning Quran recitations to canonical ayat")]
struct Params {
    /// Corpus file: JSON array of verses or Tanzil `surah|ayah|text` lines.
    #[arg(short = 'c', long = "corpus", required = true)]
    corpus_path: String,

    /// Accept a corpus that does not contain all 6,236 ayat.
    #[arg(long = "allow-partial-corpus", default_value_t = false)]
    allow_partial_corpus: bool,

    /// Host interface to bind to.
    #[arg(long = "host", default_value = "127.0.0.1")]
    host: String,

    /// TCP port to listen on.
    #[arg(long = "port", default_value_t = 8080)]
    port: u16,

    /// Maximum request body size (bytes).
    #[arg(long = "max-bytes", default_value_t = 16 * 1024 * 1024)]
    max_bytes: usize,

    /// Per-request timeout (seconds).
    #[arg(long = "timeout-secs", default_value_t = 900)]
    timeout_secs: u64,

    /// A best score must exceed this to count as a match.
    #[arg(long = "threshold", default_value_t = MATCH_THRESHOLD, value_parser = clap::value_parser!(u8).range(0..=100))]
    threshold: u8,

    #[arg(long = "normalization", value_enum, default_value_t = Normalization::Arabic)]
    normalization: Normalization,

    /// Alignment worker threads (defaults to one per CPU).
    #[arg(long = "threads")]
    threads: Option<usize>,

    /// Directory fetched audio is written to and served from.
    #[arg(long = "audio-dir", default_value = "static/audio")]
    audio_dir: PathBuf,

    /// Public URL prefix for `--audio-dir`.
    #[arg(long = "public-audio-url", default_value = "http://localhost:8080/static/audio")]
    public_audio_url: String,

    /// Program used to fetch audio.
    #[arg(long = "fetch-program", default_value = "yt-dlp")]
    fetch_program: String,

    /// Program that prints a JSON transcript for an audio file. `/process` is disabled
    /// without it.
    #[arg(long = "transcribe-program")]
    transcribe_program: Option<String>,

    /// Argument for the transcribe program (repeatable; `{audio}` is replaced by the path).
    #[arg(long = "transcribe-arg", allow_hyphen_values = true)]
    transcribe_args: Vec<String>,
}

type RecitationPipeline = Pipeline<CommandFetcher, CommandTranscriber>;

#[derive(Clone)]
struct AppState {
    engine: Arc<Engine>,
    pipeline: Option<Arc<RecitationPipeline>>,
    normalization: Normalization,
}

#[derive(Debug, Deserialize)]
struct AlignQuery {
    #[serde(default, alias = "output_type")]
    output: Option<String>,
}

#[derive(Debug, Serialize)]
struct CorpusResponse {
    surahs: usize,
    verses: usize,
    canonical: bool,
    threshold: u8,
    normalization: Normalization,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug)]
struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn unavailable(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::SERVICE_UNAVAILABLE,
            message: message.into(),
        }
    }

    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl From<AlignError> for AppError {
    fn from(err: AlignError) -> Self {
        let status = match &err {
            AlignError::MalformedSegment(_) => StatusCode::BAD_REQUEST,
            AlignError::PreconditionFailed(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AlignError::Upstream { .. } => StatusCode::BAD_GATEWAY,
            AlignError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

#[tokio::main]
async fn main() {
    tartil::init_logging();

    if let Err(err) = run().await {
        error!(error = ?err, "tartil-server failed");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let params = Params::parse();

    if let Err(err) = metrics::init() {
        warn!(error = ?err, "metrics disabled (init failed)");
    }

    let addr: SocketAddr = format!("{}:{}", params.host, params.port)
        .parse()
        .context("invalid host/port bind address")?;

    let corpus = load_corpus(&params.corpus_path)
        .with_context(|| format!("failed to load corpus '{}'", params.corpus_path))?;
    if !params.allow_partial_corpus {
        corpus
            .ensure_canonical()
            .context("corpus is incomplete (pass --allow-partial-corpus to use it anyway)")?;
    }

    let opts = Opts {
        threshold: params.threshold,
        normalization: params.normalization,
        output_type: OutputType::Json,
        threads: params.threads,
    };
    let engine = Arc::new(
        Engine::new(Arc::new(corpus), &opts).context("failed to initialize alignment engine")?,
    );

    std::fs::create_dir_all(&params.audio_dir).with_context(|| {
        format!(
            "failed to create audio directory '{}'",
            params.audio_dir.display()
        )
    })?;

    let pipeline = match &params.transcribe_program {
        Some(program) => {
            let mut fetcher = CommandFetcher::new(&params.audio_dir, &params.public_audio_url);
            fetcher.program = params.fetch_program.clone();
            let transcriber = CommandTranscriber::new(program, params.transcribe_args.clone());
            Some(Arc::new(Pipeline::new(fetcher, transcriber, engine.clone())))
        }
        None => {
            warn!("no --transcribe-program configured; /process is disabled");
            None
        }
    };

    let state = AppState {
        engine,
        pipeline,
        normalization: params.normalization,
    };

    let app = Router::new()
        .route("/", get(root))
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics::prometheus_metrics))
        .route("/v1/corpus", get(corpus_info))
        .route("/v1/align", post(align))
        .route("/process", post(process))
        .route_layer(from_fn(metrics::track_http_metrics))
        .with_state(state)
        .nest_service("/static/audio", ServeDir::new(&params.audio_dir))
        .layer(DefaultBodyLimit::max(params.max_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(params.timeout_secs)))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(
                    DefaultMakeSpan::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                .on_response(DefaultOnResponse::new().level(Level::INFO))
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        );

    let listener = TcpListener::bind(addr).await.context("bind failed")?;
    info!(%addr, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = ?err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

async fn root() -> &'static str {
    "tartil-server: POST /v1/align (transcript JSON) or POST /process {\"source_reference\": ...}"
}

async fn healthz() -> &'static str {
    "ok"
}

async fn corpus_info(State(state): State<AppState>) -> Json<CorpusResponse> {
    let corpus = state.engine.corpus();
    Json(CorpusResponse {
        surahs: SURAH_COUNT,
        verses: corpus.len(),
        canonical: corpus.is_canonical(),
        threshold: state.engine.threshold(),
        normalization: state.normalization,
    })
}

async fn align(
    State(state): State<AppState>,
    Query(query): Query<AlignQuery>,
    body: Bytes,
) -> std::result::Result<Response, AppError> {
    let output_type = parse_output_type(query.output.as_deref())
        .map_err(|err| AppError::bad_request(err.to_string()))?;

    let text = std::str::from_utf8(&body)
        .map_err(|err| AppError::bad_request(format!("request body is not UTF-8: {err}")))?;
    let segments = parse_segments(text)
        .map_err(|err| AppError::bad_request(format!("invalid transcript: {err}")))?;

    let engine = state.engine.clone();
    let segment_count = segments.len();
    let (out, matched) = run_cancellable(move |cancel| {
        let mut out = Vec::new();
        let matched = engine.align_to_writer(&segments, &mut out, output_type, &cancel)?;
        Ok((out, matched))
    })
    .await?;
    metrics::record_alignment(segment_count, matched);

    let content_type = HeaderValue::from_static(output_type.content_type());
    Ok(([(header::CONTENT_TYPE, content_type)], out).into_response())
}

async fn process(
    State(state): State<AppState>,
    Json(request): Json<ProcessRequest>,
) -> std::result::Result<Json<ProcessResponse>, AppError> {
    let pipeline = state
        .pipeline
        .clone()
        .ok_or_else(|| AppError::unavailable("no transcriber configured"))?;

    let response = run_cancellable(move |cancel| pipeline.process(&request, &cancel)).await?;
    metrics::record_matches(response.matches.len());
    Ok(Json(response))
}

/// Run blocking alignment work off the async runtime.
///
/// If the request future is dropped (client went away, timeout fired), the token is cancelled
/// and the engine stops at its next check.
async fn run_cancellable<T, F>(work: F) -> std::result::Result<T, AppError>
where
    T: Send + 'static,
    F: FnOnce(CancellationToken) -> tartil::Result<T> + Send + 'static,
{
    let token = CancellationToken::new();
    let guard = token.clone().drop_guard();

    let joined = tokio::task::spawn_blocking(move || work(token)).await;
    guard.disarm();

    match joined {
        Ok(res) => res.map_err(AppError::from),
        Err(err) => Err(AppError::internal(format!("alignment task failed: {err}"))),
    }
}

fn parse_output_type(output: Option<&str>) -> tartil::Result<OutputType> {
    output.map_or(Ok(OutputType::Json), |raw| raw.parse())
}
