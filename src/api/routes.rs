//! API route handlers.
//!
//! All endpoints speak JSON. Sessions are keyed by the `x-session-id`
//! header; each one is an independent `Engine` behind its own mutex, so
//! calls against one session are strictly serialised. Only a successful
//! initialize stores a session and reset removes it, so the store holds
//! nothing but sessions in play.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::engine::{Engine, SessionStats, SpinResult};
use crate::types::{EngineError, Phase, StrategyId};

/// Header that selects the session.
pub const SESSION_HEADER: &str = "x-session-id";
pub const DEFAULT_SESSION: &str = "default";

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

/// One engine per open session.
pub struct SessionStore {
    config: EngineConfig,
    sessions: RwLock<HashMap<String, Arc<Mutex<Engine>>>>,
}

impl SessionStore {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// The engine for `key`, if a session is open under it.
    pub async fn get(&self, key: &str) -> Option<Arc<Mutex<Engine>>> {
        self.sessions.read().await.get(key).map(Arc::clone)
    }

    /// Initialize a session under `key`. The engine is stored only once
    /// it has accepted the bankroll and strategies.
    pub async fn open(
        &self,
        key: &str,
        bankroll: Decimal,
        strategies: &[StrategyId],
    ) -> Result<Arc<Mutex<Engine>>, EngineError> {
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(key) {
            return Err(EngineError::AlreadyInitialized);
        }
        let mut engine = Engine::new(self.config.clone());
        engine.initialize(bankroll, strategies)?;
        let engine = Arc::new(Mutex::new(engine));
        sessions.insert(key.to_string(), Arc::clone(&engine));
        Ok(engine)
    }

    /// Drop the session under `key`, returning its engine if there was one.
    pub async fn remove(&self, key: &str) -> Option<Arc<Mutex<Engine>>> {
        self.sessions.write().await.remove(key)
    }

    /// Stats for a key with no open session.
    pub fn idle_stats(&self) -> SessionStats {
        Engine::new(self.config.clone()).stats()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

pub type AppState = Arc<SessionStore>;

fn session_key(headers: &HeaderMap) -> String {
    headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(DEFAULT_SESSION)
        .to_string()
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum ApiError {
    Engine(EngineError),
    BadRequest(String),
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
    pub kind: &'static str,
}

impl From<EngineError> for ApiError {
    fn from(e: EngineError) -> Self {
        ApiError::Engine(e)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(e: JsonRejection) -> Self {
        ApiError::BadRequest(e.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, kind) = match self {
            ApiError::Engine(e) if e.is_lifecycle() => (StatusCode::CONFLICT, e.to_string(), e.kind()),
            ApiError::Engine(e) => (StatusCode::BAD_REQUEST, e.to_string(), e.kind()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, "BadRequest"),
        };
        let body = ErrorBody {
            success: false,
            error,
            kind,
        };
        (status, Json(body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Strategies as a list of codes or as a `{code: enabled}` map.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum StrategySelection {
    List(Vec<String>),
    Flags(BTreeMap<String, bool>),
}

impl StrategySelection {
    /// Known, enabled strategies. Unknown codes are logged and skipped.
    pub fn resolve(&self) -> Vec<StrategyId> {
        let names: Vec<&str> = match self {
            StrategySelection::List(names) => names.iter().map(String::as_str).collect(),
            StrategySelection::Flags(flags) => flags
                .iter()
                .filter(|(_, enabled)| **enabled)
                .map(|(name, _)| name.as_str())
                .collect(),
        };
        names
            .into_iter()
            .filter_map(|name| match name.parse::<StrategyId>() {
                Ok(id) => Some(id),
                Err(e) => {
                    warn!(strategy = name, error = %e, "Ignoring unknown strategy");
                    None
                }
            })
            .collect()
    }
}

/// A spin as sent by a client: `"17"`, `"00"` or `17`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Token {
    Text(String),
    Int(i64),
}

impl Token {
    pub fn as_raw(&self) -> String {
        match self {
            Token::Text(s) => s.clone(),
            Token::Int(n) => n.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct InitializeRequest {
    pub bankroll: Decimal,
    pub strategies: StrategySelection,
}

#[derive(Debug, Deserialize)]
pub struct WarmupRequest {
    pub numbers: Vec<Token>,
}

#[derive(Debug, Deserialize)]
pub struct SpinRequest {
    pub number: Token,
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct Ack {
    pub success: bool,
    pub message: String,
    pub phase: Phase,
    pub session_id: Option<Uuid>,
}

impl Ack {
    fn from_engine(engine: &Engine, message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            phase: engine.phase(),
            session_id: engine.session_id(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SpinResponse {
    pub success: bool,
    #[serde(flatten)]
    pub result: SpinResult,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub success: bool,
    #[serde(flatten)]
    pub stats: SessionStats,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

/// POST /api/initialize
pub async fn initialize(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<InitializeRequest>, JsonRejection>,
) -> Result<Json<Ack>, ApiError> {
    let Json(req) = payload?;
    let strategies = req.strategies.resolve();
    let key = session_key(&headers);
    let engine = state.open(&key, req.bankroll, &strategies).await?;
    let open_sessions = state.len().await;
    let engine = engine.lock().await;
    info!(key = %key, sessions = open_sessions, "Session opened via API");
    Ok(Json(Ack::from_engine(
        &engine,
        format!("Initialized with {} strategies", strategies.len()),
    )))
}

/// POST /api/warmup
pub async fn warmup(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<WarmupRequest>, JsonRejection>,
) -> Result<Json<Ack>, ApiError> {
    let Json(req) = payload?;
    let tokens: Vec<String> = req.numbers.iter().map(Token::as_raw).collect();
    let engine = state
        .get(&session_key(&headers))
        .await
        .ok_or(EngineError::NotInitialized)?;
    let mut engine = engine.lock().await;
    engine.warmup(&tokens)?;
    Ok(Json(Ack::from_engine(&engine, "Warmup complete")))
}

/// POST /api/spin
pub async fn spin(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<SpinRequest>, JsonRejection>,
) -> Result<Json<SpinResponse>, ApiError> {
    let Json(req) = payload?;
    let engine = state
        .get(&session_key(&headers))
        .await
        .ok_or(EngineError::NotInitialized)?;
    let mut engine = engine.lock().await;
    let result = engine.process_spin(&req.number.as_raw())?;
    Ok(Json(SpinResponse {
        success: true,
        result,
    }))
}

/// GET /api/stats
pub async fn stats(State(state): State<AppState>, headers: HeaderMap) -> Json<StatsResponse> {
    let stats = match state.get(&session_key(&headers)).await {
        Some(engine) => {
            let engine = engine.lock().await;
            engine.stats()
        }
        None => state.idle_stats(),
    };
    Json(StatsResponse {
        success: true,
        stats,
    })
}

/// POST /api/reset
pub async fn reset(State(state): State<AppState>, headers: HeaderMap) -> Json<Ack> {
    if let Some(engine) = state.remove(&session_key(&headers)).await {
        engine.lock().await.reset();
    }
    Json(Ack {
        success: true,
        message: "Session reset".to_string(),
        phase: Phase::Uninitialized,
        session_id: None,
    })
}

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
