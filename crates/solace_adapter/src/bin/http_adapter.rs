#![forbid(unsafe_code)]

use std::{
    env,
    net::SocketAddr,
    sync::{Arc, Mutex},
};

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use solace_adapter::{
    AdapterHealthResponse, AdapterRuntime, AffirmationAdapterRequest, ChatTurnAdapterRequest,
    ChatTurnAdapterResponse, CommunityPostAdapterRequest, CommunityReplyAdapterRequest,
    CycleInsightAdapterRequest, CycleLogAdapterRequest, FoodInsightAdapterRequest,
    ModerationAdapterResponse, MoodLogAdapterRequest, SleepInsightAdapterRequest,
    StatusAdapterResponse, VitalsLogAdapterRequest, VoiceTurnAdapterRequest,
    VoiceTurnAdapterResponse, WellnessTextAdapterResponse,
};

type SharedRuntime = Arc<Mutex<AdapterRuntime>>;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let bind = env::var("SOLACE_HTTP_BIND").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
    let addr: SocketAddr = bind.parse()?;

    let runtime = Arc::new(Mutex::new(AdapterRuntime::default_from_env()?));

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/v1/chat/turn", post(chat_turn))
        .route("/v1/voice/turn", post(voice_turn))
        .route("/v1/community/post", post(community_post))
        .route("/v1/community/reply", post(community_reply))
        .route("/v1/wellness/mood", post(wellness_mood))
        .route("/v1/wellness/vitals", post(wellness_vitals))
        .route("/v1/wellness/cycle", post(wellness_cycle))
        .route("/v1/wellness/affirmation", post(wellness_affirmation))
        .route("/v1/wellness/sleep-insight", post(wellness_sleep_insight))
        .route("/v1/wellness/food-insight", post(wellness_food_insight))
        .route("/v1/wellness/cycle-insight", post(wellness_cycle_insight))
        .with_state(runtime);

    println!("solace_adapter_http listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn rejected(reason: String) -> StatusAdapterResponse {
    StatusAdapterResponse {
        status: "error".to_string(),
        outcome: "REJECTED".to_string(),
        reason: Some(reason),
    }
}

fn lock_poisoned() -> StatusAdapterResponse {
    rejected("adapter runtime lock poisoned".to_string())
}

async fn healthz(
    State(runtime): State<SharedRuntime>,
) -> Result<Json<AdapterHealthResponse>, (StatusCode, Json<StatusAdapterResponse>)> {
    let runtime = runtime
        .lock()
        .map_err(|_| (StatusCode::INTERNAL_SERVER_ERROR, Json(lock_poisoned())))?;
    Ok(Json(runtime.health_report()))
}

async fn chat_turn(
    State(runtime): State<SharedRuntime>,
    Json(request): Json<ChatTurnAdapterRequest>,
) -> Result<Json<ChatTurnAdapterResponse>, (StatusCode, Json<StatusAdapterResponse>)> {
    let mut runtime = runtime
        .lock()
        .map_err(|_| (StatusCode::INTERNAL_SERVER_ERROR, Json(lock_poisoned())))?;
    runtime
        .run_chat_turn(request)
        .map(Json)
        .map_err(|reason| (StatusCode::BAD_REQUEST, Json(rejected(reason))))
}

async fn voice_turn(
    State(runtime): State<SharedRuntime>,
    Json(request): Json<VoiceTurnAdapterRequest>,
) -> Result<Json<VoiceTurnAdapterResponse>, (StatusCode, Json<StatusAdapterResponse>)> {
    let mut runtime = runtime
        .lock()
        .map_err(|_| (StatusCode::INTERNAL_SERVER_ERROR, Json(lock_poisoned())))?;
    runtime
        .run_voice_turn(request)
        .map(Json)
        .map_err(|reason| (StatusCode::BAD_REQUEST, Json(rejected(reason))))
}

async fn community_post(
    State(runtime): State<SharedRuntime>,
    Json(request): Json<CommunityPostAdapterRequest>,
) -> Result<Json<ModerationAdapterResponse>, (StatusCode, Json<StatusAdapterResponse>)> {
    let mut runtime = runtime
        .lock()
        .map_err(|_| (StatusCode::INTERNAL_SERVER_ERROR, Json(lock_poisoned())))?;
    runtime
        .submit_community_post(request)
        .map(Json)
        .map_err(|reason| (StatusCode::BAD_REQUEST, Json(rejected(reason))))
}

async fn community_reply(
    State(runtime): State<SharedRuntime>,
    Json(request): Json<CommunityReplyAdapterRequest>,
) -> Result<Json<ModerationAdapterResponse>, (StatusCode, Json<StatusAdapterResponse>)> {
    let mut runtime = runtime
        .lock()
        .map_err(|_| (StatusCode::INTERNAL_SERVER_ERROR, Json(lock_poisoned())))?;
    runtime
        .submit_community_reply(request)
        .map(Json)
        .map_err(|reason| (StatusCode::BAD_REQUEST, Json(rejected(reason))))
}

async fn wellness_mood(
    State(runtime): State<SharedRuntime>,
    Json(request): Json<MoodLogAdapterRequest>,
) -> Result<Json<StatusAdapterResponse>, (StatusCode, Json<StatusAdapterResponse>)> {
    let mut runtime = runtime
        .lock()
        .map_err(|_| (StatusCode::INTERNAL_SERVER_ERROR, Json(lock_poisoned())))?;
    runtime
        .record_mood(request)
        .map(|_| {
            Json(StatusAdapterResponse {
                status: "ok".to_string(),
                outcome: "RECORDED".to_string(),
                reason: None,
            })
        })
        .map_err(|reason| (StatusCode::BAD_REQUEST, Json(rejected(reason))))
}

async fn wellness_vitals(
    State(runtime): State<SharedRuntime>,
    Json(request): Json<VitalsLogAdapterRequest>,
) -> Result<Json<StatusAdapterResponse>, (StatusCode, Json<StatusAdapterResponse>)> {
    let mut runtime = runtime
        .lock()
        .map_err(|_| (StatusCode::INTERNAL_SERVER_ERROR, Json(lock_poisoned())))?;
    runtime
        .record_vitals(request)
        .map(|_| {
            Json(StatusAdapterResponse {
                status: "ok".to_string(),
                outcome: "RECORDED".to_string(),
                reason: None,
            })
        })
        .map_err(|reason| (StatusCode::BAD_REQUEST, Json(rejected(reason))))
}

async fn wellness_cycle(
    State(runtime): State<SharedRuntime>,
    Json(request): Json<CycleLogAdapterRequest>,
) -> Result<Json<StatusAdapterResponse>, (StatusCode, Json<StatusAdapterResponse>)> {
    let mut runtime = runtime
        .lock()
        .map_err(|_| (StatusCode::INTERNAL_SERVER_ERROR, Json(lock_poisoned())))?;
    runtime
        .record_cycle_day(request)
        .map(|_| {
            Json(StatusAdapterResponse {
                status: "ok".to_string(),
                outcome: "RECORDED".to_string(),
                reason: None,
            })
        })
        .map_err(|reason| (StatusCode::BAD_REQUEST, Json(rejected(reason))))
}

async fn wellness_affirmation(
    State(runtime): State<SharedRuntime>,
    Json(request): Json<AffirmationAdapterRequest>,
) -> Result<Json<WellnessTextAdapterResponse>, (StatusCode, Json<StatusAdapterResponse>)> {
    let runtime = runtime
        .lock()
        .map_err(|_| (StatusCode::INTERNAL_SERVER_ERROR, Json(lock_poisoned())))?;
    runtime
        .generate_affirmation(request)
        .map(Json)
        .map_err(|reason| (StatusCode::BAD_REQUEST, Json(rejected(reason))))
}

async fn wellness_sleep_insight(
    State(runtime): State<SharedRuntime>,
    Json(request): Json<SleepInsightAdapterRequest>,
) -> Result<Json<WellnessTextAdapterResponse>, (StatusCode, Json<StatusAdapterResponse>)> {
    let runtime = runtime
        .lock()
        .map_err(|_| (StatusCode::INTERNAL_SERVER_ERROR, Json(lock_poisoned())))?;
    runtime
        .sleep_insight(request)
        .map(Json)
        .map_err(|reason| (StatusCode::BAD_REQUEST, Json(rejected(reason))))
}

async fn wellness_food_insight(
    State(runtime): State<SharedRuntime>,
    Json(request): Json<FoodInsightAdapterRequest>,
) -> Result<Json<WellnessTextAdapterResponse>, (StatusCode, Json<StatusAdapterResponse>)> {
    let runtime = runtime
        .lock()
        .map_err(|_| (StatusCode::INTERNAL_SERVER_ERROR, Json(lock_poisoned())))?;
    runtime
        .food_insight(request)
        .map(Json)
        .map_err(|reason| (StatusCode::BAD_REQUEST, Json(rejected(reason))))
}

async fn wellness_cycle_insight(
    State(runtime): State<SharedRuntime>,
    Json(request): Json<CycleInsightAdapterRequest>,
) -> Result<Json<WellnessTextAdapterResponse>, (StatusCode, Json<StatusAdapterResponse>)> {
    let runtime = runtime
        .lock()
        .map_err(|_| (StatusCode::INTERNAL_SERVER_ERROR, Json(lock_poisoned())))?;
    runtime
        .cycle_insight(request)
        .map(Json)
        .map_err(|reason| (StatusCode::BAD_REQUEST, Json(rejected(reason))))
}
