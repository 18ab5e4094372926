use crate::error::ApiError;
use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use futures::TryStreamExt;
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use serde_json::{json, Value};
use shared::{pair_extremes, CurrencyPair, PairResult, Readiness};
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub readiness: Readiness,
}

#[derive(Debug, Deserialize)]
pub struct PairQuery {
    pub pair: CurrencyPair,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(pair_extremes_handler))
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Daily min/max candles of a pair, newest window first.
async fn pair_extremes_handler(
    State(state): State<AppState>,
    Query(query): Query<PairQuery>,
) -> Result<Json<Vec<PairResult>>, ApiError> {
    if let Some(refusal) = ApiError::from_readiness(state.readiness.get()) {
        return Err(refusal);
    }

    let results: Vec<PairResult> = pair_extremes(&state.db, query.pair, Utc::now())
        .try_collect()
        .await?;
    Ok(Json(results))
}

async fn health_check(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "status": "ok", "readiness": state.readiness.get() }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use chrono::Duration;
    use migration::{Migrator, MigratorTrait};
    use sea_orm::{ConnectOptions, Database};
    use shared::{CandleFrequency, CandleStore, NewCandle, ReadinessState, SeaOrmCandleStore};
    use tower::ServiceExt;

    async fn memory_db() -> DatabaseConnection {
        let mut options = ConnectOptions::new("sqlite::memory:".to_string());
        options.max_connections(1).sqlx_logging(false);
        let db = Database::connect(options).await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        db
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    async fn app_in(state: ReadinessState) -> (Router, DatabaseConnection) {
        let db = memory_db().await;
        let readiness = Readiness::new();
        readiness.set(state);
        let app = router(AppState {
            db: db.clone(),
            readiness,
        });
        (app, db)
    }

    #[tokio::test]
    async fn test_refusals_follow_readiness() {
        let cases = [
            (
                ReadinessState::Unknown,
                StatusCode::SERVICE_UNAVAILABLE,
                "Database is not ready, try later",
            ),
            (
                ReadinessState::Filling,
                StatusCode::SERVICE_UNAVAILABLE,
                "Database is filling, try later",
            ),
            (
                ReadinessState::Error,
                StatusCode::INTERNAL_SERVER_ERROR,
                "Database is in broken state, try restart app",
            ),
        ];

        for (state, status, message) in cases {
            let (app, _db) = app_in(state).await;
            let (got_status, body) = get(app, "/?pair=BTC-USD").await;
            assert_eq!(got_status, status, "state {}", state);
            assert_eq!(body["error"], message);
        }
    }

    #[tokio::test]
    async fn test_ready_with_empty_history() {
        let (app, _db) = app_in(ReadinessState::Ready).await;
        let (status, body) = get(app, "/?pair=ETH-USD").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn test_ready_returns_min_then_max() {
        let (app, db) = app_in(ReadinessState::Ready).await;
        let store = SeaOrmCandleStore::new(db);
        let exchange = store.get_or_create_exchange("Kraken").await.unwrap();
        let pair = store.get_or_create_pair(CurrencyPair::XrpEur).await.unwrap();

        let recent = (Utc::now() - Duration::hours(3)).timestamp();
        let candle = |time: i64, low: f64, high: f64| NewCandle {
            exchange_id: exchange.id,
            pair_id: pair.id,
            frequency: CandleFrequency::Hour,
            time,
            open: 0.5,
            high,
            low,
            close: 0.5,
            volume: 42.0,
        };
        store
            .insert_batch(&[candle(recent, 0.4, 0.6), candle(recent + 3600, 0.45, 0.7)])
            .await
            .unwrap();

        let (status, body) = get(app, "/?pair=XRP-EUR").await;
        assert_eq!(status, StatusCode::OK);
        let results = body.as_array().unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0]["Type"], "min");
        assert_eq!(results[0]["low"], 0.4);
        assert_eq!(results[0]["Exchange"], "Kraken");
        assert_eq!(results[1]["Type"], "max");
        assert_eq!(results[1]["high"], 0.7);
    }

    #[tokio::test]
    async fn test_unknown_pair_is_rejected() {
        let (app, _db) = app_in(ReadinessState::Ready).await;
        let (status, _) = get(app, "/?pair=DOGE-USD").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_health_reports_readiness() {
        let (app, _db) = app_in(ReadinessState::Filling).await;
        let (status, body) = get(app, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "status": "ok", "readiness": "filling" }));
    }
}
