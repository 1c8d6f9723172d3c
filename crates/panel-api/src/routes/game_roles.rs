//! # Game Role Questions API
//!
//! `GET /game_roles` lists the contents of stored questions, `POST
//! /game_roles` stores a new one. Request shapes come from the registry's
//! `game_roles` validators; responses are shaped by its filters.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::error::AppError;
use crate::extractors::ValidatedRequest;
use crate::filter::respond;
use crate::state::{AppState, QuestionRecord};

/// Page size when neither `limit` nor `per_page` is given.
pub const DEFAULT_PAGE_SIZE: usize = 20;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Normalized `Createquestion` body.
#[derive(Debug, Deserialize)]
pub struct CreateQuestion {
    pub content: String,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub images: Vec<String>,
    pub form_id: Option<String>,
}

/// Normalized list query. Either `offset`/`limit` or 1-based
/// `page`/`per_page`; when both are given, `page`/`per_page` wins.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub offset: Option<i64>,
    pub limit: Option<i64>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl ListQuery {
    /// `(skip, take)` for this query. Negative values clamp to zero and
    /// page numbers below 1 read as page 1.
    pub fn window(&self) -> (usize, usize) {
        let clamp = |v: i64| usize::try_from(v.max(0)).unwrap_or(usize::MAX);
        if self.page.is_some() || self.per_page.is_some() {
            let per_page = self.per_page.map(clamp).unwrap_or(DEFAULT_PAGE_SIZE);
            let page = self.page.unwrap_or(1).max(1);
            let skip = clamp(page - 1).saturating_mul(per_page);
            (skip, per_page)
        } else {
            (
                self.offset.map(clamp).unwrap_or(0),
                self.limit.map(clamp).unwrap_or(DEFAULT_PAGE_SIZE),
            )
        }
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn router() -> Router<AppState> {
    Router::new().route("/game_roles", get(list_questions).post(create_question))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /game_roles: list question contents in creation order.
async fn list_questions(
    State(state): State<AppState>,
    req: ValidatedRequest,
) -> Result<Response, AppError> {
    let query: ListQuery = match &req.args {
        Value::Null => ListQuery::default(),
        args => serde_json::from_value(args.clone())
            .map_err(|e| AppError::BadRequest(format!("invalid query: {e}")))?,
    };
    let (skip, take) = query.window();

    let page = page_of(state.questions.list(), skip, take);

    Ok(respond(
        &state.registry,
        &req.endpoint,
        StatusCode::OK,
        Value::Array(page),
    ))
}

/// Contents of `questions` in creation order, windowed to `skip`/`take`.
fn page_of(mut questions: Vec<QuestionRecord>, skip: usize, take: usize) -> Vec<Value> {
    questions.sort_by_key(|q| q.seq);
    questions
        .into_iter()
        .skip(skip)
        .take(take)
        .map(|q| Value::String(q.content))
        .collect()
}

/// POST /game_roles: store a question and return its content.
async fn create_question(
    State(state): State<AppState>,
    req: ValidatedRequest,
) -> Result<Response, AppError> {
    let body: CreateQuestion = serde_json::from_value(req.json.clone())
        .map_err(|e| AppError::BadRequest(format!("invalid question: {e}")))?;

    let record = QuestionRecord {
        id: Uuid::new_v4(),
        seq: state.next_question_seq(),
        content: body.content,
        is_public: body.is_public,
        images: body.images,
        form_id: body.form_id,
        created_at: Utc::now(),
    };
    tracing::info!(question_id = %record.id, "question created");
    let content = Value::String(record.content.clone());
    state.questions.insert(record.id, record);

    Ok(respond(
        &state.registry,
        &req.endpoint,
        StatusCode::CREATED,
        content,
    ))
}
