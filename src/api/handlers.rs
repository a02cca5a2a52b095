use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use super::views::Views;
use crate::manager::{ConversationState, SessionManager, SubmitOutcome};
use crate::types::{AppResult, ConversationMessage, PlanForm};

#[derive(Clone)]
pub struct AppState {
	pub sessions: Arc<SessionManager>,
	pub views: Arc<Views>,
	pub currency: String,
}

impl AppState {
	pub fn new(sessions: Arc<SessionManager>, currency: impl Into<String>) -> AppResult<Self> {
		Ok(Self {
			sessions,
			views: Arc::new(Views::new()?),
			currency: currency.into(),
		})
	}
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionView {
	pub session_id: String,
	pub active: Vec<ConversationMessage>,
	pub archived: Vec<ConversationMessage>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub last_error: Option<String>,
}

impl SessionView {
	fn new(session_id: String, state: ConversationState) -> Self {
		Self {
			session_id,
			active: state.active,
			archived: state.archived,
			last_error: state.last_error,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanStatus {
	Ignored,
	Completed,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PlanResponse {
	pub status: PlanStatus,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub reply: Option<String>,
	pub session: SessionView,
}

pub async fn create_session(
	State(state): State<AppState>,
) -> AppResult<(StatusCode, Json<SessionView>)> {
	let session_id = state.sessions.create().await?;
	let snapshot = state.sessions.snapshot(&session_id).await?;
	Ok((StatusCode::CREATED, Json(SessionView::new(session_id, snapshot))))
}

pub async fn get_session(
	State(state): State<AppState>,
	Path(session_id): Path<String>,
) -> AppResult<Json<SessionView>> {
	let snapshot = state.sessions.snapshot(&session_id).await?;
	Ok(Json(SessionView::new(session_id, snapshot)))
}

pub async fn plan_trip(
	State(state): State<AppState>,
	Path(session_id): Path<String>,
	Json(form): Json<PlanForm>,
) -> AppResult<Json<PlanResponse>> {
	let outcome = state.sessions.submit(&session_id, &form).await?;
	let snapshot = state.sessions.snapshot(&session_id).await?;
	let (status, reply) = match outcome {
		SubmitOutcome::Ignored => (PlanStatus::Ignored, None),
		SubmitOutcome::Completed { reply } => (PlanStatus::Completed, Some(reply)),
	};
	Ok(Json(PlanResponse {
		status,
		reply,
		session: SessionView::new(session_id, snapshot),
	}))
}

pub async fn new_chat(
	State(state): State<AppState>,
	Path(session_id): Path<String>,
) -> AppResult<Json<SessionView>> {
	let snapshot = state.sessions.new_chat(&session_id).await?;
	Ok(Json(SessionView::new(session_id, snapshot)))
}

pub async fn reset_session(
	State(state): State<AppState>,
	Path(session_id): Path<String>,
) -> AppResult<Json<SessionView>> {
	let snapshot = state.sessions.reset(&session_id).await?;
	Ok(Json(SessionView::new(session_id, snapshot)))
}

pub async fn delete_session(
	State(state): State<AppState>,
	Path(session_id): Path<String>,
) -> AppResult<StatusCode> {
	state.sessions.close(&session_id).await?;
	Ok(StatusCode::NO_CONTENT)
}
