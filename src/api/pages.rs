use axum::extract::{Path, State};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Form;
use log::warn;
use serde::Deserialize;

use super::handlers::AppState;
use crate::types::{AppError, AppResult, PlanForm};

#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageAction {
	#[default]
	Generate,
	NewChat,
}

/// Body of the page form: the plan fields plus which button was pressed.
#[derive(Debug, Default, Deserialize)]
pub struct PageForm {
	#[serde(default)]
	pub action: PageAction,
	#[serde(default)]
	pub destination: String,
	#[serde(default)]
	pub duration: String,
	#[serde(default)]
	pub budget: String,
	#[serde(default)]
	pub preference: String,
}

impl PageForm {
	fn plan(&self) -> PlanForm {
		PlanForm {
			destination: self.destination.clone(),
			duration: self.duration.clone(),
			budget: self.budget.clone(),
			preference: self.preference.clone(),
		}
	}
}

fn session_path(session_id: &str) -> String {
	format!("/sessions/{}", session_id)
}

pub async fn index(State(state): State<AppState>) -> AppResult<Redirect> {
	let session_id = state.sessions.create().await?;
	Ok(Redirect::to(&session_path(&session_id)))
}

pub async fn show_session(
	State(state): State<AppState>,
	Path(session_id): Path<String>,
) -> AppResult<Response> {
	match state.sessions.snapshot(&session_id).await {
		Ok(snapshot) => {
			let page = state.views.session_page(&session_id, &snapshot, &state.currency)?;
			Ok(Html(page).into_response())
		}
		// stale bookmark: start over with a fresh session
		Err(AppError::SessionNotFound(_)) => Ok(Redirect::to("/").into_response()),
		Err(err) => Err(err),
	}
}

pub async fn submit_session(
	State(state): State<AppState>,
	Path(session_id): Path<String>,
	Form(form): Form<PageForm>,
) -> AppResult<Redirect> {
	match form.action {
		PageAction::NewChat => {
			state.sessions.new_chat(&session_id).await?;
		}
		PageAction::Generate => match state.sessions.submit(&session_id, &form.plan()).await {
			Ok(_) => {}
			Err(err @ AppError::SessionNotFound(_)) => return Err(err),
			// recorded on the session and shown as a banner
			Err(err) => warn!("session {}: {}", session_id, err),
		},
	}
	Ok(Redirect::to(&session_path(&session_id)))
}
