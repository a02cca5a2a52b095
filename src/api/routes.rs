use axum::{routing::{get, post}, Router};
use tower_http::trace::TraceLayer;

use crate::api::handlers::{
	create_session, delete_session, get_session, new_chat, plan_trip, reset_session, AppState,
};
use crate::api::pages::{index, show_session, submit_session};

pub fn build_router() -> Router<AppState> {
	Router::new()
		.route("/", get(index))
		.route("/sessions/:session_id", get(show_session).post(submit_session))
		.route("/api/sessions", post(create_session))
		.route("/api/sessions/:session_id", get(get_session).delete(delete_session))
		.route("/api/sessions/:session_id/plan", post(plan_trip))
		.route("/api/sessions/:session_id/new-chat", post(new_chat))
		.route("/api/sessions/:session_id/reset", post(reset_session))
		.route("/health", get(|| async { "ok" }))
		.layer(TraceLayer::new_for_http())
}


#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::Arc;

	use axum::body::Body;
	use axum::http::{header, Request, StatusCode};
	use axum::response::Response;
	use serde_json::{json, Value};
	use tower::ServiceExt; // for `oneshot`

	use crate::app::App;
	use crate::config::AppConfig;
	use crate::llm::CreateResult;
	use crate::testing::ScriptedClient;
	use crate::types::AppError;

	async fn app_with(script: impl FnOnce(ScriptedClient, &str) -> ScriptedClient) -> Router {
		let config = AppConfig::default();
		let agent = crate::agents::AgentRoster::builtin(&config.travel).build().unwrap();
		let client = script(ScriptedClient::new(), agent.instructions());
		let app = App::with_client(config, Arc::new(client)).await.unwrap();
		let state = AppState::new(app.sessions, app.config.travel.currency).unwrap();
		build_router().with_state(state)
	}

	async fn send(app: &Router, request: Request<Body>) -> Response {
		app.clone().oneshot(request).await.unwrap()
	}

	async fn body_json(response: Response) -> Value {
		let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
		serde_json::from_slice(&bytes).unwrap()
	}

	async fn body_text(response: Response) -> String {
		let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
		String::from_utf8(bytes.to_vec()).unwrap()
	}

	fn post_json(uri: &str, body: Value) -> Request<Body> {
		Request::builder()
			.method("POST")
			.uri(uri)
			.header(header::CONTENT_TYPE, "application/json")
			.body(Body::from(body.to_string()))
			.unwrap()
	}

	fn post_form(uri: &str, body: &str) -> Request<Body> {
		Request::builder()
			.method("POST")
			.uri(uri)
			.header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
			.body(Body::from(body.to_string()))
			.unwrap()
	}

	fn get(uri: &str) -> Request<Body> {
		Request::builder().uri(uri).body(Body::empty()).unwrap()
	}

	fn location(response: &Response) -> String {
		response.headers()[header::LOCATION].to_str().unwrap().to_string()
	}

	async fn new_session(app: &Router) -> String {
		let response = send(app, post_json("/api/sessions", json!({}))).await;
		assert_eq!(response.status(), StatusCode::CREATED);
		body_json(response).await["session_id"].as_str().unwrap().to_string()
	}

	#[tokio::test]
	async fn health_ok() {
		let app = app_with(|c, _| c).await;
		let response = send(&app, get("/health")).await;
		assert_eq!(response.status(), StatusCode::OK);
	}

	#[tokio::test]
	async fn plan_completes_and_returns_session() {
		let app = app_with(|c, travel| c.reply(travel, CreateResult::text("Day 1: Asakusa"))).await;
		let id = new_session(&app).await;

		let response = send(
			&app,
			post_json(
				&format!("/api/sessions/{}/plan", id),
				json!({"destination": "Tokyo", "duration": "5", "budget": "2000", "preference": "food"}),
			),
		)
		.await;
		assert_eq!(response.status(), StatusCode::OK);

		let body = body_json(response).await;
		assert_eq!(body["status"], "completed");
		assert_eq!(body["reply"], "Day 1: Asakusa");
		assert_eq!(body["session"]["active"][0]["content"], "Plan a 5-day trip to Tokyo under $2000 with food");
		assert_eq!(body["session"]["active"][1]["role"], "assistant");
	}

	#[tokio::test]
	async fn plan_with_missing_budget_is_ignored() {
		let app = app_with(|c, _| c).await;
		let id = new_session(&app).await;

		let response = send(
			&app,
			post_json(&format!("/api/sessions/{}/plan", id), json!({"destination": "Tokyo", "duration": "5"})),
		)
		.await;
		let body = body_json(response).await;
		assert_eq!(body["status"], "ignored");
		assert!(body.get("reply").is_none());
		assert_eq!(body["session"]["active"], json!([]));
	}

	#[tokio::test]
	async fn model_failure_maps_to_bad_gateway() {
		let app = app_with(|c, travel| c.fail(travel, AppError::Llm("rate limited".into()))).await;
		let id = new_session(&app).await;

		let response = send(
			&app,
			post_json(
				&format!("/api/sessions/{}/plan", id),
				json!({"destination": "Tokyo", "duration": "5", "budget": "2000"}),
			),
		)
		.await;
		assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
		assert_eq!(body_json(response).await["error"], "LLM request failed: rate limited");

		let session = body_json(send(&app, get(&format!("/api/sessions/{}", id))).await).await;
		assert_eq!(session["active"], json!([]));
		assert_eq!(session["last_error"], "LLM request failed: rate limited");
	}

	#[tokio::test]
	async fn unknown_session_is_not_found() {
		let app = app_with(|c, _| c).await;
		let response = send(&app, get("/api/sessions/missing")).await;
		assert_eq!(response.status(), StatusCode::NOT_FOUND);
		assert_eq!(body_json(response).await["error"], "Session not found: missing");
	}

	#[tokio::test]
	async fn delete_forgets_session() {
		let app = app_with(|c, _| c).await;
		let id = new_session(&app).await;

		let delete = Request::builder()
			.method("DELETE")
			.uri(format!("/api/sessions/{}", id))
			.body(Body::empty())
			.unwrap();
		assert_eq!(send(&app, delete).await.status(), StatusCode::NO_CONTENT);
		assert_eq!(send(&app, get(&format!("/api/sessions/{}", id))).await.status(), StatusCode::NOT_FOUND);
	}

	#[tokio::test]
	async fn index_redirects_to_fresh_session_page() {
		let app = app_with(|c, _| c).await;

		let response = send(&app, get("/")).await;
		assert_eq!(response.status(), StatusCode::SEE_OTHER);
		let page_path = location(&response);
		assert!(page_path.starts_with("/sessions/"));

		let page = send(&app, get(&page_path)).await;
		assert_eq!(page.status(), StatusCode::OK);
		let html = body_text(page).await;
		assert!(html.contains("Total Trip Budget (SGD):"));
		assert!(html.contains(&format!(r#"action="{}""#, page_path)));
	}

	#[tokio::test]
	async fn stale_page_link_starts_over() {
		let app = app_with(|c, _| c).await;
		let response = send(&app, get("/sessions/gone")).await;
		assert_eq!(response.status(), StatusCode::SEE_OTHER);
		assert_eq!(location(&response), "/");
	}

	#[tokio::test]
	async fn page_generate_then_new_chat() {
		let app = app_with(|c, travel| {
			c.reply(travel, CreateResult::text("Day 1: Shibuya"))
				.reply(travel, CreateResult::text("Day 1: Gion"))
		})
		.await;
		let id = new_session(&app).await;
		let page_path = format!("/sessions/{}", id);

		let response = send(
			&app,
			post_form(&page_path, "action=generate&destination=Tokyo&duration=3&budget=1500&preference="),
		)
		.await;
		assert_eq!(response.status(), StatusCode::SEE_OTHER);
		assert_eq!(location(&response), page_path);

		send(&app, post_form(&page_path, "action=generate&destination=Kyoto&duration=2&budget=800")).await;
		let html = body_text(send(&app, get(&page_path)).await).await;
		assert!(html.contains("<summary>History</summary>"));
		assert!(html.contains("Day 1: Shibuya"));
		assert!(html.contains("Day 1: Gion"));

		send(&app, post_form(&page_path, "action=new_chat")).await;
		let session = body_json(send(&app, get(&format!("/api/sessions/{}", id))).await).await;
		assert_eq!(session["active"], json!([]));
		assert_eq!(session["archived"].as_array().unwrap().len(), 2);
		assert!(!body_text(send(&app, get(&page_path)).await).await.contains("Day 1: Gion"));
	}

	#[tokio::test]
	async fn page_failure_shows_banner() {
		let app = app_with(|c, travel| c.fail(travel, AppError::MaxTurnsExceeded(10))).await;
		let id = new_session(&app).await;
		let page_path = format!("/sessions/{}", id);

		let response = send(&app, post_form(&page_path, "destination=Oslo&duration=4&budget=3000")).await;
		assert_eq!(response.status(), StatusCode::SEE_OTHER);

		let html = body_text(send(&app, get(&page_path)).await).await;
		assert!(html.contains(r#"<div class="error">Max turns (10) exceeded</div>"#));
	}
}
