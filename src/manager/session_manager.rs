use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{error, info};
use tokio::sync::{Mutex, MutexGuard, RwLock};
use uuid::Uuid;

use super::conversation::ConversationState;
use super::driver::ConversationDriver;
use super::session_store::SessionStore;
use crate::types::{AppError, AppResult, PlanForm, PlanRequest};

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
	/// A required field was empty; nothing changed and no agent ran.
	Ignored,
	Completed { reply: String },
}

/// One live session. `working` is held for a whole round; `committed` is the
/// last saved state and is what readers see meanwhile.
struct Session {
	working: Mutex<ConversationState>,
	committed: RwLock<ConversationState>,
	closed: AtomicBool,
}

impl Session {
	fn new(state: ConversationState) -> Arc<Self> {
		Arc::new(Self {
			working: Mutex::new(state.clone()),
			committed: RwLock::new(state),
			closed: AtomicBool::new(false),
		})
	}

	/// Waits for any round in flight. Fails if the session was closed meanwhile.
	async fn lock(&self, session_id: &str) -> AppResult<MutexGuard<'_, ConversationState>> {
		let guard = self.working.lock().await;
		if self.closed.load(Ordering::SeqCst) {
			return Err(AppError::SessionNotFound(session_id.to_string()));
		}
		Ok(guard)
	}

	async fn publish(&self, working: &mut ConversationState, next: ConversationState) {
		*self.committed.write().await = next.clone();
		*working = next;
	}
}

/// Owns every live session. A round holds its session's lock from start to
/// finish, so one session never runs two rounds at once.
pub struct SessionManager {
	sessions: RwLock<HashMap<String, Arc<Session>>>, // session_id -> session
	store: Arc<dyn SessionStore>,
	driver: ConversationDriver,
}

impl SessionManager {
	pub fn new(driver: ConversationDriver, store: Arc<dyn SessionStore>) -> Arc<Self> {
		Arc::new(Self {
			sessions: RwLock::new(HashMap::new()),
			store,
			driver,
		})
	}

	pub fn driver(&self) -> &ConversationDriver {
		&self.driver
	}

	pub async fn create(&self) -> AppResult<String> {
		let session_id = Uuid::new_v4().to_string();
		let state = ConversationState::new();
		self.store.save(&session_id, &state).await?;
		self.sessions
			.write()
			.await
			.insert(session_id.clone(), Session::new(state));
		info!("session {} created", session_id);
		Ok(session_id)
	}

	async fn session(&self, session_id: &str) -> AppResult<Arc<Session>> {
		if let Some(session) = self.sessions.read().await.get(session_id) {
			return Ok(Arc::clone(session));
		}

		let state = self
			.store
			.load(session_id)
			.await?
			.ok_or_else(|| AppError::SessionNotFound(session_id.to_string()))?;

		let mut guard = self.sessions.write().await;
		let session = guard
			.entry(session_id.to_string())
			.or_insert_with(|| Session::new(state));
		Ok(Arc::clone(session))
	}

	/// Last committed state. Does not wait for a round in flight.
	pub async fn snapshot(&self, session_id: &str) -> AppResult<ConversationState> {
		let session = self.session(session_id).await?;
		let state = session.committed.read().await.clone();
		Ok(state)
	}

	pub async fn submit(&self, session_id: &str, form: &PlanForm) -> AppResult<SubmitOutcome> {
		let session = self.session(session_id).await?;
		let Some(request) = PlanRequest::from_form(form) else {
			return Ok(SubmitOutcome::Ignored);
		};

		let mut working = session.lock(session_id).await?;
		let mut next = working.clone();
		next.begin_round(request.to_string());
		info!("session {}: {}", session_id, request);

		let outcome = self.driver.run(next.context()).await;
		let (next, result) = match outcome {
			Ok(reply) => {
				next.complete_round(reply.clone());
				(next, Ok(SubmitOutcome::Completed { reply }))
			}
			Err(err) => {
				error!("session {}: round failed: {}", session_id, err);
				next.abort_round(err.to_string());
				(next, Err(err))
			}
		};

		match self.store.save(session_id, &next).await {
			Ok(()) => {
				session.publish(&mut working, next).await;
				result
			}
			Err(err) => {
				error!("session {}: round not saved: {}", session_id, err);
				let mut kept = working.clone();
				kept.last_error = Some(err.to_string());
				session.publish(&mut working, kept).await;
				Err(err)
			}
		}
	}

	pub async fn new_chat(&self, session_id: &str) -> AppResult<ConversationState> {
		self.mutate(session_id, ConversationState::new_chat).await
	}

	pub async fn reset(&self, session_id: &str) -> AppResult<ConversationState> {
		self.mutate(session_id, ConversationState::reset).await
	}

	/// Forgets the session entirely. Calls already waiting on it fail with
	/// `SessionNotFound` instead of writing it back.
	pub async fn close(&self, session_id: &str) -> AppResult<()> {
		let session = self.session(session_id).await?;
		let _working = session.lock(session_id).await?;
		session.closed.store(true, Ordering::SeqCst);
		self.sessions.write().await.remove(session_id);
		self.store.delete(session_id).await?;
		info!("session {} closed", session_id);
		Ok(())
	}

	async fn mutate<F>(&self, session_id: &str, apply: F) -> AppResult<ConversationState>
	where
		F: FnOnce(&mut ConversationState),
	{
		let session = self.session(session_id).await?;
		let mut working = session.lock(session_id).await?;
		let mut next = working.clone();
		apply(&mut next);
		self.store.save(session_id, &next).await?;
		session.publish(&mut working, next.clone()).await;
		Ok(next)
	}
}
