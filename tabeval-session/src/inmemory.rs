use crate::{CreateRequest, EvalSession, GetRequest, SessionService};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tabeval_core::{Result, TabevalError};
use tabeval_eval::ResultRecord;
use uuid::Uuid;

fn poisoned<T>(_: T) -> TabevalError {
    TabevalError::Session("session store lock poisoned".into())
}

fn not_found(session_id: &str) -> TabevalError {
    TabevalError::Session(format!("session not found: {}", session_id))
}

pub struct InMemorySessionService {
    sessions: Arc<RwLock<HashMap<String, EvalSession>>>,
}

impl InMemorySessionService {
    pub fn new() -> Self {
        Self { sessions: Arc::new(RwLock::new(HashMap::new())) }
    }
}

impl Default for InMemorySessionService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionService for InMemorySessionService {
    async fn create(&self, req: CreateRequest) -> Result<EvalSession> {
        let session_id = req.session_id.unwrap_or_else(|| Uuid::new_v4().to_string());
        let session = EvalSession::new(session_id.clone(), req.user_id, req.source, req.schema);

        let mut sessions = self.sessions.write().map_err(poisoned)?;
        if sessions.contains_key(&session_id) {
            return Err(TabevalError::Session(format!("session already exists: {}", session_id)));
        }
        sessions.insert(session_id.clone(), session.clone());
        drop(sessions);

        tracing::debug!(session.id = %session_id, schema = %session.schema, "session created");
        Ok(session)
    }

    async fn get(&self, req: GetRequest) -> Result<EvalSession> {
        let sessions = self.sessions.read().map_err(poisoned)?;
        sessions.get(&req.session_id).cloned().ok_or_else(|| not_found(&req.session_id))
    }

    async fn append_results(
        &self,
        session_id: &str,
        results: Vec<ResultRecord>,
    ) -> Result<usize> {
        let mut sessions = self.sessions.write().map_err(poisoned)?;
        let session = sessions.get_mut(session_id).ok_or_else(|| not_found(session_id))?;

        let appended = results.len();
        let total = session.append(results);
        tracing::debug!(session.id = session_id, appended, total, "results appended");
        Ok(total)
    }
}
