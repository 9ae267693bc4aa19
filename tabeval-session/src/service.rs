use crate::EvalSession;
use async_trait::async_trait;
use tabeval_core::Result;
use tabeval_eval::{ResultRecord, Schema};

#[derive(Debug, Clone)]
pub struct CreateRequest {
    pub user_id: String,
    pub session_id: Option<String>,
    /// Name of the ingested table
    pub source: String,
    pub schema: Schema,
}

#[derive(Debug, Clone)]
pub struct GetRequest {
    pub session_id: String,
}

/// Stores sessions and serializes appends to each one.
#[async_trait]
pub trait SessionService: Send + Sync {
    async fn create(&self, req: CreateRequest) -> Result<EvalSession>;
    /// A snapshot of the session as it is now.
    async fn get(&self, req: GetRequest) -> Result<EvalSession>;
    /// Append one run's results and return the new report length.
    async fn append_results(&self, session_id: &str, results: Vec<ResultRecord>)
    -> Result<usize>;
}
