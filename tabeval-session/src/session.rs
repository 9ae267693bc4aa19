use chrono::{DateTime, Utc};
use tabeval_eval::{ResultAggregator, ResultRecord, Schema};

/// One evaluation session and its combined report.
#[derive(Debug, Clone)]
pub struct EvalSession {
    pub(crate) id: String,
    pub(crate) user_id: String,
    pub(crate) source: String,
    pub(crate) schema: Schema,
    pub(crate) report: ResultAggregator,
    pub(crate) runs: usize,
    pub(crate) created_at: DateTime<Utc>,
}

impl EvalSession {
    pub(crate) fn new(id: String, user_id: String, source: String, schema: Schema) -> Self {
        Self {
            id,
            user_id,
            source,
            schema,
            report: ResultAggregator::new(),
            runs: 0,
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn schema(&self) -> Schema {
        self.schema
    }

    pub fn report(&self) -> &ResultAggregator {
        &self.report
    }

    /// Number of appended runs.
    pub fn runs(&self) -> usize {
        self.runs
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub(crate) fn append(&mut self, results: Vec<ResultRecord>) -> usize {
        self.report.append(results);
        self.runs += 1;
        self.report.len()
    }
}
