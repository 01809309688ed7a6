//! Durable state for the analysis pipeline
//!
//! One seam over everything the orchestrator persists: job lifecycle
//! transitions, definitions, the content-hash result cache, and
//! consultation records. The MongoDB implementation is the production
//! one; tests drive the orchestrator with an in-memory implementation.

use async_trait::async_trait;
use bson::doc;
use chrono::Duration;
use tracing::debug;

use crate::db::schemas::{
    AnalysisCacheDoc, AnalysisJobDoc, ConsultationDoc, JobDefinitionDoc,
};
use crate::db::MongoCollection;
use crate::types::{AtriumError, Result};

/// Retention window for cached analysis results
const CACHE_RETENTION_DAYS: i64 = 7;

#[async_trait]
pub trait AnalysisStore: Send + Sync {
    async fn load_job(&self, job_id: &str) -> Result<Option<AnalysisJobDoc>>;
    /// Atomically move a pending job to processing. Returns false when the
    /// job was not pending, so concurrent submissions claim it exactly once.
    async fn claim_pending(&self, job_id: &str) -> Result<bool>;
    async fn complete_job(&self, job_id: &str, analysis: &str, from_cache: bool) -> Result<()>;
    async fn fail_job(&self, job_id: &str, message: &str, detail: &str) -> Result<()>;

    async fn load_definition(&self, definition_id: &str) -> Result<Option<JobDefinitionDoc>>;

    /// Look up a cached analysis by content hash; expired entries are absent
    async fn cached_analysis(&self, key: &str) -> Result<Option<String>>;
    async fn store_analysis(&self, key: &str, definition_id: &str, analysis: &str) -> Result<()>;

    /// Persist a consultation record, returning its id
    async fn save_consultation(&self, record: ConsultationDoc) -> Result<String>;
}

/// MongoDB-backed [`AnalysisStore`]
pub struct MongoAnalysisStore {
    jobs: MongoCollection<AnalysisJobDoc>,
    definitions: MongoCollection<JobDefinitionDoc>,
    cache: MongoCollection<AnalysisCacheDoc>,
    consultations: MongoCollection<ConsultationDoc>,
}

impl MongoAnalysisStore {
    pub fn new(
        jobs: MongoCollection<AnalysisJobDoc>,
        definitions: MongoCollection<JobDefinitionDoc>,
        cache: MongoCollection<AnalysisCacheDoc>,
        consultations: MongoCollection<ConsultationDoc>,
    ) -> Self {
        Self {
            jobs,
            definitions,
            cache,
            consultations,
        }
    }

    fn job_filter(job_id: &str) -> Result<bson::Document> {
        let oid = bson::oid::ObjectId::parse_str(job_id)
            .map_err(|_| AtriumError::Validation("Invalid job record id".into()))?;
        Ok(doc! { "_id": oid })
    }
}

#[async_trait]
impl AnalysisStore for MongoAnalysisStore {
    async fn load_job(&self, job_id: &str) -> Result<Option<AnalysisJobDoc>> {
        self.jobs.find_one(Self::job_filter(job_id)?).await
    }

    async fn claim_pending(&self, job_id: &str) -> Result<bool> {
        let mut filter = Self::job_filter(job_id)?;
        filter.insert("status", "pending");
        let result = self
            .jobs
            .update_one(
                filter,
                doc! { "$set": {
                    "status": "processing",
                    "processingStartedAt": bson::DateTime::now(),
                }},
            )
            .await?;
        Ok(result.modified_count > 0)
    }

    async fn complete_job(&self, job_id: &str, analysis: &str, from_cache: bool) -> Result<()> {
        self.jobs
            .update_one(
                Self::job_filter(job_id)?,
                doc! { "$set": {
                    "status": "completed",
                    "aiAnalysis": analysis,
                    "fromCache": from_cache,
                    "completedAt": bson::DateTime::now(),
                }},
            )
            .await?;
        Ok(())
    }

    async fn fail_job(&self, job_id: &str, message: &str, detail: &str) -> Result<()> {
        self.jobs
            .update_one(
                Self::job_filter(job_id)?,
                doc! { "$set": {
                    "status": "failed",
                    "errorMessage": message,
                    "errorDetails": detail,
                    "failedAt": bson::DateTime::now(),
                }},
            )
            .await?;
        Ok(())
    }

    async fn load_definition(&self, definition_id: &str) -> Result<Option<JobDefinitionDoc>> {
        self.definitions
            .find_one(doc! { "_id": definition_id })
            .await
    }

    async fn cached_analysis(&self, key: &str) -> Result<Option<String>> {
        let Some(entry) = self.cache.find_one(doc! { "_id": key }).await? else {
            return Ok(None);
        };

        let age = chrono::Utc::now().signed_duration_since(entry.created_at.to_chrono());
        if age > Duration::days(CACHE_RETENTION_DAYS) {
            debug!(key, "cached analysis expired, removing");
            self.cache.delete_one(doc! { "_id": key }).await?;
            return Ok(None);
        }

        Ok(Some(entry.analysis))
    }

    async fn store_analysis(&self, key: &str, definition_id: &str, analysis: &str) -> Result<()> {
        self.cache
            .upsert_one(
                doc! { "_id": key },
                doc! { "$set": {
                    "definitionId": definition_id,
                    "analysis": analysis,
                    "createdAt": bson::DateTime::now(),
                }},
            )
            .await?;
        Ok(())
    }

    async fn save_consultation(&self, record: ConsultationDoc) -> Result<String> {
        self.consultations.insert_one(&record).await
    }
}
