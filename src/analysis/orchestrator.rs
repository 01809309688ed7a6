//! Analysis job orchestration
//!
//! Route handlers call [`AnalysisOrchestrator::accept_job`] to validate
//! and claim a pending job, then [`AnalysisOrchestrator::spawn`] to run
//! the pipeline in the background. The HTTP response returns as soon as
//! the job is claimed; clients observe progress through the job record.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::ai::{MediaFetcher, Part, TextGenerator};
use crate::analysis::answer::{analysis_cache_key, Answer, Question};
use crate::analysis::prompts;
use crate::analysis::store::AnalysisStore;
use crate::db::schemas::{ConsultationDoc, JobStatus};
use crate::types::{AtriumError, Result};

/// Attempts at reading a job definition before giving up. Definitions are
/// written by a separate admin flow; a submission can race the write.
const DEFINITION_READ_ATTEMPTS: u32 = 3;
const DEFINITION_READ_DELAY: Duration = Duration::from_secs(1);

/// Cap on stored technical failure detail
const ERROR_DETAIL_MAX: usize = 500;

/// Result of a free-text analysis
#[derive(Debug, Clone)]
pub struct TextAnalysis {
    pub analysis: String,
    /// Absent when the best-effort consultation save failed
    pub consultation_id: Option<String>,
}

pub struct AnalysisOrchestrator {
    store: Arc<dyn AnalysisStore>,
    generator: Arc<dyn TextGenerator>,
    fetcher: Arc<dyn MediaFetcher>,
}

impl AnalysisOrchestrator {
    pub fn new(
        store: Arc<dyn AnalysisStore>,
        generator: Arc<dyn TextGenerator>,
        fetcher: Arc<dyn MediaFetcher>,
    ) -> Self {
        Self {
            store,
            generator,
            fetcher,
        }
    }

    /// Validate and claim a pending job. Fails if the record is missing
    /// or has already left the pending state, so a double submission
    /// cannot start a second pipeline run.
    pub async fn accept_job(&self, job_id: &str) -> Result<()> {
        let job = self
            .store
            .load_job(job_id)
            .await?
            .ok_or_else(|| AtriumError::NotFound("Job record not found".into()))?;

        if job.status != JobStatus::Pending {
            return Err(AtriumError::Validation(format!(
                "Job has already been submitted (status: {:?})",
                job.status
            )));
        }

        // The claim is a single conditional update; a racing submission
        // that loaded the same pending record loses here
        if !self.store.claim_pending(job_id).await? {
            return Err(AtriumError::Validation(
                "Job has already been submitted".into(),
            ));
        }
        info!(job_id, "analysis job accepted");
        Ok(())
    }

    /// Run the pipeline for a claimed job in the background
    pub fn spawn(self: &Arc<Self>, definition_id: String, job_id: String) {
        let orchestrator = Arc::clone(self);
        tokio::spawn(async move {
            orchestrator.process_job(&definition_id, &job_id).await;
        });
    }

    /// The pipeline itself. Never returns an error: every failure is
    /// recorded on the job record instead, since nobody is awaiting us.
    pub async fn process_job(&self, definition_id: &str, job_id: &str) {
        if let Err(e) = self.run_pipeline(definition_id, job_id).await {
            let message = e.user_message();
            let detail = truncate_detail(&format!("{:?}", e), ERROR_DETAIL_MAX);
            warn!(job_id, error = %e, "analysis job failed");
            if let Err(store_err) = self.store.fail_job(job_id, &message, &detail).await {
                warn!(job_id, error = %store_err, "failed to record job failure");
            }
        }
    }

    async fn run_pipeline(&self, definition_id: &str, job_id: &str) -> Result<()> {
        let job = self
            .store
            .load_job(job_id)
            .await?
            .ok_or_else(|| AtriumError::NotFound("Job record disappeared".into()))?;

        let cache_key = analysis_cache_key(definition_id, &job.answers);
        if let Some(cached) = self.store.cached_analysis(&cache_key).await? {
            info!(job_id, "serving analysis from durable cache");
            return self.store.complete_job(job_id, &cached, true).await;
        }

        let definition = self
            .load_definition_with_retry(definition_id)
            .await?
            .ok_or_else(|| AtriumError::NotFound("Analysis definition not found".into()))?;

        let parts = self.assemble_answer_parts(&job.questions, &job.answers).await;
        let instruction = definition
            .ai_system_instruction
            .as_deref()
            .unwrap_or(prompts::DEFAULT_ANALYSIS_INSTRUCTION);

        let analysis = self.generator.generate(&parts, Some(instruction)).await?;

        // Cache write is best-effort: a failed write costs a future model
        // call, not this job
        if let Err(e) = self
            .store
            .store_analysis(&cache_key, definition_id, &analysis)
            .await
        {
            warn!(job_id, error = %e, "failed to cache analysis result");
        }

        self.store.complete_job(job_id, &analysis, false).await?;
        info!(job_id, "analysis job completed");
        Ok(())
    }

    async fn load_definition_with_retry(
        &self,
        definition_id: &str,
    ) -> Result<Option<crate::db::schemas::JobDefinitionDoc>> {
        let mut last_err = None;

        for attempt in 1..=DEFINITION_READ_ATTEMPTS {
            match self.store.load_definition(definition_id).await {
                Ok(Some(definition)) => return Ok(Some(definition)),
                Ok(None) => last_err = None,
                Err(e) => {
                    warn!(definition_id, attempt, error = %e, "definition read failed");
                    last_err = Some(e);
                }
            }
            if attempt < DEFINITION_READ_ATTEMPTS {
                tokio::time::sleep(DEFINITION_READ_DELAY).await;
            }
        }

        match last_err {
            Some(e) => Err(e),
            None => Ok(None),
        }
    }

    /// Build the prompt: for each answer, the question text, the
    /// question's image when one exists and can be fetched, then the
    /// rendered answer. Image fetch failures degrade to a textual note
    /// so one dead URL never sinks the whole job.
    async fn assemble_answer_parts(
        &self,
        questions: &[serde_json::Value],
        answers: &[serde_json::Value],
    ) -> Vec<Part> {
        let mut parts = vec![Part::text(prompts::ANSWERS_PREAMBLE)];

        for (index, raw_answer) in answers.iter().enumerate() {
            if let Some(raw_question) = questions.get(index) {
                let question = Question::classify(raw_question);
                parts.push(Part::text(format!(
                    "\nQuestion {}: {}\n",
                    index + 1,
                    question.text
                )));

                if let Some(url) = &question.image_url {
                    if let Some(data) = self.fetcher.fetch_base64(url).await {
                        parts.push(Part::inline_image(mime_for_url(url), data));
                        parts.push(Part::text("(the question includes the image above)\n"));
                    }
                }
            }

            match Answer::classify(raw_answer) {
                Answer::Scale(value) => {
                    parts.push(Part::text(format!("Answer: {} (rating scale)\n", value)));
                }
                Answer::Text(text) => {
                    parts.push(Part::text(format!("Answer: {}\n", text)));
                }
                Answer::ImageRef(url) => match self.fetcher.fetch_base64(&url).await {
                    Some(data) => {
                        parts.push(Part::inline_image(mime_for_url(&url), data));
                        parts.push(Part::text("Answer: (the user uploaded the image above)\n"));
                    }
                    None => {
                        parts.push(Part::text(
                            "Answer: (an image was uploaded but could not be retrieved)\n",
                        ));
                    }
                },
                Answer::Structured(map) => {
                    parts.push(Part::text(format!(
                        "Answer: {}\n",
                        Answer::structured_text(&map)
                    )));
                }
            }
        }

        parts.push(Part::text(prompts::ANSWERS_CLOSING));
        parts
    }

    /// Analyze free text with optional image attachments, persisting a
    /// consultation record on a best-effort basis.
    pub async fn analyze_text(
        &self,
        user_id: &str,
        text: &str,
        attachment_urls: &[String],
    ) -> Result<TextAnalysis> {
        let trimmed = text.trim();
        let mut parts = if trimmed.is_empty() {
            vec![Part::text(prompts::ATTACHMENTS_ONLY_PREAMBLE)]
        } else {
            vec![Part::text(trimmed)]
        };

        for url in attachment_urls {
            if let Some(data) = self.fetcher.fetch_base64(url).await {
                parts.push(Part::inline_image(mime_for_url(url), data));
            } else {
                debug!(url, "attachment skipped");
            }
        }

        let analysis = self
            .generator
            .generate(&parts, Some(prompts::TEXT_ANALYSIS_INSTRUCTION))
            .await?;

        let record = ConsultationDoc {
            id: None,
            user_id: user_id.to_string(),
            text: trimmed.to_string(),
            analysis: analysis.clone(),
            attachment_urls: attachment_urls.to_vec(),
            created_at: bson::DateTime::now(),
        };

        let consultation_id = match self.store.save_consultation(record).await {
            Ok(id) => Some(id),
            Err(e) => {
                // The analysis still goes back to the caller
                warn!(user_id, error = %e, "consultation save failed");
                None
            }
        };

        Ok(TextAnalysis {
            analysis,
            consultation_id,
        })
    }
}

/// Guess an image MIME type from the URL path; the remote API tolerates a
/// wrong-but-plausible type far better than a missing one
fn mime_for_url(url: &str) -> &'static str {
    let path = url.split('?').next().unwrap_or(url).to_ascii_lowercase();
    if path.ends_with(".png") {
        "image/png"
    } else if path.ends_with(".webp") {
        "image/webp"
    } else if path.ends_with(".gif") {
        "image/gif"
    } else {
        "image/jpeg"
    }
}

fn truncate_detail(detail: &str, max: usize) -> String {
    detail.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schemas::{AnalysisJobDoc, JobDefinitionDoc, JobStatus};
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::sync::Mutex;

    struct MemoryStore {
        jobs: Mutex<HashMap<String, AnalysisJobDoc>>,
        definitions: Mutex<HashMap<String, JobDefinitionDoc>>,
        cache: Mutex<HashMap<String, String>>,
        consultations: Mutex<Vec<ConsultationDoc>>,
        /// Fail this many definition reads before succeeding
        definition_read_failures: AtomicU32,
        fail_consultation_save: bool,
    }

    impl MemoryStore {
        fn new() -> Self {
            Self {
                jobs: Mutex::new(HashMap::new()),
                definitions: Mutex::new(HashMap::new()),
                cache: Mutex::new(HashMap::new()),
                consultations: Mutex::new(Vec::new()),
                definition_read_failures: AtomicU32::new(0),
                fail_consultation_save: false,
            }
        }

        async fn with_job(self, id: &str, job: AnalysisJobDoc) -> Self {
            self.jobs.lock().await.insert(id.to_string(), job);
            self
        }

        async fn with_definition(self, definition: JobDefinitionDoc) -> Self {
            self.definitions
                .lock()
                .await
                .insert(definition.id.clone(), definition);
            self
        }
    }

    #[async_trait::async_trait]
    impl AnalysisStore for MemoryStore {
        async fn load_job(&self, job_id: &str) -> Result<Option<AnalysisJobDoc>> {
            Ok(self.jobs.lock().await.get(job_id).cloned())
        }

        async fn claim_pending(&self, job_id: &str) -> Result<bool> {
            let mut jobs = self.jobs.lock().await;
            match jobs.get_mut(job_id) {
                Some(job) if job.status == JobStatus::Pending => {
                    job.status = JobStatus::Processing;
                    job.processing_started_at = Some(bson::DateTime::now());
                    Ok(true)
                }
                _ => Ok(false),
            }
        }

        async fn complete_job(&self, job_id: &str, analysis: &str, from_cache: bool) -> Result<()> {
            if let Some(job) = self.jobs.lock().await.get_mut(job_id) {
                job.status = JobStatus::Completed;
                job.ai_analysis = Some(analysis.to_string());
                job.from_cache = Some(from_cache);
                job.completed_at = Some(bson::DateTime::now());
            }
            Ok(())
        }

        async fn fail_job(&self, job_id: &str, message: &str, detail: &str) -> Result<()> {
            if let Some(job) = self.jobs.lock().await.get_mut(job_id) {
                job.status = JobStatus::Failed;
                job.error_message = Some(message.to_string());
                job.error_details = Some(detail.to_string());
                job.failed_at = Some(bson::DateTime::now());
            }
            Ok(())
        }

        async fn load_definition(&self, definition_id: &str) -> Result<Option<JobDefinitionDoc>> {
            if self.definition_read_failures.load(Ordering::SeqCst) > 0 {
                self.definition_read_failures.fetch_sub(1, Ordering::SeqCst);
                return Err(AtriumError::Database("definition read unavailable".into()));
            }
            Ok(self.definitions.lock().await.get(definition_id).cloned())
        }

        async fn cached_analysis(&self, key: &str) -> Result<Option<String>> {
            Ok(self.cache.lock().await.get(key).cloned())
        }

        async fn store_analysis(&self, key: &str, _definition_id: &str, analysis: &str) -> Result<()> {
            self.cache
                .lock()
                .await
                .insert(key.to_string(), analysis.to_string());
            Ok(())
        }

        async fn save_consultation(&self, record: ConsultationDoc) -> Result<String> {
            if self.fail_consultation_save {
                return Err(AtriumError::Database("insert failed".into()));
            }
            self.consultations.lock().await.push(record);
            Ok("consultation-1".to_string())
        }
    }

    struct MockGenerator {
        responses: Mutex<Vec<Result<String>>>,
        prompts: Mutex<Vec<(Vec<Part>, Option<String>)>>,
    }

    impl MockGenerator {
        fn with_responses(responses: Vec<Result<String>>) -> Self {
            Self {
                responses: Mutex::new(responses),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn succeeding(text: &str) -> Self {
            Self::with_responses(vec![Ok(text.to_string())])
        }

        async fn calls(&self) -> usize {
            self.prompts.lock().await.len()
        }
    }

    #[async_trait::async_trait]
    impl TextGenerator for MockGenerator {
        async fn generate(
            &self,
            parts: &[Part],
            system_instruction: Option<&str>,
        ) -> Result<String> {
            self.prompts
                .lock()
                .await
                .push((parts.to_vec(), system_instruction.map(str::to_string)));
            let mut responses = self.responses.lock().await;
            if responses.is_empty() {
                return Err(AtriumError::EmptyResponse);
            }
            responses.remove(0)
        }
    }

    struct MockFetcher {
        media: HashMap<String, String>,
    }

    impl MockFetcher {
        fn empty() -> Self {
            Self {
                media: HashMap::new(),
            }
        }

        fn with(url: &str, base64: &str) -> Self {
            let mut media = HashMap::new();
            media.insert(url.to_string(), base64.to_string());
            Self { media }
        }
    }

    #[async_trait::async_trait]
    impl MediaFetcher for MockFetcher {
        async fn fetch_base64(&self, url: &str) -> Option<String> {
            self.media.get(url).cloned()
        }
    }

    fn pending_job(definition_id: &str, answers: Vec<serde_json::Value>) -> AnalysisJobDoc {
        AnalysisJobDoc {
            id: None,
            user_id: Some("user-1".to_string()),
            definition_id: definition_id.to_string(),
            questions: vec![json!("How often do you feel this way?"), json!("Describe it")],
            answers,
            status: JobStatus::Pending,
            ai_analysis: None,
            from_cache: None,
            error_message: None,
            error_details: None,
            created_at: bson::DateTime::now(),
            processing_started_at: None,
            completed_at: None,
            failed_at: None,
        }
    }

    fn definition(id: &str) -> JobDefinitionDoc {
        JobDefinitionDoc {
            id: id.to_string(),
            title: Some("Self assessment".to_string()),
            ai_system_instruction: None,
        }
    }

    fn orchestrator_with(
        store: MemoryStore,
        generator: MockGenerator,
        fetcher: MockFetcher,
    ) -> (Arc<AnalysisOrchestrator>, Arc<MemoryStore>, Arc<MockGenerator>) {
        let store = Arc::new(store);
        let generator = Arc::new(generator);
        let orchestrator = Arc::new(AnalysisOrchestrator::new(
            store.clone(),
            generator.clone(),
            Arc::new(fetcher),
        ));
        (orchestrator, store, generator)
    }

    #[tokio::test]
    async fn accept_rejects_a_missing_job() {
        let (orchestrator, _, _) = orchestrator_with(
            MemoryStore::new(),
            MockGenerator::succeeding("x"),
            MockFetcher::empty(),
        );

        assert!(matches!(
            orchestrator.accept_job("missing").await,
            Err(AtriumError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn double_submission_is_rejected() {
        let store = MemoryStore::new()
            .with_job("job-1", pending_job("def-1", vec![json!(3)]))
            .await;
        let (orchestrator, _, _) =
            orchestrator_with(store, MockGenerator::succeeding("x"), MockFetcher::empty());

        orchestrator.accept_job("job-1").await.unwrap();
        assert!(matches!(
            orchestrator.accept_job("job-1").await,
            Err(AtriumError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn concurrent_submissions_claim_the_job_once() {
        let store = MemoryStore::new()
            .with_job("job-1", pending_job("def-1", vec![json!(3)]))
            .await;
        let (orchestrator, store, _) =
            orchestrator_with(store, MockGenerator::succeeding("x"), MockFetcher::empty());

        let (first, second) = tokio::join!(
            orchestrator.accept_job("job-1"),
            orchestrator.accept_job("job-1"),
        );

        // Whatever the interleaving, exactly one submission wins the claim
        assert_eq!(first.is_ok() as u8 + second.is_ok() as u8, 1);
        let job = store.jobs.lock().await.get("job-1").cloned().unwrap();
        assert_eq!(job.status, JobStatus::Processing);
    }

    #[tokio::test]
    async fn pipeline_completes_and_caches_the_result() {
        let store = MemoryStore::new()
            .with_job("job-1", pending_job("def-1", vec![json!(3), json!("often")]))
            .await
            .with_definition(definition("def-1"))
            .await;
        let (orchestrator, store, generator) = orchestrator_with(
            store,
            MockGenerator::succeeding("your analysis"),
            MockFetcher::empty(),
        );

        orchestrator.accept_job("job-1").await.unwrap();
        orchestrator.process_job("def-1", "job-1").await;

        let job = store.jobs.lock().await.get("job-1").cloned().unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.ai_analysis.as_deref(), Some("your analysis"));
        assert_eq!(job.from_cache, Some(false));
        assert_eq!(generator.calls().await, 1);
        assert_eq!(store.cache.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn identical_resubmission_is_served_from_the_cache() {
        let answers = vec![json!(3), json!("often")];
        let store = MemoryStore::new()
            .with_job("job-1", pending_job("def-1", answers.clone()))
            .await
            .with_job("job-2", pending_job("def-1", answers))
            .await
            .with_definition(definition("def-1"))
            .await;
        let (orchestrator, store, generator) = orchestrator_with(
            store,
            MockGenerator::succeeding("your analysis"),
            MockFetcher::empty(),
        );

        orchestrator.process_job("def-1", "job-1").await;
        orchestrator.process_job("def-1", "job-2").await;

        let job = store.jobs.lock().await.get("job-2").cloned().unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.ai_analysis.as_deref(), Some("your analysis"));
        assert_eq!(job.from_cache, Some(true));
        // Only the first job reached the generator
        assert_eq!(generator.calls().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn definition_reads_are_retried() {
        let store = MemoryStore::new()
            .with_job("job-1", pending_job("def-1", vec![json!(1)]))
            .await
            .with_definition(definition("def-1"))
            .await;
        store.definition_read_failures.store(2, Ordering::SeqCst);
        let (orchestrator, store, _) = orchestrator_with(
            store,
            MockGenerator::succeeding("analysis"),
            MockFetcher::empty(),
        );

        orchestrator.process_job("def-1", "job-1").await;

        let job = store.jobs.lock().await.get("job-1").cloned().unwrap();
        assert_eq!(job.status, JobStatus::Completed);
    }

    #[tokio::test(start_paused = true)]
    async fn missing_definition_fails_the_job() {
        let store = MemoryStore::new()
            .with_job("job-1", pending_job("ghost", vec![json!(1)]))
            .await;
        let (orchestrator, store, generator) = orchestrator_with(
            store,
            MockGenerator::succeeding("unused"),
            MockFetcher::empty(),
        );

        orchestrator.process_job("ghost", "job-1").await;

        let job = store.jobs.lock().await.get("job-1").cloned().unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        assert!(job.error_message.unwrap().contains("technical error"));
        assert_eq!(generator.calls().await, 0);
    }

    #[tokio::test]
    async fn server_errors_fail_with_the_user_facing_message() {
        let store = MemoryStore::new()
            .with_job("job-1", pending_job("def-1", vec![json!(1)]))
            .await
            .with_definition(definition("def-1"))
            .await;
        let (orchestrator, store, _) = orchestrator_with(
            store,
            MockGenerator::with_responses(vec![Err(AtriumError::RemoteStatus(503))]),
            MockFetcher::empty(),
        );

        orchestrator.process_job("def-1", "job-1").await;

        let job = store.jobs.lock().await.get("job-1").cloned().unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(
            job.error_message.as_deref(),
            Some("Server error. Please try again later.")
        );
        assert!(job.error_details.unwrap().len() <= 500);
    }

    #[tokio::test]
    async fn unreachable_answer_image_degrades_to_text() {
        let store = MemoryStore::new()
            .with_job(
                "job-1",
                pending_job("def-1", vec![json!("IMAGE_URL:https://cdn.example/gone.jpg")]),
            )
            .await
            .with_definition(definition("def-1"))
            .await;
        let (orchestrator, store, generator) = orchestrator_with(
            store,
            MockGenerator::succeeding("analysis"),
            MockFetcher::empty(),
        );

        orchestrator.process_job("def-1", "job-1").await;

        let job = store.jobs.lock().await.get("job-1").cloned().unwrap();
        assert_eq!(job.status, JobStatus::Completed);

        let prompts = generator.prompts.lock().await;
        let rendered: Vec<&Part> = prompts[0].0.iter().collect();
        assert!(rendered.iter().any(|p| matches!(
            p,
            Part::Text { text } if text.contains("could not be retrieved")
        )));
        assert!(!rendered
            .iter()
            .any(|p| matches!(p, Part::InlineData { .. })));
    }

    #[tokio::test]
    async fn answer_images_are_inlined_when_reachable() {
        let store = MemoryStore::new()
            .with_job(
                "job-1",
                pending_job("def-1", vec![json!("IMAGE_URL:https://cdn.example/ok.png")]),
            )
            .await
            .with_definition(definition("def-1"))
            .await;
        let (orchestrator, _, generator) = orchestrator_with(
            store,
            MockGenerator::succeeding("analysis"),
            MockFetcher::with("https://cdn.example/ok.png", "QUJD"),
        );

        orchestrator.process_job("def-1", "job-1").await;

        let prompts = generator.prompts.lock().await;
        assert!(prompts[0].0.iter().any(|p| matches!(
            p,
            Part::InlineData { inline_data } if inline_data.mime_type == "image/png"
        )));
    }

    #[tokio::test]
    async fn free_text_analysis_saves_a_consultation() {
        let (orchestrator, store, generator) = orchestrator_with(
            MemoryStore::new(),
            MockGenerator::succeeding("here is what stands out"),
            MockFetcher::with("https://cdn.example/a.jpg", "QUJD"),
        );

        let result = orchestrator
            .analyze_text(
                "user-1",
                "I have been feeling overwhelmed lately",
                &["https://cdn.example/a.jpg".to_string()],
            )
            .await
            .unwrap();

        assert_eq!(result.analysis, "here is what stands out");
        assert_eq!(result.consultation_id.as_deref(), Some("consultation-1"));

        let saved = store.consultations.lock().await;
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].user_id, "user-1");
        assert_eq!(saved[0].attachment_urls.len(), 1);

        let prompts = generator.prompts.lock().await;
        assert!(prompts[0].0.iter().any(|p| matches!(p, Part::InlineData { .. })));
        assert_eq!(
            prompts[0].1.as_deref(),
            Some(prompts::TEXT_ANALYSIS_INSTRUCTION)
        );
    }

    #[tokio::test]
    async fn consultation_save_failure_still_returns_the_analysis() {
        let mut store = MemoryStore::new();
        store.fail_consultation_save = true;
        let (orchestrator, _, _) = orchestrator_with(
            store,
            MockGenerator::succeeding("analysis text"),
            MockFetcher::empty(),
        );

        let result = orchestrator
            .analyze_text("user-1", "some text here", &[])
            .await
            .unwrap();

        assert_eq!(result.analysis, "analysis text");
        assert_eq!(result.consultation_id, None);
    }

    #[test]
    fn mime_guessing_covers_the_common_types() {
        assert_eq!(mime_for_url("https://x/a.png"), "image/png");
        assert_eq!(mime_for_url("https://x/a.PNG?token=1"), "image/png");
        assert_eq!(mime_for_url("https://x/a.webp"), "image/webp");
        assert_eq!(mime_for_url("https://x/a.gif"), "image/gif");
        assert_eq!(mime_for_url("https://x/a.jpg"), "image/jpeg");
        assert_eq!(mime_for_url("https://x/no-extension"), "image/jpeg");
    }
}
