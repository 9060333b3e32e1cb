//! Request handling: the two operations an outer surface exposes.
//!
//! Each request is validated, its original staged in the background, and then
//! run through the CPU-bound pipeline on the blocking pool. A semaphore caps
//! how many requests decode at once, and a deadline bounds each request as a
//! whole; the pipeline itself has neither.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::time::timeout;

use crate::config::Config;
use crate::error::{ErrorKind, PipelineError};
use crate::pipeline::{PreviewGenerator, TransformEngine, Validator};
use crate::staging::{staged_name, BlobStore, FsBlobStore, NullBlobStore};
use crate::types::{ImageBlob, ProcessedResult, TransformRequest, Upload};

/// Serves `preview` and `process` requests.
///
/// Cheap to share behind an `Arc`; all per-request state lives in the call.
pub struct EditService {
    validator: Validator,
    previewer: Arc<PreviewGenerator>,
    engine: Arc<TransformEngine>,
    staging: Arc<dyn BlobStore>,
    workers: Arc<Semaphore>,
    request_timeout: Duration,
}

impl EditService {
    /// Create a service with an explicit staging backend.
    pub fn new(config: &Config, staging: Arc<dyn BlobStore>) -> Self {
        Self {
            validator: Validator::new(config.limits.clone()),
            previewer: Arc::new(PreviewGenerator::new(
                config.limits.clone(),
                config.preview.clone(),
            )),
            engine: Arc::new(TransformEngine::new(config.limits.clone(), &config.output)),
            staging,
            workers: Arc::new(Semaphore::new(config.processing.parallel_workers)),
            request_timeout: Duration::from_millis(config.limits.request_timeout_ms),
        }
    }

    /// Create a service that stages into the configured directory, or
    /// nowhere when staging is disabled.
    pub fn from_config(config: &Config) -> Self {
        let staging: Arc<dyn BlobStore> = if config.staging.enabled {
            Arc::new(FsBlobStore::new(config.staging_dir()))
        } else {
            Arc::new(NullBlobStore)
        };
        Self::new(config, staging)
    }

    /// Produce a low-resolution JPEG of the unmodified upload.
    pub async fn preview(&self, upload: Option<Upload>) -> Result<ProcessedResult, PipelineError> {
        let result = timeout(self.request_timeout, async {
            let blob = self.admit(upload)?;
            let previewer = Arc::clone(&self.previewer);
            self.run_blocking("preview", move || previewer.generate(&blob))
                .await
        })
        .await
        .unwrap_or_else(|_| Err(self.timeout_error("preview")));

        log_outcome("preview", &result);
        result
    }

    /// Apply `request` to the upload and encode the result.
    pub async fn process(
        &self,
        upload: Option<Upload>,
        request: TransformRequest,
    ) -> Result<ProcessedResult, PipelineError> {
        let result = timeout(self.request_timeout, async {
            let blob = self.validator.validate(upload)?;
            request.validate()?;
            self.stage(&blob);
            let engine = Arc::clone(&self.engine);
            self.run_blocking("process", move || engine.process(&blob, &request))
                .await
        })
        .await
        .unwrap_or_else(|_| Err(self.timeout_error("process")));

        log_outcome("process", &result);
        result
    }

    /// Validate the upload and hand a copy of the original to staging.
    fn admit(&self, upload: Option<Upload>) -> Result<ImageBlob, PipelineError> {
        let blob = self.validator.validate(upload)?;
        self.stage(&blob);
        Ok(blob)
    }

    /// Fire-and-forget: staging runs on the blocking pool and failures are
    /// only logged.
    fn stage(&self, blob: &ImageBlob) {
        let staging = Arc::clone(&self.staging);
        let blob = blob.clone();
        let name = staged_name(blob.original_name());
        tokio::task::spawn_blocking(move || {
            if let Err(e) = staging.store(blob.bytes(), &name) {
                tracing::warn!("Failed to stage {:?}: {}", name, e);
            }
        });
    }

    /// Run `work` on the blocking pool under a worker permit.
    ///
    /// The permit moves into the blocking task, so a request that times out
    /// keeps its slot until the job itself finishes.
    async fn run_blocking<F>(
        &self,
        stage: &'static str,
        work: F,
    ) -> Result<ProcessedResult, PipelineError>
    where
        F: FnOnce() -> Result<ProcessedResult, PipelineError> + Send + 'static,
    {
        let permit = Arc::clone(&self.workers)
            .acquire_owned()
            .await
            .map_err(|e| PipelineError::Processing {
                stage,
                message: format!("Worker pool closed: {}", e),
            })?;

        tokio::task::spawn_blocking(move || {
            let result = work();
            drop(permit);
            result
        })
        .await
        .map_err(|e| PipelineError::Processing {
            stage,
            message: format!("Task join error: {}", e),
        })?
    }

    fn timeout_error(&self, operation: &'static str) -> PipelineError {
        PipelineError::Timeout {
            operation,
            timeout_ms: self.request_timeout.as_millis() as u64,
        }
    }
}

fn log_outcome(operation: &str, result: &Result<ProcessedResult, PipelineError>) {
    match result {
        Ok(out) => tracing::debug!(
            "{} ok: {}x{} {} ({} bytes)",
            operation,
            out.width,
            out.height,
            out.media_type,
            out.bytes.len()
        ),
        Err(e) => match e.kind() {
            ErrorKind::InvalidInput | ErrorKind::MissingFile => {
                tracing::warn!("{} rejected: {}", operation, e)
            }
            _ => tracing::error!("{} failed: {}", operation, e),
        },
    }
}
