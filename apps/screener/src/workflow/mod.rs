//! Upload-match workflow: the two-phase submission against the scoring service.
//!
//! `Idle → Uploading → Matching → Succeeded`, or `Failed` from either busy
//! phase. A failed run is retried only by calling `submit` again, which
//! re-runs both phases from scratch.
//!
//! State lives in a `watch` channel owned by the workflow. Callers read
//! snapshots through `state()` or follow transitions through `subscribe()`.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{info, warn};

use crate::errors::{Phase, SubmitError, ValidationError, WorkflowError};
use crate::models::{MatchResult, ResumeFile};
use crate::scoring_client::{ScoringService, ServiceError};

/// Message recorded when a submission future is dropped before it settles.
pub const ABANDONED_MESSAGE: &str = "submission abandoned";

#[derive(Debug, Clone, Default, PartialEq)]
pub enum WorkflowState {
    #[default]
    Idle,
    Uploading,
    Matching,
    Succeeded(Arc<MatchResult>),
    Failed(WorkflowError),
}

impl WorkflowState {
    /// True while a blocking progress indicator should be shown.
    pub fn is_busy(&self) -> bool {
        matches!(self, WorkflowState::Uploading | WorkflowState::Matching)
    }

    pub fn label(&self) -> &'static str {
        match self {
            WorkflowState::Idle => "idle",
            WorkflowState::Uploading => "uploading",
            WorkflowState::Matching => "matching",
            WorkflowState::Succeeded(_) => "succeeded",
            WorkflowState::Failed(_) => "failed",
        }
    }
}

pub struct UploadMatchWorkflow {
    service: Arc<dyn ScoringService>,
    state: watch::Sender<WorkflowState>,
}

impl UploadMatchWorkflow {
    pub fn new(service: Arc<dyn ScoringService>) -> Self {
        let (state, _) = watch::channel(WorkflowState::Idle);
        Self { service, state }
    }

    pub fn state(&self) -> WorkflowState {
        self.state.borrow().clone()
    }

    pub fn is_busy(&self) -> bool {
        self.state.borrow().is_busy()
    }

    /// Receiver that observes every state the workflow moves through.
    pub fn subscribe(&self) -> watch::Receiver<WorkflowState> {
        self.state.subscribe()
    }

    /// Uploads `files` as one batch, then requests scoring against
    /// `job_description` (empty is allowed).
    ///
    /// An empty `files` slice fails with `ValidationError` before any network
    /// call and without touching state. A call made while another submission
    /// is busy returns `SubmitError::Busy`.
    pub async fn submit(
        &self,
        files: &[ResumeFile],
        job_description: &str,
    ) -> Result<Arc<MatchResult>, SubmitError> {
        if files.is_empty() {
            return Err(ValidationError::NoFilesSelected.into());
        }

        let claimed = self.state.send_if_modified(|state| {
            if state.is_busy() {
                false
            } else {
                *state = WorkflowState::Uploading;
                true
            }
        });
        if !claimed {
            warn!("Rejected submission: another submission is in progress");
            return Err(SubmitError::Busy);
        }

        let in_flight = InFlight {
            state: &self.state,
            settled: false,
        };

        info!("Uploading {} resume(s)", files.len());
        if let Err(err) = self.service.batch_upload(files).await {
            return Err(in_flight.fail(Phase::Upload, err));
        }

        self.state.send_replace(WorkflowState::Matching);
        info!(
            "Upload complete, matching against job description ({} chars)",
            job_description.chars().count()
        );

        let result = match self.service.match_candidates(job_description).await {
            Ok(result) => Arc::new(result),
            Err(err) => return Err(in_flight.fail(Phase::Match, err)),
        };

        info!(
            "Matching complete: {} candidate record(s)",
            result.shortlisted_candidates.len()
        );
        in_flight.succeed(Arc::clone(&result));

        Ok(result)
    }
}

/// Settles the workflow state for one submission. If the submission future is
/// dropped mid-flight, the state falls back to `Failed` so a retry is possible.
struct InFlight<'a> {
    state: &'a watch::Sender<WorkflowState>,
    settled: bool,
}

impl InFlight<'_> {
    fn fail(mut self, phase: Phase, err: ServiceError) -> SubmitError {
        let error = WorkflowError {
            phase,
            message: err.user_message(),
        };
        warn!("Submission failed during {phase}: {}", error.message);
        self.settle(WorkflowState::Failed(error.clone()));
        SubmitError::Workflow(error)
    }

    fn succeed(mut self, result: Arc<MatchResult>) {
        self.settle(WorkflowState::Succeeded(result));
    }

    fn settle(&mut self, state: WorkflowState) {
        self.state.send_replace(state);
        self.settled = true;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let phase = match *self.state.borrow() {
            WorkflowState::Matching => Phase::Match,
            _ => Phase::Upload,
        };
        warn!("Submission dropped during {phase}");
        self.state.send_replace(WorkflowState::Failed(WorkflowError {
            phase,
            message: ABANDONED_MESSAGE.to_string(),
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ScoredCandidate;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Mutex, OnceLock};
    use std::time::Duration;
    use tokio::sync::Notify;

    /// In-memory scoring service. Fails the next `upload_failures` uploads and
    /// `match_failures` matches, and records the workflow state it saw on each call.
    #[derive(Default)]
    struct MockService {
        result: MatchResult,
        upload_failures: AtomicUsize,
        match_failures: AtomicUsize,
        upload_calls: AtomicUsize,
        match_calls: AtomicUsize,
        uploaded: Mutex<Vec<String>>,
        job_descriptions: Mutex<Vec<String>>,
        observed: Mutex<Vec<&'static str>>,
        observer: OnceLock<watch::Receiver<WorkflowState>>,
    }

    impl MockService {
        fn observe(&self) {
            if let Some(rx) = self.observer.get() {
                self.observed.lock().unwrap().push(rx.borrow().label());
            }
        }

        fn take_failure(counter: &AtomicUsize) -> bool {
            counter
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
        }
    }

    #[async_trait]
    impl ScoringService for MockService {
        async fn batch_upload(&self, files: &[ResumeFile]) -> Result<(), ServiceError> {
            self.observe();
            self.upload_calls.fetch_add(1, Ordering::SeqCst);
            if Self::take_failure(&self.upload_failures) {
                return Err(ServiceError::Api {
                    status: 500,
                    detail: None,
                });
            }
            self.uploaded
                .lock()
                .unwrap()
                .extend(files.iter().map(|f| f.name.clone()));
            Ok(())
        }

        async fn match_candidates(
            &self,
            job_description: &str,
        ) -> Result<MatchResult, ServiceError> {
            self.observe();
            self.match_calls.fetch_add(1, Ordering::SeqCst);
            self.job_descriptions
                .lock()
                .unwrap()
                .push(job_description.to_string());
            if Self::take_failure(&self.match_failures) {
                return Err(ServiceError::Api {
                    status: 503,
                    detail: Some("Scoring model unavailable".to_string()),
                });
            }
            Ok(self.result.clone())
        }
    }

    /// Upload that blocks until the gate is opened.
    struct GatedService {
        gate: Arc<Notify>,
    }

    #[async_trait]
    impl ScoringService for GatedService {
        async fn batch_upload(&self, _files: &[ResumeFile]) -> Result<(), ServiceError> {
            self.gate.notified().await;
            Ok(())
        }

        async fn match_candidates(&self, _: &str) -> Result<MatchResult, ServiceError> {
            Ok(MatchResult::default())
        }
    }

    fn sample_result() -> MatchResult {
        MatchResult {
            shortlisted_candidates: vec![
                ScoredCandidate {
                    filename: "ada.pdf".to_string(),
                    email: Some("ada@example.com".to_string()),
                    overall_score: Some(8.2),
                    ..Default::default()
                },
                ScoredCandidate {
                    filename: "linus.pdf".to_string(),
                    overall_score: Some(6.4),
                    ..Default::default()
                },
            ],
        }
    }

    fn two_files() -> Vec<ResumeFile> {
        vec![
            ResumeFile::new("ada.pdf", "%PDF-ada"),
            ResumeFile::new("linus.pdf", "%PDF-linus"),
        ]
    }

    fn workflow_with(service: MockService) -> (UploadMatchWorkflow, Arc<MockService>) {
        let service = Arc::new(service);
        let workflow = UploadMatchWorkflow::new(service.clone());
        assert!(service.observer.set(workflow.subscribe()).is_ok());
        (workflow, service)
    }

    #[tokio::test]
    async fn test_happy_path_moves_through_every_phase() {
        let (workflow, service) = workflow_with(MockService {
            result: sample_result(),
            ..Default::default()
        });
        assert_eq!(workflow.state(), WorkflowState::Idle);

        let result = workflow
            .submit(&two_files(), "Backend Engineer")
            .await
            .unwrap();

        assert_eq!(*result, sample_result());
        assert_eq!(
            *service.observed.lock().unwrap(),
            vec!["uploading", "matching"]
        );
        assert_eq!(workflow.state(), WorkflowState::Succeeded(result));
        assert!(!workflow.is_busy());
        assert_eq!(
            *service.uploaded.lock().unwrap(),
            vec!["ada.pdf", "linus.pdf"]
        );
        assert_eq!(
            *service.job_descriptions.lock().unwrap(),
            vec!["Backend Engineer"]
        );
    }

    #[tokio::test]
    async fn test_subscriber_sees_final_state_after_workflow_dropped() {
        let workflow = UploadMatchWorkflow::new(Arc::new(MockService {
            result: sample_result(),
            ..Default::default()
        }));
        let mut rx = workflow.subscribe();

        workflow.submit(&two_files(), "SRE").await.unwrap();
        drop(workflow);

        assert!(rx.changed().await.is_ok());
        assert!(matches!(
            *rx.borrow_and_update(),
            WorkflowState::Succeeded(_)
        ));
        assert!(rx.changed().await.is_err());
    }

    #[tokio::test]
    async fn test_upload_failure_never_calls_match() {
        let (workflow, service) = workflow_with(MockService {
            upload_failures: AtomicUsize::new(1),
            ..Default::default()
        });

        let err = workflow.submit(&two_files(), "Backend Engineer").await;

        let expected = WorkflowError {
            phase: Phase::Upload,
            message: "Request failed with status code 500".to_string(),
        };
        assert_eq!(err, Err(SubmitError::Workflow(expected.clone())));
        assert_eq!(workflow.state(), WorkflowState::Failed(expected));
        assert!(!workflow.is_busy());
        assert_eq!(service.match_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_match_failure_surfaces_server_detail() {
        let (workflow, service) = workflow_with(MockService {
            match_failures: AtomicUsize::new(1),
            ..Default::default()
        });

        let err = workflow.submit(&two_files(), "").await.unwrap_err();

        match err {
            SubmitError::Workflow(error) => {
                assert_eq!(error.phase, Phase::Match);
                assert_eq!(error.message, "Scoring model unavailable");
            }
            other => panic!("expected workflow error, got {other:?}"),
        }
        assert_eq!(service.upload_calls.load(Ordering::SeqCst), 1);
        assert!(matches!(workflow.state(), WorkflowState::Failed(_)));
    }

    #[tokio::test]
    async fn test_empty_files_is_validation_error_without_calls() {
        let (workflow, service) = workflow_with(MockService::default());

        let err = workflow.submit(&[], "Backend Engineer").await;

        assert_eq!(
            err,
            Err(SubmitError::Validation(ValidationError::NoFilesSelected))
        );
        assert_eq!(workflow.state(), WorkflowState::Idle);
        assert_eq!(service.upload_calls.load(Ordering::SeqCst), 0);
        assert_eq!(service.match_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_validation_after_failure_keeps_failed_state() {
        let (workflow, _service) = workflow_with(MockService {
            upload_failures: AtomicUsize::new(1),
            ..Default::default()
        });
        let _ = workflow.submit(&two_files(), "x").await;
        let failed = workflow.state();

        let _ = workflow.submit(&[], "x").await;
        assert_eq!(workflow.state(), failed);
    }

    #[tokio::test]
    async fn test_retry_after_match_failure_reruns_both_phases() {
        let (workflow, service) = workflow_with(MockService {
            result: sample_result(),
            match_failures: AtomicUsize::new(1),
            ..Default::default()
        });

        assert!(workflow.submit(&two_files(), "SRE").await.is_err());
        let result = workflow.submit(&two_files(), "SRE").await.unwrap();

        assert_eq!(result.shortlisted_candidates.len(), 2);
        assert_eq!(service.upload_calls.load(Ordering::SeqCst), 2);
        assert_eq!(service.match_calls.load(Ordering::SeqCst), 2);
        assert_eq!(
            *service.observed.lock().unwrap(),
            vec!["uploading", "matching", "uploading", "matching"]
        );
    }

    #[tokio::test]
    async fn test_resubmit_after_success_starts_fresh_run() {
        let (workflow, service) = workflow_with(MockService {
            result: sample_result(),
            ..Default::default()
        });

        workflow.submit(&two_files(), "a").await.unwrap();
        workflow.submit(&two_files(), "b").await.unwrap();

        assert_eq!(service.upload_calls.load(Ordering::SeqCst), 2);
        assert!(matches!(workflow.state(), WorkflowState::Succeeded(_)));
    }

    #[tokio::test]
    async fn test_concurrent_submit_is_rejected_while_busy() {
        let gate = Arc::new(Notify::new());
        let workflow = UploadMatchWorkflow::new(Arc::new(GatedService { gate: gate.clone() }));
        let mut rx = workflow.subscribe();
        let files = two_files();

        let first = workflow.submit(&files, "Backend Engineer");
        let second = async {
            rx.wait_for(|state| state.is_busy()).await.unwrap();
            let outcome = workflow.submit(&files, "Backend Engineer").await;
            gate.notify_one();
            outcome
        };
        let (first, second) = tokio::join!(first, second);

        assert!(first.is_ok());
        assert_eq!(second.unwrap_err(), SubmitError::Busy);
    }

    #[tokio::test]
    async fn test_dropped_submission_does_not_stay_busy() {
        let workflow = UploadMatchWorkflow::new(Arc::new(GatedService {
            gate: Arc::new(Notify::new()),
        }));

        let outcome = tokio::time::timeout(
            Duration::from_millis(20),
            workflow.submit(&two_files(), "Backend Engineer"),
        )
        .await;

        assert!(outcome.is_err());
        assert_eq!(
            workflow.state(),
            WorkflowState::Failed(WorkflowError {
                phase: Phase::Upload,
                message: ABANDONED_MESSAGE.to_string(),
            })
        );
    }

    #[test]
    fn test_busy_only_while_uploading_or_matching() {
        assert!(!WorkflowState::Idle.is_busy());
        assert!(WorkflowState::Uploading.is_busy());
        assert!(WorkflowState::Matching.is_busy());
        assert!(!WorkflowState::Succeeded(Arc::new(MatchResult::default())).is_busy());
        assert!(!WorkflowState::Failed(WorkflowError {
            phase: Phase::Match,
            message: "x".to_string(),
        })
        .is_busy());
    }
}
