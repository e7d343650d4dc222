use std::sync::Arc;
use std::time::{Duration, Instant};

use confidence_tracker::{ConfidenceTracker, RetryStrategy};
use exec_strategy::{ExecCtx, StrategySet};
use pattern_store::{Outcome, PatternStore};
use resource_lease::LeaseRegistry;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};
use uiact_core_types::{
    ActionId, ActionRequest, ActionResult, EngineError, ErrorKind, ExecMode, OwnerId, PatternKey,
    VerifyMethod,
};
use verify_chain::VerificationChain;

use crate::events::{EventsPort, NoopEvents};
use crate::metrics::ExecMetrics;
use crate::model::{millis, AttemptTrace, ExecPhase, ExecutorCfg};
use crate::redact;

/// Attempts with less budget than this are not worth starting.
const MIN_ATTEMPT_BUDGET: Duration = Duration::from_millis(10);

/// Front door for running one UI action under the cancellation guarantee.
///
/// Reentrant: concurrent callers are fine, but each underlying resource is
/// protected by a lease, so at most one action is in flight per resource.
/// Every collaborator arrives through the constructor; there is no
/// process-wide state.
pub struct ActionExecutor {
    strategies: Arc<StrategySet>,
    chain: Arc<VerificationChain>,
    tracker: Arc<ConfidenceTracker>,
    store: Arc<PatternStore>,
    leases: Arc<LeaseRegistry>,
    events: Arc<dyn EventsPort>,
    metrics: ExecMetrics,
    owner: OwnerId,
    cfg: ExecutorCfg,
}

impl ActionExecutor {
    pub fn new(
        strategies: Arc<StrategySet>,
        chain: Arc<VerificationChain>,
        tracker: Arc<ConfidenceTracker>,
        store: Arc<PatternStore>,
        leases: Arc<LeaseRegistry>,
        cfg: ExecutorCfg,
    ) -> Self {
        Self {
            strategies,
            chain,
            tracker,
            store,
            leases,
            events: Arc::new(NoopEvents),
            metrics: ExecMetrics::default(),
            owner: OwnerId::new(),
            cfg,
        }
    }

    pub fn with_events(mut self, events: Arc<dyn EventsPort>) -> Self {
        self.events = events;
        self
    }

    pub fn metrics(&self) -> &ExecMetrics {
        &self.metrics
    }

    pub fn owner(&self) -> &OwnerId {
        &self.owner
    }

    /// Run one logical action to a single result. Retryable failures are
    /// absorbed up to the derived retry budget; only the final outcome
    /// crosses this boundary.
    pub async fn execute(&self, request: ActionRequest) -> ActionResult {
        self.execute_with_cancel(request, CancellationToken::new())
            .await
    }

    #[instrument(skip_all, fields(
        kind = %request.action_kind,
        platform = %request.platform,
        target = %redact::target(&request.target_description, 64),
    ))]
    pub async fn execute_with_cancel(
        &self,
        request: ActionRequest,
        cancel: CancellationToken,
    ) -> ActionResult {
        let action_id = ActionId::new();
        let started = Instant::now();
        self.events.emit_started(&action_id, &request).await;
        if let Some(text) = &request.input_text {
            debug!(input = %redact::input(text), "typed input present");
        }

        if let Err(err) = request.validate() {
            let result = ActionResult::failed(err.kind, 0.0, started.elapsed(), err.detail);
            self.metrics.record_failure();
            self.events.emit_finished(&action_id, &result).await;
            return result;
        }

        let resource = request.resource_id();
        let _lease = match self.leases.acquire(&resource, &self.owner) {
            Ok(guard) => guard,
            Err(err) => {
                // never queue here; re-queuing is the caller's decision
                let err = EngineError::from(err);
                warn!(resource = %resource, "lease contention");
                self.metrics.record_lease_conflict();
                self.metrics.record_failure();
                let result = ActionResult::failed(err.kind, 0.0, started.elapsed(), err.detail);
                self.events.emit_finished(&action_id, &result).await;
                return result;
            }
        };

        let strategy = self
            .tracker
            .build_retry_strategy(request.action_kind, &request.platform);
        let base_mode = self
            .cfg
            .requested_mode
            .unwrap_or(strategy.recommended_driver);
        debug!(
            phase = ExecPhase::Pending.as_str(),
            base_mode = %base_mode,
            max_retries = strategy.max_retries,
            escalate = strategy.escalate_driver,
            "retry strategy derived"
        );

        let result = self
            .attempt_loop(&action_id, &request, &strategy, base_mode, &cancel, started)
            .await;

        if result.success {
            self.metrics.record_success();
        } else {
            self.metrics.record_failure();
        }
        self.events.emit_finished(&action_id, &result).await;
        result
    }

    async fn attempt_loop(
        &self,
        action_id: &ActionId,
        request: &ActionRequest,
        strategy: &RetryStrategy,
        base_mode: ExecMode,
        cancel: &CancellationToken,
        started: Instant,
    ) -> ActionResult {
        let mut traces: Vec<AttemptTrace> = Vec::new();
        let mut last_kind = ErrorKind::VerificationInconclusive;
        let mut best_confidence: f64 = 0.0;
        // request.timeout bounds the whole logical request; attempts and
        // backoff share the budget, so the call returns within
        // timeout + grace even when the driver never does.
        let deadline = started + request.timeout;

        for attempt in 0..strategy.total_attempts() {
            let remaining = deadline
                .checked_duration_since(Instant::now())
                .unwrap_or_default();
            if remaining < MIN_ATTEMPT_BUDGET {
                debug!(attempt, "request budget exhausted before attempt");
                if traces.is_empty() {
                    last_kind = ErrorKind::Timeout;
                }
                break;
            }
            if cancel.is_cancelled() {
                debug!(attempt, "cancelled between attempts");
                last_kind = ErrorKind::Timeout;
                traces.push(AttemptTrace {
                    index: attempt,
                    driver: base_mode,
                    duration_ms: 0,
                    verified_by: None,
                    error: Some("cancelled by caller before attempt".into()),
                });
                break;
            }

            let mode = self.mode_for_attempt(strategy, base_mode, attempt);
            let key = PatternKey::for_request(request, mode);
            self.metrics.record_attempt();
            self.events.emit_attempt(action_id, attempt, mode).await;
            debug!(phase = ExecPhase::Executing.as_str(), attempt, driver = %mode, "attempt started");

            let attempt_started = Instant::now();
            let ctx = ExecCtx::new(action_id.clone(), remaining, cancel.clone());
            let attempt_result = self.strategies.execute(mode, &ctx, request).await;
            let attempt_elapsed = attempt_started.elapsed();

            match attempt_result {
                Ok(report) => {
                    debug!(phase = ExecPhase::Verifying.as_str(), attempt, "driver reported; verifying");
                    let verdict = self.chain.verify(request, &report.state).await;
                    if verdict.confidence > best_confidence {
                        best_confidence = verdict.confidence;
                    }
                    match verdict.passed {
                        Some(true) => {
                            self.store.record(&key, Outcome::success(attempt_elapsed));
                            traces.push(AttemptTrace {
                                index: attempt,
                                driver: mode,
                                duration_ms: millis(attempt_elapsed),
                                verified_by: verdict.method,
                                error: None,
                            });
                            info!(phase = ExecPhase::Succeeded.as_str(), attempt, driver = %mode, "action confirmed");
                            let method = verdict.method.unwrap_or(VerifyMethod::Vision);
                            return ActionResult::succeeded(
                                verdict.confidence,
                                method,
                                started.elapsed(),
                                join_traces(&traces),
                            );
                        }
                        Some(false) => {
                            self.store.record(&key, Outcome::failure(attempt_elapsed));
                            last_kind = ErrorKind::VerificationInconclusive;
                            traces.push(AttemptTrace {
                                index: attempt,
                                driver: mode,
                                duration_ms: millis(attempt_elapsed),
                                verified_by: verdict.method,
                                error: Some("verification reported no effect".into()),
                            });
                        }
                        None => {
                            self.store.record(&key, Outcome::failure(attempt_elapsed));
                            last_kind = ErrorKind::VerificationInconclusive;
                            traces.push(AttemptTrace {
                                index: attempt,
                                driver: mode,
                                duration_ms: millis(attempt_elapsed),
                                verified_by: None,
                                error: Some(format!(
                                    "verification inconclusive (best {:.2})",
                                    verdict.confidence
                                )),
                            });
                        }
                    }
                }
                Err(err) => {
                    self.store.record(&key, Outcome::failure(attempt_elapsed));
                    let err = EngineError::from(err);
                    last_kind = err.kind;
                    traces.push(AttemptTrace {
                        index: attempt,
                        driver: mode,
                        duration_ms: millis(attempt_elapsed),
                        verified_by: None,
                        error: Some(err.detail.clone()),
                    });
                    if !err.kind.retryable() {
                        break;
                    }
                }
            }

            if attempt < u32::from(strategy.max_retries) {
                debug!(phase = ExecPhase::Retrying.as_str(), attempt, "attempt failed; backing off");
                if let Some(delay) = strategy.backoff.get(attempt as usize) {
                    let left = deadline
                        .checked_duration_since(Instant::now())
                        .unwrap_or_default();
                    tokio::time::sleep((*delay).min(left)).await;
                }
            }
        }

        warn!(phase = ExecPhase::Failed.as_str(), kind = %last_kind, "no attempt succeeded");
        ActionResult::failed(
            last_kind,
            best_confidence,
            started.elapsed(),
            join_traces(&traces),
        )
    }

    /// From the second-to-last retry onward an escalating strategy switches
    /// to the process-isolated path regardless of the requested mode.
    fn mode_for_attempt(
        &self,
        strategy: &RetryStrategy,
        base_mode: ExecMode,
        attempt: u32,
    ) -> ExecMode {
        if !strategy.escalate_driver {
            return base_mode;
        }
        let switch_at = u32::from(strategy.max_retries.saturating_sub(1)).max(1);
        if attempt >= switch_at && base_mode != ExecMode::Subprocess {
            self.metrics.record_escalation();
            return ExecMode::Subprocess;
        }
        base_mode
    }
}

fn join_traces(traces: &[AttemptTrace]) -> String {
    traces
        .iter()
        .map(|trace| trace.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
