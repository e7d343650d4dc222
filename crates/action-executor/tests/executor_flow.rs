use std::io;
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use action_executor::{ActionExecutor, ExecutorCfg};
use async_trait::async_trait;
use confidence_tracker::ConfidenceTracker;
use exec_strategy::{
    BlockingDriver, DriverFault, DriverReport, ProcessLauncher, StrategyCfg, StrategySet,
};
use pattern_store::{Outcome, PatternStore};
use resource_lease::LeaseRegistry;
use serde_json::json;
use tokio::process::{Child, Command};
use tokio_util::sync::CancellationToken;
use uiact_core_types::{
    ActionKind, ActionRequest, ErrorKind, ExecMode, PatternKey, VerifyMethod,
};
use verify_chain::{
    ChainPolicy, DriverState, StructuralPort, TierReading, VerificationChain, VerifyError,
};

struct OkDriver {
    delay: Duration,
}

impl BlockingDriver for OkDriver {
    fn name(&self) -> &str {
        "stub"
    }

    fn perform(&self, _request: &ActionRequest) -> Result<DriverReport, DriverFault> {
        std::thread::sleep(self.delay);
        Ok(DriverReport::with_state(json!({"clicked": true})))
    }
}

struct FailingDriver {
    calls: Arc<AtomicU64>,
}

impl BlockingDriver for FailingDriver {
    fn name(&self) -> &str {
        "failing-stub"
    }

    fn perform(&self, _request: &ActionRequest) -> Result<DriverReport, DriverFault> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(DriverFault::Faulted("dispatch rejected".into()))
    }
}

struct EchoLauncher;

impl ProcessLauncher for EchoLauncher {
    fn name(&self) -> &str {
        "echo-stub"
    }

    fn spawn(&self, _request: &ActionRequest) -> io::Result<Child> {
        Command::new("sh")
            .arg("-c")
            .arg(r#"echo '{"ok":true,"state":{"clicked":true}}'"#)
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
    }
}

struct TrueStructural;

#[async_trait]
impl StructuralPort for TrueStructural {
    async fn probe(
        &self,
        _request: &ActionRequest,
        _hint: &str,
        state: &DriverState,
    ) -> Result<TierReading, VerifyError> {
        let clicked = state["clicked"].as_bool().unwrap_or(false);
        Ok(TierReading::definitive(clicked, 0.92))
    }
}

fn build_executor(
    driver: Arc<dyn BlockingDriver>,
    store: Arc<PatternStore>,
    leases: Arc<LeaseRegistry>,
    cfg: ExecutorCfg,
) -> ActionExecutor {
    let strategies = Arc::new(StrategySet::new(
        driver,
        Arc::new(EchoLauncher),
        StrategyCfg::default(),
    ));
    let chain = Arc::new(
        VerificationChain::new(ChainPolicy::default()).with_structural(Arc::new(TrueStructural)),
    );
    let tracker = Arc::new(ConfidenceTracker::new(Arc::clone(&store)));
    ActionExecutor::new(strategies, chain, tracker, store, leases, cfg)
}

fn click_request() -> ActionRequest {
    ActionRequest::click("submit button", "demo")
        .with_hint("#submit")
        .with_timeout(Duration::from_secs(5))
}

#[tokio::test]
async fn fast_click_succeeds_and_records_one_outcome() {
    let store = Arc::new(PatternStore::in_memory());
    let leases = Arc::new(LeaseRegistry::new(Duration::from_secs(300)));
    let executor = build_executor(
        Arc::new(OkDriver {
            delay: Duration::from_millis(200),
        }),
        Arc::clone(&store),
        leases,
        ExecutorCfg::pinned(ExecMode::InProc),
    );

    let result = executor.execute(click_request()).await;

    assert!(result.success);
    assert_eq!(result.method_used, Some(VerifyMethod::Structural));
    assert!(result.confidence >= 0.6);

    let key = PatternKey::new(ActionKind::Click, "demo", ExecMode::InProc);
    let record = store.snapshot(&key).expect("one pattern record");
    assert_eq!(record.attempts, 1);
    assert_eq!(record.successes, 1);
    assert_eq!(executor.metrics().snapshot().succeeded, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_requests_for_one_resource_exclude_each_other() {
    let store = Arc::new(PatternStore::in_memory());
    let leases = Arc::new(LeaseRegistry::new(Duration::from_secs(300)));
    let driver: Arc<dyn BlockingDriver> = Arc::new(OkDriver {
        delay: Duration::from_millis(400),
    });

    let first = Arc::new(build_executor(
        Arc::clone(&driver),
        Arc::clone(&store),
        Arc::clone(&leases),
        ExecutorCfg::pinned(ExecMode::Thread),
    ));
    let second = Arc::new(build_executor(
        driver,
        Arc::clone(&store),
        Arc::clone(&leases),
        ExecutorCfg::pinned(ExecMode::Thread),
    ));

    let a = tokio::spawn({
        let first = Arc::clone(&first);
        async move { first.execute(click_request()).await }
    });
    // give the first call a head start so the race is deterministic
    tokio::time::sleep(Duration::from_millis(100)).await;
    let b = tokio::spawn({
        let second = Arc::clone(&second);
        async move { second.execute(click_request()).await }
    });

    let result_a = a.await.expect("join a");
    let result_b = b.await.expect("join b");

    assert!(result_a.success);
    assert!(!result_b.success);
    assert_eq!(result_b.error_kind, Some(ErrorKind::ResourceUnavailable));
    // the loser never executed, so exactly one attempt was recorded
    let key = PatternKey::new(ActionKind::Click, "demo", ExecMode::Thread);
    assert_eq!(store.snapshot(&key).expect("record").attempts, 1);
}

#[tokio::test]
async fn unreliable_pattern_escalates_to_subprocess() {
    let store = Arc::new(PatternStore::in_memory());
    // prime history so the thread driver looks unreliable
    let thread_key = PatternKey::new(ActionKind::Click, "demo", ExecMode::Thread);
    for _ in 0..9 {
        store.record(&thread_key, Outcome::failure(Duration::from_millis(40)));
    }
    store.record(&thread_key, Outcome::success(Duration::from_millis(40)));

    let calls = Arc::new(AtomicU64::new(0));
    let leases = Arc::new(LeaseRegistry::new(Duration::from_secs(300)));
    let executor = build_executor(
        Arc::new(FailingDriver {
            calls: Arc::clone(&calls),
        }),
        Arc::clone(&store),
        leases,
        ExecutorCfg::pinned(ExecMode::Thread),
    );

    let result = executor.execute(click_request()).await;

    // the escalated subprocess attempt succeeds via the echo launcher
    assert!(result.success, "raw_detail: {}", result.raw_detail);
    assert_eq!(result.method_used, Some(VerifyMethod::Structural));

    let subprocess_key = PatternKey::new(ActionKind::Click, "demo", ExecMode::Subprocess);
    let record = store.snapshot(&subprocess_key).expect("subprocess record");
    assert_eq!(record.successes, 1);
    // the thread driver was tried before escalation kicked in
    assert!(calls.load(Ordering::SeqCst) >= 1);
    assert!(executor.metrics().snapshot().escalations >= 1);
}

#[tokio::test]
async fn invalid_request_fails_fast_without_recording() {
    let store = Arc::new(PatternStore::in_memory());
    let leases = Arc::new(LeaseRegistry::new(Duration::from_secs(300)));
    let executor = build_executor(
        Arc::new(OkDriver {
            delay: Duration::from_millis(5),
        }),
        Arc::clone(&store),
        leases,
        ExecutorCfg::pinned(ExecMode::InProc),
    );

    let request = ActionRequest::new(ActionKind::Type, "search box", "demo");
    let result = executor.execute(request).await;

    assert!(!result.success);
    assert_eq!(result.error_kind, Some(ErrorKind::ActionInvalid));
    assert!(store.is_empty());
}

#[tokio::test]
async fn cancellation_is_honored_between_retries() {
    let store = Arc::new(PatternStore::in_memory());
    let leases = Arc::new(LeaseRegistry::new(Duration::from_secs(300)));
    let executor = Arc::new(build_executor(
        Arc::new(FailingDriver {
            calls: Arc::new(AtomicU64::new(0)),
        }),
        Arc::clone(&store),
        leases,
        ExecutorCfg::pinned(ExecMode::InProc),
    ));

    let cancel = CancellationToken::new();
    let handle = tokio::spawn({
        let executor = Arc::clone(&executor);
        let cancel = cancel.clone();
        async move {
            executor
                .execute_with_cancel(click_request(), cancel)
                .await
        }
    });
    tokio::time::sleep(Duration::from_millis(100)).await;
    cancel.cancel();

    let result = handle.await.expect("join");
    assert!(!result.success);
    assert!(result.raw_detail.contains("cancelled"));
}

#[tokio::test]
async fn every_failed_attempt_is_recorded() {
    let store = Arc::new(PatternStore::in_memory());
    let leases = Arc::new(LeaseRegistry::new(Duration::from_secs(300)));
    let calls = Arc::new(AtomicU64::new(0));
    let executor = build_executor(
        Arc::new(FailingDriver {
            calls: Arc::clone(&calls),
        }),
        Arc::clone(&store),
        leases,
        ExecutorCfg::pinned(ExecMode::InProc),
    );

    let result = executor.execute(click_request()).await;

    assert!(!result.success);
    assert_eq!(result.error_kind, Some(ErrorKind::DriverUnavailable));
    let key = PatternKey::new(ActionKind::Click, "demo", ExecMode::InProc);
    let record = store.snapshot(&key).expect("record");
    assert_eq!(record.attempts, calls.load(Ordering::SeqCst));
    assert_eq!(record.failures, record.attempts);
}
