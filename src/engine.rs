use std::sync::Arc;

use action_executor::{ActionExecutor, EventsPort, ExecMetrics, ExecutorCfg};
use confidence_tracker::{ConfidenceTracker, TrackerCfg};
use exec_strategy::{BlockingDriver, ProcessLauncher, StrategyCfg, StrategySet};
use pattern_store::{PatternRecord, PatternStore, StoreCfg, StoreError};
use resource_lease::LeaseRegistry;
use tokio_util::sync::CancellationToken;
use uiact_core_types::{ActionRequest, ActionResult, PatternKey};
use verify_chain::{AuthorityPort, ChainPolicy, StructuralPort, VerificationChain, VisionPort};

use crate::config::EngineConfig;

/// Assembled engine: one front door over explicitly injected collaborators.
pub struct Engine {
    executor: ActionExecutor,
    store: Arc<PatternStore>,
}

impl Engine {
    pub fn builder(
        config: EngineConfig,
        driver: Arc<dyn BlockingDriver>,
        launcher: Arc<dyn ProcessLauncher>,
    ) -> EngineBuilder {
        EngineBuilder {
            config,
            driver,
            launcher,
            vision: None,
            structural: None,
            authority: None,
            events: None,
        }
    }

    /// Single entry point for upstream workflows: always returns one result
    /// per logical request, within the request timeout plus the grace
    /// period, no matter what the driver does.
    pub async fn execute_action(&self, request: ActionRequest) -> ActionResult {
        self.executor.execute(request).await
    }

    pub async fn execute_action_with_cancel(
        &self,
        request: ActionRequest,
        cancel: CancellationToken,
    ) -> ActionResult {
        self.executor.execute_with_cancel(request, cancel).await
    }

    pub fn pattern_snapshot(&self, key: &PatternKey) -> Option<PatternRecord> {
        self.store.snapshot(key)
    }

    pub fn metrics(&self) -> &ExecMetrics {
        self.executor.metrics()
    }

    /// Force learned outcomes to disk.
    pub fn flush(&self) -> Result<(), StoreError> {
        self.store.flush()
    }
}

/// Wires the verification tiers and stores into an executor.
pub struct EngineBuilder {
    config: EngineConfig,
    driver: Arc<dyn BlockingDriver>,
    launcher: Arc<dyn ProcessLauncher>,
    vision: Option<Arc<dyn VisionPort>>,
    structural: Option<Arc<dyn StructuralPort>>,
    authority: Option<Arc<dyn AuthorityPort>>,
    events: Option<Arc<dyn EventsPort>>,
}

impl EngineBuilder {
    pub fn with_vision(mut self, port: Arc<dyn VisionPort>) -> Self {
        self.vision = Some(port);
        self
    }

    pub fn with_structural(mut self, port: Arc<dyn StructuralPort>) -> Self {
        self.structural = Some(port);
        self
    }

    pub fn with_authority(mut self, port: Arc<dyn AuthorityPort>) -> Self {
        self.authority = Some(port);
        self
    }

    pub fn with_events(mut self, events: Arc<dyn EventsPort>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn build(self) -> Result<Engine, StoreError> {
        let store = Arc::new(PatternStore::open(StoreCfg {
            path: self.config.pattern_store_path.clone(),
        })?);
        let tracker = Arc::new(ConfidenceTracker::with_cfg(
            Arc::clone(&store),
            TrackerCfg {
                max_retries_cap: self.config.max_retries_hard_cap,
                ..TrackerCfg::default()
            },
        ));

        let mut chain = VerificationChain::new(ChainPolicy {
            min_confidence: self.config.verification_min_confidence,
        });
        if let Some(port) = self.vision {
            chain = chain.with_vision(port);
        }
        if let Some(port) = self.structural {
            chain = chain.with_structural(port);
        }
        if let Some(port) = self.authority {
            chain = chain.with_authority(port);
        }

        let strategies = Arc::new(StrategySet::new(
            self.driver,
            self.launcher,
            StrategyCfg::default(),
        ));
        let leases = Arc::new(LeaseRegistry::new(self.config.lease_ttl));

        let mut executor = ActionExecutor::new(
            strategies,
            Arc::new(chain),
            tracker,
            Arc::clone(&store),
            leases,
            ExecutorCfg {
                requested_mode: self.config.execution_mode,
            },
        );
        if let Some(events) = self.events {
            executor = executor.with_events(events);
        }

        Ok(Engine { executor, store })
    }
}
