use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use uiact_core_types::{ActionRequest, VerifyMethod};
use verify_chain::{
    AuthorityPort, ChainPolicy, DriverState, StructuralPort, TierReading, VerificationChain,
    VerifyError, VisionPort,
};

struct FixedVision {
    reading: TierReading,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl VisionPort for FixedVision {
    async fn assess(
        &self,
        _request: &ActionRequest,
        _state: &DriverState,
    ) -> Result<TierReading, VerifyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.reading.clone())
    }
}

struct FixedStructural {
    reading: TierReading,
}

#[async_trait]
impl StructuralPort for FixedStructural {
    async fn probe(
        &self,
        _request: &ActionRequest,
        _hint: &str,
        _state: &DriverState,
    ) -> Result<TierReading, VerifyError> {
        Ok(self.reading.clone())
    }
}

struct FixedAuthority {
    reading: TierReading,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl AuthorityPort for FixedAuthority {
    async fn confirm(&self, _request: &ActionRequest) -> Result<TierReading, VerifyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.reading.clone())
    }
}

fn state() -> DriverState {
    json!({"page": "demo"})
}

#[tokio::test]
async fn structural_overrides_a_confident_vision_answer() {
    let vision_calls = Arc::new(AtomicUsize::new(0));
    let chain = VerificationChain::new(ChainPolicy::default())
        .with_vision(Arc::new(FixedVision {
            reading: TierReading::definitive(true, 0.9),
            calls: Arc::clone(&vision_calls),
        }))
        .with_structural(Arc::new(FixedStructural {
            reading: TierReading::definitive(false, 0.95),
        }));

    let request = ActionRequest::click("submit button", "demo").with_hint("#submit");
    let verdict = chain.verify(&request, &state()).await;

    assert_eq!(verdict.passed, Some(false));
    assert_eq!(verdict.method, Some(VerifyMethod::Structural));
    assert_eq!(vision_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn vision_decides_without_a_structural_hint() {
    let chain = VerificationChain::new(ChainPolicy::default())
        .with_vision(Arc::new(FixedVision {
            reading: TierReading::definitive(true, 0.8),
            calls: Arc::new(AtomicUsize::new(0)),
        }))
        .with_structural(Arc::new(FixedStructural {
            reading: TierReading::definitive(false, 0.95),
        }));

    // no hint supplied, so the structural tier is never consulted
    let request = ActionRequest::click("submit button", "demo");
    let verdict = chain.verify(&request, &state()).await;

    assert_eq!(verdict.passed, Some(true));
    assert_eq!(verdict.method, Some(VerifyMethod::Vision));
}

#[tokio::test]
async fn authority_is_only_consulted_when_cheaper_tiers_are_inconclusive() {
    let authority_calls = Arc::new(AtomicUsize::new(0));
    let chain = VerificationChain::new(ChainPolicy::default())
        .with_vision(Arc::new(FixedVision {
            reading: TierReading::definitive(true, 0.3),
            calls: Arc::new(AtomicUsize::new(0)),
        }))
        .with_structural(Arc::new(FixedStructural {
            reading: TierReading::inconclusive(0.2),
        }))
        .with_authority(Arc::new(FixedAuthority {
            reading: TierReading::definitive(true, 0.9),
            calls: Arc::clone(&authority_calls),
        }));

    let request = ActionRequest::click("submit button", "demo").with_hint("#submit");
    let verdict = chain.verify(&request, &state()).await;

    assert_eq!(verdict.passed, Some(true));
    assert_eq!(verdict.method, Some(VerifyMethod::Authority));
    assert_eq!(authority_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn authority_is_skipped_when_vision_is_confident() {
    let authority_calls = Arc::new(AtomicUsize::new(0));
    let chain = VerificationChain::new(ChainPolicy::default())
        .with_vision(Arc::new(FixedVision {
            reading: TierReading::definitive(true, 0.85),
            calls: Arc::new(AtomicUsize::new(0)),
        }))
        .with_authority(Arc::new(FixedAuthority {
            reading: TierReading::definitive(false, 0.9),
            calls: Arc::clone(&authority_calls),
        }));

    let request = ActionRequest::click("submit button", "demo");
    let verdict = chain.verify(&request, &state()).await;

    assert_eq!(verdict.passed, Some(true));
    assert_eq!(authority_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn all_inconclusive_reports_the_best_confidence() {
    let chain = VerificationChain::new(ChainPolicy::default())
        .with_vision(Arc::new(FixedVision {
            reading: TierReading::inconclusive(0.4),
            calls: Arc::new(AtomicUsize::new(0)),
        }))
        .with_structural(Arc::new(FixedStructural {
            reading: TierReading::inconclusive(0.1),
        }))
        .with_authority(Arc::new(FixedAuthority {
            reading: TierReading::inconclusive(0.2),
            calls: Arc::new(AtomicUsize::new(0)),
        }));

    let request = ActionRequest::click("submit button", "demo").with_hint("#submit");
    let verdict = chain.verify(&request, &state()).await;

    assert_eq!(verdict.passed, None);
    assert!((verdict.confidence - 0.4).abs() < f64::EPSILON);
    assert!(verdict.method.is_none());
}

#[tokio::test]
async fn failing_tiers_degrade_to_inconclusive() {
    struct BrokenVision;

    #[async_trait]
    impl VisionPort for BrokenVision {
        async fn assess(
            &self,
            _request: &ActionRequest,
            _state: &DriverState,
        ) -> Result<TierReading, VerifyError> {
            Err(VerifyError::Unavailable("no snapshot backend".into()))
        }
    }

    let chain = VerificationChain::new(ChainPolicy::default()).with_vision(Arc::new(BrokenVision));
    let request = ActionRequest::click("submit button", "demo");
    let verdict = chain.verify(&request, &state()).await;

    assert_eq!(verdict.passed, None);
    assert!(verdict.detail.contains("vision"));
}
