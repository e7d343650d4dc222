use std::sync::Arc;

use tracing::debug;
use uiact_core_types::{ActionRequest, VerifyMethod};

use crate::model::{ChainPolicy, ChainVerdict, DriverState, TierReading};
use crate::ports::{AuthorityPort, StructuralPort, VisionPort};

/// Ordered fallback of verification tiers.
///
/// Tier errors are treated as that tier being inconclusive; the chain
/// itself never fails. When a structural hint is present and the structural
/// probe returns a clear answer, that answer wins regardless of what the
/// vision tier reported.
pub struct VerificationChain {
    vision: Option<Arc<dyn VisionPort>>,
    structural: Option<Arc<dyn StructuralPort>>,
    authority: Option<Arc<dyn AuthorityPort>>,
    policy: ChainPolicy,
}

impl VerificationChain {
    pub fn new(policy: ChainPolicy) -> Self {
        Self {
            vision: None,
            structural: None,
            authority: None,
            policy,
        }
    }

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

    pub fn policy(&self) -> ChainPolicy {
        self.policy
    }

    pub async fn verify(&self, request: &ActionRequest, state: &DriverState) -> ChainVerdict {
        let mut best_confidence: f64 = 0.0;
        let mut notes: Vec<String> = Vec::new();

        let vision = match &self.vision {
            Some(port) => match port.assess(request, state).await {
                Ok(reading) => {
                    track(&mut best_confidence, &mut notes, "vision", &reading);
                    Some(reading)
                }
                Err(err) => {
                    debug!(?err, "vision tier unavailable");
                    notes.push(format!("vision: {err}"));
                    None
                }
            },
            None => None,
        };

        if let (Some(hint), Some(port)) = (&request.structural_hint, &self.structural) {
            match port.probe(request, hint, state).await {
                Ok(reading) => {
                    track(&mut best_confidence, &mut notes, "structural", &reading);
                    if let Some(passed) = reading.verdict {
                        // structural is authoritative whenever it can answer
                        return ChainVerdict::decided(
                            passed,
                            reading.confidence,
                            VerifyMethod::Structural,
                            notes.join("; "),
                        );
                    }
                }
                Err(err) => {
                    debug!(?err, "structural tier unavailable");
                    notes.push(format!("structural: {err}"));
                }
            }
        }

        if let Some(reading) = vision {
            if let Some(passed) = reading.verdict {
                if reading.confidence >= self.policy.min_confidence {
                    return ChainVerdict::decided(
                        passed,
                        reading.confidence,
                        VerifyMethod::Vision,
                        notes.join("; "),
                    );
                }
            }
        }

        if let Some(port) = &self.authority {
            match port.confirm(request).await {
                Ok(reading) => {
                    track(&mut best_confidence, &mut notes, "authority", &reading);
                    if let Some(passed) = reading.verdict {
                        if reading.confidence >= self.policy.min_confidence {
                            return ChainVerdict::decided(
                                passed,
                                reading.confidence,
                                VerifyMethod::Authority,
                                notes.join("; "),
                            );
                        }
                    }
                }
                Err(err) => {
                    debug!(?err, "authority tier unavailable");
                    notes.push(format!("authority: {err}"));
                }
            }
        }

        ChainVerdict::inconclusive(best_confidence, notes.join("; "))
    }
}

fn track(best: &mut f64, notes: &mut Vec<String>, tier: &str, reading: &TierReading) {
    if reading.confidence > *best {
        *best = reading.confidence;
    }
    match (&reading.verdict, &reading.note) {
        (verdict, Some(note)) => notes.push(format!(
            "{tier}: verdict={verdict:?} conf={:.2} ({note})",
            reading.confidence
        )),
        (verdict, None) => notes.push(format!(
            "{tier}: verdict={verdict:?} conf={:.2}",
            reading.confidence
        )),
    }
}
