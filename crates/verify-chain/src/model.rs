use uiact_core_types::VerifyMethod;

/// Opaque snapshot of driver-side state captured after an attempt, handed
/// to the tiers for inspection.
pub type DriverState = serde_json::Value;

/// Answer from a single tier. `verdict == None` means the tier could not
/// decide (unavailable, ambiguous, or below its own floor).
#[derive(Clone, Debug)]
pub struct TierReading {
    pub verdict: Option<bool>,
    pub confidence: f64,
    pub note: Option<String>,
}

impl TierReading {
    pub fn definitive(passed: bool, confidence: f64) -> Self {
        Self {
            verdict: Some(passed),
            confidence,
            note: None,
        }
    }

    pub fn inconclusive(confidence: f64) -> Self {
        Self {
            verdict: None,
            confidence,
            note: None,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Final answer of the chain. `passed == None` means every tier stayed
/// below the confidence floor; the best tier's confidence is reported.
#[derive(Clone, Debug)]
pub struct ChainVerdict {
    pub passed: Option<bool>,
    pub confidence: f64,
    pub method: Option<VerifyMethod>,
    pub detail: String,
}

impl ChainVerdict {
    pub fn decided(passed: bool, confidence: f64, method: VerifyMethod, detail: String) -> Self {
        Self {
            passed: Some(passed),
            confidence,
            method: Some(method),
            detail,
        }
    }

    pub fn inconclusive(best_confidence: f64, detail: String) -> Self {
        Self {
            passed: None,
            confidence: best_confidence,
            method: None,
            detail,
        }
    }
}

/// Confidence thresholds for accepting tier answers.
#[derive(Clone, Copy, Debug)]
pub struct ChainPolicy {
    /// A tier's answer is definitive only at or above this confidence.
    pub min_confidence: f64,
}

impl Default for ChainPolicy {
    fn default() -> Self {
        Self {
            min_confidence: 0.6,
        }
    }
}
