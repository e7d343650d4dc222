use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use thiserror::Error;
use uuid::Uuid;

/// Identifier for one logical action request.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct ActionId(pub String);

impl ActionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for ActionId {
    fn default() -> Self {
        Self::new()
    }
}

/// Identifier for a lease owner (one executor instance or caller).
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct OwnerId(pub String);

impl OwnerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for OwnerId {
    fn default() -> Self {
        Self::new()
    }
}

/// Identity of one underlying automated resource (e.g. a browser endpoint).
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct ResourceId(pub String);

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Kind of UI action being requested.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-full", serde(rename_all = "snake_case"))]
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ActionKind {
    Click,
    Type,
    Verify,
    Scroll,
    Composite,
}

impl ActionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::Click => "click",
            ActionKind::Type => "type",
            ActionKind::Verify => "verify",
            ActionKind::Scroll => "scroll",
            ActionKind::Composite => "composite",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Isolation level used to run one blocking driver call.
///
/// String parsing exists only for the configuration boundary; everything
/// internal dispatches over this closed enum.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-full", serde(rename_all = "snake_case"))]
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ExecMode {
    InProc,
    Thread,
    Subprocess,
}

impl ExecMode {
    pub const ALL: [ExecMode; 3] = [ExecMode::InProc, ExecMode::Thread, ExecMode::Subprocess];

    pub fn as_str(self) -> &'static str {
        match self {
            ExecMode::InProc => "inproc",
            ExecMode::Thread => "thread",
            ExecMode::Subprocess => "subprocess",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "inproc" => Some(ExecMode::InProc),
            "thread" => Some(ExecMode::Thread),
            "subprocess" => Some(ExecMode::Subprocess),
            _ => None,
        }
    }

    /// Only the subprocess mode can always reclaim a hung driver call.
    pub fn hard_recovery(self) -> bool {
        matches!(self, ExecMode::Subprocess)
    }
}

impl Default for ExecMode {
    fn default() -> Self {
        ExecMode::Subprocess
    }
}

impl fmt::Display for ExecMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verification tier that produced the final answer.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-full", serde(rename_all = "snake_case"))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum VerifyMethod {
    Vision,
    Structural,
    Authority,
}

impl VerifyMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            VerifyMethod::Vision => "vision",
            VerifyMethod::Structural => "structural",
            VerifyMethod::Authority => "authority",
        }
    }
}

impl fmt::Display for VerifyMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure taxonomy shared across the engine.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-full", serde(rename_all = "snake_case"))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    Timeout,
    VerificationInconclusive,
    ResourceUnavailable,
    DriverUnavailable,
    ActionInvalid,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Timeout => "timeout",
            ErrorKind::VerificationInconclusive => "verification_inconclusive",
            ErrorKind::ResourceUnavailable => "resource_unavailable",
            ErrorKind::DriverUnavailable => "driver_unavailable",
            ErrorKind::ActionInvalid => "action_invalid",
        }
    }

    /// Whether the executor may absorb this failure and retry.
    pub fn retryable(self) -> bool {
        matches!(
            self,
            ErrorKind::Timeout | ErrorKind::VerificationInconclusive | ErrorKind::DriverUnavailable
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shared error type crossing crate boundaries inside the engine.
#[derive(Debug, Error, Clone)]
#[error("{kind}: {detail}")]
pub struct EngineError {
    pub kind: ErrorKind,
    pub detail: String,
}

impl EngineError {
    pub fn new(kind: ErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }

    pub fn invalid(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::ActionInvalid, detail)
    }

    pub fn timeout(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout, detail)
    }
}

/// Context key carrying the resource identity when the caller names one.
pub const CONTEXT_RESOURCE_KEY: &str = "resource";

/// Immutable description of one intended UI action.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug)]
pub struct ActionRequest {
    pub action_kind: ActionKind,
    pub target_description: String,
    pub structural_hint: Option<String>,
    pub input_text: Option<String>,
    pub platform: String,
    pub timeout: Duration,
    pub context: HashMap<String, String>,
}

impl ActionRequest {
    pub fn new(
        action_kind: ActionKind,
        target_description: impl Into<String>,
        platform: impl Into<String>,
    ) -> Self {
        Self {
            action_kind,
            target_description: target_description.into(),
            structural_hint: None,
            input_text: None,
            platform: platform.into(),
            timeout: Duration::from_secs(10),
            context: HashMap::new(),
        }
    }

    pub fn click(target: impl Into<String>, platform: impl Into<String>) -> Self {
        Self::new(ActionKind::Click, target, platform)
    }

    pub fn type_text(
        target: impl Into<String>,
        platform: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        let mut request = Self::new(ActionKind::Type, target, platform);
        request.input_text = Some(text.into());
        request
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.structural_hint = Some(hint.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Resource the request executes against; falls back to the platform tag
    /// when the caller did not name an endpoint.
    pub fn resource_id(&self) -> ResourceId {
        match self.context.get(CONTEXT_RESOURCE_KEY) {
            Some(resource) => ResourceId(resource.clone()),
            None => ResourceId(self.platform.clone()),
        }
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.target_description.trim().is_empty() {
            return Err(EngineError::invalid("target_description is empty"));
        }
        if self.platform.trim().is_empty() {
            return Err(EngineError::invalid("platform tag is empty"));
        }
        if self.action_kind == ActionKind::Type && self.input_text.is_none() {
            return Err(EngineError::invalid("type action requires input_text"));
        }
        if self.timeout.is_zero() {
            return Err(EngineError::invalid("timeout must be positive"));
        }
        Ok(())
    }
}

/// Outcome of one logical action request.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug)]
pub struct ActionResult {
    pub success: bool,
    pub confidence: f64,
    pub method_used: Option<VerifyMethod>,
    pub duration: Duration,
    pub error_kind: Option<ErrorKind>,
    pub raw_detail: String,
}

impl ActionResult {
    pub fn succeeded(
        confidence: f64,
        method: VerifyMethod,
        duration: Duration,
        raw_detail: impl Into<String>,
    ) -> Self {
        Self {
            success: true,
            confidence,
            method_used: Some(method),
            duration,
            error_kind: None,
            raw_detail: raw_detail.into(),
        }
    }

    pub fn failed(
        kind: ErrorKind,
        confidence: f64,
        duration: Duration,
        raw_detail: impl Into<String>,
    ) -> Self {
        Self {
            success: false,
            confidence,
            method_used: None,
            duration,
            error_kind: Some(kind),
            raw_detail: raw_detail.into(),
        }
    }
}

/// The unit of reliability learning: same key, comparable behavior.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct PatternKey {
    pub action_kind: ActionKind,
    pub platform: String,
    pub driver: ExecMode,
}

impl PatternKey {
    pub fn new(action_kind: ActionKind, platform: impl Into<String>, driver: ExecMode) -> Self {
        Self {
            action_kind,
            platform: platform.into(),
            driver,
        }
    }

    pub fn for_request(request: &ActionRequest, driver: ExecMode) -> Self {
        Self::new(request.action_kind, request.platform.clone(), driver)
    }
}

impl fmt::Display for PatternKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.action_kind, self.platform, self.driver)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_without_text_is_invalid() {
        let request = ActionRequest::new(ActionKind::Type, "search box", "demo");
        let err = request.validate().unwrap_err();
        assert_eq!(err.kind, ErrorKind::ActionInvalid);
    }

    #[test]
    fn click_with_defaults_is_valid() {
        let request = ActionRequest::click("submit button", "demo");
        assert!(request.validate().is_ok());
        assert_eq!(request.resource_id(), ResourceId("demo".into()));
    }

    #[test]
    fn context_resource_overrides_platform() {
        let request = ActionRequest::click("submit", "demo").with_context("resource", "browser-1");
        assert_eq!(request.resource_id(), ResourceId("browser-1".into()));
    }

    #[test]
    fn retryable_taxonomy() {
        assert!(ErrorKind::Timeout.retryable());
        assert!(ErrorKind::VerificationInconclusive.retryable());
        assert!(ErrorKind::DriverUnavailable.retryable());
        assert!(!ErrorKind::ResourceUnavailable.retryable());
        assert!(!ErrorKind::ActionInvalid.retryable());
    }

    #[test]
    fn exec_mode_round_trips_config_names() {
        for mode in ExecMode::ALL {
            assert_eq!(ExecMode::parse(mode.as_str()), Some(mode));
        }
        assert_eq!(ExecMode::parse("bogus"), None);
    }
}
