//! Typed error handling for the desk contract.
//!
//! Uses `#[derive(near_sdk::FunctionError)]` from the NEAR SDK to enable
//! `#[handle_result]` on public methods. When a method returns
//! `Err(DeskError::Xxx)`, the SDK calls `env::panic_str()` with the Display
//! message, giving the same on-wire behaviour as raw panics with structured,
//! testable code.

use near_sdk_macros::NearSchema;

#[derive(NearSchema, near_sdk::FunctionError)]
#[abi(borsh, json)]
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub enum DeskError {
    /// Caller lacks permission (wrong owner, not an approver, etc.)
    Unauthorized(String),
    /// Invalid parameters, amounts, or ranges from the caller.
    InvalidInput(String),
    /// Requested entity does not exist.
    NotFound(String),
    /// Operation not allowed given current ledger state.
    InvalidState(String),
    /// The price oracle could not produce a usable price. Never substituted
    /// with a default; the calling operation fails outright.
    Oracle(String),
    /// Live price drifted too far from the price locked at offer creation.
    /// Fatal to the call, retryable once the price re-stabilizes.
    PriceDeviation(String),
    /// Internal invariant violation (should never happen).
    InternalError(String),
}

impl std::fmt::Display for DeskError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            Self::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            Self::NotFound(msg) => write!(f, "Not found: {}", msg),
            Self::InvalidState(msg) => write!(f, "Invalid state: {}", msg),
            Self::Oracle(msg) => write!(f, "Oracle: {}", msg),
            Self::PriceDeviation(msg) => write!(f, "Price deviation: {}", msg),
            Self::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

// --- Factory helpers for common errors ---

impl DeskError {
    pub fn only_owner() -> Self {
        Self::Unauthorized("Only the desk owner can perform this action".into())
    }
    pub fn not_approver() -> Self {
        Self::Unauthorized("Caller is not a registered approver".into())
    }
    pub fn already_approved() -> Self {
        Self::InvalidState("already approved by you".into())
    }
    pub fn paused() -> Self {
        Self::InvalidState("Desk is paused".into())
    }
    pub fn consignment_not_found(id: u64) -> Self {
        Self::NotFound(format!("Consignment {} not found", id))
    }
    pub fn offer_not_found(id: u64) -> Self {
        Self::NotFound(format!("Offer {} not found", id))
    }
    pub fn token_not_found(asset_id: &str) -> Self {
        Self::NotFound(format!("Asset {} not registered", asset_id))
    }
    pub fn overflow() -> Self {
        Self::InternalError("Arithmetic overflow".into())
    }
}
