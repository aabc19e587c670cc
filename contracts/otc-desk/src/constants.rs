//! Desk-wide constants.

/// Basis points denominator (10,000 = 100%).
pub const BASIS_POINTS: u16 = 10_000;

/// One USD in the desk's 8-decimal fixed-point price format.
pub const PRICE_ONE_USD_E8: u128 = 100_000_000;

/// yoctoNEAR per NEAR; the native settlement unit.
pub const YOCTO_PER_NEAR: u128 = 1_000_000_000_000_000_000_000_000;

pub const SECONDS_PER_DAY: u64 = 86_400;

/// TWAP averaging windows, tried in order; first window with enough pool
/// history wins.
pub const TWAP_WINDOWS_SECS: [u64; 4] = [300, 120, 60, 30];

/// A window needs at least this many observations to produce a price.
pub const MIN_OBSERVATIONS_PER_WINDOW: usize = 2;

/// Per-asset observation ring capacity; oldest entries are evicted.
pub const MAX_OBSERVATIONS: usize = 64;

/// Ticks are log base 1.0001 of the pool price. ±200,000 covers the full
/// sane price range ([$0.000001, $10,000] is ~±92,000 ticks around $1) with
/// headroom, and keeps the fixed-point exponentiation inside U256.
pub const MAX_TICK_ABS: i32 = 200_000;

/// Absolute sanity bounds on a derived token/USD price: $0.000001 .. $10,000
/// per whole token. Guards against a zeroed or corrupted feed independent of
/// the per-offer deviation check.
pub const MIN_TOKEN_USD_PRICE_E8: u128 = 100;
pub const MAX_TOKEN_USD_PRICE_E8: u128 = 10_000 * PRICE_ONE_USD_E8;

/// Sanity bounds on the posted native/USD reference price: $0.01 .. $100,000.
pub const MIN_NATIVE_USD_PRICE_E8: u128 = 1_000_000;
pub const MAX_NATIVE_USD_PRICE_E8: u128 = 100_000 * PRICE_ONE_USD_E8;

/// Fixed liveness guarantee: a paid-but-unclaimed offer becomes refundable
/// to the payer this long after creation.
pub const EMERGENCY_REFUND_DELAY_SECS: u64 = 90 * SECONDS_PER_DAY;

/// Hard ceiling on a requested lockup (100 years); keeps unlock-time
/// arithmetic and day conversion inside their integer types.
pub const MAX_LOCKUP_SECS: u64 = 36_500 * SECONDS_PER_DAY;

pub const MAX_APPROVERS: usize = 32;

/// Batch cap for `auto_claim`; keeps gas bounded.
pub const MAX_AUTO_CLAIM: usize = 10;

/// Default agent-commission band for negotiated offers (25 to 150 bps).
pub const DEFAULT_MIN_COMMISSION_BPS: u16 = 25;
pub const DEFAULT_MAX_COMMISSION_BPS: u16 = 150;

/// Default staleness window for the posted native/USD reference price.
pub const DEFAULT_MAX_PRICE_AGE_SECS: u64 = 3_600;

// Gas constants (TGas)
pub const GAS_FT_TRANSFER_TGAS: u64 = 10;

// View pagination
pub const DEFAULT_VIEW_LIMIT: u64 = 50;
pub const MAX_VIEW_LIMIT: u64 = 100;
