//! Ledger records and settlement-currency types.

use near_sdk::json_types::U128;
use near_sdk::{near, AccountId};

use crate::constants::*;

// --- Enums ---

/// What a deal is paid in. A closed variant (not an open address) so the
/// settlement calculator can branch exhaustively.
#[near(serializers = [borsh, json])]
#[derive(Clone, Debug, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum SettlementCurrency {
    /// The chain's native coin (yoctoNEAR amounts).
    Native,
    /// A registered NEP-141 asset, by content-derived asset id.
    Token(String),
}

impl SettlementCurrency {
    /// Stable key used for proceeds bookkeeping (`"{account}:{key}"`).
    pub fn key(&self) -> String {
        match self {
            Self::Native => "native".to_string(),
            Self::Token(asset_id) => asset_id.clone(),
        }
    }
}

/// The quote side of the asset's trading pool. Determines how a pool-relative
/// TWAP becomes a USD price.
#[near(serializers = [borsh, json])]
#[derive(Clone, Debug, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum QuoteAsset {
    /// USD-pegged stable quote: pool price is already USD.
    UsdStable,
    /// Native-coin quote: converted through the native/USD reference feed.
    Native,
}

/// Derived offer lifecycle state; exactly one holds at any time.
#[near(serializers = [json])]
#[derive(Clone, Debug, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum OfferStatus {
    Created,
    Approved,
    Paid,
    Fulfilled,
    Cancelled,
}

// --- Structs ---

#[near(serializers = [borsh, json])]
#[derive(Clone, Debug)]
pub struct OracleConfig {
    /// The trading pool the TWAP observations come from.
    pub pool: AccountId,
    pub quote: QuoteAsset,
}

/// One keeper-posted pool observation: the log-price (tick, base 1.0001) of
/// one whole token in quote units at `timestamp_secs`.
#[near(serializers = [borsh, json])]
#[derive(Clone, Copy, Debug)]
pub struct PoolObservation {
    pub timestamp_secs: u64,
    pub tick: i32,
}

/// A registered asset. Immutable once referenced by a live consignment,
/// except for the active flag.
#[near(serializers = [borsh, json])]
#[derive(Clone, Debug)]
pub struct TokenEntry {
    /// Content-derived id: hex(sha256(token account id)).
    pub asset_id: String,
    pub token_account: AccountId,
    pub decimals: u8,
    pub is_active: bool,
    /// USD-pegged settlement asset; priced at exactly $1.
    pub is_usd_stable: bool,
    pub oracle: OracleConfig,
    /// Bounded ring of pool observations, newest last.
    pub observations: Vec<PoolObservation>,
}

/// Caller-supplied consignment terms. Fixed consignments carry exactly one
/// discount/lockup pair; negotiable ones carry ranges only, enforced at
/// validation, impossible states rejected.
#[near(serializers = [borsh, json])]
#[derive(Clone, Debug)]
pub struct ConsignmentTerms {
    pub is_negotiable: bool,
    pub fixed_discount_bps: Option<u16>,
    pub fixed_lockup_days: Option<u32>,
    pub min_discount_bps: Option<u16>,
    pub max_discount_bps: Option<u16>,
    pub min_lockup_days: Option<u32>,
    pub max_lockup_days: Option<u32>,
    pub min_deal_amount: U128,
    pub max_deal_amount: U128,
    pub max_price_volatility_bps: u16,
}

#[near(serializers = [borsh, json])]
#[derive(Clone, Debug)]
pub struct Consignment {
    pub id: u64,
    pub asset_id: String,
    pub consigner: AccountId,
    pub total_amount: u128,
    /// Invariant: `total_amount` minus the token amounts of all
    /// non-cancelled offers drawn from this consignment.
    pub remaining_amount: u128,
    pub is_negotiable: bool,
    pub fixed_discount_bps: u16,
    pub fixed_lockup_days: u32,
    pub min_discount_bps: u16,
    pub max_discount_bps: u16,
    pub min_lockup_days: u32,
    pub max_lockup_days: u32,
    pub min_deal_amount: u128,
    pub max_deal_amount: u128,
    pub max_price_volatility_bps: u16,
    /// Refundable liveness deposit reserved at creation (yoctoNEAR).
    pub bond: u128,
    /// Cleared only by consigner withdrawal; zero remaining just blocks
    /// further offers.
    pub is_active: bool,
    pub created_at_secs: u64,
}

#[near(serializers = [borsh, json])]
#[derive(Clone, Debug)]
pub struct Offer {
    pub id: u64,
    pub consignment_id: u64,
    pub asset_id: String,
    pub beneficiary: AccountId,
    pub token_amount: u128,
    pub discount_bps: u16,
    pub lockup_days: u32,
    pub created_at_secs: u64,
    pub unlock_time_secs: u64,
    /// Asset USD price locked at creation (8 decimals).
    pub price_usd_per_token_e8: u128,
    /// Settlement-currency USD price at creation (8 decimals); display only.
    /// fulfillment re-reads the live currency price.
    pub currency_usd_price_e8: u128,
    pub max_price_deviation_bps: u16,
    pub currency: SettlementCurrency,
    pub agent_commission_bps: u16,
    /// Distinct approvers so far; `approved` flips when this reaches the
    /// desk's required count.
    pub approvals: Vec<AccountId>,
    pub approved: bool,
    pub paid: bool,
    pub fulfilled: bool,
    pub cancelled: bool,
    pub payer: Option<AccountId>,
    /// Amount paid, in settlement-currency units.
    pub amount_paid: u128,
}

impl Offer {
    pub fn status(&self) -> OfferStatus {
        if self.cancelled {
            OfferStatus::Cancelled
        } else if self.fulfilled {
            OfferStatus::Fulfilled
        } else if self.paid {
            OfferStatus::Paid
        } else if self.approved {
            OfferStatus::Approved
        } else {
            OfferStatus::Created
        }
    }

    /// Open = still holds inventory: neither terminally marked nor claimed.
    pub fn is_open(&self) -> bool {
        !self.cancelled && !self.fulfilled
    }
}

/// `ft_transfer_call` message accepted by `ft_on_transfer`.
#[near(serializers = [json])]
#[derive(Clone, Debug)]
#[serde(rename_all = "snake_case")]
pub enum FtMessage {
    CreateConsignment { terms: ConsignmentTerms },
    TopUpConsignment { consignment_id: u64 },
    FulfillOffer { offer_id: u64 },
}

/// Per-day lockup expressed by callers in seconds; whole days only.
pub fn lockup_days_from_secs(lockup_secs: u64) -> u32 {
    (lockup_secs / SECONDS_PER_DAY) as u32
}
