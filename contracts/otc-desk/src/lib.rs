//! OTC Desk: an over-the-counter token settlement ledger. Consigned inventory,
//! quorum-approved offers, oracle-priced settlement, time-locked release.

use near_sdk::json_types::U128;
use near_sdk::store::{IterableMap, LookupMap};
use near_sdk::{
    env, ext_contract, near, AccountId, BorshStorageKey, Gas, NearToken, PanicOnDefault, Promise,
};
use primitive_types::U256;

// --- Modules ---

mod admin;
mod consignment;
pub mod constants;
mod errors;
mod events;
mod ft_receiver;
mod offer;
mod oracle;
mod registry;
pub mod types;
mod views;

pub use constants::*;
pub use errors::DeskError;
pub use types::*;


// --- External contracts ---

#[ext_contract(ext_ft)]
pub trait FungibleToken {
    fn ft_transfer(&mut self, receiver_id: AccountId, amount: U128, memo: Option<String>);
}

// --- Helpers ---

/// Block time in whole seconds; the ledger's time unit.
pub(crate) fn now_secs() -> u64 {
    env::block_timestamp() / 1_000_000_000
}

/// Proceeds-balance key: `"{account}:{currency_key}"`. ":" is not a valid
/// character in NEAR account IDs, preventing key collisions.
pub(crate) fn proceeds_key(account: &AccountId, currency: &SettlementCurrency) -> String {
    format!("{}:{}", account, currency.key())
}

/// Floor of `a * b / d` over U256; errors on a zero divisor or a result that
/// does not fit u128.
pub(crate) fn mul_div(a: u128, b: u128, d: u128) -> Result<u128, DeskError> {
    if d == 0 {
        return Err(DeskError::overflow());
    }
    let out = U256::from(a) * U256::from(b) / U256::from(d);
    u128::try_from(out).map_err(|_| DeskError::overflow())
}

/// Ceiling of `a * b / d`; payment conversions round up in the desk's favor.
pub(crate) fn mul_div_ceil(a: u128, b: u128, d: u128) -> Result<u128, DeskError> {
    if d == 0 {
        return Err(DeskError::overflow());
    }
    let prod = U256::from(a) * U256::from(b);
    let divisor = U256::from(d);
    let q = prod / divisor;
    let out = if prod % divisor == U256::zero() { q } else { q + 1 };
    u128::try_from(out).map_err(|_| DeskError::overflow())
}

pub(crate) fn pow10(exp: u32) -> u128 {
    10u128.pow(exp)
}

// --- Storage Keys ---

#[near]
#[derive(BorshStorageKey)]
pub enum StorageKey {
    Tokens,
    Consignments,
    Offers,
    Bonds,
    Proceeds,
}

// --- Contract State ---

#[near(contract_state)]
#[derive(PanicOnDefault)]
pub struct Contract {
    /// From Cargo.toml; updated on each migration.
    pub version: String,

    pub owner_id: AccountId,
    /// Privileged role earning commission on negotiated fulfillments.
    pub agent_id: AccountId,
    pub approvers: Vec<AccountId>,
    /// Quorum size Q (≥ 1) for negotiable-offer approval.
    pub required_approvals: u32,
    pub paused: bool,
    /// When set, only beneficiary/owner/agent/approvers may pay an offer.
    pub restrict_fulfill: bool,
    /// When set, only owner/agent/approvers may pay; third parties cannot
    /// even pay on the beneficiary's behalf.
    pub require_approver_to_fulfill: bool,

    /// Minimum discounted USD value of an offer (8 decimals).
    pub min_usd_order_e8: u128,
    /// An unpaid offer's quote is honored this long after creation.
    pub quote_expiry_secs: u64,
    /// Staleness window for the posted native/USD reference price.
    pub max_price_age_secs: u64,
    /// Refundable liveness deposit reserved per consignment (yoctoNEAR).
    pub consignment_bond: u128,

    pub min_commission_bps: u16,
    pub max_commission_bps: u16,

    /// Native/USD reference feed, keeper-posted (8 decimals).
    pub native_usd_price_e8: u128,
    pub native_price_updated_at_secs: u64,

    /// Registered assets by content-derived asset id.
    pub tokens: IterableMap<String, TokenEntry>,
    pub consignments: IterableMap<u64, Consignment>,
    pub offers: IterableMap<u64, Offer>,
    /// Refundable liveness-deposit balances.
    pub bonds: LookupMap<AccountId, u128>,
    /// Settlement proceeds by `"{account}:{currency_key}"`.
    pub proceeds: LookupMap<String, u128>,

    pub next_consignment_id: u64,
    pub next_offer_id: u64,
}

// --- Shared guards ---

impl Contract {
    pub(crate) fn check_owner(&self, caller: &AccountId) -> Result<(), DeskError> {
        if caller != &self.owner_id {
            return Err(DeskError::only_owner());
        }
        Ok(())
    }

    /// The desk agent counts as an approver.
    pub(crate) fn is_approver(&self, who: &AccountId) -> bool {
        who == &self.agent_id || self.approvers.contains(who)
    }

    pub(crate) fn check_approver(&self, caller: &AccountId) -> Result<(), DeskError> {
        if !self.is_approver(caller) {
            return Err(DeskError::not_approver());
        }
        Ok(())
    }

    pub(crate) fn check_not_paused(&self) -> Result<(), DeskError> {
        if self.paused {
            return Err(DeskError::paused());
        }
        Ok(())
    }

    pub(crate) fn credit_proceeds(&mut self, account: &AccountId, currency: &SettlementCurrency, amount: u128) {
        if amount == 0 {
            return;
        }
        let key = proceeds_key(account, currency);
        let balance = self.proceeds.get(&key).copied().unwrap_or(0);
        self.proceeds.insert(key, balance + amount);
    }

    /// Pays `amount` of `currency` out to `receiver`: native via transfer,
    /// NEP-141 via `ft_transfer` on the asset's token contract.
    pub(crate) fn transfer_out(&self, currency: &SettlementCurrency, receiver: &AccountId, amount: u128) {
        if amount == 0 {
            return;
        }
        match currency {
            SettlementCurrency::Native => {
                let _ = Promise::new(receiver.clone()).transfer(NearToken::from_yoctonear(amount));
            }
            SettlementCurrency::Token(asset_id) => {
                if let Some(entry) = self.tokens.get(asset_id) {
                    ext_ft::ext(entry.token_account.clone())
                        .with_attached_deposit(NearToken::from_yoctonear(1))
                        .with_static_gas(Gas::from_tgas(GAS_FT_TRANSFER_TGAS))
                        .ft_transfer(receiver.clone(), U128(amount), None);
                } else {
                    env::log_str(&format!(
                        "WARN: asset '{}' missing during payout of {}; funds remain in desk custody",
                        asset_id, amount
                    ));
                }
            }
        }
    }

    /// Asset payout to a receiver (claims, consignment withdrawals).
    pub(crate) fn transfer_asset_out(&self, entry: &TokenEntry, receiver: &AccountId, amount: u128) {
        if amount == 0 {
            return;
        }
        ext_ft::ext(entry.token_account.clone())
            .with_attached_deposit(NearToken::from_yoctonear(1))
            .with_static_gas(Gas::from_tgas(GAS_FT_TRANSFER_TGAS))
            .ft_transfer(receiver.clone(), U128(amount), None);
    }
}
