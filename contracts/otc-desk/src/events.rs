use near_sdk::json_types::U128;
use near_sdk::{near, AccountId};

use crate::types::SettlementCurrency;

#[near(event_json(standard = "nep297"))]
pub enum DeskEvent {
    #[event_version("1.0.0")]
    DeskInitialized { owner: AccountId, agent: AccountId },
    #[event_version("1.0.0")]
    ApproverUpdated { approver: AccountId, allowed: bool },
    #[event_version("1.0.0")]
    RequiredApprovalsUpdated { required: u32 },
    #[event_version("1.0.0")]
    LimitsUpdated {
        min_usd_order_e8: U128,
        quote_expiry_secs: u64,
        max_price_age_secs: u64,
        consignment_bond: U128,
    },
    #[event_version("1.0.0")]
    CommissionBandUpdated { min_bps: u16, max_bps: u16 },
    #[event_version("1.0.0")]
    AgentUpdated { agent: AccountId },
    #[event_version("1.0.0")]
    PausedSet { paused: bool },
    #[event_version("1.0.0")]
    RestrictFulfillUpdated { enabled: bool },
    #[event_version("1.0.0")]
    RequireApproverToFulfillUpdated { enabled: bool },
    #[event_version("1.0.0")]
    TokenRegistered {
        asset_id: String,
        token_account: AccountId,
        decimals: u8,
    },
    #[event_version("1.0.0")]
    TokenActiveSet { asset_id: String, active: bool },
    #[event_version("1.0.0")]
    PoolObservationRecorded {
        asset_id: String,
        tick: i32,
        timestamp_secs: u64,
    },
    #[event_version("1.0.0")]
    NativePriceRecorded {
        price_e8: U128,
        timestamp_secs: u64,
    },
    #[event_version("1.0.0")]
    ConsignmentCreated {
        id: u64,
        asset_id: String,
        consigner: AccountId,
        amount: U128,
        is_negotiable: bool,
    },
    #[event_version("1.0.0")]
    ConsignmentToppedUp { id: u64, amount: U128 },
    #[event_version("1.0.0")]
    ConsignmentWithdrawn {
        id: u64,
        consigner: AccountId,
        amount: U128,
    },
    #[event_version("1.0.0")]
    BondDeposited { account: AccountId, amount: U128 },
    #[event_version("1.0.0")]
    BondWithdrawn { account: AccountId, amount: U128 },
    #[event_version("1.0.0")]
    OfferCreated {
        id: u64,
        consignment_id: u64,
        beneficiary: AccountId,
        token_amount: U128,
        discount_bps: u16,
        currency: SettlementCurrency,
        auto_approved: bool,
    },
    #[event_version("1.0.0")]
    OfferApproved {
        id: u64,
        approver: AccountId,
        approval_count: u32,
        approved: bool,
    },
    #[event_version("1.0.0")]
    OfferCancelled { id: u64, by: AccountId },
    #[event_version("1.0.0")]
    OfferPaid {
        id: u64,
        payer: AccountId,
        amount_paid: U128,
        commission: U128,
    },
    #[event_version("1.0.0")]
    TokensClaimed {
        id: u64,
        beneficiary: AccountId,
        amount: U128,
    },
    #[event_version("1.0.0")]
    OfferEmergencyRefunded {
        id: u64,
        payer: AccountId,
        amount_refunded: U128,
    },
    #[event_version("1.0.0")]
    ProceedsWithdrawn {
        account: AccountId,
        currency_key: String,
        amount: U128,
    },
}
