//! Read-only surface.

use near_sdk::json_types::U128;
use near_sdk::{near, AccountId};

use crate::*;

#[near]
impl Contract {
    pub fn get_version(&self) -> String {
        self.version.clone()
    }

    pub fn get_owner(&self) -> AccountId {
        self.owner_id.clone()
    }

    pub fn get_agent(&self) -> AccountId {
        self.agent_id.clone()
    }

    pub fn get_approvers(&self) -> Vec<AccountId> {
        self.approvers.clone()
    }

    pub fn get_required_approvals(&self) -> u32 {
        self.required_approvals
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn get_commission_band(&self) -> (u16, u16) {
        (self.min_commission_bps, self.max_commission_bps)
    }

    pub fn get_token(&self, asset_id: String) -> Option<TokenEntry> {
        self.tokens.get(&asset_id).cloned()
    }

    pub fn get_consignment(&self, consignment_id: u64) -> Option<Consignment> {
        self.consignments.get(&consignment_id).cloned()
    }

    pub fn get_offer(&self, offer_id: u64) -> Option<Offer> {
        self.offers.get(&offer_id).cloned()
    }

    pub fn get_offer_status(&self, offer_id: u64) -> Option<OfferStatus> {
        self.offers.get(&offer_id).map(|o| o.status())
    }

    pub fn get_approval_count(&self, offer_id: u64) -> Option<u32> {
        self.offers.get(&offer_id).map(|o| o.approvals.len() as u32)
    }

    /// Paginated ids of offers still holding inventory (not cancelled, not
    /// claimed), for keeper scans feeding `auto_claim`.
    pub fn get_open_offer_ids(&self, from_index: Option<u64>, limit: Option<u64>) -> Vec<u64> {
        let from = from_index.unwrap_or(0) as usize;
        let limit = limit
            .unwrap_or(DEFAULT_VIEW_LIMIT)
            .min(MAX_VIEW_LIMIT) as usize;
        self.offers
            .iter()
            .filter(|(_, o)| o.is_open())
            .map(|(id, _)| *id)
            .skip(from)
            .take(limit)
            .collect()
    }

    /// What paying this offer costs right now, in settlement-currency units.
    /// Errors when the quote cannot be produced (stale or missing prices).
    #[handle_result]
    pub fn get_required_payment(&self, offer_id: u64) -> Result<U128, DeskError> {
        let offer = self
            .offers
            .get(&offer_id)
            .ok_or_else(|| DeskError::offer_not_found(offer_id))?;
        self.required_payment_amount(offer, now_secs()).map(U128)
    }

    pub fn bond_of(&self, account: AccountId) -> U128 {
        U128(self.bonds.get(&account).copied().unwrap_or(0))
    }

    pub fn proceeds_of(&self, account: AccountId, currency: SettlementCurrency) -> U128 {
        U128(
            self.proceeds
                .get(&proceeds_key(&account, &currency))
                .copied()
                .unwrap_or(0),
        )
    }

    pub fn next_consignment_id(&self) -> u64 {
        self.next_consignment_id
    }

    pub fn next_offer_id(&self) -> u64 {
        self.next_offer_id
    }
}
