//! Desk Registry: initialization and owner-only configuration.

use near_sdk::json_types::U128;
use near_sdk::store::{IterableMap, LookupMap};
use near_sdk::{env, near, AccountId};

use crate::events::DeskEvent;
use crate::*;

#[near]
impl Contract {
    // --- Init ---

    #[init]
    pub fn new(
        owner_id: AccountId,
        agent_id: AccountId,
        min_usd_order_e8: U128,
        quote_expiry_secs: u64,
    ) -> Self {
        let contract = Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            owner_id: owner_id.clone(),
            agent_id: agent_id.clone(),
            approvers: Vec::new(),
            required_approvals: 1,
            paused: false,
            restrict_fulfill: false,
            require_approver_to_fulfill: false,
            min_usd_order_e8: min_usd_order_e8.0,
            quote_expiry_secs,
            max_price_age_secs: DEFAULT_MAX_PRICE_AGE_SECS,
            consignment_bond: 0,
            min_commission_bps: DEFAULT_MIN_COMMISSION_BPS,
            max_commission_bps: DEFAULT_MAX_COMMISSION_BPS,
            native_usd_price_e8: 0,
            native_price_updated_at_secs: 0,
            tokens: IterableMap::new(StorageKey::Tokens),
            consignments: IterableMap::new(StorageKey::Consignments),
            offers: IterableMap::new(StorageKey::Offers),
            bonds: LookupMap::new(StorageKey::Bonds),
            proceeds: LookupMap::new(StorageKey::Proceeds),
            next_consignment_id: 1,
            next_offer_id: 1,
        };
        DeskEvent::DeskInitialized {
            owner: owner_id,
            agent: agent_id,
        }
        .emit();
        contract
    }

    // --- Owner configuration ---

    /// Owner only. Adds or removes an approver; the set is capped at 32.
    #[handle_result]
    pub fn set_approver(&mut self, who: AccountId, allowed: bool) -> Result<(), DeskError> {
        self.check_owner(&env::predecessor_account_id())?;
        if allowed {
            if !self.approvers.contains(&who) {
                if self.approvers.len() >= MAX_APPROVERS {
                    return Err(DeskError::InvalidInput("Too many approvers".into()));
                }
                self.approvers.push(who.clone());
            }
        } else if let Some(i) = self.approvers.iter().position(|a| a == &who) {
            self.approvers.remove(i);
        }
        DeskEvent::ApproverUpdated {
            approver: who,
            allowed,
        }
        .emit();
        Ok(())
    }

    /// Owner only. Quorum size Q; with Q = 1 this degenerates to
    /// single-approver mode.
    #[handle_result]
    pub fn set_required_approvals(&mut self, required: u32) -> Result<(), DeskError> {
        self.check_owner(&env::predecessor_account_id())?;
        if required == 0 {
            return Err(DeskError::InvalidInput(
                "Required approvals must be at least 1".into(),
            ));
        }
        self.required_approvals = required;
        DeskEvent::RequiredApprovalsUpdated { required }.emit();
        Ok(())
    }

    /// Owner only.
    #[handle_result]
    pub fn set_limits(
        &mut self,
        min_usd_order_e8: U128,
        quote_expiry_secs: u64,
        max_price_age_secs: u64,
        consignment_bond: U128,
    ) -> Result<(), DeskError> {
        self.check_owner(&env::predecessor_account_id())?;
        if quote_expiry_secs == 0 || max_price_age_secs == 0 {
            return Err(DeskError::InvalidInput(
                "Expiry and price-age windows must be positive".into(),
            ));
        }
        self.min_usd_order_e8 = min_usd_order_e8.0;
        self.quote_expiry_secs = quote_expiry_secs;
        self.max_price_age_secs = max_price_age_secs;
        self.consignment_bond = consignment_bond.0;
        DeskEvent::LimitsUpdated {
            min_usd_order_e8,
            quote_expiry_secs,
            max_price_age_secs,
            consignment_bond,
        }
        .emit();
        Ok(())
    }

    /// Owner only. Valid band for agent commission on negotiated offers.
    #[handle_result]
    pub fn set_commission_band(&mut self, min_bps: u16, max_bps: u16) -> Result<(), DeskError> {
        self.check_owner(&env::predecessor_account_id())?;
        if min_bps > max_bps || max_bps >= BASIS_POINTS {
            return Err(DeskError::InvalidInput("Invalid commission band".into()));
        }
        self.min_commission_bps = min_bps;
        self.max_commission_bps = max_bps;
        DeskEvent::CommissionBandUpdated { min_bps, max_bps }.emit();
        Ok(())
    }

    /// Owner only.
    #[handle_result]
    pub fn set_agent(&mut self, agent_id: AccountId) -> Result<(), DeskError> {
        self.check_owner(&env::predecessor_account_id())?;
        self.agent_id = agent_id.clone();
        DeskEvent::AgentUpdated { agent: agent_id }.emit();
        Ok(())
    }

    /// Owner only.
    #[handle_result]
    pub fn set_restrict_fulfill(&mut self, enabled: bool) -> Result<(), DeskError> {
        self.check_owner(&env::predecessor_account_id())?;
        self.restrict_fulfill = enabled;
        DeskEvent::RestrictFulfillUpdated { enabled }.emit();
        Ok(())
    }

    /// Owner only.
    #[handle_result]
    pub fn set_require_approver_to_fulfill(&mut self, enabled: bool) -> Result<(), DeskError> {
        self.check_owner(&env::predecessor_account_id())?;
        self.require_approver_to_fulfill = enabled;
        DeskEvent::RequireApproverToFulfillUpdated { enabled }.emit();
        Ok(())
    }

    /// Owner only.
    #[handle_result]
    pub fn pause(&mut self) -> Result<(), DeskError> {
        self.check_owner(&env::predecessor_account_id())?;
        self.paused = true;
        DeskEvent::PausedSet { paused: true }.emit();
        Ok(())
    }

    /// Owner only.
    #[handle_result]
    pub fn unpause(&mut self) -> Result<(), DeskError> {
        self.check_owner(&env::predecessor_account_id())?;
        self.paused = false;
        DeskEvent::PausedSet { paused: false }.emit();
        Ok(())
    }
}
