//! Consignment Ledger: inventory committed for sale plus the negotiation
//! envelope, backed by a refundable liveness bond.
//!
//! Inventory arrives through NEP-141 `ft_transfer_call` (see
//! `ft_receiver.rs`); withdrawal transfers the remaining amount back to the
//! consigner and releases the bond.

use near_sdk::json_types::U128;
use near_sdk::{env, near, AccountId, NearToken, Promise};

use crate::events::DeskEvent;
use crate::*;

// --- Public entry points ---

#[near]
impl Contract {
    /// Deposits yoctoNEAR into the caller's refundable liveness-bond balance.
    /// A configured bond is reserved per consignment and released on
    /// withdrawal.
    #[payable]
    pub fn deposit_bond(&mut self) {
        let account = env::predecessor_account_id();
        let amount = env::attached_deposit().as_yoctonear();
        let balance = self.bonds.get(&account).copied().unwrap_or(0);
        self.bonds.insert(account.clone(), balance + amount);
        DeskEvent::BondDeposited {
            account,
            amount: U128(amount),
        }
        .emit();
    }

    /// Withdraws unreserved bond balance back to the caller.
    #[handle_result]
    pub fn withdraw_bond(&mut self, amount: U128) -> Result<(), DeskError> {
        let account = env::predecessor_account_id();
        let balance = self.bonds.get(&account).copied().unwrap_or(0);
        if amount.0 == 0 || amount.0 > balance {
            return Err(DeskError::InvalidInput(
                "Amount exceeds free bond balance".into(),
            ));
        }
        self.bonds.insert(account.clone(), balance - amount.0);
        let _ = Promise::new(account.clone()).transfer(NearToken::from_yoctonear(amount.0));
        DeskEvent::BondWithdrawn { account, amount }.emit();
        Ok(())
    }

    /// Consigner only. Returns the remaining inventory, deactivates the
    /// consignment, and releases the reserved bond. Fails when nothing
    /// remains to withdraw.
    #[handle_result]
    pub fn withdraw_consignment(&mut self, consignment_id: u64) -> Result<(), DeskError> {
        let caller = env::predecessor_account_id();
        let (entry, consigner, amount) = self.internal_withdraw_consignment(&caller, consignment_id)?;
        self.transfer_asset_out(&entry, &consigner, amount);
        Ok(())
    }
}

// --- Internal implementations ---

impl Contract {
    pub(crate) fn internal_create_consignment(
        &mut self,
        consigner: &AccountId,
        token_account: &AccountId,
        amount: u128,
        terms: ConsignmentTerms,
        now: u64,
    ) -> Result<u64, DeskError> {
        self.check_not_paused()?;
        if amount == 0 {
            return Err(DeskError::InvalidInput("Amount must be positive".into()));
        }

        let asset_id = crate::registry::asset_id_for(token_account);
        let entry = self.get_active_token_entry(&asset_id)?;
        if &entry.token_account != token_account {
            return Err(DeskError::InternalError("Asset id collision".into()));
        }

        let (fixed_discount_bps, fixed_lockup_days, ranges) = validate_terms(&terms)?;
        let (min_discount_bps, max_discount_bps, min_lockup_days, max_lockup_days) = ranges;

        if terms.min_deal_amount.0 > terms.max_deal_amount.0 {
            return Err(DeskError::InvalidInput("Deal bounds inverted".into()));
        }

        // Reserve the liveness bond before touching inventory.
        let bond = self.consignment_bond;
        if bond > 0 {
            let balance = self.bonds.get(consigner).copied().unwrap_or(0);
            if balance < bond {
                return Err(DeskError::InvalidInput(format!(
                    "Consignment requires a {} yoctoNEAR bond on deposit",
                    bond
                )));
            }
            self.bonds.insert(consigner.clone(), balance - bond);
        }

        let id = self.next_consignment_id;
        self.next_consignment_id += 1;

        let consignment = Consignment {
            id,
            asset_id: asset_id.clone(),
            consigner: consigner.clone(),
            total_amount: amount,
            remaining_amount: amount,
            is_negotiable: terms.is_negotiable,
            fixed_discount_bps,
            fixed_lockup_days,
            min_discount_bps,
            max_discount_bps,
            min_lockup_days,
            max_lockup_days,
            min_deal_amount: terms.min_deal_amount.0,
            max_deal_amount: terms.max_deal_amount.0,
            max_price_volatility_bps: terms.max_price_volatility_bps,
            bond,
            is_active: true,
            created_at_secs: now,
        };
        self.consignments.insert(id, consignment);

        DeskEvent::ConsignmentCreated {
            id,
            asset_id,
            consigner: consigner.clone(),
            amount: U128(amount),
            is_negotiable: terms.is_negotiable,
        }
        .emit();
        Ok(id)
    }

    /// Registry-level top-up: the one case where `remaining_amount` grows
    /// outside of cancellations.
    pub(crate) fn internal_top_up_consignment(
        &mut self,
        sender: &AccountId,
        token_account: &AccountId,
        consignment_id: u64,
        amount: u128,
    ) -> Result<(), DeskError> {
        self.check_not_paused()?;
        if amount == 0 {
            return Err(DeskError::InvalidInput("Amount must be positive".into()));
        }
        let asset_id = crate::registry::asset_id_for(token_account);
        let consignment = self
            .consignments
            .get_mut(&consignment_id)
            .ok_or_else(|| DeskError::consignment_not_found(consignment_id))?;
        if &consignment.consigner != sender {
            return Err(DeskError::Unauthorized(
                "Only the consigner can top up".into(),
            ));
        }
        if consignment.asset_id != asset_id {
            return Err(DeskError::InvalidInput(
                "Deposit asset does not match the consignment".into(),
            ));
        }
        if !consignment.is_active {
            return Err(DeskError::InvalidState("Consignment is closed".into()));
        }
        consignment.total_amount += amount;
        consignment.remaining_amount += amount;
        DeskEvent::ConsignmentToppedUp {
            id: consignment_id,
            amount: U128(amount),
        }
        .emit();
        Ok(())
    }

    pub(crate) fn internal_withdraw_consignment(
        &mut self,
        caller: &AccountId,
        consignment_id: u64,
    ) -> Result<(TokenEntry, AccountId, u128), DeskError> {
        let consignment = self
            .consignments
            .get_mut(&consignment_id)
            .ok_or_else(|| DeskError::consignment_not_found(consignment_id))?;
        if &consignment.consigner != caller {
            return Err(DeskError::Unauthorized(
                "Only the consigner can withdraw".into(),
            ));
        }
        if consignment.remaining_amount == 0 {
            return Err(DeskError::InvalidState("Nothing left to withdraw".into()));
        }
        let amount = consignment.remaining_amount;
        consignment.remaining_amount = 0;
        consignment.is_active = false;

        let bond = consignment.bond;
        consignment.bond = 0;
        let asset_id = consignment.asset_id.clone();
        let consigner = consignment.consigner.clone();

        if bond > 0 {
            let balance = self.bonds.get(&consigner).copied().unwrap_or(0);
            self.bonds.insert(consigner.clone(), balance + bond);
        }

        let entry = self.get_token_entry(&asset_id)?.clone();
        DeskEvent::ConsignmentWithdrawn {
            id: consignment_id,
            consigner: consigner.clone(),
            amount: U128(amount),
        }
        .emit();
        Ok((entry, consigner, amount))
    }

    /// Credits inventory back after an offer cancellation or emergency
    /// refund; keeps the remaining-amount invariant intact even for closed
    /// consignments (the consigner can still withdraw the credit).
    pub(crate) fn credit_consignment(&mut self, consignment_id: u64, amount: u128) {
        if let Some(consignment) = self.consignments.get_mut(&consignment_id) {
            consignment.remaining_amount += amount;
        } else {
            env::log_str(&format!(
                "WARN: consignment {} missing while crediting back {}",
                consignment_id, amount
            ));
        }
    }
}

/// Fixed consignments carry exactly one discount/lockup pair; negotiable
/// ones carry a range only. Returns (fixed pair, ranges) with unused sides
/// zeroed.
fn validate_terms(
    terms: &ConsignmentTerms,
) -> Result<(u16, u32, (u16, u16, u32, u32)), DeskError> {
    if terms.is_negotiable {
        if terms.fixed_discount_bps.is_some() || terms.fixed_lockup_days.is_some() {
            return Err(DeskError::InvalidInput(
                "Negotiable consignments carry ranges, not fixed terms".into(),
            ));
        }
        let (min_d, max_d, min_l, max_l) = match (
            terms.min_discount_bps,
            terms.max_discount_bps,
            terms.min_lockup_days,
            terms.max_lockup_days,
        ) {
            (Some(a), Some(b), Some(c), Some(d)) => (a, b, c, d),
            _ => {
                return Err(DeskError::InvalidInput(
                    "Negotiable consignments require discount and lockup ranges".into(),
                ))
            }
        };
        if min_d > max_d || min_l > max_l {
            return Err(DeskError::InvalidInput("Ranges inverted".into()));
        }
        if max_d >= BASIS_POINTS {
            return Err(DeskError::InvalidInput("Discount must be below 100%".into()));
        }
        Ok((0, 0, (min_d, max_d, min_l, max_l)))
    } else {
        if terms.min_discount_bps.is_some()
            || terms.max_discount_bps.is_some()
            || terms.min_lockup_days.is_some()
            || terms.max_lockup_days.is_some()
        {
            return Err(DeskError::InvalidInput(
                "Fixed consignments carry one discount/lockup pair, not ranges".into(),
            ));
        }
        let (discount, lockup) = match (terms.fixed_discount_bps, terms.fixed_lockup_days) {
            (Some(d), Some(l)) => (d, l),
            _ => {
                return Err(DeskError::InvalidInput(
                    "Fixed consignments require a discount/lockup pair".into(),
                ))
            }
        };
        if discount >= BASIS_POINTS {
            return Err(DeskError::InvalidInput("Discount must be below 100%".into()));
        }
        Ok((discount, lockup, (0, 0, 0, 0)))
    }
}
