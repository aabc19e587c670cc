//! Offer State Machine.
//!
//! `created → (approved) → paid → fulfilled`, with `cancelled` reachable
//! before payment and `emergency-refunded` (terminally marked cancelled)
//! reachable from `paid` after a fixed 90-day liveness window. Offers are
//! never deleted, only terminally marked.

use near_sdk::json_types::U128;
use near_sdk::{env, near, AccountId, NearToken, Promise};

use crate::events::DeskEvent;
use crate::*;

// --- Public entry points ---

#[near]
impl Contract {
    /// Caller is the beneficiary. Locks in the live oracle price of the
    /// asset and the settlement currency. Non-negotiable consignments
    /// auto-approve the offer and force commission to zero.
    #[handle_result]
    pub fn create_offer_from_consignment(
        &mut self,
        consignment_id: u64,
        token_amount: U128,
        discount_bps: u16,
        currency: SettlementCurrency,
        lockup_secs: u64,
        agent_commission_bps: u16,
    ) -> Result<u64, DeskError> {
        let beneficiary = env::predecessor_account_id();
        self.internal_create_offer(
            &beneficiary,
            consignment_id,
            token_amount.0,
            discount_bps,
            currency,
            lockup_secs,
            agent_commission_bps,
            now_secs(),
        )
    }

    /// Approver only. Reaching the desk's required count flips `approved`
    /// exactly once; later distinct approvals are recorded no-ops.
    #[handle_result]
    pub fn approve_offer(&mut self, offer_id: u64) -> Result<(), DeskError> {
        let caller = env::predecessor_account_id();
        self.internal_approve_offer(&caller, offer_id)
    }

    /// Pre-payment cancellation: the beneficiary after quote expiry, or the
    /// owner/agent/an approver at any time. Credits inventory back.
    #[handle_result]
    pub fn cancel_offer(&mut self, offer_id: u64) -> Result<(), DeskError> {
        let caller = env::predecessor_account_id();
        self.internal_cancel_offer(&caller, offer_id, now_secs())
    }

    /// Pays a native-settled offer. Overpayment is refunded; returns the
    /// refunded amount.
    #[payable]
    #[handle_result]
    pub fn fulfill_offer(&mut self, offer_id: u64) -> Result<U128, DeskError> {
        let payer = env::predecessor_account_id();
        let attached = env::attached_deposit().as_yoctonear();
        let offer = self
            .offers
            .get(&offer_id)
            .ok_or_else(|| DeskError::offer_not_found(offer_id))?;
        if offer.currency != SettlementCurrency::Native {
            return Err(DeskError::InvalidState(
                "Offer settles in a token; pay via ft_transfer_call".into(),
            ));
        }
        let unused = self.internal_fulfill_offer(&payer, offer_id, attached, now_secs())?;
        if unused > 0 {
            let _ = Promise::new(payer).transfer(NearToken::from_yoctonear(unused));
        }
        Ok(U128(unused))
    }

    /// Releases purchased tokens to the beneficiary once the lockup has
    /// elapsed. Callable by anyone; the payout destination is fixed.
    #[handle_result]
    pub fn claim(&mut self, offer_id: u64) -> Result<(), DeskError> {
        let (entry, beneficiary, amount) = self.internal_claim(offer_id, now_secs())?;
        self.transfer_asset_out(&entry, &beneficiary, amount);
        Ok(())
    }

    /// Approver only. Claims the matured subset of a batch, silently
    /// skipping immature or ineligible ids; never partially claims one
    /// offer. Returns the claimed ids.
    #[handle_result]
    pub fn auto_claim(&mut self, offer_ids: Vec<u64>) -> Result<Vec<u64>, DeskError> {
        let caller = env::predecessor_account_id();
        self.check_approver(&caller)?;
        if offer_ids.len() > MAX_AUTO_CLAIM {
            return Err(DeskError::InvalidInput(format!(
                "At most {} offers per batch",
                MAX_AUTO_CLAIM
            )));
        }
        let now = now_secs();
        let mut claimed = Vec::new();
        for offer_id in offer_ids {
            match self.internal_claim(offer_id, now) {
                Ok((entry, beneficiary, amount)) => {
                    self.transfer_asset_out(&entry, &beneficiary, amount);
                    claimed.push(offer_id);
                }
                Err(_) => continue,
            }
        }
        Ok(claimed)
    }

    /// Liveness escape valve: after 90 days a paid-but-unclaimed offer can
    /// be unwound, refunding the payer and restoring inventory.
    #[handle_result]
    pub fn emergency_refund(&mut self, offer_id: u64) -> Result<(), DeskError> {
        let caller = env::predecessor_account_id();
        let (currency, payer, amount) =
            self.internal_emergency_refund(&caller, offer_id, now_secs())?;
        self.transfer_out(&currency, &payer, amount);
        Ok(())
    }

    /// Pays out the caller's accumulated settlement proceeds (consigner
    /// revenue or agent commission) in the given currency.
    #[handle_result]
    pub fn withdraw_proceeds(&mut self, currency: SettlementCurrency) -> Result<U128, DeskError> {
        let account = env::predecessor_account_id();
        let key = proceeds_key(&account, &currency);
        let balance = self.proceeds.get(&key).copied().unwrap_or(0);
        if balance == 0 {
            return Err(DeskError::InvalidState("No proceeds to withdraw".into()));
        }
        self.proceeds.insert(key, 0);
        self.transfer_out(&currency, &account, balance);
        DeskEvent::ProceedsWithdrawn {
            account,
            currency_key: currency.key(),
            amount: U128(balance),
        }
        .emit();
        Ok(U128(balance))
    }

    /// Monotone commission floor for a negotiated deal: larger discounts and
    /// longer lockups mean more agent work, hence a higher floor, clamped to
    /// the desk band. Validates caller proposals; never overrides them.
    pub fn calculate_agent_commission(&self, discount_bps: u16, lockup_days: u32) -> u16 {
        let raw =
            self.min_commission_bps as u64 + (discount_bps as u64) / 10 + (lockup_days as u64) / 2;
        raw.min(self.max_commission_bps as u64) as u16
    }
}

// --- Internal implementations ---

impl Contract {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn internal_create_offer(
        &mut self,
        beneficiary: &AccountId,
        consignment_id: u64,
        token_amount: u128,
        discount_bps: u16,
        currency: SettlementCurrency,
        lockup_secs: u64,
        agent_commission_bps: u16,
        now: u64,
    ) -> Result<u64, DeskError> {
        self.check_not_paused()?;

        let consignment = self
            .consignments
            .get(&consignment_id)
            .ok_or_else(|| DeskError::consignment_not_found(consignment_id))?;
        if !consignment.is_active {
            return Err(DeskError::InvalidState("Consignment is closed".into()));
        }
        if token_amount < consignment.min_deal_amount || token_amount > consignment.max_deal_amount
        {
            return Err(DeskError::InvalidInput("Amount outside deal bounds".into()));
        }
        if token_amount > consignment.remaining_amount {
            return Err(DeskError::InvalidInput(
                "Insufficient consignment inventory".into(),
            ));
        }

        if lockup_secs > MAX_LOCKUP_SECS {
            return Err(DeskError::InvalidInput("Lockup too long".into()));
        }
        let lockup_days = lockup_days_from_secs(lockup_secs);
        let commission_bps = if consignment.is_negotiable {
            if discount_bps < consignment.min_discount_bps
                || discount_bps > consignment.max_discount_bps
            {
                return Err(DeskError::InvalidInput(
                    "Discount outside negotiable range".into(),
                ));
            }
            if lockup_days < consignment.min_lockup_days
                || lockup_days > consignment.max_lockup_days
            {
                return Err(DeskError::InvalidInput(
                    "Lockup outside negotiable range".into(),
                ));
            }
            let floor = self.calculate_agent_commission(discount_bps, lockup_days);
            if agent_commission_bps < self.min_commission_bps
                || agent_commission_bps > self.max_commission_bps
            {
                return Err(DeskError::InvalidInput(format!(
                    "Commission outside the {}-{} bps band",
                    self.min_commission_bps, self.max_commission_bps
                )));
            }
            if agent_commission_bps < floor {
                return Err(DeskError::InvalidInput(format!(
                    "Commission below the {} bps floor for these terms",
                    floor
                )));
            }
            agent_commission_bps
        } else {
            if discount_bps != consignment.fixed_discount_bps {
                return Err(DeskError::InvalidInput(
                    "Discount must equal the fixed terms".into(),
                ));
            }
            if lockup_days != consignment.fixed_lockup_days {
                return Err(DeskError::InvalidInput(
                    "Lockup must equal the fixed terms".into(),
                ));
            }
            // Permissionless peer-to-peer fulfillment earns no commission.
            0
        };

        let asset_id = consignment.asset_id.clone();
        let max_price_deviation_bps = consignment.max_price_volatility_bps;

        // Locked-in pricing basis: current asset TWAP and live currency price,
        // captured in the same transition that consumes them.
        let entry = self.get_active_token_entry(&asset_id)?;
        let decimals = entry.decimals;
        let price_usd_per_token_e8 = self.live_usd_price_e8(entry, now)?;
        let currency_usd_price_e8 = self.currency_usd_price_e8(&currency, now)?;

        let usd_e8 = mul_div(token_amount, price_usd_per_token_e8, pow10(decimals as u32))?;
        let usd_disc_e8 = mul_div(
            usd_e8,
            (BASIS_POINTS - discount_bps) as u128,
            BASIS_POINTS as u128,
        )?;
        if usd_disc_e8 < self.min_usd_order_e8 {
            return Err(DeskError::InvalidInput(
                "Order below the desk's minimum USD size".into(),
            ));
        }

        // Check-then-act on the contended inventory: the debit and the checks
        // above commit atomically within this call.
        let consignment = self
            .consignments
            .get_mut(&consignment_id)
            .ok_or_else(|| DeskError::consignment_not_found(consignment_id))?;
        consignment.remaining_amount -= token_amount;
        let auto_approved = !consignment.is_negotiable;

        let id = self.next_offer_id;
        self.next_offer_id += 1;

        let offer = Offer {
            id,
            consignment_id,
            asset_id,
            beneficiary: beneficiary.clone(),
            token_amount,
            discount_bps,
            lockup_days,
            created_at_secs: now,
            unlock_time_secs: now + lockup_secs,
            price_usd_per_token_e8,
            currency_usd_price_e8,
            max_price_deviation_bps,
            currency: currency.clone(),
            agent_commission_bps: commission_bps,
            approvals: Vec::new(),
            approved: auto_approved,
            paid: false,
            fulfilled: false,
            cancelled: false,
            payer: None,
            amount_paid: 0,
        };
        self.offers.insert(id, offer);

        DeskEvent::OfferCreated {
            id,
            consignment_id,
            beneficiary: beneficiary.clone(),
            token_amount: U128(token_amount),
            discount_bps,
            currency,
            auto_approved,
        }
        .emit();
        Ok(id)
    }

    pub(crate) fn internal_approve_offer(
        &mut self,
        caller: &AccountId,
        offer_id: u64,
    ) -> Result<(), DeskError> {
        self.check_not_paused()?;
        self.check_approver(caller)?;
        let required = self.required_approvals;

        let offer = self
            .offers
            .get_mut(&offer_id)
            .ok_or_else(|| DeskError::offer_not_found(offer_id))?;
        if offer.cancelled || offer.paid {
            return Err(DeskError::InvalidState(
                "Offer is no longer awaiting approval".into(),
            ));
        }
        if offer.approvals.contains(caller) {
            return Err(DeskError::already_approved());
        }
        offer.approvals.push(caller.clone());
        if !offer.approved && offer.approvals.len() as u32 >= required {
            offer.approved = true;
        }
        DeskEvent::OfferApproved {
            id: offer_id,
            approver: caller.clone(),
            approval_count: offer.approvals.len() as u32,
            approved: offer.approved,
        }
        .emit();
        Ok(())
    }

    pub(crate) fn internal_cancel_offer(
        &mut self,
        caller: &AccountId,
        offer_id: u64,
        now: u64,
    ) -> Result<(), DeskError> {
        self.check_not_paused()?;
        let offer = self
            .offers
            .get(&offer_id)
            .ok_or_else(|| DeskError::offer_not_found(offer_id))?;
        if offer.paid || offer.fulfilled {
            return Err(DeskError::InvalidState(
                "Paid offers cannot be cancelled".into(),
            ));
        }
        if offer.cancelled {
            return Err(DeskError::InvalidState("Offer already cancelled".into()));
        }

        if caller == &offer.beneficiary {
            let expiry = offer.created_at_secs + self.quote_expiry_secs;
            if now < expiry {
                return Err(DeskError::InvalidState(
                    "Quote has not expired yet".into(),
                ));
            }
        } else if caller != &self.owner_id && !self.is_approver(caller) {
            return Err(DeskError::not_approver());
        }

        let consignment_id = offer.consignment_id;
        let token_amount = offer.token_amount;
        let offer = self
            .offers
            .get_mut(&offer_id)
            .ok_or_else(|| DeskError::offer_not_found(offer_id))?;
        offer.cancelled = true;
        self.credit_consignment(consignment_id, token_amount);

        DeskEvent::OfferCancelled {
            id: offer_id,
            by: caller.clone(),
        }
        .emit();
        Ok(())
    }

    /// Shared fulfillment path. `available` is the payment offered in
    /// settlement-currency units; returns the unused remainder.
    pub(crate) fn internal_fulfill_offer(
        &mut self,
        payer: &AccountId,
        offer_id: u64,
        available: u128,
        now: u64,
    ) -> Result<u128, DeskError> {
        self.check_not_paused()?;
        let offer = self
            .offers
            .get(&offer_id)
            .ok_or_else(|| DeskError::offer_not_found(offer_id))?
            .clone();

        if !offer.approved {
            return Err(DeskError::InvalidState("Offer not approved".into()));
        }
        if offer.cancelled || offer.paid || offer.fulfilled {
            return Err(DeskError::InvalidState(
                "Offer is not awaiting payment".into(),
            ));
        }
        if now > offer.created_at_secs + self.quote_expiry_secs {
            return Err(DeskError::InvalidState("Quote expired".into()));
        }
        self.check_fulfill_allowed(payer, &offer)?;

        // Manipulation guard: live TWAP must sit within the deviation band
        // around the price locked at creation.
        let entry = self.get_token_entry(&offer.asset_id)?;
        let live_price_e8 = self.live_usd_price_e8(entry, now)?;
        let locked = offer.price_usd_per_token_e8;
        let diff = live_price_e8.abs_diff(locked);
        let max_deviation = mul_div(locked, offer.max_price_deviation_bps as u128, BASIS_POINTS as u128)?;
        if diff > max_deviation {
            return Err(DeskError::PriceDeviation(format!(
                "Live price {} drifted more than {} bps from locked price {}",
                live_price_e8, offer.max_price_deviation_bps, locked
            )));
        }

        let required = self.required_payment_amount(&offer, now)?;
        if available < required {
            return Err(DeskError::InvalidInput(format!(
                "Insufficient payment: required {}",
                required
            )));
        }
        let unused = available - required;

        let commission = mul_div(
            required,
            offer.agent_commission_bps as u128,
            BASIS_POINTS as u128,
        )?;
        let consigner = self
            .consignments
            .get(&offer.consignment_id)
            .ok_or_else(|| DeskError::consignment_not_found(offer.consignment_id))?
            .consigner
            .clone();

        let stored = self
            .offers
            .get_mut(&offer_id)
            .ok_or_else(|| DeskError::offer_not_found(offer_id))?;
        stored.paid = true;
        stored.payer = Some(payer.clone());
        stored.amount_paid = required;

        let agent = self.agent_id.clone();
        self.credit_proceeds(&agent, &offer.currency, commission);
        self.credit_proceeds(&consigner, &offer.currency, required - commission);

        DeskEvent::OfferPaid {
            id: offer_id,
            payer: payer.clone(),
            amount_paid: U128(required),
            commission: U128(commission),
        }
        .emit();
        Ok(unused)
    }

    /// Exact payment due now: locked asset price, live currency price,
    /// discount floored, conversion ceiled.
    pub(crate) fn required_payment_amount(
        &self,
        offer: &Offer,
        now: u64,
    ) -> Result<u128, DeskError> {
        let entry = self.get_token_entry(&offer.asset_id)?;
        let usd_e8 = mul_div(
            offer.token_amount,
            offer.price_usd_per_token_e8,
            pow10(entry.decimals as u32),
        )?;
        let usd_disc_e8 = mul_div(
            usd_e8,
            (BASIS_POINTS - offer.discount_bps) as u128,
            BASIS_POINTS as u128,
        )?;
        let currency_usd_e8 = self.currency_usd_price_e8(&offer.currency, now)?;
        self.usd_to_currency_amount(usd_disc_e8, &offer.currency, currency_usd_e8)
    }

    pub(crate) fn internal_claim(
        &mut self,
        offer_id: u64,
        now: u64,
    ) -> Result<(TokenEntry, AccountId, u128), DeskError> {
        self.check_not_paused()?;
        let offer = self
            .offers
            .get_mut(&offer_id)
            .ok_or_else(|| DeskError::offer_not_found(offer_id))?;
        if !offer.paid || offer.cancelled {
            return Err(DeskError::InvalidState("Offer is not paid".into()));
        }
        if offer.fulfilled {
            return Err(DeskError::InvalidState("Offer already claimed".into()));
        }
        if now < offer.unlock_time_secs {
            return Err(DeskError::InvalidState("Tokens still locked".into()));
        }
        offer.fulfilled = true;
        let beneficiary = offer.beneficiary.clone();
        let token_amount = offer.token_amount;
        let asset_id = offer.asset_id.clone();

        let entry = self.get_token_entry(&asset_id)?.clone();
        DeskEvent::TokensClaimed {
            id: offer_id,
            beneficiary: beneficiary.clone(),
            amount: U128(token_amount),
        }
        .emit();
        Ok((entry, beneficiary, token_amount))
    }

    pub(crate) fn internal_emergency_refund(
        &mut self,
        caller: &AccountId,
        offer_id: u64,
        now: u64,
    ) -> Result<(SettlementCurrency, AccountId, u128), DeskError> {
        let offer = self
            .offers
            .get(&offer_id)
            .ok_or_else(|| DeskError::offer_not_found(offer_id))?
            .clone();
        if !offer.paid || offer.fulfilled || offer.cancelled {
            return Err(DeskError::InvalidState(
                "Only paid, unclaimed offers can be refunded".into(),
            ));
        }
        if now < offer.created_at_secs + EMERGENCY_REFUND_DELAY_SECS {
            return Err(DeskError::InvalidState(
                "Too early for emergency refund".into(),
            ));
        }
        let payer = offer
            .payer
            .clone()
            .ok_or_else(|| DeskError::InternalError("Paid offer without payer".into()))?;
        let allowed = caller == &payer
            || caller == &offer.beneficiary
            || caller == &self.owner_id
            || self.is_approver(caller);
        if !allowed {
            return Err(DeskError::Unauthorized(
                "Not a party to this offer".into(),
            ));
        }

        let stored = self
            .offers
            .get_mut(&offer_id)
            .ok_or_else(|| DeskError::offer_not_found(offer_id))?;
        stored.cancelled = true;
        self.credit_consignment(offer.consignment_id, offer.token_amount);

        // Unwind the proceeds credited at fulfillment, as far as they are
        // still undrawn.
        let commission = mul_div(
            offer.amount_paid,
            offer.agent_commission_bps as u128,
            BASIS_POINTS as u128,
        )?;
        let consigner = self
            .consignments
            .get(&offer.consignment_id)
            .map(|c| c.consigner.clone());
        if let Some(consigner) = consigner {
            self.debit_proceeds(&consigner, &offer.currency, offer.amount_paid - commission);
        }
        let agent = self.agent_id.clone();
        self.debit_proceeds(&agent, &offer.currency, commission);

        DeskEvent::OfferEmergencyRefunded {
            id: offer_id,
            payer: payer.clone(),
            amount_refunded: U128(offer.amount_paid),
        }
        .emit();
        Ok((offer.currency, payer, offer.amount_paid))
    }

    /// Fulfillment gating per desk configuration.
    fn check_fulfill_allowed(&self, payer: &AccountId, offer: &Offer) -> Result<(), DeskError> {
        if self.require_approver_to_fulfill {
            if payer != &self.owner_id && !self.is_approver(payer) {
                return Err(DeskError::Unauthorized(
                    "Fulfillment restricted to the desk agent and approvers".into(),
                ));
            }
        } else if self.restrict_fulfill
            && payer != &offer.beneficiary
            && payer != &self.owner_id
            && !self.is_approver(payer)
        {
            return Err(DeskError::Unauthorized("Fulfillment restricted".into()));
        }
        Ok(())
    }

    fn debit_proceeds(&mut self, account: &AccountId, currency: &SettlementCurrency, amount: u128) {
        if amount == 0 {
            return;
        }
        let key = proceeds_key(account, currency);
        let balance = self.proceeds.get(&key).copied().unwrap_or(0);
        if balance < amount {
            env::log_str(&format!(
                "WARN: proceeds of '{}' short by {} during refund unwind",
                account,
                amount - balance
            ));
        }
        self.proceeds.insert(key, balance.saturating_sub(amount));
    }
}
