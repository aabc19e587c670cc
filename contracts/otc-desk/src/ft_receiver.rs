//! NEP-141 receiver: token deposits arrive via `ft_transfer_call` with a JSON
//! message selecting the operation. Returning the unused amount makes the
//! token contract refund it; a panic refunds the full transfer.

use near_sdk::json_types::U128;
use near_sdk::{env, near, serde_json, AccountId, PromiseOrValue};

use crate::*;

#[near]
impl Contract {
    pub fn ft_on_transfer(
        &mut self,
        sender_id: AccountId,
        amount: U128,
        msg: String,
    ) -> PromiseOrValue<U128> {
        let token_account = env::predecessor_account_id();
        let message: FtMessage = serde_json::from_str(&msg)
            .unwrap_or_else(|_| env::panic_str("Invalid ft_on_transfer message"));

        let result = match message {
            FtMessage::CreateConsignment { terms } => self
                .internal_create_consignment(
                    &sender_id,
                    &token_account,
                    amount.0,
                    terms,
                    now_secs(),
                )
                .map(|_id| 0),
            FtMessage::TopUpConsignment { consignment_id } => self
                .internal_top_up_consignment(&sender_id, &token_account, consignment_id, amount.0)
                .map(|()| 0),
            FtMessage::FulfillOffer { offer_id } => {
                self.internal_fulfill_with_token(&sender_id, &token_account, offer_id, amount.0)
            }
        };

        match result {
            Ok(unused) => PromiseOrValue::Value(U128(unused)),
            Err(e) => env::panic_str(&e.to_string()),
        }
    }
}

impl Contract {
    /// Token-settled payment path; the transferred asset must be the offer's
    /// settlement currency. Returns the unused amount.
    fn internal_fulfill_with_token(
        &mut self,
        payer: &AccountId,
        token_account: &AccountId,
        offer_id: u64,
        amount: u128,
    ) -> Result<u128, DeskError> {
        let asset_id = crate::registry::asset_id_for(token_account);
        let offer = self
            .offers
            .get(&offer_id)
            .ok_or_else(|| DeskError::offer_not_found(offer_id))?;
        if offer.currency != SettlementCurrency::Token(asset_id) {
            return Err(DeskError::InvalidInput(
                "Transferred asset is not the offer's settlement currency".into(),
            ));
        }
        self.internal_fulfill_offer(payer, offer_id, amount, now_secs())
    }
}
