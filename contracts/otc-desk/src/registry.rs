//! Token Registry: per-asset entries with oracle configuration.

use near_sdk::{env, near, AccountId};

use crate::events::DeskEvent;
use crate::*;

/// Content-derived asset id: hex(sha256(token account id)).
pub fn asset_id_for(token_account: &AccountId) -> String {
    hex::encode(env::sha256(token_account.as_bytes()))
}

#[near]
impl Contract {
    /// Owner only. Registers an asset under its content-derived id and
    /// returns that id. Fails on a duplicate registration.
    #[handle_result]
    pub fn register_token(
        &mut self,
        token_account: AccountId,
        decimals: u8,
        is_usd_stable: bool,
        oracle: OracleConfig,
    ) -> Result<String, DeskError> {
        self.check_owner(&env::predecessor_account_id())?;
        let asset_id = asset_id_for(&token_account);
        if self.tokens.contains_key(&asset_id) {
            return Err(DeskError::InvalidInput(format!(
                "Asset {} already registered",
                asset_id
            )));
        }
        let entry = TokenEntry {
            asset_id: asset_id.clone(),
            token_account: token_account.clone(),
            decimals,
            is_active: true,
            is_usd_stable,
            oracle,
            observations: Vec::new(),
        };
        self.tokens.insert(asset_id.clone(), entry);
        DeskEvent::TokenRegistered {
            asset_id: asset_id.clone(),
            token_account,
            decimals,
        }
        .emit();
        Ok(asset_id)
    }

    /// Owner only. The active flag is the only mutable field of a registered
    /// entry; clearing it pauses new consignments and offers for the asset.
    #[handle_result]
    pub fn set_token_active(&mut self, asset_id: String, active: bool) -> Result<(), DeskError> {
        self.check_owner(&env::predecessor_account_id())?;
        let entry = self
            .tokens
            .get_mut(&asset_id)
            .ok_or_else(|| DeskError::token_not_found(&asset_id))?;
        entry.is_active = active;
        DeskEvent::TokenActiveSet { asset_id, active }.emit();
        Ok(())
    }
}

impl Contract {
    pub(crate) fn get_token_entry(&self, asset_id: &str) -> Result<&TokenEntry, DeskError> {
        self.tokens
            .get(asset_id)
            .ok_or_else(|| DeskError::token_not_found(asset_id))
    }

    /// Registered + active, the gate for new consignments and offers.
    pub(crate) fn get_active_token_entry(&self, asset_id: &str) -> Result<&TokenEntry, DeskError> {
        let entry = self.get_token_entry(asset_id)?;
        if !entry.is_active {
            return Err(DeskError::InvalidState(format!(
                "Asset {} is not active",
                asset_id
            )));
        }
        Ok(entry)
    }
}
