//! Price Oracle Adapter.
//!
//! Wraps keeper-posted pool observations (time-weighted log-prices) plus a
//! native/USD reference feed into a single manipulation-resistant USD price
//! with 8-decimal fixed-point precision. Averaging windows are tried in a
//! fixed descending sequence; the first window with enough pool history wins.
//! Every failure mode is a hard `DeskError::Oracle`; a price is never
//! silently substituted.

use near_sdk::json_types::U128;
use near_sdk::{env, near, AccountId};
use primitive_types::U256;

use crate::events::DeskEvent;
use crate::*;

const ONE_E18: u128 = 1_000_000_000_000_000_000;
/// 1.0001 in 1e18 fixed point; ticks are log base 1.0001.
const TICK_BASE_E18: u128 = 1_000_100_000_000_000_000;

/// `1.0001^tick` as an 8-decimal price ratio, by binary exponentiation in
/// 1e18 fixed point over U256. |tick| is bounded by `MAX_TICK_ABS`, which
/// keeps every intermediate product inside U256.
pub(crate) fn tick_to_ratio_e8(tick: i32) -> Result<u128, DeskError> {
    if tick.unsigned_abs() > MAX_TICK_ABS.unsigned_abs() {
        return Err(DeskError::Oracle("invalid price: tick out of range".into()));
    }
    let one = U256::from(ONE_E18);
    let mut base = U256::from(TICK_BASE_E18);
    let mut exp = tick.unsigned_abs();
    let mut acc = one;
    while exp > 0 {
        if exp & 1 == 1 {
            acc = acc * base / one;
        }
        base = base * base / one;
        exp >>= 1;
    }
    let ratio_e18 = if tick >= 0 { acc } else { one * one / acc };
    // scale 1e18 → 1e8
    let ratio_e8 = ratio_e18 / U256::from(10_000_000_000u64);
    u128::try_from(ratio_e8).map_err(|_| DeskError::overflow())
}

#[near]
impl Contract {
    /// Keeper-gated (owner, agent, or approver). Appends one pool observation
    /// for the asset; the ring keeps the newest `MAX_OBSERVATIONS`.
    #[handle_result]
    pub fn record_pool_observation(&mut self, asset_id: String, tick: i32) -> Result<(), DeskError> {
        let caller = env::predecessor_account_id();
        self.internal_record_observation(&caller, &asset_id, tick, now_secs())
    }

    /// Keeper-gated native/USD reference price, sanity-bounded on write.
    #[handle_result]
    pub fn record_native_usd_price(&mut self, price_e8: U128) -> Result<(), DeskError> {
        let caller = env::predecessor_account_id();
        self.internal_record_native_price(&caller, price_e8.0, now_secs())
    }
}

impl Contract {
    pub(crate) fn check_keeper(&self, caller: &AccountId) -> Result<(), DeskError> {
        if caller != &self.owner_id && !self.is_approver(caller) {
            return Err(DeskError::Unauthorized(
                "Only the owner, agent, or an approver may post prices".into(),
            ));
        }
        Ok(())
    }

    pub(crate) fn internal_record_observation(
        &mut self,
        caller: &AccountId,
        asset_id: &str,
        tick: i32,
        now: u64,
    ) -> Result<(), DeskError> {
        self.check_keeper(caller)?;
        if tick.unsigned_abs() > MAX_TICK_ABS.unsigned_abs() {
            return Err(DeskError::Oracle("invalid price: tick out of range".into()));
        }
        let entry = self
            .tokens
            .get_mut(asset_id)
            .ok_or_else(|| DeskError::token_not_found(asset_id))?;
        if let Some(last) = entry.observations.last() {
            if last.timestamp_secs > now {
                return Err(DeskError::InvalidInput(
                    "Observation older than pool history".into(),
                ));
            }
        }
        entry.observations.push(PoolObservation {
            timestamp_secs: now,
            tick,
        });
        if entry.observations.len() > MAX_OBSERVATIONS {
            entry.observations.remove(0);
        }
        DeskEvent::PoolObservationRecorded {
            asset_id: asset_id.to_string(),
            tick,
            timestamp_secs: now,
        }
        .emit();
        Ok(())
    }

    pub(crate) fn internal_record_native_price(
        &mut self,
        caller: &AccountId,
        price_e8: u128,
        now: u64,
    ) -> Result<(), DeskError> {
        self.check_keeper(caller)?;
        if price_e8 == 0 {
            return Err(DeskError::Oracle("invalid price".into()));
        }
        if price_e8 < MIN_NATIVE_USD_PRICE_E8 {
            return Err(DeskError::Oracle("price too low".into()));
        }
        if price_e8 > MAX_NATIVE_USD_PRICE_E8 {
            return Err(DeskError::Oracle("price too high".into()));
        }
        self.native_usd_price_e8 = price_e8;
        self.native_price_updated_at_secs = now;
        DeskEvent::NativePriceRecorded {
            price_e8: U128(price_e8),
            timestamp_secs: now,
        }
        .emit();
        Ok(())
    }

    /// Fresh native/USD price or an oracle error; never a default.
    pub(crate) fn native_usd_live_e8(&self, now: u64) -> Result<u128, DeskError> {
        if self.native_usd_price_e8 == 0 {
            return Err(DeskError::Oracle("invalid price: native feed unset".into()));
        }
        if now.saturating_sub(self.native_price_updated_at_secs) > self.max_price_age_secs {
            return Err(DeskError::Oracle("invalid price: native feed stale".into()));
        }
        Ok(self.native_usd_price_e8)
    }

    /// Pool-relative TWAP. Windows from `TWAP_WINDOWS_SECS` are tried longest
    /// first; a window qualifies when it holds at least
    /// `MIN_OBSERVATIONS_PER_WINDOW` observations and its oldest in-window
    /// observation reaches back past the window's midpoint, so a young pool
    /// falls back to a shorter window instead of averaging a sliver. The
    /// mean tick (truncating division) is exponentiated to a linear
    /// 8-decimal ratio in quote units.
    pub(crate) fn twap_quote_ratio_e8(
        &self,
        entry: &TokenEntry,
        now: u64,
    ) -> Result<u128, DeskError> {
        for window in TWAP_WINDOWS_SECS {
            let cutoff = now.saturating_sub(window);
            let midpoint = now.saturating_sub(window / 2);
            let mut sum: i64 = 0;
            let mut count: i64 = 0;
            let mut oldest = u64::MAX;
            for obs in entry.observations.iter().rev() {
                if obs.timestamp_secs < cutoff {
                    break;
                }
                sum += obs.tick as i64;
                count += 1;
                oldest = obs.timestamp_secs;
            }
            if count as usize >= MIN_OBSERVATIONS_PER_WINDOW && oldest <= midpoint {
                let mean_tick = (sum / count) as i32;
                return tick_to_ratio_e8(mean_tick);
            }
        }
        Err(DeskError::Oracle("no valid observation".into()))
    }

    /// The asset's manipulation-resistant USD price (8 decimals): TWAP ratio
    /// converted through the quote asset, then sanity-bounded.
    pub(crate) fn live_usd_price_e8(&self, entry: &TokenEntry, now: u64) -> Result<u128, DeskError> {
        let ratio_e8 = self.twap_quote_ratio_e8(entry, now)?;
        let usd_e8 = match entry.oracle.quote {
            QuoteAsset::UsdStable => ratio_e8,
            QuoteAsset::Native => {
                let native = self.native_usd_live_e8(now)?;
                mul_div(ratio_e8, native, PRICE_ONE_USD_E8)?
            }
        };
        if usd_e8 == 0 {
            return Err(DeskError::Oracle("invalid price".into()));
        }
        if usd_e8 < MIN_TOKEN_USD_PRICE_E8 {
            return Err(DeskError::Oracle("price too low".into()));
        }
        if usd_e8 > MAX_TOKEN_USD_PRICE_E8 {
            return Err(DeskError::Oracle("price too high".into()));
        }
        Ok(usd_e8)
    }

    /// USD price of one settlement-currency unit scale (8 decimals):
    /// native via the reference feed, USD-pegged stables at exactly $1,
    /// any other registered asset via its own TWAP.
    pub(crate) fn currency_usd_price_e8(
        &self,
        currency: &SettlementCurrency,
        now: u64,
    ) -> Result<u128, DeskError> {
        match currency {
            SettlementCurrency::Native => self.native_usd_live_e8(now),
            SettlementCurrency::Token(asset_id) => {
                let entry = self.get_active_token_entry(asset_id)?;
                if entry.is_usd_stable {
                    Ok(PRICE_ONE_USD_E8)
                } else {
                    self.live_usd_price_e8(entry, now)
                }
            }
        }
    }

    /// Converts a USD value (8 decimals) into settlement-currency units,
    /// rounding up: the desk never undercollects.
    pub(crate) fn usd_to_currency_amount(
        &self,
        usd_e8: u128,
        currency: &SettlementCurrency,
        currency_usd_e8: u128,
    ) -> Result<u128, DeskError> {
        match currency {
            SettlementCurrency::Native => {
                mul_div_ceil(usd_e8, YOCTO_PER_NEAR, currency_usd_e8)
            }
            SettlementCurrency::Token(asset_id) => {
                let entry = self.get_token_entry(asset_id)?;
                mul_div_ceil(usd_e8, pow10(entry.decimals as u32), currency_usd_e8)
            }
        }
    }
}
