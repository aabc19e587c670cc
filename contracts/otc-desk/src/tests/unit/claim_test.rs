use crate::tests::test_utils::*;
use crate::*;
use near_sdk::testing_env;

fn paid_offer() -> (Contract, u64, u64) {
    let (mut contract, _asset_id, cid) = desk_with_fixed_consignment();
    let oid = fixed_usdc_offer(&mut contract, cid);
    contract
        .internal_fulfill_offer(&buyer(), oid, DEAL_PAYMENT_USDC, BASE_SECS + 100)
        .unwrap();
    (contract, cid, oid)
}

// --- Claim ---

#[test]
fn claim_before_unlock_fails() {
    let (mut contract, _cid, oid) = paid_offer();
    let err = contract
        .internal_claim(oid, BASE_SECS + THIRTY_DAYS_SECS - 1)
        .unwrap_err();
    assert!(matches!(err, DeskError::InvalidState(_)));
}

#[test]
fn claim_at_unlock_releases_tokens() {
    let (mut contract, _cid, oid) = paid_offer();
    let (entry, beneficiary, amount) = contract
        .internal_claim(oid, BASE_SECS + THIRTY_DAYS_SECS)
        .unwrap();
    assert_eq!(entry.token_account, token_account());
    assert_eq!(beneficiary, buyer());
    assert_eq!(amount, DEAL_AMOUNT);

    let offer = contract.get_offer(oid).unwrap();
    assert!(offer.fulfilled);
    assert_eq!(offer.status(), OfferStatus::Fulfilled);
}

#[test]
fn claim_twice_fails() {
    let (mut contract, _cid, oid) = paid_offer();
    contract
        .internal_claim(oid, BASE_SECS + THIRTY_DAYS_SECS)
        .unwrap();
    let err = contract
        .internal_claim(oid, BASE_SECS + THIRTY_DAYS_SECS + 1)
        .unwrap_err();
    assert!(matches!(err, DeskError::InvalidState(_)));
}

#[test]
fn claim_unpaid_offer_fails() {
    let (mut contract, _asset_id, cid) = desk_with_fixed_consignment();
    let oid = fixed_usdc_offer(&mut contract, cid);
    let err = contract
        .internal_claim(oid, BASE_SECS + THIRTY_DAYS_SECS)
        .unwrap_err();
    assert!(matches!(err, DeskError::InvalidState(_)));
}

#[test]
fn anyone_may_trigger_a_claim() {
    let (mut contract, _cid, oid) = paid_offer();
    // payout destination is the beneficiary regardless of the caller
    testing_env!(get_context(stranger())
        .block_timestamp(TEST_BASE_TIMESTAMP + THIRTY_DAYS_SECS * 1_000_000_000)
        .build());
    contract.claim(oid).unwrap();
    assert!(contract.get_offer(oid).unwrap().fulfilled);
}

#[test]
fn zero_lockup_is_claimable_immediately() {
    let mut contract = new_desk();
    register_asset(&mut contract, 0);
    register_usdc(&mut contract);
    let cid = contract
        .internal_create_consignment(
            &consigner(),
            &token_account(),
            CONSIGN_AMOUNT,
            fixed_terms(1_000, 0),
            BASE_SECS,
        )
        .unwrap();
    let oid = contract
        .internal_create_offer(
            &buyer(),
            cid,
            DEAL_AMOUNT,
            1_000,
            usdc_currency(),
            0,
            0,
            BASE_SECS,
        )
        .unwrap();
    contract
        .internal_fulfill_offer(&buyer(), oid, DEAL_PAYMENT_USDC, BASE_SECS + 100)
        .unwrap();
    contract.internal_claim(oid, BASE_SECS + 100).unwrap();
}

// --- Auto-claim ---

#[test]
fn auto_claim_takes_matured_subset() {
    let (mut contract, _asset_id, cid) = desk_with_fixed_consignment();
    register_usdc(&mut contract);
    let mut oids = Vec::new();
    for _ in 0..2 {
        let oid = contract
            .internal_create_offer(
                &buyer(),
                cid,
                DEAL_AMOUNT,
                1_000,
                usdc_currency(),
                THIRTY_DAYS_SECS,
                0,
                BASE_SECS,
            )
            .unwrap();
        contract
            .internal_fulfill_offer(&buyer(), oid, DEAL_PAYMENT_USDC, BASE_SECS + 100)
            .unwrap();
        oids.push(oid);
    }

    testing_env!(get_context(agent())
        .block_timestamp(TEST_BASE_TIMESTAMP + (THIRTY_DAYS_SECS + 1) * 1_000_000_000)
        .build());
    // an unknown id is skipped, not fatal
    let claimed = contract
        .auto_claim(vec![oids[0], 999, oids[1]])
        .unwrap();
    assert_eq!(claimed, vec![oids[0], oids[1]]);

    // nothing left to claim on a second sweep
    let claimed = contract.auto_claim(vec![oids[0], oids[1]]).unwrap();
    assert!(claimed.is_empty());
}

#[test]
fn auto_claim_requires_approver_and_bounded_batch() {
    let (mut contract, _cid, oid) = paid_offer();

    testing_env!(get_context(stranger()).build());
    let err = contract.auto_claim(vec![oid]).unwrap_err();
    assert!(matches!(err, DeskError::Unauthorized(_)));

    testing_env!(get_context(agent()).build());
    let err = contract.auto_claim((0..11).collect()).unwrap_err();
    assert!(matches!(err, DeskError::InvalidInput(_)));
}

// --- Emergency refund ---

const NINETY_DAYS: u64 = EMERGENCY_REFUND_DELAY_SECS;

#[test]
fn emergency_refund_before_delay_fails() {
    let (mut contract, _cid, oid) = paid_offer();
    let err = contract
        .internal_emergency_refund(&buyer(), oid, BASE_SECS + NINETY_DAYS - 1)
        .unwrap_err();
    assert!(matches!(err, DeskError::InvalidState(_)));
}

#[test]
fn emergency_refund_unwinds_payment() {
    let (mut contract, cid, oid) = paid_offer();
    let (currency, payer, amount) = contract
        .internal_emergency_refund(&buyer(), oid, BASE_SECS + NINETY_DAYS)
        .unwrap();
    assert_eq!(currency, usdc_currency());
    assert_eq!(payer, buyer());
    assert_eq!(amount, DEAL_PAYMENT_USDC);

    // terminally marked, inventory restored, proceeds unwound
    let offer = contract.get_offer(oid).unwrap();
    assert!(offer.cancelled);
    assert_eq!(offer.status(), OfferStatus::Cancelled);
    assert_eq!(
        contract.get_consignment(cid).unwrap().remaining_amount,
        CONSIGN_AMOUNT
    );
    assert_eq!(contract.proceeds_of(consigner(), usdc_currency()).0, 0);
}

#[test]
fn emergency_refund_restricted_to_parties() {
    let (mut contract, _cid, oid) = paid_offer();
    let err = contract
        .internal_emergency_refund(&stranger(), oid, BASE_SECS + NINETY_DAYS)
        .unwrap_err();
    assert!(matches!(err, DeskError::Unauthorized(_)));

    // any desk role or offer party may trigger it
    contract
        .internal_emergency_refund(&agent(), oid, BASE_SECS + NINETY_DAYS)
        .unwrap();
}

#[test]
fn emergency_refund_after_claim_fails() {
    let (mut contract, _cid, oid) = paid_offer();
    contract
        .internal_claim(oid, BASE_SECS + THIRTY_DAYS_SECS)
        .unwrap();
    let err = contract
        .internal_emergency_refund(&buyer(), oid, BASE_SECS + NINETY_DAYS)
        .unwrap_err();
    assert!(matches!(err, DeskError::InvalidState(_)));
}

#[test]
fn refunded_offer_cannot_be_claimed() {
    let (mut contract, _cid, oid) = paid_offer();
    contract
        .internal_emergency_refund(&buyer(), oid, BASE_SECS + NINETY_DAYS)
        .unwrap();
    let err = contract
        .internal_claim(oid, BASE_SECS + NINETY_DAYS + 1)
        .unwrap_err();
    assert!(matches!(err, DeskError::InvalidState(_)));
}
