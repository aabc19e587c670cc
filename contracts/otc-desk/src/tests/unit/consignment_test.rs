use crate::tests::test_utils::*;
use crate::*;
use near_sdk::json_types::U128;
use near_sdk::{testing_env, NearToken};

// --- Creation ---

#[test]
fn create_consignment_stores_record() {
    let (contract, asset_id, cid) = desk_with_fixed_consignment();
    assert_eq!(cid, 1);
    assert_eq!(contract.next_consignment_id, 2);

    let c = contract.get_consignment(cid).expect("exists");
    assert_eq!(c.asset_id, asset_id);
    assert_eq!(c.consigner, consigner());
    assert_eq!(c.total_amount, CONSIGN_AMOUNT);
    assert_eq!(c.remaining_amount, CONSIGN_AMOUNT);
    assert!(!c.is_negotiable);
    assert_eq!(c.fixed_discount_bps, 1_000);
    assert_eq!(c.fixed_lockup_days, 30);
    assert!(c.is_active);
}

#[test]
fn create_consignment_rejects_zero_amount() {
    let mut contract = new_desk();
    register_asset(&mut contract, 0);
    let err = contract
        .internal_create_consignment(
            &consigner(),
            &token_account(),
            0,
            fixed_terms(1_000, 30),
            BASE_SECS,
        )
        .unwrap_err();
    assert!(matches!(err, DeskError::InvalidInput(_)));
}

// --- Terms validation ---

#[test]
fn fixed_terms_reject_range_fields() {
    let mut contract = new_desk();
    register_asset(&mut contract, 0);
    let mut terms = fixed_terms(1_000, 30);
    terms.min_discount_bps = Some(100);
    let err = contract
        .internal_create_consignment(&consigner(), &token_account(), 1_000, terms, BASE_SECS)
        .unwrap_err();
    assert!(matches!(err, DeskError::InvalidInput(_)));
}

#[test]
fn negotiable_terms_reject_fixed_fields() {
    let mut contract = new_desk();
    register_asset(&mut contract, 0);
    let mut terms = negotiable_terms();
    terms.fixed_discount_bps = Some(1_000);
    let err = contract
        .internal_create_consignment(&consigner(), &token_account(), 1_000, terms, BASE_SECS)
        .unwrap_err();
    assert!(matches!(err, DeskError::InvalidInput(_)));
}

#[test]
fn negotiable_terms_require_complete_ranges() {
    let mut contract = new_desk();
    register_asset(&mut contract, 0);
    let mut terms = negotiable_terms();
    terms.max_lockup_days = None;
    let err = contract
        .internal_create_consignment(&consigner(), &token_account(), 1_000, terms, BASE_SECS)
        .unwrap_err();
    assert!(matches!(err, DeskError::InvalidInput(_)));
}

#[test]
fn inverted_ranges_rejected() {
    let mut contract = new_desk();
    register_asset(&mut contract, 0);
    let mut terms = negotiable_terms();
    terms.min_discount_bps = Some(2_000);
    terms.max_discount_bps = Some(100);
    let err = contract
        .internal_create_consignment(&consigner(), &token_account(), 1_000, terms, BASE_SECS)
        .unwrap_err();
    assert!(matches!(err, DeskError::InvalidInput(_)));
}

#[test]
fn full_discount_rejected() {
    let mut contract = new_desk();
    register_asset(&mut contract, 0);
    let err = contract
        .internal_create_consignment(
            &consigner(),
            &token_account(),
            1_000,
            fixed_terms(10_000, 30),
            BASE_SECS,
        )
        .unwrap_err();
    assert!(matches!(err, DeskError::InvalidInput(_)));
}

#[test]
fn inverted_deal_bounds_rejected() {
    let mut contract = new_desk();
    register_asset(&mut contract, 0);
    let mut terms = fixed_terms(1_000, 30);
    terms.min_deal_amount = U128(100);
    terms.max_deal_amount = U128(10);
    let err = contract
        .internal_create_consignment(&consigner(), &token_account(), 1_000, terms, BASE_SECS)
        .unwrap_err();
    assert!(matches!(err, DeskError::InvalidInput(_)));
}

// --- Top-up ---

#[test]
fn top_up_grows_inventory() {
    let (mut contract, _asset_id, cid) = desk_with_fixed_consignment();
    contract
        .internal_top_up_consignment(&consigner(), &token_account(), cid, 500)
        .unwrap();
    let c = contract.get_consignment(cid).unwrap();
    assert_eq!(c.total_amount, CONSIGN_AMOUNT + 500);
    assert_eq!(c.remaining_amount, CONSIGN_AMOUNT + 500);
}

#[test]
fn top_up_requires_consigner() {
    let (mut contract, _asset_id, cid) = desk_with_fixed_consignment();
    let err = contract
        .internal_top_up_consignment(&stranger(), &token_account(), cid, 500)
        .unwrap_err();
    assert!(matches!(err, DeskError::Unauthorized(_)));
}

#[test]
fn top_up_rejects_wrong_asset() {
    let (mut contract, _asset_id, cid) = desk_with_fixed_consignment();
    register_usdc(&mut contract);
    let err = contract
        .internal_top_up_consignment(&consigner(), &usdc_account(), cid, 500)
        .unwrap_err();
    assert!(matches!(err, DeskError::InvalidInput(_)));
}

// --- Withdrawal ---

#[test]
fn withdraw_returns_remaining_and_deactivates() {
    let (mut contract, _asset_id, cid) = desk_with_fixed_consignment();
    let (_entry, to, amount) = contract
        .internal_withdraw_consignment(&consigner(), cid)
        .unwrap();
    assert_eq!(to, consigner());
    assert_eq!(amount, CONSIGN_AMOUNT);

    let c = contract.get_consignment(cid).unwrap();
    assert_eq!(c.remaining_amount, 0);
    assert!(!c.is_active);

    let err = contract
        .internal_withdraw_consignment(&consigner(), cid)
        .unwrap_err();
    assert!(matches!(err, DeskError::InvalidState(_)));
}

#[test]
fn withdraw_requires_consigner() {
    let (mut contract, _asset_id, cid) = desk_with_fixed_consignment();
    let err = contract
        .internal_withdraw_consignment(&stranger(), cid)
        .unwrap_err();
    assert!(matches!(err, DeskError::Unauthorized(_)));
}

// --- Bond ---

#[test]
fn bond_reserved_on_create_and_released_on_withdraw() {
    let mut contract = new_desk();
    register_asset(&mut contract, 0);
    let bond = NearToken::from_near(5).as_yoctonear();
    testing_env!(get_context(owner()).build());
    contract
        .set_limits(U128(100 * PRICE_ONE_USD_E8), 600, 3_600, U128(bond))
        .unwrap();

    // no bond on deposit yet
    let err = contract
        .internal_create_consignment(
            &consigner(),
            &token_account(),
            CONSIGN_AMOUNT,
            fixed_terms(1_000, 30),
            BASE_SECS,
        )
        .unwrap_err();
    assert!(matches!(err, DeskError::InvalidInput(_)));

    testing_env!(get_context(consigner())
        .attached_deposit(NearToken::from_yoctonear(bond))
        .build());
    contract.deposit_bond();
    assert_eq!(contract.bond_of(consigner()).0, bond);

    let cid = contract
        .internal_create_consignment(
            &consigner(),
            &token_account(),
            CONSIGN_AMOUNT,
            fixed_terms(1_000, 30),
            BASE_SECS,
        )
        .unwrap();
    assert_eq!(contract.bond_of(consigner()).0, 0);
    assert_eq!(contract.get_consignment(cid).unwrap().bond, bond);

    contract
        .internal_withdraw_consignment(&consigner(), cid)
        .unwrap();
    assert_eq!(contract.bond_of(consigner()).0, bond);
}

#[test]
fn withdraw_bond_checks_balance() {
    let mut contract = new_desk();
    testing_env!(get_context(consigner())
        .attached_deposit(NearToken::from_near(1))
        .build());
    contract.deposit_bond();

    testing_env!(get_context(consigner()).build());
    let err = contract
        .withdraw_bond(U128(NearToken::from_near(2).as_yoctonear()))
        .unwrap_err();
    assert!(matches!(err, DeskError::InvalidInput(_)));

    contract
        .withdraw_bond(U128(NearToken::from_near(1).as_yoctonear()))
        .unwrap();
    assert_eq!(contract.bond_of(consigner()).0, 0);
}
