use crate::tests::test_utils::*;
use crate::*;
use near_sdk::testing_env;

#[test]
fn register_token_derives_asset_id() {
    let mut contract = new_desk();
    let asset_id = register_asset(&mut contract, 0);
    assert_eq!(asset_id, crate::registry::asset_id_for(&token_account()));
    assert_eq!(asset_id.len(), 64); // hex sha256

    let entry = contract.get_token(asset_id).expect("registered");
    assert_eq!(entry.token_account, token_account());
    assert_eq!(entry.decimals, 6);
    assert!(entry.is_active);
    assert!(!entry.is_usd_stable);
}

#[test]
fn register_token_rejects_duplicate() {
    let mut contract = new_desk();
    register_asset(&mut contract, 0);

    testing_env!(get_context(owner()).build());
    let err = contract
        .register_token(
            token_account(),
            6,
            false,
            OracleConfig {
                pool: pool_account(),
                quote: QuoteAsset::UsdStable,
            },
        )
        .unwrap_err();
    assert!(matches!(err, DeskError::InvalidInput(_)));
}

#[test]
fn register_token_requires_owner() {
    let mut contract = new_desk();
    testing_env!(get_context(stranger()).build());
    let err = contract
        .register_token(
            token_account(),
            6,
            false,
            OracleConfig {
                pool: pool_account(),
                quote: QuoteAsset::UsdStable,
            },
        )
        .unwrap_err();
    assert!(matches!(err, DeskError::Unauthorized(_)));
}

#[test]
fn deactivated_token_blocks_new_consignments() {
    let mut contract = new_desk();
    let asset_id = register_asset(&mut contract, 0);

    testing_env!(get_context(owner()).build());
    contract.set_token_active(asset_id.clone(), false).unwrap();

    let err = contract
        .internal_create_consignment(
            &consigner(),
            &token_account(),
            CONSIGN_AMOUNT,
            fixed_terms(1_000, 30),
            BASE_SECS,
        )
        .unwrap_err();
    assert!(matches!(err, DeskError::InvalidState(_)));

    contract.set_token_active(asset_id, true).unwrap();
    contract
        .internal_create_consignment(
            &consigner(),
            &token_account(),
            CONSIGN_AMOUNT,
            fixed_terms(1_000, 30),
            BASE_SECS,
        )
        .unwrap();
}

#[test]
fn set_token_active_unknown_asset_fails() {
    let mut contract = new_desk();
    testing_env!(get_context(owner()).build());
    let err = contract
        .set_token_active("deadbeef".to_string(), false)
        .unwrap_err();
    assert!(matches!(err, DeskError::NotFound(_)));
}

#[test]
fn unregistered_asset_cannot_be_consigned() {
    let mut contract = new_desk();
    let err = contract
        .internal_create_consignment(
            &consigner(),
            &token_account(),
            CONSIGN_AMOUNT,
            fixed_terms(1_000, 30),
            BASE_SECS,
        )
        .unwrap_err();
    assert!(matches!(err, DeskError::NotFound(_)));
}
