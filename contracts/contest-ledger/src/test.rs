#![cfg(test)]
use super::*;
use soroban_sdk::{testutils::Address as _, Address, BytesN, Env};

// ─── helpers ─────────────────────────────────────────────────────────────────

fn setup(env: &Env) -> (ContestLedgerContractClient, Address) {
    let admin = Address::generate(env);

    let contract_id = env.register_contract(None, ContestLedgerContract);
    let client = ContestLedgerContractClient::new(env, &contract_id);
    client.initialize(&admin);

    (client, admin)
}

fn tx(env: &Env, seed: u8) -> BytesN<32> {
    BytesN::from_array(env, &[seed; 32])
}

// ─── allocate (pure) ─────────────────────────────────────────────────────────

#[test]
fn test_allocate_entry_fee_split() {
    // $5 entry fee → $2 platform, $3 prize pool
    assert_eq!(allocate(&TransactionKind::EntryFee, 500), (200, 300));
}

#[test]
fn test_allocate_addon_split() {
    // $10 pin → $2 platform, $8 prize pool
    assert_eq!(allocate(&TransactionKind::SubmissionPin, 1_000), (200, 800));
    assert_eq!(allocate(&TransactionKind::VoteMultiplier, 1_000), (200, 800));
    assert_eq!(allocate(&TransactionKind::ProfileBoost, 1_000), (200, 800));
}

#[test]
fn test_allocate_remainder_favors_pool() {
    // 101 * 40% = 40.4 → platform floored to 40, pool gets the remainder
    let (platform, pool) = allocate(&TransactionKind::EntryFee, 101);
    assert_eq!(platform, 40);
    assert_eq!(pool, 61);
}

#[test]
fn test_allocate_sum_invariant() {
    let kinds = [
        TransactionKind::EntryFee,
        TransactionKind::SubmissionPin,
        TransactionKind::VoteMultiplier,
        TransactionKind::ProfileBoost,
    ];
    for kind in kinds.iter() {
        for amount in [1i128, 3, 99, 101, 500, 1_234_567] {
            let (platform, pool) = allocate(kind, amount);
            assert_eq!(platform + pool, amount);
            assert!(platform >= 0 && pool >= 0);
        }
    }
}

// ─── initialize ──────────────────────────────────────────────────────────────

#[test]
#[should_panic(expected = "already initialized")]
fn test_initialize_twice() {
    let env = Env::default();
    env.mock_all_auths();
    let (client, admin) = setup(&env);

    client.initialize(&admin);
}

// ─── open_contest ────────────────────────────────────────────────────────────

#[test]
fn test_open_contest() {
    let env = Env::default();
    env.mock_all_auths();
    let (client, admin) = setup(&env);

    client.open_contest(&admin, &1u64);

    let snapshot = client.get_snapshot(&1u64).unwrap();
    assert_eq!(snapshot.total_revenue, 0);
    assert_eq!(snapshot.prize_pool, 0);
    assert_eq!(snapshot.tx_count, 0);
    assert!(snapshot.accepting);
}

#[test]
#[should_panic(expected = "contest already open")]
fn test_open_contest_twice() {
    let env = Env::default();
    env.mock_all_auths();
    let (client, admin) = setup(&env);

    client.open_contest(&admin, &1u64);
    client.open_contest(&admin, &1u64);
}

#[test]
#[should_panic(expected = "unauthorized")]
fn test_open_contest_unauthorized() {
    let env = Env::default();
    env.mock_all_auths();
    let (client, _) = setup(&env);
    let stranger = Address::generate(&env);

    client.open_contest(&stranger, &1u64);
}

// ─── record_transaction ──────────────────────────────────────────────────────

#[test]
fn test_record_transaction_updates_snapshot() {
    let env = Env::default();
    env.mock_all_auths();
    let (client, admin) = setup(&env);
    client.open_contest(&admin, &1u64);

    let snapshot = client.record_transaction(
        &admin,
        &tx(&env, 1),
        &1u64,
        &TransactionKind::EntryFee,
        &500i128,
        &PaymentRail::Card,
    );

    assert_eq!(snapshot.total_revenue, 500);
    assert_eq!(snapshot.platform_cut, 200);
    assert_eq!(snapshot.prize_pool, 300);
    assert_eq!(snapshot.entry_fee_total, 500);
    assert_eq!(snapshot.tx_count, 1);

    let record = client.get_transaction(&tx(&env, 1)).unwrap();
    assert_eq!(record.contest_id, 1);
    assert_eq!(record.amount, 500);
    assert_eq!(record.platform_cut, 200);
    assert_eq!(record.prize_pool, 300);
    assert!(matches!(record.rail, PaymentRail::Card));
}

#[test]
fn test_record_transaction_breakdown_by_kind() {
    let env = Env::default();
    env.mock_all_auths();
    let (client, admin) = setup(&env);
    client.open_contest(&admin, &1u64);

    client.record_transaction(&admin, &tx(&env, 1), &1u64, &TransactionKind::EntryFee, &500i128, &PaymentRail::Card);
    client.record_transaction(&admin, &tx(&env, 2), &1u64, &TransactionKind::SubmissionPin, &1_000i128, &PaymentRail::OnChain);
    client.record_transaction(&admin, &tx(&env, 3), &1u64, &TransactionKind::VoteMultiplier, &300i128, &PaymentRail::Card);
    client.record_transaction(&admin, &tx(&env, 4), &1u64, &TransactionKind::ProfileBoost, &200i128, &PaymentRail::Card);

    let snapshot = client.get_snapshot(&1u64).unwrap();
    assert_eq!(snapshot.entry_fee_total, 500);
    assert_eq!(snapshot.pin_total, 1_000);
    assert_eq!(snapshot.multiplier_total, 300);
    assert_eq!(snapshot.boost_total, 200);
    assert_eq!(snapshot.total_revenue, 2_000);
    // 200 + 200 + 60 + 40 platform; remainder in the pool
    assert_eq!(snapshot.platform_cut, 500);
    assert_eq!(snapshot.prize_pool, 1_500);
    assert_eq!(snapshot.tx_count, 4);
}

#[test]
fn test_record_transaction_replay_is_noop() {
    let env = Env::default();
    env.mock_all_auths();
    let (client, admin) = setup(&env);
    client.open_contest(&admin, &1u64);

    client.record_transaction(&admin, &tx(&env, 1), &1u64, &TransactionKind::EntryFee, &500i128, &PaymentRail::Card);
    // redelivery of the same capture event
    let snapshot = client.record_transaction(
        &admin,
        &tx(&env, 1),
        &1u64,
        &TransactionKind::EntryFee,
        &500i128,
        &PaymentRail::Card,
    );

    assert_eq!(snapshot.total_revenue, 500);
    assert_eq!(snapshot.tx_count, 1);
}

#[test]
#[should_panic(expected = "invalid amount")]
fn test_record_transaction_zero_amount() {
    let env = Env::default();
    env.mock_all_auths();
    let (client, admin) = setup(&env);
    client.open_contest(&admin, &1u64);

    client.record_transaction(&admin, &tx(&env, 1), &1u64, &TransactionKind::EntryFee, &0i128, &PaymentRail::Card);
}

#[test]
#[should_panic(expected = "contest not accepting revenue")]
fn test_record_transaction_unknown_contest() {
    let env = Env::default();
    env.mock_all_auths();
    let (client, admin) = setup(&env);

    client.record_transaction(&admin, &tx(&env, 1), &9u64, &TransactionKind::EntryFee, &500i128, &PaymentRail::Card);
}

#[test]
#[should_panic(expected = "unauthorized")]
fn test_record_transaction_unauthorized() {
    let env = Env::default();
    env.mock_all_auths();
    let (client, admin) = setup(&env);
    client.open_contest(&admin, &1u64);
    let stranger = Address::generate(&env);

    client.record_transaction(&stranger, &tx(&env, 1), &1u64, &TransactionKind::EntryFee, &500i128, &PaymentRail::Card);
}

// ─── entry-fee validation against the catalog ────────────────────────────────

#[test]
fn test_record_entry_fee_with_catalog() {
    let env = Env::default();
    env.mock_all_auths();
    let (client, admin) = setup(&env);
    client.open_contest(&admin, &1u64);

    let catalog_id = env.register_contract(None, collaborators::EntryTiersContract);
    client.set_tier_catalog(&admin, &catalog_id);

    let snapshot = client.record_transaction(
        &admin,
        &tx(&env, 1),
        &1u64,
        &TransactionKind::EntryFee,
        &1_200i128,
        &PaymentRail::Card,
    );
    assert_eq!(snapshot.entry_fee_total, 1_200);
}

#[test]
#[should_panic(expected = "entry fee mismatch")]
fn test_record_entry_fee_mismatch() {
    let env = Env::default();
    env.mock_all_auths();
    let (client, admin) = setup(&env);
    client.open_contest(&admin, &1u64);

    let catalog_id = env.register_contract(None, collaborators::EntryTiersContract);
    client.set_tier_catalog(&admin, &catalog_id);

    client.record_transaction(&admin, &tx(&env, 1), &1u64, &TransactionKind::EntryFee, &777i128, &PaymentRail::Card);
}

#[test]
fn test_addon_amounts_skip_fee_check() {
    let env = Env::default();
    env.mock_all_auths();
    let (client, admin) = setup(&env);
    client.open_contest(&admin, &1u64);

    let catalog_id = env.register_contract(None, collaborators::EntryTiersContract);
    client.set_tier_catalog(&admin, &catalog_id);

    // pins are freely priced; the catalog only constrains entry fees
    let snapshot = client.record_transaction(
        &admin,
        &tx(&env, 1),
        &1u64,
        &TransactionKind::SubmissionPin,
        &777i128,
        &PaymentRail::OnChain,
    );
    assert_eq!(snapshot.pin_total, 777);
}

// ─── close_contest ───────────────────────────────────────────────────────────

#[test]
#[should_panic(expected = "contest not accepting revenue")]
fn test_record_after_close() {
    let env = Env::default();
    env.mock_all_auths();
    let (client, admin) = setup(&env);
    client.open_contest(&admin, &1u64);

    client.record_transaction(&admin, &tx(&env, 1), &1u64, &TransactionKind::EntryFee, &500i128, &PaymentRail::Card);
    client.close_contest(&admin, &1u64);
    client.record_transaction(&admin, &tx(&env, 2), &1u64, &TransactionKind::EntryFee, &500i128, &PaymentRail::Card);
}

#[test]
fn test_close_preserves_totals() {
    let env = Env::default();
    env.mock_all_auths();
    let (client, admin) = setup(&env);
    client.open_contest(&admin, &1u64);

    client.record_transaction(&admin, &tx(&env, 1), &1u64, &TransactionKind::EntryFee, &500i128, &PaymentRail::Card);
    client.close_contest(&admin, &1u64);

    let snapshot = client.get_snapshot(&1u64).unwrap();
    assert!(!snapshot.accepting);
    assert_eq!(snapshot.prize_pool, 300);
}

#[test]
#[should_panic(expected = "contest already closed")]
fn test_close_contest_twice() {
    let env = Env::default();
    env.mock_all_auths();
    let (client, admin) = setup(&env);
    client.open_contest(&admin, &1u64);

    client.close_contest(&admin, &1u64);
    client.close_contest(&admin, &1u64);
}

#[test]
#[should_panic(expected = "contest not found")]
fn test_close_unknown_contest() {
    let env = Env::default();
    env.mock_all_auths();
    let (client, admin) = setup(&env);

    client.close_contest(&admin, &9u64);
}

// ─── queries ─────────────────────────────────────────────────────────────────

#[test]
fn test_get_snapshot_unknown_returns_none() {
    let env = Env::default();
    env.mock_all_auths();
    let (client, _) = setup(&env);

    assert!(client.get_snapshot(&42u64).is_none());
}

#[test]
fn test_get_transaction_unknown_returns_none() {
    let env = Env::default();
    env.mock_all_auths();
    let (client, _) = setup(&env);

    assert!(client.get_transaction(&tx(&env, 9)).is_none());
}
