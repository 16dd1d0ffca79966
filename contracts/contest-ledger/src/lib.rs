//! Atelier - Contest Ledger (Soroban)
//! Deterministic revenue allocation and per-contest prize-pool accounting.
//!
//! Every monetized action (entry fee, submission pin, vote multiplier,
//! profile boost) is split between platform revenue and the prize pool by a
//! fixed rate table and folded into a materialized per-contest snapshot.
//! Recording is idempotent on the externally generated transaction id, so
//! at-least-once delivery from payment capture never double counts.
//!
//! Events:
//! - ("revenue", "record"): [tx_id: BytesN<32>, contest_id: u64, amount: i128]
//! - ("contest", "closed"): [contest_id: u64]

#![no_std]
use soroban_sdk::{contract, contractimpl, contracttype, symbol_short, Address, BytesN, Env};

// ============================================================
// Data Types
// ============================================================

/// Closed set of monetized actions. Amounts outside this enumeration are
/// rejected by the XDR decoder before the contract runs.
#[contracttype]
#[derive(Clone, PartialEq)]
pub enum TransactionKind {
    EntryFee,
    SubmissionPin,
    VoteMultiplier,
    ProfileBoost,
}

#[contracttype]
#[derive(Clone, PartialEq)]
pub enum PaymentRail {
    Card,
    OnChain,
}

/// Immutable once written; corrections are new compensating transactions on
/// the reconciliation path, never edits.
#[contracttype]
#[derive(Clone)]
pub struct RevenueTransaction {
    pub tx_id: BytesN<32>,
    pub contest_id: u64,
    pub kind: TransactionKind,
    pub amount: i128,
    pub platform_cut: i128,
    pub prize_pool: i128,
    pub rail: PaymentRail,
    pub recorded_at: u64,
}

/// Materialized running totals for one contest. The sole source of truth
/// for the current prize pool.
#[contracttype]
#[derive(Clone)]
pub struct LedgerSnapshot {
    pub contest_id: u64,
    pub total_revenue: i128,
    pub platform_cut: i128,
    pub prize_pool: i128,
    pub entry_fee_total: i128,
    pub pin_total: i128,
    pub multiplier_total: i128,
    pub boost_total: i128,
    pub tx_count: u64,
    pub accepting: bool,
}

// ============================================================
// Storage Keys
// ============================================================

#[contracttype]
#[derive(Clone)]
pub enum DataKey {
    Admin,
    PendingAdmin,
    TierCatalog,
    Snapshot(u64),
    Transaction(BytesN<32>),
}

const INSTANCE_LIFETIME_THRESHOLD: u32 = 17_280;
const INSTANCE_BUMP_AMOUNT: u32 = 86_400;
const PERSISTENT_LIFETIME_THRESHOLD: u32 = 120_960;
const PERSISTENT_BUMP_AMOUNT: u32 = 1_051_200;

/// Platform share of entry fees, in basis points.
const ENTRY_FEE_PLATFORM_BPS: i128 = 4_000;
/// Platform share of pins, multipliers and boosts, in basis points.
const ADDON_PLATFORM_BPS: i128 = 2_000;

/// Split an amount between platform revenue and the prize pool per the
/// fixed rate table. The platform cut is floored, so the sum invariant
/// holds exactly and any rounding remainder favors the prize pool.
pub fn allocate(kind: &TransactionKind, amount: i128) -> (i128, i128) {
    let bps = match kind {
        TransactionKind::EntryFee => ENTRY_FEE_PLATFORM_BPS,
        TransactionKind::SubmissionPin
        | TransactionKind::VoteMultiplier
        | TransactionKind::ProfileBoost => ADDON_PLATFORM_BPS,
    };
    let platform_cut = amount * bps / 10_000;
    (platform_cut, amount - platform_cut)
}

// ============================================================
// Contract
// ============================================================

#[contract]
pub struct ContestLedgerContract;

#[contractimpl]
impl ContestLedgerContract {
    pub fn initialize(env: Env, admin: Address) {
        env.storage()
            .instance()
            .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
        if env.storage().instance().has(&DataKey::Admin) {
            panic!("already initialized");
        }
        admin.require_auth();
        env.storage().instance().set(&DataKey::Admin, &admin);
    }

    /// Wire the entry-tier catalog used to validate entry-fee amounts.
    pub fn set_tier_catalog(env: Env, admin: Address, catalog: Address) {
        env.storage()
            .instance()
            .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
        atelier_common_admin::require_admin(&env, &DataKey::Admin, &admin);
        env.storage().instance().set(&DataKey::TierCatalog, &catalog);
    }

    pub fn open_contest(env: Env, admin: Address, contest_id: u64) {
        env.storage()
            .instance()
            .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
        atelier_common_admin::require_admin(&env, &DataKey::Admin, &admin);

        if env
            .storage()
            .persistent()
            .has(&DataKey::Snapshot(contest_id))
        {
            panic!("contest already open");
        }

        let snapshot = LedgerSnapshot {
            contest_id,
            total_revenue: 0,
            platform_cut: 0,
            prize_pool: 0,
            entry_fee_total: 0,
            pin_total: 0,
            multiplier_total: 0,
            boost_total: 0,
            tx_count: 0,
            accepting: true,
        };
        Self::_store_snapshot(&env, &snapshot);
    }

    /// Record one captured payment. Replaying a known `tx_id` is a no-op
    /// that returns the current snapshot unchanged.
    pub fn record_transaction(
        env: Env,
        admin: Address,
        tx_id: BytesN<32>,
        contest_id: u64,
        kind: TransactionKind,
        amount: i128,
        rail: PaymentRail,
    ) -> LedgerSnapshot {
        env.storage()
            .instance()
            .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
        atelier_common_admin::require_admin(&env, &DataKey::Admin, &admin);

        if env
            .storage()
            .persistent()
            .has(&DataKey::Transaction(tx_id.clone()))
        {
            let existing: RevenueTransaction = env
                .storage()
                .persistent()
                .get(&DataKey::Transaction(tx_id))
                .unwrap();
            return env
                .storage()
                .persistent()
                .get(&DataKey::Snapshot(existing.contest_id))
                .unwrap();
        }

        if amount <= 0 {
            panic!("invalid amount");
        }

        let mut snapshot: LedgerSnapshot = env
            .storage()
            .persistent()
            .get(&DataKey::Snapshot(contest_id))
            .unwrap_or_else(|| panic!("contest not accepting revenue"));
        if !snapshot.accepting {
            panic!("contest not accepting revenue");
        }

        if kind == TransactionKind::EntryFee {
            if let Some(catalog) = env
                .storage()
                .instance()
                .get::<DataKey, Address>(&DataKey::TierCatalog)
            {
                let tiers = collaborators::EntryTiersContractClient::new(&env, &catalog);
                if !tiers.fee_matches(&amount) {
                    panic!("entry fee mismatch");
                }
            }
        }

        let (platform_cut, prize_pool) = allocate(&kind, amount);

        let transaction = RevenueTransaction {
            tx_id: tx_id.clone(),
            contest_id,
            kind: kind.clone(),
            amount,
            platform_cut,
            prize_pool,
            rail,
            recorded_at: env.ledger().timestamp(),
        };

        snapshot.total_revenue += amount;
        snapshot.platform_cut += platform_cut;
        snapshot.prize_pool += prize_pool;
        match kind {
            TransactionKind::EntryFee => snapshot.entry_fee_total += amount,
            TransactionKind::SubmissionPin => snapshot.pin_total += amount,
            TransactionKind::VoteMultiplier => snapshot.multiplier_total += amount,
            TransactionKind::ProfileBoost => snapshot.boost_total += amount,
        }
        snapshot.tx_count += 1;

        let _ttl_key = DataKey::Transaction(tx_id.clone());
        env.storage().persistent().set(&_ttl_key, &transaction);
        env.storage().persistent().extend_ttl(
            &_ttl_key,
            PERSISTENT_LIFETIME_THRESHOLD,
            PERSISTENT_BUMP_AMOUNT,
        );
        Self::_store_snapshot(&env, &snapshot);

        env.events().publish(
            (symbol_short!("revenue"), symbol_short!("record")),
            (tx_id, contest_id, amount),
        );

        snapshot
    }

    /// Stop revenue intake for a contest. Forward-only; late or disputed
    /// payments belong to the reconciliation path, not the ledger.
    pub fn close_contest(env: Env, admin: Address, contest_id: u64) {
        env.storage()
            .instance()
            .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
        atelier_common_admin::require_admin(&env, &DataKey::Admin, &admin);

        let mut snapshot: LedgerSnapshot = env
            .storage()
            .persistent()
            .get(&DataKey::Snapshot(contest_id))
            .unwrap_or_else(|| panic!("contest not found"));
        if !snapshot.accepting {
            panic!("contest already closed");
        }

        snapshot.accepting = false;
        Self::_store_snapshot(&env, &snapshot);

        env.events().publish(
            (symbol_short!("contest"), symbol_short!("closed")),
            contest_id,
        );
    }

    pub fn get_snapshot(env: Env, contest_id: u64) -> Option<LedgerSnapshot> {
        env.storage()
            .instance()
            .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
        env.storage().persistent().get(&DataKey::Snapshot(contest_id))
    }

    pub fn get_transaction(env: Env, tx_id: BytesN<32>) -> Option<RevenueTransaction> {
        env.storage()
            .instance()
            .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
        env.storage().persistent().get(&DataKey::Transaction(tx_id))
    }

    pub fn propose_admin(env: Env, current_admin: Address, new_admin: Address) {
        atelier_common_admin::propose_admin(
            &env,
            &DataKey::Admin,
            &DataKey::PendingAdmin,
            current_admin,
            new_admin,
        );
    }

    pub fn accept_admin(env: Env, new_admin: Address) {
        atelier_common_admin::accept_admin(&env, &DataKey::Admin, &DataKey::PendingAdmin, new_admin);
    }

    fn _store_snapshot(env: &Env, snapshot: &LedgerSnapshot) {
        let _ttl_key = DataKey::Snapshot(snapshot.contest_id);
        env.storage().persistent().set(&_ttl_key, snapshot);
        env.storage().persistent().extend_ttl(
            &_ttl_key,
            PERSISTENT_LIFETIME_THRESHOLD,
            PERSISTENT_BUMP_AMOUNT,
        );
    }
}

// Collaborator contract interface wrapped in a module to avoid symbol name
// conflicts; the stub body stands in for the real catalog in tests.
mod collaborators {
    use super::*;

    #[contract]
    pub struct EntryTiersContract;
    #[contractimpl]
    impl EntryTiersContract {
        pub fn fee_matches(env: Env, amount: i128) -> bool {
            let _ = env;
            // Mirrors the deployed catalog's seeded fees.
            amount == 500 || amount == 1_200 || amount == 2_500
        }
    }
}

mod test;
