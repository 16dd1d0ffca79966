//! Atelier - Payout Settlement (Soroban)
//! Prize distribution for closed, ranked contests.
//!
//! Settlement reads the prize pool from the contest ledger and the final
//! ranking from the vote aggregator, then creates one payout per winning
//! rank (50/30/20 over the top three). Each payout walks a small state
//! machine driven by an off-chain worker: Pending -> Processing -> Paid,
//! with bounded Failed -> Pending retries and a Pending-only cancel path.
//! Rounding and short rankings leave an unallocated remainder on the
//! settlement record; it is never redistributed.
//!
//! Events:
//! - ("contest", "settled"): [contest_id: u64, allocated: i128, unallocated: i128]
//! - ("payout", "create"): [payout_id: u64, contest_id: u64, net_amount: i128]
//! - ("payout", "claim"): [payout_id: u64, attempts: u32]
//! - ("payout", "paid"): [payout_id: u64, recipient: Address]
//! - ("payout", "failed"): [payout_id: u64]
//! - ("payout", "retry"): [payout_id: u64]
//! - ("payout", "cancel"): [payout_id: u64]

#![no_std]
use soroban_sdk::{
    contract, contractimpl, contracttype, symbol_short, token, Address, Env, String, Vec,
};

// ============================================================
// Data Types
// ============================================================

#[contracttype]
#[derive(Clone, PartialEq)]
pub enum PayoutStatus {
    Pending,
    Processing,
    Paid,
    Failed,
    Cancelled,
}

#[contracttype]
#[derive(Clone)]
pub struct Payout {
    pub payout_id: u64,
    pub contest_id: u64,
    pub submission_id: u64,
    pub recipient: Address,
    pub token: Address,
    pub rank: u32,
    pub gross_amount: i128,
    pub net_amount: i128,
    pub status: PayoutStatus,
    pub attempts: u32,
    pub failure_reason: Option<String>,
    pub created_at: u64,
    pub processed_at: Option<u64>,
}

/// Per-contest settlement record; written once.
#[contracttype]
#[derive(Clone)]
pub struct Settlement {
    pub contest_id: u64,
    pub prize_pool: i128,
    pub allocated: i128,
    pub unallocated: i128,
    pub payout_ids: Vec<u64>,
    pub settled_at: u64,
}

// ============================================================
// Storage Keys
// ============================================================

#[contracttype]
#[derive(Clone)]
pub enum DataKey {
    Admin,
    PendingAdmin,
    TokenAddress,
    LedgerContract,
    RankingContract,
    PayoutCounter,
    Payout(u64),
    Settlement(u64),
}

const INSTANCE_LIFETIME_THRESHOLD: u32 = 17_280;
const INSTANCE_BUMP_AMOUNT: u32 = 86_400;
const PERSISTENT_LIFETIME_THRESHOLD: u32 = 120_960;
const PERSISTENT_BUMP_AMOUNT: u32 = 1_051_200;

/// Prize shares for ranks 1..=3, in basis points of the pool.
const PRIZE_SHARE_BPS: [i128; 3] = [5_000, 3_000, 2_000];

/// Delivery attempts allowed per payout before manual intervention.
const MAX_PAYOUT_ATTEMPTS: u32 = 3;

// ============================================================
// Contract
// ============================================================

#[contract]
pub struct PayoutSettlementContract;

#[contractimpl]
impl PayoutSettlementContract {
    pub fn initialize(
        env: Env,
        admin: Address,
        token: Address,
        ledger: Address,
        aggregator: Address,
    ) {
        env.storage()
            .instance()
            .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
        if env.storage().instance().has(&DataKey::Admin) {
            panic!("already initialized");
        }
        admin.require_auth();
        env.storage().instance().set(&DataKey::Admin, &admin);
        env.storage().instance().set(&DataKey::TokenAddress, &token);
        env.storage().instance().set(&DataKey::LedgerContract, &ledger);
        env.storage()
            .instance()
            .set(&DataKey::RankingContract, &aggregator);
        env.storage().instance().set(&DataKey::PayoutCounter, &0u64);
    }

    /// Turn a closed, ranked contest into payout rows. Exactly-once per
    /// contest; retrying after the settlement record exists panics rather
    /// than minting duplicate payouts.
    pub fn settle_contest(env: Env, admin: Address, contest_id: u64) -> Settlement {
        env.storage()
            .instance()
            .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
        atelier_common_admin::require_admin(&env, &DataKey::Admin, &admin);

        if env
            .storage()
            .persistent()
            .has(&DataKey::Settlement(contest_id))
        {
            panic!("contest already settled");
        }

        let ledger_address: Address = env
            .storage()
            .instance()
            .get(&DataKey::LedgerContract)
            .unwrap();
        let ledger = collaborators::ContestLedgerContractClient::new(&env, &ledger_address);
        let snapshot = ledger
            .get_snapshot(&contest_id)
            .unwrap_or_else(|| panic!("ledger snapshot not found"));
        if snapshot.accepting {
            panic!("contest not closed");
        }

        let aggregator_address: Address = env
            .storage()
            .instance()
            .get(&DataKey::RankingContract)
            .unwrap();
        let aggregator =
            collaborators::VoteAggregatorContractClient::new(&env, &aggregator_address);
        let ranking = aggregator
            .get_ranking(&contest_id)
            .unwrap_or_else(|| panic!("ranking not finalized"));

        let token: Address = env.storage().instance().get(&DataKey::TokenAddress).unwrap();
        let pool = snapshot.prize_pool;
        let winners = if ranking.len() < PRIZE_SHARE_BPS.len() as u32 {
            ranking.len()
        } else {
            PRIZE_SHARE_BPS.len() as u32
        };

        let mut allocated: i128 = 0;
        let mut payout_ids: Vec<u64> = Vec::new(&env);
        for i in 0..winners {
            let entry = ranking.get(i).unwrap();
            let gross = pool * PRIZE_SHARE_BPS[i as usize] / 10_000;
            let recipient = aggregator.get_submission_owner(&entry.submission_id);

            let payout_id = Self::_next_payout_id(&env);
            let payout = Payout {
                payout_id,
                contest_id,
                submission_id: entry.submission_id,
                recipient,
                token: token.clone(),
                rank: entry.rank,
                gross_amount: gross,
                net_amount: gross,
                status: PayoutStatus::Pending,
                attempts: 0,
                failure_reason: None,
                created_at: env.ledger().timestamp(),
                processed_at: None,
            };
            Self::_store_payout(&env, &payout);
            payout_ids.push_back(payout_id);
            allocated += gross;

            env.events().publish(
                (symbol_short!("payout"), symbol_short!("create")),
                (payout_id, contest_id, payout.net_amount),
            );
        }

        // Rounding dust and missing ranks stay on the record for audit.
        let settlement = Settlement {
            contest_id,
            prize_pool: pool,
            allocated,
            unallocated: pool - allocated,
            payout_ids,
            settled_at: env.ledger().timestamp(),
        };
        let _ttl_key = DataKey::Settlement(contest_id);
        env.storage().persistent().set(&_ttl_key, &settlement);
        env.storage().persistent().extend_ttl(
            &_ttl_key,
            PERSISTENT_LIFETIME_THRESHOLD,
            PERSISTENT_BUMP_AMOUNT,
        );

        env.events().publish(
            (symbol_short!("contest"), symbol_short!("settled")),
            (contest_id, settlement.allocated, settlement.unallocated),
        );

        settlement
    }

    // ─── payout state machine ────────────────────────────────────────────

    /// Worker claim. The attempt counter moves here, so a worker crash
    /// between claim and confirmation still burns the attempt.
    pub fn begin_processing(env: Env, admin: Address, payout_id: u64) {
        env.storage()
            .instance()
            .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
        atelier_common_admin::require_admin(&env, &DataKey::Admin, &admin);

        let mut payout = Self::_load_payout(&env, payout_id);
        Self::_validate_transition(&payout.status, &PayoutStatus::Processing);

        payout.status = PayoutStatus::Processing;
        payout.attempts += 1;
        Self::_store_payout(&env, &payout);

        env.events().publish(
            (symbol_short!("payout"), symbol_short!("claim")),
            (payout_id, payout.attempts),
        );
    }

    /// Confirmation from the delivery worker; moves the funds.
    pub fn confirm_paid(env: Env, admin: Address, payout_id: u64) {
        env.storage()
            .instance()
            .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
        atelier_common_admin::require_admin(&env, &DataKey::Admin, &admin);

        let mut payout = Self::_load_payout(&env, payout_id);
        Self::_validate_transition(&payout.status, &PayoutStatus::Paid);

        let token_client = token::Client::new(&env, &payout.token);
        token_client.transfer(
            &env.current_contract_address(),
            &payout.recipient,
            &payout.net_amount,
        );

        payout.status = PayoutStatus::Paid;
        payout.processed_at = Some(env.ledger().timestamp());
        Self::_store_payout(&env, &payout);

        env.events().publish(
            (symbol_short!("payout"), symbol_short!("paid")),
            (payout_id, payout.recipient),
        );
    }

    pub fn record_failure(env: Env, admin: Address, payout_id: u64, reason: String) {
        env.storage()
            .instance()
            .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
        atelier_common_admin::require_admin(&env, &DataKey::Admin, &admin);

        let mut payout = Self::_load_payout(&env, payout_id);
        Self::_validate_transition(&payout.status, &PayoutStatus::Failed);

        payout.status = PayoutStatus::Failed;
        payout.failure_reason = Some(reason);
        Self::_store_payout(&env, &payout);

        env.events().publish(
            (symbol_short!("payout"), symbol_short!("failed")),
            payout_id,
        );
    }

    /// Re-queue a failed payout while attempts remain. The counter is not
    /// reset; it bounds total delivery attempts, not consecutive ones.
    pub fn retry_payout(env: Env, admin: Address, payout_id: u64) {
        env.storage()
            .instance()
            .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
        atelier_common_admin::require_admin(&env, &DataKey::Admin, &admin);

        let mut payout = Self::_load_payout(&env, payout_id);
        if payout.status != PayoutStatus::Failed {
            panic!("invalid state transition");
        }
        if payout.attempts >= MAX_PAYOUT_ATTEMPTS {
            panic!("retry limit exceeded");
        }

        payout.status = PayoutStatus::Pending;
        payout.failure_reason = None;
        Self::_store_payout(&env, &payout);

        env.events().publish(
            (symbol_short!("payout"), symbol_short!("retry")),
            payout_id,
        );
    }

    /// Administrative withdrawal of a prize before any delivery attempt
    /// has claimed it.
    pub fn cancel_payout(env: Env, admin: Address, payout_id: u64) {
        env.storage()
            .instance()
            .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
        atelier_common_admin::require_admin(&env, &DataKey::Admin, &admin);

        let mut payout = Self::_load_payout(&env, payout_id);
        Self::_validate_transition(&payout.status, &PayoutStatus::Cancelled);

        payout.status = PayoutStatus::Cancelled;
        Self::_store_payout(&env, &payout);

        env.events().publish(
            (symbol_short!("payout"), symbol_short!("cancel")),
            payout_id,
        );
    }

    // ─── read-only surface ───────────────────────────────────────────────

    pub fn get_payout(env: Env, payout_id: u64) -> Option<Payout> {
        env.storage()
            .instance()
            .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
        env.storage().persistent().get(&DataKey::Payout(payout_id))
    }

    pub fn get_settlement(env: Env, contest_id: u64) -> Option<Settlement> {
        env.storage()
            .instance()
            .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
        env.storage()
            .persistent()
            .get(&DataKey::Settlement(contest_id))
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

    // ─── internal helpers ────────────────────────────────────────────────

    /// Legal edges of the payout state machine. Retry is handled
    /// separately because it also checks the attempt bound.
    fn _validate_transition(from: &PayoutStatus, to: &PayoutStatus) {
        let legal = matches!(
            (from, to),
            (PayoutStatus::Pending, PayoutStatus::Processing)
                | (PayoutStatus::Processing, PayoutStatus::Paid)
                | (PayoutStatus::Pending, PayoutStatus::Failed)
                | (PayoutStatus::Processing, PayoutStatus::Failed)
                | (PayoutStatus::Pending, PayoutStatus::Cancelled)
        );
        if !legal {
            panic!("invalid state transition");
        }
    }

    fn _next_payout_id(env: &Env) -> u64 {
        let id: u64 = env
            .storage()
            .instance()
            .get(&DataKey::PayoutCounter)
            .unwrap_or(0)
            + 1;
        env.storage().instance().set(&DataKey::PayoutCounter, &id);
        id
    }

    fn _load_payout(env: &Env, payout_id: u64) -> Payout {
        env.storage()
            .persistent()
            .get(&DataKey::Payout(payout_id))
            .unwrap_or_else(|| panic!("payout not found"))
    }

    fn _store_payout(env: &Env, payout: &Payout) {
        let _ttl_key = DataKey::Payout(payout.payout_id);
        env.storage().persistent().set(&_ttl_key, payout);
        env.storage().persistent().extend_ttl(
            &_ttl_key,
            PERSISTENT_LIFETIME_THRESHOLD,
            PERSISTENT_BUMP_AMOUNT,
        );
    }
}

// Collaborator contract interfaces wrapped in a module to avoid symbol name
// conflicts. Field layout must match the deployed contracts exactly; the
// stub bodies are storage-backed so tests can seed return values.
mod collaborators {
    use super::*;

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

    #[contracttype]
    #[derive(Clone)]
    pub struct RankingEntry {
        pub submission_id: u64,
        pub community_score: u32,
        pub judge_score: u32,
        pub final_score: u32,
        pub rank: u32,
    }

    #[contracttype]
    #[derive(Clone)]
    pub enum StubKey {
        Snapshot(u64),
        Ranking(u64),
        Owner(u64),
    }

    #[contract]
    pub struct ContestLedgerContract;

    #[contractimpl]
    impl ContestLedgerContract {
        pub fn set_snapshot(env: Env, snapshot: LedgerSnapshot) {
            env.storage()
                .persistent()
                .set(&StubKey::Snapshot(snapshot.contest_id), &snapshot);
        }

        pub fn get_snapshot(env: Env, contest_id: u64) -> Option<LedgerSnapshot> {
            env.storage().persistent().get(&StubKey::Snapshot(contest_id))
        }
    }

    #[contract]
    pub struct VoteAggregatorContract;

    #[contractimpl]
    impl VoteAggregatorContract {
        pub fn set_ranking(env: Env, contest_id: u64, ranking: Vec<RankingEntry>) {
            env.storage()
                .persistent()
                .set(&StubKey::Ranking(contest_id), &ranking);
        }

        pub fn get_ranking(env: Env, contest_id: u64) -> Option<Vec<RankingEntry>> {
            env.storage().persistent().get(&StubKey::Ranking(contest_id))
        }

        pub fn set_owner(env: Env, submission_id: u64, owner: Address) {
            env.storage()
                .persistent()
                .set(&StubKey::Owner(submission_id), &owner);
        }

        pub fn get_submission_owner(env: Env, submission_id: u64) -> Address {
            env.storage()
                .persistent()
                .get(&StubKey::Owner(submission_id))
                .unwrap_or_else(|| panic!("submission not found"))
        }
    }
}
