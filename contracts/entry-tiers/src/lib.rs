//! Atelier - Entry Tiers (Soroban)
//! Immutable catalog of priced submission classes for creative contests.
//!
//! The catalog is seeded once at deployment and never mutated by user
//! action; submissions are validated against their declared tier before any
//! entry-fee transaction is allowed to be recorded.

#![no_std]
use soroban_sdk::{contract, contractimpl, contracttype, String, Vec, Address, Env};

#[contracttype]
#[derive(Clone)]
pub struct EntryTier {
    pub tier_id: u32,
    pub name: String,
    /// Entry fee in minor currency units.
    pub entry_fee: i128,
    pub max_assets: u32,
    pub max_asset_bytes: u64,
    pub max_duration_secs: u32,
    pub prize_eligible: bool,
}

#[contracttype]
#[derive(Clone)]
pub enum DataKey {
    Admin,
    PendingAdmin,
    Tier(u32),
    TierIds,
}

const INSTANCE_LIFETIME_THRESHOLD: u32 = 17_280;
const INSTANCE_BUMP_AMOUNT: u32 = 86_400;
const PERSISTENT_LIFETIME_THRESHOLD: u32 = 120_960;
const PERSISTENT_BUMP_AMOUNT: u32 = 1_051_200;

const MEGABYTE: u64 = 1_048_576;

#[contract]
pub struct EntryTiersContract;

#[contractimpl]
impl EntryTiersContract {
    pub fn initialize(env: Env, admin: Address) {
        env.storage()
            .instance()
            .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
        if env.storage().instance().has(&DataKey::Admin) {
            panic!("already initialized");
        }
        admin.require_auth();
        env.storage().instance().set(&DataKey::Admin, &admin);

        Self::_seed_tier(
            &env,
            EntryTier {
                tier_id: 1,
                name: String::from_str(&env, "single"),
                entry_fee: 500,
                max_assets: 1,
                max_asset_bytes: 25 * MEGABYTE,
                max_duration_secs: 60,
                prize_eligible: true,
            },
        );
        Self::_seed_tier(
            &env,
            EntryTier {
                tier_id: 2,
                name: String::from_str(&env, "portfolio"),
                entry_fee: 1_200,
                max_assets: 3,
                max_asset_bytes: 25 * MEGABYTE,
                max_duration_secs: 60,
                prize_eligible: true,
            },
        );
        Self::_seed_tier(
            &env,
            EntryTier {
                tier_id: 3,
                name: String::from_str(&env, "showcase"),
                entry_fee: 2_500,
                max_assets: 5,
                max_asset_bytes: 100 * MEGABYTE,
                max_duration_secs: 180,
                prize_eligible: true,
            },
        );
    }

    /// Strict lookup used at the submission boundary.
    pub fn lookup(env: Env, tier_id: u32) -> EntryTier {
        env.storage()
            .instance()
            .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
        env.storage()
            .persistent()
            .get(&DataKey::Tier(tier_id))
            .unwrap_or_else(|| panic!("unknown tier"))
    }

    /// Validate a submission's declared assets against its tier caps.
    /// Pure read; panics on any violation.
    pub fn validate_submission(
        env: Env,
        tier_id: u32,
        asset_count: u32,
        largest_asset_bytes: u64,
        longest_duration_secs: u32,
    ) {
        let tier = Self::lookup(env, tier_id);

        if asset_count == 0 || asset_count > tier.max_assets {
            panic!("asset limit exceeded");
        }
        if largest_asset_bytes > tier.max_asset_bytes {
            panic!("asset limit exceeded");
        }
        if longest_duration_secs > tier.max_duration_secs {
            panic!("asset limit exceeded");
        }
    }

    /// True iff some tier's entry fee equals `amount`. Consumed by the
    /// contest ledger when recording entry-fee revenue.
    pub fn fee_matches(env: Env, amount: i128) -> bool {
        env.storage()
            .instance()
            .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
        let ids: Vec<u32> = env
            .storage()
            .instance()
            .get(&DataKey::TierIds)
            .unwrap_or(Vec::new(&env));
        for tier_id in ids.iter() {
            let tier: EntryTier = env
                .storage()
                .persistent()
                .get(&DataKey::Tier(tier_id))
                .unwrap();
            if tier.entry_fee == amount {
                return true;
            }
        }
        false
    }

    pub fn get_tier(env: Env, tier_id: u32) -> Option<EntryTier> {
        env.storage()
            .instance()
            .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
        env.storage().persistent().get(&DataKey::Tier(tier_id))
    }

    pub fn list_tiers(env: Env) -> Vec<EntryTier> {
        env.storage()
            .instance()
            .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
        let ids: Vec<u32> = env
            .storage()
            .instance()
            .get(&DataKey::TierIds)
            .unwrap_or(Vec::new(&env));
        let mut tiers: Vec<EntryTier> = Vec::new(&env);
        for tier_id in ids.iter() {
            let tier: EntryTier = env
                .storage()
                .persistent()
                .get(&DataKey::Tier(tier_id))
                .unwrap();
            tiers.push_back(tier);
        }
        tiers
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

    fn _seed_tier(env: &Env, tier: EntryTier) {
        let _ttl_key = DataKey::Tier(tier.tier_id);
        env.storage().persistent().set(&_ttl_key, &tier);
        env.storage().persistent().extend_ttl(
            &_ttl_key,
            PERSISTENT_LIFETIME_THRESHOLD,
            PERSISTENT_BUMP_AMOUNT,
        );

        let mut ids: Vec<u32> = env
            .storage()
            .instance()
            .get(&DataKey::TierIds)
            .unwrap_or(Vec::new(env));
        ids.push_back(tier.tier_id);
        env.storage().instance().set(&DataKey::TierIds, &ids);
    }
}
