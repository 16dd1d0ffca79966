//! Atelier - Vote Aggregator (Soroban)
//! Community voting, judge scoring and deterministic contest ranking.
//!
//! One vote per voter per contest, enforced against the contest rather than
//! the submission. Rankings blend a normalized community score with the
//! judge score (75/25) and are committed exactly once when the contest
//! closes; replaying finalization returns the stored ranking unchanged.
//!
//! Events:
//! - ("contest", "active"): [contest_id: u64]
//! - ("vote", "cast"): [contest_id: u64, submission_id: u64, voter: Address]
//! - ("judge", "scored"): [submission_id: u64, score: u32]
//! - ("ranking", "final"): [contest_id: u64, entries: u32]

#![no_std]
use soroban_sdk::{contract, contractimpl, contracttype, symbol_short, Address, Env, String, Vec};

// ============================================================
// Data Types
// ============================================================

#[contracttype]
#[derive(Clone, PartialEq)]
pub enum ContestStatus {
    Draft,
    Active,
    Closed,
}

#[contracttype]
#[derive(Clone)]
pub struct Contest {
    pub contest_id: u64,
    pub title: String,
    pub theme: String,
    pub starts_at: u64,
    pub ends_at: u64,
    pub max_submissions: u32,
    pub submission_count: u32,
    pub status: ContestStatus,
    pub judging_complete: bool,
}

#[contracttype]
#[derive(Clone)]
pub struct Submission {
    pub submission_id: u64,
    pub contest_id: u64,
    pub owner: Address,
    pub tier_id: u32,
    pub vote_count: u64,
    /// Assigned once by the judge feed; immutable afterwards.
    pub judge_score: Option<u32>,
    pub approved: bool,
    pub created_at: u64,
}

#[contracttype]
#[derive(Clone)]
pub struct Vote {
    pub submission_id: u64,
    pub voted_at: u64,
}

/// One row of a committed ranking. `final_score` is in hundredths of a
/// point (0..=10_000).
#[contracttype]
#[derive(Clone)]
pub struct RankingEntry {
    pub submission_id: u64,
    pub community_score: u32,
    pub judge_score: u32,
    pub final_score: u32,
    pub rank: u32,
}

/// Working row for the ranking sort; carries the tie-break timestamp that
/// the committed entry does not need.
#[contracttype]
#[derive(Clone)]
struct ScoredSubmission {
    submission_id: u64,
    community_score: u32,
    judge_score: u32,
    final_score: u32,
    created_at: u64,
}

// ============================================================
// Storage Keys
// ============================================================

#[contracttype]
#[derive(Clone)]
pub enum DataKey {
    Admin,
    PendingAdmin,
    Judge,
    Contest(u64),
    Submission(u64),
    SubmissionList(u64),
    Vote(u64, Address),     // (contest_id, voter)
    HasVoted(u64, Address), // (contest_id, voter)
    Ranking(u64),
}

const INSTANCE_LIFETIME_THRESHOLD: u32 = 17_280;
const INSTANCE_BUMP_AMOUNT: u32 = 86_400;
const PERSISTENT_LIFETIME_THRESHOLD: u32 = 120_960;
const PERSISTENT_BUMP_AMOUNT: u32 = 1_051_200;

/// Community / judge weighting in percent. Applied to 0-100 scores, which
/// yields final scores in hundredths.
const COMMUNITY_WEIGHT_PCT: u32 = 75;
const JUDGE_WEIGHT_PCT: u32 = 25;

#[contract]
pub struct VoteAggregatorContract;

#[contractimpl]
impl VoteAggregatorContract {
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

    /// Register the judge-feed identity allowed to commit scores.
    pub fn set_judge(env: Env, admin: Address, judge: Address) {
        env.storage()
            .instance()
            .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
        atelier_common_admin::require_admin(&env, &DataKey::Admin, &admin);
        env.storage().instance().set(&DataKey::Judge, &judge);
    }

    // ─── contest lifecycle ───────────────────────────────────────────────

    pub fn create_contest(
        env: Env,
        admin: Address,
        contest_id: u64,
        title: String,
        theme: String,
        starts_at: u64,
        ends_at: u64,
        max_submissions: u32,
    ) {
        env.storage()
            .instance()
            .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
        atelier_common_admin::require_admin(&env, &DataKey::Admin, &admin);

        if env.storage().persistent().has(&DataKey::Contest(contest_id)) {
            panic!("contest already exists");
        }
        if ends_at <= starts_at {
            panic!("invalid contest window");
        }

        let contest = Contest {
            contest_id,
            title,
            theme,
            starts_at,
            ends_at,
            max_submissions,
            submission_count: 0,
            status: ContestStatus::Draft,
            judging_complete: false,
        };
        Self::_store_contest(&env, &contest);
        let _ttl_key = DataKey::SubmissionList(contest_id);
        env.storage()
            .persistent()
            .set(&_ttl_key, &Vec::<u64>::new(&env));
        env.storage().persistent().extend_ttl(
            &_ttl_key,
            PERSISTENT_LIFETIME_THRESHOLD,
            PERSISTENT_BUMP_AMOUNT,
        );
    }

    pub fn activate_contest(env: Env, admin: Address, contest_id: u64) {
        env.storage()
            .instance()
            .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
        atelier_common_admin::require_admin(&env, &DataKey::Admin, &admin);

        let mut contest = Self::_load_contest(&env, contest_id);
        if contest.status != ContestStatus::Draft {
            panic!("invalid state transition");
        }
        contest.status = ContestStatus::Active;
        Self::_store_contest(&env, &contest);

        env.events().publish(
            (symbol_short!("contest"), symbol_short!("active")),
            contest_id,
        );
    }

    // ─── submissions ─────────────────────────────────────────────────────

    pub fn register_submission(
        env: Env,
        owner: Address,
        contest_id: u64,
        submission_id: u64,
        tier_id: u32,
    ) {
        env.storage()
            .instance()
            .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
        owner.require_auth();

        let mut contest = Self::_load_contest(&env, contest_id);
        if contest.status != ContestStatus::Active {
            panic!("contest not open");
        }
        if contest.submission_count >= contest.max_submissions {
            panic!("submission limit reached");
        }
        if env
            .storage()
            .persistent()
            .has(&DataKey::Submission(submission_id))
        {
            panic!("submission already exists");
        }

        let submission = Submission {
            submission_id,
            contest_id,
            owner,
            tier_id,
            vote_count: 0,
            judge_score: None,
            approved: false,
            created_at: env.ledger().timestamp(),
        };
        Self::_store_submission(&env, &submission);

        let mut list: Vec<u64> = env
            .storage()
            .persistent()
            .get(&DataKey::SubmissionList(contest_id))
            .unwrap();
        list.push_back(submission_id);
        let _ttl_key = DataKey::SubmissionList(contest_id);
        env.storage().persistent().set(&_ttl_key, &list);
        env.storage().persistent().extend_ttl(
            &_ttl_key,
            PERSISTENT_LIFETIME_THRESHOLD,
            PERSISTENT_BUMP_AMOUNT,
        );

        contest.submission_count += 1;
        Self::_store_contest(&env, &contest);
    }

    /// Moderation gate: only approved submissions accept votes and enter
    /// the ranking.
    pub fn approve_submission(env: Env, admin: Address, submission_id: u64) {
        env.storage()
            .instance()
            .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
        atelier_common_admin::require_admin(&env, &DataKey::Admin, &admin);

        let mut submission = Self::_load_submission(&env, submission_id);
        submission.approved = true;
        Self::_store_submission(&env, &submission);
    }

    // ─── judge feed ──────────────────────────────────────────────────────

    pub fn set_judge_score(env: Env, caller: Address, submission_id: u64, score: u32) {
        env.storage()
            .instance()
            .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
        Self::_require_admin_or_judge(&env, &caller);

        if score > 100 {
            panic!("invalid judge score");
        }

        let mut submission = Self::_load_submission(&env, submission_id);
        let contest = Self::_load_contest(&env, submission.contest_id);
        if contest.status == ContestStatus::Closed {
            panic!("contest not open");
        }
        if submission.judge_score.is_some() {
            panic!("judge score already set");
        }

        submission.judge_score = Some(score);
        Self::_store_submission(&env, &submission);

        env.events().publish(
            (symbol_short!("judge"), symbol_short!("scored")),
            (submission_id, score),
        );
    }

    /// Explicit signal from the judge feed that every score has been
    /// committed; finalization requires it in addition to per-submission
    /// completeness.
    pub fn mark_judging_complete(env: Env, caller: Address, contest_id: u64) {
        env.storage()
            .instance()
            .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
        Self::_require_admin_or_judge(&env, &caller);

        let mut contest = Self::_load_contest(&env, contest_id);
        if contest.status == ContestStatus::Closed {
            panic!("contest not open");
        }
        contest.judging_complete = true;
        Self::_store_contest(&env, &contest);
    }

    // ─── voting ──────────────────────────────────────────────────────────

    pub fn cast_vote(env: Env, voter: Address, submission_id: u64) {
        env.storage()
            .instance()
            .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
        voter.require_auth();

        let mut submission = Self::_load_submission_opt(&env, submission_id)
            .unwrap_or_else(|| panic!("invalid submission"));
        if !submission.approved {
            panic!("invalid submission");
        }

        let contest = Self::_load_contest(&env, submission.contest_id);
        if contest.status != ContestStatus::Active {
            panic!("contest not open");
        }
        let now = env.ledger().timestamp();
        if now < contest.starts_at || now > contest.ends_at {
            panic!("contest not open");
        }

        // Uniqueness is keyed on the contest, so a voter cannot split votes
        // across submissions.
        if env
            .storage()
            .persistent()
            .has(&DataKey::HasVoted(contest.contest_id, voter.clone()))
        {
            panic!("already voted");
        }

        let vote = Vote {
            submission_id,
            voted_at: env.ledger().timestamp(),
        };

        // Vote row and counter move in the same invocation; they can never
        // diverge.
        let _ttl_key = DataKey::Vote(contest.contest_id, voter.clone());
        env.storage().persistent().set(&_ttl_key, &vote);
        env.storage().persistent().extend_ttl(
            &_ttl_key,
            PERSISTENT_LIFETIME_THRESHOLD,
            PERSISTENT_BUMP_AMOUNT,
        );
        let _ttl_key = DataKey::HasVoted(contest.contest_id, voter.clone());
        env.storage().persistent().set(&_ttl_key, &true);
        env.storage().persistent().extend_ttl(
            &_ttl_key,
            PERSISTENT_LIFETIME_THRESHOLD,
            PERSISTENT_BUMP_AMOUNT,
        );

        submission.vote_count += 1;
        Self::_store_submission(&env, &submission);

        env.events().publish(
            (symbol_short!("vote"), symbol_short!("cast")),
            (contest.contest_id, submission_id, voter),
        );
    }

    // ─── ranking ─────────────────────────────────────────────────────────

    /// One-shot Active → Closed transition. Recovery after a crash returns
    /// the committed ranking instead of recomputing.
    pub fn finalize_ranking(env: Env, admin: Address, contest_id: u64) -> Vec<RankingEntry> {
        env.storage()
            .instance()
            .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
        atelier_common_admin::require_admin(&env, &DataKey::Admin, &admin);

        if let Some(existing) = env
            .storage()
            .persistent()
            .get::<DataKey, Vec<RankingEntry>>(&DataKey::Ranking(contest_id))
        {
            return existing;
        }

        let mut contest = Self::_load_contest(&env, contest_id);
        if contest.status != ContestStatus::Active {
            panic!("invalid state transition");
        }
        if !contest.judging_complete {
            panic!("judging incomplete");
        }

        let list: Vec<u64> = env
            .storage()
            .persistent()
            .get(&DataKey::SubmissionList(contest_id))
            .unwrap();

        // Collect approved submissions, insisting on a committed judge
        // score for each.
        let mut max_votes: u64 = 0;
        let mut approved: Vec<Submission> = Vec::new(&env);
        for submission_id in list.iter() {
            let submission = Self::_load_submission(&env, submission_id);
            if !submission.approved {
                continue;
            }
            if submission.judge_score.is_none() {
                panic!("judging incomplete");
            }
            if submission.vote_count > max_votes {
                max_votes = submission.vote_count;
            }
            approved.push_back(submission);
        }

        let mut sorted: Vec<ScoredSubmission> = Vec::new(&env);
        for submission in approved.iter() {
            let community_score = if max_votes == 0 {
                0u32
            } else {
                (submission.vote_count * 100 / max_votes) as u32
            };
            let judge_score = submission.judge_score.unwrap();
            let scored = ScoredSubmission {
                submission_id: submission.submission_id,
                community_score,
                judge_score,
                final_score: community_score * COMMUNITY_WEIGHT_PCT
                    + judge_score * JUDGE_WEIGHT_PCT,
                created_at: submission.created_at,
            };
            Self::_insert_sorted(&mut sorted, scored);
        }

        let mut ranking: Vec<RankingEntry> = Vec::new(&env);
        for i in 0..sorted.len() {
            let scored = sorted.get(i).unwrap();
            ranking.push_back(RankingEntry {
                submission_id: scored.submission_id,
                community_score: scored.community_score,
                judge_score: scored.judge_score,
                final_score: scored.final_score,
                rank: i + 1,
            });
        }

        // Ranking commit and status flip happen in this single invocation.
        let _ttl_key = DataKey::Ranking(contest_id);
        env.storage().persistent().set(&_ttl_key, &ranking);
        env.storage().persistent().extend_ttl(
            &_ttl_key,
            PERSISTENT_LIFETIME_THRESHOLD,
            PERSISTENT_BUMP_AMOUNT,
        );
        contest.status = ContestStatus::Closed;
        Self::_store_contest(&env, &contest);

        env.events().publish(
            (symbol_short!("ranking"), symbol_short!("final")),
            (contest_id, ranking.len()),
        );

        ranking
    }

    // ─── read-only surface ───────────────────────────────────────────────

    pub fn get_contest(env: Env, contest_id: u64) -> Option<Contest> {
        env.storage()
            .instance()
            .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
        env.storage().persistent().get(&DataKey::Contest(contest_id))
    }

    pub fn get_submission(env: Env, submission_id: u64) -> Option<Submission> {
        env.storage()
            .instance()
            .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
        env.storage()
            .persistent()
            .get(&DataKey::Submission(submission_id))
    }

    pub fn get_submission_owner(env: Env, submission_id: u64) -> Address {
        env.storage()
            .instance()
            .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
        let submission: Submission = env
            .storage()
            .persistent()
            .get(&DataKey::Submission(submission_id))
            .unwrap_or_else(|| panic!("invalid submission"));
        submission.owner
    }

    pub fn get_ranking(env: Env, contest_id: u64) -> Option<Vec<RankingEntry>> {
        env.storage()
            .instance()
            .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
        env.storage().persistent().get(&DataKey::Ranking(contest_id))
    }

    pub fn has_voted(env: Env, contest_id: u64, voter: Address) -> bool {
        env.storage()
            .instance()
            .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
        env.storage()
            .persistent()
            .has(&DataKey::HasVoted(contest_id, voter))
    }

    pub fn get_vote(env: Env, contest_id: u64, voter: Address) -> Option<Vote> {
        env.storage()
            .instance()
            .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
        env.storage().persistent().get(&DataKey::Vote(contest_id, voter))
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

    fn _require_admin_or_judge(env: &Env, caller: &Address) {
        caller.require_auth();
        let admin: Address = env.storage().instance().get(&DataKey::Admin).unwrap();
        if *caller == admin {
            return;
        }
        let judge: Option<Address> = env.storage().instance().get(&DataKey::Judge);
        match judge {
            Some(judge) if *caller == judge => {}
            _ => panic!("unauthorized"),
        }
    }

    /// Descending by final score; ties go to the earlier submission, then
    /// the lower id, so the order is total and replayable.
    fn _insert_sorted(sorted: &mut Vec<ScoredSubmission>, entry: ScoredSubmission) {
        let mut pos = sorted.len();
        for i in 0..sorted.len() {
            let existing = sorted.get(i).unwrap();
            if Self::_ranks_before(&entry, &existing) {
                pos = i;
                break;
            }
        }
        sorted.insert(pos, entry);
    }

    fn _ranks_before(a: &ScoredSubmission, b: &ScoredSubmission) -> bool {
        if a.final_score != b.final_score {
            return a.final_score > b.final_score;
        }
        if a.created_at != b.created_at {
            return a.created_at < b.created_at;
        }
        a.submission_id < b.submission_id
    }

    fn _load_contest(env: &Env, contest_id: u64) -> Contest {
        env.storage()
            .persistent()
            .get(&DataKey::Contest(contest_id))
            .unwrap_or_else(|| panic!("contest not found"))
    }

    fn _store_contest(env: &Env, contest: &Contest) {
        let _ttl_key = DataKey::Contest(contest.contest_id);
        env.storage().persistent().set(&_ttl_key, contest);
        env.storage().persistent().extend_ttl(
            &_ttl_key,
            PERSISTENT_LIFETIME_THRESHOLD,
            PERSISTENT_BUMP_AMOUNT,
        );
    }

    fn _load_submission(env: &Env, submission_id: u64) -> Submission {
        Self::_load_submission_opt(env, submission_id)
            .unwrap_or_else(|| panic!("submission not found"))
    }

    fn _load_submission_opt(env: &Env, submission_id: u64) -> Option<Submission> {
        env.storage()
            .persistent()
            .get(&DataKey::Submission(submission_id))
    }

    fn _store_submission(env: &Env, submission: &Submission) {
        let _ttl_key = DataKey::Submission(submission.submission_id);
        env.storage().persistent().set(&_ttl_key, submission);
        env.storage().persistent().extend_ttl(
            &_ttl_key,
            PERSISTENT_LIFETIME_THRESHOLD,
            PERSISTENT_BUMP_AMOUNT,
        );
    }
}
