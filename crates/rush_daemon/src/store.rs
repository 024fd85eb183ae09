//! In-memory backend tables: users, leaderboard, coupons, purchases.
//!
//! Everything lives behind one mutex in `AppState`; the sim never touches
//! this store, so a backend failure can never stall a running shift.

use ahash::AHashMap;
use serde::Serialize;
use uuid::Uuid;

#[derive(Clone, Serialize)]
pub struct UserRecord {
    pub id: String,
    pub device_id: String,
    pub name: String,
}

#[derive(Clone, Serialize)]
pub struct ScoreRecord {
    pub id: String,
    pub name: String,
    pub score: u64,
    pub shift_reached: usize,
    pub grade: String,
    pub user_id: Option<String>,
}

#[derive(Clone)]
pub struct Coupon {
    pub reward_coins: u64,
    pub active: bool,
    pub max_uses: u32,
    pub current_uses: u32,
}

#[derive(Clone, Serialize)]
pub struct PurchaseRecord {
    pub id: String,
    pub transaction_id: String,
    pub item_id: String,
    pub user_id: Option<String>,
}

pub enum RedeemOutcome {
    Valid { reward_coins: u64 },
    Invalid { reason: &'static str },
}

#[derive(Default)]
pub struct BackendStore {
    users: AHashMap<String, UserRecord>,
    device_index: AHashMap<String, String>,
    scores: Vec<ScoreRecord>,
    coupons: AHashMap<String, Coupon>,
    purchases: AHashMap<String, PurchaseRecord>,
}

/// Coupon codes match case-insensitively and ignore surrounding whitespace.
fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

impl BackendStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_coupon(&mut self, code: &str, reward_coins: u64, max_uses: u32) {
        self.coupons.insert(
            normalize_code(code),
            Coupon {
                reward_coins,
                active: true,
                max_uses,
                current_uses: 0,
            },
        );
    }

    /// Looks up the user for this device, creating one on first contact.
    /// A changed name re-associates: the existing record is renamed in
    /// place, keeping its id and score history.
    pub fn get_or_create_user(&mut self, device_id: &str, name: &str) -> UserRecord {
        if let Some(user_id) = self.device_index.get(device_id) {
            let user = self
                .users
                .get_mut(user_id)
                .unwrap_or_else(|| panic!("device index points at missing user {user_id}"));
            if user.name != name {
                user.name = name.to_string();
            }
            return user.clone();
        }
        let user = UserRecord {
            id: Uuid::new_v4().to_string(),
            device_id: device_id.to_string(),
            name: name.to_string(),
        };
        self.device_index
            .insert(device_id.to_string(), user.id.clone());
        self.users.insert(user.id.clone(), user.clone());
        user
    }

    pub fn submit_score(
        &mut self,
        name: &str,
        score: u64,
        shift_reached: usize,
        grade: &str,
        user_id: Option<String>,
    ) -> String {
        let id = Uuid::new_v4().to_string();
        self.scores.push(ScoreRecord {
            id: id.clone(),
            name: name.to_string(),
            score,
            shift_reached,
            grade: grade.to_string(),
            user_id,
        });
        id
    }

    pub fn top_scores(&self, limit: usize) -> Vec<ScoreRecord> {
        let mut list = self.scores.clone();
        list.sort_by(|a, b| b.score.cmp(&a.score));
        list.truncate(limit);
        list
    }

    pub fn user_scores(&self, user_id: &str, limit: usize) -> Vec<ScoreRecord> {
        let mut list: Vec<ScoreRecord> = self
            .scores
            .iter()
            .filter(|s| s.user_id.as_deref() == Some(user_id))
            .cloned()
            .collect();
        list.sort_by(|a, b| b.score.cmp(&a.score));
        list.truncate(limit);
        list
    }

    /// 1-based position a given score would earn on the board.
    pub fn rank(&self, score: u64) -> usize {
        self.scores.iter().filter(|s| s.score > score).count() + 1
    }

    /// An exhausted coupon reports `expired` and does NOT bump its usage
    /// counter, so the count stays an accurate redemption tally.
    pub fn redeem(&mut self, code: &str) -> RedeemOutcome {
        let normalized = normalize_code(code);
        let Some(coupon) = self.coupons.get_mut(&normalized) else {
            return RedeemOutcome::Invalid { reason: "invalid" };
        };
        if !coupon.active {
            return RedeemOutcome::Invalid { reason: "invalid" };
        }
        if coupon.current_uses >= coupon.max_uses {
            return RedeemOutcome::Invalid { reason: "expired" };
        }
        coupon.current_uses += 1;
        RedeemOutcome::Valid {
            reward_coins: coupon.reward_coins,
        }
    }

    /// Records a purchase keyed by the payment provider's transaction id.
    /// Replays return the original record with `created = false`.
    pub fn record_purchase(
        &mut self,
        transaction_id: &str,
        item_id: &str,
        user_id: Option<String>,
    ) -> (PurchaseRecord, bool) {
        if let Some(existing) = self.purchases.get(transaction_id) {
            return (existing.clone(), false);
        }
        let record = PurchaseRecord {
            id: Uuid::new_v4().to_string(),
            transaction_id: transaction_id.to_string(),
            item_id: item_id.to_string(),
            user_id,
        };
        self.purchases
            .insert(transaction_id.to_string(), record.clone());
        (record, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_or_create_user_is_stable_per_device() {
        let mut store = BackendStore::new();

        let first = store.get_or_create_user("device-a", "Mona");
        let second = store.get_or_create_user("device-a", "Mona");

        assert_eq!(first.id, second.id);
    }

    #[test]
    fn test_name_change_reassociates_same_user() {
        let mut store = BackendStore::new();
        let original = store.get_or_create_user("device-a", "Mona");

        let renamed = store.get_or_create_user("device-a", "Lisa");

        assert_eq!(renamed.id, original.id, "rename keeps the user id");
        assert_eq!(renamed.name, "Lisa");
    }

    #[test]
    fn test_top_scores_ordered_descending() {
        let mut store = BackendStore::new();
        store.submit_score("a", 100, 1, "B", None);
        store.submit_score("b", 300, 2, "A", None);
        store.submit_score("c", 200, 1, "B", None);

        let top = store.top_scores(2);

        assert_eq!(top.len(), 2);
        assert_eq!(top[0].score, 300);
        assert_eq!(top[1].score, 200);
    }

    #[test]
    fn test_user_scores_filters_by_owner() {
        let mut store = BackendStore::new();
        let user = store.get_or_create_user("device-a", "Mona");
        store.submit_score("Mona", 100, 1, "B", Some(user.id.clone()));
        store.submit_score("guest", 500, 3, "S", None);

        let mine = store.user_scores(&user.id, 10);

        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].score, 100);
    }

    #[test]
    fn test_rank_counts_strictly_higher_scores() {
        let mut store = BackendStore::new();
        store.submit_score("a", 300, 1, "A", None);
        store.submit_score("b", 200, 1, "B", None);
        store.submit_score("c", 200, 1, "B", None);

        assert_eq!(store.rank(400), 1);
        assert_eq!(store.rank(250), 2);
        assert_eq!(store.rank(200), 2, "ties do not push the rank down");
        assert_eq!(store.rank(0), 4);
    }

    #[test]
    fn test_redeem_normalizes_code() {
        let mut store = BackendStore::new();
        store.add_coupon("WELCOME10", 10, 5);

        let outcome = store.redeem("  welcome10 ");

        assert!(matches!(outcome, RedeemOutcome::Valid { reward_coins: 10 }));
    }

    #[test]
    fn test_unknown_code_is_invalid() {
        let mut store = BackendStore::new();

        let outcome = store.redeem("NOPE");

        assert!(matches!(
            outcome,
            RedeemOutcome::Invalid { reason: "invalid" }
        ));
    }

    #[test]
    fn test_exhausted_coupon_expires_without_counting() {
        let mut store = BackendStore::new();
        store.add_coupon("ONCE", 25, 1);

        assert!(matches!(store.redeem("ONCE"), RedeemOutcome::Valid { .. }));
        let outcome = store.redeem("ONCE");

        assert!(matches!(
            outcome,
            RedeemOutcome::Invalid { reason: "expired" }
        ));
        assert_eq!(
            store.coupons[&normalize_code("ONCE")].current_uses,
            1,
            "a failed redemption must not bump the usage counter"
        );
    }

    #[test]
    fn test_purchase_replay_is_idempotent() {
        let mut store = BackendStore::new();

        let (first, created) = store.record_purchase("txn-1", "powerup_auto", None);
        assert!(created);

        let (replay, created) = store.record_purchase("txn-1", "powerup_auto", None);
        assert!(!created);
        assert_eq!(replay.id, first.id);
    }
}
