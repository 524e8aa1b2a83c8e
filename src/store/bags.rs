use std::collections::BTreeMap;
use std::sync::RwLock;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::clock::SharedClock;
use crate::models::{Bag, BagLocation, LocationCounts, Member, UserId};
use crate::storage::{BAG_STORAGE_KEY, KvStore, Persister, hydrate};

/// Persisted shape of `bag-storage`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BagState {
    #[serde(default)]
    pub bags: BTreeMap<UserId, Vec<Bag>>,
    #[serde(default)]
    pub members: BTreeMap<UserId, Vec<Member>>,
    #[serde(default)]
    pub starred_bags: BTreeMap<UserId, Vec<String>>,
}

/// Filters of the bags tab, applied together.
#[derive(Debug, Clone, Default)]
pub struct BagFilter {
    pub location: Option<BagLocation>,
    pub starred_only: bool,
    pub query: String,
}

pub struct BagStore {
    state: RwLock<BagState>,
    persister: Persister,
    clock: SharedClock,
}

fn matches_query(bag: &Bag, members: &[Member], lower_query: &str) -> bool {
    if bag.bag_number.to_lowercase().contains(lower_query) {
        return true;
    }
    members
        .iter()
        .find(|m| m.id == bag.member_id)
        .is_some_and(|m| {
            m.name.to_lowercase().contains(lower_query)
                || m.membership_id.to_lowercase().contains(lower_query)
        })
}

impl BagStore {
    pub fn new(state: BagState, persister: Persister, clock: SharedClock) -> Self {
        Self {
            state: RwLock::new(state),
            persister,
            clock,
        }
    }

    pub async fn load<K: KvStore>(kv: &K, persister: Persister, clock: SharedClock) -> Result<Self, K::Error> {
        let state: BagState = hydrate(kv, BAG_STORAGE_KEY).await?;
        tracing::info!(
            users = state.bags.len(),
            bags = state.bags.values().map(Vec::len).sum::<usize>(),
            "loaded bag storage"
        );
        Ok(Self::new(state, persister, clock))
    }

    fn read<R>(&self, f: impl FnOnce(&BagState) -> R) -> R {
        let state = self.state.read().unwrap_or_else(|e| e.into_inner());
        f(&state)
    }

    /// Apply `f` and, if it reports a change, queue a snapshot write.
    fn mutate(&self, f: impl FnOnce(&mut BagState) -> bool) -> bool {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        let changed = f(&mut state);
        if changed {
            match serde_json::to_string(&*state) {
                Ok(json) => self.persister.set(BAG_STORAGE_KEY, json),
                Err(e) => tracing::error!("Failed to serialize bag storage: {e}"),
            }
        }
        changed
    }

    pub fn add_bag(&self, user: &UserId, bag: Bag) {
        tracing::debug!(user = %user, bag = %bag.id, "adding bag");
        self.mutate(|state| {
            state.bags.entry(user.clone()).or_default().insert(0, bag);
            true
        });
    }

    pub fn add_member(&self, user: &UserId, member: Member) {
        self.mutate(|state| {
            state.members.entry(user.clone()).or_default().insert(0, member);
            true
        });
    }

    /// Removes the bag and unstars it. The member record stays.
    pub fn delete_bag(&self, user: &UserId, bag_id: &str) -> bool {
        self.mutate(|state| {
            let removed = state.bags.get_mut(user).is_some_and(|bags| {
                let before = bags.len();
                bags.retain(|b| b.id != bag_id);
                bags.len() != before
            });

            // the star goes whether or not the bag record was found
            let unstarred = state.starred_bags.get_mut(user).is_some_and(|starred| {
                let before = starred.len();
                starred.retain(|id| id != bag_id);
                starred.len() != before
            });

            removed || unstarred
        })
    }

    pub fn update_bag_location(&self, user: &UserId, bag_id: &str, location: BagLocation) -> bool {
        let now = self.clock.now();
        self.mutate(|state| {
            let Some(bag) = state
                .bags
                .get_mut(user)
                .and_then(|bags| bags.iter_mut().find(|b| b.id == bag_id))
            else {
                return false;
            };
            bag.location = location;
            // lastUpdated never moves backwards or stands still
            bag.last_updated = now.max(bag.last_updated + Duration::nanoseconds(1));
            true
        })
    }

    pub fn update_bag_notes(&self, user: &UserId, bag_id: &str, notes: String) -> bool {
        self.mutate(|state| {
            let Some(bag) = state
                .bags
                .get_mut(user)
                .and_then(|bags| bags.iter_mut().find(|b| b.id == bag_id))
            else {
                return false;
            };
            bag.notes = Some(notes);
            true
        })
    }

    /// Returns the starred state after the toggle.
    pub fn toggle_star_bag(&self, user: &UserId, bag_id: &str) -> bool {
        let mut starred_now = false;
        self.mutate(|state| {
            let starred = state.starred_bags.entry(user.clone()).or_default();
            if let Some(pos) = starred.iter().position(|id| id == bag_id) {
                starred.remove(pos);
            } else {
                starred.push(bag_id.to_string());
                starred_now = true;
            }
            true
        });
        starred_now
    }

    pub fn bags(&self, user: &UserId) -> Vec<Bag> {
        self.read(|state| state.bags.get(user).cloned().unwrap_or_default())
    }

    pub fn members(&self, user: &UserId) -> Vec<Member> {
        self.read(|state| state.members.get(user).cloned().unwrap_or_default())
    }

    pub fn get_bag_by_id(&self, user: &UserId, bag_id: &str) -> Option<Bag> {
        self.read(|state| {
            state
                .bags
                .get(user)
                .and_then(|bags| bags.iter().find(|b| b.id == bag_id).cloned())
        })
    }

    pub fn get_member_by_id(&self, user: &UserId, member_id: &str) -> Option<Member> {
        self.read(|state| {
            state
                .members
                .get(user)
                .and_then(|members| members.iter().find(|m| m.id == member_id).cloned())
        })
    }

    pub fn get_bags_by_location(&self, user: &UserId, location: BagLocation) -> Vec<Bag> {
        self.read(|state| {
            state
                .bags
                .get(user)
                .map(|bags| bags.iter().filter(|b| b.location == location).cloned().collect())
                .unwrap_or_default()
        })
    }

    pub fn get_bags_for_member(&self, user: &UserId, member_id: &str) -> Vec<Bag> {
        self.read(|state| {
            state
                .bags
                .get(user)
                .map(|bags| bags.iter().filter(|b| b.member_id == member_id).cloned().collect())
                .unwrap_or_default()
        })
    }

    pub fn get_location_counts(&self, user: &UserId) -> LocationCounts {
        self.read(|state| {
            let mut counts = LocationCounts::default();
            for bag in state.bags.get(user).into_iter().flatten() {
                match bag.location {
                    BagLocation::Bagroom => counts.bagroom += 1,
                    BagLocation::Player => counts.player += 1,
                    BagLocation::Course => counts.course += 1,
                }
            }
            counts
        })
    }

    /// Case-insensitive match of `query` against bag number, member name or
    /// membership id. An empty query returns the whole partition.
    pub fn get_filtered_bags(&self, user: &UserId, query: &str) -> Vec<Bag> {
        self.list_bags(
            user,
            &BagFilter {
                query: query.to_string(),
                ..BagFilter::default()
            },
        )
    }

    pub fn get_starred_bags(&self, user: &UserId) -> Vec<Bag> {
        self.read(|state| {
            let Some(starred) = state.starred_bags.get(user) else {
                return Vec::new();
            };
            state
                .bags
                .get(user)
                .map(|bags| bags.iter().filter(|b| starred.contains(&b.id)).cloned().collect())
                .unwrap_or_default()
        })
    }

    pub fn is_bag_starred(&self, user: &UserId, bag_id: &str) -> bool {
        self.read(|state| {
            state
                .starred_bags
                .get(user)
                .is_some_and(|starred| starred.iter().any(|id| id == bag_id))
        })
    }

    pub fn starred_ids(&self, user: &UserId) -> Vec<String> {
        self.read(|state| state.starred_bags.get(user).cloned().unwrap_or_default())
    }

    pub fn list_bags(&self, user: &UserId, filter: &BagFilter) -> Vec<Bag> {
        let lower_query = filter.query.to_lowercase();
        self.read(|state| {
            let members = state.members.get(user).map(Vec::as_slice).unwrap_or_default();
            let starred = state.starred_bags.get(user).map(Vec::as_slice).unwrap_or_default();

            state
                .bags
                .get(user)
                .into_iter()
                .flatten()
                .filter(|bag| filter.location.is_none_or(|loc| bag.location == loc))
                .filter(|bag| !filter.starred_only || starred.contains(&bag.id))
                .filter(|bag| lower_query.is_empty() || matches_query(bag, members, &lower_query))
                .cloned()
                .collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{Clock, ManualClock};
    use crate::storage::MemoryKv;
    use chrono::{TimeZone, Utc};
    use std::sync::Arc;

    struct Fixture {
        store: BagStore,
        clock: Arc<ManualClock>,
        kv: MemoryKv,
        persister: Persister,
    }

    fn fixture() -> Fixture {
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap()));
        let kv = MemoryKv::new();
        let persister = Persister::spawn(kv.clone());
        let store = BagStore::new(BagState::default(), persister.clone(), clock.clone());
        Fixture { store, clock, kv, persister }
    }

    fn seed(f: &Fixture, user: &UserId, name: &str, membership: &str, number: &str) -> Bag {
        let member = Member::new(name.into(), membership.into());
        let bag = Bag::new(member.id.clone(), number.into(), BagLocation::Bagroom, f.clock.now());
        f.store.add_member(user, member);
        f.store.add_bag(user, bag.clone());
        bag
    }

    #[tokio::test]
    async fn add_bag_prepends() {
        let f = fixture();
        let user = UserId::for_tests("u1");
        let first = seed(&f, &user, "Ike", "M-1", "101");
        let second = seed(&f, &user, "Ann", "M-2", "102");

        let ids: Vec<_> = f.store.bags(&user).into_iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[tokio::test]
    async fn location_update_refreshes_timestamp() {
        let f = fixture();
        let user = UserId::for_tests("u1");
        let bag = seed(&f, &user, "Ike", "M-1", "101");

        f.clock.advance(Duration::minutes(5));
        assert!(f.store.update_bag_location(&user, &bag.id, BagLocation::Course));

        let updated = f.store.get_bag_by_id(&user, &bag.id).unwrap();
        assert_eq!(updated.location, BagLocation::Course);
        assert!(updated.last_updated > bag.last_updated);
    }

    #[tokio::test]
    async fn location_update_is_strictly_increasing_with_frozen_clock() {
        let f = fixture();
        let user = UserId::for_tests("u1");
        let bag = seed(&f, &user, "Ike", "M-1", "101");

        f.store.update_bag_location(&user, &bag.id, BagLocation::Player);
        let once = f.store.get_bag_by_id(&user, &bag.id).unwrap().last_updated;
        f.store.update_bag_location(&user, &bag.id, BagLocation::Bagroom);
        let twice = f.store.get_bag_by_id(&user, &bag.id).unwrap().last_updated;

        assert!(once > bag.last_updated);
        assert!(twice > once);
    }

    #[tokio::test]
    async fn delete_bag_unstars_and_keeps_member() {
        let f = fixture();
        let user = UserId::for_tests("u1");
        let bag = seed(&f, &user, "Ike", "M-1", "101");
        f.store.toggle_star_bag(&user, &bag.id);
        assert!(f.store.is_bag_starred(&user, &bag.id));

        assert!(f.store.delete_bag(&user, &bag.id));

        assert!(f.store.get_bag_by_id(&user, &bag.id).is_none());
        assert!(!f.store.is_bag_starred(&user, &bag.id));
        assert!(f.store.get_member_by_id(&user, &bag.member_id).is_some());
    }

    #[tokio::test]
    async fn delete_unstars_when_partition_has_no_bags() {
        let f = fixture();
        let user = UserId::for_tests("u1");
        f.store.toggle_star_bag(&user, "b1");
        assert!(f.store.is_bag_starred(&user, "b1"));

        assert!(f.store.delete_bag(&user, "b1"));
        assert!(!f.store.is_bag_starred(&user, "b1"));
    }

    #[tokio::test]
    async fn delete_of_star_only_id_is_persisted() {
        let f = fixture();
        let user = UserId::for_tests("u1");
        seed(&f, &user, "Ike", "M-1", "101");
        f.store.toggle_star_bag(&user, "ghost");

        assert!(f.store.delete_bag(&user, "ghost"));
        assert!(!f.store.is_bag_starred(&user, "ghost"));
        f.persister.flush().await;

        let reloaded = BagStore::load(&f.kv, f.persister.clone(), f.clock.clone()).await.unwrap();
        assert!(!reloaded.is_bag_starred(&user, "ghost"));
        assert_eq!(reloaded.bags(&user).len(), 1);
    }

    #[tokio::test]
    async fn toggle_star_twice_restores() {
        let f = fixture();
        let user = UserId::for_tests("u1");
        let bag = seed(&f, &user, "Ike", "M-1", "101");

        assert!(f.store.toggle_star_bag(&user, &bag.id));
        assert!(!f.store.toggle_star_bag(&user, &bag.id));
        assert!(!f.store.is_bag_starred(&user, &bag.id));
        assert!(f.store.get_starred_bags(&user).is_empty());
    }

    #[tokio::test]
    async fn filtered_bags_empty_query_is_identity() {
        let f = fixture();
        let user = UserId::for_tests("u1");
        seed(&f, &user, "Ike", "M-1", "101");
        seed(&f, &user, "Ann", "M-2", "102");

        assert_eq!(f.store.get_filtered_bags(&user, ""), f.store.bags(&user));
    }

    #[tokio::test]
    async fn filtered_bags_matches_number_name_and_membership() {
        let f = fixture();
        let user = UserId::for_tests("u1");
        let ike = seed(&f, &user, "Ike Eisenhower", "GOLF-77", "101");
        let ann = seed(&f, &user, "Ann Sorenstam", "M-2", "202");

        let by_name: Vec<_> = f.store.get_filtered_bags(&user, "eisen").into_iter().map(|b| b.id).collect();
        assert_eq!(by_name, vec![ike.id.clone()]);

        let by_membership: Vec<_> = f.store.get_filtered_bags(&user, "golf-77").into_iter().map(|b| b.id).collect();
        assert_eq!(by_membership, vec![ike.id]);

        let by_number: Vec<_> = f.store.get_filtered_bags(&user, "202").into_iter().map(|b| b.id).collect();
        assert_eq!(by_number, vec![ann.id]);
    }

    #[tokio::test]
    async fn whitespace_query_is_matched_literally() {
        let f = fixture();
        let user = UserId::for_tests("u1");
        seed(&f, &user, "Ike", "M-1", "101");
        let ann = seed(&f, &user, "Ann Sorenstam", "M-2", "202");

        let ids: Vec<_> = f.store.get_filtered_bags(&user, " ").into_iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![ann.id]);
    }

    #[tokio::test]
    async fn location_counts_and_by_location() {
        let f = fixture();
        let user = UserId::for_tests("u1");
        let a = seed(&f, &user, "A", "1", "1");
        seed(&f, &user, "B", "2", "2");
        let c = seed(&f, &user, "C", "3", "3");
        f.store.update_bag_location(&user, &a.id, BagLocation::Player);
        f.store.update_bag_location(&user, &c.id, BagLocation::Course);

        let counts = f.store.get_location_counts(&user);
        assert_eq!(counts, LocationCounts { bagroom: 1, player: 1, course: 1 });
        assert_eq!(f.store.get_bags_by_location(&user, BagLocation::Player)[0].id, a.id);
    }

    #[tokio::test]
    async fn partitions_are_isolated() {
        let f = fixture();
        let alice = UserId::for_tests("alice");
        let bob = UserId::for_tests("bob");
        let bag = seed(&f, &alice, "Ike", "M-1", "101");

        assert!(f.store.bags(&bob).is_empty());
        assert!(f.store.get_bag_by_id(&bob, &bag.id).is_none());
        assert!(!f.store.update_bag_location(&bob, &bag.id, BagLocation::Course));
        assert!(!f.store.delete_bag(&bob, &bag.id));
        assert_eq!(f.store.get_bag_by_id(&alice, &bag.id).unwrap().location, BagLocation::Bagroom);
    }

    #[tokio::test]
    async fn missing_bag_is_a_silent_noop() {
        let f = fixture();
        let user = UserId::for_tests("u1");
        assert!(!f.store.update_bag_notes(&user, "nope", "x".into()));
        assert!(!f.store.delete_bag(&user, "nope"));
        f.persister.flush().await;
        assert!(f.kv.snapshot(BAG_STORAGE_KEY).is_none());
    }

    #[tokio::test]
    async fn state_survives_reload() {
        let f = fixture();
        let user = UserId::for_tests("u1");
        let bag = seed(&f, &user, "Ike", "M-1", "101");
        f.store.update_bag_notes(&user, &bag.id, "Left-handed".into());
        f.store.toggle_star_bag(&user, &bag.id);
        f.persister.flush().await;

        let reloaded = BagStore::load(&f.kv, f.persister.clone(), f.clock.clone()).await.unwrap();
        let restored = reloaded.get_bag_by_id(&user, &bag.id).unwrap();
        assert_eq!(restored.notes.as_deref(), Some("Left-handed"));
        assert!(reloaded.is_bag_starred(&user, &bag.id));
    }

    #[tokio::test]
    async fn combined_filter() {
        let f = fixture();
        let user = UserId::for_tests("u1");
        let a = seed(&f, &user, "Ike", "M-1", "101");
        let b = seed(&f, &user, "Ike Jr", "M-2", "102");
        f.store.toggle_star_bag(&user, &a.id);
        f.store.toggle_star_bag(&user, &b.id);
        f.store.update_bag_location(&user, &b.id, BagLocation::Course);

        let filter = BagFilter {
            location: Some(BagLocation::Bagroom),
            starred_only: true,
            query: "ike".into(),
        };
        let ids: Vec<_> = f.store.list_bags(&user, &filter).into_iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![a.id]);
    }
}
