use std::collections::BTreeMap;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::clock::SharedClock;
use crate::models::{NewOrder, Order, OrderPriority, OrderStatus, StatusCounts, UserId};
use crate::storage::{KvStore, ORDER_STORAGE_KEY, Persister, hydrate};

/// Persisted shape of `order-storage`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderState {
    #[serde(default)]
    pub orders: BTreeMap<UserId, Vec<Order>>,
}

pub struct OrderStore {
    state: RwLock<OrderState>,
    persister: Persister,
    clock: SharedClock,
}

impl OrderStore {
    pub fn new(state: OrderState, persister: Persister, clock: SharedClock) -> Self {
        Self {
            state: RwLock::new(state),
            persister,
            clock,
        }
    }

    pub async fn load<K: KvStore>(kv: &K, persister: Persister, clock: SharedClock) -> Result<Self, K::Error> {
        let state: OrderState = hydrate(kv, ORDER_STORAGE_KEY).await?;
        tracing::info!(
            orders = state.orders.values().map(Vec::len).sum::<usize>(),
            "loaded order storage"
        );
        Ok(Self::new(state, persister, clock))
    }

    fn read<R>(&self, f: impl FnOnce(&[Order]) -> R, user: &UserId) -> R {
        let state = self.state.read().unwrap_or_else(|e| e.into_inner());
        f(state.orders.get(user).map(Vec::as_slice).unwrap_or_default())
    }

    fn mutate(&self, f: impl FnOnce(&mut OrderState) -> bool) -> bool {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        let changed = f(&mut state);
        if changed {
            match serde_json::to_string(&*state) {
                Ok(json) => self.persister.set(ORDER_STORAGE_KEY, json),
                Err(e) => tracing::error!("Failed to serialize order storage: {e}"),
            }
        }
        changed
    }

    fn update(&self, user: &UserId, order_id: &str, f: impl FnOnce(&mut Order)) -> bool {
        self.mutate(|state| {
            let Some(order) = state
                .orders
                .get_mut(user)
                .and_then(|orders| orders.iter_mut().find(|o| o.id == order_id))
            else {
                return false;
            };
            f(order);
            true
        })
    }

    pub fn create_order(&self, user: &UserId, new: NewOrder) -> Order {
        let now = self.clock.now();
        let order = Order {
            id: Uuid::new_v4().to_string(),
            bag_id: new.bag_id,
            member_id: new.member_id,
            order_type: new.order_type,
            status: new.status,
            priority: new.priority,
            description: new.description,
            requested_by: new.requested_by,
            created_at: now,
            updated_at: now,
            completed_at: None,
            notes: new.notes,
            target_location: new.target_location,
            estimated_cost: new.estimated_cost,
            due_date: new.due_date,
        };

        tracing::info!(user = %user, order = %order.id, kind = %order.order_type, "order created");
        let created = order.clone();
        self.mutate(|state| {
            state.orders.entry(user.clone()).or_default().insert(0, order);
            true
        });
        created
    }

    /// Moving to `completed` stamps `completedAt`. Leaving `completed` keeps
    /// the old stamp.
    pub fn update_order_status(&self, user: &UserId, order_id: &str, status: OrderStatus) -> bool {
        let now = self.clock.now();
        self.update(user, order_id, |order| {
            order.status = status;
            order.updated_at = now;
            if status == OrderStatus::Completed {
                order.completed_at = Some(now);
            }
        })
    }

    pub fn update_order_notes(&self, user: &UserId, order_id: &str, notes: String) -> bool {
        let now = self.clock.now();
        self.update(user, order_id, |order| {
            order.notes = Some(notes);
            order.updated_at = now;
        })
    }

    pub fn delete_order(&self, user: &UserId, order_id: &str) -> bool {
        self.mutate(|state| {
            state.orders.get_mut(user).is_some_and(|orders| {
                let before = orders.len();
                orders.retain(|o| o.id != order_id);
                orders.len() != before
            })
        })
    }

    pub fn orders(&self, user: &UserId) -> Vec<Order> {
        self.read(<[Order]>::to_vec, user)
    }

    pub fn get_order_by_id(&self, user: &UserId, order_id: &str) -> Option<Order> {
        self.read(|orders| orders.iter().find(|o| o.id == order_id).cloned(), user)
    }

    pub fn get_orders_by_status(&self, user: &UserId, status: OrderStatus) -> Vec<Order> {
        self.read(|orders| orders.iter().filter(|o| o.status == status).cloned().collect(), user)
    }

    pub fn get_orders_by_priority(&self, user: &UserId, priority: OrderPriority) -> Vec<Order> {
        self.read(|orders| orders.iter().filter(|o| o.priority == priority).cloned().collect(), user)
    }

    pub fn get_orders_for_bag(&self, user: &UserId, bag_id: &str) -> Vec<Order> {
        self.read(|orders| orders.iter().filter(|o| o.bag_id == bag_id).cloned().collect(), user)
    }

    pub fn get_status_counts(&self, user: &UserId) -> StatusCounts {
        self.read(
            |orders| {
                let mut counts = StatusCounts::default();
                for order in orders {
                    match order.status {
                        OrderStatus::Pending => counts.pending += 1,
                        OrderStatus::InProgress => counts.in_progress += 1,
                        OrderStatus::Completed => counts.completed += 1,
                        OrderStatus::Cancelled => counts.cancelled += 1,
                    }
                }
                counts
            },
            user,
        )
    }

    /// Orders tab listing: optional status filter, most urgent first, then
    /// newest first.
    pub fn list_orders(&self, user: &UserId, status: Option<OrderStatus>) -> Vec<Order> {
        let mut orders: Vec<Order> = self.read(
            |orders| {
                orders
                    .iter()
                    .filter(|o| status.is_none_or(|s| o.status == s))
                    .cloned()
                    .collect()
            },
            user,
        );
        orders.sort_by(|a, b| {
            b.priority
                .rank()
                .cmp(&a.priority.rank())
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        orders
    }
}
