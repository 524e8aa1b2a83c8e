pub mod auth;
pub mod bags;
pub mod orders;

pub use auth::AuthStore;
pub use bags::{BagFilter, BagStore};
pub use orders::OrderStore;

use std::sync::Arc;

use crate::clock::SharedClock;
use crate::storage::{KvStore, Persister};

/// The three stores sharing one write-through queue.
#[derive(Clone)]
pub struct Stores {
    pub bags: Arc<BagStore>,
    pub orders: Arc<OrderStore>,
    pub auth: Arc<AuthStore>,
    pub persister: Persister,
    pub clock: SharedClock,
}

impl Stores {
    /// Hydrate every store from `kv` and start the writer task.
    pub async fn load<K: KvStore + Clone>(kv: K, clock: SharedClock) -> Result<Self, K::Error> {
        let persister = Persister::spawn(kv.clone());
        let bags = BagStore::load(&kv, persister.clone(), clock.clone()).await?;
        let orders = OrderStore::load(&kv, persister.clone(), clock.clone()).await?;
        let auth = AuthStore::load(&kv, persister.clone(), clock.clone()).await?;

        Ok(Self {
            bags: Arc::new(bags),
            orders: Arc::new(orders),
            auth: Arc::new(auth),
            persister,
            clock,
        })
    }
}
