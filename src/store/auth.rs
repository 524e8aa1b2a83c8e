use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::{hash_password, verify_password};
use crate::clock::SharedClock;
use crate::models::{Account, ClubAccount, Role, SubscriptionPlan, SubscriptionStatus};
use crate::storage::{AUTH_STORAGE_KEY, KvStore, Persister, hydrate};

pub const OWNER_USERNAME: &str = "TheBagroomCaddy";
const OWNER_PASSWORD: &str = "Ikesplace1";
pub const OWNER_ID: &str = "owner";

/// Persisted shape of `auth-storage`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthState {
    #[serde(default)]
    pub club_accounts: Vec<ClubAccount>,
}

/// One row of the owner dashboard.
#[derive(Debug, Clone)]
pub struct AccountSummary {
    pub account: ClubAccount,
    pub status: SubscriptionStatus,
    pub days_left: i64,
}

pub struct AuthStore {
    state: RwLock<AuthState>,
    persister: Persister,
    clock: SharedClock,
}

pub fn owner_account() -> Account {
    Account {
        id: OWNER_ID.to_string(),
        username: OWNER_USERNAME.to_string(),
        email: "owner@thebagroomcaddy.com".to_string(),
        club_name: "The Bagroom Caddy".to_string(),
        role: Role::Owner,
    }
}

impl AuthStore {
    pub fn new(state: AuthState, persister: Persister, clock: SharedClock) -> Self {
        Self {
            state: RwLock::new(state),
            persister,
            clock,
        }
    }

    pub async fn load<K: KvStore>(kv: &K, persister: Persister, clock: SharedClock) -> Result<Self, K::Error> {
        let state: AuthState = hydrate(kv, AUTH_STORAGE_KEY).await?;
        tracing::info!(clubs = state.club_accounts.len(), "loaded auth storage");
        Ok(Self::new(state, persister, clock))
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    fn mutate(&self, f: impl FnOnce(&mut AuthState) -> bool) -> bool {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        let changed = f(&mut state);
        if changed {
            match serde_json::to_string(&*state) {
                Ok(json) => self.persister.set(AUTH_STORAGE_KEY, json),
                Err(e) => tracing::error!("Failed to serialize auth storage: {e}"),
            }
        }
        changed
    }

    fn find_club(&self, f: impl Fn(&ClubAccount) -> bool) -> Option<ClubAccount> {
        let state = self.state.read().unwrap_or_else(|e| e.into_inner());
        state.club_accounts.iter().find(|a| f(a)).cloned()
    }

    /// Owner credentials first, then club accounts whose trial or
    /// subscription is still running. Expired clubs cannot sign in.
    pub fn login(&self, username: &str, password: &str) -> Option<Account> {
        if username == OWNER_USERNAME && password == OWNER_PASSWORD {
            tracing::info!("owner signed in");
            return Some(owner_account());
        }

        let club = self.find_club(|a| a.username == username)?;
        if !verify_password(password, &club.password_hash) {
            tracing::info!(username, "login rejected: bad password");
            return None;
        }

        let status = club.subscription_status(self.now());
        if !status.is_active() {
            tracing::info!(username, "login rejected: subscription expired");
            return None;
        }

        tracing::info!(username, status = status.label(), "club signed in");
        Some(club.to_account())
    }

    /// Resolve a signed-in account id back to its account. Deleted clubs
    /// resolve to `None`.
    pub fn find_account(&self, account_id: &str) -> Option<Account> {
        if account_id == OWNER_ID {
            return Some(owner_account());
        }
        self.find_club(|a| a.id == account_id).map(|a| a.to_account())
    }

    pub fn subscription_status(&self, account: &Account) -> SubscriptionStatus {
        match account.role {
            Role::Owner => SubscriptionStatus::Unlimited,
            Role::Club => self
                .find_club(|a| a.id == account.id)
                .map(|a| a.subscription_status(self.now()))
                .unwrap_or(SubscriptionStatus::Expired),
        }
    }

    pub fn is_subscription_active(&self, account: &Account) -> bool {
        self.subscription_status(account).is_active()
    }

    pub fn username_taken(&self, username: &str) -> bool {
        username == OWNER_USERNAME || self.find_club(|a| a.username == username).is_some()
    }

    fn insert_club(&self, email: &str, username: &str, password: &str, club_name: &str) -> Option<ClubAccount> {
        if [email, username, password, club_name].iter().any(|f| f.trim().is_empty()) {
            return None;
        }
        if self.username_taken(username) {
            tracing::info!(username, "club account rejected: username taken");
            return None;
        }

        let password_hash = match hash_password(password) {
            Ok(hash) => hash,
            Err(e) => {
                tracing::error!("Failed to hash password: {e}");
                return None;
            }
        };

        let now = self.now();
        let club = ClubAccount {
            id: Uuid::new_v4().to_string(),
            email: email.trim().to_string(),
            username: username.to_string(),
            password_hash,
            club_name: club_name.trim().to_string(),
            created_at: now,
            trial_started: now,
            subscription_plan: None,
            subscription_expiry: None,
        };

        let created = club.clone();
        let inserted = self.mutate(|state| {
            // re-check under the write lock
            if state.club_accounts.iter().any(|a| a.username == club.username) {
                return false;
            }
            state.club_accounts.push(club);
            true
        });

        if inserted {
            tracing::info!(username, club = %created.club_name, "club account created");
            Some(created)
        } else {
            None
        }
    }

    /// Owner-only. Rejects empty fields and duplicate usernames.
    pub fn create_club_account(
        &self,
        actor: &Account,
        email: &str,
        username: &str,
        password: &str,
        club_name: &str,
    ) -> bool {
        if !actor.is_owner() {
            tracing::warn!(actor = %actor.username, "non-owner tried to create a club account");
            return false;
        }
        self.insert_club(email, username, password, club_name).is_some()
    }

    /// Self-service signup. Starts the trial and returns the new account.
    pub fn register(&self, email: &str, username: &str, password: &str, club_name: &str) -> Option<Account> {
        self.insert_club(email, username, password, club_name)
            .map(|club| club.to_account())
    }

    /// Owner-only.
    pub fn delete_club_account(&self, actor: &Account, account_id: &str) -> bool {
        if !actor.is_owner() {
            tracing::warn!(actor = %actor.username, "non-owner tried to delete a club account");
            return false;
        }
        self.mutate(|state| {
            let before = state.club_accounts.len();
            state.club_accounts.retain(|a| a.id != account_id);
            state.club_accounts.len() != before
        })
    }

    /// Starts `plan` for a club account now. Returns the new expiry.
    pub fn set_subscription(&self, account: &Account, plan: SubscriptionPlan) -> Option<DateTime<Utc>> {
        if account.role != Role::Club {
            return None;
        }
        let expiry = plan.expiry_from(self.now());
        let updated = self.mutate(|state| {
            let Some(club) = state.club_accounts.iter_mut().find(|a| a.id == account.id) else {
                return false;
            };
            club.subscription_plan = Some(plan);
            club.subscription_expiry = Some(expiry);
            true
        });
        if updated {
            tracing::info!(username = %account.username, ?plan, %expiry, "subscription set");
        }
        updated.then_some(expiry)
    }

    pub fn club_accounts(&self) -> Vec<ClubAccount> {
        self.state
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .club_accounts
            .clone()
    }

    pub fn account_summaries(&self) -> Vec<AccountSummary> {
        let now = self.now();
        self.club_accounts()
            .into_iter()
            .map(|account| {
                let status = account.subscription_status(now);
                AccountSummary {
                    days_left: status.days_left(now),
                    status,
                    account,
                }
            })
            .collect()
    }
}
