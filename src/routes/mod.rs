pub mod auth;
pub mod bags;
pub mod dashboard;
pub mod export;
pub mod members;
pub mod orders;
pub mod owner;

use chrono::{DateTime, Utc};

use crate::models::Account;

/// Fields every page layout needs.
pub struct Page {
    pub user: Option<Account>,
    pub static_hash: &'static str,
}

impl Page {
    pub fn new(user: Option<Account>) -> Self {
        Self {
            user,
            static_hash: crate::STATIC_HASH,
        }
    }

    pub fn is_owner(&self) -> bool {
        self.user.as_ref().is_some_and(Account::is_owner)
    }
}

pub(crate) fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.format("%b %-d, %Y %H:%M").to_string()
}

pub(crate) fn format_date(at: &DateTime<Utc>) -> String {
    at.format("%Y-%m-%d").to_string()
}

/// Empty or whitespace-only form values count as absent.
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
