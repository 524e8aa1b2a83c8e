use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Serialize};

pub const TRIAL_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Owner,
    Club,
}

/// Key of a user's data partition. Only obtainable from an authenticated
/// [`Account`], so store calls cannot name another user's partition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[cfg(test)]
    pub(crate) fn for_tests(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The signed-in identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    pub username: String,
    pub email: String,
    pub club_name: String,
    pub role: Role,
}

impl Account {
    pub fn user_id(&self) -> UserId {
        UserId(self.id.clone())
    }

    pub fn is_owner(&self) -> bool {
        self.role == Role::Owner
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionPlan {
    Monthly,
    Yearly,
}

impl SubscriptionPlan {
    /// Expiry of a plan bought at `now`, in calendar months.
    pub fn expiry_from(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let months = match self {
            SubscriptionPlan::Monthly => Months::new(1),
            SubscriptionPlan::Yearly => Months::new(12),
        };
        now.checked_add_months(months).unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    pub fn price(&self) -> &'static str {
        match self {
            SubscriptionPlan::Monthly => "$225",
            SubscriptionPlan::Yearly => "$2,500",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionStatus {
    /// The platform owner never expires.
    Unlimited,
    Subscribed { expires_at: DateTime<Utc> },
    Trial { expires_at: DateTime<Utc> },
    Expired,
}

impl SubscriptionStatus {
    pub fn is_active(&self) -> bool {
        !matches!(self, SubscriptionStatus::Expired)
    }

    pub fn label(&self) -> &'static str {
        match self {
            SubscriptionStatus::Unlimited => "Owner",
            SubscriptionStatus::Subscribed { .. } => "Subscribed",
            SubscriptionStatus::Trial { .. } => "Trial",
            SubscriptionStatus::Expired => "Expired",
        }
    }

    /// Whole days remaining, rounded up. Zero once expired.
    pub fn days_left(&self, now: DateTime<Utc>) -> i64 {
        let expires_at = match self {
            SubscriptionStatus::Subscribed { expires_at } | SubscriptionStatus::Trial { expires_at } => {
                *expires_at
            }
            SubscriptionStatus::Unlimited | SubscriptionStatus::Expired => return 0,
        };
        let remaining = expires_at - now;
        if remaining <= Duration::zero() {
            return 0;
        }
        let day = Duration::days(1).num_milliseconds();
        (remaining.num_milliseconds() + day - 1) / day
    }
}

/// A tenant club managed by the owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClubAccount {
    pub id: String,
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub club_name: String,
    pub created_at: DateTime<Utc>,
    pub trial_started: DateTime<Utc>,
    #[serde(default)]
    pub subscription_plan: Option<SubscriptionPlan>,
    #[serde(default)]
    pub subscription_expiry: Option<DateTime<Utc>>,
}

impl ClubAccount {
    pub fn trial_ends(&self) -> DateTime<Utc> {
        self.trial_started + Duration::days(TRIAL_DAYS)
    }

    pub fn subscription_status(&self, now: DateTime<Utc>) -> SubscriptionStatus {
        if let (Some(_), Some(expiry)) = (self.subscription_plan, self.subscription_expiry) {
            if now < expiry {
                return SubscriptionStatus::Subscribed { expires_at: expiry };
            }
        }

        let trial_ends = self.trial_ends();
        if now < trial_ends {
            return SubscriptionStatus::Trial { expires_at: trial_ends };
        }

        SubscriptionStatus::Expired
    }

    pub fn to_account(&self) -> Account {
        Account {
            id: self.id.clone(),
            username: self.username.clone(),
            email: self.email.clone(),
            club_name: self.club_name.clone(),
            role: Role::Club,
        }
    }
}
