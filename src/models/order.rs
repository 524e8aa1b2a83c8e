use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    Regroup,
    Move,
    Clean,
    Repair,
    Regrip,
    Ship,
    Storage,
    Maintenance,
}

impl OrderType {
    pub const ALL: [OrderType; 8] = [
        OrderType::Regroup,
        OrderType::Move,
        OrderType::Clean,
        OrderType::Repair,
        OrderType::Regrip,
        OrderType::Ship,
        OrderType::Storage,
        OrderType::Maintenance,
    ];

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.as_str() == value)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderType::Regroup => "regroup",
            OrderType::Move => "move",
            OrderType::Clean => "clean",
            OrderType::Repair => "repair",
            OrderType::Regrip => "regrip",
            OrderType::Ship => "ship",
            OrderType::Storage => "storage",
            OrderType::Maintenance => "maintenance",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            OrderType::Regroup => "Reorganize clubs in bag",
            OrderType::Move => "Move bag to different location",
            OrderType::Clean => "Clean bag and clubs",
            OrderType::Repair => "Repair bag or clubs",
            OrderType::Regrip => "Replace club grips",
            OrderType::Ship => "Ship bag to another location",
            OrderType::Storage => "Long-term storage",
            OrderType::Maintenance => "General maintenance",
        }
    }

    /// Only relocation orders carry a target location.
    pub fn has_target_location(&self) -> bool {
        matches!(self, OrderType::Move | OrderType::Ship)
    }
}

impl std::fmt::Display for OrderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 4] = [
        OrderStatus::Pending,
        OrderStatus::InProgress,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
    ];

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.as_str() == value)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::InProgress => "in_progress",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::InProgress => "In Progress",
            OrderStatus::Completed => "Completed",
            OrderStatus::Cancelled => "Cancelled",
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::InProgress)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderPriority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl OrderPriority {
    pub const ALL: [OrderPriority; 4] = [
        OrderPriority::Low,
        OrderPriority::Medium,
        OrderPriority::High,
        OrderPriority::Urgent,
    ];

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.as_str() == value)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderPriority::Low => "low",
            OrderPriority::Medium => "medium",
            OrderPriority::High => "high",
            OrderPriority::Urgent => "urgent",
        }
    }

    /// Sort weight, most pressing highest.
    pub fn rank(&self) -> u8 {
        match self {
            OrderPriority::Low => 1,
            OrderPriority::Medium => 2,
            OrderPriority::High => 3,
            OrderPriority::Urgent => 4,
        }
    }
}

impl std::fmt::Display for OrderPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub bag_id: String,
    pub member_id: String,
    #[serde(rename = "type")]
    pub order_type: OrderType,
    pub status: OrderStatus,
    pub priority: OrderPriority,
    pub description: String,
    pub requested_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_cost: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
}

/// Everything a caller supplies when creating an order. The store stamps
/// `id`, `createdAt` and `updatedAt`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub bag_id: String,
    pub member_id: String,
    pub order_type: OrderType,
    pub status: OrderStatus,
    pub priority: OrderPriority,
    pub description: String,
    pub requested_by: String,
    pub notes: Option<String>,
    pub target_location: Option<String>,
    pub estimated_cost: Option<f64>,
    pub due_date: Option<DateTime<Utc>>,
}

impl NewOrder {
    pub fn new(
        bag_id: String,
        member_id: String,
        order_type: OrderType,
        description: String,
        requested_by: String,
    ) -> Self {
        Self {
            bag_id,
            member_id,
            order_type,
            status: OrderStatus::default(),
            priority: OrderPriority::default(),
            description,
            requested_by,
            notes: None,
            target_location: None,
            estimated_cost: None,
            due_date: None,
        }
    }
}

/// Per-status tallies for the orders tab filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub pending: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub cancelled: usize,
}

impl StatusCounts {
    pub fn get(&self, status: OrderStatus) -> usize {
        match status {
            OrderStatus::Pending => self.pending,
            OrderStatus::InProgress => self.in_progress,
            OrderStatus::Completed => self.completed,
            OrderStatus::Cancelled => self.cancelled,
        }
    }

    pub fn total(&self) -> usize {
        self.pending + self.in_progress + self.completed + self.cancelled
    }
}
