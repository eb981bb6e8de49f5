//! Wire DTOs and the domain objects they map to.
//!
//! # Design
//! DTOs mirror the backend's snake_case JSON exactly. Domain objects are
//! what callers consume; they serialize camelCase for UI layers. The two
//! families are defined separately so the wire schema can drift without
//! touching callers; `mapping` is the only bridge between them.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

/// Raw order as sent by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderDto {
    pub id: String,
    pub title: String,
    pub status: String,
    pub total_price: f64,
    pub currency: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Order lifecycle state.
///
/// The four known states form the closed set the UI understands. A status
/// string outside that set is kept verbatim in `Unrecognized` rather than
/// rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OrderStatus {
    Pending,
    InProgress,
    Completed,
    Cancelled,
    Unrecognized(String),
}

impl OrderStatus {
    pub fn as_str(&self) -> &str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::InProgress => "in_progress",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Unrecognized(raw) => raw,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, OrderStatus::Unrecognized(_))
    }
}

impl From<&str> for OrderStatus {
    fn from(raw: &str) -> Self {
        match raw {
            "pending" => OrderStatus::Pending,
            "in_progress" => OrderStatus::InProgress,
            "completed" => OrderStatus::Completed,
            "cancelled" => OrderStatus::Cancelled,
            other => OrderStatus::Unrecognized(other.to_string()),
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for OrderStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for OrderStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(OrderStatus::from(raw.as_str()))
    }
}

/// Order as presented to callers. Dates stay in wire format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub title: String,
    pub status: OrderStatus,
    pub total_price: f64,
    pub currency: String,
    pub created_at: String,
    pub updated_at: String,
}

/// One page of the `/orders` listing, wire shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrdersListDto {
    pub items: Vec<OrderDto>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrdersPage {
    pub items: Vec<Order>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
}

/// Orders fetched during a server render: no paging metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrdersSummary {
    pub items: Vec<Order>,
    pub total: u64,
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

/// Raw user as embedded in listings and session payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDto {
    pub id: String,
    pub email: String,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: String,
}

/// Raw profile returned by `/users/me`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfileDto {
    pub id: String,
    pub email: String,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Profile of the signed-in user with parsed timestamps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

/// Backend record of an identity-provider user, returned by
/// `/auth/profile`. The backend already speaks camelCase here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthProfile {
    pub id: String,
    pub email: String,
    pub role: String,
    pub created_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn order_status_round_trips_known_values() {
        for raw in ["pending", "in_progress", "completed", "cancelled"] {
            let status = OrderStatus::from(raw);
            assert!(status.is_known(), "{raw}");
            assert_eq!(status.as_str(), raw);
        }
    }

    #[test]
    fn order_status_keeps_unknown_values_verbatim() {
        let status: OrderStatus = serde_json::from_value(json!("on_hold")).unwrap();
        assert_eq!(status, OrderStatus::Unrecognized("on_hold".to_string()));
        assert_eq!(serde_json::to_value(&status).unwrap(), json!("on_hold"));
    }

    #[test]
    fn user_dto_accepts_null_optionals() {
        let dto: UserDto = serde_json::from_value(json!({
            "id": "u1",
            "email": "a@b.c",
            "full_name": null,
            "avatar_url": null,
            "created_at": "2024-01-01"
        }))
        .unwrap();
        assert!(dto.full_name.is_none());
        assert!(dto.avatar_url.is_none());
    }

    #[test]
    fn order_dto_rejects_missing_price() {
        let result: Result<OrderDto, _> = serde_json::from_value(json!({
            "id": "1",
            "title": "T",
            "status": "pending",
            "currency": "USD",
            "created_at": "2024-01-01",
            "updated_at": "2024-01-02"
        }));
        assert!(result.is_err());
    }
}
