//! DTO to domain mappers.
//!
//! All mappers are pure. Order and entity-user dates pass through as wire
//! strings; the profile mapper parses its dates. That difference matches
//! what callers of each have always received and is pinned by tests.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use crate::error::ApiError;
use crate::types::{
    Order, OrderDto, OrderStatus, OrdersListDto, OrdersPage, User, UserDto, UserProfile,
    UserProfileDto,
};

/// Copy an order field-for-field, renaming to camelCase. `status` is not
/// validated against the known set.
pub fn map_order_dto(dto: &OrderDto) -> Order {
    Order {
        id: dto.id.clone(),
        title: dto.title.clone(),
        status: OrderStatus::from(dto.status.as_str()),
        total_price: dto.total_price,
        currency: dto.currency.clone(),
        created_at: dto.created_at.clone(),
        updated_at: dto.updated_at.clone(),
    }
}

pub fn map_orders_page(dto: &OrdersListDto) -> OrdersPage {
    OrdersPage {
        items: dto.items.iter().map(map_order_dto).collect(),
        total: dto.total,
        page: dto.page,
        limit: dto.limit,
    }
}

pub fn map_user_dto(dto: &UserDto) -> User {
    User {
        id: dto.id.clone(),
        email: dto.email.clone(),
        full_name: dto.full_name.clone(),
        avatar_url: dto.avatar_url.clone(),
        created_at: dto.created_at.clone(),
    }
}

/// Map a `/users/me` profile, parsing both timestamps.
///
/// Fails only when a timestamp is neither RFC 3339 nor a bare
/// `YYYY-MM-DD` date.
pub fn map_user_profile(dto: &UserProfileDto) -> Result<UserProfile, ApiError> {
    Ok(UserProfile {
        id: dto.id.clone(),
        email: dto.email.clone(),
        full_name: dto.full_name.clone(),
        avatar_url: dto.avatar_url.clone(),
        created_at: parse_timestamp("created_at", &dto.created_at)?,
        updated_at: parse_timestamp("updated_at", &dto.updated_at)?,
    })
}

/// Bare dates are taken as midnight UTC.
fn parse_timestamp(field: &str, raw: &str) -> Result<DateTime<Utc>, ApiError> {
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Ok(timestamp.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| Utc.from_utc_datetime(&midnight))
        .ok_or_else(|| {
            ApiError::DeserializationError(format!("{field}: invalid timestamp {raw:?}"))
        })
}
