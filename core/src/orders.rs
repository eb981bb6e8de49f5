//! Order fetches for both execution contexts.

use url::form_urlencoded;

use crate::client::{BrowserClient, RequestOptions, ServerClient, ServerRequestOptions};
use crate::error::ApiError;
use crate::mapping::{map_order_dto, map_orders_page};
use crate::retry::{with_retry, RetryPolicy};
use crate::transport::Transport;
use crate::types::{OrderStatus, OrdersListDto, OrdersPage, OrdersSummary};

pub const ORDERS_PATH: &str = "/orders";

/// Filters for the paginated order listing. Zero or unset values are left
/// out of the query string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GetOrdersParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub status: Option<OrderStatus>,
}

impl GetOrdersParams {
    /// `/orders` followed by the encoded query, if any.
    pub fn to_path(&self) -> String {
        let mut query = form_urlencoded::Serializer::new(String::new());
        if let Some(page) = self.page.filter(|p| *p > 0) {
            query.append_pair("page", &page.to_string());
        }
        if let Some(limit) = self.limit.filter(|l| *l > 0) {
            query.append_pair("limit", &limit.to_string());
        }
        if let Some(status) = &self.status {
            query.append_pair("status", status.as_str());
        }

        let query = query.finish();
        if query.is_empty() {
            ORDERS_PATH.to_string()
        } else {
            format!("{ORDERS_PATH}?{query}")
        }
    }
}

/// Fetch one page of orders, retrying 5xx responses with the default
/// backoff.
pub async fn fetch_orders<X: Transport>(
    client: &BrowserClient<X>,
    params: &GetOrdersParams,
) -> Result<OrdersPage, ApiError> {
    let path = params.to_path();
    let path = path.as_str();
    let dto: OrdersListDto = with_retry(
        || client.request(path, RequestOptions::new()),
        &RetryPolicy::default(),
    )
    .await?;
    Ok(map_orders_page(&dto))
}

/// Fetch orders while rendering on the server, forwarding the visitor's
/// cookies and authorization.
pub async fn fetch_orders_server<X: Transport>(
    client: &ServerClient<X>,
) -> Result<OrdersSummary, ApiError> {
    let options = ServerRequestOptions::new()
        .forward_auth(true)
        .forward_cookies(true);
    let dto: OrdersListDto = client.request(ORDERS_PATH, options).await?;
    Ok(OrdersSummary {
        items: dto.items.iter().map(map_order_dto).collect(),
        total: dto.total,
    })
}
