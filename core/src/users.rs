//! Calls that identify the signed-in user to the backend.

use crate::client::{RequestOptions, ServerClient, ServerRequestOptions};
use crate::error::ApiError;
use crate::http::HttpMethod;
use crate::mapping::map_user_profile;
use crate::transport::Transport;
use crate::types::{AuthProfile, UserProfile, UserProfileDto};

pub const ME_PATH: &str = "/users/me";
pub const AUTH_PROFILE_PATH: &str = "/auth/profile";

/// Options for calls authenticated by an explicit token only.
fn bearer_only(access_token: &str) -> ServerRequestOptions {
    ServerRequestOptions::new()
        .access_token(access_token)
        .forward_auth(false)
}

/// Fetch the profile of the user owning `access_token`.
pub async fn get_me<X: Transport>(
    client: &ServerClient<X>,
    access_token: &str,
) -> Result<UserProfile, ApiError> {
    let dto: UserProfileDto = client.request(ME_PATH, bearer_only(access_token)).await?;
    map_user_profile(&dto)
}

/// Create or refresh the backend's record of the identity-provider user,
/// typically right after sign-in.
pub async fn sync_profile<X: Transport>(
    client: &ServerClient<X>,
    access_token: &str,
) -> Result<AuthProfile, ApiError> {
    let options = bearer_only(access_token).request(RequestOptions::new().method(HttpMethod::Post));
    client.request(AUTH_PROFILE_PATH, options).await
}
