//! Search routes

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use serde::Deserialize;

use crate::auth::Role;
use crate::routes::{json_response, parse_body};
use crate::search::UserFilters;
use crate::server::AppState;
use crate::types::Result;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchPostsRequest {
    pub query: String,
    pub limit: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchUsersRequest {
    pub query: String,
    pub limit: Option<i64>,
    pub role: Option<Role>,
    pub profession: Option<String>,
    pub expertise: Option<String>,
}

/// POST /api/search/posts
pub async fn search_posts(state: &AppState, body: Bytes) -> Result<Response<Full<Bytes>>> {
    let request: SearchPostsRequest = parse_body(&body)?;
    let page = state
        .search
        .search_posts(&request.query, request.limit)
        .await?;
    Ok(json_response(StatusCode::OK, &page))
}

/// POST /api/search/users
pub async fn search_users(state: &AppState, body: Bytes) -> Result<Response<Full<Bytes>>> {
    let request: SearchUsersRequest = parse_body(&body)?;
    let filters = UserFilters {
        role: request.role,
        profession: request.profession,
        expertise: request.expertise,
    };
    let page = state
        .search
        .search_users(&request.query, &filters, request.limit)
        .await?;
    Ok(json_response(StatusCode::OK, &page))
}
