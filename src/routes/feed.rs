//! Discovery feed route

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};

use crate::auth::AuthUser;
use crate::feed::FeedRequest;
use crate::routes::{json_response, parse_body};
use crate::server::AppState;
use crate::types::Result;

/// POST /api/discover/feed
pub async fn discover_feed(
    state: &AppState,
    user: Option<&AuthUser>,
    body: Bytes,
) -> Result<Response<Full<Bytes>>> {
    let request: FeedRequest = parse_body(&body)?;
    let page = state
        .feed
        .get_feed(user.map(|u| u.uid.as_str()), request)
        .await?;
    Ok(json_response(StatusCode::OK, &page))
}
