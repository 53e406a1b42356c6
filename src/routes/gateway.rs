use axum::http::header;

use super::*;

/// An article with its comments, as a one-element array.
pub async fn article(
    State(state): State<GatewayState>,
    ReqPath(id): ReqPath<String>,
) -> Result<Response> {
    let full = state.gateway.fetch_combined(news_id(&id)?).await?;
    Ok(Json(vec![full]).into_response())
}

pub async fn page(
    State(state): State<GatewayState>,
    Query(query): Query<PageQuery>,
) -> Result<Response> {
    let pagination = Pagination::parse(&query)?;
    Ok(Json(state.gateway.fetch_page(pagination).await?).into_response())
}

pub async fn search(
    State(state): State<GatewayState>,
    Query(query): Query<SearchQuery>,
) -> Result<Response> {
    let pagination = Pagination::parse(&query.page_query())?;
    let found = state.gateway.fetch_search(&query.title, pagination).await?;
    Ok(Json(found).into_response())
}

pub async fn add_comment(
    State(state): State<GatewayState>,
    ReqPath(id): ReqPath<String>,
    body: Result<Json<NewComment>, JsonRejection>,
) -> Result<Response> {
    let news_id = news_id(&id)?;
    let body = json_body(body)?;
    let forwarded = state.gateway.post_comment(news_id, &body).await?;
    Ok(relay(forwarded))
}

pub async fn add_reply(
    State(state): State<GatewayState>,
    ReqPath((id, slug)): ReqPath<(String, String)>,
    body: Result<Json<NewComment>, JsonRejection>,
) -> Result<Response> {
    let news_id = news_id(&id)?;
    let body = json_body(body)?;
    let forwarded = state.gateway.post_reply(news_id, &slug, &body).await?;
    Ok(relay(forwarded))
}

/// Replay an upstream answer as-is.
fn relay((status, body): (StatusCode, String)) -> Response {
    (status, [(header::CONTENT_TYPE, "application/json")], body).into_response()
}
