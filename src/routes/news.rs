use serde_json::json;

use super::*;

pub async fn article(
    State(state): State<NewsState>,
    ReqPath(id): ReqPath<String>,
) -> Result<Response> {
    let articles = state.news.article(news_id(&id)?).await;
    Ok(Json(articles).into_response())
}

pub async fn page(
    State(state): State<NewsState>,
    Query(query): Query<PageQuery>,
) -> Result<Response> {
    let pagination = Pagination::parse(&query)?;
    Ok(Json(state.news.page(pagination).await).into_response())
}

pub async fn search(
    State(state): State<NewsState>,
    Query(query): Query<SearchQuery>,
) -> Result<Response> {
    let pagination = Pagination::parse(&query.page_query())?;
    Ok(Json(state.news.search(&query.title, pagination).await).into_response())
}

/// Ingest a batch of articles. Any ids in the body are replaced.
pub async fn create(
    State(state): State<NewsState>,
    body: Result<Json<Vec<Article>>, JsonRejection>,
) -> Result<Response> {
    let articles = json_body(body)?;
    let ids = state.news.create(articles).await?;
    Ok((StatusCode::CREATED, Json(json!({ "ids": ids }))).into_response())
}
