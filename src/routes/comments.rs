use super::*;

/// Every comment, served through the thread cache.
pub async fn list_all(State(state): State<CommentState>) -> Result<Response> {
    let comments = state.threads.assemble_all().await?;
    Ok(Json(comments).into_response())
}

/// One article's comments, straight from the store.
pub async fn list_by_news(
    State(state): State<CommentState>,
    ReqPath(id): ReqPath<String>,
) -> Result<Response> {
    let comments = state.threads.assemble_for_news(news_id(&id)?).await?;
    Ok(Json(comments).into_response())
}

/// One article's comments in reading order, with depths.
pub async fn thread(
    State(state): State<CommentState>,
    ReqPath(id): ReqPath<String>,
) -> Result<Response> {
    let thread = state.threads.thread_for_news(news_id(&id)?).await?;
    Ok(Json(thread).into_response())
}

pub async fn add_comment(
    State(state): State<CommentState>,
    ReqPath(id): ReqPath<String>,
    body: Result<Json<NewComment>, JsonRejection>,
) -> Result<Response> {
    let news_id = news_id(&id)?;
    let body = json_body(body)?;
    let comment = state.threads.post_comment(news_id, &body).await?;
    Ok((StatusCode::CREATED, Json(Created::from(&comment))).into_response())
}

pub async fn add_reply(
    State(state): State<CommentState>,
    ReqPath((id, slug)): ReqPath<(String, String)>,
    body: Result<Json<NewComment>, JsonRejection>,
) -> Result<Response> {
    let news_id = news_id(&id)?;
    let body = json_body(body)?;
    let comment = state.threads.post_reply(news_id, &slug, &body).await?;
    Ok((StatusCode::CREATED, Json(Created::from(&comment))).into_response())
}
