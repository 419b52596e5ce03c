use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use crate::{
    converter::Converter,
    error::ConvertError,
    metadata,
    models::{ConversionRequest, ConvertQuery},
};

#[derive(Clone)]
pub struct AppState {
    pub converter: Converter,
}

pub fn create_routes(state: AppState) -> Router {
    Router::new()
        .route("/convert", get(convert))
        .with_state(state)
}

// Validate, ask the conversion service, probe the result, answer with metadata.
async fn convert(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<impl IntoResponse, ConvertError> {
    let req = ConversionRequest::try_from(ConvertQuery::from_pairs(pairs))?;
    tracing::info!(url = %req.source_url, kind = %req.kind, "conversion requested");

    let upstream = state.converter.request_conversion(&req).await?;
    let resolved = state.converter.resolve_download(&upstream.url).await?;
    let meta = metadata::compose(req.kind, &upstream, &resolved, metadata::unix_now());

    tracing::info!(
        url = %req.source_url,
        filename = %meta.filename,
        "returned metadata with download URL"
    );

    // Json sets Content-Type: application/json.
    let disposition = metadata::content_disposition(&meta.filename);
    Ok(([(header::CONTENT_DISPOSITION, disposition)], Json(meta)))
}
