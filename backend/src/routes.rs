use crate::conditions::{catalog, guidance};
use crate::config::AppConfig;
use crate::error::{AnalysisError, ApiError};
use crate::pipeline::Pipeline;
use actix_files::Files;
use actix_multipart::Multipart;
use actix_web::http::header::{self, HeaderMap};
use actix_web::{web, HttpRequest, HttpResponse};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use futures::{Stream, StreamExt, TryStreamExt};
use log::{error, info, warn};
use shared::{AnalyzeRequest, AnalyzeResponse, ConditionsResponse, HealthResponse};
use std::path::Path;
use uuid::Uuid;

pub fn configure_routes(cfg: &mut web::ServiceConfig, static_dir: &Path) {
    cfg.service(web::resource("/api/health").route(web::get().to(health)))
        .service(web::resource("/api/analyze").route(web::post().to(analyze)))
        .service(web::resource("/api/conditions").route(web::get().to(conditions)));

    if static_dir.is_dir() {
        cfg.service(Files::new("/", static_dir).index_file("index.html"));
    } else {
        warn!("Static directory {} not found; frontend disabled", static_dir.display());
    }
}

async fn health(pipeline: web::Data<Pipeline>) -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        model_loaded: pipeline.classifier().is_loaded(),
    })
}

async fn conditions() -> HttpResponse {
    HttpResponse::Ok().json(ConditionsResponse {
        conditions: catalog(),
    })
}

async fn analyze(
    req: HttpRequest,
    payload: web::Payload,
    pipeline: web::Data<Pipeline>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, ApiError> {
    let request_id = Uuid::new_v4().to_string();
    let limit = config.max_upload_bytes;

    let outcome = match receive_image(&req, payload, limit).await {
        Ok(bytes) => pipeline.analyze(&request_id, bytes).await.map_err(ApiError::from),
        Err(e) => Err(e),
    };

    match outcome {
        Ok(analysis) => {
            let result = &analysis.result;
            let top = result.top_condition();
            info!(
                "{}: {} at {:.2}% [{}], skin ratio {:.4} ({} px)",
                request_id,
                top,
                result.confidence(),
                result.condition_list().join(", "),
                analysis.verdict.skin_ratio,
                analysis.verdict.skin_pixels
            );
            Ok(HttpResponse::Ok().json(AnalyzeResponse {
                success: true,
                top_condition: top.as_str().to_string(),
                confidence: result.confidence(),
                all_conditions: result.all_conditions(),
                recommendations: guidance(top).to_recommendations(),
            }))
        }
        Err(ApiError::Analysis(e)) if !e.is_client_error() => {
            error!("{}: analysis failed: {}", request_id, e);
            Err(e.into())
        }
        Err(e) => {
            warn!("{}: rejected: {}", request_id, e);
            Err(e)
        }
    }
}

/// Pulls the raw image bytes out of a multipart or JSON request body.
async fn receive_image(
    req: &HttpRequest,
    payload: web::Payload,
    limit: usize,
) -> Result<Vec<u8>, ApiError> {
    if is_multipart(req.headers()) {
        read_multipart_image(Multipart::new(req.headers(), payload), limit).await
    } else if is_json(req.headers()) {
        let body = read_limited(payload, limit).await?;
        Ok(image_from_json(&body)?)
    } else {
        Err(AnalysisError::NoImage("No image provided").into())
    }
}

fn content_type(headers: &HeaderMap) -> String {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_ascii_lowercase()
}

fn is_multipart(headers: &HeaderMap) -> bool {
    content_type(headers).starts_with("multipart/form-data")
}

fn is_json(headers: &HeaderMap) -> bool {
    let ct = content_type(headers);
    let essence = ct.split(';').next().unwrap_or_default().trim();
    essence == "application/json" || essence.ends_with("+json")
}

async fn read_limited<S, E>(stream: S, limit: usize) -> Result<Vec<u8>, ApiError>
where
    S: Stream<Item = Result<web::Bytes, E>>,
    E: std::fmt::Display,
{
    let mut stream = Box::pin(stream);
    let mut data = Vec::new();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| {
            warn!("Failed reading request body: {}", e);
            AnalysisError::NoImage("No image provided")
        })?;
        if data.len() + chunk.len() > limit {
            return Err(ApiError::PayloadTooLarge { limit });
        }
        data.extend_from_slice(&chunk);
    }
    Ok(data)
}

async fn read_multipart_image(mut payload: Multipart, limit: usize) -> Result<Vec<u8>, ApiError> {
    while let Ok(Some(field)) = payload.try_next().await {
        let (name, filename) = match field.content_disposition() {
            Some(cd) => (
                cd.get_name().map(str::to_string),
                cd.get_filename().map(str::to_string),
            ),
            None => (None, None),
        };
        if name.as_deref() != Some("image") {
            continue;
        }
        if filename.as_deref() == Some("") {
            return Err(AnalysisError::NoImage("No file selected").into());
        }
        return read_limited(field, limit).await;
    }
    Err(AnalysisError::NoImage("No image provided").into())
}

fn image_from_json(body: &[u8]) -> Result<Vec<u8>, AnalysisError> {
    let request: AnalyzeRequest =
        serde_json::from_slice(body).map_err(|_| AnalysisError::NoImage("No image provided"))?;
    let encoded = request
        .image
        .ok_or(AnalysisError::NoImage("No image provided"))?;
    decode_base64_image(&encoded)
}

/// Decodes base64 image data, dropping a `data:<mime>;base64,` prefix if present.
/// Line breaks and other whitespace inside the payload are ignored, so
/// MIME-wrapped output decodes the same as a single line.
pub fn decode_base64_image(encoded: &str) -> Result<Vec<u8>, AnalysisError> {
    let data = match encoded.split_once(',') {
        Some((_, rest)) => rest,
        None => encoded,
    };
    let compact: String = data.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    STANDARD
        .decode(compact)
        .map_err(|e| AnalysisError::InvalidImage(format!("base64: {}", e)))
}
