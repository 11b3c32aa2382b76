// Packet upload handler: stores the frame, records the upload, announces
// the session to the ingest service
use std::path::Path;

use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use fleetlink_common::{Handshake, UploadRef};
use serde_json::{json, Value};
use tracing::warn;

use crate::handshake;
use crate::state::AppState;

/// Fallback camera id for the stub row when the identifier tail is not
/// numeric.
const STUB_CAMERA_ID: i64 = 12345;

struct UploadedImage {
    original_name: String,
    content_type: Option<String>,
    body: Vec<u8>,
}

#[derive(Default)]
struct UploadForm {
    image: Option<UploadedImage>,
    imei: Option<String>,
    avl_hex: Option<String>,
}

async fn read_form(multipart: &mut Multipart) -> Result<UploadForm, MultipartError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "image" => {
                let original_name = field.file_name().unwrap_or("upload.bin").to_string();
                let content_type = field.content_type().map(|c| c.to_string());
                let body = field.bytes().await?.to_vec();
                form.image = Some(UploadedImage {
                    original_name,
                    content_type,
                    body,
                });
            }
            "imei" => form.imei = Some(field.text().await?),
            "avl" => form.avl_hex = Some(strip_whitespace(&field.text().await?)),
            _ => {}
        }
    }

    Ok(form)
}

fn strip_whitespace(raw: &str) -> String {
    raw.split_whitespace().collect()
}

/// Shortened numeric id for the stub row, derived from the identifier's
/// last six characters. The full identifier is kept in its own column.
fn stub_camera_id(imei: &str) -> i64 {
    let chars: Vec<char> = imei.chars().collect();
    let start = chars.len().saturating_sub(6);
    let tail: String = chars[start..].iter().collect();
    tail.parse::<i64>().unwrap_or(STUB_CAMERA_ID)
}

pub async fn upload_packets(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> (StatusCode, Json<Value>) {
    let form = match read_form(&mut multipart).await {
        Ok(form) => form,
        Err(e) => {
            warn!("Rejected malformed upload: {}", e);
            state.metrics.record_http_request("/upload-packets", 400);
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "success": false, "error": e.to_string() })),
            );
        }
    };

    // Reject identifiers that are not provisioned units
    if let Some(imei) = &form.imei {
        if !state.imei_cache.validate(imei).await {
            state.metrics.record_http_request("/upload-packets", 400);
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "success": false,
                    "error": "Camera not found",
                    "message": "This IMEI or camera is not a client of ours. Please contact support.",
                    "imei": imei,
                })),
            );
        }
    }

    let upload_ref = Utc::now().timestamp_millis() as u64;

    // Store the uploaded frame and its media row
    let mut stored_name: Option<String> = None;
    let mut stored_path = String::new();
    if let Some(image) = &form.image {
        let ext = Path::new(&image.original_name)
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();
        let name = format!("{}{}", upload_ref, ext);
        let path = Path::new(&state.config.upload_dir).join(&name);

        if let Err(e) = tokio::fs::write(&path, &image.body).await {
            warn!("Failed to store uploaded frame: {}", e);
            state.metrics.record_http_request("/upload-packets", 500);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string(), "success": false })),
            );
        }

        stored_path = path.to_string_lossy().into_owned();
        stored_name = Some(name);

        let inserted = sqlx::query("INSERT INTO media (name, file_path, upload_ref) VALUES (?, ?, ?)")
            .bind(&image.original_name)
            .bind(&stored_path)
            .bind(upload_ref.to_string())
            .execute(&state.db)
            .await;
        if let Err(e) = inserted {
            warn!("Failed to record media row: {}", e);
        }
    }

    // Stub fix row carrying the upload reference, completed later by the
    // telemetry that arrives over TCP
    if let Some(imei) = &form.imei {
        let inserted = sqlx::query(
            "INSERT INTO camera_files (camera_id, timestamp, file_path, upload_ref, imei) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(stub_camera_id(imei))
        .bind(Utc::now())
        .bind(&stored_path)
        .bind(upload_ref.to_string())
        .bind(imei)
        .execute(&state.db)
        .await;
        if let Err(e) = inserted {
            warn!("Failed to record upload stub row: {}", e);
        }
    }

    // Announce the session over TCP
    if form.imei.is_some() || form.avl_hex.is_some() {
        let announcement = Handshake {
            upload_ref: Some(UploadRef::Number(upload_ref)),
            imei: form.imei.clone(),
            avl_hex: form.avl_hex.clone(),
        };
        handshake::announce(&state.config.ingest_addr, &announcement).await;
    }

    state.metrics.record_http_request("/upload-packets", 200);
    (
        StatusCode::OK,
        Json(json!({
            "uploaded": stored_name,
            "fileType": form.image.as_ref().and_then(|i| i.content_type.clone()),
            "imeiSent": form.imei,
            "avlSent": form.avl_hex,
            "success": true,
        })),
    )
}
