//! Reading a single file field out of a multipart form.

use axum::extract::Multipart;

use crate::assets::Upload;
use crate::error::{AppError, AppResult};

/// Read the file sent under `field_name`, ignoring any other fields.
pub async fn read_file_field(multipart: &mut Multipart, field_name: &str) -> AppResult<Upload> {
    let mut upload = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        if field.name() != Some(field_name) {
            continue; // ignore unknown fields
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        upload = Some(Upload { filename, bytes });
    }

    upload.ok_or_else(|| AppError::BadRequest(format!("Missing required '{field_name}' field")))
}
