//! Multipart upload relay.
//!
//! # Responsibilities
//! - Buffer at most one file field fully in memory, bounded by the
//!   configured size limit
//! - Validate the declared content type before any upstream call
//! - Re-encode the file and accompanying text fields as a fresh outbound
//!   multipart form
//!
//! # Design Decisions
//! - Constraint violations short-circuit with a client error and make zero
//!   network calls
//! - The outbound Content-Type boundary comes from the constructed form,
//!   never the inbound request
//! - The relay never persists the file

use axum::extract::Multipart;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};

use crate::config::schema::UploadConfig;
use crate::http::error::GatewayError;

/// Multipart field carrying the file.
pub const FILE_FIELD: &str = "image";

/// Multipart field carrying the caption text. The upstream requires a
/// non-empty value, so an absent field becomes a single space.
pub const TEXT_FIELD: &str = "text";

/// Size and content-type constraints, applied before forwarding.
#[derive(Debug, Clone)]
pub struct UploadConstraint {
    pub max_bytes: usize,
    pub allowed_mime_prefixes: Vec<String>,
}

impl UploadConstraint {
    pub fn from_config(config: &UploadConfig) -> Self {
        Self {
            max_bytes: config.max_bytes,
            allowed_mime_prefixes: config.allowed_mime_prefixes.clone(),
        }
    }

    fn check_content_type(&self, content_type: &str) -> Result<(), GatewayError> {
        if self
            .allowed_mime_prefixes
            .iter()
            .any(|prefix| content_type.starts_with(prefix.as_str()))
        {
            Ok(())
        } else {
            Err(GatewayError::UnsupportedMediaType {
                content_type: content_type.to_string(),
            })
        }
    }

    fn check_size(&self, size: usize) -> Result<(), GatewayError> {
        if size > self.max_bytes {
            Err(GatewayError::FileTooLarge {
                size,
                max: self.max_bytes,
            })
        } else {
            Ok(())
        }
    }
}

/// A validated, fully-buffered upload ready for re-encoding.
#[derive(Debug)]
pub struct RelayedUpload {
    pub filename: String,
    pub content_type: String,
    pub bytes: Bytes,
    /// Accompanying text fields. Always contains `TEXT_FIELD`.
    pub fields: Vec<(String, String)>,
}

impl RelayedUpload {
    /// Re-encode as an outbound multipart form, preserving filename and
    /// content type.
    pub fn into_form(self) -> Result<Form, GatewayError> {
        let part = Part::bytes(self.bytes.to_vec())
            .file_name(self.filename)
            .mime_str(&self.content_type)
            .map_err(|_| GatewayError::UnsupportedMediaType {
                content_type: self.content_type.clone(),
            })?;

        let mut form = Form::new().part(FILE_FIELD, part);
        for (name, value) in self.fields {
            form = form.text(name, value);
        }
        Ok(form)
    }
}

/// Extract and validate the single file field plus text fields.
///
/// The declared content type is checked before the file bytes are read, so
/// a disallowed type is rejected without buffering the payload.
pub async fn extract(
    mut multipart: Multipart,
    constraint: &UploadConstraint,
) -> Result<RelayedUpload, GatewayError> {
    let mut file: Option<(String, String, Bytes)> = None;
    let mut fields: Vec<(String, String)> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| GatewayError::Multipart(e.to_string()))?
    {
        let name = field.name().unwrap_or("").to_string();

        if name == FILE_FIELD {
            let filename = field.file_name().unwrap_or("upload").to_string();
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            constraint.check_content_type(&content_type)?;

            let data = field
                .bytes()
                .await
                .map_err(|e| GatewayError::Multipart(e.to_string()))?;
            constraint.check_size(data.len())?;

            file = Some((filename, content_type, data));
        } else if !name.is_empty() {
            let value = field
                .text()
                .await
                .map_err(|e| GatewayError::Multipart(e.to_string()))?;
            fields.push((name, value));
        }
    }

    let Some((filename, content_type, bytes)) = file else {
        return Err(GatewayError::MissingFile { field: FILE_FIELD });
    };

    if !fields.iter().any(|(name, _)| name == TEXT_FIELD) {
        fields.push((TEXT_FIELD.to_string(), " ".to_string()));
    }

    tracing::debug!(
        filename = %filename,
        content_type = %content_type,
        size = bytes.len(),
        "Upload accepted for relay"
    );

    Ok(RelayedUpload {
        filename,
        content_type,
        bytes,
        fields,
    })
}
