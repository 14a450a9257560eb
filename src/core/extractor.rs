use std::collections::HashMap;

use axum::{
    body::Body,
    extract::{rejection::JsonRejection, FromRequest, FromRequestParts, Multipart, Request},
    http::request::Parts,
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;

use crate::core::error::AppError;
use crate::features::auth::model::AuthenticatedUser;
use crate::modules::storage::MediaFile;

/// Custom JSON extractor that provides consistent error responses
pub struct AppJson<T>(pub T);

impl<T, S> FromRequest<S> for AppJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppJsonRejection;

    async fn from_request(req: Request<Body>, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(value) => Ok(Self(value.0)),
            Err(rejection) => Err(AppJsonRejection(rejection)),
        }
    }
}

pub struct AppJsonRejection(JsonRejection);

impl IntoResponse for AppJsonRejection {
    fn into_response(self) -> Response {
        let message = match self.0 {
            JsonRejection::JsonDataError(err) => format!("Invalid JSON data: {}", err),
            JsonRejection::JsonSyntaxError(err) => format!("Invalid JSON syntax: {}", err),
            JsonRejection::MissingJsonContentType(err) => {
                format!("Missing JSON content type: {}", err)
            }
            _ => "Failed to parse JSON body".to_string(),
        };

        AppError::BadRequest(message).into_response()
    }
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))
    }
}

/// A `multipart/form-data` body read fully into memory: text fields by name,
/// and file parts (those carrying a file name) as [`MediaFile`]s.
///
/// File parts with no bytes are dropped, which is what browsers send for an
/// empty file input.
#[derive(Debug, Default)]
pub struct MediaForm {
    fields: HashMap<String, String>,
    files: HashMap<String, MediaFile>,
}

impl MediaForm {
    /// Text value of the first field among `names` that is present
    pub fn text(&self, names: &[&str]) -> Option<String> {
        names.iter().find_map(|n| self.fields.get(*n).cloned())
    }

    /// Parse a field, rejecting values that are present but malformed
    pub fn parse<T: std::str::FromStr>(&self, names: &[&str]) -> Result<Option<T>, AppError> {
        match self.text(names).filter(|v| !v.trim().is_empty()) {
            None => Ok(None),
            Some(raw) => raw
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| AppError::Validation(format!("Invalid value for '{}'", names[0]))),
        }
    }

    pub fn take_file(&mut self, names: &[&str]) -> Option<MediaFile> {
        names.iter().find_map(|n| self.files.remove(*n))
    }
}

impl<S> FromRequest<S> for MediaForm
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request<Body>, state: &S) -> Result<Self, Self::Rejection> {
        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| AppError::BadRequest(format!("Invalid multipart request: {}", e)))?;

        let mut form = MediaForm::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(format!("Invalid multipart request: {}", e)))?
        {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    let content_type = field
                        .content_type()
                        .unwrap_or("application/octet-stream")
                        .to_string();
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|e| AppError::BadRequest(format!("Multipart error: {}", e)))?;
                    if !bytes.is_empty() {
                        form.files.insert(
                            name,
                            MediaFile {
                                file_name,
                                content_type,
                                bytes: bytes.to_vec(),
                            },
                        );
                    }
                }
                None => {
                    let value = field
                        .text()
                        .await
                        .map_err(|e| AppError::BadRequest(format!("Multipart error: {}", e)))?;
                    form.fields.insert(name, value);
                }
            }
        }

        Ok(form)
    }
}
