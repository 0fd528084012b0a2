use crate::auth::{AuthService, Claims};
use crate::error::{AppError, AppResult};
use crate::util::{split_commas, split_lines};
use axum::body::Bytes;
use axum::extract::{FromRequest, Multipart, Request};
use axum::Json;
use http::StatusCode;
use serde::de::DeserializeOwned;
use std::collections::HashMap;

/// Multipart field carrying the recipe photo
pub(crate) const PHOTO_FIELD: &str = "photo";

/// Helper to extract JWT claims from Authorization header
pub(crate) fn extract_claims(
    headers: &axum::http::HeaderMap,
    auth_service: &AuthService,
) -> AppResult<Claims> {
    let token = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::Unauthorized("Missing token".to_string()))?;

    auth_service.validate_token(token)
}

/// JSON request body that never rejects on its own.
///
/// A missing, mistyped or unparsable body reads as `T::default()`, so the
/// handler's required-field check produces the response. Only an oversized
/// body is refused here.
pub(crate) struct JsonBody<T>(pub T);

impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned + Default + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => Err(
                AppError::PayloadTooLarge("Request body too large".to_string()),
            ),
            Err(rejection) => {
                tracing::debug!(
                    error = %rejection.body_text(),
                    "Unusable JSON body, treating it as empty"
                );
                Ok(JsonBody(T::default()))
            }
        }
    }
}

/// Photo file received in a recipe form
#[derive(Debug)]
pub(crate) struct UploadedPhoto {
    pub file_name: Option<String>,
    pub bytes: Bytes,
}

/// Text fields and photo of a multipart recipe submission.
///
/// Repeated text fields keep every value in submission order.
#[derive(Debug, Default)]
pub(crate) struct RecipeForm {
    fields: HashMap<String, Vec<String>>,
    pub photo: Option<UploadedPhoto>,
}

impl RecipeForm {
    pub async fn from_multipart(mut multipart: Multipart) -> AppResult<Self> {
        let mut form = RecipeForm::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::InvalidUpload(format!("Malformed form data: {}", e)))?
        {
            let name = field.name().unwrap_or_default().to_string();

            if name == PHOTO_FIELD && field.file_name().is_some() {
                let file_name = field.file_name().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::InvalidUpload(format!("Failed to read photo: {}", e)))?;
                // Browsers send an empty part when no file was chosen
                if !bytes.is_empty() {
                    form.photo = Some(UploadedPhoto { file_name, bytes });
                }
                continue;
            }

            let text = field
                .text()
                .await
                .map_err(|e| AppError::InvalidUpload(format!("Failed to read field {}: {}", name, e)))?;
            form.fields.entry(name).or_default().push(text);
        }

        Ok(form)
    }

    #[cfg(test)]
    pub fn with_fields(fields: &[(&str, &str)]) -> Self {
        let mut form = RecipeForm::default();
        for (key, value) in fields {
            form.fields
                .entry(key.to_string())
                .or_default()
                .push(value.to_string());
        }
        form
    }

    /// First value of a text field, trimmed; `None` when absent or blank.
    pub fn text(&self, key: &str) -> Option<String> {
        self.fields
            .get(key)
            .and_then(|values| values.first())
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    /// Newline-separated list field; `None` when absent.
    pub fn lines(&self, key: &str) -> Option<Vec<String>> {
        self.fields.get(key).map(|values| split_lines(values))
    }

    /// Comma-separated list field; `None` when absent, empty list when blank.
    pub fn commas(&self, key: &str) -> Option<Vec<String>> {
        self.fields.get(key).map(|values| split_commas(values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::LoginRequest;
    use axum::http::{HeaderMap, HeaderValue};

    #[test]
    fn test_extract_claims_missing_header() {
        let auth = AuthService::new("secret".to_string(), 1);
        let err = extract_claims(&HeaderMap::new(), &auth).unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(ref m) if m == "Missing token"));
    }

    #[test]
    fn test_extract_claims_wrong_scheme() {
        let auth = AuthService::new("secret".to_string(), 1);
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Basic abc"));
        let err = extract_claims(&headers, &auth).unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(ref m) if m == "Missing token"));
    }

    #[test]
    fn test_extract_claims_valid_and_invalid() {
        let auth = AuthService::new("secret".to_string(), 1);
        let token = auth.generate_token("u1", "a@b.c").unwrap();

        let mut headers = HeaderMap::new();
        headers.insert(
            "authorization",
            HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
        );
        assert_eq!(extract_claims(&headers, &auth).unwrap().sub, "u1");

        headers.insert("authorization", HeaderValue::from_static("Bearer garbage"));
        let err = extract_claims(&headers, &auth).unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(ref m) if m == "Invalid token"));
    }

    #[test]
    fn test_form_accessors() {
        let form = RecipeForm::with_fields(&[
            ("title", "  Stew "),
            ("description", "   "),
            ("ingredients", "beef\ncarrots\n"),
            ("instructions", "brown beef"),
            ("instructions", "simmer"),
            ("categories", "Dinner, Winter"),
        ]);

        assert_eq!(form.text("title").as_deref(), Some("Stew"));
        assert_eq!(form.text("description"), None);
        assert_eq!(form.lines("ingredients").unwrap(), vec!["beef", "carrots"]);
        assert_eq!(form.lines("instructions").unwrap(), vec!["brown beef", "simmer"]);
        assert_eq!(form.commas("categories").unwrap(), vec!["Dinner", "Winter"]);
        assert!(form.commas("missing").is_none());
    }

    async fn login_body(content_type: Option<&str>, body: &str) -> LoginRequest {
        let mut builder = axum::http::Request::builder().method("POST").uri("/api/auth/login");
        if let Some(content_type) = content_type {
            builder = builder.header(axum::http::header::CONTENT_TYPE, content_type);
        }
        let req = builder.body(axum::body::Body::from(body.to_string())).unwrap();

        let JsonBody(payload) = JsonBody::<LoginRequest>::from_request(req, &()).await.unwrap();
        payload
    }

    #[tokio::test]
    async fn test_json_body_reads_valid_json() {
        let payload = login_body(
            Some("application/json"),
            r#"{"email":"a@b.c","password":"pw"}"#,
        )
        .await;

        assert_eq!(payload.email, "a@b.c");
        assert_eq!(payload.password, "pw");
    }

    #[tokio::test]
    async fn test_json_body_treats_unusable_input_as_empty() {
        for (content_type, body) in [
            (None, ""),
            (Some("text/plain"), r#"{"email":"a@b.c"}"#),
            (Some("application/json"), "not json"),
            (Some("application/json"), r#"{"email": 42}"#),
        ] {
            let payload = login_body(content_type, body).await;
            assert!(payload.email.is_empty(), "body {:?} should read as empty", body);
            assert!(payload.password.is_empty());
        }
    }

    #[tokio::test]
    async fn test_json_body_accepts_null_fields() {
        let payload = login_body(
            Some("application/json"),
            r#"{"email":null,"password":"pw"}"#,
        )
        .await;

        assert!(payload.email.is_empty());
        assert_eq!(payload.password, "pw");
    }
}
