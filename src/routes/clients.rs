use axum::{
    body::Bytes,
    extract::{FromRequest, Multipart, Path, Request, State},
    http::{header::CONTENT_TYPE, StatusCode},
    routing::{get, post},
    Form, Json, Router,
};
use serde_json::{Map, Value};
use tracing::info;

use crate::models::{AppState, Client, LogoUpload, NewClient};
use crate::types::{AppError, AppResult};

/// Multipart field carrying the logo file.
const LOGO_FIELD: &str = "client_logo";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/clients", post(create_client))
        .route(
            "/clients/{slug}",
            get(get_client).put(update_client).delete(delete_client),
        )
}

/// POST /clients
async fn create_client(
    State(state): State<AppState>,
    request: Request,
) -> AppResult<(StatusCode, Json<Client>)> {
    let content_type = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_ascii_lowercase();

    let (input, logo) = if content_type.starts_with("multipart/form-data") {
        let multipart = Multipart::from_request(request, &state)
            .await
            .map_err(|e| AppError::InvalidInput(e.body_text()))?;
        read_multipart(multipart).await?
    } else if content_type.starts_with("application/json") {
        let Json(input) = Json::<NewClient>::from_request(request, &state)
            .await
            .map_err(|e| AppError::InvalidInput(e.body_text()))?;
        (input, None)
    } else if content_type.starts_with("application/x-www-form-urlencoded") {
        let Form(input) = Form::<NewClient>::from_request(request, &state)
            .await
            .map_err(|e| AppError::InvalidInput(e.body_text()))?;
        (input, None)
    } else {
        return Err(AppError::InvalidInput(format!(
            "unsupported content type '{}'",
            content_type
        )));
    };

    info!(slug = %input.slug, has_logo = logo.is_some(), "Create client request received");

    let client = state.clients.create(input, logo).await?;
    Ok((StatusCode::CREATED, Json(client)))
}

/// Split a multipart body into client fields and the optional logo file.
///
/// A `client_logo` part without a filename is taken as a plain logo
/// reference; an empty file part counts as no logo.
async fn read_multipart(mut multipart: Multipart) -> AppResult<(NewClient, Option<LogoUpload>)> {
    let mut fields = Map::new();
    let mut logo = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);

        match (name.as_str(), file_name) {
            (LOGO_FIELD, Some(filename)) => {
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::InvalidInput(e.body_text()))?;
                if !data.is_empty() {
                    logo = Some(LogoUpload {
                        filename,
                        content_type,
                        data,
                    });
                }
            }
            (_, Some(_)) => {
                // Files in any other field are not part of a client
            }
            (_, None) => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::InvalidInput(e.body_text()))?;
                fields.insert(name, Value::String(text));
            }
        }
    }

    let input = serde_json::from_value(Value::Object(fields))
        .map_err(|e| AppError::InvalidInput(e.to_string()))?;
    Ok((input, logo))
}

/// GET /clients/{slug}
async fn get_client(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<Json<Client>> {
    let client = state.clients.get(&slug).await?;
    Ok(Json(client))
}

/// PUT /clients/{slug}
async fn update_client(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    body: Bytes,
) -> AppResult<Json<Client>> {
    info!(slug = %slug, "Update client request received");

    let client = state.clients.update(&slug, &body).await?;
    Ok(Json(client))
}

/// DELETE /clients/{slug}
async fn delete_client(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<StatusCode> {
    info!(slug = %slug, "Delete client request received");

    state.clients.delete(&slug).await?;
    Ok(StatusCode::NO_CONTENT)
}
