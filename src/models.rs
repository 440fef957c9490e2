use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use validator::Validate;

use crate::service::ClientService;

#[derive(Clone)]
pub struct AppState {
    pub clients: ClientService,
}

pub const DEFAULT_IS_PROJECT: &str = "0";
pub const DEFAULT_SELF_CAPTURE: &str = "1";
pub const DEFAULT_CLIENT_LOGO: &str = "no-image.jpg";
/// Column width of `clients.client_logo`.
pub const MAX_CLIENT_LOGO_LEN: usize = 255;

/// Whether a client is live or has been soft-deleted.
///
/// Serialized as the nullable `deleted_at` timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Option<DateTime<Utc>>", into = "Option<DateTime<Utc>>")]
pub enum Lifecycle {
    #[default]
    Active,
    Deleted { at: DateTime<Utc> },
}

impl Lifecycle {
    pub fn is_active(&self) -> bool {
        matches!(self, Lifecycle::Active)
    }

    pub fn deleted_at(&self) -> Option<DateTime<Utc>> {
        match self {
            Lifecycle::Active => None,
            Lifecycle::Deleted { at } => Some(*at),
        }
    }
}

impl From<Option<DateTime<Utc>>> for Lifecycle {
    fn from(value: Option<DateTime<Utc>>) -> Self {
        match value {
            Some(at) => Lifecycle::Deleted { at },
            None => Lifecycle::Active,
        }
    }
}

impl From<Lifecycle> for Option<DateTime<Utc>> {
    fn from(value: Lifecycle) -> Self {
        value.deleted_at()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub is_project: String,
    pub self_capture: String,
    pub client_prefix: String,
    pub client_logo: String,
    pub address: Option<String>,
    pub phone_number: Option<String>,
    pub city: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(rename = "deleted_at", default)]
    pub lifecycle: Lifecycle,
}

// Note: FromRow is needed for runtime query_as (without DATABASE_URL at compile time)
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ClientRow {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub is_project: String,
    pub self_capture: String,
    pub client_prefix: String,
    pub client_logo: String,
    pub address: Option<String>,
    pub phone_number: Option<String>,
    pub city: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl From<ClientRow> for Client {
    fn from(row: ClientRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            slug: row.slug,
            is_project: row.is_project,
            self_capture: row.self_capture,
            client_prefix: row.client_prefix,
            client_logo: row.client_logo,
            address: row.address,
            phone_number: row.phone_number,
            city: row.city,
            created_at: row.created_at,
            updated_at: row.updated_at,
            lifecycle: row.deleted_at.into(),
        }
    }
}

// API Request types

/// Fields accepted when creating a client.
#[derive(Debug, Clone, PartialEq, Deserialize, Validate)]
pub struct NewClient {
    #[validate(length(min = 1, max = 250))]
    pub name: String,
    #[validate(length(min = 1, max = 100))]
    pub slug: String,
    #[serde(default = "default_is_project")]
    #[validate(length(max = 30))]
    pub is_project: String,
    #[serde(default = "default_self_capture")]
    #[validate(length(equal = 1))]
    pub self_capture: String,
    #[validate(length(min = 1, max = 4))]
    pub client_prefix: String,
    #[serde(default = "default_client_logo")]
    #[validate(length(max = 255))]
    pub client_logo: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    #[validate(length(max = 50))]
    pub phone_number: Option<String>,
    #[serde(default)]
    #[validate(length(max = 50))]
    pub city: Option<String>,
}

fn default_is_project() -> String {
    DEFAULT_IS_PROJECT.to_string()
}

fn default_self_capture() -> String {
    DEFAULT_SELF_CAPTURE.to_string()
}

fn default_client_logo() -> String {
    DEFAULT_CLIENT_LOGO.to_string()
}

/// Partial update of a client.
///
/// A field left out of the body is `None` and keeps its stored value.
/// Non-nullable columns reject an explicit `null`; for the nullable ones
/// (`address`, `phone_number`, `city`) `Some(None)` clears the value.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Validate)]
pub struct ClientPatch {
    #[serde(default, deserialize_with = "present")]
    #[validate(length(min = 1, max = 250))]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "present")]
    #[validate(length(min = 1, max = 100))]
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "present")]
    #[validate(length(max = 30))]
    pub is_project: Option<String>,
    #[serde(default, deserialize_with = "present")]
    #[validate(length(equal = 1))]
    pub self_capture: Option<String>,
    #[serde(default, deserialize_with = "present")]
    #[validate(length(min = 1, max = 4))]
    pub client_prefix: Option<String>,
    #[serde(default, deserialize_with = "present")]
    #[validate(length(max = 255))]
    pub client_logo: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub address: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[validate(length(max = 50))]
    pub phone_number: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[validate(length(max = 50))]
    pub city: Option<Option<String>>,
}

fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl ClientPatch {
    /// Overwrite every field present in the patch onto `client`.
    pub fn apply_to(self, client: &mut Client) {
        if let Some(name) = self.name {
            client.name = name;
        }
        if let Some(slug) = self.slug {
            client.slug = slug;
        }
        if let Some(is_project) = self.is_project {
            client.is_project = is_project;
        }
        if let Some(self_capture) = self.self_capture {
            client.self_capture = self_capture;
        }
        if let Some(client_prefix) = self.client_prefix {
            client.client_prefix = client_prefix;
        }
        if let Some(client_logo) = self.client_logo {
            client.client_logo = client_logo;
        }
        if let Some(address) = self.address {
            client.address = address;
        }
        if let Some(phone_number) = self.phone_number {
            client.phone_number = phone_number;
        }
        if let Some(city) = self.city {
            client.city = city;
        }
    }
}

/// Logo file received alongside a create request.
#[derive(Debug, Clone)]
pub struct LogoUpload {
    pub filename: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub database: String,
    pub cache: String,
}
