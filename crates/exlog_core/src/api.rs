//! Transport-facing request/response contract.
//!
//! # Responsibility
//! - Coerce loosely typed request payloads (JSON bodies or query strings)
//!   into validated service input, field by field.
//! - Project service results into the public response shapes.
//! - Map service failures onto status codes with plain-text messages.
//!
//! # Invariants
//! - Validation is reported for the first offending field, in the order
//!   userId, description, durationMinutes, date (or from, to, limit).
//! - Unmatched routes reply `404` with body `not found`.
//! - Store failure details are logged, never echoed to callers.

use crate::model::date::EntryDate;
use crate::model::entry::{ExerciseEntry, NewEntry};
use crate::model::user::{User, UserId};
use crate::model::validation::ValidationError;
use crate::service::exercise_service::{ExerciseService, LoggedEntry};
use crate::service::log_query::{DateRange, EntryLimit, ExerciseLog, LogQuery};
use crate::service::ServiceError;
use crate::store::Store;
use log::{error, info};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub const STATUS_OK: u16 = 200;
pub const STATUS_BAD_REQUEST: u16 = 400;
pub const STATUS_NOT_FOUND: u16 = 404;
pub const STATUS_INTERNAL_ERROR: u16 = 500;

const NOT_FOUND_BODY: &str = "not found";
const INTERNAL_ERROR_BODY: &str = "internal server error";

/// Request method understood by the route table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// Operations exposed to transport callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    NewUser,
    ListUsers,
    AddEntry,
    GetLog,
}

impl Route {
    const ALL: [Route; 4] = [
        Route::NewUser,
        Route::ListUsers,
        Route::AddEntry,
        Route::GetLog,
    ];

    pub fn method(self) -> Method {
        match self {
            Self::NewUser | Self::AddEntry => Method::Post,
            Self::ListUsers | Self::GetLog => Method::Get,
        }
    }

    pub fn path(self) -> &'static str {
        match self {
            Self::NewUser => "/api/exercise/new-user",
            Self::ListUsers => "/api/exercise/users",
            Self::AddEntry => "/api/exercise/add",
            Self::GetLog => "/api/exercise/log",
        }
    }

    /// Matches a method and path, ignoring one trailing slash.
    pub fn resolve(method: Method, path: &str) -> Option<Self> {
        let trimmed = match path.strip_suffix('/') {
            Some(rest) if !rest.is_empty() => rest,
            _ => path,
        };
        Self::ALL
            .into_iter()
            .find(|route| route.method() == method && route.path() == trimmed)
    }

    fn label(self) -> &'static str {
        match self {
            Self::NewUser => "new_user",
            Self::ListUsers => "list_users",
            Self::AddEntry => "add_entry",
            Self::GetLog => "get_log",
        }
    }
}

/// A scalar request field as it arrives from forms, query strings or JSON.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl Display for Scalar {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Integer(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value}"),
            Self::Text(value) => write!(f, "{value}"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CreateUserRequest {
    pub username: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddEntryRequest {
    pub user_id: Option<Scalar>,
    pub description: Option<String>,
    /// Also accepted as `duration`.
    #[serde(alias = "duration")]
    pub duration_minutes: Option<Scalar>,
    pub date: Option<Scalar>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogRequest {
    pub user_id: Option<Scalar>,
    pub from: Option<Scalar>,
    pub to: Option<Scalar>,
    pub limit: Option<Scalar>,
}

/// `{id, username}` projection of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserResponse {
    pub id: UserId,
    pub username: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryCreatedResponse {
    pub user_id: UserId,
    pub username: String,
    pub description: String,
    pub duration_minutes: u32,
    pub date: EntryDate,
}

impl From<LoggedEntry> for EntryCreatedResponse {
    fn from(logged: LoggedEntry) -> Self {
        Self {
            user_id: logged.user.id,
            username: logged.user.username,
            description: logged.entry.description,
            duration_minutes: logged.entry.duration_minutes,
            date: logged.entry.date,
        }
    }
}

/// Log entry with owner and internal id stripped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntryResponse {
    pub description: String,
    pub duration_minutes: u32,
    pub date: EntryDate,
}

impl From<ExerciseEntry> for LogEntryResponse {
    fn from(entry: ExerciseEntry) -> Self {
        Self {
            description: entry.description,
            duration_minutes: entry.duration_minutes,
            date: entry.date,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogResponse {
    pub user: UserResponse,
    pub entries: Vec<LogEntryResponse>,
}

impl From<ExerciseLog> for LogResponse {
    fn from(log: ExerciseLog) -> Self {
        Self {
            user: log.user.into(),
            entries: log.entries.into_iter().map(Into::into).collect(),
        }
    }
}

/// Failure projected for transport callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: u16,
    pub message: String,
}

impl ApiError {
    pub fn not_found() -> Self {
        Self {
            status: STATUS_NOT_FOUND,
            message: NOT_FOUND_BODY.to_string(),
        }
    }
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.status, self.message)
    }
}

impl std::error::Error for ApiError {}

impl From<ValidationError> for ApiError {
    fn from(value: ValidationError) -> Self {
        Self {
            status: STATUS_BAD_REQUEST,
            message: value.to_string(),
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(value: ServiceError) -> Self {
        match value {
            ServiceError::Validation(err) => err.into(),
            ServiceError::UserNotFound(_) => Self {
                status: STATUS_NOT_FOUND,
                message: value.to_string(),
            },
            ServiceError::Store(err) => {
                error!("event=api_request module=api status=error error_code=store_failure error={err}");
                Self {
                    status: STATUS_INTERNAL_ERROR,
                    message: INTERNAL_ERROR_BODY.to_string(),
                }
            }
        }
    }
}

/// Reply body with its content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    Json(String),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiReply {
    pub status: u16,
    pub body: Body,
}

impl ApiReply {
    fn json(value: &impl Serialize) -> Self {
        match serde_json::to_string(value) {
            Ok(body) => Self {
                status: STATUS_OK,
                body: Body::Json(body),
            },
            Err(err) => {
                error!("event=api_encode module=api status=error error={err}");
                Self::from(ApiError {
                    status: STATUS_INTERNAL_ERROR,
                    message: INTERNAL_ERROR_BODY.to_string(),
                })
            }
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self.body {
            Body::Json(_) => "application/json",
            Body::Text(_) => "text/plain; charset=utf-8",
        }
    }

    pub fn body_text(&self) -> &str {
        match &self.body {
            Body::Json(text) | Body::Text(text) => text,
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

impl From<ApiError> for ApiReply {
    fn from(value: ApiError) -> Self {
        Self {
            status: value.status,
            body: Body::Text(value.message),
        }
    }
}

pub fn create_user<S: Store>(
    service: &ExerciseService<S>,
    request: CreateUserRequest,
) -> Result<UserResponse, ApiError> {
    let username = request.username.unwrap_or_default();
    Ok(service.create_user(username)?.into())
}

pub fn list_users<S: Store>(service: &ExerciseService<S>) -> Result<Vec<UserResponse>, ApiError> {
    let users = service.list_users()?;
    Ok(users.into_iter().map(Into::into).collect())
}

pub fn add_entry<S: Store>(
    service: &ExerciseService<S>,
    request: AddEntryRequest,
) -> Result<EntryCreatedResponse, ApiError> {
    let user_id = require_user_id(request.user_id)?;
    let description = request
        .description
        .filter(|value| !value.trim().is_empty())
        .ok_or(ValidationError::EmptyDescription)?;
    let duration_minutes = require_duration(request.duration_minutes)?;
    let date = optional_date("date", request.date)?;

    let logged = service.add_entry(NewEntry {
        user_id,
        description,
        duration_minutes,
        date,
    })?;
    Ok(logged.into())
}

pub fn get_log<S: Store>(
    service: &ExerciseService<S>,
    request: LogRequest,
) -> Result<LogResponse, ApiError> {
    let query = LogQuery {
        user_id: require_user_id(request.user_id)?,
        range: DateRange {
            from: optional_date("from", request.from)?,
            to: optional_date("to", request.to)?,
        },
        limit: optional_limit(request.limit)?,
    };
    Ok(service.get_log(&query)?.into())
}

/// Routes one request to its handler and renders the reply.
///
/// `payload` is the JSON body for `POST` routes or the query parameters
/// (as a JSON object of strings) for `GET` routes; `null` means empty.
pub fn dispatch<S: Store>(
    service: &ExerciseService<S>,
    method: Method,
    path: &str,
    payload: Value,
) -> ApiReply {
    let Some(route) = Route::resolve(method, path) else {
        info!(
            "event=api_request module=api status=error route=unmatched http_status={STATUS_NOT_FOUND}"
        );
        return ApiError::not_found().into();
    };

    let reply = match route {
        Route::NewUser => decode(payload)
            .and_then(|request| create_user(service, request))
            .map(|response| ApiReply::json(&response)),
        Route::ListUsers => list_users(service).map(|response| ApiReply::json(&response)),
        Route::AddEntry => decode(payload)
            .and_then(|request| add_entry(service, request))
            .map(|response| ApiReply::json(&response)),
        Route::GetLog => decode(payload)
            .and_then(|request| get_log(service, request))
            .map(|response| ApiReply::json(&response)),
    }
    .unwrap_or_else(ApiReply::from);

    info!(
        "event=api_request module=api status={} route={} http_status={}",
        if reply.is_success() { "ok" } else { "error" },
        route.label(),
        reply.status
    );
    reply
}

fn decode<T: DeserializeOwned + Default>(payload: Value) -> Result<T, ApiError> {
    if payload.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(payload)
        .map_err(|err| ValidationError::MalformedRequest(err.to_string()).into())
}

fn require_user_id(raw: Option<Scalar>) -> Result<UserId, ValidationError> {
    match raw {
        None => Err(ValidationError::MissingUserId),
        Some(Scalar::Text(text)) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return Err(ValidationError::MissingUserId);
            }
            Uuid::parse_str(trimmed).map_err(|_| ValidationError::InvalidUserId(trimmed.to_string()))
        }
        Some(other) => Err(ValidationError::InvalidUserId(other.to_string())),
    }
}

fn require_duration(raw: Option<Scalar>) -> Result<i64, ValidationError> {
    let invalid = |value: &dyn Display| ValidationError::InvalidDuration(value.to_string());
    match raw {
        None => Err(ValidationError::MissingDuration),
        Some(Scalar::Integer(minutes)) => Ok(minutes),
        Some(Scalar::Float(minutes)) => whole_number(minutes).ok_or_else(|| invalid(&minutes)),
        Some(Scalar::Text(text)) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return Err(ValidationError::MissingDuration);
            }
            trimmed
                .parse::<i64>()
                .ok()
                .or_else(|| trimmed.parse::<f64>().ok().and_then(whole_number))
                .ok_or_else(|| invalid(&trimmed))
        }
    }
}

fn optional_date(
    field: &'static str,
    raw: Option<Scalar>,
) -> Result<Option<EntryDate>, ValidationError> {
    let invalid = |value: String| ValidationError::InvalidDate { field, value };
    match raw {
        None => Ok(None),
        Some(Scalar::Integer(epoch_ms)) => EntryDate::from_epoch_ms(epoch_ms)
            .map(Some)
            .ok_or_else(|| invalid(epoch_ms.to_string())),
        Some(Scalar::Float(epoch_ms)) => whole_number(epoch_ms)
            .and_then(EntryDate::from_epoch_ms)
            .map(Some)
            .ok_or_else(|| invalid(epoch_ms.to_string())),
        Some(Scalar::Text(text)) if text.trim().is_empty() => Ok(None),
        Some(Scalar::Text(text)) => text
            .parse::<EntryDate>()
            .map(Some)
            .map_err(|err| invalid(err.input().to_string())),
    }
}

fn optional_limit(raw: Option<Scalar>) -> Result<EntryLimit, ValidationError> {
    let Some(raw) = raw else {
        return Ok(EntryLimit::Unbounded);
    };
    let count = match &raw {
        Scalar::Text(text) if text.trim().is_empty() => return Ok(EntryLimit::Unbounded),
        Scalar::Text(text) => parse_saturating_count(text.trim()),
        Scalar::Integer(count) => Some(*count),
        Scalar::Float(count) => whole_number(*count),
    };
    // Caps beyond the stored range mean "as many as exist".
    let count = count
        .filter(|value| *value > 0)
        .map(|value| u32::try_from(value).unwrap_or(u32::MAX))
        .ok_or_else(|| ValidationError::InvalidLimit(raw.to_string()))?;
    EntryLimit::at_most(count)
}

fn parse_saturating_count(text: &str) -> Option<i64> {
    let all_digits = !text.is_empty() && text.bytes().all(|byte| byte.is_ascii_digit());
    text.parse::<i64>()
        .ok()
        .or_else(|| all_digits.then_some(i64::MAX))
}

fn whole_number(value: f64) -> Option<i64> {
    // i64::MAX as f64 rounds up to 2^63, so the upper bound is exclusive.
    let in_range = value >= i64::MIN as f64 && value < i64::MAX as f64;
    (value.is_finite() && value.fract() == 0.0 && in_range).then_some(value as i64)
}
