//! # Errors
//!
//! quire uses one structured error type across every crate boundary.
//! Core goals:
//! - consistent status codes + class names
//! - can be carried through `anyhow::Error` (workflows return `anyhow::Result`)
//! - transport-agnostic (the HTTP crate decides how to serialize)
//!
//! Leaf crates keep their own `thiserror` enums and map into `QuireError`
//! where a workflow decides what the failure means to a user.

use std::fmt;

use anyhow::Error as AnyError;
use serde_json::Value;

/// A convenience result type for quire APIs.
pub type QuireResult<T> = std::result::Result<T, AnyError>;

/// Error class names + status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    BadRequest,       // 400
    NotAuthenticated, // 401
    Forbidden,        // 403
    NotFound,         // 404
    Conflict,         // 409
    Unprocessable,    // 422
    TooManyRequests,  // 429
    GeneralError,     // 500
    BadGateway,       // 502
    Unavailable,      // 503
}

impl ErrorKind {
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorKind::BadRequest => 400,
            ErrorKind::NotAuthenticated => 401,
            ErrorKind::Forbidden => 403,
            ErrorKind::NotFound => 404,
            ErrorKind::Conflict => 409,
            ErrorKind::Unprocessable => 422,
            ErrorKind::TooManyRequests => 429,
            ErrorKind::GeneralError => 500,
            ErrorKind::BadGateway => 502,
            ErrorKind::Unavailable => 503,
        }
    }

    /// Error `name` (e.g. "NotFound")
    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "BadRequest",
            ErrorKind::NotAuthenticated => "NotAuthenticated",
            ErrorKind::Forbidden => "Forbidden",
            ErrorKind::NotFound => "NotFound",
            ErrorKind::Conflict => "Conflict",
            ErrorKind::Unprocessable => "Unprocessable",
            ErrorKind::TooManyRequests => "TooManyRequests",
            ErrorKind::GeneralError => "GeneralError",
            ErrorKind::BadGateway => "BadGateway",
            ErrorKind::Unavailable => "Unavailable",
        }
    }

    /// Error `className` (kebab-cased)
    pub fn class_name(&self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "bad-request",
            ErrorKind::NotAuthenticated => "not-authenticated",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::NotFound => "not-found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Unprocessable => "unprocessable",
            ErrorKind::TooManyRequests => "too-many-requests",
            ErrorKind::GeneralError => "general-error",
            ErrorKind::BadGateway => "bad-gateway",
            ErrorKind::Unavailable => "unavailable",
        }
    }

    /// Whether the message of an error of this kind is meant for end users.
    ///
    /// Validation, lookup and authorization failures are written for the
    /// person in front of the form. Backend failures are not.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            ErrorKind::BadRequest
                | ErrorKind::NotAuthenticated
                | ErrorKind::Forbidden
                | ErrorKind::NotFound
                | ErrorKind::Conflict
                | ErrorKind::Unprocessable
                | ErrorKind::TooManyRequests
        )
    }
}

/// A structured error that can live inside `anyhow::Error`.
///
/// Fields:
/// - name
/// - message
/// - code (HTTP status)
/// - class_name
/// - data (optional)
/// - errors (optional, per-field messages)
#[derive(Debug)]
pub struct QuireError {
    pub kind: ErrorKind,
    pub message: String,
    pub data: Option<Value>,
    pub errors: Option<Value>,
    pub source: Option<AnyError>,
}

impl QuireError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            data: None,
            errors: None,
            source: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_errors(mut self, errors: Value) -> Self {
        self.errors = Some(errors);
        self
    }

    pub fn with_source(mut self, source: AnyError) -> Self {
        self.source = Some(source);
        self
    }

    pub fn code(&self) -> u16 {
        self.kind.status_code()
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn class_name(&self) -> &'static str {
        self.kind.class_name()
    }

    /// Convert into `anyhow::Error` so it flows through `?`.
    pub fn into_anyhow(self) -> AnyError {
        AnyError::new(self)
    }

    /// Find a `QuireError` anywhere in an `anyhow` chain.
    pub fn from_anyhow(err: &AnyError) -> Option<&QuireError> {
        err.chain().find_map(|e| e.downcast_ref::<QuireError>())
    }

    /// Kind of the first `QuireError` in the chain, if any.
    pub fn kind_of(err: &AnyError) -> Option<ErrorKind> {
        Self::from_anyhow(err).map(|e| e.kind)
    }

    /// Turn any error into a QuireError:
    /// - if it already is one, keep it (lossless)
    /// - otherwise wrap as GeneralError
    pub fn normalize(err: AnyError) -> QuireError {
        match err.downcast::<QuireError>() {
            Ok(quire) => quire,
            Err(other) => {
                QuireError::new(ErrorKind::GeneralError, other.to_string()).with_source(other)
            }
        }
    }

    /// A version suitable for returning to clients: the inner `source`
    /// (backend details) is dropped.
    pub fn sanitize_for_client(&self) -> QuireError {
        QuireError {
            kind: self.kind,
            message: self.message.clone(),
            data: self.data.clone(),
            errors: self.errors.clone(),
            source: None,
        }
    }

    pub fn to_json(&self) -> Value {
        use serde_json::json;

        let mut base = json!({
            "name": self.name(),
            "message": self.message,
            "code": self.code(),
            "className": self.class_name(),
        });

        if let Some(d) = &self.data {
            base["data"] = d.clone();
        }
        if let Some(e) = &self.errors {
            base["errors"] = e.clone();
        }
        base
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadRequest, msg)
    }
    pub fn not_authenticated(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotAuthenticated, msg)
    }
    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Forbidden, msg)
    }
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, msg)
    }
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, msg)
    }
    pub fn unprocessable(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unprocessable, msg)
    }
    pub fn too_many_requests(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::TooManyRequests, msg)
    }
    pub fn general_error(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::GeneralError, msg)
    }
    pub fn bad_gateway(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadGateway, msg)
    }
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unavailable, msg)
    }
}

impl fmt::Display for QuireError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.name(), self.code(), self.message)
    }
}

impl std::error::Error for QuireError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Bail out of an `anyhow::Result` function with a `QuireError`.
#[macro_export]
macro_rules! bail_quire {
    ($ctor:ident, $msg:expr) => {
        return Err($crate::errors::QuireError::$ctor($msg).into_anyhow())
    };
    ($ctor:ident, $fmt:expr, $($arg:tt)*) => {
        return Err($crate::errors::QuireError::$ctor(format!($fmt, $($arg)*)).into_anyhow())
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_keeps_structured_errors() {
        let err = QuireError::conflict("taken").into_anyhow();
        let normalized = QuireError::normalize(err);
        assert_eq!(normalized.kind, ErrorKind::Conflict);
        assert_eq!(normalized.message, "taken");
    }

    #[test]
    fn normalize_wraps_foreign_errors_as_general() {
        let normalized = QuireError::normalize(anyhow::anyhow!("socket closed"));
        assert_eq!(normalized.kind, ErrorKind::GeneralError);
        assert!(normalized.source.is_some());
        assert!(normalized.sanitize_for_client().source.is_none());
    }

    #[test]
    fn kind_is_found_through_context() {
        let err = QuireError::not_found("Draft not found.")
            .into_anyhow()
            .context("loading draft");
        assert_eq!(QuireError::kind_of(&err), Some(ErrorKind::NotFound));
    }

    #[test]
    fn json_shape() {
        let v = QuireError::unprocessable("Cannot save an empty draft.")
            .with_errors(serde_json::json!({"_schema": ["empty"]}))
            .to_json();
        assert_eq!(v["name"], "Unprocessable");
        assert_eq!(v["code"], 422);
        assert_eq!(v["className"], "unprocessable");
        assert_eq!(v["errors"]["_schema"][0], "empty");
        assert!(v.get("data").is_none());
    }
}
