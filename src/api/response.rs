//! Layer3 response contract for `/verify`.

use crate::verify::{PohStatus, UpstreamError};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// Message for a request without an `address` parameter.
pub const MSG_MISSING_ADDRESS: &str = "Missing required parameter: address";
/// Message for a malformed address.
pub const MSG_INVALID_ADDRESS: &str = "Invalid Ethereum address format";
/// Message for a client over its local rate limit.
pub const MSG_RATE_LIMITED: &str = "Rate limit exceeded. Please try again later.";
/// Message when the upstream API is throttling us.
pub const MSG_UPSTREAM_UNAVAILABLE: &str =
    "Service temporarily unavailable. Please try again later.";
/// Message for any other upstream failure.
pub const MSG_INTERNAL_ERROR: &str = "Internal server error while verifying PoH status";

/// JSON body of every `/verify` response.
#[derive(Debug, Serialize)]
pub struct VerifyBody {
    /// `success` or `failed`.
    pub status: &'static str,
    /// Present on error responses only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

/// Terminal outcome of a `/verify` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyReply {
    /// Address resolved, from cache or upstream.
    Verified(PohStatus),
    /// No `address` parameter (or an empty one).
    MissingAddress,
    /// `address` is not `0x` + 40 hex digits.
    InvalidAddress,
    /// Client exceeded the local rate limit.
    RateLimited,
    /// Upstream signalled it is throttling us.
    UpstreamUnavailable,
    /// Any other upstream failure.
    InternalError,
}

impl VerifyReply {
    /// Map an upstream failure to its reply.
    #[must_use]
    pub fn from_upstream_error(err: &UpstreamError) -> Self {
        if err.is_rate_limited() {
            Self::UpstreamUnavailable
        } else {
            Self::InternalError
        }
    }

    /// HTTP status code.
    #[must_use]
    pub fn status_code(self) -> StatusCode {
        match self {
            Self::Verified(_) => StatusCode::OK,
            Self::MissingAddress | Self::InvalidAddress => StatusCode::BAD_REQUEST,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::UpstreamUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// JSON body.
    #[must_use]
    pub fn body(self) -> VerifyBody {
        let (status, message) = match self {
            Self::Verified(PohStatus::Human) => ("success", None),
            Self::Verified(PohStatus::NotHuman) => ("failed", None),
            Self::MissingAddress => ("failed", Some(MSG_MISSING_ADDRESS)),
            Self::InvalidAddress => ("failed", Some(MSG_INVALID_ADDRESS)),
            Self::RateLimited => ("failed", Some(MSG_RATE_LIMITED)),
            Self::UpstreamUnavailable => ("failed", Some(MSG_UPSTREAM_UNAVAILABLE)),
            Self::InternalError => ("failed", Some(MSG_INTERNAL_ERROR)),
        };
        VerifyBody { status, message }
    }
}

impl IntoResponse for VerifyReply {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.body())).into_response()
    }
}
