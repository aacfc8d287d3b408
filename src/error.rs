use axum::extract::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use std::env;
use std::fmt::Debug;

#[derive(Debug)]
pub struct Error {
    pub code: i32,
    pub message: String,
}

impl From<env::VarError> for Error {
    fn from(err: env::VarError) -> Self {
        env_var_error(err)
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            // the partial unique indexes backstop the in-transaction checks
            match db_err.constraint() {
                Some("one_accepted_bid_per_request") => return already_matched_error(),
                Some("one_live_bid_per_driver") => return duplicate_bid_error(),
                _ => (),
            }
        }

        database_error(err)
    }
}

impl From<oso::OsoError> for Error {
    fn from(err: oso::OsoError) -> Self {
        oso_error(err)
    }
}

impl From<jsonwebtoken::errors::Error> for Error {
    fn from(_: jsonwebtoken::errors::Error) -> Self {
        unauthenticated_error()
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error_message) = match self.code {
            1..=99 => (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error"),
            201 => (StatusCode::UNAUTHORIZED, self.message.as_str()),
            202 => (StatusCode::FORBIDDEN, self.message.as_str()),
            300..=399 => (StatusCode::NOT_FOUND, self.message.as_str()),
            400..=499 => (StatusCode::CONFLICT, self.message.as_str()),
            _ => (StatusCode::BAD_REQUEST, self.message.as_str()),
        };

        let body = Json(json!({
            "code": self.code,
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

pub fn env_var_error(_: env::VarError) -> Error {
    Error {
        code: 1,
        message: "environment variable error".into(),
    }
}

pub fn database_error<T: Debug>(_: T) -> Error {
    Error {
        code: 2,
        message: "database error".into(),
    }
}

pub fn unexpected_error() -> Error {
    Error {
        code: 5,
        message: "unexpected error".into(),
    }
}

pub fn oso_error<T: Debug>(_: T) -> Error {
    Error {
        code: 6,
        message: "authorization engine error".into(),
    }
}

pub fn invalid_state_error() -> Error {
    Error {
        code: 100,
        message: "invalid state".into(),
    }
}

pub fn invalid_input_error() -> Error {
    Error {
        code: 101,
        message: "invalid input".into(),
    }
}

pub fn unauthenticated_error() -> Error {
    Error {
        code: 201,
        message: "unauthenticated".into(),
    }
}

pub fn forbidden_error() -> Error {
    Error {
        code: 202,
        message: "forbidden".into(),
    }
}

pub fn request_not_found_error() -> Error {
    Error {
        code: 300,
        message: "request not found".into(),
    }
}

pub fn bid_not_found_error() -> Error {
    Error {
        code: 301,
        message: "bid not found".into(),
    }
}

pub fn vehicle_not_found_error() -> Error {
    Error {
        code: 302,
        message: "vehicle not found".into(),
    }
}

pub fn capacity_exceeded_error() -> Error {
    Error {
        code: 400,
        message: "capacity exceeded".into(),
    }
}

pub fn already_joined_error() -> Error {
    Error {
        code: 401,
        message: "already joined".into(),
    }
}

pub fn duplicate_bid_error() -> Error {
    Error {
        code: 402,
        message: "duplicate bid".into(),
    }
}

pub fn already_matched_error() -> Error {
    Error {
        code: 403,
        message: "already matched".into(),
    }
}

pub fn request_closed_error() -> Error {
    Error {
        code: 404,
        message: "request closed".into(),
    }
}

pub fn vehicle_not_eligible_error() -> Error {
    Error {
        code: 405,
        message: "vehicle not eligible".into(),
    }
}

#[test]
fn error_response_status_mapping() {
    use axum::response::IntoResponse;

    assert_eq!(
        database_error("boom").into_response().status(),
        StatusCode::INTERNAL_SERVER_ERROR
    );
    assert_eq!(
        invalid_input_error().into_response().status(),
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        invalid_state_error().into_response().status(),
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        unauthenticated_error().into_response().status(),
        StatusCode::UNAUTHORIZED
    );
    assert_eq!(
        forbidden_error().into_response().status(),
        StatusCode::FORBIDDEN
    );
    assert_eq!(
        request_not_found_error().into_response().status(),
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        capacity_exceeded_error().into_response().status(),
        StatusCode::CONFLICT
    );
    assert_eq!(
        already_joined_error().into_response().status(),
        StatusCode::CONFLICT
    );
    assert_eq!(
        duplicate_bid_error().into_response().status(),
        StatusCode::CONFLICT
    );
    assert_eq!(
        already_matched_error().into_response().status(),
        StatusCode::CONFLICT
    );
    assert_eq!(
        request_closed_error().into_response().status(),
        StatusCode::CONFLICT
    );
    assert_eq!(
        vehicle_not_eligible_error().into_response().status(),
        StatusCode::CONFLICT
    );
}

#[test]
fn internal_errors_mask_their_message() {
    use axum::response::IntoResponse;

    let response = database_error("connection reset").into_response();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}
