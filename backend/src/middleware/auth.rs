//! Authentication middleware
//!
//! The platform never authenticates anyone itself: tokens are issued by the
//! identity provider and this middleware only verifies them and extracts the
//! resolved actor (id, role, optional branch) for downstream handlers.

use axum::{
    extract::Request,
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use shared::{Actor, Role};

use crate::error::ErrorResponse;

/// Authenticated actor information extracted from the JWT
#[derive(Clone, Debug)]
pub struct AuthUser(pub Actor);

/// Authentication middleware that validates bearer tokens
pub async fn auth_middleware(mut request: Request, next: Next) -> Response {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = match auth_header {
        Some(header) if header.starts_with("Bearer ") => &header[7..],
        _ => {
            return unauthorized_response("Missing or invalid Authorization header");
        }
    };

    // Secret comes from the environment so the middleware stays state-free
    let jwt_secret = std::env::var("BSM__JWT__SECRET")
        .or_else(|_| std::env::var("BSM_JWT_SECRET"))
        .unwrap_or_else(|_| "development-secret-key".to_string());

    let claims = match decode_jwt(token, &jwt_secret) {
        Ok(claims) => claims,
        Err(msg) => {
            return unauthorized_response(&msg);
        }
    };

    let actor_id = match uuid::Uuid::parse_str(&claims.sub) {
        Ok(id) => id,
        Err(_) => return unauthorized_response("Invalid actor ID in token"),
    };

    let role = match Role::from_str(&claims.role) {
        Ok(role) => role,
        Err(_) => return unauthorized_response("Invalid role in token"),
    };

    let branch_id = match claims.branch_id {
        Some(raw) => match uuid::Uuid::parse_str(&raw) {
            Ok(id) => Some(id),
            Err(_) => return unauthorized_response("Invalid branch ID in token"),
        },
        None => None,
    };

    request.extensions_mut().insert(AuthUser(Actor {
        id: actor_id,
        role,
        branch_id,
    }));

    next.run(request).await
}

/// JWT claims structure supplied by the identity provider
#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct Claims {
    sub: String,
    role: String,
    branch_id: Option<String>,
    exp: i64,
    iat: i64,
}

/// Decode and validate JWT token
fn decode_jwt(token: &str, secret: &str) -> Result<Claims, String> {
    use jsonwebtoken::{decode, DecodingKey, Validation};

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| format!("Invalid token: {}", e))
}

/// Create unauthorized response
fn unauthorized_response(message: &str) -> Response {
    let error = ErrorResponse {
        error: crate::error::ErrorDetail {
            code: "UNAUTHORIZED".to_string(),
            message: message.to_string(),
            line: None,
        },
    };

    (StatusCode::UNAUTHORIZED, Json(error)).into_response()
}

/// Extractor for the authenticated actor.
/// Use this in handlers to get the current actor.
#[derive(Clone, Debug)]
pub struct CurrentUser(pub Actor);

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .map(|AuthUser(actor)| CurrentUser(actor))
            .ok_or_else(|| {
                let error = ErrorResponse {
                    error: crate::error::ErrorDetail {
                        code: "UNAUTHORIZED".to_string(),
                        message: "Authentication required".to_string(),
                        line: None,
                    },
                };
                (StatusCode::UNAUTHORIZED, Json(error))
            })
    }
}
