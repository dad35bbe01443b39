use std::convert::Infallible;

use axum::{
    async_trait,
    extract::{FromRequestParts, State},
    http::{header, request::Parts, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json,
};
use cabline_core::{Credentials, Identity, NewPlainCustomer, PrimaryKey, Role};

use crate::{
    context::ServerContext,
    errors::{ServerError, ServerResult},
    schemas::{LoginSchema, RegisterSchema, ValidatedPayload},
    serialized::{message, LoginResult, Message},
    Router,
};

/// Name of the cookie carrying the session token
pub const SESSION_COOKIE: &str = "sessionId";

/// Returns the session token from the Cookie header(s), if any.
/// Malformed pairs are skipped, and the last `sessionId` wins.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|x| x.to_str().ok())
        .flat_map(|x| x.split(';'))
        .filter_map(|pair| {
            let (name, value) = pair.split_once('=')?;
            Some((name.trim(), value.trim()))
        })
        .filter(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .last()
        .map(|(_, value)| value.to_string())
}

fn session_cookie(token: &str) -> String {
    format!("{}={}; HttpOnly; Path=/", SESSION_COOKIE, token)
}

fn cleared_session_cookie() -> String {
    format!(
        "{}=; HttpOnly; Path=/; Max-Age=0; Expires=Thu, 01 Jan 1970 00:00:00 GMT",
        SESSION_COOKIE
    )
}

/// Whoever made the request, logged in or not.
/// The identity is resolved once per request by the gate.
#[derive(Debug, Clone, Copy)]
pub struct Visitor(pub Option<Identity>);

#[async_trait]
impl<S> FromRequestParts<S> for Visitor
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(parts.extensions.get::<Identity>().copied()))
    }
}

/// A request made with a valid session
#[derive(Debug, Clone, Copy)]
pub struct Session(pub Identity);

impl Session {
    /// Returns the user id of the session if it belongs to `role`
    pub fn user_id_for(&self, role: Role) -> ServerResult<PrimaryKey> {
        if self.0.role == role {
            Ok(self.0.user_id)
        } else {
            Err(ServerError::Unauthorized)
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .copied()
            .map(Self)
            .ok_or(ServerError::Unauthorized)
    }
}

async fn login_as(role: Role, context: ServerContext, body: LoginSchema) -> ServerResult<Response> {
    let identifier = body
        .identifier(role)
        .ok_or(ServerError::InvalidCredentials)?
        .to_string();

    let session = context
        .site
        .auth
        .login(
            role,
            Credentials {
                identifier,
                password: body.password,
            },
        )
        .await?;

    let result = LoginResult {
        success: true,
        redirect_url: role.landing_page().to_string(),
    };

    Ok((
        [(header::SET_COOKIE, session_cookie(&session.token))],
        Json(result),
    )
        .into_response())
}

#[utoipa::path(
    post,
    path = "/api/login",
    tag = "auth",
    request_body = LoginSchema,
    responses(
        (status = 200, body = LoginResult, description = "Logged in, session cookie is set"),
        (status = 401, description = "Invalid credentials")
    )
)]
async fn customer_login(
    State(context): State<ServerContext>,
    ValidatedPayload(body): ValidatedPayload<LoginSchema>,
) -> ServerResult<Response> {
    login_as(Role::Customer, context, body).await
}

#[utoipa::path(
    post,
    path = "/api/vendor/login",
    tag = "auth",
    request_body = LoginSchema,
    responses(
        (status = 200, body = LoginResult, description = "Logged in, session cookie is set"),
        (status = 401, description = "Invalid credentials")
    )
)]
async fn vendor_login(
    State(context): State<ServerContext>,
    ValidatedPayload(body): ValidatedPayload<LoginSchema>,
) -> ServerResult<Response> {
    login_as(Role::Vendor, context, body).await
}

#[utoipa::path(
    post,
    path = "/api/admin/login",
    tag = "auth",
    request_body = LoginSchema,
    responses(
        (status = 200, body = LoginResult, description = "Logged in, session cookie is set"),
        (status = 401, description = "Invalid credentials")
    )
)]
async fn admin_login(
    State(context): State<ServerContext>,
    ValidatedPayload(body): ValidatedPayload<LoginSchema>,
) -> ServerResult<Response> {
    login_as(Role::Admin, context, body).await
}

#[utoipa::path(
    post,
    path = "/api/register",
    tag = "auth",
    request_body = RegisterSchema,
    responses(
        (status = 201, body = Message),
        (status = 409, description = "Email already exists")
    )
)]
async fn register(
    State(context): State<ServerContext>,
    ValidatedPayload(body): ValidatedPayload<RegisterSchema>,
) -> ServerResult<(StatusCode, Json<Message>)> {
    context
        .site
        .auth
        .register_customer(NewPlainCustomer {
            name: body.name,
            email: body.email,
            password: body.password,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        message("Registration successful! Please login."),
    ))
}

#[utoipa::path(
    post,
    path = "/api/logout",
    tag = "auth",
    responses(
        (status = 302, description = "Session is removed and the cookie cleared")
    )
)]
async fn logout(State(context): State<ServerContext>, headers: HeaderMap) -> ServerResult<Response> {
    if let Some(token) = session_token(&headers) {
        context.site.auth.logout(&token).await?;
    }

    Ok((
        StatusCode::FOUND,
        [
            (header::LOCATION, "/".to_string()),
            (header::SET_COOKIE, cleared_session_cookie()),
        ],
    )
        .into_response())
}

pub fn router() -> Router {
    Router::new()
        .route("/login", post(customer_login))
        .route("/vendor/login", post(vendor_login))
        .route("/admin/login", post(admin_login))
        .route("/register", post(register))
        .route("/logout", post(logout))
}

#[cfg(test)]
mod test {
    use axum::http::HeaderValue;

    use super::*;

    fn headers(cookies: &[&'static str]) -> HeaderMap {
        let mut headers = HeaderMap::new();

        for cookie in cookies {
            headers.append(header::COOKIE, HeaderValue::from_static(cookie));
        }

        headers
    }

    #[test]
    fn test_session_token() {
        assert_eq!(session_token(&headers(&[])), None);
        assert_eq!(
            session_token(&headers(&["theme=dark; sessionId=abc123"])),
            Some("abc123".to_string())
        );
        assert_eq!(
            session_token(&headers(&["theme", "sessionId=; other=1"])),
            None,
            "malformed pairs and empty values should be ignored"
        );
        assert_eq!(
            session_token(&headers(&["sessionId=first", "sessionId=second"])),
            Some("second".to_string())
        );
    }

    #[test]
    fn test_cookies() {
        assert_eq!(session_cookie("abc"), "sessionId=abc; HttpOnly; Path=/");
        assert!(cleared_session_cookie().starts_with("sessionId=; HttpOnly; Path=/; Max-Age=0"));
    }
}
