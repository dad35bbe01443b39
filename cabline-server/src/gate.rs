use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use cabline_core::{Identity, Role};
use log::info;

use crate::{auth::session_token, context::ServerContext, errors::ServerError};

/// Login surfaces that live under a protected prefix but must stay reachable
const LOGIN_PATHS: [&str; 4] = [
    "/admin/login.html",
    "/vendor/login.html",
    "/api/admin/login",
    "/api/vendor/login",
];

const PROTECTED_PREFIXES: [(&str, Role); 6] = [
    ("/admin", Role::Admin),
    ("/api/admin", Role::Admin),
    ("/vendor", Role::Vendor),
    ("/api/vendor", Role::Vendor),
    ("/profile", Role::Customer),
    ("/api/my-bookings", Role::Customer),
];

/// Returns the role required to access `path`, if any
pub fn required_role(path: &str) -> Option<Role> {
    let path = normalize(path);

    if LOGIN_PATHS.contains(&path.as_str()) {
        return None;
    }

    PROTECTED_PREFIXES
        .iter()
        .find(|(prefix, _)| has_prefix(&path, prefix))
        .map(|(_, role)| *role)
}

/// Collapses repeated slashes and drops `.` segments, so `//admin/./x` is
/// classified as `/admin/x`
fn normalize(path: &str) -> String {
    let segments: Vec<_> = path
        .split('/')
        .filter(|s| !s.is_empty() && *s != ".")
        .collect();

    format!("/{}", segments.join("/"))
}

/// `/admin` matches `/admin`, `/admin/x` and `/admin.html`, but not `/admins`
fn has_prefix(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/') || rest.starts_with('.'),
        None => false,
    }
}

fn is_api(path: &str) -> bool {
    has_prefix(&normalize(path), "/api")
}

/// Resolves the session of every request and refuses protected paths
/// to anyone without the right role.
///
/// The resolved [Identity] is stored in the request extensions.
pub async fn gate(
    State(context): State<ServerContext>,
    mut request: Request,
    next: Next,
) -> Response {
    let identity = match session_token(request.headers()) {
        Some(token) => match context.site.auth.identify(&token).await {
            Ok(identity) => identity,
            Err(e) => return ServerError::from(e).into_response(),
        },
        None => None,
    };

    let path = request.uri().path().to_string();

    if let Some(role) = required_role(&path) {
        let allowed = identity.map(|x| x.role == role).unwrap_or(false);

        if !allowed {
            info!("Denied {} to {}", path, describe(identity));
            return deny(&path, role);
        }
    }

    if let Some(identity) = identity {
        request.extensions_mut().insert(identity);
    }

    next.run(request).await
}

fn deny(path: &str, role: Role) -> Response {
    if is_api(path) {
        ServerError::Unauthorized.into_response()
    } else {
        (StatusCode::FOUND, [(header::LOCATION, role.login_page())]).into_response()
    }
}

fn describe(identity: Option<Identity>) -> String {
    match identity {
        Some(identity) => format!("{} {}", identity.role, identity.user_id),
        None => "anonymous visitor".to_string(),
    }
}
