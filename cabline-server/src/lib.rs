mod admin;
mod auth;
mod bookings;
mod config;
mod context;
mod docs;
mod errors;
mod gate;
mod pages;
mod reviews;
mod schemas;
mod serialized;
mod sitemap;
mod statics;
mod vendor;

use std::{
    io,
    net::{Ipv6Addr, SocketAddr},
    time::Instant,
};

use axum::{
    extract::Request,
    middleware::{self, Next},
    response::Response,
    routing::get,
};
use log::{info, warn};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

pub use auth::SESSION_COOKIE;
pub use config::*;
pub use context::ServerContext;
pub use errors::*;

pub type Router = axum::Router<ServerContext>;

/// Builds the whole application, ready to be served
pub fn app(context: ServerContext) -> axum::Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_router = Router::new()
        .merge(auth::router())
        .merge(bookings::router())
        .merge(reviews::router())
        .merge(pages::router())
        .nest("/admin", admin::router())
        .nest("/vendor", vendor::router());

    Router::new()
        .nest("/api", api_router)
        .route("/sitemap.xml", get(sitemap::sitemap))
        .route("/api.json", get(docs::docs))
        .fallback(statics::serve)
        .layer(middleware::from_fn_with_state(context.clone(), gate::gate))
        .layer(middleware::from_fn(log_request))
        .layer(cors)
        .with_state(context)
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    let response = next.run(request).await;
    let status = response.status();
    let elapsed = start.elapsed().as_millis();

    if status.is_server_error() {
        warn!("{} {} {} {}ms", method, path, status.as_u16(), elapsed);
    } else {
        info!("{} {} {} {}ms", method, path, status.as_u16(), elapsed);
    }

    response
}

/// Starts the cabline server
pub async fn run_server(context: ServerContext) -> io::Result<()> {
    let addr: SocketAddr = (Ipv6Addr::UNSPECIFIED, context.config.port).into();
    let listener = TcpListener::bind(&addr).await?;

    info!("Listening on {}", addr);
    axum::serve(listener, app(context)).await
}
