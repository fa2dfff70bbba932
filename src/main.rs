mod client;
mod config;
mod history;
mod models;
mod responses;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, Method};
use axum::{
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use config::Config;
use reqwest::Client;
use responses::JsonResponse;
use routes::instances::{get_instance, get_instance_tree, list_instances};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use crate::client::http_repository::HttpInstanceRepository;
use crate::client::instance_repository::InstanceRepository;
use crate::state::AppState;

#[tokio::main]
async fn main() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber).unwrap();

    let config = Arc::new(Config::from_env());

    let http_client = Client::new();
    let instances = Arc::new(HttpInstanceRepository::new(
        http_client,
        config.engine_api_url.clone(),
    )) as Arc<dyn InstanceRepository>;

    let state = AppState::new(instances, config.clone());

    let cors = CorsLayer::new()
        .allow_origin(config.frontend_origin.parse::<HeaderValue>().unwrap())
        .allow_methods([Method::GET])
        .allow_headers([CONTENT_TYPE]);

    let instance_routes = Router::new()
        .route("/", get(list_instances))
        .route("/{instance_id}", get(get_instance))
        .route("/{instance_id}/tree", get(get_instance_tree));

    let app = Router::new()
        .route("/", get(root))
        .nest("/api/instances", instance_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let addr: SocketAddr = config
        .listen_addr
        .parse()
        .expect("LISTEN_ADDR must be a valid socket address");

    info!("Serving workflow diagnostics for {}", config.engine_api_url);

    let listener = TcpListener::bind(addr).await.unwrap();
    println!("Running at http://{}", addr);
    axum::serve(listener, app).await.unwrap();
}

/// A simple root route.
async fn root() -> Response {
    JsonResponse::success("Hello, Flowlens!").into_response()
}
