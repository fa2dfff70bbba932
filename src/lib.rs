pub mod client;
pub mod config;
pub mod history;
pub mod models;
pub mod responses;
pub mod routes;
pub mod state;

pub use state::AppState;
