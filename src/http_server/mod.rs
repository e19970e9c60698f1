pub mod app;
pub mod docs;
pub mod error;
pub mod extract;
pub mod http_routes;
pub mod state;
