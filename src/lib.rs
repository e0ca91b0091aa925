pub mod config;
pub mod constants;
pub mod extractors;
pub mod logging;
pub mod middleware;
pub mod quiz;
pub mod response;
pub mod routes;
pub mod state;
pub mod store;
