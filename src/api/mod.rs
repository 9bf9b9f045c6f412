pub mod middleware;
pub mod models;
pub mod routes;
pub mod routes_oauth;
