pub mod find_config;
pub mod health_route;
