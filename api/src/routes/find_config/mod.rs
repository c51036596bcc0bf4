pub mod find_config_request;
pub mod find_config_response;
pub mod find_config_route;
