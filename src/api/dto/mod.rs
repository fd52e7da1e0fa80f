//! Wire DTOs for the log search and billing collaborators

pub mod log_search_request_dto;
pub mod log_search_response_dto;
pub mod paginated_response;
pub mod quota_usage_dto;
