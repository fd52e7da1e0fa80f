// Collaborator seams
pub mod entitlement_source_trait;
pub mod log_search_transport_trait;

// HTTP implementations
pub mod http_client;
pub mod log_search_client;
pub mod quota_client;
