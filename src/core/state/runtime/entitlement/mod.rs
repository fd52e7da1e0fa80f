pub mod entitlement_runtime_state;
pub mod entitlement_runtime_state_manager;
pub mod entitlement_runtime_state_repository;
pub mod entitlement_runtime_state_repository_trait;
