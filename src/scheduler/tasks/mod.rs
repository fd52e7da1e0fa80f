pub mod entitlement_refresh;
