pub mod cursor_paginator;
pub mod query_orchestrator;
pub mod query_state;
