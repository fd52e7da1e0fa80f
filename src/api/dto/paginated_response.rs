use serde::Serialize;

use crate::domain::log::service::cursor_paginator::PageSummary;

#[derive(Serialize)]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: PageSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clamp_notice: Option<String>,
}
