use crate::domain::grid::model::{CellValue, ColumnDef};
use crate::domain::grid::service::table_engine::TableEngine;
use crate::domain::log::model::log_record::LogRecord;

const PREVIEW_CHARS: usize = 80;

/// Columns of the log viewer grid.
///
/// Only the app, function and status columns take part in the global filter;
/// the payload columns carry large blobs and are display-only.
pub fn log_columns() -> Vec<ColumnDef<LogRecord>> {
    vec![
        ColumnDef::new("timestamp", "Time", |r: &LogRecord| match r.timestamp_utc() {
            Some(ts) => CellValue::Timestamp(ts),
            None => CellValue::Text(r.timestamp.clone()),
        }),
        ColumnDef::new("app_name", "App", |r: &LogRecord| CellValue::from(r.app_name())).searchable(),
        ColumnDef::new("function_name", "Function", |r: &LogRecord| {
            CellValue::from(r.function_name())
        })
        .searchable(),
        ColumnDef::new("status", "Status", |r: &LogRecord| CellValue::from(r.status_label())).searchable(),
        ColumnDef::new("duration", "Duration", |r: &LogRecord| {
            CellValue::from(
                r.function_execution
                    .as_ref()
                    .and_then(|e| e.function_execution_duration),
            )
        }),
        ColumnDef::new("input", "Input", |r: &LogRecord| {
            CellValue::from(
                r.function_execution
                    .as_ref()
                    .map(|e| e.input().preview(PREVIEW_CHARS)),
            )
        })
        .unsortable(),
        ColumnDef::new("output", "Output", |r: &LogRecord| {
            CellValue::from(
                r.function_execution
                    .as_ref()
                    .map(|e| e.output().preview(PREVIEW_CHARS)),
            )
        })
        .unsortable(),
    ]
}

/// Grid over log records keyed by [`LogRecord::row_id`].
pub fn log_table() -> TableEngine<LogRecord> {
    TableEngine::new(log_columns(), LogRecord::row_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::grid::model::SortDirection;
    use serde_json::json;

    fn record(id: &str, ts: &str, app: &str, function: &str, success: bool, input: &str) -> LogRecord {
        serde_json::from_value(json!({
            "@timestamp": ts,
            "request_id": id,
            "function_execution": {
                "app_name": app,
                "function_name": function,
                "function_execution_duration": 0.5,
                "success": success,
                "function_input": input
            }
        }))
        .unwrap()
    }

    fn rows() -> Vec<LogRecord> {
        vec![
            record("r1", "2025-06-15T10:00:02Z", "GMAIL", "GMAIL__SEND_EMAIL", true, "{\"q\":\"slack\"}"),
            record("r2", "2025-06-15T10:00:01Z", "SLACK", "SLACK__POST", false, "{}"),
            record("r3", "2025-06-15T10:00:03Z", "GITHUB", "GITHUB__STAR", true, "{}"),
        ]
    }

    #[test]
    fn payload_text_is_not_searched() {
        let mut grid = log_table();
        grid.set_rows(rows()).unwrap();

        grid.set_global_filter("slack");
        let ids: Vec<String> = grid.visible_rows().iter().map(|r| r.row_id()).collect();
        assert_eq!(ids, vec!["r2".to_string()]);

        grid.set_global_filter("FAILED");
        assert_eq!(grid.visible_rows().len(), 1);
    }

    #[test]
    fn sorts_by_parsed_timestamp() {
        let mut grid = log_table();
        grid.set_rows(rows()).unwrap();
        grid.set_sort("timestamp", SortDirection::Desc).unwrap();

        let ids: Vec<String> = grid.visible_row_ids();
        assert_eq!(ids, vec!["r3", "r1", "r2"]);
    }

    #[test]
    fn payload_columns_are_display_only() {
        let columns = log_columns();
        let input = columns.iter().find(|c| c.id() == "input").unwrap();
        assert!(!input.is_searchable());
        assert!(!input.is_sortable());

        let searchable: Vec<&str> = columns
            .iter()
            .filter(|c| c.is_searchable())
            .map(|c| c.id())
            .collect();
        assert_eq!(searchable, vec!["app_name", "function_name", "status"]);
    }
}
