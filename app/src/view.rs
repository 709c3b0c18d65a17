//! Plain-text rendering of the page.

use std::fmt::Write;

use todo_core::{PageView, Severity};

pub fn render(view: &PageView) -> String {
    let mut out = String::new();
    match view {
        PageView::Failed { message } => {
            let _ = writeln!(out, "Error");
            let _ = writeln!(out, "{message}");
            let _ = writeln!(out, "Restart the session to retry.");
        }
        PageView::Ready {
            records,
            notification,
            loading,
            adding,
            fetching,
        } => {
            let _ = writeln!(out, "Todo App");
            if *loading {
                let _ = writeln!(out, "  loading...");
            } else if records.is_empty() {
                let _ = writeln!(out, "  No todos in this session");
                let _ = writeln!(out, "  Create a new todo or fetch one by ID");
            } else {
                let _ = writeln!(out, "Session Todos:");
                for item in records {
                    let _ = write!(out, "  TxHash: {}  Value: {}", item.record.key, item.record.value);
                    if let Some(draft) = item.draft {
                        let _ = write!(out, "  [editing: {draft}]");
                    }
                    if item.loading {
                        let _ = write!(out, "  [busy]");
                    }
                    let _ = writeln!(out);
                }
            }
            if *adding {
                let _ = writeln!(out, "  adding...");
            }
            if *fetching {
                let _ = writeln!(out, "  fetching...");
            }
            if let Some(notification) = notification {
                let tag = match notification.severity {
                    Severity::Success => "success",
                    Severity::Error => "error",
                    Severity::Info => "info",
                };
                let _ = writeln!(out, "[{tag}] {}", notification.message);
            }
        }
    }
    out
}
