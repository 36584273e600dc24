//! Developer tooling: read-only inspectors over the scene and the action
//! history, for debugging and CLI output.

pub mod inspector;

pub use inspector::{HistoryInspector, HistorySummary, SceneInspector, SceneSummary, SubjectInfo};

pub fn crate_info() -> &'static str {
    concat!("terrascape-tools v", env!("CARGO_PKG_VERSION"))
}
