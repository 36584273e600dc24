use terrascape_history::ActionHistory;
use terrascape_scene::Scene;
use tracing::debug;

/// History inspector for developer tooling.
///
/// Provides read-only queries against the action history for debugging and
/// CLI output.
pub struct HistoryInspector;

impl HistoryInspector {
    /// Produce a summary of the history state.
    pub fn summary(history: &ActionHistory) -> HistorySummary {
        let snapshot_bytes = history
            .registry()
            .iter()
            .map(|(_, record)| record.log_len())
            .sum();
        HistorySummary {
            events: history.events().len(),
            undo_steps: history.undo_steps(),
            redo_steps: history.redo_steps(),
            recording: history.has_pending(),
            tracked_subjects: history.registry().len(),
            snapshot_bytes,
        }
    }

    /// One line per committed event, oldest first. The current event is
    /// marked with `*`.
    pub fn describe_events(history: &ActionHistory) -> Vec<String> {
        debug!(events = history.events().len(), "describing timeline");
        history
            .events()
            .iter()
            .enumerate()
            .map(|(index, event)| {
                let marker = if history.cursor() == Some(index) { "*" } else { " " };
                let kinds: Vec<String> = event
                    .states
                    .iter()
                    .map(|state| format!("{:?}", state.kind).to_lowercase())
                    .collect();
                format!(
                    "{marker}[{index}] context={} states={} ({})",
                    event.context_id,
                    event.states.len(),
                    kinds.join(", ")
                )
            })
            .collect()
    }
}

/// Summary of history state for the inspector.
#[derive(Debug, Clone)]
pub struct HistorySummary {
    pub events: usize,
    pub undo_steps: usize,
    pub redo_steps: usize,
    pub recording: bool,
    pub tracked_subjects: usize,
    pub snapshot_bytes: usize,
}

impl std::fmt::Display for HistorySummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "History: events={} undo={} redo={} recording={} tracked={} snapshot_bytes={}",
            self.events,
            self.undo_steps,
            self.redo_steps,
            self.recording,
            self.tracked_subjects,
            self.snapshot_bytes
        )
    }
}

/// Scene inspector for developer tooling.
pub struct SceneInspector;

impl SceneInspector {
    /// Produce a summary of the scene: live subject count and a per-kind
    /// breakdown.
    pub fn summary(scene: &Scene) -> SceneSummary {
        let mut kinds = std::collections::BTreeMap::new();
        for (_, subject) in scene.iter() {
            *kinds.entry(subject.kind_name()).or_insert(0usize) += 1;
        }
        SceneSummary {
            subjects: scene.len(),
            kinds,
        }
    }

    /// List all live subjects.
    pub fn list_subjects(scene: &Scene) -> Vec<SubjectInfo> {
        scene
            .iter()
            .map(|(_, subject)| SubjectInfo {
                id: subject.id().to_string(),
                kind: subject.kind_name(),
            })
            .collect()
    }
}

/// Summary of scene state for the inspector.
#[derive(Debug, Clone)]
pub struct SceneSummary {
    pub subjects: usize,
    pub kinds: std::collections::BTreeMap<&'static str, usize>,
}

impl std::fmt::Display for SceneSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Scene: subjects={}", self.subjects)?;
        for (kind, count) in &self.kinds {
            write!(f, " {kind}={count}")?;
        }
        Ok(())
    }
}

/// Identity of a single live subject.
#[derive(Debug, Clone)]
pub struct SubjectInfo {
    pub id: String,
    pub kind: &'static str,
}

impl std::fmt::Display for SubjectInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Subject [{:.8}] kind={}", self.id, self.kind)
    }
}
