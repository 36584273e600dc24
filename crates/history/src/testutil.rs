//! Test doubles: a minimal serializable subject and a recording sink.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use terrascape_common::SubjectId;
use terrascape_scene::{
    decode_state, encode_state, SceneError, Subject, SubjectFactory, SubjectHandle,
};

use crate::notify::{HistoryEventKind, HistorySink};

/// A one-value subject. `fail_resurrect` makes its factory refuse to
/// reconstruct it, for exercising the resurrection failure path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prop {
    id: SubjectId,
    pub value: i32,
    fail_resurrect: bool,
}

impl Prop {
    pub fn new(value: i32) -> Self {
        Self {
            id: SubjectId::new(),
            value,
            fail_resurrect: false,
        }
    }

    pub fn with_failing_factory(value: i32) -> Self {
        Self {
            fail_resurrect: true,
            ..Self::new(value)
        }
    }
}

impl Subject for Prop {
    fn id(&self) -> SubjectId {
        self.id
    }

    fn kind_name(&self) -> &'static str {
        "prop"
    }

    fn save_state(&self, out: &mut Vec<u8>) -> Result<(), SceneError> {
        encode_state(self, out)
    }

    fn load_state(&mut self, bytes: &[u8]) -> Result<(), SceneError> {
        *self = decode_state(bytes)?;
        Ok(())
    }

    fn remove_from_scene(&mut self) {}

    fn factory(&self) -> Arc<dyn SubjectFactory> {
        Arc::new(PropFactory)
    }
}

pub struct PropFactory;

impl SubjectFactory for PropFactory {
    fn resurrect(&self, bytes: &[u8]) -> Result<Box<dyn Subject>, SceneError> {
        let prop: Prop = decode_state(bytes)?;
        if prop.fail_resurrect {
            return Err(SceneError::Decode("synthetic resurrection failure".into()));
        }
        Ok(Box::new(prop))
    }
}

/// Sink that records every notification it receives.
#[derive(Clone, Default)]
pub struct RecordingSink {
    pub events: Rc<RefCell<Vec<(Option<SubjectHandle>, HistoryEventKind)>>>,
}

impl HistorySink for RecordingSink {
    fn on_history_event(&mut self, subject: Option<SubjectHandle>, kind: HistoryEventKind) {
        self.events.borrow_mut().push((subject, kind));
    }
}

/// Change a live prop's value in place, preserving its identity.
pub fn set_prop_value(
    scene: &mut terrascape_scene::Scene,
    handle: SubjectHandle,
    value: i32,
) {
    let subject = scene.get_mut(handle).unwrap();
    let mut prop: Prop = decode_state(&snapshot_bytes(subject)).unwrap();
    prop.value = value;
    let mut bytes = Vec::new();
    encode_state(&prop, &mut bytes).unwrap();
    subject.load_state(&bytes).unwrap();
}

/// Read a live prop's value.
pub fn prop_value(scene: &terrascape_scene::Scene, handle: SubjectHandle) -> i32 {
    let subject = scene.get(handle).unwrap();
    let prop: Prop = decode_state(&snapshot_bytes(subject)).unwrap();
    prop.value
}

/// Serialize a subject's current state for byte-level comparisons.
pub fn snapshot_bytes(subject: &dyn Subject) -> Vec<u8> {
    let mut out = Vec::new();
    subject.save_state(&mut out).unwrap();
    out
}
