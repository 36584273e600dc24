use terrascape_common::SubjectId;
use tracing::trace;

use crate::subject::Subject;

/// Handle to a live subject: slot index plus generation.
///
/// The generation is bumped every time a slot is freed, so a handle kept
/// across a deletion resolves to `None` instead of a recycled subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubjectHandle {
    index: u32,
    generation: u32,
}

struct Slot {
    generation: u32,
    subject: Option<Box<dyn Subject>>,
}

/// Generational arena owning all live subjects.
///
/// The scene is the single owner of subject memory. Everything else refers
/// to subjects through [`SubjectHandle`]s and resolves them on use.
#[derive(Default)]
pub struct Scene {
    slots: Vec<Slot>,
    free: Vec<u32>,
    len: usize,
}

impl Scene {
    /// Create an empty scene.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live subjects.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the scene holds no subjects.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Insert a subject, returning its handle.
    pub fn insert(&mut self, subject: Box<dyn Subject>) -> SubjectHandle {
        self.len += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.subject = Some(subject);
            SubjectHandle {
                index,
                generation: slot.generation,
            }
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                subject: Some(subject),
            });
            SubjectHandle {
                index,
                generation: 0,
            }
        }
    }

    /// Remove a subject. Calls its detach hook, frees the slot and bumps the
    /// slot generation so the handle (and any copies of it) go stale.
    ///
    /// Returns the subject, or `None` for a stale handle.
    pub fn remove(&mut self, handle: SubjectHandle) -> Option<Box<dyn Subject>> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation || slot.subject.is_none() {
            return None;
        }
        let mut subject = slot.subject.take()?;
        subject.remove_from_scene();
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index);
        self.len -= 1;
        trace!(id = %subject.id(), kind = subject.kind_name(), "subject removed from scene");
        Some(subject)
    }

    /// Resolve a handle to a live subject.
    pub fn get(&self, handle: SubjectHandle) -> Option<&dyn Subject> {
        let slot = self.slots.get(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.subject.as_deref()
    }

    /// Resolve a handle to a live subject, mutably.
    pub fn get_mut(&mut self, handle: SubjectHandle) -> Option<&mut (dyn Subject + 'static)> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.subject.as_deref_mut()
    }

    /// Whether the handle resolves to a live subject.
    pub fn contains(&self, handle: SubjectHandle) -> bool {
        self.get(handle).is_some()
    }

    /// Iterate over all live subjects with their handles.
    pub fn iter(&self) -> impl Iterator<Item = (SubjectHandle, &dyn Subject)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.subject.as_deref().map(|s| {
                (
                    SubjectHandle {
                        index: index as u32,
                        generation: slot.generation,
                    },
                    s,
                )
            })
        })
    }

    /// Find a live subject by its stable id. Linear scan; intended for
    /// tooling and tests, not hot paths.
    pub fn find(&self, id: SubjectId) -> Option<SubjectHandle> {
        self.iter()
            .find(|(_, subject)| subject.id() == id)
            .map(|(handle, _)| handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subjects::PlacedModel;
    use terrascape_common::Transform;

    fn model(asset: &str) -> Box<dyn Subject> {
        Box::new(PlacedModel::new(asset, Transform::default()))
    }

    #[test]
    fn insert_and_get() {
        let mut scene = Scene::new();
        let h = scene.insert(model("rock.mdl"));
        assert_eq!(scene.len(), 1);
        assert!(scene.contains(h));
        assert_eq!(scene.get(h).unwrap().kind_name(), "placed-model");
    }

    #[test]
    fn remove_frees_slot_and_stales_handle() {
        let mut scene = Scene::new();
        let h = scene.insert(model("rock.mdl"));
        let removed = scene.remove(h);
        assert!(removed.is_some());
        assert!(scene.is_empty());
        assert!(!scene.contains(h));
        assert!(scene.get(h).is_none());
        assert!(scene.remove(h).is_none());
    }

    #[test]
    fn recycled_slot_does_not_resurrect_old_handle() {
        let mut scene = Scene::new();
        let old = scene.insert(model("a.mdl"));
        scene.remove(old);

        // The new subject reuses the slot but with a bumped generation.
        let new = scene.insert(model("b.mdl"));
        assert_ne!(old, new);
        assert!(scene.get(old).is_none());
        assert!(scene.contains(new));
    }

    #[test]
    fn find_by_id() {
        let mut scene = Scene::new();
        let subject = PlacedModel::new("tree.mdl", Transform::default());
        let id = Subject::id(&subject);
        let h = scene.insert(Box::new(subject));
        assert_eq!(scene.find(id), Some(h));
        scene.remove(h);
        assert_eq!(scene.find(id), None);
    }

    #[test]
    fn iter_visits_only_live_subjects() {
        let mut scene = Scene::new();
        let a = scene.insert(model("a.mdl"));
        let _b = scene.insert(model("b.mdl"));
        scene.remove(a);
        assert_eq!(scene.iter().count(), 1);
    }
}
