use glam::Vec3;
use persrun_common::{ActorId, TemplateId, Transform};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::host::{ActorHost, HostError};

/// An event record produced by every mutation to the world.
///
/// Tests and tooling read the log to count allocations and to check that
/// pooled actors are toggled rather than recreated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WorldEvent {
    /// Actor was created from a template.
    Instantiated {
        id: ActorId,
        template: TemplateId,
        transform: Transform,
    },
    /// A holding container was created.
    ContainerCreated { id: ActorId, name: String },
    Activated { id: ActorId },
    Deactivated { id: ActorId },
    /// Actor transform was updated.
    Moved {
        id: ActorId,
        old: Transform,
        new: Transform,
    },
    Reparented {
        id: ActorId,
        old: Option<ActorId>,
        new: Option<ActorId>,
    },
    /// Actor was destroyed. Carries its template for bookkeeping.
    Destroyed {
        id: ActorId,
        template: Option<TemplateId>,
    },
}

/// Static description of a template: its name and named child markers.
///
/// Marker positions are local offsets from the actor's origin.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Blueprint {
    pub name: String,
    pub markers: BTreeMap<String, Vec3>,
}

impl Blueprint {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            markers: BTreeMap::new(),
        }
    }

    /// Add a named marker at a local offset.
    pub fn with_marker(mut self, name: impl Into<String>, offset: Vec3) -> Self {
        self.markers.insert(name.into(), offset);
        self
    }
}

/// Per-actor data stored in the world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorData {
    /// `None` for containers.
    pub template: Option<TemplateId>,
    pub name: String,
    pub transform: Transform,
    pub active: bool,
    pub parent: Option<ActorId>,
}

/// In-memory actor host.
///
/// Uses BTreeMap for deterministic iteration order, and hands out actor ids
/// sequentially, so two worlds driven by the same operations end up with the
/// same [`state_hash`](World::state_hash).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct World {
    blueprints: BTreeMap<TemplateId, Blueprint>,
    actors: BTreeMap<ActorId, ActorData>,
    next_id: u64,
    /// Append-only event log of all mutations.
    #[serde(skip)]
    event_log: Vec<WorldEvent>,
}

impl World {
    /// Create an empty world with no blueprints.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the blueprint used when instantiating `template`.
    pub fn register_blueprint(&mut self, template: TemplateId, blueprint: Blueprint) {
        tracing::debug!(%template, name = %blueprint.name, "registered blueprint");
        self.blueprints.insert(template, blueprint);
    }

    pub fn blueprint(&self, template: TemplateId) -> Option<&Blueprint> {
        self.blueprints.get(&template)
    }

    /// Number of actors in the world, containers included.
    pub fn actor_count(&self) -> usize {
        self.actors.len()
    }

    /// Number of active actors instantiated from a template.
    pub fn active_count(&self) -> usize {
        self.actors
            .values()
            .filter(|a| a.active && a.template.is_some())
            .count()
    }

    /// Read-only access to all actors (BTreeMap for deterministic iteration).
    pub fn actors(&self) -> &BTreeMap<ActorId, ActorData> {
        &self.actors
    }

    pub fn get(&self, id: ActorId) -> Option<&ActorData> {
        self.actors.get(&id)
    }

    /// Actors currently parented under `parent`.
    pub fn children_of(&self, parent: ActorId) -> Vec<ActorId> {
        self.actors
            .iter()
            .filter(|(_, a)| a.parent == Some(parent))
            .map(|(id, _)| *id)
            .collect()
    }

    /// Drain and return the event log.
    pub fn drain_events(&mut self) -> Vec<WorldEvent> {
        std::mem::take(&mut self.event_log)
    }

    /// Read-only access to the event log.
    pub fn events(&self) -> &[WorldEvent] {
        &self.event_log
    }

    /// Number of `Instantiated` events still in the log.
    pub fn instantiation_count(&self) -> usize {
        self.event_log
            .iter()
            .filter(|e| matches!(e, WorldEvent::Instantiated { .. }))
            .count()
    }

    fn allocate_id(&mut self) -> ActorId {
        let id = ActorId(self.next_id);
        self.next_id += 1;
        id
    }

    fn actor_mut(&mut self, id: ActorId) -> Result<&mut ActorData, HostError> {
        self.actors.get_mut(&id).ok_or(HostError::ActorNotFound(id))
    }

    /// Compute a deterministic hash of the world state for comparison.
    /// Uses canonical (BTreeMap) iteration order.
    pub fn state_hash(&self) -> u64 {
        let mut h: u64 = 0xcbf2_9ce4_8422_2325; // FNV offset basis
        let mix = |h: &mut u64, bytes: &[u8]| {
            for &b in bytes {
                *h ^= b as u64;
                *h = h.wrapping_mul(0x0100_0000_01b3);
            }
        };
        mix(&mut h, &self.next_id.to_le_bytes());
        for (id, data) in &self.actors {
            mix(&mut h, &id.0.to_le_bytes());
            let template = data.template.map_or(u32::MAX, |t| t.0);
            mix(&mut h, &template.to_le_bytes());
            mix(&mut h, &[data.active as u8]);
            let parent = data.parent.map_or(u64::MAX, |p| p.0);
            mix(&mut h, &parent.to_le_bytes());
            let p = data.transform.position;
            let r = data.transform.rotation;
            for v in [p.x, p.y, p.z, r.x, r.y, r.z, r.w] {
                mix(&mut h, &v.to_le_bytes());
            }
        }
        h
    }
}

impl ActorHost for World {
    fn instantiate(
        &mut self,
        template: TemplateId,
        transform: Transform,
    ) -> Result<ActorId, HostError> {
        let name = self
            .blueprints
            .get(&template)
            .ok_or(HostError::UnknownTemplate(template))?
            .name
            .clone();
        let id = self.allocate_id();
        self.actors.insert(
            id,
            ActorData {
                template: Some(template),
                name,
                transform,
                active: true,
                parent: None,
            },
        );
        self.event_log.push(WorldEvent::Instantiated {
            id,
            template,
            transform,
        });
        Ok(id)
    }

    fn create_container(&mut self, name: &str) -> ActorId {
        let id = self.allocate_id();
        self.actors.insert(
            id,
            ActorData {
                template: None,
                name: name.to_owned(),
                transform: Transform::default(),
                active: false,
                parent: None,
            },
        );
        self.event_log.push(WorldEvent::ContainerCreated {
            id,
            name: name.to_owned(),
        });
        id
    }

    fn exists(&self, id: ActorId) -> bool {
        self.actors.contains_key(&id)
    }

    fn is_active(&self, id: ActorId) -> Option<bool> {
        self.actors.get(&id).map(|a| a.active)
    }

    fn set_active(&mut self, id: ActorId, active: bool) -> Result<(), HostError> {
        let data = self.actor_mut(id)?;
        if data.active == active {
            return Ok(());
        }
        data.active = active;
        self.event_log.push(if active {
            WorldEvent::Activated { id }
        } else {
            WorldEvent::Deactivated { id }
        });
        Ok(())
    }

    fn transform(&self, id: ActorId) -> Option<Transform> {
        self.actors.get(&id).map(|a| a.transform)
    }

    fn set_transform(&mut self, id: ActorId, new: Transform) -> Result<(), HostError> {
        let data = self.actor_mut(id)?;
        let old = data.transform;
        data.transform = new;
        self.event_log.push(WorldEvent::Moved { id, old, new });
        Ok(())
    }

    fn reparent(&mut self, id: ActorId, parent: Option<ActorId>) -> Result<(), HostError> {
        if let Some(p) = parent {
            if !self.actors.contains_key(&p) {
                return Err(HostError::ActorNotFound(p));
            }
        }
        let data = self.actor_mut(id)?;
        let old = data.parent;
        if old == parent {
            return Ok(());
        }
        data.parent = parent;
        self.event_log.push(WorldEvent::Reparented {
            id,
            old,
            new: parent,
        });
        Ok(())
    }

    fn parent(&self, id: ActorId) -> Option<ActorId> {
        self.actors.get(&id).and_then(|a| a.parent)
    }

    fn marker(&self, id: ActorId, name: &str) -> Option<Vec3> {
        let data = self.actors.get(&id)?;
        let offset = self.blueprints.get(&data.template?)?.markers.get(name)?;
        Some(data.transform.transform_point(*offset))
    }

    fn destroy(&mut self, id: ActorId) -> Result<(), HostError> {
        let data = self.actors.remove(&id).ok_or(HostError::ActorNotFound(id))?;
        // Orphan children rather than cascading.
        for child in self.children_of(id) {
            if let Some(c) = self.actors.get_mut(&child) {
                c.parent = None;
            }
        }
        self.event_log.push(WorldEvent::Destroyed {
            id,
            template: data.template,
        });
        Ok(())
    }
}
