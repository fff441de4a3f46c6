use glam::Vec3;
use persrun_common::{ActorId, TemplateId, Transform};

/// Errors reported by an actor host.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
    #[error("no blueprint registered for {0}")]
    UnknownTemplate(TemplateId),
    #[error("{0} not found")]
    ActorNotFound(ActorId),
}

/// The visual/physical actor system the pooling core consumes.
///
/// Pools and streamers never own actors directly; they hold [`ActorId`]s and
/// ask the host to create, move, toggle, reparent and destroy them. Transforms
/// are world-space; the parent link only expresses ownership (a pooled actor
/// lives under its pool's holding container).
pub trait ActorHost {
    /// Create a new, active, unparented actor from a template.
    fn instantiate(
        &mut self,
        template: TemplateId,
        transform: Transform,
    ) -> Result<ActorId, HostError>;

    /// Create an empty, inactive container actor used as a holding area.
    fn create_container(&mut self, name: &str) -> ActorId;

    fn exists(&self, id: ActorId) -> bool;

    /// `None` if the actor does not exist.
    fn is_active(&self, id: ActorId) -> Option<bool>;

    fn set_active(&mut self, id: ActorId, active: bool) -> Result<(), HostError>;

    fn transform(&self, id: ActorId) -> Option<Transform>;

    fn set_transform(&mut self, id: ActorId, transform: Transform) -> Result<(), HostError>;

    /// Move the actor under `parent`, or detach it with `None`.
    fn reparent(&mut self, id: ActorId, parent: Option<ActorId>) -> Result<(), HostError>;

    fn parent(&self, id: ActorId) -> Option<ActorId>;

    /// Resolve a named child marker of an actor to a world-space position.
    fn marker(&self, id: ActorId, name: &str) -> Option<Vec3>;

    /// Remove the actor for good.
    fn destroy(&mut self, id: ActorId) -> Result<(), HostError>;
}
