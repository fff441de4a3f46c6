use glam::Vec3;

/// The moving subject whose position drives streaming ahead and reclamation behind.
///
/// `position()` returns `None` when the subject is gone (destroyed mid-session);
/// callers treat that as "skip this tick".
pub trait Anchor {
    fn position(&self) -> Option<Vec3>;
}

/// An anchor that can be hit and brought back.
pub trait AnchorSubject: Anchor {
    /// Fatal impact, e.g. from a projectile.
    fn take_fatal_damage(&mut self);

    /// Bring the subject back at `position`.
    fn revive_at(&mut self, position: Vec3);
}

impl Anchor for Vec3 {
    fn position(&self) -> Option<Vec3> {
        Some(*self)
    }
}

impl Anchor for Option<Vec3> {
    fn position(&self) -> Option<Vec3> {
        *self
    }
}
