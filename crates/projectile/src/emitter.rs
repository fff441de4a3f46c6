use glam::Vec3;
use persrun_common::TemplateId;

/// Fires a projectile template on a fixed interval from a point on its owner.
///
/// Holds fire (and its timer) while the anchor is closer than `min_distance`
/// to the owner on the x axis.
#[derive(Debug, Clone, PartialEq)]
pub struct Emitter {
    template: TemplateId,
    offset: Vec3,
    interval: f32,
    min_distance: f32,
    timer: f32,
}

impl Emitter {
    pub fn new(template: TemplateId, offset: Vec3, interval: f32, min_distance: f32) -> Self {
        Self {
            template,
            offset,
            interval,
            min_distance,
            timer: interval,
        }
    }

    pub fn template(&self) -> TemplateId {
        self.template
    }

    /// Restart the countdown, e.g. when the owner is placed again.
    pub fn reset(&mut self) {
        self.timer = self.interval;
    }

    /// Muzzle position for an owner at `origin`.
    pub fn muzzle(&self, origin: Vec3) -> Vec3 {
        origin + self.offset
    }

    /// Advance by `dt`. Returns the muzzle position when a shot is due.
    pub fn tick(&mut self, dt: f32, origin: Vec3, anchor: Option<Vec3>) -> Option<Vec3> {
        if let Some(a) = anchor {
            if (origin.x - a.x).abs() < self.min_distance {
                return None;
            }
        }
        self.timer -= dt;
        if self.timer > 0.0 {
            return None;
        }
        self.timer = self.interval;
        Some(self.muzzle(origin))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn emitter() -> Emitter {
        Emitter::new(TemplateId(1), Vec3::new(0.0, 2.0, 0.0), 2.0, 3.0)
    }

    #[test]
    fn fires_on_interval() {
        let mut e = emitter();
        let origin = Vec3::new(100.0, 0.0, 0.0);
        let far = Some(Vec3::ZERO);
        assert_eq!(e.tick(1.0, origin, far), None);
        assert_eq!(e.tick(1.0, origin, far), Some(Vec3::new(100.0, 2.0, 0.0)));
        assert_eq!(e.tick(1.0, origin, far), None);
        assert!(e.tick(1.0, origin, far).is_some());
    }

    #[test]
    fn holds_fire_near_anchor() {
        let mut e = emitter();
        let origin = Vec3::new(10.0, 0.0, 0.0);
        let near = Some(Vec3::new(11.0, 0.0, 0.0));
        for _ in 0..10 {
            assert_eq!(e.tick(1.0, origin, near), None);
        }
        // Timer did not run while holding.
        assert_eq!(e.tick(1.0, origin, None), None);
        assert!(e.tick(1.0, origin, None).is_some());
    }

    #[test]
    fn distance_is_measured_from_owner() {
        let mut e = Emitter::new(TemplateId(1), Vec3::new(10.0, 0.0, 0.0), 1.0, 3.0);
        let origin = Vec3::ZERO;
        // Close to the owner, far from the muzzle.
        assert_eq!(e.tick(1.0, origin, Some(Vec3::new(1.0, 0.0, 0.0))), None);
        // Close to the muzzle, far from the owner.
        let shot = e.tick(1.0, origin, Some(Vec3::new(10.0, 0.0, 0.0)));
        assert_eq!(shot, Some(Vec3::new(10.0, 0.0, 0.0)));
    }

    #[test]
    fn reset_restarts_countdown() {
        let mut e = emitter();
        e.tick(1.5, Vec3::ZERO, None);
        e.reset();
        assert_eq!(e.tick(1.5, Vec3::ZERO, None), None);
    }
}
