use glam::Vec3;
use persrun_common::{Anchor, AnchorSubject};

/// Headless stand-in for the player character: runs along +X at constant speed.
#[derive(Debug, Clone)]
pub struct Runner {
    position: Vec3,
    speed: f32,
    alive: bool,
    present: bool,
    deaths: u32,
}

impl Runner {
    pub fn new(start: Vec3, speed: f32) -> Self {
        Self {
            position: start,
            speed,
            alive: true,
            present: true,
            deaths: 0,
        }
    }

    /// Move forward by `dt` seconds. Dead runners stay put.
    pub fn advance(&mut self, dt: f32) {
        if self.alive && self.present {
            self.position.x += self.speed * dt;
        }
    }

    /// Jump straight to `position` without dying.
    pub fn teleport(&mut self, position: Vec3) {
        self.position = position;
    }

    /// Remove the runner from the world; it reports no position until revived.
    pub fn remove(&mut self) {
        self.present = false;
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn deaths(&self) -> u32 {
        self.deaths
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }
}

impl Anchor for Runner {
    fn position(&self) -> Option<Vec3> {
        self.present.then_some(self.position)
    }
}

impl AnchorSubject for Runner {
    fn take_fatal_damage(&mut self) {
        if self.alive {
            self.alive = false;
            self.deaths += 1;
            tracing::info!(x = self.position.x, deaths = self.deaths, "runner died");
        }
    }

    fn revive_at(&mut self, position: Vec3) {
        self.position = position;
        self.alive = true;
        self.present = true;
        tracing::info!(x = position.x, "runner revived");
    }
}
