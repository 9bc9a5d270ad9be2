//! Dissolve particles spawned when the canvas is cleared.

use crate::hand::Point;

/// Life lost per tick; a particle lives for 50 ticks.
pub const LIFE_DECAY: f32 = 0.02;

/// Horizontal drift amplitude, in pixels per tick.
const FLUTTER_AMPLITUDE: f32 = 0.5;

/// Spatial frequency of the drift along the vertical axis.
const FLUTTER_FREQUENCY: f32 = 0.05;

/// One particle of a dissolving stroke.
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub position: Point,
    /// Pixels per tick.
    pub velocity: Point,
    /// RGBA.
    pub color: [f32; 4],
    pub size: f32,
    /// Remaining life in [0, 1].
    pub life: f32,
}

/// The live particle set.
#[derive(Debug, Clone, Default)]
pub struct ParticleSystem {
    particles: Vec<Particle>,
}

impl ParticleSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(&mut self, batch: impl IntoIterator<Item = Particle>) {
        self.particles.extend(batch);
    }

    /// Advance one tick: move, flutter, decay, and drop dead or fallen
    /// particles.  `floor` is the bottom edge of the visible area.
    pub fn step(&mut self, floor: f32) {
        for p in &mut self.particles {
            let drift = (p.position.y * FLUTTER_FREQUENCY).sin() * FLUTTER_AMPLITUDE;
            p.position.x += p.velocity.x + drift;
            p.position.y += p.velocity.y;
            p.life -= LIFE_DECAY;
        }
        self.particles.retain(|p| p.life > 0.0 && p.position.y <= floor);
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn particle(x: f32, y: f32, vy: f32) -> Particle {
        Particle {
            position: Point::new(x, y),
            velocity: Point::new(0.0, vy),
            color: [1.0, 1.0, 1.0, 1.0],
            size: 2.0,
            life: 1.0,
        }
    }

    #[test]
    fn test_step_moves_and_decays() {
        let mut sys = ParticleSystem::new();
        sys.spawn([particle(10.0, 0.0, 2.0)]);
        sys.step(720.0);
        let p = &sys.particles()[0];
        // y was 0 so the drift term is sin(0) = 0
        assert!((p.position.x - 10.0).abs() < 1e-6);
        assert!((p.position.y - 2.0).abs() < 1e-6);
        assert!((p.life - 0.98).abs() < 1e-6);
    }

    #[test]
    fn test_flutter_depends_on_height() {
        let mut sys = ParticleSystem::new();
        sys.spawn([particle(0.0, 10.0, 0.0)]);
        sys.step(720.0);
        let expected = (10.0f32 * FLUTTER_FREQUENCY).sin() * FLUTTER_AMPLITUDE;
        assert!((sys.particles()[0].position.x - expected).abs() < 1e-6);
    }

    #[test]
    fn test_particles_expire() {
        let mut sys = ParticleSystem::new();
        sys.spawn([particle(0.0, 0.0, 0.0)]);
        for _ in 0..49 {
            sys.step(720.0);
        }
        assert_eq!(sys.len(), 1);
        for _ in 0..2 {
            sys.step(720.0);
        }
        assert!(sys.is_empty());
    }

    #[test]
    fn test_particles_removed_below_floor() {
        let mut sys = ParticleSystem::new();
        sys.spawn([particle(0.0, 715.0, 10.0), particle(0.0, 100.0, 1.0)]);
        sys.step(720.0);
        assert_eq!(sys.len(), 1);
        assert!((sys.particles()[0].position.y - 101.0).abs() < 1e-6);
    }
}
