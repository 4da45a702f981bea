//! Shared trajectories and a deterministic noise source for integration tests

#![allow(dead_code)]

use trackfuse_core::Point2;

pub const DT: f64 = 0.1;
pub const SIGMA1: f64 = 2.0;
pub const SIGMA2: f64 = 1.0;

/// Xorshift generator so every run sees the same noise
pub struct TestRng {
    state: u32,
}

impl TestRng {
    pub fn new(seed: u32) -> Self {
        Self { state: seed.max(1) }
    }

    pub fn next_u32(&mut self) -> u32 {
        self.state ^= self.state << 13;
        self.state ^= self.state >> 17;
        self.state ^= self.state << 5;
        self.state
    }

    /// Uniform in (0, 1]
    pub fn next_f64(&mut self) -> f64 {
        (f64::from(self.next_u32() >> 8) + 1.0) / 16_777_216.0
    }

    /// Standard normal via Box-Muller
    pub fn gaussian(&mut self) -> f64 {
        let u1 = self.next_f64();
        let u2 = self.next_f64();
        (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
    }
}

/// Ground truth: position at step k, then `pos += v·dt`
pub fn trajectory(steps: usize, turn: usize, before: Point2, after: Point2) -> Vec<Point2> {
    let mut pos = [0.0, 0.0];
    let mut out = Vec::with_capacity(steps);
    for k in 0..steps {
        out.push(pos);
        let v = if k < turn { before } else { after };
        pos = [pos[0] + v[0] * DT, pos[1] + v[1] * DT];
    }
    out
}

/// "L": east then north at `speed`, turning half way
pub fn l_turn(steps: usize, speed: f64) -> Vec<Point2> {
    trajectory(steps, steps / 2, [speed, 0.0], [0.0, speed])
}

/// "I": one constant velocity throughout
pub fn straight(steps: usize, velocity: Point2) -> Vec<Point2> {
    trajectory(steps, steps, velocity, velocity)
}

/// Truth plus isotropic Gaussian noise
pub fn observe(truth: &[Point2], sigma: f64, rng: &mut TestRng) -> Vec<Point2> {
    truth
        .iter()
        .map(|p| [p[0] + sigma * rng.gaussian(), p[1] + sigma * rng.gaussian()])
        .collect()
}

pub fn distance(a: Point2, b: Point2) -> f64 {
    ((a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2)).sqrt()
}
