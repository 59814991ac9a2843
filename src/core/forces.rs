//! Force kernels. Each reads a pre-tick position snapshot and accumulates
//! into a per-node force buffer; none of them moves a node.

use rand::rngs::StdRng;
use rand::Rng;

use super::layout::Position;

/// A resolved edge with its effective stiffness.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spring {
    pub source: usize,
    pub target: usize,
    pub strength: f64,
}

/// Tiny random offset used to split exactly coincident nodes.
fn jiggle(rng: &mut StdRng) -> f64 {
    (rng.gen::<f64>() - 0.5) * 1e-6
}

/// Vector from `from` to `to` and its length, nudged apart by a jiggle when
/// the two points coincide. Returns `None` if they still coincide.
fn separation(from: Position, to: Position, rng: &mut StdRng) -> Option<(f64, f64, f64)> {
    let mut dx = to.x - from.x;
    let mut dy = to.y - from.y;
    if dx == 0.0 && dy == 0.0 {
        dx = jiggle(rng);
        dy = jiggle(rng);
    }
    let len = (dx * dx + dy * dy).sqrt();
    if len == 0.0 {
        None
    } else {
        Some((dx, dy, len))
    }
}

/// Hooke springs along edges, pulling endpoints toward `distance` apart.
pub fn apply_links(
    positions: &[Position],
    springs: &[Spring],
    distance: f64,
    min_distance: f64,
    alpha: f64,
    forces: &mut [Position],
    rng: &mut StdRng,
) {
    for spring in springs {
        if spring.source == spring.target {
            continue;
        }
        let Some((dx, dy, len)) =
            separation(positions[spring.source], positions[spring.target], rng)
        else {
            continue;
        };

        let magnitude = spring.strength * (len.max(min_distance) - distance) * alpha;
        let fx = magnitude * dx / len;
        let fy = magnitude * dy / len;

        let f1 = &mut forces[spring.source];
        f1.x += fx;
        f1.y += fy;

        let f2 = &mut forces[spring.target];
        f2.x -= fx;
        f2.y -= fy;
    }
}

/// O(n^2) many-body force with magnitude `strength / distance`. Negative
/// strength repels.
pub fn apply_repulsion(
    positions: &[Position],
    strength: f64,
    min_distance: f64,
    alpha: f64,
    forces: &mut [Position],
    rng: &mut StdRng,
) {
    for i in 0..positions.len() {
        for j in (i + 1)..positions.len() {
            let Some((dx, dy, len)) = separation(positions[j], positions[i], rng) else {
                continue;
            };

            let magnitude = -strength * alpha / len.max(min_distance);
            let fx = magnitude * dx / len;
            let fy = magnitude * dy / len;

            let fi = &mut forces[i];
            fi.x += fx;
            fi.y += fy;

            let fj = &mut forces[j];
            fj.x -= fx;
            fj.y -= fy;
        }
    }
}

/// Translation that moves the centroid `strength` of the way to `center`.
pub fn centering_shift(positions: &[Position], center: Position, strength: f64) -> Position {
    if positions.is_empty() {
        return Position::default();
    }
    // Divide before summing so huge coordinates cannot overflow the total.
    let n = positions.len() as f64;
    let (mx, my) = positions
        .iter()
        .fold((0.0, 0.0), |(mx, my), p| (mx + p.x / n, my + p.y / n));
    Position::new((center.x - mx) * strength, (center.y - my) * strength)
}
