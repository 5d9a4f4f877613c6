use eframe::egui::{Vec2, vec2};

use super::quadtree::Quadtree;
use super::{SimLink, SimNode};

#[derive(Clone, Copy)]
pub(super) struct Charge {
    pub(super) strength: f32,
    pub(super) distance_min_sq: f32,
    pub(super) distance_max_sq: f32,
    pub(super) theta_sq: f32,
}

/// Deterministic nudge for coincident points so they separate the same way
/// on every run.
fn jiggle(first: usize, second: usize) -> Vec2 {
    let angle = ((first as f32) * 0.618_034 + (second as f32) * 0.414_214) * std::f32::consts::TAU;
    vec2(angle.cos(), angle.sin()) * 1e-3
}

fn pull(delta: Vec2, distance_sq: f32, weight: f32, charge: Charge) -> Vec2 {
    let distance_sq = if distance_sq < charge.distance_min_sq {
        (charge.distance_min_sq * distance_sq).sqrt()
    } else {
        distance_sq
    };
    delta * (charge.strength * weight / distance_sq)
}

pub(super) fn apply_charge(
    tree: &Quadtree,
    cell_id: usize,
    index: usize,
    positions: &[Vec2],
    charge: Charge,
    velocity: &mut Vec2,
) {
    let cell = tree.cell(cell_id);
    if cell.weight <= 0.0 {
        return;
    }

    let point = positions[index];

    if cell.is_leaf() {
        for &other in &cell.points {
            if other == index {
                continue;
            }
            let mut delta = positions[other] - point;
            let mut distance_sq = delta.length_sq();
            if distance_sq >= charge.distance_max_sq {
                continue;
            }
            if distance_sq == 0.0 {
                delta = jiggle(index, other);
                distance_sq = delta.length_sq();
            }
            *velocity += pull(delta, distance_sq, 1.0, charge);
        }
        return;
    }

    let delta = cell.centroid - point;
    let distance_sq = delta.length_sq();
    let width = cell.bounds.width();
    if width * width < charge.theta_sq * distance_sq {
        if distance_sq < charge.distance_max_sq {
            *velocity += pull(delta, distance_sq, cell.weight, charge);
        }
        return;
    }

    for child in cell.children.iter().flatten() {
        apply_charge(tree, *child, index, positions, charge, velocity);
    }
}

/// Spring toward `distance` along every link, split between both endpoints
/// by degree so hubs move less than leaves.
pub(super) fn apply_links(
    nodes: &mut [SimNode],
    links: &[SimLink],
    degrees: &[usize],
    distance: f32,
    alpha: f32,
) {
    for link in links {
        let (source, target) = (link.source, link.target);
        if source == target || source >= nodes.len() || target >= nodes.len() {
            continue;
        }

        let mut delta = (nodes[target].position + nodes[target].velocity)
            - (nodes[source].position + nodes[source].velocity);
        if delta.length_sq() == 0.0 {
            delta = jiggle(source, target);
        }

        let length = delta.length();
        let source_degree = degrees[source].max(1) as f32;
        let target_degree = degrees[target].max(1) as f32;
        let strength = 1.0 / source_degree.min(target_degree);
        let correction = delta * ((length - distance) / length * alpha * strength);
        let bias = source_degree / (source_degree + target_degree);

        nodes[target].velocity -= correction * bias;
        nodes[source].velocity += correction * (1.0 - bias);
    }
}

pub(super) fn apply_center(nodes: &mut [SimNode], center: Vec2) {
    if nodes.is_empty() {
        return;
    }

    let mean = nodes.iter().fold(Vec2::ZERO, |sum, node| sum + node.position) / nodes.len() as f32;
    let shift = center - mean;
    if shift.length_sq() <= f32::EPSILON {
        return;
    }
    for node in nodes {
        node.position += shift;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn charge() -> Charge {
        Charge {
            strength: -30.0,
            distance_min_sq: 1.0,
            distance_max_sq: 180.0 * 180.0,
            theta_sq: 0.72 * 0.72,
        }
    }

    fn node_at(x: f32, y: f32) -> SimNode {
        SimNode {
            position: vec2(x, y),
            ..SimNode::default()
        }
    }

    #[test]
    fn charge_pushes_neighbours_apart() {
        let positions = vec![vec2(0.0, 0.0), vec2(10.0, 0.0)];
        let tree = Quadtree::build(&positions).expect("tree");

        let mut left = Vec2::ZERO;
        apply_charge(&tree, Quadtree::ROOT, 0, &positions, charge(), &mut left);
        let mut right = Vec2::ZERO;
        apply_charge(&tree, Quadtree::ROOT, 1, &positions, charge(), &mut right);

        assert!(left.x < 0.0);
        assert!(right.x > 0.0);
        assert!((left.x + right.x).abs() < 1e-5);
    }

    #[test]
    fn charge_ignores_nodes_beyond_the_maximum_distance() {
        let positions = vec![vec2(0.0, 0.0), vec2(181.0, 0.0)];
        let tree = Quadtree::build(&positions).expect("tree");

        let mut velocity = Vec2::ZERO;
        apply_charge(&tree, Quadtree::ROOT, 0, &positions, charge(), &mut velocity);
        assert_eq!(velocity, Vec2::ZERO);
    }

    #[test]
    fn coincident_nodes_still_separate() {
        let positions = vec![vec2(3.0, 3.0), vec2(3.0, 3.0)];
        let tree = Quadtree::build(&positions).expect("tree");

        let mut velocity = Vec2::ZERO;
        apply_charge(&tree, Quadtree::ROOT, 0, &positions, charge(), &mut velocity);
        assert!(velocity.length() > 0.0);
        assert!(velocity.x.is_finite() && velocity.y.is_finite());
    }

    #[test]
    fn links_pull_stretched_endpoints_together() {
        let mut nodes = vec![node_at(0.0, 0.0), node_at(100.0, 0.0)];
        let links = [SimLink {
            source: 0,
            target: 1,
        }];
        apply_links(&mut nodes, &links, &[1, 1], 30.0, 1.0);

        assert!(nodes[0].velocity.x > 0.0);
        assert!(nodes[1].velocity.x < 0.0);
    }

    #[test]
    fn center_moves_the_mean_not_the_shape() {
        let mut nodes = vec![node_at(0.0, 0.0), node_at(10.0, 20.0)];
        apply_center(&mut nodes, vec2(100.0, 100.0));

        assert_eq!(nodes[0].position, vec2(95.0, 90.0));
        assert_eq!(nodes[1].position, vec2(105.0, 110.0));
    }
}
