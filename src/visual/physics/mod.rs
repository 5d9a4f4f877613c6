//! Force-directed layout: many-body charge with a distance cap, degree
//! weighted link springs and a centering pass, cooled by an alpha schedule.

mod forces;
mod quadtree;

use eframe::egui::{Vec2, vec2};

use forces::{Charge, apply_center, apply_charge, apply_links};
use quadtree::Quadtree;

pub const WARM_UP_TICKS: usize = 120;
const BARNES_HUT_THETA: f32 = 0.72;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SimNode {
    pub position: Vec2,
    pub velocity: Vec2,
    pub fixed: Option<Vec2>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SimLink {
    pub source: usize,
    pub target: usize,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ForceConfig {
    pub charge_strength: f32,
    pub charge_distance_min: f32,
    pub charge_distance_max: f32,
    pub link_distance: f32,
    pub velocity_decay: f32,
    pub alpha_min: f32,
    pub alpha_decay: f32,
}

impl Default for ForceConfig {
    fn default() -> Self {
        let alpha_min = 0.001;
        Self {
            charge_strength: -30.0,
            charge_distance_min: 1.0,
            charge_distance_max: 180.0,
            link_distance: 30.0,
            velocity_decay: 0.4,
            alpha_min,
            // Cools from 1 to alpha_min in about 300 ticks.
            alpha_decay: 1.0 - alpha_min.powf(1.0 / 300.0),
        }
    }
}

pub struct Simulation {
    nodes: Vec<SimNode>,
    links: Vec<SimLink>,
    degrees: Vec<usize>,
    config: ForceConfig,
    center: Vec2,
    alpha: f32,
    alpha_target: f32,
    positions: Vec<Vec2>,
}

impl Simulation {
    pub fn new(nodes: Vec<SimNode>, links: Vec<SimLink>, center: Vec2, config: ForceConfig) -> Self {
        let mut degrees = vec![0; nodes.len()];
        for link in &links {
            if link.source < nodes.len() && link.target < nodes.len() {
                degrees[link.source] += 1;
                degrees[link.target] += 1;
            }
        }

        Self {
            positions: Vec::with_capacity(nodes.len()),
            nodes,
            links,
            degrees,
            config,
            center,
            alpha: 1.0,
            alpha_target: 0.0,
        }
    }

    /// Phyllotaxis spiral around `center`; the same index always lands on the
    /// same spot.
    pub fn cold_position(index: usize, center: Vec2) -> Vec2 {
        const INITIAL_RADIUS: f32 = 10.0;
        let angle = std::f32::consts::PI * (3.0 - 5.0_f32.sqrt());
        let radius = INITIAL_RADIUS * (0.5 + index as f32).sqrt();
        let turn = index as f32 * angle;
        center + vec2(radius * turn.cos(), radius * turn.sin())
    }

    pub fn nodes(&self) -> &[SimNode] {
        &self.nodes
    }

    pub fn position(&self, index: usize) -> Option<Vec2> {
        self.nodes.get(index).map(|node| node.position)
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn set_alpha(&mut self, alpha: f32) {
        self.alpha = alpha.clamp(0.0, 1.0);
    }

    pub fn set_alpha_target(&mut self, target: f32) {
        self.alpha_target = target.clamp(0.0, 1.0);
    }

    pub fn reheat(&mut self, alpha: f32) {
        self.alpha = self.alpha.max(alpha.clamp(0.0, 1.0));
    }

    pub fn set_center(&mut self, center: Vec2) {
        self.center = center;
    }

    pub fn is_cooled(&self) -> bool {
        self.alpha < self.config.alpha_min
    }

    pub fn pin(&mut self, index: usize, position: Vec2) {
        if let Some(node) = self.nodes.get_mut(index) {
            node.fixed = Some(position);
        }
    }

    pub fn release(&mut self, index: usize) {
        if let Some(node) = self.nodes.get_mut(index) {
            node.fixed = None;
        }
    }

    pub fn warm_up(&mut self, ticks: usize) -> usize {
        let mut ran = 0;
        while ran < ticks && !self.is_cooled() {
            self.tick();
            ran += 1;
        }
        ran
    }

    pub fn tick(&mut self) -> bool {
        if self.nodes.is_empty() {
            return false;
        }

        self.alpha += (self.alpha_target - self.alpha) * self.config.alpha_decay;
        let alpha = self.alpha;

        apply_links(
            &mut self.nodes,
            &self.links,
            &self.degrees,
            self.config.link_distance,
            alpha,
        );
        self.apply_charge(alpha);
        apply_center(&mut self.nodes, self.center);

        let retained = 1.0 - self.config.velocity_decay;
        for node in &mut self.nodes {
            if let Some(fixed) = node.fixed {
                node.position = fixed;
                node.velocity = Vec2::ZERO;
            } else {
                node.velocity *= retained;
                node.position += node.velocity;
            }
        }

        !self.is_cooled()
    }

    fn apply_charge(&mut self, alpha: f32) {
        self.positions.clear();
        self.positions
            .extend(self.nodes.iter().map(|node| node.position));

        let Some(tree) = Quadtree::build(&self.positions) else {
            return;
        };

        let max = self.config.charge_distance_max;
        let min = self.config.charge_distance_min;
        let charge = Charge {
            strength: self.config.charge_strength * alpha,
            distance_min_sq: min * min,
            distance_max_sq: max * max,
            theta_sq: BARNES_HUT_THETA * BARNES_HUT_THETA,
        };

        for (index, node) in self.nodes.iter_mut().enumerate() {
            apply_charge(
                &tree,
                Quadtree::ROOT,
                index,
                &self.positions,
                charge,
                &mut node.velocity,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> Simulation {
        let center = vec2(200.0, 150.0);
        let nodes = (0..3)
            .map(|index| SimNode {
                position: Simulation::cold_position(index, center),
                ..SimNode::default()
            })
            .collect();
        let links = vec![
            SimLink { source: 0, target: 1 },
            SimLink { source: 1, target: 2 },
        ];
        Simulation::new(nodes, links, center, ForceConfig::default())
    }

    #[test]
    fn cold_start_is_deterministic() {
        assert_eq!(
            Simulation::cold_position(7, Vec2::ZERO),
            Simulation::cold_position(7, Vec2::ZERO)
        );
        assert_ne!(
            Simulation::cold_position(1, Vec2::ZERO),
            Simulation::cold_position(2, Vec2::ZERO)
        );
    }

    #[test]
    fn warm_up_settles_around_the_center() {
        let mut simulation = triangle();
        let ran = simulation.warm_up(WARM_UP_TICKS);
        assert_eq!(ran, WARM_UP_TICKS);

        let mean = simulation
            .nodes()
            .iter()
            .fold(Vec2::ZERO, |sum, node| sum + node.position)
            / 3.0;
        assert!((mean - vec2(200.0, 150.0)).length() < 1.0);

        let spread = simulation.nodes()[0].position - simulation.nodes()[1].position;
        assert!(spread.length() > 10.0);
        assert!(spread.length() < 120.0);
    }

    #[test]
    fn cools_down_and_stops() {
        let mut simulation = triangle();
        let mut ticks = 0;
        while simulation.tick() {
            ticks += 1;
            assert!(ticks < 1_000, "simulation never cooled");
        }
        assert!(simulation.is_cooled());
        assert_eq!(simulation.warm_up(10), 0);
    }

    #[test]
    fn pinned_nodes_stay_put_until_released() {
        let mut simulation = triangle();
        let pin = vec2(10.0, 10.0);
        simulation.pin(1, pin);
        simulation.set_alpha_target(0.3);
        for _ in 0..20 {
            simulation.tick();
        }
        assert_eq!(simulation.position(1), Some(pin));
        assert!(!simulation.is_cooled());

        simulation.release(1);
        simulation.tick();
        assert_ne!(simulation.position(1), Some(pin));
    }

    #[test]
    fn empty_simulation_is_inert() {
        let mut simulation =
            Simulation::new(Vec::new(), Vec::new(), Vec2::ZERO, ForceConfig::default());
        assert!(!simulation.tick());
        assert_eq!(simulation.position(0), None);
    }
}
