use eframe::egui::{Vec2, vec2};

const LEAF_CAPACITY: usize = 12;
const MAX_DEPTH: usize = 10;

#[derive(Clone, Copy, Debug)]
pub(super) struct Bounds {
    pub(super) center: Vec2,
    pub(super) half_extent: f32,
}

impl Bounds {
    fn enclosing(points: &[Vec2]) -> Option<Self> {
        let (min, max) = points.iter().fold(
            (
                vec2(f32::INFINITY, f32::INFINITY),
                vec2(f32::NEG_INFINITY, f32::NEG_INFINITY),
            ),
            |(min, max), point| (min.min(*point), max.max(*point)),
        );

        if !(min.x.is_finite() && min.y.is_finite() && max.x.is_finite() && max.y.is_finite()) {
            return None;
        }

        let span = (max - min).max_elem().max(1.0);
        Some(Self {
            center: (min + max) * 0.5,
            half_extent: span * 0.5 + 1.0,
        })
    }

    fn quadrant_of(self, point: Vec2) -> usize {
        usize::from(point.x >= self.center.x) | (usize::from(point.y >= self.center.y) << 1)
    }

    fn quadrant(self, quadrant: usize) -> Self {
        let quarter = self.half_extent * 0.5;
        let sign = |bit: usize| if quadrant & bit == 0 { -quarter } else { quarter };
        Self {
            center: self.center + vec2(sign(1), sign(2)),
            half_extent: quarter,
        }
    }

    pub(super) fn width(self) -> f32 {
        self.half_extent * 2.0
    }
}

pub(super) struct Cell {
    pub(super) bounds: Bounds,
    pub(super) centroid: Vec2,
    pub(super) weight: f32,
    pub(super) points: Vec<usize>,
    pub(super) children: [Option<usize>; 4],
}

impl Cell {
    pub(super) fn is_leaf(&self) -> bool {
        self.children.iter().all(Option::is_none)
    }
}

/// Barnes-Hut tree over simulation positions, stored as a flat arena.
pub(super) struct Quadtree {
    cells: Vec<Cell>,
}

impl Quadtree {
    pub(super) const ROOT: usize = 0;

    pub(super) fn build(positions: &[Vec2]) -> Option<Self> {
        let bounds = Bounds::enclosing(positions)?;
        let mut tree = Self {
            cells: Vec::with_capacity(positions.len() / LEAF_CAPACITY * 2 + 1),
        };
        tree.subdivide(bounds, (0..positions.len()).collect(), positions, 0);
        Some(tree)
    }

    pub(super) fn cell(&self, id: usize) -> &Cell {
        &self.cells[id]
    }

    pub(super) fn len(&self) -> usize {
        self.cells.len()
    }

    fn subdivide(
        &mut self,
        bounds: Bounds,
        points: Vec<usize>,
        positions: &[Vec2],
        depth: usize,
    ) -> usize {
        let weight = points.len() as f32;
        let centroid = if points.is_empty() {
            bounds.center
        } else {
            points.iter().fold(Vec2::ZERO, |sum, &index| sum + positions[index]) / weight
        };

        let id = self.cells.len();
        self.cells.push(Cell {
            bounds,
            centroid,
            weight,
            points: Vec::new(),
            children: [None; 4],
        });

        if depth >= MAX_DEPTH || points.len() <= LEAF_CAPACITY {
            self.cells[id].points = points;
            return id;
        }

        let mut buckets: [Vec<usize>; 4] = Default::default();
        for &index in &points {
            buckets[bounds.quadrant_of(positions[index])].push(index);
        }

        // Coincident points would otherwise recurse down to MAX_DEPTH.
        if buckets.iter().filter(|bucket| !bucket.is_empty()).count() <= 1 {
            self.cells[id].points = points;
            return id;
        }

        for (quadrant, bucket) in buckets.into_iter().enumerate() {
            if bucket.is_empty() {
                continue;
            }
            let child = self.subdivide(bounds.quadrant(quadrant), bucket, positions, depth + 1);
            self.cells[id].children[quadrant] = Some(child);
        }
        id
    }
}
