//! Off-screen picking layer. Every entity is painted in a flat color that
//! encodes its key; reading one pixel back resolves the pointer to an entity.

use eframe::egui::{Color32, Pos2, Stroke, Vec2};

use super::surface::Surface;

const KEY_STEP: u32 = 10;
const KEY_MASK: u32 = 0x00ff_ffff;

/// Integer key painted into the hit layer. Zero is reserved for "nothing".
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HitKey(u32);

impl HitKey {
    pub fn value(self) -> u32 {
        self.0
    }

    pub fn color(self) -> Color32 {
        let [_, r, g, b] = self.0.to_be_bytes();
        Color32::from_rgb(r, g, b)
    }

    pub fn from_color(color: Color32) -> Option<Self> {
        Self::from_pixel(pack(color))
    }

    fn from_pixel(pixel: u32) -> Option<Self> {
        (pixel != 0).then_some(Self(pixel))
    }
}

/// Hands out keys 10, 20, 30, ... for one graph build. Keys never repeat:
/// once the 24-bit range is used up every further request gets `None`.
#[derive(Clone, Debug, Default)]
pub struct KeyAllocator {
    last: u32,
    exhausted: bool,
}

impl KeyAllocator {
    pub fn next_key(&mut self) -> Option<HitKey> {
        match self.last.checked_add(KEY_STEP) {
            Some(next) if next <= KEY_MASK && !self.exhausted => {
                self.last = next;
                Some(HitKey(next))
            }
            _ => {
                self.exhausted = true;
                None
            }
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }
}

fn pack(color: Color32) -> u32 {
    u32::from_be_bytes([0, color.r(), color.g(), color.b()])
}

/// `u32` raster with no blending: a pixel holds exactly the last key drawn on
/// it.
pub struct HitLayer {
    width: usize,
    height: usize,
    pixels: Vec<u32>,
}

impl HitLayer {
    pub fn new(size: Vec2) -> Self {
        let (width, height) = dimensions(size);
        Self {
            width,
            height,
            pixels: vec![0; width * height],
        }
    }

    pub fn resize(&mut self, size: Vec2) {
        let (width, height) = dimensions(size);
        self.width = width;
        self.height = height;
        self.pixels = vec![0; width * height];
    }

    pub fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn key_at(&self, point: Pos2) -> Option<HitKey> {
        if !(point.x >= 0.0 && point.y >= 0.0) {
            return None;
        }
        let (x, y) = (point.x as usize, point.y as usize);
        if x >= self.width || y >= self.height {
            return None;
        }
        HitKey::from_pixel(self.pixels[y * self.width + x])
    }

    fn put(&mut self, x: i64, y: i64, value: u32) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return;
        }
        let index = y as usize * self.width + x as usize;
        self.pixels[index] = value;
    }

    fn fill_disc(&mut self, center: Pos2, radius: f32, value: u32) {
        if radius <= 0.0 {
            return;
        }
        let radius_sq = radius * radius;
        let (min_x, max_x) = pixel_span(center.x - radius, center.x + radius);
        let (min_y, max_y) = pixel_span(center.y - radius, center.y + radius);
        for y in min_y..=max_y {
            let dy = y as f32 + 0.5 - center.y;
            for x in min_x..=max_x {
                let dx = x as f32 + 0.5 - center.x;
                if dx * dx + dy * dy <= radius_sq {
                    self.put(x, y, value);
                }
            }
        }
    }

    /// Pixels whose centers lie within `width / 2` of the segment, walked
    /// along its major axis so long links stay cheap.
    fn fill_segment(&mut self, from: Pos2, to: Pos2, width: f32, value: u32) {
        let half = width * 0.5;
        let delta = to - from;
        let length_sq = delta.length_sq();
        if length_sq <= f32::EPSILON {
            self.fill_disc(from, half, value);
            return;
        }

        let band = (2.0 * half).ceil() as i64 + 1;
        let mut visit = |x: i64, y: i64| {
            let point = Pos2::new(x as f32 + 0.5, y as f32 + 0.5);
            let t = ((point - from).dot(delta) / length_sq).clamp(0.0, 1.0);
            if (point - (from + delta * t)).length_sq() <= half * half {
                self.put(x, y, value);
            }
        };

        if delta.x.abs() >= delta.y.abs() {
            let (min_x, max_x) = pixel_span(from.x.min(to.x) - half, from.x.max(to.x) + half);
            for x in min_x..=max_x {
                let t = ((x as f32 + 0.5 - from.x) / delta.x).clamp(0.0, 1.0);
                let y_mid = (from.y + delta.y * t).floor() as i64;
                for y in (y_mid - band)..=(y_mid + band) {
                    visit(x, y);
                }
            }
        } else {
            let (min_y, max_y) = pixel_span(from.y.min(to.y) - half, from.y.max(to.y) + half);
            for y in min_y..=max_y {
                let t = ((y as f32 + 0.5 - from.y) / delta.y).clamp(0.0, 1.0);
                let x_mid = (from.x + delta.x * t).floor() as i64;
                for x in (x_mid - band)..=(x_mid + band) {
                    visit(x, y);
                }
            }
        }
    }
}

impl Surface for HitLayer {
    fn clear(&mut self) {
        self.pixels.fill(0);
    }

    fn line(&mut self, from: Pos2, to: Pos2, stroke: Stroke) {
        self.fill_segment(from, to, stroke.width, pack(stroke.color));
    }

    fn circle(&mut self, center: Pos2, radius: f32, fill: Color32, _outline: Stroke) {
        self.fill_disc(center, radius, pack(fill));
    }
}

fn dimensions(size: Vec2) -> (usize, usize) {
    let side = |value: f32| {
        if value.is_finite() && value > 0.0 {
            value.ceil() as usize
        } else {
            0
        }
    };
    (side(size.x), side(size.y))
}

fn pixel_span(min: f32, max: f32) -> (i64, i64) {
    (min.floor() as i64, max.ceil() as i64)
}

#[cfg(test)]
mod tests {
    use eframe::egui::{pos2, vec2};

    use super::*;

    #[test]
    fn keys_start_at_ten_and_step_by_ten() {
        let mut keys = KeyAllocator::default();
        let issued = (0..3)
            .filter_map(|_| keys.next_key())
            .map(HitKey::value)
            .collect::<Vec<_>>();
        assert_eq!(issued, vec![10, 20, 30]);
    }

    #[test]
    fn allocator_stops_instead_of_wrapping() {
        let mut keys = KeyAllocator::default();
        let capacity = (KEY_MASK / KEY_STEP) as usize;
        let issued = std::iter::from_fn(|| keys.next_key())
            .map(HitKey::value)
            .collect::<Vec<_>>();

        assert_eq!(issued.len(), capacity);
        assert_eq!(issued.last(), Some(&(capacity as u32 * KEY_STEP)));
        assert!(keys.is_exhausted());
        assert_eq!(keys.next_key(), None);
    }

    #[test]
    fn key_color_round_trips_through_a_pixel() {
        let key = HitKey(0x12_34_56);
        assert_eq!(key.color(), Color32::from_rgb(0x12, 0x34, 0x56));
        assert_eq!(HitKey::from_color(key.color()), Some(key));
        assert_eq!(HitKey::from_color(Color32::BLACK), None);
    }

    #[test]
    fn later_shapes_overwrite_earlier_ones_without_blending() {
        let mut layer = HitLayer::new(vec2(40.0, 40.0));
        let link = HitKey(10);
        let node = HitKey(20);
        layer.line(pos2(0.0, 20.0), pos2(40.0, 20.0), Stroke::new(6.0, link.color()));
        layer.circle(pos2(20.0, 20.0), 5.0, node.color(), Stroke::NONE);

        assert_eq!(layer.key_at(pos2(20.2, 20.2)), Some(node));
        assert_eq!(layer.key_at(pos2(33.0, 21.5)), Some(link));
        assert_eq!(layer.key_at(pos2(33.0, 26.0)), None);
        assert_eq!(layer.key_at(pos2(5.0, 5.0)), None);
    }

    #[test]
    fn steep_segments_are_covered_too() {
        let mut layer = HitLayer::new(vec2(50.0, 50.0));
        let key = HitKey(30);
        layer.line(pos2(10.0, 2.0), pos2(14.0, 48.0), Stroke::new(6.0, key.color()));

        assert_eq!(layer.key_at(pos2(12.0, 25.0)), Some(key));
        assert_eq!(layer.key_at(pos2(20.0, 25.0)), None);
    }

    #[test]
    fn out_of_bounds_reads_are_misses() {
        let mut layer = HitLayer::new(vec2(10.0, 10.0));
        layer.circle(pos2(5.0, 5.0), 20.0, HitKey(10).color(), Stroke::NONE);

        assert_eq!(layer.key_at(pos2(-1.0, 5.0)), None);
        assert_eq!(layer.key_at(pos2(5.0, 10.0)), None);
        assert_eq!(layer.key_at(pos2(f32::NAN, 5.0)), None);
        assert_eq!(layer.key_at(pos2(9.9, 9.9)), Some(HitKey(10)));

        layer.clear();
        assert_eq!(layer.key_at(pos2(5.0, 5.0)), None);
    }
}
