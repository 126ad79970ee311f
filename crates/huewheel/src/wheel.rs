use crate::histogram::{HISTOGRAM_BINS, Histogram};
use palette::{FromColor, Hsv, Srgb};
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, TAU};

pub const DEFAULT_SIZE: u32 = 200;
pub const DEFAULT_RING_WIDTH: u32 = 10;
pub const DEFAULT_ROTATION: f64 = -FRAC_PI_2;
pub const TRANSPARENT: u32 = 0;

/// Nominal wheel size in pixels and the thickness of an empty ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RingGeometry {
    pub size: u32,
    pub ring_width: u32,
}

impl RingGeometry {
    pub fn new(size: u32, ring_width: u32) -> Self {
        Self { size, ring_width }
    }

    pub fn outer_radius(&self) -> f64 {
        (self.size as f64 - 4.0) / 2.0
    }

    pub fn inner_radius(&self) -> f64 {
        self.outer_radius() - self.ring_width as f64
    }

    /// Radius of the template wedges, just outside the ring.
    pub fn overlay_radius(&self) -> f64 {
        (self.size as f64 - 2.0) / 2.0
    }
}

impl Default for RingGeometry {
    fn default() -> Self {
        Self::new(DEFAULT_SIZE, DEFAULT_RING_WIDTH)
    }
}

pub fn normalize_angle(angle: f64) -> f64 {
    angle.rem_euclid(TAU)
}

/// Histogram bin drawn at `angle` (radians, y up). The third-of-a-turn shift
/// lines bin 0 up with the hue painted at that position.
pub fn hue_index(angle: f64) -> usize {
    let turns = (normalize_angle(angle) + TAU / 3.0) / TAU;
    ((turns * 255.0).floor() as i64).rem_euclid(HISTOGRAM_BINS as i64) as usize
}

/// Opaque fully saturated colour for a hue given in turns, as a cairo ARGB32
/// word.
pub fn hue_argb(hue_turns: f64) -> u32 {
    let hsv = Hsv::<palette::encoding::Srgb, f64>::new(hue_turns * 360.0, 1.0, 1.0);
    let rgb = Srgb::<f64>::from_color(hsv);
    let [r, g, b] = [rgb.red, rgb.green, rgb.blue].map(|c| (c * 255.0 + 0.5).floor() as u32);
    0xFF00_0000 | (r.min(255) << 16) | (g.min(255) << 8) | b.min(255)
}

/// Procedurally drawn ring, one ARGB32 word per pixel, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RingImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u32>,
}

impl RingImage {
    pub fn pixel(&self, x: u32, y: u32) -> u32 {
        self.pixels[(y * self.width + x) as usize]
    }

    /// Bytes in the platform's ARGB32 layout, ready for a cairo image surface.
    pub fn to_ne_bytes(&self) -> Vec<u8> {
        self.pixels.iter().flat_map(|p| p.to_ne_bytes()).collect()
    }
}

/// Synthesizes the hue ring for a `width` x `height` area. The inner edge of
/// the ring moves inwards where the histogram is full: an empty bin leaves the
/// bare `ring_width` band, a full bin fills the disc to the centre.
pub fn synthesize_ring(
    width: u32,
    height: u32,
    geometry: RingGeometry,
    histogram: &Histogram,
) -> RingImage {
    let (cx, cy) = (width as f64 / 2.0, height as f64 / 2.0);
    let inner_limit = (geometry.inner_radius() - 1.0).powi(2);
    let outer_limit = (geometry.outer_radius() + 1.0).powi(2);

    let pixels = (0..height)
        .flat_map(|y| (0..width).map(move |x| (x, y)))
        .map(|(x, y)| {
            let dx = x as f64 - cx;
            let dy = cy - y as f64;
            let dist = dx * dx + dy * dy;
            let angle = normalize_angle(dy.atan2(dx));
            let fill = histogram[HISTOGRAM_BINS - 1 - hue_index(angle)] as f64;

            if dist < inner_limit * (1.0 - fill) || dist > outer_limit {
                TRANSPARENT
            } else {
                hue_argb(angle / TAU)
            }
        })
        .collect();

    RingImage {
        width,
        height,
        pixels,
    }
}

/// Bearing of `pointer` around `centre` in screen coordinates (y down), the
/// same convention cairo arcs use.
pub fn pointer_angle(centre: (f64, f64), pointer: (f64, f64)) -> f64 {
    (pointer.1 - centre.1).atan2(pointer.0 - centre.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DragState {
    #[default]
    Idle,
    /// Button is down; the first motion anchors the drag.
    Pressed,
    Dragging {
        offset: f64,
    },
}

/// Rotation of a wheel's template and the drag gesture turning it. The
/// rotation is never normalized.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelState {
    pub rotation: f64,
    pub drag: DragState,
}

impl WheelState {
    pub fn new(rotation: f64) -> Self {
        Self {
            rotation,
            drag: DragState::Idle,
        }
    }

    pub fn press(&mut self) {
        self.drag = DragState::Pressed;
    }

    /// Follows the pointer. Returns whether the rotation may have changed.
    pub fn motion(&mut self, pointer_angle: f64) -> bool {
        let offset = match self.drag {
            DragState::Idle => return false,
            DragState::Pressed => {
                let offset = self.rotation - pointer_angle + FRAC_PI_2;
                self.drag = DragState::Dragging { offset };
                offset
            }
            DragState::Dragging { offset } => offset,
        };
        self.rotation = pointer_angle - FRAC_PI_2 + offset;
        true
    }

    /// Ends the drag, keeping the rotation. Returns whether a drag was active.
    pub fn release(&mut self) -> bool {
        let was_active = self.drag != DragState::Idle;
        self.drag = DragState::Idle;
        was_active
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.drag, DragState::Dragging { .. })
    }
}

impl Default for WheelState {
    fn default() -> Self {
        Self::new(DEFAULT_ROTATION)
    }
}
