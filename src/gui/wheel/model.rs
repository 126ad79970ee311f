use cairo::{Format, ImageSurface};
use huewheel::wheel::{self, RingGeometry, WheelState};
use huewheel::{Histogram, TemplateKind};
use palette::Srgba;
use std::f64::consts::TAU;

const CENTRE_DOT_RADIUS: f64 = 2.0;
const FRAME_LINE_WIDTH: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq)]
struct RingKey {
    width: i32,
    height: i32,
    geometry: RingGeometry,
    frame: Srgba<f64>,
}

struct CachedRing {
    key: RingKey,
    surface: ImageSurface,
}

/// Everything a wheel needs to paint itself. Lives on the UI thread.
pub struct WheelModel {
    pub template: TemplateKind,
    pub state: WheelState,
    geometry: RingGeometry,
    histogram: Histogram,
    ring: Option<CachedRing>,
}

impl WheelModel {
    pub fn new(template: TemplateKind, geometry: RingGeometry, rotation: f64) -> Self {
        Self {
            template,
            state: WheelState::new(rotation),
            geometry,
            histogram: Histogram::empty(),
            ring: None,
        }
    }

    pub fn geometry(&self) -> RingGeometry {
        self.geometry
    }

    pub fn set_geometry(&mut self, geometry: RingGeometry) {
        if self.geometry != geometry {
            self.geometry = geometry;
            self.ring = None;
        }
    }

    pub fn set_histogram(&mut self, histogram: Histogram) {
        self.histogram = histogram;
        self.ring = None;
    }

    pub fn has_ring(&self) -> bool {
        self.ring.is_some()
    }

    /// The ring and its frame for a `width` x `height` allocation, synthesized
    /// again when the allocation, geometry, frame colour or histogram changed.
    pub fn ring_surface(
        &mut self,
        width: i32,
        height: i32,
        frame: Srgba<f64>,
    ) -> Result<&ImageSurface, cairo::Error> {
        let key = RingKey {
            width: width.max(1),
            height: height.max(1),
            geometry: self.geometry,
            frame,
        };

        if self.ring.as_ref().is_none_or(|ring| ring.key != key) {
            let surface = self.build_ring(key)?;
            log::debug!("Synthesized {}x{} {} ring", key.width, key.height, self.template);
            self.ring = Some(CachedRing { key, surface });
        }

        match &self.ring {
            Some(ring) => Ok(&ring.surface),
            None => Err(cairo::Error::InvalidSize),
        }
    }

    fn build_ring(&self, key: RingKey) -> Result<ImageSurface, cairo::Error> {
        let ring = wheel::synthesize_ring(
            key.width as u32,
            key.height as u32,
            key.geometry,
            &self.histogram,
        );
        let stride = Format::ARgb32.stride_for_width(ring.width)?;
        let surface = ImageSurface::create_for_data(
            ring.to_ne_bytes(),
            Format::ARgb32,
            key.width,
            key.height,
            stride,
        )?;

        {
            let cr = cairo::Context::new(&surface)?;
            let (cx, cy) = (key.width as f64 / 2.0, key.height as f64 / 2.0);
            let (r, g, b, a) = key.frame.into_components();
            cr.set_source_rgba(r, g, b, a);
            cr.set_line_width(FRAME_LINE_WIDTH);

            for radius in [key.geometry.inner_radius(), key.geometry.overlay_radius()] {
                cr.new_sub_path();
                cr.arc(cx, cy, radius, 0.0, TAU);
                cr.stroke()?;
            }

            cr.arc(cx, cy, CENTRE_DOT_RADIUS, 0.0, TAU);
            cr.fill()?;
        }
        surface.flush();
        Ok(surface)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use huewheel::wheel::DEFAULT_ROTATION;

    fn black() -> Srgba<f64> {
        Srgba::new(0.0, 0.0, 0.0, 1.0)
    }

    #[test]
    fn test_ring_is_cached_per_allocation() {
        let mut model = WheelModel::new(TemplateKind::V, RingGeometry::default(), DEFAULT_ROTATION);
        assert!(!model.has_ring());

        let first = model.ring_surface(200, 200, black()).unwrap().clone();
        let again = model.ring_surface(200, 200, black()).unwrap().clone();
        assert_eq!(first.to_raw_none(), again.to_raw_none());

        let resized = model.ring_surface(240, 200, black()).unwrap();
        assert_eq!(resized.width(), 240);
        assert_ne!(first.to_raw_none(), resized.to_raw_none());
    }

    #[test]
    fn test_new_histogram_invalidates_ring() {
        let mut model = WheelModel::new(TemplateKind::X, RingGeometry::default(), 0.0);
        model.ring_surface(100, 100, black()).unwrap();
        assert!(model.has_ring());

        model.set_histogram(Histogram::empty());
        assert!(!model.has_ring());
    }

    #[test]
    fn test_theme_change_repaints_frame() {
        let mut model = WheelModel::new(TemplateKind::L, RingGeometry::default(), 0.0);
        let dark = model.ring_surface(100, 100, black()).unwrap().clone();
        let same = model.ring_surface(100, 100, black()).unwrap().clone();
        assert_eq!(dark.to_raw_none(), same.to_raw_none());

        let light = Srgba::new(1.0, 1.0, 1.0, 1.0);
        let mut repainted = model.ring_surface(100, 100, light).unwrap().clone();
        assert_ne!(dark.to_raw_none(), repainted.to_raw_none());
        // release the cached reference so the pixels can be read
        model.set_histogram(Histogram::empty());

        // the centre dot carries the new frame colour
        let stride = repainted.stride() as usize;
        let data = repainted.data().unwrap();
        let centre = u32::from_ne_bytes(data[50 * stride + 50 * 4..][..4].try_into().unwrap());
        assert_eq!(centre, 0xFFFF_FFFF);
    }

    #[test]
    fn test_same_geometry_keeps_ring() {
        let mut model = WheelModel::new(TemplateKind::T, RingGeometry::default(), 0.0);
        model.ring_surface(100, 100, black()).unwrap();

        model.set_geometry(RingGeometry::default());
        assert!(model.has_ring());

        model.set_geometry(RingGeometry::new(300, 20));
        assert!(!model.has_ring());
        assert_eq!(model.geometry().size, 300);
    }
}
