use glam::{Mat4, Vec2, Vec3};

/// Placement of an image quad inside the unit square so the whole image is
/// visible, centred and undistorted in a viewport of another aspect ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Letterbox {
    pub scale: Vec2,
    pub offset: Vec2,
}

impl Letterbox {
    pub const IDENTITY: Self = Self {
        scale: Vec2::ONE,
        offset: Vec2::ZERO,
    };

    pub fn fit(image: (u32, u32), viewport: (i32, i32)) -> Self {
        let (iw, ih) = (image.0 as f32, image.1 as f32);
        let (vw, vh) = (viewport.0 as f32, viewport.1 as f32);
        if iw <= 0.0 || ih <= 0.0 || vw <= 0.0 || vh <= 0.0 {
            return Self::IDENTITY;
        }

        if vh * iw / ih > vw {
            // too wide for the viewport: bars above and below
            let y = ih / iw * vw / vh;
            Self {
                scale: Vec2::new(1.0, y),
                offset: Vec2::new(0.0, (1.0 - y) / 2.0),
            }
        } else {
            let x = iw / ih * vh / vw;
            Self {
                scale: Vec2::new(x, 1.0),
                offset: Vec2::new((1.0 - x) / 2.0, 0.0),
            }
        }
    }

    /// Scale first, then translate into place.
    pub fn world_matrix(&self) -> Mat4 {
        Mat4::from_translation(self.offset.extend(0.0)) * Mat4::from_scale(self.scale.extend(1.0))
    }

    /// Padding on each side, as a fraction of the viewport.
    pub fn margins(&self) -> Vec2 {
        self.offset
    }
}

impl Default for Letterbox {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Maps the unit square onto clip space with y pointing up.
pub fn projection() -> Mat4 {
    Mat4::orthographic_rh_gl(0.0, 1.0, 0.0, 1.0, -1.0, 1.0)
}

pub fn transform_point(matrix: &Mat4, point: Vec2) -> Vec2 {
    matrix.transform_point3(Vec3::new(point.x, point.y, 0.0)).truncate()
}
