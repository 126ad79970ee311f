//! Toolkit-free core of the colour harmony viewer: the saturation-weighted
//! hue histogram, the harmony template catalog, the decoded image type and
//! its thumbnail loader, letterboxing, the wheel geometry and the
//! single-slot handoff between decode tasks and the render thread.

pub mod decode;
pub mod handoff;
pub mod histogram;
pub mod letterbox;
pub mod template;
pub mod wheel;

pub use decode::{DecodedImage, ImageError};
pub use handoff::Handoff;
pub use histogram::Histogram;
pub use letterbox::Letterbox;
pub use template::{Sector, TemplateKind};
pub use wheel::{RingGeometry, WheelState};
