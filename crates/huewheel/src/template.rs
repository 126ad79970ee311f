use serde_with::{DeserializeFromStr, SerializeDisplay};
use std::f64::consts::{PI, TAU};
use strum::{Display as StrumDisplay, EnumIter, EnumString, IntoEnumIterator};

/// One wedge of a harmony template, in fractions of a full turn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sector {
    /// Full angular width of the wedge.
    pub width: f64,
    /// Rotation of the wedge centre relative to the previous sector.
    pub offset: f64,
}

impl Sector {
    pub const fn new(width: f64, offset: f64) -> Self {
        Self { width, offset }
    }

    pub fn half_angle(&self) -> f64 {
        self.width * PI
    }

    pub fn offset_angle(&self) -> f64 {
        self.offset * TAU
    }
}

/// Wedge boundaries in radians, in cairo's clockwise screen convention.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SectorArc {
    pub start: f64,
    pub end: f64,
}

/// The seven classical hue templates. Names are case-sensitive since `i` and
/// `I` are different templates.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    SerializeDisplay,
    DeserializeFromStr,
    EnumString,
    EnumIter,
    StrumDisplay,
)]
pub enum TemplateKind {
    #[strum(to_string = "i-type", serialize = "i")]
    LowerI,
    #[strum(to_string = "V-type", serialize = "V")]
    V,
    #[strum(to_string = "L-type", serialize = "L")]
    L,
    #[strum(to_string = "I-type", serialize = "I")]
    UpperI,
    #[strum(to_string = "T-type", serialize = "T")]
    T,
    #[strum(to_string = "Y-type", serialize = "Y")]
    Y,
    #[strum(to_string = "X-type", serialize = "X")]
    X,
}

const LOWER_I: &[Sector] = &[Sector::new(0.05, 0.0)];
const V: &[Sector] = &[Sector::new(0.26, 0.0)];
const L: &[Sector] = &[Sector::new(0.05, 0.0), Sector::new(0.22, 0.25)];
const UPPER_I: &[Sector] = &[Sector::new(0.05, 0.0), Sector::new(0.05, 0.5)];
const T: &[Sector] = &[Sector::new(0.5, 0.0)];
const Y: &[Sector] = &[Sector::new(0.26, 0.0), Sector::new(0.05, 0.5)];
const X: &[Sector] = &[Sector::new(0.26, 0.0), Sector::new(0.26, 0.5)];

impl TemplateKind {
    pub fn sectors(self) -> &'static [Sector] {
        match self {
            Self::LowerI => LOWER_I,
            Self::V => V,
            Self::L => L,
            Self::UpperI => UPPER_I,
            Self::T => T,
            Self::Y => Y,
            Self::X => X,
        }
    }

    /// Wedges for a wheel turned by `rotation` radians. Each sector centre is
    /// the previous centre plus the sector's own offset.
    pub fn arcs(self, rotation: f64) -> Vec<SectorArc> {
        self.sectors()
            .iter()
            .scan(rotation, |centre, sector| {
                *centre += sector.offset_angle();
                let half = sector.half_angle();
                Some(SectorArc {
                    start: *centre - half,
                    end: *centre + half,
                })
            })
            .collect()
    }

    pub fn as_index(&self) -> usize {
        *self as usize
    }

    pub fn from_index(idx: usize) -> Option<Self> {
        Self::iter().nth(idx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_catalog_has_seven_templates() {
        assert_eq!(TemplateKind::iter().count(), 7);
        for kind in TemplateKind::iter() {
            let sectors = kind.sectors();
            assert!(!sectors.is_empty(), "{kind} has no sectors");
            assert!(
                sectors
                    .iter()
                    .all(|s| s.half_angle() > 0.0 && s.half_angle() <= PI)
            );
        }
    }

    #[test]
    fn test_x_type_sectors() {
        let sectors = TemplateKind::X.sectors();
        assert_eq!(sectors.len(), 2);
        assert!(sectors.iter().all(|s| s.width == 0.26));
        let offsets: Vec<f64> = sectors.iter().map(|s| s.offset).collect();
        assert_eq!(offsets, vec![0.0, 0.5]);
    }

    #[test]
    fn test_arcs_accumulate_offsets() {
        let arcs = TemplateKind::L.arcs(1.0);
        assert_eq!(arcs.len(), 2);

        assert_relative_eq!(arcs[0].start, 1.0 - 0.05 * PI);
        assert_relative_eq!(arcs[0].end, 1.0 + 0.05 * PI);

        let centre = 1.0 + 0.25 * TAU;
        assert_relative_eq!(arcs[1].start, centre - 0.22 * PI);
        assert_relative_eq!(arcs[1].end, centre + 0.22 * PI);
    }

    #[test]
    fn test_template_name_parsing() {
        let cases = vec![
            ("\"i-type\"", TemplateKind::LowerI),
            ("\"i\"", TemplateKind::LowerI),
            ("\"I-type\"", TemplateKind::UpperI),
            ("\"I\"", TemplateKind::UpperI),
            ("\"X-type\"", TemplateKind::X),
            ("\"V\"", TemplateKind::V),
        ];

        for (json, expected) in cases {
            let deserialized: TemplateKind = serde_json::from_str(json).unwrap();
            assert_eq!(deserialized, expected);
        }

        assert!(serde_json::from_str::<TemplateKind>("\"x-type\"").is_err());
        assert_eq!(
            serde_json::to_string(&TemplateKind::UpperI).unwrap(),
            "\"I-type\""
        );
    }

    #[test]
    fn test_index_round_trip() {
        for kind in TemplateKind::iter() {
            assert_eq!(TemplateKind::from_index(kind.as_index()), Some(kind));
        }
        assert_eq!(TemplateKind::from_index(7), None);
    }
}
