use gtk::prelude::*;
use gtk4 as gtk;
use palette::{Srgba, WithAlpha};

/// Named colour the stylesheet may define to recolour the template wedges.
pub const SECTOR_COLOR_NAME: &str = "harmonist_sector_color";
pub const SECTOR_FILL_ALPHA: f64 = 0.25;

fn black() -> Srgba<f64> {
    Srgba::new(0.0, 0.0, 0.0, 1.0)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelColors {
    /// Ring frame and centre dot.
    pub frame: Srgba<f64>,
    pub sector_stroke: Srgba<f64>,
    pub sector_fill: Srgba<f64>,
}

impl WheelColors {
    pub fn from_widget(widget: &impl IsA<gtk::Widget>) -> Self {
        let context = widget.style_context();
        Self::from_theme(
            themed(&context, "theme_fg_color"),
            themed(&context, SECTOR_COLOR_NAME),
        )
    }

    /// Missing theme colours fall back to black. Wedges are stroked opaque and
    /// filled translucent whatever alpha the theme gives.
    pub fn from_theme(foreground: Option<Srgba<f64>>, sector: Option<Srgba<f64>>) -> Self {
        let sector = sector.unwrap_or_else(black);
        Self {
            frame: foreground.unwrap_or_else(black),
            sector_stroke: sector.with_alpha(1.0),
            sector_fill: sector.with_alpha(SECTOR_FILL_ALPHA),
        }
    }
}

impl Default for WheelColors {
    fn default() -> Self {
        Self::from_theme(None, None)
    }
}

fn themed(context: &gtk::StyleContext, name: &str) -> Option<Srgba<f64>> {
    let rgba = context.lookup_color(name)?;
    let color = Srgba::new(rgba.red(), rgba.green(), rgba.blue(), rgba.alpha());
    Some(color.into_format())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_missing_theme_colours_fall_back_to_black() {
        let colors = WheelColors::default();
        assert_eq!(colors.frame, black());
        assert_eq!(colors.sector_stroke, black());
        assert_relative_eq!(colors.sector_fill.alpha, SECTOR_FILL_ALPHA);
    }

    #[test]
    fn test_sector_alpha_is_overridden() {
        let theme = Srgba::new(0.2, 0.4, 0.6, 0.5);
        let colors = WheelColors::from_theme(Some(theme), Some(theme));

        assert_eq!(colors.frame, theme);
        assert_relative_eq!(colors.sector_stroke.alpha, 1.0);
        assert_relative_eq!(colors.sector_fill.alpha, SECTOR_FILL_ALPHA);
        assert_relative_eq!(colors.sector_fill.color.blue, 0.6);
    }
}
