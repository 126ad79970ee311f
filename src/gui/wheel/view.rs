use super::model::WheelModel;
use super::colors::WheelColors;
use cairo::Context;
use huewheel::template::SectorArc;
use palette::Srgba;

const SECTOR_LINE_WIDTH: f64 = 1.0;

fn set_source(cr: &Context, color: Srgba<f64>) {
    let (r, g, b, a) = color.into_components();
    cr.set_source_rgba(r, g, b, a);
}

fn draw_sector(
    cr: &Context,
    centre: (f64, f64),
    radius: f64,
    arc: SectorArc,
    colors: &WheelColors,
) -> Result<(), cairo::Error> {
    cr.move_to(centre.0, centre.1);
    cr.arc(centre.0, centre.1, radius, arc.start, arc.end);
    cr.close_path();

    set_source(cr, colors.sector_fill);
    cr.fill_preserve()?;
    set_source(cr, colors.sector_stroke);
    cr.stroke()
}

/// Paints the cached ring, then the template wedges at the current rotation.
pub fn draw(
    cr: &Context,
    model: &mut WheelModel,
    colors: &WheelColors,
    width: i32,
    height: i32,
) -> Result<(), cairo::Error> {
    let ring = model.ring_surface(width, height, colors.frame)?;
    cr.set_source_surface(ring, 0.0, 0.0)?;
    cr.paint()?;

    let centre = (width as f64 / 2.0, height as f64 / 2.0);
    let radius = model.geometry().overlay_radius();
    cr.set_line_width(SECTOR_LINE_WIDTH);

    for arc in model.template.arcs(model.state.rotation) {
        draw_sector(cr, centre, radius, arc, colors)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use huewheel::wheel::RingGeometry;
    use huewheel::TemplateKind;

    fn colors() -> WheelColors {
        WheelColors::default()
    }

    fn alpha_at(surface: &mut cairo::ImageSurface, x: usize, y: usize) -> u8 {
        let stride = surface.stride() as usize;
        let data = surface.data().unwrap();
        let word = u32::from_ne_bytes(data[y * stride + x * 4..][..4].try_into().unwrap());
        (word >> 24) as u8
    }

    #[test]
    fn test_sector_wedge_covers_pointing_direction() {
        // rotation 0 points the single wedge along +x
        let mut model = WheelModel::new(TemplateKind::V, RingGeometry::default(), 0.0);
        let mut target = cairo::ImageSurface::create(cairo::Format::ARgb32, 200, 200).unwrap();
        {
            let cr = Context::new(&target).unwrap();
            draw(&cr, &mut model, &colors(), 200, 200).unwrap();
        }
        target.flush();

        // inside the hollow ring, on the wedge axis and opposite to it
        assert!(alpha_at(&mut target, 140, 100) > 0);
        assert_eq!(alpha_at(&mut target, 60, 100), 0);
    }
}
