use gtk::prelude::*;
use gtk4 as gtk;
use huewheel::wheel::{self, RingGeometry};
use huewheel::{Histogram, TemplateKind};
use std::cell::RefCell;
use std::rc::Rc;

pub mod colors;
pub mod model;
pub mod view;

pub use colors::WheelColors;
pub use model::WheelModel;

/// A hue ring shaped by the current histogram with a draggable harmony
/// template on top.
#[derive(Clone)]
pub struct HueWheel {
    area: gtk::DrawingArea,
    model: Rc<RefCell<WheelModel>>,
}

impl HueWheel {
    pub fn new(template: TemplateKind, geometry: RingGeometry, rotation: f64) -> Self {
        let area = gtk::DrawingArea::new();
        area.add_css_class("harmonist-wheel");
        area.set_content_width(geometry.size as i32);
        area.set_content_height(geometry.size as i32);

        let model = Rc::new(RefCell::new(WheelModel::new(template, geometry, rotation)));

        let model_draw = model.clone();
        area.set_draw_func(move |area, cr, width, height| {
            let colors = WheelColors::from_widget(area);
            if let Err(e) = view::draw(cr, &mut model_draw.borrow_mut(), &colors, width, height) {
                log::error!("Drawing error: {}", e);
            }
        });

        let drag = gtk::GestureDrag::new();
        drag.set_button(gtk::gdk::BUTTON_PRIMARY);

        let model_begin = model.clone();
        drag.connect_drag_begin(move |_, _, _| {
            model_begin.borrow_mut().state.press();
        });

        let (model_update, area_update) = (model.clone(), area.downgrade());
        drag.connect_drag_update(move |gesture, offset_x, offset_y| {
            let (Some(area), Some((start_x, start_y))) =
                (area_update.upgrade(), gesture.start_point())
            else {
                return;
            };
            let centre = (area.width() as f64 / 2.0, area.height() as f64 / 2.0);
            let angle = wheel::pointer_angle(centre, (start_x + offset_x, start_y + offset_y));
            if model_update.borrow_mut().state.motion(angle) {
                area.queue_draw();
            }
        });

        let (model_end, area_end) = (model.clone(), area.downgrade());
        drag.connect_drag_end(move |_, _, _| {
            if model_end.borrow_mut().state.release()
                && let Some(area) = area_end.upgrade()
            {
                area.queue_draw();
            }
        });

        area.add_controller(drag);

        Self { area, model }
    }

    pub fn widget(&self) -> &gtk::DrawingArea {
        &self.area
    }

    pub fn template(&self) -> TemplateKind {
        self.model.borrow().template
    }

    pub fn rotation(&self) -> f64 {
        self.model.borrow().state.rotation
    }

    /// Replaces the histogram shaping the ring. The ring is synthesized again
    /// on the next draw.
    pub fn set_histogram(&self, histogram: Histogram) {
        self.model.borrow_mut().set_histogram(histogram);
        self.area.queue_draw();
    }

    /// Resizes the wheel. A geometry equal to the current one is a no-op.
    pub fn set_geometry(&self, geometry: RingGeometry) {
        self.model.borrow_mut().set_geometry(geometry);
        self.area.set_content_width(geometry.size as i32);
        self.area.set_content_height(geometry.size as i32);
        self.area.queue_draw();
    }
}
