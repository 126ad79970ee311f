use crate::config::{self, Config};
use crate::events::AppEvent;
use crate::gui::gl::RenderError;
use crate::gui::image_view::{ImageView, ImageViewOptions};
use crate::gui::wheel::HueWheel;
use crate::gui::wheel::colors::SECTOR_COLOR_NAME;
use gtk::prelude::*;
use gtk4 as gtk;
use huewheel::{Histogram, TemplateKind};
use relm4::prelude::*;
use std::path::PathBuf;
use strum::IntoEnumIterator;
use tokio::runtime::Handle;

const STYLESHEET: &str = "
.harmonist-wheel, .harmonist-image-view {
    background-color: transparent;
}

.harmonist-status {
    padding: 4px 8px;
}
";

pub struct AppInit {
    pub config: Config,
    pub image: Option<PathBuf>,
    pub runtime: Handle,
    pub events_tx: async_channel::Sender<AppEvent>,
    pub events: async_channel::Receiver<AppEvent>,
}

pub struct AppModel {
    pub template: TemplateKind,
    pub status: String,
    pub source: ImageView,
    pub harmonized: ImageView,
    pub wheels: Vec<HueWheel>,
    pub wheel_stack: gtk::Stack,
}

#[derive(Debug)]
pub enum AppMsg {
    HistogramReady(Histogram),
    ImageLoaded { source: String },
    DecodeFailed { source: String, reason: String },
    ConfigReload,
    SelectTemplate(u32),
    Open(Option<PathBuf>),
    SurfaceFailed(RenderError),
    Quit,
}

impl From<AppEvent> for AppMsg {
    fn from(event: AppEvent) -> Self {
        match event {
            AppEvent::HistogramReady(h) => AppMsg::HistogramReady(h),
            AppEvent::ImageLoaded { source } => AppMsg::ImageLoaded { source },
            AppEvent::DecodeFailed { source, reason } => AppMsg::DecodeFailed { source, reason },
            AppEvent::ConfigReload => AppMsg::ConfigReload,
        }
    }
}

#[relm4::component(pub)]
impl SimpleComponent for AppModel {
    type Init = AppInit;
    type Input = AppMsg;
    type Output = ();

    view! {
        #[root]
        #[name = "window"]
        gtk::ApplicationWindow {
            set_title: Some("Harmonist"),
            set_default_size: (1200, 640),

            add_controller = gtk::EventControllerKey {
                connect_key_pressed[sender] => move |_, key, _, _| {
                    if key == gtk::gdk::Key::Escape {
                        sender.input(AppMsg::Quit);
                        return glib::Propagation::Stop;
                    }
                    glib::Propagation::Proceed
                }
            },

            add_controller = gtk::DropTarget::new(gtk::gio::File::static_type(), gtk::gdk::DragAction::COPY) {
                connect_drop[sender] => move |_, value, _, _| {
                    match value.get::<gtk::gio::File>().ok().and_then(|file| file.path()) {
                        Some(path) => {
                            sender.input(AppMsg::Open(Some(path)));
                            true
                        }
                        None => false,
                    }
                }
            },

            gtk::Box {
                set_orientation: gtk::Orientation::Vertical,

                gtk::Box {
                    set_orientation: gtk::Orientation::Horizontal,
                    set_spacing: 6,
                    set_margin_all: 6,
                    set_vexpand: true,

                    #[local_ref]
                    source_area -> gtk::GLArea {},

                    #[local_ref]
                    harmonized_area -> gtk::GLArea {},

                    gtk::Box {
                        set_orientation: gtk::Orientation::Vertical,
                        set_spacing: 6,
                        set_valign: gtk::Align::Center,

                        #[name = "template_selector"]
                        gtk::DropDown::from_strings(&template_names) {
                            set_selected: model.template.as_index() as u32,
                            connect_selected_notify[sender] => move |dropdown| {
                                sender.input(AppMsg::SelectTemplate(dropdown.selected()));
                            }
                        },

                        #[local_ref]
                        wheel_stack -> gtk::Stack {},
                    }
                },

                gtk::Label {
                    add_css_class: "harmonist-status",
                    set_xalign: 0.0,
                    #[watch]
                    set_label: &model.status,
                }
            }
        }
    }

    fn init(
        init: Self::Init,
        root: Self::Root,
        sender: ComponentSender<Self>,
    ) -> ComponentParts<Self> {
        let AppInit {
            config,
            image,
            runtime,
            events_tx,
            events,
        } = init;

        relm4::set_global_css(&format!(
            "@define-color {} #000000;\n{}",
            SECTOR_COLOR_NAME, STYLESHEET
        ));

        let view_options = |create_histogram, do_harmonization| ImageViewOptions {
            view_size: config.view_size,
            create_histogram,
            do_harmonization,
            gl: config.gl,
        };
        let surface_failed = |sender: &ComponentSender<Self>| {
            let sender = sender.clone();
            move |e| sender.input(AppMsg::SurfaceFailed(e))
        };
        let source = ImageView::new(
            view_options(true, false),
            runtime.clone(),
            events_tx.clone(),
            surface_failed(&sender),
        );
        let harmonized = ImageView::new(
            view_options(false, true),
            runtime,
            events_tx,
            surface_failed(&sender),
        );

        let geometry = config.wheel.geometry();
        let wheel_stack = gtk::Stack::new();
        let wheels: Vec<HueWheel> = TemplateKind::iter()
            .map(|kind| {
                let wheel = HueWheel::new(kind, geometry, config.wheel.rotation);
                wheel_stack.add_named(wheel.widget(), Some(&kind.to_string()));
                wheel
            })
            .collect();
        wheel_stack.set_visible_child_name(&config.template.to_string());

        let template_names: Vec<String> = TemplateKind::iter().map(|k| k.to_string()).collect();
        let template_names: Vec<&str> = template_names.iter().map(String::as_str).collect();

        let model = AppModel {
            template: config.template,
            status: String::from("Drop an image to see its hue distribution"),
            source,
            harmonized,
            wheels,
            wheel_stack,
        };

        let source_area = model.source.widget();
        let harmonized_area = model.harmonized.widget();
        let wheel_stack = &model.wheel_stack;
        let widgets = view_output!();

        let sender_clone = sender.clone();
        relm4::spawn(async move {
            while let Ok(event) = events.recv().await {
                sender_clone.input(AppMsg::from(event));
            }
        });

        sender.input(AppMsg::Open(image));

        ComponentParts { model, widgets }
    }

    fn update(&mut self, msg: Self::Input, _sender: ComponentSender<Self>) {
        match msg {
            AppMsg::HistogramReady(histogram) => {
                for wheel in &self.wheels {
                    wheel.set_histogram(histogram.clone());
                }
            }
            AppMsg::ImageLoaded { source } => {
                self.status = format!("Showing {}", source);
            }
            AppMsg::DecodeFailed { source, reason } => {
                self.status = format!("Could not load {}: {}", source, reason);
            }
            AppMsg::ConfigReload => match config::load_config() {
                Ok(new_config) => {
                    let geometry = new_config.wheel.geometry();
                    for wheel in &self.wheels {
                        wheel.set_geometry(geometry);
                    }
                    self.source.set_view_size(new_config.view_size);
                    self.harmonized.set_view_size(new_config.view_size);
                    log::info!("Configuration reloaded");
                }
                Err(e) => log::error!("Failed to reload config: {}", e),
            },
            AppMsg::SelectTemplate(index) => {
                let Some(kind) = TemplateKind::from_index(index as usize) else {
                    return;
                };
                self.template = kind;
                self.wheel_stack.set_visible_child_name(&kind.to_string());
                if let Some(wheel) = self.wheels.iter().find(|w| w.template() == kind) {
                    log::debug!("Showing {} template at {:.3} rad", kind, wheel.rotation());
                }
            }
            AppMsg::Open(path) => {
                self.source.set_path(path.as_deref());
                self.harmonized.set_path(path.as_deref());
                self.status = match &path {
                    Some(path) => format!("Loading {}", path.display()),
                    None => String::from("Showing placeholder"),
                };
            }
            AppMsg::SurfaceFailed(e) => {
                log::error!("Render surface failed: {}", e);
                relm4::main_application().quit();
            }
            AppMsg::Quit => relm4::main_application().quit(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_background_events_map_to_messages() {
        let msg = AppMsg::from(AppEvent::DecodeFailed {
            source: "a.png".into(),
            reason: "truncated".into(),
        });
        assert!(matches!(
            msg,
            AppMsg::DecodeFailed { ref source, ref reason } if source == "a.png" && reason == "truncated"
        ));
        assert!(matches!(
            AppMsg::from(AppEvent::ImageLoaded { source: "b.jpg".into() }),
            AppMsg::ImageLoaded { ref source } if source == "b.jpg"
        ));
        assert!(matches!(
            AppMsg::from(AppEvent::ConfigReload),
            AppMsg::ConfigReload
        ));
        assert!(matches!(
            AppMsg::from(AppEvent::HistogramReady(Histogram::empty())),
            AppMsg::HistogramReady(_)
        ));
    }

    #[test]
    fn test_stack_pages_are_named_by_template() {
        let names: Vec<String> = TemplateKind::iter().map(|k| k.to_string()).collect();
        let index = TemplateKind::X.as_index();
        assert_eq!(names[index], "X-type");
        assert_eq!(TemplateKind::from_index(index), Some(TemplateKind::X));
    }
}
