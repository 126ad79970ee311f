use crate::config::GlVersion;
use crate::events::AppEvent;
use crate::gui::gl::{self, QuadRenderer, RenderError};
use crate::sys::decoder::{ImageSource, Loader};
use async_channel::Sender;
use gtk::prelude::*;
use gtk4 as gtk;
use huewheel::{DecodedImage, Handoff};
use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;
use tokio::runtime::Handle;

#[derive(Debug, Clone, Copy)]
pub struct ImageViewOptions {
    pub view_size: u32,
    /// Broadcast the hue histogram of every image this view loads.
    pub create_histogram: bool,
    pub do_harmonization: bool,
    pub gl: GlVersion,
}

/// A GL surface showing one image. Decoding happens on the background runtime
/// and the texture is replaced on the next frame after it completes.
pub struct ImageView {
    area: gtk::GLArea,
    pending: Handoff<DecodedImage>,
    loader: Loader,
}

impl ImageView {
    pub fn new(
        options: ImageViewOptions,
        runtime: Handle,
        events: Sender<AppEvent>,
        on_error: impl Fn(RenderError) + 'static,
    ) -> Self {
        let (pending, redraw_requests) = Handoff::new();
        let renderer = Rc::new(RefCell::new(QuadRenderer::new(
            pending.clone(),
            options.do_harmonization,
        )));

        let area = gl::attach(renderer, options.gl, on_error);
        area.add_css_class("harmonist-image-view");
        area.set_hexpand(true);
        area.set_vexpand(true);

        let area_weak = area.downgrade();
        relm4::spawn_local(async move {
            while redraw_requests.recv().await.is_ok() {
                let Some(area) = area_weak.upgrade() else {
                    break;
                };
                area.queue_draw();
            }
        });

        let loader = Loader::new(runtime, events, options.view_size, options.create_histogram);

        Self {
            area,
            pending,
            loader,
        }
    }

    pub fn widget(&self) -> &gtk::GLArea {
        &self.area
    }

    /// Starts loading `path`, or the placeholder for `None` or an empty path.
    /// Returns immediately; the current image stays up until the new one is
    /// decoded.
    pub fn set_path(&self, path: Option<&Path>) {
        let source = match path {
            Some(path) if !path.as_os_str().is_empty() => ImageSource::File(path.to_path_buf()),
            _ => ImageSource::Placeholder,
        };
        self.loader.spawn(source, self.pending.clone());
    }

    /// Applies to images loaded after this call.
    pub fn set_view_size(&mut self, view_size: u32) {
        self.loader.set_view_size(view_size);
    }
}
