use crate::config::GlVersion;
use gtk::prelude::*;
use gtk4 as gtk;
use std::cell::{Cell, RefCell};
use std::ffi::c_void;
use std::rc::Rc;
use std::sync::OnceLock;
use thiserror::Error;

pub mod quad;

pub use quad::QuadRenderer;

#[cfg(all(unix, not(target_os = "macos")))]
const EPOXY_LIBRARY: &str = "libepoxy.so.0";
#[cfg(target_os = "macos")]
const EPOXY_LIBRARY: &str = "libepoxy.0.dylib";
#[cfg(windows)]
const EPOXY_LIBRARY: &str = "libepoxy-0.dll";

static EPOXY: OnceLock<libloading::Library> = OnceLock::new();

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("GL context unavailable: {0}")]
    Context(#[from] glib::Error),
    #[error("Failed to load libepoxy: {0}")]
    Loader(#[from] libloading::Error),
    #[error("Out of GPU resources creating {resource}: {reason}")]
    GpuResourceExhaustion {
        resource: &'static str,
        reason: String,
    },
    #[error("{stage} shader failed to compile: {log}")]
    ShaderCompile { stage: &'static str, log: String },
    #[error("Shader program failed to link: {0}")]
    ShaderLink(String),
}

/// Something that draws into a GL context owned by a widget. Every method runs
/// on the GTK main thread with that context current.
pub trait RenderSurface {
    /// Creates GPU resources. Called once, when the surface is realized.
    fn load(&mut self, gl: &glow::Context) -> Result<(), RenderError>;

    fn resize(&mut self, gl: &glow::Context, width: i32, height: i32);

    fn render(&mut self, gl: &glow::Context) -> Result<(), RenderError>;

    /// Per-frame hook for time-based animation.
    fn update(&mut self) {}

    /// Releases GPU resources before the context goes away.
    fn unload(&mut self, _gl: &glow::Context) {}
}

/// Binds `renderer` to a new `GLArea`. The first error the renderer raises is
/// handed to `on_error` and the surface stops drawing.
pub fn attach<R: RenderSurface + 'static>(
    renderer: Rc<RefCell<R>>,
    version: GlVersion,
    on_error: impl Fn(RenderError) + 'static,
) -> gtk::GLArea {
    let area = gtk::GLArea::new();
    area.set_required_version(version.major, version.minor);
    area.set_has_depth_buffer(false);
    area.set_auto_render(true);

    let context: Rc<RefCell<Option<glow::Context>>> = Rc::new(RefCell::new(None));
    let failed = Rc::new(Cell::new(false));
    let on_error: Rc<dyn Fn(RenderError)> = Rc::new(on_error);

    {
        let (renderer, context, failed, on_error) =
            (renderer.clone(), context.clone(), failed.clone(), on_error.clone());
        area.connect_realize(move |area| {
            area.make_current();
            let loaded = area
                .error()
                .map_or(Ok(()), |e| Err(RenderError::from(e)))
                .and_then(|()| load_gl())
                .and_then(|gl| {
                    renderer.borrow_mut().load(&gl)?;
                    Ok(gl)
                });

            match loaded {
                Ok(gl) => {
                    failed.set(false);
                    *context.borrow_mut() = Some(gl);
                }
                Err(e) => {
                    failed.set(true);
                    on_error(e);
                }
            }
        });
    }

    {
        let (renderer, context) = (renderer.clone(), context.clone());
        area.connect_resize(move |_, width, height| {
            if let Some(gl) = context.borrow().as_ref() {
                renderer.borrow_mut().resize(gl, width, height);
            }
        });
    }

    {
        let (renderer, context, failed) = (renderer.clone(), context.clone(), failed.clone());
        area.connect_render(move |_, _| {
            if failed.get() {
                return glib::Propagation::Stop;
            }
            if let Some(gl) = context.borrow().as_ref() {
                let mut renderer = renderer.borrow_mut();
                renderer.update();
                if let Err(e) = renderer.render(gl) {
                    failed.set(true);
                    on_error(e);
                }
            }
            glib::Propagation::Stop
        });
    }

    area.connect_unrealize(move |area| {
        area.make_current();
        if let Some(gl) = context.borrow_mut().take() {
            renderer.borrow_mut().unload(&gl);
        }
    });

    area
}

/// Resolves GL entry points through libepoxy, which GTK itself uses. Each
/// `epoxy_<name>` symbol is a dispatch pointer that picks the right function
/// for whichever context is current.
fn load_gl() -> Result<glow::Context, RenderError> {
    let library = match EPOXY.get() {
        Some(library) => library,
        None => {
            let library = unsafe { libloading::Library::new(EPOXY_LIBRARY) }?;
            EPOXY.get_or_init(|| library)
        }
    };

    let resolve = |name: &str| {
        let symbol = format!("epoxy_{}", name);
        unsafe { library.get::<*const *const c_void>(symbol.as_bytes()) }
            .map(|dispatch| unsafe { **dispatch })
            .unwrap_or(std::ptr::null())
    };
    Ok(unsafe { glow::Context::from_loader_function(resolve) })
}
