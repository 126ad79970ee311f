use crate::events::AppEvent;
use async_channel::Sender;
use huewheel::{DecodedImage, Handoff, Histogram, ImageError};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

pub const PLACEHOLDER_SIZE: u32 = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    File(PathBuf),
    Placeholder,
}

impl fmt::Display for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Placeholder => f.write_str("placeholder"),
        }
    }
}

#[derive(Debug)]
pub struct Decoded {
    pub image: DecodedImage,
    pub histogram: Option<Histogram>,
}

pub fn decode(
    source: &ImageSource,
    view_size: u32,
    create_histogram: bool,
) -> Result<Decoded, ImageError> {
    let image = match source {
        ImageSource::File(path) => DecodedImage::load_thumbnail(path, view_size)?,
        ImageSource::Placeholder => DecodedImage::placeholder(PLACEHOLDER_SIZE.min(view_size)),
    };
    let histogram = create_histogram.then(|| Histogram::compute(&image));
    Ok(Decoded { image, histogram })
}

/// Runs decodes for one image view on the background runtime. Every request
/// gets a generation number and only the newest request may publish, so a
/// slow decode finishing late never replaces a newer image.
#[derive(Debug, Clone)]
pub struct Loader {
    runtime: Handle,
    events: Sender<AppEvent>,
    view_size: u32,
    create_histogram: bool,
    generation: Arc<AtomicU64>,
}

impl Loader {
    pub fn new(
        runtime: Handle,
        events: Sender<AppEvent>,
        view_size: u32,
        create_histogram: bool,
    ) -> Self {
        Self {
            runtime,
            events,
            view_size,
            create_histogram,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn set_view_size(&mut self, view_size: u32) {
        self.view_size = view_size;
    }

    pub fn spawn(&self, source: ImageSource, pending: Handoff<DecodedImage>) -> JoinHandle<()> {
        log::info!("Loading {}", source);
        self.runtime.spawn_blocking(self.task(source, pending))
    }

    fn task(
        &self,
        source: ImageSource,
        pending: Handoff<DecodedImage>,
    ) -> impl FnOnce() + Send + use<> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let latest = self.generation.clone();
        let events = self.events.clone();
        let (view_size, create_histogram) = (self.view_size, self.create_histogram);

        move || {
            let result = decode(&source, view_size, create_histogram);
            let is_latest = || latest.load(Ordering::SeqCst) == generation;

            match result {
                Ok(Decoded { image, histogram }) => {
                    let size = image.size();
                    if !pending.publish_if(image, is_latest) {
                        log::debug!("Discarding superseded decode of {}", source);
                        return;
                    }
                    log::debug!("Decoded {} at {}x{}", source, size.0, size.1);

                    if let Some(histogram) = histogram
                        && is_latest()
                    {
                        send(&events, AppEvent::HistogramReady(histogram));
                    }
                    send(
                        &events,
                        AppEvent::ImageLoaded {
                            source: source.to_string(),
                        },
                    );
                }
                Err(e) if is_latest() => {
                    log::error!("Failed to load {}: {}", source, e);
                    send(
                        &events,
                        AppEvent::DecodeFailed {
                            source: source.to_string(),
                            reason: e.to_string(),
                        },
                    );
                }
                Err(e) => log::debug!("Ignoring superseded failure for {}: {}", source, e),
            }
        }
    }
}

fn send(events: &Sender<AppEvent>, event: AppEvent) {
    if let Err(e) = events.send_blocking(event) {
        log::warn!("Dropped {:?}: no listener", e.into_inner());
    }
}
