use huewheel::Histogram;

/// Messages from background work to the GTK main loop.
#[derive(Debug, Clone)]
pub enum AppEvent {
    HistogramReady(Histogram),
    ImageLoaded { source: String },
    DecodeFailed { source: String, reason: String },
    ConfigReload,
}
