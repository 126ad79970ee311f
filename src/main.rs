use clap::Parser;
use harmonist::config;
use harmonist::gui::app::{AppInit, AppModel};
use harmonist::sys::runtime;
use huewheel::TemplateKind;
use relm4::prelude::*;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Image to analyse; the placeholder is shown when omitted
    image: Option<PathBuf>,

    /// Template shown at start-up (e.g. "V" or "X-type")
    #[arg(short, long)]
    template: Option<TemplateKind>,

    /// Longest side images are shrunk to before display
    #[arg(long)]
    view_size: Option<u32>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut config = config::load_or_default();
    if let Some(template) = cli.template {
        config.template = template;
    }
    if let Some(view_size) = cli.view_size {
        config.view_size = view_size;
    }

    let (tx, rx) = async_channel::bounded(32);

    // Start Background Services
    let runtime = runtime::start_background_services(tx.clone())?;

    // arguments are already consumed by clap
    let app = RelmApp::new("org.harmonist.Harmonist").with_args(Vec::new());

    app.run::<AppModel>(AppInit {
        config,
        image: cli.image,
        runtime,
        events_tx: tx,
        events: rx,
    });
    Ok(())
}
