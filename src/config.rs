use crate::events::AppEvent;
use async_channel::Sender;
use directories::ProjectDirs;
use huewheel::TemplateKind;
use huewheel::wheel::{DEFAULT_RING_WIDTH, DEFAULT_ROTATION, DEFAULT_SIZE, RingGeometry};
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_VIEW_SIZE: u32 = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct GlVersion {
    pub major: i32,
    pub minor: i32,
}

impl Default for GlVersion {
    fn default() -> Self {
        Self { major: 3, minor: 3 }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct WheelConfig {
    pub size: u32,
    pub ring_width: u32,
    /// Initial template rotation in radians.
    pub rotation: f64,
}

impl WheelConfig {
    pub fn geometry(&self) -> RingGeometry {
        RingGeometry::new(self.size, self.ring_width.min(self.size / 2))
    }
}

impl Default for WheelConfig {
    fn default() -> Self {
        Self {
            size: DEFAULT_SIZE,
            ring_width: DEFAULT_RING_WIDTH,
            rotation: DEFAULT_ROTATION,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Decoded images are shrunk to fit a square of this side.
    pub view_size: u32,
    /// Template shown at start-up.
    pub template: TemplateKind,
    pub gl: GlVersion,
    pub wheel: WheelConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            view_size: DEFAULT_VIEW_SIZE,
            template: TemplateKind::LowerI,
            gl: GlVersion::default(),
            wheel: WheelConfig::default(),
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to determine config directory")]
    ConfigDirNotFound,
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Notify error: {0}")]
    Notify(#[from] notify::Error),
}

pub fn get_config_path() -> Result<PathBuf, ConfigError> {
    let proj_dirs = ProjectDirs::from("org", "harmonist", "harmonist")
        .ok_or(ConfigError::ConfigDirNotFound)?;
    Ok(proj_dirs.config_dir().join("config.toml"))
}

pub fn load_config() -> Result<Config, ConfigError> {
    load_from(&get_config_path()?)
}

/// Reads `path` if it exists, then lets `HARMONIST_*` variables override it
/// (`HARMONIST_WHEEL__RING_WIDTH=14`).
pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
    let s = config::Config::builder()
        .add_source(config::File::from(path).required(false))
        .add_source(
            config::Environment::with_prefix("HARMONIST")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    Ok(s.try_deserialize()?)
}

pub fn load_or_default() -> Config {
    load_config().unwrap_or_else(|e| {
        log::warn!("Using default configuration: {}", e);
        Config::default()
    })
}

pub async fn run_async_watcher(tx: Sender<AppEvent>) {
    if let Err(e) = watch_config(tx).await {
        log::error!("Config watcher error: {}", e);
    }
}

async fn watch_config(tx: Sender<AppEvent>) -> Result<(), ConfigError> {
    watch_file(get_config_path()?, tx).await
}

/// Deepest existing directory on the way to `path`.
fn nearest_existing(path: &Path) -> Option<PathBuf> {
    path.ancestors()
        .skip(1)
        .find(|dir| dir.is_dir())
        .map(Path::to_path_buf)
}

/// Sends `ConfigReload` whenever `config_path` changes. Until its directory
/// exists the closest existing ancestor is watched instead, moving down as
/// the missing directories appear.
async fn watch_file(config_path: PathBuf, tx: Sender<AppEvent>) -> Result<(), ConfigError> {
    let Some(mut watched) = nearest_existing(&config_path) else {
        log::debug!("Nothing to watch for {}", config_path.display());
        return Ok(());
    };

    let (bridge_tx, bridge_rx) = async_channel::unbounded();
    let mut watcher = RecommendedWatcher::new(
        move |res| {
            let _ = bridge_tx.send_blocking(res);
        },
        notify::Config::default(),
    )?;
    watcher.watch(&watched, RecursiveMode::NonRecursive)?;
    log::debug!("Watching {} for config changes", watched.display());

    while let Ok(res) = bridge_rx.recv().await {
        let event = match res {
            Ok(event) => event,
            Err(e) => {
                log::error!("Watch error: {}", e);
                continue;
            }
        };

        let mut reload = matches!(
            event.kind,
            EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_)
        ) && event.paths.iter().any(|p| p == &config_path);

        // a directory made before its watch was in place sends no event, so
        // keep descending until the watch is on the deepest one
        while let Some(nearest) = nearest_existing(&config_path)
            && nearest != watched
        {
            if let Err(e) = watcher.unwatch(&watched) {
                log::debug!("Unwatching {}: {}", watched.display(), e);
            }
            watcher.watch(&nearest, RecursiveMode::NonRecursive)?;
            log::debug!("Watching {} for config changes", nearest.display());
            watched = nearest;
            reload |= config_path.is_file();
        }

        if reload && tx.send(AppEvent::ConfigReload).await.is_err() {
            break;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use fs_err as fs;
    use std::time::Duration;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let json = r#"{ "template": "X-type", "wheel": { "ring_width": 14 } }"#;
        let config: Config = serde_json::from_str(json).unwrap();

        assert_eq!(config.template, TemplateKind::X);
        assert_eq!(config.wheel.ring_width, 14);
        assert_eq!(config.wheel.size, DEFAULT_SIZE);
        assert_eq!(config.view_size, DEFAULT_VIEW_SIZE);
        assert_eq!(config.gl, GlVersion { major: 3, minor: 3 });
    }

    #[test]
    fn test_load_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "view_size = 256\ntemplate = \"I\"\n\n[wheel]\nsize = 300\n",
        )
        .unwrap();

        let config = load_from(&path).unwrap();
        assert_eq!(config.view_size, 256);
        assert_eq!(config.template, TemplateKind::UpperI);
        assert_eq!(config.wheel.geometry(), RingGeometry::new(300, DEFAULT_RING_WIDTH));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.view_size, DEFAULT_VIEW_SIZE);
        assert_eq!(config.template, TemplateKind::LowerI);
    }

    #[test]
    fn test_ring_width_is_capped_by_size() {
        let wheel = WheelConfig {
            size: 40,
            ring_width: 100,
            rotation: 0.0,
        };
        assert_eq!(wheel.geometry().ring_width, 20);
    }

    #[test]
    fn test_nearest_existing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("a/b/config.toml");
        assert_eq!(nearest_existing(&config_path), Some(dir.path().to_path_buf()));

        fs::create_dir_all(dir.path().join("a/b")).unwrap();
        assert_eq!(nearest_existing(&config_path), Some(dir.path().join("a/b")));
    }

    #[test]
    fn test_watcher_picks_up_config_created_later() {
        let dir = tempfile::tempdir().unwrap();
        let config_dir = dir.path().join("harmonist/nested");
        let config_path = config_dir.join("config.toml");

        let runtime = tokio::runtime::Runtime::new().unwrap();
        let (tx, rx) = async_channel::unbounded();
        runtime.spawn(watch_file(config_path.clone(), tx));

        runtime.block_on(async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            fs::create_dir_all(&config_dir).unwrap();
            fs::write(&config_path, "view_size = 128\n").unwrap();

            let event = tokio::time::timeout(Duration::from_secs(5), rx.recv()).await;
            assert!(matches!(event, Ok(Ok(AppEvent::ConfigReload))));
        });
    }
}
