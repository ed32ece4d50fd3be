use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use arc_swap::ArcSwap;
use gr_core::config::RenderConfig;
use notify::{Event, EventKind, RecursiveMode, Watcher};

use crate::cli::Overrides;

/// Reload `path`, re-apply the overrides, and publish the result.
///
/// On failure the previous configuration stays in place.
///
/// # Errors
/// Returns an error if the file cannot be read, parsed or overridden.
pub fn reload_into(
    path: &Path,
    overrides: &Overrides,
    config: &ArcSwap<RenderConfig>,
) -> Result<()> {
    let mut next = gr_core::config::load_config(path)?;
    overrides.apply(&mut next)?;
    config.store(Arc::new(next));
    Ok(())
}

/// Lance un watcher qui surveille le fichier config et met à jour l'ArcSwap.
///
/// Chaque rechargement ré-applique l'état courant de `overrides` (CLI et
/// réglages clavier). Retourne le Watcher (doit rester vivant tant que l'app
/// tourne).
///
/// # Errors
/// Returns an error if the watcher cannot be created or the path cannot be watched.
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use arc_swap::ArcSwap;
/// use gr_app::cli::Overrides;
/// use gr_app::hotreload::spawn_config_watcher;
/// use gr_core::config::RenderConfig;
/// use std::path::Path;
///
/// let config = Arc::new(ArcSwap::from_pointee(RenderConfig::default()));
/// let overrides = Arc::new(ArcSwap::from_pointee(Overrides::default()));
/// let _watcher = spawn_config_watcher(Path::new("config/default.toml"), &overrides, &config);
/// ```
pub fn spawn_config_watcher(
    config_path: &Path,
    overrides: &Arc<ArcSwap<Overrides>>,
    config: &Arc<ArcSwap<RenderConfig>>,
) -> Result<impl Watcher + use<>> {
    let config = Arc::clone(config);
    let overrides = Arc::clone(overrides);
    let path = config_path.to_path_buf();

    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
        if let Ok(event) = res
            && matches!(event.kind, EventKind::Modify(_))
        {
            match reload_into(&path, &overrides.load(), &config) {
                Ok(()) => log::info!("Config rechargée depuis {}", path.display()),
                Err(e) => log::warn!("Erreur de rechargement config : {e:#}"),
            }
        }
    })?;

    watcher.watch(config_path, RecursiveMode::NonRecursive)?;
    Ok(watcher)
}
