use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use arc_swap::ArcSwap;
use clap::Parser;
use gr_app::app::App;
use gr_app::cli::Cli;
use gr_app::driver::PlaybackDriver;
use gr_app::hotreload;
use gr_core::config::RenderConfig;
use gr_core::traits::MediaSource;
use gr_source::image::ImageSource;
use gr_source::video::VideoSource;

/// `--once` n'a qu'une frame : on l'attend plus longtemps.
const ONCE_STILL_TIMEOUT: Duration = Duration::from_secs(2);

fn main() -> Result<()> {
    // 1. Parser CLI
    let cli = Cli::parse();

    // 2. Initialiser le logging
    env_logger::Builder::new()
        .filter_level(cli.log_level.parse().unwrap_or(log::LevelFilter::Warn))
        .init();

    // 3. Valider la source
    cli.validate_source()?;

    // 4. Charger la config puis appliquer les overrides CLI
    let overrides = cli.overrides();
    let mut config = resolve_config(&cli.config)?;
    overrides.apply(&mut config)?;

    // 5. Ouvrir la source visuelle
    let (source, name) = open_source(&cli)?;

    if cli.once {
        return render_once(&config, source, cli.seek);
    }

    let config = Arc::new(ArcSwap::from_pointee(config));
    let overrides = Arc::new(ArcSwap::from_pointee(overrides));

    // 6. Hot-reload, seulement si le fichier existe
    let _watcher = if cli.config.exists() {
        Some(hotreload::spawn_config_watcher(&cli.config, &overrides, &config)?)
    } else {
        None
    };

    // 7. Construire l'App et charger la source (une conversion)
    let mut app_instance = App::new(Arc::clone(&config), overrides, name)?;
    app_instance.driver.load(source);
    if let Some(pos) = cli.seek {
        app_instance.driver.seek(pos);
    }

    // 8. Initialiser le terminal ratatui
    let terminal = ratatui::init();

    // 9. Boucle principale
    let result = app_instance.run(terminal);

    // 10. Restaurer le terminal (TOUJOURS, même en cas d'erreur)
    ratatui::restore();

    result
}

/// Load `path` if present, defaults otherwise.
fn resolve_config(path: &Path) -> Result<RenderConfig> {
    if path.exists() {
        gr_core::config::load_config(path)
    } else {
        log::warn!(
            "Config introuvable : {}. Utilisation des défauts.",
            path.display()
        );
        Ok(RenderConfig::default())
    }
}

/// Open the source named on the command line, with a display name.
fn open_source(cli: &Cli) -> Result<(Box<dyn MediaSource>, String)> {
    let (source, path): (Box<dyn MediaSource>, &Path) = if let Some(ref path) = cli.video {
        let mut video = VideoSource::open(path)?;
        if cli.once {
            video.set_still_timeout(ONCE_STILL_TIMEOUT);
        }
        (Box::new(video), path)
    } else if let Some(ref path) = cli.image {
        (Box::new(ImageSource::new(path)?), path)
    } else {
        anyhow::bail!("Aucune source visuelle spécifiée.");
    };
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .map_or_else(|| path.display().to_string(), String::from);
    Ok((source, name))
}

/// `--once`: convert a single frame and print it to stdout.
fn render_once(config: &RenderConfig, source: Box<dyn MediaSource>, seek: Option<f64>) -> Result<()> {
    let mut driver = PlaybackDriver::new(config)?;
    driver.load(source);
    if let Some(pos) = seek {
        driver.seek(pos);
    }
    if let Some(e) = driver.last_error() {
        return Err(e.clone()).context("Aucune frame convertie");
    }
    let text = driver
        .frame_text()
        .context("Aucune frame convertie")?;
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(text.as_str().as_bytes())?;
    stdout.flush()?;
    Ok(())
}
