use std::path::PathBuf;

use clap::Parser;
use gr_core::charset::IntensityRamp;
use gr_core::config::RenderConfig;

/// glyphreel — live character-art rendering of video playback.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Source visuelle : chemin vers une vidéo (ffmpeg/ffprobe requis dans PATH).
    #[arg(long)]
    pub video: Option<PathBuf>,

    /// Source visuelle : chemin vers une image (PNG, JPEG, BMP, GIF).
    #[arg(long)]
    pub image: Option<PathBuf>,

    /// Fichier de configuration TOML. Défaut : config/default.toml.
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: PathBuf,

    /// Largeur de sortie en cellules (clampée aux bornes de la config).
    #[arg(short, long)]
    pub resolution: Option<u32>,

    /// Rampe de glyphes, du plus clair au plus dense.
    #[arg(long)]
    pub charset: Option<String>,

    /// Cadence de rafraîchissement pendant la lecture.
    #[arg(long)]
    pub fps: Option<u32>,

    /// Convertir une seule frame, l'écrire sur stdout et quitter.
    #[arg(long, default_value_t = false)]
    pub once: bool,

    /// Position de départ en secondes.
    #[arg(long)]
    pub seek: Option<f64>,

    /// Niveau de log : error, warn, info, debug, trace.
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

/// Command-line values that take precedence over the config file.
///
/// Kept separately so a hot reload of the file can re-apply them.
#[derive(Clone, Debug, Default)]
pub struct Overrides {
    pub resolution: Option<u32>,
    pub charset: Option<String>,
    pub fps: Option<u32>,
}

impl Overrides {
    /// Apply onto `config`, then re-clamp.
    ///
    /// # Errors
    /// Returns an error if the charset override is not a valid ramp.
    ///
    /// # Example
    /// ```
    /// use gr_app::cli::Overrides;
    /// use gr_core::config::RenderConfig;
    ///
    /// let overrides = Overrides { resolution: Some(1000), ..Overrides::default() };
    /// let mut config = RenderConfig::default();
    /// overrides.apply(&mut config).unwrap();
    /// assert_eq!(config.resolution, 300);
    /// ```
    pub fn apply(&self, config: &mut RenderConfig) -> anyhow::Result<()> {
        if let Some(ref charset) = self.charset {
            IntensityRamp::new(charset)?;
            config.charset.clone_from(charset);
        }
        if let Some(v) = self.resolution {
            config.resolution = v;
        }
        if let Some(v) = self.fps {
            config.target_fps = v;
        }
        config.clamp_all();
        Ok(())
    }
}

impl Cli {
    /// Validate that exactly one visual source is provided.
    ///
    /// # Errors
    /// Returns an error if zero or more than one source is specified.
    pub fn validate_source(&self) -> anyhow::Result<()> {
        match (self.video.is_some(), self.image.is_some()) {
            (false, false) => {
                anyhow::bail!("Aucune source visuelle spécifiée. Utilisez --video ou --image.")
            }
            (true, true) => {
                anyhow::bail!("Une seule source visuelle à la fois : --video OU --image.")
            }
            _ => Ok(()),
        }
    }

    /// Overrides carried by this command line.
    #[must_use]
    pub fn overrides(&self) -> Overrides {
        Overrides {
            resolution: self.resolution,
            charset: self.charset.clone(),
            fps: self.fps,
        }
    }
}
