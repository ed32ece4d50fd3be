use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use arc_swap::ArcSwap;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use gr_core::charset::PRESETS;
use gr_core::config::RenderConfig;
use ratatui::DefaultTerminal;
use ratatui::layout::{Constraint, Layout};
use ratatui::style::{Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::Paragraph;

use crate::cli::Overrides;
use crate::driver::{PlaybackDriver, PlaybackState};
use crate::ticker::RefreshTicker;

/// Pas de seek clavier, en secondes.
const SEEK_STEP: f64 = 5.0;

/// Pas de résolution clavier, en cellules.
const RESOLUTION_STEP: u32 = 10;

/// Attente d'événement quand aucun ticker ne tourne.
const IDLE_POLL: Duration = Duration::from_millis(50);

/// Terminal front-end: hosts the refresh ticker and displays frame text.
pub struct App {
    /// Playback state machine and conversion pipeline.
    pub driver: PlaybackDriver,
    /// Config courante (partagée avec le watcher de hot-reload).
    pub config: Arc<ArcSwap<RenderConfig>>,
    /// CLI overrides plus keyboard changes, re-applied by every hot reload.
    pub overrides: Arc<ArcSwap<Overrides>>,
    /// Name shown in the status line.
    pub source_name: String,
    ticker: Option<RefreshTicker>,
    ticker_fps: u32,
    applied: Option<Arc<RenderConfig>>,
    quitting: bool,
    dirty: bool,
}

impl App {
    /// Build an idle app.
    ///
    /// # Errors
    /// Returns an error if the configured charset is invalid.
    pub fn new(
        config: Arc<ArcSwap<RenderConfig>>,
        overrides: Arc<ArcSwap<Overrides>>,
        source_name: String,
    ) -> Result<Self> {
        let driver = PlaybackDriver::new(&config.load())?;
        Ok(Self {
            driver,
            config,
            overrides,
            source_name,
            ticker: None,
            ticker_fps: 0,
            applied: None,
            quitting: false,
            dirty: true,
        })
    }

    /// Main event loop.
    ///
    /// # Errors
    /// Returns an error if terminal operations fail.
    pub fn run(&mut self, mut terminal: DefaultTerminal) -> Result<()> {
        while !self.quitting {
            self.sync_config();
            self.sync_ticker()?;

            // Rester réactif au clavier sans dépasser un quart de période.
            let timeout = self
                .ticker
                .as_ref()
                .map_or(IDLE_POLL, |t| t.period() / 4);
            if event::poll(timeout)? {
                self.handle_event(&event::read()?);
                while event::poll(Duration::ZERO)? {
                    self.handle_event(&event::read()?);
                }
                continue;
            }

            if self.ticker.as_ref().is_some_and(RefreshTicker::try_tick) && self.driver.tick() {
                self.dirty = true;
            }
            if self.driver.poll_late_frame() {
                self.dirty = true;
            }

            if self.dirty {
                self.dirty = false;
                terminal.draw(|frame| self.draw(frame))?;
            }
        }
        self.stop_ticker();
        Ok(())
    }

    /// Apply the shared config snapshot to the driver, between ticks.
    fn sync_config(&mut self) {
        let config = self.config.load_full();
        if self.applied.as_ref().is_some_and(|a| Arc::ptr_eq(a, &config)) {
            return;
        }
        let before = self.driver.conversions();
        if let Err(e) = self.driver.apply_config(&config) {
            log::warn!("Config ignorée : {e:#}");
        }
        if self.driver.conversions() != before {
            self.dirty = true;
        }
        self.applied = Some(config);
    }

    /// Ticker runs exactly while the driver is playing. Any previous ticker
    /// is cancelled before a new one starts.
    fn sync_ticker(&mut self) -> Result<()> {
        let fps = self.config.load().target_fps;
        let playing = self.driver.state() == PlaybackState::Playing;
        match (&self.ticker, playing) {
            (Some(_), false) => self.stop_ticker(),
            (Some(_), true) if fps != self.ticker_fps => {
                self.stop_ticker();
                self.start_ticker(fps)?;
            }
            (None, true) => self.start_ticker(fps)?,
            _ => {}
        }
        Ok(())
    }

    fn start_ticker(&mut self, fps: u32) -> Result<()> {
        self.ticker = Some(RefreshTicker::start(fps)?);
        self.ticker_fps = fps;
        Ok(())
    }

    fn stop_ticker(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.cancel();
        }
    }

    fn handle_event(&mut self, event: &Event) {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_key(key),
            Event::Resize(..) => self.dirty = true,
            _ => {}
        }
    }

    fn handle_key(&mut self, key: &KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.quitting = true,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.quitting = true;
            }
            KeyCode::Char(' ') => self.driver.toggle(),
            KeyCode::Left => self.driver.seek_by(-SEEK_STEP),
            KeyCode::Right => self.driver.seek_by(SEEK_STEP),
            KeyCode::Home => self.driver.seek(0.0),
            KeyCode::Char('+' | '=') => self.step_resolution(true),
            KeyCode::Char('-') => self.step_resolution(false),
            KeyCode::Char('c') => self.cycle_charset(),
            _ => {}
        }
        // Redessiner aussi pour l'état (pause/lecture) même sans conversion.
        self.dirty = true;
    }

    fn step_resolution(&self, up: bool) {
        self.update_overrides(|o, c| {
            let next = if up {
                c.resolution.saturating_add(RESOLUTION_STEP)
            } else {
                c.resolution.saturating_sub(RESOLUTION_STEP)
            };
            o.resolution = Some(c.clamp_resolution(next));
        });
    }

    fn cycle_charset(&self) {
        self.update_overrides(|o, c| {
            let current = PRESETS.iter().position(|p| *p == c.charset);
            let next = current.map_or(0, |i| (i + 1) % PRESETS.len());
            o.charset = Some(PRESETS[next].to_string());
        });
    }

    /// Record a keyboard change as an override, then publish the config
    /// with it applied. Overrides are stored first so a concurrent reload
    /// already sees them.
    fn update_overrides(&self, mutate: impl FnOnce(&mut Overrides, &RenderConfig)) {
        let config = self.config.load_full();
        let mut overrides = (**self.overrides.load()).clone();
        mutate(&mut overrides, &config);
        let mut next = (*config).clone();
        if let Err(e) = overrides.apply(&mut next) {
            log::warn!("Réglage clavier ignoré : {e:#}");
            return;
        }
        self.overrides.store(Arc::new(overrides));
        self.config.store(Arc::new(next));
    }

    fn status_line(&self) -> String {
        let state = match self.driver.state() {
            PlaybackState::Idle => "—",
            PlaybackState::Paused => "⏸",
            PlaybackState::Playing => "▶",
        };
        let geometry = self
            .driver
            .geometry()
            .map_or_else(|| "?".to_string(), |g| g.to_string());
        let mut line = format!(
            " {state} {:>7.1}s │ {} │ {geometry} · {} glyphes │ espace lecture · ←/→ seek · +/- résolution · c rampe · q quitter",
            self.driver.position(),
            self.source_name,
            self.driver.ramp().len(),
        );
        if let Some(err) = self.driver.last_error() {
            line.push_str(&format!(" │ {err}"));
        }
        line
    }

    fn draw(&self, frame: &mut ratatui::Frame) {
        let [canvas, status] =
            Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(frame.area());
        let text = self.driver.frame_text().map_or("", |t| t.as_str());
        frame.render_widget(Paragraph::new(text), canvas);
        frame.render_widget(
            Paragraph::new(Line::from(self.status_line()))
                .style(Style::default().add_modifier(Modifier::REVERSED)),
            status,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gr_core::frame::FrameBuffer;
    use gr_core::traits::{MediaSource, Source};
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Endless gray clip whose end-of-stream is raised by the test.
    struct Clip {
        ended: Arc<AtomicBool>,
        position: f64,
    }

    impl Source for Clip {
        fn current_frame(&mut self) -> Option<Arc<FrameBuffer>> {
            Some(Arc::new(FrameBuffer::filled(64, 36, (200, 200, 200))))
        }

        fn native_size(&self) -> (u32, u32) {
            (640, 360)
        }
    }

    impl MediaSource for Clip {
        fn play(&mut self) {}

        fn pause(&mut self) {}

        fn seek(&mut self, pos_secs: f64) {
            self.position = pos_secs;
        }

        fn position(&self) -> f64 {
            self.position
        }

        fn take_ended(&mut self) -> bool {
            self.ended.swap(false, Ordering::Relaxed)
        }
    }

    fn app() -> App {
        App::new(
            Arc::new(ArcSwap::from_pointee(RenderConfig::default())),
            Arc::new(ArcSwap::from_pointee(Overrides::default())),
            "clip.mp4".to_string(),
        )
        .unwrap()
    }

    fn loaded() -> (App, Arc<AtomicBool>) {
        let mut app = app();
        let ended = Arc::new(AtomicBool::new(false));
        app.driver.load(Box::new(Clip {
            ended: Arc::clone(&ended),
            position: 0.0,
        }));
        (app, ended)
    }

    fn press(app: &mut App, c: char) {
        app.handle_key(&KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE));
    }

    #[test]
    fn ticker_runs_only_while_playing() {
        let mut idle = app();
        idle.sync_ticker().unwrap();
        assert!(idle.ticker.is_none());

        let (mut app, _ended) = loaded();
        app.sync_ticker().unwrap();
        assert!(app.ticker.is_none());

        press(&mut app, ' ');
        app.sync_ticker().unwrap();
        assert_eq!(app.driver.state(), PlaybackState::Playing);
        assert_eq!(app.ticker_fps, 60);
        assert_eq!(
            app.ticker.as_ref().map(RefreshTicker::period),
            Some(Duration::from_nanos(16_666_666))
        );

        press(&mut app, ' ');
        app.sync_ticker().unwrap();
        assert_eq!(app.driver.state(), PlaybackState::Paused);
        assert!(app.ticker.is_none());
    }

    #[test]
    fn fps_change_restarts_ticker() {
        let (mut app, _ended) = loaded();
        press(&mut app, ' ');
        app.sync_ticker().unwrap();

        app.config.store(Arc::new(RenderConfig {
            target_fps: 30,
            ..RenderConfig::default()
        }));
        app.sync_config();
        app.sync_ticker().unwrap();
        assert_eq!(app.ticker_fps, 30);
        assert_eq!(
            app.ticker.as_ref().map(RefreshTicker::period),
            Some(Duration::from_nanos(33_333_333))
        );
    }

    #[test]
    fn end_of_source_cancels_ticker() {
        let (mut app, ended) = loaded();
        press(&mut app, ' ');
        app.sync_ticker().unwrap();
        assert!(app.ticker.is_some());

        ended.store(true, Ordering::Relaxed);
        assert!(app.driver.tick());
        assert_eq!(app.driver.state(), PlaybackState::Paused);
        app.sync_ticker().unwrap();
        assert!(app.ticker.is_none());
    }

    #[test]
    fn keyboard_changes_survive_hot_reload() {
        let (mut app, _ended) = loaded();
        press(&mut app, '+');
        press(&mut app, 'c');
        assert_eq!(app.config.load().resolution, 160);
        assert_eq!(app.config.load().charset, PRESETS[1]);
        assert_eq!(app.overrides.load().resolution, Some(160));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("glyphreel.toml");
        std::fs::write(&path, "[render]\nresolution = 100\ntarget_fps = 24\n").unwrap();
        crate::hotreload::reload_into(&path, &app.overrides.load(), &app.config).unwrap();

        let config = app.config.load();
        assert_eq!(config.resolution, 160);
        assert_eq!(config.charset, PRESETS[1]);
        assert_eq!(config.target_fps, 24);

        app.sync_config();
        assert_eq!(app.driver.resolution(), 160);
        assert_eq!(app.driver.ramp().len(), PRESETS[1].chars().count());
    }

    #[test]
    fn resolution_keys_stop_at_bounds() {
        let (mut app, _ended) = loaded();
        for _ in 0..30 {
            press(&mut app, '-');
        }
        assert_eq!(app.config.load().resolution, 50);
        assert_eq!(app.overrides.load().resolution, Some(50));
    }

    #[test]
    fn status_line_shows_state_and_ramp() {
        let (app, _ended) = loaded();
        let line = app.status_line();
        assert!(line.contains('⏸'));
        assert!(line.contains("clip.mp4"));
        assert!(line.contains("10 glyphes"));
    }
}
