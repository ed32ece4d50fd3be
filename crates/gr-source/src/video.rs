// Décodage vidéo via ffmpeg en subprocess (std::process::Command).
// Prérequis : `ffmpeg` et `ffprobe` accessibles dans PATH.
//
// Architecture :
//   - `probe_video`       : interroge ffprobe pour obtenir width/height/fps/durée
//   - `spawn_ffmpeg_pipe` : lance ffmpeg → flux raw RGBA sur stdout
//   - `decoder_loop`      : thread dédié, lit les frames, gère les commandes
//   - `VideoSource`       : côté consommateur, implémente `MediaSource`
//
// Chaque seek incrémente une époque ; les frames d'une époque antérieure
// encore en vol dans le canal sont ignorées par le consommateur.

use anyhow::{Context, Result};
use flume::{Receiver, RecvTimeoutError, Sender};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use gr_core::frame::FrameBuffer;
use gr_core::traits::{MediaSource, Source};

/// Taille du pool de frames pré-allouées.
/// Doit être > capacité du canal pour garantir un slot libre sans allocation.
const POOL_SIZE: usize = 6;

/// Capacité du canal d'événements décodeur → consommateur.
const EVENT_CAPACITY: usize = 3;

/// Largeur maximale décodée. Le sampler réduit ensuite à la grille.
const MAX_DECODE_WIDTH: u32 = 640;

/// Attente par défaut de la première frame après un chargement ou un seek.
/// Une frame plus tardive est signalée par `take_late_frame`.
const STILL_TIMEOUT: Duration = Duration::from_millis(50);

/// Commandes interactives pour le thread décodeur.
///
/// # Example
/// ```
/// use gr_source::video::VideoCommand;
/// let cmd = VideoCommand::Seek { pos_secs: 5.0, epoch: 1 };
/// assert!(matches!(cmd, VideoCommand::Seek { .. }));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VideoCommand {
    /// Reprendre la lecture.
    Play,
    /// Mettre en pause.
    Pause,
    /// Aller à une position absolue et démarrer une nouvelle époque.
    Seek {
        /// Position cible en secondes.
        pos_secs: f64,
        /// Époque des frames produites après ce seek.
        epoch: u64,
    },
    /// Arrêter le thread proprement.
    Quit,
}

/// Messages du thread décodeur.
#[derive(Debug, Clone)]
enum VideoEvent {
    Frame {
        epoch: u64,
        pts: f64,
        frame: Arc<FrameBuffer>,
    },
    Ended {
        epoch: u64,
    },
}

/// Métadonnées extraites via ffprobe.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VideoInfo {
    pub width: u32,
    pub height: u32,
    /// Images par seconde (ex: 23.976, 24.0, 30.0, 60.0).
    pub fps: f64,
    /// Durée du flux si ffprobe la connaît.
    pub duration: Option<f64>,
}

impl VideoInfo {
    /// Decode size: native size scaled down to at most `MAX_DECODE_WIDTH`
    /// columns, aspect ratio preserved.
    ///
    /// # Example
    /// ```
    /// use gr_source::video::VideoInfo;
    /// let info = VideoInfo { width: 1920, height: 1080, fps: 24.0, duration: None };
    /// assert_eq!(info.decode_size(), (640, 360));
    /// ```
    #[must_use]
    pub fn decode_size(&self) -> (u32, u32) {
        if self.width <= MAX_DECODE_WIDTH {
            return (self.width, self.height);
        }
        let h = (f64::from(self.height) * f64::from(MAX_DECODE_WIDTH) / f64::from(self.width))
            .round()
            .max(1.0) as u32;
        (MAX_DECODE_WIDTH, h)
    }
}

/// Interroge `ffprobe` pour obtenir les métadonnées du flux vidéo principal.
///
/// # Errors
/// Retourne une erreur si `ffprobe` est introuvable ou si le fichier
/// ne contient aucun flux vidéo décodable.
pub fn probe_video(path: &Path) -> Result<VideoInfo> {
    let path_str = path.to_str().context("Chemin vidéo invalide (non-UTF8)")?;

    let output = Command::new("ffprobe")
        .args([
            "-v",
            "quiet",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=width,height,r_frame_rate,duration",
            "-of",
            "default=noprint_wrappers=1",
            "-i",
            path_str,
        ])
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .output()
        .context(
            "Impossible de lancer ffprobe. Vérifiez que ffprobe est installé et dans le PATH.",
        )?;

    let info = parse_probe_output(&String::from_utf8_lossy(&output.stdout))
        .with_context(|| format!("ffprobe: aucun flux vidéo dans {}", path.display()))?;

    log::info!(
        "probe_video: {}x{} @ {:.3}fps — {}",
        info.width,
        info.height,
        info.fps,
        path.display()
    );
    Ok(info)
}

/// Parse `key=value` lines printed by ffprobe.
///
/// # Errors
/// Returns an error if width or height is missing or zero.
///
/// # Example
/// ```
/// use gr_source::video::parse_probe_output;
/// let info = parse_probe_output("width=1280\nheight=720\nr_frame_rate=30000/1001\n").unwrap();
/// assert_eq!((info.width, info.height), (1280, 720));
/// assert!((info.fps - 29.97).abs() < 0.01);
/// ```
pub fn parse_probe_output(text: &str) -> Result<VideoInfo> {
    let mut width: u32 = 0;
    let mut height: u32 = 0;
    let mut fps: f64 = 30.0;
    let mut duration = None;

    for line in text.lines() {
        if let Some(val) = line.strip_prefix("width=") {
            width = val.trim().parse().unwrap_or(0);
        } else if let Some(val) = line.strip_prefix("height=") {
            height = val.trim().parse().unwrap_or(0);
        } else if let Some(val) = line.strip_prefix("r_frame_rate=") {
            // Format: "24/1" ou "30000/1001"
            let mut parts = val.trim().splitn(2, '/');
            let num: f64 = parts.next().and_then(|s| s.parse().ok()).unwrap_or(30.0);
            let den: f64 = parts.next().and_then(|s| s.parse().ok()).unwrap_or(1.0);
            if den > 0.0 && num > 0.0 {
                fps = num / den;
            }
        } else if let Some(val) = line.strip_prefix("duration=") {
            duration = val.trim().parse::<f64>().ok().filter(|d| *d > 0.0);
        }
    }

    if width == 0 || height == 0 {
        anyhow::bail!("dimensions absentes ({width}x{height})");
    }
    Ok(VideoInfo {
        width,
        height,
        fps,
        duration,
    })
}

/// Lance un processus `ffmpeg` qui écrit des frames RGBA brutes sur stdout.
///
/// Chaque frame = `w × h × 4` bytes (RGBA row-major, sans padding).
/// `-ss` avant `-i` = seek rapide keyframe-based.
///
/// Retourne `None` si le spawn échoue (log::warn émis).
#[must_use]
pub fn spawn_ffmpeg_pipe(
    path: &Path,
    w: u32,
    h: u32,
    pos_secs: f64,
    target_fps: u32,
) -> Option<Child> {
    let Some(path_str) = path.to_str() else {
        log::warn!("spawn_ffmpeg_pipe: chemin non-UTF8");
        return None;
    };

    let scale_filter = format!("scale={w}:{h}:flags=bilinear");
    let fps_str = target_fps.to_string();
    let pos_str = format!("{pos_secs:.3}");

    match Command::new("ffmpeg")
        .args([
            "-ss",
            &pos_str,
            "-i",
            path_str,
            "-vf",
            &scale_filter,
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-r",
            &fps_str,
            "-an",
            "-hide_banner",
            "-loglevel",
            "error",
            "pipe:1",
        ])
        .stdout(Stdio::piped())
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
    {
        Ok(child) => {
            log::debug!("ffmpeg spawné: {w}x{h} @ {target_fps}fps depuis {pos_secs:.1}s");
            Some(child)
        }
        Err(e) => {
            log::warn!("spawn_ffmpeg_pipe: impossible de lancer ffmpeg: {e}");
            None
        }
    }
}

/// Lit exactement `buf.len()` bytes depuis `reader`.
///
/// # Errors
/// Retourne `Ok(true)` si lu avec succès, `Ok(false)` sur EOF avant complétion,
/// `Err` sur erreur I/O fatale.
pub fn read_exact_or_eof<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<bool> {
    let mut total = 0usize;
    while total < buf.len() {
        match reader.read(&mut buf[total..]) {
            Ok(0) => return Ok(false),
            Ok(n) => total += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(true)
}

/// État mutable centralisé du thread décodeur.
struct DecoderState {
    w: u32,
    h: u32,
    fps: f64,
    pos_secs: f64,
    is_paused: bool,
    /// Une frame doit être lue même en pause (chargement ou seek).
    still_pending: bool,
    /// Fin de flux atteinte depuis le dernier seek.
    at_eof: bool,
    epoch: u64,
    pool: Vec<Arc<FrameBuffer>>,
}

impl DecoderState {
    fn new(info: &VideoInfo) -> Self {
        let (w, h) = info.decode_size();
        let pool = (0..POOL_SIZE)
            .map(|_| Arc::new(FrameBuffer::new(w, h)))
            .collect();
        Self {
            w,
            h,
            fps: info.fps.clamp(1.0, 120.0),
            pos_secs: 0.0,
            is_paused: true,
            still_pending: true,
            at_eof: false,
            epoch: 0,
            pool,
        }
    }

    fn target_fps(&self) -> u32 {
        self.fps.round() as u32
    }
}

/// Trouve un slot libre dans le pool, ou en alloue un.
///
/// Invariant : retourne un index `i` tel que `Arc::strong_count(&pool[i]) == 1`.
fn find_or_create_slot(pool: &mut Vec<Arc<FrameBuffer>>, w: u32, h: u32) -> usize {
    if let Some(i) = pool.iter().position(|a| Arc::strong_count(a) == 1) {
        i
    } else {
        pool.push(Arc::new(FrameBuffer::new(w, h)));
        pool.len() - 1
    }
}

fn kill_child(child: &mut Option<Child>) {
    if let Some(mut c) = child.take() {
        let _ = c.kill();
        let _ = c.wait();
    }
}

/// Retourne `true` si le thread doit quitter (Quit reçu ou canal déconnecté).
fn process_commands(
    cmd_rx: &Receiver<VideoCommand>,
    state: &mut DecoderState,
    child: &mut Option<Child>,
    path: &Path,
) -> bool {
    loop {
        match cmd_rx.try_recv() {
            Ok(VideoCommand::Quit) | Err(flume::TryRecvError::Disconnected) => {
                kill_child(child);
                log::info!("Thread vidéo: arrêt demandé.");
                return true;
            }
            Ok(VideoCommand::Pause) => {
                state.is_paused = true;
                log::debug!("Thread vidéo: Pause");
            }
            Ok(VideoCommand::Play) => {
                state.is_paused = false;
                log::debug!("Thread vidéo: Play");
            }
            Ok(VideoCommand::Seek { pos_secs, epoch }) => {
                state.pos_secs = pos_secs.max(0.0);
                state.epoch = epoch;
                state.at_eof = false;
                state.still_pending = true;
                kill_child(child);
                *child = spawn_ffmpeg_pipe(
                    path,
                    state.w,
                    state.h,
                    state.pos_secs,
                    state.target_fps(),
                );
                log::debug!("Thread vidéo: Seek -> {:.1}s (époque {epoch})", state.pos_secs);
            }
            Err(flume::TryRecvError::Empty) => return false,
        }
    }
}

/// Boucle principale du thread décodeur.
fn decoder_loop(
    path: &Path,
    event_tx: &Sender<VideoEvent>,
    cmd_rx: &Receiver<VideoCommand>,
    info: VideoInfo,
) {
    let mut state = DecoderState::new(&info);
    let frame_period = Duration::from_secs_f64(1.0 / state.fps);
    let mut child = spawn_ffmpeg_pipe(path, state.w, state.h, 0.0, state.target_fps());
    let mut last_frame = Instant::now();

    loop {
        if process_commands(cmd_rx, &mut state, &mut child, path) {
            return;
        }

        let wants_frame = state.still_pending || !state.is_paused;
        if !wants_frame || state.at_eof {
            thread::sleep(Duration::from_millis(10));
            continue;
        }

        // === Timing FPS (sauf frame fixe demandée) ===
        if !state.still_pending
            && let Some(remaining) = frame_period.checked_sub(last_frame.elapsed())
        {
            thread::sleep(remaining.min(Duration::from_millis(10)));
            continue;
        }
        last_frame = Instant::now();

        if child.is_none() {
            child = spawn_ffmpeg_pipe(path, state.w, state.h, state.pos_secs, state.target_fps());
            if child.is_none() {
                thread::sleep(Duration::from_millis(100));
                continue;
            }
        }

        let frame_bytes = state.w as usize * state.h as usize * 4;
        let idx = find_or_create_slot(&mut state.pool, state.w, state.h);
        let Some(fb) = Arc::get_mut(&mut state.pool[idx]) else {
            continue;
        };

        let read_result = child
            .as_mut()
            .and_then(|c| c.stdout.as_mut())
            .map_or(Ok(false), |stdout| {
                read_exact_or_eof(stdout, &mut fb.data[..frame_bytes])
            });

        let event = match read_result {
            Ok(true) => {
                let event = VideoEvent::Frame {
                    epoch: state.epoch,
                    pts: state.pos_secs,
                    frame: Arc::clone(&state.pool[idx]),
                };
                state.pos_secs += 1.0 / state.fps;
                state.still_pending = false;
                event
            }
            Ok(false) => {
                log::info!("Thread vidéo: EOF à {:.1}s.", state.pos_secs);
                kill_child(&mut child);
                state.at_eof = true;
                state.is_paused = true;
                state.still_pending = false;
                VideoEvent::Ended { epoch: state.epoch }
            }
            Err(e) => {
                log::warn!("Thread vidéo: erreur lecture pipe: {e}");
                kill_child(&mut child);
                thread::sleep(Duration::from_millis(100));
                continue;
            }
        };

        if event_tx.send(event).is_err() {
            kill_child(&mut child);
            return;
        }
    }
}

/// Video file decoded by an `ffmpeg` subprocess on a dedicated thread.
///
/// Starts paused at position 0 with the first frame requested.
pub struct VideoSource {
    info: VideoInfo,
    cmd_tx: Sender<VideoCommand>,
    /// `Option` so `Drop` can disconnect it before joining the thread.
    event_rx: Option<Receiver<VideoEvent>>,
    handle: Option<thread::JoinHandle<()>>,
    epoch: u64,
    latest: Option<Arc<FrameBuffer>>,
    position: f64,
    ended: bool,
    awaiting_frame: bool,
    /// `wait_for_still` a expiré avant la frame demandée.
    missed_still: bool,
    still_timeout: Duration,
}

impl VideoSource {
    /// Probe `path` and spawn the decoder thread.
    ///
    /// # Errors
    /// Retourne une erreur si `ffprobe` est introuvable, si le fichier est
    /// invalide ou si le thread ne peut pas être créé.
    pub fn open(path: &Path) -> Result<Self> {
        let info = probe_video(path)?;
        let (event_tx, event_rx) = flume::bounded(EVENT_CAPACITY);
        let (cmd_tx, cmd_rx) = flume::bounded(16);
        let owned: PathBuf = path.to_path_buf();

        let handle = thread::Builder::new()
            .name("gr-video".to_string())
            .spawn(move || {
                decoder_loop(&owned, &event_tx, &cmd_rx, info);
                log::info!("Thread vidéo terminé proprement.");
            })
            .context("Impossible de spawner le thread vidéo")?;

        Ok(Self::from_parts(info, cmd_tx, event_rx, Some(handle)))
    }

    fn from_parts(
        info: VideoInfo,
        cmd_tx: Sender<VideoCommand>,
        event_rx: Receiver<VideoEvent>,
        handle: Option<thread::JoinHandle<()>>,
    ) -> Self {
        Self {
            info,
            cmd_tx,
            event_rx: Some(event_rx),
            handle,
            epoch: 0,
            latest: None,
            position: 0.0,
            ended: false,
            awaiting_frame: true,
            missed_still: false,
            still_timeout: STILL_TIMEOUT,
        }
    }

    /// How long `current_frame` blocks for the frame requested by a load or
    /// seek. One-shot rendering raises it so the single frame is not missed.
    pub fn set_still_timeout(&mut self, timeout: Duration) {
        self.still_timeout = timeout;
    }

    fn send(&self, cmd: VideoCommand) {
        if self.cmd_tx.send(cmd).is_err() {
            log::warn!("Thread vidéo déconnecté, commande {cmd:?} perdue.");
        }
    }

    /// Apply one decoder event. Returns `true` if it was current.
    fn accept(&mut self, event: VideoEvent) -> bool {
        match event {
            VideoEvent::Frame { epoch, pts, frame } if epoch == self.epoch => {
                self.latest = Some(frame);
                self.position = pts;
                self.awaiting_frame = false;
                true
            }
            VideoEvent::Ended { epoch } if epoch == self.epoch => {
                self.ended = true;
                self.awaiting_frame = false;
                true
            }
            _ => false,
        }
    }

    /// Drain pending decoder events without blocking.
    fn drain(&mut self) {
        let Some(rx) = self.event_rx.clone() else {
            return;
        };
        while let Ok(event) = rx.try_recv() {
            self.accept(event);
        }
    }

    /// Block until a current-epoch event arrives or `still_timeout` elapses.
    fn wait_for_still(&mut self) {
        let Some(rx) = self.event_rx.clone() else {
            return;
        };
        let timeout = self.still_timeout;
        let deadline = Instant::now() + timeout;
        while self.awaiting_frame {
            match rx.recv_deadline(deadline) {
                Ok(event) => {
                    self.accept(event);
                }
                Err(RecvTimeoutError::Timeout) => {
                    log::debug!("Pas de frame après {timeout:?}, on garde la précédente.");
                    self.missed_still = true;
                    break;
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
    }
}

impl Source for VideoSource {
    fn current_frame(&mut self) -> Option<Arc<FrameBuffer>> {
        if self.awaiting_frame {
            self.wait_for_still();
        }
        self.drain();
        if !self.awaiting_frame {
            self.missed_still = false;
        }
        self.latest.clone()
    }

    fn native_size(&self) -> (u32, u32) {
        (self.info.width, self.info.height)
    }
}

impl MediaSource for VideoSource {
    fn play(&mut self) {
        self.send(VideoCommand::Play);
    }

    fn pause(&mut self) {
        self.send(VideoCommand::Pause);
    }

    fn seek(&mut self, pos_secs: f64) {
        let pos_secs = match self.info.duration {
            Some(d) => pos_secs.clamp(0.0, d),
            None => pos_secs.max(0.0),
        };
        self.epoch += 1;
        self.position = pos_secs;
        self.ended = false;
        self.awaiting_frame = true;
        self.missed_still = false;
        self.send(VideoCommand::Seek {
            pos_secs,
            epoch: self.epoch,
        });
    }

    fn position(&self) -> f64 {
        self.position
    }

    fn take_ended(&mut self) -> bool {
        self.drain();
        std::mem::take(&mut self.ended)
    }

    fn take_late_frame(&mut self) -> bool {
        self.drain();
        if self.missed_still && !self.awaiting_frame {
            self.missed_still = false;
            return true;
        }
        false
    }
}

impl Drop for VideoSource {
    fn drop(&mut self) {
        let _ = self.cmd_tx.send(VideoCommand::Quit);
        // Débloque un `send` en attente côté décodeur.
        self.event_rx = None;
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn info() -> VideoInfo {
        VideoInfo {
            width: 1920,
            height: 1080,
            fps: 24.0,
            duration: Some(10.0),
        }
    }

    /// Source wired to in-test channels instead of a decoder thread.
    fn detached() -> (VideoSource, Sender<VideoEvent>, Receiver<VideoCommand>) {
        let (event_tx, event_rx) = flume::bounded(8);
        let (cmd_tx, cmd_rx) = flume::unbounded();
        (
            VideoSource::from_parts(info(), cmd_tx, event_rx, None),
            event_tx,
            cmd_rx,
        )
    }

    fn frame(epoch: u64, pts: f64, value: u8) -> VideoEvent {
        VideoEvent::Frame {
            epoch,
            pts,
            frame: Arc::new(FrameBuffer::filled(4, 4, (value, value, value))),
        }
    }

    #[test]
    fn parse_probe_with_duration() {
        let info = parse_probe_output(
            "width=1920\nheight=1080\nr_frame_rate=24/1\nduration=12.500000\n",
        )
        .unwrap();
        assert_eq!(info, info_with(12.5));
    }

    fn info_with(duration: f64) -> VideoInfo {
        VideoInfo {
            width: 1920,
            height: 1080,
            fps: 24.0,
            duration: Some(duration),
        }
    }

    #[test]
    fn parse_probe_rejects_missing_stream() {
        assert!(parse_probe_output("").is_err());
        assert!(parse_probe_output("width=0\nheight=720\n").is_err());
        let info = parse_probe_output("width=64\nheight=48\nduration=N/A\n").unwrap();
        assert_eq!(info.duration, None);
        assert!((info.fps - 30.0).abs() < f64::EPSILON);
    }

    #[test]
    fn decode_size_keeps_small_sources() {
        let small = VideoInfo {
            width: 320,
            height: 240,
            fps: 30.0,
            duration: None,
        };
        assert_eq!(small.decode_size(), (320, 240));
        assert_eq!(info().decode_size(), (640, 360));
    }

    #[test]
    fn read_exact_or_eof_detects_short_reads() {
        let mut full = Cursor::new(vec![7u8; 8]);
        let mut buf = [0u8; 8];
        assert!(read_exact_or_eof(&mut full, &mut buf).unwrap());
        assert_eq!(buf, [7u8; 8]);

        let mut short = Cursor::new(vec![1u8; 3]);
        assert!(!read_exact_or_eof(&mut short, &mut buf).unwrap());
    }

    #[test]
    fn first_frame_is_awaited() {
        let (mut source, event_tx, _cmd_rx) = detached();
        event_tx.send(frame(0, 0.0, 9)).unwrap();
        let got = source.current_frame().unwrap();
        assert_eq!(&got.data[..4], &[9, 9, 9, 255]);
        assert_eq!(source.native_size(), (1920, 1080));
    }

    #[test]
    fn stale_frames_are_dropped_after_seek() {
        let (mut source, event_tx, cmd_rx) = detached();
        event_tx.send(frame(0, 0.0, 1)).unwrap();
        assert!(source.current_frame().is_some());

        source.seek(4.0);
        assert_eq!(
            cmd_rx.try_recv().unwrap(),
            VideoCommand::Seek {
                pos_secs: 4.0,
                epoch: 1
            }
        );
        event_tx.send(frame(0, 0.04, 2)).unwrap();
        event_tx.send(frame(1, 4.0, 3)).unwrap();

        let got = source.current_frame().unwrap();
        assert_eq!(&got.data[..4], &[3, 3, 3, 255]);
        assert!((source.position() - 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn frame_arriving_after_the_wait_is_flagged_once() {
        let (mut source, event_tx, _cmd_rx) = detached();
        source.set_still_timeout(Duration::from_millis(5));
        let start = Instant::now();
        assert!(source.current_frame().is_none());
        assert!(start.elapsed() < Duration::from_millis(500));
        assert!(!source.take_late_frame());

        event_tx.send(frame(0, 0.0, 7)).unwrap();
        assert!(source.take_late_frame());
        assert!(!source.take_late_frame());
        let got = source.current_frame().unwrap();
        assert_eq!(&got.data[..4], &[7, 7, 7, 255]);
    }

    #[test]
    fn seek_discards_a_pending_late_frame() {
        let (mut source, event_tx, _cmd_rx) = detached();
        source.set_still_timeout(Duration::from_millis(5));
        assert!(source.current_frame().is_none());
        source.seek(2.0);
        // Frame de l'époque précédente : ignorée, pas de rattrapage.
        event_tx.send(frame(0, 0.0, 7)).unwrap();
        assert!(!source.take_late_frame());
    }

    #[test]
    fn seek_is_clamped_to_duration() {
        let (mut source, _event_tx, cmd_rx) = detached();
        source.seek(99.0);
        assert!(matches!(
            cmd_rx.try_recv().unwrap(),
            VideoCommand::Seek { pos_secs, .. } if (pos_secs - 10.0).abs() < f64::EPSILON
        ));
        source.seek(-3.0);
        assert!(source.position().abs() < f64::EPSILON);
    }

    #[test]
    fn end_of_stream_is_reported_once() {
        let (mut source, event_tx, _cmd_rx) = detached();
        event_tx.send(frame(0, 0.0, 1)).unwrap();
        event_tx.send(VideoEvent::Ended { epoch: 0 }).unwrap();
        assert!(source.take_ended());
        assert!(!source.take_ended());

        // Un Ended d'une époque périmée est ignoré.
        source.seek(0.0);
        event_tx.send(VideoEvent::Ended { epoch: 0 }).unwrap();
        assert!(!source.take_ended());
    }

    #[test]
    fn transport_commands_reach_decoder() {
        let (mut source, _event_tx, cmd_rx) = detached();
        source.play();
        source.pause();
        assert_eq!(cmd_rx.try_recv().unwrap(), VideoCommand::Play);
        assert_eq!(cmd_rx.try_recv().unwrap(), VideoCommand::Pause);
    }

    #[test]
    fn pool_reuses_free_slots() {
        let mut pool = vec![Arc::new(FrameBuffer::new(2, 2))];
        let held = Arc::clone(&pool[0]);
        assert_eq!(find_or_create_slot(&mut pool, 2, 2), 1);
        drop(held);
        assert_eq!(find_or_create_slot(&mut pool, 2, 2), 0);
    }
}
