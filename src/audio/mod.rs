pub mod time;
pub mod waveform;

pub use time::FixedTime;

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

/// Output sample rate in Hz.
pub const SAMPLE_RATE: u32 = 44_100;
/// Output channel count (mono).
pub const CHANNELS: u16 = 1;
/// Number of callback durations kept by [`CallbackStats`].
pub const CALLBACK_HISTORY: usize = 64;

/// Weight of the newest duration in the moving average.
const AVERAGE_WEIGHT: f32 = 0.1;

/// User callback: fill the buffer with mono `f32` samples.
pub type AudioCallback = Box<dyn FnMut(&mut [f32]) + Send + 'static>;

static AUDIO_LIVE: AtomicBool = AtomicBool::new(false);

// ── AudioError ────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub enum AudioError {
    /// Another [`Audio`] is alive.
    AlreadyExists,
    /// [`Audio::setup`] already succeeded on this instance.
    AlreadySetup,
    NoDevice,
    /// The device cannot play 44.1 kHz mono `f32`.
    UnsupportedFormat,
    QueryConfigs(cpal::SupportedStreamConfigsError),
    BuildStream(cpal::BuildStreamError),
    PlayStream(cpal::PlayStreamError),
}

impl std::fmt::Display for AudioError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AudioError::AlreadyExists => write!(f, "only one Audio may exist at a time"),
            AudioError::AlreadySetup => write!(f, "audio is already set up"),
            AudioError::NoDevice => write!(f, "no audio output device"),
            AudioError::UnsupportedFormat => {
                write!(f, "device cannot play {SAMPLE_RATE} Hz, {CHANNELS} channel f32 audio")
            }
            AudioError::QueryConfigs(e) => write!(f, "could not query output configs: {e}"),
            AudioError::BuildStream(e) => write!(f, "could not open output stream: {e}"),
            AudioError::PlayStream(e) => write!(f, "could not start output stream: {e}"),
        }
    }
}

impl std::error::Error for AudioError {}

/// Format of an open stream.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct AudioSpec {
    pub sample_rate: u32,
    pub channels: u16,
}

// ── CallbackStats ─────────────────────────────────────────────────────────────

/// Timing and output diagnostics written by the audio thread.
///
/// Single writer (the stream callback), any number of readers. Durations and
/// the moving average are atomics; the last-buffer copy is skipped whenever a
/// reader holds it, so the writer never waits.
#[derive(Debug)]
pub struct CallbackStats {
    times: [AtomicU32; CALLBACK_HISTORY],
    /// Slot the next duration goes into, which is also the oldest entry.
    head: AtomicUsize,
    average: AtomicU32,
    last_buffer: Mutex<Vec<f32>>,
}

impl Default for CallbackStats {
    fn default() -> Self {
        Self {
            times: std::array::from_fn(|_| AtomicU32::new(0.0f32.to_bits())),
            head: AtomicUsize::new(0),
            average: AtomicU32::new(0.0f32.to_bits()),
            last_buffer: Mutex::new(Vec::new()),
        }
    }
}

impl CallbackStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one callback duration in seconds: evicts the oldest entry and
    /// folds `dt` into the moving average (`avg = 0.9·avg + 0.1·dt`).
    pub fn record_duration(&self, dt: f32) {
        let head = self.head.load(Ordering::Relaxed);
        self.times[head].store(dt.to_bits(), Ordering::Relaxed);
        self.head.store((head + 1) % CALLBACK_HISTORY, Ordering::Release);

        let avg = f32::from_bits(self.average.load(Ordering::Relaxed));
        let avg = (1.0 - AVERAGE_WEIGHT) * avg + AVERAGE_WEIGHT * dt;
        self.average.store(avg.to_bits(), Ordering::Release);
    }

    /// Keep a copy of the samples just emitted.
    pub fn record_buffer(&self, samples: &[f32]) {
        if let Ok(mut last) = self.last_buffer.try_lock() {
            last.clear();
            last.extend_from_slice(samples);
        }
    }

    /// Moving average of callback durations, in seconds.
    pub fn average_callback_time(&self) -> f32 {
        f32::from_bits(self.average.load(Ordering::Acquire))
    }

    /// The last [`CALLBACK_HISTORY`] durations, oldest first. Slots never
    /// written read as zero.
    pub fn callback_times(&self) -> [f32; CALLBACK_HISTORY] {
        let head = self.head.load(Ordering::Acquire);
        std::array::from_fn(|i| {
            let slot = (head + i) % CALLBACK_HISTORY;
            f32::from_bits(self.times[slot].load(Ordering::Relaxed))
        })
    }

    /// Copy of the last emitted buffer.
    pub fn last_buffer(&self) -> Vec<f32> {
        self.last_buffer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Body of the stream callback: run the user callback, then record the
/// emitted samples and how long that took.
fn bootstrap(callback: &mut AudioCallback, stats: &CallbackStats, data: &mut [f32]) {
    let start = Instant::now();
    callback(data);
    stats.record_buffer(data);
    let micros = start.elapsed().as_micros();
    stats.record_duration(micros as f32 * 0.000_001);
}

/// Whether `range` can play 44.1 kHz mono `f32`.
fn format_supported(range: &cpal::SupportedStreamConfigRange) -> bool {
    let rate = cpal::SampleRate(SAMPLE_RATE);
    range.sample_format() == cpal::SampleFormat::F32
        && range.channels() == CHANNELS
        && range.min_sample_rate() <= rate
        && rate <= range.max_sample_rate()
}

/// Pick the stream config from the device's supported ranges. There is no
/// fallback format.
fn negotiate<I>(configs: I) -> Result<cpal::StreamConfig, AudioError>
where
    I: IntoIterator<Item = cpal::SupportedStreamConfigRange>,
{
    if !configs.into_iter().any(|range| format_supported(&range)) {
        return Err(AudioError::UnsupportedFormat);
    }
    Ok(cpal::StreamConfig {
        channels: CHANNELS,
        sample_rate: cpal::SampleRate(SAMPLE_RATE),
        buffer_size: cpal::BufferSize::Default,
    })
}

// ── Audio ─────────────────────────────────────────────────────────────────────

/// Owner of the single audio output stream.
///
/// Only one `Audio` may be alive at a time; dropping it closes the stream
/// and allows a new one.
pub struct Audio {
    stream: Option<cpal::Stream>,
    spec: Option<AudioSpec>,
    stats: Arc<CallbackStats>,
}

impl Audio {
    /// Claim the audio slot. Fails if another `Audio` is alive.
    pub fn new() -> Result<Self, AudioError> {
        if AUDIO_LIVE
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            log::error!("Can't have multiple Audios!");
            return Err(AudioError::AlreadyExists);
        }
        Ok(Self {
            stream: None,
            spec: None,
            stats: Arc::new(CallbackStats::new()),
        })
    }

    /// Open the default output device at 44.1 kHz mono `f32` and start
    /// calling `callback` from the device's own thread.
    ///
    /// Fails without retrying if the device cannot honour that format
    /// exactly. Once a setup has succeeded, further calls are rejected.
    pub fn setup<F>(&mut self, callback: F) -> Result<(), AudioError>
    where
        F: FnMut(&mut [f32]) + Send + 'static,
    {
        self.ensure_not_setup()?;
        self.open(Box::new(callback)).inspect_err(|e| {
            log::error!("Could not set up audio: {e}");
        })
    }

    fn ensure_not_setup(&self) -> Result<(), AudioError> {
        if self.spec.is_some() {
            log::error!("Can't setup Audio multiple times!");
            return Err(AudioError::AlreadySetup);
        }
        Ok(())
    }

    fn open(&mut self, mut callback: AudioCallback) -> Result<(), AudioError> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(AudioError::NoDevice)?;
        let configs = device
            .supported_output_configs()
            .map_err(AudioError::QueryConfigs)?;
        let config = negotiate(configs)?;

        let stats = Arc::clone(&self.stats);
        let stream = device
            .build_output_stream(
                &config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    bootstrap(&mut callback, &stats, data);
                },
                |e| log::error!("Audio stream error: {e}"),
                None,
            )
            .map_err(AudioError::BuildStream)?;
        stream.play().map_err(AudioError::PlayStream)?;

        log::info!("Audio running at {SAMPLE_RATE} Hz, {CHANNELS} channel(s)");
        self.spec = Some(AudioSpec { sample_rate: SAMPLE_RATE, channels: CHANNELS });
        self.stream = Some(stream);
        Ok(())
    }

    /// Format of the open stream, if any.
    pub fn spec(&self) -> Option<AudioSpec> {
        self.spec
    }

    pub fn is_running(&self) -> bool {
        self.stream.is_some()
    }

    /// Diagnostics shared with the stream callback.
    pub fn stats(&self) -> &Arc<CallbackStats> {
        &self.stats
    }
}

impl Drop for Audio {
    fn drop(&mut self) {
        if let Some(stream) = self.stream.take() {
            if let Err(e) = stream.pause() {
                log::warn!("Could not pause audio stream: {e}");
            }
        }
        AUDIO_LIVE.store(false, Ordering::Release);
    }
}
