//! Procedural sound cues
//!
//! Three short synthesized tones (land, perfect, game over), no sample files.
//! Each cue is described as a [`ToneSpec`]; an [`AudioOutput`] backend turns
//! that into sound. On wasm32 the backend is Web Audio, created lazily on the
//! first user gesture as browsers require.

use std::cell::RefCell;
use std::rc::Rc;

/// Shared handle the engine and the input handlers both hold
pub type AudioHandle = Rc<RefCell<AudioManager>>;

/// Perfect-cue pitch stops rising after this combo
const PERFECT_PITCH_COMBO_CAP: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Triangle,
    Sawtooth,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ramp {
    Linear,
    Exponential,
}

/// A single oscillator with a frequency sweep and a gain envelope
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneSpec {
    pub waveform: Waveform,
    pub freq_start: f32,
    /// Sweep target, `None` holds the start frequency
    pub freq_end: Option<f32>,
    pub freq_ramp: Ramp,
    pub gain_start: f32,
    pub gain_end: f32,
    pub gain_ramp: Ramp,
    /// Seconds until the oscillator stops
    pub duration: f64,
}

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundCue {
    /// Imperfect landing: short thud
    Land,
    /// Perfect landing: chime pitched by combo
    Perfect { combo: u32 },
    /// Run over: descending buzz
    GameOver,
}

impl SoundCue {
    pub fn tone(self) -> ToneSpec {
        match self {
            SoundCue::Land => ToneSpec {
                waveform: Waveform::Triangle,
                freq_start: 150.0,
                freq_end: Some(40.0),
                freq_ramp: Ramp::Exponential,
                gain_start: 0.15,
                gain_end: 0.01,
                gain_ramp: Ramp::Exponential,
                duration: 0.1,
            },
            SoundCue::Perfect { combo } => ToneSpec {
                waveform: Waveform::Sine,
                freq_start: 440.0 + combo.min(PERFECT_PITCH_COMBO_CAP) as f32 * 80.0,
                freq_end: None,
                freq_ramp: Ramp::Exponential,
                gain_start: 0.25,
                gain_end: 0.01,
                gain_ramp: Ramp::Exponential,
                duration: 0.3,
            },
            SoundCue::GameOver => ToneSpec {
                waveform: Waveform::Sawtooth,
                freq_start: 100.0,
                freq_end: Some(30.0),
                freq_ramp: Ramp::Linear,
                gain_start: 0.3,
                gain_end: 0.0,
                gain_ramp: Ramp::Linear,
                duration: 0.5,
            },
        }
    }
}

/// Something that can play a cue
pub trait AudioOutput {
    fn play(&mut self, cue: SoundCue);

    /// Called on every user gesture; browsers suspend audio until one happens
    fn resume(&mut self) {}
}

/// Backend that only logs; used on native and when Web Audio is unavailable
#[derive(Debug, Default)]
pub struct SilentOutput;

impl AudioOutput for SilentOutput {
    fn play(&mut self, cue: SoundCue) {
        log::trace!("audio cue {:?}", cue);
    }
}

/// Mute flag plus a lazily created output
pub struct AudioManager {
    output: Option<Box<dyn AudioOutput>>,
    muted: bool,
}

impl Default for AudioManager {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for AudioManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioManager")
            .field("initialized", &self.is_initialized())
            .field("muted", &self.muted)
            .finish()
    }
}

impl AudioManager {
    /// No output until [`AudioManager::init`] runs
    pub fn new() -> Self {
        Self {
            output: None,
            muted: false,
        }
    }

    pub fn handle(self) -> AudioHandle {
        Rc::new(RefCell::new(self))
    }

    /// Create the platform output on first call, resume it on every call.
    /// Must be triggered from a user gesture on the web.
    pub fn init(&mut self) {
        if self.output.is_none() {
            self.output = Some(platform_output());
        }
        if let Some(output) = &mut self.output {
            output.resume();
        }
    }

    /// Install a specific backend instead of the platform default
    pub fn init_with(&mut self, output: Box<dyn AudioOutput>) {
        self.output = Some(output);
    }

    pub fn is_initialized(&self) -> bool {
        self.output.is_some()
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Fire-and-forget; silently dropped while muted or uninitialized
    pub fn play(&mut self, cue: SoundCue) {
        if self.muted {
            return;
        }
        let Some(output) = &mut self.output else {
            return;
        };
        output.play(cue);
    }

    pub fn play_land(&mut self) {
        self.play(SoundCue::Land);
    }

    pub fn play_perfect(&mut self, combo: u32) {
        self.play(SoundCue::Perfect { combo });
    }

    pub fn play_game_over(&mut self) {
        self.play(SoundCue::GameOver);
    }
}

#[cfg(target_arch = "wasm32")]
fn platform_output() -> Box<dyn AudioOutput> {
    match web::WebAudioOutput::new() {
        Some(output) => Box::new(output),
        None => {
            log::warn!("Failed to create AudioContext - audio disabled");
            Box::new(SilentOutput)
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn platform_output() -> Box<dyn AudioOutput> {
    Box::new(SilentOutput)
}

#[cfg(target_arch = "wasm32")]
mod web {
    use web_sys::{AudioContext, AudioParam, GainNode, OscillatorNode, OscillatorType};

    use super::{AudioOutput, Ramp, SoundCue, Waveform};

    /// Web Audio backend
    pub struct WebAudioOutput {
        ctx: AudioContext,
    }

    impl WebAudioOutput {
        pub fn new() -> Option<Self> {
            AudioContext::new().ok().map(|ctx| Self { ctx })
        }

        /// Create an oscillator wired through a gain node to the speakers
        fn create_osc(&self, freq: f32, osc_type: OscillatorType) -> Option<(OscillatorNode, GainNode)> {
            let osc = self.ctx.create_oscillator().ok()?;
            let gain = self.ctx.create_gain().ok()?;

            osc.set_type(osc_type);
            osc.frequency().set_value(freq);
            osc.connect_with_audio_node(&gain).ok()?;
            gain.connect_with_audio_node(&self.ctx.destination()).ok()?;

            Some((osc, gain))
        }
    }

    fn ramp(param: &AudioParam, kind: Ramp, value: f32, at: f64) {
        match kind {
            Ramp::Linear => param.linear_ramp_to_value_at_time(value, at).ok(),
            Ramp::Exponential => param.exponential_ramp_to_value_at_time(value, at).ok(),
        };
    }

    impl AudioOutput for WebAudioOutput {
        fn play(&mut self, cue: SoundCue) {
            let tone = cue.tone();
            let osc_type = match tone.waveform {
                Waveform::Sine => OscillatorType::Sine,
                Waveform::Triangle => OscillatorType::Triangle,
                Waveform::Sawtooth => OscillatorType::Sawtooth,
            };
            let Some((osc, gain)) = self.create_osc(tone.freq_start, osc_type) else {
                return;
            };
            let t = self.ctx.current_time();
            let end = t + tone.duration;

            osc.frequency().set_value_at_time(tone.freq_start, t).ok();
            if let Some(freq_end) = tone.freq_end {
                ramp(&osc.frequency(), tone.freq_ramp, freq_end, end);
            }
            gain.gain().set_value_at_time(tone.gain_start, t).ok();
            ramp(&gain.gain(), tone.gain_ramp, tone.gain_end, end);

            osc.start().ok();
            osc.stop_with_when(end).ok();
        }

        fn resume(&mut self) {
            if self.ctx.state() == web_sys::AudioContextState::Suspended {
                let _ = self.ctx.resume();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Records cues instead of playing them
    struct Recorder(Rc<RefCell<Vec<SoundCue>>>);

    impl AudioOutput for Recorder {
        fn play(&mut self, cue: SoundCue) {
            self.0.borrow_mut().push(cue);
        }
    }

    fn recording_manager() -> (AudioManager, Rc<RefCell<Vec<SoundCue>>>) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut manager = AudioManager::new();
        manager.init_with(Box::new(Recorder(log.clone())));
        (manager, log)
    }

    #[test]
    fn test_silent_before_init() {
        let mut manager = AudioManager::new();
        assert!(!manager.is_initialized());
        manager.play_land();
        manager.init();
        assert!(manager.is_initialized());
        // Second init keeps the same output
        manager.init();
        assert!(manager.is_initialized());
    }

    #[test]
    fn test_muted_drops_cues() {
        let (mut manager, log) = recording_manager();
        manager.set_muted(true);
        manager.play_perfect(3);
        manager.play_game_over();
        assert!(log.borrow().is_empty());

        manager.set_muted(false);
        manager.play_land();
        assert_eq!(*log.borrow(), vec![SoundCue::Land]);
    }

    #[test]
    fn test_perfect_pitch_rises_then_caps() {
        let f = |combo| SoundCue::Perfect { combo }.tone().freq_start;
        assert_eq!(f(0), 440.0);
        assert_eq!(f(1), 520.0);
        assert_eq!(f(10), 1240.0);
        assert_eq!(f(25), 1240.0);
    }

    #[test]
    fn test_cue_shapes() {
        let land = SoundCue::Land.tone();
        assert_eq!(land.waveform, Waveform::Triangle);
        assert_eq!(land.freq_end, Some(40.0));
        assert_eq!(land.freq_ramp, Ramp::Exponential);

        let over = SoundCue::GameOver.tone();
        assert_eq!(over.waveform, Waveform::Sawtooth);
        assert_eq!(over.gain_end, 0.0);
        assert_eq!(over.gain_ramp, Ramp::Linear);
        assert_eq!(over.duration, 0.5);
    }
}
