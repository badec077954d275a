//! Sound effects
//!
//! The simulation never plays sound itself. Events are mapped to effects
//! and handed to an `AudioSink`, fire-and-forget. On the web the sink is
//! `AudioManager`, which synthesizes every effect with Web Audio
//! oscillators, so there are no sound files to load.

use crate::sim::GameEvent;

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    /// Cat flew through a halo
    HaloCollect,
    /// Bird hit the cat
    BirdStrike,
    /// Descended past the ground line
    RoundComplete,
    /// Game over
    GameOver,
}

impl SoundEffect {
    /// Effect for a simulation event, if it makes a sound
    pub fn for_event(event: &GameEvent) -> Option<Self> {
        match event {
            GameEvent::HaloCollected { .. } => Some(SoundEffect::HaloCollect),
            GameEvent::BirdStrike { .. } => Some(SoundEffect::BirdStrike),
            GameEvent::RoundCompleted { .. } => Some(SoundEffect::RoundComplete),
            GameEvent::GameOver { .. } => Some(SoundEffect::GameOver),
            _ => None,
        }
    }
}

/// Fire-and-forget playback
pub trait AudioSink {
    fn play(&mut self, effect: SoundEffect);
}

/// Sink for headless runs
#[derive(Debug, Default)]
pub struct NullAudio;

impl AudioSink for NullAudio {
    fn play(&mut self, effect: SoundEffect) {
        log::trace!("(silent) {effect:?}");
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::AudioManager;

#[cfg(target_arch = "wasm32")]
mod web {
    use web_sys::{AudioContext, GainNode, OscillatorNode, OscillatorType};

    use super::{AudioSink, SoundEffect};
    use crate::Settings;

    /// Audio manager for the game
    pub struct AudioManager {
        ctx: Option<AudioContext>,
        settings: Settings,
        focused: bool,
    }

    impl Default for AudioManager {
        fn default() -> Self {
            Self::new()
        }
    }

    impl AudioManager {
        pub fn new() -> Self {
            // May fail outside a secure context
            let ctx = AudioContext::new().ok();
            if ctx.is_none() {
                log::warn!("Failed to create AudioContext - audio disabled");
            }
            Self {
                ctx,
                settings: Settings::default(),
                focused: true,
            }
        }

        /// Resume audio context (required after user gesture)
        pub fn resume(&self) {
            if let Some(ctx) = &self.ctx {
                let _ = ctx.resume();
            }
        }

        pub fn apply_settings(&mut self, settings: &Settings) {
            self.settings = settings.clone();
        }

        /// Page gained or lost focus. Suspends output while blurred if the
        /// player asked for it.
        pub fn set_focused(&mut self, focused: bool) {
            self.focused = focused;
            let Some(ctx) = &self.ctx else { return };
            if focused {
                let _ = ctx.resume();
            } else if self.settings.mute_on_blur {
                let _ = ctx.suspend();
            }
        }

        /// Create an oscillator with gain envelope
        fn create_osc(&self, ctx: &AudioContext, freq: f32, osc_type: OscillatorType) -> Option<(OscillatorNode, GainNode)> {
            let osc = ctx.create_oscillator().ok()?;
            let gain = ctx.create_gain().ok()?;

            osc.set_type(osc_type);
            osc.frequency().set_value(freq);
            osc.connect_with_audio_node(&gain).ok()?;
            gain.connect_with_audio_node(&ctx.destination()).ok()?;

            Some((osc, gain))
        }

        /// Short rising arpeggio, one note every `step` seconds
        fn arpeggio(&self, ctx: &AudioContext, vol: f32, notes: &[f32], step: f64, length: f64, osc_type: OscillatorType) {
            for (i, freq) in notes.iter().enumerate() {
                let Some((osc, gain)) = self.create_osc(ctx, *freq, osc_type) else {
                    continue;
                };
                let t = ctx.current_time() + i as f64 * step;
                gain.gain().set_value_at_time(vol, t).ok();
                gain.gain().exponential_ramp_to_value_at_time(0.01, t + length).ok();
                osc.start_with_when(t).ok();
                osc.stop_with_when(t + length + 0.05).ok();
            }
        }

        /// Halo - bright chime
        fn play_halo(&self, ctx: &AudioContext, vol: f32) {
            self.arpeggio(ctx, vol * 0.25, &[660.0, 880.0, 1320.0], 0.06, 0.15, OscillatorType::Sine);
        }

        /// Bird strike - squawk and thud
        fn play_strike(&self, ctx: &AudioContext, vol: f32) {
            let t = ctx.current_time();

            if let Some((osc, gain)) = self.create_osc(ctx, 900.0, OscillatorType::Sawtooth) {
                gain.gain().set_value_at_time(vol * 0.2, t).ok();
                gain.gain().exponential_ramp_to_value_at_time(0.01, t + 0.15).ok();
                osc.frequency().set_value_at_time(900.0, t).ok();
                osc.frequency().set_value_at_time(1400.0, t + 0.03).ok();
                osc.frequency().set_value_at_time(700.0, t + 0.07).ok();
                osc.start().ok();
                osc.stop_with_when(t + 0.18).ok();
            }

            if let Some((osc, gain)) = self.create_osc(ctx, 120.0, OscillatorType::Sine) {
                gain.gain().set_value_at_time(vol * 0.5, t).ok();
                gain.gain().exponential_ramp_to_value_at_time(0.01, t + 0.2).ok();
                osc.frequency().exponential_ramp_to_value_at_time(50.0, t + 0.2).ok();
                osc.start().ok();
                osc.stop_with_when(t + 0.25).ok();
            }
        }

        /// Round complete - ascending fanfare
        fn play_round(&self, ctx: &AudioContext, vol: f32) {
            self.arpeggio(ctx, vol * 0.3, &[400.0, 500.0, 600.0, 800.0], 0.1, 0.4, OscillatorType::Triangle);
        }

        /// Game over - descending tones
        fn play_game_over(&self, ctx: &AudioContext, vol: f32) {
            self.arpeggio(ctx, vol * 0.3, &[400.0, 350.0, 300.0, 200.0], 0.2, 0.3, OscillatorType::Sine);
        }
    }

    impl AudioSink for AudioManager {
        fn play(&mut self, effect: SoundEffect) {
            let vol = self.settings.sfx_volume_when(self.focused);
            if vol <= 0.0 {
                return;
            }
            let Some(ctx) = &self.ctx else { return };

            // Browsers suspend until a user gesture
            if ctx.state() == web_sys::AudioContextState::Suspended {
                let _ = ctx.resume();
            }

            match effect {
                SoundEffect::HaloCollect => self.play_halo(ctx, vol),
                SoundEffect::BirdStrike => self.play_strike(ctx, vol),
                SoundEffect::RoundComplete => self.play_round(ctx, vol),
                SoundEffect::GameOver => self.play_game_over(ctx, vol),
            }
        }
    }
}
