//! Audio playback
//!
//! The reward sounds are clips loaded through `HtmlAudioElement`; the wrong
//! code buzz is generated with the Web Audio API so it needs no file.

use wasm_bindgen_futures::JsFuture;
use web_sys::{AudioContext, GainNode, HtmlAudioElement, OscillatorNode, OscillatorType};

use crate::platform::describe;
use crate::settings::Settings;
use crate::sim::Sound;
use crate::tuning::AssetUrls;

/// Firework pops are quieter than the other clips
const FIREWORK_VOLUME: f32 = 0.3;

/// Audio manager for the session
pub struct AudioManager {
    ctx: Option<AudioContext>,
    chest_open: Option<HtmlAudioElement>,
    celebration: Option<HtmlAudioElement>,
    victory: Option<HtmlAudioElement>,
    firework_url: String,
    /// Master * sfx, zero when muted
    volume: f32,
}

impl AudioManager {
    pub fn new(urls: &AssetUrls, settings: &Settings) -> Self {
        // Try to create audio context (may fail if not in secure context)
        let ctx = AudioContext::new().ok();
        if ctx.is_none() {
            log::warn!("Failed to create AudioContext - rejection cue disabled");
        }
        Self {
            ctx,
            chest_open: load_clip(&urls.chest_open_sound),
            celebration: load_clip(&urls.celebration_sound),
            victory: load_clip(&urls.victory_sound),
            firework_url: urls.firework_sound.clone(),
            volume: settings.effective_volume(),
        }
    }

    /// Resume audio context (required after user gesture)
    pub fn resume(&self) {
        if let Some(ctx) = &self.ctx {
            let _ = ctx.resume();
        }
    }

    /// Play a sound cue
    pub fn play(&self, sound: Sound) {
        let vol = self.volume;
        if vol <= 0.0 {
            return;
        }

        match sound {
            // Restarted from the top; the victory clip just plays
            Sound::ChestOpen => restart_clip(self.chest_open.as_ref(), vol),
            Sound::Celebration => restart_clip(self.celebration.as_ref(), vol),
            Sound::Victory => {
                if let Some(clip) = &self.victory {
                    clip.set_volume(vol as f64);
                    play_clip(clip);
                }
            }
            // Overlapping explosions each get their own element
            Sound::Firework => {
                if let Some(clip) = load_clip(&self.firework_url) {
                    clip.set_volume((vol * FIREWORK_VOLUME) as f64);
                    play_clip(&clip);
                }
            }
            Sound::CodeRejected => {
                let Some(ctx) = &self.ctx else { return };
                if ctx.state() == web_sys::AudioContextState::Suspended {
                    let _ = ctx.resume();
                }
                self.play_buzz(ctx, vol);
            }
        }
    }

    /// Create an oscillator with gain envelope
    fn create_osc(
        &self,
        ctx: &AudioContext,
        freq: f32,
        osc_type: OscillatorType,
    ) -> Option<(OscillatorNode, GainNode)> {
        let osc = ctx.create_oscillator().ok()?;
        let gain = ctx.create_gain().ok()?;

        osc.set_type(osc_type);
        osc.frequency().set_value(freq);
        osc.connect_with_audio_node(&gain).ok()?;
        gain.connect_with_audio_node(&ctx.destination()).ok()?;

        Some((osc, gain))
    }

    /// Two short low square pulses
    fn play_buzz(&self, ctx: &AudioContext, vol: f32) {
        for (i, freq) in [140.0, 110.0].iter().enumerate() {
            let delay = i as f64 * 0.12;
            if let Some((osc, gain)) = self.create_osc(ctx, *freq, OscillatorType::Square) {
                let t = ctx.current_time() + delay;
                gain.gain().set_value_at_time(vol * 0.2, t).ok();
                gain.gain()
                    .exponential_ramp_to_value_at_time(0.01, t + 0.1)
                    .ok();
                osc.start_with_when(t).ok();
                osc.stop_with_when(t + 0.12).ok();
            }
        }
    }
}

fn load_clip(url: &str) -> Option<HtmlAudioElement> {
    match HtmlAudioElement::new_with_src(url) {
        Ok(clip) => {
            clip.set_preload("auto");
            Some(clip)
        }
        Err(e) => {
            log::error!("Failed to create audio element for {}: {:?}", url, e);
            None
        }
    }
}

fn restart_clip(clip: Option<&HtmlAudioElement>, vol: f32) {
    let Some(clip) = clip else { return };
    clip.set_volume(vol as f64);
    clip.set_current_time(0.0);
    play_clip(clip);
}

/// Start playback; a rejected play promise (autoplay policy, missing file) is only logged
fn play_clip(clip: &HtmlAudioElement) {
    let src = clip.src();
    match clip.play() {
        Ok(promise) => wasm_bindgen_futures::spawn_local(async move {
            if let Err(e) = JsFuture::from(promise).await {
                log::warn!("Playback of {} failed: {}", src, describe(&e));
            }
        }),
        Err(e) => log::warn!("Playback of {} failed: {}", src, describe(&e)),
    }
}
