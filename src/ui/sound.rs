/// Sound engine: procedural chiptune effects via rodio.
///
/// One buffer per named effect (`pickup`, `chopping`, `felled`, `coin`,
/// `win`, `timeup`), rendered to in-memory WAV at init time and played
/// fire-and-forget. A missing audio device disables sound with a warning.
///
/// Build without the "sound" feature to disable audio entirely
/// (the stub SoundEngine does nothing).

use crate::sim::event::GameEvent;

#[cfg(feature = "sound")]
mod inner {
    use std::collections::HashMap;
    use std::f32::consts::TAU;
    use std::io::Cursor;
    use std::sync::Arc;

    use log::{debug, warn};
    use rodio::{OutputStream, OutputStreamHandle, Sink};

    const SAMPLE_RATE: u32 = 22050;

    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        effects: HashMap<&'static str, Arc<Vec<u8>>>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = match OutputStream::try_default() {
                Ok(pair) => pair,
                Err(e) => {
                    warn!("no audio output, sound disabled: {e}");
                    return None;
                }
            };

            let effects = [
                ("pickup", gen_pickup()),
                ("chopping", gen_chop()),
                ("felled", gen_felled()),
                ("coin", gen_coin()),
                ("win", gen_win()),
                ("timeup", gen_timeup()),
            ]
            .into_iter()
            .map(|(name, samples)| (name, Arc::new(make_wav(&samples))))
            .collect();

            Some(SoundEngine { _stream: stream, handle, effects })
        }

        /// Play a named effect; unknown names are ignored.
        pub fn play(&self, name: &str) {
            let buf = match self.effects.get(name) {
                Some(b) => b,
                None => {
                    debug!("no sound for effect {name}");
                    return;
                }
            };
            if let Ok(sink) = Sink::try_new(&self.handle) {
                let cursor = Cursor::new(buf.as_ref().clone());
                if let Ok(src) = rodio::Decoder::new(cursor) {
                    sink.append(src);
                    sink.detach(); // fire-and-forget
                }
            }
        }
    }

    // ════════════════════════════════════════════════════════════
    //  Waveform generators: mono f32 samples
    // ════════════════════════════════════════════════════════════

    /// Note sequence with a bright (sine + harmonics) timbre.
    /// Each entry is (frequency Hz, seconds, volume).
    fn chime(notes: &[(f32, f32, f32)], harmonic: f32) -> Vec<f32> {
        let mut samples = Vec::new();
        for &(freq, dur, vol) in notes {
            let n = (SAMPLE_RATE as f32 * dur) as usize;
            samples.extend((0..n).map(|i| {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32).sqrt();
                let wave = (t * freq * TAU).sin() * (1.0 - harmonic)
                    + (t * freq * 2.0 * TAU).sin() * harmonic;
                wave * env * vol
            }));
        }
        samples
    }

    /// Axe pickup: metallic rising pair
    fn gen_pickup() -> Vec<f32> {
        chime(&[(880.0, 0.05, 0.25), (1319.0, 0.08, 0.25)], 0.4)
    }

    /// Chop: a woody knock, a noise burst over a low thud
    fn gen_chop() -> Vec<f32> {
        let n = (SAMPLE_RATE as f32 * 0.09) as usize;
        let mut rng: u32 = 0x2545_f491;
        (0..n)
            .map(|i| {
                let p = i as f32 / n as f32;
                let t = i as f32 / SAMPLE_RATE as f32;
                rng ^= rng << 13;
                rng ^= rng >> 17;
                rng ^= rng << 5;
                let noise = (rng as f32 / u32::MAX as f32) * 2.0 - 1.0;
                let thud = (t * (160.0 - p * 60.0) * TAU).sin();
                (thud * 0.6 + noise * 0.4) * (1.0 - p).powi(3) * 0.4
            })
            .collect()
    }

    /// Tree falls: long descending sweep
    fn gen_felled() -> Vec<f32> {
        let n = (SAMPLE_RATE as f32 * 0.35) as usize;
        let mut phase = 0.0_f32;
        (0..n)
            .map(|i| {
                let p = i as f32 / n as f32;
                let freq = 420.0 - p * 340.0;
                phase += freq / SAMPLE_RATE as f32;
                (phase * TAU).sin() * (1.0 - p) * 0.3
            })
            .collect()
    }

    /// Coin: the classic two-step ding
    fn gen_coin() -> Vec<f32> {
        chime(&[(988.0, 0.04, 0.22), (1319.0, 0.14, 0.22)], 0.2)
    }

    /// Level finished: C major fanfare with a held top note
    fn gen_win() -> Vec<f32> {
        chime(
            &[(523.0, 0.09, 0.3), (659.0, 0.09, 0.3), (784.0, 0.09, 0.3), (1047.0, 0.3, 0.3)],
            0.3,
        )
    }

    /// Countdown over: falling minor steps
    fn gen_timeup() -> Vec<f32> {
        chime(&[(392.0, 0.12, 0.3), (311.0, 0.12, 0.3), (262.0, 0.3, 0.3)], 0.1)
    }

    // ════════════════════════════════════════════════════════════
    //  WAV encoder: 16-bit PCM mono
    // ════════════════════════════════════════════════════════════

    fn make_wav(samples: &[f32]) -> Vec<u8> {
        const CHANNELS: u16 = 1;
        const BITS: u16 = 16;
        let block_align = CHANNELS * BITS / 8;
        let byte_rate = SAMPLE_RATE * block_align as u32;
        let data_size = samples.len() as u32 * block_align as u32;

        let mut buf = Vec::with_capacity(44 + data_size as usize);
        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&(36 + data_size).to_le_bytes());
        buf.extend_from_slice(b"WAVE");

        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes());
        buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
        buf.extend_from_slice(&CHANNELS.to_le_bytes());
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&byte_rate.to_le_bytes());
        buf.extend_from_slice(&block_align.to_le_bytes());
        buf.extend_from_slice(&BITS.to_le_bytes());

        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());
        for &s in samples {
            let val = (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
            buf.extend_from_slice(&val.to_le_bytes());
        }
        buf
    }

}

// ════════════════════════════════════════════════════════════
//  Public API: compiles to no-ops when sound feature is off
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> { Some(SoundEngine) }
    pub fn play(&self, _name: &str) {}
}

/// Play the effect for every event of one frame.
pub fn play_events(sound: Option<&SoundEngine>, events: &[GameEvent]) {
    if let Some(sfx) = sound {
        for event in events {
            sfx.play(event.effect_name());
        }
    }
}
