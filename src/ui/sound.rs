/// Sound engine: procedural 8-bit style sound effects via rodio.
///
/// All sounds are generated as in-memory WAV buffers at init time.
/// Playback is fire-and-forget (non-blocking) via rodio's Sink.
///
/// Compile with `--no-default-features` or without "sound" feature
/// to disable audio entirely (the stub SoundEngine does nothing).

use crate::sim::event::GameEvent;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Sfx {
    Eat,
    SpecialSpawn,
    SpecialEat,
    Die,
    Record,
}

/// Which effect, if any, an engine event plays.
pub fn sfx_for(event: &GameEvent) -> Option<Sfx> {
    match event {
        GameEvent::FoodEaten { .. } => Some(Sfx::Eat),
        GameEvent::SpecialSpawned { .. } => Some(Sfx::SpecialSpawn),
        GameEvent::SpecialEaten { .. } => Some(Sfx::SpecialEat),
        GameEvent::Collision { .. } | GameEvent::BoardFull => Some(Sfx::Die),
        GameEvent::NewRecord { .. } => Some(Sfx::Record),
        _ => None,
    }
}

#[cfg(feature = "sound")]
mod inner {
    use std::io::Cursor;
    use std::sync::Arc;

    use log::warn;
    use rodio::{OutputStream, OutputStreamHandle, Sink};

    use super::Sfx;

    const SAMPLE_RATE: u32 = 22050;

    /// Pre-generated WAV buffers for each sound effect.
    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        sfx_eat: Arc<Vec<u8>>,
        sfx_spawn: Arc<Vec<u8>>,
        sfx_special: Arc<Vec<u8>>,
        sfx_die: Arc<Vec<u8>>,
        sfx_record: Arc<Vec<u8>>,
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

            Some(SoundEngine {
                _stream: stream,
                handle,
                sfx_eat: Arc::new(make_wav(&gen_blip(880.0, 0.05, 0.25))),
                sfx_spawn: Arc::new(make_wav(&gen_chime())),
                sfx_special: Arc::new(make_wav(&gen_arpeggio())),
                sfx_die: Arc::new(make_wav(&gen_die())),
                sfx_record: Arc::new(make_wav(&gen_fanfare())),
            })
        }

        pub fn play(&self, sfx: Sfx) {
            let buf = match sfx {
                Sfx::Eat => &self.sfx_eat,
                Sfx::SpecialSpawn => &self.sfx_spawn,
                Sfx::SpecialEat => &self.sfx_special,
                Sfx::Die => &self.sfx_die,
                Sfx::Record => &self.sfx_record,
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
    //  Waveform generators: all produce Vec<f32> mono samples
    // ════════════════════════════════════════════════════════════

    fn tone(freq: f32, i: usize) -> f32 {
        let t = i as f32 / SAMPLE_RATE as f32;
        (t * freq * 2.0 * std::f32::consts::PI).sin()
    }

    /// Simple sine blip at given frequency and duration
    fn gen_blip(freq: f32, duration: f32, volume: f32) -> Vec<f32> {
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        (0..n)
            .map(|i| {
                let env = 1.0 - (i as f32 / n as f32); // linear fade out
                tone(freq, i) * env * volume
            })
            .collect()
    }

    /// Item appears: two-note chime G5, C6
    fn gen_chime() -> Vec<f32> {
        let pairs = [(784.0_f32, 0.08), (1047.0, 0.15)];
        let mut samples = Vec::new();
        for &(freq, dur) in &pairs {
            let n = (SAMPLE_RATE as f32 * dur) as usize;
            for i in 0..n {
                let env = 1.0 - (i as f32 / n as f32).powf(0.5);
                let wave = tone(freq, i) * 0.7 + tone(freq * 2.0, i) * 0.3;
                samples.push(wave * env * 0.3);
            }
        }
        samples
    }

    /// Item eaten: quick ascending arpeggio C6→E6→G6
    fn gen_arpeggio() -> Vec<f32> {
        let notes = [1047.0_f32, 1319.0, 1568.0];
        let n = (SAMPLE_RATE as f32 * 0.045) as usize;
        let mut samples = Vec::new();
        for &freq in &notes {
            for i in 0..n {
                let env = 1.0 - (i as f32 / n as f32).powf(0.5);
                // Square-ish wave (sine + 3rd harmonic) for retro feel
                let wave = tone(freq, i) * 0.7 + tone(freq * 3.0, i) * 0.3;
                samples.push(wave * env * 0.25);
            }
        }
        samples
    }

    /// Death: sad descending tone A4→F#4→Eb4→C4
    fn gen_die() -> Vec<f32> {
        let notes = [440.0_f32, 370.0, 311.0, 261.0];
        let n = (SAMPLE_RATE as f32 * 0.12) as usize;
        let mut samples = Vec::new();
        for &freq in &notes {
            for i in 0..n {
                let env = 1.0 - (i as f32 / n as f32) * 0.3;
                samples.push(tone(freq, i) * env * 0.3);
            }
        }
        // Final fade
        let total = samples.len();
        let fade_len = total / 4;
        for (k, s) in samples[total - fade_len..].iter_mut().enumerate() {
            *s *= (fade_len - k) as f32 / fade_len as f32;
        }
        samples
    }

    /// New record: ascending fanfare C5→E5→G5→C6 with a held top note
    fn gen_fanfare() -> Vec<f32> {
        let notes = [523.0_f32, 659.0, 784.0, 1047.0];
        let n = (SAMPLE_RATE as f32 * 0.1) as usize;
        let mut samples = Vec::new();
        for &freq in &notes {
            for i in 0..n {
                let env = 1.0 - (i as f32 / n as f32) * 0.3;
                let wave = tone(freq, i) * 0.6 + tone(freq * 2.0, i) * 0.3 + tone(freq * 3.0, i) * 0.1;
                samples.push(wave * env * 0.3);
            }
        }
        let hold = (SAMPLE_RATE as f32 * 0.25) as usize;
        for i in 0..hold {
            let env = 1.0 - (i as f32 / hold as f32);
            samples.push(tone(1047.0, i) * env * 0.3);
        }
        samples
    }

    // ════════════════════════════════════════════════════════════
    //  WAV encoder: wraps f32 samples into a valid WAV buffer
    // ════════════════════════════════════════════════════════════

    pub(super) fn make_wav(samples: &[f32]) -> Vec<u8> {
        let num_channels: u16 = 1;
        let bits_per_sample: u16 = 16;
        let byte_rate = SAMPLE_RATE * (num_channels as u32) * (bits_per_sample as u32) / 8;
        let block_align = num_channels * bits_per_sample / 8;
        let data_size = samples.len() as u32 * 2; // 16-bit = 2 bytes per sample
        let file_size = 36 + data_size;

        let mut buf = Vec::with_capacity(44 + data_size as usize);

        // RIFF header
        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&file_size.to_le_bytes());
        buf.extend_from_slice(b"WAVE");

        // fmt chunk
        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes()); // chunk size
        buf.extend_from_slice(&1u16.to_le_bytes());  // PCM format
        buf.extend_from_slice(&num_channels.to_le_bytes());
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&byte_rate.to_le_bytes());
        buf.extend_from_slice(&block_align.to_le_bytes());
        buf.extend_from_slice(&bits_per_sample.to_le_bytes());

        // data chunk
        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());

        for &s in samples {
            let val = (s.clamp(-1.0, 1.0) * 32767.0) as i16;
            buf.extend_from_slice(&val.to_le_bytes());
        }

        buf
    }
}

// ════════════════════════════════════════════════════════════
//  Public API, compiles to no-ops when sound feature is off
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> { Some(SoundEngine) }
    pub fn play(&self, _sfx: Sfx) {}
}
