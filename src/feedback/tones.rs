use rodio::{OutputStream, Sink, Source};
use std::f32::consts::PI;
use std::sync::{
    mpsc::{self, Sender},
    Arc, Mutex,
};
use std::thread;
use std::time::Duration;

use crate::devices::TonePlayer;

const SAMPLE_RATE: u32 = 44100;

/// A finite sine burst with a short linear fade at both ends to avoid clicks.
pub struct ToneBurst {
    freq: f32,
    total_samples: usize,
    fade_samples: usize,
    num_sample: usize,
}

impl ToneBurst {
    pub fn new(freq: f32, duration: Duration) -> Self {
        let total_samples = (duration.as_millis() * SAMPLE_RATE as u128 / 1000) as usize;
        Self {
            freq,
            total_samples,
            fade_samples: (SAMPLE_RATE / 200) as usize,
            num_sample: 0,
        }
    }

    fn envelope(&self) -> f32 {
        let from_start = self.num_sample;
        let to_end = self.total_samples.saturating_sub(self.num_sample);
        let edge = from_start.min(to_end) as f32;
        (edge / self.fade_samples as f32).min(1.0)
    }
}

impl Iterator for ToneBurst {
    type Item = f32;

    fn next(&mut self) -> Option<Self::Item> {
        if self.num_sample >= self.total_samples {
            return None;
        }
        let t = self.num_sample as f32 / SAMPLE_RATE as f32;
        let sample = (2.0 * PI * self.freq * t).sin() * self.envelope();
        self.num_sample += 1;
        Some(sample * 0.25)
    }
}

impl Source for ToneBurst {
    fn current_frame_len(&self) -> Option<usize> {
        Some(self.total_samples.saturating_sub(self.num_sample))
    }

    fn channels(&self) -> u16 {
        1
    }

    fn sample_rate(&self) -> u32 {
        SAMPLE_RATE
    }

    fn total_duration(&self) -> Option<Duration> {
        Some(Duration::from_secs_f32(
            self.total_samples as f32 / SAMPLE_RATE as f32,
        ))
    }
}

enum ToneCommand {
    Success,
    Error,
}

/// Plays feedback tones on a dedicated audio thread; rodio's output stream
/// is not `Send`, so it never leaves that thread.
#[derive(Clone)]
pub struct ToneEngineHandle {
    tx: Arc<Mutex<Option<Sender<ToneCommand>>>>,
}

impl ToneEngineHandle {
    pub fn new() -> Self {
        Self {
            tx: Arc::new(Mutex::new(None)),
        }
    }

    fn ensure_thread(&self) -> Result<Sender<ToneCommand>, String> {
        let mut guard = self.tx.lock().map_err(|e| e.to_string())?;
        if let Some(tx) = guard.as_ref() {
            return Ok(tx.clone());
        }

        let (tx, rx) = mpsc::channel::<ToneCommand>();
        thread::Builder::new()
            .name("tone-engine".to_string())
            .spawn(move || {
                let mut _stream: Option<OutputStream> = None;
                let mut sink: Option<Sink> = None;

                fn ensure_sink(
                    stream: &mut Option<OutputStream>,
                    sink: &mut Option<Sink>,
                ) -> Result<(), String> {
                    if sink.is_none() {
                        let (s, handle) = OutputStream::try_default()
                            .map_err(|e| format!("Failed to create audio output stream: {}", e))?;
                        let new_sink = Sink::try_new(&handle)
                            .map_err(|e| format!("Failed to create audio sink: {}", e))?;
                        *stream = Some(s);
                        *sink = Some(new_sink);
                    }
                    Ok(())
                }

                while let Ok(cmd) = rx.recv() {
                    if let Err(err) = ensure_sink(&mut _stream, &mut sink) {
                        log::warn!("feedback tone skipped: {err}");
                        continue;
                    }
                    let Some(ref s) = sink else { continue };

                    // a new tone interrupts whatever is still playing
                    s.clear();
                    match cmd {
                        ToneCommand::Success => {
                            s.append(ToneBurst::new(523.25, Duration::from_millis(120)));
                            s.append(ToneBurst::new(783.99, Duration::from_millis(180)));
                        }
                        ToneCommand::Error => {
                            s.append(ToneBurst::new(220.0, Duration::from_millis(140)));
                            s.append(ToneBurst::new(174.61, Duration::from_millis(260)));
                        }
                    }
                    s.play();
                }
            })
            .map_err(|e| e.to_string())?;

        *guard = Some(tx.clone());
        Ok(tx)
    }

    fn send(&self, cmd: ToneCommand) {
        let sent = self
            .ensure_thread()
            .and_then(|tx| tx.send(cmd).map_err(|e| e.to_string()));
        if let Err(err) = sent {
            log::warn!("tone engine unavailable: {err}");
        }
    }
}

impl Default for ToneEngineHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl TonePlayer for ToneEngineHandle {
    fn play_success(&self) {
        self.send(ToneCommand::Success);
    }

    fn play_error(&self) {
        self.send(ToneCommand::Error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn burst_has_requested_length() {
        let burst = ToneBurst::new(440.0, Duration::from_millis(100));
        assert_eq!(burst.channels(), 1);
        assert_eq!(burst.count(), 4410);
    }

    #[test]
    fn burst_fades_in_and_out() {
        let samples: Vec<f32> = ToneBurst::new(440.0, Duration::from_millis(50)).collect();
        assert_eq!(samples[0], 0.0);
        assert!(samples.last().unwrap().abs() < 0.01);
        assert!(samples.iter().all(|s| s.abs() <= 0.25));
    }
}
