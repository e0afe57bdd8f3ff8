use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::devices::{CameraSource, HandDetector, ModalityStatus};
use crate::mailbox::LatestSlot;

use super::classifier::{classify_gesture, GestureObservation, GestureStabilizer};
use super::landmarks::{classify_fingers, Landmark};

// Runs at camera frame rate; keep quiet unless debugging a detector.
const ENABLE_LOGS: bool = false;

use crate::{log_debug, log_info, log_warn};

type SharedCamera = Arc<Mutex<Box<dyn CameraSource>>>;
type SharedDetector = Arc<Mutex<Box<dyn HandDetector>>>;

/// Landmarks → finger vector → observation → mailbox, shared by the pull loop
/// and by hosts that push detector results directly.
pub struct FramePipeline {
    observations: LatestSlot<GestureObservation>,
    overlay: LatestSlot<Vec<Landmark>>,
    stabilizer: Mutex<GestureStabilizer>,
}

impl FramePipeline {
    fn new(stable_frames: u32) -> Self {
        Self {
            observations: LatestSlot::new(),
            overlay: LatestSlot::new(),
            stabilizer: Mutex::new(GestureStabilizer::new(stable_frames)),
        }
    }

    fn process(&self, landmarks: Option<Vec<Landmark>>) {
        let observation = match landmarks {
            Some(points) => {
                let fingers = classify_fingers(&points);
                self.overlay.put(points);
                classify_gesture(Some(&fingers))
            }
            None => {
                self.overlay.clear();
                classify_gesture(None)
            }
        };

        let passed = match self.stabilizer.lock() {
            Ok(mut stabilizer) => stabilizer.observe(observation),
            Err(poisoned) => poisoned.into_inner().observe(observation),
        };
        if let Some(observation) = passed {
            log_debug!("gesture observation {:?}", observation);
            self.observations.put(observation);
        }
    }

    fn clear(&self) {
        self.observations.clear();
        self.overlay.clear();
        match self.stabilizer.lock() {
            Ok(mut stabilizer) => stabilizer.reset(),
            Err(poisoned) => poisoned.into_inner().reset(),
        }
    }
}

enum FrameOutcome {
    NoFrame,
    Detected(Option<Vec<Landmark>>),
}

/// Owns the camera and detector for the gesture modality.
pub struct GestureInput {
    camera: SharedCamera,
    detector: SharedDetector,
    pipeline: Arc<FramePipeline>,
    status: Arc<watch::Sender<ModalityStatus>>,
    handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
    frame_interval: Duration,
}

impl GestureInput {
    pub fn new(
        camera: Box<dyn CameraSource>,
        detector: Box<dyn HandDetector>,
        frame_interval: Duration,
        stable_frames: u32,
    ) -> Self {
        let initial = if camera.is_supported() {
            ModalityStatus::Off
        } else {
            ModalityStatus::Unsupported
        };
        let (status, _) = watch::channel(initial);

        Self {
            camera: Arc::new(Mutex::new(camera)),
            detector: Arc::new(Mutex::new(detector)),
            pipeline: Arc::new(FramePipeline::new(stable_frames)),
            status: Arc::new(status),
            handle: None,
            cancel_token: None,
            frame_interval,
        }
    }

    pub fn status(&self) -> ModalityStatus {
        self.status.borrow().clone()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<ModalityStatus> {
        self.status.subscribe()
    }

    fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    /// Start the camera and the per-frame loop. A no-op when already running.
    ///
    /// On failure the status carries a user-facing message and the modality
    /// stays off until the user toggles it again.
    pub async fn enable(&mut self) -> Result<()> {
        if self.status() == ModalityStatus::Unsupported {
            bail!("camera is not supported on this host");
        }
        if self.is_running() {
            return Ok(());
        }
        self.reap().await;

        let started = self
            .camera
            .lock()
            .map_err(|_| anyhow!("camera lock poisoned"))
            .and_then(|mut camera| camera.start().context("failed to start camera"));
        if let Err(err) = started {
            self.status.send_replace(ModalityStatus::Error(
                "No se pudo acceder a la cámara".into(),
            ));
            return Err(err);
        }

        self.pipeline.clear();
        let cancel_token = CancellationToken::new();
        self.status.send_replace(ModalityStatus::Active);
        self.handle = Some(tokio::spawn(gesture_loop(
            self.camera.clone(),
            self.detector.clone(),
            self.pipeline.clone(),
            self.status.clone(),
            self.frame_interval,
            cancel_token.clone(),
        )));
        self.cancel_token = Some(cancel_token);
        log::info!("gesture input enabled");
        Ok(())
    }

    /// Stop the loop, release the camera and empty the buffers. Idempotent.
    pub async fn disable(&mut self) -> Result<()> {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }
        let joined = match self.handle.take() {
            Some(handle) => handle
                .await
                .context("gesture loop task failed to join")
                .map(|_| ()),
            None => Ok(()),
        };

        self.pipeline.clear();
        if self.status() != ModalityStatus::Unsupported {
            self.status.send_replace(ModalityStatus::Off);
        }
        joined
    }

    async fn reap(&mut self) {
        self.cancel_token = None;
        if let Some(handle) = self.handle.take() {
            if let Err(err) = handle.await {
                log::warn!("previous gesture loop ended abnormally: {err}");
            }
        }
    }

    /// Push path for hosts whose detector calls back instead of being pulled.
    /// Ignored unless the modality is active.
    pub fn on_hand_frame(&self, landmarks: Option<Vec<Landmark>>) {
        if self.status().is_active() {
            self.pipeline.process(landmarks);
        }
    }

    /// Latest observation, consumed.
    pub fn take_observation(&self) -> Option<GestureObservation> {
        self.pipeline.observations.take()
    }

    /// Latest landmarks, kept for overlay rendering.
    pub fn overlay(&self) -> Option<Vec<Landmark>> {
        self.pipeline.overlay.peek()
    }

    /// Drop anything buffered so it cannot leak into the next question.
    pub fn discard_buffered(&self) {
        self.pipeline.clear();
    }
}

async fn gesture_loop(
    camera: SharedCamera,
    detector: SharedDetector,
    pipeline: Arc<FramePipeline>,
    status: Arc<watch::Sender<ModalityStatus>>,
    frame_interval: Duration,
    cancel_token: CancellationToken,
) {
    let mut ticker = tokio::time::interval(frame_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let outcome = tokio::task::spawn_blocking({
                    let camera = camera.clone();
                    let detector = detector.clone();
                    move || capture_frame(&camera, &detector)
                })
                .await
                .context("gesture worker join failed")
                .and_then(|result| result);

                match outcome {
                    Ok(FrameOutcome::NoFrame) => {}
                    Ok(FrameOutcome::Detected(landmarks)) => pipeline.process(landmarks),
                    Err(err) => {
                        log::error!("gesture detection failed: {err:?}");
                        pipeline.clear();
                        status.send_replace(ModalityStatus::Error(
                            "El reconocimiento de gestos se detuvo".into(),
                        ));
                        break;
                    }
                }
            }
            _ = cancel_token.cancelled() => {
                log_info!("gesture loop shutting down");
                break;
            }
        }
    }

    match camera.lock() {
        Ok(mut camera) => camera.stop(),
        Err(_) => log_warn!("camera lock poisoned; stream may still be open"),
    }
}

fn capture_frame(camera: &SharedCamera, detector: &SharedDetector) -> Result<FrameOutcome> {
    let frame = camera
        .lock()
        .map_err(|_| anyhow!("camera lock poisoned"))?
        .grab_frame()
        .context("camera frame grab failed")?;
    let Some(frame) = frame else {
        return Ok(FrameOutcome::NoFrame);
    };

    let landmarks = detector
        .lock()
        .map_err(|_| anyhow!("detector lock poisoned"))?
        .detect(&frame)
        .context("hand detector failed")?;
    Ok(FrameOutcome::Detected(landmarks))
}
