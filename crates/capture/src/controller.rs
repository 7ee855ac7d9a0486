//! Capture state machine.
//!
//! ```text
//! Initializing ──ok──▶ Ready ──begin──▶ CountingDown(3..0) ──grace──▶ Captured
//!      │  └──err──▶ Error(reason) ──retry──▶ Initializing
//!      └───────────── cancel (any non-terminal phase) ──────────────▶ Cancelled
//! ```
//!
//! The controller runs as one task that owns the camera, the live stream and
//! every timer. Commands arrive over a channel from a [`CaptureHandle`]; the
//! current [`Phase`] is published on a `watch` channel. Because only the task
//! touches the timers, a cancelled countdown can never fire a late tick or a
//! late capture.

use std::future::Future;
use std::time::Duration;

use ecomai_core::ImageDataUrl;
use tokio::sync::{mpsc, watch};
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, instrument, warn};

use crate::camera::{Camera, CameraStream, JpegQuality};
use crate::error::DeviceError;

// =============================================================================
// Public types
// =============================================================================

/// Where the capture currently is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    /// Waiting for the camera (possibly on a permission prompt).
    Initializing,
    /// Live preview is showing; waiting for the user to start.
    Ready,
    /// Seconds left before the still is taken.
    CountingDown(u8),
    /// A still was taken and handed back. Terminal.
    Captured,
    /// The camera could not be acquired. Retry or cancel.
    Error(DeviceError),
    /// The user backed out or the handle went away. Terminal.
    Cancelled,
}

impl Phase {
    /// Whether no further transitions can happen.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Captured | Self::Cancelled)
    }

    /// Whether a live preview is on screen in this phase.
    #[must_use]
    pub const fn shows_preview(&self) -> bool {
        matches!(self, Self::Ready | Self::CountingDown(_))
    }
}

/// How a capture round ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// The captured still, encoded as a `data:` URL.
    Captured(ImageDataUrl),
    /// Cancelled before a still was taken.
    Cancelled,
}

/// Tunables for one capture round.
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// First countdown value shown after "begin".
    pub countdown_from: u8,
    /// Time between countdown values.
    pub tick: Duration,
    /// Pause after the countdown reaches 0 before the still is taken.
    pub grace: Duration,
    /// Quality requested from the device.
    pub quality: JpegQuality,
    /// Give up on acquisition after this long. `None` waits forever.
    pub acquire_timeout: Option<Duration>,
    /// Mirror the live preview like a selfie camera. Never applied to the
    /// captured still.
    pub mirror_preview: bool,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            countdown_from: 3,
            tick: Duration::from_secs(1),
            grace: Duration::from_secs(1),
            quality: JpegQuality::default(),
            acquire_timeout: Some(Duration::from_secs(30)),
            mirror_preview: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    BeginCapture,
    Cancel,
    Retry,
}

/// Drives a running [`CaptureController`].
///
/// Commands sent after the controller has finished are ignored. Dropping
/// every handle cancels the capture.
#[derive(Debug, Clone)]
pub struct CaptureHandle {
    commands: mpsc::UnboundedSender<Command>,
    phase: watch::Receiver<Phase>,
    mirror_preview: bool,
}

impl CaptureHandle {
    /// Start the countdown. Only honoured in [`Phase::Ready`].
    pub fn begin_capture(&self) {
        self.send(Command::BeginCapture);
    }

    /// Abandon the capture and release the camera.
    pub fn cancel(&self) {
        self.send(Command::Cancel);
    }

    /// Re-run acquisition. Only honoured in [`Phase::Error`].
    pub fn retry(&self) {
        self.send(Command::Retry);
    }

    /// The current phase.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase.borrow().clone()
    }

    /// A receiver notified on every phase change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Phase> {
        self.phase.clone()
    }

    /// Whether the preview should be drawn mirrored.
    #[must_use]
    pub const fn mirror_preview(&self) -> bool {
        self.mirror_preview
    }

    fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            debug!(?command, "Capture already finished, command ignored");
        }
    }
}

// =============================================================================
// Controller
// =============================================================================

/// One capture round over a [`Camera`].
pub struct CaptureController<C: Camera> {
    camera: C,
    config: CaptureConfig,
    stream: StreamSlot<C::Stream>,
    commands: mpsc::UnboundedReceiver<Command>,
    phase: watch::Sender<Phase>,
}

enum Step {
    Acquire,
    Ready,
    CountDown,
    Failed(DeviceError),
    Finish(CaptureOutcome),
}

impl<C: Camera> CaptureController<C> {
    /// Create a controller and the handle that drives it.
    ///
    /// Nothing happens until [`run`](Self::run) is awaited.
    #[must_use]
    pub fn new(camera: C, config: CaptureConfig) -> (Self, CaptureHandle) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (phase_tx, phase_rx) = watch::channel(Phase::Initializing);

        let handle = CaptureHandle {
            commands: command_tx,
            phase: phase_rx,
            mirror_preview: config.mirror_preview,
        };
        let controller = Self {
            camera,
            config,
            stream: StreamSlot(None),
            commands: command_rx,
            phase: phase_tx,
        };
        (controller, handle)
    }

    /// Run the capture round to completion.
    ///
    /// The camera is released before this returns, whatever the outcome.
    #[instrument(skip_all, name = "capture")]
    pub async fn run(mut self) -> CaptureOutcome {
        let mut step = Step::Acquire;
        loop {
            step = match step {
                Step::Acquire => self.acquire().await,
                Step::Ready => self.ready().await,
                Step::CountDown => self.count_down().await,
                Step::Failed(err) => self.failed(err).await,
                Step::Finish(outcome) => return self.finish(outcome),
            };
        }
    }

    async fn acquire(&mut self) -> Step {
        self.set_phase(Phase::Initializing);

        let acquisition = with_timeout(self.camera.acquire(), self.config.acquire_timeout);
        tokio::pin!(acquisition);

        loop {
            tokio::select! {
                result = &mut acquisition => {
                    return match result {
                        Ok(stream) => {
                            self.stream.attach(stream);
                            Step::Ready
                        }
                        Err(err) => Step::Failed(err),
                    };
                }
                command = self.commands.recv() => {
                    if let Some(step) = interrupted(command) {
                        // Dropping the pending acquisition drops any stream it
                        // was about to hand out.
                        return step;
                    }
                }
            }
        }
    }

    async fn ready(&mut self) -> Step {
        info!("Camera ready");
        self.set_phase(Phase::Ready);

        loop {
            match self.commands.recv().await {
                Some(Command::BeginCapture) => return Step::CountDown,
                Some(Command::Cancel) | None => return Step::Finish(CaptureOutcome::Cancelled),
                Some(Command::Retry) => debug!("Ignoring retry while ready"),
            }
        }
    }

    async fn count_down(&mut self) -> Step {
        let tick = self.config.tick.max(Duration::from_millis(1));
        let mut remaining = self.config.countdown_from;
        debug!(from = remaining, "Countdown started");
        self.set_phase(Phase::CountingDown(remaining));

        let mut ticker = time::interval_at(Instant::now() + tick, tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        while remaining > 0 {
            tokio::select! {
                _ = ticker.tick() => {
                    remaining -= 1;
                    self.set_phase(Phase::CountingDown(remaining));
                }
                command = self.commands.recv() => {
                    if let Some(step) = interrupted(command) {
                        return step;
                    }
                }
            }
        }

        let grace = time::sleep(self.config.grace);
        tokio::pin!(grace);
        loop {
            tokio::select! {
                () = &mut grace => break,
                command = self.commands.recv() => {
                    if let Some(step) = interrupted(command) {
                        return step;
                    }
                }
            }
        }

        self.capture().await
    }

    async fn capture(&mut self) -> Step {
        let quality = self.config.quality;
        let Some(stream) = self.stream.get_mut() else {
            return Step::Failed(DeviceError::Unknown(
                "camera stream was released before capture".to_string(),
            ));
        };

        let result = stream.capture_still(quality).await;
        self.stream.release();

        match result {
            Ok(still) => {
                let image = ImageDataUrl::encode(still.mime_type, &still.bytes);
                info!(bytes = still.bytes.len(), "Still captured");
                self.set_phase(Phase::Captured);
                Step::Finish(CaptureOutcome::Captured(image))
            }
            Err(err) => Step::Failed(err),
        }
    }

    async fn failed(&mut self, err: DeviceError) -> Step {
        self.stream.release();
        warn!(reason = err.code(), error = %err, "Camera unavailable");
        self.set_phase(Phase::Error(err));

        loop {
            match self.commands.recv().await {
                Some(Command::Retry) => {
                    info!("Retrying camera acquisition");
                    return Step::Acquire;
                }
                Some(Command::Cancel) | None => return Step::Finish(CaptureOutcome::Cancelled),
                Some(Command::BeginCapture) => debug!("Ignoring capture request without a camera"),
            }
        }
    }

    fn finish(&mut self, outcome: CaptureOutcome) -> CaptureOutcome {
        self.stream.release();
        if outcome == CaptureOutcome::Cancelled {
            info!("Capture cancelled");
            self.set_phase(Phase::Cancelled);
        }
        outcome
    }

    fn set_phase(&self, phase: Phase) {
        debug!(?phase, "Capture phase");
        self.phase.send_replace(phase);
    }
}

/// Cancel (or a vanished handle) interrupts; anything else is ignored.
fn interrupted(command: Option<Command>) -> Option<Step> {
    match command {
        Some(Command::Cancel) | None => Some(Step::Finish(CaptureOutcome::Cancelled)),
        Some(command) => {
            debug!(?command, "Ignoring command");
            None
        }
    }
}

async fn with_timeout<S>(
    acquisition: impl Future<Output = Result<S, DeviceError>>,
    limit: Option<Duration>,
) -> Result<S, DeviceError> {
    match limit {
        Some(limit) => time::timeout(limit, acquisition)
            .await
            .unwrap_or(Err(DeviceError::TimedOut(limit))),
        None => acquisition.await,
    }
}

/// Holds the live stream and stops it exactly once.
struct StreamSlot<S: CameraStream>(Option<S>);

impl<S: CameraStream> StreamSlot<S> {
    fn attach(&mut self, stream: S) {
        self.release();
        self.0 = Some(stream);
    }

    fn get_mut(&mut self) -> Option<&mut S> {
        self.0.as_mut()
    }

    fn release(&mut self) {
        if let Some(mut stream) = self.0.take() {
            stream.stop();
            debug!("Camera released");
        }
    }
}

impl<S: CameraStream> Drop for StreamSlot<S> {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::camera::Still;

    #[derive(Default)]
    struct Probe {
        acquired: AtomicUsize,
        stopped: AtomicUsize,
        captured: AtomicUsize,
    }

    impl Probe {
        fn acquired(&self) -> usize {
            self.acquired.load(Ordering::SeqCst)
        }

        fn stopped(&self) -> usize {
            self.stopped.load(Ordering::SeqCst)
        }

        fn captured(&self) -> usize {
            self.captured.load(Ordering::SeqCst)
        }
    }

    enum Behavior {
        Grant,
        Fail(DeviceError),
        Hang,
    }

    struct FakeCamera {
        script: VecDeque<Behavior>,
        probe: Arc<Probe>,
    }

    impl FakeCamera {
        fn new(script: impl IntoIterator<Item = Behavior>) -> (Self, Arc<Probe>) {
            let probe = Arc::new(Probe::default());
            let camera = Self {
                script: script.into_iter().collect(),
                probe: Arc::clone(&probe),
            };
            (camera, probe)
        }
    }

    impl Camera for FakeCamera {
        type Stream = FakeStream;

        async fn acquire(&mut self) -> Result<FakeStream, DeviceError> {
            match self.script.pop_front().unwrap_or(Behavior::Grant) {
                Behavior::Grant => {
                    self.probe.acquired.fetch_add(1, Ordering::SeqCst);
                    Ok(FakeStream {
                        probe: Arc::clone(&self.probe),
                    })
                }
                Behavior::Fail(err) => Err(err),
                Behavior::Hang => std::future::pending().await,
            }
        }
    }

    struct FakeStream {
        probe: Arc<Probe>,
    }

    impl CameraStream for FakeStream {
        async fn capture_still(&mut self, _quality: JpegQuality) -> Result<Still, DeviceError> {
            assert_eq!(self.probe.stopped(), 0, "capture from a stopped stream");
            self.probe.captured.fetch_add(1, Ordering::SeqCst);
            Ok(Still::jpeg(vec![0xFF, 0xD8, 0xFF, 0xE0]))
        }

        fn stop(&mut self) {
            self.probe.stopped.fetch_add(1, Ordering::SeqCst);
        }
    }

    async fn wait_for_phase(handle: &CaptureHandle, wanted: &Phase) {
        let mut phases = handle.subscribe();
        phases.wait_for(|phase| phase == wanted).await.unwrap();
    }

    #[tokio::test]
    async fn test_acquisition_failure_reports_reason_and_holds_nothing() {
        let reasons = [
            DeviceError::PermissionDenied,
            DeviceError::NotFound,
            DeviceError::Busy,
            DeviceError::Unknown("driver crashed".to_string()),
        ];

        for reason in reasons {
            let (camera, probe) = FakeCamera::new([Behavior::Fail(reason.clone())]);
            let (controller, handle) = CaptureController::new(camera, CaptureConfig::default());
            let task = tokio::spawn(controller.run());

            wait_for_phase(&handle, &Phase::Error(reason.clone())).await;
            assert_eq!(probe.acquired(), 0);
            assert_eq!(probe.stopped(), 0);

            handle.cancel();
            assert_eq!(task.await.unwrap(), CaptureOutcome::Cancelled);
            assert_eq!(handle.phase(), Phase::Cancelled);
        }
    }

    #[tokio::test]
    async fn test_retry_after_failure_reacquires() {
        let (camera, probe) = FakeCamera::new([Behavior::Fail(DeviceError::Busy), Behavior::Grant]);
        let (controller, handle) = CaptureController::new(camera, CaptureConfig::default());
        let task = tokio::spawn(controller.run());

        wait_for_phase(&handle, &Phase::Error(DeviceError::Busy)).await;
        handle.begin_capture();
        handle.retry();
        wait_for_phase(&handle, &Phase::Ready).await;
        assert_eq!(probe.acquired(), 1);

        handle.cancel();
        assert_eq!(task.await.unwrap(), CaptureOutcome::Cancelled);
        assert_eq!(probe.stopped(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unanswered_acquisition_times_out() {
        let (camera, probe) = FakeCamera::new([Behavior::Hang]);
        let (controller, handle) = CaptureController::new(camera, CaptureConfig::default());
        let task = tokio::spawn(controller.run());

        wait_for_phase(&handle, &Phase::Error(DeviceError::TimedOut(Duration::from_secs(30))))
            .await;
        assert_eq!(probe.acquired(), 0);

        drop(handle);
        assert_eq!(task.await.unwrap(), CaptureOutcome::Cancelled);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_while_initializing_acquires_nothing() {
        let (camera, probe) = FakeCamera::new([Behavior::Hang]);
        let (controller, handle) = CaptureController::new(camera, CaptureConfig::default());
        let task = tokio::spawn(controller.run());

        handle.cancel();
        assert_eq!(task.await.unwrap(), CaptureOutcome::Cancelled);
        assert_eq!(handle.phase(), Phase::Cancelled);
        assert_eq!(probe.acquired(), 0);
        assert_eq!(probe.stopped(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_countdown_ticks_once_per_second_then_captures() {
        let (camera, probe) = FakeCamera::new([Behavior::Grant]);
        let (controller, handle) = CaptureController::new(camera, CaptureConfig::default());
        let task = tokio::spawn(controller.run());

        let mut phases = handle.subscribe();
        phases.wait_for(|phase| *phase == Phase::Ready).await.unwrap();

        let start = Instant::now();
        handle.begin_capture();

        let mut seen = Vec::new();
        loop {
            phases.changed().await.unwrap();
            let phase = phases.borrow_and_update().clone();
            seen.push((phase.clone(), start.elapsed().as_secs()));
            if phase.is_terminal() {
                break;
            }
        }

        assert_eq!(
            seen,
            vec![
                (Phase::CountingDown(3), 0),
                (Phase::CountingDown(2), 1),
                (Phase::CountingDown(1), 2),
                (Phase::CountingDown(0), 3),
                (Phase::Captured, 4),
            ]
        );

        let CaptureOutcome::Captured(image) = task.await.unwrap() else {
            panic!("expected a captured image");
        };
        assert_eq!(image.mime_type(), "image/jpeg");
        assert_eq!(image.decode(), vec![0xFF, 0xD8, 0xFF, 0xE0]);
        assert_eq!(probe.captured(), 1);
        assert_eq!(probe.stopped(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_countdown_never_captures() {
        let (camera, probe) = FakeCamera::new([Behavior::Grant]);
        let (controller, handle) = CaptureController::new(camera, CaptureConfig::default());
        let task = tokio::spawn(controller.run());

        wait_for_phase(&handle, &Phase::Ready).await;
        handle.begin_capture();
        wait_for_phase(&handle, &Phase::CountingDown(2)).await;
        handle.cancel();

        assert_eq!(task.await.unwrap(), CaptureOutcome::Cancelled);

        time::sleep(Duration::from_secs(10)).await;
        assert_eq!(handle.phase(), Phase::Cancelled);
        assert_eq!(probe.captured(), 0);
        assert_eq!(probe.stopped(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_after_capture_is_noop() {
        let (camera, probe) = FakeCamera::new([Behavior::Grant]);
        let (controller, handle) = CaptureController::new(camera, CaptureConfig::default());
        let task = tokio::spawn(controller.run());

        wait_for_phase(&handle, &Phase::Ready).await;
        handle.begin_capture();
        let outcome = task.await.unwrap();
        assert!(matches!(outcome, CaptureOutcome::Captured(_)));

        handle.cancel();
        handle.retry();
        assert_eq!(handle.phase(), Phase::Captured);
        assert_eq!(probe.stopped(), 1);
    }

    #[tokio::test]
    async fn test_dropping_handle_releases_camera() {
        let (camera, probe) = FakeCamera::new([Behavior::Grant]);
        let (controller, handle) = CaptureController::new(camera, CaptureConfig::default());
        let task = tokio::spawn(controller.run());

        wait_for_phase(&handle, &Phase::Ready).await;
        drop(handle);

        assert_eq!(task.await.unwrap(), CaptureOutcome::Cancelled);
        assert_eq!(probe.acquired(), 1);
        assert_eq!(probe.stopped(), 1);
    }

    #[tokio::test]
    async fn test_dropping_controller_without_running_holds_nothing() {
        let (camera, probe) = FakeCamera::new([Behavior::Grant]);
        let (controller, handle) = CaptureController::new(camera, CaptureConfig::default());

        drop(controller);
        handle.begin_capture();
        assert_eq!(handle.phase(), Phase::Initializing);
        assert_eq!(probe.acquired(), 0);
        assert_eq!(probe.stopped(), 0);
    }

    #[test]
    fn test_phase_predicates() {
        assert!(Phase::Captured.is_terminal());
        assert!(Phase::Cancelled.is_terminal());
        assert!(!Phase::Error(DeviceError::Busy).is_terminal());
        assert!(Phase::CountingDown(1).shows_preview());
        assert!(!Phase::Initializing.shows_preview());
    }
}
