//! Photo overlay choreography: fly to an authored pose, zoom the field of view,
//! then reveal a photo; deselection walks the same stages backwards and flies
//! home to the pose captured before the first flight.

use foundation::camera::{CameraState, DEFAULT_FOV};
use foundation::easing::{Easing, lerp};
use foundation::time::{Millis, TimeSpan};
use runtime::sequencer::{DelayedCounter, StageStep, StepDuration};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::camera::CameraBridge;
use crate::renderer::{Flight, Renderer};

/// `(enter, exit)` delays per step: normal↔flying, flying↔zoomed, zoomed↔photo.
pub const STAGE_DURATIONS: [StepDuration; 3] = [
    StepDuration::new(0, 500),
    StepDuration::new(3000, 500),
    StepDuration::new(500, 0),
];

pub const FLIGHT_DURATION_MS: u64 = STAGE_DURATIONS[1].enter_ms;
pub const FOV_DURATION_MS: u64 = STAGE_DURATIONS[2].enter_ms;
pub const PHOTO_FADE_MS: u64 = STAGE_DURATIONS[1].exit_ms;

/// Selection reason under which the caller's authored pose replaces the live
/// camera as the pose to return to.
pub const STORYTELLING_REASON: &str = "storytelling";

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Normal = 0,
    Flying = 1,
    Zoomed = 2,
    Photo = 3,
}

impl Stage {
    pub fn from_index(index: usize) -> Self {
        match index {
            0 => Stage::Normal,
            1 => Stage::Flying,
            2 => Stage::Zoomed,
            _ => Stage::Photo,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhotoOverlaySettings {
    /// Photo URL. Without one, selection never starts the sequence.
    pub image: Option<String>,
    /// Pose to fly to; its `fov` is the photo's authored field of view.
    pub camera: Option<CameraState>,
}

/// Overlay element to render while the photo is mounted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhotoView {
    pub image: String,
    pub opacity: f64,
    pub transition_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct FovTween {
    from: f64,
    to: f64,
    span: TimeSpan,
}

#[derive(Debug, Clone)]
pub struct PhotoOverlay {
    settings: PhotoOverlaySettings,
    counter: DelayedCounter,
    selected: bool,
    authored_origin: Option<CameraState>,
    prev_camera: Option<CameraState>,
    flight_ends_at: Millis,
    fov_tween: Option<FovTween>,
    photo_mounted: bool,
}

impl PhotoOverlay {
    pub fn new(settings: PhotoOverlaySettings) -> Self {
        Self {
            settings,
            counter: DelayedCounter::new(STAGE_DURATIONS.to_vec()),
            selected: false,
            authored_origin: None,
            prev_camera: None,
            flight_ends_at: Millis::ZERO,
            fov_tween: None,
            photo_mounted: false,
        }
    }

    pub fn settings(&self) -> &PhotoOverlaySettings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: PhotoOverlaySettings) {
        self.settings = settings;
    }

    pub fn stage(&self) -> Stage {
        Stage::from_index(self.counter.value())
    }

    pub fn prev_stage(&self) -> Stage {
        Stage::from_index(self.counter.prev())
    }

    pub fn prev_camera(&self) -> Option<&CameraState> {
        self.prev_camera.as_ref()
    }

    /// Earliest time `advance` has work to do.
    pub fn next_due(&self) -> Option<Millis> {
        let tween_end = self.fov_tween.map(|t| t.span.end);
        match (self.counter.next_due(), tween_end) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Drives the sequence from the layer's `is_selected` flag.
    ///
    /// `authored` is adopted as the return pose when `reason` is
    /// [`STORYTELLING_REASON`].
    pub fn set_selected(
        &mut self,
        selected: bool,
        reason: Option<&str>,
        authored: Option<&CameraState>,
        now: Millis,
        camera: &mut CameraBridge,
        renderer: &mut dyn Renderer,
    ) {
        if selected == self.selected {
            return;
        }
        // Without a photo nothing starts, but a running sequence can still unwind.
        if selected && self.settings.image.is_none() && self.stage() == Stage::Normal {
            return;
        }
        self.selected = selected;
        if selected {
            self.authored_origin = authored
                .filter(|_| reason == Some(STORYTELLING_REASON))
                .copied();
        }
        let target = if selected { self.counter.max() } else { 0 };
        self.counter.set_target(target, now);
        self.serialize_flights();
        self.advance(now, camera, renderer);
    }

    /// Applies every stage step due by `now` and steps the field-of-view tween.
    pub fn advance(
        &mut self,
        now: Millis,
        camera: &mut CameraBridge,
        renderer: &mut dyn Renderer,
    ) {
        while let Some(step) = self.counter.poll(now) {
            self.apply(step, camera, renderer);
            self.serialize_flights();
        }
        self.tick_fov(now, camera, renderer);
    }

    /// Drops pending steps and tweens; the current stage is kept.
    pub fn cancel(&mut self) {
        self.counter.cancel();
        self.fov_tween = None;
    }

    pub fn view(&self) -> Option<PhotoView> {
        if !self.photo_mounted {
            return None;
        }
        let image = self.settings.image.clone()?;
        let opacity = if self.stage() == Stage::Photo { 1.0 } else { 0.0 };
        Some(PhotoView {
            image,
            opacity,
            transition_ms: PHOTO_FADE_MS,
        })
    }

    fn apply(
        &mut self,
        step: StageStep,
        camera: &mut CameraBridge,
        renderer: &mut dyn Renderer,
    ) {
        debug!(from = step.from, to = step.to, at = step.at.0, "photo overlay stage");
        match (Stage::from_index(step.from), Stage::from_index(step.to)) {
            (Stage::Normal, Stage::Flying) => {
                self.prev_camera = self
                    .authored_origin
                    .take()
                    .or_else(|| camera.read(renderer));
                if let Some(target) = self.settings.camera {
                    self.fly(target, step.at, camera, renderer);
                }
            }
            (Stage::Flying, Stage::Zoomed) => {
                let fov = self
                    .settings
                    .camera
                    .and_then(|c| c.fov)
                    .unwrap_or(DEFAULT_FOV);
                self.start_fov(fov, step.at, camera, renderer);
            }
            (Stage::Zoomed, Stage::Photo) => self.photo_mounted = true,
            (Stage::Zoomed, Stage::Flying) => {
                let fov = self
                    .prev_camera
                    .and_then(|c| c.fov)
                    .unwrap_or(DEFAULT_FOV);
                self.start_fov(fov, step.at, camera, renderer);
            }
            (Stage::Flying, Stage::Normal) => {
                if let Some(prev) = self.prev_camera.take() {
                    self.fly(prev, step.at, camera, renderer);
                }
                self.photo_mounted = false;
            }
            _ => {}
        }
    }

    /// Holds back any step that would start a flight until the current one lands.
    fn serialize_flights(&mut self) {
        let Some(to) = self.counter.pending_to() else {
            return;
        };
        let from = self.counter.value();
        if (from, to) == (0, 1) || (from, to) == (1, 0) {
            self.counter.defer_until(self.flight_ends_at);
        }
    }

    fn fly(
        &mut self,
        destination: CameraState,
        at: Millis,
        camera: &mut CameraBridge,
        renderer: &mut dyn Renderer,
    ) {
        let flight = Flight {
            destination,
            duration_ms: FLIGHT_DURATION_MS,
            easing: Easing::QuadraticInOut,
        };
        camera.fly_to(renderer, &flight);
        self.flight_ends_at = at.after(FLIGHT_DURATION_MS);
    }

    fn start_fov(&mut self, to: f64, at: Millis, camera: &CameraBridge, renderer: &dyn Renderer) {
        let Some(from) = camera.read(renderer).and_then(|c| c.fov) else {
            return;
        };
        self.fov_tween = Some(FovTween {
            from,
            to,
            span: TimeSpan::starting_at(at, FOV_DURATION_MS),
        });
    }

    fn tick_fov(
        &mut self,
        now: Millis,
        camera: &mut CameraBridge,
        renderer: &mut dyn Renderer,
    ) {
        let Some(tween) = self.fov_tween else {
            return;
        };
        let t = Easing::QuadraticInOut.apply(tween.span.progress(now));
        camera.set_fov(renderer, lerp(tween.from, tween.to, t));
        if tween.span.is_finished(now) {
            self.fov_tween = None;
        }
    }
}
