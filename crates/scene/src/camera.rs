use foundation::camera::{CameraState, Frustum};
use runtime::event_bus::EventBus;
use runtime::listeners::ListenerId;
use tracing::debug;

use crate::events::ViewportEvent;
use crate::renderer::{BoundingSphere, Flight, Renderer, RendererEventKind, SphereOffset};

/// Two-way sync between the host's camera value and the renderer camera.
///
/// Renderer → state: every move-end re-reads the pose and emits
/// [`ViewportEvent::CameraChanged`]. State → renderer: `sync` writes only when
/// the incoming value differs structurally from the last known pose, so the
/// echo of our own write never triggers a second write.
///
/// Non-perspective frustums turn every read and write into a no-op.
#[derive(Debug, Default)]
pub struct CameraBridge {
    last: Option<CameraState>,
    listener: Option<ListenerId>,
}

impl CameraBridge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_known(&self) -> Option<&CameraState> {
        self.last.as_ref()
    }

    pub fn is_mounted(&self) -> bool {
        self.listener.is_some()
    }

    /// Registers the move-end listener. Without an external camera the renderer's
    /// current pose is adopted and reported once.
    pub fn mount(
        &mut self,
        renderer: &mut dyn Renderer,
        external: Option<&CameraState>,
        bus: &mut EventBus<ViewportEvent>,
    ) {
        if self.listener.is_none() {
            self.listener = Some(renderer.subscribe(RendererEventKind::CameraMoveEnd));
        }
        match external {
            Some(camera) => {
                self.sync(renderer, Some(camera));
            }
            None => self.report(renderer, bus),
        }
    }

    pub fn unmount(&mut self, renderer: &mut dyn Renderer) {
        if let Some(id) = self.listener.take() {
            renderer.unsubscribe(id);
        }
    }

    pub fn on_move_end(&mut self, renderer: &mut dyn Renderer, bus: &mut EventBus<ViewportEvent>) {
        self.report(renderer, bus);
    }

    /// Pushes an external camera value into the renderer.
    ///
    /// Returns `true` if a view write was issued.
    pub fn sync(&mut self, renderer: &mut dyn Renderer, external: Option<&CameraState>) -> bool {
        let Some(camera) = external else {
            return false;
        };
        if self.last.as_ref() == Some(camera) {
            return false;
        }
        if !is_perspective(renderer) {
            return false;
        }
        renderer.set_view(camera);
        renderer.set_fov(camera.fov_or_default());
        self.last = Some(*camera);
        debug!(?camera, "camera view written");
        true
    }

    /// Reads the live pose including the frustum's field of view.
    pub fn read(&self, renderer: &dyn Renderer) -> Option<CameraState> {
        let Some(Frustum::Perspective { fov }) = renderer.frustum() else {
            return None;
        };
        let pose = renderer.camera_pose()?;
        Some(CameraState {
            fov: Some(fov),
            ..pose
        })
    }

    pub fn fly_to(&mut self, renderer: &mut dyn Renderer, flight: &Flight) {
        if !is_perspective(renderer) {
            return;
        }
        renderer.fly_to(flight);
    }

    pub fn fly_to_bounding_sphere(
        &mut self,
        renderer: &mut dyn Renderer,
        sphere: &BoundingSphere,
        offset: &SphereOffset,
        duration_ms: u64,
    ) {
        if !is_perspective(renderer) {
            return;
        }
        renderer.fly_to_bounding_sphere(sphere, offset, duration_ms);
    }

    pub fn set_fov(&mut self, renderer: &mut dyn Renderer, fov: f64) {
        if !is_perspective(renderer) {
            return;
        }
        renderer.set_fov(fov);
    }

    fn report(&mut self, renderer: &dyn Renderer, bus: &mut EventBus<ViewportEvent>) {
        let Some(pose) = self.read(renderer) else {
            return;
        };
        self.last = Some(pose);
        bus.emit(ViewportEvent::CameraChanged(pose));
    }
}

fn is_perspective(renderer: &dyn Renderer) -> bool {
    renderer.frustum().is_some_and(|f| f.is_perspective())
}

#[cfg(test)]
mod tests {
    use super::CameraBridge;
    use crate::events::ViewportEvent;
    use crate::headless::{HeadlessRenderer, RendererCommand};
    use crate::renderer::{Flight, RendererEventKind};
    use foundation::camera::{CameraState, DEFAULT_FOV, Frustum};
    use pretty_assertions::assert_eq;
    use runtime::event_bus::EventBus;

    fn c1() -> CameraState {
        CameraState::new(0.1, 0.2, 5000.0).with_orientation(0.0, -0.5, 0.0)
    }

    fn c2() -> CameraState {
        CameraState::new(0.3, 0.4, 8000.0).with_fov(0.8)
    }

    #[test]
    fn distinct_states_issue_one_set_view_each() {
        let mut r = HeadlessRenderer::new();
        let mut b = CameraBridge::new();
        assert!(b.sync(&mut r, Some(&c1())));
        assert!(!b.sync(&mut r, Some(&c1())));
        assert!(b.sync(&mut r, Some(&c2())));
        assert_eq!(r.set_view_count(), 2);
    }

    #[test]
    fn missing_fov_writes_default() {
        let mut r = HeadlessRenderer::new();
        let mut b = CameraBridge::new();
        b.sync(&mut r, Some(&c1()));
        assert_eq!(
            r.commands(),
            &[
                RendererCommand::SetView { pose: c1() },
                RendererCommand::SetFov { fov: DEFAULT_FOV },
            ]
        );
    }

    #[test]
    fn mount_without_external_adopts_renderer_pose() {
        let start = CameraState::new(1.0, 0.5, 300.0);
        let mut r = HeadlessRenderer::new().with_pose(start);
        let mut b = CameraBridge::new();
        let mut bus = EventBus::new();

        b.mount(&mut r, None, &mut bus);

        let expected = start.with_fov(DEFAULT_FOV);
        assert_eq!(bus.drain(), vec![ViewportEvent::CameraChanged(expected)]);
        assert!(r.is_listening(RendererEventKind::CameraMoveEnd));
        assert!(r.commands().is_empty());
    }

    #[test]
    fn move_end_echo_does_not_rewrite() {
        let mut r = HeadlessRenderer::new();
        let mut b = CameraBridge::new();
        let mut bus = EventBus::new();
        b.mount(&mut r, Some(&c2()), &mut bus);
        b.on_move_end(&mut r, &mut bus);

        let Some(ViewportEvent::CameraChanged(reported)) = bus.drain().pop() else {
            panic!("expected camera event");
        };
        assert_eq!(reported, c2());
        assert!(!b.sync(&mut r, Some(&reported)));
        assert_eq!(r.set_view_count(), 1);
    }

    #[test]
    fn orthographic_frustum_is_a_silent_no_op() {
        let mut r = HeadlessRenderer::new().with_frustum(Some(Frustum::Orthographic));
        let mut b = CameraBridge::new();
        let mut bus = EventBus::new();
        b.mount(&mut r, None, &mut bus);
        assert!(!b.sync(&mut r, Some(&c1())));
        b.fly_to(&mut r, &Flight::new(c1(), 100));
        b.on_move_end(&mut r, &mut bus);
        assert!(bus.is_empty());
        assert!(r.commands().is_empty());
    }

    #[test]
    fn unmount_releases_listener() {
        let mut r = HeadlessRenderer::new();
        let mut b = CameraBridge::new();
        let mut bus = EventBus::new();
        b.mount(&mut r, None, &mut bus);
        b.mount(&mut r, None, &mut bus);
        assert_eq!(r.listener_count(), 1);
        b.unmount(&mut r);
        assert_eq!(r.listener_count(), 0);
        assert!(!b.is_mounted());
    }
}
