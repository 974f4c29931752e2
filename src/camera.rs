use serde::{Deserialize, Serialize};

use crate::model::GridPoint;
use crate::transform::Camera;

/// Cell, history-dot and agent sizes in pixels. Always scaled together so
/// the dot/cell and worm/cell ratios never drift.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomState {
    pub cell_size: f32,
    pub dot_size: f32,
    pub worm_size: f32,
}

impl ZoomState {
    pub const DEFAULT: Self = Self {
        cell_size: 40.0,
        dot_size: 6.0,
        worm_size: 50.0,
    };

    fn scaled(self, k: f32) -> Self {
        Self {
            cell_size: self.cell_size * k,
            dot_size: self.dot_size * k,
            worm_size: self.worm_size * k,
        }
    }
}

impl Default for ZoomState {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomDirection {
    In,
    Out,
}

/// Camera tuning. Part of the on-disk config.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Smallest allowed cell size in pixels.
    pub min_cell_size: f32,
    /// Largest allowed cell size in pixels.
    pub max_cell_size: f32,
    /// Zoom restored by "locate" and by `reset_zoom`.
    pub default_zoom: ZoomState,
    /// Factor applied to the default zoom when the viewer opens.
    pub initial_zoom_factor: f32,
    /// Per-notch wheel zoom factor.
    pub wheel_zoom_factor: f32,
    /// Fraction of the remaining distance covered per animation frame.
    pub recenter_ease: f32,
    /// Per-axis distance (px) under which the recenter animation snaps.
    pub snap_threshold: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            min_cell_size: 0.5,
            max_cell_size: 400.0,
            default_zoom: ZoomState::DEFAULT,
            initial_zoom_factor: 0.1,
            wheel_zoom_factor: 1.05,
            recenter_ease: 0.1,
            snap_threshold: 1.0,
        }
    }
}

impl CameraConfig {
    /// Replace unusable values with their defaults, warning about each.
    /// Zoom bounds are checked as a pair.
    pub fn validated(self) -> Self {
        let defaults = Self::default();
        let positive = |v: f32| v.is_finite() && v > 0.0;
        let mut out = self;

        if !positive(out.min_cell_size)
            || !out.max_cell_size.is_finite()
            || out.max_cell_size < out.min_cell_size
        {
            log::warn!(
                "camera zoom bounds [{}, {}] are invalid; using [{}, {}]",
                out.min_cell_size,
                out.max_cell_size,
                defaults.min_cell_size,
                defaults.max_cell_size
            );
            out.min_cell_size = defaults.min_cell_size;
            out.max_cell_size = defaults.max_cell_size;
        }
        let z = out.default_zoom;
        if ![z.cell_size, z.dot_size, z.worm_size].into_iter().all(positive) {
            log::warn!("camera default_zoom {z:?} is invalid; using {:?}", defaults.default_zoom);
            out.default_zoom = defaults.default_zoom;
        }
        out.initial_zoom_factor = checked(
            "initial_zoom_factor",
            out.initial_zoom_factor,
            defaults.initial_zoom_factor,
            positive(out.initial_zoom_factor),
        );
        out.wheel_zoom_factor = checked(
            "wheel_zoom_factor",
            out.wheel_zoom_factor,
            defaults.wheel_zoom_factor,
            positive(out.wheel_zoom_factor),
        );
        out.recenter_ease = checked(
            "recenter_ease",
            out.recenter_ease,
            defaults.recenter_ease,
            out.recenter_ease > 0.0 && out.recenter_ease <= 1.0,
        );
        out.snap_threshold = checked(
            "snap_threshold",
            out.snap_threshold,
            defaults.snap_threshold,
            positive(out.snap_threshold),
        );
        out
    }
}

fn checked(name: &str, value: f32, default: f32, ok: bool) -> f32 {
    if ok {
        value
    } else {
        log::warn!("camera {name} = {value} is out of range; using {default}");
        default
    }
}

/// Handle of one recenter animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnimationId(u64);

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnimationState {
    Idle,
    Animating { id: AnimationId, target: Camera },
}

/// Source of display frames. The recenter animation asks for one more frame
/// each step until it converges.
pub trait FrameScheduler {
    fn request_frame(&self);
}

/// Scheduler for callers that drive frames themselves.
pub struct ManualFrames;

impl FrameScheduler for ManualFrames {
    fn request_frame(&self) {}
}

/// Sole owner of the camera offset and zoom.
///
/// Every operation that moves the camera on behalf of the user cancels an
/// in-flight recenter animation before touching state.
pub struct CameraController {
    config: CameraConfig,
    camera: Camera,
    zoom: ZoomState,
    animation: AnimationState,
    next_animation: u64,
}

impl CameraController {
    /// Invalid config values fall back to defaults.
    pub fn new(config: CameraConfig) -> Self {
        let config = config.validated();
        let mut controller = Self {
            config,
            camera: Camera::default(),
            zoom: config.default_zoom,
            animation: AnimationState::Idle,
            next_animation: 0,
        };
        controller.zoom = controller.clamp_zoom(config.default_zoom);
        controller
    }

    pub fn config(&self) -> &CameraConfig {
        &self.config
    }

    pub fn camera(&self) -> Camera {
        self.camera
    }

    pub fn zoom(&self) -> ZoomState {
        self.zoom
    }

    pub fn state(&self) -> AnimationState {
        self.animation
    }

    pub fn is_animating(&self) -> bool {
        matches!(self.animation, AnimationState::Animating { .. })
    }

    /// Stop the recenter animation, if any. Returns the cancelled id.
    pub fn cancel(&mut self) -> Option<AnimationId> {
        match std::mem::replace(&mut self.animation, AnimationState::Idle) {
            AnimationState::Animating { id, .. } => {
                log::debug!("recenter animation {:?} cancelled", id);
                Some(id)
            }
            AnimationState::Idle => None,
        }
    }

    /// Drag by a screen-space delta since the previous pointer event.
    pub fn pan_by(&mut self, dx: f32, dy: f32) {
        self.cancel();
        self.camera.x -= dx;
        self.camera.y -= dy;
    }

    pub fn set_camera(&mut self, camera: Camera) {
        self.cancel();
        self.camera = camera;
    }

    /// One zoom notch: multiply (`In`) or divide (`Out`) by `factor`.
    pub fn zoom_step(&mut self, direction: ZoomDirection, factor: f32) {
        let multiplier = match direction {
            ZoomDirection::In => factor,
            ZoomDirection::Out => 1.0 / factor,
        };
        self.zoom_by(multiplier);
    }

    /// Scale all zoom fields by `multiplier`, stopping at the cell-size
    /// bounds. Non-finite or non-positive multipliers are ignored.
    pub fn zoom_by(&mut self, multiplier: f32) {
        self.cancel();
        if !multiplier.is_finite() || multiplier <= 0.0 {
            log::warn!("ignoring zoom multiplier {multiplier}");
            return;
        }
        self.zoom = self.clamp_zoom(self.zoom.scaled(multiplier));
    }

    pub fn set_zoom_absolute(&mut self, cell_size: f32, dot_size: f32, worm_size: f32) {
        self.cancel();
        self.zoom = self.clamp_zoom(ZoomState {
            cell_size,
            dot_size,
            worm_size,
        });
    }

    pub fn reset_zoom(&mut self) {
        let z = self.config.default_zoom;
        self.set_zoom_absolute(z.cell_size, z.dot_size, z.worm_size);
    }

    /// Pull a zoom state back inside the cell-size bounds, scaling all three
    /// fields by the same factor.
    fn clamp_zoom(&self, zoom: ZoomState) -> ZoomState {
        let min = self.config.min_cell_size;
        let max = self.config.max_cell_size.max(min);
        if !zoom.cell_size.is_finite() || zoom.cell_size <= 0.0 {
            return self.config.default_zoom;
        }
        if zoom.cell_size < min {
            zoom.scaled(min / zoom.cell_size)
        } else if zoom.cell_size > max {
            zoom.scaled(max / zoom.cell_size)
        } else {
            zoom
        }
    }

    /// Camera offset that puts `agent` in the middle of the viewport.
    pub fn center_target(&self, agent: GridPoint, viewport: (f32, f32)) -> Camera {
        Camera::new(
            agent.x as f32 * self.zoom.cell_size - viewport.0 / 2.0,
            agent.y as f32 * self.zoom.cell_size - viewport.1 / 2.0,
        )
    }

    /// Start an eased move that brings the agent to the viewport centre.
    /// With `reset_zoom` the default zoom is restored first, so the target
    /// is computed at that zoom.
    pub fn recenter_on_agent(
        &mut self,
        agent: GridPoint,
        viewport: (f32, f32),
        reset_zoom: bool,
        scheduler: &dyn FrameScheduler,
    ) -> AnimationId {
        self.cancel();
        if reset_zoom {
            self.reset_zoom();
        }
        let target = self.center_target(agent, viewport);
        let id = AnimationId(self.next_animation);
        self.next_animation += 1;
        self.animation = AnimationState::Animating { id, target };
        log::debug!(
            "recenter {:?} on ({}, {}) -> ({:.1}, {:.1})",
            id,
            agent.x,
            agent.y,
            target.x,
            target.y
        );
        scheduler.request_frame();
        id
    }

    /// Advance the recenter animation by one frame. Returns true if the
    /// camera moved. Requests another frame while still animating.
    pub fn step(&mut self, scheduler: &dyn FrameScheduler) -> bool {
        let AnimationState::Animating { id, target } = self.animation else {
            return false;
        };
        let dx = target.x - self.camera.x;
        let dy = target.y - self.camera.y;
        let threshold = self.config.snap_threshold;

        let next = Camera::new(
            self.camera.x + dx * self.config.recenter_ease,
            self.camera.y + dy * self.config.recenter_ease,
        );
        // Far from the origin an f32 step can round to nothing; snap then too.
        let stalled = next == self.camera;

        if (dx.abs() < threshold && dy.abs() < threshold) || stalled {
            self.camera = target;
            self.animation = AnimationState::Idle;
            log::debug!("recenter {:?} converged", id);
            return true;
        }

        self.camera = next;
        scheduler.request_frame();
        true
    }
}
