//! The viewer's state container.
//!
//! Owns the camera controller, the feed data, the last marker snapshot and
//! the pointer/selection state. The binary forwards window events here and
//! draws what `frame` and `panels_view` return; nothing in this module
//! touches winit or the GPU.

use std::time::{Duration, Instant};

use crate::camera::{CameraController, FrameScheduler, ZoomDirection};
use crate::config::{Config, FooterLink};
use crate::feed::{FeedState, FeedUpdate};
use crate::hit_test::MarkerSnapshot;
use crate::model::{GridPoint, HistoryEntry, agent_position, explorer_url};
use crate::scene::{Scene, SceneInput, SceneRenderer};
use crate::ui::{Action, Easing, Fade, PanelTab, PanelsView, Theme, UiAction};

/// On-screen "+" multiplier.
const BUTTON_ZOOM_IN: f32 = 1.2;
/// On-screen "-" multiplier.
const BUTTON_ZOOM_OUT: f32 = 0.8;

/// Something the viewer wants done outside itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Open a URL in the system browser.
    OpenUrl(String),
    /// Close the window.
    Exit,
}

pub struct Viewer {
    controller: CameraController,
    feed: FeedState,
    renderer: SceneRenderer,
    snapshot: MarkerSnapshot,
    viewport: (f32, f32),
    agent_image: bool,
    /// Last pointer position over the canvas.
    pointer: Option<(f32, f32)>,
    /// Pointer position at the previous drag event.
    drag: Option<(f32, f32)>,
    hovered: Option<HistoryEntry>,
    selected: Option<HistoryEntry>,
    tooltip: Fade,
    tab: PanelTab,
    explorer_base: String,
    whitepaper_url: String,
    footer_links: Vec<FooterLink>,
}

impl Viewer {
    /// Starts zoomed far out; the first history response recenters.
    pub fn new(config: &Config, theme: &Theme, viewport: (f32, f32)) -> Self {
        let mut controller = CameraController::new(config.camera);
        let factor = controller.config().initial_zoom_factor;
        controller.zoom_by(factor);
        Self {
            controller,
            feed: FeedState::new(),
            renderer: SceneRenderer::new(),
            snapshot: MarkerSnapshot::default(),
            viewport,
            agent_image: false,
            pointer: None,
            drag: None,
            hovered: None,
            selected: None,
            tooltip: Fade::new(
                Duration::from_millis(theme.tooltip_fade_ms),
                Easing::EaseOut,
            ),
            tab: PanelTab::default(),
            explorer_base: config.explorer_base.clone(),
            whitepaper_url: config.whitepaper_url.clone(),
            footer_links: config.footer_links.clone(),
        }
    }

    pub fn controller(&self) -> &CameraController {
        &self.controller
    }

    pub fn feed(&self) -> &FeedState {
        &self.feed
    }

    pub fn snapshot(&self) -> &MarkerSnapshot {
        &self.snapshot
    }

    pub fn hovered(&self) -> Option<&HistoryEntry> {
        self.hovered.as_ref()
    }

    pub fn selected(&self) -> Option<&HistoryEntry> {
        self.selected.as_ref()
    }

    pub fn tab(&self) -> PanelTab {
        self.tab
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn agent(&self) -> GridPoint {
        agent_position(self.feed.history())
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.viewport = (width, height);
    }

    pub fn set_agent_image(&mut self, loaded: bool) {
        self.agent_image = loaded;
    }

    /// Fold in a poller result. Fresh history recenters on the agent at the
    /// current zoom.
    pub fn apply_feed(&mut self, update: FeedUpdate, scheduler: &dyn FrameScheduler) {
        if self.feed.apply(update) {
            let agent = self.agent();
            self.controller
                .recenter_on_agent(agent, self.viewport, false, scheduler);
        }
    }

    /// Left button down on the canvas. Opens the dialog for the hovered
    /// marker, and starts a drag either way.
    pub fn pointer_pressed(&mut self, x: f32, y: f32) {
        self.controller.cancel();
        if let Some(entry) = self.hovered.take() {
            self.selected = Some(entry);
        }
        self.tooltip.hide();
        self.pointer = Some((x, y));
        self.drag = Some((x, y));
    }

    /// Finger down on the canvas. Starts a drag; a touch never selects.
    pub fn touch_started(&mut self, x: f32, y: f32) {
        self.controller.cancel();
        self.hovered = None;
        self.tooltip.hide();
        self.pointer = Some((x, y));
        self.drag = Some((x, y));
    }

    /// Pointer motion over the canvas: pans while dragging, otherwise
    /// updates the hovered marker. Returns true if a redraw is needed.
    pub fn pointer_moved(&mut self, x: f32, y: f32, now: Instant) -> bool {
        self.pointer = Some((x, y));
        if let Some((lx, ly)) = self.drag {
            self.controller.pan_by(x - lx, y - ly);
            self.drag = Some((x, y));
            return true;
        }

        let hit = self.snapshot.find_hit(x, y).cloned();
        let changed = hit.as_ref().map(|e| e.index) != self.hovered.as_ref().map(|e| e.index);
        match &hit {
            Some(entry) => self.tooltip.show(entry.index, now),
            None => self.tooltip.hide(),
        }
        self.hovered = hit;
        // The tooltip follows the cursor, so any move over one redraws.
        changed || self.hovered.is_some()
    }

    pub fn pointer_released(&mut self) {
        self.drag = None;
    }

    /// Pointer left the canvas (or the window).
    pub fn pointer_left(&mut self) {
        self.drag = None;
        self.pointer = None;
        self.hovered = None;
        self.tooltip.hide();
    }

    /// One wheel notch over the canvas.
    pub fn wheel(&mut self, direction: ZoomDirection) {
        let factor = self.controller.config().wheel_zoom_factor;
        self.controller.zoom_step(direction, factor);
    }

    /// Recenter on the agent at the default zoom.
    pub fn locate(&mut self, scheduler: &dyn FrameScheduler) {
        let agent = self.agent();
        self.controller
            .recenter_on_agent(agent, self.viewport, true, scheduler);
    }

    /// Run a clicked widget's action.
    pub fn perform(&mut self, action: UiAction, scheduler: &dyn FrameScheduler) -> Option<Effect> {
        match action {
            UiAction::ZoomIn => self.controller.zoom_step(ZoomDirection::In, BUTTON_ZOOM_IN),
            UiAction::ZoomOut => self.controller.zoom_by(BUTTON_ZOOM_OUT),
            UiAction::Locate => self.locate(scheduler),
            UiAction::SelectTab(tab) => self.tab = tab,
            UiAction::OpenEntry(index) => {
                let entry = self.feed.history().iter().find(|e| e.index == index);
                match entry {
                    Some(entry) => {
                        self.selected = Some(entry.clone());
                        self.hovered = None;
                        self.tooltip.hide();
                    }
                    None => log::debug!("history entry #{index} no longer present"),
                }
            }
            UiAction::OpenTransaction(signature) => {
                return Some(Effect::OpenUrl(explorer_url(&self.explorer_base, &signature)));
            }
            UiAction::OpenUrl(url) => return Some(Effect::OpenUrl(url)),
            UiAction::CloseDialog => self.selected = None,
            UiAction::Absorb => {}
        }
        None
    }

    /// Run a keyboard shortcut.
    pub fn key_action(&mut self, action: Action, scheduler: &dyn FrameScheduler) -> Option<Effect> {
        match action {
            Action::ZoomIn => self.perform(UiAction::ZoomIn, scheduler),
            Action::ZoomOut => self.perform(UiAction::ZoomOut, scheduler),
            Action::Locate => self.perform(UiAction::Locate, scheduler),
            Action::NextTab => self.perform(UiAction::SelectTab(self.tab.next()), scheduler),
            Action::CloseTopmost => {
                if self.selected.take().is_some() {
                    None
                } else {
                    Some(Effect::Exit)
                }
            }
        }
    }

    /// Advance the recenter animation, then build the canvas scene and
    /// publish its marker snapshot.
    pub fn frame(&mut self, theme: &Theme, scheduler: &dyn FrameScheduler) -> Scene {
        self.controller.step(scheduler);
        let input = SceneInput {
            camera: self.controller.camera(),
            zoom: self.controller.zoom(),
            history: self.feed.history(),
            agent: self.agent(),
            viewport: self.viewport,
            agent_image: self.agent_image,
        };
        let (scene, snapshot) = self.renderer.render(&input, theme);
        self.snapshot = snapshot;
        scene
    }

    /// True while something on screen is still moving.
    pub fn needs_frame(&self, now: Instant) -> bool {
        self.controller.is_animating() || self.tooltip.is_active(now)
    }

    /// Borrow everything the overlay needs for one frame.
    pub fn panels_view(&self, now: Instant, now_ms: i64, list_scroll: f32) -> PanelsView<'_> {
        PanelsView {
            history: self.feed.history(),
            recent: self.feed.recent(),
            agent: self.agent(),
            tab: self.tab,
            hovered: self.hovered.as_ref(),
            selected: self.selected.as_ref(),
            cursor: self.pointer.unwrap_or_default(),
            tooltip_opacity: self.tooltip.opacity(now),
            loading: self.feed.loading(),
            recent_loading: self.feed.recent_loading(),
            stale: self.feed.stale(),
            stale_reason: self.feed.last_error(),
            agent_image: self.agent_image,
            now_ms,
            list_scroll,
            whitepaper_url: &self.whitepaper_url,
            footer_links: &self.footer_links,
        }
    }
}
