//! Frame construction for the grid viewport.
//!
//! Builds a fresh `Scene` from camera, zoom and history each pass and
//! publishes the `MarkerSnapshot` the hit-tester reads. This module is
//! read-only over its inputs; the GPU backends consume the result.

use crate::camera::ZoomState;
use crate::hit_test::{MarkerSnapshot, RenderedMarker};
use crate::model::{GridPoint, HistoryEntry};
use crate::transform::{Camera, first_grid_line, label_interval, screen_to_world_cell, world_to_screen};
use crate::ui::{DrawList, PanelCommand, SpriteCommand, TextAnchor, TextCommand, Theme};

/// Everything a render pass reads.
pub struct SceneInput<'a> {
    pub camera: Camera,
    pub zoom: ZoomState,
    pub history: &'a [HistoryEntry],
    pub agent: GridPoint,
    /// Viewport size in pixels.
    pub viewport: (f32, f32),
    /// Whether the agent sprite texture is loaded.
    pub agent_image: bool,
}

/// Axis-aligned filled rectangle (grid lines).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneRect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
    pub color: [f32; 4],
}

/// Text run. `y` is the baseline.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneText {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub color: [f32; 4],
}

/// Display category of a history marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    Genesis,
    Current,
    Neutral,
}

impl MarkerKind {
    /// Origin wins over the agent position.
    pub fn of(entry: &HistoryEntry, agent: GridPoint) -> Self {
        if entry.is_at_origin() {
            MarkerKind::Genesis
        } else if entry.position() == agent {
            MarkerKind::Current
        } else {
            MarkerKind::Neutral
        }
    }

    pub fn color(self, theme: &Theme) -> [f32; 4] {
        match self {
            MarkerKind::Genesis => theme.marker_genesis,
            MarkerKind::Current => theme.marker_current,
            MarkerKind::Neutral => theme.marker_neutral,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneMarker {
    pub cx: f32,
    pub cy: f32,
    pub radius: f32,
    pub kind: MarkerKind,
    pub color: [f32; 4],
    pub index: u64,
}

/// How the agent itself is drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AgentGlyph {
    /// Textured quad, top-left corner and edge length.
    Sprite { x: f32, y: f32, size: f32 },
    /// Filled disc used until (or instead of) the sprite.
    Fallback {
        cx: f32,
        cy: f32,
        radius: f32,
        color: [f32; 4],
    },
}

/// One frame's worth of canvas draw data, back to front.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub clear: [f32; 4],
    pub grid_lines: Vec<SceneRect>,
    pub labels: Vec<SceneText>,
    pub markers: Vec<SceneMarker>,
    pub agent: AgentGlyph,
    pub agent_label: SceneText,
}

impl Scene {
    /// Emit draw commands for the canvas layer, back to front.
    pub fn draw(&self, draw_list: &mut DrawList) {
        for line in &self.grid_lines {
            draw_list
                .panels
                .push(PanelCommand::fill(line.x, line.y, line.w, line.h, line.color));
        }
        for marker in &self.markers {
            // Transparent markers stay in the snapshot but cost no quad.
            if marker.color[3] > 0.0 {
                draw_list
                    .panels
                    .push(PanelCommand::disc(marker.cx, marker.cy, marker.radius, marker.color));
            }
        }
        match self.agent {
            AgentGlyph::Sprite { x, y, size } => {
                draw_list.sprites.push(SpriteCommand::opaque(x, y, size, size))
            }
            AgentGlyph::Fallback {
                cx,
                cy,
                radius,
                color,
            } => draw_list.panels.push(PanelCommand::disc(cx, cy, radius, color)),
        }
        for label in self.labels.iter().chain(std::iter::once(&self.agent_label)) {
            draw_list.texts.push(TextCommand {
                text: label.text.clone(),
                x: label.x,
                y: label.y,
                color: label.color,
                font_size: label.size,
                anchor: TextAnchor::Baseline,
            });
        }
    }
}

/// Produces scenes and numbers the marker snapshots it publishes.
#[derive(Debug, Default)]
pub struct SceneRenderer {
    version: u64,
}

impl SceneRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a scene from scratch and the snapshot of the markers in it.
    pub fn render(&mut self, input: &SceneInput<'_>, theme: &Theme) -> (Scene, MarkerSnapshot) {
        self.version += 1;

        let mut grid_lines = Vec::new();
        let mut labels = Vec::new();
        build_grid(input, theme, &mut grid_lines, &mut labels);

        let cell = input.zoom.cell_size;
        let radius = input.zoom.worm_size / 8.0;
        let mut markers = Vec::with_capacity(input.history.len());
        let mut rendered = Vec::with_capacity(input.history.len());
        for entry in input.history {
            let (sx, sy) = world_to_screen(entry.position(), input.camera, cell);
            let kind = MarkerKind::of(entry, input.agent);
            markers.push(SceneMarker {
                cx: sx,
                cy: sy,
                radius,
                kind,
                color: kind.color(theme),
                index: entry.index,
            });
            rendered.push(RenderedMarker {
                x: sx,
                y: sy,
                entry: entry.clone(),
            });
        }

        let worm = input.zoom.worm_size;
        let (ax, ay) = world_to_screen(input.agent, input.camera, cell);
        let agent = if input.agent_image {
            AgentGlyph::Sprite {
                x: ax - worm / 2.0,
                y: ay - worm / 2.0,
                size: worm,
            }
        } else {
            AgentGlyph::Fallback {
                cx: ax,
                cy: ay,
                radius: worm / 2.0,
                color: theme.agent_fallback,
            }
        };
        let agent_label = SceneText {
            text: "Worm".to_string(),
            x: ax - 20.0,
            y: ay + worm * 0.5,
            size: theme.agent_label_size,
            color: theme.agent_label,
        };

        let scene = Scene {
            clear: theme.canvas_bg,
            grid_lines,
            labels,
            markers,
            agent,
            agent_label,
        };
        let snapshot = MarkerSnapshot::new(self.version, worm / 2.0, rendered);
        (scene, snapshot)
    }
}

/// Grid lines at every cell boundary inside the viewport, plus coordinate
/// labels on multiples of the label interval.
fn build_grid(input: &SceneInput<'_>, theme: &Theme, lines: &mut Vec<SceneRect>, labels: &mut Vec<SceneText>) {
    let (width, height) = input.viewport;
    let cell = input.zoom.cell_size;
    if width <= 0.0 || height <= 0.0 || !cell.is_finite() || cell <= 0.0 {
        return;
    }
    let interval = label_interval(cell);
    let lw = theme.grid_line_width;
    let half = lw / 2.0;

    let mut x = first_grid_line(input.camera.x, cell);
    while x < width {
        lines.push(SceneRect {
            x: x - half,
            y: 0.0,
            w: lw,
            h: height,
            color: theme.grid_line,
        });
        // Nudge into the cell so float error cannot land on the previous one.
        let gx = screen_to_world_cell(x + cell * 0.5, 0.0, input.camera, cell).x;
        if gx.rem_euclid(interval) == 0 {
            labels.push(SceneText {
                text: gx.to_string(),
                x: x + 2.0,
                y: 10.0,
                size: theme.grid_label_size,
                color: theme.grid_label,
            });
        }
        x += cell;
    }

    let mut y = first_grid_line(input.camera.y, cell);
    while y < height {
        lines.push(SceneRect {
            x: 0.0,
            y: y - half,
            w: width,
            h: lw,
            color: theme.grid_line,
        });
        let gy = screen_to_world_cell(0.0, y + cell * 0.5, input.camera, cell).y;
        if gy.rem_euclid(interval) == 0 {
            labels.push(SceneText {
                text: gy.to_string(),
                x: 2.0,
                y: y - 2.0,
                size: theme.grid_label_size,
                color: theme.grid_label,
            });
        }
        y += cell;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Direction;

    fn entry(x: i32, y: i32, index: u64) -> HistoryEntry {
        HistoryEntry {
            x,
            y,
            index,
            direction: Direction::Right,
            timestamp: 0,
            affected_transactions: Vec::new(),
        }
    }

    fn input(history: &[HistoryEntry], agent: GridPoint) -> SceneInput<'_> {
        SceneInput {
            camera: Camera::new(-400.0, -300.0),
            zoom: ZoomState::DEFAULT,
            history,
            agent,
            viewport: (800.0, 600.0),
            agent_image: false,
        }
    }

    #[test]
    fn origin_marker_is_genesis_even_under_agent() {
        let theme = Theme::default();
        let history = vec![entry(2, 0, 0), entry(0, 0, 7)];
        let mut r = SceneRenderer::new();
        let (scene, _) = r.render(&input(&history, GridPoint::ORIGIN), &theme);

        let origin = scene.markers.iter().find(|m| m.index == 7).expect("marker");
        assert_eq!(origin.kind, MarkerKind::Genesis);
        assert_eq!(origin.color, theme.marker_genesis);
        assert_eq!(scene.markers[0].kind, MarkerKind::Neutral);
    }

    #[test]
    fn current_marker_is_transparent_but_hit_testable() {
        let theme = Theme::default();
        let history = vec![entry(0, 0, 0), entry(5, 3, 1)];
        let agent = GridPoint::new(5, 3);
        let mut r = SceneRenderer::new();
        let inp = input(&history, agent);
        let (scene, snap) = r.render(&inp, &theme);

        let current = &scene.markers[1];
        assert_eq!(current.kind, MarkerKind::Current);
        assert_eq!(current.color[3], 0.0);

        let (sx, sy) = world_to_screen(agent, inp.camera, inp.zoom.cell_size);
        assert_eq!(snap.find_hit(sx, sy).map(|e| e.index), Some(1));
    }

    #[test]
    fn marker_radius_and_hit_radius_follow_worm_size() {
        let theme = Theme::default();
        let history = vec![entry(1, 1, 0)];
        let mut r = SceneRenderer::new();
        let (scene, snap) = r.render(&input(&history, GridPoint::new(1, 1)), &theme);
        assert_eq!(scene.markers[0].radius, 50.0 / 8.0);
        assert_eq!(snap.hit_radius, 25.0);
    }

    #[test]
    fn labels_thin_out_when_zoomed_out() {
        let theme = Theme::default();
        let mut r = SceneRenderer::new();
        let mut inp = input(&[], GridPoint::ORIGIN);
        inp.camera = Camera::default();

        let (dense, _) = r.render(&inp, &theme);
        // 800 / 40 = 20 columns, all labelled; 600 / 40 = 15 rows.
        assert_eq!(dense.labels.len(), 35);

        inp.zoom = ZoomState {
            cell_size: 10.0,
            dot_size: 1.5,
            worm_size: 12.5,
        };
        let (sparse, _) = r.render(&inp, &theme);
        // Interval 4: columns 0,4,..,76 and rows 0,4,..,56.
        assert_eq!(sparse.labels.len(), 20 + 15);
        assert!(sparse.labels.iter().all(|l| l.text.parse::<i32>().map(|v| v % 4 == 0).unwrap_or(false)));
        assert_eq!(sparse.grid_lines.len(), 80 + 60);
    }

    #[test]
    fn grid_labels_sit_on_top_and_left_edges() {
        let theme = Theme::default();
        let mut r = SceneRenderer::new();
        let mut inp = input(&[], GridPoint::ORIGIN);
        inp.camera = Camera::new(-80.0, 40.0);
        let (scene, _) = r.render(&inp, &theme);

        let x_label = scene.labels.iter().find(|l| l.text == "0" && l.y == 10.0).expect("x label");
        assert_eq!(x_label.x, 82.0);
        // Row 2 starts at 2*40 - 40 = 40 on screen.
        let y_label = scene.labels.iter().find(|l| l.text == "2" && l.x == 2.0).expect("y label");
        assert_eq!(y_label.y, 38.0);
    }

    #[test]
    fn negative_coordinates_are_labelled() {
        let theme = Theme::default();
        let mut r = SceneRenderer::new();
        let (scene, _) = r.render(&input(&[], GridPoint::ORIGIN), &theme);
        assert!(scene.labels.iter().any(|l| l.text == "-10"));
        assert!(scene.labels.iter().any(|l| l.text == "-7"));
    }

    #[test]
    fn agent_uses_sprite_when_loaded() {
        let theme = Theme::default();
        let mut r = SceneRenderer::new();
        let mut inp = input(&[], GridPoint::new(1, 0));
        let (fallback, _) = r.render(&inp, &theme);
        assert!(matches!(fallback.agent, AgentGlyph::Fallback { .. }));

        inp.agent_image = true;
        let (scene, _) = r.render(&inp, &theme);
        // Agent at screen (440, 300), drawn 50 px square around it.
        assert_eq!(
            scene.agent,
            AgentGlyph::Sprite {
                x: 415.0,
                y: 275.0,
                size: 50.0
            }
        );
        assert_eq!(scene.agent_label.text, "Worm");
        assert_eq!((scene.agent_label.x, scene.agent_label.y), (420.0, 325.0));
    }

    #[test]
    fn rendering_is_idempotent_and_versions_increase() {
        let theme = Theme::default();
        let history = vec![entry(0, 0, 0), entry(1, 0, 1), entry(1, 1, 2)];
        let mut r = SceneRenderer::new();
        let inp = input(&history, GridPoint::new(1, 1));
        let (a, snap_a) = r.render(&inp, &theme);
        let (b, snap_b) = r.render(&inp, &theme);
        assert_eq!(a, b);
        assert_eq!(snap_a.markers, snap_b.markers);
        assert_eq!((snap_a.version, snap_b.version), (1, 2));
    }

    #[test]
    fn empty_viewport_has_no_grid() {
        let theme = Theme::default();
        let mut r = SceneRenderer::new();
        let mut inp = input(&[], GridPoint::ORIGIN);
        inp.viewport = (0.0, 0.0);
        let (scene, _) = r.render(&inp, &theme);
        assert!(scene.grid_lines.is_empty());
        assert!(scene.labels.is_empty());
    }

    #[test]
    fn draw_list_skips_transparent_markers() {
        let theme = Theme::default();
        let history = vec![entry(0, 0, 0), entry(3, 0, 1), entry(5, 3, 2)];
        let mut r = SceneRenderer::new();
        let (scene, _) = r.render(&input(&history, GridPoint::new(5, 3)), &theme);

        let mut dl = DrawList::new();
        scene.draw(&mut dl);
        // Grid lines, two visible markers, fallback agent disc.
        assert_eq!(dl.panels.len(), scene.grid_lines.len() + 2 + 1);
        assert!(dl.sprites.is_empty());
        assert_eq!(dl.texts.len(), scene.labels.len() + 1);
        assert!(dl.texts.iter().all(|t| t.anchor == TextAnchor::Baseline));
        assert_eq!(dl.texts.last().map(|t| t.text.as_str()), Some("Worm"));
    }
}
