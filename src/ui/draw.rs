/// Intermediate draw command for a panel quad.
/// Consumed by `PanelRenderer::add_panel()`.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelCommand {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub bg_color: [f32; 4],     // sRGB RGBA
    pub border_color: [f32; 4], // sRGB RGBA
    pub border_width: f32,
    pub shadow_width: f32,
    /// Rounded-corner radius; half the shorter side gives a circle.
    pub corner_radius: f32,
}

impl PanelCommand {
    /// Flat rectangle with no border.
    pub fn fill(x: f32, y: f32, width: f32, height: f32, color: [f32; 4]) -> Self {
        Self {
            x,
            y,
            width,
            height,
            bg_color: color,
            border_color: [0.0; 4],
            border_width: 0.0,
            shadow_width: 0.0,
            corner_radius: 0.0,
        }
    }

    /// Filled disc centred on (cx, cy).
    pub fn disc(cx: f32, cy: f32, radius: f32, color: [f32; 4]) -> Self {
        Self {
            corner_radius: radius,
            ..Self::fill(cx - radius, cy - radius, radius * 2.0, radius * 2.0, color)
        }
    }
}

/// Vertical anchor of a text run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TextAnchor {
    /// `y` is the top of the line box (widgets).
    #[default]
    Top,
    /// `y` is the baseline (canvas labels).
    Baseline,
}

/// Intermediate draw command for a text run.
/// Consumed by `TextRenderer::prepare()`.
#[derive(Debug, Clone, PartialEq)]
pub struct TextCommand {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub color: [f32; 4], // sRGB RGBA
    pub font_size: f32,
    pub anchor: TextAnchor,
}

/// Intermediate draw command for a textured quad.
/// Consumed by `SpriteRenderer::add_command()`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpriteCommand {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Multiplies the texture's alpha.
    pub opacity: f32,
    /// Draw the texture desaturated.
    pub grayscale: bool,
}

impl SpriteCommand {
    /// Full-colour, fully opaque quad.
    pub fn opaque(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            opacity: 1.0,
            grayscale: false,
        }
    }
}

/// Collects draw commands for one layer.
/// Decouples widget and scene logic from GPU renderers.
#[derive(Debug, Default)]
pub struct DrawList {
    pub panels: Vec<PanelCommand>,
    pub texts: Vec<TextCommand>,
    pub sprites: Vec<SpriteCommand>,
}

impl DrawList {
    pub fn new() -> Self {
        Self::default()
    }
}
