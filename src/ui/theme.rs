/// Centralized visual style constants.
///
/// Single global theme. Widgets and the scene builder read from Theme at
/// construction time instead of hardcoding colors.
#[derive(Debug, Clone)]
pub struct Theme {
    // -- Canvas (sRGB RGBA) --
    /// Surface clear color: white.
    pub canvas_bg: [f32; 4],
    /// Grid lines: rgba(200,200,200,0.5).
    pub grid_line: [f32; 4],
    /// Grid line thickness in pixels.
    pub grid_line_width: f32,
    /// Grid coordinate labels: black.
    pub grid_label: [f32; 4],
    /// Grid label font size in pixels.
    pub grid_label_size: f32,

    // -- History markers --
    /// Ordinary history entry: grey at 70%.
    pub marker_neutral: [f32; 4],
    /// Entry under the agent: fully transparent grey.
    pub marker_current: [f32; 4],
    /// Entry at the world origin: red at 70%.
    pub marker_genesis: [f32; 4],

    // -- Agent --
    /// Agent name label beneath the sprite.
    pub agent_label: [f32; 4],
    /// Agent label font size in pixels.
    pub agent_label_size: f32,
    /// Fallback disc drawn when the agent image is unavailable.
    pub agent_fallback: [f32; 4],

    // -- Panel palette --
    /// Panel background: white, nearly opaque.
    pub panel_bg: [f32; 4],
    /// Panel border: #E5E7EB.
    pub panel_border_color: [f32; 4],
    pub panel_border_width: f32,
    pub panel_shadow_width: f32,
    /// Primary text: #111827.
    pub text_primary: [f32; 4],
    /// Secondary text: #4B5563.
    pub text_secondary: [f32; 4],
    /// Muted text: #9CA3AF.
    pub text_muted: [f32; 4],
    /// "Current" accent: #16A34A.
    pub accent_current: [f32; 4],
    /// "Genesis" accent: #2563EB.
    pub accent_genesis: [f32; 4],
    /// Links: #3B82F6.
    pub link: [f32; 4],
    /// Stale-data warning: #C04040.
    pub danger: [f32; 4],
    /// Hash badge background: #F3F4F6.
    pub badge_bg: [f32; 4],

    // -- Buttons --
    /// Dark button background: #18181B.
    pub button_bg: [f32; 4],
    pub button_text: [f32; 4],
    /// Unselected tab background (transparent).
    pub tab_inactive_bg: [f32; 4],
    pub button_corner_radius: f32,

    // -- Fonts --
    /// Header font size in pixels.
    pub font_header_size: f32,
    /// Body font size in pixels.
    pub font_body_size: f32,
    /// Small/data font size in pixels.
    pub font_data_size: f32,

    // -- Spacing --
    pub panel_padding: f32,
    pub label_gap: f32,
    pub screen_margin: f32,

    // -- Side panel --
    pub side_panel_width: f32,
    pub side_panel_height: f32,

    // -- ScrollList --
    pub scrollbar_width: f32,
    pub scrollbar_color: [f32; 4],
    pub scroll_item_height: f32,

    // -- Tooltip --
    /// Offset from the cursor to the tooltip's top-left corner.
    pub tooltip_offset_x: f32,
    pub tooltip_offset_y: f32,
    pub tooltip_padding: f32,
    pub tooltip_width: f32,
    /// Fade-in duration in milliseconds.
    pub tooltip_fade_ms: u64,
    /// At most this many activator hashes are listed in the tooltip.
    pub tooltip_max_hashes: usize,

    // -- Dialog --
    pub dialog_width: f32,
    pub dialog_backdrop: [f32; 4],
}

/// Convert a hex color (#RRGGBB) to sRGB [f32; 4] with alpha 1.0.
const fn hex(r: u8, g: u8, b: u8) -> [f32; 4] {
    [r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0, 1.0]
}

/// Convert a hex color with custom alpha.
const fn hex_a(r: u8, g: u8, b: u8, a: f32) -> [f32; 4] {
    [r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0, a]
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            canvas_bg: hex(0xFF, 0xFF, 0xFF),
            grid_line: hex_a(200, 200, 200, 0.5),
            grid_line_width: 0.5,
            grid_label: hex(0x00, 0x00, 0x00),
            grid_label_size: 10.0,

            marker_neutral: hex_a(128, 128, 128, 0.7),
            marker_current: hex_a(128, 128, 128, 0.0),
            marker_genesis: hex_a(255, 0, 0, 0.7),

            agent_label: hex(0x00, 0x00, 0x00),
            agent_label_size: 15.0,
            agent_fallback: hex(0xE8, 0x8A, 0x9B),

            panel_bg: hex_a(0xFF, 0xFF, 0xFF, 0.95),
            panel_border_color: hex(0xE5, 0xE7, 0xEB),
            panel_border_width: 1.0,
            panel_shadow_width: 4.0,
            text_primary: hex(0x11, 0x18, 0x27),
            text_secondary: hex(0x4B, 0x55, 0x63),
            text_muted: hex(0x9C, 0xA3, 0xAF),
            accent_current: hex(0x16, 0xA3, 0x4A),
            accent_genesis: hex(0x25, 0x63, 0xEB),
            link: hex(0x3B, 0x82, 0xF6),
            danger: hex(0xC0, 0x40, 0x40),
            badge_bg: hex(0xF3, 0xF4, 0xF6),

            button_bg: hex(0x18, 0x18, 0x1B),
            button_text: hex(0xFA, 0xFA, 0xFA),
            tab_inactive_bg: hex_a(0xFF, 0xFF, 0xFF, 0.0),
            button_corner_radius: 6.0,

            font_header_size: 16.0,
            font_body_size: 12.0,
            font_data_size: 10.0,

            panel_padding: 8.0,
            label_gap: 4.0,
            screen_margin: 16.0,

            side_panel_width: 300.0,
            side_panel_height: 300.0,

            scrollbar_width: 6.0,
            scrollbar_color: hex_a(0x9C, 0xA3, 0xAF, 0.6),
            scroll_item_height: 20.0,

            tooltip_offset_x: 10.0,
            tooltip_offset_y: 10.0,
            tooltip_padding: 12.0,
            tooltip_width: 240.0,
            tooltip_fade_ms: 200,
            tooltip_max_hashes: 3,

            dialog_width: 420.0,
            dialog_backdrop: hex_a(0x00, 0x00, 0x00, 0.3),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marker_palette() {
        let t = Theme::default();

        // Neutral grey at 70%.
        assert!((t.marker_neutral[0] - 0.502).abs() < 0.01);
        assert!((t.marker_neutral[3] - 0.7).abs() < 0.01);

        // Current position is drawn fully transparent.
        assert_eq!(t.marker_current[3], 0.0);

        // Genesis is red.
        assert!((t.marker_genesis[0] - 1.0).abs() < 0.001);
        assert!(t.marker_genesis[1].abs() < 0.001);
        assert!(t.marker_genesis[3] > 0.0);
    }

    #[test]
    fn hex_conversion() {
        let white = hex(0xFF, 0xFF, 0xFF);
        assert!((white[0] - 1.0).abs() < 0.001);
        assert!((white[3] - 1.0).abs() < 0.001);

        let black = hex(0x00, 0x00, 0x00);
        assert!(black[0].abs() < 0.001);

        let half_alpha = hex_a(0x80, 0x80, 0x80, 0.5);
        assert!((half_alpha[3] - 0.5).abs() < 0.001);
    }

    #[test]
    fn grid_lines_are_translucent() {
        let t = Theme::default();
        assert!(t.grid_line[3] > 0.0 && t.grid_line[3] < 1.0);
        assert!(t.grid_line_width > 0.0);
    }
}
