/// Side panel tabs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PanelTab {
    History,
    #[default]
    Recent,
}

impl PanelTab {
    pub fn title(self) -> &'static str {
        match self {
            PanelTab::History => "History",
            PanelTab::Recent => "Recent Inputs",
        }
    }

    pub fn next(self) -> Self {
        match self {
            PanelTab::History => PanelTab::Recent,
            PanelTab::Recent => PanelTab::History,
        }
    }
}

/// What a click on a widget asks the viewer to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiAction {
    ZoomIn,
    ZoomOut,
    /// Recenter on the agent at the default zoom.
    Locate,
    SelectTab(PanelTab),
    /// Open the detail dialog for the history entry with this index.
    OpenEntry(u64),
    /// Open a transaction signature in the block explorer.
    OpenTransaction(String),
    OpenUrl(String),
    CloseDialog,
    /// Swallows the click without doing anything (dialog body).
    Absorb,
}

/// Flat enum widget identity.
/// Closed set, no trait objects.
#[derive(Debug, Clone)]
pub enum Widget {
    /// Container with background, border, and optional inner shadow.
    Panel {
        bg_color: [f32; 4],     // sRGB RGBA
        border_color: [f32; 4], // sRGB RGBA
        border_width: f32,      // pixels
        shadow_width: f32,      // pixels
        corner_radius: f32,     // pixels
    },

    /// Single-line text.
    Label {
        text: String,
        color: [f32; 4], // sRGB RGBA
        font_size: f32,  // pixels
    },

    /// Clickable element with centred text and background.
    Button {
        text: String,
        color: [f32; 4],        // text color sRGB RGBA
        bg_color: [f32; 4],     // background sRGB RGBA
        border_color: [f32; 4], // border sRGB RGBA
        font_size: f32,         // pixels
        corner_radius: f32,     // pixels
    },

    /// The agent image, stretched over the node's rect.
    Image {
        opacity: f32,
        grayscale: bool,
    },

    /// Scrollable vertical list with virtual scrolling.
    /// Children are laid out vertically, each at `item_height` pixels tall.
    /// Only children within the visible viewport are laid out and drawn.
    ScrollList {
        bg_color: [f32; 4],        // background sRGB RGBA
        border_color: [f32; 4],    // border sRGB RGBA
        border_width: f32,         // pixels
        item_height: f32,          // fixed height per child item (pixels)
        scroll_offset: f32,        // scroll position (pixels from top, 0 = top)
        scrollbar_color: [f32; 4], // scrollbar thumb sRGB RGBA
        scrollbar_width: f32,      // scrollbar track width (pixels)
    },
}

impl Widget {
    /// Multiply every color's alpha by `opacity`. Used for fades.
    pub fn fade(&mut self, opacity: f32) {
        let scale = |c: &mut [f32; 4]| c[3] *= opacity;
        match self {
            Widget::Panel {
                bg_color,
                border_color,
                ..
            } => {
                scale(bg_color);
                scale(border_color);
            }
            Widget::Label { color, .. } => scale(color),
            Widget::Image { opacity: o, .. } => *o *= opacity,
            Widget::Button {
                color,
                bg_color,
                border_color,
                ..
            } => {
                scale(color);
                scale(bg_color);
                scale(border_color);
            }
            Widget::ScrollList {
                bg_color,
                border_color,
                scrollbar_color,
                ..
            } => {
                scale(bg_color);
                scale(border_color);
                scale(scrollbar_color);
            }
        }
    }
}
