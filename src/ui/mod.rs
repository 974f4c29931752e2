mod animation;
mod draw;
mod input;
mod keybindings;
mod panels;
mod theme;
mod widget;

pub use animation::{Easing, Fade};
pub use draw::{DrawList, PanelCommand, SpriteCommand, TextAnchor, TextCommand};
pub use input::{MouseButton, PointerOutcome, UiState};
pub use keybindings::{Action, KeyBindings, KeyCombo, ModifierFlags};
pub use panels::{PanelsView, build_panels};
pub use theme::Theme;
pub use widget::{PanelTab, UiAction, Widget};

use slotmap::{SlotMap, new_key_type};

new_key_type! {
    /// Handle into the widget arena. Stable across insertions/removals.
    pub struct WidgetId;
}

/// Estimated advance of one glyph as a fraction of the font size. Layout
/// runs without the glyph atlas, so widths are approximate.
const GLYPH_ADVANCE: f32 = 0.6;
/// Line box height as a multiple of the font size.
const LINE_HEIGHT: f32 = 1.25;

/// Approximate rendered width of `text` at `font_size`.
pub fn text_width(text: &str, font_size: f32) -> f32 {
    text.chars().count() as f32 * font_size * GLYPH_ADVANCE
}

pub fn line_height(font_size: f32) -> f32 {
    font_size * LINE_HEIGHT
}

// ---------------------------------------------------------------------------
// Geometry primitives
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    /// Returns true if the point (px, py) is inside this rectangle.
    pub fn contains(&self, px: f32, py: f32) -> bool {
        px >= self.x && px < self.x + self.width && py >= self.y && py < self.y + self.height
    }
}

/// Padding / margin edges (top, right, bottom, left, CSS order).
#[derive(Debug, Clone, Copy, Default)]
pub struct Edges {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl Edges {
    pub const ZERO: Self = Self {
        top: 0.0,
        right: 0.0,
        bottom: 0.0,
        left: 0.0,
    };

    pub fn all(v: f32) -> Self {
        Self {
            top: v,
            right: v,
            bottom: v,
            left: v,
        }
    }

    pub fn horizontal(&self) -> f32 {
        self.left + self.right
    }

    pub fn vertical(&self) -> f32 {
        self.top + self.bottom
    }
}

/// How a widget is positioned within its parent.
#[derive(Debug, Clone, Copy)]
pub enum Position {
    /// Fixed pixel offset from parent's content origin.
    Fixed { x: f32, y: f32 },
}

impl Default for Position {
    fn default() -> Self {
        Position::Fixed { x: 0.0, y: 0.0 }
    }
}

/// How a widget's width/height is determined.
#[derive(Debug, Clone, Copy, Default)]
pub enum Sizing {
    /// Fixed pixel size.
    Fixed(f32),
    /// Fit to content (intrinsic size from measure).
    #[default]
    Fit,
}

// ---------------------------------------------------------------------------
// Widget node (arena entry)
// ---------------------------------------------------------------------------

/// Arena entry pairing a widget with tree/layout metadata.
pub struct WidgetNode {
    pub widget: Widget,
    pub parent: Option<WidgetId>,
    pub children: Vec<WidgetId>,
    pub position: Position,
    pub width: Sizing,
    pub height: Sizing,
    pub padding: Edges,
    pub margin: Edges,
    /// Computed layout rect (set by layout pass).
    pub rect: Rect,
    /// Dispatched when the node (or a descendant without its own action)
    /// is clicked.
    pub action: Option<UiAction>,
    /// Non-interactive subtrees are drawn but never hit.
    pub interactive: bool,
}

impl WidgetNode {
    fn new(widget: Widget, parent: Option<WidgetId>) -> Self {
        Self {
            widget,
            parent,
            children: Vec::new(),
            position: Position::default(),
            width: Sizing::default(),
            height: Sizing::default(),
            padding: Edges::ZERO,
            margin: Edges::ZERO,
            rect: Rect::default(),
            action: None,
            interactive: true,
        }
    }
}

// ---------------------------------------------------------------------------
// WidgetTree
// ---------------------------------------------------------------------------

/// Arena-backed retained widget tree. Roots later in the list draw on top.
pub struct WidgetTree {
    arena: SlotMap<WidgetId, WidgetNode>,
    roots: Vec<WidgetId>,
}

impl Default for WidgetTree {
    fn default() -> Self {
        Self::new()
    }
}

impl WidgetTree {
    pub fn new() -> Self {
        Self {
            arena: SlotMap::with_key(),
            roots: Vec::new(),
        }
    }

    /// Insert a widget as a root (no parent).
    pub fn insert_root(&mut self, widget: Widget) -> WidgetId {
        let id = self.arena.insert(WidgetNode::new(widget, None));
        self.roots.push(id);
        id
    }

    /// Insert a widget as a child of `parent`. Returns the new widget's id.
    pub fn insert(&mut self, parent: WidgetId, widget: Widget) -> WidgetId {
        let id = self.arena.insert(WidgetNode::new(widget, Some(parent)));
        if let Some(parent_node) = self.arena.get_mut(parent) {
            parent_node.children.push(id);
        }
        id
    }

    fn collect_subtree(
        arena: &SlotMap<WidgetId, WidgetNode>,
        id: WidgetId,
        out: &mut Vec<WidgetId>,
    ) {
        out.push(id);
        if let Some(node) = arena.get(id) {
            for &child in &node.children {
                Self::collect_subtree(arena, child, out);
            }
        }
    }

    pub fn get(&self, id: WidgetId) -> Option<&WidgetNode> {
        self.arena.get(id)
    }

    pub fn get_mut(&mut self, id: WidgetId) -> Option<&mut WidgetNode> {
        self.arena.get_mut(id)
    }

    pub fn set_position(&mut self, id: WidgetId, pos: Position) {
        if let Some(node) = self.arena.get_mut(id) {
            node.position = pos;
        }
    }

    pub fn set_sizing(&mut self, id: WidgetId, w: Sizing, h: Sizing) {
        if let Some(node) = self.arena.get_mut(id) {
            node.width = w;
            node.height = h;
        }
    }

    pub fn set_padding(&mut self, id: WidgetId, padding: Edges) {
        if let Some(node) = self.arena.get_mut(id) {
            node.padding = padding;
        }
    }

    pub fn set_action(&mut self, id: WidgetId, action: UiAction) {
        if let Some(node) = self.arena.get_mut(id) {
            node.action = Some(action);
        }
    }

    pub fn set_interactive(&mut self, id: WidgetId, interactive: bool) {
        if let Some(node) = self.arena.get_mut(id) {
            node.interactive = interactive;
        }
    }

    // ------------------------------------------------------------------
    // Hit testing
    // ------------------------------------------------------------------

    /// Find the topmost interactive widget whose rect contains (x, y).
    /// Walks back-to-front: last child / last root is topmost.
    pub fn hit_test(&self, x: f32, y: f32) -> Option<WidgetId> {
        for &root in self.roots.iter().rev() {
            if let Some(hit) = self.hit_test_node(root, x, y) {
                return Some(hit);
            }
        }
        None
    }

    fn hit_test_node(&self, id: WidgetId, x: f32, y: f32) -> Option<WidgetId> {
        let node = self.arena.get(id)?;
        if !node.interactive || !node.rect.contains(x, y) {
            return None;
        }
        for &child in node.children.iter().rev() {
            if let Some(hit) = self.hit_test_node(child, x, y) {
                return Some(hit);
            }
        }
        Some(id)
    }

    /// Action of `id` or its nearest ancestor that has one.
    pub fn action_for(&self, id: WidgetId) -> Option<&UiAction> {
        let mut current = Some(id);
        while let Some(cid) = current {
            let node = self.arena.get(cid)?;
            if let Some(action) = &node.action {
                return Some(action);
            }
            current = node.parent;
        }
        None
    }

    /// Nearest ScrollList at or above `id`.
    pub fn scroll_list_ancestor(&self, id: WidgetId) -> Option<WidgetId> {
        let mut current = Some(id);
        while let Some(cid) = current {
            let node = self.arena.get(cid)?;
            if matches!(node.widget, Widget::ScrollList { .. }) {
                return Some(cid);
            }
            current = node.parent;
        }
        None
    }

    // ------------------------------------------------------------------
    // Layout
    // ------------------------------------------------------------------

    /// Run the full layout pass over the tree. `screen` is the available area.
    pub fn layout(&mut self, screen: Size) {
        let root_ids: Vec<WidgetId> = self.roots.clone();
        for root in root_ids {
            self.layout_node(
                root,
                Rect {
                    x: 0.0,
                    y: 0.0,
                    width: screen.width,
                    height: screen.height,
                },
            );
        }
    }

    fn layout_node(&mut self, id: WidgetId, parent_content: Rect) {
        let measured = self.measure_node(id);

        let Some(node) = self.arena.get_mut(id) else {
            return;
        };

        let resolved_w = match node.width {
            Sizing::Fixed(px) => px,
            Sizing::Fit => measured.width + node.padding.horizontal(),
        };
        let resolved_h = match node.height {
            Sizing::Fixed(px) => px,
            Sizing::Fit => measured.height + node.padding.vertical(),
        };

        let Position::Fixed { x: ox, y: oy } = node.position;

        node.rect = Rect {
            x: parent_content.x + node.margin.left + ox,
            y: parent_content.y + node.margin.top + oy,
            width: resolved_w,
            height: resolved_h,
        };

        let content = Rect {
            x: node.rect.x + node.padding.left,
            y: node.rect.y + node.padding.top,
            width: (node.rect.width - node.padding.horizontal()).max(0.0),
            height: (node.rect.height - node.padding.vertical()).max(0.0),
        };

        // ScrollList stacks children vertically and skips those out of view.
        if let Widget::ScrollList {
            item_height,
            scroll_offset,
            scrollbar_width,
            ..
        } = &node.widget
        {
            let ih = *item_height;
            let so = *scroll_offset;
            let content_w = (content.width - *scrollbar_width).max(0.0);
            let children: Vec<WidgetId> = node.children.clone();

            for (i, child_id) in children.iter().enumerate() {
                let item_y = i as f32 * ih - so;
                if item_y + ih <= 0.0 || item_y >= content.height {
                    self.clear_rects(*child_id);
                    continue;
                }
                self.layout_scroll_item(
                    *child_id,
                    Rect {
                        x: content.x,
                        y: content.y + item_y,
                        width: content_w,
                        height: ih,
                    },
                );
            }
            return;
        }

        let children: Vec<WidgetId> = node.children.clone();
        for child in children {
            self.layout_node(child, content);
        }
    }

    /// Zero the rects of a subtree so it neither draws nor hits.
    fn clear_rects(&mut self, id: WidgetId) {
        let mut ids = Vec::new();
        Self::collect_subtree(&self.arena, id, &mut ids);
        for cid in ids {
            if let Some(node) = self.arena.get_mut(cid) {
                node.rect = Rect::default();
            }
        }
    }

    fn layout_scroll_item(&mut self, id: WidgetId, rect: Rect) {
        let Some(node) = self.arena.get_mut(id) else {
            return;
        };
        node.rect = rect;

        let content = Rect {
            x: rect.x + node.padding.left,
            y: rect.y + node.padding.top,
            width: (rect.width - node.padding.horizontal()).max(0.0),
            height: (rect.height - node.padding.vertical()).max(0.0),
        };

        let children: Vec<WidgetId> = node.children.clone();
        for child in children {
            self.layout_node(child, content);
        }
    }

    /// Measure intrinsic size of a widget (content only, no padding).
    pub fn measure_node(&self, id: WidgetId) -> Size {
        let Some(node) = self.arena.get(id) else {
            return Size::default();
        };

        match &node.widget {
            Widget::Label {
                text, font_size, ..
            } => Size {
                width: text_width(text, *font_size),
                height: line_height(*font_size),
            },
            Widget::Button {
                text, font_size, ..
            } => Size {
                // 8px horizontal, 4px vertical internal padding.
                width: text_width(text, *font_size) + 16.0,
                height: line_height(*font_size) + 8.0,
            },
            // Images are always given a fixed size.
            Widget::Image { .. } => Size::default(),
            Widget::Panel { .. } => {
                // Panel measures from children bounding box.
                let mut max_w: f32 = 0.0;
                let mut max_h: f32 = 0.0;
                for &child_id in &node.children {
                    if let Some(child) = self.arena.get(child_id) {
                        let m = self.measure_node(child_id);
                        let Position::Fixed { x: cx, y: cy } = child.position;
                        let cw = match child.width {
                            Sizing::Fixed(px) => px,
                            _ => m.width + child.padding.horizontal(),
                        };
                        let ch = match child.height {
                            Sizing::Fixed(px) => px,
                            _ => m.height + child.padding.vertical(),
                        };
                        max_w = max_w.max(cx + cw + child.margin.horizontal());
                        max_h = max_h.max(cy + ch + child.margin.vertical());
                    }
                }
                Size {
                    width: max_w,
                    height: max_h,
                }
            }
            Widget::ScrollList {
                item_height,
                scrollbar_width,
                ..
            } => {
                let mut max_w: f32 = 0.0;
                for &child_id in &node.children {
                    max_w = max_w.max(self.measure_node(child_id).width);
                }
                Size {
                    width: max_w + scrollbar_width,
                    height: node.children.len() as f32 * item_height,
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Draw
    // ------------------------------------------------------------------

    /// Walk the tree and emit draw commands into a `DrawList`.
    pub fn draw(&self, draw_list: &mut DrawList) {
        for &root in &self.roots {
            self.draw_node(root, draw_list);
        }
    }

    fn draw_node(&self, id: WidgetId, draw_list: &mut DrawList) {
        let Some(node) = self.arena.get(id) else {
            return;
        };
        let rect = node.rect;

        match &node.widget {
            Widget::Panel {
                bg_color,
                border_color,
                border_width,
                shadow_width,
                corner_radius,
            } => {
                draw_list.panels.push(PanelCommand {
                    x: rect.x,
                    y: rect.y,
                    width: rect.width,
                    height: rect.height,
                    bg_color: *bg_color,
                    border_color: *border_color,
                    border_width: *border_width,
                    shadow_width: *shadow_width,
                    corner_radius: *corner_radius,
                });
            }
            Widget::Label {
                text,
                color,
                font_size,
            } => {
                draw_list.texts.push(TextCommand {
                    text: text.clone(),
                    x: rect.x,
                    y: rect.y,
                    color: *color,
                    font_size: *font_size,
                    anchor: TextAnchor::Top,
                });
            }
            Widget::Image { opacity, grayscale } => {
                draw_list.sprites.push(SpriteCommand {
                    opacity: *opacity,
                    grayscale: *grayscale,
                    ..SpriteCommand::opaque(rect.x, rect.y, rect.width, rect.height)
                });
            }
            Widget::Button {
                text,
                color,
                bg_color,
                border_color,
                font_size,
                corner_radius,
            } => {
                draw_list.panels.push(PanelCommand {
                    x: rect.x,
                    y: rect.y,
                    width: rect.width,
                    height: rect.height,
                    bg_color: *bg_color,
                    border_color: *border_color,
                    border_width: 1.0,
                    shadow_width: 0.0,
                    corner_radius: *corner_radius,
                });
                let tw = text_width(text, *font_size);
                let th = line_height(*font_size);
                draw_list.texts.push(TextCommand {
                    text: text.clone(),
                    x: rect.x + (rect.width - tw) / 2.0,
                    y: rect.y + (rect.height - th) / 2.0,
                    color: *color,
                    font_size: *font_size,
                    anchor: TextAnchor::Top,
                });
            }
            Widget::ScrollList {
                bg_color,
                border_color,
                border_width,
                item_height,
                scroll_offset,
                scrollbar_color,
                scrollbar_width,
            } => {
                draw_list.panels.push(PanelCommand {
                    x: rect.x,
                    y: rect.y,
                    width: rect.width,
                    height: rect.height,
                    bg_color: *bg_color,
                    border_color: *border_color,
                    border_width: *border_width,
                    shadow_width: 0.0,
                    corner_radius: 0.0,
                });

                for &child in &node.children {
                    if let Some(cn) = self.arena.get(child)
                        && cn.rect.width > 0.0
                        && cn.rect.height > 0.0
                    {
                        self.draw_node(child, draw_list);
                    }
                }

                // Scrollbar thumb (hidden when content fits).
                let viewport_h = (rect.height - node.padding.vertical()).max(0.0);
                let total_h = node.children.len() as f32 * item_height;
                if total_h > viewport_h && viewport_h > 0.0 {
                    let thumb_h = (viewport_h * viewport_h / total_h).max(Self::MIN_THUMB_HEIGHT);
                    let track_range = viewport_h - thumb_h;
                    let max_scroll = total_h - viewport_h;
                    let content_y = rect.y + node.padding.top;
                    let thumb_y = content_y + (scroll_offset / max_scroll) * track_range;
                    let sb_x = rect.x + rect.width - scrollbar_width - node.padding.right;
                    draw_list.panels.push(PanelCommand {
                        corner_radius: scrollbar_width / 2.0,
                        ..PanelCommand::fill(sb_x, thumb_y, *scrollbar_width, thumb_h, *scrollbar_color)
                    });
                }
                return;
            }
        }

        for &child in &node.children {
            self.draw_node(child, draw_list);
        }
    }

    // ------------------------------------------------------------------
    // ScrollList helpers
    // ------------------------------------------------------------------

    /// Minimum scrollbar thumb height in pixels.
    const MIN_THUMB_HEIGHT: f32 = 20.0;

    /// Maximum scroll offset for a ScrollList; 0 if content fits.
    pub fn max_scroll(&self, id: WidgetId) -> f32 {
        let Some(node) = self.arena.get(id) else {
            return 0.0;
        };
        let Widget::ScrollList { item_height, .. } = &node.widget else {
            return 0.0;
        };
        let viewport_h = (node.rect.height - node.padding.vertical()).max(0.0);
        let total_h = node.children.len() as f32 * item_height;
        (total_h - viewport_h).max(0.0)
    }

    pub fn scroll_offset(&self, id: WidgetId) -> f32 {
        match self.arena.get(id).map(|n| &n.widget) {
            Some(Widget::ScrollList { scroll_offset, .. }) => *scroll_offset,
            _ => 0.0,
        }
    }

    /// Set scroll offset for a ScrollList, clamped to the valid range.
    /// Takes effect at the next layout.
    pub fn set_scroll_offset(&mut self, id: WidgetId, offset: f32) {
        let max = self.max_scroll(id);
        if let Some(node) = self.arena.get_mut(id)
            && let Widget::ScrollList { scroll_offset, .. } = &mut node.widget
        {
            *scroll_offset = offset.clamp(0.0, max);
        }
    }

    /// Scroll a ScrollList by a delta (positive = down).
    pub fn scroll_by(&mut self, id: WidgetId, delta: f32) {
        let current = self.scroll_offset(id);
        self.set_scroll_offset(id, current + delta);
    }
}
