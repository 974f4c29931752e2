//! Builds the overlay widget tree from viewer state.
//!
//! The tree is rebuilt every frame: controls, side panel, footer links,
//! loading/stale indicators, hover tooltip and the detail dialog, in that
//! back-to-front order.

use super::widget::{PanelTab, UiAction, Widget};
use super::{Edges, Position, Size, Sizing, Theme, WidgetId, WidgetTree, line_height, text_width};
use crate::config::FooterLink;
use crate::model::{EntryKind, GridPoint, HistoryEntry, TransactionRecord, shorten_hash, time_ago};

/// Everything the overlay shows, borrowed from the viewer for one frame.
pub struct PanelsView<'a> {
    pub history: &'a [HistoryEntry],
    pub recent: &'a [TransactionRecord],
    pub agent: GridPoint,
    pub tab: PanelTab,
    pub hovered: Option<&'a HistoryEntry>,
    pub selected: Option<&'a HistoryEntry>,
    pub cursor: (f32, f32),
    pub tooltip_opacity: f32,
    pub loading: bool,
    /// No recent-transactions response yet.
    pub recent_loading: bool,
    pub stale: bool,
    /// Why the data is stale, shown under the stale pill.
    pub stale_reason: Option<&'a str>,
    /// Whether the agent image is available for the portrait.
    pub agent_image: bool,
    /// Wall clock in unix milliseconds, for "time ago" labels.
    pub now_ms: i64,
    pub list_scroll: f32,
    pub whitepaper_url: &'a str,
    pub footer_links: &'a [FooterLink],
}

const ZOOM_BUTTON: f32 = 40.0;
const LOCATE_HEIGHT: f32 = 36.0;
const TAB_ROW_HEIGHT: f32 = 28.0;
const BADGE_HEIGHT: f32 = 20.0;
/// Dialog badge rows shown before the rest is summarised.
const MAX_BADGE_ROWS: usize = 6;
/// Side of the agent portrait in the tooltip and dialog.
const PORTRAIT: f32 = 64.0;
/// Portrait opacity for any entry other than the current one.
const PORTRAIT_DIM: f32 = 0.3;
/// Stale reasons longer than this are cut with "...".
const MAX_REASON_CHARS: usize = 72;

/// Build and lay out the overlay for one frame.
pub fn build_panels(view: &PanelsView<'_>, theme: &Theme, screen: Size) -> WidgetTree {
    let mut tree = WidgetTree::new();

    build_zoom_controls(&mut tree, theme);
    build_locate_button(&mut tree, theme, screen);
    build_footer_links(&mut tree, view.footer_links, theme, screen);
    let list = build_side_panel(&mut tree, view, theme, screen);
    build_status(&mut tree, view, theme, screen);
    build_tooltip(&mut tree, view, theme, screen);
    build_dialog(&mut tree, view, theme, screen);

    tree.layout(screen);

    // The list may have shrunk since the offset was recorded.
    if let Some(list) = list
        && tree.scroll_offset(list) > tree.max_scroll(list)
    {
        let max = tree.max_scroll(list);
        tree.set_scroll_offset(list, max);
        tree.layout(screen);
    }
    tree
}

fn label(text: impl Into<String>, color: [f32; 4], font_size: f32) -> Widget {
    Widget::Label {
        text: text.into(),
        color,
        font_size,
    }
}

fn panel(theme: &Theme, corner_radius: f32) -> Widget {
    Widget::Panel {
        bg_color: theme.panel_bg,
        border_color: theme.panel_border_color,
        border_width: theme.panel_border_width,
        shadow_width: theme.panel_shadow_width,
        corner_radius,
    }
}

fn flat(color: [f32; 4], corner_radius: f32) -> Widget {
    Widget::Panel {
        bg_color: color,
        border_color: [0.0; 4],
        border_width: 0.0,
        shadow_width: 0.0,
        corner_radius,
    }
}

fn place(tree: &mut WidgetTree, id: WidgetId, x: f32, y: f32) {
    tree.set_position(id, Position::Fixed { x, y });
}

fn build_zoom_controls(tree: &mut WidgetTree, theme: &Theme) {
    let controls = [("+", UiAction::ZoomIn), ("-", UiAction::ZoomOut)];
    for (i, (text, action)) in controls.into_iter().enumerate() {
        let id = tree.insert_root(Widget::Button {
            text: text.to_string(),
            color: theme.button_text,
            bg_color: theme.button_bg,
            border_color: theme.button_bg,
            font_size: 20.0,
            corner_radius: ZOOM_BUTTON / 2.0,
        });
        let y = theme.screen_margin + i as f32 * (ZOOM_BUTTON + theme.panel_padding);
        place(tree, id, theme.screen_margin, y);
        tree.set_sizing(id, Sizing::Fixed(ZOOM_BUTTON), Sizing::Fixed(ZOOM_BUTTON));
        tree.set_action(id, action);
    }
}

fn build_locate_button(tree: &mut WidgetTree, theme: &Theme, screen: Size) {
    let text = "Locate the Worm";
    let width = text_width(text, theme.font_header_size) + 32.0;
    let id = tree.insert_root(Widget::Button {
        text: text.to_string(),
        color: theme.button_text,
        bg_color: theme.button_bg,
        border_color: theme.button_bg,
        font_size: theme.font_header_size,
        corner_radius: theme.button_corner_radius,
    });
    place(
        tree,
        id,
        ((screen.width - width) / 2.0).max(theme.screen_margin),
        screen.height - theme.screen_margin - LOCATE_HEIGHT,
    );
    tree.set_sizing(id, Sizing::Fixed(width), Sizing::Fixed(LOCATE_HEIGHT));
    tree.set_action(id, UiAction::Locate);
}

fn build_footer_links(tree: &mut WidgetTree, links: &[FooterLink], theme: &Theme, screen: Size) {
    let height = line_height(theme.font_body_size) + 12.0;
    let y = screen.height - theme.screen_margin - height;
    let mut right = screen.width - theme.screen_margin;
    for link in links.iter().rev() {
        let width = text_width(&link.label, theme.font_body_size) + 20.0;
        right -= width;
        let id = tree.insert_root(Widget::Button {
            text: link.label.clone(),
            color: theme.text_primary,
            bg_color: theme.panel_bg,
            border_color: theme.panel_border_color,
            font_size: theme.font_body_size,
            corner_radius: height / 2.0,
        });
        place(tree, id, right, y);
        tree.set_sizing(id, Sizing::Fixed(width), Sizing::Fixed(height));
        tree.set_action(id, UiAction::OpenUrl(link.url.clone()));
        right -= theme.label_gap * 2.0;
    }
}

/// Tabs plus the active tab's list. Returns the ScrollList, if one was built.
fn build_side_panel(
    tree: &mut WidgetTree,
    view: &PanelsView<'_>,
    theme: &Theme,
    screen: Size,
) -> Option<WidgetId> {
    let width = theme.side_panel_width.min(screen.width - 2.0 * theme.screen_margin);
    let height = theme
        .side_panel_height
        .min(screen.height - 2.0 * theme.screen_margin);
    if width <= 0.0 || height <= TAB_ROW_HEIGHT {
        return None;
    }
    let pad = theme.panel_padding;
    let root = tree.insert_root(panel(theme, theme.button_corner_radius));
    place(tree, root, screen.width - theme.screen_margin - width, theme.screen_margin);
    tree.set_sizing(root, Sizing::Fixed(width), Sizing::Fixed(height));
    tree.set_padding(root, Edges::all(pad));
    // Clicks on the panel background never reach the canvas.
    tree.set_action(root, UiAction::Absorb);

    let mut x = 0.0;
    for tab in [PanelTab::History, PanelTab::Recent] {
        let active = tab == view.tab;
        let text = tab.title();
        let tab_w = text_width(text, theme.font_body_size) + 16.0;
        let id = tree.insert(
            root,
            Widget::Button {
                text: text.to_string(),
                color: if active {
                    theme.text_primary
                } else {
                    theme.text_muted
                },
                bg_color: theme.tab_inactive_bg,
                border_color: theme.tab_inactive_bg,
                font_size: theme.font_body_size,
                corner_radius: 0.0,
            },
        );
        place(tree, id, x, 0.0);
        tree.set_sizing(id, Sizing::Fixed(tab_w), Sizing::Fixed(TAB_ROW_HEIGHT - 2.0));
        tree.set_action(id, UiAction::SelectTab(tab));
        if active {
            let underline = tree.insert(root, flat(theme.text_primary, 0.0));
            place(tree, underline, x, TAB_ROW_HEIGHT - 2.0);
            tree.set_sizing(underline, Sizing::Fixed(tab_w), Sizing::Fixed(2.0));
        }
        x += tab_w + theme.label_gap;
    }

    let inner_w = width - 2.0 * pad;
    let mut top = TAB_ROW_HEIGHT + theme.label_gap;
    let row_w = inner_w - theme.scrollbar_width - 8.0;

    let rows: Vec<Row> = match view.tab {
        PanelTab::History => history_rows(view, theme, row_w),
        PanelTab::Recent => {
            if view.recent.is_empty() {
                let text = if view.recent_loading {
                    "Loading inputs..."
                } else {
                    "Waiting for inputs (txs)..."
                };
                let waiting = tree.insert(root, label(text, theme.text_muted, theme.font_body_size));
                place(tree, waiting, 0.0, top + theme.label_gap);
                return None;
            }
            let headers = [("Time", 0.0), ("From", RECENT_FROM_X)];
            for (text, hx) in headers {
                let id = tree.insert(root, label(text, theme.text_muted, theme.font_data_size));
                place(tree, id, hx + 4.0, top);
            }
            let amount = tree.insert(root, label("Amount", theme.text_muted, theme.font_data_size));
            place(
                tree,
                amount,
                4.0 + row_w - text_width("Amount", theme.font_data_size),
                top,
            );
            top += line_height(theme.font_data_size) + theme.label_gap;
            recent_rows(view, theme, row_w)
        }
    };

    let list = tree.insert(
        root,
        Widget::ScrollList {
            bg_color: [0.0; 4],
            border_color: [0.0; 4],
            border_width: 0.0,
            item_height: theme.scroll_item_height,
            scroll_offset: view.list_scroll.max(0.0),
            scrollbar_color: theme.scrollbar_color,
            scrollbar_width: theme.scrollbar_width,
        },
    );
    place(tree, list, 0.0, top);
    tree.set_sizing(
        list,
        Sizing::Fixed(inner_w),
        Sizing::Fixed((height - 2.0 * pad - top).max(0.0)),
    );

    for row in rows {
        let row_id = tree.insert(list, flat([0.0; 4], 4.0));
        tree.set_padding(row_id, Edges::all(4.0));
        tree.set_action(row_id, row.action);
        for cell in row.cells {
            let widget = if cell.badge {
                flat(theme.badge_bg, BADGE_HEIGHT / 2.0)
            } else {
                label(cell.text.clone(), cell.color, theme.font_body_size)
            };
            let id = tree.insert(row_id, widget);
            if cell.badge {
                let text = tree.insert(id, label(cell.text, cell.color, theme.font_data_size));
                place(tree, text, 6.0, 1.0);
                place(tree, id, cell.x, -2.0);
            } else {
                place(tree, id, cell.x, 0.0);
            }
        }
    }
    Some(list)
}

const RECENT_FROM_X: f32 = 72.0;

struct Cell {
    text: String,
    x: f32,
    color: [f32; 4],
    badge: bool,
}

struct Row {
    action: UiAction,
    cells: Vec<Cell>,
}

fn right_aligned(text: String, right: f32, font_size: f32, color: [f32; 4]) -> Cell {
    Cell {
        x: right - text_width(&text, font_size),
        text,
        color,
        badge: false,
    }
}

/// Newest first; the newest row reads "now".
fn history_rows(view: &PanelsView<'_>, theme: &Theme, row_w: f32) -> Vec<Row> {
    let mut sorted: Vec<&HistoryEntry> = view.history.iter().collect();
    sorted.sort_by(|a, b| b.index.cmp(&a.index));

    let size = theme.font_body_size;
    sorted
        .into_iter()
        .enumerate()
        .map(|(i, entry)| {
            let when = if i == 0 {
                "now".to_string()
            } else {
                time_ago(view.now_ms.saturating_sub(entry.timestamp))
            };
            let time_cell = right_aligned(when, row_w, size, theme.text_muted);
            let dir_right = time_cell.x - theme.label_gap * 2.0;
            let dir_cell = right_aligned(
                entry.direction.as_str().to_string(),
                dir_right,
                size,
                theme.text_muted,
            );
            Row {
                action: UiAction::OpenEntry(entry.index),
                cells: vec![
                    Cell {
                        text: format!("({}, {})", entry.x, entry.y),
                        x: 0.0,
                        color: theme.text_secondary,
                        badge: false,
                    },
                    dir_cell,
                    time_cell,
                ],
            }
        })
        .collect()
}

fn recent_rows(view: &PanelsView<'_>, theme: &Theme, row_w: f32) -> Vec<Row> {
    let size = theme.font_body_size;
    view.recent
        .iter()
        .map(|tx| {
            let when = match tx.block_time {
                Some(secs) => time_ago(view.now_ms.saturating_sub(secs.saturating_mul(1000))),
                None => "Pending".to_string(),
            };
            Row {
                action: UiAction::OpenTransaction(tx.signature.clone()),
                cells: vec![
                    Cell {
                        text: when,
                        x: 0.0,
                        color: theme.text_secondary,
                        badge: false,
                    },
                    Cell {
                        text: shorten_hash(&tx.from),
                        x: RECENT_FROM_X,
                        color: theme.text_secondary,
                        badge: true,
                    },
                    right_aligned(tx.amount_sol(), row_w, size, theme.text_secondary),
                ],
            }
        })
        .collect()
}

/// Loading veil before the first history response; stale pill after a
/// failed fetch. Neither blocks the canvas.
fn build_status(tree: &mut WidgetTree, view: &PanelsView<'_>, theme: &Theme, screen: Size) {
    if view.loading {
        let veil = tree.insert_root(flat([1.0, 1.0, 1.0, 0.5], 0.0));
        tree.set_sizing(veil, Sizing::Fixed(screen.width), Sizing::Fixed(screen.height));
        tree.set_interactive(veil, false);
        let text = "Loading...";
        let id = tree.insert(veil, label(text, theme.text_secondary, theme.font_header_size));
        place(
            tree,
            id,
            (screen.width - text_width(text, theme.font_header_size)) / 2.0,
            (screen.height - line_height(theme.font_header_size)) / 2.0,
        );
    }

    if view.stale {
        let text = "Connection lost, showing last known data";
        let reason = view.stale_reason.map(|r| ellipsize(r, MAX_REASON_CHARS));
        let mut width = text_width(text, theme.font_body_size);
        let mut height = line_height(theme.font_body_size) + 10.0;
        if let Some(reason) = &reason {
            width = width.max(text_width(reason, theme.font_data_size));
            height += line_height(theme.font_data_size) + 2.0;
        }
        let width = (width + 24.0).min(screen.width - 2.0 * theme.screen_margin);
        let pill = tree.insert_root(panel(theme, 12.0));
        place(tree, pill, (screen.width - width) / 2.0, theme.screen_margin);
        tree.set_sizing(pill, Sizing::Fixed(width), Sizing::Fixed(height));
        tree.set_interactive(pill, false);
        let id = tree.insert(pill, label(text, theme.danger, theme.font_body_size));
        place(tree, id, 12.0, 5.0);
        if let Some(reason) = reason {
            let id = tree.insert(pill, label(reason, theme.text_muted, theme.font_data_size));
            place(tree, id, 12.0, 7.0 + line_height(theme.font_body_size));
        }
    }
}

/// Cut `text` to `max` characters, marking the cut with "...".
fn ellipsize(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{kept}...")
}

fn title_color(kind: EntryKind, theme: &Theme) -> [f32; 4] {
    match kind {
        EntryKind::Current => theme.accent_current,
        EntryKind::Genesis => theme.accent_genesis,
        EntryKind::StepsAgo(_) => theme.text_primary,
    }
}

/// Stacks children top to bottom inside a fixed-width container.
struct Stack {
    parent: WidgetId,
    y: f32,
    gap: f32,
}

impl Stack {
    fn push(&mut self, tree: &mut WidgetTree, widget: Widget) -> WidgetId {
        let id = tree.insert(self.parent, widget);
        place(tree, id, 0.0, self.y);
        self.y += tree.measure_node(id).height + self.gap;
        id
    }

    /// Agent portrait centred in `width`. Any entry but the current one is
    /// greyed out under a "?".
    fn push_portrait(
        &mut self,
        tree: &mut WidgetTree,
        view: &PanelsView<'_>,
        theme: &Theme,
        width: f32,
        current: bool,
    ) {
        let widget = if view.agent_image {
            Widget::Image {
                opacity: if current { 1.0 } else { PORTRAIT_DIM },
                grayscale: !current,
            }
        } else {
            let mut color = theme.agent_fallback;
            if !current {
                color[3] *= PORTRAIT_DIM;
            }
            flat(color, PORTRAIT / 2.0)
        };
        let id = tree.insert(self.parent, widget);
        place(tree, id, (width - PORTRAIT) / 2.0, self.y);
        tree.set_sizing(id, Sizing::Fixed(PORTRAIT), Sizing::Fixed(PORTRAIT));
        if !current {
            let size = theme.font_header_size + 2.0;
            let mark = tree.insert(id, label("?", theme.text_muted, size));
            place(
                tree,
                mark,
                (PORTRAIT - text_width("?", size)) / 2.0,
                (PORTRAIT - line_height(size)) / 2.0,
            );
        }
        self.y += PORTRAIT + self.gap;
    }
}

fn build_tooltip(tree: &mut WidgetTree, view: &PanelsView<'_>, theme: &Theme, screen: Size) {
    let Some(entry) = view.hovered else {
        return;
    };
    if view.tooltip_opacity <= 0.0 || view.selected.is_some() {
        return;
    }
    let kind = EntryKind::classify(entry, view.agent, view.history);
    let width = theme.tooltip_width;
    let pad = theme.tooltip_padding;

    let root = tree.insert_root(panel(theme, theme.button_corner_radius));
    tree.set_padding(root, Edges::all(pad));
    tree.set_interactive(root, false);

    let mut stack = Stack {
        parent: root,
        y: 0.0,
        gap: theme.label_gap,
    };
    let current = matches!(kind, EntryKind::Current);
    stack.push_portrait(tree, view, theme, width - 2.0 * pad, current);
    stack.push(
        tree,
        label(kind.tooltip_title(), title_color(kind, theme), theme.font_header_size),
    );
    stack.push(
        tree,
        label(
            format!("Position: ({}, {})", entry.x, entry.y),
            theme.text_secondary,
            theme.font_body_size,
        ),
    );
    if !entry.affected_transactions.is_empty() {
        stack.push(tree, label("Activators:", theme.text_muted, theme.font_body_size));
        for tx in entry
            .affected_transactions
            .iter()
            .take(theme.tooltip_max_hashes)
        {
            stack.push(
                tree,
                label(shorten_hash(tx), theme.text_secondary, theme.font_data_size),
            );
        }
    }

    // Keep the tooltip on screen by flipping to the other side of the cursor.
    let height = stack.y - theme.label_gap + 2.0 * pad;
    let (cx, cy) = view.cursor;
    let mut x = cx + theme.tooltip_offset_x;
    let mut y = cy + theme.tooltip_offset_y;
    if x + width > screen.width {
        x = (cx - theme.tooltip_offset_x - width).max(0.0);
    }
    if y + height > screen.height {
        y = (cy - theme.tooltip_offset_y - height).max(0.0);
    }
    place(tree, root, x, y);
    tree.set_sizing(root, Sizing::Fixed(width), Sizing::Fixed(height));

    fade_subtree(tree, root, view.tooltip_opacity);
}

fn fade_subtree(tree: &mut WidgetTree, id: WidgetId, opacity: f32) {
    let children = match tree.get_mut(id) {
        Some(node) => {
            node.widget.fade(opacity);
            node.children.clone()
        }
        None => return,
    };
    for child in children {
        fade_subtree(tree, child, opacity);
    }
}

fn build_dialog(tree: &mut WidgetTree, view: &PanelsView<'_>, theme: &Theme, screen: Size) {
    let Some(entry) = view.selected else {
        return;
    };
    let kind = EntryKind::classify(entry, view.agent, view.history);

    let backdrop = tree.insert_root(flat(theme.dialog_backdrop, 0.0));
    tree.set_sizing(backdrop, Sizing::Fixed(screen.width), Sizing::Fixed(screen.height));
    tree.set_action(backdrop, UiAction::CloseDialog);

    let width = theme.dialog_width.min(screen.width - 2.0 * theme.screen_margin);
    let pad = theme.panel_padding * 2.0;
    let inner_w = width - 2.0 * pad;
    let dialog = tree.insert(backdrop, panel(theme, theme.button_corner_radius));
    tree.set_padding(dialog, Edges::all(pad));
    tree.set_action(dialog, UiAction::Absorb);

    let close = tree.insert(
        dialog,
        Widget::Button {
            text: "x".to_string(),
            color: theme.text_secondary,
            bg_color: theme.tab_inactive_bg,
            border_color: theme.tab_inactive_bg,
            font_size: theme.font_body_size,
            corner_radius: 4.0,
        },
    );
    place(tree, close, inner_w - 24.0, 0.0);
    tree.set_sizing(close, Sizing::Fixed(24.0), Sizing::Fixed(24.0));
    tree.set_action(close, UiAction::CloseDialog);

    let mut stack = Stack {
        parent: dialog,
        y: 0.0,
        gap: theme.label_gap * 2.0,
    };
    let current = matches!(kind, EntryKind::Current);
    stack.push_portrait(tree, view, theme, inner_w, current);
    stack.push(
        tree,
        label(kind.dialog_title(), theme.text_primary, theme.font_header_size + 2.0),
    );
    stack.push(
        tree,
        label(
            format!("Position: ({}, {})", entry.x, entry.y),
            theme.text_primary,
            theme.font_body_size,
        ),
    );
    stack.push(
        tree,
        label(
            format!("Inputs ({})", entry.affected_transactions.len()),
            theme.text_primary,
            theme.font_body_size,
        ),
    );

    // Badges flow left to right and wrap.
    let mut bx = 0.0;
    let mut rows = 0usize;
    let mut shown = 0usize;
    if !entry.affected_transactions.is_empty() {
        rows = 1;
    }
    for tx in &entry.affected_transactions {
        let text = shorten_hash(tx);
        let bw = text_width(&text, theme.font_data_size) + 12.0;
        if bx > 0.0 && bx + bw > inner_w {
            if rows == MAX_BADGE_ROWS {
                break;
            }
            rows += 1;
            bx = 0.0;
        }
        let by = stack.y + (rows - 1) as f32 * (BADGE_HEIGHT + theme.label_gap);
        let badge = tree.insert(dialog, flat(theme.badge_bg, BADGE_HEIGHT / 2.0));
        place(tree, badge, bx, by);
        tree.set_sizing(badge, Sizing::Fixed(bw), Sizing::Fixed(BADGE_HEIGHT));
        tree.set_action(badge, UiAction::OpenTransaction(tx.clone()));
        let t = tree.insert(badge, label(text, theme.text_secondary, theme.font_data_size));
        place(tree, t, 6.0, 3.0);
        bx += bw + theme.label_gap;
        shown += 1;
    }
    stack.y += rows as f32 * (BADGE_HEIGHT + theme.label_gap);
    let hidden = entry.affected_transactions.len() - shown;
    if hidden > 0 {
        stack.push(
            tree,
            label(format!("+{hidden} more"), theme.text_muted, theme.font_data_size),
        );
    }
    stack.y += theme.label_gap;

    stack.push(
        tree,
        label(
            format!("Neural Output: {}", entry.direction.label()),
            theme.text_primary,
            theme.font_body_size,
        ),
    );
    let link = stack.push(
        tree,
        label("Read the whitepaper", theme.link, theme.font_body_size),
    );
    tree.set_action(link, UiAction::OpenUrl(view.whitepaper_url.to_string()));

    let height = stack.y - stack.gap + 2.0 * pad;
    place(
        tree,
        dialog,
        (screen.width - width) / 2.0,
        ((screen.height - height) / 2.0).max(theme.screen_margin),
    );
    tree.set_sizing(dialog, Sizing::Fixed(width), Sizing::Fixed(height));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Direction;
    use crate::ui::DrawList;

    const SCREEN: Size = Size {
        width: 1280.0,
        height: 800.0,
    };

    fn entry(x: i32, y: i32, index: u64, timestamp: i64, txs: &[&str]) -> HistoryEntry {
        HistoryEntry {
            x,
            y,
            index,
            direction: Direction::Left,
            timestamp,
            affected_transactions: txs.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn view<'a>(history: &'a [HistoryEntry], recent: &'a [TransactionRecord]) -> PanelsView<'a> {
        PanelsView {
            history,
            recent,
            agent: history.last().map(HistoryEntry::position).unwrap_or_default(),
            tab: PanelTab::Recent,
            hovered: None,
            selected: None,
            cursor: (0.0, 0.0),
            tooltip_opacity: 1.0,
            loading: false,
            recent_loading: false,
            stale: false,
            stale_reason: None,
            agent_image: true,
            now_ms: 600_000,
            list_scroll: 0.0,
            whitepaper_url: "/whitepaper.pdf",
            footer_links: &[],
        }
    }

    fn texts(tree: &WidgetTree) -> Vec<String> {
        let mut dl = DrawList::new();
        tree.draw(&mut dl);
        dl.texts.into_iter().map(|t| t.text).collect()
    }

    fn action_at_text(tree: &WidgetTree, text: &str) -> Option<UiAction> {
        let mut dl = DrawList::new();
        tree.draw(&mut dl);
        let t = dl.texts.iter().find(|t| t.text == text)?;
        let id = tree.hit_test(t.x + 1.0, t.y + 1.0)?;
        tree.action_for(id).cloned()
    }

    #[test]
    fn empty_recent_tab_waits_for_inputs() {
        let tree = build_panels(&view(&[], &[]), &Theme::default(), SCREEN);
        let t = texts(&tree);
        assert!(t.iter().any(|s| s == "Waiting for inputs (txs)..."));
        assert!(t.iter().any(|s| s == "Locate the Worm"));
        assert!(t.iter().any(|s| s == "+"));
    }

    #[test]
    fn controls_carry_actions() {
        let tree = build_panels(&view(&[], &[]), &Theme::default(), SCREEN);
        assert_eq!(action_at_text(&tree, "+"), Some(UiAction::ZoomIn));
        assert_eq!(action_at_text(&tree, "-"), Some(UiAction::ZoomOut));
        assert_eq!(action_at_text(&tree, "Locate the Worm"), Some(UiAction::Locate));
        assert_eq!(
            action_at_text(&tree, "History"),
            Some(UiAction::SelectTab(PanelTab::History))
        );
    }

    #[test]
    fn history_rows_newest_first() {
        let history = vec![
            entry(0, 0, 0, 0, &[]),
            entry(1, 0, 1, 480_000, &[]),
            entry(1, 1, 2, 590_000, &[]),
        ];
        let mut v = view(&history, &[]);
        v.tab = PanelTab::History;
        let tree = build_panels(&v, &Theme::default(), SCREEN);
        let t = texts(&tree);
        let pos: Vec<usize> = ["(1, 1)", "(1, 0)", "(0, 0)"]
            .iter()
            .map(|p| t.iter().position(|s| s == p).expect("row"))
            .collect();
        assert!(pos[0] < pos[1] && pos[1] < pos[2]);
        assert!(t.iter().any(|s| s == "now"));
        assert!(t.iter().any(|s| s == "2m ago"));
        assert!(t.iter().any(|s| s == "10m ago"));
        assert_eq!(action_at_text(&tree, "(1, 0)"), Some(UiAction::OpenEntry(1)));
    }

    #[test]
    fn recent_rows_format_amount_and_sender() {
        let recent = vec![
            TransactionRecord {
                signature: "sig-one".to_string(),
                from: "ABCDEFGHIJKLMNOP".to_string(),
                amount: 1_500_000_000,
                block_time: Some(570),
            },
            TransactionRecord {
                signature: "sig-two".to_string(),
                from: "short".to_string(),
                amount: 10_000_000,
                block_time: None,
            },
        ];
        let tree = build_panels(&view(&[], &recent), &Theme::default(), SCREEN);
        let t = texts(&tree);
        for expected in ["30s ago", "ABCD...MNOP", "1.50", "Pending", "short", "0.01"] {
            assert!(t.iter().any(|s| s == expected), "missing {expected}: {t:?}");
        }
        assert_eq!(
            action_at_text(&tree, "Pending"),
            Some(UiAction::OpenTransaction("sig-two".to_string()))
        );
    }

    #[test]
    fn tooltip_titles_and_hashes() {
        let history = vec![
            entry(0, 0, 0, 0, &[]),
            entry(5, 3, 1, 0, &["aaaaaaaaaa1", "bbbbbbbbbb2", "cccccccccc3", "dddddddddd4"]),
        ];
        let theme = Theme::default();
        let mut v = view(&history, &[]);
        v.hovered = Some(&history[1]);
        let t = texts(&build_panels(&v, &theme, SCREEN));
        assert!(t.iter().any(|s| s == "Current Position"));
        assert!(t.iter().any(|s| s == "Position: (5, 3)"));
        assert!(t.iter().any(|s| s == "cccc...ccc3"));
        assert!(!t.iter().any(|s| s == "dddd...ddd4"));

        v.hovered = Some(&history[0]);
        let t = texts(&build_panels(&v, &theme, SCREEN));
        assert!(t.iter().any(|s| s == "Genesis Position"));
    }

    #[test]
    fn tooltip_fades_and_never_blocks() {
        let history = vec![entry(0, 0, 0, 0, &[])];
        let theme = Theme::default();
        let mut v = view(&history, &[]);
        v.agent = GridPoint::new(4, 4);
        v.hovered = Some(&history[0]);
        v.cursor = (500.0, 400.0);
        v.tooltip_opacity = 0.5;
        let tree = build_panels(&v, &theme, SCREEN);

        let mut dl = DrawList::new();
        tree.draw(&mut dl);
        let title = dl
            .texts
            .iter()
            .find(|t| t.text == "Genesis Position")
            .expect("title");
        assert!((title.color[3] - 0.5).abs() < 1e-6);
        assert!(title.x >= 510.0);
        assert!(tree.hit_test(520.0, 420.0).is_none());
    }

    #[test]
    fn tooltip_flips_near_screen_edge() {
        let history = vec![entry(0, 0, 0, 0, &[])];
        let mut v = view(&history, &[]);
        v.agent = GridPoint::new(4, 4);
        v.hovered = Some(&history[0]);
        v.cursor = (1270.0, 790.0);
        let tree = build_panels(&v, &Theme::default(), SCREEN);
        let mut dl = DrawList::new();
        tree.draw(&mut dl);
        let title = dl
            .texts
            .iter()
            .find(|t| t.text == "Genesis Position")
            .expect("title");
        assert!(title.x < 1270.0);
        assert!(title.y < 790.0);
    }

    #[test]
    fn dialog_content_and_links() {
        let history = vec![
            entry(0, 0, 0, 0, &[]),
            entry(1, 0, 1, 0, &["sigAAAAAAAAAAAA1"]),
            entry(2, 0, 2, 0, &[]),
        ];
        let mut v = view(&history, &[]);
        v.selected = Some(&history[1]);
        let tree = build_panels(&v, &Theme::default(), SCREEN);
        let t = texts(&tree);
        for expected in [
            "2 steps ago",
            "Position: (1, 0)",
            "Inputs (1)",
            "Neural Output: Left",
            "Read the whitepaper",
        ] {
            assert!(t.iter().any(|s| s == expected), "missing {expected}: {t:?}");
        }
        assert_eq!(
            action_at_text(&tree, "sigA...AAA1"),
            Some(UiAction::OpenTransaction("sigAAAAAAAAAAAA1".to_string()))
        );
        assert_eq!(
            action_at_text(&tree, "Read the whitepaper"),
            Some(UiAction::OpenUrl("/whitepaper.pdf".to_string()))
        );
        assert_eq!(action_at_text(&tree, "x"), Some(UiAction::CloseDialog));
        // Outside the dialog body the backdrop closes it.
        let hit = tree.hit_test(5.0, 400.0).expect("backdrop");
        assert_eq!(tree.action_for(hit), Some(&UiAction::CloseDialog));
    }

    #[test]
    fn dialog_caps_badge_rows() {
        let txs: Vec<String> = (0..200).map(|i| format!("signature{i:06}xyz")).collect();
        let refs: Vec<&str> = txs.iter().map(String::as_str).collect();
        let history = vec![entry(0, 0, 0, 0, &refs)];
        let mut v = view(&history, &[]);
        v.selected = Some(&history[0]);
        let t = texts(&build_panels(&v, &Theme::default(), SCREEN));
        assert!(t.iter().any(|s| s == "GENESIS Position" || s == "Current Worm Position"));
        assert!(t.iter().any(|s| s.starts_with('+') && s.ends_with("more")));
    }

    #[test]
    fn loading_and_stale_indicators() {
        let mut v = view(&[], &[]);
        v.loading = true;
        v.stale = true;
        let tree = build_panels(&v, &Theme::default(), SCREEN);
        let t = texts(&tree);
        assert!(t.iter().any(|s| s == "Loading..."));
        assert!(t.iter().any(|s| s == "Connection lost, showing last known data"));
        // The veil does not swallow canvas input.
        assert!(tree.hit_test(640.0, 400.0).is_none());
    }

    #[test]
    fn extreme_timestamps_do_not_overflow() {
        let far_past = format!("{}h ago", i64::MAX / 3_600_000);
        let history = vec![entry(0, 0, 0, i64::MIN, &[]), entry(1, 0, 1, 0, &[])];
        let mut v = view(&history, &[]);
        v.tab = PanelTab::History;
        let t = texts(&build_panels(&v, &Theme::default(), SCREEN));
        assert!(t.contains(&far_past), "{t:?}");

        let recent = vec![TransactionRecord {
            signature: "sig".to_string(),
            from: "wallet".to_string(),
            amount: 1,
            block_time: Some(-9_223_372_036_854_775_807),
        }];
        let t = texts(&build_panels(&view(&[], &recent), &Theme::default(), SCREEN));
        assert!(t.contains(&far_past), "{t:?}");
    }

    #[test]
    fn portrait_greys_out_past_positions() {
        let history = vec![entry(0, 0, 0, 0, &[]), entry(2, 1, 1, 0, &[])];
        let theme = Theme::default();
        let mut v = view(&history, &[]);

        v.hovered = Some(&history[1]);
        let tree = build_panels(&v, &theme, SCREEN);
        let mut dl = DrawList::new();
        tree.draw(&mut dl);
        assert_eq!(dl.sprites.len(), 1);
        assert_eq!((dl.sprites[0].width, dl.sprites[0].opacity), (PORTRAIT, 1.0));
        assert!(!dl.sprites[0].grayscale);
        assert!(!dl.texts.iter().any(|t| t.text == "?"));

        v.hovered = None;
        v.selected = Some(&history[0]);
        let tree = build_panels(&v, &theme, SCREEN);
        let mut dl = DrawList::new();
        tree.draw(&mut dl);
        assert_eq!(dl.sprites.len(), 1);
        assert!(dl.sprites[0].grayscale);
        assert!((dl.sprites[0].opacity - PORTRAIT_DIM).abs() < 1e-6);
        let mark = dl.texts.iter().find(|t| t.text == "?").expect("question mark");
        let sprite = dl.sprites[0];
        assert!(mark.x > sprite.x && mark.x < sprite.x + sprite.width);
        assert!(mark.y > sprite.y && mark.y < sprite.y + sprite.height);
    }

    #[test]
    fn portrait_without_image_uses_fallback_disc() {
        let history = vec![entry(0, 0, 0, 0, &[])];
        let theme = Theme::default();
        let mut v = view(&history, &[]);
        v.agent_image = false;
        v.selected = Some(&history[0]);
        let tree = build_panels(&v, &theme, SCREEN);
        let mut dl = DrawList::new();
        tree.draw(&mut dl);
        assert!(dl.sprites.is_empty());
        assert!(dl.panels.iter().any(|p| p.bg_color == theme.agent_fallback
            && p.width == PORTRAIT
            && p.corner_radius == PORTRAIT / 2.0));
    }

    #[test]
    fn recent_tab_shows_loading_before_first_response() {
        let mut v = view(&[], &[]);
        v.recent_loading = true;
        let t = texts(&build_panels(&v, &Theme::default(), SCREEN));
        assert!(t.iter().any(|s| s == "Loading inputs..."));
        assert!(!t.iter().any(|s| s == "Waiting for inputs (txs)..."));
    }

    #[test]
    fn stale_pill_shows_reason() {
        let long = "x".repeat(200);
        let mut v = view(&[], &[]);
        v.stale = true;
        v.stale_reason = Some("GET /api/rpc failed: connection refused");
        let t = texts(&build_panels(&v, &Theme::default(), SCREEN));
        assert!(t.iter().any(|s| s == "GET /api/rpc failed: connection refused"));

        v.stale_reason = Some(&long);
        let t = texts(&build_panels(&v, &Theme::default(), SCREEN));
        let shown = t.iter().find(|s| s.starts_with("xxx")).expect("reason");
        assert_eq!(shown.chars().count(), MAX_REASON_CHARS);
        assert!(shown.ends_with("..."));
    }

    #[test]
    fn footer_links_open_urls() {
        let links = vec![FooterLink {
            label: "GitHub".to_string(),
            url: "https://github.com/deep-worm".to_string(),
        }];
        let mut v = view(&[], &[]);
        v.footer_links = &links;
        let tree = build_panels(&v, &Theme::default(), SCREEN);
        assert_eq!(
            action_at_text(&tree, "GitHub"),
            Some(UiAction::OpenUrl("https://github.com/deep-worm".to_string()))
        );
    }

    #[test]
    fn list_scroll_is_clamped_to_content() {
        let history: Vec<HistoryEntry> = (0..3).map(|i| entry(i, 0, i as u64, 0, &[])).collect();
        let mut v = view(&history, &[]);
        v.tab = PanelTab::History;
        v.list_scroll = 10_000.0;
        let t = texts(&build_panels(&v, &Theme::default(), SCREEN));
        assert!(t.iter().any(|s| s == "(2, 0)"));
    }
}
