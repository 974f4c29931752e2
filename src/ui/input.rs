use super::widget::UiAction;
use super::WidgetTree;

/// Mouse button identifier (decoupled from winit).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// What the UI made of a pointer button event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PointerOutcome {
    /// Not over any widget; the canvas gets the event.
    Ignored,
    /// Over a widget, nothing to do.
    Consumed,
    /// A completed click on a widget with an action.
    Action(UiAction),
}

/// Pixels scrolled per mouse wheel line.
const SCROLL_SPEED: f32 = 40.0;

/// Interaction state for the widget layer. Lives on App, not in the tree,
/// because the tree is rebuilt every frame.
#[derive(Debug, Default)]
pub struct UiState {
    /// Whether the cursor is over a widget.
    pub over_ui: bool,
    /// Action under the left button when it went down. A click fires only
    /// if the release lands on the same action.
    pressed: Option<Option<UiAction>>,
    /// Last known cursor position (screen coords).
    pub cursor: (f32, f32),
    /// Scroll position of the side panel list, carried across rebuilds.
    pub list_scroll: f32,
}

impl UiState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle cursor movement. Returns true if the cursor is over a UI
    /// widget or a press on one is in progress (event consumed).
    pub fn handle_cursor_moved(&mut self, tree: &WidgetTree, x: f32, y: f32) -> bool {
        self.cursor = (x, y);
        self.over_ui = tree.hit_test(x, y).is_some();
        self.over_ui || self.pressed.is_some()
    }

    /// Handle mouse button press/release.
    pub fn handle_mouse_input(
        &mut self,
        tree: &WidgetTree,
        button: MouseButton,
        pressed: bool,
        x: f32,
        y: f32,
    ) -> PointerOutcome {
        self.cursor = (x, y);
        let hit = tree.hit_test(x, y);

        if pressed {
            let Some(widget_id) = hit else {
                return PointerOutcome::Ignored;
            };
            if button == MouseButton::Left {
                self.pressed = Some(tree.action_for(widget_id).cloned());
            }
            return PointerOutcome::Consumed;
        }

        if button != MouseButton::Left {
            return if hit.is_some() {
                PointerOutcome::Consumed
            } else {
                PointerOutcome::Ignored
            };
        }

        let Some(pressed_action) = self.pressed.take() else {
            return PointerOutcome::Ignored;
        };
        let released_action = hit.and_then(|id| tree.action_for(id).cloned());
        match pressed_action {
            Some(action) if released_action.as_ref() == Some(&action) => {
                if matches!(action, UiAction::SelectTab(_)) {
                    // A tab always opens at the top of its list.
                    self.list_scroll = 0.0;
                }
                PointerOutcome::Action(action)
            }
            _ => PointerOutcome::Consumed,
        }
    }

    /// Handle scroll wheel at the cursor (positive = scroll down). Returns
    /// true if consumed by a widget.
    pub fn handle_scroll(&mut self, tree: &mut WidgetTree, lines: f32) -> bool {
        let Some(widget_id) = tree.hit_test(self.cursor.0, self.cursor.1) else {
            return false;
        };
        if let Some(list) = tree.scroll_list_ancestor(widget_id) {
            tree.scroll_by(list, lines * SCROLL_SPEED);
            self.list_scroll = tree.scroll_offset(list);
        }
        true
    }

    /// The side panel switched tabs without a click (keyboard).
    pub fn tab_switched(&mut self) {
        self.list_scroll = 0.0;
    }

    /// Forget an in-progress press (pointer left the window).
    pub fn cancel_press(&mut self) {
        self.pressed = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::{Size, Sizing, Widget};

    fn button(tree: &mut WidgetTree, x: f32, action: UiAction) {
        let id = tree.insert_root(Widget::Button {
            text: "b".to_string(),
            color: [1.0; 4],
            bg_color: [0.0; 4],
            border_color: [0.0; 4],
            font_size: 12.0,
            corner_radius: 0.0,
        });
        tree.set_position(id, crate::ui::Position::Fixed { x, y: 0.0 });
        tree.set_sizing(id, Sizing::Fixed(40.0), Sizing::Fixed(40.0));
        tree.set_action(id, action);
    }

    fn tree() -> WidgetTree {
        let mut tree = WidgetTree::new();
        button(&mut tree, 0.0, UiAction::ZoomIn);
        button(&mut tree, 50.0, UiAction::ZoomOut);
        tree.layout(Size {
            width: 800.0,
            height: 600.0,
        });
        tree
    }

    #[test]
    fn click_fires_action() {
        let tree = tree();
        let mut ui = UiState::new();
        assert_eq!(
            ui.handle_mouse_input(&tree, MouseButton::Left, true, 10.0, 10.0),
            PointerOutcome::Consumed
        );
        assert_eq!(
            ui.handle_mouse_input(&tree, MouseButton::Left, false, 12.0, 12.0),
            PointerOutcome::Action(UiAction::ZoomIn)
        );
    }

    #[test]
    fn release_elsewhere_cancels() {
        let tree = tree();
        let mut ui = UiState::new();
        ui.handle_mouse_input(&tree, MouseButton::Left, true, 10.0, 10.0);
        assert_eq!(
            ui.handle_mouse_input(&tree, MouseButton::Left, false, 60.0, 10.0),
            PointerOutcome::Consumed
        );
    }

    #[test]
    fn canvas_events_are_ignored() {
        let tree = tree();
        let mut ui = UiState::new();
        assert_eq!(
            ui.handle_mouse_input(&tree, MouseButton::Left, true, 300.0, 300.0),
            PointerOutcome::Ignored
        );
        assert_eq!(
            ui.handle_mouse_input(&tree, MouseButton::Left, false, 10.0, 10.0),
            PointerOutcome::Ignored
        );
        assert!(!ui.handle_cursor_moved(&tree, 300.0, 300.0));
        assert!(ui.handle_cursor_moved(&tree, 10.0, 10.0));
    }

    #[test]
    fn press_survives_tree_rebuild() {
        let first = tree();
        let mut ui = UiState::new();
        ui.handle_mouse_input(&first, MouseButton::Left, true, 55.0, 5.0);
        let rebuilt = tree();
        assert_eq!(
            ui.handle_mouse_input(&rebuilt, MouseButton::Left, false, 55.0, 5.0),
            PointerOutcome::Action(UiAction::ZoomOut)
        );
    }

    #[test]
    fn tab_click_resets_list_scroll() {
        let mut tree = WidgetTree::new();
        button(&mut tree, 0.0, UiAction::SelectTab(crate::ui::PanelTab::History));
        tree.layout(Size {
            width: 800.0,
            height: 600.0,
        });
        let mut ui = UiState::new();
        ui.list_scroll = 120.0;
        ui.handle_mouse_input(&tree, MouseButton::Left, true, 5.0, 5.0);
        ui.handle_mouse_input(&tree, MouseButton::Left, false, 5.0, 5.0);
        assert_eq!(ui.list_scroll, 0.0);

        ui.list_scroll = 80.0;
        ui.tab_switched();
        assert_eq!(ui.list_scroll, 0.0);
    }

    #[test]
    fn other_clicks_keep_list_scroll() {
        let tree = tree();
        let mut ui = UiState::new();
        ui.list_scroll = 120.0;
        ui.handle_mouse_input(&tree, MouseButton::Left, true, 10.0, 10.0);
        ui.handle_mouse_input(&tree, MouseButton::Left, false, 10.0, 10.0);
        assert_eq!(ui.list_scroll, 120.0);
    }

    #[test]
    fn wheel_over_widget_is_consumed() {
        let mut tree = tree();
        let mut ui = UiState::new();
        ui.handle_cursor_moved(&tree, 10.0, 10.0);
        assert!(ui.handle_scroll(&mut tree, 1.0));
        ui.handle_cursor_moved(&tree, 400.0, 400.0);
        assert!(!ui.handle_scroll(&mut tree, 1.0));
    }
}
