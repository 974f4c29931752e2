//! End-to-end viewer scenarios: feed updates in, pointer and key events
//! through, scenes and panels out. No window or GPU involved.

use std::time::Instant;

use wormgrid::camera::ManualFrames;
use wormgrid::config::Config;
use wormgrid::feed::{FeedError, FeedUpdate, decode_history, decode_recent};
use wormgrid::transform::world_to_screen;
use wormgrid::ui::{self, Action, PanelTab, Theme, UiAction};
use wormgrid::viewer::{Effect, Viewer};

const W: f32 = 1280.0;
const H: f32 = 800.0;

const HISTORY: &str = r#"[
    {"x": 0, "y": 0, "index": 0, "direction": "up", "timestamp": 1700000000000, "affectedTransactions": []},
    {"x": 3, "y": 0, "index": 1, "direction": "right", "timestamp": 1700000060000,
     "affectedTransactions": ["5VfYmGCXzYs1Pp2Pq7Lk9u4Z3hQnW8eRtY6uIoPaSdFg"]},
    {"x": 3, "y": 4, "index": 2, "direction": "down", "timestamp": 1700000120000, "affectedTransactions": []}
]"#;

const RECENT: &str = r#"[
    {"signature": "5VfYmGCXzYs1Pp2Pq7Lk9u4Z3hQnW8eRtY6uIoPaSdFg",
     "from": "9xQeWvG816bUx9EPjHmaT23yvVM2ZWbrrpZb9PusVFin",
     "amount": "250000000", "blockTime": 1700000050},
    {"signature": "pending1", "from": "abc", "amount": 1000000000}
]"#;

fn viewer() -> Viewer {
    Viewer::new(&Config::default(), &Theme::default(), (W, H))
}

fn with_history() -> Viewer {
    let mut v = viewer();
    let history = decode_history(HISTORY).expect("valid history");
    v.apply_feed(FeedUpdate::History(Ok(history)), &ManualFrames);
    v
}

fn settle(v: &mut Viewer, theme: &Theme) {
    let mut frames = 0;
    while v.controller().is_animating() {
        v.frame(theme, &ManualFrames);
        frames += 1;
        assert!(frames < 1_000, "camera never settled");
    }
    // One more pass so the snapshot matches the final camera.
    v.frame(theme, &ManualFrames);
}

#[test]
fn first_history_recenters_at_the_opening_zoom() {
    let theme = Theme::default();
    let mut v = with_history();
    assert!(v.controller().is_animating());
    settle(&mut v, &theme);

    let zoom = v.controller().zoom();
    assert!((zoom.cell_size - 4.0).abs() < 1e-4, "opening zoom kept");
    let (sx, sy) = world_to_screen(v.agent(), v.controller().camera(), zoom.cell_size);
    assert!((sx - W / 2.0).abs() < 1e-3 && (sy - H / 2.0).abs() < 1e-3);
}

#[test]
fn locate_goes_back_to_default_zoom() {
    let theme = Theme::default();
    let mut v = with_history();
    settle(&mut v, &theme);
    assert_eq!(v.perform(UiAction::Locate, &ManualFrames), None);
    settle(&mut v, &theme);
    assert!((v.controller().zoom().cell_size - 40.0).abs() < 1e-4);
}

#[test]
fn hover_then_click_opens_dialog_and_escape_closes_it() {
    let theme = Theme::default();
    let mut v = with_history();
    v.perform(UiAction::Locate, &ManualFrames);
    settle(&mut v, &theme);

    let target = v
        .snapshot()
        .markers
        .iter()
        .find(|m| m.entry.index == 1)
        .map(|m| (m.x, m.y))
        .expect("marker for entry #1");
    assert!(v.pointer_moved(target.0 + 2.0, target.1 - 2.0, Instant::now()));
    assert_eq!(v.hovered().map(|e| e.index), Some(1));

    v.pointer_pressed(target.0, target.1);
    v.pointer_released();
    assert_eq!(v.selected().map(|e| e.index), Some(1));
    assert!(v.hovered().is_none());

    assert_eq!(v.key_action(Action::CloseTopmost, &ManualFrames), None);
    assert!(v.selected().is_none());
    assert_eq!(
        v.key_action(Action::CloseTopmost, &ManualFrames),
        Some(Effect::Exit)
    );
}

#[test]
fn empty_canvas_press_drags_without_selecting() {
    let theme = Theme::default();
    let mut v = with_history();
    settle(&mut v, &theme);
    let before = v.controller().camera();

    v.pointer_pressed(5.0, 5.0);
    v.pointer_moved(25.0, 15.0, Instant::now());
    v.pointer_released();

    assert!(v.selected().is_none());
    let after = v.controller().camera();
    assert!((before.x - after.x - 20.0).abs() < 1e-3);
    assert!((before.y - after.y - 10.0).abs() < 1e-3);
}

#[test]
fn failed_poll_keeps_last_good_data() {
    let mut v = with_history();
    let err = decode_history("{not json").expect_err("bad body");
    v.apply_feed(FeedUpdate::History(Err(err)), &ManualFrames);

    assert_eq!(v.feed().history().len(), 3);
    assert!(v.feed().stale());
    assert!(!v.feed().loading());
}

#[test]
fn out_of_order_history_is_rejected() {
    let body = r#"[
        {"x": 0, "y": 0, "index": 4, "direction": "up", "timestamp": 1},
        {"x": 0, "y": 1, "index": 2, "direction": "up", "timestamp": 2}
    ]"#;
    assert!(matches!(
        decode_history(body),
        Err(FeedError::Invalid { .. })
    ));
}

#[test]
fn failed_recent_fetch_explains_the_stale_pill() {
    let theme = Theme::default();
    let screen = ui::Size {
        width: W,
        height: H,
    };
    let mut v = with_history();
    let err = decode_recent("[{\"signature\": 1}]").expect_err("bad body");
    let reason = err.to_string();
    v.apply_feed(FeedUpdate::Recent(Err(err)), &ManualFrames);

    let view = v.panels_view(Instant::now(), 0, 0.0);
    assert!(view.stale && !view.recent_loading);
    let tree = ui::build_panels(&view, &theme, screen);
    let mut draw = ui::DrawList::new();
    tree.draw(&mut draw);
    let shown: Vec<&str> = draw.texts.iter().map(|t| t.text.as_str()).collect();
    assert!(shown.contains(&"Connection lost, showing last known data"));
    assert!(shown.contains(&"Waiting for inputs (txs)..."));
    let expected = if reason.chars().count() <= 72 {
        reason.clone()
    } else {
        format!("{}...", reason.chars().take(69).collect::<String>())
    };
    assert!(shown.contains(&expected.as_str()), "{shown:?}");
}

#[test]
fn recent_tab_links_to_explorer() {
    let mut v = with_history();
    let recent = decode_recent(RECENT).expect("valid recent");
    v.apply_feed(FeedUpdate::Recent(Ok(recent)), &ManualFrames);
    v.perform(UiAction::SelectTab(PanelTab::Recent), &ManualFrames);
    assert_eq!(v.tab(), PanelTab::Recent);

    let effect = v.perform(
        UiAction::OpenTransaction("5VfYmGCXzYs1Pp2Pq7Lk9u4Z3hQnW8eRtY6uIoPaSdFg".to_string()),
        &ManualFrames,
    );
    assert_eq!(
        effect,
        Some(Effect::OpenUrl(
            "https://solscan.io/tx/5VfYmGCXzYs1Pp2Pq7Lk9u4Z3hQnW8eRtY6uIoPaSdFg".to_string()
        ))
    );
}

#[test]
fn overlay_builds_for_every_state() {
    let theme = Theme::default();
    let screen = ui::Size {
        width: W,
        height: H,
    };
    let now = Instant::now();

    // Before any data: loading veil, no panics on empty lists.
    let v = viewer();
    let tree = ui::build_panels(&v.panels_view(now, 0, 0.0), &theme, screen);
    let mut draw = ui::DrawList::new();
    tree.draw(&mut draw);
    assert!(draw.texts.iter().any(|t| t.text == "Loading..."));
    assert!(draw.texts.iter().any(|t| t.text == "Loading inputs..."));

    // With data and an open dialog.
    let mut v = with_history();
    v.perform(UiAction::OpenEntry(1), &ManualFrames);
    let view = v.panels_view(now, 1_700_000_200_000, 0.0);
    assert!(view.selected.is_some());
    let tree = ui::build_panels(&view, &theme, screen);
    let mut draw = ui::DrawList::new();
    tree.draw(&mut draw);
    assert!(draw.texts.iter().any(|t| t.text.contains("(3, 0)")));
}
