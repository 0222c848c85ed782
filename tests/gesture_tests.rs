//! Component tests for drag and swipe gestures: highlight drawing, the
//! accidental-drag threshold, and swipe-vs-keyboard navigation gating.

use std::sync::Arc;

use bookflip::App;
use bookflip::event_source::SimulatedEventSource;
use bookflip::settings::Settings;
use bookflip::test_utils::{ScriptedRemote, create_test_terminal};
use bookflip::tool::InteractionMode;
use crossterm::event::{Event, KeyCode, KeyModifiers};
use ratatui::Terminal;
use ratatui::backend::TestBackend;

fn make_app(remote: Arc<ScriptedRemote>, pages: usize) -> (Terminal<TestBackend>, App) {
    let mut terminal = create_test_terminal(80, 24);
    let mut app = App::new(Box::new(remote), pages, "Test Book", Settings::default());
    terminal.draw(|f| app.draw(f)).unwrap();
    (terminal, app)
}

fn press(app: &mut App, code: KeyCode) {
    let Event::Key(key) = SimulatedEventSource::key_event(code, KeyModifiers::empty()) else {
        unreachable!()
    };
    app.handle_key_event(key);
}

fn mouse(app: &mut App, event: Event) {
    let Event::Mouse(mouse) = event else {
        unreachable!()
    };
    app.handle_mouse_event(mouse);
}

fn drag(app: &mut App, from: (u16, u16), to: (u16, u16)) {
    mouse(app, SimulatedEventSource::mouse_down(from.0, from.1));
    mouse(app, SimulatedEventSource::mouse_drag(to.0, to.1));
    mouse(app, SimulatedEventSource::mouse_up(to.0, to.1));
}

#[test]
fn drag_in_highlight_mode_creates_highlight() {
    let remote = Arc::new(ScriptedRemote::new());
    let (_terminal, mut app) = make_app(remote.clone(), 12);

    press(&mut app, KeyCode::Char('h'));
    drag(&mut app, (10, 5), (40, 15));

    assert_eq!(app.store.highlight_count(), 1);
    let calls = remote.calls();
    let create = calls
        .iter()
        .find(|c| c.starts_with("create_highlight"))
        .expect("highlight create should reach the remote");
    assert!(create.contains("page=0"));
    assert!(create.contains("color=yellow"));
}

#[test]
fn highlight_mode_persists_across_drags() {
    let remote = Arc::new(ScriptedRemote::new());
    let (_terminal, mut app) = make_app(remote, 12);

    press(&mut app, KeyCode::Char('h'));
    drag(&mut app, (10, 5), (40, 15));
    assert_eq!(app.tool.mode(), InteractionMode::DrawingHighlight);

    drag(&mut app, (10, 16), (40, 18));
    assert_eq!(app.store.highlight_count(), 2);
}

#[test]
fn reversed_drag_produces_the_same_rectangle() {
    let remote = Arc::new(ScriptedRemote::new());
    let (_terminal, mut app) = make_app(remote.clone(), 12);

    press(&mut app, KeyCode::Char('h'));
    drag(&mut app, (40, 15), (10, 5));
    assert_eq!(app.store.highlight_count(), 1);

    // Clear the first highlight before redrawing the same region: a press
    // inside an existing marker opens the delete confirmation instead of
    // starting a drag.
    mouse(&mut app, SimulatedEventSource::mouse_down(20, 10));
    press(&mut app, KeyCode::Char('y'));
    assert_eq!(app.store.highlight_count(), 0);

    drag(&mut app, (10, 5), (40, 15));

    let calls = remote.calls();
    let rects: Vec<&String> = calls
        .iter()
        .filter(|c| c.starts_with("create_highlight"))
        .collect();
    assert_eq!(rects.len(), 2);
    let rect_of = |call: &str| call.split("rect=").nth(1).unwrap().to_string();
    assert_eq!(rect_of(rects[0]), rect_of(rects[1]));
}

#[test]
fn press_inside_an_existing_highlight_does_not_start_a_drag() {
    let remote = Arc::new(ScriptedRemote::new());
    let (_terminal, mut app) = make_app(remote, 12);

    press(&mut app, KeyCode::Char('h'));
    drag(&mut app, (10, 5), (40, 15));
    assert_eq!(app.store.highlight_count(), 1);

    // The press is a delete affordance even in highlight mode.
    mouse(&mut app, SimulatedEventSource::mouse_down(20, 10));
    assert!(app.has_popup());

    press(&mut app, KeyCode::Esc);
    mouse(&mut app, SimulatedEventSource::mouse_up(60, 18));
    assert_eq!(app.store.highlight_count(), 1);
    assert_eq!(app.tool.mode(), InteractionMode::DrawingHighlight);
}

#[test]
fn sub_threshold_drag_is_discarded_silently() {
    let remote = Arc::new(ScriptedRemote::new());
    let (_terminal, mut app) = make_app(remote.clone(), 12);

    press(&mut app, KeyCode::Char('h'));
    drag(&mut app, (20, 10), (20, 10));

    assert_eq!(app.store.highlight_count(), 0);
    assert_eq!(app.notifications.count(), 0);
    assert!(!remote.calls().iter().any(|c| c.starts_with("create_highlight")));
}

#[test]
fn color_cycles_only_in_highlight_mode() {
    let remote = Arc::new(ScriptedRemote::new());
    let (_terminal, mut app) = make_app(remote.clone(), 12);

    // 'c' outside highlight mode is ignored.
    press(&mut app, KeyCode::Char('c'));
    press(&mut app, KeyCode::Char('h'));
    press(&mut app, KeyCode::Char('c'));
    drag(&mut app, (10, 5), (40, 15));

    let calls = remote.calls();
    let create = calls
        .iter()
        .find(|c| c.starts_with("create_highlight"))
        .unwrap();
    assert!(create.contains("color=green"));
}

#[test]
fn failed_highlight_create_leaves_cache_untouched() {
    let remote = Arc::new(ScriptedRemote::new().fail_creates());
    let (_terminal, mut app) = make_app(remote, 12);

    press(&mut app, KeyCode::Char('h'));
    drag(&mut app, (10, 5), (40, 15));

    assert_eq!(app.store.highlight_count(), 0);
    assert!(app.notifications.count() > 0);
    assert_eq!(app.rendered_marker_count(), 0);
}

#[test]
fn escape_cancels_an_active_drag() {
    let remote = Arc::new(ScriptedRemote::new());
    let (_terminal, mut app) = make_app(remote.clone(), 12);

    press(&mut app, KeyCode::Char('h'));
    mouse(&mut app, SimulatedEventSource::mouse_down(10, 5));
    mouse(&mut app, SimulatedEventSource::mouse_drag(40, 15));
    press(&mut app, KeyCode::Esc);
    mouse(&mut app, SimulatedEventSource::mouse_up(40, 15));

    assert_eq!(app.store.highlight_count(), 0);
    assert_eq!(app.tool.mode(), InteractionMode::Browse);
    assert!(!remote.calls().iter().any(|c| c.starts_with("create_highlight")));
}

#[test]
fn long_leftward_swipe_turns_forward() {
    let remote = Arc::new(ScriptedRemote::new());
    let (_terminal, mut app) = make_app(remote, 12);
    assert_eq!(app.visible_pages(), vec![0]);

    // Default swipe threshold is 6 columns.
    mouse(&mut app, SimulatedEventSource::mouse_down(50, 10));
    mouse(&mut app, SimulatedEventSource::mouse_up(40, 10));
    assert_eq!(app.visible_pages(), vec![1, 2]);

    mouse(&mut app, SimulatedEventSource::mouse_down(30, 10));
    mouse(&mut app, SimulatedEventSource::mouse_up(44, 10));
    assert_eq!(app.visible_pages(), vec![0]);
}

#[test]
fn short_swipe_does_not_navigate() {
    let remote = Arc::new(ScriptedRemote::new());
    let (_terminal, mut app) = make_app(remote, 12);

    mouse(&mut app, SimulatedEventSource::mouse_down(50, 10));
    mouse(&mut app, SimulatedEventSource::mouse_up(47, 10));
    assert_eq!(app.visible_pages(), vec![0]);
}

#[test]
fn swipes_are_suppressed_while_a_tool_is_active() {
    let remote = Arc::new(ScriptedRemote::new());
    let (_terminal, mut app) = make_app(remote, 12);

    press(&mut app, KeyCode::Char('n'));
    // In note mode a press opens the note popup, so close it and verify no
    // navigation happened from the release.
    mouse(&mut app, SimulatedEventSource::mouse_down(50, 10));
    press(&mut app, KeyCode::Esc);
    mouse(&mut app, SimulatedEventSource::mouse_up(30, 10));
    assert_eq!(app.visible_pages(), vec![0]);
}

#[test]
fn mode_change_between_press_and_release_suppresses_the_swipe() {
    let remote = Arc::new(ScriptedRemote::new());
    let (_terminal, mut app) = make_app(remote, 12);

    mouse(&mut app, SimulatedEventSource::mouse_down(50, 10));
    press(&mut app, KeyCode::Char('h'));
    mouse(&mut app, SimulatedEventSource::mouse_up(30, 10));
    assert_eq!(app.visible_pages(), vec![0]);
}

#[test]
fn arrow_keys_navigate_in_any_mode() {
    let remote = Arc::new(ScriptedRemote::new());
    let (_terminal, mut app) = make_app(remote, 12);

    press(&mut app, KeyCode::Char('h'));
    press(&mut app, KeyCode::Right);
    assert_eq!(app.visible_pages(), vec![1, 2]);
    press(&mut app, KeyCode::Left);
    assert_eq!(app.visible_pages(), vec![0]);
    assert_eq!(app.tool.mode(), InteractionMode::DrawingHighlight);
}

#[test]
fn navigation_stops_at_both_ends() {
    let remote = Arc::new(ScriptedRemote::new());
    let (_terminal, mut app) = make_app(remote, 3);

    press(&mut app, KeyCode::Left);
    assert_eq!(app.visible_pages(), vec![0]);

    press(&mut app, KeyCode::Right);
    assert_eq!(app.visible_pages(), vec![1, 2]);
    press(&mut app, KeyCode::Right);
    assert_eq!(app.visible_pages(), vec![1, 2]);
}

#[test]
fn single_page_layout_never_pairs() {
    let remote = Arc::new(ScriptedRemote::new());
    let settings = Settings {
        spread: false,
        ..Settings::default()
    };
    let mut terminal = create_test_terminal(80, 24);
    let mut app = App::new(Box::new(remote), 5, "Test Book", settings);
    terminal.draw(|f| app.draw(f)).unwrap();

    press(&mut app, KeyCode::Right);
    assert_eq!(app.visible_pages(), vec![1]);
    press(&mut app, KeyCode::Right);
    assert_eq!(app.visible_pages(), vec![2]);
}

#[test]
fn drag_on_the_right_page_records_its_page_number() {
    let remote = Arc::new(ScriptedRemote::new());
    let (mut terminal, mut app) = make_app(remote.clone(), 12);

    press(&mut app, KeyCode::Right);
    terminal.draw(|f| app.draw(f)).unwrap();
    assert_eq!(app.visible_pages(), vec![1, 2]);

    // The right half of an 80-column spread starts at column 40.
    press(&mut app, KeyCode::Char('h'));
    drag(&mut app, (45, 5), (70, 15));

    let calls = remote.calls();
    let create = calls
        .iter()
        .find(|c| c.starts_with("create_highlight"))
        .unwrap();
    assert!(create.contains("page=2"));
}
