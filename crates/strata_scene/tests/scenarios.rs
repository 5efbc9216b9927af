//! End-to-end scenes driven through `Root`

use strata_core::{Color, Point, Value};
use strata_scene::{keys, Easing, ManualClock, NodeId, Root, RootConfig, SchedulerState, Shape};
use strata_text::FontWeight;
use tracing_subscriber::EnvFilter;

fn root(width: u32, height: u32) -> Root {
    // RUST_LOG=strata_scene=trace shows the per-tick resolution
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
    Root::new(RootConfig::new(width, height)).unwrap()
}

fn rect(root: &mut Root, parent: NodeId, width: f32, height: f32) -> NodeId {
    let id = root.create_graphics(Shape::Rectangle);
    root.set(id, keys::WIDTH, width).unwrap();
    root.set(id, keys::HEIGHT, height).unwrap();
    root.add_child(parent, id).unwrap();
    id
}

#[test]
fn test_hit_test_through_positioned_container() {
    let mut root = root(300, 300);
    let container = root.create_container();
    let top = root.root();
    root.add_child(top, container).unwrap();
    let r = rect(&mut root, container, 100.0, 50.0);
    root.set(r, keys::INTERACTIVE, true).unwrap();
    root.set(container, keys::X, 10.0).unwrap();
    root.set(container, keys::Y, 10.0).unwrap();

    root.tick(0.0);
    assert_eq!(root.hit_test(Point::new(50.0, 30.0)), Some(r));
    assert_eq!(root.hit_test(Point::new(200.0, 200.0)), None);
}

#[test]
fn test_markup_text_layout() {
    let mut root = root(300, 100);
    let text = root.create_text("[bold]Hi[/] there").unwrap();
    let top = root.root();
    root.add_child(top, text).unwrap();
    root.tick(0.0);

    let block = root.node(text).unwrap().text_block().unwrap();
    assert_eq!(block.lines.len(), 1);
    let line = &block.lines[0];
    assert_eq!(line.chunks.len(), 2);
    assert_eq!(line.chunks[0].text, "Hi");
    assert_eq!(line.chunks[0].style.weight, FontWeight::Bold);
    assert_eq!(line.chunks[1].text, " there");
    assert_eq!(line.chunks[1].style.weight, FontWeight::Regular);
    let sum: f32 = line.chunks.iter().map(|c| c.width).sum();
    assert!((line.width - sum).abs() < 1e-3);
}

#[test]
fn test_linear_animation_with_injected_time() {
    let mut root = root(100, 100);
    let top = root.root();
    let r = rect(&mut root, top, 10.0, 10.0);
    root.set(r, keys::X, 0.0).unwrap();
    let anim = root.animate(r, keys::X, 100.0, 1000.0, Easing::Linear).unwrap();

    root.tick(0.0);
    root.tick(500.0);
    let x = root.get(r, keys::X).and_then(Value::as_number).unwrap();
    assert!((x - 50.0).abs() < 0.01);

    root.tick(1000.0);
    assert_eq!(root.get(r, keys::X), Some(&Value::Number(100.0)));
    assert!(!root.animation_running(anim));
    assert!(!root.is_animating(r, keys::X));
    assert_eq!(root.node(r).unwrap().world_position(), Point::new(100.0, 0.0));
}

#[test]
fn test_svg_path_bounds() {
    let mut root = root(100, 100);
    let path = root.create_graphics(Shape::SvgPath);
    root.set(path, keys::SVG_PATH, "M0 0 L10 0 L10 10 Z").unwrap();
    let top = root.root();
    root.add_child(top, path).unwrap();
    root.tick(0.0);

    let node = root.node(path).unwrap();
    let bounds = node.ops().unwrap().bounds();
    assert_eq!((bounds.left, bounds.top, bounds.right, bounds.bottom), (0.0, 0.0, 10.0, 10.0));
    assert_eq!(node.local_bounds(), bounds);
}

#[test]
fn test_malformed_path_rejected_at_the_boundary() {
    let mut root = root(100, 100);
    let path = root.create_graphics(Shape::SvgPath);
    assert!(root.set(path, keys::SVG_PATH, "M0 0 L10").is_err());
    assert!(root.get(path, keys::SVG_PATH).is_none());
}

#[test]
fn test_same_value_twice_resolves_once() {
    let mut root = root(100, 100);
    let top = root.root();
    let r = rect(&mut root, top, 10.0, 10.0);
    root.tick(0.0);

    root.set(r, keys::FILL, Color::BLUE).unwrap();
    root.set(r, keys::FILL, Color::BLUE).unwrap();
    root.tick(16.0);
    assert_eq!(root.last_frame().settings_resolved, 1);
}

#[test]
fn test_scheduler_terminates() {
    let mut root = root(400, 400);
    let top = root.root();
    let column = root.create_container();
    root.set(column, keys::LAYOUT, "vertical").unwrap();
    root.set(column, keys::GAP, 4.0).unwrap();
    root.add_child(top, column).unwrap();
    let mut cells = Vec::new();
    for i in 0..20 {
        cells.push(rect(&mut root, column, 50.0, 5.0 + i as f32));
    }
    let clock = ManualClock::new(0.0);
    assert!(root.run_until_idle(&clock, 10) <= 2);
    assert_eq!(root.state(), SchedulerState::Idle);

    for &cell in &cells {
        root.set(cell, keys::HEIGHT, 3.0).unwrap();
    }
    root.resize(300, 300).unwrap();
    assert!(root.run_until_idle(&clock, 10) <= 2);
    assert_eq!(root.state(), SchedulerState::Idle);
    let last = root.node(cells[19]).unwrap().world_position();
    assert_eq!(last.y, 19.0 * 7.0);
}

#[test]
fn test_ghost_colors_are_unique() {
    let mut root = root(200, 200);
    let top = root.root();
    let grid = root.create_container();
    root.set(grid, keys::LAYOUT, "grid").unwrap();
    root.set(grid, keys::GRID_COLUMNS, 10).unwrap();
    root.add_child(top, grid).unwrap();
    let mut cells = Vec::new();
    for _ in 0..100 {
        let cell = rect(&mut root, grid, 20.0, 20.0);
        root.set(cell, keys::INTERACTIVE, true).unwrap();
        cells.push(cell);
    }
    root.tick(0.0);

    for (i, &cell) in cells.iter().enumerate() {
        let center = Point::new((i % 10) as f32 * 20.0 + 10.0, (i / 10) as f32 * 20.0 + 10.0);
        assert_eq!(root.hit_test(center), Some(cell), "cell {i}");
    }
    let colors: std::collections::HashSet<_> = cells
        .iter()
        .map(|&c| root.ghosts().color_of(c).unwrap().to_rgba8())
        .collect();
    assert_eq!(colors.len(), cells.len());
}

#[test]
fn test_higher_layer_composites_on_top() {
    let mut root = root(50, 50);
    let top = root.root();
    let above = rect(&mut root, top, 50.0, 50.0);
    root.set(above, keys::FILL, Color::BLUE).unwrap();
    root.set(above, keys::LAYER, 1).unwrap();
    let below = rect(&mut root, top, 50.0, 50.0);
    root.set(below, keys::FILL, Color::RED).unwrap();

    root.tick(0.0);
    assert_eq!(root.layers().orders(), vec![0, 1]);
    assert_eq!(root.output_pixel(25, 25), Some([0, 0, 255, 255]));

    // Only the base layer repaints when a base node changes
    root.set(below, keys::FILL, Color::GREEN).unwrap();
    root.tick(16.0);
    assert_eq!(root.last_frame().layers_painted, 1);

    root.layers_mut().set_visible(1, false).unwrap();
    root.set(below, keys::X, 0.5).unwrap();
    root.tick(32.0);
    assert_eq!(root.output_pixel(25, 25), Some([0, 255, 0, 255]));
}

#[test]
fn test_event_log_orders_pointer_events() {
    let mut root = root(100, 100);
    let top = root.root();
    let r = rect(&mut root, top, 40.0, 40.0);
    root.on(r, strata_scene::NodeEventKind::Click, |_| {}).unwrap();
    root.tick(0.0);
    root.enable_event_log();

    root.on_pointer_move(Point::new(10.0, 10.0));
    root.on_pointer_down(Point::new(10.0, 10.0), strata_scene::MouseButton::Left);
    root.on_pointer_up(Point::new(10.0, 10.0), strata_scene::MouseButton::Left);

    let kinds: Vec<_> = root
        .drain_events()
        .into_iter()
        .filter(|e| e.current == r)
        .map(|e| e.kind)
        .collect();
    use strata_scene::NodeEventKind::*;
    assert_eq!(kinds, vec![PointerEnter, PointerMove, PointerDown, PointerUp, Click]);
}
