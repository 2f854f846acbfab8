//! Integration tests: the settling pass as seen from the editor.

use gd_core::{GraphData, GraphModel, NodeData, Point, RelationshipData, Vec2};
use gd_editor::render::RenderService;
use gd_editor::{
    DragTarget, Editor, EditorConfig, EventLog, InputEvent, Scene, SettleStatus, SyncEvent,
    ViewBinding,
};
use pretty_assertions::assert_eq;
use std::cell::RefCell;
use std::rc::Rc;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn cluster() -> GraphModel {
    let mut model = GraphModel::new();
    let ids: Vec<_> = (0..5)
        .map(|i| model.create_node(Point::new(300.0 + i as f64, 300.0)).unwrap())
        .collect();
    for pair in ids.windows(2) {
        model.create_relationship(pair[0], pair[1]).unwrap();
    }
    model
}

/// Records what a renderer would draw for the first node.
#[derive(Default)]
struct FrameRecorder {
    resets: usize,
    first_node: Vec<Point>,
}

impl RenderService for FrameRecorder {
    fn reset(&mut self) {
        self.resets += 1;
    }

    fn render(&mut self, scene: &Scene<'_>) {
        if let Some(node) = scene.model.nodes().next() {
            self.first_node.extend(scene.position_of(node.id()));
        }
    }
}

#[test]
fn runs_exactly_the_cap_and_commits_once() {
    init_logging();
    let mut editor = Editor::default();
    editor.swap_graph(cluster());
    let log = EventLog::new();
    editor.subscribe(log.clone());

    editor.start_settling(Some(7));
    let mut statuses = Vec::new();
    while let Some(status) = editor.tick() {
        statuses.push(status);
    }
    // `tick` keeps returning `None` once the pass is committed.
    assert_eq!(statuses.len(), 7);
    assert_eq!(statuses.last(), Some(&SettleStatus::Finished));
    assert!(!editor.is_settling());
    assert_eq!(editor.tick(), None);

    // One redraw per tick plus the commit redraw.
    assert_eq!(log.count(&SyncEvent::RedrawRequested), 8);
}

#[test]
fn committed_positions_match_the_last_frame() {
    init_logging();
    let frames = Rc::new(RefCell::new(FrameRecorder::default()));
    let mut editor = Editor::default();
    editor.subscribe(ViewBinding::new(Rc::clone(&frames)));
    editor.swap_graph(cluster());

    editor.start_settling(None);
    let ticks = editor.settle_to_completion();
    assert_eq!(ticks, 20);

    let first = editor.model().nodes().next().unwrap().position;
    let frames = frames.borrow();
    assert_eq!(frames.resets, 1);
    // Swap frame, 20 settling frames, commit frame.
    assert_eq!(frames.first_node.len(), 22);
    assert_eq!(frames.first_node[20], first, "last settling frame");
    assert_eq!(frames.first_node[21], first, "commit frame");
    assert!(editor.model().check_integrity().is_ok());
}

#[test]
fn settling_separates_overlapping_nodes() {
    init_logging();
    let mut editor = Editor::default();
    editor.swap_graph(cluster());
    editor.start_settling(None);
    editor.settle_to_completion();

    let nodes = editor.model().node_list();
    for (i, a) in nodes.iter().enumerate() {
        for b in &nodes[i + 1..] {
            assert!(a.distance_to(b) > 5.0, "{} and {} still overlap", a.id(), b.id());
            assert!(a.position.is_finite());
        }
    }
}

#[test]
fn restarting_commits_the_pass_in_flight() {
    init_logging();
    let mut editor = Editor::default();
    editor.swap_graph(cluster());
    let before = editor.model().nodes().next().unwrap().position;

    editor.start_settling(None);
    editor.tick();
    editor.tick();
    editor.start_settling(Some(1));

    let after_commit = editor.model().nodes().next().unwrap().position;
    assert_ne!(before, after_commit);
    assert_eq!(editor.settle_run().map(|run| run.ticks()), Some(0));
}

#[test]
fn pointer_down_freezes_the_pass_where_it_is_drawn() {
    init_logging();
    let mut editor = Editor::default();
    editor.swap_graph(cluster());
    editor.start_settling(None);
    editor.tick();
    editor.tick();

    let node = editor.model().nodes().next().unwrap().id();
    let drawn = editor.scene().position_of(node).unwrap();
    editor.handle_input(&InputEvent::pointer_down(drawn.x, drawn.y, DragTarget::NodeBody(node)));
    assert!(!editor.is_settling());
    assert_eq!(editor.model().node(node).unwrap().position, drawn);

    editor.handle_input(&InputEvent::pointer_move(drawn.x + 10.0, drawn.y));
    editor.handle_input(&InputEvent::pointer_up(drawn.x + 10.0, drawn.y));
    let expected = drawn + Vec2::new(10.0, 0.0);
    let at = editor.model().node(node).unwrap().position;
    assert!((at - expected).hypot() < 1e-9, "{at:?} != {expected:?}");
    assert_eq!(editor.tick(), None, "the drag is not overwritten later");
}

#[test]
fn swap_drops_the_pass_without_committing() {
    init_logging();
    let mut editor = Editor::default();
    editor.swap_graph(cluster());
    editor.start_settling(None);
    editor.tick();

    let replacement = cluster();
    let expected: Vec<_> = replacement.nodes().map(|n| n.position).collect();
    editor.swap_graph(replacement);
    assert!(!editor.is_settling());
    let actual: Vec<_> = editor.model().nodes().map(|n| n.position).collect();
    assert_eq!(actual, expected);
}

#[test]
fn zero_cap_finishes_on_first_tick() {
    init_logging();
    let mut editor = Editor::default();
    editor.swap_graph(cluster());
    let log = EventLog::new();
    editor.subscribe(log.clone());

    editor.start_settling(Some(0));
    assert_eq!(editor.tick(), Some(SettleStatus::Finished));
    assert_eq!(log.events(), vec![SyncEvent::RedrawRequested]);
}

#[test]
fn loading_graph_data_with_config_overrides() {
    init_logging();
    let config = EditorConfig::from_json(r#"{ "settle": { "max_ticks": 3 } }"#).unwrap();
    let mut editor = Editor::new(config);
    let data = GraphData {
        nodes: vec![NodeData::new("a"), NodeData::new("b").at(10.0, 10.0)],
        relationships: vec![RelationshipData::new("a", "b")],
    };
    editor.load(&data).unwrap();
    assert_eq!(editor.model().node_count(), 2);
    assert_eq!(editor.active_relationship(), Some(editor.model().relationship_list()[0].id()));

    editor.perform(gd_editor::EditorAction::ForceLayout);
    assert_eq!(editor.settle_to_completion(), 3);
}
