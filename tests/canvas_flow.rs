use egui::Pos2;

use mindmap_canvas::{
    Canvas, CaseEntity, Connection, Event, MapSnapshot, Metadata, NodeId, SimulationParams, Topic,
};

const CANVAS_CENTER: Pos2 = Pos2::new(400., 300.);

fn fast_canvas() -> Canvas {
    Canvas::with_params(SimulationParams {
        warmup_ms: 0,
        drag_grace_ms: 0,
        ..Default::default()
    })
}

fn topic(id: &str, title: &str) -> Topic {
    Topic {
        id: id.to_string(),
        title: title.to_string(),
        ..Default::default()
    }
}

fn case(id: &str, case_id: &str) -> CaseEntity {
    CaseEntity {
        id: id.to_string(),
        case_id: case_id.to_string(),
        ..Default::default()
    }
}

fn connection(source: &str, target: &str) -> Connection {
    Connection {
        source: source.to_string(),
        target: target.to_string(),
        ..Default::default()
    }
}

/// Drags the node under `from` to `to` and releases, returning the events.
fn drag(canvas: &mut Canvas, from: Pos2, to: Pos2, physics: bool) -> Vec<Event> {
    let meta = Metadata::default();
    let (g, sim, ctl) = canvas.parts();
    let mut events = Vec::new();
    ctl.pointer_down(g, sim, &meta, from, false);
    events.extend(ctl.pointer_move(g, &meta, to));
    events.extend(ctl.pointer_up(g, sim, physics, false));
    events
}

#[test]
fn content_edits_never_disturb_the_layout() {
    let mut canvas = fast_canvas();
    let mut snapshot = MapSnapshot {
        topics: vec![topic("t1", "Psychopharm"), topic("t2", "Mood disorders")],
        cases: vec![case("c1", "PSY-001")],
        connections: vec![connection("topic-t1", "case-c1")],
        ..Default::default()
    };
    canvas.sync(&snapshot, true);
    let fp = canvas.fingerprint().unwrap().to_string();
    let positions: Vec<(NodeId, Pos2)> = canvas
        .graph()
        .nodes_iter()
        .map(|(_, n)| (n.id().clone(), n.location()))
        .collect();

    // A volley of unrelated field edits, none touching topology.
    for title in ["a", "b", "c", "d"] {
        snapshot.topics[0].title = title.to_string();
        snapshot.cases[0].primary_diagnosis = Some(title.to_string());
        canvas.sync(&snapshot, true);
    }

    assert_eq!(canvas.fingerprint(), Some(fp.as_str()));
    for (id, pos) in positions {
        assert_eq!(
            canvas.graph().node_by_id(&id).unwrap().location(),
            pos,
            "{id} moved on a content-only edit"
        );
    }
}

#[test]
fn spawned_topic_lands_in_the_spawn_region() {
    let mut canvas = fast_canvas();
    canvas.sync(
        &MapSnapshot {
            topics: vec![topic("t1", "Psychopharm")],
            ..Default::default()
        },
        true,
    );

    let pos = canvas
        .graph()
        .node_by_id(&NodeId::from("topic-t1"))
        .unwrap()
        .location();
    assert!((200. ..=1000.).contains(&pos.x), "x out of spawn region: {pos:?}");
    assert!((200. ..=800.).contains(&pos.y), "y out of spawn region: {pos:?}");
}

#[test]
fn drag_commits_final_position_and_node_resumes_motion() {
    let mut canvas = fast_canvas();
    canvas.sync(
        &MapSnapshot {
            topics: vec![topic("t1", "Psychopharm")],
            ..Default::default()
        },
        true,
    );
    let start = canvas
        .graph()
        .node_by_id(&NodeId::from("topic-t1"))
        .unwrap()
        .location();

    let events = drag(&mut canvas, start, Pos2::new(500., 500.), true);
    let commit = events
        .iter()
        .find_map(|e| match e {
            Event::NodePositionChange(p) => Some(p),
            _ => None,
        })
        .expect("drag must commit a position change");
    assert_eq!(commit.position, [500., 500.]);
    assert!(
        !events.iter().any(|e| matches!(e, Event::NodeClick(_))),
        "a drag never doubles as a click"
    );

    // With physics on, the released node rejoins the simulation instead of
    // staying pinned at the drop point.
    let node = canvas.graph().node_by_id(&NodeId::from("topic-t1")).unwrap();
    assert!(!node.is_pinned());
    for _ in 0..120 {
        canvas.tick(CANVAS_CENTER, true);
    }
    let after = canvas
        .graph()
        .node_by_id(&NodeId::from("topic-t1"))
        .unwrap()
        .location();
    assert_ne!(after, Pos2::new(500., 500.), "node should resume free motion");
}

#[test]
fn sub_threshold_release_clicks_without_moving() {
    let mut canvas = fast_canvas();
    canvas.sync(
        &MapSnapshot {
            topics: vec![topic("t1", "Psychopharm")],
            ..Default::default()
        },
        true,
    );
    let start = canvas
        .graph()
        .node_by_id(&NodeId::from("topic-t1"))
        .unwrap()
        .location();

    let events = drag(&mut canvas, start, start + egui::Vec2::new(3., 2.), true);
    assert!(events.iter().any(|e| matches!(e, Event::NodeClick(_))));
    assert!(
        !events
            .iter()
            .any(|e| matches!(e, Event::NodePositionChange(_) | Event::NodeMove(_))),
        "sub-threshold gestures never move anything"
    );
}

#[test]
fn physics_off_drop_pins_exactly_at_release_point() {
    let mut canvas = fast_canvas();
    canvas.sync(
        &MapSnapshot {
            topics: vec![topic("t1", "Psychopharm"), topic("t2", "Mood")],
            ..Default::default()
        },
        false,
    );
    let start = canvas
        .graph()
        .node_by_id(&NodeId::from("topic-t1"))
        .unwrap()
        .location();

    drag(&mut canvas, start, Pos2::new(640., 480.), false);

    let node = canvas.graph().node_by_id(&NodeId::from("topic-t1")).unwrap();
    assert_eq!(node.pin(), Some(Pos2::new(640., 480.)));

    // The engine is stopped; nothing drifts afterwards.
    for _ in 0..30 {
        canvas.tick(CANVAS_CENTER, false);
    }
    assert_eq!(
        canvas
            .graph()
            .node_by_id(&NodeId::from("topic-t1"))
            .unwrap()
            .location(),
        Pos2::new(640., 480.)
    );
}

#[test]
fn realign_with_physics_off_settles_and_repins_all() {
    let mut canvas = fast_canvas();
    canvas.sync(
        &MapSnapshot {
            topics: vec![topic("t1", "A"), topic("t2", "B")],
            cases: vec![case("c1", "PSY-001")],
            connections: vec![connection("topic-t1", "case-c1")],
            ..Default::default()
        },
        false,
    );

    canvas.realign();
    let mut batch = None;
    for _ in 0..5000 {
        let events = canvas.tick(CANVAS_CENTER, false);
        if let Some(Event::BatchPositionChange(p)) = events.into_iter().next() {
            batch = Some(p);
            break;
        }
    }
    let batch = batch.expect("realign completion always emits a batch commit");
    assert_eq!(batch.positions.len(), 3);
    assert!(
        canvas.graph().nodes_iter().all(|(_, n)| n.is_pinned()),
        "every node is re-pinned at its settled coordinates"
    );
}

#[test]
fn dangling_connections_never_reach_the_graph() {
    let mut canvas = fast_canvas();
    canvas.sync(
        &MapSnapshot {
            topics: vec![topic("t1", "A")],
            connections: vec![
                connection("topic-t1", "case-missing"),
                connection("ghost-1", "topic-t1"),
            ],
            ..Default::default()
        },
        true,
    );
    assert_eq!(canvas.graph().node_count(), 1);
    assert_eq!(canvas.graph().edge_count(), 0);
}

#[test]
fn case_7_rehydrates_to_cached_position_after_edit_cycle() {
    let mut canvas = fast_canvas();
    let full = MapSnapshot {
        topics: vec![topic("t1", "A")],
        cases: vec![case("7", "PSY-007")],
        ..Default::default()
    };
    canvas.sync(&full, true);
    for _ in 0..10 {
        canvas.tick(CANVAS_CENTER, true);
    }
    let cached = canvas.cache().get(&NodeId::from("case-7")).unwrap();

    let without = MapSnapshot {
        topics: vec![topic("t1", "A")],
        ..Default::default()
    };
    canvas.sync(&without, true);
    assert!(!canvas.graph().contains(&NodeId::from("case-7")));

    canvas.sync(&full, true);
    assert_eq!(
        canvas
            .graph()
            .node_by_id(&NodeId::from("case-7"))
            .unwrap()
            .location(),
        cached,
        "re-created node must rehydrate, not respawn"
    );
}

#[test]
fn connect_mode_two_clicks_and_self_click() {
    let mut canvas = fast_canvas();
    canvas.sync(
        &MapSnapshot {
            topics: vec![topic("t1", "A")],
            cases: vec![case("c1", "PSY-001")],
            ..Default::default()
        },
        true,
    );
    let t1 = canvas.graph().index_of(&NodeId::from("topic-t1")).unwrap();
    let c1 = canvas.graph().index_of(&NodeId::from("case-c1")).unwrap();

    let (g, _, ctl) = canvas.parts();
    let mut events = ctl.node_click(g, t1, true);
    events.extend(ctl.node_click(g, c1, true));

    let creates: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            Event::ConnectionCreateRequest(p) => Some(p),
            _ => None,
        })
        .collect();
    assert_eq!(creates.len(), 1);
    assert_eq!(creates[0].source, "topic-t1");
    assert_eq!(creates[0].target, "case-c1");

    // Same node twice: back to idle, zero events.
    let mut events = ctl.node_click(g, t1, true);
    events.extend(ctl.node_click(g, t1, true));
    assert!(events.is_empty());
    assert_eq!(
        ctl.connect_state(),
        mindmap_canvas::ConnectState::Idle
    );
}

#[test]
fn duplicate_connection_rejected_in_both_directions() {
    let mut canvas = fast_canvas();
    canvas.sync(
        &MapSnapshot {
            topics: vec![topic("t1", "A")],
            cases: vec![case("c1", "PSY-001")],
            connections: vec![connection("topic-t1", "case-c1")],
            ..Default::default()
        },
        true,
    );
    let t1 = canvas.graph().index_of(&NodeId::from("topic-t1")).unwrap();
    let c1 = canvas.graph().index_of(&NodeId::from("case-c1")).unwrap();

    let (g, _, ctl) = canvas.parts();
    for (first, second) in [(t1, c1), (c1, t1)] {
        let mut events = ctl.node_click(g, first, true);
        events.extend(ctl.node_click(g, second, true));
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], Event::ConnectionRejected(_)));
    }
    assert_eq!(canvas.graph().edge_count(), 1, "edge set unchanged");
}
