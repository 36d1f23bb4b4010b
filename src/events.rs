use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::{Connection, EntityKind};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PayloadNodeClick {
    pub id: String,
    pub kind: EntityKind,
    pub entity_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PayloadNodeDoubleClick {
    pub id: String,
    pub kind: EntityKind,
    pub entity_id: String,
}

/// High-frequency position update while a drag is in flight. Receivers are
/// expected to coalesce these; dropping intermediate ones is fine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PayloadNodeMove {
    pub id: String,
    pub position: [f32; 2],
}

/// Final position commit for one node, fired exactly once per drag.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PayloadNodePositionChange {
    pub kind: EntityKind,
    pub id: String,
    pub position: [f32; 2],
}

/// Position commit for the whole graph, fired on every realign completion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PayloadBatchPositionChange {
    pub positions: BTreeMap<String, [f32; 2]>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PayloadConnectionCreateRequest {
    pub source: String,
    pub target: String,
}

/// Duplicate-connection attempt; the host is expected to surface a warning.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PayloadConnectionRejected {
    pub source: String,
    pub target: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PayloadConnectionDelete {
    pub connection_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PayloadConnectionSetChange {
    pub connections: Vec<Connection>,
}

/// Events the canvas publishes to its host.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Event {
    NodeClick(PayloadNodeClick),
    NodeDoubleClick(PayloadNodeDoubleClick),
    NodeMove(PayloadNodeMove),
    NodePositionChange(PayloadNodePositionChange),
    BatchPositionChange(PayloadBatchPositionChange),
    ConnectionCreateRequest(PayloadConnectionCreateRequest),
    ConnectionRejected(PayloadConnectionRejected),
    ConnectionDelete(PayloadConnectionDelete),
    ConnectionSetChange(PayloadConnectionSetChange),
}

/// Receiver of canvas events. Implemented for crossbeam senders; wrap a
/// closure in [`FnSink`] or implement it yourself for custom routing.
pub trait EventSink {
    fn send(&self, event: Event);
}

impl EventSink for crossbeam::channel::Sender<Event> {
    fn send(&self, event: Event) {
        // Slow or disconnected receivers must never block or poison a frame.
        let _ = crossbeam::channel::Sender::send(self, event);
    }
}

/// Adapter turning any `Fn(Event)` closure into an [`EventSink`].
pub struct FnSink<F: Fn(Event)>(pub F);

impl<F: Fn(Event)> EventSink for FnSink<F> {
    fn send(&self, event: Event) {
        (self.0)(event);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_contract_node_click() {
        let event = Event::NodeClick(PayloadNodeClick {
            id: "topic-1".to_string(),
            kind: EntityKind::Topic,
            entity_id: "1".to_string(),
        });
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(
            json,
            r#"{"NodeClick":{"id":"topic-1","kind":"topic","entity_id":"1"}}"#
        );

        let back: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_contract_position_change() {
        let event = Event::NodePositionChange(PayloadNodePositionChange {
            kind: EntityKind::Case,
            id: "case-7".to_string(),
            position: [500.0, 500.0],
        });
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(
            json,
            r#"{"NodePositionChange":{"kind":"case","id":"case-7","position":[500.0,500.0]}}"#
        );

        let back: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_contract_batch_position_change() {
        let mut positions = BTreeMap::new();
        positions.insert("task-2".to_string(), [1.0, 2.0]);
        positions.insert("topic-1".to_string(), [3.0, 4.0]);
        let event = Event::BatchPositionChange(PayloadBatchPositionChange { positions });
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(
            json,
            r#"{"BatchPositionChange":{"positions":{"task-2":[1.0,2.0],"topic-1":[3.0,4.0]}}}"#
        );
    }

    #[test]
    fn test_contract_connection_create_request() {
        let event = Event::ConnectionCreateRequest(PayloadConnectionCreateRequest {
            source: "topic-t1".to_string(),
            target: "case-c1".to_string(),
        });
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(
            json,
            r#"{"ConnectionCreateRequest":{"source":"topic-t1","target":"case-c1"}}"#
        );
    }

    #[test]
    fn closure_sink_receives_events() {
        use std::cell::RefCell;
        let seen = RefCell::new(Vec::new());
        let sink = FnSink(|e: Event| seen.borrow_mut().push(e));
        sink.send(Event::ConnectionDelete(PayloadConnectionDelete {
            connection_id: "edge-a-b".to_string(),
        }));
        assert_eq!(seen.borrow().len(), 1);
    }

    #[test]
    fn channel_sink_receives_events() {
        let (tx, rx) = crossbeam::channel::unbounded();
        EventSink::send(
            &tx,
            Event::ConnectionRejected(PayloadConnectionRejected {
                source: "topic-1".to_string(),
                target: "case-2".to_string(),
            }),
        );
        assert_eq!(rx.len(), 1);
    }
}
