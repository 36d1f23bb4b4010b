use egui::Color32;
use serde::{Deserialize, Serialize};

/// Kind of a domain entity shown on the canvas.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Topic,
    Case,
    Task,
    Reference,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Topic => "topic",
            EntityKind::Case => "case",
            EntityKind::Task => "task",
            EntityKind::Reference => "reference",
        }
    }

    /// Presentation attributes are a pure function of the kind.
    pub fn style(self) -> KindStyle {
        match self {
            EntityKind::Topic => KindStyle {
                radius: 60.,
                color: Color32::from_rgb(0x3b, 0x82, 0xf6),
            },
            EntityKind::Case => KindStyle {
                radius: 65.,
                color: Color32::from_rgb(0x63, 0x66, 0xf1),
            },
            EntityKind::Task => KindStyle {
                radius: 55.,
                color: Color32::from_rgb(0xf5, 0x9e, 0x0b),
            },
            EntityKind::Reference => KindStyle {
                radius: 58.,
                color: Color32::from_rgb(0xa8, 0x55, 0xf7),
            },
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct KindStyle {
    pub radius: f32,
    pub color: Color32,
}

/// Stable synthetic id of a canvas node, `"<kind>-<entity id>"`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub String);

impl NodeId {
    pub fn new(kind: EntityKind, entity_id: &str) -> Self {
        Self(format!("{}-{entity_id}", kind.as_str()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    pub id: String,
    pub title: String,
    pub label: Option<String>,
    pub category: Option<String>,
    pub position: Option<[f32; 2]>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CaseEntity {
    pub id: String,
    pub case_id: String,
    pub title: Option<String>,
    pub label: Option<String>,
    pub primary_diagnosis: Option<String>,
    pub position: Option<[f32; 2]>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskEntity {
    pub id: String,
    pub title: String,
    pub label: Option<String>,
    pub status: Option<String>,
    pub linked_case_id: Option<String>,
    pub position: Option<[f32; 2]>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ReferenceEntity {
    pub id: String,
    pub title: String,
    pub label: Option<String>,
    pub authors: Option<String>,
    pub position: Option<[f32; 2]>,
}

/// A user-created link between two canvas nodes. `source` and `target` hold
/// node ids (`"topic-3"`), not raw entity ids.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    pub id: Option<String>,
    pub source: String,
    pub target: String,
    pub kind: Option<String>,
    pub label: Option<String>,
}

/// Read-only snapshot of the host's domain collections, consumed per sync.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MapSnapshot {
    pub topics: Vec<Topic>,
    pub cases: Vec<CaseEntity>,
    pub tasks: Vec<TaskEntity>,
    pub references: Vec<ReferenceEntity>,
    pub connections: Vec<Connection>,
}

const UNNAMED: &str = "Unnamed";

fn first_nonempty<'a>(candidates: &[Option<&'a str>]) -> &'a str {
    candidates
        .iter()
        .flatten()
        .find(|s| !s.trim().is_empty())
        .copied()
        .unwrap_or(UNNAMED)
}

impl Topic {
    pub fn display_label(&self) -> String {
        first_nonempty(&[self.label.as_deref(), Some(&self.title)]).to_string()
    }
}

impl CaseEntity {
    pub fn display_label(&self) -> String {
        first_nonempty(&[
            self.label.as_deref(),
            self.title.as_deref(),
            Some(&self.case_id),
        ])
        .to_string()
    }
}

impl TaskEntity {
    pub fn display_label(&self) -> String {
        first_nonempty(&[self.label.as_deref(), Some(&self.title)]).to_string()
    }
}

impl ReferenceEntity {
    pub fn display_label(&self) -> String {
        first_nonempty(&[self.label.as_deref(), Some(&self.title)]).to_string()
    }
}

impl Connection {
    /// Connections without a domain id get a deterministic composite one.
    pub fn edge_id(&self) -> String {
        match &self.id {
            Some(id) if !id.is_empty() => id.clone(),
            _ => format!("edge-{}-{}", self.source, self.target),
        }
    }

    pub fn kind_or_default(&self) -> String {
        self.kind
            .clone()
            .filter(|k| !k.is_empty())
            .unwrap_or_else(|| "related".to_string())
    }
}
