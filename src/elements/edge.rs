/// A rendered connection between two nodes. Purely cosmetic beyond its
/// endpoints; the classification string defaults to `"related"`.
#[derive(Clone, Debug)]
pub struct EdgeLink {
    id: String,
    kind: String,
    label: Option<String>,
    hovered: bool,
}

impl EdgeLink {
    pub fn new(id: String, kind: String, label: Option<String>) -> Self {
        Self {
            id,
            kind,
            label,
            hovered: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn set_kind(&mut self, kind: String) {
        self.kind = kind;
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn set_label(&mut self, label: Option<String>) {
        self.label = label;
    }

    pub fn hovered(&self) -> bool {
        self.hovered
    }

    pub fn set_hovered(&mut self, hovered: bool) {
        self.hovered = hovered;
    }
}
