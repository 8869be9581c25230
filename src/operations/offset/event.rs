use super::wavefront::EdgeHit;
use crate::math::Point3;

/// What changes at an [`OffsetEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// The spoke and its successor in the loop meet; the edge between them
    /// vanishes.
    Vertex,
    /// The reflex spoke runs into the edge that starts at spoke `edge` of
    /// loop `edge_face`.
    Edge { edge_face: usize, edge: usize },
}

/// A topology event of one wavefront generation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OffsetEvent {
    /// Time since the start of the generation.
    pub time: f64,
    /// Where the spoke is when the event happens, at its starting height.
    pub point: Point3,
    /// Loop of the spoke that causes the event.
    pub face: usize,
    /// Position of that spoke in its loop.
    pub spoke: usize,
    pub kind: EventKind,
}

impl OffsetEvent {
    #[must_use]
    pub fn is_edge_event(&self) -> bool {
        matches!(self.kind, EventKind::Edge { .. })
    }

    pub(crate) fn edge_hit(&self) -> Option<EdgeHit> {
        match self.kind {
            EventKind::Vertex => None,
            EventKind::Edge { edge_face, edge } => Some(EdgeHit {
                face: self.face,
                spoke: self.spoke,
                edge_face,
                edge,
            }),
        }
    }
}
