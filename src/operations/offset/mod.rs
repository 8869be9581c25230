//! Inward wavefront simulation (straight skeleton) of regions with holes.
//!
//! An [`Offset`] is a tree of generations kept in a slot map. Each
//! generation advances every boundary vertex along its bisector until the
//! next topology event: a vertex event, where an edge shrinks to nothing, or
//! an edge event, where a reflex vertex runs into a non-adjacent edge and
//! splits or joins loops. The resulting regions become child generations.

mod event;
mod spoke;
mod wavefront;

pub use event::{EventKind, OffsetEvent};
pub use spoke::Spoke;

use slotmap::SlotMap;
use tracing::debug;

use crate::error::Diagnostics;
use crate::geom::{Model, PolyArea, Points};
use crate::math::polygon_2d::signed_area;
use crate::math::{AREATOL, TOL};
use wavefront::{loops_to_polyareas, make_new_faces, split_join_faces};

slotmap::new_key_type! {
    /// Identifier of one generation in an [`Offset`] tree.
    pub struct OffsetId;
}

/// Event time used when no event exists.
const NO_EVENT: f64 = 1e100;

/// One wavefront generation: a region, its spokes and the time span it
/// covers.
#[derive(Debug, Clone)]
pub struct OffsetNode<D> {
    /// The region at the start of this generation.
    pub polyarea: PolyArea<D>,
    /// Spokes of the outer loop and every hole, one list per loop.
    pub facespokes: Vec<Vec<Spoke>>,
    /// Time at which this generation starts.
    pub timesofar: f64,
    /// Time this generation advanced to. Equals `timesofar` until built.
    pub endtime: f64,
    /// Regions this generation turned into.
    pub children: Vec<OffsetId>,
    built: bool,
    /// Set when an edge event at the very start of the generation was
    /// resolved without moving the wavefront.
    resolved_in_place: bool,
    /// Consecutive in-place resolutions leading to this generation.
    instant_steps: usize,
}

impl<D> OffsetNode<D> {
    fn new(polyarea: PolyArea<D>, points: &Points, timesofar: f64, diags: &mut Diagnostics) -> Self {
        let mut facespokes = Vec::new();
        for face in polyarea.loops() {
            let n = face.len();
            if n <= 2 || signed_area(face, points).abs() < AREATOL {
                diags.degenerate(format!("skipping degenerate loop of {n} vertices"));
                continue;
            }
            let f = facespokes.len();
            facespokes.push(
                (0..n)
                    .map(|i| {
                        Spoke::new(face[i], face[(i + n - 1) % n], face[(i + 1) % n], points)
                            .in_loop(f, i)
                    })
                    .collect(),
            );
        }
        Self {
            polyarea,
            facespokes,
            timesofar,
            endtime: timesofar,
            children: Vec::new(),
            built: false,
            resolved_in_place: false,
            instant_steps: 0,
        }
    }

    /// Returns true if this generation moved its boundary.
    #[must_use]
    pub fn is_advanced(&self) -> bool {
        self.endtime > self.timesofar
    }

    /// Earliest event of this generation, `None` if the wavefront never
    /// changes topology again.
    ///
    /// Events within [`TOL`] of the earliest one count as simultaneous; the
    /// first edge event among them is returned, since vertex events resolve
    /// on their own when consecutive destinations merge.
    #[must_use]
    pub fn next_event(&self) -> Option<OffsetEvent> {
        let mut events: Vec<OffsetEvent> = Vec::new();
        for spokes in &self.facespokes {
            let n = spokes.len();
            for (i, s) in spokes.iter().enumerate() {
                if let Some(time) = s.vertex_event(&spokes[(i + 1) % n]) {
                    events.push(OffsetEvent {
                        time,
                        point: s.end_point(time, 0.0),
                        face: s.face,
                        spoke: s.index,
                        kind: EventKind::Vertex,
                    });
                }
                if !s.is_reflex {
                    continue;
                }
                for others in &self.facespokes {
                    let m = others.len();
                    for j in 0..m {
                        let (e1, e2) = (&others[j], &others[(j + 1) % m]);
                        if (e1.face == s.face && (j == i || (j + 1) % m == i))
                            || e1.origin == s.origin
                            || e2.origin == s.origin
                        {
                            continue;
                        }
                        if let Some(time) = s.edge_event(e1, e2) {
                            events.push(OffsetEvent {
                                time,
                                point: s.end_point(time, 0.0),
                                face: s.face,
                                spoke: s.index,
                                kind: EventKind::Edge {
                                    edge_face: e1.face,
                                    edge: e1.index,
                                },
                            });
                        }
                    }
                }
            }
        }
        let best = events.iter().map(|e| e.time).fold(NO_EVENT, f64::min);
        if best >= NO_EVENT {
            return None;
        }
        let tied: Vec<&OffsetEvent> = events.iter().filter(|e| e.time <= best + TOL).collect();
        let chosen = tied
            .iter()
            .find(|e| e.is_edge_event())
            .or_else(|| tied.first())?;
        Some(OffsetEvent {
            time: best,
            ..**chosen
        })
    }
}

/// The generation tree of an inward offset.
#[derive(Debug, Clone)]
pub struct Offset<D> {
    nodes: SlotMap<OffsetId, OffsetNode<D>>,
    root: OffsetId,
    vspeed: f64,
    diagnostics: Diagnostics,
}

impl<D: Clone> Offset<D> {
    /// Starts an offset of `polyarea` at time `time`.
    ///
    /// Points rise by `vspeed` per unit of time, which turns the inset into
    /// a bevel of slope `vspeed`. Degenerate loops get no spokes.
    #[must_use]
    pub fn new(polyarea: PolyArea<D>, points: &Points, time: f64, vspeed: f64) -> Self {
        let mut diagnostics = Diagnostics::new();
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(OffsetNode::new(polyarea, points, time, &mut diagnostics));
        Self {
            nodes,
            root,
            vspeed,
            diagnostics,
        }
    }

    /// Advances the wavefront until time `target` (absolute) or until it
    /// collapses, whichever comes first. New points go into `points`.
    ///
    /// Calling again with a larger `target` continues from where the
    /// previous call stopped.
    pub fn build(&mut self, points: &mut Points, target: f64) {
        let mut work: Vec<OffsetId> = self
            .nodes
            .iter()
            .filter(|(_, n)| !n.built)
            .map(|(id, _)| id)
            .collect();
        let mut generations = 0usize;
        while let Some(id) = work.pop() {
            generations += 1;
            work.extend(self.build_node(id, points, target));
        }
        debug!(generations, nodes = self.nodes.len(), target, "offset built");
    }

    /// Builds one generation and returns the children that should be built
    /// next.
    fn build_node(&mut self, id: OffsetId, points: &mut Points, target: f64) -> Vec<OffsetId> {
        let vspeed = self.vspeed;
        let Some(node) = self.nodes.get_mut(id) else {
            return Vec::new();
        };
        if node.built || node.timesofar >= target {
            return Vec::new();
        }
        let Some(event) = node.next_event() else {
            node.built = true;
            debug!(loops = node.facespokes.len(), "no wavefront event, generation is final");
            return Vec::new();
        };
        // An edge event at the very start comes from a tie with the event
        // that created this generation. It is resolved without moving.
        let instant = event.time <= TOL;
        if instant {
            let limit: usize = node.facespokes.iter().map(Vec::len).sum();
            if !event.is_edge_event() {
                node.built = true;
                debug!(time = event.time, "wavefront event too close, generation is final");
                return Vec::new();
            }
            if node.instant_steps >= limit {
                node.built = true;
                self.diagnostics.fallback(format!(
                    "edge events keep recurring at time {}, generation is final",
                    node.timesofar
                ));
                return Vec::new();
            }
        }
        let (t, hit, truncated) = if instant {
            (0.0, event.edge_hit(), false)
        } else if node.timesofar + event.time >= target {
            (target - node.timesofar, None, true)
        } else {
            (event.time, event.edge_hit(), false)
        };
        node.built = true;
        node.resolved_in_place = instant;
        node.endtime = node.timesofar + t;
        let endtime = node.endtime;
        let instant_steps = if instant { node.instant_steps + 1 } else { 0 };

        let advanced = make_new_faces(&mut node.facespokes, t, vspeed, points);
        let loops = match hit {
            Some(h) => split_join_faces(&advanced, h, &mut self.diagnostics),
            None => advanced.into_iter().map(|l| l.verts).collect(),
        };
        let regions = loops_to_polyareas(loops, points, &node.polyarea.data, &mut self.diagnostics);
        debug!(
            t,
            endtime,
            edge_event = hit.is_some(),
            children = regions.len(),
            "wavefront generation"
        );

        let mut children = Vec::with_capacity(regions.len());
        for pa in regions {
            let mut child = OffsetNode::new(pa, points, endtime, &mut self.diagnostics);
            child.instant_steps = instant_steps;
            children.push(self.nodes.insert(child));
        }
        if let Some(node) = self.nodes.get_mut(id) {
            node.children.clone_from(&children);
        }
        if truncated {
            Vec::new()
        } else {
            children
        }
    }

    /// Total time until the wavefront collapses completely, as far as the
    /// tree has been built.
    #[must_use]
    pub fn max_amount(&self) -> f64 {
        self.nodes
            .values()
            .filter(|n| n.is_advanced())
            .map(|n| n.endtime)
            .fold(0.0, f64::max)
    }

    /// Regions left at the innermost generations, skipping those whose area
    /// net of holes is below [`AREATOL`].
    #[must_use]
    pub fn inner_polyareas(&self, points: &Points) -> Vec<PolyArea<D>> {
        let mut out = Vec::new();
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            let Some(node) = self.nodes.get(id) else {
                continue;
            };
            if node.children.is_empty() {
                if !node.is_advanced()
                    && !node.resolved_in_place
                    && node.polyarea.net_area(points) >= AREATOL
                {
                    out.push(node.polyarea.clone());
                }
            } else {
                stack.extend(node.children.iter().rev());
            }
        }
        out
    }

    /// Adds the side faces swept by every advanced generation to `model`
    /// and returns the innermost regions.
    ///
    /// Each spoke and its successor sweep a quad from their origins to
    /// their destinations; when the destinations coincide the quad is a
    /// triangle. `model.points` must be the point set the offset was built
    /// on.
    pub fn add_offset_faces_to_model(&self, model: &mut Model<D>) -> Vec<PolyArea<D>> {
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            let Some(node) = self.nodes.get(id) else {
                continue;
            };
            stack.extend(node.children.iter().rev());
            if !node.is_advanced() {
                continue;
            }
            for spokes in &node.facespokes {
                let n = spokes.len();
                for (i, s) in spokes.iter().enumerate() {
                    let sn = &spokes[(i + 1) % n];
                    let (Some(d0), Some(d1)) = (s.dest, sn.dest) else {
                        continue;
                    };
                    let face = if d0 == d1 {
                        vec![s.origin, sn.origin, d0]
                    } else {
                        vec![s.origin, sn.origin, d1, d0]
                    };
                    model.push_face(face, node.polyarea.data.clone());
                }
            }
        }
        self.inner_polyareas(&model.points)
    }

    #[must_use]
    pub fn root(&self) -> OffsetId {
        self.root
    }

    #[must_use]
    pub fn node(&self, id: OffsetId) -> Option<&OffsetNode<D>> {
        self.nodes.get(id)
    }

    /// Number of generations in the tree.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[must_use]
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Moves the collected diagnostics out, leaving the offset with none.
    pub fn take_diagnostics(&mut self) -> Diagnostics {
        std::mem::take(&mut self.diagnostics)
    }
}
