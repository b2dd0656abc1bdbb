//! Polyline assembly: walk the segment graph into contour lines.
//!
//! Runs in two passes over the graph nodes in index order. Pass 1 starts
//! a walk at every unvisited chain end and yields open chains. Every node
//! left after that belongs to a cycle, so pass 2 starts a walk at each
//! remaining unvisited node and yields closed loops. Nodes are marked
//! visited as they are consumed and never revisited, so every contour
//! point ends up in exactly one walk.

use crate::graph::SegmentGraph;
use crate::progress::{Phase, Progress, ProgressTracker};
use crate::types::{ContourConfig, ContourLine, Point, Polyline};

/// Lines produced by [`assemble`] plus bookkeeping counts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Assembly {
    /// Contour lines in output order, feature ids already assigned.
    pub lines: Vec<ContourLine>,
    /// Nodes consumed across both passes.
    pub visited: usize,
    /// Open chains emitted by pass 1.
    pub open_chains: usize,
    /// Closed loops emitted by pass 2.
    pub closed_loops: usize,
    /// Pass 2 walks that did not return to their start; emitted as open.
    pub unclosed_loops: usize,
    /// Walks discarded for having fewer than 2 distinct vertices.
    pub discarded: usize,
}

impl Assembly {
    /// Append a line under the next feature id.
    fn push_line(&mut self, elevation: f64, band: i64, closed: bool, vertices: Vec<Point>) {
        let fid = self.lines.len() + 1;
        self.lines.push(ContourLine {
            fid,
            elevation,
            band,
            closed,
            polyline: Polyline::new(vertices),
        });
    }
}

/// One raw graph walk before clean-up.
struct Walk {
    vertices: Vec<Point>,
    level: f64,
    band: i64,
}

/// Walk the graph from `start`, consuming nodes as they are reached.
///
/// Each step prefers the unvisited sibling (crossing a segment) and
/// otherwise hops to the lowest-index unvisited coincident neighbor.
fn walk(
    graph: &SegmentGraph,
    start: usize,
    visited: &mut [bool],
    insert_midpoints: bool,
) -> Walk {
    let origin = graph.point(start);
    let mut vertices = vec![origin.position];
    visited[start] = true;
    let mut current = start;

    loop {
        if let Some(sibling) = graph.sibling(current)
            && !visited[sibling]
        {
            let from = graph.point(current).position;
            let to = graph.point(sibling).position;
            if insert_midpoints {
                vertices.push(from.midpoint(to));
            }
            vertices.push(to);
            visited[sibling] = true;
            current = sibling;
            continue;
        }

        match graph.coincident(current).into_iter().find(|&n| !visited[n]) {
            Some(next) => {
                vertices.push(graph.point(next).position);
                visited[next] = true;
                current = next;
            }
            None => break,
        }
    }

    Walk {
        vertices,
        level: origin.level,
        band: origin.band,
    }
}

/// Drop every vertex within `precision` of the previously kept one.
fn dedup_within(vertices: Vec<Point>, precision: f64) -> Vec<Point> {
    let mut kept: Vec<Point> = Vec::with_capacity(vertices.len());
    for p in vertices {
        match kept.last() {
            Some(prev) if prev.distance(p) <= precision => {}
            _ => kept.push(p),
        }
    }
    kept
}

/// Close a ring whose last vertex returned to within `precision` of its
/// first: trailing vertices collapsing onto the start are dropped and
/// the last vertex becomes an exact copy of the first.
///
/// Returns `false` (leaving `vertices` untouched) when the walk did not
/// come back, or is too short to enclose anything.
fn close_ring(vertices: &mut Vec<Point>, precision: f64) -> bool {
    let (Some(&first), Some(&last)) = (vertices.first(), vertices.last()) else {
        return false;
    };
    if first.distance(last) > precision {
        return false;
    }
    let keep = vertices
        .iter()
        .rposition(|p| p.distance(first) > precision)
        .map_or(0, |i| i + 1);
    if keep < 3 {
        return false;
    }
    vertices.truncate(keep);
    vertices.push(first);
    true
}

/// Assemble every contour line from the segment graph.
///
/// Feature ids are assigned 1-based in output order: pass 1 chains in
/// discovery order, then pass 2 loops.
pub fn assemble(
    graph: &SegmentGraph,
    config: &ContourConfig,
    progress: &mut dyn Progress,
) -> Assembly {
    let node_count = graph.node_count();
    let insert_midpoints = config.effective_filter_size() > 1;
    let precision = config.precision;
    let mut visited = vec![false; node_count];
    let mut assembly = Assembly::default();

    let mut tracker = ProgressTracker::new(Phase::OpenChains, node_count);
    for n in 0..node_count {
        if !visited[n] && graph.is_chain_end(n) {
            let Walk {
                vertices,
                level,
                band,
            } = walk(graph, n, &mut visited, insert_midpoints);
            let vertices = dedup_within(vertices, precision);
            if vertices.len() < 2 {
                assembly.discarded += 1;
            } else {
                assembly.push_line(level, band, false, vertices);
                assembly.open_chains += 1;
            }
        }
        tracker.update(n, progress);
    }

    let mut tracker = ProgressTracker::new(Phase::ClosedLoops, node_count);
    for n in 0..node_count {
        if !visited[n] {
            let Walk {
                vertices,
                level,
                band,
            } = walk(graph, n, &mut visited, insert_midpoints);
            let mut vertices = dedup_within(vertices, precision);
            if vertices.len() < 2 {
                assembly.discarded += 1;
            } else if close_ring(&mut vertices, precision) {
                assembly.push_line(level, band, true, vertices);
                assembly.closed_loops += 1;
            } else {
                tracing::debug!(
                    start = n,
                    level,
                    "loop walk did not return to its start, emitting as open",
                );
                assembly.push_line(level, band, false, vertices);
                assembly.unclosed_loops += 1;
            }
        }
        tracker.update(n, progress);
    }

    assembly.visited = visited.iter().filter(|&&v| v).count();

    tracing::debug!(
        nodes = node_count,
        open_chains = assembly.open_chains,
        closed_loops = assembly.closed_loops,
        unclosed_loops = assembly.unclosed_loops,
        discarded = assembly.discarded,
        "assembled contour lines",
    );
    assembly
}
