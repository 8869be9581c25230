use std::collections::{HashMap, HashSet};

use rand::Rng;

/// A weighted edge between two graph nodes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchEdge {
    pub a: usize,
    pub b: usize,
    pub weight: f64,
}

impl MatchEdge {
    #[must_use]
    pub fn new(a: usize, b: usize, weight: f64) -> Self {
        Self { a, b, weight }
    }

    fn touches(&self, other: &MatchEdge) -> bool {
        self.a == other.a || self.a == other.b || self.b == other.a || self.b == other.b
    }
}

/// Total weight of a set of edges.
#[must_use]
pub fn total_weight(edges: &[MatchEdge]) -> f64 {
    edges.iter().map(|e| e.weight).sum()
}

/// Greedy matching: takes edges by descending weight while both endpoints
/// are free.
#[must_use]
pub fn greedy_match(edges: &[MatchEdge]) -> Vec<MatchEdge> {
    let mut sorted = edges.to_vec();
    sorted.sort_by(|x, y| y.weight.total_cmp(&x.weight));
    let mut used = HashSet::new();
    let mut out = Vec::new();
    for e in sorted {
        if !used.contains(&e.a) && !used.contains(&e.b) {
            used.insert(e.a);
            used.insert(e.b);
            out.push(e);
        }
    }
    out
}

/// Maximum-weight matching by divide and conquer.
///
/// The graph is split into connected components, each solved on its own.
/// A component without cycles is solved exactly by dynamic programming over
/// a rooted spanning order. Otherwise the search branches on including or
/// excluding a pivot edge picked at random from `rng` among the edges that
/// lie on a cycle, so the branching is exponential only in the number of
/// independent cycles.
pub fn max_match<R: Rng>(edges: &[MatchEdge], rng: &mut R) -> Vec<MatchEdge> {
    dc_match(edges, rng)
}

fn dc_match<R: Rng>(edges: &[MatchEdge], rng: &mut R) -> Vec<MatchEdge> {
    match edges.len() {
        0 => return Vec::new(),
        1 => return edges.to_vec(),
        _ => {}
    }
    let comps = components(edges);
    if comps.len() > 1 {
        let mut out = Vec::new();
        for c in &comps {
            out.extend(dc_match(c, rng));
        }
        return out;
    }
    let nodes: HashSet<usize> = edges.iter().flat_map(|e| [e.a, e.b]).collect();
    if edges.len() + 1 == nodes.len() {
        return tree_match(edges);
    }
    let cycle_edges: Vec<usize> = (0..edges.len()).filter(|&i| !is_bridge(edges, i)).collect();
    if cycle_edges.is_empty() {
        return tree_match(edges);
    }
    let pivot = cycle_edges[rng.gen_range(0..cycle_edges.len())];
    e_match(edges, pivot, rng)
}

/// Best of the two branches: with `edges[pivot]` in the matching, or without.
fn e_match<R: Rng>(edges: &[MatchEdge], pivot: usize, rng: &mut R) -> Vec<MatchEdge> {
    let pe = edges[pivot];
    let rest_with: Vec<MatchEdge> = edges.iter().filter(|e| !e.touches(&pe)).copied().collect();
    let mut with = dc_match(&rest_with, rng);
    with.push(pe);

    let rest_without: Vec<MatchEdge> = edges
        .iter()
        .enumerate()
        .filter(|&(i, _)| i != pivot)
        .map(|(_, e)| *e)
        .collect();
    let without = dc_match(&rest_without, rng);

    if total_weight(&with) >= total_weight(&without) {
        with
    } else {
        without
    }
}

/// Splits the edge set into connected components.
fn components(edges: &[MatchEdge]) -> Vec<Vec<MatchEdge>> {
    let mut parent: HashMap<usize, usize> = HashMap::new();
    for e in edges {
        parent.entry(e.a).or_insert(e.a);
        parent.entry(e.b).or_insert(e.b);
        let ra = find(&mut parent, e.a);
        let rb = find(&mut parent, e.b);
        if ra != rb {
            parent.insert(ra, rb);
        }
    }
    let mut order: Vec<usize> = Vec::new();
    let mut groups: HashMap<usize, Vec<MatchEdge>> = HashMap::new();
    for e in edges {
        let r = find(&mut parent, e.a);
        groups
            .entry(r)
            .or_insert_with(|| {
                order.push(r);
                Vec::new()
            })
            .push(*e);
    }
    order
        .into_iter()
        .filter_map(|r| groups.remove(&r))
        .collect()
}

/// Union-find root lookup with path compression.
fn find(parent: &mut HashMap<usize, usize>, x: usize) -> usize {
    let mut root = x;
    while let Some(&p) = parent.get(&root) {
        if p == root {
            break;
        }
        root = p;
    }
    let mut cur = x;
    while cur != root {
        let next = parent.get(&cur).copied().unwrap_or(root);
        parent.insert(cur, root);
        cur = next;
    }
    root
}

/// Exact matching of a connected acyclic edge set.
///
/// For every node `free` is the best weight of its subtree with the node left
/// unmatched and `best` the best weight overall; `pick` remembers the child
/// edge that achieves `best`.
fn tree_match(edges: &[MatchEdge]) -> Vec<MatchEdge> {
    let mut adj: HashMap<usize, Vec<(usize, usize)>> = HashMap::new();
    for (i, e) in edges.iter().enumerate() {
        adj.entry(e.a).or_default().push((e.b, i));
        adj.entry(e.b).or_default().push((e.a, i));
    }
    let Some(root) = edges.first().map(|e| e.a) else {
        return Vec::new();
    };

    let mut order = Vec::new();
    let mut children: HashMap<usize, Vec<(usize, usize)>> = HashMap::new();
    let mut seen = HashSet::from([root]);
    let mut stack = vec![root];
    while let Some(v) = stack.pop() {
        order.push(v);
        for &(w, i) in adj.get(&v).map_or(&[][..], Vec::as_slice) {
            if seen.insert(w) {
                children.entry(v).or_default().push((w, i));
                stack.push(w);
            }
        }
    }

    let mut free: HashMap<usize, f64> = HashMap::new();
    let mut best: HashMap<usize, f64> = HashMap::new();
    let mut pick: HashMap<usize, (usize, usize)> = HashMap::new();
    for &v in order.iter().rev() {
        let kids = children.get(&v).map_or(&[][..], Vec::as_slice);
        let f: f64 = kids.iter().map(|(c, _)| best.get(c).copied().unwrap_or(0.0)).sum();
        let mut g = f;
        for &(c, i) in kids {
            let bc = best.get(&c).copied().unwrap_or(0.0);
            let fc = free.get(&c).copied().unwrap_or(0.0);
            let cand = f - bc + fc + edges[i].weight;
            if cand > g {
                g = cand;
                pick.insert(v, (c, i));
            }
        }
        free.insert(v, f);
        best.insert(v, g);
    }

    let mut out = Vec::new();
    let mut stack = vec![(root, false)];
    while let Some((v, taken)) = stack.pop() {
        let chosen = if taken { None } else { pick.get(&v).copied() };
        if let Some((_, i)) = chosen {
            out.push(edges[i]);
        }
        for &(c, _) in children.get(&v).map_or(&[][..], Vec::as_slice) {
            stack.push((c, chosen.is_some_and(|(m, _)| m == c)));
        }
    }
    out
}

/// True if removing `edges[i]` disconnects its endpoints.
fn is_bridge(edges: &[MatchEdge], i: usize) -> bool {
    let rest: Vec<MatchEdge> = edges
        .iter()
        .enumerate()
        .filter(|&(j, _)| j != i)
        .map(|(_, e)| *e)
        .collect();
    let e = edges[i];
    !connected(&rest, e.a, e.b)
}

fn connected(edges: &[MatchEdge], from: usize, to: usize) -> bool {
    let mut adj: HashMap<usize, Vec<usize>> = HashMap::new();
    for e in edges {
        adj.entry(e.a).or_default().push(e.b);
        adj.entry(e.b).or_default().push(e.a);
    }
    let mut seen = HashSet::from([from]);
    let mut stack = vec![from];
    while let Some(v) = stack.pop() {
        if v == to {
            return true;
        }
        for &w in adj.get(&v).map_or(&[][..], Vec::as_slice) {
            if seen.insert(w) {
                stack.push(w);
            }
        }
    }
    false
}

/// Returns true if no node is used by two edges.
#[must_use]
pub fn is_matching(edges: &[MatchEdge]) -> bool {
    let mut used = HashSet::new();
    edges.iter().all(|e| used.insert(e.a) && used.insert(e.b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn exact_beats_greedy_on_a_path() {
        // Path 0-1-2-3: greedy takes the heavy middle edge, the optimum takes
        // both ends.
        let edges = vec![
            MatchEdge::new(0, 1, 6.0),
            MatchEdge::new(1, 2, 10.0),
            MatchEdge::new(2, 3, 6.0),
        ];
        let greedy = greedy_match(&edges);
        assert!((total_weight(&greedy) - 10.0).abs() < 1e-12);
        let mut rng = StdRng::seed_from_u64(1);
        let best = max_match(&edges, &mut rng);
        assert!(is_matching(&best));
        assert!((total_weight(&best) - 12.0).abs() < 1e-12);
    }

    #[test]
    fn cycle_uses_random_pivot() {
        // Every edge of a 5-cycle lies on the cycle; the best matching has two edges.
        let edges: Vec<MatchEdge> = (0..5)
            .map(|i| MatchEdge::new(i, (i + 1) % 5, 1.0 + i as f64))
            .collect();
        let mut rng = StdRng::seed_from_u64(7);
        let best = max_match(&edges, &mut rng);
        assert!(is_matching(&best));
        assert_eq!(best.len(), 2);
        // Weights 1..=5 on a 5-cycle: best pair is 5 + 3 = 8.
        assert!((total_weight(&best) - 8.0).abs() < 1e-12);
    }

    #[test]
    fn exact_is_never_worse_than_greedy() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..20 {
            let n = 8;
            let mut edges = Vec::new();
            for a in 0..n {
                for b in (a + 1)..n {
                    if rng.gen_bool(0.35) {
                        edges.push(MatchEdge::new(a, b, rng.gen_range(1.0..20.0)));
                    }
                }
            }
            let greedy = greedy_match(&edges);
            let best = max_match(&edges, &mut rng);
            assert!(is_matching(&greedy));
            assert!(is_matching(&best));
            assert!(total_weight(&best) + 1e-9 >= total_weight(&greedy));
        }
    }

    #[test]
    fn disconnected_components_are_solved_separately() {
        let edges = vec![MatchEdge::new(0, 1, 1.0), MatchEdge::new(5, 6, 2.0)];
        let mut rng = StdRng::seed_from_u64(0);
        let best = max_match(&edges, &mut rng);
        assert_eq!(best.len(), 2);
    }

    fn brute_force(edges: &[MatchEdge]) -> f64 {
        let mut best = 0.0_f64;
        for mask in 0u32..(1 << edges.len()) {
            let subset: Vec<MatchEdge> = edges
                .iter()
                .enumerate()
                .filter(|&(i, _)| mask & (1 << i) != 0)
                .map(|(_, e)| *e)
                .collect();
            if is_matching(&subset) {
                best = best.max(total_weight(&subset));
            }
        }
        best
    }

    #[test]
    fn random_trees_match_brute_force() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..25 {
            let n = 11;
            let edges: Vec<MatchEdge> = (1..n)
                .map(|v| MatchEdge::new(rng.gen_range(0..v), v, rng.gen_range(1.0..20.0)))
                .collect();
            let best = max_match(&edges, &mut rng);
            assert!(is_matching(&best));
            assert!((total_weight(&best) - brute_force(&edges)).abs() < 1e-9);
        }
    }

    #[test]
    fn graphs_with_two_cycles_match_brute_force() {
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..10 {
            // A path of 10 nodes closed by two chords.
            let mut edges: Vec<MatchEdge> = (0..9)
                .map(|v| MatchEdge::new(v, v + 1, rng.gen_range(1.0..20.0)))
                .collect();
            edges.push(MatchEdge::new(0, 4, rng.gen_range(1.0..20.0)));
            edges.push(MatchEdge::new(5, 9, rng.gen_range(1.0..20.0)));
            let best = max_match(&edges, &mut rng);
            assert!(is_matching(&best));
            assert!((total_weight(&best) - brute_force(&edges)).abs() < 1e-9);
        }
    }

    #[test]
    fn long_path_is_solved_without_branching() {
        // Alternating weights 1, 3, 1, 3, ...: the heavy edges are disjoint.
        let edges: Vec<MatchEdge> = (0..400)
            .map(|v| MatchEdge::new(v, v + 1, if v % 2 == 0 { 1.0 } else { 3.0 }))
            .collect();
        let mut rng = StdRng::seed_from_u64(0);
        let start = std::time::Instant::now();
        let best = max_match(&edges, &mut rng);
        assert!(start.elapsed().as_secs() < 5);
        assert!(is_matching(&best));
        assert!((total_weight(&best) - 600.0).abs() < 1e-9);
    }
}
