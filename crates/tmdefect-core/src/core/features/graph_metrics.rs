//! Topological descriptors of undirected graphs.
//!
//! The definitions follow the usual network-science conventions: path lengths count
//! edges, isolated nodes contribute zero where a ratio would be undefined, and metrics
//! that have no value on a given graph return `None` rather than a sentinel.

use petgraph::algo::{connected_components, dijkstra};
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;

pub const PAGERANK_DAMPING: f64 = 0.85;
pub const PAGERANK_MAX_ITERATIONS: usize = 100;
pub const PAGERANK_TOLERANCE: f64 = 1e-6;

/// Sorted, deduplicated neighbour indices of every node.
fn adjacency<N, E>(graph: &UnGraph<N, E>) -> Vec<Vec<usize>> {
    graph
        .node_indices()
        .map(|n| {
            let mut adjacent: Vec<usize> = graph.neighbors(n).map(NodeIndex::index).collect();
            adjacent.sort_unstable();
            adjacent.dedup();
            adjacent
        })
        .collect()
}

fn is_adjacent(adjacency: &[Vec<usize>], u: usize, v: usize) -> bool {
    adjacency[u].binary_search(&v).is_ok()
}

pub fn degrees<N, E>(graph: &UnGraph<N, E>) -> Vec<usize> {
    adjacency(graph).iter().map(Vec::len).collect()
}

/// Pearson correlation of the degrees at either end of each edge.
///
/// Every edge is counted in both orientations. Returns NaN when the correlation is
/// undefined (no edges, or all endpoint degrees equal).
pub fn degree_assortativity<N, E>(graph: &UnGraph<N, E>) -> f64 {
    let degrees = degrees(graph);
    let (mut sum, mut sum_sq, mut sum_prod, mut count) = (0.0, 0.0, 0.0, 0.0);
    for edge in graph.edge_references() {
        let a = degrees[edge.source().index()] as f64;
        let b = degrees[edge.target().index()] as f64;
        sum += a + b;
        sum_sq += a * a + b * b;
        sum_prod += 2.0 * a * b;
        count += 2.0;
    }
    if count == 0.0 {
        return f64::NAN;
    }
    let mean = sum / count;
    let variance = sum_sq / count - mean * mean;
    if variance.abs() < 1e-12 {
        return f64::NAN;
    }
    (sum_prod / count - mean * mean) / variance
}

/// Mean degree of each node's neighbours; zero for isolated nodes.
pub fn average_neighbor_degree<N, E>(graph: &UnGraph<N, E>) -> Vec<f64> {
    let neighbors = adjacency(graph);
    neighbors
        .iter()
        .map(|adjacent| {
            if adjacent.is_empty() {
                0.0
            } else {
                let total: usize = adjacent.iter().map(|&m| neighbors[m].len()).sum();
                total as f64 / adjacent.len() as f64
            }
        })
        .collect()
}

/// Size of the largest clique. Zero for the empty graph.
pub fn clique_number<N, E>(graph: &UnGraph<N, E>) -> usize {
    let neighbors = adjacency(graph);
    let candidates: Vec<usize> = (0..neighbors.len()).collect();
    let mut best = 0;
    expand_clique(0, candidates, Vec::new(), &neighbors, &mut best);
    best
}

// Bron–Kerbosch with pivoting, pruned by the best clique found so far.
fn expand_clique(
    size: usize,
    mut candidates: Vec<usize>,
    mut excluded: Vec<usize>,
    neighbors: &[Vec<usize>],
    best: &mut usize,
) {
    if candidates.is_empty() {
        if excluded.is_empty() {
            *best = (*best).max(size);
        }
        return;
    }
    if size + candidates.len() <= *best {
        return;
    }
    let pivot = candidates
        .iter()
        .chain(excluded.iter())
        .copied()
        .max_by_key(|&u| candidates.iter().filter(|&&v| is_adjacent(neighbors, u, v)).count())
        .unwrap_or(candidates[0]);
    let branches: Vec<usize> = candidates
        .iter()
        .copied()
        .filter(|&v| !is_adjacent(neighbors, pivot, v))
        .collect();
    for v in branches {
        let next_candidates = candidates
            .iter()
            .copied()
            .filter(|&u| is_adjacent(neighbors, v, u))
            .collect();
        let next_excluded = excluded
            .iter()
            .copied()
            .filter(|&u| is_adjacent(neighbors, v, u))
            .collect();
        expand_clique(size + 1, next_candidates, next_excluded, neighbors, best);
        candidates.retain(|&u| u != v);
        excluded.push(v);
    }
}

/// Mean local clustering coefficient; nodes with fewer than two neighbours count as zero.
pub fn average_clustering<N, E>(graph: &UnGraph<N, E>) -> f64 {
    let neighbors = adjacency(graph);
    if neighbors.is_empty() {
        return 0.0;
    }
    let total: f64 = neighbors
        .iter()
        .map(|adjacent| {
            let k = adjacent.len();
            if k < 2 {
                return 0.0;
            }
            let mut triangles = 0usize;
            for (i, &u) in adjacent.iter().enumerate() {
                for &w in &adjacent[i + 1..] {
                    if is_adjacent(&neighbors, u, w) {
                        triangles += 1;
                    }
                }
            }
            2.0 * triangles as f64 / (k * (k - 1)) as f64
        })
        .sum();
    total / neighbors.len() as f64
}

/// Greatest shortest-path distance from each node, or `None` unless the graph is
/// non-empty and connected.
pub fn eccentricities<N, E>(graph: &UnGraph<N, E>) -> Option<Vec<usize>> {
    if graph.node_count() == 0 || connected_components(graph) != 1 {
        return None;
    }
    Some(
        graph
            .node_indices()
            .map(|source| {
                dijkstra(graph, source, None, |_| 1usize)
                    .values()
                    .copied()
                    .max()
                    .unwrap_or(0)
            })
            .collect(),
    )
}

/// Mean inverse shortest-path distance over all ordered pairs of distinct nodes.
///
/// Unreachable pairs contribute zero. Graphs with fewer than two nodes have zero
/// efficiency.
pub fn global_efficiency<N, E>(graph: &UnGraph<N, E>) -> f64 {
    let n = graph.node_count();
    if n < 2 {
        return 0.0;
    }
    let total: f64 = graph
        .node_indices()
        .map(|source| {
            // Summed in node order so results do not depend on hash iteration order.
            let mut inverse = vec![0.0; n];
            for (target, d) in dijkstra(graph, source, None, |_| 1usize) {
                if target != source {
                    inverse[target.index()] = 1.0 / d as f64;
                }
            }
            inverse.iter().sum::<f64>()
        })
        .sum();
    total / (n * (n - 1)) as f64
}

/// Mean over nodes of the global efficiency of the subgraph induced by each node's
/// neighbours.
pub fn local_efficiency<N, E>(graph: &UnGraph<N, E>) -> f64 {
    let n = graph.node_count();
    if n == 0 {
        return 0.0;
    }
    let neighbors = adjacency(graph);
    let total: f64 = neighbors
        .iter()
        .map(|adjacent| {
            let induced = graph.filter_map(
                |node, _| adjacent.binary_search(&node.index()).is_ok().then_some(()),
                |_, _| Some(()),
            );
            global_efficiency(&induced)
        })
        .sum();
    total / n as f64
}

/// Power-iteration PageRank with uniform teleportation and uniform redistribution of
/// the mass held by isolated nodes.
///
/// Converges when the L1 change between iterations drops below `N * tolerance`.
/// Returns `None` if that does not happen within `max_iterations`, or for the empty
/// graph.
pub fn pagerank<N, E>(
    graph: &UnGraph<N, E>,
    damping: f64,
    max_iterations: usize,
    tolerance: f64,
) -> Option<Vec<f64>> {
    let n = graph.node_count();
    if n == 0 {
        return None;
    }
    let neighbors = adjacency(graph);
    let uniform = 1.0 / n as f64;
    let mut rank = vec![uniform; n];

    for _ in 0..max_iterations {
        let dangling: f64 = neighbors
            .iter()
            .zip(&rank)
            .filter(|(adjacent, _)| adjacent.is_empty())
            .map(|(_, r)| r)
            .sum();
        let mut next = vec![damping * dangling * uniform + (1.0 - damping) * uniform; n];
        for (i, adjacent) in neighbors.iter().enumerate() {
            if adjacent.is_empty() {
                continue;
            }
            let share = damping * rank[i] / adjacent.len() as f64;
            for &j in adjacent {
                next[j] += share;
            }
        }
        let change: f64 = next.iter().zip(&rank).map(|(a, b)| (a - b).abs()).sum();
        rank = next;
        if change < n as f64 * tolerance {
            let total: f64 = rank.iter().sum();
            return Some(rank.into_iter().map(|r| r / total).collect());
        }
    }
    None
}

/// Adamic–Adar index of every unordered pair of distinct, non-adjacent nodes.
///
/// Each common neighbour `w` contributes `1 / ln(deg(w))`. Pairs are visited in
/// increasing index order.
pub fn adamic_adar<N, E>(graph: &UnGraph<N, E>) -> Vec<f64> {
    let neighbors = adjacency(graph);
    let n = neighbors.len();
    let mut scores = Vec::new();
    for u in 0..n {
        for v in (u + 1)..n {
            if is_adjacent(&neighbors, u, v) {
                continue;
            }
            let score: f64 = neighbors[u]
                .iter()
                .filter(|&&w| is_adjacent(&neighbors, v, w))
                .map(|&w| 1.0 / (neighbors[w].len() as f64).ln())
                .sum();
            scores.push(score);
        }
    }
    scores
}

/// Sum over edges of the product of endpoint degrees.
pub fn s_metric<N, E>(graph: &UnGraph<N, E>) -> f64 {
    let degrees = degrees(graph);
    graph
        .edge_references()
        .map(|e| (degrees[e.source().index()] * degrees[e.target().index()]) as f64)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(n: usize, edges: &[(u32, u32)]) -> UnGraph<(), ()> {
        let mut g = UnGraph::with_capacity(n, edges.len());
        for _ in 0..n {
            g.add_node(());
        }
        g.extend_with_edges(edges.iter().copied());
        g
    }

    fn triangle() -> UnGraph<(), ()> {
        graph(3, &[(0, 1), (1, 2), (0, 2)])
    }

    fn path4() -> UnGraph<(), ()> {
        graph(4, &[(0, 1), (1, 2), (2, 3)])
    }

    fn star4() -> UnGraph<(), ()> {
        graph(4, &[(0, 1), (0, 2), (0, 3)])
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn assortativity_of_star_is_minus_one() {
        assert!(close(degree_assortativity(&star4()), -1.0));
    }

    #[test]
    fn assortativity_of_path_matches_closed_form() {
        // Degrees 1-2, 2-2, 2-1: r = -1/2.
        assert!(close(degree_assortativity(&path4()), -0.5));
    }

    #[test]
    fn assortativity_of_regular_graph_is_undefined() {
        assert!(degree_assortativity(&triangle()).is_nan());
        assert!(degree_assortativity(&graph(3, &[])).is_nan());
    }

    #[test]
    fn neighbor_degree_of_star() {
        let values = average_neighbor_degree(&star4());
        assert_eq!(values, vec![1.0, 3.0, 3.0, 3.0]);
        assert_eq!(average_neighbor_degree(&graph(1, &[])), vec![0.0]);
    }

    #[test]
    fn clique_numbers() {
        assert_eq!(clique_number(&triangle()), 3);
        assert_eq!(clique_number(&path4()), 2);
        assert_eq!(clique_number(&graph(3, &[])), 1);
        assert_eq!(clique_number(&graph(0, &[])), 0);
        let k4_plus_tail = graph(5, &[(0, 1), (0, 2), (0, 3), (1, 2), (1, 3), (2, 3), (3, 4)]);
        assert_eq!(clique_number(&k4_plus_tail), 4);
    }

    #[test]
    fn clustering_of_triangle_and_star() {
        assert!(close(average_clustering(&triangle()), 1.0));
        assert!(close(average_clustering(&star4()), 0.0));
        let paw = graph(4, &[(0, 1), (1, 2), (0, 2), (2, 3)]);
        // Nodes 0 and 1: 1, node 2: 1/3, node 3: 0.
        assert!(close(average_clustering(&paw), (2.0 + 1.0 / 3.0) / 4.0));
    }

    #[test]
    fn eccentricities_give_diameter_and_radius() {
        let ecc = eccentricities(&path4()).unwrap();
        assert_eq!(ecc, vec![3, 2, 2, 3]);
        let ecc = eccentricities(&star4()).unwrap();
        assert_eq!(ecc.iter().max(), Some(&2));
        assert_eq!(ecc.iter().min(), Some(&1));
    }

    #[test]
    fn eccentricities_undefined_for_disconnected_graphs() {
        assert_eq!(eccentricities(&graph(3, &[(0, 1)])), None);
        assert_eq!(eccentricities(&graph(0, &[])), None);
    }

    #[test]
    fn global_efficiency_values() {
        assert!(close(global_efficiency(&triangle()), 1.0));
        // Path: pairs at distance 1 (x3), 2 (x2), 3 (x1), both directions.
        let expected = 2.0 * (3.0 + 2.0 / 2.0 + 1.0 / 3.0) / 12.0;
        assert!(close(global_efficiency(&path4()), expected));
        assert!(close(global_efficiency(&graph(2, &[])), 0.0));
    }

    #[test]
    fn local_efficiency_values() {
        assert!(close(local_efficiency(&triangle()), 1.0));
        assert!(close(local_efficiency(&star4()), 0.0));
    }

    #[test]
    fn pagerank_is_uniform_on_symmetric_graphs() {
        let ranks = pagerank(&triangle(), PAGERANK_DAMPING, PAGERANK_MAX_ITERATIONS, PAGERANK_TOLERANCE).unwrap();
        for r in ranks {
            assert!(close(r, 1.0 / 3.0));
        }
    }

    #[test]
    fn pagerank_favours_the_hub_and_sums_to_one() {
        let ranks = pagerank(&star4(), PAGERANK_DAMPING, PAGERANK_MAX_ITERATIONS, PAGERANK_TOLERANCE).unwrap();
        assert!((ranks.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!(ranks[0] > ranks[1]);
        assert!((ranks[1] - ranks[3]).abs() < 1e-12);
        // Hub of a three-leaf star: (1 + 3d) / (4 (1 + d)).
        let d = PAGERANK_DAMPING;
        let hub = (1.0 + 3.0 * d) / (4.0 * (1.0 + d));
        assert!((ranks[0] - hub).abs() < 1e-4);
    }

    #[test]
    fn pagerank_handles_isolated_nodes() {
        let ranks = pagerank(&graph(3, &[(0, 1)]), PAGERANK_DAMPING, PAGERANK_MAX_ITERATIONS, PAGERANK_TOLERANCE).unwrap();
        assert!((ranks.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!(close(ranks[0], ranks[1]));
        assert!(ranks[2] < ranks[0]);
    }

    #[test]
    fn pagerank_reports_non_convergence() {
        assert_eq!(pagerank(&star4(), PAGERANK_DAMPING, 1, 1e-12), None);
        assert_eq!(pagerank(&graph(0, &[]), PAGERANK_DAMPING, 10, 1e-6), None);
    }

    #[test]
    fn adamic_adar_scores_non_edges() {
        // Star: leaves share only the hub (degree 3).
        let scores = adamic_adar(&star4());
        assert_eq!(scores.len(), 3);
        for s in scores {
            assert!(close(s, 1.0 / 3f64.ln()));
        }
        // Path: pairs (0,2), (0,3), (1,3); only the first and last share a neighbour.
        let scores = adamic_adar(&path4());
        assert_eq!(scores.len(), 3);
        assert!(close(scores[0], 1.0 / 2f64.ln()));
        assert!(close(scores[1], 0.0));
        assert!(close(scores[2], 1.0 / 2f64.ln()));
        assert!(adamic_adar(&triangle()).is_empty());
    }

    #[test]
    fn s_metric_sums_degree_products() {
        assert!(close(s_metric(&star4()), 9.0));
        assert!(close(s_metric(&path4()), 2.0 + 4.0 + 2.0));
    }
}
