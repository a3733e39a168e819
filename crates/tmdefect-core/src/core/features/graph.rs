use crate::core::models::element::Element;
use crate::core::models::structure::Structure;
use nalgebra::DMatrix;
use petgraph::graph::UnGraph;

/// Coordination graph of a structure: one node per atom, one edge per bonded pair.
///
/// Edge weights hold the minimum-image bond length in Angstroms.
pub type BondGraph = UnGraph<Element, f64>;

/// Connects every pair of atoms whose minimum-image distance is within `cutoff`.
///
/// `distances` must be the structure's distance matrix. Node indices follow atom order.
pub fn bond_graph(structure: &Structure, distances: &DMatrix<f64>, cutoff: f64) -> BondGraph {
    let n = structure.num_sites();
    let mut graph = BondGraph::with_capacity(n, n * 4);
    let nodes: Vec<_> = structure
        .atoms()
        .iter()
        .map(|atom| graph.add_node(atom.element))
        .collect();
    for i in 0..n {
        for j in (i + 1)..n {
            let d = distances[(i, j)];
            if d <= cutoff {
                graph.add_edge(nodes[i], nodes[j], d);
            }
        }
    }
    graph
}
