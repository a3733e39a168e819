use super::formula_stats::FormulaStatistics;
use super::graph::bond_graph;
use super::graph_metrics::{
    PAGERANK_DAMPING, PAGERANK_MAX_ITERATIONS, PAGERANK_TOLERANCE, adamic_adar,
    average_clustering, average_neighbor_degree, clique_number, degree_assortativity,
    eccentricities, global_efficiency, local_efficiency, pagerank, s_metric,
};
use super::stats::Summary;
use super::table::FeatureRow;
use crate::core::models::element::Element;
use crate::core::models::structure::Structure;
use petgraph::algo::connected_components;
use thiserror::Error;

pub const DEFAULT_BOND_CUTOFF: f64 = 2.9;

#[derive(Debug, Error, PartialEq)]
pub enum FeatureError {
    #[error("Structure contains no atoms")]
    EmptyStructure,
    #[error("Coordination graph is split into {components} components; diameter and radius are undefined")]
    Disconnected { components: usize },
    #[error("Every pair of atoms is bonded; Adamic-Adar statistics are undefined")]
    NoNonAdjacentPairs,
    #[error("PageRank did not converge within {iterations} iterations")]
    PageRankNotConverged { iterations: usize },
}

const STRUCTURE_COLUMNS: [&str; 13] = [
    "atomic_numbers_min",
    "atomic_numbers_mean",
    "atomic_numbers_max",
    "num_sites",
    "density",
    "distance_max",
    "distance_mean",
    "distance_min",
    "num_edges",
    "degree_assortativity_coefficient",
    "neighbor_degree_min",
    "neighbor_degree_mean",
    "neighbor_degree_max",
];

const GRAPH_COLUMNS: [&str; 12] = [
    "graph_clique_number",
    "average_clustering",
    "diameter",
    "radius",
    "global_efficiency",
    "local_efficiency",
    "pagerank_min",
    "pagerank_mean",
    "pagerank_max",
    "adamic_adar_max",
    "adamic_adar_mean",
    "s_metric",
];

const FORMULA_COLUMNS: [&str; 3] = [
    "min_formula_band_gap",
    "max_formula_band_gap",
    "mean_formula_band_gap",
];

/// Computes one flat row of structural and coordination-graph descriptors per structure.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureExtractor {
    bond_cutoff: f64,
    elements: Vec<Element>,
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new(
            DEFAULT_BOND_CUTOFF,
            vec![
                Element::MOLYBDENUM,
                Element::SULFUR,
                Element::SELENIUM,
                Element::TUNGSTEN,
            ],
        )
    }
}

impl FeatureExtractor {
    /// `elements` selects the per-element neighbour-degree columns, in order.
    pub fn new(bond_cutoff: f64, elements: Vec<Element>) -> Self {
        Self {
            bond_cutoff,
            elements,
        }
    }

    pub fn bond_cutoff(&self) -> f64 {
        self.bond_cutoff
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// Feature column names, in the order [`extract`](Self::extract) emits values.
    pub fn column_names(&self) -> Vec<String> {
        let mut columns: Vec<String> = STRUCTURE_COLUMNS.iter().map(|c| c.to_string()).collect();
        for element in &self.elements {
            for stat in ["min", "mean", "max"] {
                columns.push(format!("neighbor_degree_{stat}_{element}"));
            }
        }
        columns.extend(GRAPH_COLUMNS.iter().map(|c| c.to_string()));
        columns.extend(FORMULA_COLUMNS.iter().map(|c| c.to_string()));
        columns
    }

    /// Computes the feature row of one structure.
    ///
    /// # Errors
    ///
    /// Fails for empty structures, disconnected coordination graphs, fully connected
    /// graphs and PageRank runs that do not converge.
    pub fn extract(
        &self,
        id: &str,
        structure: &Structure,
        stats: &FormulaStatistics,
    ) -> Result<FeatureRow, FeatureError> {
        let atomic_numbers =
            Summary::of(structure.atomic_numbers().into_iter().map(f64::from))
                .ok_or(FeatureError::EmptyStructure)?;

        let distances = structure.distance_matrix();
        let distance_max = distances.max();
        let n = structure.num_sites();
        let distance_min = (0..n)
            .flat_map(|i| (0..n).filter(move |&j| j != i).map(move |j| (i, j)))
            .map(|(i, j)| distances[(i, j)])
            .fold(None, |min: Option<f64>, d| Some(min.map_or(d, |m| m.min(d))))
            .unwrap_or(distance_max);

        let graph = bond_graph(structure, &distances, self.bond_cutoff);
        let neighbor_degree = average_neighbor_degree(&graph);
        let neighbor_summary = Summary::of(neighbor_degree.iter().copied())
            .ok_or(FeatureError::EmptyStructure)?;

        let eccentricity = eccentricities(&graph).ok_or_else(|| FeatureError::Disconnected {
            components: connected_components(&graph),
        })?;
        let ranks = pagerank(
            &graph,
            PAGERANK_DAMPING,
            PAGERANK_MAX_ITERATIONS,
            PAGERANK_TOLERANCE,
        )
        .ok_or(FeatureError::PageRankNotConverged {
            iterations: PAGERANK_MAX_ITERATIONS,
        })?;
        let rank_summary = Summary::of(ranks).ok_or(FeatureError::EmptyStructure)?;
        let adamic = Summary::of(adamic_adar(&graph)).ok_or(FeatureError::NoNonAdjacentPairs)?;

        let formula = structure.formula();
        let band_gap = stats.get(&formula);

        let mut values = vec![
            atomic_numbers.min,
            atomic_numbers.mean,
            atomic_numbers.max,
            n as f64,
            structure.density(),
            distance_max,
            distances.mean(),
            distance_min,
            graph.edge_count() as f64,
            degree_assortativity(&graph),
            neighbor_summary.min,
            neighbor_summary.mean,
            neighbor_summary.max,
        ];
        for element in &self.elements {
            let per_element = Summary::of(
                graph
                    .node_indices()
                    .filter(|&node| graph[node] == *element)
                    .map(|node| neighbor_degree[node.index()]),
            )
            .unwrap_or(Summary::ZERO);
            values.extend([per_element.min, per_element.mean, per_element.max]);
        }
        values.extend([
            clique_number(&graph) as f64,
            average_clustering(&graph),
            eccentricity.iter().copied().max().unwrap_or(0) as f64,
            eccentricity.iter().copied().min().unwrap_or(0) as f64,
            global_efficiency(&graph),
            local_efficiency(&graph),
            rank_summary.min,
            rank_summary.mean,
            rank_summary.max,
            adamic.max,
            adamic.mean,
            s_metric(&graph),
            band_gap.min,
            band_gap.max,
            band_gap.mean,
        ]);

        Ok(FeatureRow {
            id: id.to_string(),
            formula,
            values,
        })
    }
}
