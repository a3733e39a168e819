use super::model::{ModelError, TabularModel, read_weights};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct EnsembleDocument {
    #[serde(default)]
    base_score: f64,
    trees: Vec<TreeDocument>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct TreeDocument {
    nodes: Vec<NodeDocument>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NodeDocument {
    Split {
        feature: String,
        threshold: f64,
        left: usize,
        right: usize,
        #[serde(default)]
        default_left: bool,
    },
    Leaf {
        leaf: f64,
    },
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
        default_left: bool,
    },
    Leaf(f64),
}

/// An additive ensemble of binary regression trees.
///
/// A row descends left when `value < threshold`, right otherwise; NaN values follow
/// the split's `default_left` flag. The prediction is the base score plus the sum of
/// the reached leaves.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeEnsemble {
    base_score: f64,
    feature_names: Vec<String>,
    trees: Vec<Vec<Node>>,
}

impl TreeEnsemble {
    /// Parses and validates the JSON weights layout.
    ///
    /// Children must point forward within their tree, which rules out cycles and
    /// dangling references.
    pub fn from_json_str(content: &str, origin: &str) -> Result<Self, ModelError> {
        let document: EnsembleDocument =
            serde_json::from_str(content).map_err(|source| ModelError::Json {
                path: origin.to_string(),
                source,
            })?;

        let mut feature_names: Vec<String> = Vec::new();
        let mut feature_index: HashMap<String, usize> = HashMap::new();
        let mut trees = Vec::with_capacity(document.trees.len());

        for (tree, tree_doc) in document.trees.into_iter().enumerate() {
            if tree_doc.nodes.is_empty() {
                return Err(ModelError::InvalidTree {
                    tree,
                    node: 0,
                    reason: "tree has no nodes".into(),
                });
            }
            let count = tree_doc.nodes.len();
            let mut nodes = Vec::with_capacity(count);
            for (node, node_doc) in tree_doc.nodes.into_iter().enumerate() {
                nodes.push(match node_doc {
                    NodeDocument::Leaf { leaf } => Node::Leaf(leaf),
                    NodeDocument::Split {
                        feature,
                        threshold,
                        left,
                        right,
                        default_left,
                    } => {
                        for child in [left, right] {
                            if child <= node || child >= count {
                                return Err(ModelError::InvalidTree {
                                    tree,
                                    node,
                                    reason: format!(
                                        "child index {child} must lie in {}..{count}",
                                        node + 1
                                    ),
                                });
                            }
                        }
                        let next = feature_names.len();
                        let feature = *feature_index.entry(feature.clone()).or_insert_with(|| {
                            feature_names.push(feature);
                            next
                        });
                        Node::Split {
                            feature,
                            threshold,
                            left,
                            right,
                            default_left,
                        }
                    }
                });
            }
            trees.push(nodes);
        }

        Ok(Self {
            base_score: document.base_score,
            feature_names,
            trees,
        })
    }

    pub fn load(path: &Path) -> Result<Self, ModelError> {
        Self::from_json_str(&read_weights(path)?, &path.to_string_lossy())
    }

    pub fn num_trees(&self) -> usize {
        self.trees.len()
    }

    fn leaf_value(nodes: &[Node], features: &[f64]) -> f64 {
        let mut index = 0;
        loop {
            match nodes[index] {
                Node::Leaf(value) => return value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    default_left,
                } => {
                    let value = features.get(feature).copied().unwrap_or(f64::NAN);
                    let go_left = if value.is_nan() {
                        default_left
                    } else {
                        value < threshold
                    };
                    index = if go_left { left } else { right };
                }
            }
        }
    }
}

impl TabularModel for TreeEnsemble {
    fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    fn score(&self, features: &[f64]) -> f64 {
        self.base_score
            + self
                .trees
                .iter()
                .map(|nodes| Self::leaf_value(nodes, features))
                .sum::<f64>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STUMPS: &str = r#"{
        "base_score": 0.5,
        "trees": [
            {"nodes": [
                {"feature": "density", "threshold": 4.0, "left": 1, "right": 2, "default_left": true},
                {"leaf": -0.25},
                {"leaf": 0.75}
            ]},
            {"nodes": [
                {"feature": "num_sites", "threshold": 190.0, "left": 1, "right": 2},
                {"leaf": 0.1},
                {"feature": "density", "threshold": 5.0, "left": 3, "right": 4},
                {"leaf": 0.2},
                {"leaf": 0.3}
            ]}
        ]
    }"#;

    fn ensemble() -> TreeEnsemble {
        TreeEnsemble::from_json_str(STUMPS, "inline").unwrap()
    }

    #[test]
    fn collects_feature_names_in_first_use_order() {
        let model = ensemble();
        assert_eq!(model.feature_names(), ["density", "num_sites"]);
        assert_eq!(model.num_trees(), 2);
    }

    #[test]
    fn routes_rows_by_threshold() {
        let model = ensemble();
        // density < 4 goes left; num_sites < 190 goes left.
        assert!((model.score(&[3.0, 100.0]) - (0.5 - 0.25 + 0.1)).abs() < 1e-12);
        // Equal to the threshold goes right.
        assert!((model.score(&[4.0, 190.0]) - (0.5 + 0.75 + 0.2)).abs() < 1e-12);
        assert!((model.score(&[6.0, 192.0]) - (0.5 + 0.75 + 0.3)).abs() < 1e-12);
    }

    #[test]
    fn nan_follows_default_direction() {
        let model = ensemble();
        // First split defaults left, the others default right.
        assert!((model.score(&[f64::NAN, f64::NAN]) - (0.5 - 0.25 + 0.3)).abs() < 1e-12);
    }

    #[test]
    fn rejects_backward_and_out_of_range_children() {
        let backward = r#"{"trees": [{"nodes": [
            {"feature": "x", "threshold": 0.0, "left": 0, "right": 1},
            {"leaf": 1.0}
        ]}]}"#;
        assert!(matches!(
            TreeEnsemble::from_json_str(backward, "inline"),
            Err(ModelError::InvalidTree { tree: 0, node: 0, .. })
        ));

        let dangling = r#"{"trees": [
            {"nodes": [{"leaf": 1.0}]},
            {"nodes": [{"feature": "x", "threshold": 0.0, "left": 1, "right": 5}, {"leaf": 1.0}]}
        ]}"#;
        assert!(matches!(
            TreeEnsemble::from_json_str(dangling, "inline"),
            Err(ModelError::InvalidTree { tree: 1, node: 0, .. })
        ));
    }

    #[test]
    fn rejects_empty_trees_and_unknown_node_shapes() {
        assert!(matches!(
            TreeEnsemble::from_json_str(r#"{"trees": [{"nodes": []}]}"#, "inline"),
            Err(ModelError::InvalidTree { .. })
        ));
        assert!(matches!(
            TreeEnsemble::from_json_str(r#"{"trees": [{"nodes": [{"value": 1.0}]}]}"#, "inline"),
            Err(ModelError::Json { .. })
        ));
    }

    #[test]
    fn empty_ensemble_predicts_base_score() {
        let model = TreeEnsemble::from_json_str(r#"{"base_score": 1.25, "trees": []}"#, "inline").unwrap();
        assert_eq!(model.score(&[]), 1.25);
    }
}
