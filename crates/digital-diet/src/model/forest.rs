//! Native random-forest backend.
//!
//! Trees are stored the way scikit-learn keeps them in `tree_`: parallel
//! arrays indexed by node id, nodes in pre-order, `children_left == -1` on
//! leaves. Exporting a fitted `RandomForestClassifier` is a matter of dumping
//! `children_left`, `children_right`, `feature`, `threshold` and
//! `value[:, 0, :]` for every estimator, plus `feature_names_in_`.

use std::{fs, path::Path};

use digital_diet_features::{FEATURE_COUNT, FEATURE_NAMES, FeatureVector};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Classifier, InferenceError, LoadError};
use crate::pipeline::{RiskLevel, RiskProbabilities};

const LEAF: i64 = -1;

/// On-disk forest, as written by the export script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestDocument {
    pub feature_names: Vec<String>,
    pub n_classes: usize,
    pub trees: Vec<FlatTree>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatTree {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    /// Per-node class weights (counts or fractions), one entry per class.
    pub value: Vec<Vec<f64>>,
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    /// Normalized `[P(low), P(at-risk)]` of the training samples in the leaf.
    Leaf([f64; 2]),
}

#[derive(Debug, Clone, PartialEq)]
struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    fn from_flat(tree: &FlatTree, tree_idx: usize) -> Result<Self, LoadError> {
        let n_nodes = tree.children_left.len();
        if n_nodes == 0 {
            return Err(schema(tree_idx, "tree has no nodes".to_string()));
        }
        if tree.children_right.len() != n_nodes
            || tree.feature.len() != n_nodes
            || tree.threshold.len() != n_nodes
            || tree.value.len() != n_nodes
        {
            return Err(schema(tree_idx, "node arrays differ in length".to_string()));
        }

        let nodes = (0..n_nodes)
            .map(|node| {
                if tree.children_left[node] == LEAF {
                    return leaf_distribution(&tree.value[node])
                        .map(Node::Leaf)
                        .ok_or_else(|| {
                            schema(tree_idx, format!("leaf {node} has no usable class weights"))
                        });
                }
                // Pre-order layout: children always come after their parent.
                let child = |raw: i64| {
                    usize::try_from(raw)
                        .ok()
                        .filter(|&child| child > node && child < n_nodes)
                        .ok_or_else(|| schema(tree_idx, format!("node {node} has bad child {raw}")))
                };
                let feature = usize::try_from(tree.feature[node])
                    .ok()
                    .filter(|&feature| feature < FEATURE_COUNT)
                    .ok_or_else(|| {
                        schema(
                            tree_idx,
                            format!("node {node} splits on feature {}", tree.feature[node]),
                        )
                    })?;
                Ok(Node::Split {
                    feature,
                    threshold: tree.threshold[node],
                    left: child(tree.children_left[node])?,
                    right: child(tree.children_right[node])?,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { nodes })
    }

    fn leaf_for(&self, row: &[f32; FEATURE_COUNT]) -> [f64; 2] {
        let mut node = 0;
        loop {
            match &self.nodes[node] {
                Node::Leaf(distribution) => return *distribution,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if f64::from(row[*feature]) <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }
}

fn schema(tree_idx: usize, reason: String) -> LoadError {
    LoadError::Schema(format!("tree {tree_idx}: {reason}"))
}

fn leaf_distribution(weights: &[f64]) -> Option<[f64; 2]> {
    let [low, high] = <[f64; 2]>::try_from(weights).ok()?;
    let total = low + high;
    (low >= 0.0 && high >= 0.0 && total > 0.0).then(|| [low / total, high / total])
}

/// Random forest evaluated in-process: soft voting over trees.
#[derive(Debug, Clone, PartialEq)]
pub struct ForestClassifier {
    trees: Vec<Tree>,
}

impl ForestClassifier {
    /// Validates `document` against the feature schema and builds the forest.
    pub fn from_document(document: &ForestDocument) -> Result<Self, LoadError> {
        if document.feature_names.iter().map(String::as_str).ne(FEATURE_NAMES) {
            return Err(LoadError::Schema(format!(
                "model expects columns {:?}, form provides {:?}",
                document.feature_names, FEATURE_NAMES
            )));
        }
        if document.n_classes != 2 {
            return Err(LoadError::Schema(format!(
                "model has {} classes, expected 2",
                document.n_classes
            )));
        }
        if document.trees.is_empty() {
            return Err(LoadError::Schema("forest has no trees".to_string()));
        }

        let trees = document
            .trees
            .iter()
            .enumerate()
            .map(|(idx, tree)| Tree::from_flat(tree, idx))
            .collect::<Result<Vec<_>, _>>()?;
        debug!(n_trees = trees.len(), "Random forest built");
        Ok(Self { trees })
    }

    pub fn from_json_file(path: &Path) -> Result<Self, LoadError> {
        let bytes = read(path)?;
        let document: ForestDocument =
            serde_json::from_slice(&bytes).map_err(|err| LoadError::Decode {
                path: path.to_path_buf(),
                reason: err.to_string(),
            })?;
        Self::from_document(&document)
    }

    pub fn from_bincode_file(path: &Path) -> Result<Self, LoadError> {
        let bytes = read(path)?;
        let (document, _): (ForestDocument, usize) =
            bincode::serde::decode_from_slice(&bytes, bincode::config::standard()).map_err(
                |err| LoadError::Decode {
                    path: path.to_path_buf(),
                    reason: err.to_string(),
                },
            )?;
        Self::from_document(&document)
    }

    /// Mean of the reached leaves' class distributions.
    fn soft_vote(&self, features: &FeatureVector) -> [f64; 2] {
        let row = features.to_row();
        let [low, high] = self.trees.iter().fold([0.0, 0.0], |acc, tree| {
            let [l, h] = tree.leaf_for(&row);
            [acc[0] + l, acc[1] + h]
        });
        #[allow(clippy::cast_precision_loss)]
        let n_trees = self.trees.len() as f64;
        [low / n_trees, high / n_trees]
    }
}

fn read(path: &Path) -> Result<Vec<u8>, LoadError> {
    fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

impl Classifier for ForestClassifier {
    fn predict(&self, features: &FeatureVector) -> Result<RiskLevel, InferenceError> {
        let [low, high] = self.soft_vote(features);
        // argmax, ties to the first class
        RiskLevel::try_from(i64::from(high > low))
    }

    fn predict_probability(
        &self,
        features: &FeatureVector,
    ) -> Result<RiskProbabilities, InferenceError> {
        RiskProbabilities::try_from(self.soft_vote(features))
    }
}

#[cfg(test)]
mod tests {
    use digital_diet_features::{FormAnswers, Gender};

    use super::*;

    fn names() -> Vec<String> {
        FEATURE_NAMES.iter().map(ToString::to_string).collect()
    }

    /// Splits on `feature <= threshold`; left leaf `left`, right leaf `right`.
    fn stump(feature: i64, threshold: f64, left: [f64; 2], right: [f64; 2]) -> FlatTree {
        FlatTree {
            children_left: vec![1, LEAF, LEAF],
            children_right: vec![2, LEAF, LEAF],
            feature: vec![feature, -2, -2],
            threshold: vec![threshold, -2.0, -2.0],
            value: vec![vec![0.0, 0.0], left.to_vec(), right.to_vec()],
        }
    }

    fn document(trees: Vec<FlatTree>) -> ForestDocument {
        ForestDocument {
            feature_names: names(),
            n_classes: 2,
            trees,
        }
    }

    #[test]
    fn test_single_stump_follows_threshold() {
        // stress_level <= 6.5 → low risk
        let forest = ForestClassifier::from_document(&document(vec![stump(
            5,
            6.5,
            [9.0, 1.0],
            [2.0, 8.0],
        )]))
        .expect("valid forest");

        let calm = FormAnswers::default().with_stress(3.0).to_features();
        let stressed = FormAnswers::default().with_stress(9.0).to_features();

        assert_eq!(forest.predict(&calm).expect("predict"), RiskLevel::Low);
        assert_eq!(forest.predict(&stressed).expect("predict"), RiskLevel::AtRisk);

        let probs = forest.predict_probability(&stressed).expect("probabilities");
        assert!((probs.at_risk() - 0.8).abs() < 1e-6);
        assert!((probs.low_risk() - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_threshold_is_inclusive_on_the_left() {
        let forest = ForestClassifier::from_document(&document(vec![stump(
            5,
            5.0,
            [1.0, 0.0],
            [0.0, 1.0],
        )]))
        .expect("valid forest");
        let on_threshold = FormAnswers::default().with_stress(5.0).to_features();
        assert_eq!(forest.predict(&on_threshold).expect("predict"), RiskLevel::Low);
    }

    #[test]
    fn test_probabilities_average_over_trees() {
        let forest = ForestClassifier::from_document(&document(vec![
            stump(5, 6.5, [1.0, 0.0], [0.0, 1.0]),
            // gender_Female <= 0.5 → male side
            stump(7, 0.5, [3.0, 1.0], [1.0, 1.0]),
        ]))
        .expect("valid forest");

        let features = FormAnswers::default()
            .with_stress(8.0)
            .with_gender(Gender::Female)
            .to_features();
        let probs = forest.predict_probability(&features).expect("probabilities");
        // tree 0: [0, 1], tree 1: [0.5, 0.5]
        assert!((probs.low_risk() - 0.25).abs() < 1e-6);
        assert!((probs.at_risk() - 0.75).abs() < 1e-6);
        assert_eq!(forest.predict(&features).expect("predict"), RiskLevel::AtRisk);
    }

    fn single_leaf(weights: [f64; 2]) -> FlatTree {
        FlatTree {
            children_left: vec![LEAF],
            children_right: vec![LEAF],
            feature: vec![-2],
            threshold: vec![-2.0],
            value: vec![weights.to_vec()],
        }
    }

    #[test]
    fn test_leaf_fractions_keep_double_precision() {
        let doc = document(vec![single_leaf([7345.0, 2655.0])]);
        let forest = ForestClassifier::from_document(&doc).expect("valid forest");
        let probs = forest
            .predict_probability(&FormAnswers::default().to_features())
            .expect("probabilities");
        assert_eq!(probs.low_risk().to_bits(), 0.7345_f64.to_bits());
        assert_eq!(probs.low_risk_line(), "Low Risk: 73.5%");
        assert_eq!(probs.high_risk_line(), "High Risk: 26.6%");
    }

    #[test]
    fn test_even_split_predicts_low_risk() {
        let forest = ForestClassifier::from_document(&document(vec![stump(
            0,
            100.0,
            [1.0, 1.0],
            [1.0, 1.0],
        )]))
        .expect("valid forest");
        let features = FormAnswers::default().to_features();
        assert_eq!(forest.predict(&features).expect("predict"), RiskLevel::Low);
    }

    #[test]
    fn test_rejects_reordered_columns() {
        let mut doc = document(vec![stump(0, 1.0, [1.0, 0.0], [0.0, 1.0])]);
        doc.feature_names.swap(7, 8);
        let err = ForestClassifier::from_document(&doc).expect_err("schema mismatch");
        assert!(matches!(err, LoadError::Schema(_)));
    }

    #[test]
    fn test_rejects_missing_column() {
        let mut doc = document(vec![stump(0, 1.0, [1.0, 0.0], [0.0, 1.0])]);
        doc.feature_names.pop();
        assert!(ForestClassifier::from_document(&doc).is_err());
    }

    #[test]
    fn test_rejects_multiclass_and_empty_forest() {
        let mut doc = document(vec![stump(0, 1.0, [1.0, 0.0], [0.0, 1.0])]);
        doc.n_classes = 3;
        assert!(ForestClassifier::from_document(&doc).is_err());
        assert!(ForestClassifier::from_document(&document(Vec::new())).is_err());
    }

    #[test]
    fn test_rejects_malformed_trees() {
        let mut out_of_range_feature = stump(11, 1.0, [1.0, 0.0], [0.0, 1.0]);
        let forest = document(vec![out_of_range_feature.clone()]);
        assert!(ForestClassifier::from_document(&forest).is_err());

        out_of_range_feature.feature[0] = 0;
        out_of_range_feature.children_right[0] = 0;
        let err = ForestClassifier::from_document(&document(vec![out_of_range_feature]))
            .expect_err("self-loop must be rejected");
        assert!(err.to_string().contains("bad child"));

        let mut short_arrays = stump(0, 1.0, [1.0, 0.0], [0.0, 1.0]);
        short_arrays.threshold.pop();
        assert!(ForestClassifier::from_document(&document(vec![short_arrays])).is_err());

        let empty_leaf = stump(0, 1.0, [0.0, 0.0], [0.0, 1.0]);
        assert!(ForestClassifier::from_document(&document(vec![empty_leaf])).is_err());
    }

    #[test]
    fn test_json_and_bincode_files_load_the_same_forest() {
        let doc = document(vec![stump(5, 6.5, [9.0, 1.0], [2.0, 8.0])]);
        let dir = tempfile::tempdir().expect("temp dir");

        let json_path = dir.path().join("forest.json");
        fs::write(&json_path, serde_json::to_vec(&doc).expect("json")).expect("write json");

        let bin_path = dir.path().join("forest.bin");
        let bytes =
            bincode::serde::encode_to_vec(&doc, bincode::config::standard()).expect("bincode");
        fs::write(&bin_path, bytes).expect("write bincode");

        let from_json = ForestClassifier::from_json_file(&json_path).expect("json forest");
        let from_bin = ForestClassifier::from_bincode_file(&bin_path).expect("bincode forest");
        assert_eq!(from_json, from_bin);
    }

    #[test]
    fn test_garbage_json_is_a_decode_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("forest.json");
        fs::write(&path, b"not a forest").expect("write");
        let err = ForestClassifier::from_json_file(&path).expect_err("garbage");
        assert!(matches!(err, LoadError::Decode { .. }));
    }
}
