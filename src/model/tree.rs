use ndarray::ArrayView1;
use rayon::prelude::*;

use super::binning::BinnedMatrix;
use super::params::BoostingParams;

/// Nodes at or above this size search features in parallel.
const PARALLEL_ROW_THRESHOLD: usize = 2048;

/// A regression tree node. Children are indices into [`Tree::nodes`].
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Internal node: rows with `x[feature] < threshold` go left.
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
        /// Loss reduction achieved by this split.
        gain: f64,
    },
    /// Terminal node carrying the (already shrunk) leaf weight.
    Leaf { value: f64 },
}

/// A single fitted regression tree; node 0 is the root.
#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Routes one feature row to a leaf and returns its value.
    pub fn predict_row(&self, row: ArrayView1<'_, f64>) -> f64 {
        let mut idx = 0;
        loop {
            match self.nodes[idx] {
                Node::Leaf { value } => return value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    ..
                } => idx = if row[feature] < threshold { left } else { right },
            }
        }
    }

    /// Number of edges on the longest root-to-leaf path.
    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], idx: usize) -> usize {
            match nodes[idx] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(nodes, left).max(walk(nodes, right)),
            }
        }
        walk(&self.nodes, 0)
    }

    pub fn n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Leaf { .. }))
            .count()
    }
}

#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    feature: usize,
    bin: usize,
    gain: f64,
}

/// Grows one tree depth-first on binned training data.
pub(crate) struct TreeBuilder<'a> {
    binned: &'a BinnedMatrix,
    params: &'a BoostingParams,
    features: &'a [usize],
    grad: &'a [f64],
    hess: &'a [f64],
}

impl<'a> TreeBuilder<'a> {
    pub(crate) fn new(
        binned: &'a BinnedMatrix,
        params: &'a BoostingParams,
        features: &'a [usize],
        grad: &'a [f64],
        hess: &'a [f64],
    ) -> Self {
        Self {
            binned,
            params,
            features,
            grad,
            hess,
        }
    }

    /// Builds a tree over the given training rows.
    pub(crate) fn build(&self, rows: Vec<usize>) -> Tree {
        let mut nodes = Vec::new();
        self.grow(rows, 0, &mut nodes);
        Tree { nodes }
    }

    fn grow(&self, rows: Vec<usize>, depth: usize, nodes: &mut Vec<Node>) -> usize {
        let (g, h) = rows.iter().fold((0.0, 0.0), |(g, h), &r| {
            (g + self.grad[r], h + self.hess[r])
        });

        let id = nodes.len();
        nodes.push(Node::Leaf {
            value: self.params.leaf_weight(g, h) * self.params.learning_rate,
        });

        if depth >= self.params.max_depth || rows.len() < 2 {
            return id;
        }
        let Some(split) = self.best_split(&rows, g, h) else {
            return id;
        };

        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
            .iter()
            .partition(|&&r| self.binned.bin(split.feature, r) <= split.bin);
        let left = self.grow(left_rows, depth + 1, nodes);
        let right = self.grow(right_rows, depth + 1, nodes);

        nodes[id] = Node::Split {
            feature: split.feature,
            threshold: self.binned.cuts().threshold(split.feature, split.bin),
            left,
            right,
            gain: split.gain,
        };
        id
    }

    /// Best positive-gain split across the sampled features.
    ///
    /// Ties resolve to the lowest feature index, then the lowest bin, so the
    /// parallel and sequential paths pick the same split.
    fn best_split(&self, rows: &[usize], g: f64, h: f64) -> Option<SplitCandidate> {
        let per_feature: Vec<Option<SplitCandidate>> = if rows.len() >= PARALLEL_ROW_THRESHOLD {
            self.features
                .par_iter()
                .map(|&f| self.best_split_for_feature(f, rows, g, h))
                .collect()
        } else {
            self.features
                .iter()
                .map(|&f| self.best_split_for_feature(f, rows, g, h))
                .collect()
        };

        per_feature
            .into_iter()
            .flatten()
            .fold(None, |best: Option<SplitCandidate>, cand| match best {
                Some(b) if b.gain >= cand.gain => Some(b),
                _ => Some(cand),
            })
    }

    fn best_split_for_feature(
        &self,
        feature: usize,
        rows: &[usize],
        g: f64,
        h: f64,
    ) -> Option<SplitCandidate> {
        let n_bins = self.binned.cuts().n_bins(feature);
        if n_bins < 2 {
            return None;
        }

        let column = self.binned.column(feature);
        let mut hist_g = vec![0.0; n_bins];
        let mut hist_h = vec![0.0; n_bins];
        for &r in rows {
            let b = column[r] as usize;
            hist_g[b] += self.grad[r];
            hist_h[b] += self.hess[r];
        }

        let p = self.params;
        let parent = p.node_score(g, h);
        let mut best: Option<SplitCandidate> = None;
        let (mut gl, mut hl) = (0.0, 0.0);
        for bin in 0..n_bins - 1 {
            gl += hist_g[bin];
            hl += hist_h[bin];
            let (gr, hr) = (g - gl, h - hl);
            if hl < p.min_child_weight || hr < p.min_child_weight {
                continue;
            }
            let gain = 0.5 * (p.node_score(gl, hl) + p.node_score(gr, hr) - parent) - p.gamma;
            if gain > 0.0 && best.is_none_or(|b| gain > b.gain) {
                best = Some(SplitCandidate { feature, bin, gain });
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use ndarray::{Array2, array};

    use super::*;

    fn fit_one(x: &Array2<f64>, y: &[f64], params: &BoostingParams) -> Tree {
        let binned = BinnedMatrix::build(x, params.max_bin);
        let grad: Vec<f64> = y.iter().map(|v| -v).collect();
        let hess = vec![1.0; y.len()];
        let features: Vec<usize> = (0..x.ncols()).collect();
        TreeBuilder::new(&binned, params, &features, &grad, &hess).build((0..y.len()).collect())
    }

    fn plain_params() -> BoostingParams {
        BoostingParams {
            learning_rate: 1.0,
            reg_alpha: 0.0,
            reg_lambda: 0.0,
            max_depth: 3,
            ..BoostingParams::default()
        }
    }

    #[test]
    fn step_function_is_split_at_the_step() {
        let x = array![[1.0], [2.0], [3.0], [10.0], [11.0], [12.0]];
        let y = [0.0, 0.0, 0.0, 6.0, 6.0, 6.0];
        let tree = fit_one(&x, &y, &plain_params());

        match tree.nodes()[0] {
            Node::Split {
                feature, threshold, ..
            } => {
                assert_eq!(feature, 0);
                assert_eq!(threshold, 6.5);
            }
            Node::Leaf { .. } => panic!("root should split"),
        }
        // With no regularization, leaf weights equal the group means.
        assert_eq!(tree.predict_row(array![2.0].view()), 0.0);
        assert_eq!(tree.predict_row(array![11.0].view()), 6.0);
    }

    #[test]
    fn depth_limit_is_respected() {
        let x = Array2::from_shape_fn((64, 1), |(i, _)| i as f64);
        let y: Vec<f64> = (0..64).map(|i| (i as f64).sin() * 10.0).collect();
        let params = BoostingParams {
            max_depth: 2,
            ..plain_params()
        };
        let tree = fit_one(&x, &y, &params);
        assert!(tree.depth() <= 2);
        assert!(tree.n_leaves() <= 4);
    }

    #[test]
    fn pure_node_stays_a_leaf() {
        let x = array![[1.0], [2.0], [3.0]];
        let y = [4.0, 4.0, 4.0];
        let tree = fit_one(&x, &y, &plain_params());
        assert_eq!(tree.nodes().len(), 1);
        assert_eq!(tree.predict_row(array![100.0].view()), 4.0);
    }

    #[test]
    fn min_child_weight_blocks_tiny_children() {
        let x = array![[1.0], [2.0], [3.0], [4.0]];
        let y = [0.0, 0.0, 0.0, 100.0];
        let params = BoostingParams {
            min_child_weight: 2.0,
            max_depth: 1,
            ..plain_params()
        };
        let tree = fit_one(&x, &y, &params);
        if let Node::Split { threshold, .. } = tree.nodes()[0] {
            // only the 2/2 split leaves both children with hessian >= 2
            assert_eq!(threshold, 2.5);
        } else {
            panic!("root should split");
        }
    }
}
