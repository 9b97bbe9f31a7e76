use ndarray::{Array2, ArrayView1};

/// Per-feature split candidates.
///
/// A value `v` falls into bin `k` where `k` is the number of cuts `<= v`,
/// so "bin <= b" is equivalent to `v < cuts[b]`. That lets a split found on
/// bins be replayed on raw values at scoring time.
#[derive(Debug, Clone)]
pub(crate) struct FeatureCuts {
    cuts: Vec<Vec<f64>>,
}

impl FeatureCuts {
    /// Computes at most `max_bin - 1` cuts for every column of `x`.
    pub(crate) fn from_matrix(x: &Array2<f64>, max_bin: usize) -> Self {
        let cuts = x
            .columns()
            .into_iter()
            .map(|col| column_cuts(col, max_bin))
            .collect();
        Self { cuts }
    }

    pub(crate) fn n_bins(&self, feature: usize) -> usize {
        self.cuts[feature].len() + 1
    }

    pub(crate) fn bin_of(&self, feature: usize, value: f64) -> u32 {
        self.cuts[feature].partition_point(|&c| c <= value) as u32
    }

    /// Raw threshold separating bins `..=bin` from `bin + 1..`.
    pub(crate) fn threshold(&self, feature: usize, bin: usize) -> f64 {
        self.cuts[feature][bin]
    }
}

fn column_cuts(col: ArrayView1<'_, f64>, max_bin: usize) -> Vec<f64> {
    let mut sorted: Vec<f64> = col.to_vec();
    sorted.sort_by(f64::total_cmp);

    let mut distinct = sorted.clone();
    distinct.dedup();
    if distinct.len() <= 1 {
        return Vec::new();
    }

    let mut cuts: Vec<f64> = if distinct.len() <= max_bin {
        distinct
            .windows(2)
            .map(|w| w[0] + (w[1] - w[0]) / 2.0)
            .collect()
    } else {
        let n = sorted.len();
        (1..max_bin).map(|k| sorted[k * n / max_bin]).collect()
    };

    let min = distinct[0];
    cuts.retain(|&c| c > min);
    cuts.dedup();
    cuts
}

/// Column-major bin indices of the training matrix.
#[derive(Debug, Clone)]
pub(crate) struct BinnedMatrix {
    cuts: FeatureCuts,
    bins: Vec<Vec<u32>>,
}

impl BinnedMatrix {
    pub(crate) fn build(x: &Array2<f64>, max_bin: usize) -> Self {
        let cuts = FeatureCuts::from_matrix(x, max_bin);
        let bins = x
            .columns()
            .into_iter()
            .enumerate()
            .map(|(f, col)| col.iter().map(|&v| cuts.bin_of(f, v)).collect())
            .collect();
        Self { cuts, bins }
    }

    pub(crate) fn cuts(&self) -> &FeatureCuts {
        &self.cuts
    }

    pub(crate) fn bin(&self, feature: usize, row: usize) -> usize {
        self.bins[feature][row] as usize
    }

    pub(crate) fn column(&self, feature: usize) -> &[u32] {
        &self.bins[feature]
    }

    pub(crate) fn n_features(&self) -> usize {
        self.bins.len()
    }
}
