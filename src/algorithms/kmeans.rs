use ndarray::{Array2, ArrayView1};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const MAX_ITERATIONS: usize = 300;
const TOLERANCE: f32 = 1e-4;

/// Lloyd's algorithm with seeded farthest-point initialization. The fit is
/// fully deterministic for a given seed and input matrix.
#[derive(Debug, Clone)]
pub struct KMeans {
    n_clusters: usize,
    max_iterations: usize,
    tolerance: f32,
    seed: u64,
}

impl KMeans {
    pub fn new(n_clusters: usize, seed: u64) -> Self {
        Self {
            n_clusters,
            max_iterations: MAX_ITERATIONS,
            tolerance: TOLERANCE,
            seed,
        }
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Returns a cluster label per input row. The effective cluster count is
    /// capped at the number of samples; an empty input yields no labels.
    pub fn fit(&self, samples: &Array2<f32>) -> Vec<usize> {
        let (n_samples, _) = samples.dim();
        if n_samples == 0 {
            return Vec::new();
        }

        let k = self.n_clusters.clamp(1, n_samples);
        let mut centroids = self.initial_centroids(samples, k);
        let mut labels = vec![0; n_samples];

        for _ in 0..self.max_iterations {
            labels = assign_labels(samples, &centroids);
            let updated = update_centroids(samples, &labels, &centroids);
            let converged = centroids_converged(&centroids, &updated, self.tolerance);
            centroids = updated;
            if converged {
                break;
            }
        }

        labels
    }

    /// First centroid is drawn by the seeded generator; each further
    /// centroid is the sample farthest from all centroids chosen so far.
    fn initial_centroids(&self, samples: &Array2<f32>, k: usize) -> Array2<f32> {
        let (n_samples, n_features) = samples.dim();
        let mut rng = StdRng::seed_from_u64(self.seed);

        let mut centroids = Array2::zeros((k, n_features));
        let first = rng.gen_range(0..n_samples);
        centroids.row_mut(0).assign(&samples.row(first));

        for chosen in 1..k {
            let mut farthest = 0;
            let mut farthest_distance = -1.0f32;
            for candidate in 0..n_samples {
                let mut nearest = f32::INFINITY;
                for existing in 0..chosen {
                    let distance =
                        squared_distance(samples.row(candidate), centroids.row(existing));
                    if distance < nearest {
                        nearest = distance;
                    }
                }
                if nearest > farthest_distance {
                    farthest_distance = nearest;
                    farthest = candidate;
                }
            }
            centroids.row_mut(chosen).assign(&samples.row(farthest));
        }

        centroids
    }
}

fn squared_distance(a: ArrayView1<'_, f32>, b: ArrayView1<'_, f32>) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}

fn assign_labels(samples: &Array2<f32>, centroids: &Array2<f32>) -> Vec<usize> {
    let (n_samples, _) = samples.dim();
    let k = centroids.dim().0;
    let mut labels = vec![0; n_samples];

    for (sample, label) in labels.iter_mut().enumerate() {
        let mut nearest = f32::INFINITY;
        for cluster in 0..k {
            let distance = squared_distance(samples.row(sample), centroids.row(cluster));
            if distance < nearest {
                nearest = distance;
                *label = cluster;
            }
        }
    }

    labels
}

/// New centroids are the mean of their members; a cluster left without
/// members keeps its previous centroid.
fn update_centroids(
    samples: &Array2<f32>,
    labels: &[usize],
    previous: &Array2<f32>,
) -> Array2<f32> {
    let (k, n_features) = previous.dim();
    let mut sums = Array2::<f32>::zeros((k, n_features));
    let mut counts = vec![0usize; k];

    for (sample, &label) in labels.iter().enumerate() {
        counts[label] += 1;
        for feature in 0..n_features {
            sums[[label, feature]] += samples[[sample, feature]];
        }
    }

    for cluster in 0..k {
        if counts[cluster] == 0 {
            sums.row_mut(cluster).assign(&previous.row(cluster));
        } else {
            for feature in 0..n_features {
                sums[[cluster, feature]] /= counts[cluster] as f32;
            }
        }
    }

    sums
}

fn centroids_converged(old: &Array2<f32>, new: &Array2<f32>, tolerance: f32) -> bool {
    let k = old.dim().0;
    (0..k).all(|cluster| squared_distance(old.row(cluster), new.row(cluster)) <= tolerance * tolerance)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_groups() -> Array2<f32> {
        Array2::from_shape_vec(
            (6, 2),
            vec![
                0.0, 0.1, //
                0.2, 0.0, //
                0.1, 0.2, //
                9.0, 9.1, //
                9.2, 8.9, //
                8.8, 9.0,
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_fit_separates_two_groups() {
        let labels = KMeans::new(2, 42).fit(&two_groups());

        assert_eq!(labels.len(), 6);
        assert_eq!(labels[0], labels[1]);
        assert_eq!(labels[0], labels[2]);
        assert_eq!(labels[3], labels[4]);
        assert_eq!(labels[3], labels[5]);
        assert_ne!(labels[0], labels[3]);
    }

    #[test]
    fn test_fit_is_deterministic_for_seed() {
        let samples = two_groups();
        let first = KMeans::new(2, 7).fit(&samples);
        let second = KMeans::new(2, 7).fit(&samples);
        assert_eq!(first, second);
    }

    #[test]
    fn test_cluster_count_capped_at_samples() {
        let samples = Array2::from_shape_vec((2, 1), vec![1.0, 2.0]).unwrap();
        let labels = KMeans::new(5, 42).fit(&samples);
        assert_eq!(labels.len(), 2);
        assert!(labels.iter().all(|&label| label < 2));
    }

    #[test]
    fn test_empty_input_yields_no_labels() {
        let samples = Array2::<f32>::zeros((0, 3));
        assert!(KMeans::new(3, 42).fit(&samples).is_empty());
    }

    #[test]
    fn test_bounded_iterations() {
        let labels = KMeans::new(2, 42).with_max_iterations(1).fit(&two_groups());
        assert_eq!(labels.len(), 6);
    }
}
