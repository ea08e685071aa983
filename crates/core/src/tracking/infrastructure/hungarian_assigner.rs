use ndarray::ArrayView2;
use pathfinding::prelude::{kuhn_munkres, Matrix};

use crate::shared::bbox::BBox;
use crate::tracking::domain::assigner::{Assigner, Assignment};

/// IoUs are scaled to integers for the solver.
const WEIGHT_SCALE: f64 = 1_000_000.0;

/// Maximum total-IoU bipartite matching (Kuhn-Munkres).
///
/// The weight matrix is padded to a square; pairs below the threshold get
/// weight zero and are discarded after solving.
pub struct HungarianAssigner;

impl Assigner for HungarianAssigner {
    fn assign(&self, iou: ArrayView2<f64>, _detections: &[BBox], threshold: f64) -> Assignment {
        let (n_det, n_track) = iou.dim();
        if n_det == 0 || n_track == 0 {
            return Assignment::from_matches(Vec::new(), n_det, n_track);
        }

        let size = n_det.max(n_track);
        let mut weights = Matrix::new(size, size, 0i64);
        for ((d, t), &score) in iou.indexed_iter() {
            if score > 0.0 && score >= threshold {
                weights[(d, t)] = (score * WEIGHT_SCALE).round() as i64;
            }
        }

        let (_, columns) = kuhn_munkres(&weights);

        let matches = columns
            .into_iter()
            .enumerate()
            .filter(|&(d, t)| d < n_det && t < n_track && weights[(d, t)] > 0)
            .collect();

        Assignment::from_matches(matches, n_det, n_track)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn boxes(n: usize) -> Vec<BBox> {
        (0..n).map(|_| BBox::new(0.0, 0.0, 10.0, 10.0)).collect()
    }

    #[test]
    fn test_maximizes_total_overlap() {
        let iou = array![[0.6, 0.5], [0.55, 0.0]];
        let mut a = HungarianAssigner.assign(iou.view(), &boxes(2), 0.3);
        a.matches.sort();
        assert_eq!(a.matches, vec![(0, 1), (1, 0)]);
        assert!(a.unmatched_detections.is_empty());
        assert!(a.unmatched_tracks.is_empty());
    }

    #[test]
    fn test_rectangular_more_detections() {
        let iou = array![[0.0], [0.8], [0.4]];
        let a = HungarianAssigner.assign(iou.view(), &boxes(3), 0.3);
        assert_eq!(a.matches, vec![(1, 0)]);
        assert_eq!(a.unmatched_detections, vec![0, 2]);
    }

    #[test]
    fn test_rectangular_more_tracks() {
        let iou = array![[0.1, 0.7, 0.2]];
        let a = HungarianAssigner.assign(iou.view(), &boxes(1), 0.3);
        assert_eq!(a.matches, vec![(0, 1)]);
        assert_eq!(a.unmatched_tracks, vec![0, 2]);
    }

    #[test]
    fn test_below_threshold_pairs_are_dropped() {
        let iou = array![[0.2, 0.0], [0.0, 0.25]];
        let a = HungarianAssigner.assign(iou.view(), &boxes(2), 0.3);
        assert!(a.matches.is_empty());
        assert_eq!(a.unmatched_detections, vec![0, 1]);
    }

    #[test]
    fn test_empty_matrix() {
        let iou = ndarray::Array2::<f64>::zeros((0, 2));
        let a = HungarianAssigner.assign(iou.view(), &[], 0.3);
        assert!(a.matches.is_empty());
        assert_eq!(a.unmatched_tracks, vec![0, 1]);
    }
}
