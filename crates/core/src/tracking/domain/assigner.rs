use ndarray::{Array2, ArrayView2};

use crate::shared::bbox::BBox;

/// Result of matching detections (rows) to tracks (columns).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Assignment {
    /// `(detection_index, track_index)` pairs.
    pub matches: Vec<(usize, usize)>,
    pub unmatched_detections: Vec<usize>,
    pub unmatched_tracks: Vec<usize>,
}

impl Assignment {
    pub fn from_matches(matches: Vec<(usize, usize)>, n_detections: usize, n_tracks: usize) -> Self {
        let mut det_used = vec![false; n_detections];
        let mut track_used = vec![false; n_tracks];
        for &(d, t) in &matches {
            det_used[d] = true;
            track_used[t] = true;
        }
        Self {
            matches,
            unmatched_detections: (0..n_detections).filter(|&d| !det_used[d]).collect(),
            unmatched_tracks: (0..n_tracks).filter(|&t| !track_used[t]).collect(),
        }
    }
}

/// Assignment strategy over an IoU matrix.
///
/// Pairs below `threshold` are never matched. `detections` is passed along
/// for strategies that break ties on detection geometry.
pub trait Assigner: Send {
    fn assign(&self, iou: ArrayView2<f64>, detections: &[BBox], threshold: f64) -> Assignment;
}

/// `iou[[d, t]]` is the overlap of detection `d` with track box `t`.
pub fn iou_matrix(detections: &[BBox], tracks: &[BBox]) -> Array2<f64> {
    Array2::from_shape_fn((detections.len(), tracks.len()), |(d, t)| {
        detections[d].iou(&tracks[t])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_iou_matrix_shape_and_values() {
        let dets = [BBox::new(0.0, 0.0, 10.0, 10.0), BBox::new(100.0, 100.0, 110.0, 110.0)];
        let tracks = [BBox::new(0.0, 0.0, 10.0, 20.0)];

        let m = iou_matrix(&dets, &tracks);

        assert_eq!(m.dim(), (2, 1));
        assert_relative_eq!(m[[0, 0]], 0.5, epsilon = 1e-12);
        assert_eq!(m[[1, 0]], 0.0);
    }

    #[test]
    fn test_from_matches_lists_leftovers() {
        let a = Assignment::from_matches(vec![(1, 0)], 3, 2);
        assert_eq!(a.unmatched_detections, vec![0, 2]);
        assert_eq!(a.unmatched_tracks, vec![1]);
    }
}
