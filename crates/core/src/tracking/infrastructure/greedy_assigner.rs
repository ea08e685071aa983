use std::cmp::Ordering;
use std::collections::HashSet;

use ndarray::ArrayView2;

use crate::shared::bbox::BBox;
use crate::tracking::domain::assigner::{Assigner, Assignment};

/// Greedy IoU matching: repeatedly takes the remaining pair with the highest
/// IoU until the best remaining pair falls below the threshold.
///
/// Equal IoUs are broken by larger detection area, then lower detection
/// index, then lower track index (tracks are ordered by id).
pub struct GreedyAssigner;

impl Assigner for GreedyAssigner {
    fn assign(&self, iou: ArrayView2<f64>, detections: &[BBox], threshold: f64) -> Assignment {
        let (n_det, n_track) = iou.dim();

        let mut pairs: Vec<(usize, usize, f64)> = Vec::new();
        for ((d, t), &score) in iou.indexed_iter() {
            if score > 0.0 && score >= threshold {
                pairs.push((d, t, score));
            }
        }
        pairs.sort_by(|a, b| {
            b.2.partial_cmp(&a.2)
                .unwrap_or(Ordering::Equal)
                .then_with(|| {
                    let area_a = detections.get(a.0).map_or(0.0, BBox::area);
                    let area_b = detections.get(b.0).map_or(0.0, BBox::area);
                    area_b.partial_cmp(&area_a).unwrap_or(Ordering::Equal)
                })
                .then(a.0.cmp(&b.0))
                .then(a.1.cmp(&b.1))
        });

        let mut used_dets = HashSet::new();
        let mut used_tracks = HashSet::new();
        let mut matches = Vec::new();

        for (d, t, _) in pairs {
            if !used_dets.contains(&d) && !used_tracks.contains(&t) {
                used_dets.insert(d);
                used_tracks.insert(t);
                matches.push((d, t));
            }
        }

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
    fn test_takes_highest_iou_first() {
        let iou = array![[0.6, 0.5], [0.55, 0.0]];
        let a = GreedyAssigner.assign(iou.view(), &boxes(2), 0.3);
        assert_eq!(a.matches, vec![(0, 0)]);
        assert_eq!(a.unmatched_detections, vec![1]);
        assert_eq!(a.unmatched_tracks, vec![1]);
    }

    #[test]
    fn test_below_threshold_is_not_matched() {
        let iou = array![[0.29]];
        let a = GreedyAssigner.assign(iou.view(), &boxes(1), 0.3);
        assert!(a.matches.is_empty());
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let iou = array![[0.3]];
        let a = GreedyAssigner.assign(iou.view(), &boxes(1), 0.3);
        assert_eq!(a.matches, vec![(0, 0)]);
    }

    #[test]
    fn test_zero_overlap_never_matches_even_at_zero_threshold() {
        let iou = array![[0.0]];
        let a = GreedyAssigner.assign(iou.view(), &boxes(1), 0.0);
        assert!(a.matches.is_empty());
    }

    #[test]
    fn test_tie_prefers_larger_detection() {
        let iou = array![[0.5], [0.5]];
        let dets = [BBox::new(0.0, 0.0, 10.0, 10.0), BBox::new(0.0, 0.0, 20.0, 20.0)];
        let a = GreedyAssigner.assign(iou.view(), &dets, 0.3);
        assert_eq!(a.matches, vec![(1, 0)]);
    }

    #[test]
    fn test_tie_with_equal_area_prefers_lower_indices() {
        let iou = array![[0.5, 0.5], [0.5, 0.5]];
        let a = GreedyAssigner.assign(iou.view(), &boxes(2), 0.3);
        assert_eq!(a.matches, vec![(0, 0), (1, 1)]);
    }
}
