use crate::tracking::domain::assigner::Assigner;
use crate::tracking::domain::associator::AssignmentStrategy;

use super::greedy_assigner::GreedyAssigner;
use super::hungarian_assigner::HungarianAssigner;

pub fn create_assigner(strategy: AssignmentStrategy) -> Box<dyn Assigner> {
    log::debug!("Using {strategy:?} track assignment");
    match strategy {
        AssignmentStrategy::Greedy => Box::new(GreedyAssigner),
        AssignmentStrategy::Hungarian => Box::new(HungarianAssigner),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::bbox::BBox;
    use ndarray::array;
    use rstest::rstest;

    #[rstest]
    #[case(AssignmentStrategy::Greedy, vec![(0, 0)])]
    #[case(AssignmentStrategy::Hungarian, vec![(0, 1), (1, 0)])]
    fn test_strategy_selects_assigner(
        #[case] strategy: AssignmentStrategy,
        #[case] expected: Vec<(usize, usize)>,
    ) {
        let iou = array![[0.6, 0.5], [0.55, 0.0]];
        let dets = [BBox::new(0.0, 0.0, 1.0, 1.0), BBox::new(0.0, 0.0, 1.0, 1.0)];

        let mut matches = create_assigner(strategy).assign(iou.view(), &dets, 0.3).matches;
        matches.sort();

        assert_eq!(matches, expected);
    }
}
