use ndarray::{Array1, Array2, ArrayView1};

use super::embedding::Embedding;
use super::registry_store::RegisteredSubject;
use crate::shared::ids::SubjectId;

/// Best registry template for a query embedding.
#[derive(Clone, Debug, PartialEq)]
pub struct SubjectMatch {
    pub subject_id: SubjectId,
    pub name: String,
    pub similarity: f64,
}

/// Immutable, matching-ready view of the registry.
///
/// Templates are stored as rows of a unit-normalized matrix in insertion
/// order (subject order, then template order), so one matrix-vector product
/// scores a query against every template. Snapshots are swapped whole by the
/// registry cache and never mutated in place.
#[derive(Clone, Debug)]
pub struct RegistrySnapshot {
    templates: Array2<f32>,
    owners: Vec<(SubjectId, String)>,
    subject_count: usize,
}

impl RegistrySnapshot {
    pub fn empty() -> Self {
        Self {
            templates: Array2::zeros((0, 0)),
            owners: Vec::new(),
            subject_count: 0,
        }
    }

    /// Builds the matrix from loaded subjects. The first usable template
    /// fixes the dimension; templates of another dimension or with zero
    /// norm are skipped with a warning.
    pub fn build(subjects: &[RegisteredSubject]) -> Self {
        let mut rows: Vec<Embedding> = Vec::new();
        let mut owners = Vec::new();
        let mut dim: Option<usize> = None;

        for subject in subjects {
            for (i, embedding) in subject.embeddings.iter().enumerate() {
                let Some(unit) = embedding.normalized() else {
                    log::warn!(
                        "Skipping degenerate template {i} of subject {} ({})",
                        subject.id,
                        subject.name
                    );
                    continue;
                };
                let expected = *dim.get_or_insert(unit.dim());
                if unit.dim() != expected {
                    log::warn!(
                        "Skipping template {i} of subject {} ({}): dimension {} != {expected}",
                        subject.id,
                        subject.name,
                        unit.dim()
                    );
                    continue;
                }
                rows.push(unit);
                owners.push((subject.id, subject.name.clone()));
            }
        }

        let mut templates = Array2::zeros((rows.len(), dim.unwrap_or(0)));
        for (mut row, unit) in templates.rows_mut().into_iter().zip(&rows) {
            row.assign(&ArrayView1::from(unit.as_slice()));
        }

        Self {
            templates,
            owners,
            subject_count: subjects.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    pub fn template_count(&self) -> usize {
        self.owners.len()
    }

    pub fn subject_count(&self) -> usize {
        self.subject_count
    }

    /// Template dimension, `None` while the registry holds no templates.
    pub fn dimension(&self) -> Option<usize> {
        if self.is_empty() {
            None
        } else {
            Some(self.templates.ncols())
        }
    }

    /// Highest-similarity template, regardless of any threshold. Ties keep
    /// the earliest template. `None` when the registry is empty or the query
    /// cannot be matched (degenerate or wrong dimension).
    pub fn best_match(&self, query: &Embedding) -> Option<SubjectMatch> {
        let expected = self.dimension()?;
        let unit = query.normalized()?;
        if unit.dim() != expected {
            log::debug!(
                "Query embedding dimension {} does not match registry dimension {expected}",
                unit.dim()
            );
            return None;
        }

        let query = Array1::from(unit.as_slice().to_vec());
        let scores = self.templates.dot(&query);

        let mut best: Option<(usize, f32)> = None;
        for (row, &score) in scores.iter().enumerate() {
            if best.map_or(true, |(_, top)| score > top) {
                best = Some((row, score));
            }
        }

        best.map(|(row, score)| {
            let (subject_id, name) = &self.owners[row];
            SubjectMatch {
                subject_id: *subject_id,
                name: name.clone(),
                similarity: (score as f64).clamp(-1.0, 1.0),
            }
        })
    }
}

impl Default for RegistrySnapshot {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn subject(id: u64, name: &str, embeddings: Vec<Vec<f32>>) -> RegisteredSubject {
        RegisteredSubject {
            id: SubjectId(id),
            name: name.to_string(),
            embeddings: embeddings.into_iter().map(Embedding::new).collect(),
        }
    }

    #[test]
    fn test_empty_snapshot_matches_nothing() {
        let snapshot = RegistrySnapshot::empty();
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.dimension(), None);
        assert!(snapshot.best_match(&Embedding::new(vec![1.0, 0.0])).is_none());
    }

    #[test]
    fn test_own_template_matches_with_similarity_one() {
        let alice = vec![0.2, -0.7, 0.4, 1.3];
        let snapshot = RegistrySnapshot::build(&[
            subject(1, "Alice", vec![alice.clone()]),
            subject(2, "Bob", vec![vec![1.0, 1.0, -1.0, 0.0]]),
        ]);

        let m = snapshot.best_match(&Embedding::new(alice)).unwrap();
        assert_eq!(m.name, "Alice");
        assert_eq!(m.subject_id, SubjectId(1));
        assert_relative_eq!(m.similarity, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_multi_template_picks_best_template() {
        let snapshot = RegistrySnapshot::build(&[
            subject(1, "Alice", vec![vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0]]),
            subject(2, "Bob", vec![vec![0.0, 0.0, 1.0]]),
        ]);
        assert_eq!(snapshot.template_count(), 3);
        assert_eq!(snapshot.subject_count(), 2);

        let m = snapshot
            .best_match(&Embedding::new(vec![0.1, 0.9, 0.2]))
            .unwrap();
        assert_eq!(m.name, "Alice");
    }

    #[test]
    fn test_ties_resolve_to_first_inserted() {
        let snapshot = RegistrySnapshot::build(&[
            subject(1, "Alice", vec![vec![1.0, 0.0]]),
            subject(2, "Twin", vec![vec![1.0, 0.0]]),
        ]);
        let m = snapshot.best_match(&Embedding::new(vec![1.0, 0.0])).unwrap();
        assert_eq!(m.name, "Alice");
    }

    #[test]
    fn test_best_match_reports_low_similarity_too() {
        let snapshot = RegistrySnapshot::build(&[subject(1, "Alice", vec![vec![1.0, 0.0]])]);
        let m = snapshot.best_match(&Embedding::new(vec![0.0, 1.0])).unwrap();
        assert_relative_eq!(m.similarity, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_mismatched_dimensions_are_skipped() {
        let snapshot = RegistrySnapshot::build(&[
            subject(1, "Alice", vec![vec![1.0, 0.0]]),
            subject(2, "Broken", vec![vec![1.0, 0.0, 0.0]]),
        ]);
        assert_eq!(snapshot.template_count(), 1);
        assert_eq!(snapshot.dimension(), Some(2));
        assert!(snapshot
            .best_match(&Embedding::new(vec![1.0, 0.0, 0.0]))
            .is_none());
    }

    #[test]
    fn test_zero_templates_are_skipped() {
        let snapshot = RegistrySnapshot::build(&[subject(
            1,
            "Alice",
            vec![vec![0.0, 0.0], vec![0.0, 2.0]],
        )]);
        assert_eq!(snapshot.template_count(), 1);
    }

    #[test]
    fn test_zero_query_matches_nothing() {
        let snapshot = RegistrySnapshot::build(&[subject(1, "Alice", vec![vec![1.0, 0.0]])]);
        assert!(snapshot.best_match(&Embedding::new(vec![0.0, 0.0])).is_none());
    }

    fn similarity(template: &[f32], query: &[f32]) -> f64 {
        RegistrySnapshot::build(&[subject(1, "Only", vec![template.to_vec()])])
            .best_match(&Embedding::new(query.to_vec()))
            .unwrap()
            .similarity
    }

    #[rstest]
    #[case(&[1.0, 0.0], &[0.0, 1.0], 0.0)]
    #[case(&[1.0, 0.0], &[-1.0, 0.0], -1.0)]
    #[case(&[1.0, 1.0], &[2.0, 2.0], 1.0)]
    #[case(&[3.0, 4.0], &[4.0, 3.0], 0.96)]
    fn test_similarity_is_cosine(#[case] template: &[f32], #[case] query: &[f32], #[case] expected: f64) {
        assert_relative_eq!(similarity(template, query), expected, epsilon = 1e-6);
    }

    #[test]
    fn test_similarity_is_symmetric_and_bounded() {
        let vectors: [&[f32]; 5] = [
            &[1.0, 2.0, 3.0],
            &[-4.0, 0.5, 9.0],
            &[1e-3, -1e-3, 2e-3],
            &[1000.0, -2000.0, 0.0],
            &[-1.0, -2.0, -3.0],
        ];
        for a in vectors {
            for b in vectors {
                let ab = similarity(a, b);
                let ba = similarity(b, a);
                assert_relative_eq!(ab, ba, epsilon = 1e-6);
                assert!((-1.0..=1.0).contains(&ab), "{ab} out of range");
            }
        }
    }
}
