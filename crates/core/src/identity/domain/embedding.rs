//! Face embeddings.
//!
//! Matching is cosine similarity throughout, computed by the registry
//! snapshot as a dot product of unit vectors: templates are normalized once
//! when a snapshot is built and the query once per lookup.

use serde::{Deserialize, Serialize};

/// A face embedding as produced by the external face model. Immutable once
/// stored; dimension is fixed by the model (512 for ArcFace).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Embedding(Vec<f32>);

impl Embedding {
    pub fn new(values: Vec<f32>) -> Self {
        Self(values)
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn dim(&self) -> usize {
        self.0.len()
    }

    /// Unit-length copy, or `None` for zero or non-finite vectors, which
    /// cannot take part in cosine matching.
    pub fn normalized(&self) -> Option<Embedding> {
        if self.0.is_empty() || self.0.iter().any(|x| !x.is_finite()) {
            return None;
        }
        let mut values = self.0.clone();
        l2_normalize(&mut values);
        if values.iter().all(|x| *x == 0.0) {
            return None;
        }
        Some(Embedding(values))
    }
}

impl From<Vec<f32>> for Embedding {
    fn from(values: Vec<f32>) -> Self {
        Self(values)
    }
}

pub fn l2_normalize(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}
