use half::f16;
use serde::Serialize;
use thiserror::Error;

/// Reasons a raw float sequence cannot become an [`EmbeddingVector`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum VectorError {
    #[error("embedding vector is empty")]
    Empty,

    #[error("embedding component {index} is not finite")]
    NonFinite { index: usize },

    #[error("embedding vector has zero norm and cannot be normalized")]
    ZeroNorm,
}

/// Unit-norm embedding vector.
///
/// The only constructors normalize their input, so every value of this type satisfies
/// `‖v‖₂ = 1` within float tolerance and [`dot`](Self::dot) is the cosine similarity.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct EmbeddingVector {
    values: Vec<f32>,
}

impl EmbeddingVector {
    /// Validates and L2-normalizes a raw vector.
    pub fn from_raw(mut values: Vec<f32>) -> Result<Self, VectorError> {
        if values.is_empty() {
            return Err(VectorError::Empty);
        }

        if let Some(index) = values.iter().position(|v| !v.is_finite()) {
            return Err(VectorError::NonFinite { index });
        }

        let norm = values
            .iter()
            .map(|&v| f64::from(v) * f64::from(v))
            .sum::<f64>()
            .sqrt();

        if norm == 0.0 || !norm.is_finite() {
            return Err(VectorError::ZeroNorm);
        }

        for v in &mut values {
            *v = (f64::from(*v) / norm) as f32;
        }

        Ok(Self { values })
    }

    /// Normalizes a half-precision vector.
    pub fn from_f16(values: &[f16]) -> Result<Self, VectorError> {
        Self::from_raw(values.iter().map(|v| v.to_f32()).collect())
    }

    /// Cosine similarity with another unit vector.
    ///
    /// Both operands are unit-norm, so this is a plain dot product. Callers must
    /// ensure equal dimensions; extra components of the longer vector are ignored.
    #[inline]
    pub fn dot(&self, other: &EmbeddingVector) -> f32 {
        debug_assert_eq!(self.values.len(), other.values.len());
        self.values
            .iter()
            .zip(other.values.iter())
            .map(|(&a, &b)| f64::from(a) * f64::from(b))
            .sum::<f64>() as f32
    }

    /// Number of components.
    #[inline]
    pub fn dim(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }

    /// Recomputes the L2 norm (diagnostics and tests).
    pub fn norm(&self) -> f32 {
        self.values
            .iter()
            .map(|&v| f64::from(v) * f64::from(v))
            .sum::<f64>()
            .sqrt() as f32
    }

    pub fn into_inner(self) -> Vec<f32> {
        self.values
    }
}

impl AsRef<[f32]> for EmbeddingVector {
    fn as_ref(&self) -> &[f32] {
        &self.values
    }
}
