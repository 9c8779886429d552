use rand::Rng;

use crate::error::{Error, Result};
use crate::shape::Shape;

// Tensor — contiguous row-major f32 storage
//
// The benchmark needs exactly one storage flavour: dense f32, C-order,
// always contiguous. Views, strides, dtypes, and devices are deliberately
// absent; the convolution kernels index the flat buffer directly.

/// Contiguous row-major f32 tensor.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    shape: Shape,
    data: Vec<f32>,
}

impl Tensor {
    /// Create a tensor from existing data. Errors if the element count does
    /// not match the shape.
    pub fn from_vec(data: Vec<f32>, shape: impl Into<Shape>) -> Result<Self> {
        let shape = shape.into();
        let expected = shape.elem_count();
        if data.len() != expected {
            return Err(Error::ElementCountMismatch {
                shape,
                expected,
                got: data.len(),
            });
        }
        Ok(Tensor { shape, data })
    }

    /// Create a zero-filled tensor.
    pub fn zeros(shape: impl Into<Shape>) -> Self {
        let shape = shape.into();
        let data = vec![0.0; shape.elem_count()];
        Tensor { shape, data }
    }

    /// Create a tensor filled with uniform randoms in [0, 1).
    ///
    /// The caller supplies the RNG so sweeps can use `thread_rng` while
    /// tests use a seeded `StdRng`.
    pub fn rand_uniform<R: Rng>(shape: impl Into<Shape>, rng: &mut R) -> Self {
        let shape = shape.into();
        let data = (0..shape.elem_count()).map(|_| rng.gen::<f32>()).collect();
        Tensor { shape, data }
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn dims(&self) -> &[usize] {
        self.shape.dims()
    }

    pub fn rank(&self) -> usize {
        self.shape.rank()
    }

    pub fn elem_count(&self) -> usize {
        self.shape.elem_count()
    }

    /// The underlying flat buffer (row-major).
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Consume the tensor and return its flat buffer.
    pub fn into_vec(self) -> Vec<f32> {
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn from_vec_checks_element_count() {
        let err = Tensor::from_vec(vec![1.0, 2.0, 3.0], [2, 2]).unwrap_err();
        assert!(matches!(err, Error::ElementCountMismatch { .. }));

        let t = Tensor::from_vec(vec![1.0, 2.0, 3.0, 4.0], [2, 2]).unwrap();
        assert_eq!(t.dims(), &[2, 2]);
        assert_eq!(t.data(), &[1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn rand_uniform_stays_in_unit_interval() {
        let mut rng = StdRng::seed_from_u64(7);
        let t = Tensor::rand_uniform([3, 5, 5, 2], &mut rng);
        assert_eq!(t.elem_count(), 150);
        assert!(t.data().iter().all(|&v| (0.0..1.0).contains(&v)));
    }

    #[test]
    fn zeros_matches_shape() {
        let t = Tensor::zeros([1, 4, 4, 3]);
        assert_eq!(t.elem_count(), 48);
        assert!(t.data().iter().all(|&v| v == 0.0));
    }
}
