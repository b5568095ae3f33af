use std::fmt;

/// Dense row-major `f32` buffer, the hand-off format for numeric consumers
/// of the board encoding.
#[derive(Clone, PartialEq)]
pub struct Tensor {
    pub data: Vec<f32>,
    pub shape: Vec<usize>,
    pub strides: Vec<usize>
}

impl Tensor {
    pub fn zeros(shape: Vec<usize>) -> Self {
        let data: Vec<f32> = vec![0.0; shape.iter().product()];
        Self {
            data,
            strides: Tensor::calc_strides(&shape),
            shape
        }
    }

    pub fn read(&self) -> &[f32] {
        &self.data
    }

    pub fn get(&self, index: &[usize]) -> f32 {
        self.data[self.offset(index)]
    }

    pub fn set(&mut self, index: &[usize], value: f32) {
        let offset = self.offset(index);
        self.data[offset] = value;
    }

    fn offset(&self, index: &[usize]) -> usize {
        assert_eq!(index.len(), self.shape.len(), "index rank must match tensor rank");
        index.iter().zip(&self.shape).zip(&self.strides).map(|((&i, &dim), &stride)| {
            assert!(i < dim, "index out of bounds");
            i * stride
        }).sum()
    }

    fn calc_strides(shape: &[usize]) -> Vec<usize> {
        let mut strides: Vec<usize> = vec![1; shape.len()];
        for i in (0..strides.len().saturating_sub(1)).rev() {
            strides[i] = strides[i+1] * shape[i+1];
        }
        strides
    }
}

impl fmt::Debug for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tensor")
         .field("shape", &self.shape)
         .field("data", &self.data)
         .finish()
    }
}
