use super::Tensor;
use crate::errors::TensorError;

impl Tensor {
    pub fn reshape(&self, shape: &[usize]) -> Result<Self, TensorError> {
        let new_total_elements: usize = shape.iter().product();
        if self.size() != new_total_elements {
            return Err(TensorError::IncompatibleShape {
                from: self.shape().to_vec(),
                to: shape.to_vec(),
            });
        }
        let data = self
            .data
            .as_standard_layout()
            .into_owned()
            .into_shape(shape)
            .map_err(|_| TensorError::IncompatibleShape {
                from: self.shape().to_vec(),
                to: shape.to_vec(),
            })?;
        Ok(Self { data })
    }

    /// 保留第0维（批维），将其余所有维度展平为一维：[n, d1, d2, ...] -> [n, d1*d2*...]
    pub fn flatten_batch(&self) -> Result<Self, TensorError> {
        if self.dimension() < 1 {
            return Err(TensorError::RankTooLow {
                min: 1,
                got: self.dimension(),
            });
        }
        let batch = self.shape()[0];
        let rest = self.shape()[1..].iter().product();
        self.reshape(&[batch, rest])
    }

    /// 逐元素映射，返回新张量
    pub fn map<F>(&self, f: F) -> Self
    where
        F: Fn(f32) -> f32,
    {
        Self {
            data: self.data.mapv(f),
        }
    }
}
