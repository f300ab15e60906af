use anyhow::{Result, anyhow};
use opencv::core::{DataType, Mat, MatTraitConst, MatTraitConstManual};

/// Read-only N-dimensional view over the data of a continuous `Mat`,
/// such as a DNN output blob.
pub struct TensorView<'a, T> {
    dims: Vec<i32>,
    strides: Vec<usize>,
    data: &'a [T],
}

impl<'a, T: DataType> TensorView<'a, T> {
    pub fn new(mat: &'a Mat) -> Result<Self> {
        if !mat.is_continuous() {
            return Err(anyhow!("Tensor view requires a continuous Mat"));
        }
        let dims = mat.mat_size().to_vec();
        let data = mat.data_typed::<T>()?;
        Self::from_slice(dims, data)
    }

    pub fn from_slice(dims: Vec<i32>, data: &'a [T]) -> Result<Self> {
        if dims.is_empty() || dims.iter().any(|&d| d < 0) {
            return Err(anyhow!("Invalid tensor dimensions {:?}", dims));
        }

        let mut strides: Vec<usize> = vec![1; dims.len()];
        for i in (0..dims.len() - 1).rev() {
            strides[i] = strides[i + 1] * dims[i + 1] as usize;
        }

        let len = strides[0] * dims[0] as usize;
        if data.len() < len {
            return Err(anyhow!(
                "Tensor data too short: {:?} needs {} values, got {}",
                dims,
                len,
                data.len()
            ));
        }

        Ok(Self { dims, strides, data })
    }

    pub fn dims(&self) -> &[i32] {
        &self.dims
    }

    /// Bounds-checked access
    pub fn get(&self, indices: &[i32]) -> Result<&T> {
        self.validate_indices(indices)?;
        let offset: usize = indices
            .iter()
            .zip(&self.strides)
            .map(|(&idx, &stride)| idx as usize * stride)
            .sum();
        self.data
            .get(offset)
            .ok_or_else(|| anyhow!("Index out of bounds"))
    }

    fn validate_indices(&self, indices: &[i32]) -> Result<()> {
        if indices.len() != self.dims.len() {
            return Err(anyhow!(
                "Invalid index dimensions: expected {}, got {}",
                self.dims.len(),
                indices.len()
            ));
        }

        indices.iter().enumerate().try_for_each(|(i, &idx)| {
            if idx < 0 || idx >= self.dims[i] {
                Err(anyhow!(
                    "Index {} out of bounds for dimension {} (0..{})",
                    idx,
                    i,
                    self.dims[i]
                ))
            } else {
                Ok(())
            }
        })
    }
}
