use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TensorError {
    #[error("数据长度{data_len}与形状{shape:?}不一致")]
    DataShapeMismatch { data_len: usize, shape: Vec<usize> },
    #[error("形状不兼容，无法从{from:?}变形为{to:?}")]
    IncompatibleShape { from: Vec<usize>, to: Vec<usize> },
    #[error("张量的阶数须至少为{min}，实际为{got}")]
    RankTooLow { min: usize, got: usize },
}
