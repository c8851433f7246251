//! # Lazy Torch
//!
//! `lazy_torch`让用户在不指定输入维度的情况下声明计算层（卷积、全连接、任意函数），
//! 具体的层会在收到第一个真实输入时，根据其形状惰性地构建出来。
//!
//! ```ignore
//! use lazy_torch::args;
//! use lazy_torch::nn::{Context, Conv, Linear, Node};
//! use lazy_torch::tensor::Tensor;
//!
//! let ctx = Context::new();
//! let mut conv = Conv::new(&ctx, args![16, p = "same"])?;
//! let y = conv.forward(&Tensor::normal(0.0, 1.0, &[1, 8, 32, 32]))?;
//! assert_eq!(y.shape(), &[1, 16, 32, 32]);
//! ```

pub mod errors;
pub mod nn;
pub mod tensor;
pub mod utils;
