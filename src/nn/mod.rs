/*
 * @Author       : 老董
 * @Date         : 2024-01-31 20:23:53
 * @LastEditors  : 老董
 * @LastEditTime : 2026-02-06 10:12:40
 * @Description  : 负责神经网络（neural network）节点的惰性构建：
 *                 节点在构造时只捕获参数，首次前向时由真实输入推导层参数
 */

mod activation;
mod config;
mod context;
mod conv;
mod descriptor;
mod error;
mod lambda;
mod linear;
pub mod mono;
mod node;
mod replicate;
pub mod runtime;
mod sequential;
mod summary;

pub use activation::{Activation, LEAKY_RELU_SLOPE};
pub use config::{Args, NodeConfig, ParamTable, Value};
pub use context::{Context, Device};
pub use conv::{Conv, PaddingMode, PaddingPlan};
pub use descriptor::{ModelDescriptor, NodeDescriptor};
pub use error::NodeError;
pub use lambda::{Lambda, function_name};
pub use linear::Linear;
pub use mono::{MonoCore, MonoNode};
pub use node::{BuildState, Node, NodeCore};
pub use replicate::Replicate;
pub use sequential::{AnyNode, Sequential, SummaryOptions};

#[cfg(test)]
mod tests;
