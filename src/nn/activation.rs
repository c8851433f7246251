/*
 * @Author       : 老董
 * @Date         : 2026-02-03
 * @Description  : 单层节点可选的激活函数（封闭集合，构造时即解析）
 */

use std::fmt;

use super::{NodeError, Value};
use crate::tensor::Tensor;

/// LeakyReLU 固定的负半轴斜率
pub const LEAKY_RELU_SLOPE: f32 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Activation {
    Identity,
    #[default]
    ReLU,
    Sigmoid,
    Tanh,
    LeakyReLU,
}

impl Activation {
    /// 从捕获的参数值解析激活函数：`None`/"identity"/"relu"/"sigmoid"/"tanh"/"lrelu"
    pub fn from_value(value: &Value) -> Result<Self, NodeError> {
        match value {
            Value::None => Ok(Self::Identity),
            Value::Str(name) => match name.as_str() {
                "identity" => Ok(Self::Identity),
                "relu" => Ok(Self::ReLU),
                "sigmoid" => Ok(Self::Sigmoid),
                "tanh" => Ok(Self::Tanh),
                "lrelu" => Ok(Self::LeakyReLU),
                _ => Err(NodeError::config(format!("未知的激活函数`{name}`"))),
            },
            other => Err(NodeError::config(format!("激活函数须为名称或None，实际为`{other}`"))),
        }
    }

    pub fn apply(&self, x: &Tensor) -> Tensor {
        match self {
            Self::Identity => x.clone(),
            Self::ReLU => x.map(|v| v.max(0.0)),
            Self::Sigmoid => x.map(|v| 1.0 / (1.0 + (-v).exp())),
            Self::Tanh => x.map(f32::tanh),
            Self::LeakyReLU => x.map(|v| if v > 0.0 { v } else { LEAKY_RELU_SLOPE * v }),
        }
    }
}

impl fmt::Display for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Identity => "identity",
            Self::ReLU => "relu",
            Self::Sigmoid => "sigmoid",
            Self::Tanh => "tanh",
            Self::LeakyReLU => "lrelu",
        };
        write!(f, "{name}")
    }
}
