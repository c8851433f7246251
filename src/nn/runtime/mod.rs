/*
 * @Author       : 老董
 * @Date         : 2026-02-03
 * @Description  : 节点系统与底层数值运行时之间的边界
 *
 * 节点只决定“构建什么层、用什么参数”，层的数值实现（卷积/矩阵乘、上采样、
 * 权重初始化、设备内存）都由运行时提供。`CpuRuntime` 是基于 ndarray 的参考实现，
 * 测试中也可以换成只记录调用的桩运行时。
 */

mod cpu;

pub use cpu::CpuRuntime;

use std::fmt;

use super::context::Device;
use super::{NodeError, Value};
use crate::tensor::Tensor;

/// 运行时构建出的具体计算层
pub trait Layer {
    fn forward(&self, x: &Tensor) -> Result<Tensor, NodeError>;

    /// 按固定顺序返回（参数名, 参数张量）
    fn named_parameters(&self) -> Vec<(&'static str, &Tensor)>;

    /// 迁移到指定设备
    fn to_device(&mut self, device: Device);

    fn device(&self) -> Device;
}

/// 底层数值运行时
pub trait Runtime {
    /// 按规格实例化一个层（权重在此初始化）
    fn create_layer(&self, spec: &LayerSpec) -> Result<Box<dyn Layer>, NodeError>;

    /// 对空间维（第2维起）做最近邻上采样
    fn upsample(&self, x: &Tensor, factor: usize) -> Result<Tensor, NodeError>;

    /// 生成标准正态分布的随机张量（用于形状探测）
    fn randn(&self, shape: &[usize]) -> Tensor;
}

// ==================== 层的种类与规格 ====================

/// 节点可请求的层种类（封闭集合）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerKind {
    Conv1d,
    Conv2d,
    Conv3d,
    Linear,
}

impl LayerKind {
    /// 按空间阶数选择卷积层：1/2/3 阶之外均为配置错误
    pub fn conv_for_rank(rank: usize) -> Result<Self, NodeError> {
        match rank {
            1 => Ok(Self::Conv1d),
            2 => Ok(Self::Conv2d),
            3 => Ok(Self::Conv3d),
            _ => Err(NodeError::config(format!(
                "卷积仅支持1~3阶空间维度，实际为{rank}阶"
            ))),
        }
    }
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Conv1d => "Conv1d",
            Self::Conv2d => "Conv2d",
            Self::Conv3d => "Conv3d",
            Self::Linear => "Linear",
        };
        write!(f, "{name}")
    }
}

/// 收集到的层构造关键字参数（目标关键字 → 值）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayerArgs {
    entries: Vec<(&'static str, Value)>,
}

impl LayerArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// 插入或覆盖
    pub fn insert(&mut self, key: &'static str, value: impl Into<Value>) {
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Value)> {
        self.entries.iter().map(|(k, v)| (*k, v))
    }

    fn usize_or(&self, key: &str, default: usize) -> Result<usize, NodeError> {
        match self.get(key) {
            None | Some(Value::None) => Ok(default),
            Some(value) => value
                .as_usize()
                .ok_or_else(|| NodeError::config(format!("`{key}`须为非负整数，实际为`{value}`"))),
        }
    }

    fn required_usize(&self, key: &str, hint: &str) -> Result<usize, NodeError> {
        match self.get(key) {
            None | Some(Value::None) => Err(NodeError::config(format!("缺少`{key}`：{hint}"))),
            Some(value) => value
                .as_usize()
                .ok_or_else(|| NodeError::config(format!("`{key}`须为非负整数，实际为`{value}`"))),
        }
    }

    fn bool_or(&self, key: &str, default: bool) -> Result<bool, NodeError> {
        match self.get(key) {
            None => Ok(default),
            Some(value) => value
                .as_bool()
                .ok_or_else(|| NodeError::config(format!("`{key}`须为布尔值，实际为`{value}`"))),
        }
    }
}

/// 卷积层规格
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConvSpec {
    /// 空间阶数（1/2/3）
    pub rank: usize,
    pub in_channels: usize,
    pub out_channels: usize,
    pub kernel_size: usize,
    pub stride: usize,
    pub padding: usize,
    pub dilation: usize,
    pub groups: usize,
    pub bias: bool,
}

impl ConvSpec {
    /// 单个空间维度上的输出尺寸；输入过小时返回None
    pub fn output_extent(&self, extent: usize) -> Option<usize> {
        let receptive = self.dilation * (self.kernel_size - 1) + 1;
        let padded = extent + 2 * self.padding;
        (padded >= receptive).then(|| (padded - receptive) / self.stride + 1)
    }
}

/// 全连接层规格
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinearSpec {
    pub in_features: usize,
    pub out_features: usize,
    pub bias: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerSpec {
    Conv(ConvSpec),
    Linear(LinearSpec),
}

impl LayerSpec {
    /// 由层种类与收集到的关键字参数得到经过校验的层规格
    pub fn from_args(kind: LayerKind, args: &LayerArgs) -> Result<Self, NodeError> {
        match kind {
            LayerKind::Conv1d | LayerKind::Conv2d | LayerKind::Conv3d => {
                let rank = match kind {
                    LayerKind::Conv1d => 1,
                    LayerKind::Conv2d => 2,
                    _ => 3,
                };
                let spec = ConvSpec {
                    rank,
                    in_channels: args.required_usize("in_channels", "须由输入形状推导")?,
                    out_channels: args.required_usize(
                        "out_channels",
                        "未指定输出通道数，且padding模式无法推导",
                    )?,
                    kernel_size: args.usize_or("kernel_size", 1)?,
                    stride: args.usize_or("stride", 1)?,
                    padding: args.usize_or("padding", 0)?,
                    dilation: args.usize_or("dilation", 1)?,
                    groups: args.usize_or("groups", 1)?,
                    bias: args.bool_or("bias", true)?,
                };
                for (key, value) in [
                    ("in_channels", spec.in_channels),
                    ("out_channels", spec.out_channels),
                    ("kernel_size", spec.kernel_size),
                    ("stride", spec.stride),
                    ("dilation", spec.dilation),
                    ("groups", spec.groups),
                ] {
                    if value == 0 {
                        return Err(NodeError::config(format!("`{key}`须大于0")));
                    }
                }
                if spec.in_channels % spec.groups != 0 || spec.out_channels % spec.groups != 0 {
                    return Err(NodeError::config(format!(
                        "groups={}须同时整除输入通道数{}与输出通道数{}",
                        spec.groups, spec.in_channels, spec.out_channels
                    )));
                }
                Ok(Self::Conv(spec))
            }
            LayerKind::Linear => {
                let spec = LinearSpec {
                    in_features: args.required_usize("in_features", "须由输入形状推导")?,
                    out_features: args.required_usize("out_features", "未指定输出特征数")?,
                    bias: args.bool_or("bias", true)?,
                };
                if spec.in_features == 0 || spec.out_features == 0 {
                    return Err(NodeError::config("全连接层的特征数须大于0"));
                }
                Ok(Self::Linear(spec))
            }
        }
    }

    pub const fn kind(&self) -> LayerKind {
        match self {
            Self::Conv(spec) => match spec.rank {
                1 => LayerKind::Conv1d,
                2 => LayerKind::Conv2d,
                _ => LayerKind::Conv3d,
            },
            Self::Linear(_) => LayerKind::Linear,
        }
    }
}
