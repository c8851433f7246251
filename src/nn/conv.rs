/*
 * @Author       : 老董
 * @Date         : 2026-02-05
 * @Description  : 卷积节点：空间阶数、通道数与padding/步长策略都由首个输入的形状推导
 *
 * 输入/输出形状：
 * - 输入：[batch_size, in_channels, S1, (S2, (S3))]
 * - 输出：[batch_size, out_channels, S1', ...]
 *
 * padding模式（构建时解析一次，结果写回当前参数）：
 * - half  ：stride=2, dilation=1, padding=k/2，S' = S/2；未指定输出通道时取 2*in_channels
 * - same  ：stride=1, dilation=1, padding=k/2，S' = S
 * - double：先最近邻上采样2倍，再按same解析，S' = 2S；未指定输出通道时取 in_channels/2
 * - 整数或None：原样作为padding，不改动stride/dilation
 */

use std::fmt;

use super::mono::{self, MonoCore, MonoNode};
use super::replicate::Replicate;
use super::runtime::{Layer, LayerArgs, LayerKind};
use super::{Args, Context, Node, NodeConfig, NodeCore, NodeError, ParamTable, Value};
use crate::tensor::Tensor;

/// 卷积的padding模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaddingMode {
    Half,
    Same,
    Double,
    /// 显式padding值（None按0处理）
    Explicit(usize),
}

impl PaddingMode {
    pub fn from_value(value: &Value) -> Result<Self, NodeError> {
        match value {
            Value::None => Ok(Self::Explicit(0)),
            Value::Str(mode) => match mode.as_str() {
                "half" => Ok(Self::Half),
                "same" => Ok(Self::Same),
                "double" => Ok(Self::Double),
                _ => Err(NodeError::config(format!("不支持的padding模式`{mode}`"))),
            },
            other => other
                .as_usize()
                .map(Self::Explicit)
                .ok_or_else(|| NodeError::config(format!("不支持的padding值`{other}`"))),
        }
    }

    /// 卷积本身（上采样之后）的输出/输入空间尺寸之比；显式padding没有固定比例
    pub const fn scale_factor(&self) -> Option<f64> {
        match self {
            Self::Half => Some(0.5),
            Self::Same | Self::Double => Some(1.0),
            Self::Explicit(_) => None,
        }
    }

    pub const fn upsample_factor(&self) -> Option<usize> {
        match self {
            Self::Double => Some(2),
            _ => None,
        }
    }

    pub const fn is_symbolic(&self) -> bool {
        !matches!(self, Self::Explicit(_))
    }
}

impl fmt::Display for PaddingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Half => write!(f, "half"),
            Self::Same => write!(f, "same"),
            Self::Double => write!(f, "double"),
            Self::Explicit(p) => write!(f, "{p}"),
        }
    }
}

/// 由padding模式与输入形状推导出的层参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaddingPlan {
    pub stride: usize,
    pub padding: usize,
    pub dilation: usize,
    pub out_channels: usize,
    /// 前向前对输入做的上采样倍数
    pub upsample: Option<usize>,
}

impl PaddingPlan {
    /// 解析符号padding模式；显式模式返回 `Ok(None)`
    pub fn resolve(
        mode: PaddingMode,
        kernel_size: usize,
        out_channels: Option<usize>,
        in_shape: &[usize],
    ) -> Result<Option<Self>, NodeError> {
        let Some(scale) = mode.scale_factor() else {
            return Ok(None);
        };
        if in_shape.len() < 3 {
            return Err(NodeError::config(format!(
                "padding模式{mode}要求输入至少形如[batch, channels, 空间维]，实际形状为{in_shape:?}"
            )));
        }
        let stride = 1.0 / scale;
        if stride.fract() != 0.0 {
            return Err(NodeError::config(format!(
                "padding模式{mode}对应的步长{stride}不是整数，输出尺寸无法对所有输入成立"
            )));
        }
        let stride = stride as usize;

        if kernel_size % 2 == 0 {
            return Err(NodeError::config(format!(
                "padding模式{mode}要求奇数卷积核，实际为{kernel_size}；偶数核请改用显式padding（p=<整数>）"
            )));
        }
        if let Some(&extent) = in_shape[2..].iter().find(|&&extent| extent % stride != 0) {
            return Err(NodeError::config(format!(
                "padding模式{mode}要求空间尺寸能被{stride}整除，实际为{extent}，输出无法恰为输入的1/{stride}；\
                 奇数尺寸请改用显式padding（p=<整数>）"
            )));
        }

        let in_channels = in_shape[1];
        let out_channels = match (out_channels, mode) {
            (Some(c), _) => c,
            (None, PaddingMode::Double) => in_channels / 2,
            (None, _) => stride * in_channels,
        };
        if out_channels == 0 {
            return Err(NodeError::config(format!(
                "由输入通道数{in_channels}推导出的输出通道数为0"
            )));
        }

        Ok(Some(Self {
            stride,
            padding: kernel_size / 2,
            dilation: 1,
            out_channels,
            upsample: mode.upsample_factor(),
        }))
    }
}

/// 卷积节点
///
/// # 使用示例
/// ```ignore
/// let mut conv = Conv::new(&ctx, args![16, p = "same"])?;
/// let y = conv.forward(&x)?; // x: [1, 8, 32, 32] -> y: [1, 16, 32, 32]
/// ```
pub struct Conv {
    mono: MonoCore,
    plan: Option<PaddingPlan>,
}

const CONV_KWARGS: &[(&str, &str)] = &[
    ("kernel_size", "k"),
    ("out_channels", "c"),
    ("stride", "s"),
    ("padding", "p"),
    ("dilation", "d"),
    ("groups", "g"),
    ("bias", "b"),
];

impl Conv {
    /// 声明的参数（按位置参数的匹配顺序）：
    /// `c`输出通道、`k`核长、`p`padding模式、`s`步长、`d`膨胀、`g`分组、`b`偏置、`act`激活
    pub fn default_params() -> ParamTable {
        let mut params = vec![
            ("c", Value::None),
            ("k", Value::from(3)),
            ("p", Value::from("half")),
            ("s", Value::from(1)),
            ("d", Value::from(1)),
            ("g", Value::from(1)),
            ("b", Value::from(true)),
        ];
        params.extend(mono::default_params());
        params
    }

    pub fn new(context: &Context, args: Args) -> Result<Self, NodeError> {
        let (name, config) = NodeConfig::capture("Conv", Self::default_params(), args)?;
        Self::from_config(context, name, config)
    }

    fn from_config(context: &Context, name: String, config: NodeConfig) -> Result<Self, NodeError> {
        let mono = MonoCore::new(context, name, config)?;
        let conv = Self { mono, plan: None };

        // 能在构造时发现的配置错误立即报告
        let mode = conv.padding_mode()?;
        let kernel_size = conv.kernel_size()?;
        if mode.is_symbolic() && kernel_size % 2 == 0 {
            return Err(NodeError::config(format!(
                "padding模式{mode}要求奇数卷积核，实际为{kernel_size}；偶数核请改用显式padding（p=<整数>）"
            )));
        }
        conv.out_channels()?;
        Ok(conv)
    }

    pub fn padding_mode(&self) -> Result<PaddingMode, NodeError> {
        PaddingMode::from_value(self.param("p")?)
    }

    pub fn kernel_size(&self) -> Result<usize, NodeError> {
        let k = self.param("k")?;
        k.as_usize()
            .filter(|&k| k > 0)
            .ok_or_else(|| NodeError::config(format!("卷积核长度须为正整数，实际为`{k}`")))
    }

    /// 输出通道数；未指定且尚未构建时为 None
    pub fn out_channels(&self) -> Result<Option<usize>, NodeError> {
        match self.param("c")? {
            Value::None => Ok(None),
            c => c
                .as_usize()
                .map(Some)
                .ok_or_else(|| NodeError::config(format!("输出通道数须为非负整数，实际为`{c}`"))),
        }
    }

    /// 构建时解析出的padding方案（显式padding或尚未构建时为 None）
    pub const fn padding_plan(&self) -> Option<&PaddingPlan> {
        self.plan.as_ref()
    }

    pub fn upsample_factor(&self) -> Option<usize> {
        self.plan.and_then(|plan| plan.upsample)
    }

    fn param(&self, key: &str) -> Result<&Value, NodeError> {
        self.core()
            .config()
            .get(key)
            .ok_or_else(|| NodeError::config(format!("未声明的参数`{key}`")))
    }

    /// 解析padding模式，把推导出的 stride/padding/dilation/输出通道写回当前参数
    fn set_padding(&mut self, in_shape: &[usize]) -> Result<(), NodeError> {
        let plan = PaddingPlan::resolve(
            self.padding_mode()?,
            self.kernel_size()?,
            self.out_channels()?,
            in_shape,
        )?;
        let Some(plan) = plan else {
            return Ok(());
        };

        let config = self.core_mut().config_mut();
        config.set("s", plan.stride)?;
        config.set("p", plan.padding)?;
        config.set("d", plan.dilation)?;
        config.set("c", plan.out_channels)?;
        self.plan = Some(plan);
        Ok(())
    }
}

impl Node for Conv {
    fn core(&self) -> &NodeCore {
        self.mono.node()
    }

    fn core_mut(&mut self) -> &mut NodeCore {
        self.mono.node_mut()
    }

    fn layer(&self) -> Option<&dyn Layer> {
        self.mono.layer()
    }

    fn layer_mut(&mut self) -> Option<&mut (dyn Layer + 'static)> {
        self.mono.layer_mut()
    }

    fn build(&mut self, x: &Tensor) -> Result<(), NodeError> {
        // 每次构建都从捕获的原始参数重新推导
        let captured = self.core().captured().clone();
        *self.core_mut().config_mut() = captured;
        self.plan = None;

        let in_shape = x.shape();
        self.find_layer(in_shape)?;
        self.set_padding(in_shape)?;
        self.build_layer(x)
    }

    /// 构建始终基于原始输入；若padding模式要求上采样，则每次前向都先上采样再卷积
    fn forward(&mut self, x: &Tensor) -> Result<Tensor, NodeError> {
        self.ensure_built(x)?;
        match self.upsample_factor() {
            Some(factor) => {
                let upsampled = self.core().context().runtime().upsample(x, factor)?;
                self.activate_layer(&upsampled)
            }
            None => self.activate_layer(x),
        }
    }
}

impl MonoNode for Conv {
    fn mono(&self) -> &MonoCore {
        &self.mono
    }

    fn mono_mut(&mut self) -> &mut MonoCore {
        &mut self.mono
    }

    /// 空间阶数 = 输入维数 - 2
    fn find_layer(&self, in_shape: &[usize]) -> Result<LayerKind, NodeError> {
        let rank = in_shape.len().checked_sub(2).ok_or_else(|| {
            NodeError::config(format!(
                "卷积输入至少需要[batch, channels, 空间维]，实际形状为{in_shape:?}"
            ))
        })?;
        LayerKind::conv_for_rank(rank)
    }

    fn kwargs_table(&self) -> &'static [(&'static str, &'static str)] {
        CONV_KWARGS
    }

    fn layer_kwargs(&self, in_shape: &[usize]) -> Result<LayerArgs, NodeError> {
        let mut kwargs = mono::collect_kwargs(self.core().config(), self.kwargs_table())?;
        kwargs.insert("in_channels", in_shape[1]);
        Ok(kwargs)
    }
}

impl Replicate for Conv {
    fn respawn(&self, config: NodeConfig) -> Result<Self, NodeError> {
        Self::from_config(self.core().context(), self.name().to_string(), config)
    }

    fn varied_param(&self) -> Option<&'static str> {
        Some("c")
    }
}
