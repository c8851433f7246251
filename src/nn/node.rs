/*
 * @Author       : 老董
 * @Date         : 2026-02-04
 * @Description  : 惰性构建、形状推断的节点基类契约
 *
 * 状态机只有一条边：Unbuilt → Built。
 * 构建锁开启时，该转移至多发生一次；之后的前向只复用已构建的层。
 */

use enum_dispatch::enum_dispatch;
use std::fmt;

use super::runtime::Layer;
use super::{Context, NodeConfig, NodeError};
use crate::tensor::Tensor;

/// 节点的构建状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuildState {
    #[default]
    Unbuilt,
    Built,
}

impl fmt::Display for BuildState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unbuilt => write!(f, "未构建"),
            Self::Built => write!(f, "已构建"),
        }
    }
}

/// 所有节点共有的状态：名称、捕获的参数、构建状态、上下文句柄
#[derive(Debug, Clone)]
pub struct NodeCore {
    name: String,
    /// 构造时捕获的原始参数（复制节点时使用）
    captured: NodeConfig,
    /// 当前参数：构建时推导出的值会覆盖到这里（用于汇报/摘要）
    config: NodeConfig,
    state: BuildState,
    build_count: usize,
    context: Context,
}

impl NodeCore {
    pub fn new(context: &Context, name: String, config: NodeConfig) -> Self {
        Self {
            name,
            captured: config.clone(),
            config,
            state: BuildState::Unbuilt,
            build_count: 0,
            context: context.clone(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn captured(&self) -> &NodeConfig {
        &self.captured
    }

    /// 同时改写原始参数与当前参数（按列表复制时固定本节点的那个参数）
    pub(crate) fn pin(
        &mut self,
        key: &str,
        value: impl Into<super::Value> + Clone,
    ) -> Result<(), NodeError> {
        self.captured.set(key, value.clone())?;
        self.config.set(key, value)
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut NodeConfig {
        &mut self.config
    }

    pub const fn state(&self) -> BuildState {
        self.state
    }

    /// 已执行过的构建次数（构建锁开启时至多为1）
    pub const fn build_count(&self) -> usize {
        self.build_count
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    fn mark_built(&mut self) {
        self.state = BuildState::Built;
        self.build_count += 1;
    }
}

/// 节点 trait
///
/// # 设计原则
/// - 构造时只捕获参数，不知道输入形状
/// - 首次 `forward()` 以真实输入触发 `build()`，由输入形状解析出具体的层参数
/// - `build()` 的每个实现都必须在最后调用 `finish_build()`（迁移设备 + 状态转移）
/// - 参数枚举只在 `Built` 状态下有效
#[enum_dispatch]
pub trait Node {
    fn core(&self) -> &NodeCore;

    fn core_mut(&mut self) -> &mut NodeCore;

    /// 节点持有的具体层（Lambda 等无层节点返回 None）
    fn layer(&self) -> Option<&dyn Layer> {
        None
    }

    fn layer_mut(&mut self) -> Option<&mut (dyn Layer + 'static)> {
        None
    }

    /// 由输入解析具体参数并实例化层；实现须以 `finish_build()` 收尾
    fn build(&mut self, x: &Tensor) -> Result<(), NodeError>;

    fn forward(&mut self, x: &Tensor) -> Result<Tensor, NodeError>;

    // ========== 基类行为 ==========

    fn name(&self) -> &str {
        self.core().name()
    }

    fn state(&self) -> BuildState {
        self.core().state()
    }

    fn is_built(&self) -> bool {
        self.core().state() == BuildState::Built
    }

    /// 当前参数的可读形式：`key=value, key=value, ...`
    fn get_args(&self) -> String {
        self.core().config().render()
    }

    /// 基类的构建：把节点迁移到上下文的活动设备，并转移到 `Built` 状态
    fn finish_build(&mut self) {
        let device = self.core().context().device();
        if let Some(layer) = self.layer_mut() {
            layer.to_device(device);
        }
        self.core_mut().mark_built();
        log::debug!(
            "节点{}已构建（第{}次，设备{}）：{}",
            self.name(),
            self.core().build_count(),
            device,
            self.get_args()
        );
    }

    /// 前向的公共前半段：未构建、或构建锁关闭时先构建
    fn ensure_built(&mut self, x: &Tensor) -> Result<(), NodeError> {
        let locked = self.core().context().build_lock();
        if !locked {
            log::warn!("构建锁已关闭，节点{}可能被悄无声息地重新构建", self.name());
        }
        if !self.is_built() || !locked {
            self.build(x)?;
        }
        Ok(())
    }

    fn check_parameters_readable(&self) -> Result<(), NodeError> {
        if !self.is_built() {
            return Err(NodeError::NodeNotBuilt(self.name().to_string()));
        }
        if !self.core().context().build_lock() {
            log::warn!("构建锁已关闭，节点{}的参数可能随重新构建而变化", self.name());
        }
        Ok(())
    }

    fn parameters(&self) -> Result<Vec<&Tensor>, NodeError> {
        Ok(self
            .named_parameters()?
            .into_iter()
            .map(|(_, tensor)| tensor)
            .collect())
    }

    /// 参数名形如 `weight`、`bias`
    fn named_parameters(&self) -> Result<Vec<(String, &Tensor)>, NodeError> {
        self.check_parameters_readable()?;
        Ok(self
            .layer()
            .map(|layer| {
                layer
                    .named_parameters()
                    .into_iter()
                    .map(|(name, tensor)| (name.to_string(), tensor))
                    .collect()
            })
            .unwrap_or_default())
    }

    /// 参数的标量总数
    fn num_params(&self) -> Result<usize, NodeError> {
        Ok(self.parameters()?.iter().map(|t| t.size()).sum())
    }

    /// 以给定形状的随机输入在 no_grad 下跑一次前向，返回输出形状。
    ///
    /// 注意：若节点尚未构建，此调用会把节点永久绑定到该输入形状。
    fn get_output_shape(&mut self, shape: &[usize]) -> Result<Vec<usize>, NodeError> {
        let context = self.core().context().clone();
        let x = context.runtime().randn(shape);
        context.no_grad_scope(|| self.forward(&x).map(|y| y.shape().to_vec()))
    }
}
