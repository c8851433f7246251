/*
 * @Author       : 老董
 * @Date         : 2026-02-04
 * @Description  : 单层节点：恰好包装一个具体计算层 + 一个激活函数
 */

use super::runtime::{Layer, LayerArgs, LayerKind, LayerSpec};
use super::{Activation, Context, Node, NodeConfig, NodeCore, NodeError, ParamTable, Value};
use crate::tensor::Tensor;

/// 单层节点共有的状态
pub struct MonoCore {
    node: NodeCore,
    activation: Activation,
    layer: Option<Box<dyn Layer>>,
}

impl MonoCore {
    /// 激活函数在构造时即解析，未知名称立即报错
    pub fn new(context: &Context, name: String, config: NodeConfig) -> Result<Self, NodeError> {
        let activation = Activation::from_value(config.get("act").unwrap_or(&Value::None))?;
        Ok(Self {
            node: NodeCore::new(context, name, config),
            activation,
            layer: None,
        })
    }

    pub fn node(&self) -> &NodeCore {
        &self.node
    }

    pub fn node_mut(&mut self) -> &mut NodeCore {
        &mut self.node
    }

    pub const fn activation(&self) -> Activation {
        self.activation
    }

    pub fn layer(&self) -> Option<&dyn Layer> {
        self.layer.as_deref()
    }

    pub fn layer_mut(&mut self) -> Option<&mut (dyn Layer + 'static)> {
        self.layer.as_deref_mut()
    }
}

/// 单层节点声明的参数：默认激活为 ReLU
pub fn default_params() -> ParamTable {
    vec![("act", Value::from("relu"))]
}

/// 按“目标关键字 → 参数名”映射表，从当前参数中收集层构造关键字参数
pub fn collect_kwargs(
    config: &NodeConfig,
    table: &[(&'static str, &'static str)],
) -> Result<LayerArgs, NodeError> {
    let mut kwargs = LayerArgs::new();
    for &(target, key) in table {
        let value = config
            .get(key)
            .ok_or_else(|| NodeError::config(format!("未声明的参数`{key}`")))?;
        kwargs.insert(target, value.clone());
    }
    Ok(kwargs)
}

/// 单层节点 trait
///
/// 子类只需回答两件事：给定输入形状用哪种层（`find_layer`），
/// 以及层的构造参数取自哪些已捕获参数（`kwargs_table` / `layer_kwargs`）。
pub trait MonoNode: Node {
    fn mono(&self) -> &MonoCore;

    fn mono_mut(&mut self) -> &mut MonoCore;

    fn find_layer(&self, in_shape: &[usize]) -> Result<LayerKind, NodeError>;

    /// 目标关键字 → 捕获参数名
    fn kwargs_table(&self) -> &'static [(&'static str, &'static str)];

    fn layer_kwargs(&self, _in_shape: &[usize]) -> Result<LayerArgs, NodeError> {
        collect_kwargs(self.core().config(), self.kwargs_table())
    }

    /// 单层节点的构建：选层、收集参数、实例化，最后交给基类完成设备迁移与状态转移
    fn build_layer(&mut self, x: &Tensor) -> Result<(), NodeError> {
        let in_shape = x.shape();
        let kind = self.find_layer(in_shape)?;
        let kwargs = self.layer_kwargs(in_shape)?;
        let spec = LayerSpec::from_args(kind, &kwargs)?;
        log::debug!("节点{}以输入形状{:?}构建{}：{:?}", self.name(), in_shape, kind, spec);

        let layer = self.core().context().runtime().create_layer(&spec)?;
        self.mono_mut().layer = Some(layer);
        self.finish_build();
        Ok(())
    }

    /// 依次应用层与激活函数（调用前须已构建）
    fn activate_layer(&self, x: &Tensor) -> Result<Tensor, NodeError> {
        let layer = self
            .mono()
            .layer()
            .ok_or_else(|| NodeError::NodeNotBuilt(self.name().to_string()))?;
        Ok(self.mono().activation().apply(&layer.forward(x)?))
    }

    /// 单层节点的前向：确保已构建，再应用层与激活函数
    fn apply(&mut self, x: &Tensor) -> Result<Tensor, NodeError> {
        self.ensure_built(x)?;
        self.activate_layer(x)
    }
}
