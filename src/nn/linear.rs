/*
 * @Author       : 老董
 * @Date         : 2026-02-05
 * @Description  : 全连接节点：输入特征数由首个输入的形状推导
 *
 * - flat=true（默认）：先把除批维外的所有维度展平，in_features = 各非批维之积
 * - flat=false：作用于最后一维，in_features = 最后一维的长度
 */

use super::mono::{self, MonoCore, MonoNode};
use super::replicate::Replicate;
use super::runtime::{Layer, LayerArgs, LayerKind};
use super::{Args, Context, Node, NodeConfig, NodeCore, NodeError, ParamTable, Value};
use crate::tensor::Tensor;

/// 全连接节点
///
/// # 使用示例
/// ```ignore
/// let mut fc = Linear::new(&ctx, args![10, act = "sigmoid"])?;
/// let y = fc.forward(&x)?; // x: [4, 3, 8, 8] -> y: [4, 10]
/// ```
pub struct Linear {
    mono: MonoCore,
}

const LINEAR_KWARGS: &[(&str, &str)] = &[("out_features", "o"), ("bias", "b")];

impl Linear {
    /// 声明的参数（按位置参数的匹配顺序）：`o`输出特征、`b`偏置、`act`激活、`flat`是否展平
    pub fn default_params() -> ParamTable {
        let mut params = vec![("o", Value::None), ("b", Value::from(true))];
        params.extend(mono::default_params());
        params.push(("flat", Value::from(true)));
        params
    }

    pub fn new(context: &Context, args: Args) -> Result<Self, NodeError> {
        let (name, config) = NodeConfig::capture("Linear", Self::default_params(), args)?;
        Self::from_config(context, name, config)
    }

    fn from_config(context: &Context, name: String, config: NodeConfig) -> Result<Self, NodeError> {
        let linear = Self {
            mono: MonoCore::new(context, name, config)?,
        };
        linear.flat()?;
        linear.out_features()?;
        Ok(linear)
    }

    pub fn flat(&self) -> Result<bool, NodeError> {
        let flat = self.param("flat")?;
        flat.as_bool()
            .ok_or_else(|| NodeError::config(format!("flat须为布尔值，实际为`{flat}`")))
    }

    pub fn out_features(&self) -> Result<Option<usize>, NodeError> {
        match self.param("o")? {
            Value::None => Ok(None),
            o => o
                .as_usize()
                .map(Some)
                .ok_or_else(|| NodeError::config(format!("输出特征数须为非负整数，实际为`{o}`"))),
        }
    }

    /// 由输入形状推导的输入特征数
    pub fn in_features_for(&self, in_shape: &[usize]) -> Result<usize, NodeError> {
        if in_shape.len() < 2 {
            return Err(NodeError::config(format!(
                "全连接输入至少需要[batch, features]，实际形状为{in_shape:?}"
            )));
        }
        Ok(if self.flat()? {
            in_shape[1..].iter().product()
        } else {
            in_shape[in_shape.len() - 1]
        })
    }

    fn param(&self, key: &str) -> Result<&Value, NodeError> {
        self.core()
            .config()
            .get(key)
            .ok_or_else(|| NodeError::config(format!("未声明的参数`{key}`")))
    }
}

impl Node for Linear {
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
        self.build_layer(x)
    }

    fn forward(&mut self, x: &Tensor) -> Result<Tensor, NodeError> {
        if self.flat()? {
            let flattened = x.flatten_batch()?;
            self.apply(&flattened)
        } else {
            self.apply(x)
        }
    }
}

impl MonoNode for Linear {
    fn mono(&self) -> &MonoCore {
        &self.mono
    }

    fn mono_mut(&mut self) -> &mut MonoCore {
        &mut self.mono
    }

    fn find_layer(&self, _in_shape: &[usize]) -> Result<LayerKind, NodeError> {
        Ok(LayerKind::Linear)
    }

    fn kwargs_table(&self) -> &'static [(&'static str, &'static str)] {
        LINEAR_KWARGS
    }

    fn layer_kwargs(&self, in_shape: &[usize]) -> Result<LayerArgs, NodeError> {
        let mut kwargs = mono::collect_kwargs(self.core().config(), self.kwargs_table())?;
        kwargs.insert("in_features", self.in_features_for(in_shape)?);
        Ok(kwargs)
    }
}

impl Replicate for Linear {
    fn respawn(&self, config: NodeConfig) -> Result<Self, NodeError> {
        Self::from_config(self.core().context(), self.name().to_string(), config)
    }

    fn varied_param(&self) -> Option<&'static str> {
        Some("o")
    }
}
