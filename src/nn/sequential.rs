/*
 * @Author       : 老董
 * @Date         : 2026-02-06
 * @Description  : 顺序容器：按顺序串联任意种类的节点，并支持按名称查找
 */

use enum_dispatch::enum_dispatch;

use super::descriptor::{ModelDescriptor, NodeDescriptor};
use super::runtime::Layer;
use super::{BuildState, Conv, Lambda, Linear, Node, NodeCore, NodeError};
use crate::tensor::Tensor;

/// 任意种类的节点（封闭集合）
#[enum_dispatch(Node)]
pub enum AnyNode {
    Conv(Conv),
    Linear(Linear),
    Lambda(Lambda),
}

impl AnyNode {
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Conv(_) => "Conv",
            Self::Linear(_) => "Linear",
            Self::Lambda(_) => "Lambda",
        }
    }
}

/// 摘要选项
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SummaryOptions {
    /// 输出形状是否保留批维
    pub batch: bool,
}

/// 顺序容器
///
/// # 使用示例
/// ```ignore
/// let mut model = Sequential::new();
/// model.extend((Conv::new(&ctx, args![])? * [32, 64, 128])?);
/// model.push(Linear::new(&ctx, args![10, act = None::<&str>])?);
/// let y = model.forward(&x)?;
/// ```
#[derive(Default)]
pub struct Sequential {
    nodes: Vec<AnyNode>,
}

impl Sequential {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, node: impl Into<AnyNode>) -> &mut Self {
        self.nodes.push(node.into());
        self
    }

    pub fn extend<N: Into<AnyNode>>(&mut self, nodes: impl IntoIterator<Item = N>) -> &mut Self {
        self.nodes.extend(nodes.into_iter().map(Into::into));
        self
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[AnyNode] {
        &self.nodes
    }

    pub fn nodes_mut(&mut self) -> &mut [AnyNode] {
        &mut self.nodes
    }

    /// 按顺序前向；未构建的节点在此依次完成构建
    pub fn forward(&mut self, x: &Tensor) -> Result<Tensor, NodeError> {
        self.nodes
            .iter_mut()
            .try_fold(x.clone(), |x, node| node.forward(&x))
    }

    fn position(&self, name: &str) -> Result<usize, NodeError> {
        let matches: Vec<usize> = self
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.name() == name)
            .map(|(index, _)| index)
            .collect();
        match matches.as_slice() {
            [] => Err(NodeError::NameNotFound(name.to_string())),
            [index] => Ok(*index),
            _ => Err(NodeError::AmbiguousName {
                name: name.to_string(),
                count: matches.len(),
            }),
        }
    }

    /// 按名称查找唯一的节点；复制出的兄弟节点同名，此时会报 `AmbiguousName`
    pub fn get(&self, name: &str) -> Result<&AnyNode, NodeError> {
        let index = self.position(name)?;
        Ok(&self.nodes[index])
    }

    pub fn get_mut(&mut self, name: &str) -> Result<&mut AnyNode, NodeError> {
        let index = self.position(name)?;
        Ok(&mut self.nodes[index])
    }

    /// 全部节点的参数；任一节点尚未构建即报 `NodeNotBuilt`
    pub fn parameters(&self) -> Result<Vec<&Tensor>, NodeError> {
        self.nodes.iter().try_fold(Vec::new(), |mut params, node| {
            params.extend(node.parameters()?);
            Ok(params)
        })
    }

    /// 参数名形如 `0.weight`、`2.bias`（前缀为节点序号）
    pub fn named_parameters(&self) -> Result<Vec<(String, &Tensor)>, NodeError> {
        let mut params = Vec::new();
        for (index, node) in self.nodes.iter().enumerate() {
            params.extend(
                node.named_parameters()?
                    .into_iter()
                    .map(|(name, tensor)| (format!("{index}.{name}"), tensor)),
            );
        }
        Ok(params)
    }

    pub fn num_params(&self) -> Result<usize, NodeError> {
        Ok(self.parameters()?.iter().map(|t| t.size()).sum())
    }

    /// 以给定输入形状逐节点探测输出形状，生成模型描述（会触发未构建节点的构建）
    pub fn summarize(
        &mut self,
        input_shape: &[usize],
        options: SummaryOptions,
    ) -> Result<ModelDescriptor, NodeError> {
        let strip = |shape: &[usize]| -> Vec<usize> {
            if options.batch {
                shape.to_vec()
            } else {
                shape.iter().skip(1).copied().collect()
            }
        };

        let mut descriptor = ModelDescriptor::new(strip(input_shape));
        let Some(first) = self.nodes.first() else {
            return Ok(descriptor);
        };
        let mut x = first.core().context().runtime().randn(input_shape);

        for node in &mut self.nodes {
            // 各节点可能属于不同的上下文，按节点自己的上下文关闭梯度
            let context = node.core().context().clone();
            x = context.no_grad_scope(|| node.forward(&x))?;
            descriptor.add_node(NodeDescriptor::new(
                node.name(),
                node.kind(),
                strip(x.shape()),
                node.num_params()?,
                node.get_args(),
            ));
        }
        Ok(descriptor)
    }
}

impl FromIterator<AnyNode> for Sequential {
    fn from_iter<I: IntoIterator<Item = AnyNode>>(iter: I) -> Self {
        Self {
            nodes: iter.into_iter().collect(),
        }
    }
}
