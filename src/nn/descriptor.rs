/*
 * @Author       : 老董
 * @Date         : 2025-12-27
 * @Description  : 模型描述符（Model Descriptor）
 *                 顺序模型的可序列化中间表示，用于摘要输出、持久化与调试
 */

use serde::{Deserialize, Serialize};

/// 模型的可序列化描述
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    /// 格式版本（用于向后兼容）
    pub version: String,
    /// 探测时使用的输入形状
    pub input_shape: Vec<usize>,
    /// 按执行顺序排列的节点描述
    pub nodes: Vec<NodeDescriptor>,
}

/// 节点描述
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeDescriptor {
    pub name: String,
    /// 节点种类：Conv / Linear / Lambda
    pub kind: String,
    pub output_shape: Vec<usize>,
    /// 参数数量（无参数的节点为 None）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub param_count: Option<usize>,
    /// 构建后的当前参数（`key=value, ...`）
    pub args: String,
}

impl ModelDescriptor {
    pub fn new(input_shape: Vec<usize>) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            input_shape,
            nodes: Vec::new(),
        }
    }

    pub fn add_node(&mut self, node: NodeDescriptor) {
        self.nodes.push(node);
    }

    /// 获取总参数量
    pub fn total_params(&self) -> usize {
        self.nodes.iter().filter_map(|n| n.param_count).sum()
    }

    /// 最后一个节点的输出形状（空模型时为输入形状）
    pub fn output_shape(&self) -> &[usize] {
        self.nodes
            .last()
            .map_or(&self.input_shape, |node| &node.output_shape)
    }

    /// 转换为 JSON 字符串
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// 从 JSON 字符串解析
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl NodeDescriptor {
    pub fn new(
        name: &str,
        kind: &str,
        output_shape: Vec<usize>,
        param_count: usize,
        args: String,
    ) -> Self {
        Self {
            name: name.to_string(),
            kind: kind.to_string(),
            output_shape,
            param_count: (param_count > 0).then_some(param_count),
            args,
        }
    }
}
