/*
 * @Author       : 老董
 * @Date         : 2026-02-03
 * @Description  : 节点系统的错误类型
 */

use thiserror::Error;

use crate::errors::TensorError;

/// 节点操作错误类型
///
/// 以下错误都属于调用方违反契约，一律立即返回给调用方，内部既不重试也不吞掉。
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NodeError {
    /// 节点尚未构建就请求枚举参数
    #[error("节点{0}尚未构建")]
    NodeNotBuilt(String),

    /// 未知激活函数、不支持的padding模式、无法整除的缩放系数、不支持的输入阶数、参数捕获冲突等
    #[error("配置错误：{0}")]
    Configuration(String),

    /// 按名称查找时匹配到了多个条目
    #[error("名称`{name}`匹配到了{count}个条目")]
    AmbiguousName { name: String, count: usize },

    #[error("未找到名称为`{0}`的条目")]
    NameNotFound(String),

    #[error("形状不匹配（预期{expected:?}，实际{got:?}）：{message}")]
    ShapeMismatch {
        expected: Vec<usize>,
        got: Vec<usize>,
        message: String,
    },

    #[error(transparent)]
    Tensor(#[from] TensorError),
}

impl NodeError {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }
}
