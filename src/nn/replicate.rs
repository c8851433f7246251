/*
 * @Author       : 老董
 * @Date         : 2026-02-06
 * @Description  : 节点复制：生成共享配置（按值）的兄弟节点
 *
 * - `node * 3`            → [node, 副本, 副本]，副本以原始捕获参数新建，各自独立构建
 * - `node * &[32, 64, 128]` → 本节点的可变参数固定为32，其余取值各生成一个兄弟节点
 *
 * 复制总是使用构造时捕获的原始参数，而非构建后被推导值覆盖的当前参数。
 */

use std::ops::Mul;

use super::{Conv, Lambda, Linear, Node, NodeConfig, NodeError, Value};

/// 可复制的节点
pub trait Replicate: Node + Sized {
    /// 以给定参数新建同名、同类、未构建的节点
    fn respawn(&self, config: NodeConfig) -> Result<Self, NodeError>;

    /// 按列表复制时逐个改写的参数名；不支持按列表复制时为 None
    fn varied_param(&self) -> Option<&'static str> {
        None
    }

    /// 以原始捕获参数新建`count`个兄弟节点
    fn siblings(&self, count: usize) -> Result<Vec<Self>, NodeError> {
        (0..count)
            .map(|_| self.respawn(self.core().captured().clone()))
            .collect()
    }

    /// 按列表复制：把本节点的可变参数固定为`values[0]`，并为其余每个取值新建一个兄弟节点。
    /// 节点类型不支持时返回 `Ok(None)`，本节点保持不变。
    fn siblings_over(&mut self, values: &[usize]) -> Result<Option<Vec<Self>>, NodeError> {
        let Some(key) = self.varied_param() else {
            return Ok(None);
        };
        let (&first, rest) = values
            .split_first()
            .ok_or_else(|| NodeError::config("按列表复制节点时列表不能为空"))?;

        self.core_mut().pin(key, Value::from(first))?;
        rest.iter()
            .map(|&value| {
                let mut config = self.core().captured().clone();
                config.set(key, value)?;
                self.respawn(config)
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Some)
    }

    /// 整数复制：本节点 + `n - 1`个兄弟节点
    fn replicate(self, n: usize) -> Result<Vec<Self>, NodeError> {
        if n == 0 {
            return Err(NodeError::config("复制份数须至少为1"));
        }
        let siblings = self.siblings(n - 1)?;
        Ok(std::iter::once(self).chain(siblings).collect())
    }
}

macro_rules! impl_mul_by_count {
    ($($node:ty),+) => {
        $(
            impl Mul<usize> for $node {
                type Output = Result<Vec<$node>, NodeError>;

                fn mul(self, n: usize) -> Self::Output {
                    self.replicate(n)
                }
            }
        )+
    };
}

macro_rules! impl_mul_by_list {
    ($($node:ty),+) => {
        $(
            impl Mul<&[usize]> for $node {
                type Output = Result<Vec<$node>, NodeError>;

                fn mul(mut self, values: &[usize]) -> Self::Output {
                    let siblings = self.siblings_over(values)?.unwrap_or_default();
                    Ok(std::iter::once(self).chain(siblings).collect())
                }
            }

            impl<const N: usize> Mul<[usize; N]> for $node {
                type Output = Result<Vec<$node>, NodeError>;

                fn mul(self, values: [usize; N]) -> Self::Output {
                    self * &values[..]
                }
            }
        )+
    };
}

impl_mul_by_count!(Conv, Linear, Lambda);
// Lambda 没有可按列表改写的参数，不提供列表复制
impl_mul_by_list!(Conv, Linear);
