/*
 * @Author       : 老董
 * @Date         : 2026-02-05
 * @Description  : 包装任意无状态变换的节点：没有可学习参数，构建只做设备迁移与状态转移
 */

use std::fmt;
use std::rc::Rc;

use super::replicate::Replicate;
use super::{Context, Node, NodeConfig, NodeCore, NodeError};
use crate::tensor::Tensor;

type Transform = Rc<dyn Fn(&Tensor) -> Tensor>;

/// 任意函数节点
///
/// 名称取自被包装函数自身的名字；闭包没有名字，此时回退为`"Lambda"`。
///
/// # 使用示例
/// ```ignore
/// fn halve(x: &Tensor) -> Tensor { x.map(|v| v / 2.0) }
///
/// let node = Lambda::new(&ctx, halve);      // name() == "halve"
/// let node = Lambda::new(&ctx, |x| x.clone()); // name() == "Lambda"
/// ```
pub struct Lambda {
    node: NodeCore,
    func: Transform,
}

impl Lambda {
    pub fn new<F>(context: &Context, func: F) -> Self
    where
        F: Fn(&Tensor) -> Tensor + 'static,
    {
        let name = function_name::<F>().unwrap_or_else(|| "Lambda".to_string());
        Self::named(context, &name, func)
    }

    pub fn named<F>(context: &Context, name: &str, func: F) -> Self
    where
        F: Fn(&Tensor) -> Tensor + 'static,
    {
        Self {
            node: NodeCore::new(context, name.to_string(), NodeConfig::default()),
            func: Rc::new(func),
        }
    }
}

/// 取函数项的名字：`crate::module::halve` -> `halve`；闭包返回 None
pub fn function_name<F: ?Sized>() -> Option<String> {
    let path = std::any::type_name::<F>();
    // 闭包、函数指针、引用与trait对象都没有可用的函数名
    let anonymous = ["&", "dyn ", "fn(", "for<", "Box<", "std::boxed::", "alloc::"];
    if path.contains("{{closure}}") || anonymous.iter().any(|prefix| path.starts_with(prefix)) {
        return None;
    }
    let path = path.split('<').next().unwrap_or(path);
    path.rsplit("::")
        .next()
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}

impl Node for Lambda {
    fn core(&self) -> &NodeCore {
        &self.node
    }

    fn core_mut(&mut self) -> &mut NodeCore {
        &mut self.node
    }

    fn build(&mut self, _x: &Tensor) -> Result<(), NodeError> {
        self.finish_build();
        Ok(())
    }

    fn forward(&mut self, x: &Tensor) -> Result<Tensor, NodeError> {
        self.ensure_built(x)?;
        Ok((self.func)(x))
    }
}

impl Replicate for Lambda {
    fn respawn(&self, _config: NodeConfig) -> Result<Self, NodeError> {
        Ok(Self {
            node: NodeCore::new(
                self.core().context(),
                self.name().to_string(),
                NodeConfig::default(),
            ),
            func: Rc::clone(&self.func),
        })
    }
}

impl fmt::Debug for Lambda {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lambda")
            .field("name", &self.name())
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
