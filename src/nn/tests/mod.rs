/*
 * @Author       : 老董
 * @Date         : 2026-02-06
 * @Description  : 节点系统的单元测试公共设施：日志初始化、计数运行时
 */

mod activation;
mod conv;
mod lambda;

use std::cell::Cell;
use std::rc::Rc;

use crate::nn::runtime::{CpuRuntime, Layer, LayerSpec, Runtime};
use crate::nn::{Context, NodeError};
use crate::tensor::Tensor;

/// 初始化测试日志（重复调用无副作用）
pub(super) fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// 带固定种子的上下文
pub(super) fn seeded_context() -> Context {
    init_logger();
    Context::new_with_seed(42)
}

/// 统计层实例化与上采样次数的运行时，数值计算委托给 CPU 运行时
pub(super) struct CountingRuntime {
    inner: CpuRuntime,
    created: Rc<Cell<usize>>,
    upsampled: Rc<Cell<usize>>,
}

/// 计数运行时的观察端
#[derive(Clone, Default)]
pub(super) struct Counters {
    created: Rc<Cell<usize>>,
    upsampled: Rc<Cell<usize>>,
}

impl Counters {
    pub(super) fn created(&self) -> usize {
        self.created.get()
    }

    pub(super) fn upsampled(&self) -> usize {
        self.upsampled.get()
    }
}

/// 返回使用计数运行时的上下文，以及对应的计数器
pub(super) fn counting_context() -> (Context, Counters) {
    init_logger();
    let counters = Counters::default();
    let runtime = CountingRuntime {
        inner: CpuRuntime::new_with_seed(7),
        created: Rc::clone(&counters.created),
        upsampled: Rc::clone(&counters.upsampled),
    };
    (Context::with_runtime(runtime), counters)
}

impl Runtime for CountingRuntime {
    fn create_layer(&self, spec: &LayerSpec) -> Result<Box<dyn Layer>, NodeError> {
        self.created.set(self.created.get() + 1);
        self.inner.create_layer(spec)
    }

    fn upsample(&self, x: &Tensor, factor: usize) -> Result<Tensor, NodeError> {
        self.upsampled.set(self.upsampled.get() + 1);
        self.inner.upsample(x, factor)
    }

    fn randn(&self, shape: &[usize]) -> Tensor {
        self.inner.randn(shape)
    }
}
