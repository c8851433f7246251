/*
 * @Author       : 老董
 * @Date         : 2026-02-03
 * @Description  : 运行上下文（用户级 API）
 *
 * 取代“全局构建锁 + 全局活动设备”这类进程级单例：
 * 上下文在节点构造时传入，节点构建、前向时从中读取设备与构建锁。
 */

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use super::runtime::{CpuRuntime, Runtime};

/// 计算设备描述符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Device {
    #[default]
    Cpu,
    Cuda(usize),
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cpu => write!(f, "cpu"),
            Self::Cuda(index) => write!(f, "cuda:{index}"),
        }
    }
}

struct ContextInner {
    device: Cell<Device>,
    build_lock: Cell<bool>,
    grad_enabled: Cell<bool>,
    runtime: Box<dyn Runtime>,
}

/// Context - 运行上下文句柄
///
/// # 设计原则
/// - 是 `Rc<ContextInner>` 的薄封装
/// - Clone 语义：多个 Context 引用同一份状态，节点各自持有一份句柄
/// - 单线程使用：构建锁只是调试用的开关，不提供任何并发保护
#[derive(Clone)]
pub struct Context {
    inner: Rc<ContextInner>,
}

impl Context {
    // ==================== 创建 ====================

    /// 使用 CPU 参考运行时创建上下文
    pub fn new() -> Self {
        Self::with_runtime(CpuRuntime::new())
    }

    /// 创建带种子的上下文（权重初始化与形状探测用的随机输入均可复现）
    pub fn new_with_seed(seed: u64) -> Self {
        Self::with_runtime(CpuRuntime::new_with_seed(seed))
    }

    /// 使用自定义运行时创建上下文
    pub fn with_runtime<R: Runtime + 'static>(runtime: R) -> Self {
        Self {
            inner: Rc::new(ContextInner {
                device: Cell::new(Device::default()),
                build_lock: Cell::new(true),
                grad_enabled: Cell::new(true),
                runtime: Box::new(runtime),
            }),
        }
    }

    // ==================== 设备 ====================

    /// 当前活动设备，节点在构建时会被迁移到该设备
    pub fn device(&self) -> Device {
        self.inner.device.get()
    }

    pub fn set_device(&self, device: Device) {
        self.inner.device.set(device);
    }

    // ==================== 构建锁 ====================

    /// 构建锁开启时（默认），节点至多构建一次
    pub fn build_lock(&self) -> bool {
        self.inner.build_lock.get()
    }

    /// 关闭构建锁后，每次前向都会重新构建节点（其层会被重置），仅用于调试
    pub fn set_build_lock(&self, enabled: bool) {
        self.inner.build_lock.set(enabled);
    }

    // ==================== 梯度模式 ====================

    pub fn is_grad_enabled(&self) -> bool {
        self.inner.grad_enabled.get()
    }

    /// 在 no_grad 上下文中执行闭包，结束后恢复之前的梯度模式
    pub fn no_grad_scope<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let was_enabled = self.is_grad_enabled();
        self.inner.grad_enabled.set(false);
        let result = f();
        self.inner.grad_enabled.set(was_enabled);
        result
    }

    // ==================== 运行时 ====================

    pub fn runtime(&self) -> &dyn Runtime {
        self.inner.runtime.as_ref()
    }

    /// 两个句柄是否指向同一个上下文
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("device", &self.device())
            .field("build_lock", &self.build_lock())
            .field("grad_enabled", &self.is_grad_enabled())
            .finish_non_exhaustive()
    }
}
