//! 绑定及其解析状态

use std::sync::atomic::{AtomicU64, Ordering};

use crate::function::Function;
use crate::value::Value;

static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

fn next_generation() -> u64 {
    NEXT_GENERATION.fetch_add(1, Ordering::Relaxed)
}

/// 绑定的解析状态
///
/// `Unresolved → Loaded → Realized`，只会向前推进。
#[derive(Debug, Clone)]
pub enum BindingState {
    /// 尚未加载的模块标识
    Unresolved(String),
    /// 已加载（或注册时直接给出）的定义
    Loaded(Value),
    /// 单例工厂的调用结果
    Realized(Value),
    /// 容器自身，查询时才生成句柄
    Owner,
}

/// 一个键的定义与标记
#[derive(Debug, Clone)]
pub struct Binding {
    pub state: BindingState,
    pub singleton: bool,
    pub intact: bool,
    /// 每次注册唯一；解析结果只写回同一代绑定
    pub generation: u64,
}

impl Binding {
    /// 按注册规则创建绑定：非 intact 的字符串定义是待加载的模块标识
    pub fn new(definition: Value, singleton: bool, intact: bool) -> Self {
        let state = match definition {
            Value::Str(module) if !intact => BindingState::Unresolved(module),
            other => BindingState::Loaded(other),
        };
        Self {
            state,
            singleton,
            intact,
            generation: next_generation(),
        }
    }

    /// 容器自引用绑定
    pub fn owner() -> Self {
        Self {
            state: BindingState::Owner,
            singleton: true,
            intact: true,
            generation: next_generation(),
        }
    }

    /// 记录模块加载结果；绑定已被重新注册时不写回
    pub fn mark_loaded(&mut self, generation: u64, value: Value) -> bool {
        if self.generation != generation || !matches!(self.state, BindingState::Unresolved(_)) {
            return false;
        }
        self.state = BindingState::Loaded(value);
        true
    }

    /// 记录单例的调用结果，此后不再调用；绑定已被重新注册时不写回
    pub fn realize(&mut self, generation: u64, value: Value) -> bool {
        if self.generation != generation {
            return false;
        }
        self.state = BindingState::Realized(value);
        self.intact = true;
        true
    }

    /// `get` 需要执行的工厂：非 intact 绑定的函数定义
    pub fn invocable(&self, definition: &Value) -> Option<Function> {
        match definition {
            Value::Function(func) if !self.intact => Some(func.clone()),
            _ => None,
        }
    }
}
