//! 可调用定义
//!
//! 函数显式声明自己的调用约定：
//! - 值工厂：返回值就是调用结果
//! - 接收者构造：填充容器提供的新实例，调用结果就是该实例
//!
//! 参数名随函数一起声明，默认的 [`crate::reflect::DeclaredParameters`] 直接读取它们。

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::error::{ContainerError, Result};
use crate::value::{Object, Value};

type FactoryBody = dyn Fn(Arguments) -> anyhow::Result<Value> + Send + Sync;
type ReceiverBody = dyn Fn(&Object, Arguments) -> anyhow::Result<()> + Send + Sync;

/// 调用约定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionKind {
    /// 值工厂
    Factory,
    /// 接收者构造（构造函数或 setter 方法）
    Receiver,
}

#[derive(Clone)]
enum Body {
    Factory(Arc<FactoryBody>),
    Receiver(Arc<ReceiverBody>),
}

/// 容器可调用的函数
#[derive(Clone)]
pub struct Function {
    inner: Arc<FunctionInner>,
}

#[derive(Clone)]
struct FunctionInner {
    name: String,
    params: Vec<String>,
    body: Body,
    methods: Vec<(String, Function)>,
}

fn collect_params<P>(params: P) -> Vec<String>
where
    P: IntoIterator,
    P::Item: Into<String>,
{
    params.into_iter().map(Into::into).collect()
}

impl Function {
    /// 值工厂
    pub fn factory<N, P, F>(name: N, params: P, body: F) -> Self
    where
        N: Into<String>,
        P: IntoIterator,
        P::Item: Into<String>,
        F: Fn(Arguments) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        Self::from_parts(name.into(), collect_params(params), Body::Factory(Arc::new(body)))
    }

    /// 没有声明参数的值工厂
    pub fn native<N, F>(name: N, body: F) -> Self
    where
        N: Into<String>,
        F: Fn() -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        Self::from_parts(name.into(), Vec::new(), Body::Factory(Arc::new(move |_: Arguments| body())))
    }

    /// 接收者构造：函数体填充新实例，调用结果为该实例
    pub fn constructor<N, P, F>(name: N, params: P, body: F) -> Self
    where
        N: Into<String>,
        P: IntoIterator,
        P::Item: Into<String>,
        F: Fn(&Object, Arguments) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self::from_parts(name.into(), collect_params(params), Body::Receiver(Arc::new(body)))
    }

    /// 对象方法，通常作为 setter 注入的目标
    pub fn method<N, P, F>(name: N, params: P, body: F) -> Self
    where
        N: Into<String>,
        P: IntoIterator,
        P::Item: Into<String>,
        F: Fn(&Object, Arguments) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self::constructor(name, params, body)
    }

    fn from_parts(name: String, params: Vec<String>, body: Body) -> Self {
        Self {
            inner: Arc::new(FunctionInner {
                name,
                params,
                body,
                methods: Vec::new(),
            }),
        }
    }

    /// 附加原型成员，新实例创建时安装
    pub fn with_method(mut self, name: impl Into<String>, method: Function) -> Self {
        Arc::make_mut(&mut self.inner).methods.push((name.into(), method));
        self
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// 声明的参数名（按声明顺序）
    pub fn params(&self) -> &[String] {
        &self.inner.params
    }

    pub fn kind(&self) -> FunctionKind {
        match self.inner.body {
            Body::Factory(_) => FunctionKind::Factory,
            Body::Receiver(_) => FunctionKind::Receiver,
        }
    }

    /// 创建绑定到该函数的新实例
    pub fn instantiate(&self) -> Object {
        let instance = Object::new(self.inner.name.clone());
        for (name, method) in &self.inner.methods {
            instance.set(name.clone(), method.clone());
        }
        instance
    }

    /// 以 `receiver` 为接收者执行函数体
    pub fn apply(&self, receiver: &Object, args: Arguments) -> Result<Value> {
        let outcome = match &self.inner.body {
            Body::Factory(body) => body(args),
            Body::Receiver(body) => body(receiver, args).map(|()| Value::Object(receiver.clone())),
        };
        outcome.map_err(|source| ContainerError::Invocation {
            function: self.inner.name.clone(),
            source,
        })
    }

    pub fn ptr_eq(&self, other: &Function) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.inner.name)
            .field("params", &self.inner.params)
            .field("kind", &self.kind())
            .finish()
    }
}

/// 已解析的位置参数
///
/// 未能解析的位置为 `None`。
#[derive(Debug, Clone, Default)]
pub struct Arguments {
    values: Vec<Option<Value>>,
}

impl Arguments {
    pub fn new(values: Vec<Option<Value>>) -> Self {
        Self { values }
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index).and_then(Option::as_ref)
    }

    /// 取值，缺失时为 `Value::Null`
    pub fn value(&self, index: usize) -> Value {
        self.get(index).cloned().unwrap_or(Value::Null)
    }

    pub fn str(&self, index: usize) -> Option<&str> {
        self.get(index).and_then(Value::as_str)
    }

    pub fn object(&self, index: usize) -> Option<Object> {
        self.get(index).and_then(Value::as_object).cloned()
    }

    pub fn downcast<T: Any + Send + Sync>(&self, index: usize) -> Option<Arc<T>> {
        self.get(index).and_then(Value::downcast::<T>)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn into_vec(self) -> Vec<Option<Value>> {
        self.values
    }
}

impl From<Vec<Option<Value>>> for Arguments {
    fn from(values: Vec<Option<Value>>) -> Self {
        Self::new(values)
    }
}
