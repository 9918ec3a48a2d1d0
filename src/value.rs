//! 动态值模型
//!
//! 容器按名称解析依赖，绑定的定义与解析结果都用 [`Value`] 表示。
//! 标量按值比较，对象、函数、容器和宿主对象按身份比较。

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::container::Container;
use crate::function::Function;

/// 按名称传入的显式参数
pub type Args = HashMap<String, Value>;

/// 构造 [`Args`]
///
/// ```
/// let args = ioc::args! { "message" => "hello", "retries" => 3 };
/// assert_eq!(args.len(), 2);
/// ```
#[macro_export]
macro_rules! args {
    () => {
        $crate::Args::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut args = $crate::Args::new();
        $(
            args.insert(::std::string::String::from($key), $crate::Value::from($value));
        )+
        args
    }};
}

/// 容器中流转的值
#[derive(Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    Str(String),
    List(Vec<Value>),
    Object(Object),
    Function(Function),
    Container(Container),
    /// 宿主对象，按 `Arc` 身份比较
    Opaque(Arc<dyn Any + Send + Sync>),
}

impl Value {
    /// 包装任意宿主对象
    pub fn opaque<T: Any + Send + Sync>(value: T) -> Self {
        Value::Opaque(Arc::new(value))
    }

    /// 取回宿主对象
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        match self {
            Value::Opaque(any) => any.clone().downcast::<T>().ok(),
            _ => None,
        }
    }

    /// 值的种类名称（用于错误信息）
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::Str(_) => "string",
            Value::List(_) => "list",
            Value::Object(_) => "object",
            Value::Function(_) => "function",
            Value::Container(_) => "container",
            Value::Opaque(_) => "opaque",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&Function> {
        match self {
            Value::Function(func) => Some(func),
            _ => None,
        }
    }

    pub fn as_container(&self) -> Option<&Container> {
        match self {
            Value::Container(container) => Some(container),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, Value::Function(_))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            (Value::Function(a), Value::Function(b)) => a.ptr_eq(b),
            (Value::Container(a), Value::Container(b)) => a.ptr_eq(b),
            (Value::Opaque(a), Value::Opaque(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "Null"),
            Value::Bool(b) => write!(f, "Bool({})", b),
            Value::Number(n) => write!(f, "Number({})", n),
            Value::Str(s) => write!(f, "Str({:?})", s),
            Value::List(items) => f.debug_tuple("List").field(items).finish(),
            Value::Object(obj) => fmt::Debug::fmt(obj, f),
            Value::Function(func) => fmt::Debug::fmt(func, f),
            Value::Container(container) => fmt::Debug::fmt(container, f),
            Value::Opaque(_) => write!(f, "Opaque(..)"),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Number(f64::from(value))
    }
}

impl From<Object> for Value {
    fn from(value: Object) -> Self {
        Value::Object(value)
    }
}

impl From<Function> for Value {
    fn from(value: Function) -> Self {
        Value::Function(value)
    }
}

impl From<Container> for Value {
    fn from(value: Container) -> Self {
        Value::Container(value)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(values: Vec<T>) -> Self {
        Value::List(values.into_iter().map(Into::into).collect())
    }
}

/// 共享的可变对象
///
/// 成员按插入顺序保存。克隆得到的是同一个对象的另一个句柄。
#[derive(Clone)]
pub struct Object {
    inner: Arc<ObjectInner>,
}

struct ObjectInner {
    class: String,
    members: RwLock<Vec<(String, Value)>>,
}

impl Object {
    pub fn new(class: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(ObjectInner {
                class: class.into(),
                members: RwLock::new(Vec::new()),
            }),
        }
    }

    /// 由成员列表构造对象，同名成员以后者为准
    pub fn from_members<K, V>(class: impl Into<String>, members: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        let obj = Self::new(class);
        for (name, value) in members {
            obj.set(name, value);
        }
        obj
    }

    pub fn class(&self) -> &str {
        &self.inner.class
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.inner
            .members
            .read()
            .iter()
            .find(|(member, _)| member == name)
            .map(|(_, value)| value.clone())
    }

    pub fn set(&self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        let mut members = self.inner.members.write();
        match members.iter_mut().find(|(member, _)| *member == name) {
            Some(slot) => slot.1 = value,
            None => members.push((name, value)),
        }
    }

    pub fn has(&self, name: &str) -> bool {
        self.inner.members.read().iter().any(|(member, _)| member == name)
    }

    /// 名为 `name` 的可调用成员
    pub fn method(&self, name: &str) -> Option<Function> {
        match self.get(name) {
            Some(Value::Function(func)) => Some(func),
            _ => None,
        }
    }

    /// 成员快照（按插入顺序）
    pub fn fields(&self) -> Vec<(String, Value)> {
        self.inner.members.read().clone()
    }

    pub fn ptr_eq(&self, other: &Object) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // 只打印成员名，避免自引用对象无限展开
        let names: Vec<String> = self.inner.members.read().iter().map(|(name, _)| name.clone()).collect();
        f.debug_struct("Object")
            .field("class", &self.inner.class)
            .field("members", &names)
            .finish()
    }
}
