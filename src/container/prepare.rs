//! 偏应用
//!
//! 预先从容器绑定函数的部分参数，其余位置在调用时按顺序由位置参数填充。

use super::Container;
use crate::error::Result;
use crate::function::{Arguments, Function};
use crate::value::Value;

/// 参数位置
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Slot {
    /// 调用时由位置参数填充
    Deferred,
    /// 总是从容器获取该键
    Bound(String),
}

impl Slot {
    fn parse(key: &str) -> Self {
        let key = key.trim();
        if key.is_empty() {
            Slot::Deferred
        } else {
            Slot::Bound(key.to_string())
        }
    }
}

/// 参数位置列表；空键表示延迟到调用时
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrepareKeys(pub Vec<Slot>);

impl From<&str> for PrepareKeys {
    /// 逗号分隔：`" ,console"` 表示第一个参数延迟、第二个绑定 `console`
    fn from(keys: &str) -> Self {
        Self(keys.split(',').map(Slot::parse).collect())
    }
}

impl From<&[&str]> for PrepareKeys {
    fn from(keys: &[&str]) -> Self {
        Self(keys.iter().map(|key| Slot::parse(key)).collect())
    }
}

impl From<Vec<&str>> for PrepareKeys {
    fn from(keys: Vec<&str>) -> Self {
        Self::from(keys.as_slice())
    }
}

impl From<Vec<String>> for PrepareKeys {
    fn from(keys: Vec<String>) -> Self {
        Self(keys.iter().map(|key| Slot::parse(key)).collect())
    }
}

/// 预先绑定了部分参数的函数
#[derive(Debug, Clone)]
pub struct Prepared {
    container: Container,
    func: Function,
    slots: Vec<Slot>,
}

impl Container {
    /// 按 `keys` 绑定 `func` 的参数
    pub fn prepare(&self, keys: impl Into<PrepareKeys>, func: &Function) -> Prepared {
        Prepared {
            container: self.clone(),
            func: func.clone(),
            slots: keys.into().0,
        }
    }

    /// 所有声明的参数都从容器获取
    pub fn prepare_fn(&self, func: &Function) -> Prepared {
        let keys = self.inner.reflector.parameter_names(func);
        self.prepare(keys, func)
    }
}

impl Prepared {
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn function(&self) -> &Function {
        &self.func
    }

    /// 调用：延迟位置按顺序消费 `positional`，绑定位置每次都重新解析
    ///
    /// 超出键列表的参数位置视为延迟；位置参数不足时该位置缺省。
    pub fn call<I>(&self, positional: I) -> Result<Value>
    where
        I: IntoIterator<Item = Value>,
    {
        let mut positional = positional.into_iter();
        let arity = self.container.inner.reflector.parameter_names(&self.func).len();

        let mut args = Vec::with_capacity(arity);
        for index in 0..arity {
            match self.slots.get(index) {
                Some(Slot::Bound(key)) => args.push(self.container.get(key)?),
                _ => args.push(positional.next()),
            }
        }

        let receiver = self.func.instantiate();
        self.func.apply(&receiver, Arguments::new(args))
    }

    /// 转为普通函数，便于再注册到容器中
    ///
    /// 得到的函数不声明参数，所有实参按位置传入。
    pub fn into_function(self, name: impl Into<String>) -> Function {
        Function::factory(name, Vec::<String>::new(), move |args| {
            let positional = args.into_vec().into_iter().map(|arg| arg.unwrap_or(Value::Null));
            self.call(positional).map_err(anyhow::Error::from)
        })
    }
}
