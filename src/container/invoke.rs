//! 调用、参数解析与 inflection（setter/属性注入）

use super::Container;
use crate::error::Result;
use crate::function::{Arguments, Function};
use crate::value::{Args, Object, Value};

impl Container {
    /// 调用可调用的值；其他值原样返回
    pub fn invoke(&self, target: &Value, args: &Args) -> Result<Value> {
        match target {
            Value::Function(func) => self.invoke_function(func, args),
            other => Ok(other.clone()),
        }
    }

    /// 以新实例为接收者调用函数，结果为对象时执行 inflection
    pub fn invoke_function(&self, func: &Function, args: &Args) -> Result<Value> {
        let receiver = func.instantiate();
        let resolved = self.resolve(func, args)?;
        let result = func.apply(&receiver, Arguments::new(resolved))?;

        if let Value::Object(obj) = &result {
            self.inflect(obj, args)?;
        }
        Ok(result)
    }

    /// 按声明的参数名解析实参：显式参数优先，否则从容器获取
    pub fn resolve(&self, func: &Function, args: &Args) -> Result<Vec<Option<Value>>> {
        self.inner
            .reflector
            .parameter_names(func)
            .iter()
            .map(|name| match args.get(name) {
                Some(value) => Ok(Some(value.clone())),
                None => self.get(name),
            })
            .collect()
    }

    /// 追加一个 inflector 名称
    pub fn inflector(&self, name: impl Into<String>) -> &Self {
        self.inner.inflectors.write().push(name.into());
        self
    }

    /// 对 `obj` 依次应用本容器及所有祖先容器的 inflector
    pub fn inflect(&self, obj: &Object, args: &Args) -> Result<()> {
        self.apply_inflectors(obj, args)?;
        for ancestor in self.ancestors() {
            ancestor.apply_inflectors(obj, args)?;
        }
        Ok(())
    }

    fn apply_inflectors(&self, obj: &Object, args: &Args) -> Result<()> {
        let names = self.inner.inflectors.read().clone();

        for name in names {
            match obj.get(&name) {
                Some(Value::Function(setter)) => {
                    let resolved = self.resolve(&setter, args)?;
                    setter.apply(obj, Arguments::new(resolved))?;
                }
                Some(_) => {
                    let replacement = match args.get(&name) {
                        Some(value) => Some(value.clone()),
                        None => self.get(&name)?,
                    };
                    if let Some(value) = replacement {
                        obj.set(name, value);
                    }
                }
                None => {}
            }
        }
        Ok(())
    }
}
