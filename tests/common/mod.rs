//! 集成测试共用的模拟对象与模块

#![allow(dead_code)]

use ioc::{Container, Function, ModuleTable, Object, Value};
use parking_lot::Mutex;

pub const BASE: &str = "/fixtures";

/// 记录日志的假控制台
#[derive(Default)]
pub struct FakeConsole {
    logs: Mutex<Vec<String>>,
}

impl FakeConsole {
    pub fn log(&self, message: impl Into<String>) {
        self.logs.lock().push(message.into());
    }

    pub fn logs(&self) -> Vec<String> {
        self.logs.lock().clone()
    }
}

/// `TestDependency(console)`：设置 `test = "test"`
pub fn test_dependency() -> Function {
    Function::constructor("TestDependency", ["console"], |this, args| {
        if let Some(console) = args.downcast::<FakeConsole>(0) {
            console.log("test dependency");
        }
        this.set("test", "test");
        Ok(())
    })
}

/// `TestObject(console, testDependency)`，带 `testSetter(test)` 原型方法
pub fn test_object() -> Function {
    let setter = Function::method("testSetter", ["test"], |this, args| {
        this.set("test", args.value(0));
        Ok(())
    });

    Function::constructor("TestObject", ["console", "testDependency"], |this, args| {
        this.set("dependency", args.value(1));
        this.set("test", Value::Null);
        if let Some(console) = args.downcast::<FakeConsole>(0) {
            console.log("test object");
        }
        Ok(())
    })
    .with_method("testSetter", setter)
}

/// 以 `/fixtures/mock/*` 提供模拟模块的容器
pub fn fixture_container() -> Container {
    let modules = ModuleTable::new();
    modules
        .define(format!("{}/mock/TestObject", BASE), test_object())
        .define(format!("{}/mock/TestDependency", BASE), test_dependency());

    Container::builder().base_path(BASE).loader(modules).build()
}

pub fn object(value: &Value) -> Object {
    value.as_object().cloned().expect("expected an object")
}
