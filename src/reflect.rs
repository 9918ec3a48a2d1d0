//! 参数名反射

use crate::function::Function;

/// 给出函数按声明顺序排列的参数名
///
/// 无法反射的函数返回空列表。
pub trait Reflector: Send + Sync {
    fn parameter_names(&self, func: &Function) -> Vec<String>;
}

/// 读取函数构造时声明的参数名
#[derive(Debug, Default, Clone, Copy)]
pub struct DeclaredParameters;

impl Reflector for DeclaredParameters {
    fn parameter_names(&self, func: &Function) -> Vec<String> {
        func.params().to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    #[test]
    fn test_declared_parameters_in_order() {
        let func = Function::factory("f", ["console", "message"], |_| Ok(Value::Null));
        assert_eq!(DeclaredParameters.parameter_names(&func), vec!["console", "message"]);
    }

    #[test]
    fn test_native_function_has_no_parameters() {
        let func = Function::native("now", || Ok(Value::Number(0.0)));
        assert!(DeclaredParameters.parameter_names(&func).is_empty());
    }
}
