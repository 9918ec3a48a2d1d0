//! 容器错误类型
//!
//! 解析路径本身是宽松的：未注册的键、不可调用的值都不会产生错误。
//! 只有以下情况会向调用方传播：
//! - 注册时传入无法识别的键
//! - 模块加载失败
//! - 用户函数体返回错误

use thiserror::Error;

/// 模块加载错误
#[derive(Debug, Error)]
pub enum LoadError {
    /// 找不到模块
    #[error("module not found: {0}")]
    NotFound(String),

    /// 读取模块文件失败
    #[error("failed to read module {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// 模块内容解析失败
    #[error("failed to parse module {path}: {message}")]
    Parse { path: String, message: String },
}

/// 容器错误
#[derive(Debug, Error)]
pub enum ContainerError {
    /// 注册键既不是字符串、列表、映射，也不是容器
    #[error("invalid registration key: expected a string, list, mapping or container, got {kind}")]
    InvalidKey { kind: &'static str },

    /// 模块加载失败
    #[error("failed to load module '{identifier}': {source}")]
    Load {
        identifier: String,
        #[source]
        source: LoadError,
    },

    /// 函数调用失败
    #[error("invocation of '{function}' failed: {source}")]
    Invocation {
        function: String,
        #[source]
        source: anyhow::Error,
    },
}

/// 结果类型别名
pub type Result<T> = std::result::Result<T, ContainerError>;
