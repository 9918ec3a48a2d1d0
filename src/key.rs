//! 键规范化与模块路径解析

use std::env;
use std::path::{Component, Path, PathBuf};

/// 文件加载器能识别的模块扩展名
pub const MODULE_EXTENSIONS: &[&str] = &["json", "toml"];

/// 规范化注册键
///
/// 取最后一个路径分隔符之后的部分，去掉模块扩展名，再把首字母转为小写：
/// `./mock/TestObject.json` → `testObject`。
pub fn normalize_key(raw: &str) -> String {
    let name = raw.rsplit(['/', '\\']).next().unwrap_or(raw);
    let name = strip_module_extension(name);

    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn strip_module_extension(name: &str) -> &str {
    for ext in MODULE_EXTENSIONS {
        if let Some(stem) = name.strip_suffix(*ext).and_then(|rest| rest.strip_suffix('.')) {
            if !stem.is_empty() {
                return stem;
            }
        }
    }
    name
}

/// 以 `.` 开头的定义视为相对路径
pub fn is_relative_module(definition: &str) -> bool {
    definition.starts_with('.')
}

/// 把相对模块路径解析为绝对路径
///
/// 基础路径本身是相对路径时以当前工作目录为准；结果按词法去掉 `.` 与 `..`。
pub fn resolve_module_path(base: &Path, definition: &str) -> String {
    let base = if base.is_absolute() {
        base.to_path_buf()
    } else {
        match env::current_dir() {
            Ok(cwd) => cwd.join(base),
            Err(_) => base.to_path_buf(),
        }
    };

    normalize_path(&base.join(definition)).to_string_lossy().into_owned()
}

fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}
