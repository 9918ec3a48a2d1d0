//! Module loading
//!
//! A binding whose definition is a module identifier is handed to a [`Loader`] the
//! first time it is resolved. Two loaders ship with the crate: an in-memory
//! [`ModuleTable`] and a [`FileLoader`] that reads JSON/TOML documents from disk.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;

use crate::error::LoadError;
use crate::key::MODULE_EXTENSIONS;
use crate::value::{Object, Value};

/// Resolves a module identifier to a value
pub trait Loader: Send + Sync {
    fn load(&self, identifier: &str) -> Result<Value, LoadError>;
}

impl<T: Loader + ?Sized> Loader for Arc<T> {
    fn load(&self, identifier: &str) -> Result<Value, LoadError> {
        (**self).load(identifier)
    }
}

/// In-memory module registry keyed by identifier
#[derive(Default)]
pub struct ModuleTable {
    modules: DashMap<String, Value>,
}

impl ModuleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define (or replace) the module at `identifier`
    pub fn define(&self, identifier: impl Into<String>, value: impl Into<Value>) -> &Self {
        self.modules.insert(identifier.into(), value.into());
        self
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.modules.contains_key(identifier)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl Loader for ModuleTable {
    fn load(&self, identifier: &str) -> Result<Value, LoadError> {
        if let Some(module) = self.modules.get(identifier) {
            return Ok(module.value().clone());
        }

        // Extension-less identifiers fall back to the known module extensions
        for ext in MODULE_EXTENSIONS {
            if let Some(module) = self.modules.get(&format!("{}.{}", identifier, ext)) {
                return Ok(module.value().clone());
            }
        }

        Err(LoadError::NotFound(identifier.to_string()))
    }
}

/// Loads JSON and TOML documents from the filesystem
///
/// Files with any other extension are loaded as plain strings.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileLoader;

impl FileLoader {
    pub fn new() -> Self {
        Self
    }

    fn locate(identifier: &str) -> Option<PathBuf> {
        let exact = PathBuf::from(identifier);
        if exact.is_file() {
            return Some(exact);
        }

        MODULE_EXTENSIONS
            .iter()
            .map(|ext| PathBuf::from(format!("{}.{}", identifier, ext)))
            .find(|candidate| candidate.is_file())
    }

    fn parse(path: &Path, content: String) -> Result<Value, LoadError> {
        let parse_error = |message: String| LoadError::Parse {
            path: path.display().to_string(),
            message,
        };

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => serde_json::from_str::<serde_json::Value>(&content)
                .map(from_json)
                .map_err(|e| parse_error(e.to_string())),
            Some("toml") => toml::from_str::<toml::Table>(&content)
                .map(|table| from_toml(toml::Value::Table(table)))
                .map_err(|e| parse_error(e.to_string())),
            _ => Ok(Value::Str(content)),
        }
    }
}

impl Loader for FileLoader {
    fn load(&self, identifier: &str) -> Result<Value, LoadError> {
        let path = Self::locate(identifier).ok_or_else(|| LoadError::NotFound(identifier.to_string()))?;

        let content = fs::read_to_string(&path).map_err(|source| LoadError::Io {
            path: path.display().to_string(),
            source,
        })?;

        tracing::debug!(path = %path.display(), "Loaded module file");
        Self::parse(&path, content)
    }
}

/// Convert a JSON document into a container value
pub fn from_json(json: serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(b),
        serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
        serde_json::Value::String(s) => Value::Str(s),
        serde_json::Value::Array(items) => Value::List(items.into_iter().map(from_json).collect()),
        serde_json::Value::Object(map) => {
            Value::Object(Object::from_members("Object", map.into_iter().map(|(k, v)| (k, from_json(v)))))
        }
    }
}

/// Convert a TOML value into a container value
pub fn from_toml(value: toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::Str(s),
        // i64 → f64 is lossy above 2^53, acceptable for configuration documents
        toml::Value::Integer(i) => Value::Number(i as f64),
        toml::Value::Float(f) => Value::Number(f),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::Str(dt.to_string()),
        toml::Value::Array(items) => Value::List(items.into_iter().map(from_toml).collect()),
        toml::Value::Table(table) => {
            Value::Object(Object::from_members("Table", table.into_iter().map(|(k, v)| (k, from_toml(v)))))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_module_table_exact_and_extension_lookup() {
        let table = ModuleTable::new();
        table.define("/mods/Logger", "logger").define("/mods/settings.json", 42);

        assert_eq!(table.load("/mods/Logger").unwrap(), Value::from("logger"));
        assert_eq!(table.load("/mods/settings").unwrap(), Value::Number(42.0));
        assert!(matches!(table.load("/mods/missing"), Err(LoadError::NotFound(_))));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_file_loader_reads_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"name": "ioc", "retries": 3, "tags": ["a", "b"]}"#).unwrap();

        let identifier = dir.path().join("settings").to_string_lossy().into_owned();
        let value = FileLoader::new().load(&identifier).unwrap();

        let obj = value.as_object().unwrap();
        assert_eq!(obj.get("name"), Some(Value::from("ioc")));
        assert_eq!(obj.get("retries"), Some(Value::Number(3.0)));
        assert_eq!(obj.get("tags"), Some(Value::from(vec!["a", "b"])));
    }

    #[test]
    fn test_file_loader_reads_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("service.toml");
        let mut file = fs::File::create(&path).unwrap();
        writeln!(file, "enabled = true\n[limits]\nmax = 8").unwrap();

        let value = FileLoader::new().load(&path.to_string_lossy()).unwrap();

        let obj = value.as_object().unwrap();
        assert_eq!(obj.get("enabled"), Some(Value::Bool(true)));
        let limits = obj.get("limits").unwrap();
        assert_eq!(limits.as_object().unwrap().get("max"), Some(Value::Number(8.0)));
    }

    #[test]
    fn test_file_loader_plain_text_and_errors() {
        let dir = TempDir::new().unwrap();
        let text = dir.path().join("banner.txt");
        fs::write(&text, "hello").unwrap();
        let broken = dir.path().join("broken.json");
        fs::write(&broken, "{not json").unwrap();

        let loader = FileLoader::new();
        assert_eq!(loader.load(&text.to_string_lossy()).unwrap(), Value::from("hello"));
        assert!(matches!(loader.load(&broken.to_string_lossy()), Err(LoadError::Parse { .. })));
        assert!(matches!(
            loader.load(&dir.path().join("nothing").to_string_lossy()),
            Err(LoadError::NotFound(_))
        ));
    }
}
