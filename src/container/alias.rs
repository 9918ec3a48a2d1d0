//! 别名表
//!
//! 作用域容器持有父容器别名表的引用，本地未设置的键沿父链实时查找，
//! 因此父容器之后新增的别名对子作用域立即可见。

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

#[derive(Debug, Default)]
pub struct AliasTable {
    local: RwLock<HashMap<String, String>>,
    parent: Option<Arc<AliasTable>>,
}

impl AliasTable {
    /// 不继承任何别名的空表
    pub fn new() -> Self {
        Self::default()
    }

    /// 以 `parent` 为实时回退的表
    pub fn inherit(parent: Arc<AliasTable>) -> Self {
        Self {
            local: RwLock::new(HashMap::new()),
            parent: Some(parent),
        }
    }

    pub fn insert(&self, key: impl Into<String>, target: impl Into<String>) {
        self.local.write().insert(key.into(), target.into());
    }

    /// 沿父链查找别名目标
    pub fn lookup(&self, key: &str) -> Option<String> {
        let mut table = self;
        loop {
            if let Some(target) = table.local.read().get(key) {
                return Some(target.clone());
            }
            table = table.parent.as_deref()?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_falls_through_to_parent() {
        let root = Arc::new(AliasTable::new());
        root.insert("out", "console");
        let child = AliasTable::inherit(root.clone());

        assert_eq!(child.lookup("out").as_deref(), Some("console"));
        assert_eq!(child.lookup("missing"), None);
    }

    #[test]
    fn test_parent_additions_are_live() {
        let root = Arc::new(AliasTable::new());
        let child = AliasTable::inherit(root.clone());

        root.insert("log", "console");

        assert_eq!(child.lookup("log").as_deref(), Some("console"));
    }

    #[test]
    fn test_child_shadows_parent() {
        let root = Arc::new(AliasTable::new());
        root.insert("out", "console");
        let child = AliasTable::inherit(root.clone());
        child.insert("out", "file");

        assert_eq!(child.lookup("out").as_deref(), Some("file"));
        assert_eq!(root.lookup("out").as_deref(), Some("console"));
    }
}
