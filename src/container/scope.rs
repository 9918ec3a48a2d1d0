//! 作用域与子容器

use std::path::PathBuf;

use super::Container;
use crate::error::Result;
use crate::value::Value;

impl Container {
    /// 创建子作用域
    ///
    /// 作用域共享基础路径，能看到本容器的全部绑定并继承别名；
    /// 只注册在作用域中的绑定对本容器不可见。
    pub fn scope(&self, definitions: Option<Value>) -> Result<Container> {
        let scope = Container::builder().parent(self).build();
        tracing::debug!(container = %self.inner.id, scope = %scope.inner.id, "Scope created");

        if let Some(definitions) = definitions {
            scope.register(definitions, None, false, false)?;
        }
        Ok(scope)
    }

    /// 创建独立的子容器并注册到本容器
    ///
    /// 本容器的查找可以进入子容器，反之不行。`path` 缺省时沿用本容器的基础路径。
    pub fn sub(&self, path: Option<&str>, definitions: Option<Value>) -> Result<Container> {
        let base_path = path
            .map(PathBuf::from)
            .unwrap_or_else(|| self.inner.base_path.clone());
        let sub = Container::builder()
            .base_path(base_path)
            .shared_loader(self.inner.loader.clone())
            .shared_reflector(self.inner.reflector.clone())
            .build();

        self.register(sub.clone(), None, false, false)?;
        if let Some(definitions) = definitions {
            sub.register(definitions, None, false, false)?;
        }
        Ok(sub)
    }

    /// 祖先容器，由近及远
    pub fn ancestors(&self) -> Vec<Container> {
        let mut ancestors = Vec::new();
        let mut current = self.inner.parent.clone();
        while let Some(container) = current {
            current = container.inner.parent.clone();
            ancestors.push(container);
        }
        ancestors
    }
}

#[cfg(test)]
mod tests {
    use crate::container::Container;
    use crate::value::{Object, Value};

    #[test]
    fn test_scope_sees_parent_but_not_reverse() {
        let root = Container::new("/app");
        root.intact("shared", "root").unwrap();
        let scope = root
            .scope(Some(Object::from_members("defs", [("local", true)]).into()))
            .unwrap();

        assert!(scope.has("shared"));
        assert_eq!(scope.get("local").unwrap(), Some(Value::Bool(true)));
        assert!(!root.has("local"));
        assert_eq!(root.get("local").unwrap(), None);
        assert!(scope.parent().unwrap().ptr_eq(&root));
        assert_eq!(scope.base_path(), root.base_path());
    }

    #[test]
    fn test_sub_is_isolated_from_owner() {
        let owner = Container::new("/app");
        owner.intact("ownerOnly", 1).unwrap();
        let sub = owner
            .sub(Some("/plugins"), Some(Object::from_members("defs", [("plugin", 2)]).into()))
            .unwrap();

        assert!(owner.has("plugin"));
        assert_eq!(owner.get("plugin").unwrap(), Some(Value::Number(2.0)));
        assert!(!sub.has("ownerOnly"));
        assert!(sub.parent().is_none());
        assert_eq!(sub.base_path().to_str(), Some("/plugins"));
    }

    #[test]
    fn test_ancestors_walk_to_root() {
        let root = Container::new("/app");
        let child = root.scope(None).unwrap();
        let grandchild = child.scope(None).unwrap();

        let ancestors = grandchild.ancestors();
        assert_eq!(ancestors.len(), 2);
        assert!(ancestors[0].ptr_eq(&child));
        assert!(ancestors[1].ptr_eq(&root));
        assert!(root.ancestors().is_empty());
    }
}
