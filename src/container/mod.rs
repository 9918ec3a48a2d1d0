//! 依赖注入容器
//!
//! 按名称保存绑定（值、工厂或模块标识），解析时根据函数声明的参数名
//! 自动从容器中取得依赖。容器之间有三种关系：
//! - 父容器：`scope` 创建的子作用域可以看到父容器的所有绑定
//! - 子容器：`sub` 创建的独立容器，只有拥有者能看到其中的绑定
//! - 别名：作用域继承父容器的别名表，可在本地覆盖
//!
//! 容器不检测循环依赖，自我依赖的绑定会耗尽调用栈。

mod alias;
mod invoke;
mod prepare;
mod scope;

use alias::AliasTable;
pub use prepare::{PrepareKeys, Prepared, Slot};

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::binding::{Binding, BindingState};
use crate::config::ContainerConfig;
use crate::error::{ContainerError, Result};
use crate::key::{is_relative_module, normalize_key, resolve_module_path};
use crate::loader::{FileLoader, Loader};
use crate::reflect::{DeclaredParameters, Reflector};
use crate::value::{Args, Value};

/// 容器以自身注册的键
pub const SELF_KEY: &str = "ioc";

/// 默认基础路径
pub const DEFAULT_BASE_PATH: &str = "./";

/// 层级式依赖注入容器
///
/// 克隆得到的是同一个容器的另一个句柄。
#[derive(Clone)]
pub struct Container {
    inner: Arc<Inner>,
}

struct Inner {
    id: Uuid,
    base_path: PathBuf,
    bindings: DashMap<String, Binding>,
    inflectors: RwLock<Vec<String>>,
    subs: RwLock<Vec<Container>>,
    aliases: Arc<AliasTable>,
    parent: Option<Container>,
    loader: Arc<dyn Loader>,
    reflector: Arc<dyn Reflector>,
    stats: InnerStats,
}

/// 内部统计（原子计数器）
#[derive(Default)]
struct InnerStats {
    total_resolutions: AtomicUsize,
    cache_hits: AtomicUsize,
    cache_misses: AtomicUsize,
    module_loads: AtomicUsize,
}

/// 容器统计信息
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerStats {
    /// 命中本地绑定的解析次数
    pub total_resolutions: usize,
    /// 直接返回单例结果的次数
    pub cache_hits: usize,
    /// 调用工厂的次数
    pub cache_misses: usize,
    /// 模块加载次数
    pub module_loads: usize,
}

impl ContainerStats {
    /// 单例缓存命中率
    pub fn hit_rate(&self) -> f64 {
        let total = self.cache_hits + self.cache_misses;
        if total == 0 {
            0.0
        } else {
            self.cache_hits as f64 / total as f64
        }
    }
}

/// 容器构建器
#[derive(Default)]
pub struct ContainerBuilder {
    base_path: Option<PathBuf>,
    parent: Option<Container>,
    loader: Option<Arc<dyn Loader>>,
    reflector: Option<Arc<dyn Reflector>>,
}

impl ContainerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// 转交给加载器之前，相对模块路径以此为基准
    pub fn base_path(mut self, base_path: impl Into<PathBuf>) -> Self {
        self.base_path = Some(base_path.into());
        self
    }

    /// 父容器：继承其别名、可见性，以及未单独设置时的加载器与反射器
    pub fn parent(mut self, parent: &Container) -> Self {
        self.parent = Some(parent.clone());
        self
    }

    pub fn loader<L: Loader + 'static>(mut self, loader: L) -> Self {
        self.loader = Some(Arc::new(loader));
        self
    }

    pub fn reflector<R: Reflector + 'static>(mut self, reflector: R) -> Self {
        self.reflector = Some(Arc::new(reflector));
        self
    }

    fn shared_loader(mut self, loader: Arc<dyn Loader>) -> Self {
        self.loader = Some(loader);
        self
    }

    fn shared_reflector(mut self, reflector: Arc<dyn Reflector>) -> Self {
        self.reflector = Some(reflector);
        self
    }

    pub fn build(self) -> Container {
        let parent = self.parent;
        let inherited = parent.as_ref().map(|p| &p.inner);

        let base_path = self
            .base_path
            .or_else(|| inherited.map(|p| p.base_path.clone()))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_BASE_PATH));
        let loader = self
            .loader
            .or_else(|| inherited.map(|p| p.loader.clone()))
            .unwrap_or_else(|| Arc::new(FileLoader::new()));
        let reflector = self
            .reflector
            .or_else(|| inherited.map(|p| p.reflector.clone()))
            .unwrap_or_else(|| Arc::new(DeclaredParameters));
        let aliases = match inherited {
            Some(p) => AliasTable::inherit(p.aliases.clone()),
            None => AliasTable::new(),
        };

        let container = Container {
            inner: Arc::new(Inner {
                id: Uuid::new_v4(),
                base_path,
                bindings: DashMap::new(),
                inflectors: RwLock::new(Vec::new()),
                subs: RwLock::new(Vec::new()),
                aliases: Arc::new(aliases),
                parent,
                loader,
                reflector,
                stats: InnerStats::default(),
            }),
        };
        container
            .inner
            .bindings
            .insert(SELF_KEY.to_string(), Binding::owner());

        tracing::debug!(
            container = %container.inner.id,
            base_path = %container.inner.base_path.display(),
            parent = ?container.inner.parent.as_ref().map(|p| p.inner.id),
            "Container created"
        );
        container
    }
}

impl Container {
    /// 创建根容器
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self::builder().base_path(base_path).build()
    }

    pub fn builder() -> ContainerBuilder {
        ContainerBuilder::new()
    }

    /// 按配置创建根容器（使用文件加载器）
    pub fn from_config(config: &ContainerConfig) -> Self {
        Self::builder().base_path(config.base_path()).build()
    }

    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    pub fn base_path(&self) -> &Path {
        &self.inner.base_path
    }

    /// 父容器；根容器与子容器没有父容器
    pub fn parent(&self) -> Option<Container> {
        self.inner.parent.clone()
    }

    pub fn ptr_eq(&self, other: &Container) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// 注册绑定
    ///
    /// `key` 可以是：
    /// - 字符串：以规范化后的名称保存 `definition`，缺省时定义即键本身（模块路径）
    /// - 列表：逐个以相同的定义和标记注册
    /// - 对象：把每个成员当作 名称→定义 注册（不带单例/intact 标记）
    /// - 容器：加入本容器的子容器列表
    ///
    /// 其他类型立即返回 [`ContainerError::InvalidKey`]。
    pub fn register(
        &self,
        key: impl Into<Value>,
        definition: Option<Value>,
        singleton: bool,
        intact: bool,
    ) -> Result<&Self> {
        match key.into() {
            Value::Str(raw) => self.register_name(&raw, definition, singleton, intact),
            Value::List(keys) => {
                for key in keys {
                    self.register(key, definition.clone(), singleton, intact)?;
                }
            }
            Value::Object(mapping) => {
                for (name, definition) in mapping.fields() {
                    self.register(name, Some(definition), false, false)?;
                }
            }
            Value::Container(sub) => {
                tracing::debug!(container = %self.inner.id, sub = %sub.inner.id, "Registered sub-container");
                self.inner.subs.write().push(sub);
            }
            other => return Err(ContainerError::InvalidKey { kind: other.kind() }),
        }
        Ok(self)
    }

    fn register_name(&self, raw: &str, definition: Option<Value>, singleton: bool, intact: bool) {
        let definition = definition.unwrap_or_else(|| Value::Str(raw.to_string()));
        let key = normalize_key(raw);

        let definition = match definition {
            Value::Str(module) if !intact && is_relative_module(&module) => {
                Value::Str(resolve_module_path(&self.inner.base_path, &module))
            }
            other => other,
        };

        let replaced = self
            .inner
            .bindings
            .insert(key.clone(), Binding::new(definition, singleton, intact))
            .is_some();

        tracing::debug!(
            container = %self.inner.id,
            key = %key,
            singleton,
            intact,
            replaced,
            "Registered binding"
        );
    }

    /// 注册普通绑定
    pub fn bind(&self, key: impl Into<Value>, definition: impl Into<Value>) -> Result<&Self> {
        self.register(key, Some(definition.into()), false, false)
    }

    /// 注册单例：工厂最多调用一次
    pub fn singleton(&self, key: impl Into<Value>, definition: impl Into<Value>) -> Result<&Self> {
        self.register(key, Some(definition.into()), true, false)
    }

    /// 注册原样返回的定义：字符串不加载，函数不调用
    pub fn intact(&self, key: impl Into<Value>, definition: impl Into<Value>) -> Result<&Self> {
        self.register(key, Some(definition.into()), false, true)
    }

    /// 本地、子容器（按注册顺序）或父容器中是否存在该键
    pub fn has(&self, key: &str) -> bool {
        self.inner.bindings.contains_key(key)
            || self.sub_containers().iter().any(|sub| sub.has(key))
            || self.inner.parent.as_ref().is_some_and(|parent| parent.has(key))
    }

    /// 解析键
    pub fn get(&self, key: &str) -> Result<Option<Value>> {
        self.get_with(key, &Args::new())
    }

    /// 以显式参数解析键；单例忽略这些参数
    pub fn get_with(&self, key: &str, args: &Args) -> Result<Option<Value>> {
        if let Some(target) = self.inner.aliases.lookup(key) {
            return self.get_with(&target, args);
        }

        let found = self.inner.bindings.get(key).map(|binding| binding.value().clone());
        let Some(binding) = found else {
            return self.delegate_get(key, args);
        };

        self.inner.stats.total_resolutions.fetch_add(1, Ordering::Relaxed);

        let definition = match &binding.state {
            BindingState::Owner => return Ok(Some(Value::Container(self.clone()))),
            BindingState::Realized(value) => {
                self.inner.stats.cache_hits.fetch_add(1, Ordering::Relaxed);
                return Ok(Some(value.clone()));
            }
            BindingState::Unresolved(module) => self.load_module(key, binding.generation, module)?,
            BindingState::Loaded(value) => value.clone(),
        };

        let Some(func) = binding.invocable(&definition) else {
            return Ok(Some(definition));
        };

        self.inner.stats.cache_misses.fetch_add(1, Ordering::Relaxed);

        if !binding.singleton {
            return self.invoke_function(&func, args).map(Some);
        }

        let result = self.invoke_function(&func, &Args::new())?;
        let realized = self
            .inner
            .bindings
            .get_mut(key)
            .is_some_and(|mut stored| stored.realize(binding.generation, result.clone()));
        if realized {
            tracing::debug!(container = %self.inner.id, key = %key, "Realized singleton");
        } else {
            tracing::debug!(container = %self.inner.id, key = %key, "Binding replaced during resolution, result not stored");
        }
        Ok(Some(result))
    }

    fn load_module(&self, key: &str, generation: u64, module: &str) -> Result<Value> {
        let value = self
            .inner
            .loader
            .load(module)
            .map_err(|source| ContainerError::Load {
                identifier: module.to_string(),
                source,
            })?;

        self.inner.stats.module_loads.fetch_add(1, Ordering::Relaxed);
        let stored = self
            .inner
            .bindings
            .get_mut(key)
            .is_some_and(|mut binding| binding.mark_loaded(generation, value.clone()));
        tracing::debug!(container = %self.inner.id, key = %key, module = %module, stored, "Loaded module binding");
        Ok(value)
    }

    fn delegate_get(&self, key: &str, args: &Args) -> Result<Option<Value>> {
        if let Some(sub) = self.sub_containers().into_iter().find(|sub| sub.has(key)) {
            tracing::trace!(container = %self.inner.id, sub = %sub.inner.id, key = %key, "Delegating to sub-container");
            return sub.get_with(key, args);
        }

        match &self.inner.parent {
            Some(parent) => {
                tracing::trace!(container = %self.inner.id, key = %key, "Delegating to parent");
                parent.get_with(key, args)
            }
            None => Ok(None),
        }
    }

    /// 子容器快照（注册顺序）
    pub fn sub_containers(&self) -> Vec<Container> {
        self.inner.subs.read().clone()
    }

    /// 记录 `key → aliased_key`，在解析时才查找目标
    pub fn alias(&self, key: impl Into<String>, aliased_key: impl Into<String>) -> &Self {
        self.inner.aliases.insert(key, aliased_key);
        self
    }

    /// 本容器（不含父容器）绑定的键
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.inner.bindings.iter().map(|entry| entry.key().clone()).collect();
        keys.sort();
        keys
    }

    /// 获取容器统计信息
    pub fn stats(&self) -> ContainerStats {
        let stats = &self.inner.stats;
        ContainerStats {
            total_resolutions: stats.total_resolutions.load(Ordering::Relaxed),
            cache_hits: stats.cache_hits.load(Ordering::Relaxed),
            cache_misses: stats.cache_misses.load(Ordering::Relaxed),
            module_loads: stats.module_loads.load(Ordering::Relaxed),
        }
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("id", &self.inner.id)
            .field("base_path", &self.inner.base_path)
            .field("bindings", &self.inner.bindings.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LoadError;
    use crate::function::Function;
    use crate::loader::ModuleTable;
    use crate::value::Object;
    use std::sync::atomic::AtomicUsize;

    fn counting_factory(counter: Arc<AtomicUsize>) -> Function {
        Function::native("Counter", move || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            Ok(Value::Object(Object::from_members("Counter", [("n", n as f64)])))
        })
    }

    #[test]
    fn test_container_binds_itself() {
        let container = Container::new("/app");

        assert!(container.has(SELF_KEY));
        let own = container.get(SELF_KEY).unwrap().unwrap();
        assert!(own.as_container().unwrap().ptr_eq(&container));
    }

    #[test]
    fn test_last_registration_wins() {
        let container = Container::new("/app");
        container.bind("answer", 1).unwrap().bind("answer", 2).unwrap();

        assert_eq!(container.get("answer").unwrap(), Some(Value::Number(2.0)));
    }

    #[test]
    fn test_register_normalizes_keys() {
        let modules = ModuleTable::new();
        modules.define("/app/mock/TestThing", "thing");
        let container = Container::builder().base_path("/app").loader(modules).build();

        container.register("./mock/TestThing", None, false, false).unwrap();

        assert!(container.has("testThing"));
        assert!(!container.has("TestThing"));
        assert_eq!(container.get("testThing").unwrap(), Some(Value::from("thing")));
    }

    #[test]
    fn test_register_list_and_mapping() {
        let container = Container::new("/app");
        container
            .register(vec!["first", "second"], Some(Value::from(7)), false, true)
            .unwrap();
        container
            .register(Object::from_members("defs", [("alpha", 1), ("beta", 2)]), None, true, true)
            .unwrap();

        assert_eq!(container.get("first").unwrap(), Some(Value::Number(7.0)));
        assert_eq!(container.get("second").unwrap(), Some(Value::Number(7.0)));
        assert_eq!(container.get("beta").unwrap(), Some(Value::Number(2.0)));
        assert_eq!(container.keys(), vec!["alpha", "beta", "first", "ioc", "second"]);
    }

    #[test]
    fn test_register_rejects_invalid_keys() {
        let container = Container::new("/app");

        let err = container.register(42, None, false, false).unwrap_err();
        assert!(matches!(err, ContainerError::InvalidKey { kind: "number" }));

        let nested = container.register(vec![Value::from("ok"), Value::Bool(true)], None, false, false);
        assert!(matches!(nested, Err(ContainerError::InvalidKey { kind: "bool" })));
        assert!(container.has("ok"));
    }

    #[test]
    fn test_singleton_is_memoized_and_counted() {
        let counter = Arc::new(AtomicUsize::new(0));
        let container = Container::new("/app");
        container.singleton("shared", counting_factory(counter.clone())).unwrap();

        let first = container.get("shared").unwrap().unwrap();
        let second = container
            .get_with("shared", &crate::args! { "n" => 99 })
            .unwrap()
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(counter.load(Ordering::SeqCst), 1);

        let stats = container.stats();
        assert_eq!(stats.total_resolutions, 2);
        assert_eq!(stats.cache_misses, 1);
        assert_eq!(stats.cache_hits, 1);
        assert!((stats.hit_rate() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_factory_runs_every_time() {
        let counter = Arc::new(AtomicUsize::new(0));
        let container = Container::new("/app");
        container.bind("fresh", counting_factory(counter.clone())).unwrap();

        let a = container.get("fresh").unwrap().unwrap();
        let b = container.get("fresh").unwrap().unwrap();

        assert_ne!(a, b);
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_module_loaded_once() {
        let modules = Arc::new(ModuleTable::new());
        modules.define("/app/Settings", Object::from_members("Settings", [("debug", true)]));
        let container = Container::builder().base_path("/app").loader(modules.clone()).build();
        container.bind("settings", "./Settings").unwrap();

        let first = container.get("settings").unwrap().unwrap();
        modules.define("/app/Settings", "replaced");
        let second = container.get("settings").unwrap().unwrap();

        assert_eq!(first, second);
        assert_eq!(container.stats().module_loads, 1);
    }

    #[test]
    fn test_missing_module_propagates() {
        let container = Container::builder().base_path("/app").loader(ModuleTable::new()).build();
        container.register("./mock/Nowhere", None, false, false).unwrap();

        let err = container.get("nowhere").unwrap_err();
        match err {
            ContainerError::Load { identifier, .. } => assert_eq!(identifier, "/app/mock/Nowhere"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    /// 加载期间把目标键重新注册为字面值的加载器
    struct ReRegisteringLoader {
        target: parking_lot::Mutex<Option<Container>>,
    }

    impl Loader for ReRegisteringLoader {
        fn load(&self, identifier: &str) -> std::result::Result<Value, LoadError> {
            if let Some(container) = self.target.lock().take() {
                container
                    .intact("settings", "replacement")
                    .map_err(|_| LoadError::NotFound(identifier.to_string()))?;
            }
            Ok(Value::from("loaded"))
        }
    }

    #[test]
    fn test_module_load_not_stored_over_newer_registration() {
        let loader = Arc::new(ReRegisteringLoader {
            target: parking_lot::Mutex::new(None),
        });
        let container = Container::builder().base_path("/app").loader(loader.clone()).build();
        container.bind("settings", "./Settings").unwrap();
        *loader.target.lock() = Some(container.clone());

        assert_eq!(container.get("settings").unwrap(), Some(Value::from("loaded")));
        assert_eq!(container.get("settings").unwrap(), Some(Value::from("replacement")));
        assert_eq!(container.stats().module_loads, 1);
    }

    #[test]
    fn test_unknown_key_is_none() {
        let container = Container::new("/app");
        assert_eq!(container.get("nothing").unwrap(), None);
        assert!(!container.has("nothing"));
    }
}
