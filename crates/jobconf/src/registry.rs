// registry.rs
// 处理器注册表：保序注册、按名跳过、稳定的两梯队排序（普通在前，最后运行在后）。
use crate::handler::MarkerHandler;
use log::debug;
use std::collections::HashSet;

/// 跳过列表配置键：逗号分隔的处理器全限定名
pub const CONF_KEY_SKIP_HANDLERS: &str = "jobconf.skip.handlers";

/// 处理器注册表，每次驱动运行构建一次，此后只读。
pub struct HandlerRegistry {
    handlers: Vec<Box<dyn MarkerHandler>>,
    skip: HashSet<String>,
    resolved: bool,
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
            skip: HashSet::new(),
            resolved: false,
        }
    }

    /// 以逗号分隔的跳过列表创建注册表，列表在构建时读取一次
    pub fn with_skip_list(skip_list: &str) -> Self {
        let skip = skip_list
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        Self {
            handlers: Vec::new(),
            skip,
            resolved: false,
        }
    }

    /// 注册一个处理器。命中跳过列表的在注册时排除；
    /// 同名处理器在一次运行内只注册一次（幂等）。
    pub fn register(&mut self, handler: Box<dyn MarkerHandler>) -> bool {
        let name = handler.name();
        if self.skip.contains(name) {
            debug!("跳过列表排除处理器: {}", name);
            return false;
        }
        if self.handlers.iter().any(|h| h.name() == name) {
            return false;
        }
        self.handlers.push(handler);
        self.resolved = false;
        true
    }

    /// 解析最终顺序：稳定划分，所有普通处理器在前、
    /// 最后运行处理器在后，两组内部保持注册顺序。
    pub fn resolve(&mut self) {
        if !self.resolved {
            // Vec::sort_by_key 是稳定排序，等值不换序
            self.handlers.sort_by_key(|h| h.run_last());
            self.resolved = true;
        }
    }

    /// 按解析后的顺序返回处理器名称
    pub fn handler_names(&self) -> Vec<&'static str> {
        self.handlers.iter().map(|h| h.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub(crate) fn handlers_mut(&mut self) -> &mut [Box<dyn MarkerHandler>] {
        &mut self.handlers
    }
}
