// dispatcher.rs
// 配置分发引擎：定位作业字段、设置作业名与reduce任务数、
// 收集标记并按注册表顺序分发给处理器。
use crate::context::DriverContext;
use crate::driver::{default_driver_id, DriverDescriptor, MarkerTarget};
use crate::error::{Error, Result};
use crate::evaluator::{stringify, ExpressionEvaluator};
use crate::handler::HandlerEnv;
use crate::handlers::register_builtin_handlers;
use crate::job::JobDescriptor;
use crate::marker::{JobInfo, Marker, MarkerKind};
use crate::registry::{HandlerRegistry, CONF_KEY_SKIP_HANDLERS};
use log::{debug, info};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

/// 分发策略：同一标记交给所有接受它的处理器（默认），
/// 或只交给按解析顺序第一个接受它的处理器。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DispatchPolicy {
    #[default]
    AllMatches,
    FirstMatch,
}

/// 配置分发引擎。持有处理器注册表、表达式求值器、
/// 驱动bean快照与上下文，一次驱动运行构建一次。
pub struct Engine {
    registry: HandlerRegistry,
    evaluator: ExpressionEvaluator,
    root: Value,
    context_map: HashMap<String, Value>,
    policy: DispatchPolicy,
}

impl Engine {
    /// 以内置处理器集合创建引擎，驱动bean序列化为只读快照。
    /// 上下文中存在跳过列表配置时，命中的内置处理器不注册。
    pub fn new(driver: &impl Serialize, context: &DriverContext) -> Result<Self> {
        let skip = context
            .get(CONF_KEY_SKIP_HANDLERS)
            .and_then(Value::as_str)
            .unwrap_or("");
        let mut registry = HandlerRegistry::with_skip_list(skip);
        register_builtin_handlers(&mut registry);
        Self::with_registry(driver, context, registry)
    }

    /// 以外部装配好的注册表创建引擎
    pub fn with_registry(
        driver: &impl Serialize,
        context: &DriverContext,
        registry: HandlerRegistry,
    ) -> Result<Self> {
        let root = serde_json::to_value(driver)?;
        let mut context_map = HashMap::new();
        context_map.insert("context".to_string(), context.as_bean());
        Ok(Self {
            registry,
            evaluator: ExpressionEvaluator::new(),
            root,
            context_map,
            policy: DispatchPolicy::default(),
        })
    }

    pub fn set_policy(&mut self, policy: DispatchPolicy) {
        self.policy = policy;
    }

    /// 注册表的可变访问，用于在配置前追加自定义处理器
    pub fn registry_mut(&mut self) -> &mut HandlerRegistry {
        &mut self.registry
    }

    /// 按驱动描述符配置作业：作业名、reduce任务数、标记分发。
    /// 任一处理器失败即中止本轮配置，错误携带处理器名与标记种类。
    pub fn configure(
        &mut self,
        job: &mut JobDescriptor,
        descriptor: &DriverDescriptor,
    ) -> Result<()> {
        let field = descriptor
            .find_annotated_field(&[MarkerKind::JobInfo])
            .ok_or_else(|| {
                Error::Configuration(format!(
                    "驱动 {} 缺少作业描述标记字段",
                    descriptor.type_name
                ))
            })?;
        let info = match field.marker(MarkerKind::JobInfo) {
            Some(Marker::JobInfo(info)) => info,
            _ => {
                return Err(Error::Configuration(format!(
                    "字段 {} 的作业描述标记缺失",
                    field.name
                )))
            }
        };

        self.configure_name(job, info, descriptor)?;
        self.configure_reducers(job, info)?;

        let markers = collect_markers(info, field);
        debug!("字段 {} 收集到 {} 个标记", field.name, markers.len());
        self.dispatch(job, &markers, field)?;
        info!("作业 {} 配置完成", job.name);
        Ok(())
    }

    /// 便捷入口：新建作业描述符并配置
    pub fn build_job(&mut self, descriptor: &DriverDescriptor) -> Result<JobDescriptor> {
        let mut job = JobDescriptor::new();
        self.configure(&mut job, descriptor)?;
        Ok(job)
    }

    /// 作业名：主参数优先于次参数，都缺省时由驱动类型名推导；
    /// 结果再经一轮表达式求值
    fn configure_name(
        &self,
        job: &mut JobDescriptor,
        info: &JobInfo,
        descriptor: &DriverDescriptor,
    ) -> Result<()> {
        let raw = if !info.value.is_empty() {
            info.value.clone()
        } else if !info.name.is_empty() {
            info.name.clone()
        } else {
            default_driver_id(&descriptor.type_name)
        };
        let evaluated = self
            .evaluator
            .evaluate(&self.root, &self.context_map, &raw)?;
        job.set_name(&stringify(&evaluated));
        Ok(())
    }

    /// reduce任务数："-1" 表示不设置，数字字面量直接采用，
    /// 其余按表达式求值且结果必须为非负整数
    fn configure_reducers(&self, job: &mut JobDescriptor, info: &JobInfo) -> Result<()> {
        if info.num_reducers == "-1" {
            return Ok(());
        }
        if let Ok(num) = info.num_reducers.parse::<u32>() {
            job.set_num_reduce_tasks(num);
            return Ok(());
        }
        let value = self
            .evaluator
            .evaluate(&self.root, &self.context_map, &info.num_reducers)?;
        let num = match &value {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.parse::<u64>().ok(),
            _ => None,
        };
        match num {
            Some(n) => {
                job.set_num_reduce_tasks(n as u32);
                Ok(())
            }
            None => Err(Error::Configuration(format!(
                "reduce任务数表达式必须得到非负整数: {} -> {}",
                info.num_reducers,
                stringify(&value)
            ))),
        }
    }

    fn dispatch(
        &mut self,
        job: &mut JobDescriptor,
        markers: &[Marker],
        field: &MarkerTarget,
    ) -> Result<()> {
        let env = HandlerEnv {
            evaluator: &self.evaluator,
            root: &self.root,
            context: &self.context_map,
        };
        let policy = self.policy;
        self.registry.resolve();
        let mut claimed = vec![false; markers.len()];
        for handler in self.registry.handlers_mut() {
            // 最后运行梯队是兜底关切，不参与首配策略的标记认领
            let fallback = handler.run_last();
            for (i, marker) in markers.iter().enumerate() {
                if policy == DispatchPolicy::FirstMatch && claimed[i] && !fallback {
                    continue;
                }
                if !handler.accepts(marker) {
                    continue;
                }
                debug!("处理器 {} 处理 {:?} 标记", handler.name(), marker.kind());
                handler
                    .process(marker, job, Some(field), &env)
                    .map_err(|e| {
                        Error::Configuration(format!(
                            "处理器 {} 处理 {:?} 标记失败: {}",
                            handler.name(),
                            marker.kind(),
                            e
                        ))
                    })?;
                if !fallback {
                    claimed[i] = true;
                }
            }
        }
        Ok(())
    }
}

/// 收集待分发的标记：作业描述标记的内嵌子标记在前
/// （map、reduce、combine、排序、分组、分区的固定顺序），
/// 作业字段上的全部标记（含作业描述标记本身）在后。
fn collect_markers(info: &JobInfo, field: &MarkerTarget) -> Vec<Marker> {
    let mut markers = Vec::new();
    if let Some(map) = &info.map {
        markers.push(Marker::MapperInfo(map.clone()));
    }
    if let Some(reduce) = &info.reduce {
        markers.push(Marker::ReducerInfo(reduce.clone()));
    }
    if let Some(combine) = &info.combine {
        markers.push(Marker::CombinerInfo(combine.clone()));
    }
    if let Some(sorter) = &info.sorter {
        markers.push(Marker::Sorter(sorter.clone()));
    }
    if let Some(grouping) = &info.grouping {
        markers.push(Marker::Grouping(grouping.clone()));
    }
    if let Some(partitioner) = &info.partitioner {
        markers.push(Marker::Partitioner(partitioner.clone()));
    }
    markers.extend(field.markers.iter().cloned());
    markers
}
