// handlers/job.rs
// 作业组件类标记处理器：mapper/reducer/combiner与排序、分组、分区器。
use crate::error::Result;
use crate::handler::{HandlerEnv, MarkerHandler};
use crate::job::JobDescriptor;
use crate::driver::MarkerTarget;
use crate::marker::{MapperInfo, Marker, MarkerKind};

/// 是否按仅map作业镜像输出类型：作业声明了零个reduce任务，
/// 且作业字段上没有声明过reducer（独立标记或内嵌子标记）。
fn mirrors_as_map_only(job: &JobDescriptor, target: Option<&MarkerTarget>) -> bool {
    if !job.is_map_only() {
        return false;
    }
    target.map_or(true, |t| {
        let declared = t.has_any_marker(&[MarkerKind::ReducerInfo])
            || matches!(
                t.marker(MarkerKind::JobInfo),
                Some(Marker::JobInfo(info)) if info.reduce.is_some()
            );
        !declared
    })
}

/// mapper描述的共用施加逻辑，表输入的内嵌mapper复用。
/// 仅map作业把map输出类型同时镜像为作业输出类型。
pub(crate) fn apply_mapper_info(
    info: &MapperInfo,
    job: &mut JobDescriptor,
    target: Option<&MarkerTarget>,
) {
    if !info.class_name.is_empty() {
        job.mapper_class = Some(info.class_name.clone());
    }
    if !info.output.key.is_empty() {
        job.map_output_key_class = Some(info.output.key.clone());
    }
    if !info.output.value.is_empty() {
        job.map_output_value_class = Some(info.output.value.clone());
    }
    if mirrors_as_map_only(job, target) {
        if !info.output.key.is_empty() {
            job.output_key_class = Some(info.output.key.clone());
        }
        if !info.output.value.is_empty() {
            job.output_value_class = Some(info.output.value.clone());
        }
    }
}

/// 处理mapper描述标记
pub struct MapperInfoHandler;

impl MarkerHandler for MapperInfoHandler {
    fn name(&self) -> &'static str {
        "jobconf::handlers::job::MapperInfoHandler"
    }

    fn accepts(&self, marker: &Marker) -> bool {
        matches!(marker, Marker::MapperInfo(_))
    }

    fn process(
        &mut self,
        marker: &Marker,
        job: &mut JobDescriptor,
        target: Option<&MarkerTarget>,
        _env: &HandlerEnv,
    ) -> Result<()> {
        if let Marker::MapperInfo(info) = marker {
            apply_mapper_info(info, job, target);
        }
        Ok(())
    }
}

/// 处理reducer描述标记：设置reducer类与作业输出类型
pub struct ReducerInfoHandler;

impl MarkerHandler for ReducerInfoHandler {
    fn name(&self) -> &'static str {
        "jobconf::handlers::job::ReducerInfoHandler"
    }

    fn accepts(&self, marker: &Marker) -> bool {
        matches!(marker, Marker::ReducerInfo(_))
    }

    fn process(
        &mut self,
        marker: &Marker,
        job: &mut JobDescriptor,
        _target: Option<&MarkerTarget>,
        _env: &HandlerEnv,
    ) -> Result<()> {
        if let Marker::ReducerInfo(info) = marker {
            if !info.class_name.is_empty() {
                job.reducer_class = Some(info.class_name.clone());
            }
            if !info.output.key.is_empty() {
                job.output_key_class = Some(info.output.key.clone());
            }
            if !info.output.value.is_empty() {
                job.output_value_class = Some(info.output.value.clone());
            }
        }
        Ok(())
    }
}

/// 处理combiner描述标记
pub struct CombinerInfoHandler;

impl MarkerHandler for CombinerInfoHandler {
    fn name(&self) -> &'static str {
        "jobconf::handlers::job::CombinerInfoHandler"
    }

    fn accepts(&self, marker: &Marker) -> bool {
        matches!(marker, Marker::CombinerInfo(_))
    }

    fn process(
        &mut self,
        marker: &Marker,
        job: &mut JobDescriptor,
        _target: Option<&MarkerTarget>,
        _env: &HandlerEnv,
    ) -> Result<()> {
        if let Marker::CombinerInfo(info) = marker {
            if !info.class_name.is_empty() {
                job.combiner_class = Some(info.class_name.clone());
            }
        }
        Ok(())
    }
}

/// 处理排序比较器标记
pub struct SorterHandler;

impl MarkerHandler for SorterHandler {
    fn name(&self) -> &'static str {
        "jobconf::handlers::job::SorterHandler"
    }

    fn accepts(&self, marker: &Marker) -> bool {
        matches!(marker, Marker::Sorter(_))
    }

    fn process(
        &mut self,
        marker: &Marker,
        job: &mut JobDescriptor,
        _target: Option<&MarkerTarget>,
        _env: &HandlerEnv,
    ) -> Result<()> {
        if let Marker::Sorter(sorter) = marker {
            if !sorter.class_name.is_empty() {
                job.sort_comparator_class = Some(sorter.class_name.clone());
            }
        }
        Ok(())
    }
}

/// 处理分组比较器标记
pub struct GroupingHandler;

impl MarkerHandler for GroupingHandler {
    fn name(&self) -> &'static str {
        "jobconf::handlers::job::GroupingHandler"
    }

    fn accepts(&self, marker: &Marker) -> bool {
        matches!(marker, Marker::Grouping(_))
    }

    fn process(
        &mut self,
        marker: &Marker,
        job: &mut JobDescriptor,
        _target: Option<&MarkerTarget>,
        _env: &HandlerEnv,
    ) -> Result<()> {
        if let Marker::Grouping(grouping) = marker {
            if !grouping.class_name.is_empty() {
                job.grouping_comparator_class = Some(grouping.class_name.clone());
            }
        }
        Ok(())
    }
}

/// 处理分区器标记
pub struct PartitionerHandler;

impl MarkerHandler for PartitionerHandler {
    fn name(&self) -> &'static str {
        "jobconf::handlers::job::PartitionerHandler"
    }

    fn accepts(&self, marker: &Marker) -> bool {
        matches!(marker, Marker::Partitioner(_))
    }

    fn process(
        &mut self,
        marker: &Marker,
        job: &mut JobDescriptor,
        _target: Option<&MarkerTarget>,
        _env: &HandlerEnv,
    ) -> Result<()> {
        if let Marker::Partitioner(partitioner) = marker {
            if !partitioner.class_name.is_empty() {
                job.partitioner_class = Some(partitioner.class_name.clone());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::DriverDescriptor;
    use crate::evaluator::ExpressionEvaluator;
    use crate::marker::{JobInfo, ReducerInfo};
    use serde_json::{json, Value};
    use std::collections::HashMap;

    fn with_env<F: FnOnce(&HandlerEnv)>(f: F) {
        let evaluator = ExpressionEvaluator::new();
        let root = json!({});
        let context: HashMap<String, Value> = HashMap::new();
        let env = HandlerEnv {
            evaluator: &evaluator,
            root: &root,
            context: &context,
        };
        f(&env);
    }

    #[test]
    fn test_mapper_info_sets_classes() {
        with_env(|env| {
            let mut job = JobDescriptor::new();
            let marker = Marker::MapperInfo(MapperInfo::new("TokenMapper").output("Text", "Long"));
            MapperInfoHandler.process(&marker, &mut job, None, env).unwrap();
            assert_eq!(job.mapper_class.as_deref(), Some("TokenMapper"));
            assert_eq!(job.map_output_key_class.as_deref(), Some("Text"));
            // 默认reduce任务数为1，不是仅map作业
            assert!(job.output_key_class.is_none());
        });
    }

    #[test]
    fn test_map_only_mirrors_output_classes() {
        with_env(|env| {
            let mut job = JobDescriptor::new();
            job.set_num_reduce_tasks(0);
            let marker = Marker::MapperInfo(MapperInfo::new("TokenMapper").output("Text", "Long"));
            MapperInfoHandler.process(&marker, &mut job, None, env).unwrap();
            assert_eq!(job.output_key_class.as_deref(), Some("Text"));
            assert_eq!(job.output_value_class.as_deref(), Some("Long"));
        });
    }

    #[test]
    fn test_declared_reducer_blocks_map_only_mirror() {
        with_env(|env| {
            let descriptor = DriverDescriptor::new("TestTool").field(
                "job",
                vec![
                    Marker::JobInfo(JobInfo::default()),
                    Marker::ReducerInfo(ReducerInfo::new("SumReducer")),
                ],
            );
            let target = &descriptor.fields[0];

            let mut job = JobDescriptor::new();
            job.set_num_reduce_tasks(0);
            let marker = Marker::MapperInfo(MapperInfo::new("TokenMapper").output("Text", "Long"));
            MapperInfoHandler.process(&marker, &mut job, Some(target), env).unwrap();
            assert!(job.output_key_class.is_none());
        });
    }

    #[test]
    fn test_reducer_info_sets_output_classes() {
        with_env(|env| {
            let mut job = JobDescriptor::new();
            let marker = Marker::ReducerInfo(ReducerInfo::new("SumReducer").output("Text", "Long"));
            ReducerInfoHandler.process(&marker, &mut job, None, env).unwrap();
            assert_eq!(job.reducer_class.as_deref(), Some("SumReducer"));
            assert_eq!(job.output_key_class.as_deref(), Some("Text"));
        });
    }

    #[test]
    fn test_empty_class_names_leave_job_untouched() {
        with_env(|env| {
            let mut job = JobDescriptor::new();
            SorterHandler
                .process(&Marker::Sorter(crate::marker::Sorter::default()), &mut job, None, env)
                .unwrap();
            GroupingHandler
                .process(&Marker::Grouping(crate::marker::Grouping::default()), &mut job, None, env)
                .unwrap();
            assert!(job.sort_comparator_class.is_none());
            assert!(job.grouping_comparator_class.is_none());
        });
    }
}
