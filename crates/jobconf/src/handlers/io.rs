// handlers/io.rs
// 输入输出类标记处理器：文件、表、命名输出、多路输入与默认格式兜底。
use crate::error::{Error, Result};
use crate::evaluator::stringify;
use crate::handler::{HandlerEnv, MarkerHandler};
use crate::job::{JobDescriptor, MultiInputRecord, NamedOutputRecord};
use crate::driver::MarkerTarget;
use crate::marker::{ColumnarNamedOutput, FileInput, FileOutput, Marker, TableInput};
use log::debug;
use serde_json::Value;
use std::collections::HashSet;

/// 表输入输出使用的格式名
pub const TABLE_FORMAT: &str = "table";
/// 多路输入携带各自mapper时注入的委派mapper类型名
pub const DELEGATING_MAPPER: &str = "jobconf::DelegatingMapper";

/// 表输入名配置键
pub const CONF_KEY_TABLE_INPUT: &str = "jobconf.table.input";
/// 表输入扫描描述配置键（JSON序列化）
pub const CONF_KEY_TABLE_SCAN: &str = "jobconf.table.scan";
/// 表输出名配置键
pub const CONF_KEY_TABLE_OUTPUT: &str = "jobconf.table.output";
/// 多路表输入名列表配置键（逗号分隔）
pub const CONF_KEY_TABLE_INPUTS: &str = "jobconf.table.inputs";
/// 命名输出计数器开关配置键
pub const CONF_KEY_NAMED_OUTPUT_COUNTERS: &str = "jobconf.named-output.counters";
/// 列式记录序列化开关配置键
pub const CONF_KEY_COLUMNAR_SERIALIZATION: &str = "jobconf.io.serializations";

/// 对路径表达式求值并展开为路径列表。
/// 字符串得到单路径，数组逐项展开，其余标量取字符串形式。
fn evaluated_paths(env: &HandlerEnv, expr: &str) -> Result<Vec<String>> {
    match env.evaluate(expr)? {
        Value::String(s) => Ok(vec![s]),
        Value::Array(items) => Ok(items.iter().map(stringify).collect()),
        Value::Null => Err(Error::Configuration(format!(
            "路径表达式求值为空: {}",
            expr
        ))),
        other => Ok(vec![stringify(&other)]),
    }
}

/// 文件输入标记的共用施加逻辑，默认输入处理器兜底时复用
fn apply_file_input(input: &FileInput, job: &mut JobDescriptor, env: &HandlerEnv) -> Result<()> {
    job.set_input_format(&input.format);
    job.set_input_paths(evaluated_paths(env, &input.path)?);
    Ok(())
}

/// 文件输出标记的共用施加逻辑
fn apply_file_output(output: &FileOutput, job: &mut JobDescriptor, env: &HandlerEnv) -> Result<()> {
    job.set_output_format(&output.format);
    job.set_output_path(&env.evaluate_string(&output.path)?);
    Ok(())
}

/// 处理文件输入标记：设置输入格式并登记求值后的输入路径
pub struct FileInputHandler;

impl MarkerHandler for FileInputHandler {
    fn name(&self) -> &'static str {
        "jobconf::handlers::io::FileInputHandler"
    }

    fn accepts(&self, marker: &Marker) -> bool {
        matches!(marker, Marker::FileInput(_))
    }

    fn process(
        &mut self,
        marker: &Marker,
        job: &mut JobDescriptor,
        _target: Option<&MarkerTarget>,
        env: &HandlerEnv,
    ) -> Result<()> {
        if let Marker::FileInput(input) = marker {
            apply_file_input(input, job, env)?;
        }
        Ok(())
    }
}

/// 处理文件输出标记：设置输出格式与求值后的输出路径
pub struct FileOutputHandler;

impl MarkerHandler for FileOutputHandler {
    fn name(&self) -> &'static str {
        "jobconf::handlers::io::FileOutputHandler"
    }

    fn accepts(&self, marker: &Marker) -> bool {
        matches!(marker, Marker::FileOutput(_))
    }

    fn process(
        &mut self,
        marker: &Marker,
        job: &mut JobDescriptor,
        _target: Option<&MarkerTarget>,
        env: &HandlerEnv,
    ) -> Result<()> {
        if let Marker::FileOutput(output) = marker {
            apply_file_output(output, job, env)?;
        }
        Ok(())
    }
}

/// 表输入标记的共用施加逻辑，多路表输入复用（不动输入格式）
fn apply_table_input(
    table: &TableInput,
    job: &mut JobDescriptor,
    env: &HandlerEnv,
) -> Result<String> {
    let name = env.evaluate_string(&table.table)?;
    // 扫描描述是驱动bean上的可选属性，存在时以JSON记入配置
    if !table.scan_property.is_empty() {
        if let Some(scan) = env.root.get(&table.scan_property) {
            job.set_conf(CONF_KEY_TABLE_SCAN, &serde_json::to_string(scan)?);
        }
    }
    if let Some(mapper) = &table.mapper {
        if !mapper.class_name.is_empty() {
            super::job::apply_mapper_info(mapper, job, None);
        }
    }
    Ok(name)
}

/// 处理表输入标记：设置表输入格式、登记表名与扫描描述，应用内嵌mapper
pub struct TableInputHandler;

impl MarkerHandler for TableInputHandler {
    fn name(&self) -> &'static str {
        "jobconf::handlers::io::TableInputHandler"
    }

    fn accepts(&self, marker: &Marker) -> bool {
        matches!(marker, Marker::TableInput(_))
    }

    fn process(
        &mut self,
        marker: &Marker,
        job: &mut JobDescriptor,
        _target: Option<&MarkerTarget>,
        env: &HandlerEnv,
    ) -> Result<()> {
        if let Marker::TableInput(table) = marker {
            job.set_input_format(TABLE_FORMAT);
            let name = apply_table_input(table, job, env)?;
            job.set_conf(CONF_KEY_TABLE_INPUT, &name);
        }
        Ok(())
    }
}

/// 处理表输出标记：设置表输出格式并登记求值后的表名
pub struct TableOutputHandler;

impl MarkerHandler for TableOutputHandler {
    fn name(&self) -> &'static str {
        "jobconf::handlers::io::TableOutputHandler"
    }

    fn accepts(&self, marker: &Marker) -> bool {
        matches!(marker, Marker::TableOutput(_))
    }

    fn process(
        &mut self,
        marker: &Marker,
        job: &mut JobDescriptor,
        _target: Option<&MarkerTarget>,
        env: &HandlerEnv,
    ) -> Result<()> {
        if let Marker::TableOutput(table) = marker {
            job.set_output_format(TABLE_FORMAT);
            let name = env.evaluate_string(&table.table)?;
            job.set_conf(CONF_KEY_TABLE_OUTPUT, &name);
        }
        Ok(())
    }
}

/// 处理命名输出标记：解析名称列表并逐个注册，
/// 已配置过的名称跳过，key/value类型缺省回落到作业输出类型。
#[derive(Default)]
pub struct NamedOutputHandler {
    configured: HashSet<String>,
}

impl MarkerHandler for NamedOutputHandler {
    fn name(&self) -> &'static str {
        "jobconf::handlers::io::NamedOutputHandler"
    }

    fn accepts(&self, marker: &Marker) -> bool {
        matches!(marker, Marker::NamedOutput(_))
    }

    fn process(
        &mut self,
        marker: &Marker,
        job: &mut JobDescriptor,
        _target: Option<&MarkerTarget>,
        env: &HandlerEnv,
    ) -> Result<()> {
        if let Marker::NamedOutput(out) = marker {
            let key_class = if out.key_value.key.is_empty() {
                job.output_key_class.clone().unwrap_or_default()
            } else {
                out.key_value.key.clone()
            };
            let value_class = if out.key_value.value.is_empty() {
                job.output_value_class.clone().unwrap_or_default()
            } else {
                out.key_value.value.clone()
            };
            for name in out.names() {
                let resolved = env.evaluate_string(&name)?;
                if !self.configured.insert(resolved.clone()) {
                    debug!("命名输出已配置，跳过: {}", resolved);
                    continue;
                }
                job.add_named_output(NamedOutputRecord {
                    name: resolved,
                    format: out.format.clone(),
                    key_class: key_class.clone(),
                    value_class: value_class.clone(),
                    record_schema: None,
                    counters_enabled: out.counters_enabled,
                });
            }
            if out.counters_enabled {
                job.set_conf(CONF_KEY_NAMED_OUTPUT_COUNTERS, "true");
            }
        }
        Ok(())
    }
}

/// 处理列式命名输出标记：同命名输出的名称规则，
/// 记录模式名取代key/value类型，并打开列式序列化。
#[derive(Default)]
pub struct ColumnarNamedOutputHandler {
    configured: HashSet<String>,
}

impl ColumnarNamedOutputHandler {
    fn register(
        &mut self,
        out: &ColumnarNamedOutput,
        job: &mut JobDescriptor,
        env: &HandlerEnv,
    ) -> Result<()> {
        for name in out.names() {
            let resolved = env.evaluate_string(&name)?;
            if !self.configured.insert(resolved.clone()) {
                debug!("命名输出已配置，跳过: {}", resolved);
                continue;
            }
            job.add_named_output(NamedOutputRecord {
                name: resolved,
                format: out.format.clone(),
                key_class: String::new(),
                value_class: String::new(),
                record_schema: Some(out.record.clone()),
                counters_enabled: out.counters_enabled,
            });
        }
        job.set_conf(CONF_KEY_COLUMNAR_SERIALIZATION, "columnar");
        if out.counters_enabled {
            job.set_conf(CONF_KEY_NAMED_OUTPUT_COUNTERS, "true");
        }
        Ok(())
    }
}

impl MarkerHandler for ColumnarNamedOutputHandler {
    fn name(&self) -> &'static str {
        "jobconf::handlers::io::ColumnarNamedOutputHandler"
    }

    fn accepts(&self, marker: &Marker) -> bool {
        matches!(marker, Marker::ColumnarNamedOutput(_))
    }

    fn process(
        &mut self,
        marker: &Marker,
        job: &mut JobDescriptor,
        _target: Option<&MarkerTarget>,
        env: &HandlerEnv,
    ) -> Result<()> {
        if let Marker::ColumnarNamedOutput(out) = marker {
            self.register(out, job, env)?;
        }
        Ok(())
    }
}

/// 处理多路文件输入标记：逐项登记路径/格式/mapper。
/// 任一输入项自带mapper时，作业mapper改为委派mapper。
pub struct MultiInputHandler;

impl MarkerHandler for MultiInputHandler {
    fn name(&self) -> &'static str {
        "jobconf::handlers::io::MultiInputHandler"
    }

    fn accepts(&self, marker: &Marker) -> bool {
        matches!(marker, Marker::MultiInput(_))
    }

    fn process(
        &mut self,
        marker: &Marker,
        job: &mut JobDescriptor,
        _target: Option<&MarkerTarget>,
        env: &HandlerEnv,
    ) -> Result<()> {
        if let Marker::MultiInput(multi) = marker {
            for spec in &multi.inputs {
                for path in evaluated_paths(env, &spec.path)? {
                    let mapper = if spec.mapper.is_empty() {
                        None
                    } else {
                        Some(spec.mapper.clone())
                    };
                    if mapper.is_some() {
                        job.mapper_class = Some(DELEGATING_MAPPER.to_string());
                    }
                    job.add_multi_input(MultiInputRecord {
                        path,
                        format: spec.format.clone(),
                        mapper,
                    });
                }
            }
        }
        Ok(())
    }
}

/// 处理多路表输入标记：逐表登记，表名列表逗号连接记入配置
pub struct MultiTableInputHandler;

impl MarkerHandler for MultiTableInputHandler {
    fn name(&self) -> &'static str {
        "jobconf::handlers::io::MultiTableInputHandler"
    }

    fn accepts(&self, marker: &Marker) -> bool {
        matches!(marker, Marker::MultiTableInput(_))
    }

    fn process(
        &mut self,
        marker: &Marker,
        job: &mut JobDescriptor,
        _target: Option<&MarkerTarget>,
        env: &HandlerEnv,
    ) -> Result<()> {
        if let Marker::MultiTableInput(multi) = marker {
            job.set_input_format(TABLE_FORMAT);
            let mut names = Vec::new();
            for table in &multi.tables {
                let name = apply_table_input(table, job, env)?;
                job.add_multi_input(MultiInputRecord {
                    path: name.clone(),
                    format: TABLE_FORMAT.to_string(),
                    mapper: table.mapper.as_ref().map(|m| m.class_name.clone()),
                });
                names.push(name);
            }
            job.set_conf(CONF_KEY_TABLE_INPUTS, &names.join(","));
        }
        Ok(())
    }
}

/// 默认输入兜底处理器（最后运行）：输入格式仍为默认
/// 且未登记任何输入时，按默认文件输入标记配置
pub struct DefaultInputHandler;

impl MarkerHandler for DefaultInputHandler {
    fn name(&self) -> &'static str {
        "jobconf::handlers::io::DefaultInputHandler"
    }

    fn accepts(&self, marker: &Marker) -> bool {
        matches!(marker, Marker::JobInfo(_))
    }

    fn run_last(&self) -> bool {
        true
    }

    fn process(
        &mut self,
        _marker: &Marker,
        job: &mut JobDescriptor,
        _target: Option<&MarkerTarget>,
        env: &HandlerEnv,
    ) -> Result<()> {
        if job.is_default_input_format()
            && job.input_paths().is_empty()
            && job.multi_inputs().is_empty()
        {
            debug!("未配置输入，应用默认文件输入");
            apply_file_input(&FileInput::default(), job, env)?;
        }
        Ok(())
    }
}

/// 默认输出兜底处理器（最后运行）：输出格式仍为默认
/// 且未设置输出路径时，按默认文件输出标记配置
pub struct DefaultOutputHandler;

impl MarkerHandler for DefaultOutputHandler {
    fn name(&self) -> &'static str {
        "jobconf::handlers::io::DefaultOutputHandler"
    }

    fn accepts(&self, marker: &Marker) -> bool {
        matches!(marker, Marker::JobInfo(_))
    }

    fn run_last(&self) -> bool {
        true
    }

    fn process(
        &mut self,
        _marker: &Marker,
        job: &mut JobDescriptor,
        _target: Option<&MarkerTarget>,
        env: &HandlerEnv,
    ) -> Result<()> {
        if job.is_default_output_format() && job.output_path().is_none() {
            debug!("未配置输出，应用默认文件输出");
            apply_file_output(&FileOutput::default(), job, env)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::ExpressionEvaluator;
    use crate::marker::{InputSpec, JobInfo, MultiInput, NamedOutput, TableOutput};
    use serde_json::json;
    use std::collections::HashMap;

    fn context_map(pairs: &[(&str, &str)]) -> HashMap<String, Value> {
        let mut bean = serde_json::Map::new();
        for (k, v) in pairs {
            bean.insert(k.to_string(), json!(v));
        }
        HashMap::from([("context".to_string(), Value::Object(bean))])
    }

    #[test]
    fn test_file_input_sets_format_and_paths() {
        let evaluator = ExpressionEvaluator::new();
        let root = json!({});
        let context = context_map(&[("input", "/data/in")]);
        let env = HandlerEnv {
            evaluator: &evaluator,
            root: &root,
            context: &context,
        };

        let mut job = JobDescriptor::new();
        let marker = Marker::FileInput(FileInput::new("sequence"));
        FileInputHandler.process(&marker, &mut job, None, &env).unwrap();
        assert_eq!(job.input_format(), "sequence");
        assert_eq!(job.input_paths(), &["/data/in".to_string()]);
    }

    #[test]
    fn test_file_input_expands_array_paths() {
        let evaluator = ExpressionEvaluator::new();
        let root = json!({"paths": ["/a", "/b"]});
        let context = context_map(&[]);
        let env = HandlerEnv {
            evaluator: &evaluator,
            root: &root,
            context: &context,
        };

        let mut job = JobDescriptor::new();
        let marker = Marker::FileInput(FileInput::default().path("${paths}"));
        FileInputHandler.process(&marker, &mut job, None, &env).unwrap();
        assert_eq!(job.input_paths(), &["/a".to_string(), "/b".to_string()]);
    }

    #[test]
    fn test_default_output_is_noop_when_configured() {
        let evaluator = ExpressionEvaluator::new();
        let root = json!({});
        let context = context_map(&[("output", "/ignored")]);
        let env = HandlerEnv {
            evaluator: &evaluator,
            root: &root,
            context: &context,
        };

        let mut job = JobDescriptor::new();
        job.set_output_path("/explicit");
        let marker = Marker::JobInfo(JobInfo::default());
        let before = job.clone();
        DefaultOutputHandler.process(&marker, &mut job, None, &env).unwrap();
        assert_eq!(job.output_path(), before.output_path());
        assert!(job.is_default_output_format());
    }

    #[test]
    fn test_default_input_applies_context_path() {
        let evaluator = ExpressionEvaluator::new();
        let root = json!({});
        let context = context_map(&[("input", "/data/in")]);
        let env = HandlerEnv {
            evaluator: &evaluator,
            root: &root,
            context: &context,
        };

        let mut job = JobDescriptor::new();
        let marker = Marker::JobInfo(JobInfo::default());
        DefaultInputHandler.process(&marker, &mut job, None, &env).unwrap();
        assert_eq!(job.input_paths(), &["/data/in".to_string()]);
        assert!(job.is_default_input_format());
    }

    #[test]
    fn test_named_output_registration_and_fallback() {
        let evaluator = ExpressionEvaluator::new();
        let root = json!({});
        let context = context_map(&[]);
        let env = HandlerEnv {
            evaluator: &evaluator,
            root: &root,
            context: &context,
        };

        let mut job = JobDescriptor::new();
        job.output_key_class = Some("Text".to_string());
        job.output_value_class = Some("LongWritable".to_string());

        let mut handler = NamedOutputHandler::default();
        let marker = Marker::NamedOutput(NamedOutput::new(&["stats", "errors"]));
        handler.process(&marker, &mut job, None, &env).unwrap();
        // 重复处理是无操作
        handler.process(&marker, &mut job, None, &env).unwrap();

        assert_eq!(job.named_outputs().len(), 2);
        assert_eq!(job.named_outputs()[0].key_class, "Text");
        assert_eq!(job.named_outputs()[1].value_class, "LongWritable");
    }

    #[test]
    fn test_multi_input_with_own_mappers_uses_delegating_mapper() {
        let evaluator = ExpressionEvaluator::new();
        let root = json!({});
        let context = context_map(&[]);
        let env = HandlerEnv {
            evaluator: &evaluator,
            root: &root,
            context: &context,
        };

        let mut job = JobDescriptor::new();
        job.mapper_class = Some("PlainMapper".to_string());
        let marker = Marker::MultiInput(MultiInput::new(vec![
            InputSpec::new("text", "/logs").mapper("LogMapper"),
            InputSpec::new("sequence", "/events").mapper("EventMapper"),
        ]));
        MultiInputHandler.process(&marker, &mut job, None, &env).unwrap();

        assert_eq!(job.mapper_class.as_deref(), Some(DELEGATING_MAPPER));
        assert_eq!(job.multi_inputs().len(), 2);
        assert_eq!(job.multi_inputs()[0].mapper.as_deref(), Some("LogMapper"));
    }

    #[test]
    fn test_table_input_records_name_and_scan() {
        let evaluator = ExpressionEvaluator::new();
        let root = json!({"scan": {"columns": ["f1:a"]}});
        let context = context_map(&[("input", "events_table")]);
        let env = HandlerEnv {
            evaluator: &evaluator,
            root: &root,
            context: &context,
        };

        let mut job = JobDescriptor::new();
        let marker = Marker::TableInput(TableInput::default());
        TableInputHandler.process(&marker, &mut job, None, &env).unwrap();

        assert_eq!(job.input_format(), TABLE_FORMAT);
        assert_eq!(job.get_conf(CONF_KEY_TABLE_INPUT), Some("events_table"));
        assert!(job.get_conf(CONF_KEY_TABLE_SCAN).unwrap().contains("f1:a"));
    }

    #[test]
    fn test_table_output_records_name() {
        let evaluator = ExpressionEvaluator::new();
        let root = json!({});
        let context = context_map(&[("output", "result_table")]);
        let env = HandlerEnv {
            evaluator: &evaluator,
            root: &root,
            context: &context,
        };

        let mut job = JobDescriptor::new();
        let marker = Marker::TableOutput(TableOutput::default());
        TableOutputHandler.process(&marker, &mut job, None, &env).unwrap();

        assert_eq!(job.output_format(), TABLE_FORMAT);
        assert_eq!(job.get_conf(CONF_KEY_TABLE_OUTPUT), Some("result_table"));
    }
}
