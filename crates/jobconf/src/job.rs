// job.rs
// 作业描述符：本引擎产出、外部批处理框架消费的可变配置对象。
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 输入/输出格式的框架默认值
pub const DEFAULT_FORMAT: &str = "text";

/// 命名输出注册记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedOutputRecord {
    pub name: String,
    pub format: String,
    pub key_class: String,
    pub value_class: String,
    /// 列式记录变体携带的模式名
    pub record_schema: Option<String>,
    pub counters_enabled: bool,
}

/// 多路输入注册记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiInputRecord {
    pub path: String,
    pub format: String,
    pub mapper: Option<String>,
}

/// 作业描述符。引擎只做增量修改，从不整体替换；
/// 处理器对同一标记实例至多调用一次，修改需幂等。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobDescriptor {
    pub name: String,
    input_format: Option<String>,
    output_format: Option<String>,
    input_paths: Vec<String>,
    output_path: Option<String>,
    pub mapper_class: Option<String>,
    pub reducer_class: Option<String>,
    pub combiner_class: Option<String>,
    pub map_output_key_class: Option<String>,
    pub map_output_value_class: Option<String>,
    pub output_key_class: Option<String>,
    pub output_value_class: Option<String>,
    pub sort_comparator_class: Option<String>,
    pub grouping_comparator_class: Option<String>,
    pub partitioner_class: Option<String>,
    num_reduce_tasks: Option<u32>,
    named_outputs: Vec<NamedOutputRecord>,
    multi_inputs: Vec<MultiInputRecord>,
    /// 通用键值配置存储（有序，便于比对与传播）
    conf: BTreeMap<String, String>,
    /// 待分发到工作节点的文件（按注册顺序）
    cache_files: Vec<String>,
}

impl JobDescriptor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    pub fn set_input_format(&mut self, format: &str) {
        self.input_format = Some(format.to_string());
    }

    /// 输入格式，未显式设置时为框架默认
    pub fn input_format(&self) -> &str {
        self.input_format.as_deref().unwrap_or(DEFAULT_FORMAT)
    }

    /// 输入格式是否仍为框架默认（从未被显式设置或设置为默认值）
    pub fn is_default_input_format(&self) -> bool {
        self.input_format() == DEFAULT_FORMAT
    }

    pub fn set_output_format(&mut self, format: &str) {
        self.output_format = Some(format.to_string());
    }

    pub fn output_format(&self) -> &str {
        self.output_format.as_deref().unwrap_or(DEFAULT_FORMAT)
    }

    pub fn is_default_output_format(&self) -> bool {
        self.output_format() == DEFAULT_FORMAT
    }

    pub fn add_input_path(&mut self, path: &str) {
        self.input_paths.push(path.to_string());
    }

    pub fn set_input_paths(&mut self, paths: Vec<String>) {
        self.input_paths = paths;
    }

    pub fn input_paths(&self) -> &[String] {
        &self.input_paths
    }

    pub fn set_output_path(&mut self, path: &str) {
        self.output_path = Some(path.to_string());
    }

    pub fn output_path(&self) -> Option<&str> {
        self.output_path.as_deref()
    }

    pub fn set_num_reduce_tasks(&mut self, num: u32) {
        self.num_reduce_tasks = Some(num);
    }

    /// reduce任务数，未设置时沿用框架默认1
    pub fn num_reduce_tasks(&self) -> u32 {
        self.num_reduce_tasks.unwrap_or(1)
    }

    pub fn is_map_only(&self) -> bool {
        self.num_reduce_tasks == Some(0)
    }

    /// 注册命名输出。名称视为集合：重复注册同名输出是静默无操作。
    /// 返回是否发生了实际注册。
    pub fn add_named_output(&mut self, record: NamedOutputRecord) -> bool {
        if self.named_outputs.iter().any(|r| r.name == record.name) {
            return false;
        }
        self.named_outputs.push(record);
        true
    }

    pub fn named_outputs(&self) -> &[NamedOutputRecord] {
        &self.named_outputs
    }

    pub fn add_multi_input(&mut self, record: MultiInputRecord) {
        self.multi_inputs.push(record);
    }

    pub fn multi_inputs(&self) -> &[MultiInputRecord] {
        &self.multi_inputs
    }

    pub fn set_conf(&mut self, key: &str, value: &str) {
        self.conf.insert(key.to_string(), value.to_string());
    }

    pub fn get_conf(&self, key: &str) -> Option<&str> {
        self.conf.get(key).map(String::as_str)
    }

    pub fn conf(&self) -> &BTreeMap<String, String> {
        &self.conf
    }

    pub fn add_cache_file(&mut self, name: &str) {
        self.cache_files.push(name.to_string());
    }

    pub fn cache_files(&self) -> &[String] {
        &self.cache_files
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_format_detection() {
        let mut job = JobDescriptor::new();
        assert!(job.is_default_input_format());
        assert!(job.is_default_output_format());

        job.set_input_format("sequence");
        assert!(!job.is_default_input_format());
        // 显式设回默认值仍算默认
        job.set_output_format(DEFAULT_FORMAT);
        assert!(job.is_default_output_format());
    }

    #[test]
    fn test_named_output_set_semantics() {
        let mut job = JobDescriptor::new();
        let record = NamedOutputRecord {
            name: "stats".to_string(),
            format: "text".to_string(),
            key_class: "Text".to_string(),
            value_class: "LongWritable".to_string(),
            record_schema: None,
            counters_enabled: false,
        };
        assert!(job.add_named_output(record.clone()));
        assert!(!job.add_named_output(record));
        assert_eq!(job.named_outputs().len(), 1);
    }

    #[test]
    fn test_map_only_detection() {
        let mut job = JobDescriptor::new();
        assert!(!job.is_map_only());
        job.set_num_reduce_tasks(0);
        assert!(job.is_map_only());
    }
}
