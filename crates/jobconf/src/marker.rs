// marker.rs
// 声明式标记词汇表：以带参枚举描述作业、输入输出、比较器、资源分发等元数据标记。
use serde::{Deserialize, Serialize};

/// 命名输出的"未设置"哨兵值
pub const DEFAULT_SENTINEL: &str = "default";

/// 标记种类，用于处理器的接受判断与分发
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarkerKind {
    JobInfo,
    MapperInfo,
    ReducerInfo,
    CombinerInfo,
    FileInput,
    FileOutput,
    TableInput,
    TableOutput,
    NamedOutput,
    ColumnarNamedOutput,
    MultiInput,
    MultiTableInput,
    Sorter,
    Grouping,
    Partitioner,
    Option,
    Distribute,
    Resource,
}

/// 键/值类型对，空字符串表示未设置（沿用作业级默认值）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeyValue {
    pub key: String,
    pub value: String,
}

impl KeyValue {
    pub fn new(key: &str, value: &str) -> Self {
        Self {
            key: key.to_string(),
            value: value.to_string(),
        }
    }
}

/// 作业描述标记，驱动的作业字段上的根标记。
/// value/name 为作业名（可为表达式），num_reducers 为 "-1" 表示不设置。
/// 可内嵌 mapper/reducer/combiner/排序/分组/分区子标记。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobInfo {
    pub value: String,
    pub name: String,
    pub num_reducers: String,
    pub map: Option<MapperInfo>,
    pub reduce: Option<ReducerInfo>,
    pub combine: Option<CombinerInfo>,
    pub sorter: Option<Sorter>,
    pub grouping: Option<Grouping>,
    pub partitioner: Option<Partitioner>,
}

impl Default for JobInfo {
    fn default() -> Self {
        Self {
            value: String::new(),
            name: String::new(),
            num_reducers: "-1".to_string(),
            map: None,
            reduce: None,
            combine: None,
            sorter: None,
            grouping: None,
            partitioner: None,
        }
    }
}

impl JobInfo {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn num_reducers(mut self, num_reducers: &str) -> Self {
        self.num_reducers = num_reducers.to_string();
        self
    }

    pub fn map(mut self, map: MapperInfo) -> Self {
        self.map = Some(map);
        self
    }

    pub fn reduce(mut self, reduce: ReducerInfo) -> Self {
        self.reduce = Some(reduce);
        self
    }

    pub fn combine(mut self, combine: CombinerInfo) -> Self {
        self.combine = Some(combine);
        self
    }

    pub fn sorter(mut self, sorter: Sorter) -> Self {
        self.sorter = Some(sorter);
        self
    }

    pub fn grouping(mut self, grouping: Grouping) -> Self {
        self.grouping = Some(grouping);
        self
    }

    pub fn partitioner(mut self, partitioner: Partitioner) -> Self {
        self.partitioner = Some(partitioner);
        self
    }
}

/// mapper描述标记，类型名为空表示未设置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MapperInfo {
    pub class_name: String,
    pub output: KeyValue,
}

impl MapperInfo {
    pub fn new(class_name: &str) -> Self {
        Self {
            class_name: class_name.to_string(),
            output: KeyValue::default(),
        }
    }

    pub fn output(mut self, key: &str, value: &str) -> Self {
        self.output = KeyValue::new(key, value);
        self
    }
}

/// reducer描述标记
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReducerInfo {
    pub class_name: String,
    pub output: KeyValue,
}

impl ReducerInfo {
    pub fn new(class_name: &str) -> Self {
        Self {
            class_name: class_name.to_string(),
            output: KeyValue::default(),
        }
    }

    pub fn output(mut self, key: &str, value: &str) -> Self {
        self.output = KeyValue::new(key, value);
        self
    }
}

/// combiner描述标记
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CombinerInfo {
    pub class_name: String,
}

impl CombinerInfo {
    pub fn new(class_name: &str) -> Self {
        Self {
            class_name: class_name.to_string(),
        }
    }
}

/// 文件输入标记：输入格式 + 路径表达式。
/// 路径默认取上下文的 input 属性。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileInput {
    pub format: String,
    pub path: String,
}

impl Default for FileInput {
    fn default() -> Self {
        Self {
            format: "text".to_string(),
            path: "${context.input}".to_string(),
        }
    }
}

impl FileInput {
    pub fn new(format: &str) -> Self {
        Self {
            format: format.to_string(),
            ..Self::default()
        }
    }

    pub fn path(mut self, path: &str) -> Self {
        self.path = path.to_string();
        self
    }
}

/// 文件输出标记：输出格式 + 路径表达式。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileOutput {
    pub format: String,
    pub path: String,
}

impl Default for FileOutput {
    fn default() -> Self {
        Self {
            format: "text".to_string(),
            path: "${context.output}".to_string(),
        }
    }
}

impl FileOutput {
    pub fn new(format: &str) -> Self {
        Self {
            format: format.to_string(),
            ..Self::default()
        }
    }

    pub fn path(mut self, path: &str) -> Self {
        self.path = path.to_string();
        self
    }
}

/// 表输入标记：表名表达式 + 扫描属性名，可内嵌mapper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableInput {
    pub table: String,
    pub scan_property: String,
    pub mapper: Option<MapperInfo>,
}

impl Default for TableInput {
    fn default() -> Self {
        Self {
            table: "${context.input}".to_string(),
            scan_property: "scan".to_string(),
            mapper: None,
        }
    }
}

impl TableInput {
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            ..Self::default()
        }
    }

    pub fn mapper(mut self, mapper: MapperInfo) -> Self {
        self.mapper = Some(mapper);
        self
    }
}

/// 表输出标记：表名表达式
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableOutput {
    pub table: String,
}

impl Default for TableOutput {
    fn default() -> Self {
        Self {
            table: "${context.output}".to_string(),
        }
    }
}

impl TableOutput {
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
        }
    }
}

/// 多路命名输出标记（普通变体）。
/// 名称可由主参数（value）或次参数（name）给出：
/// 主参数多于一个用主参数，否则次参数多于一个用次参数，
/// 否则取两者中不是 "default" 哨兵的那一个。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamedOutput {
    pub value: Vec<String>,
    pub name: Vec<String>,
    pub key_value: KeyValue,
    pub format: String,
    pub counters_enabled: bool,
}

impl Default for NamedOutput {
    fn default() -> Self {
        Self {
            value: vec![DEFAULT_SENTINEL.to_string()],
            name: vec![DEFAULT_SENTINEL.to_string()],
            key_value: KeyValue::default(),
            format: "text".to_string(),
            counters_enabled: false,
        }
    }
}

impl NamedOutput {
    pub fn new(names: &[&str]) -> Self {
        Self {
            value: names.iter().map(|s| s.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn format(mut self, format: &str) -> Self {
        self.format = format.to_string();
        self
    }

    pub fn key_value(mut self, key: &str, value: &str) -> Self {
        self.key_value = KeyValue::new(key, value);
        self
    }

    pub fn counters_enabled(mut self, enabled: bool) -> Self {
        self.counters_enabled = enabled;
        self
    }

    /// 按主/次参数规则解析出待注册的名称列表
    pub fn names(&self) -> Vec<String> {
        resolve_names(&self.value, &self.name)
    }
}

/// 多路命名输出标记（列式记录变体）。
/// 与普通变体同样的名称规则，key/value 由记录模式名替代。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnarNamedOutput {
    pub value: Vec<String>,
    pub name: Vec<String>,
    pub record: String,
    pub format: String,
    pub counters_enabled: bool,
}

impl Default for ColumnarNamedOutput {
    fn default() -> Self {
        Self {
            value: vec![DEFAULT_SENTINEL.to_string()],
            name: vec![DEFAULT_SENTINEL.to_string()],
            record: String::new(),
            format: "columnar".to_string(),
            counters_enabled: false,
        }
    }
}

impl ColumnarNamedOutput {
    pub fn new(names: &[&str], record: &str) -> Self {
        Self {
            value: names.iter().map(|s| s.to_string()).collect(),
            record: record.to_string(),
            ..Self::default()
        }
    }

    pub fn names(&self) -> Vec<String> {
        resolve_names(&self.value, &self.name)
    }
}

/// 名称解析规则，普通与列式命名输出共用
fn resolve_names(value: &[String], name: &[String]) -> Vec<String> {
    if value.len() > 1 {
        value.to_vec()
    } else if name.len() > 1 {
        name.to_vec()
    } else {
        let primary = value.first().map(String::as_str).unwrap_or(DEFAULT_SENTINEL);
        let secondary = name.first().map(String::as_str).unwrap_or(DEFAULT_SENTINEL);
        let chosen = if primary == DEFAULT_SENTINEL { secondary } else { primary };
        vec![chosen.to_string()]
    }
}

/// 多路输入中的单个输入项
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputSpec {
    pub format: String,
    pub mapper: String,
    pub path: String,
}

impl Default for InputSpec {
    fn default() -> Self {
        Self {
            format: "text".to_string(),
            mapper: String::new(),
            path: "${context.input}".to_string(),
        }
    }
}

impl InputSpec {
    pub fn new(format: &str, path: &str) -> Self {
        Self {
            format: format.to_string(),
            mapper: String::new(),
            path: path.to_string(),
        }
    }

    pub fn mapper(mut self, mapper: &str) -> Self {
        self.mapper = mapper.to_string();
        self
    }
}

/// 多路文件输入标记
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MultiInput {
    pub inputs: Vec<InputSpec>,
}

impl MultiInput {
    pub fn new(inputs: Vec<InputSpec>) -> Self {
        Self { inputs }
    }
}

/// 多路表输入标记
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MultiTableInput {
    pub tables: Vec<TableInput>,
}

impl MultiTableInput {
    pub fn new(tables: Vec<TableInput>) -> Self {
        Self { tables }
    }
}

/// 排序比较器标记，类型名为空表示未设置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Sorter {
    pub class_name: String,
}

impl Sorter {
    pub fn new(class_name: &str) -> Self {
        Self {
            class_name: class_name.to_string(),
        }
    }
}

/// 分组比较器标记
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Grouping {
    pub class_name: String,
}

impl Grouping {
    pub fn new(class_name: &str) -> Self {
        Self {
            class_name: class_name.to_string(),
        }
    }
}

/// 分区器标记
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Partitioner {
    pub class_name: String,
}

impl Partitioner {
    pub fn new(class_name: &str) -> Self {
        Self {
            class_name: class_name.to_string(),
        }
    }
}

/// 命令行选项标记：挂在上下文字段上，名称为空时取字段名
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OptionSpec {
    pub name: String,
    pub required: bool,
    pub default_value: String,
    pub description: String,
}

impl OptionSpec {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn default_value(mut self, default_value: &str) -> Self {
        self.default_value = default_value.to_string();
        self
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }
}

/// 资源分发标记：驱动端导出bean值，名称为空时取声明名
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Distribute {
    pub name: String,
}

impl Distribute {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

/// 资源注入标记：工作端按名称取回分发的资源
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceRef {
    pub name: String,
}

impl ResourceRef {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

/// 标记：附着在声明（类、字段或方法）上的一条不可变元数据
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Marker {
    JobInfo(JobInfo),
    MapperInfo(MapperInfo),
    ReducerInfo(ReducerInfo),
    CombinerInfo(CombinerInfo),
    FileInput(FileInput),
    FileOutput(FileOutput),
    TableInput(TableInput),
    TableOutput(TableOutput),
    NamedOutput(NamedOutput),
    ColumnarNamedOutput(ColumnarNamedOutput),
    MultiInput(MultiInput),
    MultiTableInput(MultiTableInput),
    Sorter(Sorter),
    Grouping(Grouping),
    Partitioner(Partitioner),
    Option(OptionSpec),
    Distribute(Distribute),
    Resource(ResourceRef),
}

impl Marker {
    /// 返回标记种类
    pub fn kind(&self) -> MarkerKind {
        match self {
            Marker::JobInfo(_) => MarkerKind::JobInfo,
            Marker::MapperInfo(_) => MarkerKind::MapperInfo,
            Marker::ReducerInfo(_) => MarkerKind::ReducerInfo,
            Marker::CombinerInfo(_) => MarkerKind::CombinerInfo,
            Marker::FileInput(_) => MarkerKind::FileInput,
            Marker::FileOutput(_) => MarkerKind::FileOutput,
            Marker::TableInput(_) => MarkerKind::TableInput,
            Marker::TableOutput(_) => MarkerKind::TableOutput,
            Marker::NamedOutput(_) => MarkerKind::NamedOutput,
            Marker::ColumnarNamedOutput(_) => MarkerKind::ColumnarNamedOutput,
            Marker::MultiInput(_) => MarkerKind::MultiInput,
            Marker::MultiTableInput(_) => MarkerKind::MultiTableInput,
            Marker::Sorter(_) => MarkerKind::Sorter,
            Marker::Grouping(_) => MarkerKind::Grouping,
            Marker::Partitioner(_) => MarkerKind::Partitioner,
            Marker::Option(_) => MarkerKind::Option,
            Marker::Distribute(_) => MarkerKind::Distribute,
            Marker::Resource(_) => MarkerKind::Resource,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_output_primary_list_wins() {
        let out = NamedOutput::new(&["one", "two"]);
        assert_eq!(out.names(), vec!["one", "two"]);
    }

    #[test]
    fn test_named_output_secondary_list() {
        let mut out = NamedOutput::default();
        out.name = vec!["a".to_string(), "b".to_string()];
        assert_eq!(out.names(), vec!["a", "b"]);
    }

    #[test]
    fn test_named_output_sentinel_rule() {
        let mut out = NamedOutput::default();
        out.name = vec!["only".to_string()];
        assert_eq!(out.names(), vec!["only"]);

        let out = NamedOutput::new(&["primary"]);
        assert_eq!(out.names(), vec!["primary"]);

        // 两者都是哨兵时，结果就是哨兵本身
        let out = NamedOutput::default();
        assert_eq!(out.names(), vec![DEFAULT_SENTINEL]);
    }

    #[test]
    fn test_job_info_defaults() {
        let info = JobInfo::default();
        assert_eq!(info.num_reducers, "-1");
        assert!(info.map.is_none());
    }
}
