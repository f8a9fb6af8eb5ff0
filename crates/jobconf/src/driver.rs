// driver.rs
// 驱动描述符：在构造期通过显式注册建立的标记索引，以及按标记种类的发现操作。
use crate::marker::{Marker, MarkerKind};
use serde::{Deserialize, Serialize};

/// 声明的种类（类、字段或方法）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetKind {
    Class,
    Field,
    Method,
}

/// 携带标记的声明：名称 + 附着的标记列表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkerTarget {
    pub name: String,
    pub kind: TargetKind,
    pub markers: Vec<Marker>,
}

impl MarkerTarget {
    /// 此声明是否带有任一给定种类的标记
    pub fn has_any_marker(&self, kinds: &[MarkerKind]) -> bool {
        self.markers.iter().any(|m| kinds.contains(&m.kind()))
    }

    /// 取第一个给定种类的标记
    pub fn marker(&self, kind: MarkerKind) -> Option<&Marker> {
        self.markers.iter().find(|m| m.kind() == kind)
    }
}

/// 驱动描述符：驱动类型名、类级标记、字段与方法声明的有序索引。
/// 注册顺序保留为声明顺序；字段仅限直接声明，方法在构建时
/// 由调用方合并祖先声明后单次扫描查找。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DriverDescriptor {
    pub type_name: String,
    pub class_markers: Vec<Marker>,
    pub fields: Vec<MarkerTarget>,
    pub methods: Vec<MarkerTarget>,
}

impl DriverDescriptor {
    /// 以驱动类型名创建空描述符
    pub fn new(type_name: &str) -> Self {
        Self {
            type_name: type_name.to_string(),
            ..Self::default()
        }
    }

    /// 注册一个类级标记
    pub fn class_marker(mut self, marker: Marker) -> Self {
        self.class_markers.push(marker);
        self
    }

    /// 注册一个带标记的字段声明
    pub fn field(mut self, name: &str, markers: Vec<Marker>) -> Self {
        self.fields.push(MarkerTarget {
            name: name.to_string(),
            kind: TargetKind::Field,
            markers,
        });
        self
    }

    /// 注册一个带标记的方法声明
    pub fn method(mut self, name: &str, markers: Vec<Marker>) -> Self {
        self.methods.push(MarkerTarget {
            name: name.to_string(),
            kind: TargetKind::Method,
            markers,
        });
        self
    }

    /// 查找第一个带任一给定标记种类的字段
    pub fn find_annotated_field(&self, kinds: &[MarkerKind]) -> Option<&MarkerTarget> {
        self.fields.iter().find(|f| f.has_any_marker(kinds))
    }

    /// 查找所有带任一给定标记种类的字段，按声明顺序
    pub fn find_annotated_fields(&self, kinds: &[MarkerKind]) -> Vec<&MarkerTarget> {
        self.fields.iter().filter(|f| f.has_any_marker(kinds)).collect()
    }

    /// 查找第一个带任一给定标记种类的方法
    pub fn find_annotated_method(&self, kinds: &[MarkerKind]) -> Option<&MarkerTarget> {
        self.methods.iter().find(|m| m.has_any_marker(kinds))
    }

    /// 查找所有带任一给定标记种类的方法，按声明顺序
    pub fn find_annotated_methods(&self, kinds: &[MarkerKind]) -> Vec<&MarkerTarget> {
        self.methods.iter().filter(|m| m.has_any_marker(kinds)).collect()
    }

    /// 类本身或任一声明是否带有给定种类的标记
    pub fn has_any_marker(&self, kinds: &[MarkerKind]) -> bool {
        self.class_markers.iter().any(|m| kinds.contains(&m.kind()))
            || self.fields.iter().any(|f| f.has_any_marker(kinds))
            || self.methods.iter().any(|m| m.has_any_marker(kinds))
    }
}

/// 由驱动类型名生成默认作业标识：去掉末尾的 Driver/Tool/Job，
/// 按驼峰边界拆分后以连字符连接并转小写。如 'MyTestJob' 得到 'my-test'。
pub fn default_driver_id(type_name: &str) -> String {
    let simple = type_name.rsplit("::").next().unwrap_or(type_name);
    let stripped = ["Driver", "Tool", "Job"]
        .iter()
        .find_map(|suffix| {
            simple
                .strip_suffix(suffix)
                .filter(|rest| !rest.is_empty())
        })
        .unwrap_or(simple);
    split_camel_case(stripped).join("-").to_lowercase()
}

/// 按字符类型/驼峰边界拆分标识符
fn split_camel_case(name: &str) -> Vec<String> {
    let chars: Vec<char> = name.chars().collect();
    let mut tokens: Vec<String> = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        let boundary = if current.is_empty() {
            false
        } else if c.is_uppercase() {
            let prev = chars[i - 1];
            // 小写/数字后跟大写，或大写串结束于新词首（如 XMLParser 的 P）
            prev.is_lowercase()
                || prev.is_ascii_digit()
                || (prev.is_uppercase()
                    && chars.get(i + 1).map_or(false, |n| n.is_lowercase()))
        } else if c.is_ascii_digit() {
            !chars[i - 1].is_ascii_digit()
        } else {
            chars[i - 1].is_ascii_digit()
        };

        if boundary {
            tokens.push(std::mem::take(&mut current));
        }
        current.push(c);
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marker::{FileInput, JobInfo, OptionSpec};

    #[test]
    fn test_default_driver_id() {
        assert_eq!(default_driver_id("MyTestJob"), "my-test");
        assert_eq!(default_driver_id("WordCountTool"), "word-count");
        assert_eq!(default_driver_id("PrepareInputsExample"), "prepare-inputs-example");
        assert_eq!(default_driver_id("XMLParserDriver"), "xml-parser");
        // 路径限定名只取末段
        assert_eq!(default_driver_id("example::WordCountDriver"), "word-count");
        // 整个名字就是后缀时不剥除
        assert_eq!(default_driver_id("Job"), "job");
    }

    #[test]
    fn test_find_annotated_field_order() {
        let descriptor = DriverDescriptor::new("TestTool")
            .field("other", vec![Marker::FileInput(FileInput::default())])
            .field("job", vec![Marker::JobInfo(JobInfo::default())])
            .field("job2", vec![Marker::JobInfo(JobInfo::default())]);

        let found = descriptor.find_annotated_field(&[MarkerKind::JobInfo]).unwrap();
        assert_eq!(found.name, "job");
        assert_eq!(descriptor.find_annotated_fields(&[MarkerKind::JobInfo]).len(), 2);
    }

    #[test]
    fn test_find_annotated_methods() {
        let descriptor = DriverDescriptor::new("TestTool")
            .method("get_blacklist", vec![Marker::Option(OptionSpec::new("blacklist"))]);
        assert!(descriptor.find_annotated_method(&[MarkerKind::Option]).is_some());
        assert!(descriptor.find_annotated_method(&[MarkerKind::Distribute]).is_none());
    }
}
