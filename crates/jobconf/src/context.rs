// context.rs
// 驱动上下文：由选项标记构建的命名值集合，作为表达式求值的次级根对象。
use crate::driver::DriverDescriptor;
use crate::error::{Error, Result};
use crate::marker::{Marker, OptionSpec};
use log::warn;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// 所有驱动上下文都具备的基础选项
const BASE_OPTIONS: [&str; 3] = ["input", "output", "archive"];

/// 驱动上下文。选项解析本身（命令行语法、帮助打印）在外部完成，
/// 这里消费解析好的字符串映射，校验必需项并应用默认值。
#[derive(Debug, Clone, Default)]
pub struct DriverContext {
    options: Vec<OptionSpec>,
    values: Map<String, Value>,
}

impl DriverContext {
    /// 创建只含基础选项（input/output/archive）的上下文
    pub fn new() -> Self {
        let mut ctx = Self::default();
        for name in BASE_OPTIONS {
            ctx.options.push(OptionSpec::new(name));
        }
        ctx
    }

    /// 从上下文描述符收集选项标记：类级标记在前，
    /// 字段与方法声明在后（同名以后注册者为准）。
    /// 标记名为空时取字段声明名；方法声明名剥除 get_ 前缀；
    /// 类级标记没有声明名可回退，名字为空的忽略。
    pub fn from_descriptor(descriptor: &DriverDescriptor) -> Self {
        let mut ctx = Self::new();
        for marker in &descriptor.class_markers {
            if let Marker::Option(spec) = marker {
                if spec.name.is_empty() {
                    warn!("忽略无名的类级选项标记: {}", descriptor.type_name);
                    continue;
                }
                ctx.add_option(spec.clone());
            }
        }
        for field in &descriptor.fields {
            for marker in &field.markers {
                if let Marker::Option(spec) = marker {
                    let mut spec = spec.clone();
                    if spec.name.is_empty() {
                        spec.name = field.name.clone();
                    }
                    ctx.add_option(spec);
                }
            }
        }
        for method in &descriptor.methods {
            for marker in &method.markers {
                if let Marker::Option(spec) = marker {
                    let mut spec = spec.clone();
                    if spec.name.is_empty() {
                        spec.name = method
                            .name
                            .strip_prefix("get_")
                            .unwrap_or(&method.name)
                            .to_string();
                    }
                    ctx.add_option(spec);
                }
            }
        }
        ctx
    }

    /// 注册一个选项，同名选项以后注册者为准
    pub fn add_option(&mut self, spec: OptionSpec) {
        self.options.retain(|o| o.name != spec.name);
        self.options.push(spec);
    }

    /// 应用外部解析好的选项值：缺少必需项报用法错误，
    /// 未注册的键忽略（与外部解析器的宽松语义一致）。
    pub fn apply_options(&mut self, supplied: &HashMap<String, String>) -> Result<()> {
        for key in supplied.keys() {
            if !self.options.iter().any(|o| &o.name == key) {
                warn!("忽略未注册的选项: {}", key);
            }
        }
        for spec in &self.options {
            match supplied.get(&spec.name) {
                Some(value) => {
                    self.values
                        .insert(spec.name.clone(), Value::String(value.clone()));
                }
                None if !spec.default_value.is_empty() => {
                    self.values.insert(
                        spec.name.clone(),
                        Value::String(spec.default_value.clone()),
                    );
                }
                None if spec.required => {
                    return Err(Error::Usage(format!(
                        "缺少必需选项 --{}{}\n{}",
                        spec.name,
                        if spec.description.is_empty() {
                            String::new()
                        } else {
                            format!(" ({})", spec.description)
                        },
                        self.usage()
                    )));
                }
                None => {}
            }
        }
        Ok(())
    }

    /// 直接设置一个上下文值
    pub fn set(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn input(&self) -> Option<&str> {
        self.values.get("input").and_then(Value::as_str)
    }

    pub fn output(&self) -> Option<&str> {
        self.values.get("output").and_then(Value::as_str)
    }

    /// 生成表达式求值用的bean视图（"context." 前缀指向的根）
    pub fn as_bean(&self) -> Value {
        Value::Object(self.values.clone())
    }

    /// 渲染选项帮助文本（用法错误时呈现给用户）
    pub fn usage(&self) -> String {
        let mut lines = vec!["可用选项:".to_string()];
        for spec in &self.options {
            lines.push(format!(
                "  --{}{}{}{}",
                spec.name,
                if spec.required { " (必需)" } else { "" },
                if spec.default_value.is_empty() {
                    String::new()
                } else {
                    format!(" [默认: {}]", spec.default_value)
                },
                if spec.description.is_empty() {
                    String::new()
                } else {
                    format!("  {}", spec.description)
                },
            ));
        }
        lines.join("\n")
    }
}
