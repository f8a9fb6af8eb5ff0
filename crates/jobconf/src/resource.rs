// resource.rs
// 分布式资源打包/解包：驱动端把bean值按类型内联或落盘登记到作业，
// 工作端按名称取回并还原。
use crate::driver::{DriverDescriptor, MarkerTarget, TargetKind};
use crate::error::{Error, Result};
use crate::job::JobDescriptor;
use crate::marker::{Marker, MarkerKind};
use log::debug;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// 资源配置键前缀，完整键为前缀+资源名
pub const CONF_KEY_RESOURCE_PREFIX: &str = "jobconf.resource.";
/// 配置值中类型名与引用之间的分隔符
pub const VALUE_SEP: &str = "|";

/// 待分发的资源值。文本与基本类型内联进配置，
/// 路径按文件名登记到分发列表，对象序列化为临时JSON文件。
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceValue {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Path(PathBuf),
    Object { type_name: String, value: Value },
}

impl ResourceValue {
    /// 把任意可序列化对象包装为对象资源
    pub fn object<T: Serialize>(type_name: &str, value: &T) -> Result<Self> {
        Ok(ResourceValue::Object {
            type_name: type_name.to_string(),
            value: serde_json::to_value(value)?,
        })
    }

    /// 从bean属性值归类资源：字符串内联、数字与布尔内联，
    /// 结构与数组视为对象
    pub fn from_bean_value(value: &Value) -> Result<Self> {
        match value {
            Value::String(s) => Ok(ResourceValue::Text(s.clone())),
            Value::Bool(b) => Ok(ResourceValue::Bool(*b)),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(ResourceValue::Int(i))
                } else if let Some(f) = n.as_f64() {
                    Ok(ResourceValue::Float(f))
                } else {
                    Err(Error::Resource(format!("数字无法表示: {}", n)))
                }
            }
            Value::Null => Err(Error::Resource("资源值为空".to_string())),
            other => Ok(ResourceValue::Object {
                type_name: "json".to_string(),
                value: other.clone(),
            }),
        }
    }

    /// 转为JSON值，供反序列化与bean注入使用
    pub fn into_value(self) -> Value {
        match self {
            ResourceValue::Text(s) => Value::String(s),
            ResourceValue::Int(i) => Value::from(i),
            ResourceValue::Float(f) => Value::from(f),
            ResourceValue::Bool(b) => Value::Bool(b),
            ResourceValue::Path(p) => Value::String(p.to_string_lossy().into_owned()),
            ResourceValue::Object { value, .. } => value,
        }
    }

    fn type_name(&self) -> &str {
        match self {
            ResourceValue::Text(_) => "text",
            ResourceValue::Int(_) => "int",
            ResourceValue::Float(_) => "float",
            ResourceValue::Bool(_) => "bool",
            ResourceValue::Path(_) => "path",
            ResourceValue::Object { type_name, .. } => type_name,
        }
    }
}

/// 驱动端资源打包器。store_dir 为对象资源落盘目录。
pub struct DistributedResourceManager {
    store_dir: PathBuf,
}

impl DistributedResourceManager {
    pub fn new(store_dir: &Path) -> Self {
        Self {
            store_dir: store_dir.to_path_buf(),
        }
    }

    /// 登记一项资源：配置记录 `前缀+名称 = 类型名|引用`，
    /// 路径与对象资源同时加入作业分发文件列表
    pub fn register(
        &self,
        key: &str,
        value: &ResourceValue,
        job: &mut JobDescriptor,
    ) -> Result<()> {
        let reference = match value {
            ResourceValue::Text(s) => s.clone(),
            ResourceValue::Int(i) => i.to_string(),
            ResourceValue::Float(f) => f.to_string(),
            ResourceValue::Bool(b) => b.to_string(),
            ResourceValue::Path(path) => {
                let file_name = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .ok_or_else(|| {
                        Error::Resource(format!("路径缺少文件名: {}", path.display()))
                    })?;
                job.add_cache_file(&path.to_string_lossy());
                file_name.to_string()
            }
            ResourceValue::Object { type_name, value } => {
                let file_name = format!("{}-{}.json", type_name, Uuid::new_v4());
                let blob = self.store_dir.join(&file_name);
                fs::write(&blob, serde_json::to_vec(value)?)?;
                job.add_cache_file(&blob.to_string_lossy());
                file_name
            }
        };
        let conf_key = format!("{}{}", CONF_KEY_RESOURCE_PREFIX, key);
        let record = format!("{}{}{}", value.type_name(), VALUE_SEP, reference);
        debug!("登记资源 {} = {}", conf_key, record);
        job.set_conf(&conf_key, &record);
        Ok(())
    }

    /// 扫描驱动描述符上的分发标记，把bean对应属性逐一登记。
    /// 名称缺省时取声明名，方法声明剥除 get_ 前缀。
    pub fn register_bean_resources(
        &self,
        bean: &Value,
        descriptor: &DriverDescriptor,
        job: &mut JobDescriptor,
    ) -> Result<()> {
        let mut targets = descriptor.find_annotated_fields(&[MarkerKind::Distribute]);
        targets.extend(descriptor.find_annotated_methods(&[MarkerKind::Distribute]));
        for target in targets {
            let marker = match target.marker(MarkerKind::Distribute) {
                Some(Marker::Distribute(d)) => d,
                _ => continue,
            };
            let key = resource_key(&marker.name, target);
            let value = bean.get(&key).ok_or_else(|| {
                Error::Resource(format!("驱动bean缺少资源属性: {}", key))
            })?;
            self.register(&key, &ResourceValue::from_bean_value(value)?, job)?;
        }
        Ok(())
    }
}

/// 资源名：标记名优先，缺省取声明名，方法声明剥除 get_ 前缀
fn resource_key(name: &str, target: &MarkerTarget) -> String {
    if !name.is_empty() {
        name.to_string()
    } else if target.kind == TargetKind::Method {
        target
            .name
            .strip_prefix("get_")
            .unwrap_or(&target.name)
            .to_string()
    } else {
        target.name.clone()
    }
}

/// 工作端资源解包器：从作业配置与分发目录还原资源值
pub struct ResourceResolver<'a> {
    job: &'a JobDescriptor,
    cache_dir: PathBuf,
}

impl<'a> ResourceResolver<'a> {
    pub fn new(job: &'a JobDescriptor, cache_dir: &Path) -> Self {
        Self {
            job,
            cache_dir: cache_dir.to_path_buf(),
        }
    }

    /// 按名称取回资源。路径资源按文件名映射进分发目录，
    /// 对象资源从分发目录读回JSON。
    pub fn resolve(&self, key: &str) -> Result<ResourceValue> {
        let conf_key = format!("{}{}", CONF_KEY_RESOURCE_PREFIX, key);
        let record = self.job.get_conf(&conf_key).ok_or_else(|| {
            Error::Resource(format!("未登记的资源: {}", key))
        })?;
        let (type_name, reference) = record.split_once(VALUE_SEP).ok_or_else(|| {
            Error::Resource(format!("资源记录格式错误: {}", record))
        })?;
        match type_name {
            "text" => Ok(ResourceValue::Text(reference.to_string())),
            "int" => reference
                .parse::<i64>()
                .map(ResourceValue::Int)
                .map_err(|_| Error::Resource(format!("整数资源格式错误: {}", reference))),
            "float" => reference
                .parse::<f64>()
                .map(ResourceValue::Float)
                .map_err(|_| Error::Resource(format!("浮点资源格式错误: {}", reference))),
            "bool" => reference
                .parse::<bool>()
                .map(ResourceValue::Bool)
                .map_err(|_| Error::Resource(format!("布尔资源格式错误: {}", reference))),
            "path" => Ok(ResourceValue::Path(self.cache_dir.join(reference))),
            other => {
                let blob = self.cache_dir.join(reference);
                let bytes = fs::read(&blob)?;
                Ok(ResourceValue::Object {
                    type_name: other.to_string(),
                    value: serde_json::from_slice(&bytes)?,
                })
            }
        }
    }

    /// 取回资源并反序列化为目标类型，内联标量尽量做宽松转换
    pub fn resolve_into<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        Ok(serde_json::from_value(self.resolve(key)?.into_value())?)
    }

    /// 按资源注入标记填充工作端bean，与驱动端的分发扫描对称：
    /// 每个带注入标记的声明按同一命名规则取回资源，写入bean对应属性。
    pub fn resolve_bean_resources(
        &self,
        descriptor: &DriverDescriptor,
        bean: &mut Value,
    ) -> Result<()> {
        if !descriptor.has_any_marker(&[MarkerKind::Resource]) {
            return Ok(());
        }
        let properties = bean.as_object_mut().ok_or_else(|| {
            Error::Resource("工作端bean不是对象".to_string())
        })?;
        let mut targets = descriptor.find_annotated_fields(&[MarkerKind::Resource]);
        targets.extend(descriptor.find_annotated_methods(&[MarkerKind::Resource]));
        for target in targets {
            let marker = match target.marker(MarkerKind::Resource) {
                Some(Marker::Resource(r)) => r,
                _ => continue,
            };
            let key = resource_key(&marker.name, target);
            let value = self.resolve(&key)?.into_value();
            debug!("注入资源 {} 到声明 {}", key, target.name);
            properties.insert(key, value);
        }
        Ok(())
    }
}
