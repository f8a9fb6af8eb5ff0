// error.rs
// 定义项目通用的错误类型（配置、表达式求值、资源分发、用法等）和Result类型。
use std::fmt;
use std::io;

/// 项目通用错误类型，涵盖配置、表达式求值、资源分发、用法等错误
#[derive(Debug)]
pub enum Error {
    /// IO错误
    Io(io::Error),
    /// JSON序列化/反序列化错误
    Json(serde_json::Error),
    /// 配置阶段错误（标记发现、处理器分发、作业描述符修改），
    /// 消息中携带最底层的失败原因
    Configuration(String),
    /// 表达式求值错误，携带失败的子表达式
    Evaluation(String),
    /// 分布式资源打包/解包错误
    Resource(String),
    /// 用法错误（如缺少必需选项），在最外层以帮助信息呈现而非堆栈
    Usage(String),
}

/// 通用结果类型
pub type Result<T> = std::result::Result<T, Error>;

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Json(e)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "IO错误: {}", e),
            Error::Json(e) => write!(f, "JSON错误: {}", e),
            Error::Configuration(msg) => write!(f, "配置错误: {}", msg),
            Error::Evaluation(msg) => write!(f, "表达式求值错误: {}", msg),
            Error::Resource(msg) => write!(f, "资源分发错误: {}", msg),
            Error::Usage(msg) => write!(f, "用法错误: {}", msg),
        }
    }
}

impl std::error::Error for Error {}
