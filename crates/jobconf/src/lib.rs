// lib.rs
// 声明式作业配置引擎入口，声明并导出各子模块。
pub mod composite_key;
pub mod context;
pub mod dispatcher;
pub mod driver;
pub mod error;
pub mod evaluator;
pub mod handler;
pub mod handlers;
pub mod job;
pub mod marker;
pub mod registry;
pub mod resource;

pub use context::DriverContext;
pub use dispatcher::{DispatchPolicy, Engine};
pub use driver::DriverDescriptor;
pub use error::{Error, Result};
pub use job::JobDescriptor;
pub use marker::Marker;
