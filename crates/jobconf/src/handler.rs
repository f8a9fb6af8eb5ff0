// handler.rs
// 标记处理器契约：判断是否接受某个标记，并把标记的效果施加到作业描述符上。
use crate::error::Result;
use crate::evaluator::{stringify, ExpressionEvaluator};
use crate::job::JobDescriptor;
use crate::marker::Marker;
use crate::driver::MarkerTarget;
use serde_json::Value;
use std::collections::HashMap;

/// 处理器运行环境：求值器与根对象/上下文的只读视图
pub struct HandlerEnv<'a> {
    pub evaluator: &'a ExpressionEvaluator,
    pub root: &'a Value,
    pub context: &'a HashMap<String, Value>,
}

impl HandlerEnv<'_> {
    /// 对表达式求值，非表达式输入原样返回
    pub fn evaluate(&self, expr: &str) -> Result<Value> {
        self.evaluator.evaluate(self.root, self.context, expr)
    }

    /// 求值并取字符串形式
    pub fn evaluate_string(&self, expr: &str) -> Result<String> {
        Ok(stringify(&self.evaluate(expr)?))
    }
}

/// 标记处理器。实现者应无状态或仅持延迟初始化的状态；
/// run_last 在处理器生命周期内固定不变。
pub trait MarkerHandler {
    /// 处理器全限定名，供跳过列表按名排除
    fn name(&self) -> &'static str;

    /// 是否接受该标记
    fn accepts(&self, marker: &Marker) -> bool;

    /// 是否归入"最后运行"梯队（默认处理器用于兜底）
    fn run_last(&self) -> bool {
        false
    }

    /// 施加标记效果，修改作业描述符
    fn process(
        &mut self,
        marker: &Marker,
        job: &mut JobDescriptor,
        target: Option<&MarkerTarget>,
        env: &HandlerEnv,
    ) -> Result<()>;
}
