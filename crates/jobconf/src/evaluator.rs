// evaluator.rs
// 表达式求值器，解析字符串中内嵌的 ${...} 属性路径表达式并对根对象/上下文求值。
use crate::error::{Error, Result};
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;

/// 上下文前缀，指向次级根对象（驱动上下文bean）
const CONTEXT_PREFIX: &str = "context.";
/// 主根对象的显式前缀，可写可不写
const THIS_PREFIX: &str = "this.";
/// 递归展开的最大深度：仅当某个跨段的求值结果本身又含跨段时计一轮，
/// 超过视为自引用死循环。原始输入里的跨段数量不受此限制。
const MAX_EXPANSIONS: usize = 16;

/// 表达式求值器，反复匹配 "(前缀)${(主体)}(后缀)" 直到不再出现 ${...} 跨段。
/// 主体是点分属性路径（支持 [n] 下标），相对主根对象求值；
/// 以 "context." 开头的主体改为相对上下文求值。
pub struct ExpressionEvaluator {
    pattern: Regex,
}

impl Default for ExpressionEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl ExpressionEvaluator {
    /// 创建新的求值器
    pub fn new() -> Self {
        // 贪婪前缀保证一次处理最后一个 ${...} 跨段，
        // 与逐轮重匹配配合可展开任意多个跨段
        Self {
            pattern: Regex::new(r"(?s)^(.*)\$\{(.+)\}(.*)$").expect("内置表达式模式非法"),
        }
    }

    /// 对表达式求值。无 ${...} 跨段的输入原样返回；
    /// 裸 ${...}（前后缀均空）保留求值结果的原生类型，
    /// 否则结果为 前缀 + 字符串化(值) + 后缀。
    pub fn evaluate(
        &self,
        root: &Value,
        context: &HashMap<String, Value>,
        expr: &str,
    ) -> Result<Value> {
        let mut value = Value::String(expr.to_string());
        let mut rounds = 0;

        loop {
            let text = match &value {
                Value::String(s) => s.clone(),
                other => stringify(other),
            };
            let caps = match self.pattern.captures(&text) {
                Some(caps) => caps,
                None => return Ok(value),
            };

            let prefix = caps.get(1).map_or("", |m| m.as_str());
            let body = caps.get(2).map_or("", |m| m.as_str());
            let suffix = caps.get(3).map_or("", |m| m.as_str());

            let resolved = self.evaluate_body(root, context, body)?;
            // 求值结果又引入新跨段才算一层递归
            if stringify(&resolved).contains("${") {
                rounds += 1;
                if rounds > MAX_EXPANSIONS {
                    return Err(Error::Evaluation(format!(
                        "表达式 [{}] 展开超过 {} 层，疑似自引用",
                        expr, MAX_EXPANSIONS
                    )));
                }
            }
            if prefix.is_empty() && suffix.is_empty() {
                value = resolved;
            } else {
                value = Value::String(format!("{}{}{}", prefix, stringify(&resolved), suffix));
            }
        }
    }

    /// 对单个 ${...} 主体求值
    fn evaluate_body(
        &self,
        root: &Value,
        context: &HashMap<String, Value>,
        body: &str,
    ) -> Result<Value> {
        let body = body.trim();
        if let Some(path) = body.strip_prefix(CONTEXT_PREFIX) {
            let ctx_root = context.get("context").ok_or_else(|| {
                Error::Evaluation(format!("求值 [{}] 失败: 上下文未绑定", body))
            })?;
            return eval_path(ctx_root, path)
                .ok_or_else(|| Error::Evaluation(format!("求值 [{}] 失败: 路径不存在", body)));
        }
        let path = body.strip_prefix(THIS_PREFIX).unwrap_or(body);
        eval_path(root, path)
            .ok_or_else(|| Error::Evaluation(format!("求值 [{}] 失败: 路径不存在", body)))
    }
}

/// 沿点分路径（含 [n] 下标段）向下导航
fn eval_path(start: &Value, path: &str) -> Option<Value> {
    if path.is_empty() {
        return None;
    }
    let mut current = start;
    for segment in path.split('.') {
        let (name, indexes) = split_indexes(segment)?;
        if !name.is_empty() {
            current = current.get(name)?;
        }
        for idx in indexes {
            current = current.get(idx)?;
        }
    }
    Some(current.clone())
}

/// 拆分 "name[1][2]" 形式的路径段，返回名称与下标序列
fn split_indexes(segment: &str) -> Option<(&str, Vec<usize>)> {
    match segment.find('[') {
        None => Some((segment, Vec::new())),
        Some(pos) => {
            let name = &segment[..pos];
            let mut indexes = Vec::new();
            let mut rest = &segment[pos..];
            while let Some(stripped) = rest.strip_prefix('[') {
                let end = stripped.find(']')?;
                indexes.push(stripped[..end].parse().ok()?);
                rest = &stripped[end + 1..];
            }
            if rest.is_empty() {
                Some((name, indexes))
            } else {
                None
            }
        }
    }
}

/// 将JSON值转为拼接用的字符串形式（字符串不带引号）
pub fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn setup() -> (Value, HashMap<String, Value>) {
        let root = json!({
            "name": "aTool",
            "x": 5,
            "paths": ["/data/in", "/data/out"],
        });
        let mut context = HashMap::new();
        context.insert(
            "context".to_string(),
            json!({
                "hello": "Hello",
                "value1": 2147483647i64,
                "value2": 9223372036854775807i64,
                "input": "/input/dir",
            }),
        );
        (root, context)
    }

    #[test]
    fn test_plain_text_passthrough() {
        let (root, ctx) = setup();
        let eval = ExpressionEvaluator::new();
        let result = eval.evaluate(&root, &ctx, "plain text").unwrap();
        assert_eq!(result, Value::String("plain text".to_string()));
    }

    #[test]
    fn test_bare_span_preserves_native_type() {
        let (root, ctx) = setup();
        let eval = ExpressionEvaluator::new();
        let result = eval.evaluate(&root, &ctx, "${x}").unwrap();
        assert_eq!(result, json!(5));
    }

    #[test]
    fn test_embedded_span_yields_string() {
        let (root, ctx) = setup();
        let eval = ExpressionEvaluator::new();
        let result = eval.evaluate(&root, &ctx, "prefix-${x}").unwrap();
        assert_eq!(result, Value::String("prefix-5".to_string()));
    }

    #[test]
    fn test_this_prefix_and_context_prefix() {
        let (root, ctx) = setup();
        let eval = ExpressionEvaluator::new();
        assert_eq!(
            eval.evaluate(&root, &ctx, "The name is ${this.name}").unwrap(),
            Value::String("The name is aTool".to_string())
        );
        assert_eq!(
            eval.evaluate(&root, &ctx, "${context.hello} there, Frank!").unwrap(),
            Value::String("Hello there, Frank!".to_string())
        );
    }

    #[test]
    fn test_literal_dollar_before_span() {
        let (root, ctx) = setup();
        let eval = ExpressionEvaluator::new();
        let result = eval
            .evaluate(&root, &ctx, "If I give you $${context.value1}, will you be my friend?")
            .unwrap();
        assert_eq!(
            result,
            Value::String("If I give you $2147483647, will you be my friend?".to_string())
        );
    }

    #[test]
    fn test_multiple_spans() {
        let (root, ctx) = setup();
        let eval = ExpressionEvaluator::new();
        let result = eval
            .evaluate(
                &root,
                &ctx,
                "${context.hello}! Please give me $${context.value1} today or ${context.value2} tomorrow.",
            )
            .unwrap();
        assert_eq!(
            result,
            Value::String(
                "Hello! Please give me $2147483647 today or 9223372036854775807 tomorrow."
                    .to_string()
            )
        );
    }

    #[test]
    fn test_index_access() {
        let (root, ctx) = setup();
        let eval = ExpressionEvaluator::new();
        let result = eval.evaluate(&root, &ctx, "${paths[1]}").unwrap();
        assert_eq!(result, Value::String("/data/out".to_string()));
    }

    #[test]
    fn test_recursive_expansion() {
        let root = json!({ "a": "${b}", "b": 42 });
        let ctx = HashMap::new();
        let eval = ExpressionEvaluator::new();
        assert_eq!(eval.evaluate(&root, &ctx, "${a}").unwrap(), json!(42));
    }

    #[test]
    fn test_many_independent_spans_are_not_capped() {
        let (root, ctx) = setup();
        let eval = ExpressionEvaluator::new();
        // 原始输入里的跨段数量不设上限，只有递归展开才受限
        let expr = vec!["${x}"; 17].join("-");
        let result = eval.evaluate(&root, &ctx, &expr).unwrap();
        assert_eq!(result, Value::String(vec!["5"; 17].join("-")));
    }

    #[test]
    fn test_self_reference_capped() {
        let root = json!({ "a": "${a}" });
        let ctx = HashMap::new();
        let eval = ExpressionEvaluator::new();
        let err = eval.evaluate(&root, &ctx, "${a}").unwrap_err();
        assert!(matches!(err, Error::Evaluation(_)));
    }

    #[test]
    fn test_unknown_path_fails() {
        let (root, ctx) = setup();
        let eval = ExpressionEvaluator::new();
        assert!(eval.evaluate(&root, &ctx, "${missing.path}").is_err());
    }
}
