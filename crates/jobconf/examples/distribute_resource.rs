use jobconf::driver::DriverDescriptor;
use jobconf::job::JobDescriptor;
use jobconf::marker::{Distribute, Marker};
use jobconf::resource::{DistributedResourceManager, ResourceResolver, ResourceValue};
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct StopWords {
    words: Vec<String>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let store = tempfile::tempdir()?;
    let manager = DistributedResourceManager::new(store.path());
    let mut job = JobDescriptor::new();

    // ---- 1. 驱动端逐项登记资源 ----
    manager.register("separator", &ResourceValue::Text(",".to_string()), &mut job)?;
    let stop_words = StopWords {
        words: vec!["的".to_string(), "了".to_string()],
    };
    manager.register(
        "stop_words",
        &ResourceValue::object("StopWords", &stop_words)?,
        &mut job,
    )?;

    // ---- 2. 也可以按分发标记扫描驱动bean ----
    let descriptor = DriverDescriptor::new("CleanupDriver")
        .field("threshold", vec![Marker::Distribute(Distribute::default())]);
    let bean = json!({"threshold": 5});
    manager.register_bean_resources(&bean, &descriptor, &mut job)?;

    println!("作业配置中的资源记录:");
    for (key, value) in job.conf() {
        println!("  {} = {}", key, value);
    }
    println!("分发文件列表: {:?}", job.cache_files());

    // ---- 3. 工作端按名称取回 ----
    let resolver = ResourceResolver::new(&job, store.path());
    let separator: String = resolver.resolve_into("separator")?;
    let threshold: i64 = resolver.resolve_into("threshold")?;
    let restored: StopWords = resolver.resolve_into("stop_words")?;

    println!("\n🎉 工作端还原成功！🎉");
    println!("  separator = {:?}", separator);
    println!("  threshold = {}", threshold);
    println!("  stop_words = {:?}", restored);
    assert_eq!(restored, stop_words);

    Ok(())
}
