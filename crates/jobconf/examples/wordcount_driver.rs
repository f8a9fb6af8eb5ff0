use jobconf::dispatcher::Engine;
use jobconf::context::DriverContext;
use jobconf::driver::DriverDescriptor;
use jobconf::marker::{FileInput, FileOutput, JobInfo, Marker, MapperInfo, ReducerInfo};
use serde::Serialize;
use std::collections::HashMap;

/// 声明式词频统计驱动：配置全部来自字段上的标记
#[derive(Serialize)]
struct WordCountDriver {
    min_length: u32,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // ---- 1. 准备驱动上下文（模拟命令行选项） ----
    let mut context = DriverContext::new();
    let supplied = HashMap::from([
        ("input".to_string(), "/data/books".to_string()),
        ("output".to_string(), "/data/wordcount-out".to_string()),
    ]);
    context.apply_options(&supplied)?;
    println!("上下文就绪: input={:?} output={:?}", context.input(), context.output());

    // ---- 2. 声明驱动描述符 ----
    let descriptor = DriverDescriptor::new("WordCountDriver").field(
        "job",
        vec![
            Marker::JobInfo(
                JobInfo::default()
                    .num_reducers("2")
                    .map(MapperInfo::new("TokenizerMapper").output("Text", "LongWritable"))
                    .reduce(ReducerInfo::new("SumReducer").output("Text", "LongWritable")),
            ),
            Marker::FileInput(FileInput::default()),
            Marker::FileOutput(FileOutput::default()),
        ],
    );

    // ---- 3. 构建引擎并配置作业 ----
    let driver = WordCountDriver { min_length: 3 };
    let mut engine = Engine::new(&driver, &context)?;
    let job = engine.build_job(&descriptor)?;

    // ---- 4. 打印配置结果 ----
    println!("\n🎉 作业配置完成！🎉");
    println!("  作业名: {}", job.name);
    println!("  mapper: {:?}", job.mapper_class);
    println!("  reducer: {:?}", job.reducer_class);
    println!("  reduce任务数: {}", job.num_reduce_tasks());
    println!("  输入: {:?} (格式: {})", job.input_paths(), job.input_format());
    println!("  输出: {:?} (格式: {})", job.output_path(), job.output_format());

    Ok(())
}
