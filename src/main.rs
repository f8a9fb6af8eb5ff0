// main.rs
// 演示入口：从命令行选项构建上下文，按声明式描述符配置一个
// 词频统计作业，并以表格打印最终作业配置。
use anyhow::Context as _;
use jobconf::context::DriverContext;
use jobconf::dispatcher::Engine;
use jobconf::driver::DriverDescriptor;
use jobconf::marker::{FileInput, FileOutput, JobInfo, Marker, MapperInfo, ReducerInfo};
use log::info;
use prettytable::{row, Table};
use serde::Serialize;
use std::collections::HashMap;

#[derive(Serialize)]
struct WordCountDriver {
    min_length: u32,
}

/// 解析 --name value 形式的命令行选项
fn parse_args() -> HashMap<String, String> {
    let mut supplied = HashMap::new();
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if let Some(name) = arg.strip_prefix("--") {
            if let Some(value) = args.next() {
                supplied.insert(name.to_string(), value);
            }
        }
    }
    supplied
}

fn descriptor() -> DriverDescriptor {
    DriverDescriptor::new("WordCountDriver").field(
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
    )
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut context = DriverContext::new();
    if let Err(e) = context.apply_options(&parse_args()) {
        eprintln!("{}", e);
        eprintln!("{}", context.usage());
        std::process::exit(2);
    }

    let driver = WordCountDriver { min_length: 3 };
    let mut engine = Engine::new(&driver, &context).context("构建配置引擎失败")?;
    let job = engine.build_job(&descriptor()).context("配置作业失败")?;
    info!("作业 {} 配置完成", job.name);

    let mut table = Table::new();
    table.add_row(row!["配置项", "值"]);
    table.add_row(row!["作业名", job.name]);
    table.add_row(row!["mapper", job.mapper_class.as_deref().unwrap_or("-")]);
    table.add_row(row!["reducer", job.reducer_class.as_deref().unwrap_or("-")]);
    table.add_row(row!["reduce任务数", job.num_reduce_tasks()]);
    table.add_row(row!["输入格式", job.input_format()]);
    table.add_row(row!["输入路径", job.input_paths().join(",")]);
    table.add_row(row!["输出格式", job.output_format()]);
    table.add_row(row!["输出路径", job.output_path().unwrap_or("-")]);
    table.printstd();

    Ok(())
}
