// handlers/mod.rs
// 内置标记处理器集合与统一注册入口。
pub mod io;
pub mod job;

pub use io::{
    ColumnarNamedOutputHandler, DefaultInputHandler, DefaultOutputHandler, FileInputHandler,
    FileOutputHandler, MultiInputHandler, MultiTableInputHandler, NamedOutputHandler,
    TableInputHandler, TableOutputHandler,
};
pub use job::{
    CombinerInfoHandler, GroupingHandler, MapperInfoHandler, PartitionerHandler,
    ReducerInfoHandler, SorterHandler,
};

use crate::registry::HandlerRegistry;

/// 注册全部内置处理器。两个默认格式处理器最后追加，
/// 且均在"最后运行"梯队，保证用户处理器先有机会配置输入输出。
pub fn register_builtin_handlers(registry: &mut HandlerRegistry) {
    registry.register(Box::new(FileInputHandler));
    registry.register(Box::new(FileOutputHandler));
    registry.register(Box::new(TableInputHandler));
    registry.register(Box::new(TableOutputHandler));
    registry.register(Box::new(MultiInputHandler));
    registry.register(Box::new(MultiTableInputHandler));
    registry.register(Box::<NamedOutputHandler>::default());
    registry.register(Box::<ColumnarNamedOutputHandler>::default());
    registry.register(Box::new(MapperInfoHandler));
    registry.register(Box::new(ReducerInfoHandler));
    registry.register(Box::new(CombinerInfoHandler));
    registry.register(Box::new(SorterHandler));
    registry.register(Box::new(GroupingHandler));
    registry.register(Box::new(PartitionerHandler));
    registry.register(Box::new(DefaultInputHandler));
    registry.register(Box::new(DefaultOutputHandler));
}
