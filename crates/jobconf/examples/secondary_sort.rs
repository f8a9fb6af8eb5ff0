use jobconf::composite_key::{
    CompositeSortKey, CompositeSortKeySerialization, GroupingComparator, KeyPartitioner,
    NaturalSortComparator, ReverseSortComparator,
};
use jobconf::job::JobDescriptor;
use std::cmp::Ordering;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // ---- 1. 构造乱序的复合键集合 ----
    let mut keys: Vec<CompositeSortKey<String, i32>> =
        [("C", 2), ("A", 2), ("C", 1), ("B", 2), ("A", 1), ("B", 1)]
            .iter()
            .map(|(g, s)| CompositeSortKey::new(g.to_string(), *s))
            .collect();
    println!("原始键序:");
    for k in &keys {
        println!("  {}-{}", k.group_key(), k.sort_key());
    }

    // ---- 2. 自然顺序与逆序 ----
    keys.sort_by(|a, b| NaturalSortComparator.compare(a, b));
    println!("\n自然顺序（组升序、组内升序）:");
    for k in &keys {
        println!("  {}-{}", k.group_key(), k.sort_key());
    }

    keys.sort_by(|a, b| ReverseSortComparator.compare(a, b));
    println!("\n逆序（组升序、组内降序）:");
    for k in &keys {
        println!("  {}-{}", k.group_key(), k.sort_key());
    }

    // ---- 3. 分组比较器把组内键视为相等 ----
    let a = CompositeSortKey::new("A".to_string(), 1);
    let b = CompositeSortKey::new("A".to_string(), 2);
    println!(
        "\n分组比较 A-1 与 A-2: {:?}（相等即归入同一次reduce调用）",
        GroupingComparator.compare(&a, &b) == Ordering::Equal
    );

    // ---- 4. 分区：同组必然同分区 ----
    let partitioner = KeyPartitioner::<String, i32>::new();
    println!(
        "A-1 与 A-2 的分区: {} 与 {}",
        partitioner.partition(&a, 4),
        partitioner.partition(&b, 4)
    );

    // ---- 5. 把复合键接进作业配置 ----
    let mut job = JobDescriptor::new();
    CompositeSortKeySerialization::configure_map_output_key(&mut job, "String", "i32");
    println!("\nmap输出键类型: {:?}", job.map_output_key_class);
    println!("排序比较器: {:?}", job.sort_comparator_class);
    println!("分组比较器: {:?}", job.grouping_comparator_class);
    println!("分区器: {:?}", job.partitioner_class);

    Ok(())
}
