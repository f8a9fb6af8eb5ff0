// composite_key.rs
// 二次排序复合键：分组键决定分区与归组，排序键只影响组内顺序。
// 附带自然/逆序/分组比较器、原始字节比较器与分区函数。
use crate::error::{Error, Result};
use crate::job::JobDescriptor;
use std::cmp::Ordering;
use std::marker::PhantomData;

/// 分组键类型名配置键
pub const CONF_KEY_GROUP_KEY_CLASS: &str = "jobconf.composite-key.group-class";
/// 排序键类型名配置键
pub const CONF_KEY_SORT_KEY_CLASS: &str = "jobconf.composite-key.sort-class";
/// 复合键与配套组件的类型名，记入作业描述符
pub const COMPOSITE_KEY_CLASS: &str = "jobconf::CompositeSortKey";
pub const NATURAL_COMPARATOR_CLASS: &str = "jobconf::NaturalSortComparator";
pub const GROUPING_COMPARATOR_CLASS: &str = "jobconf::GroupingComparator";
pub const KEY_PARTITIONER_CLASS: &str = "jobconf::KeyPartitioner";

/// 从原始字节解码键的读取缓冲
pub struct KeyBuffer<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> KeyBuffer<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.pos + n > self.bytes.len() {
            return Err(Error::Configuration(format!(
                "键字节不足: 需要{}字节, 剩余{}字节",
                n,
                self.bytes.len() - self.pos
            )));
        }
        let slice = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        let bytes = self.take(4)?;
        Ok(i32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        let bytes = self.take(8)?;
        let mut buf = [0u8; 8];
        buf.copy_from_slice(bytes);
        Ok(i64::from_be_bytes(buf))
    }

    pub fn read_string(&mut self) -> Result<String> {
        let len = self.read_i32()?;
        if len < 0 {
            return Err(Error::Configuration(format!("字符串长度非法: {}", len)));
        }
        let bytes = self.take(len as usize)?;
        String::from_utf8(bytes.to_vec())
            .map_err(|e| Error::Configuration(format!("键不是合法UTF-8: {}", e)))
    }
}

/// 可做复合键成员的类型：定长或长度前缀的字节序写读，
/// 外加稳定的32位散列（用于分区）。
pub trait SortableKey: Ord + Clone + Default {
    /// 追加字节表示
    fn write(&self, out: &mut Vec<u8>);

    /// 从缓冲读回，覆盖自身
    fn read_fields(&mut self, buf: &mut KeyBuffer) -> Result<()>;

    /// 稳定散列，同值跨进程一致
    fn hash_code(&self) -> i32;
}

impl SortableKey for String {
    fn write(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&(self.len() as i32).to_be_bytes());
        out.extend_from_slice(self.as_bytes());
    }

    fn read_fields(&mut self, buf: &mut KeyBuffer) -> Result<()> {
        *self = buf.read_string()?;
        Ok(())
    }

    // 31进制滚动散列，按UTF-16码元计算
    fn hash_code(&self) -> i32 {
        self.encode_utf16()
            .fold(0i32, |h, u| h.wrapping_mul(31).wrapping_add(u as i32))
    }
}

impl SortableKey for i32 {
    fn write(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_be_bytes());
    }

    fn read_fields(&mut self, buf: &mut KeyBuffer) -> Result<()> {
        *self = buf.read_i32()?;
        Ok(())
    }

    fn hash_code(&self) -> i32 {
        *self
    }
}

impl SortableKey for i64 {
    fn write(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_be_bytes());
    }

    fn read_fields(&mut self, buf: &mut KeyBuffer) -> Result<()> {
        *self = buf.read_i64()?;
        Ok(())
    }

    fn hash_code(&self) -> i32 {
        (*self ^ (*self >> 32)) as i32
    }
}

/// 复合排序键：分组键 + 排序键
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompositeSortKey<G: SortableKey, S: SortableKey> {
    group_key: G,
    sort_key: S,
}

impl<G: SortableKey, S: SortableKey> CompositeSortKey<G, S> {
    pub fn new(group_key: G, sort_key: S) -> Self {
        Self { group_key, sort_key }
    }

    pub fn group_key(&self) -> &G {
        &self.group_key
    }

    pub fn sort_key(&self) -> &S {
        &self.sort_key
    }

    /// 序列化为字节：分组键在前，排序键在后
    pub fn write(&self, out: &mut Vec<u8>) {
        self.group_key.write(out);
        self.sort_key.write(out);
    }

    pub fn read_fields(&mut self, buf: &mut KeyBuffer) -> Result<()> {
        self.group_key.read_fields(buf)?;
        self.sort_key.read_fields(buf)?;
        Ok(())
    }

    /// 分区散列只看分组键，保证同组进入同一分区
    pub fn hash_code(&self) -> i32 {
        self.group_key.hash_code()
    }
}

/// 自然顺序比较器：先分组键后排序键，都按升序
#[derive(Debug, Default)]
pub struct NaturalSortComparator;

impl NaturalSortComparator {
    pub fn compare<G: SortableKey, S: SortableKey>(
        &self,
        a: &CompositeSortKey<G, S>,
        b: &CompositeSortKey<G, S>,
    ) -> Ordering {
        a.group_key
            .cmp(&b.group_key)
            .then_with(|| a.sort_key.cmp(&b.sort_key))
    }
}

/// 逆序比较器：分组键升序，排序键降序
#[derive(Debug, Default)]
pub struct ReverseSortComparator;

impl ReverseSortComparator {
    pub fn compare<G: SortableKey, S: SortableKey>(
        &self,
        a: &CompositeSortKey<G, S>,
        b: &CompositeSortKey<G, S>,
    ) -> Ordering {
        a.group_key
            .cmp(&b.group_key)
            .then_with(|| b.sort_key.cmp(&a.sort_key))
    }
}

/// 分组比较器：只看分组键，组内一律视为相等
#[derive(Debug, Default)]
pub struct GroupingComparator;

impl GroupingComparator {
    pub fn compare<G: SortableKey, S: SortableKey>(
        &self,
        a: &CompositeSortKey<G, S>,
        b: &CompositeSortKey<G, S>,
    ) -> Ordering {
        a.group_key.cmp(&b.group_key)
    }
}

/// 原始字节比较器：把两侧字节解码进自备的暂存键再比较，
/// 避免每次比较分配。实例不跨线程共享。
pub struct RawKeyComparator<G: SortableKey, S: SortableKey> {
    left: CompositeSortKey<G, S>,
    right: CompositeSortKey<G, S>,
}

impl<G: SortableKey, S: SortableKey> Default for RawKeyComparator<G, S> {
    fn default() -> Self {
        Self {
            left: CompositeSortKey::default(),
            right: CompositeSortKey::default(),
        }
    }
}

impl<G: SortableKey, S: SortableKey> RawKeyComparator<G, S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn compare(&mut self, a: &[u8], b: &[u8]) -> Result<Ordering> {
        self.left.read_fields(&mut KeyBuffer::new(a))?;
        self.right.read_fields(&mut KeyBuffer::new(b))?;
        Ok(NaturalSortComparator.compare(&self.left, &self.right))
    }
}

/// 分区函数：分组键散列取非负后对分区数取模
#[derive(Debug, Default)]
pub struct KeyPartitioner<G: SortableKey, S: SortableKey> {
    _marker: PhantomData<(G, S)>,
}

impl<G: SortableKey, S: SortableKey> KeyPartitioner<G, S> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }

    pub fn partition(&self, key: &CompositeSortKey<G, S>, num_partitions: u32) -> u32 {
        (key.hash_code() & i32::MAX) as u32 % num_partitions
    }
}

/// 复合键与作业的接线：把分组/排序键类型名与配套的
/// 比较器、分区器类型名记入作业描述符。
pub struct CompositeSortKeySerialization;

impl CompositeSortKeySerialization {
    pub fn configure_map_output_key(
        job: &mut JobDescriptor,
        group_type: &str,
        sort_type: &str,
    ) {
        job.set_conf(CONF_KEY_GROUP_KEY_CLASS, group_type);
        job.set_conf(CONF_KEY_SORT_KEY_CLASS, sort_type);
        job.map_output_key_class = Some(COMPOSITE_KEY_CLASS.to_string());
        job.sort_comparator_class = Some(NATURAL_COMPARATOR_CLASS.to_string());
        job.grouping_comparator_class = Some(GROUPING_COMPARATOR_CLASS.to_string());
        job.partitioner_class = Some(KEY_PARTITIONER_CLASS.to_string());
    }

    /// 从作业配置读回分组/排序键类型名
    pub fn from_conf(job: &JobDescriptor) -> Result<(String, String)> {
        let group = job.get_conf(CONF_KEY_GROUP_KEY_CLASS).ok_or_else(|| {
            Error::Configuration("作业未配置复合键分组类型".to_string())
        })?;
        let sort = job.get_conf(CONF_KEY_SORT_KEY_CLASS).ok_or_else(|| {
            Error::Configuration("作业未配置复合键排序类型".to_string())
        })?;
        Ok((group.to_string(), sort.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> Vec<CompositeSortKey<String, i32>> {
        [("C", 2), ("A", 2), ("C", 1), ("B", 2), ("A", 1), ("B", 1)]
            .iter()
            .map(|(g, s)| CompositeSortKey::new(g.to_string(), *s))
            .collect()
    }

    fn render(keys: &[CompositeSortKey<String, i32>]) -> Vec<String> {
        keys.iter()
            .map(|k| format!("{}{}", k.group_key(), k.sort_key()))
            .collect()
    }

    #[test]
    fn test_natural_ordering() {
        let mut keys = fixture();
        keys.sort_by(|a, b| NaturalSortComparator.compare(a, b));
        assert_eq!(render(&keys), vec!["A1", "A2", "B1", "B2", "C1", "C2"]);
    }

    #[test]
    fn test_reverse_ordering() {
        let mut keys = fixture();
        keys.sort_by(|a, b| ReverseSortComparator.compare(a, b));
        assert_eq!(render(&keys), vec!["A2", "A1", "B2", "B1", "C2", "C1"]);
    }

    #[test]
    fn test_grouping_ignores_sort_key() {
        let a = CompositeSortKey::new("G".to_string(), 1);
        let b = CompositeSortKey::new("G".to_string(), 9);
        let c = CompositeSortKey::new("H".to_string(), 1);
        assert_eq!(GroupingComparator.compare(&a, &b), Ordering::Equal);
        assert_eq!(GroupingComparator.compare(&a, &c), Ordering::Less);
    }

    #[test]
    fn test_write_read_round_trip() {
        let key = CompositeSortKey::new("用户-42".to_string(), 7i64);
        let mut bytes = Vec::new();
        key.write(&mut bytes);

        let mut restored: CompositeSortKey<String, i64> = CompositeSortKey::default();
        restored.read_fields(&mut KeyBuffer::new(&bytes)).unwrap();
        assert_eq!(restored, key);
    }

    #[test]
    fn test_raw_comparator_agrees_with_object_comparator() {
        let keys = fixture();
        let mut raw = RawKeyComparator::<String, i32>::new();
        for a in &keys {
            for b in &keys {
                let mut ab = Vec::new();
                a.write(&mut ab);
                let mut bb = Vec::new();
                b.write(&mut bb);
                assert_eq!(
                    raw.compare(&ab, &bb).unwrap(),
                    NaturalSortComparator.compare(a, b),
                    "{}{} vs {}{}",
                    a.group_key(),
                    a.sort_key(),
                    b.group_key(),
                    b.sort_key()
                );
            }
        }
    }

    #[test]
    fn test_partitioner_stays_in_range() {
        let partitioner = KeyPartitioner::<i32, i32>::new();
        // 散列为最小负整数时取非负后是0
        let extreme = CompositeSortKey::new(i32::MIN, 0);
        assert_eq!(partitioner.partition(&extreme, 7), 0);

        for g in -100..100 {
            let key = CompositeSortKey::new(g, 0);
            let p = partitioner.partition(&key, 7);
            assert!(p < 7);
        }
    }

    #[test]
    fn test_same_group_lands_in_same_partition() {
        let partitioner = KeyPartitioner::<String, i32>::new();
        let a = CompositeSortKey::new("user-1".to_string(), 1);
        let b = CompositeSortKey::new("user-1".to_string(), 99);
        assert_eq!(partitioner.partition(&a, 16), partitioner.partition(&b, 16));
    }

    #[test]
    fn test_serialization_wiring() {
        let mut job = JobDescriptor::new();
        CompositeSortKeySerialization::configure_map_output_key(&mut job, "String", "i32");
        assert_eq!(job.map_output_key_class.as_deref(), Some(COMPOSITE_KEY_CLASS));
        assert_eq!(
            CompositeSortKeySerialization::from_conf(&job).unwrap(),
            ("String".to_string(), "i32".to_string())
        );
    }
}
