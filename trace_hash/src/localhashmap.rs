use std::collections::HashMap;

use crate::bitmap::{classify_counts, coverage_only};
use crate::error::{Error, LengthTooLarge};
use crate::hash::{hash32_with, HashVariant, HASH_CONST};

use snafu::ensure;

// 一种trace的指纹 -> 序号
#[derive(Default)]
struct SeenMap {
    seen: HashMap<u32, usize>,
    current_index: usize,
}

impl SeenMap {
    // 已存在返回旧序号，否则分配新序号
    fn index_for(&mut self, fingerprint: u32) -> usize {
        let next = self.current_index;
        let index = *self.seen.entry(fingerprint).or_insert(next);
        if index == next {
            self.current_index += 1;
        }
        index
    }

    fn clear(&mut self) {
        self.seen.clear();
        self.current_index = 0;
    }
}

/// 按trace指纹给运行结果分桶
///
/// 原始bitmap、分桶后的bitmap、只含覆盖信息的bitmap各自维护一套序号，
/// 序号从0开始连续递增，相同trace总是拿到相同序号。
pub struct TraceDeduper {
    variant: HashVariant,
    seed: u32,
    run_bitmap_seen: SeenMap,
    classified_bitmap_seen: SeenMap,
    cov_bitmap_seen: SeenMap,
}

impl Default for TraceDeduper {
    fn default() -> Self {
        Self::new(HashVariant::Native, HASH_CONST)
    }
}

impl TraceDeduper {
    pub fn new(variant: HashVariant, seed: u32) -> Self {
        Self {
            variant,
            seed,
            run_bitmap_seen: SeenMap::default(),
            classified_bitmap_seen: SeenMap::default(),
            cov_bitmap_seen: SeenMap::default(),
        }
    }

    /// 计算trace的32位指纹
    pub fn fingerprint(&self, trace: &[u8]) -> Result<u32, Error> {
        ensure!(
            trace.len() <= u32::MAX as usize,
            LengthTooLarge { len: trace.len() }
        );
        Ok(hash32_with(self.variant, trace, trace.len() as u32, self.seed))
    }

    /// 原始run_bitmap的序号
    pub fn handle_run_bitmap(&mut self, run_bitmap: &[u8]) -> Result<usize, Error> {
        let cur_exec_hash = self.fingerprint(run_bitmap)?;
        Ok(self.run_bitmap_seen.index_for(cur_exec_hash))
    }

    /// 只查询，不分配新序号
    pub fn lookup_run_bitmap(&self, run_bitmap: &[u8]) -> Result<Option<usize>, Error> {
        let cur_exec_hash = self.fingerprint(run_bitmap)?;
        Ok(self.run_bitmap_seen.seen.get(&cur_exec_hash).copied())
    }

    /// 命中次数分桶后的序号，调用者的buffer不被修改
    pub fn handle_classified_bitmap(&mut self, run_bitmap: &[u8]) -> Result<usize, Error> {
        let mut classified = run_bitmap.to_vec();
        classify_counts(&mut classified);
        let hash = self.fingerprint(&classified)?;
        Ok(self.classified_bitmap_seen.index_for(hash))
    }

    /// 处理 cov_bitmap：
    /// 将传入的 run_bitmap 中所有非 0 的值转换为 1，再按指纹分配序号
    pub fn handle_cov_bitmap(&mut self, run_bitmap: &[u8]) -> Result<usize, Error> {
        let cov_bitmap = coverage_only(run_bitmap);
        let cov_hash = self.fingerprint(&cov_bitmap)?;
        Ok(self.cov_bitmap_seen.index_for(cov_hash))
    }

    pub fn num_run_bitmaps(&self) -> usize {
        self.run_bitmap_seen.current_index
    }

    pub fn num_classified_bitmaps(&self) -> usize {
        self.classified_bitmap_seen.current_index
    }

    pub fn num_cov_bitmaps(&self) -> usize {
        self.cov_bitmap_seen.current_index
    }

    /// 清空所有记录
    pub fn clear(&mut self) {
        self.run_bitmap_seen.clear();
        self.classified_bitmap_seen.clear();
        self.cov_bitmap_seen.clear();
    }
}
