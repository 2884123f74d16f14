use std::collections::HashSet;

use serde_derive::Serialize;
use snafu::ensure;

use crate::error::{Error, LengthTooLarge};
use crate::hash::{hash32_with, HashVariant};
use crate::romu::RomuPrng;

/// 单比特翻转后输出位变化的统计
#[derive(Debug, Clone, Serialize)]
pub struct AvalancheReport {
    pub variant: HashVariant,
    pub len: usize,
    pub samples: usize,
    /// 每次翻转平均改变的输出位数，理想值16
    pub mean_flipped: f64,
    pub min_flipped: u32,
    pub max_flipped: u32,
    /// 每个输出位被翻转的频率，理想值0.5
    pub bit_frequency: Vec<f64>,
}

impl AvalancheReport {
    /// 输出位频率与0.5的最大偏差
    pub fn max_bias(&self) -> f64 {
        self.bit_frequency
            .iter()
            .map(|f| (f - 0.5).abs())
            .fold(0.0, f64::max)
    }
}

/// 对samples个长度为len的随机buffer各翻转一个随机bit，统计hash32输出的变化
///
/// len为0时没有可翻转的bit，返回全0的报告
pub fn avalanche(
    variant: HashVariant,
    len: usize,
    samples: usize,
    seed: u64,
) -> Result<AvalancheReport, Error> {
    ensure!(len <= u32::MAX as usize, LengthTooLarge { len });
    let mut rng = RomuPrng::new_from_u64(seed);
    let mut buf = vec![0u8; len];
    let mut flips_per_bit = [0usize; 32];
    let mut total = 0u64;
    let mut min_flipped = u32::MAX;
    let mut max_flipped = 0;

    // 尾部不足一个chunk的字节不参与混合，只在完整chunk内翻转
    let mixed_len = len - len % variant.chunk_size();
    let runs = if mixed_len == 0 { 0 } else { samples };

    for _ in 0..runs {
        rng.fill_bytes(&mut buf);
        let hash_seed = rng.next_u32();
        let before = hash32_with(variant, &buf, len as u32, hash_seed);

        let bit = rng.below(mixed_len * 8);
        buf[bit / 8] ^= 1 << (bit % 8);
        let after = hash32_with(variant, &buf, len as u32, hash_seed);

        let diff = before ^ after;
        let flipped = diff.count_ones();
        total += u64::from(flipped);
        min_flipped = min_flipped.min(flipped);
        max_flipped = max_flipped.max(flipped);
        for (i, count) in flips_per_bit.iter_mut().enumerate() {
            if diff & (1 << i) != 0 {
                *count += 1;
            }
        }
    }

    let denom = runs.max(1) as f64;
    Ok(AvalancheReport {
        variant: variant.resolve(),
        len,
        samples: runs,
        mean_flipped: total as f64 / denom,
        min_flipped: if runs == 0 { 0 } else { min_flipped },
        max_flipped,
        bit_frequency: flips_per_bit.iter().map(|&c| c as f64 / denom).collect(),
    })
}

/// 固定buffer，对seeds中的每个seed计算hash，返回碰撞的个数
pub fn seed_collisions<I>(variant: HashVariant, buffer: &[u8], seeds: I) -> Result<usize, Error>
where
    I: IntoIterator<Item = u32>,
{
    ensure!(
        buffer.len() <= u32::MAX as usize,
        LengthTooLarge { len: buffer.len() }
    );
    let len = buffer.len() as u32;
    let mut seen = HashSet::new();
    let mut collisions = 0;
    for seed in seeds {
        if !seen.insert(hash32_with(variant, buffer, len, seed)) {
            collisions += 1;
        }
    }
    Ok(collisions)
}
