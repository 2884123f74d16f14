use serde_derive::{Deserialize, Serialize};
use xxhash_rust::xxh3::xxh3_64;

/// 模糊测试中对trace做checksum时约定使用的seed
pub const HASH_CONST: u32 = 0xa5b35705;

// 宽路径的轮常量，按位置循环取用
const ROUND_CONSTANTS: [u64; 5] = [
    0x428a2f98d728ae22,
    0x7137449123ef65cd,
    0xb5c0fbcfec4d3b2f,
    0xe9b5dba58189dbbc,
    0x3956c25bf348b538,
];

const WIDE_MUL: u64 = 0x52dce729;

/// hash32使用的两种混合路径
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HashVariant {
    /// 跟随编译目标选择（64位平台为Wide）
    Native,
    /// 8字节为一个word
    Wide,
    /// 4字节为一个word
    Narrow,
}

impl HashVariant {
    /// Native解析为编译期选定的具体路径
    pub fn resolve(self) -> Self {
        match self {
            Self::Native => {
                if cfg!(all(target_pointer_width = "64", not(feature = "narrow"))) {
                    Self::Wide
                } else {
                    Self::Narrow
                }
            }
            v => v,
        }
    }

    /// 每次混合的字节数
    pub fn chunk_size(self) -> usize {
        match self.resolve() {
            Self::Narrow => 4,
            _ => 8,
        }
    }
}

// 为HashVariant实现FromStr，命令行和配置文件里用 wide / narrow / native
impl std::str::FromStr for HashVariant {
    type Err = ron::de::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ron::de::from_str(s)
    }
}

#[inline(always)]
fn mix_wide(h: u64, mut k: u64, a: u64, b: u64) -> u64 {
    k ^= a;
    k = k.rotate_left(21);
    k ^= b;

    let h = (h ^ k).rotate_left(17);
    h.wrapping_mul(WIDE_MUL)
}

/// 64位word的hash32：四个word一组展开处理，剩余的word按剩余个数循环选择轮常量
///
/// # Panics
/// `len` 超过 `key.len()` 时panic（不会越界读）
pub fn hash32_wide(key: &[u8], len: u32, seed: u32) -> u32 {
    let mut h1 = u64::from(seed ^ len);
    let data = &key[..len as usize];

    let mut words = data
        .chunks_exact(8)
        .map(|c| u64::from_le_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]));
    let mut remaining = (len >> 3) as usize;

    while remaining >= 4 {
        // remaining>=4保证这里的四个next()都有值
        if let (Some(k0), Some(k1), Some(k2), Some(k3)) =
            (words.next(), words.next(), words.next(), words.next())
        {
            h1 = mix_wide(h1, k0, ROUND_CONSTANTS[0], ROUND_CONSTANTS[1]);
            h1 = mix_wide(h1, k1, ROUND_CONSTANTS[2], ROUND_CONSTANTS[3]);
            h1 = mix_wide(h1, k2, ROUND_CONSTANTS[4], ROUND_CONSTANTS[0]);
            h1 = mix_wide(h1, k3, ROUND_CONSTANTS[1], ROUND_CONSTANTS[2]);
        }
        remaining -= 4;
    }

    for k1 in words {
        remaining -= 1;
        h1 = mix_wide(
            h1,
            k1,
            ROUND_CONSTANTS[remaining % 5],
            ROUND_CONSTANTS[(remaining + 1) % 5],
        );
    }

    // final avalanche
    h1 ^= h1 >> 29;
    h1 = h1.wrapping_mul(0xff51afd7ed558ccd);
    h1 ^= h1 >> 33;
    h1 = h1.wrapping_mul(0xc4ceb9fe1a85ec53);
    h1 ^= h1 >> 33;

    return (h1 ^ (h1 >> 32)) as u32;
}

/// 32位word的hash32，MurmurHash3的块混合加上fmix32
///
/// # Panics
/// `len` 超过 `key.len()` 时panic
pub fn hash32_narrow(key: &[u8], len: u32, seed: u32) -> u32 {
    let mut h1 = seed ^ len;
    let data = &key[..len as usize];

    for c in data.chunks_exact(4) {
        let mut k1 = u32::from_le_bytes([c[0], c[1], c[2], c[3]]);
        k1 = k1.wrapping_mul(0xcc9e2d51);
        k1 = k1.rotate_left(15);
        k1 = k1.wrapping_mul(0x1b873593);

        h1 ^= k1;
        h1 = h1.rotate_left(13);
        h1 = h1.wrapping_mul(5).wrapping_add(0xe6546b64);
    }

    h1 ^= h1 >> 16;
    h1 = h1.wrapping_mul(0x85ebca6b);
    h1 ^= h1 >> 13;
    h1 = h1.wrapping_mul(0xc2b2ae35);
    h1 ^= h1 >> 16;

    return h1;
}

/// 对buffer的前len字节计算32位指纹，len不是chunk大小整数倍时尾部字节不参与混合
///
/// 64位平台走宽路径，其余平台（或开启`narrow` feature）走窄路径。
/// 两条路径的输出互不兼容。
#[cfg(all(target_pointer_width = "64", not(feature = "narrow")))]
#[inline]
pub fn hash32(key: &[u8], len: u32, seed: u32) -> u32 {
    hash32_wide(key, len, seed)
}

#[cfg(not(all(target_pointer_width = "64", not(feature = "narrow"))))]
#[inline]
pub fn hash32(key: &[u8], len: u32, seed: u32) -> u32 {
    hash32_narrow(key, len, seed)
}

/// 运行时按variant选择路径
pub fn hash32_with(variant: HashVariant, key: &[u8], len: u32, seed: u32) -> u32 {
    match variant.resolve() {
        HashVariant::Narrow => hash32_narrow(key, len, seed),
        _ => hash32_wide(key, len, seed),
    }
}

/// buffer前len字节的64位xxh3指纹，桶很多时比hash32碰撞更少
pub fn hash64(key: &[u8], len: usize) -> u64 {
    xxh3_64(&key[..len])
}
