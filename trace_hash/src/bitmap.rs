use crate::hash::{hash32, HASH_CONST};

// 命中次数 -> bucket，与AFL的count_class_lookup8一致
const fn count_class(v: u8) -> u8 {
    match v {
        0 => 0,
        1 => 1,
        2 => 2,
        3 => 4,
        4..=7 => 8,
        8..=15 => 16,
        16..=31 => 32,
        32..=127 => 64,
        _ => 128,
    }
}

const fn build_count_class_lookup() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        table[i] = count_class(i as u8);
        i += 1;
    }
    table
}

static COUNT_CLASS_LOOKUP: [u8; 256] = build_count_class_lookup();

/// 把运行bitmap中的命中次数原地替换成bucket
///
/// 分桶后，循环次数的小幅抖动不会产生新的trace指纹
pub fn classify_counts(trace: &mut [u8]) {
    for b in trace.iter_mut() {
        *b = COUNT_CLASS_LOOKUP[*b as usize];
    }
}

/// 命中过的位置写0x80，未命中写0x01
pub fn simplify_trace(trace: &mut [u8]) {
    for b in trace.iter_mut() {
        *b = if *b != 0 { 0x80 } else { 0x01 };
    }
}

/// 只保留是否命中的信息：非0转为1
pub fn coverage_only(trace: &[u8]) -> Vec<u8> {
    trace.iter().map(|&x| if x > 0 { 1 } else { 0 }).collect()
}

/// bitmap中非0字节的个数
pub fn count_bytes(trace: &[u8]) -> u32 {
    trace.iter().filter(|&&b| b != 0).count() as u32
}

/// trace的checksum，seed固定为HASH_CONST
///
/// # Panics
/// trace长度超过u32范围时panic
pub fn trace_checksum(trace: &[u8]) -> u32 {
    assert!(trace.len() <= u32::MAX as usize, "trace too large to checksum");
    hash32(trace, trace.len() as u32, HASH_CONST)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_class_buckets() {
        let mut trace = vec![0, 1, 2, 3, 4, 7, 8, 15, 16, 31, 32, 127, 128, 255];
        classify_counts(&mut trace);
        assert_eq!(
            trace,
            vec![0, 1, 2, 4, 8, 8, 16, 16, 32, 32, 64, 64, 128, 128]
        );
    }

    #[test]
    fn test_classify_outputs_are_buckets() {
        let mut trace = (0..=255u8).collect::<Vec<_>>();
        classify_counts(&mut trace);
        let buckets = [0u8, 1, 2, 4, 8, 16, 32, 64, 128];
        assert!(trace.iter().all(|b| buckets.contains(b)));
    }

    #[test]
    fn test_classify_twice_moves_up() {
        // bucket值本身也是命中次数，再分一次会继续上移
        let mut trace = vec![0, 1, 2, 3, 4, 8, 100, 200];
        classify_counts(&mut trace);
        assert_eq!(trace, vec![0, 1, 2, 4, 8, 16, 64, 128]);
        classify_counts(&mut trace);
        assert_eq!(trace, vec![0, 1, 2, 8, 16, 32, 64, 128]);
    }

    #[test]
    fn test_simplify_trace() {
        let mut trace = vec![0, 3, 0, 200];
        simplify_trace(&mut trace);
        assert_eq!(trace, vec![0x01, 0x80, 0x01, 0x80]);
    }

    #[test]
    fn test_coverage_and_count() {
        let trace = vec![0, 5, 0, 1, 9, 0, 0, 0];
        assert_eq!(coverage_only(&trace), vec![0, 1, 0, 1, 1, 0, 0, 0]);
        assert_eq!(count_bytes(&trace), 3);
    }

    #[test]
    fn test_checksum_tracks_bucket_not_count() {
        let mut a = vec![0u8; 64];
        let mut b = vec![0u8; 64];
        a[10] = 5;
        b[10] = 6;
        assert_ne!(trace_checksum(&a), trace_checksum(&b));
        classify_counts(&mut a);
        classify_counts(&mut b);
        assert_eq!(trace_checksum(&a), trace_checksum(&b));
    }
}
