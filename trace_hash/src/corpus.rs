use std::fs::{self, File};
use std::path::{Path, PathBuf};

use helpers::TraceMap;
use serde_derive::Serialize;
use snafu::{ensure, ResultExt};

use crate::bitmap::count_bytes;
use crate::config::Config;
use crate::error::{
    CreateStats, CreateWorkdir, Error, Glob, LengthOverflow, LengthTooLarge, MapTrace, Pattern,
    WriteStats,
};
use crate::hash::{hash32_with, hash64};
use crate::localhashmap::TraceDeduper;

/// 单个trace文件的指纹
#[derive(Debug, Clone, Serialize)]
pub struct TraceDigest {
    pub len: usize,
    pub hash32: u32,
    pub hash64: u64,
}

/// 对trace文件的前len字节计算指纹，len缺省时取文件大小向下对齐到chunk
pub fn hash_trace_file(path: &Path, len: Option<usize>, config: &Config) -> Result<TraceDigest, Error> {
    let map = TraceMap::open(path).context(MapTrace { path })?;
    let chunk = config.variant.chunk_size();
    let len = len.unwrap_or(map.len() - map.len() % chunk);

    ensure!(len <= map.len(), LengthOverflow { len, size: map.len() });
    ensure!(len <= u32::MAX as usize, LengthTooLarge { len });

    return Ok(TraceDigest {
        len,
        hash32: hash32_with(config.variant, &map, len as u32, config.seed),
        hash64: hash64(&map, len),
    });
}

#[derive(Debug, Clone, Serialize)]
pub struct Bucket {
    pub index: usize,
    pub checksum: u32,
    pub coverage_bytes: u32,
    pub files: Vec<String>,
}

/// 一次分桶的统计信息，写入workdir/bucket_stats.msgp
#[derive(Debug, Clone, Serialize)]
pub struct BucketStats {
    pub num_files: usize,
    pub num_buckets: usize,
    pub num_coverage_buckets: usize,
    pub buckets: Vec<Bucket>,
    /// 长度与bitmap_size不一致、没有参与分桶的文件
    pub size_mismatches: Vec<String>,
}

/// 对dir下所有匹配pattern的文件按trace内容分桶，相同trace的文件进入同一个桶
///
/// 只有长度等于config.bitmap_size的文件参与分桶，其余记录在size_mismatches中
pub fn bucket_traces(dir: &Path, pattern: &str, config: &Config) -> Result<BucketStats, Error> {
    // 目录名里的 [ * ? 不能被当成通配符
    let full_pattern = format!(
        "{}/{}",
        glob::Pattern::escape(&dir.display().to_string()),
        pattern
    );
    let paths = glob::glob(&full_pattern).context(Pattern {
        pattern: full_pattern.clone(),
    })?;

    let mut dedup = TraceDeduper::new(config.variant, config.seed);
    let mut buckets: Vec<Bucket> = vec![];
    let mut size_mismatches = vec![];
    let mut num_files = 0;

    for entry in paths {
        let path = entry.context(Glob)?;
        if !path.is_file() {
            continue;
        }
        let map = TraceMap::open(&path).context(MapTrace { path: &path })?;
        if map.len() != config.bitmap_size {
            size_mismatches.push(path.display().to_string());
            continue;
        }
        let index = dedup.handle_run_bitmap(&map)?;
        dedup.handle_cov_bitmap(&map)?;
        num_files += 1;

        // 序号连续分配，新桶的序号正好等于buckets.len()
        if index == buckets.len() {
            buckets.push(Bucket {
                index,
                checksum: dedup.fingerprint(&map)?,
                coverage_bytes: count_bytes(&map),
                files: vec![],
            });
        }
        buckets[index].files.push(path.display().to_string());
    }

    return Ok(BucketStats {
        num_files,
        num_buckets: buckets.len(),
        num_coverage_buckets: dedup.num_cov_bitmaps(),
        buckets,
        size_mismatches,
    });
}

/// 把统计信息以msgpack格式写入workdir/bucket_stats.msgp，返回写入的路径
pub fn write_stats(workdir: &Path, stats: &BucketStats) -> Result<PathBuf, Error> {
    fs::create_dir_all(workdir).context(CreateWorkdir { path: workdir })?;
    let path = workdir.join("bucket_stats.msgp");
    let mut file = File::create(&path).context(CreateStats { path: &path })?;
    rmp_serde::encode::write_named(&mut file, stats).context(WriteStats { path: &path })?;
    return Ok(path);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::HashVariant;

    fn write_trace(dir: &Path, name: &str, data: &[u8]) {
        fs::write(dir.join(name), data).unwrap();
    }

    fn trace(hit: usize, count: u8) -> Vec<u8> {
        let mut t = vec![0u8; 64];
        t[hit] = count;
        t
    }

    #[test]
    fn test_hash_trace_file_default_len() {
        let dir = tempfile::tempdir().unwrap();
        let data = (0..21u8).collect::<Vec<_>>();
        write_trace(dir.path(), "t.bin", &data);

        let config = Config {
            variant: HashVariant::Wide,
            ..Config::default()
        };
        let digest = hash_trace_file(&dir.path().join("t.bin"), None, &config).unwrap();
        assert_eq!(digest.len, 16);
        assert_eq!(digest.hash32, hash32_with(HashVariant::Wide, &data, 16, config.seed));
        assert_eq!(digest.hash64, hash64(&data, 16));

        let config = Config {
            variant: HashVariant::Narrow,
            ..Config::default()
        };
        let digest = hash_trace_file(&dir.path().join("t.bin"), None, &config).unwrap();
        assert_eq!(digest.len, 20);
    }

    #[test]
    fn test_hash_trace_file_len_too_long() {
        let dir = tempfile::tempdir().unwrap();
        write_trace(dir.path(), "t.bin", &[0u8; 8]);
        match hash_trace_file(&dir.path().join("t.bin"), Some(16), &Config::default()) {
            Err(Error::LengthOverflow { len: 16, size: 8 }) => {}
            other => panic!("unexpected result {:?}", other),
        }
    }

    fn config_64() -> Config {
        Config {
            bitmap_size: 64,
            ..Config::default()
        }
    }

    #[test]
    fn test_bucket_and_write_stats() {
        let dir = tempfile::tempdir().unwrap();
        write_trace(dir.path(), "a.trace", &trace(1, 1));
        write_trace(dir.path(), "b.trace", &trace(2, 1));
        write_trace(dir.path(), "c.trace", &trace(1, 1));
        write_trace(dir.path(), "d.trace", &trace(1, 3));
        write_trace(dir.path(), "e.trace", &[1u8; 32]);
        write_trace(dir.path(), "ignored.txt", &trace(5, 1));

        let stats = bucket_traces(dir.path(), "*.trace", &config_64()).unwrap();
        assert_eq!(stats.num_files, 4);
        assert_eq!(stats.size_mismatches.len(), 1);
        assert!(stats.size_mismatches[0].ends_with("e.trace"));
        assert_eq!(stats.num_buckets, 3);
        assert_eq!(stats.num_coverage_buckets, 2);
        // glob按路径排序返回
        assert_eq!(stats.buckets[0].files.len(), 2);
        assert!(stats.buckets[0].files[1].ends_with("c.trace"));
        assert_eq!(stats.buckets[0].coverage_bytes, 1);

        let workdir = dir.path().join("work");
        let path = write_stats(&workdir, &stats).unwrap();
        assert!(fs::metadata(path).unwrap().len() > 0);
    }

    #[test]
    fn test_default_bitmap_size_skips_small_traces() {
        let dir = tempfile::tempdir().unwrap();
        write_trace(dir.path(), "a.trace", &trace(1, 1));
        let stats = bucket_traces(dir.path(), "*.trace", &Config::default()).unwrap();
        assert_eq!(stats.num_files, 0);
        assert_eq!(stats.size_mismatches.len(), 1);
    }

    #[test]
    fn test_dir_with_glob_chars() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("run[1]");
        fs::create_dir(&dir).unwrap();
        write_trace(&dir, "a.trace", &trace(1, 1));
        write_trace(&dir, "b.trace", &trace(2, 1));

        let stats = bucket_traces(&dir, "*.trace", &config_64()).unwrap();
        assert_eq!(stats.num_files, 2);
        assert_eq!(stats.num_buckets, 2);
    }

    #[test]
    fn test_bad_pattern() {
        let dir = tempfile::tempdir().unwrap();
        match bucket_traces(dir.path(), "[", &Config::default()) {
            Err(Error::Pattern { .. }) => {}
            other => panic!("unexpected result {:?}", other),
        }
    }
}
