//! C ABI for the trace fingerprint functions, so a C fuzzer can link the static
//! library and call `trace_hash32(trace_bits, MAP_SIZE, HASH_CONST)` directly.

use trace_hash::{hash32, hash64, HASH_CONST};

/*********************************************
把C传入的指针和长度转换为slice
调用者保证key至少有len字节可读，并且调用期间不被修改
**********************************************/
unsafe fn trace_slice<'a>(key: *const u8, len: usize) -> &'a [u8] {
    if len == 0 {
        return &[];
    }
    assert!(!key.is_null());
    std::slice::from_raw_parts(key, len)
}

/*********************************************
计算key前len字节的32位指纹
len不是word大小的整数倍时尾部字节被忽略

# Safety
len大于0时key必须非空，且至少有len字节可读
**********************************************/
#[no_mangle]
pub unsafe extern "C" fn trace_hash32(key: *const u8, len: u32, seed: u32) -> u32 {
    let data = trace_slice(key, len as usize);
    hash32(data, len, seed)
}

/// `trace_hash32` with the fuzzer's fixed checksum seed.
///
/// # Safety
/// Same pointer contract as `trace_hash32`.
#[no_mangle]
pub unsafe extern "C" fn trace_checksum32(key: *const u8, len: u32) -> u32 {
    trace_hash32(key, len, HASH_CONST)
}

/// # Safety
/// Same pointer contract as `trace_hash32`.
#[no_mangle]
pub unsafe extern "C" fn trace_hash64(key: *const u8, len: u32) -> u64 {
    let data = trace_slice(key, len as usize);
    hash64(data, len as usize)
}
