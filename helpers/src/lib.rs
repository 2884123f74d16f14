extern crate nix;

use core::ffi::c_void;
use nix::sys::mman::*;
use std::fs::File;
use std::io;
use std::ops::Deref;
use std::os::unix::io::AsRawFd;
use std::path::Path;

fn nix_to_io(e: nix::Error) -> io::Error {
    io::Error::new(io::ErrorKind::Other, e)
}

/// 以只读方式mmap到内存的trace文件（例如qemu dump出来的bitmap）
///
/// drop时自动munmap。空文件不做映射，得到一个空slice。
pub struct TraceMap {
    ptr: *mut c_void,
    len: usize,
}

impl TraceMap {
    //根据指定的路径path的文件，创建只读的mmap映射
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let file = File::open(path)?;
        let len = file.metadata()?.len() as usize;
        return Self::from_file(&file, len);
    }

    //将给定的文件的前size字节映射到内存，映射建立之后file可以关闭
    pub fn from_file(file: &File, size: usize) -> io::Result<Self> {
        if size == 0 {
            return Ok(Self {
                ptr: std::ptr::null_mut(),
                len: 0,
            });
        }
        let prot = ProtFlags::PROT_READ;
        let flags = MapFlags::MAP_SHARED;
        let ptr = unsafe {
            mmap(0 as *mut c_void, size, prot, flags, file.as_raw_fd(), 0).map_err(nix_to_io)?
        };
        return Ok(Self { ptr, len: size });
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_slice(&self) -> &[u8] {
        if self.len == 0 {
            return &[];
        }
        unsafe { std::slice::from_raw_parts(self.ptr as *const u8, self.len) }
    }
}

impl Deref for TraceMap {
    type Target = [u8];
    fn deref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl Drop for TraceMap {
    fn drop(&mut self) {
        if self.len != 0 {
            unsafe {
                // munmap失败时没有可以恢复的办法
                let _ = munmap(self.ptr, self.len);
            }
        }
    }
}
