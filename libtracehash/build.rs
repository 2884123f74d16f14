use std::env;
use std::path::PathBuf;
// 构建时用cbindgen生成C头文件libtracehash.h

fn main() {
    let crate_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR")
        .expect("CARGO_MANIFEST_DIR env var is not defined"));

    println!("cargo:rerun-if-changed=src/lib.rs");
    println!("cargo:rerun-if-changed=cbindgen.toml");

    //读取cbindgen.toml配置文件
    let config = cbindgen::Config::from_file(crate_dir.join("cbindgen.toml"))
        .expect("Unable to find cbindgen.toml configuration file");

    // for now, CARGO_MANIFEST_DIR (crate_dir) seems reasonable
    cbindgen::generate_with_config(&crate_dir, config)
        .expect("Unable to generate C bindings")
        .write_to_file(crate_dir.join("libtracehash.h"));
}
