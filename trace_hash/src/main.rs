extern crate clap;
extern crate colored;
extern crate rand;
extern crate trace_hash;

use std::path::Path;
use std::process;

use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use colored::*;
use rand::thread_rng;
use rand::Rng;

use trace_hash::args::optional_value;
use trace_hash::config::Config;
use trace_hash::corpus::{bucket_traces, hash_trace_file, write_stats};
use trace_hash::stats::avalanche;
use trace_hash::{Error, HashVariant};

fn main() {
    let matches = App::new("trace_hash")
        .about("fingerprint fuzzer traces")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .arg(
            Arg::with_name("config")
                .short("c")
                .long("config")
                .value_name("CONFIG_PATH")
                .takes_value(true)
                .help("path to a config.ron"),
        )
        .arg(
            Arg::with_name("seed")
                .short("s")
                .long("seed")
                .value_name("SEED")
                .takes_value(true)
                .help("overrides the config value for the hash seed"),
        )
        .arg(
            Arg::with_name("variant")
                .short("v")
                .long("variant")
                .value_name("VARIANT")
                .takes_value(true)
                .possible_values(&["native", "wide", "narrow"])
                .help("overrides the config value for the hash variant"),
        )
        .subcommand(
            SubCommand::with_name("hash")
                .about("hash a single trace file")
                .arg(
                    Arg::with_name("file")
                        .short("f")
                        .long("file")
                        .value_name("TRACE")
                        .takes_value(true)
                        .required(true)
                        .help("trace file to hash"),
                )
                .arg(
                    Arg::with_name("length")
                        .short("l")
                        .long("length")
                        .value_name("LENGTH")
                        .takes_value(true)
                        .help("number of bytes to hash (default: file size rounded down to the chunk size)"),
                ),
        )
        .subcommand(
            SubCommand::with_name("bucket")
                .about("group a folder of trace files by fingerprint")
                .arg(
                    Arg::with_name("dir")
                        .short("d")
                        .long("dir")
                        .value_name("TRACE_DIR")
                        .takes_value(true)
                        .required(true)
                        .help("folder containing trace dumps"),
                )
                .arg(
                    Arg::with_name("pattern")
                        .short("p")
                        .long("pattern")
                        .value_name("GLOB")
                        .takes_value(true)
                        .default_value("*")
                        .help("file name pattern"),
                )
                .arg(
                    Arg::with_name("workdir")
                        .short("w")
                        .long("workdir")
                        .value_name("WORKDIR")
                        .takes_value(true)
                        .help("where bucket_stats.msgp is written"),
                )
                .arg(
                    Arg::with_name("bitmap_size")
                        .short("b")
                        .long("bitmap-size")
                        .value_name("BITMAP_SIZE")
                        .takes_value(true)
                        .help("overrides the config value for the expected trace size"),
                ),
        )
        .subcommand(
            SubCommand::with_name("avalanche")
                .about("measure single-bit avalanche of hash32")
                .arg(
                    Arg::with_name("length")
                        .short("l")
                        .long("length")
                        .value_name("LENGTH")
                        .takes_value(true)
                        .default_value("64"),
                )
                .arg(
                    Arg::with_name("samples")
                        .short("n")
                        .long("samples")
                        .value_name("SAMPLES")
                        .takes_value(true)
                        .default_value("10000"),
                )
                .arg(
                    Arg::with_name("rng_seed")
                        .short("r")
                        .long("rng-seed")
                        .value_name("RNG_SEED")
                        .takes_value(true)
                        .help("seed for sampling (default: random)"),
                ),
        )
        .after_help("Example: cargo run --release -- -s 42 hash -f <TRACE_FILE>\n")
        .get_matches();

    if let Err(e) = run(&matches) {
        println!("[-] {}", format!("{}", e).red().bold());
        process::exit(1);
    }
}

fn run(matches: &ArgMatches) -> Result<(), Error> {
    let mut config = match matches.value_of("config") {
        Some(path) => Config::new_from_file(Path::new(path))?,
        None => Config::default(),
    };

    if let Some(seed) = optional_value::<u32>(matches, "seed")? {
        config.seed = seed;
    }
    if let Some(variant) = optional_value::<HashVariant>(matches, "variant")? {
        config.variant = variant;
    }

    match matches.subcommand() {
        ("hash", Some(sub)) => {
            let len = optional_value::<usize>(sub, "length")?;
            let path = sub.value_of("file").unwrap_or_default();
            let digest = hash_trace_file(Path::new(path), len, &config)?;
            println!(
                "[+] {}: len={} variant={:?} seed={:#010x}",
                path,
                digest.len,
                config.variant.resolve(),
                config.seed
            );
            println!("    hash32: {}", format!("{:#010x}", digest.hash32).green().bold());
            println!("    hash64: {}", format!("{:#018x}", digest.hash64).green());
        }
        ("bucket", Some(sub)) => {
            if let Some(workdir) = sub.value_of("workdir") {
                config.workdir_path = workdir.to_string();
            }
            if let Some(size) = optional_value::<usize>(sub, "bitmap_size")? {
                config.bitmap_size = size;
            }
            let dir = sub.value_of("dir").unwrap_or_default();
            let pattern = sub.value_of("pattern").unwrap_or("*");
            let stats = bucket_traces(Path::new(dir), pattern, &config)?;
            for bucket in stats.buckets.iter() {
                println!(
                    "[+] bucket #{} checksum={:#010x} coverage={} files={}",
                    bucket.index,
                    bucket.checksum,
                    bucket.coverage_bytes,
                    bucket.files.len()
                );
                for f in bucket.files.iter() {
                    println!("      {}", f);
                }
            }
            for f in stats.size_mismatches.iter() {
                println!(
                    "[!] {}",
                    format!("skipped {}: size differs from bitmap_size {}", f, config.bitmap_size)
                        .yellow()
                );
            }
            let path = write_stats(Path::new(&config.workdir_path), &stats)?;
            println!(
                "[!] {}",
                format!(
                    "{} files, {} distinct traces, {} distinct coverage maps -> {}",
                    stats.num_files,
                    stats.num_buckets,
                    stats.num_coverage_buckets,
                    path.display()
                )
                .yellow()
                .bold()
            );
        }
        ("avalanche", Some(sub)) => {
            let len = optional_value::<usize>(sub, "length")?.unwrap_or(64);
            let samples = optional_value::<usize>(sub, "samples")?.unwrap_or(10000);
            let rng_seed = match optional_value::<u64>(sub, "rng_seed")? {
                Some(seed) => seed,
                None => thread_rng().gen(),
            };
            let report = avalanche(config.variant, len, samples, rng_seed)?;
            println!(
                "[+] variant={:?} len={} samples={} rng_seed={:#x}",
                report.variant, report.len, report.samples, rng_seed
            );
            let mean = format!("{:.3}", report.mean_flipped);
            // 理想值是32位中翻转一半
            let mean = if (report.mean_flipped - 16.0).abs() < 1.0 {
                mean.green().bold()
            } else {
                mean.red().bold()
            };
            println!(
                "    flipped bits: mean={} min={} max={} max_bias={:.4}",
                mean,
                report.min_flipped,
                report.max_flipped,
                report.max_bias()
            );
        }
        _ => unreachable!(),
    }
    Ok(())
}
