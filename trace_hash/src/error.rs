use std::path::PathBuf;

use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display("could not open config file {}: {}", path.display(), source))]
    ReadConfig {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("could not parse config file {}: {}", path.display(), source))]
    ParseConfig {
        path: PathBuf,
        source: ron::de::Error,
    },

    #[snafu(display("could not map trace file {}: {}", path.display(), source))]
    MapTrace {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("invalid glob pattern {}: {}", pattern, source))]
    Pattern {
        pattern: String,
        source: glob::PatternError,
    },

    #[snafu(display("could not read directory entry: {}", source))]
    Glob { source: glob::GlobError },

    #[snafu(display("could not create workdir {}: {}", path.display(), source))]
    CreateWorkdir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("could not write stats to {}: {}", path.display(), source))]
    WriteStats {
        path: PathBuf,
        source: rmp_serde::encode::Error,
    },

    #[snafu(display("could not create stats file {}: {}", path.display(), source))]
    CreateStats {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("length {} exceeds trace size {}", len, size))]
    LengthOverflow { len: usize, size: usize },

    #[snafu(display("trace of {} bytes does not fit a 32-bit length", len))]
    LengthTooLarge { len: usize },

    #[snafu(display("invalid value for --{}: {}", name, source))]
    BadArgument { name: String, source: clap::Error },
}
