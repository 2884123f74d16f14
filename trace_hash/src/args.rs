use std::fmt::Display;
use std::str::FromStr;

use clap::{value_t, ArgMatches, ErrorKind};

use crate::error::Error;

/// 读取一个可选的命令行参数
///
/// 参数没给出时返回None，给出了但解析失败时返回BadArgument，不能悄悄退回默认值
pub fn optional_value<T>(matches: &ArgMatches, name: &str) -> Result<Option<T>, Error>
where
    T: FromStr,
    <T as FromStr>::Err: Display,
{
    match value_t!(matches, name, T) {
        Ok(v) => Ok(Some(v)),
        Err(ref e) if e.kind == ErrorKind::ArgumentNotFound => Ok(None),
        Err(e) => Err(Error::BadArgument {
            name: name.to_string(),
            source: e,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::{App, Arg};

    fn parse(args: &[&str]) -> ArgMatches<'static> {
        App::new("t")
            .arg(Arg::with_name("seed").short("s").takes_value(true))
            .get_matches_from(args.to_vec())
    }

    #[test]
    fn test_missing_is_none() {
        let m = parse(&["t"]);
        assert_eq!(optional_value::<u32>(&m, "seed").unwrap(), None);
    }

    #[test]
    fn test_valid_value() {
        let m = parse(&["t", "-s", "16"]);
        assert_eq!(optional_value::<u32>(&m, "seed").unwrap(), Some(16));
    }

    #[test]
    fn test_malformed_is_error() {
        for bad in ["0x10", "8x", "seed"].iter() {
            let m = parse(&["t", "-s", *bad]);
            match optional_value::<u32>(&m, "seed") {
                Err(Error::BadArgument { ref name, .. }) if name == "seed" => {}
                other => panic!("{} was accepted: {:?}", bad, other),
            }
        }
    }
}
