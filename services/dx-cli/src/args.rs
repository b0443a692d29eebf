//! Argument parsers for values clap cannot express directly.

use anyhow::{anyhow, bail, Context, Result};
use dx_common::ExecArg;

/// Parse a comma separated list of integers, e.g. `116,412` or `-3,0`.
pub fn parse_index_list(s: &str) -> Result<Vec<i64>> {
    s.split(',')
        .map(|part| {
            part.trim()
                .parse::<i64>()
                .with_context(|| format!("invalid index '{}' in '{}'", part, s))
        })
        .collect()
}

/// Parse `name@version:lb:ub[@namespace]`.
///
/// The name may itself contain `:` and `,` (as in `v:tas,m:ACCESS-ESM1-5`),
/// so it ends at the first `@`.
pub fn parse_exec_arg(s: &str) -> Result<ExecArg> {
    let (name, rest) = s
        .split_once('@')
        .ok_or_else(|| anyhow!("expected name@version:lb:ub[@namespace], got '{}'", s))?;
    if name.is_empty() {
        bail!("missing object name in '{}'", s);
    }

    let (address, namespace) = match rest.split_once('@') {
        Some((address, ns)) if !ns.is_empty() => (address, Some(ns)),
        Some(_) => bail!("empty namespace in '{}'", s),
        None => (rest, None),
    };

    let parts: Vec<&str> = address.split(':').collect();
    let [version, lb, ub] = parts.as_slice() else {
        bail!("expected version:lb:ub after '@' in '{}'", s);
    };
    let version = version
        .parse::<u32>()
        .with_context(|| format!("invalid version '{}' in '{}'", version, s))?;

    ExecArg::from_bounds(
        name,
        version,
        &parse_index_list(lb)?,
        &parse_index_list(ub)?,
        namespace,
    )
    .with_context(|| format!("invalid bounds in '{}'", s))
}

#[cfg(test)]
mod tests {
    use super::*;
    use dx_common::{Extent, ObjectRef};

    #[test]
    fn test_parse_exec_arg() {
        let arg = parse_exec_arg("ex_api2@1:4,8:6,9").unwrap();
        assert_eq!(arg.object, ObjectRef::new("ex_api2", 1));
        assert_eq!(arg.region.bounds, vec![Extent::new(4, 3), Extent::new(8, 2)]);
    }

    #[test]
    fn test_parse_exec_arg_semantic_name_and_namespace() {
        let arg = parse_exec_arg("v:tas,m:ACCESS-ESM1-5@787677185:395,412:402,424@cmip6-planetary")
            .unwrap();
        assert_eq!(
            arg.object,
            ObjectRef::new("v:tas,m:ACCESS-ESM1-5", 787_677_185).in_namespace("cmip6-planetary")
        );
        assert_eq!(arg.region.spans(), vec![8, 13]);
    }

    #[test]
    fn test_parse_exec_arg_errors() {
        for bad in [
            "noversion",
            "@1:0:0",
            "a@1:0",
            "a@x:0:0",
            "a@1:0,0:1",
            "a@1:5:4",
            "a@1:0:0@",
        ] {
            assert!(parse_exec_arg(bad).is_err(), "{} accepted", bad);
        }
    }

    #[test]
    fn test_parse_index_list() {
        assert_eq!(parse_index_list("-3, 0,7").unwrap(), vec![-3, 0, 7]);
        assert!(parse_index_list("1,,2").is_err());
    }
}
