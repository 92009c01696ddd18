//! Argument normalization utilities.
//!
//! Transforms CLI arguments before clap parsing to support invocation
//! styles that clap cannot express directly.

use std::path::Path;

/// Rewrite argv when the binary runs under an alias name.
///
/// `aliases` maps program names (without a `.sh` suffix) to the argv
/// words they stand for. `upload_env.sh dw-dev` with
/// `("upload_env", ["container", "upload"])` becomes
/// `<bin> container upload dw-dev`. Unknown names pass through unchanged.
pub fn normalize_invocation_alias(
    args: Vec<String>,
    bin_name: &str,
    aliases: &[(&str, &[&str])],
) -> Vec<String> {
    let Some(argv0) = args.first() else {
        return args;
    };

    let Some(file_name) = Path::new(argv0).file_name().and_then(|n| n.to_str()) else {
        return args;
    };
    let stem = file_name.strip_suffix(".sh").unwrap_or(file_name);

    let Some((_, expansion)) = aliases.iter().find(|(name, _)| *name == stem) else {
        return args;
    };

    let mut result = Vec::with_capacity(args.len() + expansion.len());
    result.push(bin_name.to_string());
    result.extend(expansion.iter().map(|s| s.to_string()));
    result.extend(args.into_iter().skip(1));
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALIASES: &[(&str, &[&str])] = &[
        ("upload_env", &["container", "upload"]),
        ("run_arthur", &["container", "run"]),
    ];

    fn argv(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn alias_with_script_suffix_is_expanded() {
        let args = normalize_invocation_alias(
            argv(&["/usr/local/bin/upload_env.sh", "-p", "dev", "cfg", "dw-dev"]),
            "arthur-ops",
            ALIASES,
        );
        assert_eq!(
            args,
            argv(&["arthur-ops", "container", "upload", "-p", "dev", "cfg", "dw-dev"])
        );
    }

    #[test]
    fn alias_without_suffix_is_expanded() {
        let args = normalize_invocation_alias(argv(&["run_arthur"]), "arthur-ops", ALIASES);
        assert_eq!(args, argv(&["arthur-ops", "container", "run"]));
    }

    #[test]
    fn regular_invocation_passes_through() {
        let original = argv(&["arthur-ops", "release", "--dir", "."]);
        assert_eq!(
            normalize_invocation_alias(original.clone(), "arthur-ops", ALIASES),
            original
        );
    }
}
