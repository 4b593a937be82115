//! Bundler fingerprinter (spec §4.4).

use deminify_model::{BundlerKind, Confidence, Fingerprint};

/// The `Object.*` boilerplate substrings esbuild's preamble tends to use
/// verbatim (spec §4.4, signal 2).
const BOILERPLATE_MEMBERS: &[&str] = &[
    "Object.create",
    "Object.defineProperty",
    "Object.getOwnPropertyDescriptor",
    "Object.getOwnPropertyNames",
    "Object.getPrototypeOf",
    "Object.prototype.hasOwnProperty",
];

/// Scores the three esbuild signals (spec §4.4) against the whole source and
/// the first five statement slices, producing a bundler + confidence verdict.
#[must_use]
pub fn fingerprint(source: &str, helpers_present: bool, first_statements: &[&str]) -> Fingerprint {
    let mut signals = Vec::new();

    if helpers_present {
        signals.push("runtime helper present".to_owned());
    }

    let boilerplate_hits = first_statements
        .iter()
        .take(5)
        .filter(|stmt| BOILERPLATE_MEMBERS.iter().any(|member| stmt.contains(member)))
        .count();
    if boilerplate_hits >= 3 {
        signals.push(format!(
            "{boilerplate_hits} of the first 5 statements reference Object.* boilerplate"
        ));
    }

    if source.contains("createRequire") && source.contains("import.meta.url") {
        signals.push("createRequire + import.meta.url interop present".to_owned());
    }

    let (bundler, confidence) = match signals.len() {
        0 => (BundlerKind::Unknown, Confidence::Low),
        1 => (BundlerKind::Esbuild, Confidence::Medium),
        _ => (BundlerKind::Esbuild, Confidence::High),
    };

    Fingerprint { bundler, confidence, signals }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_signals_is_unknown_low() {
        let fp = fingerprint("var x = 1;", false, &[]);
        assert_eq!(fp.bundler, BundlerKind::Unknown);
        assert_eq!(fp.confidence, Confidence::Low);
        assert!(fp.signals.is_empty());
    }

    #[test]
    fn one_signal_is_medium() {
        let fp = fingerprint("var x = 1;", true, &[]);
        assert_eq!(fp.bundler, BundlerKind::Esbuild);
        assert_eq!(fp.confidence, Confidence::Medium);
    }

    #[test]
    fn two_signals_is_high() {
        let stmts = [
            "var a = Object.create;",
            "var b = Object.defineProperty;",
            "var c = Object.getOwnPropertyNames;",
        ];
        let fp = fingerprint("var x = 1;", true, &stmts);
        assert_eq!(fp.bundler, BundlerKind::Esbuild);
        assert_eq!(fp.confidence, Confidence::High);
        assert_eq!(fp.signals.len(), 2);
    }

    #[test]
    fn interop_signal_detected() {
        let src = "const require = createRequire(import.meta.url);";
        let fp = fingerprint(src, false, &[]);
        assert_eq!(fp.signals.len(), 1);
        assert_eq!(fp.confidence, Confidence::Medium);
    }
}
