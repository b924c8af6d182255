//! Bundle version ordering.
//!
//! Semantic-version precedence decides first:
//! - major, minor and patch compare numerically
//! - a pre-release sorts before its release
//!
//! When precedence is equal, build metadata breaks the tie. Catalogs cut
//! several builds of one release, and those must still order
//! deterministically:
//! - identifiers are split on `.`
//! - numeric identifiers compare as numbers and sort before text
//! - text identifiers compare lexically
//! - a shorter identifier list sorts first

use std::cmp::Ordering;

use semver::Version;

/// Compare two bundle versions, build metadata included.
///
/// [`Ordering::Equal`] is returned only when both versions are identical
/// down to their build metadata. Callers treat it as an ambiguity, never as
/// "pick either".
pub fn compare(a: &Version, b: &Version) -> Ordering {
    a.major
        .cmp(&b.major)
        .then(a.minor.cmp(&b.minor))
        .then(a.patch.cmp(&b.patch))
        .then_with(|| a.pre.cmp(&b.pre))
        .then_with(|| compare_build(a.build.as_str(), b.build.as_str()))
}

fn compare_build(a: &str, b: &str) -> Ordering {
    let a_ids = identifiers(a);
    let b_ids = identifiers(b);
    for (x, y) in a_ids.iter().zip(&b_ids) {
        let ord = compare_identifier(x, y);
        if ord != Ordering::Equal {
            return ord;
        }
    }
    a_ids.len().cmp(&b_ids.len())
}

fn identifiers(build: &str) -> Vec<&str> {
    if build.is_empty() {
        Vec::new()
    } else {
        build.split('.').collect()
    }
}

fn compare_identifier(a: &str, b: &str) -> Ordering {
    match (is_numeric(a), is_numeric(b)) {
        (true, true) => {
            let a_digits = a.trim_start_matches('0');
            let b_digits = b.trim_start_matches('0');
            a_digits
                .len()
                .cmp(&b_digits.len())
                .then_with(|| a_digits.cmp(b_digits))
                // "01" and "1" are the same number but not the same build
                .then_with(|| a.cmp(b))
        }
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => a.cmp(b),
    }
}

fn is_numeric(id: &str) -> bool {
    !id.is_empty() && id.bytes().all(|c| c.is_ascii_digit())
}
