//! Helpers for JVM internal class names (`a/b/Outer$Inner`).

use std::cmp::Ordering;

/// Last path segment of an internal name: `a/b/C$D` -> `C$D`.
pub fn simple_class_name(name: &str) -> &str {
    match name.rfind('/') {
        Some(pos) => &name[pos + 1..],
        None => name,
    }
}

/// Package part of an internal name, if any: `a/b/C` -> `a/b`.
pub fn package_name(name: &str) -> Option<&str> {
    match name.rfind('/') {
        Some(pos) if pos > 0 => Some(&name[..pos]),
        _ => None,
    }
}

fn has_outer_name(name: &str, sep_pos: usize) -> bool {
    // names starting with `$` have no outer part
    sep_pos > 0 && name.as_bytes()[sep_pos - 1] != b'/'
}

/// Outer part of a `$`-joined name: `a/b/C$D` -> `a/b/C`.
pub fn outer_name(name: &str) -> Option<&str> {
    match name.rfind('$') {
        Some(pos) if has_outer_name(name, pos) => Some(&name[..pos]),
        _ => None,
    }
}

/// Innermost part of a `$`-joined name: `a/b/C$D` -> `D`.
pub fn inner_name_part(name: &str) -> &str {
    match name.rfind('$') {
        Some(pos) => &name[pos + 1..],
        None => name,
    }
}

/// Joins an outer name and an inner simple name: `a/b/C` + `D` -> `a/b/C$D`.
pub fn nested_name(outer: &str, inner: &str) -> String {
    format!("{outer}${inner}")
}

/// Strips a generated numeric local-class prefix: `1Task` -> `Task`.
///
/// Local-class prefixes are locally-unique counters prepended during
/// remapping; they are not part of the logical name.
pub fn strip_local_prefix(name: &str) -> &str {
    name.trim_start_matches(|c: char| c.is_ascii_digit())
}

/// Natural string order: runs of ASCII digits compare numerically,
/// everything else compares bytewise. `C2` sorts before `C10`.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let a = a.as_bytes();
    let b = b.as_bytes();
    let mut i = 0;
    let mut j = 0;

    while i < a.len() && j < b.len() {
        let ca = a[i];
        let cb = b[j];

        if ca.is_ascii_digit() && cb.is_ascii_digit() {
            let sa = i;
            let sb = j;
            while i < a.len() && a[i].is_ascii_digit() {
                i += 1;
            }
            while j < b.len() && b[j].is_ascii_digit() {
                j += 1;
            }

            let da = trim_leading_zeros(&a[sa..i]);
            let db = trim_leading_zeros(&b[sb..j]);

            let ord = da.len().cmp(&db.len()).then_with(|| da.cmp(db));
            if ord != Ordering::Equal {
                return ord;
            }
        } else {
            let ord = ca.cmp(&cb);
            if ord != Ordering::Equal {
                return ord;
            }
            i += 1;
            j += 1;
        }
    }

    (a.len() - i).cmp(&(b.len() - j))
}

fn trim_leading_zeros(digits: &[u8]) -> &[u8] {
    let mut start = 0;
    while start + 1 < digits.len() && digits[start] == b'0' {
        start += 1;
    }
    &digits[start..]
}

/// Sibling order used for deterministic anonymous/local numbering:
/// shorter name first, then natural order.
pub fn sibling_cmp(a: &str, b: &str) -> Ordering {
    a.len().cmp(&b.len()).then_with(|| natural_cmp(a, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_parts() {
        assert_eq!(simple_class_name("a/b/C$D"), "C$D");
        assert_eq!(simple_class_name("C"), "C");
        assert_eq!(package_name("a/b/C"), Some("a/b"));
        assert_eq!(package_name("C"), None);
        assert_eq!(outer_name("a/b/C$D"), Some("a/b/C"));
        assert_eq!(outer_name("a/b/C"), None);
        assert_eq!(outer_name("a/b/$C"), None);
        assert_eq!(inner_name_part("a/b/C$D"), "D");
        assert_eq!(nested_name("a/b/C", "D"), "a/b/C$D");
    }

    #[test]
    fn local_prefix_stripping() {
        assert_eq!(strip_local_prefix("1Task"), "Task");
        assert_eq!(strip_local_prefix("12Task"), "Task");
        assert_eq!(strip_local_prefix("Task"), "Task");
        assert_eq!(strip_local_prefix(""), "");
    }

    #[test]
    fn natural_order_numbers() {
        assert_eq!(natural_cmp("C2", "C10"), Ordering::Less);
        assert_eq!(natural_cmp("C10", "C2"), Ordering::Greater);
        assert_eq!(natural_cmp("C02", "C2"), Ordering::Equal);
        assert_eq!(natural_cmp("a", "b"), Ordering::Less);
        assert_eq!(natural_cmp("a1x", "a1x"), Ordering::Equal);
        assert_eq!(natural_cmp("a1", "a1x"), Ordering::Less);
    }

    #[test]
    fn sibling_order_prefers_shorter_names() {
        assert_eq!(sibling_cmp("zz", "aaa"), Ordering::Less);
        assert_eq!(sibling_cmp("ab", "aa"), Ordering::Greater);
    }
}
