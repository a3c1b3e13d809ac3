//! Helpers for Java class and field names as they appear in streams

/// Characters that may appear in a Java identifier. The JVM is more lenient
/// than the language here; this matches the source-level rule.
pub fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// Rewrite characters that cannot appear in a Java identifier, keeping the
/// separators of qualified and array spellings intact.
pub fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| {
            if is_identifier_char(c) || matches!(c, '.' | '[' | ']') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Split `Outer$Inner` at the last `$` into (`Outer`, `Inner`). Returns
/// `None` when the name has no member structure.
pub fn split_member(name: &str) -> Option<(&str, &str)> {
    let at = name.rfind('$')?;
    let (outer, inner) = (&name[..at], &name[at + 1..]);
    if outer.is_empty() || inner.is_empty() {
        None
    } else {
        Some((outer, inner))
    }
}

/// True for the synthetic `this$<digits>` fields the compiler adds to carry
/// an inner class's outer reference.
pub fn is_outer_reference(field_name: &str) -> bool {
    match field_name.strip_prefix("this$") {
        Some(digits) => !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()),
        None => false,
    }
}

/// True when a member-class segment names a local or anonymous class
/// (`Outer$1`, `Outer$1Helper`).
pub fn is_local_segment(segment: &str) -> bool {
    segment.starts_with(|c: char| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn member_splitting() {
        assert_eq!(split_member("Outer$Inner"), Some(("Outer", "Inner")));
        assert_eq!(split_member("A$B$C"), Some(("A$B", "C")));
        assert_eq!(split_member("Plain"), None);
        assert_eq!(split_member("$Leading"), None);
        assert_eq!(split_member("Trailing$"), None);
    }

    #[test]
    fn outer_reference_fields() {
        assert!(is_outer_reference("this$0"));
        assert!(is_outer_reference("this$12"));
        assert!(!is_outer_reference("this$"));
        assert!(!is_outer_reference("this$x"));
        assert!(!is_outer_reference("that$0"));
    }

    #[test]
    fn local_segments() {
        assert!(is_local_segment("1"));
        assert!(is_local_segment("2Helper"));
        assert!(!is_local_segment("Helper"));
    }

    #[test]
    fn sanitizing() {
        assert_eq!(sanitize("foo.Bar$Baz"), "foo.Bar$Baz");
        assert_eq!(sanitize("bad-name"), "bad_name");
        assert_eq!(sanitize("int[]"), "int[]");
    }
}
