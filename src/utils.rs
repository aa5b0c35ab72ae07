//! Internal helpers shared across modules.

/// Converts a binary class name such as `java.lang.String` to its internal form.
pub(crate) fn internal_name(class: &str) -> String {
    class.replace('.', "/")
}

/// Converts an internal class name to its binary form.
pub(crate) fn binary_name(class: &str) -> String {
    class.replace('/', ".")
}

/// Converts an internal class name to its object descriptor.
///
/// For example, `java/lang/NullPointerException` becomes `Ljava/lang/NullPointerException;`.
pub(crate) fn class_name_to_descriptor(class: &str) -> String {
    let mut descriptor = String::with_capacity(class.len() + 2);
    descriptor.push('L');
    descriptor.push_str(class);
    descriptor.push(';');
    descriptor
}

/// The simple name of an internal class name, without package or outer classes.
pub(crate) fn simple_name(class: &str) -> &str {
    let after_package = class.rsplit('/').next().unwrap_or(class);
    after_package.rsplit('$').next().unwrap_or(after_package)
}

/// Looks up a class name, falling back to its nearest known outer class.
///
/// `a$b$c` with only `a` known becomes `<a>$b$c`. The inner suffixes are
/// kept as they are.
pub(crate) fn lookup_nested_class<'a, F>(name: &str, lookup: F) -> Option<String>
where
    F: Fn(&str) -> Option<&'a str>,
{
    if let Some(target) = lookup(name) {
        return Some(target.to_string());
    }
    let mut end = name.len();
    while let Some(split) = name[..end].rfind('$') {
        if let Some(outer) = lookup(&name[..split]) {
            return Some(format!("{}{}", outer, &name[split..]));
        }
        end = split;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names() {
        assert_eq!(internal_name("a.b.C$D"), "a/b/C$D");
        assert_eq!(binary_name("a/b/C$D"), "a.b.C$D");
        assert_eq!(class_name_to_descriptor("a/B"), "La/B;");
        assert_eq!(simple_name("a/b/C$Inner"), "Inner");
        assert_eq!(simple_name("Top"), "Top");
    }

    #[test]
    fn test_lookup_nested_class() {
        let lookup = |name: &str| match name {
            "a" => Some("com/example/Outer"),
            "a$b" => Some("com/example/Outer$Inner"),
            _ => None,
        };
        assert_eq!(lookup_nested_class("a", lookup).as_deref(), Some("com/example/Outer"));
        assert_eq!(lookup_nested_class("a$c", lookup).as_deref(), Some("com/example/Outer$c"));
        assert_eq!(
            lookup_nested_class("a$b$1", lookup).as_deref(),
            Some("com/example/Outer$Inner$1")
        );
        assert_eq!(lookup_nested_class("z$b", lookup), None);
    }
}
