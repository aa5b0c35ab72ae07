//! JVM type descriptors and generic signatures.
//!
//! Descriptors use internal (slash separated) class names, e.g.
//! `(Ljava/lang/String;[I)V`.

fn java_base_types(encoded_ty: char) -> Option<&'static str> {
    match encoded_ty {
        'Z' => Some("boolean"),
        'B' => Some("byte"),
        'C' => Some("char"),
        'S' => Some("short"),
        'I' => Some("int"),
        'J' => Some("long"),
        'F' => Some("float"),
        'D' => Some("double"),
        'V' => Some("void"),
        _ => None,
    }
}

fn base_type_descriptor(java_ty: &str) -> Option<char> {
    match java_ty {
        "boolean" => Some('Z'),
        "byte" => Some('B'),
        "char" => Some('C'),
        "short" => Some('S'),
        "int" => Some('I'),
        "long" => Some('J'),
        "float" => Some('F'),
        "double" => Some('D'),
        "void" => Some('V'),
        _ => None,
    }
}

/// Converts a Java source type such as `java.lang.String[]` into a field descriptor.
///
/// ```
/// assert_eq!(jvm_remap::descriptor::java_type_to_descriptor("int[][]"), Some("[[I".into()));
/// assert_eq!(
///     jvm_remap::descriptor::java_type_to_descriptor("java.util.Map$Entry"),
///     Some("Ljava/util/Map$Entry;".into())
/// );
/// ```
pub fn java_type_to_descriptor(java_ty: &str) -> Option<String> {
    let java_ty = java_ty.trim();
    let mut element = java_ty;
    let mut dimensions = 0;
    while let Some(inner) = element.strip_suffix("[]") {
        element = inner;
        dimensions += 1;
    }
    if element.is_empty() {
        return None;
    }

    let mut descriptor = "[".repeat(dimensions);
    match base_type_descriptor(element) {
        Some('V') if dimensions > 0 => return None,
        Some(base) => descriptor.push(base),
        None => {
            descriptor.push('L');
            descriptor.push_str(&element.replace('.', "/"));
            descriptor.push(';');
        }
    }
    Some(descriptor)
}

/// Converts a field descriptor back into its Java source type.
pub fn descriptor_to_java_type(descriptor: &str) -> Option<String> {
    let mut chrs = descriptor.chars();
    let mut suffix = String::new();
    while let Some(token) = chrs.next() {
        if token == 'L' {
            // expect and remove final `;`
            if chrs.next_back()? != ';' {
                return None;
            }
            let class = chrs.as_str();
            if class.is_empty() {
                return None;
            }
            return Some(format!("{}{}", class.replace('/', "."), suffix));
        } else if token == '[' {
            suffix.push_str("[]");
        } else if let Some(ty) = java_base_types(token) {
            if chrs.next().is_some() {
                return None;
            }
            return Some(format!("{}{}", ty, suffix));
        } else {
            return None;
        }
    }
    None
}

/// Builds a method descriptor from Java source types, as they appear in
/// Proguard mapping files.
pub fn java_method_to_descriptor(return_ty: &str, arguments: &str) -> Option<String> {
    let mut descriptor = String::from("(");
    for argument in arguments.split(',').filter(|a| !a.trim().is_empty()) {
        descriptor.push_str(&java_type_to_descriptor(argument)?);
    }
    descriptor.push(')');
    descriptor.push_str(&java_type_to_descriptor(return_ty)?);
    Some(descriptor)
}

/// Splits a method descriptor into its parameter descriptors and return descriptor.
pub fn parse_method_descriptor(descriptor: &str) -> Option<(Vec<&str>, &str)> {
    let signature = descriptor.strip_prefix('(')?;

    let (parameter_types, return_type) = signature.rsplit_once(')')?;
    if return_type.is_empty() || field_descriptor_len(return_type)? != return_type.len() {
        return None;
    }

    let mut types = Vec::new();
    let mut rest = parameter_types;
    while !rest.is_empty() {
        let len = field_descriptor_len(rest)?;
        let (ty, tail) = rest.split_at(len);
        if ty == "V" {
            return None;
        }
        types.push(ty);
        rest = tail;
    }

    Some((types, return_type))
}

/// Length in bytes of the field descriptor at the start of `descriptor`.
fn field_descriptor_len(descriptor: &str) -> Option<usize> {
    let bytes = descriptor.as_bytes();
    let mut pos = 0;
    while bytes.get(pos) == Some(&b'[') {
        pos += 1;
    }
    match bytes.get(pos)? {
        b'L' => {
            let end = descriptor[pos..].find(';')?;
            if end == 1 {
                return None;
            }
            Some(pos + end + 1)
        }
        c if java_base_types(*c as char).is_some() => Some(pos + 1),
        _ => None,
    }
}

/// The return descriptor of a method descriptor.
pub fn return_type(descriptor: &str) -> Option<&str> {
    parse_method_descriptor(descriptor).map(|(_, ret)| ret)
}

/// Internal class name of an object descriptor, e.g. `Lfoo/Bar;` -> `foo/Bar`.
pub fn object_internal_name(descriptor: &str) -> Option<&str> {
    descriptor.strip_prefix('L')?.strip_suffix(';')
}

/// Number of leading array brackets.
pub fn array_dimension(descriptor: &str) -> usize {
    descriptor.bytes().take_while(|b| *b == b'[').count()
}

/// Local variable slots occupied by each parameter of a method.
///
/// Instance methods start at slot 1, `long` and `double` take two slots.
pub fn parameter_slots(descriptor: &str, is_static: bool) -> Option<Vec<u16>> {
    let (params, _) = parse_method_descriptor(descriptor)?;
    let mut slot: u16 = if is_static { 0 } else { 1 };
    let mut slots = Vec::with_capacity(params.len());
    for param in params {
        slots.push(slot);
        slot += if param == "J" || param == "D" { 2 } else { 1 };
    }
    Some(slots)
}

/// Substitutes every class token of a field or method descriptor.
///
/// Primitive types, array brackets and overall shape are preserved. A
/// malformed descriptor is returned unchanged.
pub fn remap_descriptor<F>(descriptor: &str, mut map_class: F) -> String
where
    F: FnMut(&str) -> Option<String>,
{
    let mut out = String::with_capacity(descriptor.len());
    let mut rest = descriptor;
    while let Some(pos) = rest.find('L') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos + 1..];
        let end = match tail.find(';') {
            Some(end) => end,
            None => return descriptor.to_string(),
        };
        let class = &tail[..end];
        out.push('L');
        match map_class(class) {
            Some(mapped) => out.push_str(&mapped),
            None => out.push_str(class),
        }
        out.push(';');
        rest = &tail[end + 1..];
    }
    out.push_str(rest);
    out
}

/// Remaps a generic signature (class, method or field signature).
///
/// Inner class suffixes (`Outer<T>.Inner`) are resolved through the full
/// `Outer$Inner` name. Returns `None` for malformed signatures.
pub fn remap_signature<F>(signature: &str, map_class: F) -> Option<String>
where
    F: FnMut(&str) -> Option<String>,
{
    let mut remapper = SignatureRemapper {
        input: signature.as_bytes(),
        source: signature,
        pos: 0,
        out: String::with_capacity(signature.len()),
        map_class,
    };
    remapper.signature()?;
    Some(remapper.out)
}

struct SignatureRemapper<'s, F> {
    input: &'s [u8],
    source: &'s str,
    pos: usize,
    out: String,
    map_class: F,
}

impl<'s, F> SignatureRemapper<'s, F>
where
    F: FnMut(&str) -> Option<String>,
{
    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn expect(&mut self, byte: u8) -> Option<()> {
        if self.peek()? != byte {
            return None;
        }
        self.out.push(byte as char);
        self.pos += 1;
        Some(())
    }

    fn take_until(&mut self, stop: &[u8]) -> Option<&'s str> {
        let start = self.pos;
        while !stop.contains(&self.peek()?) {
            self.pos += 1;
        }
        self.source.get(start..self.pos)
    }

    fn map(&mut self, class: &str) -> String {
        (self.map_class)(class).unwrap_or_else(|| class.to_string())
    }

    fn signature(&mut self) -> Option<()> {
        if self.peek() == Some(b'<') {
            self.type_parameters()?;
        }
        if self.peek() == Some(b'(') {
            self.expect(b'(')?;
            while self.peek()? != b')' {
                self.java_type()?;
            }
            self.expect(b')')?;
            self.java_type()?;
            while self.peek() == Some(b'^') {
                self.expect(b'^')?;
                self.reference_type()?;
            }
        } else {
            self.reference_type()?;
            while self.pos < self.input.len() {
                self.reference_type()?;
            }
        }
        (self.pos == self.input.len()).then_some(())
    }

    fn type_parameters(&mut self) -> Option<()> {
        self.expect(b'<')?;
        while self.peek()? != b'>' {
            let identifier = self.take_until(b":")?;
            if identifier.is_empty() {
                return None;
            }
            self.out.push_str(identifier);
            self.expect(b':')?;
            if matches!(self.peek()?, b'L' | b'T' | b'[') {
                self.reference_type()?;
            }
            while self.peek()? == b':' {
                self.expect(b':')?;
                self.reference_type()?;
            }
        }
        self.expect(b'>')
    }

    fn java_type(&mut self) -> Option<()> {
        let next = self.peek()?;
        if java_base_types(next as char).is_some() {
            self.expect(next)
        } else {
            self.reference_type()
        }
    }

    fn reference_type(&mut self) -> Option<()> {
        match self.peek()? {
            b'L' => self.class_type(),
            b'T' => {
                self.expect(b'T')?;
                let variable = self.take_until(b";")?;
                self.out.push_str(variable);
                self.expect(b';')
            }
            b'[' => {
                self.expect(b'[')?;
                self.java_type()
            }
            _ => None,
        }
    }

    fn class_type(&mut self) -> Option<()> {
        self.pos += 1;
        self.out.push('L');
        let mut class = self.take_until(b"<.;")?.to_string();
        let mut mapped = self.map(&class);
        self.out.push_str(&mapped);
        loop {
            match self.peek()? {
                b'<' => self.type_arguments()?,
                b'.' => {
                    self.expect(b'.')?;
                    let inner = self.take_until(b"<.;")?;
                    let outer = format!("{}$", mapped);
                    class = format!("{}${}", class, inner);
                    mapped = self.map(&class);
                    let start = if mapped.starts_with(&outer) {
                        outer.len()
                    } else {
                        mapped.rfind('$').map_or(0, |pos| pos + 1)
                    };
                    self.out.push_str(&mapped[start..]);
                }
                b';' => return self.expect(b';'),
                _ => return None,
            }
        }
    }

    fn type_arguments(&mut self) -> Option<()> {
        self.expect(b'<')?;
        while self.peek()? != b'>' {
            match self.peek()? {
                b'*' => self.expect(b'*')?,
                wildcard @ (b'+' | b'-') => {
                    self.expect(wildcard)?;
                    self.reference_type()?;
                }
                _ => self.reference_type()?,
            }
        }
        self.expect(b'>')
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn mapper(class: &str) -> Option<String> {
        match class {
            "a" => Some("com/example/Foo".into()),
            "a$b" => Some("com/example/Foo$Bar".into()),
            "c" => Some("com/example/Baz".into()),
            _ => None,
        }
    }

    #[test]
    fn test_java_type_to_descriptor() {
        let tests = HashMap::from([
            ("int", "I"),
            ("int[]", "[I"),
            ("long[][]", "[[J"),
            ("void", "V"),
            ("java.lang.String", "Ljava/lang/String;"),
            ("java.lang.String[]", "[Ljava/lang/String;"),
        ]);

        for (ty, expected) in tests {
            assert_eq!(java_type_to_descriptor(ty).unwrap(), expected);
            assert_eq!(descriptor_to_java_type(expected).unwrap(), ty);
        }

        assert!(java_type_to_descriptor("").is_none());
        assert!(java_type_to_descriptor("void[]").is_none());
        assert!(descriptor_to_java_type("L;").is_none());
        assert!(descriptor_to_java_type("").is_none());
    }

    #[test]
    fn test_java_method_to_descriptor() {
        assert_eq!(
            java_method_to_descriptor("void", "").unwrap(),
            "()V".to_string()
        );
        assert_eq!(
            java_method_to_descriptor("java.lang.Object", "int,java.lang.String[]").unwrap(),
            "(I[Ljava/lang/String;)Ljava/lang/Object;".to_string()
        );
    }

    #[test]
    fn test_parse_method_descriptor() {
        assert_eq!(
            parse_method_descriptor("(I[JLjava/lang/String;)V"),
            Some((vec!["I", "[J", "Ljava/lang/String;"], "V"))
        );
        assert_eq!(parse_method_descriptor("()[[Lfoo;"), Some((vec![], "[[Lfoo;")));

        for invalid in ["", "()", "(L)V", "(V)V", "I", "(I)VV"] {
            assert!(parse_method_descriptor(invalid).is_none(), "{}", invalid);
        }
    }

    #[test]
    fn test_parameter_slots() {
        assert_eq!(parameter_slots("(IJLjava/lang/String;D[J)V", false).unwrap(), vec![1, 2, 4, 5, 7]);
        assert_eq!(parameter_slots("(IJ)V", true).unwrap(), vec![0, 1]);
        assert_eq!(parameter_slots("()V", true).unwrap(), Vec::<u16>::new());
    }

    #[test]
    fn test_remap_descriptor() {
        assert_eq!(remap_descriptor("(La;I[[Lc;)Lx;", mapper), "(Lcom/example/Foo;I[[Lcom/example/Baz;)Lx;");
        assert_eq!(remap_descriptor("[La$b;", mapper), "[Lcom/example/Foo$Bar;");
        assert_eq!(remap_descriptor("J", mapper), "J");
        // unterminated class tokens are left alone
        assert_eq!(remap_descriptor("(La", mapper), "(La");
    }

    #[test]
    fn test_remap_signature() {
        let tests = HashMap::from([
            ("La<Lc;>;", "Lcom/example/Foo<Lcom/example/Baz;>;"),
            (
                "<T:La;U::Ljava/lang/Comparable<TT;>;>Ljava/lang/Object;Lc;",
                "<T:Lcom/example/Foo;U::Ljava/lang/Comparable<TT;>;>Ljava/lang/Object;Lcom/example/Baz;",
            ),
            (
                "<LT:Ljava/lang/Object;>(TLT;[La;)V",
                "<LT:Ljava/lang/Object;>(TLT;[Lcom/example/Foo;)V",
            ),
            (
                "(Ljava/util/List<+La;>;)Ljava/util/Map<-Lc;*>;^La;^TX;",
                "(Ljava/util/List<+Lcom/example/Foo;>;)Ljava/util/Map<-Lcom/example/Baz;*>;^Lcom/example/Foo;^TX;",
            ),
            ("La<TT;>.b;", "Lcom/example/Foo<TT;>.Bar;"),
        ]);

        for (signature, expected) in tests {
            assert_eq!(remap_signature(signature, mapper).unwrap(), expected);
        }

        // `*` is only valid inside type arguments
        assert_eq!(remap_signature("(La;*)V", mapper), None);
        assert_eq!(remap_signature("La", mapper), None);
        assert_eq!(remap_signature("<T>V", mapper), None);
    }
}
