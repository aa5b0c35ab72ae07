//! End-to-end rewriting of class files and archive entries.
#![allow(clippy::unwrap_used)]

use jvm_remap::classfile::attributes::{Annotation, BootstrapMethod, Code, LocalVariable};
use jvm_remap::classfile::{
    find_attribute, Attribute, ClassFile, ClassFileError, Constant, ConstantPool, ConstantPoolBuilder, MemberInfo,
    ACC_ABSTRACT, ACC_ENUM, ACC_PUBLIC,
};
use jvm_remap::rewrite::VariableKey;
use jvm_remap::{Entry, Error, MappingFormat, RemapOptions, RewriteError, Session, VariableLedger};

const MAPPING: &str = "tiny\t2\t0\tofficial\tnamed
c\ta\tcom/example/Counter
\tf\tI\tb\ttotal
\tm\t(I)V\tc\tadd
\t\tp\t1\t\tamount
\tm\t(La;)La;\td\tmerge
c\tb\tcom/example/Listener
\tm\t(I)V\ta\tonChange
";

fn options() -> RemapOptions {
    RemapOptions {
        format: Some(MappingFormat::TinyV2),
        target_namespace: Some("named".into()),
        regenerate_variables: true,
        ..Default::default()
    }
}

fn local(pool: &mut ConstantPoolBuilder, index: u16, name: &str, descriptor: &str) -> LocalVariable {
    LocalVariable {
        start_pc: 0,
        length: 1,
        name_index: pool.utf8(name).unwrap(),
        descriptor_index: pool.utf8(descriptor).unwrap(),
        index,
    }
}

fn attribute(pool: &mut ConstantPoolBuilder, name: &str, data: Vec<u8>) -> Attribute {
    Attribute {
        name_index: pool.utf8(name).unwrap(),
        data,
    }
}

/// `a` with a field, a method with locals, an abstract method and a
/// lambda call site implementing `b`.
fn counter_class() -> Vec<u8> {
    let mut pool = ConstantPoolBuilder::new();
    let this_class = pool.class("a").unwrap();
    let super_class = pool.class("java/lang/Object").unwrap();

    let field = MemberInfo {
        access_flags: ACC_PUBLIC,
        name_index: pool.utf8("b").unwrap(),
        descriptor_index: pool.utf8("I").unwrap(),
        attributes: vec![],
    };

    let locals = vec![
        local(&mut pool, 0, "this", "La;"),
        local(&mut pool, 1, "x", "I"),
        local(&mut pool, 2, "y", "Ljava/util/List;"),
        local(&mut pool, 3, "z", "La;"),
    ];
    let types = vec![local(&mut pool, 2, "y", "Ljava/util/List<La;>;")];
    let code = Code {
        max_stack: 0,
        max_locals: 4,
        code: vec![0xb1],
        exception_table: vec![],
        attributes: vec![
            attribute(&mut pool, "LocalVariableTable", LocalVariable::write_table(&locals).unwrap()),
            attribute(&mut pool, "LocalVariableTypeTable", LocalVariable::write_table(&types).unwrap()),
        ],
    };
    let add = MemberInfo {
        access_flags: ACC_PUBLIC,
        name_index: pool.utf8("c").unwrap(),
        descriptor_index: pool.utf8("(I)V").unwrap(),
        attributes: vec![attribute(&mut pool, "Code", code.to_bytes().unwrap())],
    };
    let merge = MemberInfo {
        access_flags: ACC_PUBLIC | ACC_ABSTRACT,
        name_index: pool.utf8("d").unwrap(),
        descriptor_index: pool.utf8("(La;)La;").unwrap(),
        attributes: vec![],
    };

    let factory = pool
        .method_ref(
            "java/lang/invoke/LambdaMetafactory",
            "metafactory",
            "(Ljava/lang/invoke/MethodHandles$Lookup;Ljava/lang/String;Ljava/lang/invoke/MethodType;Ljava/lang/invoke/MethodType;Ljava/lang/invoke/MethodHandle;Ljava/lang/invoke/MethodType;)Ljava/lang/invoke/CallSite;",
        )
        .unwrap();
    let handle = pool.method_handle(6, factory).unwrap();
    let sam = pool.method_type("(I)V").unwrap();
    pool.invoke_dynamic(0, "a", "()Lb;").unwrap();
    let bootstrap = BootstrapMethod::write_table(&[BootstrapMethod {
        method_ref: handle,
        arguments: vec![sam],
    }])
    .unwrap();
    let bootstrap = attribute(&mut pool, "BootstrapMethods", bootstrap);

    ClassFile {
        minor_version: 0,
        major_version: 52,
        constant_pool: pool.into_pool(),
        access_flags: ACC_PUBLIC,
        this_class,
        super_class,
        interfaces: vec![],
        fields: vec![field],
        methods: vec![add, merge],
        attributes: vec![bootstrap],
    }
    .to_bytes()
    .unwrap()
}

fn local_names(pool: &ConstantPool, method: &MemberInfo, table: &str) -> Vec<(String, String)> {
    let code = Code::parse(&find_attribute(pool, &method.attributes, "Code").unwrap().data).unwrap();
    let table = find_attribute(pool, &code.attributes, table).unwrap();
    LocalVariable::parse_table(&table.data)
        .unwrap()
        .iter()
        .map(|v| {
            (
                pool.utf8(v.name_index).unwrap().to_string(),
                pool.utf8(v.descriptor_index).unwrap().to_string(),
            )
        })
        .collect()
}

fn pair(name: &str, descriptor: &str) -> (String, String) {
    (name.to_string(), descriptor.to_string())
}

// =============================================================================
// Whole classes
// =============================================================================

#[test]
fn test_rewrite_class() {
    let session = Session::from_text(MAPPING, options()).unwrap();
    let report = session.run(vec![Entry::new("a.class", counter_class())]).unwrap();
    assert!(report.failures.is_empty());
    assert_eq!(report.entries.len(), 1);
    assert_eq!(report.entries[0].name, "com/example/Counter.class");

    let class = ClassFile::parse(&report.entries[0].data).unwrap();
    let pool = &class.constant_pool;
    assert_eq!(class.name().unwrap(), "com/example/Counter");
    assert_eq!(class.member(&class.fields[0]).unwrap(), ("total", "I"));
    assert_eq!(class.member(&class.methods[0]).unwrap(), ("add", "(I)V"));
    assert_eq!(
        class.member(&class.methods[1]).unwrap(),
        ("merge", "(Lcom/example/Counter;)Lcom/example/Counter;")
    );

    assert_eq!(
        local_names(pool, &class.methods[0], "LocalVariableTable"),
        [
            pair("this", "Lcom/example/Counter;"),
            pair("amount", "I"),
            pair("list", "Ljava/util/List;"),
            pair("counter", "Lcom/example/Counter;"),
        ]
    );
    assert_eq!(
        local_names(pool, &class.methods[0], "LocalVariableTypeTable"),
        [pair("list", "Ljava/util/List<Lcom/example/Counter;>;")]
    );

    let call_site = pool
        .iter()
        .find_map(|(_, constant)| match constant {
            Constant::InvokeDynamic {
                name_and_type_index, ..
            } => Some(*name_and_type_index),
            _ => None,
        })
        .unwrap();
    assert_eq!(
        pool.name_and_type(call_site).unwrap(),
        ("onChange", "()Lcom/example/Listener;")
    );

    let ledger = session.ledger().unwrap();
    assert_eq!(ledger.len(), 3);
    assert_eq!(ledger.get(&VariableKey::new("a", "c", "(I)V", 2)).as_deref(), Some("list"));
    assert_eq!(ledger.get(&VariableKey::new("a", "c", "(I)V", 3)).as_deref(), Some("counter"));
    assert_eq!(ledger.get(&VariableKey::new("a", "d", "(La;)La;", 1)).as_deref(), Some("counter"));
}

#[test]
fn test_ledger_keeps_names_stable() {
    let ledger = VariableLedger::new();
    ledger.record(VariableKey::new("a", "c", "(I)V", 3), "previous".into());
    let json = ledger.to_json().unwrap();

    let session = Session::from_text(MAPPING, options())
        .unwrap()
        .with_ledger(VariableLedger::from_json(&json).unwrap());
    let report = session.run(vec![Entry::new("a.class", counter_class())]).unwrap();

    let class = ClassFile::parse(&report.entries[0].data).unwrap();
    let names: Vec<String> = local_names(&class.constant_pool, &class.methods[0], "LocalVariableTable")
        .into_iter()
        .map(|(name, _)| name)
        .collect();
    assert_eq!(names, ["this", "amount", "list", "previous"]);
}

#[test]
fn test_without_regeneration_unmapped_locals_keep_their_names() {
    let options = RemapOptions {
        regenerate_variables: false,
        ..options()
    };
    let session = Session::from_text(MAPPING, options).unwrap();
    assert!(session.ledger().is_none());
    let report = session.run(vec![Entry::new("a.class", counter_class())]).unwrap();

    let class = ClassFile::parse(&report.entries[0].data).unwrap();
    let names: Vec<String> = local_names(&class.constant_pool, &class.methods[0], "LocalVariableTable")
        .into_iter()
        .map(|(name, _)| name)
        .collect();
    assert_eq!(names, ["this", "amount", "y", "z"]);
}

#[test]
fn test_enum_constructor_parameter_annotations() {
    let mut pool = ConstantPoolBuilder::new();
    let this_class = pool.class("e").unwrap();
    let listener = pool.utf8("Lb;").unwrap();
    let slots = vec![
        vec![],
        vec![],
        vec![Annotation {
            type_index: listener,
            elements: vec![],
        }],
    ];
    let annotations = attribute(
        &mut pool,
        "RuntimeVisibleParameterAnnotations",
        Annotation::write_parameters(&slots).unwrap(),
    );
    let constructor = MemberInfo {
        access_flags: 0,
        name_index: pool.utf8("<init>").unwrap(),
        descriptor_index: pool.utf8("(Ljava/lang/String;ILa;)V").unwrap(),
        attributes: vec![annotations],
    };
    let bytes = ClassFile {
        minor_version: 0,
        major_version: 52,
        constant_pool: pool.into_pool(),
        access_flags: ACC_PUBLIC | ACC_ENUM,
        this_class,
        super_class: 0,
        interfaces: vec![],
        fields: vec![],
        methods: vec![constructor],
        attributes: vec![],
    }
    .to_bytes()
    .unwrap();

    let session = Session::from_text(MAPPING, options()).unwrap();
    let report = session.run(vec![Entry::new("e.class", bytes)]).unwrap();
    let class = ClassFile::parse(&report.entries[0].data).unwrap();
    let pool = &class.constant_pool;
    assert_eq!(
        class.member(&class.methods[0]).unwrap(),
        ("<init>", "(Ljava/lang/String;ILcom/example/Counter;)V")
    );

    let attribute = find_attribute(pool, &class.methods[0].attributes, "RuntimeVisibleParameterAnnotations").unwrap();
    let slots = Annotation::parse_parameters(&attribute.data).unwrap();
    assert_eq!(slots.len(), 1);
    assert_eq!(pool.utf8(slots[0][0].type_index).unwrap(), "Lcom/example/Listener;");
}

#[test]
fn test_string_constant_with_unpaired_surrogate() {
    let mut pool = ConstantPoolBuilder::new();
    let this_class = pool.class("a").unwrap();
    let super_class = pool.class("java/lang/Object").unwrap();
    pool.string("XYZ").unwrap();
    let mut bytes = ClassFile {
        minor_version: 0,
        major_version: 52,
        constant_pool: pool.into_pool(),
        access_flags: ACC_PUBLIC,
        this_class,
        super_class,
        interfaces: vec![],
        fields: vec![],
        methods: vec![],
        attributes: vec![],
    }
    .to_bytes()
    .unwrap();
    // "\u{D800}" has no modified UTF-8 encoding through a Rust string
    let placeholder = [0x01, 0x00, 0x03, b'X', b'Y', b'Z'];
    let position = bytes.windows(placeholder.len()).position(|w| w == placeholder).unwrap();
    bytes[position + 3..position + 6].copy_from_slice(&[0xED, 0xA0, 0x80]);

    let session = Session::from_text(MAPPING, options()).unwrap();
    let report = session.run(vec![Entry::new("a.class", bytes)]).unwrap();
    assert!(report.failures.is_empty());
    assert_eq!(report.entries[0].name, "com/example/Counter.class");

    let class = ClassFile::parse(&report.entries[0].data).unwrap();
    assert!(class
        .constant_pool
        .iter()
        .any(|(_, constant)| constant == &Constant::Utf8Bytes(vec![0xED, 0xA0, 0x80])));
}

// =============================================================================
// Archives
// =============================================================================

const MANIFEST: &str = "Manifest-Version: 1.0\r\n\
Main-Class: com.example.Main\r\n\
\r\n\
Name: a.class\r\n\
SHA-256-Digest: 47DEQpj8HBSa+/TImW+5JCeuQeRkm5NMpJWZG3hSuFU=\r\n\
\r\n";

#[test]
fn test_archive_entries() {
    let session = Session::from_text(MAPPING, options()).unwrap();
    let report = session
        .run(vec![
            Entry::new("META-INF/MANIFEST.MF", MANIFEST),
            Entry::new("META-INF/SIGNER.SF", "Signature-Version: 1.0\r\n"),
            Entry::new("META-INF/SIGNER.RSA", vec![0x30, 0x82]),
            Entry::new("a.class", counter_class()),
            Entry::new("broken.class", "nope"),
            Entry::new("assets/logo.png", vec![0x89, b'P', b'N', b'G']),
        ])
        .unwrap();

    let names: Vec<&str> = report.entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, ["META-INF/MANIFEST.MF", "com/example/Counter.class", "assets/logo.png"]);
    assert_eq!(report.dropped, ["META-INF/SIGNER.SF", "META-INF/SIGNER.RSA"]);

    assert_eq!(
        report.entries[0].data,
        b"Manifest-Version: 1.0\r\nMain-Class: com.example.Main\r\n\r\n"
    );
    assert_eq!(report.entries[2].data, [0x89, b'P', b'N', b'G']);

    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].name, "broken.class");
    assert!(matches!(
        report.failures[0].error,
        Error::Rewrite(RewriteError::ClassFile(ClassFileError::BadMagic(_)))
    ));
}
