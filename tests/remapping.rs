//! Name resolution through mappings and class hierarchies.
#![allow(clippy::unwrap_used)]

use jvm_remap::classfile::{ClassFile, ConstantPoolBuilder, ACC_PRIVATE, ACC_PUBLIC};
use jvm_remap::hierarchy::PartialHierarchy;
use jvm_remap::{HierarchyGraph, MappingFormat, Remapper, SignatureKind};

fn class_bytes(name: &str, super_name: &str, interfaces: &[&str]) -> Vec<u8> {
    let mut pool = ConstantPoolBuilder::new();
    let this_class = pool.class(name).unwrap();
    let super_class = pool.class(super_name).unwrap();
    let interfaces = interfaces.iter().map(|i| pool.class(i).unwrap()).collect();
    ClassFile {
        minor_version: 0,
        major_version: 52,
        constant_pool: pool.into_pool(),
        access_flags: ACC_PUBLIC,
        this_class,
        super_class,
        interfaces,
        fields: vec![],
        methods: vec![],
        attributes: vec![],
    }
    .to_bytes()
    .unwrap()
}

// =============================================================================
// Overloads
// =============================================================================

const OVERLOADS: &str = r#"com.example.Shape -> a:
    void draw() -> a
    void draw(int) -> b
    void draw(com.example.Shape) -> c
    int area() -> a
"#;

#[test]
fn test_overload_by_descriptor() {
    let mapping = MappingFormat::Proguard.parse(OVERLOADS).unwrap();
    let hierarchy = HierarchyGraph::default();
    let remapper = Remapper::new(&mapping, &hierarchy).unwrap();

    assert_eq!(remapper.map_class_name("a"), "com/example/Shape");
    // Proguard descriptors are written in original names
    assert_eq!(remapper.map_method_name("a", "a", "()V"), "draw");
    assert_eq!(remapper.map_method_name("a", "b", "(I)V"), "draw");
    assert_eq!(remapper.map_method_name("a", "c", "(La;)V"), "draw");
    assert_eq!(remapper.map_method_name("a", "a", "()I"), "area");
    assert_eq!(remapper.map_method_name("a", "a", "(J)V"), "a");
}

// =============================================================================
// Inheritance
// =============================================================================

const DIAMOND: &str = "A com/example/Base\nA x value\nA m ()V run\n";

#[test]
fn test_inherited_field_resolves_to_declaring_class() {
    let mapping = MappingFormat::Csrg.parse(DIAMOND).unwrap();
    let classes = vec![
        class_bytes("A", "java/lang/Object", &[]),
        class_bytes("B", "A", &[]),
        class_bytes("C", "B", &["java/lang/Runnable"]),
    ];
    let (hierarchy, failures) = HierarchyGraph::scan(&classes, None);
    assert!(failures.is_empty());
    assert_eq!(hierarchy.supertypes("C"), ["B"]);

    let remapper = Remapper::new(&mapping, &hierarchy).unwrap();
    assert_eq!(remapper.map_field_name("C", "x"), "value");
    assert_eq!(remapper.map_field_name("B", "x"), "value");
    assert_eq!(remapper.map_method_name("C", "m", "()V"), "run");
    assert_eq!(remapper.map_class_name("C"), "C");
}

#[test]
fn test_private_members_are_not_inherited() {
    let mapping = MappingFormat::Csrg.parse(DIAMOND).unwrap();
    let mut partial = PartialHierarchy::new();
    partial.add_class("B", ["A"]);
    partial.add_class("A", Vec::<String>::new());
    partial.add_field_access("A", "x", ACC_PRIVATE);
    partial.add_method_access("A", "m", "()V", ACC_PRIVATE);
    let hierarchy = partial.build();

    let remapper = Remapper::new(&mapping, &hierarchy).unwrap();
    assert_eq!(remapper.map_field_name("B", "x"), "x");
    assert_eq!(remapper.map_method_name("B", "m", "()V"), "m");
    assert_eq!(remapper.map_field_name("A", "x"), "value");
}

#[test]
fn test_interfaces_are_searched() {
    let mapping = MappingFormat::Csrg.parse("I com/example/Task\nI a ()V execute\n").unwrap();
    let mut partial = PartialHierarchy::new();
    partial.add_class("Impl", ["java/lang/Object", "I"]);
    let hierarchy = partial.build();

    let remapper = Remapper::new(&mapping, &hierarchy).unwrap();
    assert_eq!(remapper.map_method_name("Impl", "a", "()V"), "execute");
    assert_eq!(remapper.map_method_name("Impl", "<init>", "()V"), "<init>");
}

// =============================================================================
// Passthrough
// =============================================================================

#[test]
fn test_unknown_symbols_pass_through() {
    let mapping = MappingFormat::Csrg.parse(DIAMOND).unwrap();
    let hierarchy = HierarchyGraph::default();
    let remapper = Remapper::new(&mapping, &hierarchy).unwrap();

    assert_eq!(remapper.map_class_name("z/Unknown"), "z/Unknown");
    assert_eq!(remapper.map_field_name("z/Unknown", "f"), "f");
    assert_eq!(remapper.map_method_name("z/Unknown", "g", "()V"), "g");
    assert_eq!(remapper.map_descriptor("(Lz/Unknown;[LA;)V"), "(Lz/Unknown;[Lcom/example/Base;)V");
    assert_eq!(
        remapper.map_signature("Ljava/util/Map<LA;+LA$Entry;>;", SignatureKind::Field),
        "Ljava/util/Map<Lcom/example/Base;+Lcom/example/Base$Entry;>;"
    );
    assert_eq!(remapper.map_signature("(broken", SignatureKind::Method), "(broken");
}

// =============================================================================
// Namespaces
// =============================================================================

const TINY: &str = "tiny\t2\t0\tofficial\tintermediary\tnamed
c\ta\tnet/minecraft/class_1\tnet/minecraft/World
\tf\tI\tb\tfield_1\tcount
\tm\t(La;)V\tc\tmethod_1\tspawn
\t\tp\t1\t\t\tworld
";

#[test]
fn test_namespaced_remapping() {
    let mapping = MappingFormat::TinyV2.parse(TINY).unwrap();
    let hierarchy = HierarchyGraph::default();

    let named = Remapper::namespaced(&mapping, &hierarchy, "official", "named").unwrap();
    assert_eq!(named.map_class_name("a"), "net/minecraft/World");
    assert_eq!(named.map_field_name("a", "b"), "count");
    assert_eq!(named.map_method_name("a", "c", "(La;)V"), "spawn");
    assert_eq!(named.local_variable_name("a", "c", "(La;)V", 1), Some("world"));
    assert!(named.has_local_variables("a", "c", "(La;)V"));

    // descriptors are translated into the source namespace
    let from_intermediary = Remapper::namespaced(&mapping, &hierarchy, "intermediary", "named").unwrap();
    assert_eq!(
        from_intermediary.map_method_name("net/minecraft/class_1", "method_1", "(Lnet/minecraft/class_1;)V"),
        "spawn"
    );
    assert_eq!(
        from_intermediary.local_variable_name("net/minecraft/class_1", "method_1", "(Lnet/minecraft/class_1;)V", 1),
        Some("world")
    );

    assert!(Remapper::namespaced(&mapping, &hierarchy, "official", "mojang").is_err());
    assert!(Remapper::new(&mapping, &hierarchy).is_err());
}

#[test]
fn test_swapped_mapping_remaps_backwards() {
    let mut mapping = MappingFormat::TinyV2.parse(TINY).unwrap();
    mapping.swap("official", "named").unwrap();
    let hierarchy = HierarchyGraph::default();

    let remapper = Remapper::namespaced(&mapping, &hierarchy, "named", "official").unwrap();
    assert_eq!(remapper.map_class_name("net/minecraft/World"), "a");
    assert_eq!(
        remapper.map_method_name("net/minecraft/World", "spawn", "(Lnet/minecraft/World;)V"),
        "c"
    );
}
