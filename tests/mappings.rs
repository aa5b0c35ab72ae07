//! Parsing, generating and transforming mappings across formats.
#![allow(clippy::unwrap_used)]

use jvm_remap::format::ParseErrorKind;
use jvm_remap::{ConfigError, GenerateError, MappingError, MappingFormat, RemapOptions, Session};

const SRG: &str = r#"CL: a com/example/World
CL: b com/example/Entity
FD: a/a com/example/World/entities
MD: a/a (Lb;)V com/example/World/spawn (Lcom/example/Entity;)V
MD: b/a ()I com/example/Entity/getHealth ()I
"#;

const PROGUARD: &str = r#"com.example.World -> a:
    java.util.List entities -> a
    void spawn(com.example.Entity) -> a
com.example.Entity -> b:
    int getHealth() -> a
"#;

const TSRG2: &str = "tsrg2 obf srg named
a C_1 com/example/World
\ta f_1 entities
\ta (Lb;)V m_1 spawn
\t\t1 o p_1 entity
b C_2 com/example/Entity
\ta ()I m_2 getHealth
";

// =============================================================================
// Processing
// =============================================================================

#[test]
fn test_tsrg2_scenario() {
    let mapping = MappingFormat::TsrgV2
        .parse("tsrg2 obf named\na/b/C a/b/D\n\tf g\n\th (I)V i\n")
        .unwrap();
    assert_eq!(mapping.classes().count(), 1);
    let class = mapping.class("a/b/C").unwrap();
    assert_eq!(class.mapping().name("named"), Some("a/b/D"));
    assert_eq!(class.field("f").unwrap().name("named"), Some("g"));
    assert_eq!(class.methods()[0].unmapped_name(), "h");
    assert_eq!(class.methods()[0].name("named"), Some("i"));
}

#[test]
fn test_parse_errors_name_the_line() {
    let err = MappingFormat::Srg.parse("CL: a b\nFD: broken\n").unwrap_err();
    assert_eq!(err.format(), MappingFormat::Srg);
    assert_eq!(err.index(), 1);
    assert_eq!(err.line(), "FD: broken");

    let err = MappingFormat::Proguard.parse("  int orphan -> a\n").unwrap_err();
    assert_eq!(err.kind(), &ParseErrorKind::Indentation);

    let err = MappingFormat::Csrg.parse("a b\na c\n").unwrap_err();
    assert_eq!(
        err.kind(),
        &ParseErrorKind::Mapping(MappingError::DuplicateClass("a".into()))
    );
}

#[test]
fn test_comments_are_ignored() {
    let text = "# generated\nCL: a com/example/World # the world\n\n";
    let mapping = MappingFormat::Srg.parse(text).unwrap();
    assert_eq!(mapping.class("a").unwrap().mapping().mapped_name(), Some("com/example/World"));
}

// =============================================================================
// Generation
// =============================================================================

#[test]
fn test_generated_text_parses_back() {
    for (format, text) in [
        (MappingFormat::Srg, SRG),
        (MappingFormat::Proguard, PROGUARD),
        (MappingFormat::TsrgV2, TSRG2),
    ] {
        let mapping = format.parse(text).unwrap();
        let generated = format.generate(&mapping).unwrap();
        assert_eq!(format.process(&generated).unwrap(), mapping, "{}", format);
    }
}

#[test]
fn test_srg_as_csrg() {
    let mapping = MappingFormat::Srg.parse(SRG).unwrap();
    let generated = MappingFormat::Csrg.generate(&mapping).unwrap();
    assert!(generated.contains(&"a com/example/World".to_string()));
    assert!(generated.contains(&"a a (Lb;)V spawn".to_string()));

    let csrg = MappingFormat::Csrg.process(&generated).unwrap();
    assert_eq!(csrg.class("b").unwrap().methods()[0].mapped_name(), Some("getHealth"));
}

#[test]
fn test_kind_mismatch() {
    let mapping = MappingFormat::Srg.parse(SRG).unwrap();
    assert!(matches!(
        MappingFormat::TinyV2.generate(&mapping),
        Err(GenerateError::WrongKind { .. })
    ));

    let tiny = MappingFormat::TinyV1
        .parse("v1\tofficial\tnamed\nCLASS\ta\tcom/example/World\n")
        .unwrap();
    assert!(matches!(
        MappingFormat::TinyV1.generate(&tiny),
        Err(GenerateError::Unsupported(MappingFormat::TinyV1))
    ));
}

// =============================================================================
// Reverse and swap
// =============================================================================

const CSRG: &str = "a com/example/World
b com/example/Entity
a a entities
a a (Lb;)V spawn
b a ()I getHealth
";

const TSRG1: &str = "net/minecraft/ com/mojang/
a com/example/World
\ta entities
\ta (Lb;)V spawn
b com/example/Entity
\ta ()I getHealth
";

const TINY: &str = "tiny\t2\t0\tofficial\tintermediary\tnamed
c\ta\tnet/minecraft/class_1\tcom/example/World
\tf\tLb;\ta\tfield_1\tentity
\tm\t(Lb;)V\ta\tmethod_1\tspawn
\t\tp\t1\t\t\tentity
c\tb\tnet/minecraft/class_2\tcom/example/Entity
\tm\t()I\ta\tmethod_2\tgetHealth
";

#[test]
fn test_reversed_mappings_generate_and_parse_back() {
    for (format, text) in [
        (MappingFormat::Proguard, PROGUARD),
        (MappingFormat::Srg, SRG),
        (MappingFormat::Csrg, CSRG),
        (MappingFormat::TsrgV1, TSRG1),
    ] {
        let mut mapping = format.parse(text).unwrap();
        mapping.reverse().unwrap();
        let generated = format.generate(&mapping).unwrap();
        assert_eq!(format.process(&generated).unwrap(), mapping, "{}", format);
    }
}

#[test]
fn test_swapped_mappings_generate_and_parse_back() {
    for (format, text, target) in [
        (MappingFormat::TsrgV2, TSRG2, "named"),
        (MappingFormat::TsrgV2, TSRG2, "srg"),
        (MappingFormat::TinyV2, TINY, "named"),
        (MappingFormat::TinyV2, TINY, "intermediary"),
    ] {
        let mut mapping = format.parse(text).unwrap();
        let source = mapping.unmapped_namespace().unwrap().to_string();
        mapping.swap(&source, target).unwrap();
        let generated = format.generate(&mapping).unwrap();
        let parsed = format.process(&generated).unwrap();
        assert_eq!(parsed.unmapped_namespace(), Some(target), "{}", format);
        assert_eq!(parsed, mapping, "{}", format);
    }
}

#[test]
fn test_swapped_tsrg2_writes_new_unmapped_namespace_first() {
    let mut mapping = MappingFormat::TsrgV2
        .parse("tsrg2 obf named\na A\n\tf g\n\th (La;)V i\n")
        .unwrap();
    mapping.swap("obf", "named").unwrap();
    assert_eq!(
        MappingFormat::TsrgV2.generate(&mapping).unwrap(),
        ["tsrg2 named obf", "A a", "\tg f", "\ti (LA;)V h"]
    );

    let tiny = MappingFormat::TinyV2
        .parse("tiny\t2\t0\tofficial\tnamed\nc\ta\tA\n\tm\t(La;)V\th\ti\n")
        .unwrap();
    let mut swapped = tiny.clone();
    swapped.swap("official", "named").unwrap();
    assert_eq!(
        MappingFormat::TinyV2.generate(&swapped).unwrap(),
        ["tiny\t2\t0\tnamed\tofficial", "c\tA\ta", "\tm\t(LA;)V\ti\th"]
    );
}

#[test]
fn test_reverse_twice_is_identity() {
    for (format, text) in [(MappingFormat::Srg, SRG), (MappingFormat::Proguard, PROGUARD)] {
        let original = format.parse(text).unwrap();
        let mut mapping = original.clone();
        mapping.reverse().unwrap();
        assert_ne!(mapping, original);
        assert_eq!(mapping.class("com/example/World").unwrap().mapping().mapped_name(), Some("a"));
        mapping.reverse().unwrap();
        assert_eq!(mapping, original);
    }
}

#[test]
fn test_reversed_descriptors_use_new_unmapped_names() {
    let mut mapping = MappingFormat::Srg.parse(SRG).unwrap();
    mapping.reverse().unwrap();
    let generated = MappingFormat::Srg.generate(&mapping).unwrap();
    assert!(generated.contains(&"MD: com/example/World/spawn (Lcom/example/Entity;)V a/a (Lb;)V".to_string()));
}

#[test]
fn test_swap_back_is_identity() {
    let original = MappingFormat::TsrgV2.parse(TSRG2).unwrap();
    let mut mapping = original.clone();
    mapping.swap("obf", "named").unwrap();
    assert_eq!(mapping.unmapped_namespace(), Some("named"));

    let world = mapping.class("com/example/World").unwrap();
    assert_eq!(world.mapping().name("obf"), Some("a"));
    assert_eq!(world.methods()[0].unmapped_name(), "spawn");

    mapping.swap("named", "obf").unwrap();
    assert_eq!(mapping, original);
}

#[test]
fn test_swap_errors() {
    let mut mapping = MappingFormat::TsrgV2.parse(TSRG2).unwrap();
    assert_eq!(
        mapping.swap("obf", "mojang"),
        Err(MappingError::UnknownNamespace("mojang".into()))
    );
    let mut paired = MappingFormat::Srg.parse(SRG).unwrap();
    assert!(matches!(paired.swap("a", "b"), Err(MappingError::WrongKind { .. })));
    assert!(matches!(mapping.reverse(), Err(MappingError::WrongKind { .. })));
}

// =============================================================================
// Session configuration
// =============================================================================

#[test]
fn test_session_configuration_errors() {
    let options = |format| RemapOptions {
        format: Some(format),
        ..Default::default()
    };

    let err = Session::from_text(TSRG2, options(MappingFormat::TsrgV2)).unwrap_err();
    assert!(matches!(err, jvm_remap::Error::Config(ConfigError::MissingTargetNamespace)));

    let err = Session::from_text(SRG, RemapOptions::default()).unwrap_err();
    assert!(matches!(err, jvm_remap::Error::Config(ConfigError::MissingFormat)));

    let tiny = "v1\tofficial\tnamed\nCLASS\ta\tcom/example/World\n";
    let err = Session::from_text(
        tiny,
        RemapOptions {
            reverse: true,
            target_namespace: Some("named".into()),
            ..options(MappingFormat::TinyV1)
        },
    )
    .unwrap_err();
    assert!(matches!(
        err,
        jvm_remap::Error::Config(ConfigError::NoInverse(MappingFormat::TinyV1))
    ));

    let err = Session::from_text(
        TSRG2,
        RemapOptions {
            target_namespace: Some("mojang".into()),
            ..options(MappingFormat::TsrgV2)
        },
    )
    .unwrap_err();
    assert!(matches!(err, jvm_remap::Error::Config(ConfigError::UnknownNamespace(ns)) if ns == "mojang"));

    let err = Session::from_text(
        SRG,
        RemapOptions {
            swap_to: Some("named".into()),
            ..options(MappingFormat::Srg)
        },
    )
    .unwrap_err();
    assert!(matches!(err, jvm_remap::Error::Config(ConfigError::Conflict(_))));

    let err = Session::from_text("CL: a\n", options(MappingFormat::Srg)).unwrap_err();
    assert!(matches!(err, jvm_remap::Error::Parse(_)));
}

#[test]
fn test_session_applies_swap() {
    let session = Session::from_text(
        TSRG2,
        RemapOptions {
            format: Some(MappingFormat::TsrgV2),
            swap_to: Some("named".into()),
            target_namespace: Some("srg".into()),
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(session.mapping().unmapped_namespace(), Some("named"));

    let hierarchy = jvm_remap::HierarchyGraph::default();
    let remapper = session.remapper(&hierarchy).unwrap();
    assert_eq!(remapper.map_class_name("com/example/World"), "C_1");
    assert_eq!(
        remapper.map_method_name("com/example/World", "spawn", "(Lcom/example/Entity;)V"),
        "m_1"
    );
}
