/// Serializer output and round trips through the tokenizer
use crate::*;
use proptest::prelude::*;

fn registry() -> ComponentRegistry {
    ComponentRegistry::with_builtins()
}

fn roundtrip(source: &str, options: SerializeOptions) -> String {
    let registry = registry();
    serialize(&scan(source, &registry), &registry, options)
}

#[test]
fn test_roundtrip_canonical_markers() {
    let sources = vec![
        "plain text only",
        "Use {TLJ-PLLJ-ABC123} now",
        "{TLJ-PLJDLJ-JD99}",
        "Hi {@NAME}, enjoy [微笑]",
        "{TLJ-PLLJ-A}{TLJ-PLJDLJ-B}[ok]",
    ];

    for source in sources {
        assert_eq!(roundtrip(source, SerializeOptions::default()), source);
    }
}

#[test]
fn test_legacy_format_rendered_canonically() {
    let options = SerializeOptions {
        filter_empty: true,
        restore_mode: false,
    };
    assert_eq!(roundtrip("{TLJ-PLLJ_abc}", options), "{TLJ-PLLJ-abc}");
}

#[test]
fn test_restore_mode_echoes_original() {
    let registry = registry();
    let source = "old {TLJ-PLLJ_abc} and [TLJ-PLLJxyz]";
    let doc = scan_restored(source, &registry);
    let options = SerializeOptions {
        filter_empty: true,
        restore_mode: true,
    };
    assert_eq!(serialize(&doc, &registry, options), source);
}

#[test]
fn test_filter_empty() {
    let registry = registry();
    let doc = Document::from_nodes(vec![
        Node::text("a "),
        Node::Placeholder(PlaceholderNode::new("1", "taobao-coupon", RawValue::Unset)),
        Node::text(" b"),
    ]);

    let filtered = serialize(&doc, &registry, SerializeOptions::default());
    assert_eq!(filtered, "a b");

    let unfiltered = serialize(
        &doc,
        &registry,
        SerializeOptions {
            filter_empty: false,
            restore_mode: false,
        },
    );
    assert_eq!(unfiltered, "a {TLJ-PLLJ-<<NULL>>} b");
}

#[test]
fn test_restored_null_is_kept() {
    let registry = registry();
    let node = PlaceholderNode::new("1", "taobao-coupon", RawValue::Unset)
        .with_original_format("{TLJ-PLLJ_legacy}")
        .restored(true);
    let doc = Document::from_nodes(vec![Node::Placeholder(node)]);

    let options = SerializeOptions {
        filter_empty: true,
        restore_mode: true,
    };
    assert_eq!(serialize(&doc, &registry, options), "{TLJ-PLLJ_legacy}");
}

#[test]
fn test_whitespace_collapsed_and_trimmed() {
    let registry = registry();
    let doc = Document::from_nodes(vec![Node::text("  a \u{a0}\n\t b  ")]);
    assert_eq!(serialize(&doc, &registry, SerializeOptions::default()), "a b");
}

#[test]
fn test_unregistered_type_degrades_to_text() {
    let registry = registry();
    let doc = Document::from_nodes(vec![
        Node::text("a "),
        Node::Placeholder(PlaceholderNode::new("1", "gone", RawValue::Set("v".into()))),
        Node::text(" "),
        Node::Placeholder(PlaceholderNode::new("2", "gone", RawValue::Unset)),
    ]);
    let options = SerializeOptions {
        filter_empty: false,
        restore_mode: false,
    };

    let output = serialize(&doc, &registry, options);
    assert_eq!(output, "a v");

    // Nothing comes back as some other registered type
    let rescanned = scan(&output, &registry);
    assert_eq!(rescanned.placeholder_count(), 0);
    assert_eq!(rescanned.nodes, vec![Node::text("a v")]);
}

#[test]
fn test_unregistered_type_keeps_original_format() {
    let registry = registry();
    let node = PlaceholderNode::new("1", "gone", RawValue::Set("v".into())).with_original_format("<gone v>");
    let doc = Document::from_nodes(vec![Node::Placeholder(node)]);
    assert_eq!(serialize(&doc, &registry, SerializeOptions::default()), "<gone v>");
}

proptest! {
    #[test]
    fn prop_roundtrip_coupons_and_emoji(
        head in "[a-z]{0,6}",
        coupon in "[A-Za-z0-9]{1,12}",
        middle in "[a-z]{0,6}",
        emoji in "[A-Za-z0-9]{1,8}",
        tail in "[a-z]{0,6}",
    ) {
        let source = format!("{}{{TLJ-PLLJ-{}}}{}[{}]{}", head, coupon, middle, emoji, tail);
        let registry = registry();
        let doc = scan(&source, &registry);

        prop_assert_eq!(doc.placeholder_count(), 2);
        prop_assert_eq!(serialize(&doc, &registry, SerializeOptions::default()), source);
    }
}

proptest! {
    #[test]
    fn prop_roundtrip_default_template(payload in "[A-Za-z0-9]{1,16}") {
        let mut registry = registry();
        registry.register(ComponentDefinition::new("vip", "VIP")).unwrap();

        let source = format!("{{VIP{}}}", payload);
        let doc = scan(&source, &registry);

        prop_assert_eq!(doc.placeholder_count(), 1);
        prop_assert_eq!(serialize(&doc, &registry, SerializeOptions::default()), source);
    }
}
