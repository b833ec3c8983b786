/// Tokenizer behavior over the built-in and custom component types
use crate::*;

fn registry() -> ComponentRegistry {
    ComponentRegistry::with_builtins()
}

fn placeholders(doc: &Document) -> Vec<&PlaceholderNode> {
    doc.placeholders().collect()
}

#[test]
fn test_plain_text_is_single_run() {
    let doc = scan("just some text", &registry());
    assert_eq!(doc.nodes, vec![Node::text("just some text")]);
}

#[test]
fn test_empty_input() {
    let doc = scan("", &registry());
    assert!(doc.nodes.is_empty());
}

#[test]
fn test_coupon_between_text() {
    let doc = scan("Use {TLJ-PLLJ-ABC123} now", &registry());
    assert_eq!(doc.nodes.len(), 3);
    assert_eq!(doc.nodes[0], Node::text("Use "));
    assert_eq!(doc.nodes[2], Node::text(" now"));

    let node = doc.nodes[1].as_placeholder().unwrap();
    assert_eq!(node.component_type, "taobao-coupon");
    assert_eq!(node.raw_value, RawValue::Set("ABC123".into()));
    assert_eq!(node.original_format.as_deref(), Some("{TLJ-PLLJ-ABC123}"));
    assert!(!node.is_restored);
}

#[test]
fn test_adjacent_markers_of_different_types() {
    let mut registry = registry();
    registry
        .register(ComponentDefinition::new("jdlj", "JDLJ-PLLJ").with_template("{${prefix}-${value}}"))
        .unwrap();

    let doc = scan("{TLJ-PLLJ-A}{JDLJ-PLLJ-B}", &registry);
    let nodes = placeholders(&doc);
    assert_eq!(doc.nodes.len(), 2);
    assert_eq!(nodes[0].component_type, "taobao-coupon");
    assert_eq!(nodes[0].raw_value, RawValue::Set("A".into()));
    assert_eq!(nodes[1].component_type, "jdlj");
    assert_eq!(nodes[1].raw_value, RawValue::Set("B".into()));
}

#[test]
fn test_same_start_prefers_registration_order() {
    let doc = scan("[TLJ-PLLJ-x]", &registry());
    let nodes = placeholders(&doc);
    assert_eq!(nodes.len(), 1);
    assert_eq!(nodes[0].component_type, "taobao-coupon");
    assert_eq!(nodes[0].raw_value, RawValue::Set("x".into()));
}

#[test]
fn test_legacy_formats_recognized() {
    for (source, payload) in [
        ("[TLJ-PLLJ-a1]", "a1"),
        ("[TLJ-PLLJb2]", "b2"),
        ("{TLJ-PLLJ_c3}", "c3"),
    ] {
        let doc = scan(source, &registry());
        let nodes = placeholders(&doc);
        assert_eq!(nodes.len(), 1, "no match in {}", source);
        assert_eq!(nodes[0].component_type, "taobao-coupon");
        assert_eq!(nodes[0].raw_value, RawValue::Set(payload.into()));
    }
}

#[test]
fn test_null_sentinel_stays_literal() {
    let doc = scan("a {TLJ-PLLJ-<<NULL>>} b", &registry());
    assert_eq!(doc.placeholder_count(), 0);
    assert_eq!(doc.display_text(), "a {TLJ-PLLJ-<<NULL>>} b");
}

#[test]
fn test_unterminated_marker_is_text() {
    let doc = scan("code {TLJ-PLLJ-abc", &registry());
    assert_eq!(doc.nodes, vec![Node::text("code {TLJ-PLLJ-abc")]);
}

#[test]
fn test_unknown_prefix_is_text() {
    let doc = scan("x {FOO-123} y", &registry());
    assert_eq!(doc.placeholder_count(), 0);
}

#[test]
fn test_empty_emoji_brackets_not_matched() {
    let doc = scan("[] and [ ]", &registry());
    assert_eq!(doc.placeholder_count(), 0);
}

#[test]
fn test_nickname_without_payload() {
    let doc = scan("Hi {@NAME}!", &registry());
    let nodes = placeholders(&doc);
    assert_eq!(nodes.len(), 1);
    assert_eq!(nodes[0].component_type, "nickname");
    assert_eq!(nodes[0].raw_value, RawValue::Set("@NAME".into()));
}

#[test]
fn test_emoji_with_non_ascii_payload() {
    let doc = scan("好的[微笑]", &registry());
    let nodes = placeholders(&doc);
    assert_eq!(nodes.len(), 1);
    assert_eq!(nodes[0].component_type, "emoji");
    assert_eq!(nodes[0].raw_value, RawValue::Set("微笑".into()));
    assert_eq!(doc.len(), 3);
}

#[test]
fn test_restored_scan_marks_nodes() {
    let doc = scan_restored("{TLJ-PLLJ_old}", &registry());
    let node = doc.placeholders().next().unwrap();
    assert!(node.is_restored);
    assert_eq!(node.display_text, "{TLJ-PLLJ_old}");
}

#[test]
fn test_snapshot_unaffected_by_later_registration() {
    let mut registry = registry();
    let tokenizer = Tokenizer::new(&registry);

    registry
        .register(ComponentDefinition::new("vip", "VIP").with_template("{${prefix}-${value}}"))
        .unwrap();

    let mut ids = IDGenerator::from_seed("t");
    assert_eq!(tokenizer.scan("{VIP-1}", &mut ids).placeholder_count(), 0);
    assert_eq!(Tokenizer::new(&registry).scan("{VIP-1}", &mut ids).placeholder_count(), 1);
}

#[test]
fn test_ids_are_unique_within_scan() {
    let doc = scan("[a][b][c]{@NAME}", &registry());
    let mut ids: Vec<&str> = doc.placeholders().map(|p| p.id.as_str()).collect();
    assert_eq!(ids.len(), 4);
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 4);
}

#[test]
fn test_custom_matcher_positional_group() {
    let mut registry = ComponentRegistry::new();
    registry
        .register(ComponentDefinition::new("ticket", "T").with_matcher(r"<<T:(\d+)>>"))
        .unwrap();

    let doc = scan("see <<T:42>>", &registry);
    let nodes = placeholders(&doc);
    assert_eq!(nodes.len(), 1);
    assert_eq!(nodes[0].raw_value, RawValue::Set("42".into()));
}
