use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use cat32_canonical::{
    stable_stringify, AccessError, BinaryView, BoxedScalar, ByteBuffer, Canonicalizer,
    ElementKind, KeyedMap, Pattern, Record, Sequence, Timestamp, Token, TokenRegistry,
    UniqueSet, Value,
};
use serde_json::json;

#[test]
fn scalars_use_json_literals() {
    assert_eq!(stable_stringify(&Value::Null), "null");
    assert_eq!(stable_stringify(&Value::Bool(true)), "true");
    assert_eq!(stable_stringify(&Value::from(1)), "1");
    assert_eq!(stable_stringify(&Value::from(-0.0)), "0");
    assert_eq!(stable_stringify(&Value::from(0.5)), "0.5");
    assert_eq!(stable_stringify(&Value::from("hello")), r#""hello""#);
}

#[test]
fn sentinel_scalars_are_json_strings() {
    assert_eq!(stable_stringify(&Value::Undefined), r#""__undefined__""#);
    assert_eq!(
        stable_stringify(&Value::Number(f64::NAN)),
        r#""\u0000cat32:number:NaN\u0000""#
    );
    assert_eq!(
        stable_stringify(&Value::Number(f64::NEG_INFINITY)),
        r#""\u0000cat32:number:-Infinity\u0000""#
    );
    assert_eq!(
        stable_stringify(&Value::BigInt(123)),
        r#""\u0000cat32:bigint:123\u0000""#
    );
}

#[test]
fn sentinel_lookalike_text_is_escaped() {
    assert_eq!(
        stable_stringify(&Value::from("__undefined__")),
        r#""__string__:__undefined__""#
    );
    assert_ne!(
        stable_stringify(&Value::from("__date__:invalid")),
        stable_stringify(&Value::Timestamp(Timestamp::invalid()))
    );
}

#[test]
fn boxed_scalars_unwrap() {
    let boxed_true = Value::Boxed(BoxedScalar::Bool(true));
    assert_eq!(stable_stringify(&boxed_true), "true");
    assert_eq!(stable_stringify(&boxed_true), stable_stringify(&Value::Bool(true)));
    assert_ne!(
        stable_stringify(&boxed_true),
        stable_stringify(&Value::Boxed(BoxedScalar::Bool(false)))
    );
    assert_eq!(
        stable_stringify(&Value::Boxed(BoxedScalar::Number(1.0))),
        stable_stringify(&Value::from(1))
    );
    assert_ne!(
        stable_stringify(&Value::Boxed(BoxedScalar::Number(1.0))),
        stable_stringify(&Value::Boxed(BoxedScalar::Number(2.0)))
    );
    assert_eq!(
        stable_stringify(&Value::Boxed(BoxedScalar::BigInt(7))),
        stable_stringify(&Value::BigInt(7))
    );
}

#[test]
fn records_keep_insertion_order() {
    let record: Record = [("b", Value::from(1)), ("a", Value::from(vec![
        Value::from(1),
        Value::from("x"),
        Value::Null,
    ]))]
    .into_iter()
    .collect();
    assert_eq!(stable_stringify(&record.into()), r#"{"b":1,"a":[1,"x",null]}"#);

    let ab: Record = [("a", 1), ("b", 2)].into_iter().collect();
    let ba: Record = [("b", 2), ("a", 1)].into_iter().collect();
    assert_ne!(stable_stringify(&ab.into()), stable_stringify(&ba.into()));
}

#[test]
fn json_documents_keep_member_order() {
    let value = Value::from(json!({"b": 1, "a": {"nested": 2}}));
    assert_eq!(stable_stringify(&value), r#"{"b":1,"a":{"nested":2}}"#);
}

#[test]
fn holes_render_as_hole_sentinel() {
    let seq = Sequence::with_length(2);
    seq.set(1, 5);
    assert_eq!(
        stable_stringify(&seq.into()),
        r#"["\u0000cat32:hole:__hole__\u0000",5]"#
    );
}

#[test]
fn sets_are_enveloped() {
    let set: UniqueSet = [1, 2, 3].into_iter().collect();
    let seq: Sequence = [1, 2, 3].into_iter().collect();
    assert_eq!(
        stable_stringify(&set.into()),
        r#""\u0000cat32:set:[1,2,3]\u0000""#
    );
    assert_eq!(stable_stringify(&seq.into()), "[1,2,3]");

    let words: UniqueSet = ["a"].into_iter().collect();
    assert_eq!(
        stable_stringify(&words.into()),
        r#""\u0000cat32:set:[\"a\"]\u0000""#
    );
}

#[test]
fn map_members_are_keyed_by_canonical_key() {
    let map = KeyedMap::new();
    map.insert("a", 1);
    map.insert(2, true);
    assert_eq!(
        stable_stringify(&map.into()),
        r#""\u0000cat32:map:{\"\\\"a\\\"\":1,\"2\":true}\u0000""#
    );

    let numeric = KeyedMap::new();
    numeric.insert(1, "v");
    let textual = KeyedMap::new();
    textual.insert("1", "v");
    assert_ne!(
        stable_stringify(&numeric.into()),
        stable_stringify(&textual.into())
    );
}

#[test]
fn maps_never_collide_with_records() {
    let numeric_map: KeyedMap = [(1, "v")].into_iter().collect();
    let numeric_record: Record = [("1", "v")].into_iter().collect();
    assert_ne!(
        stable_stringify(&numeric_map.into()),
        stable_stringify(&numeric_record.into())
    );

    let text_map: KeyedMap = [("a", 1)].into_iter().collect();
    let quoted_record: Record = [("\"a\"", 1)].into_iter().collect();
    assert_ne!(
        stable_stringify(&text_map.into()),
        stable_stringify(&quoted_record.into())
    );

    assert_eq!(
        stable_stringify(&KeyedMap::new().into()),
        r#""\u0000cat32:map:{}\u0000""#
    );
    assert_eq!(stable_stringify(&Record::new().into()), "{}");
}

#[test]
fn map_sentinel_lookalike_text_is_escaped() {
    let map_text = stable_stringify(&KeyedMap::new().into());
    let sentinel_text: String = serde_json::from_str(&map_text).unwrap();

    let as_value = Value::from(sentinel_text.clone());
    assert_ne!(stable_stringify(&as_value), map_text);

    let record: Record = [(sentinel_text, 1)].into_iter().collect();
    assert_eq!(
        stable_stringify(&record.into()),
        r#"{"__string__:\u0000cat32:map:{}\u0000":1}"#
    );
}

#[test]
fn binary_views_render_conventional_string() {
    let local = BinaryView::bytes(vec![1, 2, 3, 4]);
    let shared = BinaryView::typed(
        ByteBuffer::shared(vec![1, 2, 3, 4]),
        ElementKind::Uint8,
        0,
        4,
    )
    .unwrap();
    let expected = serde_json::to_string(&local.conventional_string()).unwrap();
    assert_eq!(expected, r#""1,2,3,4""#);
    assert_eq!(stable_stringify(&local.into()), expected);
    assert_eq!(stable_stringify(&shared.into()), expected);
    assert_eq!(
        stable_stringify(&BinaryView::buffer(ByteBuffer::shared(vec![1, 2, 3, 4])).into()),
        expected
    );
}

#[test]
fn timestamps_embed_iso_text() {
    let valid = Timestamp::parse("2024-01-02T03:04:05Z");
    assert_eq!(
        stable_stringify(&valid.into()),
        r#""__date__:2024-01-02T03:04:05.000Z""#
    );

    let invalid = stable_stringify(&Timestamp::parse("garbage").into());
    assert_eq!(invalid, r#""__date__:invalid""#);
    assert_eq!(stable_stringify(&Timestamp::from_millis(f64::NAN).into()), invalid);
    assert_eq!(stable_stringify(&Timestamp::invalid().into()), invalid);
}

#[test]
fn patterns_embed_source_and_flags() {
    assert_eq!(
        stable_stringify(&Pattern::new("a+", "g").into()),
        r#""\u0000cat32:regexp:[\"a+\",\"g\"]\u0000""#
    );
}

#[test]
fn tokens_use_registry_identifiers() {
    let registry = TokenRegistry::new();
    let canonicalizer = Canonicalizer::with_registry(&registry);
    let first = Token::new("x");
    let second = Token::new("x");

    assert_eq!(
        canonicalizer.canonicalize(&first.clone().into()),
        r#""__symbol__:[\"local\",\"0\",\"x\"]""#
    );
    assert_eq!(
        canonicalizer.canonicalize(&second.into()),
        r#""__symbol__:[\"local\",\"1\",\"x\"]""#
    );
    assert_eq!(
        canonicalizer.canonicalize(&first.into()),
        r#""__symbol__:[\"local\",\"0\",\"x\"]""#
    );
    assert_eq!(
        canonicalizer.canonicalize(&Token::global("app").into()),
        r#""__symbol__:[\"global\",\"app\"]""#
    );
}

#[test]
fn self_reference_renders_circular_sentinel() {
    let record = Record::new();
    record.insert("self", record.clone());
    assert_eq!(
        stable_stringify(&record.into()),
        r#"{"self":"\u0000cat32:circular:object\u0000"}"#
    );
}

#[test]
fn shared_acyclic_nodes_are_not_cycles() {
    let shared: Sequence = [1].into_iter().collect();
    let record = Record::new();
    record.insert("a", shared.clone());
    record.insert("b", shared);
    assert_eq!(stable_stringify(&record.into()), r#"{"a":[1],"b":[1]}"#);
}

#[test]
fn deferred_failures_become_error_sentinels() {
    let record = Record::new();
    record.insert("ok", Value::deferred(|| Ok(Value::from(5))));
    record.insert("err", Value::deferred(|| Err(AccessError::new("boom"))));
    record.insert("panic", Value::deferred(|| panic!("kaboom")));
    assert_eq!(
        stable_stringify(&record.into()),
        r#"{"ok":5,"err":"\u0000cat32:error:boom\u0000","panic":"\u0000cat32:error:kaboom\u0000"}"#
    );
}

#[test]
fn panicking_accessor_is_contained_on_every_run() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let value = Value::deferred(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        panic!("kaboom")
    });
    for _ in 0..2 {
        assert_eq!(
            stable_stringify(&value),
            r#""\u0000cat32:error:kaboom\u0000""#
        );
    }
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}
