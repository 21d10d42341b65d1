use super::*;
use pretty_assertions::assert_eq;

#[test]
fn ids_are_monotonic() {
    let mut builder = Builder::new();
    let a = builder.literal_null(None);
    let b = builder.literal_null(None);
    let c = builder.literal_null(None);
    assert_eq!(a, NodeId::new(0));
    assert_eq!(b, NodeId::new(1));
    assert_eq!(c, NodeId::new(2));
    assert_eq!(builder.node_count(), 3);
}

#[test]
fn literals_carry_type_tags() {
    let mut builder = Builder::new();
    let num = builder.literal_number(3.5, "3.5", None);
    let text = builder.literal_string("s", None);
    let unit = builder.finish(num);
    let number_ty = unit.nodes.get(num).and_then(|node| node.ty.clone());
    let string_ty = unit.nodes.get(text).and_then(|node| node.ty.clone());
    assert_eq!(
        number_ty,
        Some(TypeDesc::primitive(crate::PrimitiveType::Number))
    );
    assert_eq!(
        string_ty,
        Some(TypeDesc::primitive(crate::PrimitiveType::String))
    );
}

#[test]
fn temp_families_count_independently() {
    let mut builder = Builder::new();
    assert_eq!(builder.fresh_destructure(), "_d");
    assert_eq!(builder.fresh_destructure(), "_d2");
    assert_eq!(builder.fresh_nested(), "_nested");
    assert_eq!(builder.fresh_iter(), "_iter");
    assert_eq!(builder.fresh_iter(), "_iter2");
    assert_eq!(builder.fresh_temp(), "_t");
    assert_eq!(builder.fresh_temp(), "_t2");
    assert_eq!(builder.fresh_destructure(), "_d3");
}

#[test]
fn set_type_annotates_existing_node() {
    let mut builder = Builder::new();
    let id = builder.identifier("x", None);
    builder.set_type(id, TypeDesc::Any);
    let unit = builder.finish(id);
    assert_eq!(
        unit.nodes.get(id).and_then(|node| node.ty.clone()),
        Some(TypeDesc::Any)
    );
}

#[test]
fn array_patterns_default_to_one_based_bias() {
    let mut builder = Builder::new();
    let elem = builder.identifier("a", None);
    let pattern = builder.array_pattern(vec![elem], None);
    match builder.kind(pattern) {
        Some(NodeKind::ArrayPattern { index_bias, .. }) => assert_eq!(*index_bias, 1),
        other => panic!("expected ArrayPattern, got {other:?}"),
    }
}
