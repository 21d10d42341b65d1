use super::*;
use crate::Builder;
use pretty_assertions::assert_eq;

#[test]
fn node_id_displays_stable_string() {
    assert_eq!(NodeId::new(0).to_string(), "node_0");
    assert_eq!(NodeId::new(42).to_string(), "node_42");
}

#[test]
fn invalid_id_is_not_valid() {
    assert!(!NodeId::INVALID.is_valid());
    assert!(!NodeId::default().is_valid());
    assert!(NodeId::new(0).is_valid());
}

#[test]
fn children_skip_invalid_refs() {
    let kind = NodeKind::If {
        test: NodeId::new(1),
        consequent: NodeId::new(2),
        alternate: NodeId::INVALID,
    };
    assert_eq!(kind.children(), vec![NodeId::new(1), NodeId::new(2)]);
}

#[test]
fn children_include_computed_member_keys() {
    let kind = NodeKind::Member {
        object: NodeId::new(0),
        property: MemberProp::Computed(NodeId::new(3)),
    };
    assert_eq!(kind.children(), vec![NodeId::new(0), NodeId::new(3)]);

    let named = NodeKind::Member {
        object: NodeId::new(0),
        property: MemberProp::Named("x".to_string()),
    };
    assert_eq!(named.children(), vec![NodeId::new(0)]);
}

#[test]
fn literal_type_tags_are_concrete() {
    assert_eq!(
        LitValue::Number {
            value: 1.0,
            raw: "1".to_string()
        }
        .type_tag(),
        PrimitiveType::Number
    );
    assert_eq!(LitValue::Null.type_tag(), PrimitiveType::Null);
    assert_eq!(LitValue::Undefined.type_tag(), PrimitiveType::Undefined);
    assert!(LitValue::Null.is_nil());
    assert!(LitValue::Undefined.is_nil());
}

#[test]
fn pattern_kinds_are_flagged() {
    assert!(NodeKind::ArrayPattern {
        elements: vec![NodeId::new(0)],
        index_bias: 1,
    }
    .is_pattern());
    assert!(!NodeKind::Identifier {
        name: "x".to_string()
    }
    .is_pattern());
}

#[test]
fn node_map_lookup_is_total() {
    let mut builder = Builder::new();
    let lit = builder.literal_bool(true, None);
    let unit = builder.finish(lit);

    assert!(unit.nodes.get(lit).is_some());
    assert!(unit.nodes.get(NodeId::INVALID).is_none());
    assert!(unit.nodes.get(NodeId::new(999)).is_none());
}

#[test]
fn unit_serializes_as_flat_id_map() {
    let mut builder = Builder::new();
    let one = builder.literal_number(1.0, "1", None);
    let two = builder.literal_number(2.0, "2", None);
    let sum = builder.binary(BinOp::Add, one, two, None);
    let unit = builder.finish(sum);

    let json = serde_json::to_value(&unit).unwrap_or_default();
    assert_eq!(json["rootId"], "node_2");
    assert_eq!(json["nodes"]["node_2"]["kind"], "BinaryOp");
    assert_eq!(json["nodes"]["node_2"]["left"], "node_0");
    assert_eq!(json["nodes"]["node_0"]["value"]["type"], "number");
}

#[test]
fn unit_round_trips_through_json() {
    let mut builder = Builder::new();
    let name = builder.identifier("x", Some(Loc::new(1, 5)));
    let init = builder.literal_string("hi", None);
    let binder = builder.var_decl(DeclKind::Const, name, init, None);
    let root = builder.program(vec![binder], None);
    let unit = builder.finish(root);

    let json = serde_json::to_string(&unit).unwrap_or_default();
    let back: CompilationUnit = match serde_json::from_str(&json) {
        Ok(unit) => unit,
        Err(err) => panic!("deserialization failed: {err}"),
    };
    assert_eq!(back, unit);
}
