use postcard::{from_bytes, to_allocvec};
use radmath_core::{
    CompiledScript, Engine, MathData, MathLoopData, Node,
    node::UnaryNode,
    scope::memory::{ArrayField, MemoryScope},
};

#[test]
fn test_postcard() {
    let engine = Engine::default();
    let script = engine
        .compile("SNR = DBZ - 5; if (DBZ > 20 && VEL != missing) then FLAG = 1 else FLAG = 0")
        .unwrap();

    // Whole script
    let bytes = to_allocvec(&script).unwrap();
    let decoded: CompiledScript = from_bytes(&bytes).unwrap();
    assert_eq!(decoded, script);
    println!("✓ Script round-trip");

    // Single tree keeps number labels
    let node = engine.compile_expression("max(DBZ, 1e3)").unwrap();
    let bytes = to_allocvec(&node).unwrap();
    let decoded: Node = from_bytes(&bytes).unwrap();
    assert_eq!(decoded.to_string(), "max(DBZ, 1e3)");
    println!("✓ Node round-trip");
}

#[test]
fn test_decoded_script_runs() {
    let script = Engine::default().compile("B = A * 2").unwrap();
    let decoded: CompiledScript = from_bytes(&to_allocvec(&script).unwrap()).unwrap();

    let mut scope = MemoryScope::new();
    scope.add_field(ArrayField::new("A", vec![1.0, -9999.0])).unwrap();
    assert!(decoded.run(&mut scope).is_success());
    assert_eq!(scope.data("B").and_then(|b| b.get_val(0)), Some(2.0));
    assert_eq!(scope.array("B").unwrap().to_options(), vec![Some(2.0), None]);
}

#[test]
fn test_decoding_checks_builtin_arguments() {
    // Node::Unary, User("x"), no arguments.
    let user_call = Node::Unary(UnaryNode::user("x", vec![]));
    let bytes = to_allocvec(&user_call).unwrap();
    assert_eq!(bytes, vec![1, 1, 1, b'x', 0]);
    assert_eq!(from_bytes::<Node>(&bytes).unwrap(), user_call);

    // Node::Unary, Builtin(Abs), no arguments: `abs()` must not decode.
    assert!(from_bytes::<Node>(&[1, 0, 0, 0]).is_err());

    // Well-formed calls still decode and evaluate.
    let node = Engine::default().compile_expression("abs(A)").unwrap();
    let decoded: Node = from_bytes(&to_allocvec(&node).unwrap()).unwrap();
    let mut scope = MemoryScope::new();
    scope.add_field(ArrayField::new("A", vec![-2.0])).unwrap();
    assert_eq!(decoded.value_at(&scope, 0), Ok(Some(2.0)));
}
