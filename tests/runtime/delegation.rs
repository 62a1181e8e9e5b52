//! Delegation chain (mixin) tests

use super::{CallLog, recording_runtime};
use metahooks::{Function, MetaError, PropertyKey, Runtime, Store, TrapSet, Value, VirtualObject};

/// A method that logs `label@<receiver name>`
fn method(log: &CallLog, label: &str) -> Value {
    let log = log.clone();
    let tag = label.to_string();
    Value::Function(Function::new(label, move |this, _| {
        let receiver = match this.as_object() {
            Some(obj) => obj.get("name")?,
            None => Value::Undefined,
        };
        log.push(format!("{}@{}", tag, receiver.as_str().unwrap_or("?")));
        Ok(Value::Undefined)
    }))
}

fn module(runtime: &Runtime, members: Vec<(&str, Value)>) -> Result<VirtualObject, MetaError> {
    runtime.create_mixable(Some(Store::from_pairs(members)))
}

// =============================================================================
// Resolution order
// =============================================================================

#[test]
fn test_newest_delegate_wins() -> Result<(), MetaError> {
    let runtime = Runtime::new();
    let m1 = module(&runtime, vec![("shared", Value::from(1)), ("only1", Value::from(1))])?;
    let m2 = module(&runtime, vec![("only2", Value::from(2))])?;
    let m3 = module(&runtime, vec![("shared", Value::from(3))])?;
    let host = runtime.create_mixable(None)?;
    for m in [&m1, &m2, &m3] {
        runtime.mix(m, &host)?;
    }

    assert_eq!(host.get("shared")?, Value::from(3));
    assert_eq!(host.get("only1")?, Value::from(1));
    assert_eq!(host.get("only2")?, Value::from(2));
    assert_eq!(host.chain().map(|chain| chain.len()), Some(3));
    Ok(())
}

#[test]
fn test_own_then_chain_then_ancestors() -> Result<(), MetaError> {
    let runtime = Runtime::new();
    let proto = Store::from_pairs([("a", "proto"), ("b", "proto"), ("c", "proto")]);
    let store = Store::with_prototype(Some(proto));
    store.set(&"a".into(), Value::from("own"), &Value::Undefined)?;
    let host = runtime.create_mixable(Some(store))?;
    let delegate = module(&runtime, vec![("a", Value::from("chain")), ("b", Value::from("chain"))])?;
    runtime.mix(&delegate, &host)?;

    assert_eq!(host.get("a")?, Value::from("own"));
    assert_eq!(host.get("b")?, Value::from("chain"));
    assert_eq!(host.get("c")?, Value::from("proto"));
    Ok(())
}

#[test]
fn test_deleting_own_shadow_reexposes_delegate() -> Result<(), MetaError> {
    let runtime = Runtime::new();
    let host = runtime.create_mixable(Some(Store::from_pairs([("x", "own")])))?;
    let first = module(&runtime, vec![("x", Value::from("first"))])?;
    let second = module(&runtime, vec![("x", Value::from("second"))])?;
    runtime.mix(&first, &host)?;
    runtime.mix(&second, &host)?;

    assert_eq!(host.get("x")?, Value::from("own"));
    host.delete("x")?;
    assert_eq!(host.get("x")?, Value::from("second"));
    second.delete("x")?;
    assert_eq!(host.get("x")?, Value::from("first"));
    assert_eq!(host.chain().map(|chain| chain.len()), Some(2));
    Ok(())
}

#[test]
fn test_delegated_members_are_present() -> Result<(), MetaError> {
    let runtime = Runtime::new();
    let host = runtime.create_mixable(None)?;
    runtime.mix(&module(&runtime, vec![("lent", Value::from(1))])?, &host)?;
    assert!(host.has("lent")?);
    assert!(!host.has_own("lent")?);
    // Delegated members stay out of the host's own enumeration
    assert!(host.enumerate()?.is_empty());
    Ok(())
}

#[test]
fn test_shared_delegate_mutation_visible_to_all_hosts() -> Result<(), MetaError> {
    let runtime = Runtime::new();
    let shared = module(&runtime, vec![("v", Value::from(1))])?;
    let left = runtime.create_mixable(None)?;
    let right = runtime.create_mixable(None)?;
    runtime.mix(&shared, &left)?;
    runtime.mix(&shared, &right)?;

    shared.set("v", 2)?;
    assert_eq!(left.get("v")?, Value::from(2));
    assert_eq!(right.get("v")?, Value::from(2));
    Ok(())
}

// =============================================================================
// Mixin walkthrough
// =============================================================================

#[test]
fn test_mixin_walkthrough() -> Result<(), MetaError> {
    let (mut runtime, console) = recording_runtime();
    let log = CallLog::new();

    let m = module(
        &runtime,
        vec![("foo", method(&log, "m.foo")), ("baz", method(&log, "m.baz"))],
    )?;
    let o = runtime.mix(&m, &module(&runtime, vec![("name", Value::from("o"))])?)?;

    o.invoke("foo", &[])?;
    assert!(o.get("foo")?.strict_equals(&m.get("foo")?));

    let m2 = module(
        &runtime,
        vec![
            ("name", Value::from("m2")),
            ("foo", method(&log, "m2.foo")),
            ("bar", method(&log, "m2.bar")),
        ],
    )?;
    runtime.mix(&m2, &o)?;
    o.invoke("foo", &[])?;
    o.invoke("bar", &[])?;
    o.invoke("baz", &[])?;

    let m3 = module(&runtime, vec![("test", method(&log, "m3.test"))])?;
    let m2 = runtime.mix(&m3, &m2)?;
    o.invoke("test", &[])?;
    m2.invoke("test", &[])?;
    assert!(o.has("test")?);

    m2.delete("foo")?;
    o.invoke("foo", &[])?;

    let m4 = runtime.create(
        Some(Store::from_pairs([("foo", method(&log, "m4.foo"))])),
        TrapSet::new(),
    )?;
    runtime.set_traits_mode(false);
    runtime.mix(&m4, &o)?;
    o.invoke("foo", &[])?;

    assert_eq!(
        log.entries(),
        vec![
            "m.foo@o", "m2.foo@o", "m2.bar@o", "m.baz@o", "m3.test@o", "m3.test@m2", "m.foo@o",
            "m4.foo@o",
        ]
    );
    // "name" and "foo" of m2 both already resolved on o
    assert_eq!(
        console.entries(),
        vec![
            r#"Warn: Warning: "name" is already in the object."#,
            r#"Warn: Warning: "foo" is already in the object."#,
        ]
    );
    Ok(())
}

// =============================================================================
// Traits mode
// =============================================================================

#[test]
fn test_traits_warnings_match_conflicts() -> Result<(), MetaError> {
    let (runtime, console) = recording_runtime();
    let proto = Store::from_pairs([("inherited", 0)]);
    let store = Store::with_prototype(Some(proto));
    store.set(&"own".into(), Value::from(0), &Value::Undefined)?;
    let host = runtime.create_mixable(Some(store))?;
    runtime.mix(&module(&runtime, vec![("lent", Value::from(0))])?, &host)?;

    let incoming = module(
        &runtime,
        vec![
            ("own", Value::from(1)),
            ("inherited", Value::from(1)),
            ("lent", Value::from(1)),
            ("fresh", Value::from(1)),
        ],
    )?;
    let conflicts = metahooks::delegation::conflicts(&incoming, &host)?;
    assert_eq!(
        conflicts,
        vec![
            PropertyKey::from("own"),
            PropertyKey::from("inherited"),
            PropertyKey::from("lent"),
        ]
    );

    runtime.mix(&incoming, &host)?;
    assert_eq!(console.entries().len(), 3);
    assert!(console.entries().iter().all(|entry| entry.starts_with("Warn: ")));
    assert_eq!(host.get("fresh")?, Value::from(1));
    Ok(())
}

#[test]
fn test_traits_mode_disabled_is_silent() -> Result<(), MetaError> {
    let (mut runtime, console) = recording_runtime();
    runtime.set_traits_mode(false);
    assert!(!runtime.traits_mode());
    let host = runtime.create_mixable(Some(Store::from_pairs([("x", 0)])))?;
    runtime.mix(&module(&runtime, vec![("x", Value::from(1))])?, &host)?;
    assert!(console.entries().is_empty());
    Ok(())
}

#[test]
fn test_non_enumerable_module_members_do_not_warn() -> Result<(), MetaError> {
    let (runtime, console) = recording_runtime();
    let host = runtime.create_mixable(Some(Store::from_pairs([("x", 0)])))?;
    let hidden = Store::new();
    hidden.define(&"x".into(), metahooks::PropertyDescriptor::value(1));
    runtime.mix(&runtime.create_mixable(Some(hidden))?, &host)?;
    assert!(console.entries().is_empty());
    Ok(())
}

// =============================================================================
// Rejected mixes
// =============================================================================

#[test]
fn test_mix_into_object_without_chain() -> Result<(), MetaError> {
    let runtime = Runtime::new();
    let plain = runtime.create(None, TrapSet::new())?;
    let m = module(&runtime, vec![])?;
    assert!(matches!(runtime.mix(&m, &plain), Err(MetaError::TypeError { .. })));
    Ok(())
}

#[test]
fn test_cyclic_mix_rejected() -> Result<(), MetaError> {
    let runtime = Runtime::new();
    let a = runtime.create_mixable(None)?;
    let b = runtime.create_mixable(None)?;
    let c = runtime.create_mixable(None)?;
    assert!(runtime.mix(&a, &a).is_err());
    runtime.mix(&a, &b)?;
    runtime.mix(&b, &c)?;
    // c -> b -> a already; a -> c would loop
    assert!(matches!(runtime.mix(&c, &a), Err(MetaError::TypeError { .. })));
    assert_eq!(a.chain().map(|chain| chain.len()), Some(0));
    Ok(())
}

#[test]
fn test_mix_returns_host() -> Result<(), MetaError> {
    let runtime = Runtime::new();
    let host = runtime.create_mixable(None)?;
    let returned = runtime.mix(&module(&runtime, vec![])?, &host)?;
    assert!(returned.ptr_eq(&host));
    Ok(())
}
