//! Hook-augmented object tests
//!
//! Magic `__name__` members, member hooks, call hooks and the live count.

use super::CallLog;
use metahooks::{Function, Hook, MetaError, PropertyDescriptor, PropertyKey, Runtime, Store, Value};

// =============================================================================
// Basic store scenario
// =============================================================================

#[test]
fn test_store_scenario_with_missing_property_hook() -> Result<(), MetaError> {
    let runtime = Runtime::new();
    let log = CallLog::new();
    let obj = runtime.create_hooked(Some(Store::from_pairs([("x", 10)])))?;
    obj.set(
        "__noSuchProperty__",
        log.recorder("noSuchProperty", Value::Undefined),
    )?;
    assert_eq!(obj.count(), Some(1));

    assert_eq!(obj.get("x")?, Value::from(10));
    assert!(obj.set("y", 5)?);
    assert_eq!(obj.get("y")?, Value::from(5));
    assert_eq!(obj.count(), Some(2));

    assert!(obj.delete("x")?);
    assert_eq!(obj.count(), Some(1));
    assert!(log.entries().is_empty());

    assert_eq!(obj.get("x")?, Value::Undefined);
    assert_eq!(log.entries(), vec![r#"noSuchProperty("x")"#]);
    Ok(())
}

#[test]
fn test_absent_read_without_hooks_is_undefined() -> Result<(), MetaError> {
    let obj = Runtime::new().create_hooked(None)?;
    assert_eq!(obj.get("x")?, Value::Undefined);
    assert_eq!(obj.count(), Some(0));
    Ok(())
}

// =============================================================================
// Magic member names
// =============================================================================

#[test]
fn test_initial_magic_members_become_hooks() -> Result<(), MetaError> {
    let log = CallLog::new();
    let store = Store::from_pairs([
        ("a", Value::from(1)),
        ("__get__", Value::Function(log.recorder("get", Value::Undefined))),
    ]);
    let obj = Runtime::new().create_hooked(Some(store.clone()))?;

    assert_eq!(obj.count(), Some(1));
    assert_eq!(obj.keys()?, vec![PropertyKey::from("a")]);
    assert!(!store.has_own(&"__get__".into()));

    assert_eq!(obj.get("a")?, Value::from(1));
    assert_eq!(log.entries(), vec![r#"get("a")"#]);
    Ok(())
}

#[test]
fn test_reading_magic_name_returns_hook() -> Result<(), MetaError> {
    let hook = Function::new("get", |_, _| Ok(Value::Undefined));
    let obj = Runtime::new().create_hooked(None)?;
    assert_eq!(obj.get("__get__")?, Value::Undefined);
    assert!(!obj.has("__get__")?);

    obj.set("__get__", hook.clone())?;
    assert_eq!(obj.get("__get__")?, Value::Function(hook));
    assert!(obj.has("__get__")?);
    assert_eq!(obj.count(), Some(0));
    assert!(obj.get_own_property_names()?.is_empty());
    Ok(())
}

#[test]
fn test_magic_assignment_rules() -> Result<(), MetaError> {
    let obj = Runtime::new().create_hooked(None)?;
    let result = obj.set("__set__", 42);
    assert!(matches!(result, Err(MetaError::TypeError { .. })));
    assert!(obj.hooks().is_some_and(|hooks| hooks.is_empty()));

    obj.set("__call__", Function::new("call", |_, _| Ok(Value::Null)))?;
    assert!(obj.is_callable());
    obj.set("__call__", Value::Null)?;
    assert!(!obj.is_callable());

    obj.set("__call__", Function::new("call", |_, _| Ok(Value::Null)))?;
    assert!(obj.delete("__call__")?);
    assert!(!obj.is_callable());
    Ok(())
}

#[test]
fn test_magic_name_defined_by_descriptor() -> Result<(), MetaError> {
    let obj = Runtime::new().create_hooked(None)?;
    let hook = Function::new("call", |_, _| Ok(Value::from("called")));
    obj.define_property("__call__", PropertyDescriptor::value(hook))?;
    assert_eq!(obj.call(&[])?, Value::from("called"));
    assert_eq!(obj.count(), Some(0));
    Ok(())
}

#[test]
fn test_count_member_is_read_only() -> Result<(), MetaError> {
    let obj = Runtime::new().create_hooked(Some(Store::from_pairs([("a", 1), ("b", 2)])))?;
    assert_eq!(obj.get("__count__")?, Value::from(2));
    assert!(obj.has("__count__")?);
    assert!(!obj.set("__count__", 10)?);
    assert!(!obj.delete("__count__")?);
    assert_eq!(obj.get("__count__")?, Value::from(2));
    Ok(())
}

#[test]
fn test_reserved_count_in_initial_store_is_rejected() {
    let store = Store::from_pairs([("__count__", 3)]);
    let result = Runtime::new().create_hooked(Some(store));
    assert!(matches!(result, Err(MetaError::TypeError { .. })));
}

// =============================================================================
// Member hooks
// =============================================================================

#[test]
fn test_member_hooks_observe_before_operation() -> Result<(), MetaError> {
    let log = CallLog::new();
    let obj = Runtime::new().create_hooked(None)?;
    obj.set("__set__", log.recorder("set", Value::Undefined))?;
    obj.set("__delete__", log.recorder("delete", Value::Undefined))?;

    let seen = log.clone();
    let target = obj.clone();
    obj.set(
        "__get__",
        Function::new("get", move |_, args| {
            // The read hook runs before the read: the member is already there
            let name = args.first().cloned().unwrap_or_default();
            let present = match name.as_str() {
                Some(key) => target.has_own(key)?,
                None => false,
            };
            seen.push(format!("get({name:?}) present={present}"));
            Ok(Value::Undefined)
        }),
    )?;

    obj.set("a", 1)?;
    obj.get("a")?;
    obj.delete("a")?;

    assert_eq!(
        log.entries(),
        vec![
            r#"set("a", 1)"#,
            r#"get("a") present=true"#,
            r#"delete("a")"#,
        ]
    );
    Ok(())
}

#[test]
fn test_failing_hook_leaves_store_and_count_untouched() -> Result<(), MetaError> {
    let obj = Runtime::new().create_hooked(Some(Store::from_pairs([("keep", 1)])))?;
    obj.set(
        "__set__",
        Function::new("set", |_, _| Err(MetaError::thrown("read-only view"))),
    )?;

    let result = obj.set("fresh", 1);
    assert!(matches!(result, Err(MetaError::Thrown { .. })));
    assert!(!obj.has_own("fresh")?);
    assert_eq!(obj.count(), Some(1));
    Ok(())
}

#[test]
fn test_overwrite_does_not_change_count() -> Result<(), MetaError> {
    let obj = Runtime::new().create_hooked(Some(Store::from_pairs([("a", 1)])))?;
    obj.set("a", 2)?;
    obj.set("a", 3)?;
    assert_eq!(obj.count(), Some(1));
    // Deleting an absent key succeeds but removes nothing
    assert!(obj.delete("missing")?);
    assert_eq!(obj.count(), Some(1));
    Ok(())
}

#[test]
fn test_direct_hook_reassignment_takes_effect() -> Result<(), MetaError> {
    let log = CallLog::new();
    let obj = Runtime::new().create_hooked(Some(Store::from_pairs([("a", 1)])))?;
    obj.get("a")?;
    obj.set_hook(Hook::MemberRead, Some(log.recorder("first", Value::Undefined)))?;
    obj.get("a")?;
    obj.set_hook(Hook::MemberRead, Some(log.recorder("second", Value::Undefined)))?;
    obj.get("a")?;
    obj.set_hook(Hook::MemberRead, None)?;
    obj.get("a")?;
    assert_eq!(log.entries(), vec![r#"first("a")"#, r#"second("a")"#]);
    Ok(())
}

// =============================================================================
// Call hooks
// =============================================================================

#[test]
fn test_call_and_construct_fall_back_to_each_other() -> Result<(), MetaError> {
    let log = CallLog::new();
    let obj = Runtime::new().create_hooked(None)?;
    assert!(!obj.is_callable());
    assert!(matches!(obj.call(&[]), Err(MetaError::NotCallable { .. })));

    obj.set("__call__", log.recorder("call", Value::from("called")))?;
    assert_eq!(obj.call(&[Value::from(1)])?, Value::from("called"));
    assert_eq!(obj.construct(&[Value::from(2)])?, Value::from("called"));

    obj.set("__construct__", log.recorder("construct", Value::from("built")))?;
    assert_eq!(obj.construct(&[])?, Value::from("built"));
    assert_eq!(obj.call(&[])?, Value::from("called"));

    obj.delete("__call__")?;
    assert_eq!(obj.call(&[])?, Value::from("built"));

    assert_eq!(
        log.entries(),
        vec!["call(1)", "call(2)", "construct()", "call()", "construct()"]
    );
    Ok(())
}

#[test]
fn test_hooked_object_as_callable_value() -> Result<(), MetaError> {
    let runtime = Runtime::new();
    let callee = runtime.create_hooked(None)?;
    callee.set(
        "__call__",
        Function::new("call", |_, args| Ok(Value::from(args.len()))),
    )?;
    let host = runtime.create_hooked(Some(Store::from_pairs([("run", Value::Object(callee))])))?;
    assert_eq!(
        host.invoke("run", &[Value::from(1), Value::from(2)])?,
        Value::from(2)
    );
    Ok(())
}

// =============================================================================
// Hook receivers
// =============================================================================

#[test]
fn test_get_hook_reads_this_without_reentering() -> Result<(), MetaError> {
    let log = CallLog::new();
    let seen = log.clone();
    let obj = Runtime::new().create_hooked(Some(Store::from_pairs([("x", 10), ("label", 1)])))?;
    obj.set_hook(
        Hook::MemberRead,
        Some(Function::new("get", move |this, args| {
            let label = match this.as_object() {
                Some(target) => target.get("label")?,
                None => Value::Undefined,
            };
            seen.push(format!("{:?} label={:?}", args.first(), label.as_number()));
            Ok(Value::Undefined)
        })),
    )?;

    assert_eq!(obj.get("x")?, Value::from(10));
    // One entry per outer read; the read of `label` inside the hook is not hooked
    assert_eq!(log.entries().len(), 1);
    assert!(log.entries().iter().all(|entry| entry.ends_with("label=Some(1.0)")));
    Ok(())
}

#[test]
fn test_missing_property_hook_reads_this() -> Result<(), MetaError> {
    let obj = Runtime::new().create_hooked(Some(Store::from_pairs([("fallback", 7)])))?;
    let log = CallLog::new();
    let seen = log.clone();
    obj.set_hook(
        Hook::MissingProperty,
        Some(Function::new("noSuchProperty", move |this, _| {
            let fallback = match this.as_object() {
                Some(target) => target.get("fallback")?,
                None => Value::Undefined,
            };
            seen.push(format!("{:?}", fallback.as_number()));
            Ok(Value::Undefined)
        })),
    )?;

    assert_eq!(obj.get("absent")?, Value::Undefined);
    assert_eq!(log.entries(), vec!["Some(7.0)".to_string()]);
    Ok(())
}

#[test]
fn test_hook_cannot_write_through_this() -> Result<(), MetaError> {
    let obj = Runtime::new().create_hooked(Some(Store::from_pairs([("x", 1)])))?;
    let log = CallLog::new();
    let seen = log.clone();
    obj.set_hook(
        Hook::MemberWrite,
        Some(Function::new("set", move |this, _| {
            if let Some(target) = this.as_object() {
                seen.push(format!("sneak={}", target.set("sneak", 1)?));
            }
            Ok(Value::Undefined)
        })),
    )?;

    assert!(obj.set("y", 2)?);
    assert_eq!(log.entries(), vec!["sneak=false".to_string()]);
    assert!(!obj.has_own("sneak")?);
    assert_eq!(obj.count(), Some(2));
    assert_eq!(obj.get_own_property_names()?.len(), 2);
    Ok(())
}

#[test]
fn test_attribute_only_define_keeps_hook() -> Result<(), MetaError> {
    let obj = Runtime::new().create_hooked(None)?;
    obj.set_hook(Hook::MemberRead, Some(Function::new("get", |_, _| Ok(Value::Undefined))))?;

    assert!(obj.define_property("__get__", PropertyDescriptor::default().enumerable(false))?);
    assert!(obj.has("__get__")?);
    assert!(obj.hooks().is_some_and(|table| table.contains(Hook::MemberRead)));

    // A descriptor with a value still replaces or clears the hook
    assert!(obj.define_property("__get__", PropertyDescriptor::value(Value::Null))?);
    assert!(!obj.has("__get__")?);
    Ok(())
}

// =============================================================================
// Extension limits
// =============================================================================

#[test]
fn test_non_extensible_store_rejects_new_members() -> Result<(), MetaError> {
    let store = Store::from_pairs([("x", 1)]);
    store.prevent_extensions();
    assert!(!store.is_extensible());
    let obj = Runtime::new().create_hooked(Some(store))?;

    assert!(!obj.set("y", 2)?);
    assert!(!obj.define_property("z", PropertyDescriptor::value(3))?);
    assert!(!obj.has_own("y")?);
    assert_eq!(obj.count(), Some(1));

    // Existing members stay writable and deletable
    assert!(obj.set("x", 5)?);
    assert_eq!(obj.get("x")?, Value::from(5));
    assert!(obj.delete("x")?);
    assert_eq!(obj.count(), Some(0));
    Ok(())
}

// =============================================================================
// Full walkthrough
// =============================================================================

#[test]
fn test_magic_hook_walkthrough() -> Result<(), MetaError> {
    let log = CallLog::new();
    let bar = Function::new("bar", |this, _| match this.as_object() {
        Some(obj) => obj.get("x"),
        None => Ok(Value::Undefined),
    });
    let store = Store::from_pairs([
        ("__get__", Value::Function(log.recorder("get", Value::Undefined))),
        (
            "__noSuchProperty__",
            Value::Function(log.recorder("noSuchProperty", Value::Undefined)),
        ),
        (
            "__noSuchMethod__",
            Value::Function(log.recorder("noSuchMethod", Value::Undefined)),
        ),
        ("__set__", Value::Function(log.recorder("set", Value::Undefined))),
        ("__delete__", Value::Function(log.recorder("delete", Value::Undefined))),
        ("x", Value::from(10)),
        ("bar", Value::Function(bar)),
    ]);
    let foo = Runtime::new().create_hooked(Some(store))?;

    assert_eq!(foo.get("x")?, Value::from(10));
    assert_eq!(foo.invoke("bar", &[])?, Value::from(10));
    foo.set("y", 20)?;
    assert_eq!(foo.get("__count__")?, Value::from(3));
    foo.delete("x")?;
    assert_eq!(foo.count(), Some(2));
    // With a missing-method hook every miss reads as the activator
    assert!(foo.get("z")?.as_activator().is_some());
    foo.invoke("nonExisting", &[Value::from(1), Value::from(2), Value::from(3)])?;
    let result = foo.invoke("y", &[Value::from(4)]);
    assert!(matches!(result, Err(MetaError::NotCallable { .. })));

    assert_eq!(
        log.entries(),
        vec![
            r#"get("x")"#,
            r#"get("bar")"#,
            r#"get("x")"#,
            r#"set("y", 20)"#,
            r#"delete("x")"#,
            r#"get("z")"#,
            r#"noSuchProperty("z")"#,
            r#"get("nonExisting")"#,
            r#"noSuchProperty("nonExisting")"#,
            r#"noSuchMethod("nonExisting", [1, 2, 3])"#,
            r#"get("y")"#,
        ]
    );
    Ok(())
}
