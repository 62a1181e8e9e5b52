#![no_main]

use libfuzzer_sys::fuzz_target;
use metahooks::{Function, PropertyDescriptor, Runtime, Store, Value};

const NAMES: [&str; 8] = ["a", "b", "c", "0", "1", "__get__", "__set__", "__count__"];

fuzz_target!(|data: &[u8]| {
    // Keep sequences short
    if data.len() > 4_096 {
        return;
    }

    let runtime = Runtime::new();
    let Ok(obj) = runtime.create_hooked(Some(Store::from_pairs([("a", 0)]))) else {
        return;
    };
    let Ok(module) = runtime.create_mixable(Some(Store::from_pairs([("b", 1)]))) else {
        return;
    };

    for pair in data.chunks(2) {
        let op = pair[0] % 6;
        let key = NAMES[usize::from(pair.get(1).copied().unwrap_or(0)) % NAMES.len()];
        // Errors from rejected operations are expected
        let _ = match op {
            0 => obj.set(key, i32::from(pair[0])).map(|_| ()),
            1 => obj.delete(key).map(|_| ()),
            2 => obj
                .define_property(key, PropertyDescriptor::value(1).configurable(pair[0] & 1 == 0))
                .map(|_| ()),
            3 => obj.get(key).map(|_| ()),
            4 => obj
                .set(key, Function::new("hook", |_, _| Ok(Value::Undefined)))
                .map(|_| ()),
            _ => runtime.mix(&module, &obj).map(|_| ()),
        };

        if let Ok(own) = obj.get_own_property_names() {
            assert_eq!(obj.count(), Some(own.len()));
        }
    }
});
