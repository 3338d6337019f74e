#![no_main]

use libfuzzer_sys::fuzz_target;
use luahost_core::config::EngineConfig;
use luahost_core::{ErrorReporter, LuaHost, TYPE_KEY, ValueStack};
use luahost_llsd::{Value, ValueType};

fn contains_type_key(value: &Value) -> bool {
    match value {
        Value::Map(map) => map
            .iter()
            .any(|(key, item)| key == TYPE_KEY || contains_type_key(item)),
        Value::Array(array) => array.iter().any(contains_type_key),
        _ => false,
    }
}

// Runs arbitrary script text and decodes whatever it returns under every hint.
fuzz_target!(|data: &[u8]| {
    let Ok(source) = std::str::from_utf8(data) else {
        return;
    };

    let engine = EngineConfig {
        instruction_limit: 200_000,
        memory_limit_bytes: 16 * 1024 * 1024,
        startup_script: None,
    };
    let mut host = LuaHost::new(engine, ErrorReporter::silent());
    if host.start().is_err() {
        return;
    }
    let Some(lua) = host.lua() else {
        return;
    };
    let Ok(func) = lua.load(source).into_function() else {
        return;
    };
    let Ok(results) = host.protected_call(&func, ValueStack::new(), 1) else {
        return;
    };
    let Some(result) = results.peek() else {
        return;
    };

    for hint in ValueType::ALL {
        let decoded = host.codec().decode(result, hint);
        assert!(!contains_type_key(&decoded), "sentinel leaked under {hint}: {decoded:?}");
    }
});
