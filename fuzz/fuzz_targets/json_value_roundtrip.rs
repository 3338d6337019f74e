#![no_main]

use libfuzzer_sys::fuzz_target;
use luahost_core::config::EngineConfig;
use luahost_core::{ErrorReporter, LuaHost, TYPE_KEY};
use luahost_llsd::Value;

fn contains_type_key(value: &Value) -> bool {
    match value {
        Value::Map(map) => map
            .iter()
            .any(|(key, item)| key == TYPE_KEY || contains_type_key(item)),
        Value::Array(array) => array.iter().any(contains_type_key),
        _ => false,
    }
}

// Any JSON document without the reserved key survives encode + hinted decode.
fuzz_target!(|data: &[u8]| {
    let Ok(json) = serde_json::from_slice::<serde_json::Value>(data) else {
        return;
    };
    let value = Value::from_json(&json);
    if contains_type_key(&value) {
        return;
    }

    let mut host = LuaHost::new(EngineConfig::default(), ErrorReporter::silent());
    if host.start().is_err() {
        return;
    }
    let Some(lua) = host.lua() else {
        return;
    };
    let Ok(encoded) = host.codec().encode(lua, &value) else {
        return;
    };
    assert_eq!(host.codec().decode(&encoded, value.value_type()), value);
});
