#![no_main]

use libfuzzer_sys::fuzz_target;
use luahost_core::Config;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(config) = Config::from_toml_str(text) {
        // A validated config always yields a usable agent id
        assert!(config.agent.parse_id().is_ok());
        let _ = config.log_config();
    }
});
