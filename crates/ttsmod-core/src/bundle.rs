//! Recover the entry point of a luabundle-concatenated script.
use crate::error::{Error, Result};

const BUNDLE_MARKER: &str = "-- Bundled by luabundle";
const ROOT_REGISTER: &str = "__bundle_register(\"__root\"";
const BLOCK_END: &str = "end)";

/// Return the body of the `__root` module of a bundled script, or the text
/// unchanged when it was never bundled.
pub fn unbundle(text: &str) -> Result<String> {
    if !text.contains(BUNDLE_MARKER) {
        return Ok(text.to_string());
    }
    let mut lines = text.lines();
    if !lines.any(|l| l.trim_start().starts_with(ROOT_REGISTER)) {
        return Err(Error::Bundle("no __root module registered".into()));
    }
    let mut body = Vec::new();
    for line in lines {
        if line.trim() == BLOCK_END {
            return Ok(body.join("\n").trim().to_string());
        }
        body.push(line.trim());
    }
    Err(Error::Bundle("__root module is never closed".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const BUNDLED: &str = r#"-- Bundled by luabundle {"version":"1.6.0"}
local __bundle_require, __bundle_loaded, __bundle_register, __bundle_modules = (function(superRequire)
	local modules = {}
	return require, loaded, register, modules
end)(nil)
__bundle_register("__root", function(require, _LOADED, __bundle_register, __bundle_modules)
require("core/AgendaDeck")
end)
__bundle_register("core/AgendaDeck", function(require, _LOADED, __bundle_register, __bundle_modules)
MIN_VALUE = -99
end)
return __bundle_require("__root")"#;

    #[test]
    fn finds_root_module() {
        assert_eq!(unbundle(BUNDLED).unwrap(), r#"require("core/AgendaDeck")"#);
    }

    #[test]
    fn indented_bundle() {
        let indented: String = BUNDLED.lines().map(|l| format!("  {}\n", l)).collect();
        assert_eq!(unbundle(&indented).unwrap(), r#"require("core/AgendaDeck")"#);
    }

    #[test]
    fn marker_without_root_fails() {
        let text = "-- Bundled by luabundle {}\n__bundle_register(\"core/X\", function()\nMIN = 1\n";
        assert!(matches!(unbundle(text), Err(Error::Bundle(_))));
    }

    #[test]
    fn plain_script_passes_through() {
        let text = "\n  MIN_VALUE = -99\n  MAX_VALUE = 999\n";
        assert_eq!(unbundle(text).unwrap(), text);
    }
}
