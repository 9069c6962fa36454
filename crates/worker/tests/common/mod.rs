#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;

use parallax_worker::{ConfigError, WorkerConfig};

/// Build a config from `pairs` without touching the process environment.
pub fn config_from(pairs: &[(&str, &str)]) -> Result<WorkerConfig, ConfigError> {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    WorkerConfig::from_lookup(|key| vars.get(key).cloned())
}

/// Stand-in render engine. Renders write a one-line artifact; any source
/// whose name contains `bad` fails.
pub const ENGINE: &str = r#"#!/bin/bash
case "$PARALLAX_MODE" in
  probe) cat > /dev/null; echo "stub-engine 0.1" ;;
  render)
    cat > /dev/null
    case "$PARALLAX_SOURCE" in
      *bad*) echo "cannot decode $PARALLAX_SOURCE" >&2; exit 3 ;;
    esac
    echo "$PARALLAX_SOURCE" > "$PARALLAX_OUTPUT"
    ;;
  *) exit 9 ;;
esac
"#;

/// Engine whose probe always fails.
pub const BROKEN_ENGINE: &str = "#!/bin/bash\ncat > /dev/null\necho 'no GPU found' >&2\nexit 2\n";

pub fn write_script(dir: &Path, body: &str) -> String {
    let path = dir.join("engine.sh");
    std::fs::write(&path, body).expect("write engine script");
    path.to_str().expect("utf-8 path").to_string()
}

pub fn touch(dir: &Path, name: &str) {
    std::fs::write(dir.join(name), b"img").expect("write input file");
}
