//! Rendering of step scripts into shell invocations

use std::collections::BTreeMap;
use std::fmt::Write;

/// Search path used when the caller does not provide one
pub const DEFAULT_PATH: &str = "/usr/local/sbin:/usr/local/bin:/usr/sbin:/usr/bin:/sbin:/bin";

/// Working directory for steps without an override
pub const DEFAULT_WORKDIR: &str = "/home/build";

/// Render `fragment` as a `/bin/sh -c` invocation.
///
/// Variables are exported in the map's order, which is by name. Values are
/// quoted verbatim. Callers are responsible for ensuring they contain no
/// single quotes.
pub fn build_eval_run_command(
    environment: &BTreeMap<String, String>,
    debug: bool,
    sys_path: &str,
    workdir: &str,
    fragment: &str,
) -> Vec<String> {
    let mut script = String::new();

    let trace = if debug { 'x' } else { ' ' };
    let _ = writeln!(script, "set -e{}", trace);
    let _ = writeln!(script, "export PATH='{}'", sys_path);
    for (key, value) in environment {
        let _ = writeln!(script, "export {}='{}'", key, value);
    }
    let _ = writeln!(script, "[ -d '{0}' ] || mkdir -p '{0}'", workdir);
    let _ = writeln!(script, "cd '{}'", workdir);
    let _ = writeln!(script, "{}", fragment);
    script.push_str("exit 0");

    vec!["/bin/sh".to_string(), "-c".to_string(), script]
}
