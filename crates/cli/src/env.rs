//! `.env` loading for local Windows runs.
//!
//! Elsewhere credentials must already be in the environment.

/// Parse `KEY=value` lines. Blank lines and `#` comments are skipped and
/// surrounding quotes are stripped from values.
#[cfg_attr(not(windows), allow(dead_code))]
pub fn parse_dotenv(contents: &str) -> Vec<(String, String)> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let line = line.strip_prefix("export ").unwrap_or(line);
            let (key, value) = line.split_once('=')?;
            let key = key.trim();
            if key.is_empty() {
                return None;
            }
            let value = value.trim().trim_matches('"').trim_matches('\'');
            Some((key.to_string(), value.to_string()))
        })
        .collect()
}

/// Load `.env` from the executable's directory. Variables already set win.
///
/// Must run before any other thread starts.
#[cfg(windows)]
pub fn load_dotenv() {
    let Some(path) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(".env")))
    else {
        return;
    };
    let Ok(contents) = std::fs::read_to_string(&path) else {
        return;
    };

    for (key, value) in parse_dotenv(&contents) {
        if std::env::var_os(&key).is_none() {
            // SAFETY: called from `main` before the async runtime or any
            // other thread exists.
            unsafe { std::env::set_var(&key, value) };
        }
    }
}
