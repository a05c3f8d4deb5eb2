use std::{
    collections::HashMap,
    env, fs,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
    time::Duration,
};

use directories::BaseDirs;

#[derive(Debug, Clone)]
pub struct Config {
    inner: HashMap<String, String>,
    pub config_path: PathBuf,
}

impl Config {
    pub fn load() -> Self {
        let mut map = default_map();
        let config_path = default_config_path();

        // Read .coderunrc if exists
        if config_path.exists() {
            apply_rc_file(&mut map, &config_path);
        }

        // Overlay environment variables (take precedence)
        for (k, v) in env::vars() {
            if let Some(stripped) = k.strip_prefix("CODERUN_") {
                map.insert(stripped.to_string(), v);
            } else if is_config_key(&k) {
                map.insert(k, v);
            }
        }

        Self {
            inner: map,
            config_path,
        }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        // ENV first
        if let Ok(v) = env::var(key) {
            return Some(v);
        }
        self.inner.get(key).cloned()
    }

    pub fn get_bool(&self, key: &str) -> bool {
        self.get(key)
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    }

    pub fn get_path(&self, key: &str) -> Option<PathBuf> {
        self.get(key).filter(|v| !v.is_empty()).map(PathBuf::from)
    }

    /// Run duration limit; `0` (the default) means unbounded.
    pub fn run_timeout(&self) -> Option<Duration> {
        self.get("RUN_TIMEOUT")
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

fn apply_rc_file(map: &mut HashMap<String, String>, path: &Path) {
    if let Ok(file) = fs::File::open(path) {
        let reader = BufReader::new(file);
        for line in reader.lines().map_while(Result::ok) {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some((k, v)) = line.split_once('=') {
                map.insert(k.trim().to_string(), v.trim().to_string());
            }
        }
    }
}

fn is_config_key(k: &str) -> bool {
    const KEYS: &[&str] = &[
        "INTERPRETER_PATH",
        "STAGING_DIR",
        "SOURCE_EXT",
        "RUN_TIMEOUT",
        "STAGE_ISOLATED",
        "KEEP_STAGED",
    ];

    KEYS.contains(&k)
}

fn default_config_path() -> PathBuf {
    let base = BaseDirs::new()
        .map(|b| b.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("~/.config"));
    base.join("coderun").join(".coderunrc")
}

fn default_map() -> HashMap<String, String> {
    let mut m = HashMap::new();

    // INTERPRETER_PATH has no default; it must come from the rc file,
    // the environment, or the --interpreter flag.
    // STAGING_DIR defaults to empty and is derived from the interpreter's
    // directory at run time (its tmp/ subdirectory).
    m.insert("STAGING_DIR".into(), String::new());
    m.insert("SOURCE_EXT".into(), "src".into());
    m.insert("RUN_TIMEOUT".into(), "0".into());
    m.insert("STAGE_ISOLATED".into(), "false".into());
    m.insert("KEEP_STAGED".into(), "false".into());

    m
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_cover_every_key() {
        let m = default_map();
        assert_eq!(m.get("SOURCE_EXT").map(String::as_str), Some("src"));
        assert_eq!(m.get("RUN_TIMEOUT").map(String::as_str), Some("0"));
        assert_eq!(m.get("STAGE_ISOLATED").map(String::as_str), Some("false"));
        assert_eq!(m.get("KEEP_STAGED").map(String::as_str), Some("false"));
        assert!(!m.contains_key("INTERPRETER_PATH"));
    }

    #[test]
    fn rc_file_overlays_defaults_and_skips_comments() {
        let dir = tempfile::tempdir().unwrap();
        let rc = dir.path().join(".coderunrc");
        let mut f = fs::File::create(&rc).unwrap();
        writeln!(f, "# interpreter under test").unwrap();
        writeln!(f).unwrap();
        writeln!(f, "INTERPRETER_PATH = /opt/lang/interp").unwrap();
        writeln!(f, "SOURCE_EXT=lang").unwrap();
        writeln!(f, "not a key value line").unwrap();
        drop(f);

        let mut map = default_map();
        apply_rc_file(&mut map, &rc);
        assert_eq!(
            map.get("INTERPRETER_PATH").map(String::as_str),
            Some("/opt/lang/interp")
        );
        assert_eq!(map.get("SOURCE_EXT").map(String::as_str), Some("lang"));
        assert_eq!(map.get("RUN_TIMEOUT").map(String::as_str), Some("0"));
    }

    #[test]
    fn run_timeout_zero_means_unbounded() {
        let cfg = Config {
            inner: default_map(),
            config_path: PathBuf::new(),
        };
        assert_eq!(cfg.run_timeout(), None);

        let mut inner = default_map();
        inner.insert("RUN_TIMEOUT".into(), "30".into());
        let cfg = Config {
            inner,
            config_path: PathBuf::new(),
        };
        assert_eq!(cfg.run_timeout(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn empty_staging_dir_is_not_a_path() {
        let cfg = Config {
            inner: default_map(),
            config_path: PathBuf::new(),
        };
        assert_eq!(cfg.get_path("STAGING_DIR"), None);
    }
}
