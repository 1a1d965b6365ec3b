use std::collections::{HashMap, HashSet};
use std::env;
use std::fs;
use std::io;
use std::path::Path;

pub const DEFAULT_DOTENV_PATH: &str = ".env";

const EXPORT_PREFIX: &str = "export ";

/// Key/value view of the process environment that a `.env` file can be
/// layered onto without touching the real environment.
///
/// Entries are never overwritten: whichever source sets a key first wins, so
/// seeding from the process environment before loading a file gives the real
/// environment precedence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    vars: HashMap<String, String>,
    // Set in the process environment, but the value is not valid unicode.
    non_unicode: HashSet<String>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the current process environment.
    ///
    /// Variables whose value is not valid unicode still count as set, so a
    /// `.env` file cannot replace them, but [`Environment::get`] returns `None`
    /// for them. Names that are not valid unicode are dropped; no `.env` key
    /// can match them.
    pub fn from_process() -> Self {
        let mut env = Self::new();
        for (key, value) in env::vars_os() {
            let Ok(key) = key.into_string() else {
                continue;
            };
            match value.into_string() {
                Ok(value) => {
                    env.vars.insert(key, value);
                }
                Err(_) => {
                    env.non_unicode.insert(key);
                }
            }
        }
        env
    }

    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: vars
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
            non_unicode: HashSet::new(),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_non_unicode(mut self, key: &str) -> Self {
        self.non_unicode.insert(key.to_string());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.vars.contains_key(key) || self.non_unicode.contains(key)
    }

    /// True when `key` is set but its value could not be read as unicode.
    pub fn is_non_unicode(&self, key: &str) -> bool {
        self.non_unicode.contains(key)
    }

    pub fn len(&self) -> usize {
        self.vars.len() + self.non_unicode.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Inserts `value` only when `key` is not already present. Returns whether
    /// the entry was added.
    pub fn set_default(&mut self, key: impl Into<String>, value: impl Into<String>) -> bool {
        let key = key.into();
        if self.contains(&key) {
            return false;
        }
        self.vars.insert(key, value.into());
        true
    }
}

/// Parses one line of a `.env` file into a `(key, value)` pair.
///
/// Returns `None` for blank lines, `#` comments, lines without `=`, and lines
/// whose key is empty.
pub fn parse_line(raw: &str) -> Option<(String, String)> {
    let line = raw.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }

    let (key, value) = line.split_once('=')?;
    let mut key = key.trim();
    let value = value.trim();

    if key
        .get(..EXPORT_PREFIX.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(EXPORT_PREFIX))
    {
        key = key[EXPORT_PREFIX.len()..].trim();
    }
    if key.is_empty() {
        return None;
    }

    Some((key.to_string(), strip_matching_quotes(value).to_string()))
}

fn strip_matching_quotes(value: &str) -> &str {
    let quoted = (value.starts_with('"') && value.ends_with('"'))
        || (value.starts_with('\'') && value.ends_with('\''));
    if !quoted {
        return value;
    }
    // A lone quote character is both the opening and closing quote.
    value.get(1..value.len() - 1).unwrap_or("")
}

/// Reads a `.env` file and merges its entries into `env` without overwriting
/// keys that are already set.
///
/// Returns `Ok(false)` when the file does not exist and `Ok(true)` once it has
/// been read, however many lines were usable. Every other I/O error
/// (including invalid UTF-8) is returned to the caller.
pub fn load_dotenv_from_file(path: impl AsRef<Path>, env: &mut Environment) -> io::Result<bool> {
    let contents = match fs::read_to_string(path.as_ref()) {
        Ok(contents) => contents,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(err) => return Err(err),
    };

    // `\r\n`, bare `\r` and `\n` all end a line; the empty piece between
    // `\r` and `\n` is skipped as a blank line.
    for line in contents.split(['\r', '\n']) {
        if let Some((key, value)) = parse_line(line) {
            env.set_default(key, value);
        }
    }

    Ok(true)
}
