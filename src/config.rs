use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::alias::AliasDecl;
use crate::env::StaticAliasPolicy;
use crate::error::RelinkError;

/// File name searched for when no explicit config path is given.
pub const CONFIG_FILE: &str = "relink.config.json";

/// Parsed project configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory the config file lives in. Relative alias paths resolve
    /// against this unless the caller overrides the root.
    pub dir: PathBuf,
    pub aliases: Vec<AliasDecl>,
    pub dedupe: Vec<String>,
    pub static_aliases: StaticAliasPolicy,
}

/// Walk up directories from `start` looking for the config file.
pub fn find_config(start: &Path) -> Option<PathBuf> {
    let mut dir = if start.is_dir() {
        start.to_path_buf()
    } else {
        start.parent()?.to_path_buf()
    };

    loop {
        let candidate = dir.join(CONFIG_FILE);
        if candidate.is_file() {
            return Some(candidate);
        }
        if !dir.pop() {
            return None;
        }
    }
}

/// Load and parse a config file.
///
/// Comments are allowed in the file; structural problems are not. A config
/// that names an unknown policy or gives a field the wrong type fails
/// loudly here instead of resolving imports somewhere unintended later.
pub fn load_config(path: &Path) -> Result<Config, RelinkError> {
    let shown = path.display().to_string();
    let content = fs::read_to_string(path).map_err(|source| RelinkError::Io {
        path: shown.clone(),
        source,
    })?;

    let stripped = strip_jsonc_comments(&content);
    let value: Value = serde_json::from_str(&stripped)
        .map_err(|e| parse_error(&shown, e.to_string()))?;
    let root = value
        .as_object()
        .ok_or_else(|| parse_error(&shown, "top level must be an object".to_string()))?;

    let dir = path
        .parent()
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf);

    let mut config = Config {
        dir,
        aliases: Vec::new(),
        dedupe: Vec::new(),
        static_aliases: StaticAliasPolicy::default(),
    };

    for (key, entry) in root {
        match key.as_str() {
            "aliases" => {
                let items = entry
                    .as_array()
                    .ok_or_else(|| parse_error(&shown, "`aliases` must be an array".to_string()))?;
                for (index, item) in items.iter().enumerate() {
                    config.aliases.push(parse_alias(item, index, &shown)?);
                }
            }
            "dedupe" => {
                let items = entry
                    .as_array()
                    .ok_or_else(|| parse_error(&shown, "`dedupe` must be an array".to_string()))?;
                for item in items {
                    let name = item.as_str().ok_or_else(|| {
                        parse_error(&shown, "`dedupe` entries must be strings".to_string())
                    })?;
                    config.dedupe.push(name.to_string());
                }
            }
            "staticAliases" => {
                let tag = entry.as_str().ok_or_else(|| {
                    parse_error(&shown, "`staticAliases` must be a string".to_string())
                })?;
                config.static_aliases = StaticAliasPolicy::from_config_value(tag).ok_or_else(|| {
                    parse_error(
                        &shown,
                        format!("unknown `staticAliases` value `{tag}`; use `always` or `follow-environment`"),
                    )
                })?;
            }
            other => log::warn!("{shown}: ignoring unknown key `{other}`"),
        }
    }

    Ok(config)
}

fn parse_alias(entry: &Value, index: usize, shown: &str) -> Result<AliasDecl, RelinkError> {
    let obj = entry
        .as_object()
        .ok_or_else(|| parse_error(shown, format!("aliases[{index}] must be an object")))?;

    let mut decl = AliasDecl::default();
    let mut has_replacement = false;

    for (key, value) in obj {
        match key.as_str() {
            "find" => decl.find = Some(string_field(value, index, key, shown)?),
            "findRegex" => decl.find_regex = Some(string_field(value, index, key, shown)?),
            "replacement" => {
                decl.replacement = string_field(value, index, key, shown)?;
                has_replacement = true;
            }
            "folderName" => decl.folder_name = Some(string_field(value, index, key, shown)?),
            "localPath" => decl.local_path = Some(string_field(value, index, key, shown)?),
            "externalPath" => decl.external_path = Some(string_field(value, index, key, shown)?),
            "inProduction" => {
                decl.in_production = value.as_bool().ok_or_else(|| {
                    parse_error(shown, format!("aliases[{index}]: `inProduction` must be a boolean"))
                })?;
            }
            other => log::warn!("{shown}: aliases[{index}]: ignoring unknown key `{other}`"),
        }
    }

    if !has_replacement {
        return Err(parse_error(
            shown,
            format!("aliases[{index}] is missing `replacement`"),
        ));
    }

    Ok(decl)
}

fn string_field(value: &Value, index: usize, key: &str, shown: &str) -> Result<String, RelinkError> {
    value.as_str().map(String::from).ok_or_else(|| {
        parse_error(shown, format!("aliases[{index}]: `{key}` must be a string"))
    })
}

fn parse_error(shown: &str, message: String) -> RelinkError {
    RelinkError::ConfigParse {
        path: shown.to_string(),
        message,
    }
}

/// Strip `//` line and `/* */` block comments while copying string
/// literals verbatim, escapes included.
fn strip_jsonc_comments(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' => {
                out.push('"');
                let mut escaped = false;
                for c in chars.by_ref() {
                    out.push(c);
                    if escaped {
                        escaped = false;
                    } else if c == '\\' {
                        escaped = true;
                    } else if c == '"' {
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'/') => {
                chars.next();
                for c in chars.by_ref() {
                    if c == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for c in chars.by_ref() {
                    if prev == '*' && c == '/' {
                        break;
                    }
                    prev = c;
                }
            }
            _ => out.push(ch),
        }
    }

    out
}
