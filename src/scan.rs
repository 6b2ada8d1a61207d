use std::fmt;
use std::fs;
use std::path::Path;

use tree_sitter::{Language, Node, Parser};

use crate::alias::ImporterSide;
use crate::error::RelinkError;
use crate::lookup::ModuleLookup;
use crate::resolver::{AliasEngine, Resolution, ResolveRequest};

enum SourceKind {
    Ts,
    Tsx,
    Vue,
}

fn source_kind(ext: &str) -> Result<SourceKind, RelinkError> {
    match ext {
        "ts" | "mts" | "js" | "mjs" | "cjs" => Ok(SourceKind::Ts),
        "tsx" | "jsx" => Ok(SourceKind::Tsx),
        "vue" => Ok(SourceKind::Vue),
        _ => Err(RelinkError::UnsupportedExtension(ext.to_string())),
    }
}

/// One import that matched an alias rule.
#[derive(Debug)]
pub struct AliasedImport {
    pub specifier: String,
    /// Source form of the pattern that matched.
    pub pattern: String,
    /// Importer classification, absent for static rules.
    pub side: Option<ImporterSide>,
    /// Resolved target, `None` when the candidate was not found.
    pub target: Option<String>,
}

#[derive(Debug)]
pub struct ExternalImport {
    pub specifier: String,
    pub deduped: bool,
}

/// Every import of one file, classified against the rule table.
#[derive(Debug)]
pub struct ScanReport {
    pub display_path: String,
    pub total: usize,
    pub aliased: Vec<AliasedImport>,
    pub relative: Vec<String>,
    pub external: Vec<ExternalImport>,
    /// Include relative and external sections in the output.
    pub show_all: bool,
}

impl ScanReport {
    pub fn has_unresolved(&self) -> bool {
        self.aliased.iter().any(|import| import.target.is_none())
    }
}

impl fmt::Display for ScanReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{}  ({} imports: {} aliased, {} relative, {} external)",
            self.display_path,
            self.total,
            self.aliased.len(),
            self.relative.len(),
            self.external.len()
        )?;

        if !self.aliased.is_empty() {
            writeln!(f)?;
            writeln!(f, "aliased:")?;
            for import in &self.aliased {
                writeln!(f, "  {}", import.specifier)?;
                let target = import.target.as_deref().unwrap_or("unresolved");
                match import.side {
                    Some(side) => {
                        writeln!(f, "    {}  {} -> {}", import.pattern, side.label(), target)?;
                    }
                    None => writeln!(f, "    {} -> {}", import.pattern, target)?,
                }
            }
        }

        if self.show_all {
            if !self.relative.is_empty() {
                writeln!(f)?;
                writeln!(f, "relative: {}", self.relative.join(", "))?;
            }
            if !self.external.is_empty() {
                if self.relative.is_empty() {
                    writeln!(f)?;
                }
                let names: Vec<String> = self
                    .external
                    .iter()
                    .map(|import| {
                        if import.deduped {
                            format!("{} (dedupe)", import.specifier)
                        } else {
                            import.specifier.clone()
                        }
                    })
                    .collect();
                writeln!(f, "external: {}", names.join(", "))?;
            }
        }

        Ok(())
    }
}

/// Extract every import of a source file and run each through the engine.
///
/// The file itself is the importer, so the report shows exactly what the
/// rule table would do for it.
pub fn scan_file(
    path: &Path,
    engine: &AliasEngine,
    lookup: &dyn ModuleLookup,
) -> Result<ScanReport, RelinkError> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    let kind = source_kind(ext)?;

    let content = fs::read_to_string(path).map_err(|e| RelinkError::Io {
        path: path.display().to_string(),
        source: e,
    })?;

    let specifiers = match kind {
        SourceKind::Ts => parse_specifiers(&content, false)?,
        SourceKind::Tsx => parse_specifiers(&content, true)?,
        SourceKind::Vue => {
            let mut merged = Vec::new();
            for (tsx, block) in vue_script_blocks(&content) {
                for spec in parse_specifiers(block, tsx)? {
                    push_unique(&mut merged, &spec);
                }
            }
            merged
        }
    };

    let importer = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    let mut report = ScanReport {
        display_path: path.display().to_string(),
        total: specifiers.len(),
        aliased: Vec::new(),
        relative: Vec::new(),
        external: Vec::new(),
        show_all: false,
    };

    for specifier in specifiers {
        let request = ResolveRequest {
            specifier: &specifier,
            importer: Some(&importer),
        };
        if let Some(rule) = engine.find_rule(&specifier) {
            let pattern = rule.pattern().source().to_string();
            let side = engine.side_for(request);
            let target = match engine.resolve(request, lookup) {
                Resolution::Rewritten(path) => Some(path.display().to_string()),
                Resolution::Resolved(id) => Some(id.to_string()),
                Resolution::Unresolved => None,
            };
            report.aliased.push(AliasedImport {
                specifier,
                pattern,
                side,
                target,
            });
        } else if specifier.starts_with('.') {
            report.relative.push(specifier);
        } else {
            let deduped = engine.is_deduped(&specifier);
            report.external.push(ExternalImport { specifier, deduped });
        }
    }

    Ok(report)
}

/// Scan each file and print a report, separated like a diff stack. A file
/// that fails to read or parse is reported and skipped.
pub fn run(paths: &[String], engine: &AliasEngine, lookup: &dyn ModuleLookup, show_all: bool) {
    let multi = paths.len() > 1;
    for (i, path_str) in paths.iter().enumerate() {
        if i > 0 && multi {
            println!("\n---\n");
        }
        match scan_file(Path::new(path_str), engine, lookup) {
            Ok(mut report) => {
                report.show_all = show_all;
                print!("{report}");
            }
            Err(e) => eprintln!("relink: {e}"),
        }
    }
}

fn parse_specifiers(source: &str, tsx: bool) -> Result<Vec<String>, RelinkError> {
    let language: Language = if tsx {
        tree_sitter_typescript::LANGUAGE_TSX.into()
    } else {
        tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()
    };

    let mut parser = Parser::new();
    parser
        .set_language(&language)
        .map_err(|e| RelinkError::ParseFailed(e.to_string()))?;
    let tree = parser
        .parse(source, None)
        .ok_or_else(|| RelinkError::ParseFailed("parser produced no tree".to_string()))?;

    let mut specifiers = Vec::new();
    collect_specifiers(tree.root_node(), source.as_bytes(), &mut specifiers);
    Ok(specifiers)
}

/// Walk the whole tree collecting import, re-export, and dynamic `import()`
/// sources in document order, deduplicated.
fn collect_specifiers(node: Node, src: &[u8], out: &mut Vec<String>) {
    match node.kind() {
        "import_statement" | "export_statement" => {
            if let Some(source) = node.child_by_field_name("source") {
                push_unique(out, trim_quotes(txt(source, src)));
            }
        }
        "call_expression" => {
            if let Some(spec) = dynamic_import_source(node, src) {
                push_unique(out, spec);
            }
        }
        _ => {}
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_specifiers(child, src, out);
    }
}

/// Source of a `import("...")` call, if this call expression is one.
fn dynamic_import_source<'a>(node: Node, src: &'a [u8]) -> Option<&'a str> {
    let callee = node.child_by_field_name("function")?;
    if callee.kind() != "import" {
        return None;
    }
    let args = node.child_by_field_name("arguments")?;
    let mut cursor = args.walk();
    let first = args.children(&mut cursor).find(|c| c.kind() == "string")?;
    Some(trim_quotes(txt(first, src)))
}

/// Slice the `<script>` blocks out of a Vue single-file component.
///
/// Returns each block's content with a flag for whether it needs the TSX
/// grammar (`lang="tsx"` or `lang="jsx"`). Blocks with no content, such as
/// `<script src="...">`, are skipped.
fn vue_script_blocks(content: &str) -> Vec<(bool, &str)> {
    let mut blocks = Vec::new();
    let mut rest = content;

    while let Some(start) = rest.find("<script") {
        let after_tag = &rest[start + "<script".len()..];
        if !after_tag.starts_with(|c: char| c.is_whitespace() || c == '>') {
            rest = after_tag;
            continue;
        }
        let Some(attrs_end) = after_tag.find('>') else {
            break;
        };
        let attrs = &after_tag[..attrs_end];
        let body = &after_tag[attrs_end + 1..];
        let Some(close) = body.find("</script") else {
            break;
        };
        let block = &body[..close];
        if !block.trim().is_empty() {
            let tsx = attrs.contains("tsx") || attrs.contains("jsx");
            blocks.push((tsx, block));
        }
        rest = &body[close..];
    }

    blocks
}

fn txt<'a>(node: Node, src: &'a [u8]) -> &'a str {
    node.utf8_text(src).unwrap_or("")
}

fn trim_quotes(s: &str) -> &str {
    s.trim_matches(|c: char| c == '\'' || c == '"' || c == '`')
}

fn push_unique(list: &mut Vec<String>, spec: &str) {
    if !spec.is_empty() && !list.iter().any(|s| s == spec) {
        list.push(spec.to_string());
    }
}
