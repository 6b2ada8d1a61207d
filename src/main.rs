//! `relink` command-line front end.
//!
//! Loads the project config, builds the rule table for the requested
//! environment, and either resolves specifiers, scans source files, or
//! prints the active rules.

use std::path::PathBuf;

use relink::{
    build_rules, find_config, load_config, scan, AliasEngine, AliasRule, Config, DiskLookup,
    Environment, RelinkError, Resolution, ResolveRequest, StaticAliasPolicy, CONFIG_FILE,
};

struct CliArgs {
    scan: bool,
    show_all: bool,
    list: bool,
    from: Option<String>,
    config: Option<String>,
    env: Option<String>,
    root: Option<String>,
    args: Vec<String>,
}

fn parse_args(args: &[String]) -> Result<CliArgs, String> {
    let mut scan = false;
    let mut show_all = false;
    let mut list = false;
    let mut from: Option<String> = None;
    let mut config: Option<String> = None;
    let mut env: Option<String> = None;
    let mut root: Option<String> = None;
    let mut rest = Vec::new();
    let mut i = 0;

    while i < args.len() {
        match args[i].as_str() {
            "--scan" => scan = true,
            "--all" => show_all = true,
            "--list" => list = true,
            "--from" => {
                i += 1;
                if i >= args.len() {
                    return Err("--from requires a path argument".to_string());
                }
                from = Some(args[i].clone());
            }
            "--config" => {
                i += 1;
                if i >= args.len() {
                    return Err("--config requires a path argument".to_string());
                }
                config = Some(args[i].clone());
            }
            "--env" => {
                i += 1;
                if i >= args.len() {
                    return Err("--env requires a tag argument".to_string());
                }
                env = Some(args[i].clone());
            }
            "--root" => {
                i += 1;
                if i >= args.len() {
                    return Err("--root requires a path argument".to_string());
                }
                root = Some(args[i].clone());
            }
            arg if arg.starts_with('-') => {
                return Err(format!("unknown option: {arg}"));
            }
            _ => rest.push(args[i].clone()),
        }
        i += 1;
    }

    if scan && from.is_some() {
        return Err("--scan and --from are mutually exclusive".to_string());
    }

    if show_all && !scan {
        return Err("--all requires --scan".to_string());
    }

    if list && scan {
        return Err("--list and --scan are mutually exclusive".to_string());
    }

    if list && from.is_some() {
        return Err("--list and --from are mutually exclusive".to_string());
    }

    if list && !rest.is_empty() {
        return Err("--list takes no arguments".to_string());
    }

    Ok(CliArgs {
        scan,
        show_all,
        list,
        from,
        config,
        env,
        root,
        args: rest,
    })
}

fn main() {
    env_logger::init();

    let raw: Vec<String> = std::env::args().skip(1).collect();

    if raw.is_empty() || raw[0] == "-h" || raw[0] == "--help" {
        print_help();
        std::process::exit(0);
    }

    let args = match parse_args(&raw) {
        Ok(a) => a,
        Err(msg) => {
            eprintln!("relink: {msg}");
            std::process::exit(1);
        }
    };

    if !args.list && args.args.is_empty() {
        let noun = if args.scan { "files" } else { "specifiers" };
        eprintln!("relink: no {noun} specified");
        std::process::exit(1);
    }

    if let Err(e) = run(&args) {
        eprintln!("relink: {e}");
        std::process::exit(1);
    }
}

fn run(args: &CliArgs) -> Result<(), RelinkError> {
    let config = load(args)?;
    let env = environment(args);
    let root = args
        .root
        .as_ref()
        .map_or_else(|| config.dir.clone(), PathBuf::from);

    let rules = build_rules(&config.aliases, &env, config.static_aliases)?;
    let engine = AliasEngine::new(root, rules, config.dedupe.clone());

    if args.list {
        print_rules(&engine, &env, config.static_aliases);
        return Ok(());
    }

    if args.scan {
        scan::run(&args.args, &engine, &DiskLookup, args.show_all);
        return Ok(());
    }

    let importer = args.from.as_ref().map(PathBuf::from);
    for specifier in &args.args {
        let request = ResolveRequest {
            specifier,
            importer: importer.as_deref(),
        };
        match engine.resolve(request, &DiskLookup) {
            Resolution::Rewritten(path) => println!("{specifier} -> {}", path.display()),
            Resolution::Resolved(id) => println!("{specifier} -> {id}"),
            Resolution::Unresolved => println!("{specifier} -> (default resolution)"),
        }
    }

    Ok(())
}

/// Load the config named by `--config`, or search upward from the current
/// directory.
fn load(args: &CliArgs) -> Result<Config, RelinkError> {
    let path = match &args.config {
        Some(explicit) => PathBuf::from(explicit),
        None => {
            let cwd = std::env::current_dir().map_err(|e| RelinkError::Io {
                path: ".".to_string(),
                source: e,
            })?;
            find_config(&cwd).ok_or_else(|| RelinkError::ConfigNotFound {
                file: CONFIG_FILE,
                start: cwd.display().to_string(),
            })?
        }
    };
    load_config(&path)
}

/// `--env` wins over `NODE_ENV`; an unset environment is development.
fn environment(args: &CliArgs) -> Environment {
    let tag = args
        .env
        .clone()
        .or_else(|| std::env::var("NODE_ENV").ok())
        .unwrap_or_default();
    Environment::from_tag(&tag)
}

fn print_rules(engine: &AliasEngine, env: &Environment, policy: StaticAliasPolicy) {
    println!("environment: {}", env.tag());
    println!("root: {}", engine.root().display());
    println!("static aliases: {}", policy.config_value());
    println!();

    if engine.rules().is_empty() {
        println!("rules: (none active)");
    } else {
        println!("rules:");
        for rule in engine.rules() {
            match rule {
                AliasRule::Static(rule) => {
                    println!("  {}  static -> {}", rule.pattern.source(), rule.replacement);
                }
                AliasRule::Contextual(rule) => {
                    println!(
                        "  {}  contextual (folder: {})",
                        rule.pattern.source(),
                        rule.folder_name
                    );
                    println!("    app side    -> {}", rule.local_path);
                    println!("    linked side -> {}", rule.external_path);
                }
            }
        }
    }

    if !engine.dedupe().is_empty() {
        println!();
        println!("dedupe: {}", engine.dedupe().join(", "));
    }
}

fn print_help() {
    eprintln!("relink - contextual import-alias resolver for linked local packages");
    eprintln!("Usage: relink [options] <specifier> [specifier2 ...]");
    eprintln!("       relink --scan [options] <file> [file2 ...]");
    eprintln!("       relink --list");
    eprintln!();
    eprintln!("Resolves import specifiers through the project's alias rules, picking");
    eprintln!("the linked-package or application mapping based on the importing file.");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --from PATH      Importer path to resolve against");
    eprintln!("  --scan           Scan source files and classify every import");
    eprintln!("  --all            With --scan, also list relative and external imports");
    eprintln!("  --list           Show the active rule table and exit");
    eprintln!("  --config PATH    Config file (default: search for {CONFIG_FILE} upward)");
    eprintln!("  --env TAG        Environment tag (default: $NODE_ENV, then development)");
    eprintln!("  --root PATH      Resolution root (default: config file directory)");
    eprintln!("  -h, --help       Show help");
}
