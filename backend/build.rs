use std::io::Result;
use std::path::{Path, PathBuf};

// Generates `$OUT_DIR/route_modules.rs`: one `mod` per file in `src/routes/`
// plus the `ROUTE_MODULES` table that `routes::registered_modules` returns.
// Skipped: `mod.rs`, names starting with `_`, and names that are not identifiers.
fn main() -> Result<()> {
    let manifest_dir = env_path("CARGO_MANIFEST_DIR")?;
    let routes_dir = manifest_dir.join("src").join("routes");
    println!("cargo:rerun-if-changed={}", routes_dir.display());

    let modules = route_modules(&routes_dir)?;
    let out_file = env_path("OUT_DIR")?.join("route_modules.rs");
    std::fs::write(out_file, render(&modules))
}

fn env_path(name: &str) -> Result<PathBuf> {
    std::env::var(name)
        .map(PathBuf::from)
        .map_err(std::io::Error::other)
}

fn route_modules(routes_dir: &Path) -> Result<Vec<(String, PathBuf)>> {
    let mut modules = Vec::new();
    for entry in std::fs::read_dir(routes_dir)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("rs") {
            continue;
        }
        let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        if name == "mod" || name.starts_with('_') {
            continue;
        }
        if !is_identifier(name) {
            println!(
                "cargo:warning=skipping route module {}: not a valid module name",
                path.display()
            );
            continue;
        }
        modules.push((name.to_string(), path.clone()));
    }
    modules.sort();
    Ok(modules)
}

const KEYWORDS: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "crate", "dyn", "else", "enum",
    "extern", "false", "fn", "for", "gen", "if", "impl", "in", "let", "loop", "match", "mod",
    "move", "mut", "pub", "ref", "return", "self", "static", "struct", "super", "trait", "true",
    "type", "unsafe", "use", "where", "while",
];

fn is_identifier(name: &str) -> bool {
    if KEYWORDS.contains(&name) {
        return false;
    }
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn render(modules: &[(String, PathBuf)]) -> String {
    let mut out = String::from("// @generated by build.rs\n\n");
    for (name, path) in modules {
        out.push_str(&format!("#[path = {:?}]\nmod {name};\n", path.display().to_string()));
    }
    out.push_str("\n/// Route modules found in `src/routes/` at build time, sorted by name.\n");
    out.push_str("static ROUTE_MODULES: &[RouteModule] = &[\n");
    for (name, _) in modules {
        out.push_str(&format!(
            "    RouteModule {{ name: {name:?}, router: {name}::router }},\n"
        ));
    }
    out.push_str("];\n");
    out
}
