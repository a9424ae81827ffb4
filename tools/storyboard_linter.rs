/// Storyboard Linter — parses storyboard assets and reports authoring problems.
///
/// Usage: storyboard_linter <asset_or_dir> [--config <parser.ron>] [--summary]
///
/// Every `.txt` file is one asset, named after its file stem. Besides the
/// parser's own warnings, every `data:` target must name a storyboard in
/// the linted set.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::process;

use storyboard_script::core::parser::{ParseWarning, ParserConfig, StoryboardParser};
use storyboard_script::schema::panel::PanelInfo;
use storyboard_script::schema::storyboard::{StoryboardData, StoryboardUri};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        println!("Usage: storyboard_linter <asset_or_dir> [--config <parser.ron>] [--summary]");
        process::exit(0);
    }

    let asset_root = Path::new(&args[1]);
    let mut config = ParserConfig::default();
    let mut show_summary = false;

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--config" if i + 1 < args.len() => {
                i += 1;
                config = match ParserConfig::load_from_ron(Path::new(&args[i])) {
                    Ok(config) => config,
                    Err(e) => {
                        eprintln!("ERROR: Failed to load parser config: {}", e);
                        process::exit(1);
                    }
                };
            }
            "--summary" => show_summary = true,
            other => {
                eprintln!("Unknown argument: {}", other);
                process::exit(1);
            }
        }
        i += 1;
    }

    let mut files = Vec::new();
    if asset_root.is_file() {
        files.push(asset_root.to_path_buf());
    } else if asset_root.is_dir() {
        collect_assets(asset_root, &mut files);
        files.sort();
    } else {
        eprintln!("ERROR: Path '{}' does not exist", asset_root.display());
        process::exit(1);
    }

    let parser = StoryboardParser::builder().config(config).build();
    let mut assets: BTreeMap<String, BTreeMap<String, StoryboardData>> = BTreeMap::new();
    let mut warnings: Vec<ParseWarning> = Vec::new();
    let mut errors: Vec<String> = Vec::new();

    for path in &files {
        let asset_name = match path.file_stem() {
            Some(stem) => stem.to_string_lossy().to_string(),
            None => continue,
        };
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                errors.push(format!("Failed to read {}: {}", path.display(), e));
                continue;
            }
        };
        let report = parser.parse_report(&asset_name, &text);
        println!(
            "  Loaded: {} ({} storyboards)",
            path.display(),
            report.storyboards.len()
        );
        warnings.extend(report.warnings);
        assets.insert(asset_name, report.storyboards.into_iter().collect());
    }

    errors.extend(check_targets(&assets));

    println!("\n=== Storyboard Lint Report ===\n");

    if show_summary {
        print_summary(&assets);
    }

    if errors.is_empty() && warnings.is_empty() {
        println!("All checks passed!");
    }

    for warning in &warnings {
        println!("WARNING: {}", warning);
    }

    for error in &errors {
        println!("ERROR: {}", error);
    }

    println!(
        "\nSummary: {} assets, {} errors, {} warnings",
        assets.len(),
        errors.len(),
        warnings.len()
    );

    if errors.is_empty() {
        process::exit(0);
    } else {
        process::exit(1);
    }
}

fn collect_assets(dir: &Path, files: &mut Vec<PathBuf>) {
    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                collect_assets(&path, files);
            } else if path.extension().and_then(|s| s.to_str()) == Some("txt") {
                files.push(path);
            }
        }
    }
}

/// Every `data:` target must point at `{asset}-{name}` (or a bare asset
/// name) somewhere in the linted set.
fn check_targets(assets: &BTreeMap<String, BTreeMap<String, StoryboardData>>) -> Vec<String> {
    let mut known: HashSet<String> = HashSet::new();
    for (asset, boards) in assets {
        for name in boards.keys() {
            known.insert(format!("{}-{}", asset, name));
            if name == asset {
                known.insert(name.clone());
            }
        }
    }

    let mut errors = Vec::new();
    for (asset, boards) in assets {
        for (name, board) in boards {
            for (index, panel) in board.panels.iter().enumerate() {
                for target in panel_targets(panel) {
                    let Some(uri) = StoryboardUri::parse(target) else {
                        errors.push(format!(
                            "{}/{} panel {}: target '{}' is not a URI",
                            asset, name, index, target
                        ));
                        continue;
                    };
                    if uri.is_data() && !known.contains(uri.board_name()) {
                        errors.push(format!(
                            "{}/{} panel {}: target '{}' does not match any storyboard",
                            asset, name, index, target
                        ));
                    }
                }
            }
        }
    }
    errors
}

fn panel_targets(panel: &PanelInfo) -> Vec<&str> {
    match panel {
        PanelInfo::Narrative { .. } => Vec::new(),
        PanelInfo::Decision { options, .. } => {
            options.iter().map(|o| o.target_uri.as_str()).collect()
        }
        PanelInfo::Branch { options, .. } => {
            options.iter().map(|o| o.target_uri.as_str()).collect()
        }
    }
}

fn print_summary(assets: &BTreeMap<String, BTreeMap<String, StoryboardData>>) {
    for (asset, boards) in assets {
        println!("{}", asset);
        for (name, board) in boards {
            let kinds: Vec<String> = board
                .panels
                .iter()
                .map(|panel| format!("{:?}", panel.panel_type()))
                .collect();
            println!("  >>{} [{}]", name, kinds.join(", "));
        }
    }
    println!();
}
