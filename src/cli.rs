// ============================================================================
// ColorBook CLI: headless catalog queries and coloring via command-line flags
// ============================================================================
//
// Usage examples:
//   colorbook --list --category birds
//   colorbook --show dodo
//   colorbook --image fox --fill 1=#4ECDC4 --fill 3=#FF6B6B --output-dir out/
//   colorbook --random --fill 2=#000000 --verbose --no-export
//   colorbook --image fox --fill 1=#4ECDC4 --undo 1
//
// No GUI is opened in CLI mode. Edits are applied in a fixed order: every
// --fill (in the order given), then --clear, then --undo, then the export.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;

use crate::catalog::{Animal, Catalog};
use crate::components::palette::parse_hex;
use crate::document::ShapeId;
use crate::loader::{ImageLoader, IMAGE_SUBDIR, LOAD_ERROR_MESSAGE};
use crate::progress::{JsonFileStore, ProgressTracker};
use crate::project::ColoringProject;
use crate::settings::AppSettings;
use crate::{log_err, log_info};

/// Flags that switch `main()` into headless mode.
const CLI_FLAGS: &[&str] = &[
    "--list",
    "--show",
    "--completed",
    "--image",
    "-i",
    "--random",
    "--help",
    "-h",
    "--version",
    "-V",
];

// ============================================================================
// CLI argument definition (clap Derive)
// ============================================================================

/// ColorBook headless mode.
///
/// Browse the animal catalog and color images without opening the GUI.
#[derive(Parser, Debug)]
#[command(
    name = "colorbook",
    version,
    about = "ColorBook headless catalog browser and colorer",
    long_about = "Query the animal catalog, color shapes of an image and export the\n\
                  result as PNG without opening the GUI.\n\n\
                  Example:\n  \
                  colorbook --image fox --fill 1=#4ECDC4 --output-dir out/\n  \
                  colorbook --list --search flightless"
)]
pub struct CliArgs {
    /// List catalog entries (combine with --category / --search).
    #[arg(long)]
    pub list: bool,

    /// Only list entries of this category (case-insensitive).
    #[arg(long, value_name = "CATEGORY")]
    pub category: Option<String>,

    /// Only list entries whose name or description contains this text.
    #[arg(long, value_name = "TEXT")]
    pub search: Option<String>,

    /// Print one catalog entry as JSON.
    #[arg(long, value_name = "ID")]
    pub show: Option<String>,

    /// Print the ids of completed images.
    #[arg(long)]
    pub completed: bool,

    /// Image to color: a catalog id or an SVG filename in the image directory.
    #[arg(short, long, value_name = "ID_OR_FILE", conflicts_with = "random")]
    pub image: Option<String>,

    /// Pick a random catalog image to color.
    #[arg(long)]
    pub random: bool,

    /// Color shape N (1-based, document order) with a hex color. Repeatable.
    #[arg(short, long, value_name = "N=#RRGGBB")]
    pub fill: Vec<String>,

    /// Reset every shape to white after applying fills.
    #[arg(long)]
    pub clear: bool,

    /// Undo this many steps after the edits.
    #[arg(long, default_value_t = 0, value_name = "K")]
    pub undo: usize,

    /// Directory for `<id>-colored.png` (defaults to the configured export dir).
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Apply edits without writing a PNG.
    #[arg(long)]
    pub no_export: bool,

    /// Override the asset root holding images/animals/.
    #[arg(long, value_name = "DIR")]
    pub asset_root: Option<PathBuf>,

    /// Override the catalog JSON file.
    #[arg(long, value_name = "FILE")]
    pub catalog: Option<PathBuf>,

    /// Override the progress store file.
    #[arg(long, value_name = "FILE")]
    pub store: Option<PathBuf>,

    /// Print progress and history state after the edits.
    #[arg(short, long)]
    pub verbose: bool,
}

impl CliArgs {
    /// Returns `true` when any CLI-mode flag is present in the real process arguments.
    /// Used by `main()` to route before creating an eframe window.
    pub fn is_cli_mode() -> bool {
        Self::has_cli_flag(std::env::args().skip(1))
    }

    fn has_cli_flag(args: impl IntoIterator<Item = String>) -> bool {
        args.into_iter().any(|a| {
            let flag = a.split('=').next().unwrap_or("");
            CLI_FLAGS.contains(&flag)
        })
    }
}

// ============================================================================
// Public entry point
// ============================================================================

/// Run the requested CLI actions and return an OS exit code.
/// `0` = success, `1` = any error.
pub fn run(args: CliArgs) -> ExitCode {
    let settings = AppSettings::load();
    let mut out = std::io::stdout().lock();
    match execute(&args, &settings, &mut out) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log_err!("CLI: {}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Perform every action named by `args`, writing user output to `out`.
pub fn execute(
    args: &CliArgs,
    settings: &AppSettings,
    out: &mut dyn Write,
) -> Result<(), String> {
    let asset_root = args
        .asset_root
        .clone()
        .unwrap_or_else(|| PathBuf::from(&settings.asset_root));
    let catalog_path = args
        .catalog
        .clone()
        .unwrap_or_else(|| PathBuf::from(&settings.catalog_path));
    let store_path = args.store.clone().unwrap_or_else(JsonFileStore::default_path);

    let catalog = Catalog::load_or_discover(&catalog_path, &asset_root.join(IMAGE_SUBDIR));
    let tracker = ProgressTracker::new(Box::new(JsonFileStore::new(&store_path)));
    let mut did_something = false;

    if args.list {
        did_something = true;
        let completed = tracker.completed();
        let matches = catalog.filter(
            args.category.as_deref().unwrap_or(""),
            args.search.as_deref().unwrap_or(""),
        );
        for animal in &matches {
            let mark = if completed.contains(&animal.id) { "  [done]" } else { "" };
            writeln!(out, "{}\t{}\t{}{}", animal.id, animal.name, animal.category, mark)
                .map_err(|e| e.to_string())?;
        }
        if matches.is_empty() {
            writeln!(out, "(no matching animals)").map_err(|e| e.to_string())?;
        }
    }

    if let Some(id) = &args.show {
        did_something = true;
        let animal = catalog
            .find(id)
            .ok_or_else(|| format!("unknown animal '{}'", id))?;
        let json = serde_json::to_string_pretty(animal).map_err(|e| e.to_string())?;
        writeln!(out, "{}", json).map_err(|e| e.to_string())?;
    }

    if args.completed {
        did_something = true;
        for id in tracker.completed() {
            writeln!(out, "{}", id).map_err(|e| e.to_string())?;
        }
    }

    if args.image.is_some() || args.random {
        did_something = true;
        let (image_id, filename) = resolve_image(args, &catalog)?;
        let max_history = settings.max_undo_steps;
        let mut project = ColoringProject::with_history_limit(tracker, max_history);
        color_image(args, &mut project, &asset_root, &image_id, &filename, out)?;

        if !args.no_export {
            let dir = args.output_dir.clone().unwrap_or_else(|| settings.export_dir());
            match project.export(&dir).map_err(|e| format!("export failed: {}", e))? {
                Some(path) => writeln!(out, "{}", path.display()).map_err(|e| e.to_string())?,
                None => return Err("nothing to export".to_string()),
            }
        }
    }

    if !did_something {
        return Err("nothing to do (try --list or --image ID)".to_string());
    }
    Ok(())
}

// ============================================================================
// Per-image pipeline
// ============================================================================

fn color_image(
    args: &CliArgs,
    project: &mut ColoringProject,
    asset_root: &Path,
    image_id: &str,
    filename: &str,
    out: &mut dyn Write,
) -> Result<(), String> {
    // -- Step 1: Load ----------------------------------------------------
    let loader = ImageLoader::new(asset_root);
    project
        .load(&loader, image_id, filename)
        .map_err(|e| format!("{} '{}': {}", LOAD_ERROR_MESSAGE, filename, e))?;
    let shape_count = project.document().map(|d| d.shape_count()).unwrap_or(0);

    // -- Step 2: Fills ---------------------------------------------------
    for spec in &args.fill {
        let (n, color) = parse_fill_spec(spec)?;
        if n == 0 || n > shape_count {
            return Err(format!(
                "shape {} does not exist ('{}' has {} shapes)",
                n, image_id, shape_count
            ));
        }
        project.color_shape_with(ShapeId(n - 1), &color);
    }

    // -- Step 3: Clear / undo --------------------------------------------
    if args.clear {
        project.clear_all();
    }
    for _ in 0..args.undo {
        if !project.undo() {
            break;
        }
    }

    if args.verbose {
        if let Some(progress) = project.progress() {
            writeln!(
                out,
                "{}: {}/{} shapes colored ({}%){}",
                image_id,
                progress.colored,
                progress.total,
                progress.percent(),
                if project.is_completed() { ", completed" } else { "" }
            )
            .map_err(|e| e.to_string())?;
        }
        writeln!(
            out,
            "history: step {} of {}",
            project.history.index() + 1,
            project.history.len()
        )
        .map_err(|e| e.to_string())?;
    }

    log_info!("CLI colored '{}' with {} fill(s)", image_id, args.fill.len());
    Ok(())
}

// ============================================================================
// Helpers
// ============================================================================

/// Map `--image` / `--random` to `(image_id, filename)`.
fn resolve_image(args: &CliArgs, catalog: &Catalog) -> Result<(String, String), String> {
    let from_animal = |a: &Animal| (a.id.clone(), a.svg_filename());

    if args.random {
        return catalog
            .random()
            .map(from_animal)
            .ok_or_else(|| "catalog is empty".to_string());
    }

    let name = args.image.as_deref().unwrap_or("");
    if let Some(animal) = catalog.find(name) {
        return Ok(from_animal(animal));
    }
    if name.to_ascii_lowercase().ends_with(".svg") {
        let stem = Path::new(name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(name);
        return Ok((stem.to_string(), name.to_string()));
    }
    Err(format!("unknown animal '{}'", name))
}

/// Parse `N=#RRGGBB` (or `N=#RGB`).
pub fn parse_fill_spec(spec: &str) -> Result<(usize, String), String> {
    let (index, color) = spec
        .split_once('=')
        .ok_or_else(|| format!("invalid --fill '{}': expected N=#RRGGBB", spec))?;
    let n: usize = index
        .trim()
        .parse()
        .map_err(|_| format!("invalid shape number '{}' in --fill", index.trim()))?;
    let color = color.trim();
    if parse_hex(color).is_none() {
        return Err(format!("invalid color '{}' in --fill", color));
    }
    Ok((n, color.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("colorbook-cli-{}", uuid::Uuid::new_v4()))
            .join(name)
    }

    fn bundled(extra: &[&str]) -> CliArgs {
        let root = Path::new(env!("CARGO_MANIFEST_DIR"));
        let static_dir = root.join("static");
        let catalog = root.join("data/animals.json");
        let mut argv = vec![
            "colorbook".to_string(),
            "--asset-root".to_string(),
            static_dir.display().to_string(),
            "--catalog".to_string(),
            catalog.display().to_string(),
        ];
        argv.extend(extra.iter().map(|s| s.to_string()));
        CliArgs::parse_from(argv)
    }

    #[test]
    fn fill_specs_parse() {
        assert_eq!(parse_fill_spec("1=#4ECDC4").unwrap(), (1, "#4ECDC4".to_string()));
        assert_eq!(parse_fill_spec(" 3 = #abc ").unwrap(), (3, "#abc".to_string()));
        assert!(parse_fill_spec("1").is_err());
        assert!(parse_fill_spec("x=#000000").is_err());
        assert!(parse_fill_spec("1=teal").is_err());
    }

    #[test]
    fn cli_mode_detection_ignores_plain_launches() {
        let args = |v: &[&str]| v.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        assert!(!CliArgs::has_cli_flag(args(&[])));
        assert!(CliArgs::has_cli_flag(args(&["--list"])));
        assert!(CliArgs::has_cli_flag(args(&["--image=fox"])));
        assert!(!CliArgs::has_cli_flag(args(&["--verbose"])));
    }

    #[test]
    fn image_and_random_conflict() {
        assert!(CliArgs::try_parse_from(["colorbook", "--image", "fox", "--random"]).is_err());
    }

    #[test]
    fn list_filters_by_category() {
        let store = temp_path("progress.json");
        let store_arg = store.display().to_string();
        let args = bundled(&["--list", "--category", "mammals", "--store", &store_arg]);
        let mut out = Vec::new();
        execute(&args, &AppSettings::default(), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("fox\t"));
        assert!(!text.contains("dodo"));
    }

    #[test]
    fn show_prints_the_full_catalog_record() {
        let store = temp_path("progress.json");
        let store_arg = store.display().to_string();
        let args = bundled(&["--show", "dodo", "--store", &store_arg]);
        let mut out = Vec::new();
        execute(&args, &AppSettings::default(), &mut out).unwrap();
        let shown: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(shown["name"], "Dodo");
        assert_eq!(shown["extinct_since"], "1681");
    }

    #[test]
    fn unknown_show_id_is_an_error() {
        let args = bundled(&["--show", "quagga"]);
        let mut out = Vec::new();
        let err = execute(&args, &AppSettings::default(), &mut out).unwrap_err();
        assert!(err.contains("quagga"));
    }

    #[test]
    fn coloring_run_exports_and_reports() {
        let store = temp_path("progress.json");
        let out_dir = temp_path("out");
        let (store_arg, out_arg) = (store.display().to_string(), out_dir.display().to_string());
        let args = bundled(&[
            "--image", "fox", "--fill", "1=#4ECDC4", "--fill", "2=#FF6B6B", "--fill",
            "3=#000000", "--verbose", "--store", &store_arg, "--output-dir", &out_arg,
        ]);
        let mut out = Vec::new();
        execute(&args, &AppSettings::default(), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("3/4 shapes colored (75%), completed"));
        assert!(text.contains("history: step 4 of 4"));
        assert!(out_dir.join("fox-colored.png").exists());

        let tracker = ProgressTracker::new(Box::new(JsonFileStore::new(&store)));
        assert!(tracker.is_completed("fox"));

        let _ = std::fs::remove_dir_all(store.parent().unwrap());
        let _ = std::fs::remove_dir_all(out_dir.parent().unwrap());
    }

    #[test]
    fn out_of_range_fill_fails() {
        let store = temp_path("progress.json");
        let store_arg = store.display().to_string();
        let args = bundled(&["--image", "fox", "--fill", "9=#000000", "--no-export", "--store", &store_arg]);
        let mut out = Vec::new();
        assert!(execute(&args, &AppSettings::default(), &mut out).is_err());
    }

    #[test]
    fn missing_image_reports_the_load_message() {
        let args = bundled(&["--image", "ghost.svg", "--no-export"]);
        let mut out = Vec::new();
        let err = execute(&args, &AppSettings::default(), &mut out).unwrap_err();
        assert!(err.starts_with(LOAD_ERROR_MESSAGE));
    }
}
