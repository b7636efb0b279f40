//! Coupling collector (§4.4): per-language import extraction, module-graph
//! construction, Tarjan SCC for circular dependencies, and fan-out for
//! high-coupling modules.

mod graph;
mod imports;

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Mutex;

use reposcan_exclude::{PatternSet, merge_excludes};
use reposcan_model::{CollectError, Collector, CollectorOpts, RawSignal, ScanContext};
use reposcan_walk::walk_files;

use graph::ModuleGraph;
use imports::COUPLING_EXTENSIONS;

/// Hard file-count cap shared with the duplication collector (§5).
const FILE_CAP: usize = 10_000;

fn extension(rel_path: &str) -> Option<&str> {
    let name = rel_path.rsplit('/').next().unwrap_or(rel_path);
    name.rsplit_once('.').map(|(_, ext)| ext)
}

fn read_lines(repo_path: &Path, rel_path: &str) -> Option<Vec<String>> {
    let full = repo_path.join(rel_path);
    let bytes = reposcan_content::read_head(&full, 4 * 1024 * 1024).ok()?;
    if reposcan_content::is_binary_prefix(&bytes) {
        return None;
    }
    let text = String::from_utf8_lossy(&bytes);
    Some(text.lines().map(str::to_string).collect())
}

/// Resolve Go's package-directory module, translating an absolute-ish
/// import path into a repo-relative directory, per §4.4 step 2/4.
fn go_import_to_dir(go_module_path: &str, raw_import: &str) -> Option<String> {
    let prefix = format!("{go_module_path}/");
    raw_import
        .strip_prefix(&prefix)
        .map(str::to_string)
        .or_else(|| (raw_import == go_module_path).then(|| String::new()))
}

fn dir_of(rel_path: &str) -> String {
    match rel_path.rfind('/') {
        Some(idx) => rel_path[..idx].to_string(),
        None => String::new(),
    }
}

/// Builds the module set and raw (module -> module) edge list across every
/// language extractor (§4.4 steps 1-5).
struct GraphInputs {
    modules: BTreeSet<String>,
    edges: Vec<(String, String)>,
    cap_exceeded: bool,
    files_scanned: usize,
}

fn build_graph_inputs(
    ctx: &ScanContext,
    repo_path: &Path,
    opts: &CollectorOpts,
) -> Result<GraphInputs, CollectError> {
    let excludes = PatternSet::compile(&merge_excludes(&opts.exclude_patterns))
        .map_err(CollectError::Other)?;
    let includes = PatternSet::compile(&opts.include_patterns).map_err(CollectError::Other)?;
    let walked = walk_files(repo_path, &excludes, &includes).map_err(CollectError::Other)?;

    let mut cap_exceeded = false;
    let mut candidate_paths: Vec<String> = walked.into_iter().map(|f| f.rel_path).collect();
    if candidate_paths.len() > FILE_CAP {
        candidate_paths.truncate(FILE_CAP);
        cap_exceeded = true;
    }

    let go_module_path = read_lines(repo_path, "go.mod")
        .and_then(|lines| imports::parse_go_module_path(&lines.join("\n")));

    let mut modules: BTreeSet<String> = BTreeSet::new();
    let mut per_file_lines: BTreeMap<String, Vec<String>> = BTreeMap::new();

    for rel_path in &candidate_paths {
        ctx.check()?;
        let Some(ext) = extension(rel_path) else {
            continue;
        };
        if !COUPLING_EXTENSIONS.contains(&ext) {
            continue;
        }
        let Some(lines) = read_lines(repo_path, rel_path) else {
            continue;
        };

        match ext {
            "go" if go_module_path.is_some() => {
                modules.insert(dir_of(rel_path));
            }
            "js" | "jsx" | "ts" | "tsx" => {
                modules.insert(imports::js_module_id(rel_path));
            }
            "py" => {
                modules.insert(imports::python_module_id(rel_path));
            }
            "java" => {
                if let Some(pkg) = imports::java_package_of(&lines) {
                    modules.insert(pkg);
                }
            }
            "rs" => {
                if let Some(module) = imports::rust_module_of(rel_path) {
                    modules.insert(module);
                }
            }
            "rb" => {
                modules.insert(imports::ruby_module_id(rel_path));
            }
            "php" => {
                if let Some(ns) = imports::php_namespace_of(&lines) {
                    modules.insert(ns);
                }
            }
            "c" | "cc" | "cpp" | "h" | "hpp" => {
                modules.insert(rel_path.clone());
            }
            _ => {}
        }
        per_file_lines.insert(rel_path.clone(), lines);
    }

    let mut edges: Vec<(String, String)> = Vec::new();
    for (rel_path, lines) in &per_file_lines {
        ctx.check()?;
        let Some(ext) = extension(rel_path) else {
            continue;
        };
        match ext {
            "go" => {
                let Some(module_path) = &go_module_path else {
                    continue;
                };
                let from = dir_of(rel_path);
                for raw in imports::extract_go_imports(lines) {
                    if let Some(to) = go_import_to_dir(module_path, &raw) {
                        edges.push((from.clone(), to));
                    }
                }
            }
            "js" | "jsx" | "ts" | "tsx" => {
                let from = imports::js_module_id(rel_path);
                for spec in imports::extract_js_relative_imports(lines) {
                    for candidate in imports::resolve_js_relative(rel_path, &spec) {
                        if modules.contains(&candidate) {
                            edges.push((from.clone(), candidate));
                            break;
                        }
                    }
                }
            }
            "py" => {
                let from = imports::python_module_id(rel_path);
                for dotted in imports::extract_python_imports(lines) {
                    for candidate in imports::python_prefixes(&dotted) {
                        if modules.contains(&candidate) {
                            edges.push((from.clone(), candidate));
                            break;
                        }
                    }
                }
            }
            "java" => {
                let Some(from) = imports::java_package_of(lines) else {
                    continue;
                };
                for package in imports::extract_java_imports(lines) {
                    edges.push((from.clone(), package));
                }
            }
            "rs" => {
                let Some(from) = imports::rust_module_of(rel_path) else {
                    continue;
                };
                for target in imports::extract_rust_crate_imports(lines) {
                    edges.push((from.clone(), target));
                }
            }
            "rb" => {
                let from = imports::ruby_module_id(rel_path);
                for target in imports::extract_ruby_requires(rel_path, lines) {
                    edges.push((from.clone(), target));
                }
            }
            "php" => {
                let Some(from) = imports::php_namespace_of(lines) else {
                    continue;
                };
                for ns in imports::extract_php_use_imports(lines) {
                    edges.push((from.clone(), ns));
                }
            }
            "c" | "cc" | "cpp" | "h" | "hpp" => {
                let from = rel_path.clone();
                for target in imports::extract_c_includes(rel_path, lines) {
                    edges.push((from.clone(), target));
                }
            }
            _ => {}
        }
    }

    Ok(GraphInputs {
        modules,
        edges,
        cap_exceeded,
        files_scanned: per_file_lines.len(),
    })
}

fn cycle_confidence(size: usize) -> f64 {
    if size <= 2 {
        0.80
    } else if size == 3 {
        0.75
    } else {
        0.70
    }
}

fn fan_out_confidence(count: usize) -> f64 {
    if count >= 20 {
        0.70
    } else if count >= 15 {
        reposcan_math::lerp_clamped(count as f64, 15.0, 0.55, 20.0, 0.70)
    } else {
        reposcan_math::lerp_clamped(count as f64, 10.0, 0.40, 15.0, 0.55)
    }
}

/// Collector implementing §4.4.
#[derive(Default)]
pub struct CouplingCollector {
    metrics: Mutex<Option<serde_json::Value>>,
}

impl CouplingCollector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Collector for CouplingCollector {
    fn name(&self) -> &str {
        "coupling"
    }

    fn collect(
        &self,
        ctx: &ScanContext,
        repo_path: &Path,
        opts: &CollectorOpts,
    ) -> Result<Vec<RawSignal>, CollectError> {
        let inputs = build_graph_inputs(ctx, repo_path, opts)?;
        let graph = ModuleGraph::build(&inputs.modules, &inputs.edges);

        let mut cycle_signals: Vec<RawSignal> = Vec::new();
        for component in graph.tarjan_scc() {
            if component.len() < 2 {
                continue;
            }
            ctx.check()?;
            let mut names: Vec<&str> = component.iter().map(|&id| graph.node_name(id)).collect();
            names.sort_unstable();
            let mut path_display: Vec<&str> = names.clone();
            path_display.push(names[0]);
            let title = format!("Circular dependency: {}", path_display.join(" \u{2192} "));
            let description = format!("Modules in cycle: {}", names.join(", "));
            let confidence = cycle_confidence(names.len());
            let anchor = names[0].to_string();
            cycle_signals.push(
                RawSignal::new(self.name(), "circular-dependency", &anchor, 0, title, description, confidence)
                    .with_tag("coupling")
                    .with_tag("cycle"),
            );
        }
        cycle_signals.sort_by(|a, b| a.file_path.cmp(&b.file_path));

        let mut fan_out_signals: Vec<RawSignal> = Vec::new();
        for (id, name) in graph.nodes.iter().enumerate() {
            ctx.check()?;
            let count = graph.fan_out(id);
            if count < 10 {
                continue;
            }
            let title = format!("High coupling: module `{name}` depends on {count} other modules");
            let description = format!("Outgoing dependency count: {count}");
            let confidence = fan_out_confidence(count);
            fan_out_signals.push(
                RawSignal::new(self.name(), "high-coupling", name, 0, title, description, confidence)
                    .with_tag("coupling")
                    .with_tag("fan-out"),
            );
        }
        fan_out_signals.sort_by(|a, b| a.file_path.cmp(&b.file_path));

        let mut signals = cycle_signals;
        signals.extend(fan_out_signals);

        *self.metrics.lock().expect("metrics mutex poisoned") = Some(serde_json::json!({
            "filesScanned": inputs.files_scanned,
            "modules": inputs.modules.len(),
            "capExceeded": inputs.cap_exceeded,
            "cycles": signals.iter().filter(|s| s.kind == "circular-dependency").count(),
            "highCoupling": signals.iter().filter(|s| s.kind == "high-coupling").count(),
        }));

        Ok(signals)
    }

    fn metrics(&self) -> Option<serde_json::Value> {
        self.metrics.lock().expect("metrics mutex poisoned").clone()
    }
}
