//! FBX CLI - Inspect FBX scenes from their JSON node-tree form.

use std::env;
use std::process::ExitCode;

use fbx_scene::anim::Animation;
use fbx_scene::prelude::*;
use fbx_scene::util::{decompose, Mat4};
use serde_json::{json, Value};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Command-line flags shared by all commands.
struct Flags {
    filter: &'static str,
    options: ImportOptions,
    json: bool,
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();
    let prog = args.first().map(String::as_str).unwrap_or("fbx-cli");

    let mut flags = Flags { filter: "info", options: ImportOptions::default(), json: false };
    let mut positional: Vec<&str> = Vec::new();
    let mut rest = args.iter().skip(1);
    while let Some(arg) = rest.next() {
        match arg.as_str() {
            "-v" | "--verbose" => flags.filter = "debug",
            "-vv" | "--trace" => flags.filter = "trace",
            "-q" | "--quiet" => flags.filter = "error",
            "--bake-axis" => flags.options.bake_axis_conversion = true,
            "--keep-quads" => flags.options.keep_quads = true,
            "--json" => flags.json = true,
            "--scale" => match rest.next().map(|s| s.parse::<f32>()) {
                Some(Ok(scale)) => flags.options.scale_factor = scale,
                _ => {
                    eprintln!("--scale expects a number");
                    return ExitCode::FAILURE;
                }
            },
            _ => positional.push(arg),
        }
    }
    init_logging(flags.filter);

    let (command, path) = match positional.as_slice() {
        [] => {
            print_usage(prog);
            return ExitCode::SUCCESS;
        }
        ["help" | "h" | "-h" | "--help", ..] => {
            print_usage(prog);
            return ExitCode::SUCCESS;
        }
        [command, path, ..] => (*command, *path),
        [path] => ("info", *path),
    };

    info!("Loading node tree: {}", path);
    let doc = match fbx_scene::load(path, &flags.options) {
        Ok(doc) => doc,
        Err(e) => {
            eprintln!("Failed to load {}: {}", path, e);
            return ExitCode::FAILURE;
        }
    };
    debug!("{} warnings while loading", doc.warnings.len());

    match command {
        "info" | "i" => cmd_info(path, &doc),
        "tree" | "t" => cmd_tree(&doc),
        "anim" | "a" => cmd_anim(&doc),
        "dump" | "d" => cmd_dump(&doc, flags.json),
        other => {
            eprintln!("Unknown command: {}", other);
            print_usage(prog);
            return ExitCode::FAILURE;
        }
    }
    ExitCode::SUCCESS
}

/// `RUST_LOG` wins; otherwise the verbosity flags pick the level.
fn init_logging(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).try_init();
}

fn print_usage(prog: &str) {
    println!("FBX CLI - Inspect FBX scenes (JSON node trees)");
    println!();
    println!("Usage: {} [options] <command> <tree.json>", prog);
    println!();
    println!("Commands:");
    println!("  i, info    Show version, settings and object counts");
    println!("  t, tree    Show the model hierarchy");
    println!("  a, anim    Show animation stacks, layers and output curves");
    println!("  d, dump    Dump models with local/global matrices (--json for JSON)");
    println!("  h, help    Show this help");
    println!();
    println!("Options:");
    println!("  -v, --verbose  Debug output");
    println!("  -vv, --trace   Trace output (very verbose)");
    println!("  -q, --quiet    Errors only");
    println!("  --bake-axis    Bake the axis conversion into transforms");
    println!("  --keep-quads   Keep quads instead of splitting them");
    println!("  --scale <f>    Extra scale factor");
    println!("  --json         JSON output for dump");
}

fn cmd_info(path: &str, doc: &Document) {
    let header = &doc.header;
    let settings = &doc.settings;
    println!("File: {}", path);
    println!("Version: {}{}", header.version, if header.new_time_code { " (new time code)" } else { "" });
    if let Some(app) = &header.original_application {
        println!("Created by: {}", app);
    }
    if let Some(app) = &header.last_saved_application {
        println!("Saved by: {}", app);
    }
    if let Some(time) = &header.creation_time {
        println!("Created: {}", time);
    }
    println!();
    println!("Settings:");
    println!("  Unit scale:  {}", settings.unit_scale_factor);
    println!(
        "  Axes:        up {}{} front {}{} coord {}{}",
        sign(settings.up_axis_sign),
        settings.up_axis,
        sign(settings.front_axis_sign),
        settings.front_axis,
        sign(settings.coord_axis_sign),
        settings.coord_axis
    );
    println!("  Handedness:  {}", if doc.coords.is_right_handed { "right" } else { "left" });
    println!("  Frame rate:  {} ({:?})", settings.frame_rate(), settings.time_mode);
    println!();

    let meshes = doc.models.iter().filter(|m| m.mesh.is_some()).count();
    let (vertices, triangles) = doc
        .geometries
        .iter()
        .filter_map(|g| g.mesh.as_ref())
        .fold((0, 0), |(v, t), mesh| (v + mesh.vertices.len(), t + mesh.triangle_count()));
    println!("Objects:");
    println!("  Models:     {} ({} with meshes)", doc.models.len(), meshes);
    println!("  Cameras:    {}", doc.cameras().count());
    println!("  Lights:     {}", doc.lights().count());
    println!("  Geometries: {} ({} vertices, {} triangles)", doc.geometries.len(), vertices, triangles);
    println!("  Materials:  {}", doc.materials.len());
    println!("  Textures:   {}", doc.textures.len());
    println!("  Deformers:  {} ({} clusters, {} channels)", doc.deformers.len(), doc.clusters.len(), doc.blend_shape_channels.len());
    println!("  Stacks:     {}", doc.stacks.len());
    println!("  Curves:     {}", doc.curves.len());
    if !doc.warnings.is_empty() {
        println!();
        println!("Warnings ({}):", doc.warnings.len());
        for warning in &doc.warnings {
            println!("  {}", warning);
        }
    }
}

fn sign(value: i32) -> char {
    if value < 0 {
        '-'
    } else {
        '+'
    }
}

fn cmd_tree(doc: &Document) {
    doc.walk_models(|handle, depth| {
        let model = &doc.models[handle];
        let kind = match &model.kind {
            ModelKind::Camera(_) => "camera",
            ModelKind::Light(_) => "light",
            ModelKind::Plain if model.mesh.is_some() => "mesh",
            ModelKind::Plain => model.info.class.as_str(),
        };
        let materials = if model.materials.is_empty() {
            String::new()
        } else {
            format!(" [{} materials]", model.materials.len())
        };
        println!("{:indent$}{} ({}){}", "", model.info.name, kind, materials, indent = depth * 2);
    });
}

fn cmd_anim(doc: &Document) {
    if doc.stacks.is_empty() {
        println!("No animation stacks");
        return;
    }
    for stack in doc.stacks.iter() {
        println!(
            "Stack '{}': {:.3}s - {:.3}s, {} animated models",
            stack.info.name,
            doc.to_seconds(stack.local_start()),
            doc.to_seconds(stack.local_stop()),
            stack.animated_models.len()
        );
        for &layer in &stack.layers {
            let layer = &doc.layers[layer];
            println!(
                "  Layer '{}': id {}, weight {}, {:?}{}",
                layer.info.name,
                layer.layer_id(),
                layer.weight(),
                layer.blend_mode(),
                if layer.mute == Some(true) { ", muted" } else { "" }
            );
        }
        if let Some(animation) = &stack.output {
            print_animation(doc, animation);
        }
    }
}

fn print_animation(doc: &Document, animation: &Animation) {
    println!("  Output: {:.3}s at {} fps", animation.length, animation.frame_rate);
    for binding in &animation.bindings {
        println!("    {}", doc.models[binding.model].info.name);
        for curve in &binding.curves {
            let range = match (curve.keys.first(), curve.keys.last()) {
                (Some(first), Some(last)) => format!("{:.3} .. {:.3}", first.value, last.value),
                _ => String::new(),
            };
            println!("      {:<24} {:>5} keys  {}", curve.property, curve.len(), range);
        }
    }
}

fn cmd_dump(doc: &Document, as_json: bool) {
    let mut models = Vec::with_capacity(doc.models.len());
    doc.walk_models(|handle, depth| {
        let model = &doc.models[handle];
        let local = model.transform.matrix();
        let global = doc.global_matrix(handle);
        if as_json {
            models.push(json!({
                "id": model.info.id,
                "name": model.info.name,
                "class": model.info.class,
                "depth": depth,
                "local": matrix_json(&local),
                "global": matrix_json(&global),
                "translation": model.transform.translation.to_array(),
                "rotation": model.transform.rotation.to_array(),
                "scale": model.transform.scale.to_array(),
                "mesh": model.mesh.map(|g| doc.geometries[g].info.id),
            }));
        } else {
            let (t, r, s) = decompose(&global);
            println!("{:indent$}{}", "", model.info.name, indent = depth * 2);
            println!("{:indent$}  local  t={:?} r={:?} s={:?}", "", model.transform.translation, model.transform.rotation, model.transform.scale, indent = depth * 2);
            println!("{:indent$}  global t={:?} r={:?} s={:?}", "", t, r, s, indent = depth * 2);
        }
    });
    if as_json {
        let out = json!({ "version": doc.header.version, "models": models });
        match serde_json::to_string_pretty(&out) {
            Ok(text) => println!("{}", text),
            Err(e) => eprintln!("Failed to serialize: {}", e),
        }
    }
}

fn matrix_json(m: &Mat4) -> Value {
    json!(m.to_cols_array())
}
