//! ftglyph - FreeType glyph cache and text renderer
//!
//! Command-line front end: measures a string with any font kind and,
//! with `--trace`, lists the draw calls a render would issue.

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use log::{info, warn};

use ftglyph::config::Config;
use ftglyph::font::fontconfig::resolve_font;
use ftglyph::font::{Font, FontKind};
use ftglyph::gpu::{DrawCall, RecordingRenderer};

/// Print help message
fn print_help() {
    println!(
        r#"ftglyph {} - FreeType glyph cache and text renderer

USAGE:
    ftglyph [OPTIONS]

OPTIONS:
    -h, --help              Print this help message
    -V, --version           Print version information
    --font=NAME|PATH        Font family name or font file (default: config, then system sans)
    --size=PT               Face size in points
    --kind=KIND             bitmap | pixmap | outline | polygon | extrude | texture
    --text=TEXT             String to measure (default: "Hello, World!")
    --trace                 Render into a recording renderer and list the draw calls
    --init-config           Generate config file
    -f, --force             Overwrite config file without confirmation

EXAMPLES:
    ftglyph --text="AVATAR"                      Measure with the configured font
    ftglyph --font="DejaVu Serif" --size=48      Measure with another face
    ftglyph --kind=extrude --trace               Show extruded draw calls

CONFIG FILE:
    ~/.config/ftglyph/config.toml (override with FTGLYPH_CONFIG)
"#,
        env!("CARGO_PKG_VERSION")
    );
}

/// Value of `--name=value` or `--name value`
fn arg_value<'a>(args: &'a [String], name: &str) -> Option<&'a str> {
    let prefix = format!("{}=", name);
    args.iter().enumerate().find_map(|(i, a)| {
        if let Some(value) = a.strip_prefix(&prefix) {
            Some(value)
        } else if a == name {
            args.get(i + 1).map(String::as_str)
        } else {
            None
        }
    })
}

/// Config file generation (--init-config)
fn init_config(force: bool) -> Result<()> {
    if let Some(config_path) = ftglyph::config::default_config_path() {
        if config_path.exists() && !force {
            println!("Config file already exists: {}", config_path.display());
            print!("Overwrite? [y/N]: ");
            std::io::Write::flush(&mut std::io::stdout())?;

            let mut input = String::new();
            std::io::stdin().read_line(&mut input)?;
            let input = input.trim().to_lowercase();

            if input != "y" && input != "yes" {
                println!("Aborted.");
                return Ok(());
            }
        }
    }

    let path = Config::write_default_config()?;
    println!("Config file generated:");
    println!("  Path: {}", path.display());
    Ok(())
}

/// Print one recorded call
fn print_call(call: &DrawCall) {
    match call {
        DrawCall::PushState(state) => println!("  push_state {:?}", state),
        DrawCall::PopState => println!("  pop_state"),
        DrawCall::Bitmap {
            origin, width, rows, ..
        } => println!(
            "  bitmap   at ({:.1}, {:.1}) {}x{}",
            origin.x, origin.y, width, rows
        ),
        DrawCall::Pixmap {
            origin, width, rows, ..
        } => println!(
            "  pixmap   at ({:.1}, {:.1}) {}x{}",
            origin.x, origin.y, width, rows
        ),
        DrawCall::LineLoops {
            origin,
            loops,
            points,
            ..
        } => println!(
            "  lines    at ({:.1}, {:.1}) {} loops, {} points",
            origin.x, origin.y, loops, points
        ),
        DrawCall::Triangles {
            origin, triangles, bounds, ..
        } => println!(
            "  mesh     at ({:.1}, {:.1}) {} triangles, z {:.1}..{:.1}",
            origin.x, origin.y, triangles, bounds.lower.z, bounds.upper.z
        ),
        DrawCall::TexturedQuad { page, origin, quad } => println!(
            "  quad     at ({:.1}, {:.1}) page {} uv ({:.3}, {:.3})-({:.3}, {:.3})",
            origin.x, origin.y, page, quad.uv_min[0], quad.uv_min[1], quad.uv_max[0], quad.uv_max[1]
        ),
        DrawCall::Release { glyphs, pages } => println!(
            "  release  {} glyphs, {} atlas pages",
            glyphs.len(),
            pages.len()
        ),
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = std::env::args().collect();

    // --help
    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return Ok(());
    }

    // --version
    if args.iter().any(|a| a == "--version" || a == "-V") {
        println!("ftglyph {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    if args.iter().any(|a| a == "--init-config") {
        let force = args.iter().any(|a| a == "--force" || a == "-f");
        return init_config(force);
    }

    let config = Config::load();

    let family = arg_value(&args, "--font").unwrap_or(config.font.family.as_str());
    let kind = match arg_value(&args, "--kind") {
        Some(name) => {
            FontKind::from_str(name).ok_or_else(|| anyhow!("Unknown font kind: {}", name))?
        }
        None => config.font.font_kind(),
    };
    let size = match arg_value(&args, "--size") {
        Some(s) => s
            .parse::<u32>()
            .with_context(|| format!("Invalid size: {}", s))?,
        None => config.font.size,
    };
    let text = arg_value(&args, "--text").unwrap_or("Hello, World!");
    let trace = args.iter().any(|a| a == "--trace");

    let path = resolve_font(family)?;
    let mut font = open_font(&path, kind)?;

    if let Some(encoding) = config.font.encoding() {
        if let Err(e) = font.char_map(encoding) {
            warn!("Character map {:?} not available: {}", encoding, e);
        }
    }
    font.set_depth(config.font.depth);
    font.set_outset(config.font.front_outset, config.font.back_outset);
    font.use_display_list(config.font.display_list);
    font.set_face_size(size, config.font.resolution)
        .with_context(|| format!("Failed to set face size {}pt", size))?;

    println!("Font:        {}", path.display());
    println!("Kind:        {}", kind.name());
    println!("Size:        {}pt @ {}dpi", font.face_size(), config.font.resolution);
    println!("Ascender:    {:.2}", font.ascender());
    println!("Descender:   {:.2}", font.descender());
    println!("Line height: {:.2}", font.line_height());

    let bbox = font.bounding_box(text);
    println!("Text:        {:?}", text);
    println!(
        "BBox:        ({:.2}, {:.2}, {:.2}) - ({:.2}, {:.2}, {:.2})",
        bbox.lower.x, bbox.lower.y, bbox.lower.z, bbox.upper.x, bbox.upper.y, bbox.upper.z
    );
    println!("Advance:     {:.2}", font.advance(text));

    if trace {
        let mut renderer = RecordingRenderer::new();
        let pen = font.render(text, config.render.render_mode(), &mut renderer);
        println!("Draw calls ({} draws):", renderer.draw_count());
        for call in renderer.calls() {
            print_call(call);
        }
        println!("Pen:         ({:.2}, {:.2})", pen.x, pen.y);
    }

    Ok(())
}

fn open_font(path: &Path, kind: FontKind) -> Result<Font> {
    let font = Font::open(path, kind)
        .with_context(|| format!("Failed to open font: {}", path.display()))?;
    info!("Opened {} ({} character maps)", path.display(), font.char_map_count());
    Ok(font)
}
