//! arcstroke CLI
//!
//! Renders a path batch offscreen to a PNG or shows it in a window.

use std::path::{Path, PathBuf};

use anyhow::Result;
use arcstroke_core::{LineCap, LineJoin, StrokeStyle};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod headless;
mod scene;
mod windowed;

use config::AppConfig;

#[derive(Parser)]
#[command(name = "arcstroke")]
#[command(author, version, about = "Instanced GPU path strokes", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Render offscreen and write a PNG
    Render {
        /// Output image path
        #[arg(short, long, default_value = "arcstroke.png")]
        output: PathBuf,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Open an interactive window
    View {
        #[command(flatten)]
        common: CommonArgs,
    },
}

#[derive(Args, Debug, Default)]
struct CommonArgs {
    /// Scene file (JSON batch columns)
    #[arg(long)]
    scene: Option<PathBuf>,

    /// Config file (arcstroke.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    width: Option<u32>,

    #[arg(long)]
    height: Option<u32>,

    /// Stroke width in pixels
    #[arg(long)]
    line_width: Option<f32>,

    /// miter, round or bevel
    #[arg(long)]
    join: Option<LineJoin>,

    /// none, butt or round
    #[arg(long)]
    cap: Option<LineCap>,

    #[arg(long)]
    miter_limit: Option<f32>,
}

impl CommonArgs {
    /// Config file (or defaults) with command-line overrides applied
    fn resolve_config(&self) -> Result<AppConfig> {
        let mut config = match &self.config {
            Some(path) => AppConfig::load(path)?,
            None => AppConfig::default(),
        };
        self.apply(&mut config);
        Ok(config)
    }

    fn apply(&self, config: &mut AppConfig) {
        if let Some(width) = self.width {
            config.window.width = width;
        }
        if let Some(height) = self.height {
            config.window.height = height;
        }
        if let Some(scene) = &self.scene {
            config.render.scene = Some(scene.clone());
        }

        let stroke: &mut StrokeStyle = &mut config.stroke;
        if let Some(line_width) = self.line_width {
            stroke.line_width = line_width;
        }
        if let Some(join) = self.join {
            stroke.join = join;
        }
        if let Some(cap) = self.cap {
            stroke.cap = cap;
        }
        if let Some(miter_limit) = self.miter_limit {
            stroke.miter_limit = miter_limit;
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    match cli.command {
        Commands::Render { output, common } => cmd_render(&output, &common),
        Commands::View { common } => cmd_view(&common),
    }
}

fn cmd_render(output: &Path, common: &CommonArgs) -> Result<()> {
    let config = common.resolve_config()?;
    let batch = scene::resolve_scene(config.render.scene.as_deref())?;
    info!(
        "Rendering {} segments at {}x{}",
        batch.len(),
        config.window.width,
        config.window.height
    );

    let frame = headless::render_frame(
        &batch,
        &headless::HeadlessOptions {
            width: config.window.width,
            height: config.window.height,
            style: config.stroke,
            clear_color: config.render.clear_color(),
        },
    )?;
    headless::write_png(frame, output)
}

fn cmd_view(common: &CommonArgs) -> Result<()> {
    let config = common.resolve_config()?;
    let batch = scene::resolve_scene(config.render.scene.as_deref())?;
    info!("Viewing {} segments", batch.len());

    windowed::run(
        batch,
        windowed::ViewerOptions {
            title: config.window.title,
            width: config.window.width,
            height: config.window.height,
            style: config.stroke,
            clear_color: config.render.clear_color(),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_render_flags() {
        let cli = Cli::try_parse_from([
            "arcstroke",
            "render",
            "--output",
            "out.png",
            "--line-width",
            "6",
            "--join",
            "bevel",
            "--cap",
            "round",
        ])
        .unwrap();

        let Commands::Render { output, common } = cli.command else {
            panic!("expected render");
        };
        assert_eq!(output, PathBuf::from("out.png"));
        assert_eq!(common.line_width, Some(6.0));
        assert_eq!(common.join, Some(LineJoin::Bevel));
        assert_eq!(common.cap, Some(LineCap::Round));
    }

    #[test]
    fn unknown_join_is_rejected() {
        assert!(Cli::try_parse_from(["arcstroke", "view", "--join", "sharp"]).is_err());
    }

    #[test]
    fn flags_override_config() {
        let mut config = AppConfig::default();
        let args = CommonArgs {
            width: Some(320),
            miter_limit: Some(2.0),
            scene: Some(PathBuf::from("scene.json")),
            ..Default::default()
        };
        args.apply(&mut config);

        assert_eq!(config.window.width, 320);
        assert_eq!(config.window.height, 800);
        assert_eq!(config.stroke.miter_limit, 2.0);
        assert_eq!(config.stroke.line_width, 20.0);
        assert_eq!(config.render.scene, Some(PathBuf::from("scene.json")));
    }
}
