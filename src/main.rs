//! Command-line driver: renders images through the effect, prints a
//! recorded frame plan, or dumps the options schema.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use ascii_post::effect::{AsciiRenderFeature, ScreenEffect};
use ascii_post::gpu::glyph_atlas::GlyphAtlas;
use ascii_post::gpu::render_context::RenderContext;
use ascii_post::gpu::texture::RenderTarget;
use ascii_post::host::recording::RecordingHost;
use ascii_post::host::{SurfaceDesc, TextureId};
use ascii_post::options::{EffectSettings, Options};
use ascii_post::playback::{Playlist, PlaylistEvent, TweakSchedule};
use ascii_post::renderer::GpuRenderer;
use ascii_post::util::{FrameStats, FrameTiming};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "ascii-post",
    version,
    about = "ASCII-art post-processing filter"
)]
struct Cli {
    /// Options preset (TOML); defaults apply when omitted.
    #[arg(long, global = true)]
    options: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run still images through the effect and write numbered PNG frames.
    Render {
        /// Input images, played after any clips listed in the preset.
        inputs: Vec<String>,
        /// Directory for `frame_NNNN.png`.
        #[arg(long, default_value = "frames")]
        out_dir: PathBuf,
        /// Frames rendered per input.
        #[arg(long)]
        frames_per_clip: Option<u32>,
        /// Simulated playback rate, drives the tweak schedule.
        #[arg(long)]
        fps: Option<u32>,
        /// Start over at the first input after the last one.
        #[arg(long = "loop")]
        loop_from_end: bool,
        /// Stop after this many frames; required with `--loop`.
        #[arg(long)]
        max_frames: Option<u32>,
        /// Hold each frame to the playback rate instead of rendering as
        /// fast as possible.
        #[arg(long)]
        pace: bool,
    },
    /// Print the host commands one frame records, without a GPU.
    Plan {
        /// Target width in pixels.
        #[arg(long, default_value_t = 1920)]
        width: u32,
        /// Target height in pixels.
        #[arg(long, default_value_t = 1080)]
        height: u32,
    },
    /// Print the options JSON schema.
    Schema,
}

struct RenderArgs {
    inputs: Vec<String>,
    out_dir: PathBuf,
    frames_per_clip: Option<u32>,
    fps: Option<u32>,
    loop_from_end: bool,
    max_frames: Option<u32>,
    pace: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let options = match &cli.options {
        Some(path) => Options::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => Options::default(),
    };

    match cli.command {
        Command::Render {
            inputs,
            out_dir,
            frames_per_clip,
            fps,
            loop_from_end,
            max_frames,
            pace,
        } => render(
            &options,
            RenderArgs {
                inputs,
                out_dir,
                frames_per_clip,
                fps,
                loop_from_end,
                max_frames,
                pace,
            },
        ),
        Command::Plan { width, height } => plan(&options, width, height),
        Command::Schema => {
            let schema = serde_json::to_string_pretty(&Options::json_schema())?;
            writeln!(std::io::stdout().lock(), "{schema}")?;
            Ok(())
        }
    }
}

fn plan(options: &Options, width: u32, height: u32) -> Result<()> {
    let mut host = RecordingHost::new();
    let mut effect = AsciiRenderFeature::new(options.effect.clone());
    effect.set_font_texture(Some(TextureId(0)));

    let desc =
        SurfaceDesc::new(width, height, wgpu::TextureFormat::Rgba8UnormSrgb);
    effect.configure(&mut host, desc)?;
    let report = effect.execute(&mut host)?;
    let released = effect.cleanup(&mut host);
    effect.dispose(&mut host);

    let mut out = std::io::stdout().lock();
    for command in host.commands() {
        writeln!(out, "{command}")?;
    }
    let (columns, rows) = report.grid.map_or((0, 0), |g| (g.columns, g.rows));
    writeln!(
        out,
        "{:?}: grid {columns}x{rows}, {} of {} iterations, \
         {released} surfaces released",
        report.outcome,
        report.effective_iterations,
        report.requested_iterations,
    )?;
    for violation in host.violations() {
        log::warn!("host violation: {violation:?}");
    }
    Ok(())
}

fn load_atlas(settings: &EffectSettings) -> Result<GlyphAtlas> {
    match &settings.font_atlas {
        Some(path) => Ok(GlyphAtlas::load(path, settings.character_count)?),
        None => Ok(GlyphAtlas::builtin()),
    }
}

fn is_remote(clip: &str) -> bool {
    clip.starts_with("http://") || clip.starts_with("https://")
}

fn render(options: &Options, args: RenderArgs) -> Result<()> {
    let mut clips = options.playlist.clips.clone();
    clips.extend(args.inputs);
    if clips.is_empty() {
        bail!("no inputs given");
    }
    let loop_from_end = args.loop_from_end || options.playlist.loop_from_end;
    if loop_from_end && args.max_frames.is_none() {
        bail!("--loop needs --max-frames");
    }
    let frames_per_clip = args
        .frames_per_clip
        .unwrap_or(options.playlist.frames_per_clip)
        .max(1);
    let fps = args.fps.unwrap_or(options.playlist.fps).max(1);
    let frame_budget = FrameTiming::frame_budget(fps);
    let max_frames = args.max_frames.unwrap_or(u32::MAX);

    let mut playlist = Playlist::from_urls(clips, loop_from_end);
    if playlist.items().iter().all(|clip| is_remote(clip)) {
        bail!("every input is remote; download them first");
    }
    let context = pollster::block_on(RenderContext::headless())?;
    let mut renderer = GpuRenderer::new(&context)?;

    let mut settings = options.effect.clone();
    let atlas = load_atlas(&settings)?;
    settings.character_count = atlas.glyph_count();
    let font = renderer.register_glyph_atlas(&context, &atlas);
    let mut effect = AsciiRenderFeature::new(settings);
    effect.set_font_texture(Some(font));

    let mut schedule = TweakSchedule::new(options.schedule.clone());
    let mut stats = FrameStats::new(&options.frame_stats);
    let mut timing = FrameTiming::new(if args.pace { fps } else { 0 });
    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("creating {}", args.out_dir.display()))?;

    let mut elapsed = Duration::ZERO;
    let mut frame = 0u32;
    'playback: while let Some(clip) = playlist.current().cloned() {
        if is_remote(&clip) {
            log::warn!("skipping remote clip {clip}; download it first");
        } else {
            let image = image::open(&clip)
                .with_context(|| format!("opening {clip}"))?
                .to_rgba8();
            let (width, height) = image.dimensions();
            let source = image.into_raw();
            let target = RenderTarget::from_rgba8(
                &context.device,
                &context.queue,
                "Frame Target",
                width,
                height,
                &source,
            );
            log::info!(
                "clip {} of {}: {clip} ({width}x{height})",
                playlist.active_index() + 1,
                playlist.len()
            );

            for _ in 0..frames_per_clip {
                if frame >= max_frames {
                    break 'playback;
                }
                let mut tweaked = effect.settings().clone();
                if schedule.update(elapsed, &mut tweaked) {
                    log::info!("schedule step applied at {elapsed:?}");
                    effect.set_settings(tweaked);
                }

                target.write_rgba8(&context.queue, &source);
                let report = renderer.render(&context, &mut effect, &target)?;
                let pixels =
                    target.read_rgba8(&context.device, &context.queue)?;
                save_frame(&args.out_dir, frame, width, height, pixels)?;
                log::debug!(
                    "frame {frame}: {:?}, {} levels",
                    report.outcome,
                    report.effective_iterations
                );

                if args.pace && !timing.should_render() {
                    std::thread::sleep(timing.remaining());
                }
                if stats.record(timing.end_frame())
                    && options.frame_stats.log_interval_frames > 0
                    && stats.samples()
                        % u64::from(options.frame_stats.log_interval_frames)
                        == 0
                {
                    if let Some(summary) = stats.summary() {
                        log::info!("{summary}");
                    }
                }
                elapsed += frame_budget;
                frame += 1;
            }
        }

        match playlist.on_playback_complete() {
            PlaylistEvent::Advanced(index) => {
                log::debug!("advancing to clip {}", index + 1);
            }
            PlaylistEvent::Looped => {
                log::info!("playlist looped");
                schedule.reset();
                elapsed = Duration::ZERO;
                effect.set_settings(options.effect.clone());
                effect.settings_mut().character_count = atlas.glyph_count();
            }
            PlaylistEvent::Finished => log::info!("playlist finished"),
        }
    }

    let (in_use, pooled) = renderer.pool_usage();
    log::info!(
        "wrote {frame} frames to {} \
         ({in_use} of {pooled} scratch textures in use, {:.1} fps)",
        args.out_dir.display(),
        timing.fps()
    );
    Ok(())
}

fn save_frame(
    dir: &Path,
    index: u32,
    width: u32,
    height: u32,
    pixels: Vec<u8>,
) -> Result<()> {
    let path = dir.join(format!("frame_{index:04}.png"));
    let image = image::RgbaImage::from_raw(width, height, pixels)
        .context("readback size does not match the frame")?;
    image
        .save(&path)
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}
