use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use drawpool::{
    CommandBatch, CopyRows, DrawerError, DrawerPool, DrawerPoolOpts, FillColumn, FillRect,
    FillTriangle, GroupBarrier, Surface, rgb,
};
use kurbo::Point;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "drawpool", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a synthetic frame sequence and report timings.
    Bench(BenchArgs),
    /// Render one synthetic frame as a PNG.
    Frame(FrameArgs),
}

#[derive(Args, Debug)]
struct PoolArgs {
    /// Pool settings JSON.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Render thread count (0 or 1 run a single worker).
    #[arg(long)]
    threads: Option<usize>,

    /// Stop executing commands after this many per frame (0 draws everything).
    #[arg(long)]
    debug_draw_count: Option<usize>,

    /// Override the stall timeout in milliseconds.
    #[arg(long)]
    stall_timeout_ms: Option<u64>,
}

#[derive(Args, Debug)]
struct SceneArgs {
    /// Framebuffer width.
    #[arg(long, default_value_t = 640)]
    width: u32,

    /// Framebuffer height.
    #[arg(long, default_value_t = 480)]
    height: u32,

    /// Triangles per frame.
    #[arg(long, default_value_t = 256)]
    triangles: usize,
}

#[derive(Parser, Debug)]
struct BenchArgs {
    #[command(flatten)]
    pool: PoolArgs,

    #[command(flatten)]
    scene: SceneArgs,

    /// Frames to render.
    #[arg(long, default_value_t = 60)]
    frames: u64,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    #[command(flatten)]
    pool: PoolArgs,

    #[command(flatten)]
    scene: SceneArgs,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Scene seed.
    #[arg(long, default_value_t = 1)]
    seed: u64,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Bench(args) => cmd_bench(args),
        Command::Frame(args) => cmd_frame(args),
    }
}

fn read_opts(path: &Path) -> anyhow::Result<DrawerPoolOpts> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read pool settings '{}'", path.display()))?;
    DrawerPoolOpts::from_json_str(&text)
        .with_context(|| format!("parse pool settings '{}'", path.display()))
}

fn make_pool(args: &PoolArgs) -> anyhow::Result<DrawerPool> {
    let mut opts = match &args.config {
        Some(path) => read_opts(path)?,
        None => DrawerPoolOpts::default(),
    };
    if args.threads.is_some() {
        opts.threads = args.threads;
    }
    if let Some(ms) = args.stall_timeout_ms {
        opts.stall_timeout_ms = ms;
    }
    if let Some(count) = args.debug_draw_count {
        opts.debug_draw_count = count;
    }
    Ok(DrawerPool::new(opts)?)
}

/// Wait for the frame; a stall is a renderer deadlock and aborts the process.
fn finish_frame(pool: &mut DrawerPool) -> anyhow::Result<()> {
    match pool.wait_for_completion() {
        Err(e @ DrawerError::Stalled { .. }) => {
            tracing::error!(error = %e, "aborting on stalled drawer threads");
            std::process::abort();
        }
        other => Ok(other?),
    }
}

struct Scene {
    back: Arc<Surface>,
    front: Arc<Surface>,
}

impl Scene {
    fn new(width: u32, height: u32) -> anyhow::Result<Self> {
        Ok(Self {
            back: Arc::new(Surface::new(width, height)?),
            front: Arc::new(Surface::new(width, height)?),
        })
    }

    /// Record one frame: clear, walls, triangles into the back buffer, then present to the front.
    fn record(&self, args: &SceneArgs, seed: u64) -> anyhow::Result<Vec<CommandBatch>> {
        let (w, h) = (args.width as i32, args.height as i32);
        let mut rng = XorShift(seed.wrapping_mul(0x9e37_79b9_7f4a_7c15) | 1);

        let mut draw = CommandBatch::with_capacity(args.triangles + w as usize + 3);
        draw.push(FillRect {
            dest: self.back.clone(),
            x0: 0,
            y0: 0,
            x1: w,
            y1: h,
            color: rgb(18, 20, 28),
        });
        for x in (0..w).step_by(4) {
            let top = (rng.next() % (h as u64 / 2 + 1)) as i32;
            draw.push(FillColumn {
                dest: self.back.clone(),
                x,
                y: top,
                count: h - 2 * top,
                color: rgb(40, 44, 60 + (x % 64) as u8),
            });
        }
        for _ in 0..args.triangles {
            let mut vertex = || {
                Point::new(
                    (rng.next() % (w as u64 + 1)) as f64,
                    (rng.next() % (h as u64 + 1)) as f64,
                )
            };
            let vertices = [vertex(), vertex(), vertex()];
            let c = rng.next().to_le_bytes();
            draw.push(FillTriangle {
                dest: self.back.clone(),
                vertices,
                color: rgb(c[0], c[1], c[2]),
            });
        }
        draw.push(GroupBarrier::new());
        draw.push(CopyRows::new(self.back.clone(), self.front.clone())?);

        Ok(vec![draw])
    }
}

struct XorShift(u64);

impl XorShift {
    fn next(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }
}

fn cmd_bench(args: BenchArgs) -> anyhow::Result<()> {
    let mut pool = make_pool(&args.pool)?;
    let scene = Scene::new(args.scene.width, args.scene.height)?;

    let start = Instant::now();
    for frame in 0..args.frames {
        for batch in scene.record(&args.scene, frame)? {
            pool.submit(batch)?;
        }
        finish_frame(&mut pool)?;
    }
    let elapsed = start.elapsed();

    let frames = args.frames.max(1) as f64;
    eprintln!(
        "rendered {} frame(s) on {} worker(s) in {:.3}s ({:.2} ms/frame)",
        args.frames,
        pool.worker_count(),
        elapsed.as_secs_f64(),
        elapsed.as_secs_f64() * 1000.0 / frames
    );
    eprintln!("draw steps last frame: {}", pool.last_frame_draw_steps());
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let mut pool = make_pool(&args.pool)?;
    let scene = Scene::new(args.scene.width, args.scene.height)?;

    for batch in scene.record(&args.scene, args.seed)? {
        pool.submit(batch)?;
    }
    finish_frame(&mut pool)?;

    if let Some(parent) = args.out.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }

    image::save_buffer_with_format(
        &args.out,
        &scene.front.to_rgba8(),
        scene.front.width(),
        scene.front.height(),
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!(
        "wrote {} ({} draw steps)",
        args.out.display(),
        pool.last_frame_draw_steps()
    );
    Ok(())
}
