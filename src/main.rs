use std::{
    fs,
    io::BufWriter,
    path::{Path, PathBuf},
};

use anyhow::Context;
use clap::{Parser, Subcommand};

use pdf::{Document, FontSubstitution, OutlineItem, RenderConfig, TaskStatus};

#[derive(Parser, Debug)]
#[command(name = "pdf", author, version, about = "Inspect and rasterize PDF files", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print page count, document information, permissions and outline
    Info {
        file: PathBuf,

        /// User or owner password of an encrypted file
        #[arg(short = 'P', long)]
        password: Option<String>,
    },

    /// Render one page to a PNG file
    Render {
        file: PathBuf,

        /// 1-based page number
        #[arg(short, long, default_value_t = 1)]
        page: usize,

        /// Width of the image in pixels
        #[arg(short, long, default_value_t = 1024)]
        width: u32,

        /// Height of the image in pixels. Follows the page's aspect ratio when omitted
        #[arg(long)]
        height: Option<u32>,

        /// User or owner password of an encrypted file
        #[arg(short = 'P', long)]
        password: Option<String>,

        /// Directory of font programs to use for fonts that aren't embedded
        #[arg(long)]
        fonts: Option<PathBuf>,

        /// Disable anti-aliasing
        #[arg(long)]
        aliased: bool,

        /// Leave the background transparent instead of white
        #[arg(long)]
        transparent: bool,

        #[arg(short, long)]
        out: PathBuf,
    },
}

fn open(file: &Path, password: Option<&str>, config: RenderConfig) -> anyhow::Result<Document> {
    let bytes = fs::read(file).with_context(|| format!("reading {}", file.display()))?;

    Document::open_with_config(bytes, password.map(str::as_bytes), config)
        .with_context(|| format!("opening {}", file.display()))
}

fn print_outline(items: &[OutlineItem], depth: usize) {
    for item in items {
        match item.page {
            Some(page) => println!("{:indent$}{} (page {})", "", item.title, page, indent = depth * 2),
            None => println!("{:indent$}{}", "", item.title, indent = depth * 2),
        }

        print_outline(&item.children, depth + 1);
    }
}

fn info(file: PathBuf, password: Option<String>) -> anyhow::Result<()> {
    let doc = open(&file, password.as_deref(), RenderConfig::default())?;

    if let Some(version) = doc.version() {
        println!("Version: {}.{}", version.major, version.minor);
    }
    println!("Pages: {}", doc.page_count());
    println!("Encrypted: {}", if doc.is_encrypted() { "yes" } else { "no" });
    println!("Printable: {}", if doc.is_printable() { "yes" } else { "no" });
    println!("Saveable: {}", if doc.is_saveable() { "yes" } else { "no" });

    match doc.info() {
        Ok(info) => {
            for (key, value) in info.entries() {
                println!("{}: {}", key, value);
            }
        }
        Err(err) => log::warn!("unreadable /Info: {}", err),
    }

    match doc.outline() {
        Ok(outline) if !outline.is_empty() => {
            println!("Outline:");
            print_outline(&outline, 1);
        }
        Ok(..) => {}
        Err(err) => log::warn!("unreadable outline: {}", err),
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn render(
    file: PathBuf,
    page: usize,
    width: u32,
    height: Option<u32>,
    password: Option<String>,
    fonts: Option<PathBuf>,
    aliased: bool,
    transparent: bool,
    out: PathBuf,
) -> anyhow::Result<()> {
    let mut config = RenderConfig::default().with_anti_alias(!aliased);

    if let Some(fonts) = fonts {
        config = config.with_font_substitution(FontSubstitution::Directory(fonts));
    }

    let doc = open(&file, password.as_deref(), config)?;
    let page = doc.get_page(page, true)?;

    let (page_width, page_height) = page.object().display_size();
    let height = height.unwrap_or_else(|| {
        ((width as f32 * page_height / page_width.max(1.0)).round() as u32).max(1)
    });

    let diagnostics = page.diagnostics();
    log::debug!(
        "page {}: {} commands, {} unknown operators, {} failed operators, {} leftover operands",
        page.number(),
        page.commands().len(),
        diagnostics.unknown_operators(),
        diagnostics.failed_operators(),
        diagnostics.leftover_operands(),
    );

    let image = page.get_image(width, height, None, !transparent, true);

    if image.status() != TaskStatus::Completed {
        log::warn!("rendering ended early: {:?}", image.status());
    }

    let (replayed, failed) = image.progress();
    if failed > 0 {
        log::warn!("{} of {} drawing commands failed", failed, replayed);
    }

    let writer = BufWriter::new(
        fs::File::create(&out).with_context(|| format!("creating {}", out.display()))?,
    );
    image.pixmap().write_png(writer)?;

    log::info!("wrote {}x{} image to {}", width, height, out.display());

    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Command::Info { file, password } => info(file, password),
        Command::Render {
            file,
            page,
            width,
            height,
            password,
            fonts,
            aliased,
            transparent,
            out,
        } => render(
            file,
            page,
            width,
            height,
            password,
            fonts,
            aliased,
            transparent,
            out,
        ),
    }
}
