//! jxrinfo - inspect and decode JPEG-XR images with jxrlib.

use clap::{Parser, Subcommand};
use std::fs::{self, File};
use std::io::BufReader;
use std::path::PathBuf;

use jpegxr_rs::jxrlib::Jxrlib;
use jpegxr_rs::{DecodeSession, FormatId, PixelFormat, PixelFormatDescriptor};

/// Inspect and decode JPEG-XR images
#[derive(Parser)]
#[command(name = "jxrinfo")]
#[command(version)]
#[command(about = "Inspect and decode JPEG-XR (.jxr, .wdp, .hdp) images", long_about = None)]
#[command(after_help = "EXAMPLES:
    jxrinfo info -i screenshot.jxr
    jxrinfo decode -i screenshot.jxr -o pixels.raw
    jxrinfo format 6fddc324-4e03-4bfe-b185-3d77768dc90d
    jxrinfo format 32bppPBGRA")]
struct Cli {
    /// Log codec calls to stderr (repeat for more detail)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show dimensions, resolution and pixel format
    #[command(visible_alias = "i")]
    Info {
        /// Input JPEG-XR file
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Decode to raw pixels in the image's native pixel format
    #[command(visible_alias = "d")]
    Decode {
        /// Input JPEG-XR file
        #[arg(short, long)]
        input: PathBuf,

        /// Output file for raw pixel rows
        #[arg(short, long)]
        output: PathBuf,

        /// Row stride in bytes (defaults to the packed row size)
        #[arg(short, long)]
        stride: Option<usize>,
    },

    /// Describe a pixel format by GUID or name
    #[command(visible_alias = "f")]
    Format {
        /// GUID such as 6fddc324-4e03-4bfe-b185-3d77768dc90d, or a name such as 24bppRGB
        format: String,
    },
}

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Info { input } => show_info(&input),
        Commands::Decode {
            input,
            output,
            stride,
        } => decode_image(&input, &output, stride),
        Commands::Format { format } => show_format(&format),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn show_info(input: &PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let file = File::open(input)?;
    let len = file.metadata()?.len();
    let session = DecodeSession::with_reader(&Jxrlib, BufReader::new(file))?;

    let (width, height) = session.size()?;
    let (dpi_x, dpi_y) = session.resolution()?;
    let format = session.pixel_format()?;

    println!("File:        {:?}", input);
    println!("Size:        {} bytes", len);
    println!("Dimensions:  {}x{}", width, height);
    println!("Resolution:  {:.1} x {:.1} DPI", dpi_x, dpi_y);
    print_format(&format);
    Ok(())
}

fn decode_image(
    input: &PathBuf,
    output: &PathBuf,
    stride: Option<usize>,
) -> Result<(), Box<dyn std::error::Error>> {
    let file = BufReader::new(File::open(input)?);
    let mut session = DecodeSession::with_reader(&Jxrlib, file)?;

    let (width, height, pixels) = match stride {
        None => {
            let image = session.decode_all()?;
            (image.width as i32, image.height as i32, image.pixels)
        }
        Some(stride) => {
            let (width, height) = session.size()?;
            let len = stride
                .checked_mul(height.max(0) as usize)
                .ok_or(jpegxr_rs::JxrError::SizeOverflow)?;
            let mut pixels = vec![0u8; len];
            session.copy_all(&mut pixels, stride)?;
            (width, height, pixels)
        }
    };

    fs::write(output, &pixels)?;
    println!(
        "✓ Decoded {}x{} image ({} bytes) to {:?}",
        width,
        height,
        pixels.len(),
        output
    );
    Ok(())
}

fn show_format(format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let id = match format.parse::<PixelFormat>() {
        Ok(known) => known.format_id(),
        Err(_) => format.parse::<FormatId>()?,
    };
    let format = PixelFormatDescriptor::resolve(&Jxrlib, &id)?;
    print_format(&format);
    Ok(())
}

fn print_format(format: &PixelFormatDescriptor) {
    let named =
        |name: Result<String, jpegxr_rs::JxrError>| name.unwrap_or_else(|_| "unknown".into());

    match format.known_format() {
        Some(known) => println!("Pixel format: {} ({})", known, format.format()),
        None => println!("Pixel format: {}", format.format()),
    }
    println!("  Channels:           {}", format.channels());
    println!(
        "  Color format:       {} ({})",
        named(format.color_format().map(|c| c.to_string())),
        format.color_format_code()
    );
    println!(
        "  Bit depth:          {} ({})",
        named(format.bit_depth().map(|b| b.to_string())),
        format.bit_depth_code()
    );
    println!("  Bits per pixel:     {}", format.bits_per_pixel());
    println!("  Samples per pixel:  {}", format.samples_per_pixel());
    println!(
        "  Interpretation:     {} ({})",
        named(format.photometric_interpretation().map(|p| p.to_string())),
        format.photometric_interpretation_code()
    );
    println!("  Alpha:              {}", yes_no(format.has_alpha()));
    println!("  Premultiplied:      {}", yes_no(format.premultiplied_alpha()));
    println!("  BGR order:          {}", yes_no(format.is_bgr()));
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}
