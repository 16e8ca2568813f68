//! # utf-transcode CLI - Unicode file converter
//!
//! Command-line interface for converting files between UTF-8, UTF-16BE and
//! UTF-16LE, detecting their encoding and inspecting single code points.

#[cfg(feature = "cli")]
use std::fs;
#[cfg(feature = "cli")]
use std::io::{self, BufReader, BufWriter, Read, Write};
#[cfg(feature = "cli")]
use std::path::{Path, PathBuf};
#[cfg(feature = "cli")]
use std::time::Instant;

#[cfg(feature = "cli")]
use anyhow::{Context, Result};
#[cfg(feature = "cli")]
use clap::{Args, Parser, Subcommand, ValueEnum};
#[cfg(feature = "cli")]
use serde::Serialize;
#[cfg(feature = "cli")]
use tracing::{debug, info};

#[cfg(feature = "cli")]
use utf_transcode::detection::bom_length;
#[cfg(feature = "cli")]
use utf_transcode::{
    DetectionMethod, Encoding, EncodingDetector, StreamTranscoder, UTF8_BOM, utf8, utf16,
};

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI features disabled. Enable with --features cli");
    std::process::exit(1);
}

/// utf-transcode: UTF-8 / UTF-16 file converter
#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(name = "utf-transcode")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format (text, json)
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,
}

#[cfg(feature = "cli")]
#[derive(Subcommand)]
enum Commands {
    /// Convert a file between Unicode encodings
    Convert(ConvertArgs),

    /// Detect the encoding of a file
    Detect(DetectArgs),

    /// List supported encodings
    List(ListArgs),

    /// Display information about an encoding
    Info(InfoArgs),

    /// Show how one code point is encoded
    Encode(EncodeArgs),
}

#[cfg(feature = "cli")]
#[derive(Args)]
struct ConvertArgs {
    /// Source encoding, or "auto" to detect it
    #[arg(short = 'f', long = "from", default_value = "auto")]
    from: Encoding,

    /// Target encoding
    #[arg(short = 't', long = "to")]
    to: Encoding,

    /// Input file (stdin if not specified)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output file (stdout if not specified)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Do not write a byte-order-mark to the output
    #[arg(long)]
    no_bom: bool,

    /// Read and convert the input this many KB at a time
    #[arg(long, default_value = "64")]
    buffer_size: usize,
}

#[cfg(feature = "cli")]
#[derive(Args)]
struct DetectArgs {
    /// Input file (stdin if not specified)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Maximum bytes to read for detection
    #[arg(long, default_value = "8192")]
    sample_size: usize,
}

#[cfg(feature = "cli")]
#[derive(Args)]
struct ListArgs {
    /// Show encoding details
    #[arg(long)]
    details: bool,
}

#[cfg(feature = "cli")]
#[derive(Args)]
struct InfoArgs {
    /// Encoding to describe
    encoding: Encoding,
}

#[cfg(feature = "cli")]
#[derive(Args)]
struct EncodeArgs {
    /// Code point as U+1F600, 0x1F600 or decimal
    code_point: String,
}

#[cfg(feature = "cli")]
#[derive(Clone, Debug, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[cfg(feature = "cli")]
#[derive(Serialize)]
struct ConversionSummary {
    source_encoding: Encoding,
    target_encoding: Encoding,
    bom_stripped: usize,
    bom_written: bool,
    bytes_read: usize,
    bytes_written: usize,
    processing_time_ms: u64,
}

#[cfg(feature = "cli")]
#[derive(Serialize)]
struct DetectionReport {
    encoding: Encoding,
    method: DetectionMethod,
    bom_detected: bool,
    sample_size: usize,
}

#[cfg(feature = "cli")]
#[derive(Serialize)]
struct EncodingInfo {
    name: &'static str,
    code_unit_size: Option<usize>,
    bom: Option<String>,
    description: &'static str,
}

#[cfg(feature = "cli")]
#[derive(Serialize)]
struct CodePointReport {
    code_point: String,
    utf8: Vec<String>,
    utf16: Vec<String>,
}

#[cfg(feature = "cli")]
fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Convert(ref args) => convert_command(args, &cli)?,
        Commands::Detect(ref args) => detect_command(args, &cli)?,
        Commands::List(ref args) => list_command(args, &cli)?,
        Commands::Info(ref args) => info_command(args, &cli)?,
        Commands::Encode(ref args) => encode_command(args, &cli)?,
    }

    Ok(())
}

/// Send diagnostics to stderr; `--verbose` forces debug level
#[cfg(feature = "cli")]
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr).with_target(false))
        .with(filter)
        .init();
}

/// Open the input file, or stdin when none is given
#[cfg(feature = "cli")]
fn open_input(input: Option<&Path>) -> Result<Box<dyn Read>> {
    match input {
        Some(path) => {
            debug!(path = %path.display(), "reading input file");
            let file = fs::File::open(path)
                .with_context(|| format!("Failed to open input file: {}", path.display()))?;
            Ok(Box::new(BufReader::new(file)))
        }
        None => {
            debug!("reading from stdin");
            Ok(Box::new(io::stdin().lock()))
        }
    }
}

/// Refill `block` with up to `limit` bytes; it comes back short only at end of input
#[cfg(feature = "cli")]
fn read_block<R: Read>(reader: &mut R, limit: usize, block: &mut Vec<u8>) -> Result<usize> {
    block.clear();
    let limit = u64::try_from(limit).unwrap_or(u64::MAX);
    reader
        .by_ref()
        .take(limit)
        .read_to_end(block)
        .context("Failed to read input")
}

/// Write one converted chunk, preceded by the target BOM if it is still owed
#[cfg(feature = "cli")]
fn write_converted<W: Write>(
    writer: &mut W,
    pending_bom: &mut Option<&[u8]>,
    converted: &[u8],
) -> Result<usize> {
    if converted.is_empty() {
        return Ok(0);
    }

    let mut written = 0;
    if let Some(bom) = pending_bom.take() {
        writer.write_all(bom).context("Failed to write output")?;
        written += bom.len();
    }
    writer.write_all(converted).context("Failed to write output")?;
    Ok(written + converted.len())
}

/// Convert everything `reader` yields, one chunk in memory at a time
///
/// With [`Encoding::Any`] the source is detected from the first chunk. The
/// source BOM is dropped. The target BOM goes in front of the first converted
/// bytes, so an empty payload produces empty output, as `utf8::to_file` and
/// `utf16::to_file` do.
#[cfg(feature = "cli")]
fn convert_stream<R: Read, W: Write>(
    reader: &mut R,
    writer: &mut W,
    from: Encoding,
    to: Encoding,
    add_bom: bool,
    chunk_size: usize,
) -> Result<ConversionSummary> {
    let start_time = Instant::now();
    let chunk_size = chunk_size.max(1);

    // The first chunk must be able to hold the longest BOM
    let mut block = Vec::with_capacity(chunk_size.max(UTF8_BOM.len()));
    let mut bytes_read = read_block(reader, chunk_size.max(UTF8_BOM.len()), &mut block)?;

    let (source, bom_stripped) = match from {
        Encoding::Any => {
            let detected = EncodingDetector::new().detect(&block);
            info!(
                encoding = %detected.encoding,
                method = ?detected.method,
                "detected source encoding"
            );
            (detected.encoding, detected.bom_len)
        }
        known => (known, bom_length(&block, known)),
    };
    debug!(from = %source, to = %to, bom_stripped, chunk_size, "converting");

    let mut stream = StreamTranscoder::new(source, to)
        .with_context(|| format!("Failed to create transcoder from {} to {}", source, to))?;

    let mut pending_bom = to.bom().filter(|_| add_bom);
    let mut bytes_written =
        write_converted(writer, &mut pending_bom, &stream.push(&block[bom_stripped..]))?;

    loop {
        let read = read_block(reader, chunk_size, &mut block)?;
        if read == 0 {
            break;
        }
        bytes_read += read;
        bytes_written += write_converted(writer, &mut pending_bom, &stream.push(&block))?;
    }
    bytes_written += write_converted(writer, &mut pending_bom, &stream.finish())?;
    writer.flush().context("Failed to write output")?;

    let processing_time = start_time.elapsed();
    debug!(bytes_read, bytes_written, elapsed = ?processing_time, "conversion finished");

    Ok(ConversionSummary {
        source_encoding: source,
        target_encoding: to,
        bom_stripped,
        bom_written: add_bom && pending_bom.is_none(),
        bytes_read,
        bytes_written,
        processing_time_ms: u64::try_from(processing_time.as_millis()).unwrap_or(u64::MAX),
    })
}

#[cfg(feature = "cli")]
fn convert_command(args: &ConvertArgs, cli: &Cli) -> Result<()> {
    if !args.to.is_resolved() {
        anyhow::bail!("Target encoding must be one of UTF-8, UTF-16BE, UTF-16LE");
    }

    let mut reader = open_input(args.input.as_deref())?;
    let chunk_size = args.buffer_size.max(1) * 1024;

    let summary = match args.output {
        Some(ref output_path) => {
            let file = fs::File::create(output_path).with_context(|| {
                format!("Failed to create output file: {}", output_path.display())
            })?;
            let mut writer = BufWriter::new(file);
            let summary = convert_stream(
                &mut reader,
                &mut writer,
                args.from,
                args.to,
                !args.no_bom,
                chunk_size,
            )
            .with_context(|| format!("Failed to convert into {}", output_path.display()))?;
            debug!(path = %output_path.display(), "wrote output file");
            summary
        }
        None => {
            let mut writer = io::stdout().lock();
            convert_stream(
                &mut reader,
                &mut writer,
                args.from,
                args.to,
                !args.no_bom,
                chunk_size,
            )?
        }
    };

    match cli.format {
        OutputFormat::Json => {
            let report = serde_json::to_string_pretty(&summary)?;
            // Keep stdout for the converted data when no output file is given
            if args.output.is_some() {
                println!("{report}");
            } else {
                eprintln!("{report}");
            }
        }
        OutputFormat::Text => {
            if cli.verbose {
                eprintln!(
                    "✓ Converted {} -> {}",
                    summary.source_encoding, summary.target_encoding
                );
            }
        }
    }

    Ok(())
}

#[cfg(feature = "cli")]
fn detect_command(args: &DetectArgs, cli: &Cli) -> Result<()> {
    let mut sample_data = Vec::with_capacity(args.sample_size);
    let limit = u64::try_from(args.sample_size).unwrap_or(u64::MAX);
    match args.input {
        Some(ref input_path) => {
            let file = fs::File::open(input_path)
                .with_context(|| format!("Failed to open input file: {}", input_path.display()))?;
            file.take(limit)
                .read_to_end(&mut sample_data)
                .with_context(|| format!("Failed to read input file: {}", input_path.display()))?;
        }
        None => {
            io::stdin()
                .take(limit)
                .read_to_end(&mut sample_data)
                .context("Failed to read from stdin")?;
        }
    }

    let detection = EncodingDetector::with_sample_size(args.sample_size).detect(&sample_data);
    debug!(?detection, "detection finished");

    match cli.format {
        OutputFormat::Json => {
            let report = DetectionReport {
                encoding: detection.encoding,
                method: detection.method,
                bom_detected: detection.bom_detected(),
                sample_size: sample_data.len(),
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Text => {
            println!("Detected encoding: {}", detection.encoding);
            println!("Method: {}", describe_method(detection.method));
            if detection.bom_detected() {
                println!("BOM detected: Yes ({} bytes)", detection.bom_len);
            }
            println!("Sample size: {} bytes", sample_data.len());
        }
    }

    Ok(())
}

#[cfg(feature = "cli")]
fn describe_method(method: DetectionMethod) -> &'static str {
    match method {
        DetectionMethod::ByteOrderMark => "byte-order-mark",
        DetectionMethod::NewlineAdjacency => "zero byte next to a newline",
        DetectionMethod::ZeroByteParity => "zero bytes at even/odd positions",
        DetectionMethod::Default => "no zero bytes, assumed UTF-8",
    }
}

#[cfg(feature = "cli")]
const SUPPORTED: [Encoding; 3] = [Encoding::Utf8, Encoding::Utf16BE, Encoding::Utf16LE];

#[cfg(feature = "cli")]
fn encoding_info(encoding: Encoding) -> EncodingInfo {
    EncodingInfo {
        name: encoding.name(),
        code_unit_size: encoding.code_unit_size(),
        bom: encoding.bom().map(|bom| format!("{bom:02X?}")),
        description: get_encoding_description(encoding),
    }
}

#[cfg(feature = "cli")]
fn list_command(args: &ListArgs, cli: &Cli) -> Result<()> {
    match cli.format {
        OutputFormat::Json => {
            let infos: Vec<_> = SUPPORTED.into_iter().map(encoding_info).collect();
            println!("{}", serde_json::to_string_pretty(&infos)?);
        }
        OutputFormat::Text => {
            println!("Supported Encodings ({} total):", SUPPORTED.len());
            println!();

            for encoding in SUPPORTED {
                println!("{:10} {}", encoding.name(), get_encoding_description(encoding));

                if args.details {
                    if let Some(size) = encoding.code_unit_size() {
                        println!("           Code unit: {size} byte(s)");
                    }
                    if let Some(bom) = encoding.bom() {
                        println!("           BOM: {bom:02X?}");
                    }
                    println!();
                }
            }
        }
    }

    Ok(())
}

#[cfg(feature = "cli")]
fn info_command(args: &InfoArgs, cli: &Cli) -> Result<()> {
    let info = encoding_info(args.encoding);

    match cli.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
        OutputFormat::Text => {
            println!("Encoding Information: {}", info.name);
            println!("Description: {}", info.description);
            match info.code_unit_size {
                Some(size) => println!("Code unit: {size} byte(s)"),
                None => println!("Code unit: decided by detection"),
            }
            println!("BOM: {}", info.bom.as_deref().unwrap_or("None"));
        }
    }

    Ok(())
}

#[cfg(feature = "cli")]
fn get_encoding_description(encoding: Encoding) -> &'static str {
    match encoding {
        Encoding::Any => "Detected from byte-order-mark or zero-byte layout",
        Encoding::Utf8 => "Unicode Transformation Format 8-bit, 1-4 bytes per code point",
        Encoding::Utf16BE => "Unicode Transformation Format 16-bit, big-endian",
        Encoding::Utf16LE => "Unicode Transformation Format 16-bit, little-endian",
    }
}

/// Parse `U+1F600`, `0x1F600` or `128512`
#[cfg(feature = "cli")]
fn parse_code_point(text: &str) -> Result<u32> {
    let text = text.trim();
    let hex = text
        .strip_prefix("U+")
        .or_else(|| text.strip_prefix("u+"))
        .or_else(|| text.strip_prefix("0x"))
        .or_else(|| text.strip_prefix("0X"));

    let value = match hex {
        Some(digits) => u32::from_str_radix(digits, 16),
        None => text.parse(),
    };
    let code_point = value.with_context(|| format!("Invalid code point: {text}"))?;
    if code_point > 0x10FFFF {
        anyhow::bail!("Code point out of range: {text} (maximum is U+10FFFF)");
    }
    Ok(code_point)
}

#[cfg(feature = "cli")]
fn encode_command(args: &EncodeArgs, cli: &Cli) -> Result<()> {
    let code_point = parse_code_point(&args.code_point)?;

    let mut utf8_bytes = [0u8; utf8::MAX_SEQUENCE_LEN];
    let utf8_len = utf8::encode(code_point, &mut utf8_bytes);
    let mut utf16_units = [0u16; utf16::MAX_SEQUENCE_LEN];
    let utf16_len = utf16::encode(code_point, &mut utf16_units);

    let report = CodePointReport {
        code_point: format!("U+{code_point:04X}"),
        utf8: utf8_bytes[..utf8_len].iter().map(|b| format!("{b:02X}")).collect(),
        utf16: utf16_units[..utf16_len].iter().map(|u| format!("{u:04X}")).collect(),
    };

    match cli.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Text => {
            println!("Code point: {}", report.code_point);
            println!("UTF-8:  {}", report.utf8.join(" "));
            println!("UTF-16: {}", report.utf16.join(" "));
            if (0xD800..=0xDFFF).contains(&code_point) {
                println!("Note: surrogate code points are written to UTF-16 as U+FFFD");
            }
        }
    }

    Ok(())
}
