//! pngcarrier command-line tool.
//!
//! Embeds arbitrary files in generated PNG images, extracts them again, and
//! batch-converts directories of media segments.

use anyhow::{Context, Result};
use bytes::Bytes;
use carrier_codec::{Cover, CoverMode, Decoder, DecoderConfig, Encoder};
use carrier_wire::{ChunkReader, TextEntry};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod logging;
mod segments;

use config::CarrierConfig;
use logging::CarrierLogFormatter;
use segments::PackOptions;

/// Hide files inside ordinary-looking PNG images
#[derive(Parser, Debug)]
#[command(name = "pngcarrier", version, about = "Embed payloads in PNG containers")]
struct Args {
    /// Configuration file path
    #[arg(long, global = true, default_value = "carrier.yaml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Embed a file in a new PNG
    Encode {
        /// File to embed
        input: PathBuf,

        /// Output path, defaults to `<input>.png`
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Cover seed; random when omitted
        #[arg(long, conflicts_with = "blank")]
        seed: Option<String>,

        /// Use a 1x1 transparent cover instead of a pattern
        #[arg(long)]
        blank: bool,

        /// Keyword prefix for payload entries
        #[arg(long)]
        prefix: Option<String>,

        /// Maximum base64 characters per part
        #[arg(long)]
        part_size: Option<usize>,

        /// zlib level, 0-9
        #[arg(long)]
        level: Option<u32>,
    },

    /// Extract the payload from a PNG
    Decode {
        /// Carrier image
        input: PathBuf,

        /// Output path, defaults to the input with a `.bin` extension
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Keyword prefix to collect
        #[arg(long)]
        prefix: Option<String>,

        /// Accept chunks with bad CRCs
        #[arg(long)]
        no_verify_crc: bool,
    },

    /// Write a payload-free cover image
    Cover {
        /// Cover seed
        #[arg(long)]
        seed: String,

        /// Output path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// List the chunks and text entries of a PNG
    Inspect {
        /// Image to inspect
        input: PathBuf,
    },

    /// Convert every seg_NNNNN.ts in a directory into carrier PNGs
    Pack {
        /// Segment directory
        dir: PathBuf,

        /// Output name prefix, defaults to the directory name
        #[arg(long)]
        name: Option<String>,

        /// Leave the .ts sources in place
        #[arg(long)]
        keep_source: bool,
    },

    /// Restore seg_NNNNN.ts files from carrier PNGs in a directory
    Unpack {
        /// Directory of carrier images
        dir: PathBuf,

        /// Keyword prefix to collect
        #[arg(long)]
        prefix: Option<String>,
    },
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    let env_filter = EnvFilter::new("warn")
        .add_directive(format!("pngcarrier={}", args.log_level).parse()?)
        .add_directive(format!("carrier_codec={}", args.log_level).parse()?)
        .add_directive(format!("carrier_wire={}", args.log_level).parse()?);

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .event_format(CarrierLogFormatter::new("pngcarrier"))
        .init();

    info!("Starting pngcarrier v{}", env!("CARGO_PKG_VERSION"));

    let mut config = CarrierConfig::load_from_file(&args.config)?;

    match args.command {
        Command::Encode {
            input,
            output,
            seed,
            blank,
            prefix,
            part_size,
            level,
        } => {
            if let Some(prefix) = prefix {
                config.codec.prefix = prefix;
            }
            if let Some(part_size) = part_size {
                config.codec.part_size = part_size;
            }
            if let Some(level) = level {
                config.codec.compression_level = level;
            }
            let mut encoder_config = config.encoder_config();
            if blank {
                encoder_config.cover = CoverMode::Blank;
            }
            let encoder = Encoder::new(encoder_config)?;
            let output = output.unwrap_or_else(|| append_extension(&input, "png"));
            encode_file(&encoder, &input, &output, seed).await
        }
        Command::Decode {
            input,
            output,
            prefix,
            no_verify_crc,
        } => {
            if no_verify_crc {
                config.codec.verify_crc = false;
            }
            let prefix = prefix.unwrap_or_else(|| config.codec.prefix.clone());
            let decoder = Decoder::new(config.decoder_config());
            let output = output.unwrap_or_else(|| input.with_extension("bin"));
            decode_file(&decoder, &input, &output, &prefix).await
        }
        Command::Cover { seed, output } => {
            let level = config.codec.compression_level;
            let container =
                tokio::task::spawn_blocking(move || Cover::generate(&seed).to_container(level))
                    .await??;
            write_output(&output, &container).await?;
            crate::component_info!(
                "cover",
                "Wrote {} ({} bytes)",
                output.display(),
                container.len()
            );
            Ok(())
        }
        Command::Inspect { input } => inspect_file(&input, config.codec.verify_crc)
            .await
            .map(|_| ()),
        Command::Pack {
            dir,
            name,
            keep_source,
        } => {
            let encoder = Encoder::new(config.encoder_config())?;
            let options = PackOptions {
                name,
                keep_source: keep_source || config.pack.keep_source,
                manifest: config.pack.manifest.clone(),
            };
            segments::pack(&dir, &encoder, &options).await.map(|_| ())
        }
        Command::Unpack { dir, prefix } => {
            let prefix = prefix.unwrap_or_else(|| config.codec.prefix.clone());
            let decoder = Decoder::new(config.decoder_config());
            segments::unpack(&dir, &decoder, &prefix).await.map(|_| ())
        }
    }
}

/// `name.ext` -> `name.ext.png`
fn append_extension(path: &Path, ext: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".");
    name.push(ext);
    PathBuf::from(name)
}

async fn read_input(path: &Path) -> Result<Bytes> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    Ok(Bytes::from(bytes))
}

async fn write_output(path: &Path, bytes: &[u8]) -> Result<()> {
    tokio::fs::write(path, bytes)
        .await
        .with_context(|| format!("failed to write {}", path.display()))
}

async fn encode_file(
    encoder: &Encoder,
    input: &Path,
    output: &Path,
    seed: Option<String>,
) -> Result<()> {
    let payload = read_input(input).await?;
    let worker = encoder.clone();
    let (container, report) =
        tokio::task::spawn_blocking(move || worker.encode_report(&payload, seed.as_deref()))
            .await?
            .with_context(|| format!("failed to encode {}", input.display()))?;

    write_output(output, &container).await?;
    crate::component_info!(
        "encode",
        parts = report.parts,
        seed = report.seed.as_deref().unwrap_or("-"),
        "Wrote {} ({} bytes)",
        output.display(),
        report.container_len
    );
    Ok(())
}

async fn decode_file(decoder: &Decoder, input: &Path, output: &Path, prefix: &str) -> Result<()> {
    let container = read_input(input).await?;
    let worker = decoder.clone();
    let owned_prefix = prefix.to_string();
    let payload = tokio::task::spawn_blocking(move || worker.decode(&container, &owned_prefix))
        .await?
        .with_context(|| format!("failed to decode {}", input.display()))?;

    write_output(output, &payload).await?;
    crate::component_info!(
        "decode",
        "Wrote {} ({} bytes)",
        output.display(),
        payload.len()
    );
    Ok(())
}

async fn inspect_file(input: &Path, verify_crc: bool) -> Result<Vec<TextEntry>> {
    let container = read_input(input).await?;
    let reader = ChunkReader::new(&container)
        .with_context(|| format!("{} is not a PNG", input.display()))?;

    let mut total = 0usize;
    // CRC mismatches are reported per chunk rather than aborting the walk
    for chunk in reader.verify_crc(false) {
        let chunk = chunk.with_context(|| format!("failed to walk {}", input.display()))?;
        total += 1;

        let crc = if chunk.crc_ok() {
            "ok"
        } else if verify_crc {
            "MISMATCH"
        } else {
            "mismatch (ignored)"
        };
        crate::component_info!(
            "inspect",
            offset = chunk.offset,
            length = chunk.data.len(),
            crc,
            "{}",
            chunk.chunk_type
        );
    }

    let lenient = Decoder::new(DecoderConfig {
        verify_crc: false,
        ..DecoderConfig::default()
    });
    let entries = match lenient.entries(&container) {
        Ok(entries) => entries,
        Err(e) => {
            crate::component_warn!("inspect", "iTXt entries unreadable: {}", e);
            Vec::new()
        }
    };

    for entry in &entries {
        crate::component_info!(
            "inspect",
            compressed = entry.compressed,
            method = entry.compression_method,
            text_len = entry.text.len(),
            "iTXt {:?}",
            entry.keyword
        );
    }

    crate::component_info!(
        "inspect",
        "{} chunks, {} text entries in {}",
        total,
        entries.len(),
        input.display()
    );
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parse() {
        let args = Args::try_parse_from([
            "pngcarrier",
            "--log-level",
            "debug",
            "encode",
            "in.ts",
            "-o",
            "out.png",
            "--seed",
            "abc",
        ])
        .unwrap();
        assert_eq!(args.log_level, "debug");
        assert_eq!(args.config, PathBuf::from("carrier.yaml"));
        assert!(matches!(
            args.command,
            Command::Encode { ref seed, blank: false, .. } if seed.as_deref() == Some("abc")
        ));

        let args =
            Args::try_parse_from(["pngcarrier", "pack", "segments", "--keep-source"]).unwrap();
        assert!(matches!(args.command, Command::Pack { keep_source: true, name: None, .. }));
    }

    #[test]
    fn test_seed_conflicts_with_blank() {
        let parsed = Args::try_parse_from(["pngcarrier", "encode", "x", "--seed", "s", "--blank"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_default_output_names() {
        assert_eq!(
            append_extension(Path::new("dir/clip.ts"), "png"),
            PathBuf::from("dir/clip.ts.png")
        );
        assert_eq!(
            Path::new("dir/clip.ts.png").with_extension("bin"),
            PathBuf::from("dir/clip.ts.bin")
        );
    }

    #[tokio::test]
    async fn test_encode_decode_files() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("clip.ts");
        let image = dir.path().join("clip.png");
        let restored = dir.path().join("clip.out");
        std::fs::write(&input, b"file contents").unwrap();

        encode_file(&Encoder::default(), &input, &image, Some("fixed".to_string()))
            .await
            .unwrap();
        decode_file(&Decoder::default(), &image, &restored, "payload-")
            .await
            .unwrap();
        assert_eq!(std::fs::read(&restored).unwrap(), b"file contents");

        let entries = inspect_file(&image, true).await.unwrap();
        let keywords: Vec<_> = entries.iter().map(|e| e.keyword.as_str()).collect();
        assert_eq!(keywords, vec!["payload-0001"]);
        assert!(entries[0].compressed);
    }

    #[tokio::test]
    async fn test_decode_rejects_plain_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("plain.txt");
        std::fs::write(&input, b"hello").unwrap();

        let err = decode_file(&Decoder::default(), &input, &dir.path().join("o"), "payload-")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("failed to decode"));
        assert!(inspect_file(&input, true).await.is_err());
    }
}
