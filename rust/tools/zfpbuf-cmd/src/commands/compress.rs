//! Compress command implementation

use anyhow::{Context, Result};
use clap::Args;
use zfpbuf::{ArrayBuffer, CompressOptions, ScalarType, ZfpCodec};

use crate::{commands::write_output, utils};

#[derive(Args, Debug)]
pub struct CompressArgs {
    /// Raw array file, native endian, x varying fastest
    #[arg(short, long)]
    pub input: String,

    /// Destination for the ZFP stream
    #[arg(short, long)]
    pub output: String,

    /// Scalar type: i32, i64, f32 or f64
    #[arg(short = 't', long = "type")]
    pub scalar_type: ScalarType,

    /// Extents, comma separated (nx[,ny[,nz[,nw]]])
    #[arg(long, value_delimiter = ',', required = true)]
    pub shape: Vec<usize>,

    /// Element strides, comma separated; 0 means contiguous along that axis
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub stride: Vec<isize>,

    /// Absolute error tolerance (fixed-accuracy mode)
    #[arg(long)]
    pub tolerance: Option<f64>,

    /// Bits per value (fixed-rate mode)
    #[arg(long)]
    pub rate: Option<f64>,

    /// Bit planes to keep (fixed-precision mode)
    #[arg(long)]
    pub precision: Option<u32>,

    /// JSON file with compression options; flags override its values
    #[arg(long)]
    pub options: Option<String>,
}

pub fn run(args: CompressArgs) -> Result<()> {
    let options = resolve_options(&args)?;
    let raw = utils::read_input(&args.input)?;

    let mut input = ArrayBuffer::new();
    input
        .load_bytes(args.scalar_type, &raw, &args.shape, &args.stride)
        .with_context(|| format!("Invalid array in {}", args.input))?;

    let mut output = ArrayBuffer::new();
    let len = zfpbuf::compress(&ZfpCodec, &mut output, &input, &options)
        .with_context(|| format!("Failed to compress {}", args.input))?;
    write_output(&args.output, &output.storage()[..len])?;

    println!(
        "Compressed {} ({}) into {} ({}, {}, ratio {:.2})",
        args.input,
        utils::format_size(input.size() as u64),
        args.output,
        utils::format_size(len as u64),
        options.mode().name(),
        input.size() as f64 / len as f64
    );
    Ok(())
}

/// Loads the options file, if any, and applies the command-line overrides.
pub fn resolve_options(args: &CompressArgs) -> Result<CompressOptions> {
    let mut options = match &args.options {
        Some(path) => {
            let json = utils::read_input(path)?;
            serde_json::from_slice::<CompressOptions>(&json)
                .with_context(|| format!("Failed to parse options file: {}", path))?
        }
        None => CompressOptions::reversible(),
    };
    if let Some(tolerance) = args.tolerance {
        options.tolerance = Some(tolerance);
    }
    if let Some(rate) = args.rate {
        options.rate = Some(rate);
    }
    if let Some(precision) = args.precision {
        options.precision = Some(precision);
    }
    log::debug!("compression options: {options:?} -> {:?}", options.mode());
    Ok(options)
}
