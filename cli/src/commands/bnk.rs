use anyhow::{Result, bail};
use bnk::DecodeOptions;
use bnk::process::{VerifyOutcome, bank_info, pack_bank, replace_media, unpack_bank, verify};
use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum BnkCommands {
    /// Show version, chunks and hierarchy object counts
    Info {
        /// Input BNK file
        input: PathBuf,
        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Unpack BNK file (Binary -> JSON + WEM extraction)
    Unpack {
        /// Input BNK file
        input: PathBuf,
        /// Output directory (optional, defaults to the input name)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Disable WEM extraction
        #[arg(long)]
        no_extract: bool,
    },
    /// Pack a BNK file from JSON and WEM files
    Pack {
        /// Input JSON file (generated by unpack)
        #[arg(short = 'j', long)]
        json: PathBuf,
        /// Directory containing WEM files
        #[arg(short = 'w', long)]
        wems: PathBuf,
        /// Output BNK file
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Decode and re-encode banks, comparing bytes
    Verify {
        /// BNK file or directory to scan
        path: PathBuf,
    },
    /// Replace one embedded WEM
    Replace {
        /// Input BNK file
        input: PathBuf,
        /// Source ID of the media to replace
        #[arg(short, long)]
        source: u32,
        /// Replacement WEM file
        #[arg(short, long)]
        wem: PathBuf,
        /// Output BNK file (optional, defaults to overwriting the input)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

pub fn handle(cmd: BnkCommands, options: &DecodeOptions) -> Result<()> {
    match cmd {
        BnkCommands::Info { input, json } => {
            let info = bank_info(&input, options)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&info)?);
                return Ok(());
            }
            println!("Version:  {}", info.version);
            println!("Bank ID:  {:#010x}", info.bank_id);
            println!("Language: {:#010x}", info.language_id);
            if let Some(platform) = &info.platform {
                println!("Platform: {}", platform);
            }
            println!("Media:    {}", info.media);
            println!("Chunks:");
            for chunk in &info.chunks {
                println!("  {} {:>10} bytes", chunk.tag, chunk.size);
            }
            println!("Objects:");
            for (name, count) in &info.objects {
                println!("  {:<20} {}", name, count);
            }
            Ok(())
        }
        BnkCommands::Unpack {
            input,
            output,
            no_extract,
        } => unpack_bank(&input, &output, no_extract, options),
        BnkCommands::Pack { json, wems, output } => pack_bank(&json, &wems, &output),
        BnkCommands::Verify { path } => {
            let report = verify(&path, options)?;
            for (file, outcome) in &report.files {
                match outcome {
                    VerifyOutcome::Identical => println!("OK       {:?}", file),
                    VerifyOutcome::Mismatch {
                        first_difference,
                        original_len,
                        encoded_len,
                    } => println!(
                        "MISMATCH {:?}: first difference at {:#x} ({} -> {} bytes)",
                        file, first_difference, original_len, encoded_len
                    ),
                    VerifyOutcome::Failed(e) => println!("FAILED   {:?}: {}", file, e),
                }
            }
            println!(
                "{} identical, {} mismatched, {} failed",
                report.identical(),
                report.mismatched(),
                report.failed()
            );
            if !report.is_clean() {
                bail!("{} banks did not round-trip", report.files.len() - report.identical());
            }
            Ok(())
        }
        BnkCommands::Replace {
            input,
            source,
            wem,
            output,
        } => replace_media(&input, source, &wem, &output, options),
    }
}
