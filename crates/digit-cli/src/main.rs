use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use digit::{DeviceDirectory, Digit, StreamPreset};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "digit", about = "DIGIT tactile sensor utility")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List attached DIGIT devices
    List {
        /// Emit machine-readable JSON
        #[arg(long)]
        json: bool,
    },
    /// Connect to a sensor and print its status
    Info {
        /// DIGIT serial number
        serial: String,
    },
    /// Capture one frame and save it
    Save {
        /// DIGIT serial number
        serial: String,
        /// Output image path (extension selects the format)
        path: PathBuf,
        /// Stream preset: vga or qvga
        #[arg(long, default_value = "qvga")]
        preset: StreamPreset,
        /// Frame rate; defaults to the preset's higher rate
        #[arg(long)]
        fps: Option<u32>,
    },
    /// Set LED illumination
    Led {
        /// DIGIT serial number
        serial: String,
        /// Uniform level, clamped to 0-15
        #[arg(long, conflicts_with = "rgb")]
        level: Option<i32>,
        /// Per-channel values, each 0-15
        #[arg(long, num_args = 3, value_names = ["R", "G", "B"])]
        rgb: Option<Vec<u8>>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::List { json } => {
            let devices = DeviceDirectory::new().list_devices();
            if json {
                println!("{}", serde_json::to_string_pretty(&devices)?);
            } else if devices.is_empty() {
                println!("No DIGIT devices attached");
            } else {
                for d in &devices {
                    println!(
                        "{}\t{}\trev {}\t{}",
                        d.serial, d.device_path, d.revision, d.manufacturer
                    );
                }
            }
        }
        Commands::Info { serial } => {
            let mut sensor = Digit::new(&serial, None)?;
            sensor.connect()?;
            println!("{}", sensor.info());
            sensor.disconnect();
        }
        Commands::Save {
            serial,
            path,
            preset,
            fps,
        } => {
            let fps = fps.unwrap_or(preset.default_fps());
            if !preset.supports_fps(fps) {
                bail!("{preset} supports {:?} fps, not {fps}", preset.frame_rates());
            }
            let mut sensor = Digit::new(&serial, None)?;
            sensor.connect()?;
            sensor.set_resolution(preset)?;
            sensor.set_fps(fps)?;
            sensor
                .save_frame(&path)
                .with_context(|| format!("saving frame to {}", path.display()))?;
            println!("Saved frame to {}", path.display());
            sensor.disconnect();
        }
        Commands::Led { serial, level, rgb } => {
            let mut sensor = Digit::new(&serial, None)?;
            sensor.connect()?;
            if let Some(rgb) = rgb {
                let composite = sensor.set_intensity_rgb(rgb[0], rgb[1], rgb[2])?;
                println!("LED composite set to {composite:#05x}");
            } else if let Some(level) = level {
                let applied = sensor.set_intensity(level)?;
                println!("LED level set to {applied}");
            } else {
                bail!("specify --level or --rgb");
            }
            sensor.disconnect();
        }
    }

    Ok(())
}
