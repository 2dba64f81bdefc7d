use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use serde::Serialize;
use tokio::signal;

use wavplay::audio::{self, playback, PcmDescriptor, PcmStream, Playback, SampleEncoding};
use wavplay::Config;

/// Play a PCM WAV file through an audio output device
#[derive(Parser, Debug)]
#[command(name = "wavplay", version)]
#[command(about = "Stream a PCM WAV file to an audio device, converting to its format", long_about = None)]
struct Args {
    /// WAV file to play
    file: PathBuf,

    /// TOML settings file
    #[arg(short, long, env = "WAVPLAY_CONFIG_FILE")]
    config: Option<PathBuf>,

    /// Output device ("null", "memory", or an ALSA PCM name)
    #[arg(short, long)]
    device: Option<String>,

    /// Channel count to request from the device
    #[arg(long)]
    channels: Option<u16>,

    /// Bits per sample to request from the device
    #[arg(long)]
    bits: Option<u16>,

    /// Request IEEE float samples
    #[arg(long, conflicts_with = "int")]
    float: bool,

    /// Request integer samples
    #[arg(long)]
    int: bool,

    /// Frames per device request
    #[arg(long)]
    period: Option<usize>,

    /// Print the stream description and exit
    #[arg(long)]
    info: bool,

    /// Print the stream description as JSON
    #[arg(long)]
    json: bool,
}

impl Args {
    fn apply(&self, config: &mut Config) {
        if let Some(device) = &self.device {
            config.playback_device = device.clone();
        }
        if let Some(channels) = self.channels {
            config.output_channels = channels;
        }
        if let Some(bits) = self.bits {
            config.output_bits = bits;
        }
        if let Some(period) = self.period {
            config.period_size = period;
        }
        if self.float {
            config.output_encoding = SampleEncoding::Float;
        } else if self.int {
            config.output_encoding = if config.output_bits == 8 {
                SampleEncoding::UnsignedInt
            } else {
                SampleEncoding::SignedInt
            };
        }
    }
}

#[derive(Serialize)]
struct StreamInfo<'a> {
    descriptor: &'a PcmDescriptor,
    data_size: usize,
    frames: usize,
    duration_secs: f64,
}

fn print_info(stream: &PcmStream, json: bool) -> anyhow::Result<()> {
    let d = stream.descriptor();
    if json {
        let info = StreamInfo {
            descriptor: d,
            data_size: stream.data_len(),
            frames: stream.frame_count(),
            duration_secs: stream.duration().as_secs_f64(),
        };
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    let layout = match d.channels {
        1 => "Mono",
        2 => "Stereo",
        _ => "Multichannel",
    };
    println!("WAV Info:");
    println!("  Sample Rate: {} Hz", d.sample_rate);
    println!("  Channels: {} ({})", d.channels, layout);
    println!("  Bits per Sample: {} ({})", d.bits_per_sample, d.encoding);
    println!("  Byte Rate: {} bytes/s", d.byte_rate);
    println!("  Block Align: {} bytes", d.block_align);
    println!("  Data Size: {} bytes", stream.data_len());
    println!("  Duration: {:.2} seconds", stream.duration().as_secs_f64());
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志
    env_logger::init();

    let args = Args::parse();

    let mut config = Config::load(args.config.as_deref()).context("Failed to load configuration")?;
    args.apply(&mut config);
    log::debug!("Config: {:?}", config);

    let bytes = tokio::fs::read(&args.file)
        .await
        .with_context(|| format!("Cannot open {}", args.file.display()))?;
    let stream = audio::open_stream(&bytes)
        .with_context(|| format!("{} is not a playable WAV file", args.file.display()))?;
    drop(bytes);

    print_info(&stream, args.json)?;
    if args.info {
        return Ok(());
    }

    let mut device = audio::open_device(&config.playback_device, config.period_size)?;
    let requested = config.requested_format(stream.descriptor().sample_rate);
    let duration = stream.duration();

    let feeder = playback::prepare(stream, device.as_mut(), &requested)
        .context("Failed to configure the output device")?;
    println!("Output: {} on \"{}\"", feeder.destination(), device.name());
    println!("Expected duration: {:.2} seconds", duration.as_secs_f64());

    println!("Playing audio...");
    let playback = Playback::start(feeder, device)?;
    let observer = playback.observer().clone();

    let mut ticker = tokio::time::interval(Duration::from_millis(config.poll_interval_ms.max(1)));
    let ctrl_c = signal::ctrl_c();
    tokio::pin!(ctrl_c);

    // 轮询播放进度，直到播放线程退出或者用户中断
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if playback.is_finished() {
                    break;
                }
                log::debug!(
                    "Progress: {}/{} bytes ({:.0}%)",
                    observer.position(),
                    observer.len(),
                    observer.progress() * 100.0
                );
            }
            _ = &mut ctrl_c => {
                println!("Stopping playback...");
                playback.stop();
                break;
            }
        }
    }

    let report = tokio::task::spawn_blocking(move || playback.wait()).await??;
    if report.completed {
        println!("Playback finished");
    } else {
        println!("Playback stopped after {} frames", report.frames);
    }
    Ok(())
}
