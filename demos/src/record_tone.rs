//! Record a stereo test tone to a WAV file on the host.
//!
//! A producer thread plays the part of the audio update ISR: it delivers a
//! 128-sample block per channel every 2.9 ms into a `static` record queue.
//! The main thread plays the storage task, polling `process()` and writing
//! 512-byte blocks. `--stall-ms` makes the storage task pause now and then,
//! like a slow SD card, to show drops being counted instead of blocking.
//!
//! ```text
//!   producer thread ──update()──► RecordQueue ──process()──► TONE.WAV
//! ```

use std::f32::consts::TAU;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use teensy_record_wav::clock::StdClock;
use teensy_record_wav::config::RecorderConfig;
use teensy_record_wav::constants::{
    AUDIO_BLOCK_SAMPLES, AUDIO_RECORD_SAMPLE_RATE, AUDIO_SAMPLE_RATE_EXACT, DEFAULT_QUEUE_BLOCKS,
};
use teensy_record_wav::io::{RecordQueue, RecordQueueStereo, WavRecorder};
use teensy_record_wav::storage::DirVolume;

static QUEUE: RecordQueueStereo<DEFAULT_QUEUE_BLOCKS> = RecordQueue::new();
static PRODUCING: AtomicBool = AtomicBool::new(false);

#[derive(Parser)]
#[command(name = "record_tone")]
#[command(about = "Record a stereo sine tone through the lock-free WAV recorder")]
struct Args {
    /// Directory to write the file into
    #[arg(short, long, default_value = ".")]
    out_dir: PathBuf,

    /// Output file name
    #[arg(short, long, default_value = "TONE.WAV")]
    name: String,

    /// Recording length in seconds
    #[arg(short, long, default_value = "2.0")]
    seconds: f32,

    /// Left channel frequency in Hz (right is a fifth above)
    #[arg(short, long, default_value = "440.0")]
    frequency: f32,

    /// Pause the storage task this long every 250 ms (0 = never)
    #[arg(long, default_value = "0")]
    stall_ms: u64,

    /// Withhold the right channel block every N ticks (0 = never)
    #[arg(long, default_value = "0")]
    partial_every: u32,
}

/// Sine oscillator producing one block per call.
struct Tone {
    phase: f32,
    step: f32,
}

impl Tone {
    fn new(frequency: f32) -> Self {
        Tone {
            phase: 0.0,
            step: TAU * frequency / AUDIO_SAMPLE_RATE_EXACT,
        }
    }

    fn next_block(&mut self, amplitude: f32) -> [i16; AUDIO_BLOCK_SAMPLES] {
        core::array::from_fn(|_| {
            let s = (self.phase.sin() * amplitude * i16::MAX as f32) as i16;
            self.phase = (self.phase + self.step) % TAU;
            s
        })
    }
}

fn produce(ticks: u64, frequency: f32, partial_every: u32) {
    let period = Duration::from_secs_f32(AUDIO_BLOCK_SAMPLES as f32 / AUDIO_SAMPLE_RATE_EXACT);
    let mut left = Tone::new(frequency);
    let mut right = Tone::new(frequency * 1.5);
    let mut deadline = Instant::now();

    for tick in 0..ticks {
        let l = left.next_block(0.5);
        let r = right.next_block(0.5);
        let withhold = partial_every != 0 && tick % u64::from(partial_every) == 0;
        QUEUE.update([Some(l), (!withhold).then_some(r)]);

        deadline += period;
        if let Some(wait) = deadline.checked_duration_since(Instant::now()) {
            thread::sleep(wait);
        }
    }
    PRODUCING.store(false, Ordering::Release);
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("creating {}", args.out_dir.display()))?;
    let mut volume = DirVolume::new(&args.out_dir);

    let clock = StdClock::new();
    let config = RecorderConfig::new().sample_rate(AUDIO_RECORD_SAMPLE_RATE);
    let mut recorder = WavRecorder::new(&QUEUE, config).with_clock(&clock);

    recorder
        .begin(&mut volume, &args.name)
        .with_context(|| format!("opening {}", volume.path_of(&args.name).display()))?;

    let ticks =
        (args.seconds * AUDIO_SAMPLE_RATE_EXACT / AUDIO_BLOCK_SAMPLES as f32).ceil() as u64;
    info!(ticks, capacity = QUEUE.capacity(), "recording");

    PRODUCING.store(true, Ordering::Release);
    let (frequency, partial_every) = (args.frequency, args.partial_every);
    let producer = thread::spawn(move || produce(ticks, frequency, partial_every));

    let mut last_stall = Instant::now();
    while PRODUCING.load(Ordering::Acquire) {
        if !recorder.process()? {
            thread::sleep(Duration::from_millis(1));
        }
        if args.stall_ms > 0 && last_stall.elapsed() >= Duration::from_millis(250) {
            thread::sleep(Duration::from_millis(args.stall_ms));
            last_stall = Instant::now();
        }
    }
    producer
        .join()
        .map_err(|_| anyhow::anyhow!("producer thread panicked"))?;

    let summary = recorder.end()?;
    let counters = recorder.counters();
    let latency = recorder.write_stats();

    println!("wrote {}", volume.path_of(&args.name).display());
    println!(
        "  {} bytes of audio, {} bytes total",
        summary.data_bytes, summary.file_bytes
    );
    println!(
        "  blocks: {} valid, {} dropped, {} partial; high water {} of {} samples",
        counters.valid,
        counters.dropped,
        counters.partial,
        counters.max_pending,
        QUEUE.capacity()
    );
    println!(
        "  write latency: {} writes, mean {:.1} us, stdev {:.1} us, min {:.0} us, max {:.0} us",
        latency.count, latency.mean, latency.stdev, latency.min, latency.max
    );
    Ok(())
}
