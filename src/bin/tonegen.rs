// Tone generator demo: drives the engine's pulse channel through the
// instruction primitives and plays the mixed output through cpal.
//
// The engine runs on the main thread; the APU sample callback pushes
// stereo frames into a bounded channel, and the cpal callback drains it.
// The bounded channel doubles as the pacing mechanism — once it fills,
// the engine blocks until the audio device catches up, so the runtime
// advances at roughly real time.

use std::path::Path;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{bounded, Receiver};

use dotmatrix::{Engine, EngineConfig, R8};

/// Stereo frames buffered between the engine and the audio device.
/// ~170ms at 48kHz, enough to absorb scheduler jitter.
const BUFFER_FRAMES: usize = 8192;

/// Pulse-channel periods for a C-major arpeggio (C5 E5 G5 C6).
const ARPEGGIO: [u16; 4] = [1798, 1849, 1881, 1923];

/// Machine cycles per note (~0.3s of engine time).
const NOTE_CYCLES: u32 = dotmatrix::CLOCK_HZ / 4 * 3 / 10;

fn main() {
    env_logger::init();

    let config = match std::env::args().nth(1) {
        Some(path) => EngineConfig::load(Path::new(&path)),
        None => EngineConfig::default(),
    };

    if let Err(e) = run(config) {
        eprintln!("[tonegen] {e}");
        std::process::exit(1);
    }
}

fn run(mut config: EngineConfig) -> Result<(), String> {
    let (tx, rx) = bounded::<(f32, f32)>(BUFFER_FRAMES);
    let (_stream, sample_rate) = build_stream(rx)?;
    config.sample_rate = sample_rate;

    let mut engine = Engine::with_config(&config);
    engine.set_sample_callback(Box::new(move |left, right| {
        // Blocking send paces the engine against the audio clock.
        let _ = tx.send((left, right));
    }));

    play(&mut engine).map_err(|e| format!("engine failure: {e}"))
}

/// Program the APU and walk the arpeggio, all through the CPU facade.
fn play(engine: &mut Engine) -> dotmatrix::Result<()> {
    write_port(engine, 0x26, 0x80)?; // NR52: power on
    write_port(engine, 0x25, 0x11)?; // NR51: channel 1 both sides
    write_port(engine, 0x24, 0x77)?; // NR50: full master volume
    write_port(engine, 0x11, 0x80)?; // NR11: 50% duty
    write_port(engine, 0x12, 0xF0)?; // NR12: volume 15, no envelope

    loop {
        for period in ARPEGGIO {
            write_port(engine, 0x13, period as u8)?;
            write_port(engine, 0x14, 0x80 | (period >> 8) as u8)?;
            let mut remaining = NOTE_CYCLES;
            while remaining > 0 {
                let chunk = remaining.min(2048);
                engine.cycle(chunk)?;
                remaining -= chunk;
            }
        }
    }
}

/// One hardware-register write via LDH, the way game code does it.
fn write_port(engine: &mut Engine, port: u8, value: u8) -> dotmatrix::Result<()> {
    engine.ld_r8_n8(R8::A, value)?;
    engine.ldh_a8_a(port)
}

/// Build and start the output stream at the device's native rate.
fn build_stream(rx: Receiver<(f32, f32)>) -> Result<(cpal::Stream, u32), String> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| "no audio output device found".to_string())?;

    let default_config = device
        .default_output_config()
        .map_err(|e| format!("no default output config: {e}"))?;
    let sample_rate = default_config.sample_rate().0;
    log::info!(
        "audio device '{}' at {sample_rate}Hz",
        device.name().unwrap_or_else(|_| "unknown".into())
    );

    let config = cpal::StreamConfig {
        channels: 2,
        sample_rate: cpal::SampleRate(sample_rate),
        buffer_size: cpal::BufferSize::Default,
    };

    let stream = device
        .build_output_stream(
            &config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                // data is interleaved [L, R, L, R, ...]
                for frame in data.chunks_exact_mut(2) {
                    match rx.try_recv() {
                        Ok((l, r)) => {
                            frame[0] = l;
                            frame[1] = r;
                        }
                        Err(_) => {
                            // Underrun: silence
                            frame[0] = 0.0;
                            frame[1] = 0.0;
                        }
                    }
                }
            },
            move |err| {
                eprintln!("[tonegen] audio error: {err}");
            },
            None,
        )
        .map_err(|e| format!("build_output_stream failed: {e}"))?;

    stream
        .play()
        .map_err(|e| format!("stream.play() failed: {e}"))?;

    Ok((stream, sample_rate))
}
