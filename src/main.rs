// modelseq demo - plays an INTRO/VERSE chain on a connected device, or dry-runs it in memory

use clap::Parser;
use modelseq::midi::OutputDeviceManager;
use modelseq::sequencer::ScaleMode;
use modelseq::{
    Chord, MemoryTransport, Model, ParamMap, Parameter, Project, SequencerConfig, SequencerResult, Voice,
    keys,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const INTRO: u32 = 0;
const VERSE: u32 = 1;

/// Play an INTRO/VERSE chain on an Elektron Model device
#[derive(Parser)]
#[command(name = "modelseq")]
#[command(about = "Pattern sequencer for Model:Cycles / Model:Samples", long_about = None)]
struct Cli {
    /// List MIDI output ports and exit
    #[arg(short, long)]
    list: bool,

    /// Record messages in memory instead of opening a device
    #[arg(short, long)]
    dry_run: bool,

    /// RON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Playing time in seconds
    #[arg(short, long, default_value = "8")]
    seconds: u64,
}

fn author(project: &mut Project) -> SequencerResult<()> {
    let seq = &mut project.sequencer;

    seq.pattern(INTRO)
        .scale(ScaleMode::PerTrack, 15, 4.0, 0)?
        .tempo(250.0)?;
    seq.pattern(INTRO).track(Voice::T2).scale(15, 3.0)?;
    for step in [0, 4, 8, 12] {
        seq.pattern(INTRO)
            .track(Voice::T2)
            .trig(step)?
            .note(keys::A4, 200.0, 120)?;
    }
    let punch = ParamMap::new()
        .with(Parameter::GATE, 1)
        .with(Parameter::PUNCH, 1)
        .with(Parameter::DECAY, 120);
    seq.pattern(INTRO).track(Voice::T2).trig(8)?.lock(punch);

    seq.pattern(VERSE)
        .scale(ScaleMode::PerTrack, 15, 1.0, 7)?
        .tempo(250.0)?;
    seq.pattern(VERSE).track(Voice::T2).scale(15, 3.0)?;
    for step in [0, 4, 8, 12] {
        seq.pattern(VERSE)
            .track(Voice::T2)
            .trig(step)?
            .note(keys::A4, 200.0, 120)?;
    }
    seq.pattern(VERSE)
        .track(Voice::T6)
        .parameter(Parameter::SHAPE, Chord::MinorMinor7.value())?
        .trig(0)?
        .nudge(10.0)?;
    Ok(())
}

fn run(cli: Cli) -> SequencerResult<()> {
    let config = match &cli.config {
        Some(path) => SequencerConfig::load(path)?,
        None => SequencerConfig::for_model(Model::Cycles),
    };

    if cli.list {
        let manager = OutputDeviceManager::new(config.client_name.clone());
        for device in manager.list_output_ports() {
            let marker = if device.is_default { " (default)" } else { "" };
            println!("{}: {}{}", device.id, device.name, marker);
        }
        return Ok(());
    }

    let memory = Arc::new(MemoryTransport::new());
    let mut project = if cli.dry_run {
        Project::with_transport(config, memory.clone())?
    } else {
        Project::connect(config)?
    };
    match project.port_name() {
        Some(port) => println!("Connected to {}", port),
        None => println!("Dry run, messages recorded in memory"),
    }

    author(&mut project)?;

    project.free.note(Voice::T1, keys::C4, 120, 200.0, &[])?;
    project.sequencer.play_chain(&[INTRO, VERSE])?;

    let half = Duration::from_secs(cli.seconds) / 2;
    thread::sleep(half);
    project.sequencer.pause()?;
    thread::sleep(Duration::from_millis(500));
    project.sequencer.resume()?;
    thread::sleep(half);

    let state = project.sequencer.state();
    println!(
        "Pattern {:?}, chain index {}, {} tracks",
        state.pattern,
        state.chain_index,
        state.tracks.len()
    );
    project.sequencer.stop();
    project.sequencer.join();

    for notification in project.sequencer.drain_notifications() {
        println!("{}", notification);
    }
    if cli.dry_run {
        println!("{} messages sent", memory.len());
    }
    Ok(())
}

fn main() {
    tracing_subscriber::fmt::init();

    println!("=== modelseq ===");
    if let Err(e) = run(Cli::parse()) {
        eprintln!("ERROR: {}", e);
        std::process::exit(1);
    }
}
