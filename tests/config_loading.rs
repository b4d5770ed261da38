// Configuration files on disk

use modelseq::sequencer::DefaultPresets;
use modelseq::{
    MemoryTransport, Model, ParamMap, Parameter, Project, SequencerConfig, SequencerError, Voice,
};
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

#[test]
fn test_load_from_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("samples.ron");
    fs::write(
        &path,
        r#"(
            model: Samples,
            client_name: "studio",
            port_fragment: Some("Model:Samples MIDI"),
            notification_capacity: 32,
            default_presets: {
                T1: { 74: 100, 71: 20 },
            },
        )"#,
    )
    .unwrap();

    let config = SequencerConfig::load(&path).unwrap();
    assert_eq!(config.model, Model::Samples);
    assert_eq!(config.client_name, "studio");
    assert_eq!(config.port_fragment(), "Model:Samples MIDI");

    let presets = config.default_presets();
    assert_eq!(presets.get(Voice::T1).get(Parameter::CUTOFF), Some(100));
    assert_eq!(presets.get(Voice::T1).get(Parameter::RESONANCE), Some(20));
    assert_eq!(
        presets.get(Voice::T2),
        DefaultPresets::for_model(Model::Samples).get(Voice::T2)
    );
}

#[test]
fn test_save_and_reload() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cycles.ron");

    let mut config = SequencerConfig::for_model(Model::Cycles);
    config.default_presets.insert(
        Voice::T6,
        ParamMap::new()
            .with(Parameter::MACHINE, 5)
            .with(Parameter::COLOR, 33),
    );
    config.save(&path).unwrap();

    let reloaded = SequencerConfig::load(&path).unwrap();
    assert_eq!(reloaded, config);
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = TempDir::new().unwrap();
    let result = SequencerConfig::load(dir.path().join("absent.ron"));
    assert!(matches!(result, Err(SequencerError::Io(_))));
}

#[test]
fn test_malformed_file_is_parse_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.ron");
    fs::write(&path, "(model: Cycles,, client_name").unwrap();
    assert!(matches!(
        SequencerConfig::load(&path),
        Err(SequencerError::Config(_))
    ));
}

#[test]
fn test_loaded_presets_reach_playback() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("preset.ron");
    fs::write(&path, "(default_presets: { T2: { 16: 7 } })").unwrap();

    let config = SequencerConfig::load(&path).unwrap();
    let transport = Arc::new(MemoryTransport::new());
    let mut project = Project::with_transport(config, transport.clone()).unwrap();
    project.sequencer.pattern(0).track(Voice::T2).trig(0).unwrap();
    project.sequencer.play(0).unwrap();
    std::thread::sleep(std::time::Duration::from_millis(50));
    project.sequencer.stop();
    project.sequencer.join();

    let messages = transport.messages();
    assert_eq!(
        messages.first(),
        Some(&modelseq::MidiMessage::control_change(Voice::T2, 16, 7))
    );
}
