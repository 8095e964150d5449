use std::path::PathBuf;

use super::*;
use crate::audio::AudioEngine;
use crate::audio::fake::FakeEngine;
use crate::error::Severity;

fn deliver(bank: &mut PadBank, engine: &mut FakeEngine) -> Vec<PadEvent> {
    let mut out = Vec::new();
    for ev in engine.poll_events() {
        out.extend(bank.handle_event(engine, &ev));
    }
    out
}

/// Assign, trigger and finish loading pad `i` so it is playing.
fn start_pad(bank: &mut PadBank, engine: &mut FakeEngine, i: usize) {
    bank.assign(engine, i, PathBuf::from(format!("/fx/sound{i}.wav")));
    assert_eq!(bank.trigger(engine, i), TriggerOutcome::Loading);
    let id = bank.slot(i).unwrap().resource().unwrap();
    engine.complete_load(id, Some(4.0));
    assert_eq!(deliver(bank, engine), vec![PadEvent::Started(i)]);
}

#[test]
fn bank_has_twelve_default_named_pads() {
    let bank = PadBank::new(0.7, false);
    assert_eq!(bank.slots().len(), PAD_COUNT);
    assert_eq!(bank.slot(0).unwrap().display_name, "Pad 1");
    assert_eq!(bank.slot(11).unwrap().display_name, "Pad 12");
    assert!(bank.slot(12).is_none());
}

#[test]
fn unassigned_trigger_creates_no_resource() {
    let (mut bank, mut engine) = (PadBank::new(0.7, false), FakeEngine::new());
    assert_eq!(bank.trigger(&mut engine, 3), TriggerOutcome::NotConfigured);
    assert_eq!(engine.loads, 0);
    assert_eq!(bank.trigger(&mut engine, 40), TriggerOutcome::OutOfRange);
}

#[test]
fn assign_takes_the_file_stem_and_does_not_load() {
    let (mut bank, mut engine) = (PadBank::new(0.7, false), FakeEngine::new());
    assert!(bank.assign(&mut engine, 2, PathBuf::from("/fx/Thunder Clap.ogg")));
    let slot = bank.slot(2).unwrap();
    assert_eq!(slot.display_name, "Thunder Clap");
    assert!(slot.is_assigned());
    assert_eq!(engine.loads, 0);
    assert!(!bank.assign(&mut engine, 12, PathBuf::from("/fx/x.wav")));
}

#[test]
fn first_trigger_loads_then_plays() {
    let (mut bank, mut engine) = (PadBank::new(0.5, false), FakeEngine::new());
    start_pad(&mut bank, &mut engine, 0);
    let id = bank.slot(0).unwrap().resource().unwrap();
    assert!(engine.is_playing(id));
    assert_eq!(engine.resource(id).unwrap().options.volume, 0.5);
    assert!(bank.slot(0).unwrap().is_playing());
}

#[test]
fn duplicate_triggers_are_ignored() {
    let (mut bank, mut engine) = (PadBank::new(0.7, false), FakeEngine::new());
    bank.assign(&mut engine, 1, PathBuf::from("/fx/door.wav"));
    assert_eq!(bank.trigger(&mut engine, 1), TriggerOutcome::Loading);
    assert_eq!(bank.trigger(&mut engine, 1), TriggerOutcome::AlreadyLoading);
    assert_eq!(engine.loads, 1);

    let id = bank.slot(1).unwrap().resource().unwrap();
    engine.complete_load(id, Some(2.0));
    deliver(&mut bank, &mut engine);
    assert_eq!(bank.trigger(&mut engine, 1), TriggerOutcome::AlreadyPlaying);
    assert_eq!(engine.loads, 1);
}

#[test]
fn cached_sound_replays_without_reloading() {
    let (mut bank, mut engine) = (PadBank::new(0.7, false), FakeEngine::new());
    start_pad(&mut bank, &mut engine, 4);
    let id = bank.slot(4).unwrap().resource().unwrap();

    engine.finish(id);
    assert_eq!(deliver(&mut bank, &mut engine), vec![PadEvent::Finished(4)]);
    assert!(!bank.slot(4).unwrap().is_playing());

    assert_eq!(bank.trigger(&mut engine, 4), TriggerOutcome::Playing);
    assert!(engine.is_playing(id));
    assert_eq!(engine.loads, 1);
}

#[test]
fn failed_load_leaves_the_pad_unloaded_for_a_retry() {
    let (mut bank, mut engine) = (PadBank::new(0.7, false), FakeEngine::new());
    bank.assign(&mut engine, 0, PathBuf::from("/fx/broken.wav"));
    bank.trigger(&mut engine, 0);
    let id = bank.slot(0).unwrap().resource().unwrap();
    engine.fail_load(id);

    let events = deliver(&mut bank, &mut engine);
    assert!(matches!(
        events.as_slice(),
        [PadEvent::Status { severity: Severity::Error, .. }]
    ));
    assert_eq!(bank.slot(0).unwrap().resource(), None);

    assert_eq!(bank.trigger(&mut engine, 0), TriggerOutcome::Loading);
    assert_eq!(engine.loads, 2);
}

#[test]
fn clearing_a_playing_pad_stops_and_unloads_it() {
    let (mut bank, mut engine) = (PadBank::new(0.7, false), FakeEngine::new());
    start_pad(&mut bank, &mut engine, 6);
    let id = bank.slot(6).unwrap().resource().unwrap();

    bank.clear(&mut engine, 6);
    assert!(engine.resource(id).is_none());
    assert!(!bank.any_playing());
    let slot = bank.slot(6).unwrap();
    assert!(!slot.is_assigned());
    assert_eq!(slot.display_name, "Pad 7");
    assert_eq!(slot.progress(), 0.0);

    // Again, harmlessly.
    bank.clear(&mut engine, 6);
    assert_eq!(engine.unloads, 1);
}

#[test]
fn reassigning_releases_the_old_sound() {
    let (mut bank, mut engine) = (PadBank::new(0.7, false), FakeEngine::new());
    start_pad(&mut bank, &mut engine, 0);
    let old = bank.slot(0).unwrap().resource().unwrap();
    bank.assign(&mut engine, 0, PathBuf::from("/fx/new.wav"));
    assert!(engine.resource(old).is_none());
    assert_eq!(bank.slot(0).unwrap().resource(), None);
    assert_eq!(bank.slot(0).unwrap().display_name, "new");
}

#[test]
fn stop_all_counts_only_playing_pads() {
    let (mut bank, mut engine) = (PadBank::new(0.7, false), FakeEngine::new());
    for i in [0, 3, 7] {
        start_pad(&mut bank, &mut engine, i);
    }
    bank.assign(&mut engine, 9, PathBuf::from("/fx/idle.wav"));

    assert_eq!(bank.stop_all(&mut engine), 3);
    assert!(!bank.any_playing());
    assert!(engine.playing_ids().is_empty());
    assert!(bank.slots().iter().all(|s| s.progress() == 0.0));
    assert_eq!(bank.stop_all(&mut engine), 0);
}

#[test]
fn stop_while_loading_cancels_the_autoplay() {
    let (mut bank, mut engine) = (PadBank::new(0.7, false), FakeEngine::new());
    bank.assign(&mut engine, 2, PathBuf::from("/fx/slow.wav"));
    bank.trigger(&mut engine, 2);
    assert_eq!(bank.stop_all(&mut engine), 0);

    let id = bank.slot(2).unwrap().resource().unwrap();
    engine.complete_load(id, Some(1.0));
    assert!(deliver(&mut bank, &mut engine).is_empty());
    assert!(!engine.is_playing(id));

    assert_eq!(bank.trigger(&mut engine, 2), TriggerOutcome::Playing);
}

#[test]
fn rename_ignores_blank_names() {
    let (mut bank, mut engine) = (PadBank::new(0.7, false), FakeEngine::new());
    bank.assign(&mut engine, 0, PathBuf::from("/fx/bell.wav"));
    assert!(bank.rename(0, "  Church bell "));
    assert_eq!(bank.slot(0).unwrap().display_name, "Church bell");
    bank.rename(0, "   ");
    assert_eq!(bank.slot(0).unwrap().display_name, "Church bell");
    assert!(!bank.rename(99, "x"));
}

#[test]
fn progress_follows_position_until_the_pad_stops() {
    let (mut bank, mut engine) = (PadBank::new(0.7, false), FakeEngine::new());
    start_pad(&mut bank, &mut engine, 0);
    let id = bank.slot(0).unwrap().resource().unwrap();

    engine.set_position(id, 1.0);
    assert!(bank.tick_progress(&engine, 0));
    assert_eq!(bank.slot(0).unwrap().progress(), 0.25);

    bank.stop(&mut engine, 0);
    assert!(!bank.tick_progress(&engine, 0));
    assert_eq!(bank.slot(0).unwrap().progress(), 0.0);
}

#[test]
fn channel_gain_fans_out_to_every_loaded_pad() {
    let (mut bank, mut engine) = (PadBank::new(0.7, false), FakeEngine::new());
    start_pad(&mut bank, &mut engine, 0);
    start_pad(&mut bank, &mut engine, 1);

    bank.set_volume_all(&mut engine, 2.0);
    bank.set_muted_all(&mut engine, true);
    assert_eq!(bank.volume(), 1.0);
    for i in 0..2 {
        let id = bank.slot(i).unwrap().resource().unwrap();
        assert_eq!(engine.resource(id).unwrap().options.volume, 1.0);
        assert!(engine.is_muted(id));
    }

    // New loads pick up the current gain.
    bank.assign(&mut engine, 5, PathBuf::from("/fx/late.wav"));
    bank.trigger(&mut engine, 5);
    let id = bank.slot(5).unwrap().resource().unwrap();
    assert!(engine.resource(id).unwrap().options.muted);
}
