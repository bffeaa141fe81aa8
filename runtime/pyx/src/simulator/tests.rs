#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::*;
use pretty_assertions::assert_eq;

fn simulator() -> (Simulator, Arc<Transcript>) {
    let transcript = Transcript::captured();
    let sim = Simulator::new(RuntimeConfig::new(), ".", Arc::clone(&transcript));
    (sim, transcript)
}

fn lines(expected: &[&str]) -> Vec<String> {
    expected.iter().map(|line| (*line).to_string()).collect()
}

#[test]
fn messages_print_outlet_events() {
    let (sim, transcript) = simulator();
    let failures = sim.run_script(
        "# a tiny patch
new @name lfo
lfo eval 2 ** 10
lfo exec print('hi')
lfo eval 1/0
lfo bang
",
    );
    assert_eq!(failures, 0);
    assert_eq!(
        transcript.take(),
        lines(&[
            "created lfo",
            "lfo value: 1024",
            "print: hi",
            "lfo success",
            "error [py lfo] <- (eval): ZeroDivisionError('division by zero')",
            "lfo failure",
            "lfo value: ",
        ])
    );
}

#[test]
fn sched_fires_when_clock_passes_deadline() {
    let (sim, transcript) = simulator();
    sim.run_script(
        "new @name lfo
lfo sched 100 abs -3
advance 50",
    );
    assert_eq!(transcript.take(), lines(&["created lfo"]));
    sim.run_line("advance 60").unwrap();
    assert_eq!(transcript.take(), lines(&["lfo value: 3"]));
    sim.run_line("advance 1000").unwrap();
    assert_eq!(transcript.take(), Vec::<String>::new());
}

#[test]
fn freed_objects_never_tick() {
    let (sim, transcript) = simulator();
    sim.run_script(
        "new @name lfo
lfo sched 10 abs -3
free lfo
advance 100",
    );
    assert_eq!(transcript.take(), lines(&["created lfo", "freed lfo"]));
}

#[test]
fn send_crosses_objects() {
    let (sim, transcript) = simulator();
    sim.run_script(
        "new
new @name synth
__main__ send synth assign freq 440
synth eval freq
__main__ count",
    );
    assert_eq!(
        transcript.take(),
        lines(&[
            "created __main__",
            "created synth",
            "synth success",
            "__main__ success",
            "synth value: 440",
            "__main__ value: 2",
        ])
    );
}

#[test]
fn last_free_stops_the_engine() {
    let (sim, _) = simulator();
    sim.run_script(
        "new
new
__main__ scan",
    );
    assert!(sim.runtime().is_running());
    assert_eq!(sim.objects().len(), 2);
    sim.close_patch();
    assert!(sim.objects().is_empty());
    assert_eq!(sim.runtime().live_count(), 0);
    assert!(!sim.runtime().is_running());
}

#[test]
fn bad_lines_are_reported_and_skipped() {
    let (sim, transcript) = simulator();
    let failures = sim.run_script(
        "bogus eval 1
new @colour red
advance soon
new @name lfo
lfo
free ghost",
    );
    assert_eq!(failures, 5);
    assert_eq!(
        transcript.take(),
        lines(&[
            "line 1: no object named 'bogus'",
            "line 2: unknown attribute '@colour'",
            "line 3: usage: advance <ms>",
            "created lfo",
            "line 5: usage: <name> <selector> [atoms...]",
            "line 6: no object named 'ghost'",
        ])
    );
}

#[test]
fn autoload_reports_before_the_name_is_known() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("boot.py"), "ready = 7\n").unwrap();
    let transcript = Transcript::captured();
    let sim = Simulator::new(RuntimeConfig::new(), dir.path(), Arc::clone(&transcript));
    sim.run_script(
        "new @file boot.py @autoload 1
__main__ eval ready",
    );
    assert_eq!(
        transcript.take(),
        lines(&["(new) success", "created __main__", "__main__ value: 7"])
    );
}

#[test]
fn editor_commands() {
    let (sim, transcript) = simulator();
    sim.run_script(
        "new @run_on_save 1
save __main__ y = 5
__main__ eval y
close __main__ y = 6
__main__ eval y",
    );
    assert_eq!(
        transcript.take(),
        lines(&[
            "created __main__",
            "__main__ success",
            "__main__ value: 5",
            "__main__ value: 5",
        ])
    );
}

#[test]
fn api_module_posts_to_console() {
    let (sim, transcript) = simulator();
    sim.run_script(
        "new
__main__ exec import api
__main__ exec api.post('hello')",
    );
    assert_eq!(
        transcript.take(),
        lines(&[
            "created __main__",
            "__main__ success",
            "hello",
            "__main__ success",
        ])
    );
}
