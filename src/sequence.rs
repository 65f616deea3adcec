//! Concurrent playback of several patterns.

use crate::cancel::CancellationToken;
use crate::error::{Error, Result};
use crate::pattern::Pattern;
use crossbeam_channel::unbounded;
use mass_midi_io::DeviceRegistry;
use std::panic::{self, AssertUnwindSafe};
use std::thread;
use tracing::{error, info, warn};

/// How a sequence reacts to a failing pattern.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SequenceOptions {
    /// Cancel the remaining patterns as soon as one fails.
    pub cancel_on_error: bool,
}

/// How one pattern of a sequence ended.
#[derive(Debug)]
pub struct PatternOutcome {
    pub pattern: String,
    pub result: Result<()>,
}

/// Per-pattern results of a sequence, in completion order.
#[derive(Debug)]
pub struct SequenceReport {
    pub sequence: String,
    pub outcomes: Vec<PatternOutcome>,
}

impl SequenceReport {
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(|o| o.result.is_ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = &PatternOutcome> {
        self.outcomes.iter().filter(|o| o.result.is_err())
    }

    /// The first failure to complete, if any.
    pub fn into_result(self) -> Result<()> {
        self.outcomes
            .into_iter()
            .map(|o| o.result)
            .find(|r| r.is_err())
            .unwrap_or(Ok(()))
    }
}

/// A named group of patterns started together.
///
/// Patterns run on their own threads and the sequence completes when every
/// one of them has. Patterns that name the same device share its
/// connection; their messages never interleave mid-message, but their
/// relative order is not fixed.
#[derive(Debug, Clone, PartialEq)]
pub struct Sequence {
    name: String,
    tempo: f64,
    patterns: Vec<Pattern>,
}

impl Sequence {
    pub const DEFAULT_TEMPO: f64 = 100.0;

    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tempo: Self::DEFAULT_TEMPO,
            patterns: Vec::new(),
        }
    }

    /// Tempo given to patterns created through [`Sequence::pattern`].
    pub fn with_tempo(mut self, tempo: f64) -> Self {
        self.tempo = tempo;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tempo(&self) -> f64 {
        self.tempo
    }

    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    pub fn push(&mut self, pattern: Pattern) {
        self.patterns.push(pattern);
    }

    /// Append an empty pattern at the sequence tempo and return it for notes.
    pub fn pattern(&mut self, name: impl Into<String>, device: impl Into<String>) -> &mut Pattern {
        let index = self.patterns.len();
        self.patterns.push(Pattern::new(name, device, self.tempo));
        &mut self.patterns[index]
    }

    /// Play every pattern concurrently and wait for all of them.
    ///
    /// Returns the first failure in completion order. The other patterns
    /// keep playing unless `cancel` fires.
    pub fn play(&self, devices: &DeviceRegistry, cancel: &CancellationToken) -> Result<()> {
        self.play_with(devices, cancel, SequenceOptions::default())
            .into_result()
    }

    pub fn play_with(
        &self,
        devices: &DeviceRegistry,
        cancel: &CancellationToken,
        options: SequenceOptions,
    ) -> SequenceReport {
        self.play_on_threads(devices, cancel, options, |pattern| {
            thread::Builder::new().name(format!("pattern-{}", pattern.name()))
        })
    }

    fn play_on_threads<B>(
        &self,
        devices: &DeviceRegistry,
        cancel: &CancellationToken,
        options: SequenceOptions,
        thread_builder: B,
    ) -> SequenceReport
    where
        B: Fn(&Pattern) -> thread::Builder,
    {
        info!(
            "Sequence '{}' starting {} patterns at {} BPM",
            self.name,
            self.patterns.len(),
            self.tempo
        );

        // Siblings can be stopped without touching the caller's token.
        let cancel = cancel.child_token();
        let (outcome_sender, outcome_receiver) = unbounded::<PatternOutcome>();

        let outcomes = thread::scope(|scope| {
            let mut outcomes = Vec::with_capacity(self.patterns.len());

            for pattern in &self.patterns {
                let outcome_sender = outcome_sender.clone();
                let thread_cancel = cancel.clone();

                let spawned = thread_builder(pattern).spawn_scoped(scope, move || {
                    let result = panic::catch_unwind(AssertUnwindSafe(|| {
                        pattern.play(devices, &thread_cancel)
                    }))
                    .unwrap_or_else(|_| Err(Error::Panicked(pattern.name().to_string())));

                    let _ = outcome_sender.send(PatternOutcome {
                        pattern: pattern.name().to_string(),
                        result,
                    });
                });

                if let Err(e) = spawned {
                    error!("Cannot start pattern '{}': {}", pattern.name(), e);
                    outcomes.push(PatternOutcome {
                        pattern: pattern.name().to_string(),
                        result: Err(e.into()),
                    });
                    if options.cancel_on_error {
                        cancel.cancel();
                    }
                }
            }
            drop(outcome_sender);

            for outcome in outcome_receiver.iter() {
                if let Err(e) = &outcome.result {
                    error!(
                        "Pattern '{}' in sequence '{}' failed: {}",
                        outcome.pattern, self.name, e
                    );
                    if options.cancel_on_error && !cancel.is_cancelled() {
                        warn!("Cancelling remaining patterns of '{}'", self.name);
                        cancel.cancel();
                    }
                }
                outcomes.push(outcome);
            }
            outcomes
        });

        let report = SequenceReport {
            sequence: self.name.clone(),
            outcomes,
        };
        info!(
            "Sequence '{}' finished ({} of {} patterns failed)",
            self.name,
            report.failures().count(),
            self.patterns.len()
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mass_midi_io::{OutputBackend, OutputConnection, RecordingBackend};
    use std::time::{Duration, Instant};

    struct CrashingBackend;

    impl OutputBackend for CrashingBackend {
        fn open(&self, _name: &str) -> mass_midi_io::Result<Box<dyn OutputConnection>> {
            panic!("driver crashed");
        }

        fn list_devices(&self) -> Vec<String> {
            Vec::new()
        }
    }

    fn pattern(name: &str, device: &str, pitches: &[&str]) -> Pattern {
        let mut pattern = Pattern::new(name, device, 1.0);
        for pitch in pitches {
            pattern.note(4, pitch).unwrap();
        }
        pattern
    }

    #[test]
    fn test_defaults() {
        let sequence = Sequence::new("song");
        assert_eq!(sequence.tempo(), 100.0);
        assert!(sequence.patterns().is_empty());
    }

    #[test]
    fn test_pattern_inherits_tempo() {
        let mut sequence = Sequence::new("song").with_tempo(125.0);
        sequence.pattern("bass", "synth").note(8, "C4").unwrap();
        assert_eq!(sequence.patterns()[0].tempo(), 125.0);
        assert_eq!(sequence.patterns()[0].notes()[0].tempo(), 125.0);
    }

    #[test]
    fn test_empty_sequence_completes() {
        let devices = DeviceRegistry::new(RecordingBackend::new());
        let report = Sequence::new("nothing").play_with(
            &devices,
            &CancellationToken::new(),
            SequenceOptions::default(),
        );
        assert!(report.is_success());
        assert!(report.outcomes.is_empty());
    }

    #[test]
    fn test_every_pattern_plays() {
        let backend = RecordingBackend::new();
        let devices = DeviceRegistry::new(backend.clone());

        let mut sequence = Sequence::new("song");
        sequence.push(pattern("a", "one", &["C4", "D4"]));
        sequence.push(pattern("b", "two", &["E4"]));
        sequence.play(&devices, &CancellationToken::new()).unwrap();

        assert_eq!(backend.log("one").bytes().len(), 4);
        assert_eq!(backend.log("two").bytes().len(), 2);
        assert!(devices.open_devices().is_empty());
    }

    #[test]
    fn test_patterns_run_concurrently() {
        let devices = DeviceRegistry::new(RecordingBackend::new());

        // Each pattern holds for 2 * 50 ms.
        let mut sequence = Sequence::new("song");
        for name in ["a", "b", "c"] {
            let mut p = Pattern::new(name, name, 20.0);
            p.note(4, "C4").unwrap().rest(4).unwrap();
            sequence.push(p);
        }

        let start = Instant::now();
        sequence.play(&devices, &CancellationToken::new()).unwrap();
        let elapsed = start.elapsed();

        assert!(elapsed >= Duration::from_millis(100));
        assert!(elapsed < Duration::from_millis(280), "took {:?}", elapsed);
    }

    #[test]
    fn test_one_failure_does_not_stop_siblings() {
        let backend = RecordingBackend::with_devices(["good"]);
        let devices = DeviceRegistry::new(backend.clone());

        let mut sequence = Sequence::new("song");
        sequence.push(pattern("ok", "good", &["C4", "D4", "E4"]));
        sequence.push(pattern("broken", "missing", &["C4"]));

        let report = sequence.play_with(&devices, &CancellationToken::new(), SequenceOptions::default());
        assert!(!report.is_success());

        let failed: Vec<&str> = report.failures().map(|o| o.pattern.as_str()).collect();
        assert_eq!(failed, vec!["broken"]);
        assert_eq!(backend.log("good").bytes().len(), 6);

        let err = report.into_result().unwrap_err();
        assert!(matches!(
            err.as_device_error(),
            Some(mass_midi_io::Error::DeviceNotFound(name)) if name == "missing"
        ));
    }

    #[test]
    fn test_cancel_on_error_stops_siblings() {
        let devices = DeviceRegistry::new(RecordingBackend::with_devices(["good"]));

        let mut sequence = Sequence::new("song");
        sequence.push(pattern("loop", "good", &["C4"]).with_repeat(true));
        sequence.push(pattern("broken", "missing", &["C4"]));

        let options = SequenceOptions {
            cancel_on_error: true,
        };
        let report = sequence.play_with(&devices, &CancellationToken::new(), options);

        assert_eq!(report.outcomes.len(), 2);
        assert_eq!(report.failures().count(), 1);
    }

    #[test]
    fn test_caller_cancel_stops_repeating_patterns() {
        let devices = DeviceRegistry::new(RecordingBackend::new());
        let cancel = CancellationToken::new();

        let mut sequence = Sequence::new("song");
        sequence.push(pattern("a", "one", &["C4", "E4"]).with_repeat(true));
        sequence.push(pattern("b", "two", &["G4"]).with_repeat(true));

        thread::scope(|scope| {
            let handle = scope.spawn(|| sequence.play(&devices, &cancel));
            thread::sleep(Duration::from_millis(30));
            cancel.cancel();
            handle.join().unwrap().unwrap();
        });
        assert!(devices.open_devices().is_empty());
    }

    #[test]
    fn test_sequence_cancel_does_not_cancel_caller() {
        let devices = DeviceRegistry::new(RecordingBackend::with_devices(["good"]));
        let caller = CancellationToken::new();

        let mut sequence = Sequence::new("song");
        sequence.push(pattern("broken", "missing", &["C4"]));

        let options = SequenceOptions {
            cancel_on_error: true,
        };
        sequence.play_with(&devices, &caller, options);
        assert!(!caller.is_cancelled());
    }

    #[test]
    fn test_panicking_pattern_is_reported() {
        let devices = DeviceRegistry::new(CrashingBackend);

        let mut sequence = Sequence::new("song");
        sequence.push(pattern("crash", "synth", &["C4"]));

        let err = sequence.play(&devices, &CancellationToken::new()).unwrap_err();
        assert!(matches!(err, Error::Panicked(ref name) if name == "crash"));
    }

    #[test]
    fn test_spawn_failure_stops_looping_sibling() {
        let backend = RecordingBackend::new();
        let devices = DeviceRegistry::new(backend.clone());
        let caller = CancellationToken::new();

        let mut sequence = Sequence::new("song");
        sequence.push(pattern("loop", "synth", &["C4"]).with_repeat(true));
        sequence.push(pattern("unstartable", "other", &["D4"]));

        let options = SequenceOptions {
            cancel_on_error: true,
        };
        // No address space fits an isize::MAX stack, so that one spawn fails.
        let report = sequence.play_on_threads(&devices, &caller, options, |pattern| {
            let builder = thread::Builder::new();
            if pattern.name() == "unstartable" {
                builder.stack_size(isize::MAX as usize & !0xFFFF)
            } else {
                builder
            }
        });

        assert_eq!(report.outcomes.len(), 2);
        let failed: Vec<&PatternOutcome> = report.failures().collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].pattern, "unstartable");
        assert!(matches!(failed[0].result, Err(Error::Io(_))));

        // The loop returned, so it was cancelled, and the caller was not.
        assert!(!caller.is_cancelled());
        assert_eq!(backend.log("synth").closes, 1);
        assert!(backend.log("other").messages().is_empty());
    }
}
