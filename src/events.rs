//! Discrete events and recording annotations.
//!
//! An [`Event`] marks a sample of a [`ContinuousSignal`](crate::ContinuousSignal)
//! with a categorical label. Annotations (onset in seconds + description)
//! are converted with [`events_from_annotations`], mirroring
//! `mne.events_from_annotations`.
use serde::{Deserialize, Serialize};

/// A labelled sample index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Event {
    pub sample: usize,
    pub label: String,
}

impl Event {
    pub fn new(sample: usize, label: impl Into<String>) -> Self {
        Self { sample, label: label.into() }
    }
}

/// A time-stamped annotation as stored alongside a recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    /// Onset in seconds from the first sample.
    pub onset: f64,
    #[serde(default)]
    pub duration: f64,
    pub description: String,
}

/// Convert annotations to events sorted by sample.
///
/// Onsets are rounded to the nearest sample. Annotations falling outside
/// `[0, n_times)` are skipped with a warning. The sort is stable, so
/// annotations sharing a sample keep their input order.
pub fn events_from_annotations(annotations: &[Annotation], sfreq: f64, n_times: usize) -> Vec<Event> {
    let mut events: Vec<Event> = annotations
        .iter()
        .filter_map(|a| {
            let sample = (a.onset * sfreq).round();
            if sample < 0.0 || sample >= n_times as f64 {
                log::warn!(
                    "annotation {:?} at {:.3} s lies outside the recording, skipped",
                    a.description,
                    a.onset
                );
                return None;
            }
            Some(Event::new(sample as usize, a.description.clone()))
        })
        .collect();
    events.sort_by_key(|e| e.sample);
    events
}

/// Re-base events after cropping the first `first_sample` samples off a
/// recording that is now `n_times` long; events outside the crop are removed.
pub fn shift_events(events: &[Event], first_sample: usize, n_times: usize) -> Vec<Event> {
    shift_events_indexed(events, first_sample, n_times).0
}

/// Like [`shift_events`], also returning each kept event's index in `events`.
pub fn shift_events_indexed(
    events: &[Event],
    first_sample: usize,
    n_times: usize,
) -> (Vec<Event>, Vec<usize>) {
    events
        .iter()
        .enumerate()
        .filter(|(_, e)| e.sample >= first_sample && e.sample - first_sample < n_times)
        .map(|(i, e)| (Event::new(e.sample - first_sample, e.label.clone()), i))
        .unzip()
}

/// Distinct labels in order of first appearance.
pub fn unique_labels(events: &[Event]) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for e in events {
        if !seen.contains(&e.label) {
            seen.push(e.label.clone());
        }
    }
    seen
}
