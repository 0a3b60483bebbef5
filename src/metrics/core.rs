//! Timing helpers shared by the phase metrics

use std::time::Instant;

/// Records elapsed seconds into a histogram when dropped
pub struct TimingGuard {
    start: Instant,
    histogram_name: &'static str,
    label: Option<(&'static str, &'static str)>,
}

impl TimingGuard {
    pub fn new(histogram_name: &'static str) -> Self {
        Self {
            start: Instant::now(),
            histogram_name,
            label: None,
        }
    }

    pub fn with_label(mut self, key: &'static str, value: &'static str) -> Self {
        self.label = Some((key, value));
        self
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

impl Drop for TimingGuard {
    fn drop(&mut self) {
        let duration = self.elapsed_secs();
        match self.label {
            Some((key, value)) => ::metrics::histogram!(self.histogram_name, key => value).record(duration),
            None => ::metrics::histogram!(self.histogram_name).record(duration),
        }
    }
}

/// Convenience function to create a timing guard
pub fn time_operation(histogram_name: &'static str) -> TimingGuard {
    TimingGuard::new(histogram_name)
}
