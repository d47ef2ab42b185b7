use super::constants::US_PER_MS;

/// Unit decoration of a TIMES directive
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TimeUnit {
    #[default]
    Milliseconds,
    Microseconds,
}

/// Resolved per-channel windows, in milliseconds
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeWindows {
    pub start: Vec<f64>,
    pub end: Vec<f64>,
}

/// Collects the time-window directives of a TEM header and reconciles them.
///
/// Headers describe windows either explicitly (TIMESSTART/TIMESEND) or as centers
/// plus half-widths (TIMES/TIMESWIDTH). If any explicit directive was seen, the
/// center/width form is never evaluated, even if the file also carries it.
#[derive(Debug, Clone, Default)]
pub struct TimeWindowResolver {
    times_start: Option<Vec<f64>>,
    times_end: Option<Vec<f64>>,
    times: Option<Vec<f64>>,
    times_unit: TimeUnit,
    times_width: Option<Vec<f64>>,
}

impl TimeWindowResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_times_start(&mut self, values: Vec<f64>) {
        self.times_start = Some(values);
    }

    pub fn set_times_end(&mut self, values: Vec<f64>) {
        self.times_end = Some(values);
    }

    /// The unit of the TIMES directive governs the width values as well
    pub fn set_times(&mut self, values: Vec<f64>, unit: TimeUnit) {
        self.times = Some(values);
        self.times_unit = unit;
    }

    pub fn set_times_width(&mut self, values: Vec<f64>) {
        self.times_width = Some(values);
    }

    pub fn has_explicit_windows(&self) -> bool {
        self.times_start.is_some() || self.times_end.is_some()
    }

    /// Produce the final windows. Anything odd is reported through warnings; it never fails.
    pub fn resolve(self, warnings: &mut Vec<String>) -> TimeWindows {
        if self.has_explicit_windows() {
            let windows = TimeWindows {
                start: self.times_start.unwrap_or_default(),
                end: self.times_end.unwrap_or_default(),
            };
            if windows.start.len() != windows.end.len() {
                push_warning(
                    warnings,
                    format!(
                        "TIMESSTART has {} values but TIMESEND has {}",
                        windows.start.len(),
                        windows.end.len()
                    ),
                );
            }
            return windows;
        }

        match (self.times, self.times_width) {
            (Some(times), Some(widths)) if !times.is_empty() && times.len() == widths.len() => {
                let divisor = match self.times_unit {
                    TimeUnit::Milliseconds => 1.0,
                    TimeUnit::Microseconds => US_PER_MS,
                };
                let (start, end) = times
                    .iter()
                    .zip(widths.iter())
                    .map(|(t, w)| {
                        let (t, w) = (t / divisor, w / divisor);
                        (t - w, t + w)
                    })
                    .unzip();
                spdlog::info!("Calculated time windows from TIMES/TIMESWIDTH");
                TimeWindows { start, end }
            }
            (Some(times), Some(widths)) => {
                push_warning(
                    warnings,
                    format!(
                        "TIMES has {} values but TIMESWIDTH has {}; ignoring both",
                        times.len(),
                        widths.len()
                    ),
                );
                TimeWindows::default()
            }
            (Some(_), None) => {
                push_warning(warnings, String::from("TIMES given without TIMESWIDTH"));
                TimeWindows::default()
            }
            (None, Some(_)) => {
                push_warning(warnings, String::from("TIMESWIDTH given without TIMES"));
                TimeWindows::default()
            }
            (None, None) => TimeWindows::default(),
        }
    }
}

fn push_warning(warnings: &mut Vec<String>, message: String) {
    spdlog::warn!("{message}");
    warnings.push(message);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_windows() {
        let mut resolver = TimeWindowResolver::new();
        resolver.set_times_start(vec![0.1, 0.2, 0.4]);
        resolver.set_times_end(vec![0.2, 0.4, 0.8]);
        let mut warnings = vec![];
        let windows = resolver.resolve(&mut warnings);
        assert_eq!(windows.start, vec![0.1, 0.2, 0.4]);
        assert_eq!(windows.end.len(), windows.start.len());
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_center_width_milliseconds() {
        let mut resolver = TimeWindowResolver::new();
        resolver.set_times(vec![5.0], TimeUnit::Milliseconds);
        resolver.set_times_width(vec![1.0]);
        let windows = resolver.resolve(&mut vec![]);
        assert_eq!(windows.start, vec![4.0]);
        assert_eq!(windows.end, vec![6.0]);
    }

    #[test]
    fn test_center_width_microseconds() {
        let mut resolver = TimeWindowResolver::new();
        resolver.set_times(vec![5000.0], TimeUnit::Microseconds);
        resolver.set_times_width(vec![1000.0]);
        let windows = resolver.resolve(&mut vec![]);
        assert_eq!(windows.start, vec![4.0]);
        assert_eq!(windows.end, vec![6.0]);
    }

    #[test]
    fn test_explicit_windows_take_precedence() {
        let mut resolver = TimeWindowResolver::new();
        resolver.set_times(vec![5.0], TimeUnit::Milliseconds);
        resolver.set_times_width(vec![1.0]);
        resolver.set_times_start(vec![0.5]);
        resolver.set_times_end(vec![0.7]);
        let windows = resolver.resolve(&mut vec![]);
        assert_eq!(windows.start, vec![0.5]);
        assert_eq!(windows.end, vec![0.7]);
    }

    #[test]
    fn test_unpaired_center_width_is_ignored() {
        let mut resolver = TimeWindowResolver::new();
        resolver.set_times(vec![5.0, 6.0], TimeUnit::Milliseconds);
        resolver.set_times_width(vec![1.0]);
        let mut warnings = vec![];
        let windows = resolver.resolve(&mut warnings);
        assert!(windows.start.is_empty());
        assert!(windows.end.is_empty());
        assert_eq!(warnings.len(), 1);
    }
}
