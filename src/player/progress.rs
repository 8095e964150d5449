use std::time::{Duration, Instant};

/// How close the current item is to its end.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum RemainingLevel {
    #[default]
    Normal,
    Warning,
    Danger,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Thresholds {
    pub warning_secs: u64,
    pub danger_secs: u64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            warning_secs: 30,
            danger_secs: 10,
        }
    }
}

impl Thresholds {
    pub fn level(&self, remaining_secs: f64) -> RemainingLevel {
        if remaining_secs <= self.danger_secs as f64 {
            RemainingLevel::Danger
        } else if remaining_secs <= self.warning_secs as f64 {
            RemainingLevel::Warning
        } else {
            RemainingLevel::Normal
        }
    }
}

/// `m:ss`, or `h:mm:ss` past an hour. Negative and NaN inputs show `0:00`.
pub fn format_clock(secs: f64) -> String {
    let total = if secs.is_finite() && secs > 0.0 {
        secs.floor() as u64
    } else {
        0
    };
    let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m}:{s:02}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeText {
    pub elapsed: String,
    pub total: String,
    pub remaining: String,
}

impl Default for TimeText {
    fn default() -> Self {
        Self {
            elapsed: "0:00".into(),
            total: "--:--".into(),
            remaining: "--:--".into(),
        }
    }
}

/// Progress of the current music track.
///
/// The bar fraction follows every frame; the text fields only refresh once
/// per `text_interval` so the digits don't flicker.
#[derive(Debug, Clone)]
pub struct ProgressView {
    fraction: f64,
    level: RemainingLevel,
    text: TimeText,
    text_interval: Duration,
    last_text_at: Option<Instant>,
}

impl ProgressView {
    pub fn new(text_interval: Duration) -> Self {
        Self {
            fraction: 0.0,
            level: RemainingLevel::Normal,
            text: TimeText::default(),
            text_interval,
            last_text_at: None,
        }
    }

    pub fn reset(&mut self) {
        self.fraction = 0.0;
        self.level = RemainingLevel::Normal;
        self.text = TimeText::default();
        self.last_text_at = None;
    }

    pub fn update(
        &mut self,
        position: f64,
        duration: Option<f64>,
        now: Instant,
        thresholds: Thresholds,
    ) {
        let duration = duration.filter(|d| *d > 0.0);
        self.fraction = duration.map_or(0.0, |d| (position / d).clamp(0.0, 1.0));

        let due = self
            .last_text_at
            .is_none_or(|at| now.saturating_duration_since(at) >= self.text_interval);
        if !due {
            return;
        }
        self.last_text_at = Some(now);

        self.text.elapsed = format_clock(position);
        match duration {
            Some(d) => {
                let remaining = (d - position).max(0.0);
                self.text.total = format_clock(d);
                self.text.remaining = format!("-{}", format_clock(remaining));
                self.level = thresholds.level(remaining);
            }
            None => {
                self.text.total = "--:--".into();
                self.text.remaining = "--:--".into();
                self.level = RemainingLevel::Normal;
            }
        }
    }

    pub fn fraction(&self) -> f64 {
        self.fraction
    }

    pub fn level(&self) -> RemainingLevel {
        self.level
    }

    pub fn text(&self) -> &TimeText {
        &self.text
    }
}
