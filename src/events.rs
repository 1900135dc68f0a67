use serde::Serialize;

/// One simulated user's login attempt.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LoginEvent {
    pub arrival_time: f64,
    pub auth_duration: f64,
    pub success: bool,
}

impl LoginEvent {
    pub fn new(arrival_time: f64, auth_duration: f64, success: bool) -> Self {
        Self {
            arrival_time,
            auth_duration,
            success,
        }
    }

    pub fn total_time(&self) -> f64 {
        self.arrival_time + self.auth_duration
    }
}

/// What a single run handed back to the driver.
#[derive(Clone, Debug, PartialEq)]
pub enum RunOutcome {
    Produced(Vec<LoginEvent>),
    Empty,
}

/// Events from every run, flattened in generation order. Run boundaries are not kept.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EventLog {
    events: Vec<LoginEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append_run(&mut self, events: Vec<LoginEvent>) {
        self.events.extend(events);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LoginEvent> {
        self.events.iter()
    }

    pub fn as_slice(&self) -> &[LoginEvent] {
        &self.events
    }

    pub fn auth_durations(&self) -> Vec<f64> {
        self.events.iter().map(|event| event.auth_duration).collect()
    }

    pub fn rows(&self) -> impl Iterator<Item = EventRow> + '_ {
        self.events.iter().map(EventRow::from)
    }
}

impl From<Vec<LoginEvent>> for EventLog {
    fn from(events: Vec<LoginEvent>) -> Self {
        Self { events }
    }
}

impl<'a> IntoIterator for &'a EventLog {
    type Item = &'a LoginEvent;
    type IntoIter = std::slice::Iter<'a, LoginEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

/// Per-event table row handed to exporters and renderers.
#[derive(Clone, Copy, Debug, Serialize, PartialEq)]
pub struct EventRow {
    pub arrival_time: f64,
    pub auth_duration: f64,
    pub success: bool,
    pub total_time: f64,
}

impl From<&LoginEvent> for EventRow {
    fn from(event: &LoginEvent) -> Self {
        Self {
            arrival_time: event.arrival_time,
            auth_duration: event.auth_duration,
            success: event.success,
            total_time: event.total_time(),
        }
    }
}
