//! Tracing the progress of a protocol run
//!
//! Drivers report what they are doing through a [`Tracer`]. [`PerfProfiler`]
//! turns those events into a per-stage timing report.

#[cfg(feature = "std")]
use ark_std::{string::String, vec::Vec};

/// Progress event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    ProtocolBegins,
    RoundBegins { name: Option<&'static str> },
    Stage { name: &'static str },
    SendMsg,
    MsgSent,
    ReceiveMsgs,
    MsgsReceived,
    ProtocolEnds,
}

/// Receives progress events of a protocol run.
pub trait Tracer: Send + Sync {
    fn trace_event(&mut self, event: Event);

    fn protocol_begins(&mut self) {
        self.trace_event(Event::ProtocolBegins)
    }
    fn round_begins(&mut self) {
        self.trace_event(Event::RoundBegins { name: None })
    }
    fn named_round_begins(&mut self, name: &'static str) {
        self.trace_event(Event::RoundBegins { name: Some(name) })
    }
    fn stage(&mut self, name: &'static str) {
        self.trace_event(Event::Stage { name })
    }
    fn send_msg(&mut self) {
        self.trace_event(Event::SendMsg)
    }
    fn msg_sent(&mut self) {
        self.trace_event(Event::MsgSent)
    }
    fn receive_msgs(&mut self) {
        self.trace_event(Event::ReceiveMsgs)
    }
    fn msgs_received(&mut self) {
        self.trace_event(Event::MsgsReceived)
    }
    fn protocol_ends(&mut self) {
        self.trace_event(Event::ProtocolEnds)
    }
}

impl<T: Tracer + ?Sized> Tracer for &mut T {
    fn trace_event(&mut self, event: Event) {
        (**self).trace_event(event)
    }
}

impl<T: Tracer> Tracer for Option<T> {
    fn trace_event(&mut self, event: Event) {
        if let Some(tracer) = self {
            tracer.trace_event(event)
        }
    }
}

/// Measures how long every stage of a run takes.
#[cfg(feature = "std")]
#[derive(Debug, Default)]
pub struct PerfProfiler {
    last_timestamp: Option<std::time::Instant>,
    protocol_began: Option<std::time::Instant>,
    stages: Vec<(String, std::time::Duration)>,
    current: Option<String>,
    error: Option<ProfileError>,
}

/// Report produced by [`PerfProfiler`]
#[cfg(feature = "std")]
#[derive(Debug, Clone)]
pub struct PerfReport {
    /// Every stage with its duration, in order
    pub stages: Vec<(String, std::time::Duration)>,
    /// Duration of the whole run
    pub total: std::time::Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, displaydoc::Display)]
#[cfg_attr(feature = "std", derive(thiserror::Error))]
pub enum ProfileError {
    /// protocol has not begun
    NotStarted,
    /// protocol has not ended
    NotFinished,
    /// protocol was started twice
    StartedTwice,
}

#[cfg(feature = "std")]
impl PerfProfiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Summary of the run, available once the protocol ended.
    pub fn get_report(&self) -> Result<PerfReport, ProfileError> {
        if let Some(err) = self.error {
            return Err(err);
        }
        let began = self.protocol_began.ok_or(ProfileError::NotStarted)?;
        let ended = self.last_timestamp.ok_or(ProfileError::NotStarted)?;
        if self.current.is_some() {
            return Err(ProfileError::NotFinished);
        }
        Ok(PerfReport { stages: self.stages.clone(), total: ended.duration_since(began) })
    }

    fn close_stage(&mut self, now: std::time::Instant) {
        if let (Some(name), Some(last)) = (self.current.take(), self.last_timestamp) {
            self.stages.push((name, now.duration_since(last)));
        }
        self.last_timestamp = Some(now);
    }
}

#[cfg(feature = "std")]
impl Tracer for PerfProfiler {
    fn trace_event(&mut self, event: Event) {
        let now = std::time::Instant::now();
        match event {
            Event::ProtocolBegins => {
                if self.protocol_began.is_some() {
                    self.error = Some(ProfileError::StartedTwice);
                }
                self.protocol_began = Some(now);
                self.last_timestamp = Some(now);
                self.current = Some("setup".into());
            },
            Event::ProtocolEnds => self.close_stage(now),
            Event::RoundBegins { name } => {
                self.close_stage(now);
                self.current = Some(name.unwrap_or("round").into());
            },
            Event::Stage { name } => {
                self.close_stage(now);
                self.current = Some(name.into());
            },
            Event::SendMsg => {
                self.close_stage(now);
                self.current = Some("send message".into());
            },
            Event::ReceiveMsgs => {
                self.close_stage(now);
                self.current = Some("receive messages".into());
            },
            Event::MsgSent | Event::MsgsReceived => self.close_stage(now),
        }
    }
}

#[cfg(feature = "std")]
impl core::fmt::Display for PerfReport {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        writeln!(f, "total: {:?}", self.total)?;
        for (name, duration) in &self.stages {
            let share = if self.total.is_zero() { 0.0 } else { duration.as_secs_f64() / self.total.as_secs_f64() };
            writeln!(f, "  - {name}: {duration:?} ({:.1}%)", share * 100.0)?;
        }
        Ok(())
    }
}

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;

    #[test]
    fn profiler_records_stages() {
        let mut profiler = PerfProfiler::new();
        assert_eq!(profiler.get_report().unwrap_err(), ProfileError::NotStarted);
        {
            let mut tracer: Option<&mut dyn Tracer> = Some(&mut profiler);
            tracer.protocol_begins();
            tracer.stage("deal");
            tracer.send_msg();
            tracer.msg_sent();
            tracer.stage("aggregate");
        }
        assert_eq!(profiler.get_report().unwrap_err(), ProfileError::NotFinished);
        profiler.protocol_ends();
        let report = profiler.get_report().unwrap();
        let names = report.stages.iter().map(|(n, _)| n.as_str()).collect::<Vec<_>>();
        assert_eq!(names, ["setup", "deal", "send message", "aggregate"]);
        assert!(report.to_string().starts_with("total: "));
    }

    #[test]
    fn disabled_tracer_is_a_noop() {
        let mut tracer: Option<&mut dyn Tracer> = None;
        tracer.protocol_begins();
        tracer.protocol_ends();
    }
}
