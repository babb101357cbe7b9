use crate::data::*;
use crate::simulator::response::Release;
use crate::simulator::superposition::TimeMode;

pub trait DoseSeriesBuilderExt {
    fn builder() -> DoseSeriesBuilder;
}

impl DoseSeriesBuilderExt for DoseSeries {
    fn builder() -> DoseSeriesBuilder {
        DoseSeriesBuilder {
            events: Vec::new(),
            conversion_factor: 1.0,
            time_mode: TimeMode::Absolute,
        }
    }
}

/// Fluent construction of a [DoseSeries]
///
/// [DoseSeriesBuilder::repeat] backfills a recurring schedule from the last dose added.
pub struct DoseSeriesBuilder {
    events: Vec<DoseEvent>,
    conversion_factor: f64,
    time_mode: TimeMode,
}

impl DoseSeriesBuilder {
    pub fn event(mut self, event: DoseEvent) -> Self {
        self.events.push(event);
        self
    }

    pub fn dose(self, time: f64, amount: f64, formulation: Formulation) -> Self {
        self.event(DoseEvent::new(amount, time, formulation))
    }

    pub fn depot(
        self,
        time: f64,
        amount: f64,
        formulation: Formulation,
        instant_fraction: f64,
        secondary_fraction: f64,
    ) -> Self {
        let release = Release::Depot {
            instant_fraction,
            secondary_fraction,
        };
        self.event(DoseEvent::new(amount, time, formulation).with_release(release))
    }

    /// Repeat the last dose `n` more times, `delta` days apart
    pub fn repeat(mut self, n: usize, delta: f64) -> Self {
        let Some(last) = self.events.last().copied() else {
            tracing::warn!("There is no dose to repeat");
            return self;
        };
        for i in 1..=n {
            let time = match self.time_mode {
                TimeMode::Absolute => last.time() + delta * i as f64,
                TimeMode::Intervals => delta,
            };
            let event = DoseEvent::new(last.amount(), time, last.formulation())
                .with_release(last.release());
            self.events.push(event);
        }
        self
    }

    pub fn conversion_factor(mut self, conversion_factor: f64) -> Self {
        self.conversion_factor = conversion_factor;
        self
    }

    /// Read every dose time as the delay since the preceding dose
    pub fn intervals(mut self) -> Self {
        self.time_mode = TimeMode::Intervals;
        self
    }

    pub fn build(self) -> DoseSeries {
        DoseSeries::new(self.events)
            .with_conversion_factor(self.conversion_factor)
            .with_time_mode(self.time_mode)
    }
}
