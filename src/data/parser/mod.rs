//! CSV import and export of dose series
//!
//! The layout has one dose per row:
//!
//! ```text
//! time,amount,formulation,instant,secondary
//! 0,5,EV im,,
//! 7,5,EV im,,
//! 0,0.1,patch tw,0.05,0.1
//! ```
//!
//! `instant` and `secondary` are optional. When either is given the dose uses depot release
//! with the missing fraction taken as zero. Times are absolute, in days.

use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::data::{DoseEvent, DoseSeries, Formulation};
use crate::error::{EstrannaiseError, Result};
use crate::simulator::response::Release;

#[derive(Debug, Clone, Deserialize, Serialize)]
struct DoseRow {
    time: f64,
    amount: f64,
    formulation: String,
    #[serde(default)]
    instant: Option<f64>,
    #[serde(default)]
    secondary: Option<f64>,
}

impl DoseRow {
    fn into_event(self) -> Result<DoseEvent> {
        let formulation: Formulation = self.formulation.parse()?;
        let event = DoseEvent::new(self.amount, self.time, formulation);
        Ok(match (self.instant, self.secondary) {
            (None, None) => event,
            (instant, secondary) => event.with_release(Release::Depot {
                instant_fraction: instant.unwrap_or(0.0),
                secondary_fraction: secondary.unwrap_or(0.0),
            }),
        })
    }

    fn from_event(event: &DoseEvent) -> DoseRow {
        let (instant, secondary) = match event.release() {
            Release::Simple => (None, None),
            Release::Depot {
                instant_fraction,
                secondary_fraction,
            } => (Some(instant_fraction), Some(secondary_fraction)),
        };
        DoseRow {
            time: event.time(),
            amount: event.amount(),
            formulation: event.formulation().tag().to_string(),
            instant,
            secondary,
        }
    }
}

/// Read a dose series from a CSV file
///
/// Headers are case-insensitive and lines starting with `#` are skipped. An unknown
/// formulation tag fails the whole import.
pub fn read_doses(path: impl AsRef<Path>) -> Result<DoseSeries> {
    let reader = csv::ReaderBuilder::new()
        .comment(Some(b'#'))
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path.as_ref())
        .map_err(|e| EstrannaiseError::Csv(e.to_string()))?;
    read(reader)
}

/// Read a dose series from any CSV source
pub fn from_reader<R: io::Read>(source: R) -> Result<DoseSeries> {
    let reader = csv::ReaderBuilder::new()
        .comment(Some(b'#'))
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(source);
    read(reader)
}

fn read<R: io::Read>(mut reader: csv::Reader<R>) -> Result<DoseSeries> {
    let headers = reader
        .headers()
        .map_err(|e| EstrannaiseError::Csv(e.to_string()))?
        .iter()
        .map(|h| h.to_lowercase())
        .collect::<Vec<_>>();
    reader.set_headers(csv::StringRecord::from(headers));

    let mut events = Vec::new();
    for row in reader.deserialize::<DoseRow>() {
        let row = row.map_err(|e| EstrannaiseError::Csv(e.to_string()))?;
        events.push(row.into_event()?);
    }
    Ok(DoseSeries::new(events))
}

/// Write a dose series as CSV with absolute times
///
/// The conversion factor of the series is not part of the layout and is not written.
pub fn write_doses(series: &DoseSeries, path: impl AsRef<Path>) -> Result<()> {
    let mut writer =
        csv::Writer::from_path(path.as_ref()).map_err(|e| EstrannaiseError::Csv(e.to_string()))?;
    for event in series.to_absolute().events() {
        writer
            .serialize(DoseRow::from_event(event))
            .map_err(|e| EstrannaiseError::Csv(e.to_string()))?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::builder::DoseSeriesBuilderExt;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_csv(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn reads_simple_doses() {
        let file = write_csv("TIME,Amount,Formulation\n# loading dose\n0,5,EV im\n7, 5 ,EV im\n");
        let series = read_doses(file.path()).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.absolute_times(), vec![0.0, 7.0]);
        assert_eq!(series.events()[1].amount(), 5.0);
        assert_eq!(series.events()[1].release(), Release::Simple);
    }

    #[test]
    fn reads_depot_columns() {
        let csv = "time,amount,formulation,instant,secondary\n0,0.1,patch tw,0.05,\n3.5,0.1,patch tw,,\n";
        let series = from_reader(csv.as_bytes()).unwrap();
        assert_eq!(
            series.events()[0].release(),
            Release::Depot {
                instant_fraction: 0.05,
                secondary_fraction: 0.0
            }
        );
        assert_eq!(series.events()[1].release(), Release::Simple);
    }

    #[test]
    fn unknown_formulation_is_an_error() {
        let csv = "time,amount,formulation\n0,5,EV im\n7,5,EV oral\n";
        assert!(matches!(
            from_reader(csv.as_bytes()),
            Err(EstrannaiseError::UnknownFormulation(tag)) if tag == "EV oral"
        ));
    }

    #[test]
    fn malformed_rows_are_csv_errors() {
        let csv = "time,amount,formulation\nsoon,5,EV im\n";
        assert!(matches!(from_reader(csv.as_bytes()), Err(EstrannaiseError::Csv(_))));
        assert!(matches!(
            read_doses("/definitely/not/here.csv"),
            Err(EstrannaiseError::Csv(_))
        ));
    }

    #[test]
    fn written_series_reads_back() {
        let series = DoseSeries::builder()
            .dose(2.0, 4.0, Formulation::EcIm)
            .dose(5.0, 4.0, Formulation::EcIm)
            .depot(0.0, 0.1, Formulation::PatchOw, 0.02, 0.1)
            .intervals()
            .build();
        let file = NamedTempFile::new().unwrap();
        write_doses(&series, file.path()).unwrap();

        let read = read_doses(file.path()).unwrap();
        assert_eq!(read, series.to_absolute());
    }
}
