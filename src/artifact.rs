//! Artifact serialization: sanitize a chart record and write it as one
//! tagged line on the output stream.

use std::io::Write;

use serde::Serialize;

use crate::chart::{
    BarElement, BoxStatElement, ChartRecord, Elements, LineElement, PieSliceElement, ScatterElement,
};
use crate::errors::ArtifactError;
use crate::types::finite_or_zero;

/// Prefix of every artifact line
pub const ARTIFACT_PREFIX: &str = "dtn_artifact:";

/// Replace every non-finite float with 0.0, in place
pub trait Sanitize {
    fn sanitize(&mut self);
}

impl Sanitize for f64 {
    fn sanitize(&mut self) {
        *self = finite_or_zero(*self);
    }
}

impl<T: Sanitize> Sanitize for Vec<T> {
    fn sanitize(&mut self) {
        self.iter_mut().for_each(Sanitize::sanitize);
    }
}

impl<T: Sanitize, const N: usize> Sanitize for [T; N] {
    fn sanitize(&mut self) {
        self.iter_mut().for_each(Sanitize::sanitize);
    }
}

impl<T: Sanitize> Sanitize for Option<T> {
    fn sanitize(&mut self) {
        if let Some(value) = self {
            value.sanitize();
        }
    }
}

impl Sanitize for LineElement {
    fn sanitize(&mut self) {
        self.points.sanitize();
    }
}

impl Sanitize for ScatterElement {
    fn sanitize(&mut self) {
        self.points.sanitize();
        self.colors.sanitize();
    }
}

impl Sanitize for BarElement {
    fn sanitize(&mut self) {
        self.value.sanitize();
    }
}

impl Sanitize for PieSliceElement {
    fn sanitize(&mut self) {
        self.angle.sanitize();
        self.radius.sanitize();
    }
}

impl Sanitize for BoxStatElement {
    fn sanitize(&mut self) {
        for v in [
            &mut self.min,
            &mut self.first_quartile,
            &mut self.median,
            &mut self.third_quartile,
            &mut self.max,
        ] {
            v.sanitize();
        }
        self.outliers.sanitize();
    }
}

impl Sanitize for Elements {
    fn sanitize(&mut self) {
        match self {
            Elements::Line(v) => v.sanitize(),
            Elements::Scatter(v) => v.sanitize(),
            Elements::Bar(v) => v.sanitize(),
            Elements::Pie(v) => v.sanitize(),
            Elements::BoxAndWhisker(v) => v.sanitize(),
        }
    }
}

impl Sanitize for ChartRecord {
    fn sanitize(&mut self) {
        self.x_ticks.sanitize();
        self.y_ticks.sanitize();
        self.elements.sanitize();
        self.subplots.sanitize();
    }
}

/// The `{"type": "chart", "value": …}` envelope
#[derive(Debug, Serialize)]
pub struct Artifact<'a> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub value: &'a ChartRecord,
}

/// The artifact line for `record`, without the trailing newline. The record
/// must already be sanitized.
pub fn artifact_line(record: &ChartRecord) -> Result<String, ArtifactError> {
    let json = serde_json::to_string(&Artifact {
        kind: "chart",
        value: record,
    })?;
    Ok(format!("{ARTIFACT_PREFIX}{json}"))
}

/// Sanitize `record` and write its artifact line to `out`
pub fn emit<W: Write>(out: &mut W, mut record: ChartRecord) -> Result<(), ArtifactError> {
    record.sanitize();
    let line = artifact_line(&record)?;
    writeln!(out, "{line}")?;
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::ChartType;

    #[test]
    fn nan_becomes_zero_in_valid_json() {
        let mut record = ChartRecord::new(ChartType::Line);
        record.elements = Some(Elements::Line(vec![LineElement {
            label: "l".into(),
            points: vec![[f64::NAN, 1.0], [2.0, f64::INFINITY]],
        }]));
        record.png = Some(String::new());
        let mut out = Vec::new();
        emit(&mut out, record).unwrap();
        let text = String::from_utf8(out).unwrap();
        let json = text.strip_prefix(ARTIFACT_PREFIX).unwrap().trim_end();
        let value: serde_json::Value = serde_json::from_str(json).unwrap();
        assert_eq!(value["type"], "chart");
        assert_eq!(value["value"]["elements"][0]["points"], serde_json::json!([[0.0, 1.0], [2.0, 0.0]]));
    }

    #[test]
    fn nested_subplots_are_sanitized() {
        let mut inner = ChartRecord::new(ChartType::Bar);
        inner.elements = Some(Elements::Bar(vec![BarElement {
            label: "a".into(),
            group: "g".into(),
            value: f64::NEG_INFINITY,
        }]));
        let mut record = ChartRecord::composite(None, String::new(), vec![inner]);
        record.sanitize();
        let Some(Elements::Bar(bars)) = &record.subplots.as_ref().unwrap()[0].elements else {
            panic!("expected bar elements");
        };
        assert_eq!(bars[0].value, 0.0);
    }

    #[test]
    fn line_shape() {
        let record = ChartRecord {
            png: Some("AA==".into()),
            ..ChartRecord::new(ChartType::Unknown)
        };
        insta::assert_snapshot!(
            artifact_line(&record).unwrap(),
            @r#"dtn_artifact:{"type":"chart","value":{"type":"unknown","png":"AA=="}}"#
        );
    }
}
