use std::io::Write;

use error_stack::{Report, ResultExt};
use serde::Serialize;

use crate::analysis::Analysis;
use crate::chart::ChartSpec;
use crate::error::{AnalysisError, RenderError};
use crate::indicator::IndicatorRow;
use crate::render::Presenter;

/// Machine-readable report: summary, recent rows and the chart description.
#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    #[serde(flatten)]
    analysis: &'a Analysis,
    tail: &'a [IndicatorRow],
    chart: ChartSpec,
}

#[derive(Debug, Serialize)]
struct JsonError {
    error: String,
}

pub struct JsonPresenter {
    tail_rows: usize,
}

impl JsonPresenter {
    pub fn new(tail_rows: usize) -> Self {
        Self { tail_rows }
    }

    pub fn render(&self, analysis: &Analysis) -> Result<String, Report<RenderError>> {
        let report = JsonReport {
            analysis,
            tail: analysis.series.tail(self.tail_rows),
            chart: ChartSpec::build(analysis.title(), &analysis.series),
        };
        serde_json::to_string_pretty(&report).change_context(RenderError::Encode)
    }
}

impl Presenter for JsonPresenter {
    fn present(&self, analysis: &Analysis) -> Result<(), Report<RenderError>> {
        let body = self.render(analysis)?;
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{body}").change_context(RenderError::Write)
    }

    fn present_error(&self, error: &Report<AnalysisError>) {
        tracing::debug!(error = ?error, "analysis failed");
        let body = JsonError {
            error: error.current_context().to_string(),
        };
        match serde_json::to_string(&body) {
            Ok(line) => println!("{line}"),
            Err(e) => tracing::warn!(error = %e, "failed to encode error"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyze;
    use crate::analysis::tests::{StubProvider, rising};
    use crate::indicator::IndicatorEngine;
    use crate::model::Period;

    #[tokio::test]
    async fn json_report_has_summary_tail_and_chart() {
        let provider = StubProvider::new(rising);
        let analysis = analyze(&provider, &IndicatorEngine::default(), "TEST", Period::Year2)
            .await
            .unwrap();

        let body = JsonPresenter::new(7).render(&analysis).unwrap();
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();

        assert_eq!(json["symbol"], "TEST");
        assert_eq!(json["period"], "2y");
        assert_eq!(json["summary"]["latest_close"], 160.0);
        assert_eq!(json["summary"]["trend"], "uptrend");
        assert!(json["metadata"]["fifty_two_week_high"].is_null());
        assert_eq!(json["tail"].as_array().unwrap().len(), 7);
        assert_eq!(json["tail"][6]["close"], 160.0);
        assert_eq!(json["tail"][6]["date"], "2024-02-29");
        assert_eq!(json["chart"]["panes"].as_array().unwrap().len(), 2);
    }
}
