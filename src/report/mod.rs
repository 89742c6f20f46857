//! 排程報表。三種格式都只讀取 [`Schedule`] 與本次執行的容量設定。

pub mod html;
pub mod json;
pub mod text;

use crate::config::ReportFormat;
use crate::domain::model::Schedule;
use crate::utils::error::Result;

pub use html::HtmlRenderer;
pub use json::JsonRenderer;
pub use text::TextRenderer;

pub trait ScheduleRenderer: Send + Sync {
    fn render(&self, schedule: &Schedule, capacity: i64) -> Result<String>;
}

pub fn renderer_for(format: ReportFormat) -> Box<dyn ScheduleRenderer> {
    match format {
        ReportFormat::Text => Box::new(TextRenderer),
        ReportFormat::Json => Box::new(JsonRenderer),
        ReportFormat::Html => Box::new(HtmlRenderer),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_format_renders_empty_schedule() {
        for format in [ReportFormat::Text, ReportFormat::Json, ReportFormat::Html] {
            let output = renderer_for(format).render(&Schedule::default(), 0).unwrap();
            assert!(!output.is_empty(), "{} produced no output", format);
        }
    }
}
