use super::ScheduleRenderer;
use crate::domain::model::{Schedule, ScheduleBucket};
use crate::utils::error::Result;

/// 每小時一行：`HH:00 : total=N; A=x, B=y`
pub struct TextRenderer;

fn render_line(bucket: &ScheduleBucket) -> String {
    if bucket.total_allocated == 0 {
        return format!("{} : total=0; none", bucket.hour_label());
    }

    let details = bucket
        .allocations
        .iter()
        .map(|(customer, agents)| format!("{}={}", customer, agents))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "{} : total={}; {}",
        bucket.hour_label(),
        bucket.total_allocated,
        details
    )
}

impl ScheduleRenderer for TextRenderer {
    fn render(&self, schedule: &Schedule, _capacity: i64) -> Result<String> {
        if schedule.is_empty() {
            return Ok("No schedule available.".to_string());
        }

        Ok(schedule
            .iter()
            .map(render_line)
            .collect::<Vec<_>>()
            .join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schedule() -> Schedule {
        let mut bucket = ScheduleBucket::empty(9);
        bucket.total_allocated = 21;
        bucket.allocations.insert("CustomerB".to_string(), 14);
        bucket.allocations.insert("CustomerA".to_string(), 7);
        Schedule::assemble(vec![bucket])
    }

    #[test]
    fn test_text_lines() {
        let output = TextRenderer.render(&schedule(), 0).unwrap();
        let lines: Vec<&str> = output.lines().collect();

        assert_eq!(lines.len(), 24);
        assert_eq!(lines[0], "00:00 : total=0; none");
        assert_eq!(lines[9], "09:00 : total=21; CustomerA=7, CustomerB=14");
        assert_eq!(lines[23], "23:00 : total=0; none");
    }

    #[test]
    fn test_empty_schedule_message() {
        let output = TextRenderer.render(&Schedule::default(), 10).unwrap();
        assert_eq!(output, "No schedule available.");
    }
}
