use crate::utils::error::{Result, SchedulerError};

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.trim().is_empty() {
        return Err(SchedulerError::InvalidConfiguration {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(SchedulerError::InvalidConfiguration {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: usize, min_value: usize) -> Result<()> {
    if value < min_value {
        return Err(SchedulerError::InvalidConfiguration {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

/// 驗證利用率，範圍為 (0, 1]
pub fn validate_utilization(field_name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value <= 0.0 || value > 1.0 {
        return Err(SchedulerError::InvalidConfiguration {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Utilization must be between 0 (exclusive) and 1 (inclusive)".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_path() {
        assert!(validate_path("input", "calls.csv").is_ok());
        assert!(validate_path("input", "").is_err());
        assert!(validate_path("input", "   ").is_err());
        assert!(validate_path("input", "bad\0path").is_err());
    }

    #[test]
    fn test_validate_positive_number() {
        assert!(validate_positive_number("ingest.workers", 4, 1).is_ok());
        assert!(validate_positive_number("ingest.workers", 0, 1).is_err());
    }

    #[test]
    fn test_validate_utilization_bounds() {
        assert!(validate_utilization("utilization", 1.0).is_ok());
        assert!(validate_utilization("utilization", 0.8).is_ok());
        assert!(validate_utilization("utilization", 0.0).is_err());
        assert!(validate_utilization("utilization", -0.5).is_err());
        assert!(validate_utilization("utilization", 1.01).is_err());
        assert!(validate_utilization("utilization", f64::NAN).is_err());
    }
}
