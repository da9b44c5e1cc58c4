use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::error;

use crate::action::error::ActionError;
use crate::api::transport::{HttpRequest, Transport};

#[derive(Serialize)]
struct TranslateRequest<'a> {
    input: &'a str,
    timezone_offset: &'a str,
}

/// The five schedule fields, in panel form order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CronFields {
    pub minute: String,
    pub hour: String,
    pub day_of_month: String,
    pub month: String,
    pub day_of_week: String,
}

impl CronFields {
    /// `(form control id, value)` pairs for the schedule dialog.
    pub fn form_values(&self) -> [(&'static str, &str); 5] {
        [
            ("minute", self.minute.as_str()),
            ("hour", self.hour.as_str()),
            ("dayOfMonth", self.day_of_month.as_str()),
            ("month", self.month.as_str()),
            ("dayOfWeek", self.day_of_week.as_str()),
        ]
    }

    pub fn expression(&self) -> String {
        format!(
            "{} {} {} {} {}",
            self.minute, self.hour, self.day_of_month, self.month, self.day_of_week
        )
    }
}

/// Field value as the endpoint sends it: a non-empty string, or a number.
fn field(body: &Value, name: &'static str) -> Result<String, ActionError> {
    match body.get(name) {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        _ => Err(ActionError::MissingField { field: name }),
    }
}

pub fn parse_cron_response(body: &str) -> Result<CronFields, ActionError> {
    let parsed: Value = serde_json::from_str(body).map_err(|e| {
        error!(body = %body, "schedule endpoint returned invalid JSON");
        ActionError::Malformed {
            context: "schedule response",
            detail: e.to_string(),
        }
    })?;
    Ok(CronFields {
        minute: field(&parsed, "minute")?,
        hour: field(&parsed, "hour")?,
        day_of_month: field(&parsed, "day_of_month")?,
        month: field(&parsed, "month")?,
        day_of_week: field(&parsed, "day_of_week")?,
    })
}

/// Natural-language → cron translation service.
#[derive(Debug, Clone)]
pub struct ScheduleTranslator {
    pub endpoint: String,
}

impl ScheduleTranslator {
    pub fn new(endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
        }
    }

    pub fn translate(
        &self,
        transport: &dyn Transport,
        input: &str,
        timezone_offset: &str,
    ) -> Result<CronFields, ActionError> {
        let body = serde_json::to_string(&TranslateRequest {
            input,
            timezone_offset,
        })
        .map_err(|e| ActionError::Malformed {
            context: "schedule request",
            detail: e.to_string(),
        })?;
        let request =
            HttpRequest::post(&self.endpoint, body).header("Content-Type", "application/json");

        let response = transport.send(&request)?;
        if !response.is_success() {
            return Err(ActionError::Upstream {
                status: response.status,
            });
        }
        parse_cron_response(&response.body)
    }
}
