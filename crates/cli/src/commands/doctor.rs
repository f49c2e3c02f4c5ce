use serde::Serialize;
use stockbot_core::config::{AppConfig, LoadOptions};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> String {
    let report = build_report();

    if json_output {
        return serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
    }

    render_human(&report)
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_marketstack_key(&config));
            checks.push(check_twilio_credentials(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            for name in ["marketstack_access_key", "twilio_credentials"] {
                checks.push(DoctorCheck {
                    name,
                    status: CheckStatus::Skipped,
                    details: "skipped because configuration did not load".to_string(),
                });
            }
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_marketstack_key(config: &AppConfig) -> DoctorCheck {
    if config.marketstack.has_access_key() {
        DoctorCheck {
            name: "marketstack_access_key",
            status: CheckStatus::Pass,
            details: format!("access key configured for {}", config.marketstack.base_url),
        }
    } else {
        DoctorCheck {
            name: "marketstack_access_key",
            status: CheckStatus::Fail,
            details: "set STOCKBOT_MARKETSTACK_ACCESS_KEY (or MARKETSTACK_KEY); symbol lookups reply with an error until then".to_string(),
        }
    }
}

fn check_twilio_credentials(config: &AppConfig) -> DoctorCheck {
    if config.twilio.uses_placeholder_credentials() {
        DoctorCheck {
            name: "twilio_credentials",
            status: CheckStatus::Fail,
            details: "set STOCKBOT_TWILIO_ACCOUNT_SID and STOCKBOT_TWILIO_AUTH_TOKEN (or TWILIO_ACCOUNT / TWILIO_TOKEN); placeholder defaults cannot send".to_string(),
        }
    } else {
        DoctorCheck {
            name: "twilio_credentials",
            status: CheckStatus::Pass,
            details: format!(
                "account `{}` will send as `{}`",
                config.twilio.account_sid, config.twilio.from_number
            ),
        }
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
