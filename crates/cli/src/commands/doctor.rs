use homeworth_core::config::{AppConfig, LoadOptions, SessionBackend};
use homeworth_core::pricing::{LinearPriceModel, PredictionInput, PricePredictor};
use homeworth_db::{connect_with_settings, SessionRepository, SqlSessionRepository};
use serde::Serialize;

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

const PROBE: PredictionInput = PredictionInput {
    gr_liv_area: 1500,
    bedroom_abv_gr: 3,
    full_bath: 2,
    bsmt_full_bath: 1,
    bsmt_half_bath: 0,
    half_bath: 1,
};

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
            checks.push(check_price_model(&config));
            checks.push(check_session_store(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            checks.push(skipped("price_model"));
            checks.push(skipped("session_store"));
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

fn skipped(name: &'static str) -> DoctorCheck {
    DoctorCheck {
        name,
        status: CheckStatus::Skipped,
        details: "skipped because configuration did not load".to_string(),
    }
}

fn check_price_model(config: &AppConfig) -> DoctorCheck {
    let model = match LinearPriceModel::load_or_baseline(config.model.path.as_deref()) {
        Ok(model) => model,
        Err(error) => {
            return DoctorCheck {
                name: "price_model",
                status: CheckStatus::Fail,
                details: error.to_string(),
            };
        }
    };

    match model.predict(&PROBE) {
        Ok(price) => DoctorCheck {
            name: "price_model",
            status: CheckStatus::Pass,
            details: format!("model `{}` priced the probe house at {price}", model.version),
        },
        Err(error) => DoctorCheck {
            name: "price_model",
            status: CheckStatus::Fail,
            details: format!("model `{}` failed the probe: {error}", model.version),
        },
    }
}

fn check_session_store(config: &AppConfig) -> DoctorCheck {
    if config.sessions.backend == SessionBackend::Memory {
        return DoctorCheck {
            name: "session_store",
            status: CheckStatus::Pass,
            details: "in-memory session store needs no connection".to_string(),
        };
    }

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return DoctorCheck {
                name: "session_store",
                status: CheckStatus::Fail,
                details: format!("failed to initialize async runtime: {error}"),
            };
        }
    };

    let result = runtime.block_on(async {
        let pool = connect_with_settings(
            &config.database.url,
            config.database.max_connections,
            config.database.timeout_secs,
        )
        .await
        .map_err(|error| format!("failed to connect to database: {error}"))?;

        let store = SqlSessionRepository::new(pool.clone());
        let ping = store.ping().await.map_err(|error| format!("session store query failed: {error}"));
        pool.close().await;
        ping
    });

    match result {
        Ok(()) => DoctorCheck {
            name: "session_store",
            status: CheckStatus::Pass,
            details: format!("connected using `{}`", config.database.url),
        },
        Err(error) => DoctorCheck { name: "session_store", status: CheckStatus::Fail, details: error },
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
