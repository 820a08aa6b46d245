use homeworth_core::config::{AppConfig, LoadOptions};
use homeworth_core::pricing::{
    format_currency, LinearPriceModel, PredictionInput, PricePredictor,
};

use crate::commands::CommandResult;

pub fn run(input: PredictionInput) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "predict",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    estimate(&config, &input)
}

pub fn estimate(config: &AppConfig, input: &PredictionInput) -> CommandResult {
    let model = match LinearPriceModel::load_or_baseline(config.model.path.as_deref()) {
        Ok(model) => model,
        Err(error) => {
            return CommandResult::failure("predict", "model_load", error.to_string(), 3);
        }
    };

    match model.predict(input) {
        Ok(price) => CommandResult::success(
            "predict",
            format!(
                "estimated price {} (model {}, features {:?})",
                format_currency(price),
                model.version,
                input.as_tuple()
            ),
        ),
        Err(error) => CommandResult::failure("predict", "prediction", error.to_string(), 4),
    }
}
