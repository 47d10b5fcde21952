//! `weather`: current conditions for the configured location.

use crate::cli::{GlobalOpts, WeatherArgs};
use crate::commands;
use crate::error::CliError;
use crate::output;

pub async fn handle(args: WeatherArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = commands::load_config(global)?;

    let configured = nexview_config::weather_location(&cfg);
    let latitude = args.latitude.or(configured.map(|(lat, _)| lat));
    let longitude = args.longitude.or(configured.map(|(_, lon)| lon));
    let (Some(latitude), Some(longitude)) = (latitude, longitude) else {
        return Err(CliError::Validation {
            field: "location".into(),
            reason: "no location: pass --latitude and --longitude, or set \
                     weather.latitude and weather.longitude"
                .into(),
        });
    };

    let base_url = nexview_config::weather_url(&cfg)?;
    let sc = commands::session_config(&cfg, global)?;
    let info = nexview_core::oneshot::current_weather(base_url, latitude, longitude, &sc).await?;

    let color = output::should_color(&global.color);
    let out = output::render_single(
        &global.output,
        &info,
        |w| output::weather_detail(w, color),
        |w| format!("{:.1}", w.temperature),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
