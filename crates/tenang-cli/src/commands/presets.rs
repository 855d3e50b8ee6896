use tenang_core::Config;

pub fn run(json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let settings = Config::load()?.session_settings()?;

    if json {
        println!("{}", serde_json::to_string(&settings.presets_min)?);
        return Ok(());
    }

    for minutes in &settings.presets_min {
        let marker = if minutes.saturating_mul(60) == settings.default_duration_secs {
            "*"
        } else {
            " "
        };
        println!("{marker} {minutes:>3} min");
    }
    Ok(())
}
