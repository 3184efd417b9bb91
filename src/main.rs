#[cfg(not(target_os = "android"))]
fn main() -> anyhow::Result<()> {
    use footmeasure::{app, config};

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let config = config::AppConfig::load(config::default_config_dir().as_deref())?;
    app::run(config)
}

// the apk enters through android_main in the library
#[cfg(target_os = "android")]
fn main() {}
