pub mod analysis;
pub mod app;
pub mod config;
pub mod measure;
pub mod permission;
pub mod picker;

#[cfg(target_os = "android")]
#[no_mangle]
fn android_main(app: slint::android::AndroidApp) {
    android_logger::init_once(
        android_logger::Config::default()
            .with_max_level(log::LevelFilter::Info)
            .with_tag("footmeasure"),
    );
    if let Err(err) = start(app) {
        log::error!("footmeasure stopped: {err:?}");
    }
}

#[cfg(target_os = "android")]
fn start(app: slint::android::AndroidApp) -> anyhow::Result<()> {
    use anyhow::Context;

    slint::android::init(app.clone()).context("slint android backend")?;
    let config = config::AppConfig::load(app.internal_data_path().as_deref())?;
    app::run(app, config)
}
