use dcomp_shader_lib::config::AppConfig;

fn main() {
    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(err) => {
            init_logging(&AppConfig::default());
            log::error!("[CONFIG] {}", err);
            std::process::exit(1);
        }
    };
    init_logging(&config);
    log::info!("[CONFIG] Loaded configuration: {:?}", config);

    let exit_code = match dcomp_shader_lib::run(&config) {
        Ok(code) => code,
        Err(err) => {
            log::error!("{}", err);
            1
        }
    };
    std::process::exit(exit_code);
}

/// `RUST_LOG` wins over the configured filter.
fn init_logging(config: &AppConfig) {
    let env = env_logger::Env::default().default_filter_or(config.log_filter.as_str());
    env_logger::Builder::from_env(env).format_timestamp_millis().init();
}
