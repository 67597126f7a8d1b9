use crate::config::AppConfig;
use anyhow::Result;
use figment::{
    providers::{Env, Format, Json, Serialized, Toml},
    Figment,
};
use std::path::Path;
use tracing::debug;

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads configuration by layering the built-in defaults, `config/Config.toml`,
    /// `TRADE_`-prefixed environment variables, and `config/Config.json`.
    ///
    /// Missing files are skipped; every field has a default.
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration source exists but cannot be parsed.
    pub fn load() -> Result<AppConfig> {
        let config: AppConfig = Self::base()
            .merge(Toml::file("config/Config.toml"))
            .merge(Env::prefixed("TRADE_").split("__"))
            .join(Json::file("config/Config.json"))
            .extract()?;

        debug!(
            units = config.units.factors.len(),
            agriculture_codes = config.agriculture.codes.len(),
            "Loaded config from defaults, config/Config.toml, TRADE_ env and config/Config.json"
        );

        Ok(config)
    }

    /// Loads configuration from a specific TOML file layered over the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be parsed.
    pub fn load_from(path: impl AsRef<Path>) -> Result<AppConfig> {
        let config: AppConfig = Self::base()
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("TRADE_").split("__"))
            .extract()?;

        debug!(
            path = %path.as_ref().display(),
            units = config.units.factors.len(),
            "Loaded config from defaults, file and TRADE_ env"
        );
        Ok(config)
    }

    fn base() -> Figment {
        Figment::from(Serialized::defaults(AppConfig::default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_load_without_files_uses_defaults() {
        figment::Jail::expect_with(|_jail| {
            let config = ConfigLoader::load().map_err(|e| e.to_string())?;
            assert!(config.ingest.exclude_zero_quantity);
            assert_eq!(config.units.factors["m3"].factor, dec!(907.1847));
            Ok(())
        });
    }

    #[test]
    fn test_toml_overrides_single_unit_factor() {
        figment::Jail::expect_with(|jail| {
            jail.create_dir("config")?;
            jail.create_file(
                "config/Config.toml",
                r#"
                [units.factors.m3]
                factor = 1560

                [agriculture]
                codes = ["0101", "0201"]
                "#,
            )?;

            let config = ConfigLoader::load().map_err(|e| e.to_string())?;
            assert_eq!(config.units.factors["m3"].factor, dec!(1560));
            // untouched entries keep their defaults
            assert_eq!(config.units.factors["gm"].factor, dec!(0.001));
            assert_eq!(config.agriculture.codes.len(), 2);
            assert_eq!(config.agriculture.excluded_prefixes.len(), 3);
            Ok(())
        });
    }

    #[test]
    fn test_load_from_explicit_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "trade.toml",
                r#"
                [ingest]
                exclude_zero_quantity = false
                "#,
            )?;

            let config = ConfigLoader::load_from("trade.toml").map_err(|e| e.to_string())?;
            assert!(!config.ingest.exclude_zero_quantity);
            assert_eq!(config.units.factors["gm"].factor, dec!(0.001));
            Ok(())
        });
    }

    #[test]
    fn test_env_overrides_ingest_flag() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("TRADE_INGEST__EXCLUDE_ZERO_QUANTITY", "false");
            let config = ConfigLoader::load().map_err(|e| e.to_string())?;
            assert!(!config.ingest.exclude_zero_quantity);
            Ok(())
        });
    }
}
