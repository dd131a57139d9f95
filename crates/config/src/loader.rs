use std::path::Path;

use anyhow::Context;

use crate::Config;

pub(crate) fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Config> {
    let path = path.as_ref();

    let content =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read configuration from {}", path.display()))?;

    let config: Config = toml::from_str(&content)?;

    if config.auth.url.is_none() {
        log::warn!("No [auth] url configured - login requests will be rejected until one is set");
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use crate::Config;

    #[test]
    fn load_from_file() {
        let content = indoc! {r#"
            [server]
            listen_address = "0.0.0.0:7000"

            [auth]
            url = "https://auth.liceo.cl/auth/v1"
        "#};

        let dir = std::env::temp_dir().join("liceo-loader-test");
        std::fs::create_dir_all(&dir).unwrap();

        let path = dir.join("liceo.toml");
        std::fs::write(&path, content).unwrap();

        let config = Config::load(&path).unwrap();

        assert_eq!(config.server.listen_address, Some("0.0.0.0:7000".parse().unwrap()));
        assert!(config.auth.url.is_some());
    }

    #[test]
    fn load_missing_file_fails() {
        let error = Config::load("/nonexistent/liceo.toml").unwrap_err();
        assert!(error.to_string().contains("Failed to read configuration"), "{error}");
    }
}
