use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use url::Url;

use crate::cli::Cli;

pub const APP_NAME: &str = "translate-proxy";

/// Upstream API endpoints.
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub iam_token: Url,
    pub clouds: Url,
    pub folders: Url,
    pub translate: Url,
}

impl Endpoints {
    pub fn parse(iam_token: &str, clouds: &str, folders: &str, translate: &str) -> anyhow::Result<Self> {
        Ok(Self {
            iam_token: parse_url("IAM token", iam_token)?,
            clouds: parse_url("clouds", clouds)?,
            folders: parse_url("folders", folders)?,
            translate: parse_url("translate", translate)?,
        })
    }

    /// Endpoints laid out under a single base URL, mirroring the public API paths.
    pub fn under(base: &str) -> anyhow::Result<Self> {
        let base = base.trim_end_matches('/');
        Self::parse(
            &format!("{}/iam/v1/tokens", base),
            &format!("{}/resource-manager/v1/clouds", base),
            &format!("{}/resource-manager/v1/folders", base),
            &format!("{}/translate/v2/translate", base),
        )
    }
}

fn parse_url(purpose: &str, raw: &str) -> anyhow::Result<Url> {
    Url::parse(raw).with_context(|| format!("invalid {} URL {}", purpose, raw))
}

#[derive(Debug, Clone)]
pub struct TlsFiles {
    pub cert: PathBuf,
    pub key: PathBuf,
}

/// Runtime configuration, built once at startup and handed to every component.
#[derive(Debug, Clone)]
pub struct Config {
    pub config_file: PathBuf,
    /// True when the process owns `config_file` (no explicit path was given),
    /// so refreshed tokens may be written back to it.
    pub persist_on_refresh: bool,
    pub new_folder_name: String,
    pub all_folders: bool,
    pub oauth_token_url: String,
    pub endpoints: Endpoints,
    pub address: String,
    pub insecure: bool,
    pub accesslog: bool,
    pub tls: Option<TlsFiles>,
    pub request_timeout: Duration,
    pub log_json: bool,
}

impl Config {
    pub fn from_cli(cli: Cli) -> anyhow::Result<Self> {
        let (config_file, persist_on_refresh) = match cli.config_file {
            Some(path) if !path.as_os_str().is_empty() => (path, false),
            _ => (default_config_file()?, true),
        };

        let tls = match (cli.tls_cert_file, cli.tls_key_file) {
            (Some(cert), Some(key)) => Some(TlsFiles { cert, key }),
            _ => None,
        };

        Ok(Config {
            config_file,
            persist_on_refresh,
            new_folder_name: cli.new_folder_name,
            all_folders: cli.all_folders,
            oauth_token_url: cli.oauth_token_url,
            endpoints: Endpoints::parse(
                &cli.iam_token_url,
                &cli.clouds_url,
                &cli.folders_url,
                &cli.translate_url,
            )?,
            address: cli.address,
            insecure: cli.insecure,
            accesslog: cli.accesslog,
            tls,
            request_timeout: Duration::from_secs(cli.request_timeout_secs),
            log_json: cli.log_json,
        })
    }

    /// Upstream HTTP client shared by the token manager and the request executor.
    pub fn http_client(&self) -> anyhow::Result<reqwest::Client> {
        reqwest::Client::builder()
            .use_rustls_tls()
            .danger_accept_invalid_certs(self.insecure)
            .timeout(self.request_timeout)
            .connect_timeout(Duration::from_secs(5))
            .build()
            .context("failed to build HTTP client")
    }
}

/// `~/.config/translate-proxy/config.yaml`
pub fn default_config_file() -> anyhow::Result<PathBuf> {
    let home = dirs::home_dir().context("cannot determine home directory")?;
    Ok(home.join(".config").join(APP_NAME).join("config.yaml"))
}

/// Read `.env`, parse the command line and build the [`Config`].
pub fn load() -> anyhow::Result<Config> {
    dotenvy::dotenv().ok();
    Config::from_cli(Cli::parse())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> Cli {
        let mut argv = vec!["translate-proxy"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_explicit_config_file_is_not_rewritten() {
        let cfg = Config::from_cli(cli(&["--config-file", "/tmp/shared.yaml"])).unwrap();
        assert_eq!(cfg.config_file, PathBuf::from("/tmp/shared.yaml"));
        assert!(!cfg.persist_on_refresh);
    }

    #[test]
    fn test_default_config_file_is_owned() {
        let cfg = Config::from_cli(cli(&[])).unwrap();
        assert!(cfg.persist_on_refresh);
        assert!(cfg.config_file.ends_with(".config/translate-proxy/config.yaml"));
    }

    #[test]
    fn test_invalid_url_is_rejected() {
        let err = Config::from_cli(cli(&["--cloud-folders-url", "not a url"])).unwrap_err();
        assert!(err.to_string().contains("invalid folders URL"));
    }

    #[test]
    fn test_endpoints_under_base() {
        let e = Endpoints::under("http://127.0.0.1:9999/").unwrap();
        assert_eq!(e.iam_token.as_str(), "http://127.0.0.1:9999/iam/v1/tokens");
        assert_eq!(e.folders.path(), "/resource-manager/v1/folders");
    }
}
