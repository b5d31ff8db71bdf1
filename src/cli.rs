use std::path::PathBuf;

use clap::Parser;

pub const DEFAULT_OAUTH_TOKEN_URL: &str =
    "https://oauth.yandex.ru/authorize/?response_type=token&client_id=1a6990aa636648e9b2ef855fa7bec2fb";
pub const DEFAULT_IAM_TOKEN_URL: &str = "https://iam.api.cloud.yandex.net/iam/v1/tokens";
pub const DEFAULT_CLOUDS_URL: &str =
    "https://resource-manager.api.cloud.yandex.net/resource-manager/v1/clouds";
pub const DEFAULT_FOLDERS_URL: &str =
    "https://resource-manager.api.cloud.yandex.net/resource-manager/v1/folders";
pub const DEFAULT_TRANSLATE_URL: &str =
    "https://translate.api.cloud.yandex.net/translate/v2/translate";

/// Local HTTP proxy for Yandex Cloud Translate
#[derive(Debug, Parser)]
#[command(name = "translate-proxy", version, about)]
pub struct Cli {
    /// Configuration file. When omitted, ~/.config/translate-proxy/config.yaml
    /// is used and rewritten as tokens are refreshed.
    #[arg(long, env = "TRANSLATE_PROXY_CONFIG_FILE")]
    pub config_file: Option<PathBuf>,

    /// New cloud folder name
    #[arg(long, env = "TRANSLATE_PROXY_NEW_FOLDER_NAME", default_value = "translate-proxy")]
    pub new_folder_name: String,

    /// Don't explore only active cloud folders
    #[arg(long, env = "TRANSLATE_PROXY_ALL_FOLDERS")]
    pub all_folders: bool,

    /// OAuth token URL
    #[arg(long, env = "TRANSLATE_PROXY_OAUTH_TOKEN_URL", default_value = DEFAULT_OAUTH_TOKEN_URL)]
    pub oauth_token_url: String,

    /// IAM token URL
    #[arg(long, env = "TRANSLATE_PROXY_IAM_TOKEN_URL", default_value = DEFAULT_IAM_TOKEN_URL)]
    pub iam_token_url: String,

    /// Yandex Clouds URL
    #[arg(long, env = "TRANSLATE_PROXY_CLOUDS_URL", default_value = DEFAULT_CLOUDS_URL)]
    pub clouds_url: String,

    /// Yandex Cloud folders URL
    #[arg(long = "cloud-folders-url", env = "TRANSLATE_PROXY_CLOUD_FOLDERS_URL", default_value = DEFAULT_FOLDERS_URL)]
    pub folders_url: String,

    /// Yandex Translate API URL
    #[arg(long, env = "TRANSLATE_PROXY_TRANSLATE_URL", default_value = DEFAULT_TRANSLATE_URL)]
    pub translate_url: String,

    /// HTTP server address
    #[arg(long, env = "TRANSLATE_PROXY_ADDRESS", default_value = "localhost:8080")]
    pub address: String,

    /// Disable upstream certificate verification
    #[arg(long, env = "TRANSLATE_PROXY_INSECURE")]
    pub insecure: bool,

    /// Enable access log
    #[arg(long, env = "TRANSLATE_PROXY_ACCESSLOG")]
    pub accesslog: bool,

    /// TLS certificate file
    #[arg(long, env = "TRANSLATE_PROXY_TLS_CERT_FILE", requires = "tls_key_file")]
    pub tls_cert_file: Option<PathBuf>,

    /// TLS key file
    #[arg(long, env = "TRANSLATE_PROXY_TLS_KEY_FILE", requires = "tls_cert_file")]
    pub tls_key_file: Option<PathBuf>,

    /// Upstream request timeout in seconds
    #[arg(long, env = "TRANSLATE_PROXY_REQUEST_TIMEOUT_SECS", default_value = "30")]
    pub request_timeout_secs: u64,

    /// Emit logs as JSON
    #[arg(long, env = "TRANSLATE_PROXY_LOG_JSON")]
    pub log_json: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["translate-proxy"]).unwrap();
        assert!(cli.config_file.is_none());
        assert_eq!(cli.new_folder_name, "translate-proxy");
        assert_eq!(cli.address, "localhost:8080");
        assert_eq!(cli.folders_url, DEFAULT_FOLDERS_URL);
        assert!(!cli.all_folders);
    }

    #[test]
    fn test_tls_flags_must_come_together() {
        let res = Cli::try_parse_from(["translate-proxy", "--tls-cert-file", "cert.pem"]);
        assert!(res.is_err());

        let cli = Cli::try_parse_from([
            "translate-proxy",
            "--tls-cert-file",
            "cert.pem",
            "--tls-key-file",
            "key.pem",
        ])
        .unwrap();
        assert!(cli.tls_cert_file.is_some() && cli.tls_key_file.is_some());
    }
}
