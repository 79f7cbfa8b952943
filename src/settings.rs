use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AuthSettings {
    pub application: ApplicationSettings,
    pub provider: ProviderSettings,
    pub token: TokenSettings,
    pub redirect: RedirectSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationSettings {
    pub host: String,
    pub port: u16,
    pub redirect_base_url: String,
    pub cors_origins: String,
}

/// Identity provider endpoints and credentials.
///
/// Endpoints default to Google's OAuth2 endpoints; tests point them at a
/// local stub server instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSettings {
    pub client_id: String,
    pub client_secret: String,
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    pub userinfo_endpoint: String,
    pub scopes: Vec<String>,
    pub extra_auth_params: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenSettings {
    pub signing_secret: String,
    pub validity_days: u64,
}

/// Where the callback handler sends users after the exchange completes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedirectSettings {
    /// Web platform landing page, token appended as a query parameter
    pub frontend_url: String,
    /// App-scheme URI used when a mobile login carries no client redirect URI
    pub fallback_scheme: String,
    /// URI prefixes that mark an incoming `redirect_uri` as a mobile app
    pub mobile_scheme_prefixes: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    pub level: String,
}

impl Default for ApplicationSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            redirect_base_url: "http://localhost:8080".to_string(),
            cors_origins: "http://localhost:3000,http://localhost:8080".to_string(),
        }
    }
}

impl Default for ProviderSettings {
    fn default() -> Self {
        let mut extra_auth_params = HashMap::new();
        extra_auth_params.insert("prompt".to_string(), "select_account".to_string());
        extra_auth_params.insert("hl".to_string(), "en".to_string());
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            authorization_endpoint: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
            token_endpoint: "https://oauth2.googleapis.com/token".to_string(),
            userinfo_endpoint: "https://www.googleapis.com/oauth2/v2/userinfo".to_string(),
            scopes: vec![
                "profile".to_string(),
                "email".to_string(),
                "openid".to_string(),
            ],
            extra_auth_params,
        }
    }
}

impl Default for TokenSettings {
    fn default() -> Self {
        Self {
            signing_secret: String::new(), // Will be generated if empty
            validity_days: 7,
        }
    }
}

impl Default for RedirectSettings {
    fn default() -> Self {
        Self {
            frontend_url: "http://localhost:3000".to_string(),
            fallback_scheme: "networth://auth".to_string(),
            mobile_scheme_prefixes: vec!["exp://".to_string(), "networth://".to_string()],
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl AuthSettings {
    /// Load settings from configuration files and environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Settings file cannot be read
    /// - TOML parsing fails
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        Self::initialize_environment();

        // Load base settings from TOML or defaults
        let mut settings = Self::load_base_settings()?;

        // Apply environment variable overrides
        Self::apply_env_overrides(&mut settings);

        Ok(settings)
    }

    /// Initialize environment variables and logging
    fn initialize_environment() {
        Self::load_env_file();
        // The logger may already be installed when load() runs more than
        // once in a process (tests); that is not an error here.
        let _ = env_logger::try_init();
    }

    /// Load base settings from a TOML file or use defaults
    fn load_base_settings() -> Result<Self, Box<dyn std::error::Error>> {
        let mut settings = Self::default();

        let default_config_path = std::path::PathBuf::from("Settings.toml");
        if default_config_path.exists() {
            let toml_content = fs::read_to_string(&default_config_path)?;
            settings = basic_toml::from_str(&toml_content)?;
            println!(
                "✓ Loaded base settings from {}",
                default_config_path.display()
            );
        }

        Ok(settings)
    }

    /// Apply environment variable overrides to settings
    fn apply_env_overrides(settings: &mut Self) {
        Self::apply_application_env_overrides(&mut settings.application);
        Self::apply_provider_env_overrides(&mut settings.provider);
        Self::apply_token_env_overrides(&mut settings.token);
        Self::apply_redirect_env_overrides(&mut settings.redirect);
        Self::apply_logging_env_overrides(&mut settings.logging);
    }

    fn apply_application_env_overrides(app_settings: &mut ApplicationSettings) {
        if let Ok(host) = std::env::var("HOST") {
            app_settings.host = host;
        }
        if let Ok(port_str) = std::env::var("PORT") {
            if let Ok(port) = port_str.parse::<u16>() {
                app_settings.port = port;
            }
        }
        if let Ok(redirect_base_url) = std::env::var("REDIRECT_BASE_URL") {
            app_settings.redirect_base_url = redirect_base_url;
        }
        if let Ok(cors_origins) = std::env::var("CORS_ORIGINS") {
            app_settings.cors_origins = cors_origins;
        }
    }

    fn apply_provider_env_overrides(provider_settings: &mut ProviderSettings) {
        if let Ok(client_id) = std::env::var("GOOGLE_CLIENT_ID") {
            provider_settings.client_id = client_id;
        }
        if let Ok(client_secret) = std::env::var("GOOGLE_CLIENT_SECRET") {
            provider_settings.client_secret = client_secret;
        }
    }

    pub fn apply_token_env_overrides(token_settings: &mut TokenSettings) {
        if let Ok(validity_str) = std::env::var("TOKEN_VALIDITY_DAYS") {
            if let Ok(validity) = validity_str.parse::<u64>() {
                token_settings.validity_days = validity;
            }
        }
        Self::handle_signing_secret_override(token_settings);
    }

    /// Handle signing secret environment override and generation
    fn handle_signing_secret_override(token_settings: &mut TokenSettings) {
        let env_secret_set = std::env::var("TOKEN_SECRET").is_ok_and(|secret| {
            if secret.is_empty() {
                false
            } else {
                token_settings.signing_secret = secret;
                true
            }
        });

        // Generate a random signing secret if no environment variable was
        // set and the configured value is empty
        if !env_secret_set && token_settings.signing_secret.is_empty() {
            token_settings.signing_secret = Self::generate_random_signing_secret();
            Self::warn_about_generated_secret();
        }
    }

    /// Generate a cryptographically secure random signing secret
    ///
    /// Generates 32 bytes (256 bits) of entropy, base64-encoded
    fn generate_random_signing_secret() -> String {
        use rand::RngCore;
        let mut secret = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut secret);
        general_purpose::STANDARD.encode(secret)
    }

    fn warn_about_generated_secret() {
        eprintln!("⚠️  WARNING: Using auto-generated token signing secret");
        eprintln!("   Tokens minted before a restart will not verify after it");
        eprintln!("   Set the TOKEN_SECRET environment variable or token.signing_secret");
        eprintln!("   in Settings.toml for production use");
    }

    fn apply_redirect_env_overrides(redirect_settings: &mut RedirectSettings) {
        if let Ok(frontend_url) = std::env::var("FRONTEND_URL") {
            redirect_settings.frontend_url = frontend_url;
        }
        if let Ok(fallback_scheme) = std::env::var("FALLBACK_SCHEME") {
            redirect_settings.fallback_scheme = fallback_scheme;
        }
    }

    fn apply_logging_env_overrides(logging_settings: &mut LoggingSettings) {
        if let Ok(log_level) = std::env::var("RUST_LOG") {
            logging_settings.level = log_level;
        }
    }

    /// Load environment variables from .env file
    fn load_env_file() {
        if let Ok(contents) = std::fs::read_to_string(".env") {
            for line in contents.lines() {
                if let Some((key, value)) = line.split_once('=') {
                    std::env::set_var(key.trim(), value.trim());
                }
            }
        }
    }

    /// Get the bind address for the server
    #[must_use]
    pub fn get_bind_address(&self) -> String {
        format!("{}:{}", self.application.host, self.application.port)
    }

    /// Get CORS origins as a vector of strings
    #[must_use]
    pub fn get_cors_origins(&self) -> Vec<String> {
        self.application
            .cors_origins
            .split(',')
            .map(|s| s.trim().to_string())
            .collect()
    }

    /// The provider callback endpoint the code exchange happens against.
    /// Always the server's own URL, never the client's.
    #[must_use]
    pub fn callback_url(&self) -> String {
        format!("{}/auth/callback", self.application.redirect_base_url)
    }
}

impl ProviderSettings {
    /// Whether a usable client id has been configured
    #[must_use]
    pub fn is_client_configured(&self) -> bool {
        !self.client_id.is_empty()
    }

    /// Scope string for the authorization URL, falling back to the
    /// configured defaults when the caller did not pass one
    #[must_use]
    pub fn resolve_scope(&self, requested: Option<&str>) -> String {
        match requested {
            Some(scope) if !scope.is_empty() => scope.to_string(),
            _ => self.scopes.join(" "),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn default_settings_have_google_endpoints() {
        let settings = AuthSettings::default();
        assert!(settings
            .provider
            .authorization_endpoint
            .starts_with("https://accounts.google.com"));
        assert!(settings
            .provider
            .token_endpoint
            .starts_with("https://oauth2.googleapis.com"));
        assert_eq!(settings.token.validity_days, 7);
        assert_eq!(settings.redirect.fallback_scheme, "networth://auth");
        assert!(!settings.provider.is_client_configured());
    }

    #[test]
    fn callback_url_is_server_endpoint() {
        let mut settings = AuthSettings::default();
        settings.application.redirect_base_url = "https://auth.example.com".to_string();
        assert_eq!(
            settings.callback_url(),
            "https://auth.example.com/auth/callback"
        );
    }

    #[test]
    fn resolve_scope_prefers_caller_value() {
        let provider = ProviderSettings::default();
        assert_eq!(provider.resolve_scope(Some("email")), "email");
        assert_eq!(provider.resolve_scope(Some("")), "profile email openid");
        assert_eq!(provider.resolve_scope(None), "profile email openid");
    }

    #[test]
    fn cors_origins_are_split_and_trimmed() {
        let mut settings = AuthSettings::default();
        settings.application.cors_origins = "http://a.test, http://b.test".to_string();
        assert_eq!(
            settings.get_cors_origins(),
            vec!["http://a.test".to_string(), "http://b.test".to_string()]
        );
    }

    #[test]
    #[serial]
    fn provider_env_overrides_apply() {
        std::env::set_var("GOOGLE_CLIENT_ID", "id-from-env");
        std::env::set_var("GOOGLE_CLIENT_SECRET", "secret-from-env");

        let mut settings = AuthSettings::default();
        AuthSettings::apply_env_overrides(&mut settings);

        assert_eq!(settings.provider.client_id, "id-from-env");
        assert_eq!(settings.provider.client_secret, "secret-from-env");
        assert!(settings.provider.is_client_configured());

        std::env::remove_var("GOOGLE_CLIENT_ID");
        std::env::remove_var("GOOGLE_CLIENT_SECRET");
    }

    #[test]
    #[serial]
    fn signing_secret_is_generated_when_unset() {
        std::env::remove_var("TOKEN_SECRET");
        let mut token_settings = TokenSettings::default();
        AuthSettings::apply_token_env_overrides(&mut token_settings);
        assert!(!token_settings.signing_secret.is_empty());
    }

    #[test]
    #[serial]
    fn signing_secret_env_override_wins() {
        std::env::set_var("TOKEN_SECRET", "configured-secret");
        let mut token_settings = TokenSettings::default();
        AuthSettings::apply_token_env_overrides(&mut token_settings);
        assert_eq!(token_settings.signing_secret, "configured-secret");
        std::env::remove_var("TOKEN_SECRET");
    }
}
