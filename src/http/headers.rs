//! Headers added to every locally served response.
//!
//! Static files, direct pilet files, and the fallback HTML all carry the
//! hosting environment name and `Cache-Control: no-cache`. In development
//! the browser hot-reload tooling additionally reads two values from the
//! gateway's environment.

use axum::http::{header, HeaderMap, HeaderName, HeaderValue};

pub const BLAZOR_ENVIRONMENT: HeaderName = HeaderName::from_static("blazor-environment");
pub const DOTNET_MODIFIABLE_ASSEMBLIES: HeaderName =
    HeaderName::from_static("dotnet-modifiable-assemblies");
pub const ASPNETCORE_BROWSER_TOOLS: HeaderName =
    HeaderName::from_static("aspnetcore-browser-tools");

/// Environment variable → response header, forwarded in development only.
const DEV_TOOL_VARIABLES: [(&str, HeaderName); 2] = [
    ("DOTNET_MODIFIABLE_ASSEMBLIES", DOTNET_MODIFIABLE_ASSEMBLIES),
    ("__ASPNETCORE_BROWSER_TOOLS", ASPNETCORE_BROWSER_TOOLS),
];

/// The shared header set for local responses.
#[derive(Debug, Clone)]
pub struct LocalResponseHeaders {
    environment: String,
    development: bool,
}

impl LocalResponseHeaders {
    pub fn new(environment: impl Into<String>, development: bool) -> Self {
        Self {
            environment: environment.into(),
            development,
        }
    }

    /// Apply the header set, reading the dev tool variables from the process
    /// environment at call time.
    pub fn apply(&self, headers: &mut HeaderMap) {
        self.apply_with(headers, |name| std::env::var(name).ok());
    }

    /// Apply the header set with an explicit variable lookup.
    pub fn apply_with<F>(&self, headers: &mut HeaderMap, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Ok(value) = HeaderValue::from_str(&self.environment) {
            headers.insert(BLAZOR_ENVIRONMENT, value);
        }
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));

        if !self.development {
            return;
        }

        for (variable, name) in DEV_TOOL_VARIABLES {
            let Some(value) = lookup(variable) else {
                continue;
            };
            match HeaderValue::from_str(&value) {
                Ok(value) => {
                    headers.insert(name, value);
                }
                Err(_) => tracing::warn!(variable, "Environment value is not a valid header value"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(name: &str) -> Option<String> {
        match name {
            "DOTNET_MODIFIABLE_ASSEMBLIES" => Some("debug".into()),
            "__ASPNETCORE_BROWSER_TOOLS" => Some("true".into()),
            _ => None,
        }
    }

    #[test]
    fn always_sets_environment_and_no_cache() {
        let mut headers = HeaderMap::new();
        LocalResponseHeaders::new("Staging", false).apply_with(&mut headers, lookup);

        assert_eq!(headers[BLAZOR_ENVIRONMENT], "Staging");
        assert_eq!(headers[header::CACHE_CONTROL], "no-cache");
        assert!(!headers.contains_key(DOTNET_MODIFIABLE_ASSEMBLIES));
        assert!(!headers.contains_key(ASPNETCORE_BROWSER_TOOLS));
    }

    #[test]
    fn development_copies_tooling_variables() {
        let mut headers = HeaderMap::new();
        LocalResponseHeaders::new("Development", true).apply_with(&mut headers, lookup);

        assert_eq!(headers[DOTNET_MODIFIABLE_ASSEMBLIES], "debug");
        assert_eq!(headers[ASPNETCORE_BROWSER_TOOLS], "true");
    }

    #[test]
    fn unset_variables_add_nothing() {
        let mut headers = HeaderMap::new();
        LocalResponseHeaders::new("Development", true).apply_with(&mut headers, |_| None);

        assert_eq!(headers.len(), 2);
    }
}
