use preview::RenderConfig;
use std::env;
use std::time::Duration;

/// Configuration for the meshpreview server binary.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Address and port the server binds to (e.g. `0.0.0.0:5001`).
    pub bind_address: String,
    /// Render pipeline parameters (output size, framing, shading).
    pub render: RenderConfig,
    /// Maximum accepted HTTP request body, in bytes.
    pub max_body_bytes: usize,
    /// Maximum accepted remote file size, in bytes.
    pub max_fetch_bytes: u64,
    /// Timeout covering a whole remote fetch, connect through last byte.
    pub fetch_timeout: Duration,
    /// Ceiling on concurrent renders; defaults to the number of CPUs.
    pub render_concurrency: usize,
}

impl ServiceConfig {
    /// Builds a configuration from environment variables while falling back
    /// to defaults. `MESHPREVIEW_BIND` wins over `PORT`; the latter is
    /// honored for drop-in compatibility with platform conventions.
    pub fn from_env() -> anyhow::Result<Self> {
        let port = env::var("PORT")
            .ok()
            .and_then(|v| v.parse::<u16>().ok())
            .unwrap_or(5001);
        let bind_address =
            env::var("MESHPREVIEW_BIND").unwrap_or_else(|_| format!("0.0.0.0:{port}"));

        let mut render = RenderConfig::default();
        if let Some((width, height)) = env::var("MESHPREVIEW_RESOLUTION")
            .ok()
            .and_then(|v| parse_resolution(&v))
        {
            render.width = width;
            render.height = height;
        }

        let max_body_bytes = env::var("MESHPREVIEW_MAX_BODY_BYTES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_MAX_BYTES as usize);
        let max_fetch_bytes = env::var("MESHPREVIEW_MAX_FETCH_BYTES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_MAX_BYTES);
        let fetch_timeout_secs: u64 = env::var("MESHPREVIEW_FETCH_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(30);
        let render_concurrency = env::var("MESHPREVIEW_RENDER_CONCURRENCY")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(default_concurrency);

        anyhow::ensure!(
            render.width > 0 && render.height > 0,
            "resolution must be positive"
        );
        anyhow::ensure!(render_concurrency >= 1, "render concurrency must be >= 1");
        anyhow::ensure!(fetch_timeout_secs >= 1, "fetch timeout must be >= 1s");

        Ok(Self {
            bind_address,
            render,
            max_body_bytes,
            max_fetch_bytes,
            fetch_timeout: Duration::from_secs(fetch_timeout_secs),
            render_concurrency,
        })
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:5001".to_string(),
            render: RenderConfig::default(),
            max_body_bytes: DEFAULT_MAX_BYTES as usize,
            max_fetch_bytes: DEFAULT_MAX_BYTES,
            fetch_timeout: Duration::from_secs(30),
            render_concurrency: default_concurrency(),
        }
    }
}

/// Default cap for request bodies and remote fetches.
const DEFAULT_MAX_BYTES: u64 = 64 * 1024 * 1024;

/// Parse `WIDTHxHEIGHT`, e.g. `600x600`.
fn parse_resolution(value: &str) -> Option<(u32, u32)> {
    let (w, h) = value.split_once(|c| c == 'x' || c == 'X')?;
    Some((w.trim().parse().ok()?, h.trim().parse().ok()?))
}

fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(2)
}
