use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub kube_context: Option<String>,
    pub log_tail_lines: i64,
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let log_tail_lines: i64 = env::var("LOG_TAIL_LINES")
            .unwrap_or_else(|_| "100".to_string())
            .parse()?;
        if log_tail_lines < 0 {
            anyhow::bail!("LOG_TAIL_LINES must not be negative, got {}", log_tail_lines);
        }

        Ok(Self {
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()?,
            kube_context: env::var("KUBE_CONTEXT").ok().filter(|c| !c.is_empty()),
            log_tail_lines,
            log_level: env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}
