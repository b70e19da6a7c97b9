//! Application command line.

use std::fmt;

use serde::Serialize;

use crate::config::ApplicationConfig;

/// Program and arguments for the application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LaunchSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl LaunchSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// `<command> <module> --bind host:port --workers N --timeout S --log-level L`
    pub fn from_config(config: &ApplicationConfig) -> Self {
        Self::new(config.command.clone())
            .arg(config.module.clone())
            .arg("--bind")
            .arg(bind_address(&config.bind_host, config.listen_port))
            .arg("--workers")
            .arg(config.workers.to_string())
            .arg("--timeout")
            .arg(config.request_timeout_secs.to_string())
            .arg("--log-level")
            .arg(config.log_level.clone())
    }
}

fn bind_address(host: &str, port: u16) -> String {
    if host.contains(':') {
        format!("[{}]:{}", host, port)
    } else {
        format!("{}:{}", host, port)
    }
}

impl fmt::Display for LaunchSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}
