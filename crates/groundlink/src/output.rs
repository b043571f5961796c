//! Notification rendering for replay output.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use serde_json::{Value, json};
use tracing::warn;

use crate::cli::OutputFormat;

/// Writes one line per observed change to stdout.
#[derive(Debug, Clone, Copy)]
pub struct Printer {
    format: OutputFormat,
}

impl Printer {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// `value` is `None` when the source went away.
    pub fn notify(&self, device: &str, source: &str, value: Option<&Value>) {
        match self.format {
            OutputFormat::Plain => match value {
                Some(value) => println!("{device} {source} {value}"),
                None => println!("{device} {source} -"),
            },
            OutputFormat::Json => println!(
                "{}",
                json!({ "device": device, "source": source, "value": value })
            ),
        }
    }

    /// Observer printing every value of `source`. The first absent value
    /// (nothing published yet) is not reported.
    pub fn observer<T>(
        self,
        device: &str,
        source: &'static str,
    ) -> impl Fn(Option<Arc<T>>) + Send + Sync + 'static
    where
        T: Serialize + ?Sized + Send + Sync + 'static,
    {
        let device = device.to_owned();
        let seen = AtomicBool::new(false);
        move |value: Option<Arc<T>>| {
            let rendered = match value {
                Some(value) => {
                    seen.store(true, Ordering::Relaxed);
                    match serde_json::to_value(&*value) {
                        Ok(rendered) => Some(rendered),
                        Err(e) => {
                            warn!(device = %device, source, error = %e, "cannot render value");
                            return;
                        }
                    }
                }
                None => {
                    if !seen.swap(false, Ordering::Relaxed) {
                        return;
                    }
                    None
                }
            };
            self.notify(&device, source, rendered.as_ref());
        }
    }
}
