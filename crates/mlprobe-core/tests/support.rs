//! Shared helpers for decorator tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]
#![allow(dead_code)]

use mlprobe_core::{Instrumentation, MetricRegistry, RequestStyle, ScrapeHost};

/// Host that only remembers which scrape paths were mounted.
#[derive(Default)]
pub struct RecordingHost {
    pub routes: Vec<String>,
}

impl ScrapeHost for RecordingHost {
    fn register_scrape(&mut self, path: &str, _registry: MetricRegistry) -> mlprobe_core::Result<()> {
        self.routes.push(path.to_string());
        Ok(())
    }
}

pub fn instrumentation(style: RequestStyle) -> Instrumentation {
    Instrumentation::new(&mut RecordingHost::default(), style).unwrap()
}

/// Value of an unlabelled sample in the exposition text.
pub fn sample(inst: &Instrumentation, name: &str) -> Option<f64> {
    let text = inst.render().unwrap();
    text.lines()
        .filter(|l| !l.starts_with('#'))
        .find_map(|l| l.strip_prefix(name)?.strip_prefix(' ')?.parse().ok())
}
