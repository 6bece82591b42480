//! Process counters rendered in the Prometheus text exposition format.

use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

pub struct Metrics {
    http_requests: AtomicU64,
    chat_requests: AtomicU64,
    chat_failures: AtomicU64,
    started: Instant,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            http_requests: AtomicU64::new(0),
            chat_requests: AtomicU64::new(0),
            chat_failures: AtomicU64::new(0),
            started: Instant::now(),
        }
    }

    pub fn record_http_request(&self) {
        self.http_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_chat(&self, succeeded: bool) {
        self.chat_requests.fetch_add(1, Ordering::Relaxed);
        if !succeeded {
            self.chat_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn http_requests(&self) -> u64 {
        self.http_requests.load(Ordering::Relaxed)
    }

    pub fn chat_requests(&self) -> u64 {
        self.chat_requests.load(Ordering::Relaxed)
    }

    pub fn chat_failures(&self) -> u64 {
        self.chat_failures.load(Ordering::Relaxed)
    }

    /// `active_sessions` is sampled by the caller since the store lives
    /// outside this registry.
    pub fn render(&self, active_sessions: usize) -> String {
        let mut out = String::new();
        write_metric(
            &mut out,
            "http_requests_total",
            "counter",
            "Total HTTP requests",
            self.http_requests() as f64,
        );
        write_metric(
            &mut out,
            "chat_requests_total",
            "counter",
            "Chat messages answered or attempted",
            self.chat_requests() as f64,
        );
        write_metric(
            &mut out,
            "chat_failures_total",
            "counter",
            "Chat messages that ended in an error",
            self.chat_failures() as f64,
        );
        write_metric(
            &mut out,
            "active_sessions",
            "gauge",
            "Sessions resident in the session store",
            active_sessions as f64,
        );
        write_metric(
            &mut out,
            "process_uptime_seconds",
            "gauge",
            "Seconds since the process started",
            self.started.elapsed().as_secs_f64(),
        );
        out
    }
}

fn write_metric(out: &mut String, name: &str, kind: &str, help: &str, value: f64) {
    let _ = writeln!(out, "# HELP {} {}", name, help);
    let _ = writeln!(out, "# TYPE {} {}", name, kind);
    let _ = writeln!(out, "{} {}", name, value);
}
