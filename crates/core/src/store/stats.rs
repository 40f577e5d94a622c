use std::fmt;

/// Key-value backends the demo talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    Redis,
    Memcached,
    /// Process-local store used by tests.
    #[cfg(feature = "test-support")]
    Memory,
}

impl Backend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Redis => "Redis",
            Backend::Memcached => "Memcached",
            #[cfg(feature = "test-support")]
            Backend::Memory => "Memory",
        }
    }

    fn icon(&self) -> &'static str {
        match self {
            Backend::Redis => "🔴",
            Backend::Memcached => "🟠",
            #[cfg(feature = "test-support")]
            Backend::Memory => "⚪",
        }
    }

    fn connections_label(&self) -> &'static str {
        match self {
            Backend::Memcached => "Total connections",
            _ => "Connected clients",
        }
    }

    fn items_label(&self) -> &'static str {
        match self {
            Backend::Memcached => "Current items",
            _ => "Total keys",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Server statistics reported by a store. Fields the server did not report
/// are `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreStats {
    pub backend: Backend,
    pub connections: Option<u64>,
    pub items: Option<u64>,
    /// Human readable memory usage, as reported by the backend.
    pub memory: Option<String>,
    pub uptime_secs: Option<u64>,
}

impl StoreStats {
    pub fn empty(backend: Backend) -> Self {
        Self {
            backend,
            connections: None,
            items: None,
            memory: None,
            uptime_secs: None,
        }
    }
}

fn or_na<T: ToString>(value: &Option<T>) -> String {
    value
        .as_ref()
        .map_or_else(|| "N/A".to_string(), ToString::to_string)
}

/// Formats one backend's statistics block.
pub fn format_store_stats(stats: &StoreStats) -> String {
    let backend = stats.backend;
    format!(
        "{} {}:\n   - {}: {}\n   - {}: {}\n   - Memory usage: {}\n   - Uptime: {} seconds",
        backend.icon(),
        backend,
        backend.connections_label(),
        or_na(&stats.connections),
        backend.items_label(),
        or_na(&stats.items),
        or_na(&stats.memory),
        or_na(&stats.uptime_secs),
    )
}

/// Formats the `📊 CACHE STATISTICS` report for several backends.
pub fn format_stats(stats: &[StoreStats]) -> String {
    let rule = "-".repeat(30);
    let blocks: Vec<String> = stats.iter().map(format_store_stats).collect();
    format!(
        "\n📊 CACHE STATISTICS\n{}\n{}\n{}",
        rule,
        blocks.join("\n\n"),
        rule
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_redis_stats() {
        let stats = StoreStats {
            backend: Backend::Redis,
            connections: Some(3),
            items: Some(42),
            memory: Some("1.05M".to_string()),
            uptime_secs: Some(120),
        };
        let block = format_store_stats(&stats);
        assert!(block.starts_with("🔴 Redis:"));
        assert!(block.contains("Connected clients: 3"));
        assert!(block.contains("Total keys: 42"));
        assert!(block.contains("Memory usage: 1.05M"));
        assert!(block.contains("Uptime: 120 seconds"));
    }

    #[test]
    fn test_format_memcached_labels() {
        let stats = StoreStats {
            backend: Backend::Memcached,
            connections: Some(10),
            items: Some(1),
            memory: Some("64 bytes".to_string()),
            uptime_secs: Some(5),
        };
        let block = format_store_stats(&stats);
        assert!(block.starts_with("🟠 Memcached:"));
        assert!(block.contains("Total connections: 10"));
        assert!(block.contains("Current items: 1"));
        assert!(block.contains("Memory usage: 64 bytes"));
    }

    #[test]
    fn test_missing_values_render_na() {
        let block = format_store_stats(&StoreStats::empty(Backend::Redis));
        assert!(block.contains("Connected clients: N/A"));
        assert!(block.contains("Uptime: N/A seconds"));
    }

    #[test]
    fn test_format_stats_report() {
        let report = format_stats(&[
            StoreStats::empty(Backend::Redis),
            StoreStats::empty(Backend::Memcached),
        ]);
        assert!(report.contains("📊 CACHE STATISTICS"));
        assert!(report.contains("🔴 Redis:"));
        assert!(report.contains("🟠 Memcached:"));
        assert!(report.trim_end().ends_with(&"-".repeat(30)));
    }
}
