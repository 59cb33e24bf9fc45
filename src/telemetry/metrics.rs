//! Prometheus metrics

use std::time::Duration;

/// Latency metric types
#[derive(Debug, Clone, Copy)]
pub enum LatencyMetric {
    /// Venue round trip for an order
    OrderSubmission,
    /// Bot command handling, end to end
    CommandHandling,
}

/// Counter metric types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterMetric {
    SessionsStarted,
    SessionsCancelled,
    SellDecisions,
    HoldDecisions,
    FeedDisconnects,
    OrdersPlaced,
    VenueErrors,
    CrashAlerts,
    RsiAlerts,
    BotCommands,
}

/// Gauge metric types
#[derive(Debug, Clone, Copy)]
pub enum GaugeMetric {
    /// Last traded price seen by a watch session
    LastPrice,
    /// Latest RSI computed by the alert monitor
    Rsi,
}

impl LatencyMetric {
    fn name(self) -> &'static str {
        match self {
            LatencyMetric::OrderSubmission => "tradewatch_order_submission_latency_ms",
            LatencyMetric::CommandHandling => "tradewatch_command_latency_ms",
        }
    }
}

impl CounterMetric {
    fn name(self) -> &'static str {
        match self {
            CounterMetric::SessionsStarted => "tradewatch_sessions_started_total",
            CounterMetric::SessionsCancelled => "tradewatch_sessions_cancelled_total",
            CounterMetric::SellDecisions => "tradewatch_sell_decisions_total",
            CounterMetric::HoldDecisions => "tradewatch_hold_decisions_total",
            CounterMetric::FeedDisconnects => "tradewatch_feed_disconnects_total",
            CounterMetric::OrdersPlaced => "tradewatch_orders_placed_total",
            CounterMetric::VenueErrors => "tradewatch_venue_errors_total",
            CounterMetric::CrashAlerts => "tradewatch_crash_alerts_total",
            CounterMetric::RsiAlerts => "tradewatch_rsi_alerts_total",
            CounterMetric::BotCommands => "tradewatch_bot_commands_total",
        }
    }
}

impl GaugeMetric {
    fn name(self) -> &'static str {
        match self {
            GaugeMetric::LastPrice => "tradewatch_last_price",
            GaugeMetric::Rsi => "tradewatch_rsi",
        }
    }
}

/// Record a latency measurement
pub fn record_latency(metric: LatencyMetric, duration: Duration) {
    ::metrics::histogram!(metric.name()).record(duration.as_secs_f64() * 1000.0);
}

/// Bump a counter by one
pub fn increment(metric: CounterMetric) {
    ::metrics::counter!(metric.name()).increment(1);
}

/// Set a gauge value
pub fn set_gauge(metric: GaugeMetric, value: f64) {
    ::metrics::gauge!(metric.name()).set(value);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_without_exporter_is_noop() {
        increment(CounterMetric::SellDecisions);
        set_gauge(GaugeMetric::LastPrice, 50_000.0);
        record_latency(LatencyMetric::OrderSubmission, Duration::from_millis(12));
    }

    #[test]
    fn test_metric_names_are_prefixed() {
        assert!(CounterMetric::VenueErrors.name().starts_with("tradewatch_"));
        assert!(GaugeMetric::Rsi.name().starts_with("tradewatch_"));
        assert!(LatencyMetric::CommandHandling.name().ends_with("_ms"));
    }

    #[test]
    fn test_alert_counters_are_separate() {
        assert_ne!(
            CounterMetric::CrashAlerts.name(),
            CounterMetric::RsiAlerts.name()
        );
    }
}
