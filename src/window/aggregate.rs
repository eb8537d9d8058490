//! Per-window reduction of telemetry and charging events.

use std::ops::ControlFlow;

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::config::SimulationConfig;
use crate::error::Result;
use crate::sim::types::{ChargingEvent, PerTickRecord};

use super::{Window, WindowGenerator, WindowSpec};

/// One reduced window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Aggregated<T> {
    pub window_start: NaiveDateTime,
    pub value: T,
}

/// Which events belong to a window.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum MembershipStrategy {
    /// The session intersects the window.
    #[default]
    Overlap,
    /// The session starts inside the window.
    StartPoint,
    /// The session ends inside the window.
    EndPoint,
}

impl MembershipStrategy {
    fn contains(self, event: &ChargingEvent, start: usize, end: usize) -> bool {
        match self {
            Self::Overlap => event.start_tick < end && event.end_tick >= start,
            Self::StartPoint => (start..end).contains(&event.start_tick),
            Self::EndPoint => (start..end).contains(&event.end_tick),
        }
    }
}

/// Maps a window to the tick indices `[start, end)` it covers.
///
/// Both bounds round down, so consecutive windows partition the ticks.
fn tick_span(granularity_ms: u64, origin: NaiveDateTime, window: &Window) -> (usize, usize) {
    let g = granularity_ms.max(1) as i64;
    let offset = (window.start - origin).num_milliseconds();
    let to_index = |ms: i64| usize::try_from(ms.max(0) / g).unwrap_or(usize::MAX);
    let start = to_index(offset);
    let end = to_index(offset.saturating_add(window.duration_ms as i64));
    (start, end)
}

fn offset_by_ticks(origin: NaiveDateTime, granularity_ms: u64, ticks: usize) -> NaiveDateTime {
    let ms = (ticks as i64).saturating_mul(granularity_ms as i64);
    origin + Duration::milliseconds(ms)
}

/// Windows covering every tick of `ticks`, starting at `origin`.
///
/// # Errors
///
/// Returns [`crate::Error::InvalidWindow`] for a zero fixed duration.
pub fn tick_windows(
    config: &SimulationConfig,
    ticks: &[PerTickRecord],
    origin: NaiveDateTime,
    spec: WindowSpec,
) -> Result<WindowGenerator> {
    let end = offset_by_ticks(origin, config.simulation.granularity_ms, ticks.len());
    WindowGenerator::new(spec, origin, end)
}

/// Windows up to and including the last event's end tick.
///
/// `events` must be sorted by `end_tick`; no windows are produced without events.
///
/// # Errors
///
/// Returns [`crate::Error::InvalidWindow`] for a zero fixed duration.
pub fn event_windows(
    config: &SimulationConfig,
    events: &[ChargingEvent],
    origin: NaiveDateTime,
    spec: WindowSpec,
) -> Result<WindowGenerator> {
    let end = events.last().map_or(origin, |last| {
        offset_by_ticks(origin, config.simulation.granularity_ms, last.end_tick + 1)
    });
    WindowGenerator::new(spec, origin, end)
}

/// Reduces each window's tick slice with `reduce`.
///
/// `origin` is the time of tick 0. Windows that cover no tick are skipped.
pub fn aggregate_tick_data<T, W, F>(
    config: &SimulationConfig,
    ticks: &[PerTickRecord],
    origin: NaiveDateTime,
    windows: W,
    mut reduce: F,
) -> Vec<Aggregated<T>>
where
    W: IntoIterator<Item = Window>,
    F: FnMut(&[PerTickRecord]) -> T,
{
    let g = config.simulation.granularity_ms;
    let mut out = Vec::new();
    for window in windows {
        let (start, end) = tick_span(g, origin, &window);
        let end = end.min(ticks.len());
        if start >= end {
            continue;
        }
        out.push(Aggregated {
            window_start: window.start,
            value: reduce(&ticks[start..end]),
        });
    }
    out
}

/// Reduces the events belonging to each window with `reduce`.
///
/// `events` must be sorted by `end_tick`, as produced by the engine. Every
/// window yields a value, with an empty slice when no event belongs to it.
/// Aggregation stops after a window whose reducer returns
/// [`ControlFlow::Break`] (that value is kept) or once every event ended
/// before the current window.
///
/// Events ending before a window are skipped for good, so the work is
/// linear in events plus windows while sessions are short relative to a
/// window. For `Overlap` and `StartPoint` the scan of a window only stops
/// `longest session` ticks past its end, so one session spanning many
/// windows degrades this towards events × windows.
pub fn aggregate_charging_events<T, W, F>(
    config: &SimulationConfig,
    events: &[ChargingEvent],
    origin: NaiveDateTime,
    windows: W,
    strategy: MembershipStrategy,
    mut reduce: F,
) -> Vec<Aggregated<T>>
where
    W: IntoIterator<Item = Window>,
    F: FnMut(&[ChargingEvent]) -> ControlFlow<T, T>,
{
    let g = config.simulation.granularity_ms;
    let longest = events
        .iter()
        .map(ChargingEvent::duration_ticks)
        .max()
        .unwrap_or(0);

    let mut out = Vec::new();
    let mut pointer = 0;
    let mut members = Vec::new();
    for window in windows {
        let (start, end) = tick_span(g, origin, &window);
        while pointer < events.len() && events[pointer].end_tick < start {
            pointer += 1;
        }
        if pointer >= events.len() {
            break;
        }

        members.clear();
        for event in &events[pointer..] {
            let past_window = match strategy {
                MembershipStrategy::EndPoint => event.end_tick >= end,
                // Later events start no earlier than `end_tick - longest`.
                _ => event.end_tick.saturating_sub(longest) >= end,
            };
            if past_window {
                break;
            }
            if strategy.contains(event, start, end) {
                members.push(*event);
            }
        }

        match reduce(&members) {
            ControlFlow::Continue(value) => out.push(Aggregated {
                window_start: window.start,
                value,
            }),
            ControlFlow::Break(value) => {
                out.push(Aggregated {
                    window_start: window.start,
                    value,
                });
                break;
            }
        }
    }
    out
}

/// Ready-made reduction callbacks.
pub mod reducers {
    use std::ops::ControlFlow;

    use crate::sim::types::{ChargingEvent, PerTickRecord};

    /// Mean site-wide power over the window (kW).
    pub fn average_total_kw(ticks: &[PerTickRecord]) -> f64 {
        if ticks.is_empty() {
            return 0.0;
        }
        ticks.iter().map(PerTickRecord::total_kw).sum::<f64>() / ticks.len() as f64
    }

    /// Highest site-wide power in the window (kW).
    pub fn peak_total_kw(ticks: &[PerTickRecord]) -> f64 {
        ticks.iter().map(PerTickRecord::total_kw).fold(0.0, f64::max)
    }

    /// Mean power per chargepoint over the window (kW), indexed by id.
    pub fn average_per_chargepoint_kw(ticks: &[PerTickRecord]) -> Vec<f64> {
        let Some(first) = ticks.first() else {
            return Vec::new();
        };
        let mut sums = vec![0.0; first.power_kw.len()];
        for rec in ticks {
            for (sum, p) in sums.iter_mut().zip(&rec.power_kw) {
                *sum += p;
            }
        }
        let n = ticks.len() as f64;
        sums.into_iter().map(|s| s / n).collect()
    }

    /// Energy delivered in the window (kWh) for ticks of `tick_hours`.
    pub fn energy_kwh(tick_hours: f64) -> impl Fn(&[PerTickRecord]) -> f64 {
        move |ticks| ticks.iter().map(PerTickRecord::total_kw).sum::<f64>() * tick_hours
    }

    /// Number of events in the window; never stops early.
    pub fn event_count(events: &[ChargingEvent]) -> ControlFlow<usize, usize> {
        ControlFlow::Continue(events.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::CalendarUnit;
    use chrono::NaiveDate;

    fn origin() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .expect("valid date")
    }

    fn hourly_config() -> SimulationConfig {
        let mut cfg = SimulationConfig::baseline();
        cfg.simulation.granularity_ms = 3_600_000;
        cfg
    }

    fn ticks(n: usize) -> Vec<PerTickRecord> {
        (0..n)
            .map(|i| PerTickRecord {
                power_kw: vec![i as f64, 1.0],
            })
            .collect()
    }

    fn event(start_tick: usize, end_tick: usize) -> ChargingEvent {
        ChargingEvent {
            chargepoint_id: 0,
            start_tick,
            end_tick,
        }
    }

    fn fixed(hours: u64) -> WindowSpec {
        WindowSpec::Fixed {
            duration_ms: hours * 3_600_000,
        }
    }

    #[test]
    fn one_tick_windows_partition_ticks() {
        let cfg = hourly_config();
        let data = ticks(30);
        let windows = tick_windows(&cfg, &data, origin(), fixed(1)).expect("valid");
        let out = aggregate_tick_data(&cfg, &data, origin(), windows, <[PerTickRecord]>::len);
        assert_eq!(out.len(), 30);
        assert!(out.iter().all(|a| a.value == 1));
    }

    #[test]
    fn daily_windows_on_hourly_ticks() {
        let cfg = hourly_config();
        let data = ticks(60);
        let windows =
            tick_windows(&cfg, &data, origin(), WindowSpec::Calendar(CalendarUnit::Daily))
                .expect("valid");
        let out = aggregate_tick_data(&cfg, &data, origin(), windows, <[PerTickRecord]>::len);
        let sizes: Vec<_> = out.iter().map(|a| a.value).collect();
        assert_eq!(sizes, vec![24, 24, 12]);
        assert_eq!(out[1].window_start, origin() + Duration::days(1));
    }

    #[test]
    fn uneven_fixed_windows_still_partition() {
        let mut cfg = hourly_config();
        cfg.simulation.granularity_ms = 900_000;
        let data = ticks(12);
        let spec = WindowSpec::Fixed {
            duration_ms: 20 * 60_000,
        };
        let windows = tick_windows(&cfg, &data, origin(), spec).expect("valid");
        let out = aggregate_tick_data(&cfg, &data, origin(), windows, <[PerTickRecord]>::len);
        assert_eq!(out.iter().map(|a| a.value).sum::<usize>(), 12);
    }

    #[test]
    fn empty_tick_data_gives_no_windows() {
        let cfg = hourly_config();
        let windows = tick_windows(&cfg, &[], origin(), fixed(1)).expect("valid");
        let out = aggregate_tick_data(&cfg, &[], origin(), windows, <[PerTickRecord]>::len);
        assert!(out.is_empty());
    }

    #[test]
    fn reducers_average_and_peak() {
        let data = ticks(4);
        // totals: 1, 2, 3, 4
        assert_eq!(reducers::average_total_kw(&data), 2.5);
        assert_eq!(reducers::peak_total_kw(&data), 4.0);
        assert_eq!(reducers::average_per_chargepoint_kw(&data), vec![1.5, 1.0]);
        assert_eq!(reducers::energy_kwh(0.25)(&data), 2.5);
        assert_eq!(reducers::average_total_kw(&[]), 0.0);
    }

    #[test]
    fn overlap_counts_every_intersecting_window() {
        let cfg = hourly_config();
        let events = [event(0, 2), event(1, 5)];
        let windows = event_windows(&cfg, &events, origin(), fixed(2)).expect("valid");
        let out = aggregate_charging_events(
            &cfg,
            &events,
            origin(),
            windows,
            MembershipStrategy::Overlap,
            reducers::event_count,
        );
        // windows [0,2) [2,4) [4,6)
        let counts: Vec<_> = out.iter().map(|a| a.value).collect();
        assert_eq!(counts, vec![2, 2, 1]);
    }

    #[test]
    fn start_and_end_point_assign_each_event_once() {
        let cfg = hourly_config();
        let events = [event(0, 2), event(1, 5), event(6, 7)];
        for strategy in [MembershipStrategy::StartPoint, MembershipStrategy::EndPoint] {
            let windows = event_windows(&cfg, &events, origin(), fixed(2)).expect("valid");
            let out = aggregate_charging_events(
                &cfg,
                &events,
                origin(),
                windows,
                strategy,
                reducers::event_count,
            );
            let total: usize = out.iter().map(|a| a.value).sum();
            assert_eq!(total, 3, "{strategy:?}");
        }
    }

    #[test]
    fn start_and_end_point_use_the_matching_tick() {
        let cfg = hourly_config();
        let events = [event(0, 2), event(1, 5), event(6, 7)];
        let counts = |strategy| {
            let windows = event_windows(&cfg, &events, origin(), fixed(2)).expect("valid");
            aggregate_charging_events(
                &cfg,
                &events,
                origin(),
                windows,
                strategy,
                reducers::event_count,
            )
            .into_iter()
            .map(|a| a.value)
            .collect::<Vec<_>>()
        };
        // windows [0,2) [2,4) [4,6) [6,8)
        assert_eq!(counts(MembershipStrategy::StartPoint), vec![2, 0, 0, 1]);
        assert_eq!(counts(MembershipStrategy::EndPoint), vec![0, 1, 1, 1]);
    }

    #[test]
    fn empty_windows_get_placeholders() {
        let cfg = hourly_config();
        let events = [event(0, 1), event(9, 10)];
        let windows = event_windows(&cfg, &events, origin(), fixed(2)).expect("valid");
        let out = aggregate_charging_events(
            &cfg,
            &events,
            origin(),
            windows,
            MembershipStrategy::StartPoint,
            reducers::event_count,
        );
        let counts: Vec<_> = out.iter().map(|a| a.value).collect();
        assert_eq!(counts, vec![1, 0, 0, 0, 1, 0]);
    }

    #[test]
    fn break_stops_after_reporting_value() {
        let cfg = hourly_config();
        let events: Vec<_> = (0..10).map(|i| event(i * 3, i * 3 + 1)).collect();
        let windows = event_windows(&cfg, &events, origin(), fixed(3)).expect("valid");
        let mut seen = 0;
        let out = aggregate_charging_events(
            &cfg,
            &events,
            origin(),
            windows,
            MembershipStrategy::Overlap,
            |window| {
                seen += window.len();
                if seen >= 4 {
                    ControlFlow::Break(seen)
                } else {
                    ControlFlow::Continue(seen)
                }
            },
        );
        assert_eq!(out.len(), 4);
        assert_eq!(out.last().map(|a| a.value), Some(4));
    }

    #[test]
    fn no_events_no_windows() {
        let cfg = hourly_config();
        let windows = event_windows(&cfg, &[], origin(), fixed(1)).expect("valid");
        let out = aggregate_charging_events(
            &cfg,
            &[],
            origin(),
            windows,
            MembershipStrategy::Overlap,
            reducers::event_count,
        );
        assert!(out.is_empty());
    }
}
