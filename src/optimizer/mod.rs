pub mod solar;

pub use solar::{ClearSkyPosition, SolarPosition};

use std::sync::Arc;
use tracing::debug;

use crate::domain::{PanelOrientation, WeatherObservation};

/// Reference tilt for mid-latitude fixed installs, attenuated by weather.
const BASE_TILT_DEG: f64 = 45.0;
/// Full overcast pulls the panel 30% flatter for diffuse light.
const CLOUD_TILT_REDUCTION: f64 = 0.3;
/// Wind speed at which the wind fraction saturates, m/s.
const WIND_REFERENCE_M_S: f64 = 20.0;
/// Above this cloud fraction the solar-tracking variant opens the tilt up.
const DIFFUSE_CLOUD_THRESHOLD: f64 = 0.6;
const DIFFUSE_TILT_BOOST: f64 = 1.2;
/// Orientation deltas below this are not worth the actuator wear.
const HYSTERESIS_DEG: f64 = 5.0;
/// South-facing default for the heuristic variant (northern hemisphere).
const DEFAULT_AZIMUTH_DEG: f64 = 180.0;

/// Mechanical tilt envelope plus the extreme-weather stow angle.
#[derive(Debug, Clone, Copy)]
pub struct PanelLimits {
    pub min_tilt_deg: f64,
    pub max_tilt_deg: f64,
    pub safe_tilt_deg: f64,
}

impl Default for PanelLimits {
    fn default() -> Self {
        Self {
            min_tilt_deg: 0.0,
            max_tilt_deg: 90.0,
            safe_tilt_deg: 0.0,
        }
    }
}

/// Thresholds beyond which the panel is stowed regardless of yield.
///
/// The condition keywords are matched case-insensitively as substrings of
/// the provider's condition label, so "Heavy Snow Showers" and
/// "thunderstorm" both trip the predicate. This is the single canonical
/// policy; there is no exact-match variant.
#[derive(Debug, Clone)]
pub struct SafetyLimits {
    pub max_wind_m_s: f64,
    pub max_rain_mm_per_h: f64,
    pub condition_keywords: Vec<String>,
}

impl Default for SafetyLimits {
    fn default() -> Self {
        Self {
            max_wind_m_s: 15.0,
            max_rain_mm_per_h: 5.0,
            condition_keywords: ["thunder", "storm", "tornado", "hurricane", "snow"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Derives the target orientation from weather and scores whether moving
/// there is worth it. Pure over its inputs apart from the caller-supplied
/// timestamp.
pub struct PanelOptimizer {
    limits: PanelLimits,
    safety: SafetyLimits,
    solar: Option<Arc<dyn SolarPosition>>,
}

impl PanelOptimizer {
    pub fn new(limits: PanelLimits, safety: SafetyLimits) -> Self {
        Self {
            limits,
            safety,
            solar: None,
        }
    }

    /// Switches the optimizer from the fixed south-facing heuristic to
    /// true solar tracking.
    pub fn with_solar_position(mut self, solar: Arc<dyn SolarPosition>) -> Self {
        self.solar = Some(solar);
        self
    }

    /// True when the weather calls for stowing the panel flat.
    pub fn should_use_safe_position(&self, weather: &WeatherObservation) -> bool {
        if weather.wind_speed_m_s > self.safety.max_wind_m_s {
            return true;
        }
        if weather.rain_mm_per_h > self.safety.max_rain_mm_per_h {
            return true;
        }
        let condition = weather.condition.to_lowercase();
        self.safety
            .condition_keywords
            .iter()
            .any(|kw| condition.contains(kw.as_str()))
    }

    /// Target orientation for the given weather. `now` only matters when a
    /// solar-position model is plugged in.
    pub fn calculate_optimal_angles(
        &self,
        weather: &WeatherObservation,
        now: chrono::NaiveDateTime,
    ) -> PanelOrientation {
        if self.should_use_safe_position(weather) {
            debug!(condition = %weather.condition, wind_m_s = weather.wind_speed_m_s,
                rain_mm_per_h = weather.rain_mm_per_h, "extreme weather, stowing");
            return PanelOrientation::new(self.limits.safe_tilt_deg, 0.0);
        }

        match &self.solar {
            Some(solar) => self.solar_tracking_angles(weather, solar.as_ref(), now),
            None => self.heuristic_angles(weather),
        }
    }

    /// Fixed south-facing variant: 45° reference tilt flattened by cloud
    /// cover, then derated when the wind fraction passes one half.
    fn heuristic_angles(&self, weather: &WeatherObservation) -> PanelOrientation {
        let wind_fraction = (weather.wind_speed_m_s / WIND_REFERENCE_M_S).min(1.0);

        let mut tilt = BASE_TILT_DEG * (1.0 - CLOUD_TILT_REDUCTION * weather.cloud_fraction());
        if wind_fraction > 0.5 {
            tilt *= 1.0 - (wind_fraction - 0.5);
        }

        PanelOrientation::new(self.clamp_tilt(tilt), DEFAULT_AZIMUTH_DEG)
    }

    /// Solar-tracking variant: point the panel normal at the sun, opening
    /// the tilt by 20% under heavy cloud to catch more diffuse light.
    fn solar_tracking_angles(
        &self,
        weather: &WeatherObservation,
        solar: &dyn SolarPosition,
        now: chrono::NaiveDateTime,
    ) -> PanelOrientation {
        let (elevation_deg, azimuth_deg) = solar.position(now);
        if elevation_deg <= 0.0 {
            // Sun below the horizon: lie flat until morning.
            return PanelOrientation::new(self.limits.min_tilt_deg, DEFAULT_AZIMUTH_DEG);
        }

        let mut tilt = 90.0 - elevation_deg;
        if weather.cloud_fraction() > DIFFUSE_CLOUD_THRESHOLD {
            tilt *= DIFFUSE_TILT_BOOST;
        }

        PanelOrientation::new(self.clamp_tilt(tilt), azimuth_deg.rem_euclid(360.0))
    }

    /// Priority of moving from `current` to `target` in [0, 1]. Safety
    /// overrides cost/benefit; tiny deltas sit inside a hysteresis band;
    /// otherwise clearer skies and larger corrections rank higher.
    pub fn movement_priority(
        &self,
        weather: &WeatherObservation,
        current: &PanelOrientation,
        target: &PanelOrientation,
    ) -> f64 {
        if self.should_use_safe_position(weather) {
            return 1.0;
        }

        let angle_diff = current.angle_distance(target);
        if angle_diff < HYSTERESIS_DEG {
            return 0.0;
        }

        let clear_fraction = 1.0 - weather.cloud_fraction();
        (clear_fraction * (angle_diff / 90.0)).clamp(0.0, 1.0)
    }

    fn clamp_tilt(&self, tilt: f64) -> f64 {
        tilt.clamp(self.limits.min_tilt_deg, self.limits.max_tilt_deg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn optimizer() -> PanelOptimizer {
        PanelOptimizer::new(PanelLimits::default(), SafetyLimits::default())
    }

    fn noon() -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 21)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn weather(clouds: f64, wind: f64, rain: f64, condition: &str) -> WeatherObservation {
        WeatherObservation {
            cloud_cover_pct: clouds,
            wind_speed_m_s: wind,
            rain_mm_per_h: rain,
            snow_mm_per_h: 0.0,
            condition: condition.to_string(),
            date: None,
            time: None,
        }
    }

    #[test]
    fn clear_calm_weather_yields_reference_tilt() {
        let angles = optimizer().calculate_optimal_angles(&weather(0.0, 0.0, 0.0, "Clear"), noon());
        assert_eq!(angles, PanelOrientation::new(45.0, 180.0));
    }

    #[test]
    fn full_overcast_flattens_tilt_by_thirty_percent() {
        let angles =
            optimizer().calculate_optimal_angles(&weather(100.0, 0.0, 0.0, "Cloudy"), noon());
        assert!((angles.tilt_deg - 31.5).abs() < 1e-9);
        assert_eq!(angles.azimuth_deg, 180.0);
    }

    #[test]
    fn strong_wind_derates_tilt() {
        // wind 14 m/s -> fraction 0.7 -> tilt scaled by 0.8
        let angles = optimizer().calculate_optimal_angles(&weather(0.0, 14.0, 0.0, "Clear"), noon());
        assert!((angles.tilt_deg - 36.0).abs() < 1e-9);
    }

    #[test]
    fn tilt_stays_in_bounds_across_input_grid() {
        let opt = optimizer();
        for clouds in [0.0, 25.0, 50.0, 75.0, 100.0] {
            for wind in [0.0, 5.0, 10.0, 14.9] {
                let angles = opt.calculate_optimal_angles(&weather(clouds, wind, 0.0, "x"), noon());
                assert!(angles.tilt_deg >= 0.0 && angles.tilt_deg <= 90.0);
            }
        }
    }

    #[test]
    fn high_wind_alone_triggers_safe_position() {
        // Condition says sunny; the wind says stow.
        let opt = optimizer();
        let w = weather(90.0, 20.0, 0.0, "Sunny");
        assert_eq!(
            opt.calculate_optimal_angles(&w, noon()),
            PanelOrientation::new(0.0, 0.0)
        );
        assert_eq!(
            opt.movement_priority(&w, &PanelOrientation::new(30.0, 200.0), &PanelOrientation::new(0.0, 0.0)),
            1.0
        );
    }

    #[test]
    fn heavy_rain_triggers_safe_position() {
        assert!(optimizer().should_use_safe_position(&weather(50.0, 3.0, 5.1, "Rain")));
    }

    #[test]
    fn condition_keywords_match_case_insensitive_substrings() {
        let opt = optimizer();
        assert!(opt.should_use_safe_position(&weather(95.0, 3.0, 0.0, "Thunderstorm")));
        assert!(opt.should_use_safe_position(&weather(90.0, 3.0, 0.0, "Snow Showers")));
        assert!(opt.should_use_safe_position(&weather(90.0, 3.0, 0.0, "HEAVY SNOW")));
        assert!(!opt.should_use_safe_position(&weather(10.0, 3.0, 0.0, "Sunny")));
    }

    #[test]
    fn small_deltas_fall_in_hysteresis_band() {
        let opt = optimizer();
        let w = weather(0.0, 0.0, 0.0, "Clear");
        let current = PanelOrientation::new(45.0, 180.0);
        let target = PanelOrientation::new(47.0, 183.0); // distance ~3.6°
        assert_eq!(opt.movement_priority(&w, &current, &target), 0.0);
    }

    #[test]
    fn clear_sky_half_swing_scores_half() {
        let opt = optimizer();
        let w = weather(0.0, 0.0, 0.0, "Clear");
        let current = PanelOrientation::new(0.0, 180.0);
        let target = opt.calculate_optimal_angles(&w, noon());
        assert_eq!(target, PanelOrientation::new(45.0, 180.0));
        let priority = opt.movement_priority(&w, &current, &target);
        assert!((priority - 0.5).abs() < 1e-9);
    }

    #[test]
    fn priority_monotonic_in_angle_distance() {
        let opt = optimizer();
        let w = weather(40.0, 0.0, 0.0, "Partly Cloudy");
        let current = PanelOrientation::new(0.0, 180.0);
        let mut last = 0.0;
        for tilt in [10.0, 20.0, 40.0, 60.0, 90.0] {
            let p = opt.movement_priority(&w, &current, &PanelOrientation::new(tilt, 180.0));
            assert!(p >= last, "priority regressed at tilt {tilt}");
            assert!((0.0..=1.0).contains(&p));
            last = p;
        }
    }

    #[test]
    fn priority_monotonic_in_cloud_cover() {
        let opt = optimizer();
        let current = PanelOrientation::new(0.0, 180.0);
        let target = PanelOrientation::new(40.0, 180.0);
        let mut last = 1.0;
        for clouds in [0.0, 25.0, 50.0, 75.0, 100.0] {
            let p = opt.movement_priority(&weather(clouds, 0.0, 0.0, "x"), &current, &target);
            assert!(p <= last, "priority rose with clouds at {clouds}");
            assert!((0.0..=1.0).contains(&p));
            last = p;
        }
    }

    #[test]
    fn priority_clamped_for_large_swings() {
        let opt = optimizer();
        let w = weather(0.0, 0.0, 0.0, "Clear");
        let current = PanelOrientation::new(0.0, 0.0);
        let target = PanelOrientation::new(90.0, 270.0); // distance well over 90°
        assert_eq!(opt.movement_priority(&w, &current, &target), 1.0);
    }

    struct FixedSun(f64, f64);
    impl SolarPosition for FixedSun {
        fn position(&self, _time: chrono::NaiveDateTime) -> (f64, f64) {
            (self.0, self.1)
        }
    }

    #[test]
    fn solar_variant_points_normal_at_sun() {
        let opt = optimizer().with_solar_position(Arc::new(FixedSun(30.0, 150.0)));
        let angles = opt.calculate_optimal_angles(&weather(0.0, 0.0, 0.0, "Clear"), noon());
        assert!((angles.tilt_deg - 60.0).abs() < 1e-9);
        assert!((angles.azimuth_deg - 150.0).abs() < 1e-9);
    }

    #[test]
    fn solar_variant_opens_tilt_under_heavy_cloud() {
        let opt = optimizer().with_solar_position(Arc::new(FixedSun(30.0, 150.0)));
        let angles = opt.calculate_optimal_angles(&weather(80.0, 0.0, 0.0, "Cloudy"), noon());
        assert!((angles.tilt_deg - 72.0).abs() < 1e-9);
    }

    #[test]
    fn solar_variant_clamps_boosted_tilt() {
        let opt = optimizer().with_solar_position(Arc::new(FixedSun(5.0, 150.0)));
        let angles = opt.calculate_optimal_angles(&weather(80.0, 0.0, 0.0, "Cloudy"), noon());
        assert_eq!(angles.tilt_deg, 90.0);
    }

    #[test]
    fn solar_variant_stows_flat_at_night() {
        let opt = optimizer().with_solar_position(Arc::new(FixedSun(-10.0, 30.0)));
        let angles = opt.calculate_optimal_angles(&weather(0.0, 0.0, 0.0, "Clear"), noon());
        assert_eq!(angles, PanelOrientation::new(0.0, 180.0));
    }

    #[test]
    fn safe_override_beats_solar_tracking() {
        let opt = optimizer().with_solar_position(Arc::new(FixedSun(30.0, 150.0)));
        let angles = opt.calculate_optimal_angles(&weather(0.0, 16.0, 0.0, "Clear"), noon());
        assert_eq!(angles, PanelOrientation::new(0.0, 0.0));
    }
}
